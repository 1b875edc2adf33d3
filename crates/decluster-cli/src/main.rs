mod cli;
mod error;
mod logging;
mod progress;

use crate::cli::Cli;
use crate::error::Result;
use crate::progress::CliProgressHandler;
use clap::Parser;
use decluster::core::io::load_decoy_list;
use decluster::engine::progress::ProgressReporter;
use decluster::workflows::{self, ClusterOutcome};
use tracing::{debug, info, warn};

fn main() {
    if let Err(e) = run_app() {
        eprintln!("\nError: {}", e);
        std::process::exit(1);
    }
}

fn run_app() -> Result<()> {
    let cli = Cli::parse();
    logging::setup_logging(cli.verbose, cli.quiet, &cli.log_file)?;

    info!("decluster v{} starting up.", env!("CARGO_PKG_VERSION"));
    debug!("Full CLI arguments parsed: {:?}", &cli);

    let config = cli.cluster_config()?;
    let options = cli.read_options()?;

    let set = load_decoy_list(&cli.decoy_list, &options)?;
    info!(
        decoys = set.len(),
        residues = set.residue_count(),
        "Decoy set loaded"
    );

    let handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(handler.get_callback());

    let mut outcome = workflows::run(&set, &config, &reporter)?;

    if let Some(report) = outcome.ambiguity.clone() {
        warn!(
            margin = report.margin,
            "Largest and runner-up clusters are close in size"
        );
        println!(
            "Ambiguous result: largest cluster ({}, size {}) leads runner-up ({}, size {}) by only {:.1}%",
            report.largest.center,
            report.largest.size,
            report.runner_up.center,
            report.runner_up.size,
            report.margin * 100.0
        );
        if cli.no_refine {
            println!("Refined re-run skipped (--no-refine).");
        } else {
            println!("Re-running on the two contending clusters...");
            outcome = workflows::refine(&set, &config, &reporter, &report)?;
            match ambiguity_note(&outcome) {
                Some(note) => println!("{note}"),
                None => println!(
                    "Re-run resolved the ambiguity at threshold {:.4}.",
                    outcome.threshold
                ),
            }
        }
    }

    print_outcome(&outcome);
    Ok(())
}

/// Residual-ambiguity warning for a finished outcome, if any.
fn ambiguity_note(outcome: &ClusterOutcome) -> Option<String> {
    outcome.ambiguity.as_ref().map(|report| {
        format!(
            "Warning: more than one best cluster remains; {} (size {}) leads {} (size {}) by only {:.1}%",
            report.largest.center,
            report.largest.size,
            report.runner_up.center,
            report.runner_up.size,
            report.margin * 100.0
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use decluster::workflows::{AmbiguityReport, Contender};

    fn outcome(ambiguity: Option<AmbiguityReport>) -> ClusterOutcome {
        ClusterOutcome {
            threshold: 1.0,
            decoys_total: 19,
            decoys_clustered: 19,
            cluster_count: 2,
            clusters: Vec::new(),
            ambiguity,
        }
    }

    #[test]
    fn residual_ambiguity_produces_a_warning_with_the_margin() {
        let report = AmbiguityReport {
            margin: 0.1,
            largest: Contender {
                center: "a.pdb".to_string(),
                size: 10,
                member_indices: (0..10).collect(),
            },
            runner_up: Contender {
                center: "b.pdb".to_string(),
                size: 9,
                member_indices: (10..19).collect(),
            },
        };
        let note = ambiguity_note(&outcome(Some(report))).unwrap();
        assert!(note.contains("more than one best cluster"));
        assert!(note.contains("a.pdb"));
        assert!(note.contains("b.pdb"));
        assert!(note.contains("10.0%"));
    }

    #[test]
    fn resolved_outcome_produces_no_warning() {
        assert!(ambiguity_note(&outcome(None)).is_none());
    }
}

fn print_outcome(outcome: &ClusterOutcome) {
    println!(
        "Clustered {} of {} decoys at threshold {:.4}; {} clusters found.",
        outcome.decoys_clustered, outcome.decoys_total, outcome.threshold, outcome.cluster_count
    );
    for (rank, cluster) in outcome.clusters.iter().enumerate() {
        println!(
            "cluster {}: size {}, center {}",
            rank + 1,
            cluster.size(),
            cluster.center
        );
        println!("  {}", cluster.members.join(" "));
    }
}
