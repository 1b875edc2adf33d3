use clap::{Parser, ValueEnum};
use decluster::core::io::PdbReadOptions;
use decluster::engine::config::{
    ClusterConfig, ClusterConfigBuilder, OutputMode, ThresholdStrategy,
};
use std::path::PathBuf;

use crate::error::{CliError, Result};

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "decluster - Clusters protein decoy sets by pairwise RMSD after optimal superposition and reports the largest clusters of mutually similar structures.",
    help_template = HELP_TEMPLATE,
)]
pub struct Cli {
    /// Path to the decoy list file naming one PDB file per line.
    #[arg(value_name = "LIST")]
    pub decoy_list: PathBuf,

    /// Fixed clustering threshold in Angstroms; skips threshold estimation.
    #[arg(value_name = "THRESHOLD")]
    pub threshold: Option<f64>,

    /// Threshold estimation strategy (ignored when THRESHOLD is given).
    #[arg(short = 't', long, value_enum, default_value = "percentile")]
    pub strategy: Strategy,

    /// Strategy parameter x; each strategy has its own default.
    #[arg(short = 'x', long, value_name = "FLOAT")]
    pub parameter: Option<f64>,

    /// Keep decoys that the outlier filter would remove.
    #[arg(long)]
    pub no_filter: bool,

    /// Report every cluster instead of the largest three.
    #[arg(short, long, conflicts_with = "top")]
    pub all: bool,

    /// Report only the largest N clusters.
    #[arg(long, value_name = "N")]
    pub top: Option<usize>,

    /// Chain identifiers to read C-alpha atoms from.
    #[arg(long, value_name = "CHAINS", default_value = "AC ")]
    pub chains: String,

    /// C-alpha range to keep, as START or START,END (1-based, inclusive).
    #[arg(long, value_name = "RANGE", value_parser = parse_residue_range)]
    pub residues: Option<ResidueRange>,

    /// Relative size gap below which the top-two clusters count as ambiguous.
    #[arg(long, value_name = "FLOAT", default_value_t = 0.15)]
    pub margin: f64,

    /// Seed for the sampling-based estimation stages.
    #[arg(long, value_name = "INT")]
    pub seed: Option<u64>,

    /// Skip the automatic refined re-run on an ambiguous result.
    #[arg(long)]
    pub no_refine: bool,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Percentile of sampled pairwise distances.
    Percentile,
    /// Most frequent sampled distance, scaled.
    MostFrequent,
    /// Smallest average distance to the rest, scaled.
    MinAvgDist,
    /// Densest-neighborhood heuristic over the full set.
    Rosetta,
    /// The same heuristic over bounded random samples.
    SampledRosetta,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResidueRange {
    pub first: usize,
    pub last: Option<usize>,
}

fn parse_residue_range(raw: &str) -> std::result::Result<ResidueRange, String> {
    let parse = |s: &str| {
        s.trim()
            .parse::<usize>()
            .map_err(|_| format!("'{s}' is not a valid residue index"))
    };
    let (first, last) = match raw.split_once(',') {
        Some((a, b)) => (parse(a)?, Some(parse(b)?)),
        None => (parse(raw)?, None),
    };
    if first == 0 {
        return Err("residue indices are 1-based".to_string());
    }
    if let Some(last) = last {
        if last < first {
            return Err(format!("range end {last} precedes start {first}"));
        }
    }
    Ok(ResidueRange { first, last })
}

impl Cli {
    /// Resolves the argument set into an engine configuration.
    pub fn cluster_config(&self) -> Result<ClusterConfig> {
        let strategy = match self.threshold {
            Some(t) => ThresholdStrategy::Fixed(t),
            None => match self.strategy {
                Strategy::Percentile => ThresholdStrategy::Percentile,
                Strategy::MostFrequent => ThresholdStrategy::MostFrequent,
                Strategy::MinAvgDist => ThresholdStrategy::MinAvgDist,
                Strategy::Rosetta => ThresholdStrategy::Rosetta,
                Strategy::SampledRosetta => ThresholdStrategy::SampledRosetta,
            },
        };

        let output = if self.all {
            OutputMode::All
        } else {
            OutputMode::Top(self.top.unwrap_or(3))
        };

        let mut builder = ClusterConfigBuilder::new()
            .strategy(strategy)
            .filter_outliers(!self.no_filter)
            .output(output)
            .ambiguity_margin(self.margin);
        if let Some(x) = self.parameter {
            builder = builder.strategy_parameter(x);
        }
        if let Some(seed) = self.seed {
            builder = builder.seed(seed);
        }
        Ok(builder.build()?)
    }

    pub fn read_options(&self) -> Result<PdbReadOptions> {
        if self.chains.is_empty() {
            return Err(CliError::Argument(
                "at least one chain identifier is required".to_string(),
            ));
        }
        let range = self.residues.unwrap_or(ResidueRange {
            first: 1,
            last: None,
        });
        Ok(PdbReadOptions {
            chains: self.chains.clone(),
            first_ca: range.first,
            last_ca: range.last,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("decluster").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn positional_threshold_selects_the_fixed_strategy() {
        let cli = parse(&["decoys.lst", "1.5"]);
        let config = cli.cluster_config().unwrap();
        assert_eq!(config.strategy, ThresholdStrategy::Fixed(1.5));
    }

    #[test]
    fn default_output_is_the_top_three_clusters() {
        let cli = parse(&["decoys.lst"]);
        let config = cli.cluster_config().unwrap();
        assert_eq!(config.output, OutputMode::Top(3));
    }

    #[test]
    fn all_flag_reports_every_cluster() {
        let cli = parse(&["decoys.lst", "--all"]);
        let config = cli.cluster_config().unwrap();
        assert_eq!(config.output, OutputMode::All);
    }

    #[test]
    fn residue_range_accepts_start_only_and_start_end() {
        assert_eq!(
            parse_residue_range("5").unwrap(),
            ResidueRange {
                first: 5,
                last: None
            }
        );
        assert_eq!(
            parse_residue_range("5,20").unwrap(),
            ResidueRange {
                first: 5,
                last: Some(20)
            }
        );
    }

    #[test]
    fn inverted_residue_range_is_rejected() {
        assert!(parse_residue_range("20,5").is_err());
        assert!(parse_residue_range("0").is_err());
    }

    #[test]
    fn no_filter_disables_outlier_filtering() {
        let cli = parse(&["decoys.lst", "--no-filter"]);
        let config = cli.cluster_config().unwrap();
        assert!(!config.filter_outliers);
    }
}
