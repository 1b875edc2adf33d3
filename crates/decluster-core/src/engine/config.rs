use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Ambiguity margin {0} must lie in (0, 1)")]
    InvalidMargin(f64),

    #[error("Strategy parameter {0} must be positive and finite")]
    InvalidStrategyParameter(f64),

    #[error("Fixed threshold {0} must be positive and finite")]
    InvalidFixedThreshold(f64),

    #[error("Top-cluster count must be at least 1")]
    InvalidClusterCount,
}

/// How the similarity threshold is derived.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ThresholdStrategy {
    /// T = x-th percentile of sampled pairwise distances. The default x is
    /// derived from the decoy count unless a parameter is supplied.
    Percentile,
    /// T = min + x·(most frequent distance − min), default x = 2/3.
    MostFrequent,
    /// T = x·(minimum over decoys of the average distance to the others),
    /// default x = 2/3.
    MinAvgDist,
    /// External-tool-compatible heuristic with auto-detected parameters,
    /// evaluated over the full set.
    Rosetta,
    /// Same heuristic evaluated over a bounded random sample.
    SampledRosetta,
    /// User-supplied threshold, used directly.
    Fixed(f64),
}

/// How many clusters the extractor reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Run extraction to completion and report every cluster.
    All,
    /// Report only the largest N clusters (extraction still runs until the
    /// margin bookkeeping is satisfied).
    Top(usize),
}

/// Configuration for one clustering run.
///
/// An explicit struct passed into the pipeline entry point; nothing here is
/// process-wide state, so repeated runs with different settings can coexist.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterConfig {
    pub strategy: ThresholdStrategy,
    /// Strategy parameter x; `None` selects the strategy's default.
    pub strategy_parameter: Option<f64>,
    /// Remove decoys far from everything before building the graph.
    pub filter_outliers: bool,
    pub output: OutputMode,
    /// Relative size gap between the two largest clusters below which the
    /// result is flagged ambiguous.
    pub ambiguity_margin: f64,
    /// Seed for sampling-based estimation; `None` draws from entropy.
    pub seed: Option<u64>,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            strategy: ThresholdStrategy::Percentile,
            strategy_parameter: None,
            filter_outliers: true,
            output: OutputMode::Top(3),
            ambiguity_margin: 0.15,
            seed: None,
        }
    }
}

#[derive(Debug, Default)]
pub struct ClusterConfigBuilder {
    strategy: Option<ThresholdStrategy>,
    strategy_parameter: Option<f64>,
    filter_outliers: Option<bool>,
    output: Option<OutputMode>,
    ambiguity_margin: Option<f64>,
    seed: Option<u64>,
}

impl ClusterConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn strategy(mut self, strategy: ThresholdStrategy) -> Self {
        self.strategy = Some(strategy);
        self
    }

    pub fn strategy_parameter(mut self, x: f64) -> Self {
        self.strategy_parameter = Some(x);
        self
    }

    pub fn filter_outliers(mut self, enabled: bool) -> Self {
        self.filter_outliers = Some(enabled);
        self
    }

    pub fn output(mut self, output: OutputMode) -> Self {
        self.output = Some(output);
        self
    }

    pub fn ambiguity_margin(mut self, margin: f64) -> Self {
        self.ambiguity_margin = Some(margin);
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn build(self) -> Result<ClusterConfig, ConfigError> {
        let defaults = ClusterConfig::default();

        let strategy = self.strategy.unwrap_or(defaults.strategy);
        if let ThresholdStrategy::Fixed(t) = strategy {
            if !t.is_finite() || t <= 0.0 {
                return Err(ConfigError::InvalidFixedThreshold(t));
            }
        }

        if let Some(x) = self.strategy_parameter {
            if !x.is_finite() || x <= 0.0 {
                return Err(ConfigError::InvalidStrategyParameter(x));
            }
        }

        let margin = self.ambiguity_margin.unwrap_or(defaults.ambiguity_margin);
        if !margin.is_finite() || margin <= 0.0 || margin >= 1.0 {
            return Err(ConfigError::InvalidMargin(margin));
        }

        let output = self.output.unwrap_or(defaults.output);
        if let OutputMode::Top(0) = output {
            return Err(ConfigError::InvalidClusterCount);
        }

        Ok(ClusterConfig {
            strategy,
            strategy_parameter: self.strategy_parameter,
            filter_outliers: self.filter_outliers.unwrap_or(defaults.filter_outliers),
            output,
            ambiguity_margin: margin,
            seed: self.seed,
        })
    }
}
