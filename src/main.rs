//! Command-line entry point: mine the local VAERS files and write both tables.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, Level};

use vaers_patterns::itemsets::Algorithm;
use vaers_patterns::pipeline::{self, InputPaths, OutputPaths};
use vaers_patterns::{MiningConfig, RuleMetric};

#[derive(Parser)]
#[command(name = "vaers-patterns")]
#[command(about = "Frequent itemsets and association rules from VAERS reports")]
struct Args {
    /// Case table (VAERSDATA)
    #[arg(long, default_value = "../data/2021VAERSDATA.csv")]
    data: PathBuf,

    /// Symptom table (VAERSSYMPTOMS)
    #[arg(long, default_value = "../data/2021VAERSSYMPTOMS.csv")]
    symptoms: PathBuf,

    /// Vaccine table (VAERSVAX)
    #[arg(long, default_value = "../data/2021VAERSVAX.csv")]
    vax: PathBuf,

    #[arg(long, default_value = "freq_itemsets.csv")]
    freq_itemsets_output: PathBuf,

    #[arg(long, default_value = "assoc_rules.csv")]
    assoc_rules_output: PathBuf,

    /// JSON file with mining options; flags below override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(long)]
    min_support: Option<f64>,

    /// support, confidence, lift, leverage or conviction
    #[arg(long)]
    metric: Option<RuleMetric>,

    #[arg(long)]
    min_threshold: Option<f64>,

    /// Largest itemset to report
    #[arg(long)]
    max_len: Option<usize>,

    /// fpgrowth or apriori
    #[arg(long)]
    algorithm: Option<Algorithm>,

    /// trace, debug, info, warn or error
    #[arg(long, default_value = "info")]
    log_level: Level,
}

impl Args {
    fn mining_config(&self) -> Result<MiningConfig> {
        let mut config = match &self.config {
            Some(path) => MiningConfig::from_json_file(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?,
            None => MiningConfig::default(),
        };

        if let Some(min_support) = self.min_support {
            config.freq_itemsets_min_support = min_support;
        }
        if let Some(metric) = self.metric {
            config.assoc_rule_metric = metric;
        }
        if let Some(min_threshold) = self.min_threshold {
            config.assoc_rule_min_threshold = min_threshold;
        }
        if self.max_len.is_some() {
            config.max_len = self.max_len;
        }
        if let Some(algorithm) = self.algorithm {
            config.algorithm = algorithm;
        }

        config.validate().context("invalid mining options")?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt().with_max_level(args.log_level).init();

    let config = args.mining_config()?;
    let inputs = InputPaths {
        data: args.data,
        symptoms: args.symptoms,
        vax: args.vax,
    };
    let outputs = OutputPaths {
        freq_itemsets: args.freq_itemsets_output,
        assoc_rules: args.assoc_rules_output,
    };

    let result = pipeline::run(&inputs, &outputs, &config).context("mining run failed")?;
    info!(
        "Done: {} frequent itemsets, {} association rules",
        result.itemsets.len(),
        result.rules.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(flags: &[&str]) -> std::result::Result<Args, clap::Error> {
        Args::try_parse_from(std::iter::once("vaers-patterns").chain(flags.iter().copied()))
    }

    #[test]
    fn log_level_defaults_to_info() {
        assert!(matches!(parse(&[]), Ok(args) if args.log_level == Level::INFO));
        assert!(matches!(parse(&["--log-level", "debug"]), Ok(args) if args.log_level == Level::DEBUG));
    }

    #[test]
    fn unknown_log_level_is_rejected() {
        assert!(parse(&["--log-level", "verbose"]).is_err());
    }

    #[test]
    fn flags_override_defaults() {
        let config = match parse(&["--min-support", "0.05", "--metric", "lift", "--max-len", "3"]) {
            Ok(args) => args.mining_config().unwrap(),
            Err(err) => panic!("{}", err),
        };
        assert_eq!(config.freq_itemsets_min_support, 0.05);
        assert_eq!(config.assoc_rule_metric, RuleMetric::Lift);
        assert_eq!(config.max_len, Some(3));
        assert_eq!(config.assoc_rule_min_threshold, 0.8);
    }

    #[test]
    fn invalid_override_fails_validation() {
        let args = match parse(&["--min-support", "1.5"]) {
            Ok(args) => args,
            Err(err) => panic!("{}", err),
        };
        assert!(args.mining_config().is_err());
    }
}
