//! CLI argument parsing for Huella

use crate::config::EngineConfig;
use crate::input::InputFormat;
use crate::sample::Complexity;
use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for computed emissions
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary table (default)
    Text,
    /// JSON array of enriched records
    Json,
    /// CSV, one row per enriched record
    Csv,
    /// CSV of emissions grouped by --group-by
    CsvGroups,
    /// JSON report with records, groups, totals and diagnostics
    Report,
}

#[derive(Parser, Debug)]
#[command(name = "huella")]
#[command(version)]
#[command(about = "Embodied-carbon calculator for building material take-offs", long_about = None)]
pub struct Cli {
    /// Print debug logs to stderr
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compute mass and embodied carbon for a file of material records
    Compute(ComputeArgs),

    /// Write sample material records as JSON
    Sample {
        /// Size of the generated sample
        #[arg(long, value_enum, default_value = "medium")]
        complexity: Complexity,

        /// Write to a file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// List the effective emission-factor table
    Factors {
        /// Factor table TOML (default: built-in table)
        #[arg(long, value_name = "FILE")]
        factors: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
pub struct ComputeArgs {
    /// Input file (JSON array or CSV); `-` reads stdin
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Input encoding (default: from file extension)
    #[arg(long = "input-format", value_enum)]
    pub input_format: Option<InputFormat>,

    /// Output format
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Field to group emissions by
    #[arg(long = "group-by", value_name = "FIELD", default_value = "component")]
    pub group_by: String,

    /// Engine configuration TOML
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Factor table TOML (overrides the config file)
    #[arg(long, value_name = "FILE")]
    pub factors: Option<PathBuf>,

    /// Factor used for materials missing from the table
    #[arg(long = "fallback-factor", value_name = "KG_CO2E_PER_KG")]
    pub fallback_factor: Option<f64>,

    /// Match material names and sub-types ignoring case
    #[arg(long = "case-insensitive")]
    pub case_insensitive: bool,

    /// Skip records without a `component` field
    #[arg(long = "require-component")]
    pub require_component: bool,

    /// Do not print diagnostics to stderr
    #[arg(short, long)]
    pub quiet: bool,

    /// Write to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

impl ComputeArgs {
    /// Config file (if any) with command-line overrides applied
    pub fn engine_config(&self) -> Result<EngineConfig> {
        let mut config = match &self.config {
            Some(path) => EngineConfig::from_toml(path)?,
            None => EngineConfig::default(),
        };

        if let Some(factors) = &self.factors {
            config.factors = Some(factors.clone());
        }
        if let Some(fallback) = self.fallback_factor {
            config.lookup.fallback_factor = fallback;
        }
        if self.case_insensitive {
            config.lookup.case_insensitive = true;
        }
        if self.require_component {
            config.records.require_component = true;
        }

        config.validate().map_err(anyhow::Error::msg)?;
        Ok(config)
    }
}
