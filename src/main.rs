use anyhow::{Context, Result};
use clap::Parser;
use huella::cli::{Cli, Command, ComputeArgs, OutputFormat};
use huella::config::LookupOptions;
use huella::csv_output::{CsvOutput, CsvStatsOutput};
use huella::factors::EmissionFactorTable;
use huella::json_output::{self, JsonReport};
use huella::{input, sample, stats};
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Write to the output file, or stdout when none is given
fn write_output(output: Option<&Path>, content: &str) -> Result<()> {
    match output {
        Some(path) => fs::write(path, content)
            .with_context(|| format!("Failed to write output: {}", path.display())),
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(content.as_bytes())?;
            stdout.flush()?;
            Ok(())
        }
    }
}

/// Print the effective factor table
fn render_factor_table(table: &EmissionFactorTable) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<22} {:<11} {:<24} {:>10}\n",
        "material", "family", "sub-type", "kgCO2e/kg"
    ));
    out.push_str(&format!("{}\n", "─".repeat(70)));
    for material in table.materials() {
        for (material_type, factor) in material.sub_types() {
            out.push_str(&format!(
                "{:<22} {:<11} {:<24} {:>10.3}\n",
                material.name,
                material.family.as_str(),
                material_type,
                factor
            ));
        }
    }
    out.push_str(&format!(
        "\nFallback factor for unknown pairs: {}\n",
        table.fallback_factor()
    ));
    out
}

/// Run the emissions computation for one input file
fn run_compute(args: &ComputeArgs) -> Result<()> {
    let config = args.engine_config()?;
    let engine = config.build_engine()?;

    let records = input::read_records(&args.input, args.input_format)?;
    let computation = engine.compute(&records);

    if !args.quiet {
        for diagnostic in &computation.diagnostics {
            eprintln!("warning: {}", diagnostic);
        }
    }

    let content = match args.format {
        OutputFormat::Text => {
            let groups = computation.group_by(&args.group_by);
            stats::render_summary(&groups, &computation.totals(), &args.group_by)
        }
        OutputFormat::Json => {
            let mut json = json_output::records_to_json(&computation)?;
            json.push('\n');
            json
        }
        OutputFormat::Csv => CsvOutput::from_records(&computation.enriched).to_csv(),
        OutputFormat::CsvGroups => {
            let mut csv = CsvStatsOutput::new(&args.group_by);
            for group in computation.group_by(&args.group_by) {
                csv.add_group(group);
            }
            csv.to_csv()
        }
        OutputFormat::Report => {
            let mut json = JsonReport::new(&computation, &args.group_by).to_json_pretty()?;
            json.push('\n');
            json
        }
    };

    write_output(args.output.as_deref(), &content)
}

fn main() -> Result<()> {
    let args = Cli::parse();

    // Initialize tracing if --debug flag is set
    init_tracing(args.debug);

    match args.command {
        Command::Compute(compute) => run_compute(&compute),
        Command::Sample { complexity, output } => {
            let mut json = serde_json::to_string_pretty(&sample::generate(complexity))?;
            json.push('\n');
            write_output(output.as_deref(), &json)
        }
        Command::Factors { factors } => {
            let table = match factors {
                Some(path) => EmissionFactorTable::from_toml(path, LookupOptions::default())?,
                None => EmissionFactorTable::builtin()?,
            };
            write_output(None, &render_factor_table(&table))
        }
    }
}
