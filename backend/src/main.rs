//! Rebate Formatter CLI - Restructure rebate lumpsum CSV exports
//!
//! # Commands
//!
//! ```bash
//! rebate-formatter serve                       # Start HTTP server (port 8000)
//! rebate-formatter process a.csv b.csv         # Restructure files on disk
//! rebate-formatter validate input.csv          # Check the required columns
//! rebate-formatter columns                     # Print the column contract
//! ```
//!
//! Settings not given on the command line come from the environment
//! (`REBATE_*`, optionally through a `.env` file).

use clap::{Parser, Subcommand};
use rebate_formatter::{
    config::AppConfig,
    logging::{init_logging, LogConfig},
    parse_file_auto, process_path, validate_columns, BatchTotals, GroupOrder, ProcessOptions,
    DATE_COLUMNS, DETAIL_COLUMNS, REQUIRED_COLUMNS,
};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "rebate-formatter")]
#[command(about = "Group rebate lumpsum rows under synthetic header rows", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start HTTP server
    Serve {
        /// Port to listen on (default: REBATE_PORT or 8000)
        #[arg(short, long)]
        port: Option<u16>,

        /// Address to bind (default: REBATE_HOST or 0.0.0.0)
        #[arg(long)]
        host: Option<String>,
    },

    /// Restructure one or more CSV files on disk
    Process {
        /// Input CSV files
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output directory (default: REBATE_OUTPUT_DIR)
        #[arg(short, long)]
        out_dir: Option<PathBuf>,

        /// Group order: first-seen or lexical
        #[arg(long)]
        order: Option<GroupOrder>,
    },

    /// Report the required columns missing from a CSV file
    Validate {
        /// Input CSV file
        input: PathBuf,
    },

    /// Show the required-column contract
    Columns,
}

impl Commands {
    /// Whether the command reads `REBATE_*` settings.
    fn needs_config(&self) -> bool {
        matches!(self, Commands::Serve { .. } | Commands::Process { .. })
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Only commands that use settings fail on a malformed `REBATE_*` value.
    let config = if cli.command.needs_config() {
        match AppConfig::from_env() {
            Ok(config) => config,
            Err(e) => {
                eprintln!("❌ Error: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        AppConfig::default()
    };

    // The server keeps a log file; one-shot commands log to stdout only.
    let log_config = match cli.command {
        Commands::Serve { .. } => LogConfig::from(&config),
        _ => LogConfig::default(),
    };
    if let Err(e) = init_logging(&log_config) {
        eprintln!("⚠️  Logging to file disabled: {}", e);
        let _ = init_logging(&LogConfig::default());
    }

    let result = match cli.command {
        Commands::Serve { port, host } => cmd_serve(config, port, host).await,

        Commands::Process {
            inputs,
            out_dir,
            order,
        } => cmd_process(&config, &inputs, out_dir.as_deref(), order),

        Commands::Validate { input } => cmd_validate(&input),

        Commands::Columns => cmd_columns(),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

async fn cmd_serve(
    mut config: AppConfig,
    port: Option<u16>,
    host: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(port) = port {
        config.port = port;
    }
    if let Some(host) = host {
        config.host = host;
    }
    rebate_formatter::api::start_server(&config).await?;
    Ok(())
}

fn cmd_process(
    config: &AppConfig,
    inputs: &[PathBuf],
    out_dir: Option<&Path>,
    order: Option<GroupOrder>,
) -> Result<(), Box<dyn std::error::Error>> {
    let out_dir = out_dir.unwrap_or(&config.output_dir);
    fs::create_dir_all(out_dir)?;

    let options = ProcessOptions {
        order: order.unwrap_or(config.group_order),
    };

    let mut totals = BatchTotals::default();
    let mut failed = 0;

    for input in inputs {
        let name = input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "input.csv".to_string());
        let output = out_dir.join(format!("processed-{}", name));

        eprintln!("📄 Processing: {}", input.display());
        match process_path(input, &output, &options) {
            Ok(metrics) => {
                eprintln!("   Rows in: {}", metrics.input_rows);
                eprintln!("   Rebates: {}", metrics.distinct_rebates);
                eprintln!("   Headers: {}", metrics.header_count);
                eprintln!("   Lumpsum: {}", metrics.lumpsum_count);
                eprintln!("   💾 Output written to: {}", output.display());
                totals.files_processed += 1;
                totals.total_headers += metrics.header_count;
                totals.total_lumpsum += metrics.lumpsum_count;
                totals.total_output_rows += metrics.output_rows;
            }
            Err(e) => {
                failed += 1;
                eprintln!("   ❌ {}", e);
                if let Some(missing) = e.missing_columns() {
                    for col in missing {
                        eprintln!("     - missing: {}", col);
                    }
                }
            }
        }
    }

    eprintln!(
        "\n📊 Results: {} processed, {} failed, {} headers, {} lumpsum, {} rows",
        totals.files_processed,
        failed,
        totals.total_headers,
        totals.total_lumpsum,
        totals.total_output_rows
    );

    if failed > 0 {
        return Err(format!("{} file(s) failed", failed).into());
    }
    Ok(())
}

fn cmd_validate(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("✔️  Validating: {}", input.display());

    let parsed = parse_file_auto(input)?;
    eprintln!("   Columns: {}", parsed.table.columns.join(", "));

    let missing = validate_columns(&parsed.table, &REQUIRED_COLUMNS);
    if missing.is_empty() {
        eprintln!("✅ All {} required columns present", REQUIRED_COLUMNS.len());
        return Ok(());
    }

    eprintln!("\n❌ Missing {} column(s):", missing.len());
    for col in &missing {
        eprintln!("   - {}", col);
    }
    std::process::exit(1);
}

fn cmd_columns() -> Result<(), Box<dyn std::error::Error>> {
    println!("Required columns:");
    for col in REQUIRED_COLUMNS {
        let mut notes = Vec::new();
        if DATE_COLUMNS.contains(&col) {
            notes.push("date");
        }
        if DETAIL_COLUMNS.contains(&col) {
            notes.push("blank on headers");
        }
        if notes.is_empty() {
            println!("  {}", col);
        } else {
            println!("  {} ({})", col, notes.join(", "));
        }
    }
    Ok(())
}
