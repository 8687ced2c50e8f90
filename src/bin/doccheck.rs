//! doccheck CLI - analyze a document and write the cleaned copy
//!
//! Usage:
//!   doccheck report.xlsx                          # JSON report to stdout
//!   doccheck report.xlsx --mode analysis -o out.xlsx
//!   doccheck scan.pdf --text-output scan.txt      # OCR text (needs ANTHROPIC_API_KEY)

use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use doccheck::config::Config;
use doccheck::ocr::delegate_from_config;
use doccheck::{process_upload, Mode};

/// Success.
const EXIT_SUCCESS: u8 = 0;
/// Input, config or output file could not be read or written.
const EXIT_IO: u8 = 1;
/// The document was analyzed but the optimized spreadsheet could not be built.
const EXIT_OPTIMIZE: u8 = 3;

#[derive(Parser, Debug)]
#[command(name = "doccheck", version, about = "Score office documents and flatten merged spreadsheet cells")]
struct Cli {
    /// Document to analyze (.xlsx, .docx, .pptx, .pdf, .png, .jpg, ...)
    input: PathBuf,

    /// Normalization mode: standard or analysis
    #[arg(short, long)]
    mode: Option<Mode>,

    /// TOML configuration file
    #[arg(short, long, env = "DOCCHECK_CONFIG")]
    config: Option<PathBuf>,

    /// Where to write the optimized spreadsheet
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Where to write extracted text
    #[arg(long)]
    text_output: Option<PathBuf>,

    /// Pretty-print the JSON report
    #[arg(long)]
    pretty: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(code) => ExitCode::from(code),
        Err(message) => {
            eprintln!("Error: {message}");
            ExitCode::from(EXIT_IO)
        }
    }
}

fn run(cli: &Cli) -> Result<u8, String> {
    let config = match &cli.config {
        Some(path) => Config::load(path).map_err(|e| format!("{}: {e}", path.display()))?,
        None => Config::default(),
    }
    .with_env();
    let mode = cli.mode.unwrap_or(config.mode);

    let data = fs::read(&cli.input).map_err(|e| format!("{}: {e}", cli.input.display()))?;
    let filename = cli.input.file_name().map_or_else(
        || cli.input.display().to_string(),
        |name| name.to_string_lossy().into_owned(),
    );

    let ocr = delegate_from_config(&config.ocr).map_err(|e| e.to_string())?;
    let response = process_upload(&filename, &data, mode, ocr.as_ref());

    let json = if cli.pretty {
        serde_json::to_string_pretty(&response)
    } else {
        serde_json::to_string(&response)
    }
    .map_err(|e| format!("JSON serialization: {e}"))?;
    println!("{json}");

    if let (Some(path), Some(artifact)) = (&cli.output, &response.optimized) {
        write_file(path, &artifact.bytes)?;
    }
    if let (Some(path), Some(artifact)) = (&cli.text_output, &response.text) {
        write_file(path, &artifact.bytes)?;
    }

    if cli.output.is_some() && response.optimize_error.is_some() {
        return Ok(EXIT_OPTIMIZE);
    }
    Ok(EXIT_SUCCESS)
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<(), String> {
    fs::write(path, bytes).map_err(|e| format!("{}: {e}", path.display()))?;
    eprintln!("Written: {}", path.display());
    Ok(())
}
