use anyhow::{Context, Result};
use batch_match::catalog::{load_catalog, QuantityHints};
use batch_match::errors::error_logging;
use batch_match::observability;
use batch_match::{AppConfig, MatchSession};
use std::env;
use std::fs;
use std::path::PathBuf;
use tracing::info;

const USAGE: &str =
    "Usage: batch-match <catalog.json> <ocr-text-file> [--top] [--hints <hints.json>]";

/// Command line arguments
#[derive(Debug)]
struct CliArgs {
    catalog_path: PathBuf,
    text_path: PathBuf,
    top_ranked: bool,
    hints_path: Option<PathBuf>,
}

/// Parse command line arguments
fn parse_args(args: impl IntoIterator<Item = String>) -> Result<CliArgs> {
    let mut positional = Vec::new();
    let mut top_ranked = false;
    let mut hints_path = None;

    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--top" => top_ranked = true,
            "--hints" => {
                let path = args
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--hints requires a file path. {}", USAGE))?;
                hints_path = Some(PathBuf::from(path));
            }
            "-h" | "--help" => return Err(anyhow::anyhow!(USAGE)),
            other if other.starts_with("--") => {
                return Err(anyhow::anyhow!("Unknown option '{}'. {}", other, USAGE))
            }
            _ => positional.push(PathBuf::from(arg)),
        }
    }

    if positional.len() != 2 {
        return Err(anyhow::anyhow!(USAGE));
    }
    let text_path = positional.pop().context("missing OCR text path")?;
    let catalog_path = positional.pop().context("missing catalog path")?;

    Ok(CliArgs {
        catalog_path,
        text_path,
        top_ranked,
        hints_path,
    })
}

fn main() -> Result<()> {
    // Usage errors must not depend on the environment
    let args = parse_args(env::args().skip(1))?;

    dotenvy::dotenv().ok();

    let config = AppConfig::from_env()?;
    if let Err(e) = config.validate() {
        error_logging::log_config_error(&e, "BATCH_MATCH_*", "startup");
        return Err(e.into());
    }

    observability::init_tracing(&config.observability)?;
    info!("{}", config.summary());

    let catalog = load_catalog(&args.catalog_path)
        .with_context(|| format!("Failed to load catalog {}", args.catalog_path.display()))?;
    let extracted_text = fs::read_to_string(&args.text_path)
        .with_context(|| format!("Failed to read {}", args.text_path.display()))?;

    let session = MatchSession::new(config.matching)?;

    let output = if args.top_ranked {
        let hints = match &args.hints_path {
            Some(path) => {
                let content = fs::read_to_string(path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                Some(QuantityHints::from_json(&content)?)
            }
            None => None,
        };
        let ranked = session.find_top_ranked(&extracted_text, &catalog, hints.as_ref());
        serde_json::to_string_pretty(&ranked)?
    } else {
        let outcome = session.find_matches(&extracted_text, &catalog)?;
        serde_json::to_string_pretty(&outcome)?
    };

    println!("{}", output);
    session.clear_caches();
    Ok(())
}
