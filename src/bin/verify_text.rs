//! Score text from the command line and print the result as pretty JSON.
//!
//!   verify-text "Some claim https://example.org"
//!   cat article.txt | verify-text --oracle

use std::io::Read;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;

use misinfo_verifier::analyze::heuristic::score_content;
use misinfo_verifier::{cache, config::ENV_CONFIG_PATH, logging, oracle, AppConfig, Verifier};

#[derive(Parser, Debug)]
#[command(name = "verify-text", about = "Credibility check for a piece of text")]
struct Opts {
    /// Text to analyze; read from stdin when omitted
    content: Option<String>,

    /// Use the configured oracle (with heuristic fallback) instead of the local scorer
    #[arg(long)]
    oracle: bool,

    /// Config file for --oracle
    #[arg(long, env = ENV_CONFIG_PATH)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    logging::init();

    let opts = Opts::parse();
    let content = match opts.content {
        Some(c) => c,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read stdin")?;
            buf
        }
    };
    if content.trim().is_empty() {
        bail!("no content given");
    }

    let result = if opts.oracle {
        let cfg = match &opts.config {
            Some(p) => AppConfig::load_from_file(p)?,
            None => AppConfig::load()?,
        };
        let verifier = Verifier::new(
            oracle::build_oracle(&cfg.oracle),
            cache::build_cache(&cfg.cache),
            cfg.oracle.clone(),
        );
        verifier.analyze_text(&content).await?.result
    } else {
        score_content(&content)
    };

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
