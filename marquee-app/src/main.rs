use anyhow::{Context, Result};
use clap::Parser;
use marquee_common::observability::init_logging;
use marquee_config::{MarqueeConfig, MarqueeConfigLoader};
use marquee_pipeline::{SearchQuery, StageResult};
use marquee_runtime::MarqueeRuntime;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

mod wiring;

#[derive(Parser)]
#[command(name = "marquee")]
#[command(about = "Search a ticketing site and extract structured event listings")]
struct Cli {
    /// Search term; prompts on stdin when omitted
    #[arg(long)]
    query: Option<String>,

    /// YAML configuration file (optional)
    #[arg(long, default_value = "marquee.yaml")]
    config: PathBuf,

    /// Where to write the extracted events
    #[arg(long)]
    output: Option<PathBuf>,

    /// Run the browser without a window
    #[arg(long)]
    headless: bool,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // 1) Load config (env wins), then apply CLI overrides
    let mut cfg: MarqueeConfig = MarqueeConfigLoader::new()
        .with_file(&cli.config)
        .load()
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    if let Some(output) = cli.output {
        cfg.output.path = output;
    }
    if cli.headless {
        cfg.scraper.headless = true;
    }

    let log_path = init_logging(wiring::log_config(&cfg.logging))?;
    tracing::debug!(target: "marquee.orchestrator", log = %log_path.display(), "logging initialised");

    let query = match cli.query {
        Some(raw) => SearchQuery::with_default(&raw, &cfg.query.default),
        None => prompt_for_query(&cfg.query.default)?,
    };

    let orchestrator = wiring::build_orchestrator(&cfg)?;
    let runtime = MarqueeRuntime::current_thread()?;
    let result = runtime.block_on(orchestrator.process_event(query));
    runtime.shutdown(Duration::from_secs(1));

    match result {
        StageResult::Success(records) => {
            println!("{}", serde_json::to_string_pretty(&records)?);
            Ok(ExitCode::SUCCESS)
        }
        StageResult::Failure(error) => {
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({ "error": error }))?
            );
            Ok(ExitCode::FAILURE)
        }
    }
}

fn prompt_for_query(default: &str) -> Result<SearchQuery> {
    let mut stdout = std::io::stdout();
    write!(stdout, "Enter search query for events (default: {default}): ")?;
    stdout.flush()?;

    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(SearchQuery::with_default(&line, default))
}
