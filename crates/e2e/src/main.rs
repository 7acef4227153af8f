//! Verification harness entry point
//!
//! Runs the scenario catalogue against a running shop.
//! Run with: cargo run --package tourpay-e2e -- --tag ui

use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tourpay_common::{CardFactory, ExpiryCalendar, Faker};
use tourpay_e2e::playwright::{Browser, PlaywrightConfig, PlaywrightLauncher};
use tourpay_e2e::runner::TestSuiteResult;
use tourpay_e2e::{catalogue, E2eError, E2eResult, HarnessConfig, ScenarioRunner};

#[derive(Parser, Debug)]
#[command(name = "tourpay-e2e")]
#[command(about = "End-to-end verification of the tour purchase card flow")]
struct Args {
    /// Harness configuration file
    #[arg(short, long, default_value = "tourpay-e2e.toml")]
    config: PathBuf,

    /// Base URL of the shop
    #[arg(long)]
    base_url: Option<String>,

    /// Shop database: SQLite file, postgresql:// or mysql:// URL
    #[arg(long)]
    db_url: Option<String>,

    /// Run only scenarios carrying this tag
    #[arg(short, long)]
    tag: Option<String>,

    /// Run only a specific scenario by name
    #[arg(short, long)]
    name: Option<String>,

    /// Language the shop renders (en, ru)
    #[arg(long)]
    locale: Option<String>,

    /// Browser to use (chromium, firefox, webkit)
    #[arg(long)]
    browser: Option<String>,

    /// Show the browser window
    #[arg(long)]
    headed: bool,

    /// Seed for generated card data
    #[arg(long, env = "TOURPAY_SEED")]
    seed: Option<u64>,

    /// Output directory for results
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the scenario catalogue and exit
    #[arg(long)]
    list: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() {
    let args = Args::parse();
    init_logging(args.log_json);

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: failed to create tokio runtime: {}", e);
            std::process::exit(2);
        }
    };

    match rt.block_on(async_main(args)) {
        Ok(true) => std::process::exit(0),
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    }
}

fn load_config(args: &Args) -> E2eResult<HarnessConfig> {
    let mut config = HarnessConfig::load(&args.config)?;
    config.apply_env()?;

    if let Some(url) = &args.base_url {
        config.base_url = url.clone();
    }
    if let Some(url) = &args.db_url {
        config.db.url = url.clone();
    }
    if let Some(locale) = &args.locale {
        config.ui.locale = locale.parse().map_err(E2eError::Config)?;
    }
    if let Some(browser) = &args.browser {
        config.ui.browser = browser.parse::<Browser>().map_err(E2eError::Config)?;
    }
    if args.headed {
        config.ui.headless = false;
    }
    if let Some(seed) = args.seed {
        config.run.seed = Some(seed);
    }
    if let Some(output) = &args.output {
        config.run.output_dir = output.clone();
    }

    config.validate()?;
    Ok(config)
}

async fn async_main(args: Args) -> E2eResult<bool> {
    let config = load_config(&args)?;

    let faker = match config.run.seed {
        Some(seed) => Faker::seeded(seed),
        None => Faker::new(),
    };
    let mut factory = CardFactory::new(ExpiryCalendar::today(), faker);
    let scenarios = catalogue(&mut factory);

    if args.list {
        for s in &scenarios {
            println!("{:<36} [{}] {}", s.name, s.tags.join(","), s.expected);
        }
        return Ok(true);
    }

    info!("Verifying {} ({} locale)", config.base_url, config.ui.locale.as_str());

    let launcher = PlaywrightLauncher::new(PlaywrightConfig::from(&config.ui));
    let mut runner = ScenarioRunner::new(config, Box::new(launcher))?;

    let results = if let Some(name) = &args.name {
        let result = runner.run_named(&scenarios, name).await?;
        TestSuiteResult {
            total: 1,
            passed: usize::from(result.success),
            failed: usize::from(!result.success),
            duration_ms: result.duration_ms,
            results: vec![result],
        }
    } else if let Some(tag) = &args.tag {
        runner.run_tagged(&scenarios, tag).await?
    } else {
        runner.run_all(&scenarios).await?
    };

    runner.write_results(&results)?;

    Ok(results.all_passed())
}
