// truerating entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file; the terminal carries the report)
// 2. Load config, copying defaults on first run
// 3. Load inputs and project every player
// 4. Write the JSON report, print the text report

use truerating_app::config;
use truerating_app::report;
use truerating_app::run;
use truerating_app::source::FileSource;

use anyhow::Context;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing
    init_tracing()?;
    info!("truerating starting up");

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: target year {}, base year {}",
        config.run.target_year,
        config
            .run
            .base_year
            .map_or_else(|| "latest in data".to_string(), |y| y.to_string())
    );

    // 3. Load inputs and project
    let source = FileSource::new(config.data_paths.clone());
    let report = run::run(&config, &source)
        .await
        .context("projection run failed")?;

    // 4. Output
    if let Some(path) = &config.output.json {
        report::write_json(path, &report)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        info!("JSON report written to {}", path.display());
    }
    let text =
        report::render_text(&report, config.output.top).context("failed to render report")?;
    print!("{text}");

    info!("truerating finished");
    Ok(())
}

/// Initialize tracing to log to a file (stdout is reserved for the report).
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("truerating.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("truerating=info,truerating_app=info,truerating_engine=info,warn")
        }))
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
