mod config;
mod domain;
mod feed;
mod repository;
mod telegram;
mod watcher;

use std::future::Future;
use std::process::ExitCode;

use anyhow::Context;
use config::{Config, ConfigError};
use domain::RunOutcome;
use feed::HttpFeedSource;
use repository::FileLastSeenRepository;
use telegram::TelegramNotifier;
use watcher::{MessageFormat, Watcher};

const EXIT_UNEXPECTED: u8 = 1;
const EXIT_CONFIG: u8 = 2;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let result = match Config::load() {
        Ok(config) => {
            log::debug!("Loaded {:?}", config);
            guarded(async move { run(&config).await }).await
        }
        Err(err) => Err(err.into()),
    };
    report(&result);
    ExitCode::from(exit_status(&result))
}

/// Runs the pass on its own task so a panic comes back as an error.
async fn guarded<F>(run: F) -> anyhow::Result<RunOutcome>
where
    F: Future<Output = anyhow::Result<RunOutcome>> + Send + 'static,
{
    tokio::spawn(run).await.context("watcher task aborted")?
}

// Fetch and delivery failures are retried by the next scheduled run.
fn exit_status(result: &anyhow::Result<RunOutcome>) -> u8 {
    match result {
        Ok(_) => 0,
        Err(err) if err.is::<ConfigError>() => EXIT_CONFIG,
        Err(_) => EXIT_UNEXPECTED,
    }
}

fn report(result: &anyhow::Result<RunOutcome>) {
    match result {
        Ok(RunOutcome::Initialized {
            identifier,
            persisted: true,
        }) => log::info!("Stored {} as the starting point", identifier),
        Ok(RunOutcome::Initialized {
            identifier,
            persisted: false,
        }) => log::warn!("{} could not be stored; the next run starts over", identifier),
        Ok(RunOutcome::Notified {
            identifier,
            persisted: false,
        }) => log::warn!("{} was delivered but not stored", identifier),
        Ok(RunOutcome::NotifyFailed { identifier }) => {
            log::warn!("{} will be retried on the next run", identifier)
        }
        Ok(other) => log::debug!("Run finished with {:?}", other),
        Err(err) if err.is::<ConfigError>() => log::error!(
            "Invalid configuration: {}. TELEGRAM_BOT_TOKEN and TELEGRAM_CHAT_ID are required",
            err
        ),
        Err(err) => log::error!("Unexpected failure: {:#}", err),
    }
}

async fn run(config: &Config) -> anyhow::Result<RunOutcome> {
    let source = HttpFeedSource::new(&config.rss_url, &config.user_agent, config.feed_timeout())?;
    let notifier = TelegramNotifier::new(
        &config.telegram_api_url,
        &config.telegram_bot_token,
        &config.telegram_chat_id,
        config.notify_timeout(),
    )?;
    let repository = FileLastSeenRepository::new(&config.last_seen_file);
    log::info!(
        "Watching {} (state in {})",
        config.rss_url,
        repository.path().display()
    );

    let mut watcher = Watcher::new(
        source,
        notifier,
        repository,
        MessageFormat {
            header: config.message_header.clone(),
            summary_max_chars: config.summary_max_chars,
        },
    );
    Ok(watcher.run_once().await)
}
