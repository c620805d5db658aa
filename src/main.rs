use std::sync::Arc;

use anyhow::Result;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use matchday_tips::config::{self, Config};
use matchday_tips::forum::ForumClient;
use matchday_tips::workers::LeagueWorker;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "matchday_tips=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting matchday-tips");

    // Load configuration
    let config = Config::from_env()?;
    let leagues = config::load_leagues(&config.leagues_file)?;
    info!("{} leagues configured", leagues.len());

    let forum = Arc::new(ForumClient::new(
        &config.forum_user_agent,
        config.forum_timeout(),
    )?);
    let worker = LeagueWorker::new(Arc::clone(&forum), config.score_strategy);

    for league in &leagues {
        if let Err(e) = worker.run(league).await {
            error!("Parsing {} failed: {:#}", league.name, e);
        }
    }

    info!("Finished");
    Ok(())
}
