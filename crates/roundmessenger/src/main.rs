// Round messenger entry point.
//
// Startup sequence:
// 1. Parse arguments, initialize tracing
// 2. Load config (.env, categories, database path)
// 3. Open the participant directory
// 4. Fetch pairings for every requested round, then venues
// 5. Resolve the draw into one message per participant
// 6. Spawn one courier per bot token and dispatch round-robin
// 7. Wait for every courier to drain

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use roundmessenger::chat::discord::DiscordClient;
use roundmessenger::chat::ChatSender;
use roundmessenger::cli::Cli;
use roundmessenger::config;
use roundmessenger::directory::Database;
use roundmessenger::dispatch::RoundRobinDispatcher;
use roundmessenger::draw::{self, resolver};
use roundmessenger::tabbycat::TabbycatClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Parse arguments, initialize tracing
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    // 2. Load config
    let config = config::load_config(&cli).context("failed to load configuration")?;
    info!(
        "Config loaded: tournament={}, {} bot token(s), {} categories",
        config.tabbycat.slug,
        config.bot_tokens.len(),
        config.categories.len()
    );

    // 3. Open the participant directory
    let directory = Database::open(&config.db_path).context("failed to open participant database")?;
    info!("Participant database opened at {}", config.db_path);

    // 4. Fetch the draw
    let tabbycat = TabbycatClient::new(
        config.tabbycat.api_key.clone(),
        &config.tabbycat.url,
        config.tabbycat.slug.clone(),
    )
    .context("failed to build Tabbycat client")?;

    let rooms = tabbycat
        .get_draws(&cli.rounds)
        .await
        .context("failed to fetch draw")?;
    info!("Fetched {} pairings", rooms.len());

    let venues = tabbycat.get_venues().await.context("failed to fetch venues")?;
    info!("Fetched {} venues", venues.len());
    let venue_names = draw::venue_names(&venues);

    // 5. Resolve the draw
    let messages = resolver::resolve_draw(
        &rooms,
        &venue_names,
        &config.categories,
        &directory,
        &tabbycat,
    )
    .context("failed to resolve draw")?;
    info!("Resolved {} messages", messages.len());

    if cli.dry_run {
        for message in &messages {
            info!(recipient = %message.recipient, "{}", message.body);
        }
        info!("Dry run: nothing sent");
        return Ok(());
    }

    // 6. Dispatch round-robin across the bot pool
    let senders: Vec<Arc<dyn ChatSender>> = DiscordClient::from_tokens(&config.bot_tokens)
        .context("failed to build Discord clients")?
        .into_iter()
        .map(|client| Arc::new(client) as Arc<dyn ChatSender>)
        .collect();

    let dispatcher = RoundRobinDispatcher::new(senders)?;
    info!(
        "Dispatching {} messages across {} bots",
        messages.len(),
        dispatcher.identity_count()
    );

    // 7. Wait for every courier to drain, even if dispatch stops early
    let summary = dispatcher.deliver(messages).await?;
    for courier in &summary.couriers {
        info!(
            "{}: {} sent, {} failed",
            courier.name, courier.sent, courier.failed
        );
    }

    Ok(())
}

/// Initialize tracing to stderr. `RUST_LOG` overrides the default filter.
fn init_tracing(verbose: bool) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let default_filter = if verbose {
        "roundmessenger=debug,info"
    } else {
        "roundmessenger=info,warn"
    };

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
