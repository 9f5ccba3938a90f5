//! `fesbot`: reads chat lines from stdin and answers FE commands on stdout.

use anyhow::Context;
use fe_slots_bot::transport::{self, StdoutReplies};
use fe_slots_bot::{CommandRouter, Config, FesEnvironment, FesReducer, FesState};
use fe_slots_core::codec::RowCodec;
use fe_slots_core::environment::{ReplySink, SystemClock};
use fe_slots_core::registry::ReservationRegistry;
use fe_slots_runtime::Store;
use fe_slots_wiki::WikiClient;
use std::sync::Arc;
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries replies
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fe_slots=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::from_env().context("loading configuration")?;
    info!(
        json_url = %config.wiki.json_url,
        edit_url = %config.wiki.edit_url,
        bot_name = %config.bot_name,
        serialize_writes = config.serialize_writes,
        "Configuration loaded"
    );

    let wiki = WikiClient::with_timeout(
        &config.wiki.json_url,
        &config.wiki.edit_url,
        config.wiki.user.clone(),
        config.wiki.password.clone(),
        config.wiki.timeout,
    )
    .context("building wiki client")?;

    let mut registry = ReservationRegistry::new(
        Arc::new(wiki),
        Arc::new(SystemClock),
        RowCodec::new(config.ticket_macro.clone()),
    )
    .with_reserved_by(config.bot_name.clone());
    if config.serialize_writes {
        registry = registry.with_serialized_writes();
    }

    let replies: Arc<dyn ReplySink> = Arc::new(StdoutReplies::default());
    let store = Store::new(
        FesState::default(),
        FesReducer::new(),
        FesEnvironment::new(registry, Arc::clone(&replies)),
    );
    let router = CommandRouter::new(store.clone());

    info!("Reading commands from stdin");
    transport::run(&router, BufReader::new(tokio::io::stdin()), replies.as_ref())
        .await
        .context("reading stdin")?;

    store
        .shutdown(config.shutdown_timeout)
        .await
        .context("draining in-flight commands")?;

    let (persisted, failed, faulted) = store
        .state(|s| (s.persisted, s.failed, s.faulted))
        .await;
    info!(persisted, failed, faulted, "Shut down");

    Ok(())
}
