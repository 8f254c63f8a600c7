pub mod create;
pub mod list;
pub mod read;

use std::{sync::Arc, time::Duration};

use anyhow::Result;
use blogdesk_client::{
    ArticleCoordinator, ClientConfig, HttpArticleStore, QueryCache, QueryConfig,
};

use crate::cli::{Cli, Commands};

pub async fn run(cli: Cli) -> Result<()> {
    let coordinator = connect(cli.api_base, cli.timeout_seconds)?;

    match cli.command {
        Commands::List {
            json,
        } => list::run(&coordinator, json).await,
        Commands::Read {
            id,
            json,
        } => read::run(&coordinator, id, json).await,
        Commands::Create {
            title,
            description,
            category,
            cover_image,
            content,
            content_file,
            json,
        } => {
            create::run(
                &coordinator,
                create::CreateArgs {
                    title,
                    description,
                    category,
                    cover_image,
                    content,
                    content_file,
                },
                json,
            )
            .await
        },
    }
}

fn connect(api_base: Option<String>, timeout_seconds: Option<u64>) -> Result<ArticleCoordinator> {
    let mut config = ClientConfig::from_env();
    if let Some(api_base) = api_base {
        config.api_base = api_base;
    }
    if let Some(seconds) = timeout_seconds {
        config.timeout = Duration::from_secs(seconds);
    }
    let config = config.normalized();
    tracing::debug!("article store: {}", config.api_base);

    let store = HttpArticleStore::from_config(&config)?;
    Ok(ArticleCoordinator::new(
        Arc::new(store),
        Arc::new(QueryCache::new()),
        QueryConfig::from_env(),
    ))
}
