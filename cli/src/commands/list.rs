use anyhow::{Context, Result};
use blogdesk_client::ArticleCoordinator;
use blogdesk_cli::utils::{print_json, render_list};
use blogdesk_shared::ArticleSummary;

pub async fn run(coordinator: &ArticleCoordinator, json: bool) -> Result<()> {
    let articles = coordinator
        .fetch_articles()
        .await
        .context("failed to load blogs")?;

    if json {
        let summaries: Vec<ArticleSummary> = articles.iter().map(ArticleSummary::from).collect();
        return print_json(&summaries);
    }
    print!("{}", render_list(&articles));
    Ok(())
}
