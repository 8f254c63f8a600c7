use anyhow::{bail, Context, Result};
use blogdesk_client::ArticleCoordinator;
use blogdesk_cli::utils::{print_json, render_article, select_article};
use blogdesk_shared::ArticleId;

pub async fn run(coordinator: &ArticleCoordinator, id: Option<u64>, json: bool) -> Result<()> {
    let articles = coordinator
        .fetch_articles()
        .await
        .context("failed to load blogs")?;

    let id = id.map(ArticleId);
    let Some(article) = select_article(&articles, id) else {
        match id {
            Some(id) => bail!("article not found: {id}"),
            None => bail!("no articles published yet"),
        }
    };

    if json {
        return print_json(article);
    }
    print!("{}", render_article(article));
    Ok(())
}
