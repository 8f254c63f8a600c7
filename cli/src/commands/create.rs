use std::path::PathBuf;

use anyhow::{Context, Result};
use blogdesk_client::ArticleCoordinator;
use blogdesk_cli::utils::{print_json, read_content, render_article};
use blogdesk_shared::ArticleDraft;

pub struct CreateArgs {
    pub title: String,
    pub description: String,
    pub category: String,
    pub cover_image: String,
    pub content: Option<String>,
    pub content_file: Option<PathBuf>,
}

pub async fn run(coordinator: &ArticleCoordinator, args: CreateArgs, json: bool) -> Result<()> {
    let content = read_content(args.content, args.content_file.as_deref())?;
    let draft = ArticleDraft::from_form(
        &args.title,
        &args.description,
        &args.category,
        &args.cover_image,
        &content,
    )?;

    // The id is derived from the cached collection size, so load it first.
    coordinator
        .fetch_articles()
        .await
        .context("failed to load blogs")?;
    let created = coordinator
        .create_article(draft)
        .await
        .context("failed to create blog")?;
    tracing::info!("Blog post created successfully!");

    let articles = coordinator
        .fetch_articles()
        .await
        .context("failed to reload blogs")?;

    if json {
        return print_json(&created);
    }
    print!("{}", render_article(&created));
    println!();
    println!("{} Posts", articles.len());
    Ok(())
}
