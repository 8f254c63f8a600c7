//! Selection, input and text rendering helpers for the CLI commands.

use std::{fmt::Write as _, fs, path::Path};

use anyhow::{bail, Context, Result};
use blogdesk_shared::{format_publish_date, Article, ArticleId};
use serde::Serialize;

const WORDS_PER_MINUTE: f32 = 200.0;

/// Pretty-print `value` as JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Article to show: the one with `id`, or the first one when no id is given.
pub fn select_article(articles: &[Article], id: Option<ArticleId>) -> Option<&Article> {
    match id {
        Some(id) => articles.iter().find(|article| article.id == id),
        None => articles.first(),
    }
}

/// Article body from `--content` or `--content-file`.
pub fn read_content(content: Option<String>, content_file: Option<&Path>) -> Result<String> {
    match (content, content_file) {
        (Some(content), _) => Ok(content),
        (None, Some(path)) => fs::read_to_string(path)
            .with_context(|| format!("failed to read content file: {}", path.display())),
        (None, None) => bail!("either --content or --content-file is required"),
    }
}

/// Minutes to read `content` at 200 words per minute, at least one.
pub fn estimate_read_time(content: &str) -> u32 {
    let words = content.split_whitespace().count();
    let minutes = (words as f32 / WORDS_PER_MINUTE).ceil() as u32;
    minutes.max(1)
}

/// Text list view: post count header, then one row per article.
pub fn render_list(articles: &[Article]) -> String {
    let mut out = format!("Recent Articles ({} Posts)\n", articles.len());
    for article in articles {
        let _ = writeln!(
            out,
            "{:>4}  {:<12} {:<12} {}",
            article.id,
            article.primary_category().unwrap_or("-"),
            format_publish_date(&article.date),
            article.title
        );
    }
    out
}

/// Text detail view of one article.
pub fn render_article(article: &Article) -> String {
    let mut out = String::new();
    let tags = article
        .category
        .iter()
        .map(|label| format!("#{label}"))
        .collect::<Vec<_>>()
        .join(" ");

    let _ = writeln!(out, "{}", article.title);
    let _ = writeln!(out, "{tags}");
    let _ = writeln!(
        out,
        "{} · {} min read",
        format_publish_date(&article.date),
        estimate_read_time(&article.content)
    );
    let _ = writeln!(out, "Cover: {}", article.cover_image);
    let _ = writeln!(out);
    let _ = writeln!(out, "> {}", article.description);
    for paragraph in article.paragraphs() {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", paragraph.trim());
    }
    out
}
