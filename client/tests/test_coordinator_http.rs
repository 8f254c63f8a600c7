//! Integration tests for the article coordinator over HTTP.

use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use blogdesk_client::{ArticleCoordinator, HttpArticleStore, QueryCache, QueryConfig};
use blogdesk_shared::{ArticleDraft, ArticleId};
use serde_json::{json, Value};
use wiremock::{
    matchers::{body_partial_json, method, path},
    Mock, MockServer, ResponseTemplate,
};

fn article_json(id: u64, title: &str, category: &[&str]) -> Value {
    json!({
        "id": id,
        "title": title,
        "description": "A short hook for your readers",
        "category": category,
        "date": "2026-01-11T09:12:45.120Z",
        "coverImage": "https://images.example.com/cover.jpeg",
        "content": "Dive deep.\n\nThen conclude."
    })
}

fn coordinator_for(server: &MockServer) -> ArticleCoordinator {
    let store = HttpArticleStore::with_client(reqwest::Client::new(), server.uri());
    let config = QueryConfig {
        retry_delay: Duration::ZERO,
        ..QueryConfig::default()
    };
    ArticleCoordinator::new(Arc::new(store), Arc::new(QueryCache::new()), config)
}

#[tokio::test]
async fn creation_is_visible_through_the_next_read() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/blogs"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([article_json(1, "First", &["FINANCE"])])),
        )
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/blogs"))
        .and(body_partial_json(json!({"id": 2, "title": "X", "category": ["TECH"]})))
        .respond_with(ResponseTemplate::new(201).set_body_json(article_json(2, "X", &["TECH"])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/blogs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            article_json(1, "First", &["FINANCE"]),
            article_json(2, "X", &["TECH"]),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let coordinator = coordinator_for(&server);
    assert_eq!(coordinator.fetch_articles().await?.len(), 1);

    let draft = ArticleDraft::from_form(
        "X",
        "A short hook for your readers",
        "tech",
        "https://images.example.com/cover.jpeg",
        "Dive deep.\n\nThen conclude.",
    )?;
    let created = coordinator.create_article(draft.clone()).await?;
    assert_eq!(created.id, ArticleId(2));

    let articles = coordinator.fetch_articles().await?;
    assert_eq!(articles.len(), 2);
    let stored = articles
        .iter()
        .find(|article| article.id == ArticleId(2))
        .context("created article must be listed")?;
    assert!(stored.matches_draft(&draft));
    Ok(())
}

#[tokio::test]
async fn concurrent_reads_issue_one_request() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/blogs"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([article_json(1, "First", &["FINANCE"])]))
                .set_delay(Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let coordinator = coordinator_for(&server);
    assert!(coordinator.get_articles().is_loading());
    let (a, b, c) = tokio::join!(
        coordinator.fetch_articles(),
        coordinator.fetch_articles(),
        coordinator.fetch_articles()
    );

    assert_eq!(a?.len(), 1);
    assert_eq!(b?, c?);
    assert!(coordinator.get_articles().is_success());
    Ok(())
}

#[tokio::test]
async fn one_failed_read_is_retried_automatically() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/blogs"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/blogs"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([article_json(1, "First", &["FINANCE"])])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let coordinator = coordinator_for(&server);
    let articles = coordinator.fetch_articles().await?;

    assert_eq!(articles.len(), 1);
    assert!(coordinator.get_articles().is_success());
    Ok(())
}

#[tokio::test]
async fn persistent_shape_error_settles_into_error_state() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/blogs"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .expect(2)
        .mount(&server)
        .await;

    let coordinator = coordinator_for(&server);
    let err = coordinator
        .fetch_articles()
        .await
        .expect_err("shape errors survive the retry");

    assert!(err.is_shape());
    let entry = coordinator.get_articles();
    assert!(entry.is_error());
    assert_eq!(entry.error_message(), Some("Invalid JSON received from server"));
    Ok(())
}
