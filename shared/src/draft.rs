//! Article drafts submitted for creation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{iso_timestamp, Article, ArticleId};

/// Validation failure for a draft, reported before any request is made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DraftError {
    /// A required text field is blank.
    #[error("Please fill in all fields: {0} is empty")]
    MissingField(&'static str),
    /// No non-empty category label was given.
    #[error("Please fill in all fields: at least one category is required")]
    NoCategory,
}

/// An article without identifier and publication timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleDraft {
    /// Headline.
    pub title: String,
    /// One-line hook.
    pub description: String,
    /// Normalized category labels.
    pub category: Vec<String>,
    /// Cover image URL.
    pub cover_image: String,
    /// Body text.
    pub content: String,
}

impl ArticleDraft {
    /// Build a draft from raw form input.
    ///
    /// `categories` is a comma separated list; labels are trimmed,
    /// upper-cased and empty entries dropped. The result is validated.
    pub fn from_form(
        title: &str,
        description: &str,
        categories: &str,
        cover_image: &str,
        content: &str,
    ) -> Result<Self, DraftError> {
        let draft = ArticleDraft {
            title: title.trim().to_string(),
            description: description.trim().to_string(),
            category: parse_categories(categories),
            cover_image: cover_image.trim().to_string(),
            content: content.trim().to_string(),
        };
        draft.validate()?;
        Ok(draft)
    }

    /// Check that every required field is filled in.
    pub fn validate(&self) -> Result<(), DraftError> {
        let fields = [
            ("title", &self.title),
            ("description", &self.description),
            ("coverImage", &self.cover_image),
            ("content", &self.content),
        ];
        if let Some((name, _)) = fields.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(DraftError::MissingField(*name));
        }
        if self.category.iter().all(|label| label.trim().is_empty()) {
            return Err(DraftError::NoCategory);
        }
        Ok(())
    }

    /// Attach the client-side envelope (id and timestamp) to this draft.
    pub fn into_article(self, id: ArticleId, published: DateTime<Utc>) -> Article {
        Article {
            id,
            title: self.title,
            description: self.description,
            category: self.category,
            date: iso_timestamp(published),
            cover_image: self.cover_image,
            content: self.content,
        }
    }
}

/// Split a comma separated category list into normalized labels.
pub fn parse_categories(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|label| label.trim().to_uppercase())
        .filter(|label| !label.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn parse_categories_trims_uppercases_and_filters_empty() {
        let labels = parse_categories(" finance, tech, ,career ,,");
        assert_eq!(labels, vec!["FINANCE".to_string(), "TECH".to_string(), "CAREER".to_string()]);
    }

    #[test]
    fn from_form_rejects_blank_fields() {
        let err = ArticleDraft::from_form("Title", "  ", "tech", "https://x/y.png", "Body")
            .expect_err("blank description must fail");
        assert_eq!(err, DraftError::MissingField("description"));
        assert!(err.to_string().starts_with("Please fill in all fields"));
    }

    #[test]
    fn from_form_requires_a_category() {
        let err = ArticleDraft::from_form("Title", "Hook", " , ", "https://x/y.png", "Body")
            .expect_err("empty categories must fail");
        assert_eq!(err, DraftError::NoCategory);
    }

    #[test]
    fn into_article_keeps_draft_fields() {
        let draft =
            ArticleDraft::from_form("X", "Hook", "tech", "https://x/y.png", "One\n\nTwo").unwrap();
        let at = Utc.with_ymd_and_hms(2026, 10, 16, 0, 0, 0).unwrap();
        let article = draft.clone().into_article(ArticleId(2), at);

        assert_eq!(article.id, ArticleId(2));
        assert_eq!(article.category, vec!["TECH".to_string()]);
        assert_eq!(article.date, "2026-10-16T00:00:00.000Z");
        assert!(article.matches_draft(&draft));
    }
}
