//! Data model shared by the blogdesk client and CLI.

use std::{fmt, str::FromStr};

use chrono::{DateTime, FixedOffset, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};

pub mod draft;

pub use draft::{ArticleDraft, DraftError};

/// Separator between paragraphs inside [`Article::content`].
pub const PARAGRAPH_SEPARATOR: &str = "\n\n";

/// Numeric article identifier.
///
/// Stores may hand ids back as JSON numbers or as numeric strings; both
/// decode here. Encoding always produces a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ArticleId(pub u64);

impl ArticleId {
    /// Next id in the client-side sequence for a collection of `len` items.
    pub fn next_after(len: usize) -> Self {
        ArticleId(len as u64 + 1)
    }
}

impl fmt::Display for ArticleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for ArticleId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(ArticleId)
    }
}

impl<'de> Deserialize<'de> for ArticleId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Number(u64),
            Text(String),
        }

        match RawId::deserialize(deserializer)? {
            RawId::Number(value) => Ok(ArticleId(value)),
            RawId::Text(value) => value
                .parse()
                .map_err(|_| serde::de::Error::custom(format!("invalid article id: {value:?}"))),
        }
    }
}

// 完整文章数据模型
/// A published article as stored under `/blogs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    /// Store identifier.
    pub id: ArticleId,
    /// Headline.
    pub title: String,
    /// One-line hook shown under the title.
    pub description: String,
    /// Upper-case category labels; the first one is the list badge.
    #[serde(deserialize_with = "one_or_many")]
    pub category: Vec<String>,
    /// Publication time, ISO 8601.
    pub date: String,
    /// Cover image URL.
    pub cover_image: String,
    /// Body text, paragraphs joined by a blank line.
    pub content: String,
}

impl Article {
    /// Body split into paragraphs on blank lines.
    pub fn paragraphs(&self) -> impl Iterator<Item = &str> {
        self.content.split(PARAGRAPH_SEPARATOR)
    }

    /// First category label, shown as the badge in list views.
    pub fn primary_category(&self) -> Option<&str> {
        self.category.first().map(String::as_str)
    }

    /// Publication timestamp, when `date` is valid RFC 3339.
    pub fn published_at(&self) -> Option<DateTime<FixedOffset>> {
        DateTime::parse_from_rfc3339(&self.date).ok()
    }

    /// Whether this record matches the user-supplied fields of `draft`.
    pub fn matches_draft(&self, draft: &ArticleDraft) -> bool {
        self.title == draft.title
            && self.description == draft.description
            && self.category == draft.category
            && self.cover_image == draft.cover_image
            && self.content == draft.content
    }
}

// 列表项（精简版）
/// List row projected from an [`Article`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleSummary {
    /// Store identifier.
    pub id: ArticleId,
    /// Headline.
    pub title: String,
    /// One-line hook.
    pub description: String,
    /// Primary category, if any.
    pub category: Option<String>,
    /// Publication time as stored.
    pub date: String,
}

impl From<&Article> for ArticleSummary {
    fn from(a: &Article) -> Self {
        ArticleSummary {
            id: a.id,
            title: a.title.clone(),
            description: a.description.clone(),
            category: a.primary_category().map(str::to_string),
            date: a.date.clone(),
        }
    }
}

/// Render an article date as `16 Oct 2026`.
///
/// Accepts RFC 3339 timestamps and bare `YYYY-MM-DD` dates; anything else is
/// returned unchanged.
pub fn format_publish_date(date: &str) -> String {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(date) {
        return parsed.format("%-d %b %Y").to_string();
    }
    if let Ok(parsed) = NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        return parsed.format("%-d %b %Y").to_string();
    }
    date.to_string()
}

/// ISO 8601 timestamp with millisecond precision and a `Z` suffix.
pub fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(value) => vec![value],
        OneOrMany::Many(values) => values,
    })
}
