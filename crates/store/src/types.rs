use std::{
    fmt,
    time::{SystemTime, UNIX_EPOCH},
};

use serde::{Deserialize, Serialize};

pub(crate) fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// The record kinds held by a data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    User,
    Post,
    Product,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::User => "user",
            Self::Post => "post",
            Self::Product => "product",
        })
    }
}

// ── Records ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: Option<String>,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub title: String,
    pub content: Option<String>,
    pub published: bool,
    pub author_id: Option<String>,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub image: String,
    pub price: f64,
    pub description: String,
    pub created_at: i64,
}

// ── Inserts ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: Option<String>,
    pub email: String,
}

/// A draft post. Always inserted with `published = false`.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub content: Option<String>,
    /// Email of an existing user to link as the author.
    pub author_email: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub image: String,
    pub price: f64,
    pub description: String,
}

// ── Listing ─────────────────────────────────────────────────────────────────

/// Offset/limit window applied after filtering and ordering.
///
/// `None` means "no offset" / "no limit". `Some(0)` is a real zero: no rows
/// skipped, or no rows returned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Page {
    pub skip: Option<u64>,
    pub take: Option<u64>,
}

impl Page {
    #[must_use]
    pub fn new(skip: Option<u64>, take: Option<u64>) -> Self {
        Self { skip, take }
    }

    pub fn is_unbounded(&self) -> bool {
        self.skip.is_none() && self.take.is_none()
    }

    /// Apply the window to an already ordered sequence.
    pub fn apply<T>(&self, items: impl IntoIterator<Item = T>) -> Vec<T> {
        let skip = self.skip.map_or(0, |n| usize::try_from(n).unwrap_or(usize::MAX));
        let take = self
            .take
            .map_or(usize::MAX, |n| usize::try_from(n).unwrap_or(usize::MAX));
        items.into_iter().skip(skip).take(take).collect()
    }
}

fn non_empty(search: Option<String>) -> Option<String> {
    search.filter(|s| !s.is_empty())
}

/// Filter for listing posts.
#[derive(Debug, Clone, Default)]
pub struct PostQuery {
    pub published: Option<bool>,
    /// Substring that must appear in the title or the content.
    pub search: Option<String>,
    pub page: Page,
}

impl PostQuery {
    /// Published posts, optionally narrowed by a title/content search.
    #[must_use]
    pub fn feed(search: Option<String>, page: Page) -> Self {
        Self {
            published: Some(true),
            search: non_empty(search),
            page,
        }
    }

    pub fn matches(&self, post: &Post) -> bool {
        if self.published.is_some_and(|p| p != post.published) {
            return false;
        }
        match &self.search {
            Some(needle) => {
                post.title.contains(needle.as_str())
                    || post
                        .content
                        .as_deref()
                        .is_some_and(|c| c.contains(needle.as_str()))
            },
            None => true,
        }
    }
}

/// Filter for listing products. Results are always newest first.
#[derive(Debug, Clone, Default)]
pub struct ProductQuery {
    /// Substring that must appear in the name or the description.
    pub search: Option<String>,
    pub page: Page,
}

impl ProductQuery {
    #[must_use]
    pub fn new(search: Option<String>, page: Page) -> Self {
        Self {
            search: non_empty(search),
            page,
        }
    }

    pub fn matches(&self, product: &Product) -> bool {
        self.search.as_deref().is_none_or(|needle| {
            product.name.contains(needle) || product.description.contains(needle)
        })
    }
}
