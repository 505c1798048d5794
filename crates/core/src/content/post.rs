use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{urls, AuthorRef, Faq, ImageRef};
use crate::portable_text::{self, Block};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostSummary {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub image: Option<ImageRef>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub author: Option<AuthorRef>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}

impl PostSummary {
    pub fn url(&self) -> String {
        urls::post(&self.slug)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag.trim()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub image: Option<ImageRef>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub author: Option<AuthorRef>,
    #[serde(default)]
    pub body: Vec<Block>,
    #[serde(default)]
    pub faq: Vec<Faq>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(rename = "_updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl Post {
    pub fn url(&self) -> String {
        urls::post(&self.slug)
    }

    pub fn reading_time_minutes(&self) -> u32 {
        portable_text::reading_time_minutes(&self.body)
    }
}
