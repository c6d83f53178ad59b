use chrono::NaiveDateTime;
use serde::Deserialize;

use super::{listing, timestamp, Comment, Hydrate, Restaurant, User};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Review {
    pub id: i64,
    #[serde(default, deserialize_with = "timestamp::deserialize")]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "timestamp::deserialize")]
    pub modified_at: Option<NaiveDateTime>,
    pub user: User,
    pub content: String,
    #[serde(default, deserialize_with = "listing")]
    pub image_urls: Vec<String>,
    pub rating: u8,
    pub restaurant: Restaurant,
    #[serde(default)]
    pub views: Option<u64>,
    #[serde(default, deserialize_with = "listing")]
    pub comments: Vec<Comment>,
    #[serde(default, rename = "number_of_hearts")]
    pub number_of_likes: Option<u32>,
    #[serde(default)]
    pub number_of_scraps: Option<u32>,
    #[serde(default)]
    pub is_deletable: Option<bool>,
    #[serde(default, rename = "is_hearted")]
    pub is_liked: Option<bool>,
    #[serde(default, rename = "is_scraped")]
    pub is_scrapped: Option<bool>,
    #[serde(default)]
    pub scrap_description: Option<String>,
}

impl Hydrate for Review {
    const ENTITY: &'static str = "review";
}
