use chrono::NaiveDateTime;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::{listing, listing_values, timestamp, Comment, Hydrate, Review};

/// A user profile. The lighter payloads embedded in reviews and comments
/// carry only the scalar fields; `/me` and `/users/{username}` add the
/// nested collections.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct User {
    pub username: String,
    #[serde(default, deserialize_with = "timestamp::deserialize")]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub profile_image_url: Option<String>,
    #[serde(default)]
    pub profile_string: Option<String>,
    #[serde(default)]
    pub matzip_level: Option<i32>,
    #[serde(default)]
    pub is_my_follower: Option<bool>,
    #[serde(default)]
    pub is_my_following: Option<bool>,
    #[serde(default)]
    pub is_me: Option<bool>,
    #[serde(default)]
    pub number_of_followers: Option<u32>,
    #[serde(default)]
    pub number_of_followings: Option<u32>,
    #[serde(default, deserialize_with = "listing")]
    pub reviews: Vec<Review>,
    #[serde(default, deserialize_with = "listing")]
    pub my_followers: Vec<User>,
    #[serde(default, deserialize_with = "listing")]
    pub my_followings: Vec<User>,
    #[serde(default, rename = "hearted_reviews", deserialize_with = "listing")]
    pub likes: Vec<Review>,
    #[serde(default, deserialize_with = "scrap_listing")]
    pub scraps: Vec<Review>,
    #[serde(default, deserialize_with = "listing")]
    pub comments: Vec<Comment>,
}

impl Hydrate for User {
    const ENTITY: &'static str = "user";
}

/// `/me` lists scraps as `{description, review}`; other payloads inline the
/// review itself.
fn scrap_listing<'de, D>(deserializer: D) -> Result<Vec<Review>, D::Error>
where
    D: Deserializer<'de>,
{
    listing_values(deserializer)?
        .into_iter()
        .map(|entry| scrap_entry(entry).map_err(D::Error::custom))
        .collect()
}

fn scrap_entry(mut entry: Value) -> Result<Review, serde_json::Error> {
    if entry.get("id").is_some() {
        return Review::deserialize(entry);
    }
    let review = entry.get_mut("review").map(Value::take).unwrap_or(Value::Null);
    let mut review = Review::deserialize(review)?;
    if let Some(description) = entry.get("description").and_then(Value::as_str) {
        review.scrap_description = Some(description.to_string());
    }
    Ok(review)
}
