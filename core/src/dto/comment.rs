use chrono::NaiveDateTime;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::{timestamp, Hydrate, User};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Comment {
    pub id: i64,
    #[serde(default, deserialize_with = "timestamp::deserialize")]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "timestamp::deserialize")]
    pub modified_at: Option<NaiveDateTime>,
    pub user: CommentAuthor,
    pub review_id: i64,
    pub content: String,
    /// The backend calls this `deletable` on some endpoints.
    #[serde(default, alias = "deletable")]
    pub is_mine: Option<bool>,
}

impl Hydrate for Comment {
    const ENTITY: &'static str = "comment";
}

/// Who wrote a comment. Blocked and deleted accounts come back as a
/// placeholder (`{"normal": false, "description": ...}`) or `null` instead of
/// a profile.
#[derive(Debug, Clone, PartialEq)]
pub enum CommentAuthor {
    User(User),
    Unavailable { description: Option<String> },
}

impl CommentAuthor {
    pub fn user(&self) -> Option<&User> {
        match self {
            CommentAuthor::User(user) => Some(user),
            CommentAuthor::Unavailable { .. } => None,
        }
    }

    pub fn username(&self) -> Option<&str> {
        self.user().map(|user| user.username.as_str())
    }
}

impl<'de> Deserialize<'de> for CommentAuthor {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        let placeholder = value.is_null()
            || (value.get("username").is_none() && value.get("normal").and_then(Value::as_bool) == Some(false));
        if placeholder {
            let description = value.get("description").and_then(Value::as_str).map(str::to_string);
            return Ok(CommentAuthor::Unavailable { description });
        }
        User::deserialize(value).map(CommentAuthor::User).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::fixtures;
    use serde_json::json;

    #[test]
    fn hydrates_every_field() {
        let comment = Comment::from_json(&fixtures::comment(7, 3)).unwrap();
        assert_eq!(comment.id, 7);
        assert_eq!(comment.review_id, 3);
        assert_eq!(comment.user.username(), Some("bob"));
        assert_eq!(comment.content, "agreed");
        assert_eq!(comment.is_mine, Some(true));
        assert_eq!(comment.created_at.unwrap().to_string(), "2022-11-20 10:00:00");
        assert_eq!(comment.modified_at.unwrap().to_string(), "2022-11-20 10:05:00");
    }

    #[test]
    fn deletable_is_read_as_is_mine() {
        let mut raw = fixtures::comment(1, 1);
        raw.as_object_mut().unwrap().remove("is_mine");
        raw["deletable"] = json!(false);
        assert_eq!(Comment::from_json(&raw).unwrap().is_mine, Some(false));
    }

    #[test]
    fn missing_review_id_is_a_decode_error() {
        let mut raw = fixtures::comment(1, 1);
        raw.as_object_mut().unwrap().remove("review_id");
        let err = Comment::from_json(&raw).unwrap_err();
        assert_eq!(err.entity, "comment");
        assert!(err.to_string().contains("review_id"));
    }

    #[test]
    fn blocked_author_is_a_placeholder() {
        let mut raw = fixtures::comment(2, 1);
        raw["user"] = json!({"normal": false, "description": "This user is blocked"});
        let comment = Comment::from_json(&raw).unwrap();
        assert_eq!(
            comment.user,
            CommentAuthor::Unavailable {
                description: Some("This user is blocked".to_string())
            }
        );
        assert_eq!(comment.user.username(), None);

        raw["user"] = Value::Null;
        assert_eq!(Comment::from_json(&raw).unwrap().user.user(), None);
    }

    #[test]
    fn author_without_username_is_still_an_error() {
        let mut raw = fixtures::comment(2, 1);
        raw["user"] = json!({"profile_string": "hi"});
        let err = Comment::from_json(&raw).unwrap_err();
        assert!(err.to_string().contains("username"), "{err}");
    }
}
