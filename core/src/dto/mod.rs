//! Response DTOs and their hydration from JSON.
//!
//! # Design
//! Every DTO is a serde `Deserialize` type whose field attributes carry the
//! wire-to-domain renames. `Hydrate` layers the two entry points the UI uses
//! on top: `from_json` for one value and `from_json_array` for a possibly
//! missing list. Decoding is strict about types and about the few fields a
//! record cannot exist without; everything the backend may omit is `Option`
//! and every nested collection defaults to empty.

mod comment;
mod restaurant;
mod review;
mod user;

pub use comment::{Comment, CommentAuthor};
pub use restaurant::Restaurant;
pub use review::Review;
pub use user::User;

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::DecodeError;

/// JSON hydration for a DTO.
pub trait Hydrate: DeserializeOwned {
    /// Name used in decode errors.
    const ENTITY: &'static str;

    fn from_json(json: &Value) -> Result<Self, DecodeError> {
        Self::deserialize(json).map_err(|e| DecodeError::new(Self::ENTITY, e))
    }

    /// `None` and JSON `null` hydrate to an empty list.
    fn from_json_array(json: Option<&Value>) -> Result<Vec<Self>, DecodeError> {
        match json {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(items) => Vec::<Self>::deserialize(items).map_err(|e| DecodeError::new(Self::ENTITY, e)),
        }
    }
}

/// Body of login, signup and refresh responses.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthToken {
    pub token: String,
}

/// Body of `GET /users/exists`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Exists {
    pub exists: bool,
}

/// One page of search results.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Slice<T> {
    #[serde(default = "Vec::new")]
    pub content: Vec<T>,
    #[serde(default)]
    pub number: Option<u32>,
    #[serde(default)]
    pub size: Option<u32>,
    #[serde(default)]
    pub last: Option<bool>,
}

/// Nested collections arrive either as `{"data": [...]}` envelopes (with
/// `data` possibly null) or as bare arrays. Absent and null both mean empty.
///
/// Items are decoded one by one so a bad element reports its own field.
pub(crate) fn listing<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    listing_values(deserializer)?
        .into_iter()
        .map(|item| T::deserialize(item).map_err(D::Error::custom))
        .collect()
}

/// The raw elements of a listing, envelope removed.
pub(crate) fn listing_values<'de, D>(deserializer: D) -> Result<Vec<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => Ok(items),
        Some(Value::Object(mut page)) => match page.remove("data") {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(items)) => Ok(items),
            Some(other) => Err(D::Error::custom(format!("expected `data` to be an array, got {other}"))),
        },
        Some(other) => Err(D::Error::custom(format!("expected an array or a page envelope, got {other}"))),
    }
}

pub(crate) mod timestamp {
    use chrono::{DateTime, NaiveDateTime};
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(None),
            Some(raw) => parse(&raw).map(Some).map_err(D::Error::custom),
        }
    }

    /// RFC 3339 (normalized to UTC) or a zone-less `YYYY-MM-DDTHH:MM:SS[.f]`.
    pub fn parse(raw: &str) -> Result<NaiveDateTime, String> {
        if let Ok(with_offset) = DateTime::parse_from_rfc3339(raw) {
            return Ok(with_offset.naive_utc());
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .map_err(|e| format!("invalid timestamp {raw:?}: {e}"))
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    #[test]
    fn from_json_array_treats_missing_and_null_as_empty() {
        assert!(User::from_json_array(None).unwrap().is_empty());
        assert!(Review::from_json_array(Some(&Value::Null)).unwrap().is_empty());
        assert!(Comment::from_json_array(None).unwrap().is_empty());
        assert!(Restaurant::from_json_array(Some(&Value::Null)).unwrap().is_empty());
    }

    #[test]
    fn from_json_array_preserves_order() {
        let a = fixtures::review(1);
        let b = fixtures::review(2);
        let items = json!([a.clone(), b.clone()]);

        let reviews = Review::from_json_array(Some(&items)).unwrap();
        assert_eq!(
            reviews,
            vec![Review::from_json(&a).unwrap(), Review::from_json(&b).unwrap()]
        );
    }

    #[test]
    fn from_json_array_rejects_non_arrays() {
        let err = Comment::from_json_array(Some(&json!({"id": 1}))).unwrap_err();
        assert_eq!(err.entity, "comment");
    }

    #[test]
    fn timestamps_accept_local_and_offset_forms() {
        let expected = NaiveDate::from_ymd_opt(2022, 11, 20)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        assert_eq!(timestamp::parse("2022-11-20T12:00:00").unwrap(), expected);
        assert_eq!(timestamp::parse("2022-11-20T21:00:00+09:00").unwrap(), expected);
        assert!(timestamp::parse("yesterday").is_err());
    }

    #[test]
    fn slice_decodes_search_page() {
        let page: Slice<User> = serde_json::from_value(json!({
            "content": [fixtures::user("a"), fixtures::user("b")],
            "number": 0,
            "size": 100,
            "last": true
        }))
        .unwrap();
        assert_eq!(page.content.len(), 2);
        assert_eq!(page.size, Some(100));
        assert_eq!(page.last, Some(true));
    }

    #[test]
    fn slice_without_content_is_empty() {
        let page: Slice<Review> = serde_json::from_value(json!({"number": 3})).unwrap();
        assert!(page.content.is_empty());
    }

    #[test]
    fn listing_rejects_non_array_data() {
        let mut raw = fixtures::user("alice");
        raw["reviews"] = json!({"data": {"id": 1}});
        let err = User::from_json(&raw).unwrap_err();
        assert!(err.to_string().contains("`data`"), "{err}");

        raw["reviews"] = json!("none");
        assert!(User::from_json(&raw).is_err());
    }
}
