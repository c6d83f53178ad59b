//! Loaders for the review and user detail pages.
//!
//! Both pass the route parameter and the query string through untouched; the
//! only work done here is typing the review id.

use std::collections::BTreeMap;

use crate::error::RouteError;

/// What the router knows about the page being entered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavigationContext {
    pub params: BTreeMap<String, String>,
    pub url: String,
}

impl NavigationContext {
    pub fn new(url: &str) -> Self {
        Self {
            params: BTreeMap::new(),
            url: url.to_string(),
        }
    }

    pub fn param(mut self, name: &str, value: &str) -> Self {
        self.params.insert(name.to_string(), value.to_string());
        self
    }

    pub fn query(&self) -> QueryParams {
        let query = self
            .url
            .split_once('?')
            .map(|(_, rest)| rest.split('#').next().unwrap_or_default())
            .unwrap_or_default();
        QueryParams::parse(query)
    }
}

/// Decoded query string. Keys may repeat and keep their order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    pub fn parse(query: &str) -> Self {
        let pairs = query
            .trim_start_matches('?')
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| {
                let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
                (decode_component(key), decode_component(value))
            })
            .collect();
        Self(pairs)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn get_all(&self, key: &str) -> Vec<&str> {
        self.0.iter().filter(|(k, _)| k == key).map(|(_, v)| v.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    String::from_utf8_lossy(&urlencoding::decode_binary(spaced.as_bytes())).into_owned()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageData<P> {
    pub param: P,
    pub query: QueryParams,
}

/// `/reviews/{id}`. The router only matches integer ids, so navigation never
/// reaches the `RouteError` path; it exists for hand-built contexts.
pub fn load_review_page(ctx: &NavigationContext) -> Result<PageData<i64>, RouteError> {
    let raw = ctx.params.get("id").ok_or(RouteError::MissingParam("id"))?;
    let param = raw.parse().map_err(|_| RouteError::InvalidParam {
        name: "id",
        value: raw.clone(),
    })?;
    Ok(PageData {
        param,
        query: ctx.query(),
    })
}

/// `/users/{username}`.
pub fn load_user_page(ctx: &NavigationContext) -> Result<PageData<String>, RouteError> {
    let param = ctx
        .params
        .get("username")
        .cloned()
        .ok_or(RouteError::MissingParam("username"))?;
    Ok(PageData {
        param,
        query: ctx.query(),
    })
}
