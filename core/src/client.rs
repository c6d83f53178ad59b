//! Request builder and response parser for the matzip API.
//!
//! # Design
//! `MatzipClient` holds the base URL and a `Session` handle and never touches
//! the network. Every backend operation has a `build_*` method producing an
//! `HttpRequest`; the token is read from the session when the request is
//! built, so a later token change does not affect it. `parse_*` helpers turn
//! an `HttpResponse` into DTOs for callers that want status checking and
//! decoding in one step.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::config::ClientConfig;
use crate::dto::{AuthToken, Comment, Exists, Hydrate, Review, Slice, User};
use crate::error::{ApiError, DecodeError};
use crate::http::{Body, HttpMethod, HttpRequest, HttpResponse};
use crate::session::Session;
use crate::types::{
    CommentEdit, Credentials, NewComment, NewReview, PasswordChange, ProfilePatch, ReviewPatch, ReviewSort,
    ScrapRequest, UserSort, UsernameChange,
};

pub const API_PREFIX: &str = "/api/v1";

/// Search endpoints are always asked for the first page of 100.
pub const DEFAULT_PAGE: u32 = 0;
pub const DEFAULT_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone)]
pub struct MatzipClient {
    base_url: String,
    session: Session,
}

impl MatzipClient {
    pub fn new(base_url: &str, session: Session) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
        }
    }

    pub fn from_config(config: &ClientConfig, session: Session) -> Self {
        Self::new(&config.base_url, session)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    // -- auth ---------------------------------------------------------------

    pub fn build_login(&self, credentials: &Credentials) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, "/auth/login", json_headers(), credentials)
    }

    /// Removes the stored token before anything is sent, so the slot is gone
    /// whether or not the request ever completes.
    pub fn build_logout(&self) -> HttpRequest {
        self.session.remove_stored_token();
        self.request(HttpMethod::Post, "/auth/logout", Vec::new())
    }

    pub fn build_signup(&self, credentials: &Credentials) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, "/auth/signup", json_headers(), credentials)
    }

    pub fn build_refresh(&self) -> HttpRequest {
        self.request(HttpMethod::Post, "/auth/refresh", self.auth_headers())
    }

    // -- search -------------------------------------------------------------

    pub fn build_get_reviews(&self) -> HttpRequest {
        let path = with_query("/search/reviews", &page_params());
        self.request(HttpMethod::Get, &path, self.auth_headers())
    }

    pub fn build_search_users(&self, username: &str, sort: UserSort, asc: bool) -> HttpRequest {
        let mut params = page_params();
        params.push(("username", username.to_string()));
        params.push(("sort", sort.to_string()));
        params.push(("asc", asc.to_string()));
        self.request(HttpMethod::Get, &with_query("/search/users", &params), self.auth_headers())
    }

    pub fn build_search_reviews(&self, keyword: &str, sort: ReviewSort, asc: bool) -> HttpRequest {
        let mut params = page_params();
        params.push(("keyword", keyword.to_string()));
        params.push(("sort", sort.to_string()));
        params.push(("asc", asc.to_string()));
        self.request(HttpMethod::Get, &with_query("/search/reviews", &params), self.auth_headers())
    }

    // -- me -----------------------------------------------------------------

    pub fn build_fetch_me(&self) -> HttpRequest {
        self.request(HttpMethod::Get, "/me", self.auth_headers())
    }

    pub fn build_change_username(&self, username: &str) -> Result<HttpRequest, ApiError> {
        self.json_request(
            HttpMethod::Put,
            "/me/username",
            self.json_auth_headers(),
            &UsernameChange { username },
        )
    }

    pub fn build_change_password(&self, password: &str) -> Result<HttpRequest, ApiError> {
        self.json_request(
            HttpMethod::Put,
            "/me/password",
            self.json_auth_headers(),
            &PasswordChange { password },
        )
    }

    pub fn build_patch_me(&self, patch: ProfilePatch) -> HttpRequest {
        let mut req = self.request(HttpMethod::Patch, "/me", self.auth_headers());
        req.body = Some(Body::Multipart(patch.into_form()));
        req
    }

    pub fn build_delete_me(&self) -> HttpRequest {
        self.request(HttpMethod::Delete, "/me", self.auth_headers())
    }

    // -- reviews ------------------------------------------------------------

    pub fn build_post_review(&self, review: NewReview) -> HttpRequest {
        let mut req = self.request(HttpMethod::Post, "/reviews", self.auth_headers());
        req.body = Some(Body::Multipart(review.into_form()));
        req
    }

    pub fn build_fetch_review(&self, review_id: i64) -> HttpRequest {
        self.request(HttpMethod::Get, &format!("/reviews/{review_id}"), self.auth_headers())
    }

    pub fn build_patch_review(&self, review_id: i64, patch: ReviewPatch) -> HttpRequest {
        let mut req = self.request(HttpMethod::Patch, &format!("/reviews/{review_id}"), self.auth_headers());
        req.body = Some(Body::Multipart(patch.into_form()));
        req
    }

    pub fn build_delete_review(&self, review_id: i64) -> HttpRequest {
        self.request(HttpMethod::Delete, &format!("/reviews/{review_id}"), self.auth_headers())
    }

    pub fn build_put_like(&self, review_id: i64) -> HttpRequest {
        self.request(HttpMethod::Put, &format!("/reviews/{review_id}/heart"), self.auth_headers())
    }

    pub fn build_delete_like(&self, review_id: i64) -> HttpRequest {
        self.request(HttpMethod::Delete, &format!("/reviews/{review_id}/heart"), self.auth_headers())
    }

    pub fn build_put_scrap(&self, review_id: i64, description: &str) -> Result<HttpRequest, ApiError> {
        self.json_request(
            HttpMethod::Put,
            &format!("/reviews/{review_id}/scrap"),
            self.json_auth_headers(),
            &ScrapRequest { description },
        )
    }

    pub fn build_delete_scrap(&self, review_id: i64) -> HttpRequest {
        self.request(HttpMethod::Delete, &format!("/reviews/{review_id}/scrap"), self.auth_headers())
    }

    // -- comments -----------------------------------------------------------

    pub fn build_post_comment(&self, review_id: i64, content: &str) -> Result<HttpRequest, ApiError> {
        self.json_request(
            HttpMethod::Post,
            "/comments",
            self.json_auth_headers(),
            &NewComment { review_id, content },
        )
    }

    pub fn build_patch_comment(&self, comment_id: i64, content: &str) -> Result<HttpRequest, ApiError> {
        self.json_request(
            HttpMethod::Patch,
            &format!("/comments/{comment_id}"),
            self.json_auth_headers(),
            &CommentEdit { content },
        )
    }

    pub fn build_delete_comment(&self, comment_id: i64) -> HttpRequest {
        self.request(HttpMethod::Delete, &format!("/comments/{comment_id}"), self.auth_headers())
    }

    // -- users --------------------------------------------------------------

    /// `None` for an empty username: there is nothing to check.
    pub fn build_check_username(&self, username: &str) -> Option<HttpRequest> {
        if username.is_empty() {
            return None;
        }
        let path = with_query("/users/exists", &[("username", username.to_string())]);
        Some(self.request(HttpMethod::Get, &path, Vec::new()))
    }

    pub fn build_fetch_user(&self, username: &str) -> HttpRequest {
        self.request(HttpMethod::Get, &user_path(username, ""), self.auth_headers())
    }

    pub fn build_follow_user(&self, username: &str) -> HttpRequest {
        self.request(HttpMethod::Put, &user_path(username, "/follow"), self.auth_headers())
    }

    pub fn build_unfollow_user(&self, username: &str) -> HttpRequest {
        self.request(HttpMethod::Delete, &user_path(username, "/follow"), self.auth_headers())
    }

    // -- parsing ------------------------------------------------------------

    /// Token issued by login, signup or refresh.
    pub fn parse_token(&self, response: HttpResponse) -> Result<String, ApiError> {
        let body: AuthToken = decode_body(response, "auth token")?;
        Ok(body.token)
    }

    pub fn parse_user(&self, response: HttpResponse) -> Result<User, ApiError> {
        hydrate_body(response)
    }

    pub fn parse_review(&self, response: HttpResponse) -> Result<Review, ApiError> {
        hydrate_body(response)
    }

    pub fn parse_comment(&self, response: HttpResponse) -> Result<Comment, ApiError> {
        hydrate_body(response)
    }

    pub fn parse_review_slice(&self, response: HttpResponse) -> Result<Slice<Review>, ApiError> {
        decode_body(response, "review slice")
    }

    pub fn parse_user_slice(&self, response: HttpResponse) -> Result<Slice<User>, ApiError> {
        decode_body(response, "user slice")
    }

    pub fn parse_exists(&self, response: HttpResponse) -> Result<bool, ApiError> {
        let body: Exists = decode_body(response, "exists")?;
        Ok(body.exists)
    }

    /// For operations whose body the caller does not need.
    pub fn parse_empty(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response)
    }

    // -- helpers ------------------------------------------------------------

    fn request(&self, method: HttpMethod, path: &str, headers: Vec<(String, String)>) -> HttpRequest {
        HttpRequest {
            method,
            url: format!("{}{API_PREFIX}{path}", self.base_url),
            headers,
            body: None,
        }
    }

    fn json_request<T: Serialize>(
        &self,
        method: HttpMethod,
        path: &str,
        headers: Vec<(String, String)>,
        payload: &T,
    ) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(payload).map_err(|e| ApiError::Serialization(e.to_string()))?;
        let mut req = self.request(method, path, headers);
        req.body = Some(Body::Json(body));
        Ok(req)
    }

    /// An absent token is sent as an empty header, never omitted.
    fn auth_headers(&self) -> Vec<(String, String)> {
        vec![
            ("Accept".to_string(), "application/json".to_string()),
            ("Authorization".to_string(), self.session.token().unwrap_or_default()),
        ]
    }

    fn json_auth_headers(&self) -> Vec<(String, String)> {
        let mut headers = self.auth_headers();
        headers.push(("Content-Type".to_string(), "application/json".to_string()));
        headers
    }
}

fn json_headers() -> Vec<(String, String)> {
    vec![
        ("Accept".to_string(), "application/json".to_string()),
        ("Content-Type".to_string(), "application/json".to_string()),
    ]
}

fn page_params() -> Vec<(&'static str, String)> {
    vec![
        ("page", DEFAULT_PAGE.to_string()),
        ("size", DEFAULT_PAGE_SIZE.to_string()),
    ]
}

fn with_query(path: &str, params: &[(&str, String)]) -> String {
    let query: Vec<String> = params
        .iter()
        .map(|(key, value)| format!("{}={}", urlencoding::encode(key), urlencoding::encode(value)))
        .collect();
    format!("{path}?{}", query.join("&"))
}

fn user_path(username: &str, suffix: &str) -> String {
    format!("/users/{}{suffix}", urlencoding::encode(username))
}

/// Map non-success status codes to the appropriate `ApiError` variant.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    if response.status == 404 {
        return Err(ApiError::NotFound);
    }
    Err(ApiError::Http {
        status: response.status,
        body: response.body.clone(),
    })
}

fn parse_json(response: &HttpResponse, entity: &'static str) -> Result<Value, ApiError> {
    check_status(response)?;
    serde_json::from_str(&response.body).map_err(|e| {
        tracing::warn!(entity, error = %e, "response body is not JSON");
        ApiError::Decode(DecodeError::new(entity, e))
    })
}

fn hydrate_body<T: Hydrate>(response: HttpResponse) -> Result<T, ApiError> {
    let json = parse_json(&response, T::ENTITY)?;
    T::from_json(&json).map_err(|e| {
        tracing::warn!(entity = T::ENTITY, error = %e, "failed to hydrate response");
        ApiError::Decode(e)
    })
}

fn decode_body<T: DeserializeOwned>(response: HttpResponse, entity: &'static str) -> Result<T, ApiError> {
    let json = parse_json(&response, entity)?;
    serde_json::from_value(json).map_err(|e| {
        tracing::warn!(entity, error = %e, "failed to decode response");
        ApiError::Decode(DecodeError::new(entity, e))
    })
}
