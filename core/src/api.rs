//! One call per backend endpoint.
//!
//! # Design
//! `MatzipApi` pairs a `MatzipClient` with a `Transport`. Each method builds
//! the request, executes it once and hands back the raw `HttpResponse`
//! whatever its status. There are no retries and no timeouts beyond the
//! transport's own; callers interpret the response, optionally through the
//! client's `parse_*` helpers.

use crate::client::MatzipClient;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::session::Session;
use crate::transport::{Transport, UreqTransport};
use crate::types::{Credentials, NewReview, ProfilePatch, ReviewPatch, ReviewSort, UserSort};

pub type ApiResult = Result<HttpResponse, ApiError>;

#[derive(Debug, Clone)]
pub struct MatzipApi<T = UreqTransport> {
    client: MatzipClient,
    transport: T,
}

impl MatzipApi<UreqTransport> {
    pub fn new(config: &ClientConfig, session: Session) -> Self {
        Self::with_transport(MatzipClient::from_config(config, session), UreqTransport::new())
    }
}

impl<T: Transport> MatzipApi<T> {
    pub fn with_transport(client: MatzipClient, transport: T) -> Self {
        Self { client, transport }
    }

    pub fn client(&self) -> &MatzipClient {
        &self.client
    }

    pub fn session(&self) -> &Session {
        self.client.session()
    }

    fn send(&self, request: HttpRequest) -> ApiResult {
        self.transport.execute(&request)
    }

    pub fn login(&self, username: &str, password: &str) -> ApiResult {
        self.send(self.client.build_login(&Credentials::new(username, password))?)
    }

    /// The stored token is removed before the request goes out, even if the
    /// request then fails.
    pub fn logout(&self) -> ApiResult {
        self.send(self.client.build_logout())
    }

    pub fn signup(&self, username: &str, password: &str) -> ApiResult {
        self.send(self.client.build_signup(&Credentials::new(username, password))?)
    }

    pub fn refresh(&self) -> ApiResult {
        self.send(self.client.build_refresh())
    }

    pub fn get_reviews(&self) -> ApiResult {
        self.send(self.client.build_get_reviews())
    }

    pub fn search_users(&self, username: &str, sort: UserSort, asc: bool) -> ApiResult {
        self.send(self.client.build_search_users(username, sort, asc))
    }

    pub fn search_reviews(&self, keyword: &str, sort: ReviewSort, asc: bool) -> ApiResult {
        self.send(self.client.build_search_reviews(keyword, sort, asc))
    }

    pub fn fetch_me(&self) -> ApiResult {
        self.send(self.client.build_fetch_me())
    }

    pub fn change_username(&self, username: &str) -> ApiResult {
        self.send(self.client.build_change_username(username)?)
    }

    pub fn change_password(&self, password: &str) -> ApiResult {
        self.send(self.client.build_change_password(password)?)
    }

    pub fn patch_me(&self, patch: ProfilePatch) -> ApiResult {
        self.send(self.client.build_patch_me(patch))
    }

    pub fn delete_me(&self) -> ApiResult {
        self.send(self.client.build_delete_me())
    }

    pub fn post_review(&self, review: NewReview) -> ApiResult {
        self.send(self.client.build_post_review(review))
    }

    pub fn fetch_review(&self, review_id: i64) -> ApiResult {
        self.send(self.client.build_fetch_review(review_id))
    }

    pub fn patch_review(&self, review_id: i64, patch: ReviewPatch) -> ApiResult {
        self.send(self.client.build_patch_review(review_id, patch))
    }

    pub fn delete_review(&self, review_id: i64) -> ApiResult {
        self.send(self.client.build_delete_review(review_id))
    }

    pub fn put_like(&self, review_id: i64) -> ApiResult {
        self.send(self.client.build_put_like(review_id))
    }

    pub fn delete_like(&self, review_id: i64) -> ApiResult {
        self.send(self.client.build_delete_like(review_id))
    }

    pub fn put_scrap(&self, review_id: i64, description: &str) -> ApiResult {
        self.send(self.client.build_put_scrap(review_id, description)?)
    }

    pub fn delete_scrap(&self, review_id: i64) -> ApiResult {
        self.send(self.client.build_delete_scrap(review_id))
    }

    pub fn post_comment(&self, review_id: i64, content: &str) -> ApiResult {
        self.send(self.client.build_post_comment(review_id, content)?)
    }

    pub fn patch_comment(&self, comment_id: i64, content: &str) -> ApiResult {
        self.send(self.client.build_patch_comment(comment_id, content)?)
    }

    pub fn delete_comment(&self, comment_id: i64) -> ApiResult {
        self.send(self.client.build_delete_comment(comment_id))
    }

    /// `Ok(None)` without any request when `username` is empty.
    pub fn check_username(&self, username: &str) -> Result<Option<HttpResponse>, ApiError> {
        self.client
            .build_check_username(username)
            .map(|request| self.send(request))
            .transpose()
    }

    pub fn fetch_user(&self, username: &str) -> ApiResult {
        self.send(self.client.build_fetch_user(username))
    }

    pub fn follow_user(&self, username: &str) -> ApiResult {
        self.send(self.client.build_follow_user(username))
    }

    pub fn unfollow_user(&self, username: &str) -> ApiResult {
        self.send(self.client.build_unfollow_user(username))
    }
}
