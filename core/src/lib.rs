//! Client data layer for the matzip restaurant-review service.
//!
//! # Overview
//! Builds `HttpRequest` values and parses `HttpResponse` values without
//! touching the network (host-does-IO pattern). `MatzipApi` adds a transport
//! on top for callers that want one call per endpoint returning the raw
//! response.
//!
//! # Design
//! - `MatzipClient` holds the base URL and a `Session`; the token is read
//!   from the session each time a request is built.
//! - DTOs hydrate from JSON through the `Hydrate` trait and fail with a
//!   `DecodeError` instead of producing half-filled objects.
//! - Request inputs are typed per endpoint; optional fields are `Option`s.

pub mod api;
pub mod client;
pub mod config;
pub mod dto;
pub mod error;
pub mod format;
pub mod http;
pub mod routes;
pub mod session;
pub mod transport;
pub mod types;

pub use api::{ApiResult, MatzipApi};
pub use client::MatzipClient;
pub use config::ClientConfig;
pub use dto::{AuthToken, Comment, CommentAuthor, Exists, Hydrate, Restaurant, Review, Slice, User};
pub use error::{ApiError, DecodeError, RouteError};
pub use format::format_count;
pub use http::{Body, HttpMethod, HttpRequest, HttpResponse, MultipartForm, PartValue, Upload};
pub use routes::{load_review_page, load_user_page, NavigationContext, PageData, QueryParams};
pub use session::{Session, SessionState, SubscriptionId};
pub use transport::{Transport, UreqTransport};
pub use types::{Credentials, NewReview, ProfilePatch, ReviewPatch, ReviewSort, UserSort};
