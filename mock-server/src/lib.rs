//! In-memory stand-in for the matzip backend.
//!
//! Serves the `/api/v1` endpoints the client calls, with the same paths,
//! methods and payload shapes. Tokens are opaque `Bearer …` strings looked up
//! verbatim from the `Authorization` header; an empty header is anonymous.

pub mod store;

use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    routing::{get, patch, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};

pub use store::{
    CommentView, Listing, MeView, ProfileView, ReviewView, ScrapView, SliceView, Store, UserView,
};
use store::{CommentRecord, ReviewRecord, UserRecord};

pub type Db = Arc<RwLock<Store>>;

type Reply<T> = Result<Json<T>, StatusCode>;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExistsResponse {
    pub exists: bool,
}

#[derive(Deserialize)]
pub struct UsernameChange {
    pub username: String,
}

#[derive(Deserialize)]
pub struct PasswordChange {
    pub password: String,
}

#[derive(Deserialize)]
pub struct ScrapRequest {
    pub description: String,
}

#[derive(Deserialize)]
pub struct NewComment {
    pub review_id: i64,
    pub content: String,
}

#[derive(Deserialize)]
pub struct CommentEdit {
    pub content: String,
}

#[derive(Deserialize)]
pub struct ExistsQuery {
    pub username: String,
}

#[derive(Deserialize)]
pub struct SearchQuery {
    pub keyword: Option<String>,
    pub username: Option<String>,
    pub page: Option<usize>,
    pub size: Option<usize>,
    pub sort: Option<String>,
    pub asc: Option<bool>,
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    Router::new()
        .route("/api/v1/auth/signup", post(signup))
        .route("/api/v1/auth/login", post(login))
        .route("/api/v1/auth/logout", post(logout))
        .route("/api/v1/auth/refresh", post(refresh))
        .route("/api/v1/search/reviews", get(search_reviews))
        .route("/api/v1/search/users", get(search_users))
        .route("/api/v1/me", get(fetch_me).patch(patch_me).delete(delete_me))
        .route("/api/v1/me/username", put(change_username))
        .route("/api/v1/me/password", put(change_password))
        .route("/api/v1/reviews", post(post_review))
        .route(
            "/api/v1/reviews/{id}",
            get(fetch_review).patch(patch_review).delete(delete_review),
        )
        .route("/api/v1/reviews/{id}/heart", put(put_heart).delete(delete_heart))
        .route("/api/v1/reviews/{id}/scrap", put(put_scrap).delete(delete_scrap))
        .route("/api/v1/comments", post(post_comment))
        .route("/api/v1/comments/{id}", patch(patch_comment).delete(delete_comment))
        .route("/api/v1/users/exists", get(user_exists))
        .route("/api/v1/users/{username}", get(fetch_user))
        .route("/api/v1/users/{username}/follow", put(follow).delete(unfollow))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn viewer(store: &Store, headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    store.tokens.get(value).cloned()
}

fn require_user(store: &Store, headers: &HeaderMap) -> Result<String, StatusCode> {
    viewer(store, headers).ok_or(StatusCode::UNAUTHORIZED)
}

/// Multipart fields, read fully before any lock is taken.
#[derive(Default)]
struct Form {
    texts: Vec<(String, String)>,
    files: Vec<(String, String)>,
}

impl Form {
    async fn read(mut multipart: Multipart) -> Result<Self, StatusCode> {
        let mut form = Form::default();
        while let Some(field) = multipart.next_field().await.map_err(|_| StatusCode::BAD_REQUEST)? {
            let name = field.name().unwrap_or_default().to_string();
            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    field.bytes().await.map_err(|_| StatusCode::BAD_REQUEST)?;
                    form.files.push((name, file_name));
                }
                None => {
                    let text = field.text().await.map_err(|_| StatusCode::BAD_REQUEST)?;
                    form.texts.push((name, text));
                }
            }
        }
        Ok(form)
    }

    fn text(&self, name: &str) -> Option<&str> {
        self.texts.iter().find(|(n, _)| n == name).map(|(_, v)| v.as_str())
    }

    fn texts(&self, name: &str) -> Vec<String> {
        self.texts.iter().filter(|(n, _)| n == name).map(|(_, v)| v.clone()).collect()
    }

    fn files(&self, name: &str) -> Vec<&str> {
        self.files.iter().filter(|(n, _)| n == name).map(|(_, f)| f.as_str()).collect()
    }

    fn rating(&self) -> Result<Option<u8>, StatusCode> {
        match self.text("rating") {
            None => Ok(None),
            Some(raw) => match raw.parse::<u8>() {
                Ok(rating) if rating <= 5 => Ok(Some(rating)),
                _ => Err(StatusCode::BAD_REQUEST),
            },
        }
    }
}

fn image_url(owner: &str, file_name: &str) -> String {
    format!("https://images.matzip.test/{owner}/{}/{file_name}", uuid::Uuid::new_v4().simple())
}

// --- auth ---

async fn signup(State(db): State<Db>, Json(input): Json<Credentials>) -> Reply<TokenResponse> {
    if input.username.trim().is_empty() || input.password.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }
    let mut store = db.write().await;
    if store.users.contains_key(&input.username) {
        return Err(StatusCode::CONFLICT);
    }
    store.users.insert(
        input.username.clone(),
        UserRecord {
            username: input.username.clone(),
            password: input.password,
            profile_string: None,
            profile_image_url: None,
            followers: Default::default(),
            followings: Default::default(),
        },
    );
    tracing::info!(username = %input.username, "signed up");
    Ok(Json(TokenResponse {
        token: store.issue_token(&input.username),
    }))
}

async fn login(State(db): State<Db>, Json(input): Json<Credentials>) -> Reply<TokenResponse> {
    let mut store = db.write().await;
    let matches = store
        .users
        .get(&input.username)
        .is_some_and(|u| u.password == input.password);
    if !matches {
        return Err(StatusCode::UNAUTHORIZED);
    }
    tracing::info!(username = %input.username, "logged in");
    Ok(Json(TokenResponse {
        token: store.issue_token(&input.username),
    }))
}

async fn logout(State(db): State<Db>, headers: HeaderMap) -> StatusCode {
    if let Some(value) = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        db.write().await.tokens.remove(value);
    }
    StatusCode::OK
}

async fn refresh(State(db): State<Db>, headers: HeaderMap) -> Reply<TokenResponse> {
    let mut store = db.write().await;
    let username = require_user(&store, &headers)?;
    Ok(Json(TokenResponse {
        token: store.issue_token(&username),
    }))
}

// --- search ---

fn ordered<T, K: Ord>(items: &mut [T], asc: bool, key: impl Fn(&T) -> K) {
    items.sort_by_key(|item| key(item));
    if !asc {
        items.reverse();
    }
}

async fn search_reviews(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(query): Query<SearchQuery>,
) -> Reply<SliceView<ReviewView>> {
    let store = db.read().await;
    let me = viewer(&store, &headers);
    let keyword = query.keyword.unwrap_or_default().to_lowercase();
    let mut found: Vec<ReviewView> = store
        .reviews
        .values()
        .filter(|r| {
            keyword.is_empty()
                || r.content.to_lowercase().contains(&keyword)
                || r.restaurant.to_lowercase().contains(&keyword)
        })
        .filter_map(|r| store.review_view(r, me.as_deref()))
        .collect();

    let asc = query.asc.unwrap_or(false);
    match query.sort.as_deref() {
        Some("username") => ordered(&mut found, asc, |r| r.user.username.clone()),
        Some("level") => ordered(&mut found, asc, |r| r.user.matzip_level),
        Some("hearts") => ordered(&mut found, asc, |r| r.number_of_hearts),
        Some("scraps") => ordered(&mut found, asc, |r| r.number_of_scraps),
        Some("comments") => ordered(&mut found, asc, |r| r.comments.len()),
        Some("rating") => ordered(&mut found, asc, |r| r.rating),
        Some("followers") | None => ordered(&mut found, asc, |r| r.id),
        Some(_) => return Err(StatusCode::BAD_REQUEST),
    }

    Ok(Json(SliceView::page(&found, query.page.unwrap_or(0), query.size.unwrap_or(20))))
}

async fn search_users(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(query): Query<SearchQuery>,
) -> Reply<SliceView<UserView>> {
    let store = db.read().await;
    let me = viewer(&store, &headers);
    let needle = query.username.filter(|u| !u.is_empty()).ok_or(StatusCode::BAD_REQUEST)?;
    let mut found: Vec<(usize, UserView)> = store
        .users
        .values()
        .filter(|u| u.username.contains(&needle))
        .map(|u| (u.followers.len(), store.user_view(u, me.as_deref())))
        .collect();

    let asc = query.asc.unwrap_or(false);
    match query.sort.as_deref() {
        Some("username") | None => ordered(&mut found, asc, |(_, u)| u.username.clone()),
        Some("level") => ordered(&mut found, asc, |(_, u)| u.matzip_level),
        Some("followers") => ordered(&mut found, asc, |(followers, _)| *followers),
        Some(_) => return Err(StatusCode::BAD_REQUEST),
    }

    let users: Vec<UserView> = found.into_iter().map(|(_, u)| u).collect();
    Ok(Json(SliceView::page(&users, query.page.unwrap_or(0), query.size.unwrap_or(20))))
}

// --- me ---

async fn fetch_me(State(db): State<Db>, headers: HeaderMap) -> Reply<MeView> {
    let store = db.read().await;
    let me = require_user(&store, &headers)?;
    store.me_view(&me).map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn patch_me(State(db): State<Db>, headers: HeaderMap, multipart: Multipart) -> Reply<MeView> {
    let form = Form::read(multipart).await?;
    let mut store = db.write().await;
    let me = require_user(&store, &headers)?;
    let user = store.users.get_mut(&me).ok_or(StatusCode::NOT_FOUND)?;
    if let Some(profile) = form.text("profile") {
        user.profile_string = Some(profile.to_string());
    }
    if let Some(file_name) = form.files("image").first() {
        user.profile_image_url = Some(image_url(&me, file_name));
    }
    store.me_view(&me).map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn delete_me(State(db): State<Db>, headers: HeaderMap) -> Result<StatusCode, StatusCode> {
    let mut store = db.write().await;
    let me = require_user(&store, &headers)?;
    store.delete_user(&me);
    tracing::info!(username = %me, "deleted account");
    Ok(StatusCode::OK)
}

async fn change_username(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<UsernameChange>,
) -> Reply<MeView> {
    let mut store = db.write().await;
    let me = require_user(&store, &headers)?;
    if input.username.trim().is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }
    if input.username != me && store.users.contains_key(&input.username) {
        return Err(StatusCode::CONFLICT);
    }
    store.rename_user(&me, &input.username);
    store.me_view(&input.username).map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn change_password(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<PasswordChange>,
) -> Result<StatusCode, StatusCode> {
    let mut store = db.write().await;
    let me = require_user(&store, &headers)?;
    if input.password.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }
    let user = store.users.get_mut(&me).ok_or(StatusCode::NOT_FOUND)?;
    user.password = input.password;
    Ok(StatusCode::OK)
}

// --- reviews ---

async fn post_review(State(db): State<Db>, headers: HeaderMap, multipart: Multipart) -> Reply<ReviewView> {
    let form = Form::read(multipart).await?;
    let mut store = db.write().await;
    let me = require_user(&store, &headers)?;

    let content = form.text("content").filter(|c| !c.trim().is_empty());
    let restaurant = form.text("restaurant").filter(|r| !r.trim().is_empty());
    let images = form.files("images");
    let (Some(content), Some(restaurant), Some(rating)) = (content, restaurant, form.rating()?) else {
        return Err(StatusCode::BAD_REQUEST);
    };
    if images.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let id = store.next_id();
    let review = ReviewRecord {
        id,
        author: me.clone(),
        content: content.to_string(),
        rating,
        restaurant: restaurant.to_string(),
        image_urls: images.iter().map(|f| image_url(&me, f)).collect(),
        views: 0,
        hearts: Default::default(),
        scraps: Default::default(),
    };
    let view = store.review_view(&review, Some(me.as_str()));
    store.reviews.insert(id, review);
    view.map(Json).ok_or(StatusCode::INTERNAL_SERVER_ERROR)
}

async fn fetch_review(State(db): State<Db>, headers: HeaderMap, Path(id): Path<i64>) -> Reply<ReviewView> {
    let mut store = db.write().await;
    let me = viewer(&store, &headers);
    let review = store.reviews.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    review.views += 1;
    let review = review.clone();
    store.review_view(&review, me.as_deref()).map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn patch_review(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Reply<ReviewView> {
    let form = Form::read(multipart).await?;
    let rating = form.rating()?;
    let mut store = db.write().await;
    let me = require_user(&store, &headers)?;
    let review = store.reviews.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    if review.author != me {
        return Err(StatusCode::FORBIDDEN);
    }

    if let Some(content) = form.text("content") {
        review.content = content.to_string();
    }
    if let Some(rating) = rating {
        review.rating = rating;
    }
    let kept = form.texts("oldUrls");
    let added = form.files("images");
    if !kept.is_empty() || !added.is_empty() {
        let mut urls: Vec<String> = review.image_urls.iter().filter(|u| kept.contains(u)).cloned().collect();
        urls.extend(added.iter().map(|f| image_url(&me, f)));
        review.image_urls = urls;
    }

    let review = review.clone();
    store.review_view(&review, Some(me.as_str())).map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn delete_review(State(db): State<Db>, headers: HeaderMap, Path(id): Path<i64>) -> Result<StatusCode, StatusCode> {
    let mut store = db.write().await;
    let me = require_user(&store, &headers)?;
    let review = store.reviews.get(&id).ok_or(StatusCode::NOT_FOUND)?;
    if review.author != me {
        return Err(StatusCode::FORBIDDEN);
    }
    store.reviews.remove(&id);
    store.comments.retain(|_, c| c.review_id != id);
    Ok(StatusCode::OK)
}

/// Apply `change` to review `id` as the signed-in user and return the result.
async fn interact(
    db: &Db,
    headers: &HeaderMap,
    id: i64,
    change: impl FnOnce(&mut ReviewRecord, &str),
) -> Reply<ReviewView> {
    let mut store = db.write().await;
    let me = require_user(&store, headers)?;
    let review = store.reviews.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    change(review, &me);
    let review = review.clone();
    store.review_view(&review, Some(me.as_str())).map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn put_heart(State(db): State<Db>, headers: HeaderMap, Path(id): Path<i64>) -> Reply<ReviewView> {
    interact(&db, &headers, id, |review, me| {
        review.hearts.insert(me.to_string());
    })
    .await
}

async fn delete_heart(State(db): State<Db>, headers: HeaderMap, Path(id): Path<i64>) -> Reply<ReviewView> {
    interact(&db, &headers, id, |review, me| {
        review.hearts.remove(me);
    })
    .await
}

async fn put_scrap(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(input): Json<ScrapRequest>,
) -> Reply<ReviewView> {
    interact(&db, &headers, id, |review, me| {
        review.scraps.insert(me.to_string(), input.description);
    })
    .await
}

async fn delete_scrap(State(db): State<Db>, headers: HeaderMap, Path(id): Path<i64>) -> Reply<ReviewView> {
    interact(&db, &headers, id, |review, me| {
        review.scraps.remove(me);
    })
    .await
}

// --- comments ---

async fn post_comment(State(db): State<Db>, headers: HeaderMap, Json(input): Json<NewComment>) -> Reply<CommentView> {
    let mut store = db.write().await;
    let me = require_user(&store, &headers)?;
    if input.content.trim().is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }
    if !store.reviews.contains_key(&input.review_id) {
        return Err(StatusCode::NOT_FOUND);
    }
    let id = store.next_id();
    let comment = CommentRecord {
        id,
        review_id: input.review_id,
        author: me.clone(),
        content: input.content,
    };
    let view = store.comment_view(&comment, Some(me.as_str()));
    store.comments.insert(id, comment);
    view.map(Json).ok_or(StatusCode::INTERNAL_SERVER_ERROR)
}

async fn patch_comment(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(input): Json<CommentEdit>,
) -> Reply<CommentView> {
    let mut store = db.write().await;
    let me = require_user(&store, &headers)?;
    let comment = store.comments.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    if comment.author != me {
        return Err(StatusCode::FORBIDDEN);
    }
    comment.content = input.content;
    let comment = comment.clone();
    store.comment_view(&comment, Some(me.as_str())).map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn delete_comment(State(db): State<Db>, headers: HeaderMap, Path(id): Path<i64>) -> Result<StatusCode, StatusCode> {
    let mut store = db.write().await;
    let me = require_user(&store, &headers)?;
    let comment = store.comments.get(&id).ok_or(StatusCode::NOT_FOUND)?;
    if comment.author != me {
        return Err(StatusCode::FORBIDDEN);
    }
    store.comments.remove(&id);
    Ok(StatusCode::OK)
}

// --- users ---

async fn user_exists(State(db): State<Db>, Query(query): Query<ExistsQuery>) -> Json<ExistsResponse> {
    let store = db.read().await;
    Json(ExistsResponse {
        exists: store.users.contains_key(&query.username),
    })
}

async fn fetch_user(State(db): State<Db>, headers: HeaderMap, Path(username): Path<String>) -> Reply<ProfileView> {
    let store = db.read().await;
    let me = viewer(&store, &headers);
    store
        .profile_view(&username, me.as_deref())
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn set_follow(db: &Db, headers: &HeaderMap, target: &str, follow: bool) -> Reply<UserView> {
    let mut store = db.write().await;
    let me = require_user(&store, headers)?;
    if me == target {
        return Err(StatusCode::BAD_REQUEST);
    }
    if !store.users.contains_key(target) {
        return Err(StatusCode::NOT_FOUND);
    }
    for (owner, other, outgoing) in [(me.as_str(), target, true), (target, me.as_str(), false)] {
        let Some(user) = store.users.get_mut(owner) else {
            continue;
        };
        let set = if outgoing { &mut user.followings } else { &mut user.followers };
        if follow {
            set.insert(other.to_string());
        } else {
            set.remove(other);
        }
    }
    let user = store.users.get(target).ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(store.user_view(user, Some(me.as_str()))))
}

async fn follow(State(db): State<Db>, headers: HeaderMap, Path(username): Path<String>) -> Reply<UserView> {
    set_follow(&db, &headers, &username, true).await
}

async fn unfollow(State(db): State<Db>, headers: HeaderMap, Path(username): Path<String>) -> Reply<UserView> {
    set_follow(&db, &headers, &username, false).await
}
