use axum::http::{self, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use mock_server::{app, ExistsResponse, MeView, ProfileView, ReviewView, SliceView, TokenResponse, UserView};
use tower::ServiceExt;

const BOUNDARY: &str = "mock-test-boundary";

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn json_request(method: &str, uri: &str, token: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::AUTHORIZATION, token)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

fn empty_request(method: &str, uri: &str, token: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::AUTHORIZATION, token)
        .body(String::new())
        .unwrap()
}

/// `texts` are plain fields, `files` are `(field, file name)` pairs.
fn multipart_request(method: &str, uri: &str, token: &str, texts: &[(&str, &str)], files: &[(&str, &str)]) -> Request<String> {
    let mut body = String::new();
    for (name, value) in texts {
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        ));
    }
    for (name, file_name) in files {
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: image/png\r\n\r\npng\r\n"
        ));
    }
    body.push_str(&format!("--{BOUNDARY}--\r\n"));
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::AUTHORIZATION, token)
        .header(http::header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(body)
        .unwrap()
}

async fn signup(app: &Router, username: &str) -> String {
    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/auth/signup",
            "",
            &format!(r#"{{"username":"{username}","password":"pw"}}"#),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    body_json::<TokenResponse>(resp).await.token
}

async fn post_review(app: &Router, token: &str, content: &str) -> ReviewView {
    let resp = app
        .clone()
        .oneshot(multipart_request(
            "POST",
            "/api/v1/reviews",
            token,
            &[("content", content), ("rating", "4"), ("restaurant", "Eulji Myeonok")],
            &[("images", "a.png"), ("images", "b.png")],
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    body_json(resp).await
}

// --- auth ---

#[tokio::test]
async fn signup_then_login_issue_bearer_tokens() {
    let app = app();
    let token = signup(&app, "alice").await;
    assert!(token.starts_with("Bearer "));

    let resp = app
        .clone()
        .oneshot(json_request("POST", "/api/v1/auth/login", "", r#"{"username":"alice","password":"pw"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let second: TokenResponse = body_json(resp).await;
    assert_ne!(second.token, token);
}

#[tokio::test]
async fn duplicate_signup_conflicts() {
    let app = app();
    signup(&app, "alice").await;
    let resp = app
        .oneshot(json_request("POST", "/api/v1/auth/signup", "", r#"{"username":"alice","password":"x"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let app = app();
    signup(&app, "alice").await;
    let resp = app
        .oneshot(json_request("POST", "/api/v1/auth/login", "", r#"{"username":"alice","password":"nope"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn me_requires_a_known_token() {
    let app = app();
    let resp = app
        .clone()
        .oneshot(empty_request("GET", "/api/v1/me", ""))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = app
        .oneshot(empty_request("GET", "/api/v1/me", "Bearer forged"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_revokes_the_presented_token() {
    let app = app();
    let token = signup(&app, "alice").await;
    let resp = app
        .clone()
        .oneshot(empty_request("POST", "/api/v1/auth/logout", &token))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
        .oneshot(empty_request("GET", "/api/v1/me", &token))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

// --- reviews ---

#[tokio::test]
async fn posted_review_can_be_fetched() {
    let app = app();
    let token = signup(&app, "alice").await;
    let review = post_review(&app, &token, "cold noodles").await;
    assert_eq!(review.image_urls.len(), 2);
    assert!(review.is_deletable);

    let resp = app
        .oneshot(empty_request("GET", &format!("/api/v1/reviews/{}", review.id), ""))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let fetched: ReviewView = body_json(resp).await;
    assert_eq!(fetched.content, "cold noodles");
    assert_eq!(fetched.user.username, "alice");
    assert_eq!(fetched.views, 1);
    assert!(!fetched.is_deletable);
}

#[tokio::test]
async fn review_without_images_is_rejected() {
    let app = app();
    let token = signup(&app, "alice").await;
    let resp = app
        .oneshot(multipart_request(
            "POST",
            "/api/v1/reviews",
            &token,
            &[("content", "x"), ("rating", "3"), ("restaurant", "r")],
            &[],
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn only_the_author_may_edit_a_review() {
    let app = app();
    let alice = signup(&app, "alice").await;
    let bob = signup(&app, "bob").await;
    let review = post_review(&app, &alice, "first").await;
    let uri = format!("/api/v1/reviews/{}", review.id);

    let resp = app
        .clone()
        .oneshot(multipart_request("PATCH", &uri, &bob, &[("content", "hijacked")], &[]))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let kept = review.image_urls[0].clone();
    let resp = app
        .oneshot(multipart_request(
            "PATCH",
            &uri,
            &alice,
            &[("content", "second"), ("oldUrls", kept.as_str())],
            &[("images", "c.png")],
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let patched: ReviewView = body_json(resp).await;
    assert_eq!(patched.content, "second");
    assert_eq!(patched.rating, 4);
    assert_eq!(patched.image_urls.len(), 2);
    assert_eq!(patched.image_urls[0], kept);
}

#[tokio::test]
async fn hearts_and_scraps_show_up_on_me() {
    let app = app();
    let alice = signup(&app, "alice").await;
    let bob = signup(&app, "bob").await;
    let review = post_review(&app, &alice, "dumplings").await;

    let resp = app
        .clone()
        .oneshot(empty_request("PUT", &format!("/api/v1/reviews/{}/heart", review.id), &bob))
        .await
        .unwrap();
    let hearted: ReviewView = body_json(resp).await;
    assert!(hearted.is_hearted);
    assert_eq!(hearted.number_of_hearts, 1);

    app.clone()
        .oneshot(json_request(
            "PUT",
            &format!("/api/v1/reviews/{}/scrap", review.id),
            &bob,
            r#"{"description":"try later"}"#,
        ))
        .await
        .unwrap();

    let resp = app
        .oneshot(empty_request("GET", "/api/v1/me", &bob))
        .await
        .unwrap();
    let me: MeView = body_json(resp).await;
    assert_eq!(me.hearted_reviews.count, 1);
    assert_eq!(me.scraps.data[0].description, "try later");
    assert_eq!(me.scraps.data[0].review.scrap_description.as_deref(), Some("try later"));
}

#[tokio::test]
async fn comment_on_missing_review_is_not_found() {
    let app = app();
    let token = signup(&app, "alice").await;
    let resp = app
        .oneshot(json_request("POST", "/api/v1/comments", &token, r#"{"review_id":99,"content":"hi"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn comments_serialize_deletable_flag() {
    let app = app();
    let token = signup(&app, "alice").await;
    let review = post_review(&app, &token, "soup").await;
    let resp = app
        .oneshot(json_request(
            "POST",
            "/api/v1/comments",
            &token,
            &format!(r#"{{"review_id":{},"content":"agreed"}}"#, review.id),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let raw: serde_json::Value = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(raw["deletable"], true);
    assert_eq!(raw["review_id"], review.id);
}

// --- users ---

#[tokio::test]
async fn exists_reports_taken_names() {
    let app = app();
    signup(&app, "alice").await;

    for (name, expected) in [("alice", true), ("nobody", false)] {
        let resp = app
            .clone()
            .oneshot(empty_request("GET", &format!("/api/v1/users/exists?username={name}"), ""))
            .await
            .unwrap();
        let body: ExistsResponse = body_json(resp).await;
        assert_eq!(body.exists, expected, "{name}");
    }
}

#[tokio::test]
async fn follow_updates_both_sides() {
    let app = app();
    let alice = signup(&app, "alice").await;
    signup(&app, "bob").await;

    let resp = app
        .clone()
        .oneshot(empty_request("PUT", "/api/v1/users/bob/follow", &alice))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bob: UserView = body_json(resp).await;
    assert!(bob.is_my_following);

    let resp = app
        .clone()
        .oneshot(empty_request("GET", "/api/v1/users/bob", ""))
        .await
        .unwrap();
    let profile: ProfileView = body_json(resp).await;
    assert_eq!(profile.number_of_followers, 1);
    assert_eq!(profile.followers[0].username, "alice");

    let resp = app
        .oneshot(empty_request("PUT", "/api/v1/users/alice/follow", &alice))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- search ---

#[tokio::test]
async fn search_returns_a_slice() {
    let app = app();
    let token = signup(&app, "alice").await;
    post_review(&app, &token, "spicy ramen").await;
    post_review(&app, &token, "mild porridge").await;

    let resp = app
        .clone()
        .oneshot(empty_request(
            "GET",
            "/api/v1/search/reviews?page=0&size=100&keyword=RAMEN&sort=rating&asc=false",
            &token,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let slice: SliceView<ReviewView> = body_json(resp).await;
    assert_eq!(slice.content.len(), 1);
    assert!(slice.last);

    let resp = app
        .oneshot(empty_request(
            "GET",
            "/api/v1/search/users?page=0&size=100&username=ali&sort=username&asc=true",
            "",
        ))
        .await
        .unwrap();
    let users: SliceView<UserView> = body_json(resp).await;
    assert_eq!(users.content.len(), 1);
    assert_eq!(users.content[0].username, "alice");
}
