//! Request inputs, one type per endpoint that takes more than a scalar.
//!
//! # Design
//! Optional fields are explicit `Option`s (or possibly-empty `Vec`s) and only
//! present fields reach the wire. JSON payloads derive `Serialize` with the
//! wire field names; multipart payloads are turned into a `MultipartForm` by
//! `into_form`.

use std::fmt;

use serde::Serialize;

use crate::http::{MultipartForm, Upload};

/// Username and password for login and signup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
        }
    }
}

/// Sort keys accepted by user search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserSort {
    Username,
    Level,
    Followers,
}

impl UserSort {
    pub fn as_str(self) -> &'static str {
        match self {
            UserSort::Username => "username",
            UserSort::Level => "level",
            UserSort::Followers => "followers",
        }
    }
}

impl fmt::Display for UserSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sort keys accepted by review search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewSort {
    Username,
    Level,
    Followers,
    Hearts,
    Scraps,
    Comments,
    Rating,
}

impl ReviewSort {
    pub fn as_str(self) -> &'static str {
        match self {
            ReviewSort::Username => "username",
            ReviewSort::Level => "level",
            ReviewSort::Followers => "followers",
            ReviewSort::Hearts => "hearts",
            ReviewSort::Scraps => "scraps",
            ReviewSort::Comments => "comments",
            ReviewSort::Rating => "rating",
        }
    }
}

impl fmt::Display for ReviewSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct UsernameChange<'a> {
    pub username: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct PasswordChange<'a> {
    pub password: &'a str,
}

/// Partial update of the signed-in user's profile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfilePatch {
    pub image: Option<Upload>,
    pub profile: Option<String>,
}

impl ProfilePatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn image(mut self, image: Upload) -> Self {
        self.image = Some(image);
        self
    }

    pub fn profile(mut self, profile: &str) -> Self {
        self.profile = Some(profile.to_string());
        self
    }

    pub fn into_form(self) -> MultipartForm {
        let mut form = MultipartForm::new();
        if let Some(profile) = self.profile {
            form.text("profile", profile);
        }
        if let Some(image) = self.image {
            form.file("image", image);
        }
        form
    }
}

/// A review to publish. Every field is required by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReview {
    pub content: String,
    pub rating: u8,
    pub images: Vec<Upload>,
    pub restaurant: String,
}

impl NewReview {
    pub fn into_form(self) -> MultipartForm {
        let mut form = MultipartForm::new();
        form.text("content", self.content);
        form.text("rating", self.rating.to_string());
        for image in self.images {
            form.file("images", image);
        }
        form.text("restaurant", self.restaurant);
        form
    }
}

/// Partial update of a review. `old_urls` lists the existing images to keep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewPatch {
    pub content: Option<String>,
    pub rating: Option<u8>,
    pub images: Vec<Upload>,
    pub old_urls: Vec<String>,
}

impl ReviewPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content(mut self, content: &str) -> Self {
        self.content = Some(content.to_string());
        self
    }

    pub fn rating(mut self, rating: u8) -> Self {
        self.rating = Some(rating);
        self
    }

    pub fn image(mut self, image: Upload) -> Self {
        self.images.push(image);
        self
    }

    pub fn keep_url(mut self, url: &str) -> Self {
        self.old_urls.push(url.to_string());
        self
    }

    pub fn into_form(self) -> MultipartForm {
        let mut form = MultipartForm::new();
        if let Some(content) = self.content {
            form.text("content", content);
        }
        if let Some(rating) = self.rating {
            form.text("rating", rating.to_string());
        }
        for image in self.images {
            form.file("images", image);
        }
        for url in self.old_urls {
            form.text("oldUrls", url);
        }
        form
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct ScrapRequest<'a> {
    pub description: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct NewComment<'a> {
    pub review_id: i64,
    pub content: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct CommentEdit<'a> {
    pub content: &'a str,
}
