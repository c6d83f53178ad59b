//! In-memory records and the JSON views the handlers return.
//!
//! Views use the backend's snake_case field names, including its quirks
//! (`number_of_hearts`, `is_scraped`, `deletable` on comments, page envelopes
//! on `/me`), so the client is tested against the real wire shape.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

/// Every record is stamped with the same instant.
pub const TIMESTAMP: &str = "2022-11-20T12:00:00";

#[derive(Debug, Clone)]
pub struct UserRecord {
    pub username: String,
    pub password: String,
    pub profile_string: Option<String>,
    pub profile_image_url: Option<String>,
    pub followers: BTreeSet<String>,
    pub followings: BTreeSet<String>,
}

#[derive(Debug, Clone)]
pub struct ReviewRecord {
    pub id: i64,
    pub author: String,
    pub content: String,
    pub rating: u8,
    pub restaurant: String,
    pub image_urls: Vec<String>,
    pub views: u64,
    pub hearts: BTreeSet<String>,
    /// username → scrap description
    pub scraps: BTreeMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct CommentRecord {
    pub id: i64,
    pub review_id: i64,
    pub author: String,
    pub content: String,
}

#[derive(Debug, Default)]
pub struct Store {
    pub users: BTreeMap<String, UserRecord>,
    /// Authorization header value → username
    pub tokens: HashMap<String, String>,
    pub reviews: BTreeMap<i64, ReviewRecord>,
    pub comments: BTreeMap<i64, CommentRecord>,
    next_id: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserView {
    pub username: String,
    pub profile_image_url: Option<String>,
    pub profile_string: Option<String>,
    pub matzip_level: i32,
    pub is_my_follower: bool,
    pub is_my_following: bool,
    pub is_me: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CommentView {
    pub id: i64,
    pub created_at: String,
    pub modified_at: String,
    pub review_id: i64,
    pub user: UserView,
    pub content: String,
    pub deletable: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReviewView {
    pub id: i64,
    pub created_at: String,
    pub modified_at: String,
    pub user: UserView,
    pub content: String,
    pub image_urls: Vec<String>,
    pub rating: u8,
    pub restaurant: String,
    pub views: u64,
    pub is_deletable: bool,
    pub is_hearted: bool,
    pub is_scraped: bool,
    pub scrap_description: Option<String>,
    pub number_of_scraps: usize,
    pub number_of_hearts: usize,
    pub comments: Vec<CommentView>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScrapView {
    pub created_at: String,
    pub description: String,
    pub review: ReviewView,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Listing<T> {
    pub data: Vec<T>,
    pub count: usize,
}

impl<T> Listing<T> {
    fn of(data: Vec<T>) -> Self {
        let count = data.len();
        Self { data, count }
    }
}

/// `GET /users/{username}`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProfileView {
    #[serde(flatten)]
    pub user: UserView,
    pub number_of_followers: usize,
    pub number_of_followings: usize,
    pub followers: Vec<UserView>,
    pub followings: Vec<UserView>,
    pub reviews: Vec<ReviewView>,
}

/// `GET /me`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MeView {
    #[serde(flatten)]
    pub user: UserView,
    pub created_at: String,
    pub number_of_followers: usize,
    pub number_of_followings: usize,
    pub reviews: Listing<ReviewView>,
    pub my_followers: Listing<UserView>,
    pub my_followings: Listing<UserView>,
    pub comments: Listing<CommentView>,
    pub scraps: Listing<ScrapView>,
    pub hearted_reviews: Listing<ReviewView>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SliceView<T> {
    pub content: Vec<T>,
    pub number: usize,
    pub size: usize,
    pub last: bool,
}

impl<T: Clone> SliceView<T> {
    pub fn page(items: &[T], number: usize, size: usize) -> Self {
        let start = number.saturating_mul(size).min(items.len());
        let end = start.saturating_add(size).min(items.len());
        Self {
            content: items[start..end].to_vec(),
            number,
            size,
            last: end >= items.len(),
        }
    }
}

impl Store {
    pub fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn issue_token(&mut self, username: &str) -> String {
        let token = format!("Bearer {}", uuid::Uuid::new_v4().simple());
        self.tokens.insert(token.clone(), username.to_string());
        token
    }

    pub fn user_view(&self, user: &UserRecord, viewer: Option<&str>) -> UserView {
        let level = self.reviews.values().filter(|r| r.author == user.username).count();
        UserView {
            username: user.username.clone(),
            profile_image_url: user.profile_image_url.clone(),
            profile_string: user.profile_string.clone(),
            matzip_level: i32::try_from(level).unwrap_or(i32::MAX),
            is_my_follower: viewer.is_some_and(|v| user.followings.contains(v)),
            is_my_following: viewer.is_some_and(|v| user.followers.contains(v)),
            is_me: viewer == Some(user.username.as_str()),
        }
    }

    fn user_view_by_name(&self, username: &str, viewer: Option<&str>) -> Option<UserView> {
        self.users.get(username).map(|user| self.user_view(user, viewer))
    }

    pub fn comment_view(&self, comment: &CommentRecord, viewer: Option<&str>) -> Option<CommentView> {
        Some(CommentView {
            id: comment.id,
            created_at: TIMESTAMP.to_string(),
            modified_at: TIMESTAMP.to_string(),
            review_id: comment.review_id,
            user: self.user_view_by_name(&comment.author, viewer)?,
            content: comment.content.clone(),
            deletable: viewer == Some(comment.author.as_str()),
        })
    }

    pub fn review_view(&self, review: &ReviewRecord, viewer: Option<&str>) -> Option<ReviewView> {
        let scrap = viewer.and_then(|v| review.scraps.get(v));
        let comments = self
            .comments
            .values()
            .filter(|c| c.review_id == review.id)
            .filter_map(|c| self.comment_view(c, viewer))
            .collect();
        Some(ReviewView {
            id: review.id,
            created_at: TIMESTAMP.to_string(),
            modified_at: TIMESTAMP.to_string(),
            user: self.user_view_by_name(&review.author, viewer)?,
            content: review.content.clone(),
            image_urls: review.image_urls.clone(),
            rating: review.rating,
            restaurant: review.restaurant.clone(),
            views: review.views,
            is_deletable: viewer == Some(review.author.as_str()),
            is_hearted: viewer.is_some_and(|v| review.hearts.contains(v)),
            is_scraped: scrap.is_some(),
            scrap_description: scrap.cloned(),
            number_of_scraps: review.scraps.len(),
            number_of_hearts: review.hearts.len(),
            comments,
        })
    }

    fn reviews_where(&self, viewer: Option<&str>, keep: impl Fn(&ReviewRecord) -> bool) -> Vec<ReviewView> {
        self.reviews
            .values()
            .filter(|r| keep(r))
            .filter_map(|r| self.review_view(r, viewer))
            .collect()
    }

    fn users_named<'a>(&self, names: impl Iterator<Item = &'a String>, viewer: Option<&str>) -> Vec<UserView> {
        names.filter_map(|name| self.user_view_by_name(name, viewer)).collect()
    }

    pub fn profile_view(&self, username: &str, viewer: Option<&str>) -> Option<ProfileView> {
        let user = self.users.get(username)?;
        Some(ProfileView {
            user: self.user_view(user, viewer),
            number_of_followers: user.followers.len(),
            number_of_followings: user.followings.len(),
            followers: self.users_named(user.followers.iter(), viewer),
            followings: self.users_named(user.followings.iter(), viewer),
            reviews: self.reviews_where(viewer, |r| r.author == username),
        })
    }

    pub fn me_view(&self, username: &str) -> Option<MeView> {
        let user = self.users.get(username)?;
        let me = Some(username);
        let comments = self
            .comments
            .values()
            .filter(|c| c.author == username)
            .filter_map(|c| self.comment_view(c, me))
            .collect();
        let scraps = self
            .reviews
            .values()
            .filter_map(|r| {
                let description = r.scraps.get(username)?;
                Some(ScrapView {
                    created_at: TIMESTAMP.to_string(),
                    description: description.clone(),
                    review: self.review_view(r, me)?,
                })
            })
            .collect();
        Some(MeView {
            user: self.user_view(user, me),
            created_at: TIMESTAMP.to_string(),
            number_of_followers: user.followers.len(),
            number_of_followings: user.followings.len(),
            reviews: Listing::of(self.reviews_where(me, |r| r.author == username)),
            my_followers: Listing::of(self.users_named(user.followers.iter(), me)),
            my_followings: Listing::of(self.users_named(user.followings.iter(), me)),
            comments: Listing::of(comments),
            scraps: Listing::of(scraps),
            hearted_reviews: Listing::of(self.reviews_where(me, |r| r.hearts.contains(username))),
        })
    }

    /// Move every reference from `old` to `new`.
    pub fn rename_user(&mut self, old: &str, new: &str) -> bool {
        let Some(mut user) = self.users.remove(old) else {
            return false;
        };
        user.username = new.to_string();
        self.users.insert(new.to_string(), user);

        for other in self.users.values_mut() {
            for set in [&mut other.followers, &mut other.followings] {
                if set.remove(old) {
                    set.insert(new.to_string());
                }
            }
        }
        for review in self.reviews.values_mut() {
            if review.author == old {
                review.author = new.to_string();
            }
            if review.hearts.remove(old) {
                review.hearts.insert(new.to_string());
            }
            if let Some(description) = review.scraps.remove(old) {
                review.scraps.insert(new.to_string(), description);
            }
        }
        for comment in self.comments.values_mut() {
            if comment.author == old {
                comment.author = new.to_string();
            }
        }
        for owner in self.tokens.values_mut() {
            if *owner == old {
                *owner = new.to_string();
            }
        }
        true
    }

    /// Drop the user with everything they wrote and every session they hold.
    pub fn delete_user(&mut self, username: &str) {
        self.users.remove(username);
        self.tokens.retain(|_, owner| *owner != username);
        for other in self.users.values_mut() {
            other.followers.remove(username);
            other.followings.remove(username);
        }
        let removed: BTreeSet<i64> = self
            .reviews
            .values()
            .filter(|r| r.author == username)
            .map(|r| r.id)
            .collect();
        self.reviews.retain(|id, _| !removed.contains(id));
        self.comments
            .retain(|_, c| c.author != username && !removed.contains(&c.review_id));
        for review in self.reviews.values_mut() {
            review.hearts.remove(username);
            review.scraps.remove(username);
        }
    }
}
