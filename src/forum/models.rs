use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{ORIGINAL_POSTER_MARKER, REGULAR_ARCHETYPE, UNKNOWN_USER_ID};

/// A forum group as returned by `/groups.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub name: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub user_count: Option<i64>,
    #[serde(default)]
    pub flair_url: Option<String>,
    #[serde(default)]
    pub allow_membership_requests: bool,
    #[serde(default)]
    pub bio_raw: Option<String>,
    #[serde(default)]
    pub automatic: bool,
}

impl Group {
    /// Name shown on the card.
    ///
    /// Falls back to the slug-like `name` with separators turned into spaces
    /// when the group has no full name.
    #[must_use]
    pub fn display_name(&self) -> String {
        match self.full_name.as_deref().map(str::trim) {
            Some(full) if !full.is_empty() => full.to_string(),
            _ => self.name.replace(['_', '-'], " "),
        }
    }

    /// Forum-relative path of the group page.
    #[must_use]
    pub fn path(&self) -> String {
        format!("/groups/{}", self.name)
    }
}

/// Envelope of the `/groups.json` response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GroupsResponse {
    #[serde(default)]
    pub groups: Vec<Group>,
}

/// One entry of a topic's `posters` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Poster {
    pub user_id: i64,
    #[serde(default)]
    pub description: String,
}

/// A topic from a listing such as `/latest.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub pinned_globally: bool,
    #[serde(default = "default_archetype")]
    pub archetype: String,
    #[serde(default)]
    pub like_count: i64,
    #[serde(default)]
    pub posts_count: i64,
    #[serde(default)]
    pub posters: Vec<Poster>,
    #[serde(default)]
    pub cooked: Option<String>,
    #[serde(default)]
    pub category_id: Option<i64>,
}

fn default_archetype() -> String {
    REGULAR_ARCHETYPE.to_string()
}

impl Topic {
    /// Whether the topic belongs in a rendered list.
    ///
    /// Only the first poster is checked for the unknown-user sentinel, which
    /// is not necessarily the original poster.
    #[must_use]
    pub fn is_display_eligible(&self) -> bool {
        !self.pinned_globally
            && self.archetype == REGULAR_ARCHETYPE
            && self
                .posters
                .first()
                .map_or(true, |poster| poster.user_id != UNKNOWN_USER_ID)
    }

    /// User id of the poster marked as the original poster, if any.
    #[must_use]
    pub fn original_poster_id(&self) -> Option<i64> {
        self.posters
            .iter()
            .filter(|poster| poster.description.contains(ORIGINAL_POSTER_MARKER))
            .map(|poster| poster.user_id)
            .last()
    }

    /// Forum-relative path of the topic.
    #[must_use]
    pub fn path(&self) -> String {
        format!("/t/{}/{}", self.slug, self.id)
    }

    /// Number of replies, not counting the opening post.
    #[must_use]
    pub fn reply_count(&self) -> i64 {
        (self.posts_count - 1).max(0)
    }
}

/// A user entry from a topic listing's `users` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub avatar_template: String,
}

impl User {
    /// Avatar URL at the given pixel size.
    ///
    /// Relative templates are resolved against `base_url`.
    #[must_use]
    pub fn avatar_url(&self, base_url: &str, size: u32) -> String {
        let path = self.avatar_template.replace("{size}", &size.to_string());
        if path.starts_with('/') && !path.starts_with("//") {
            format!("{}{path}", base_url.trim_end_matches('/'))
        } else {
            path
        }
    }
}

/// A category embedded in a topic listing response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub text_color: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicList {
    #[serde(default)]
    pub topics: Vec<Topic>,
}

/// A topic listing response (`/latest.json`, `/top/{period}.json`, `/c/{slug}.json`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicsResponse {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub topic_list: Option<TopicList>,
    #[serde(default)]
    pub categories: Vec<Category>,
}

impl TopicsResponse {
    #[must_use]
    pub fn user(&self, id: i64) -> Option<&User> {
        self.users.iter().find(|user| user.id == id)
    }

    /// The user credited with starting `topic`.
    #[must_use]
    pub fn original_poster(&self, topic: &Topic) -> Option<&User> {
        topic.original_poster_id().and_then(|id| self.user(id))
    }

    #[must_use]
    pub fn category(&self, topic: &Topic) -> Option<&Category> {
        let id = topic.category_id?;
        self.categories.iter().find(|category| category.id == id)
    }
}
