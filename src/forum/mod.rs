//! Discourse JSON API access.
//!
//! `ForumClient` issues authenticated GET requests; `models` holds the
//! response shapes for groups and topic listings.

pub mod client;
pub mod models;

pub use client::ForumClient;
pub use models::{Category, Group, Poster, Topic, TopicList, TopicsResponse, User};
