//! Discourse embeds library.
//!
//! Fetches groups and topic listings from a Discourse forum, caches them,
//! and renders them as embeddable HTML fragments with hook-based extension
//! points.

#![allow(clippy::needless_raw_string_hashes)]

pub mod args;
pub mod cache;
pub mod components;
pub mod config;
pub mod constants;
pub mod error;
pub mod formatter;
pub mod forum;
pub mod groups;
pub mod hooks;
pub mod renderer;
pub mod sanitize;
pub mod topics;

pub use args::{GroupArgs, TopicArgs};
pub use config::Config;
pub use error::{EmbedError, Result};
pub use hooks::Hooks;
pub use renderer::Renderer;
