//! Maud HTML components for embed fragments.
//!
//! - `buffer`: staged builder for markup that extension points rewrite
//! - `link`: links into the forum, optionally through single sign-on
//! - `badge`: category badge for topic list items

pub mod badge;
pub mod buffer;
pub mod link;

pub use badge::CategoryBadge;
pub use buffer::{escape, HtmlBuffer};
pub use link::ForumLink;

/// Re-export maud for convenience
pub use maud::{html, Markup, PreEscaped, Render};
