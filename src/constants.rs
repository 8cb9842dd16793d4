//! Shared constants used across the crate.

/// User agent sent with every forum request.
pub const USER_AGENT: &str = concat!("discourse-embeds/", env!("CARGO_PKG_VERSION"));

/// Default lifetime of raw and rendered cache entries (24 hours).
pub const DEFAULT_CACHE_TTL_SECS: u64 = 24 * 60 * 60;

/// Default strftime format for topic creation dates.
pub const DEFAULT_DATE_FORMAT: &str = "%Y/%m/%d";

/// Poster description marker identifying the user who started a topic.
pub const ORIGINAL_POSTER_MARKER: &str = "Original Poster";

/// Poster `user_id` the forum uses for deleted or unknown users.
pub const UNKNOWN_USER_ID: i64 = -1;

/// Pixel size substituted into avatar templates for topic lists.
pub const TOPIC_AVATAR_SIZE: u32 = 44;

/// Only topics with this archetype are listed (private messages are excluded).
pub const REGULAR_ARCHETYPE: &str = "regular";
