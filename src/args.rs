//! Per-call render options.
//!
//! The host parses its placeholder syntax into an attribute map; these types
//! turn that map into defaulted, typed options once per call. Unknown keys
//! are ignored and unparsable values fall back to their defaults.

use std::collections::HashMap;
use std::fmt;

use tracing::warn;

use crate::config::parse_bool;

/// Where an optional piece of topic metadata is placed in a list item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Top,
    Bottom,
    Hidden,
}

impl Position {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "top" => Some(Self::Top),
            "bottom" => Some(Self::Bottom),
            "none" | "hidden" | "false" => Some(Self::Hidden),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Bottom => "bottom",
            Self::Hidden => "none",
        }
    }
}

/// Which listing a topic list is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicSource {
    Latest,
    Top,
}

impl TopicSource {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "latest" => Some(Self::Latest),
            "top" => Some(Self::Top),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Latest => "latest",
            Self::Top => "top",
        }
    }
}

/// Time window for the `top` listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    All,
    Yearly,
    Quarterly,
    Monthly,
    Weekly,
    Daily,
}

impl Period {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "all" => Some(Self::All),
            "yearly" => Some(Self::Yearly),
            "quarterly" => Some(Self::Quarterly),
            "monthly" => Some(Self::Monthly),
            "weekly" => Some(Self::Weekly),
            "daily" => Some(Self::Daily),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Yearly => "yearly",
            Self::Quarterly => "quarterly",
            Self::Monthly => "monthly",
            Self::Weekly => "weekly",
            Self::Daily => "daily",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options for one groups embed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupArgs {
    /// Comma-separated allow-list of group names; empty keeps every group.
    pub group_list: String,
    pub link_open_text: String,
    pub link_close_text: String,
    pub sso: bool,
    pub tile: bool,
    pub show_description: bool,
    pub show_images: bool,
    /// Maximum description length in characters.
    pub excerpt_length: usize,
    pub show_header_metadata: bool,
    pub show_join_link: bool,
    pub add_button_styles: bool,
    /// Distinguishes independent embeds so their caches don't collide.
    pub id: Option<String>,
}

impl Default for GroupArgs {
    fn default() -> Self {
        Self {
            group_list: String::new(),
            link_open_text: "Join the".to_string(),
            link_close_text: String::new(),
            sso: false,
            tile: false,
            show_description: true,
            show_images: true,
            excerpt_length: 55,
            show_header_metadata: true,
            show_join_link: true,
            add_button_styles: true,
            id: None,
        }
    }
}

impl GroupArgs {
    #[must_use]
    pub fn from_attributes(attrs: &HashMap<String, String>) -> Self {
        let mut args = Self::default();
        let reader = AttrReader(attrs);
        if let Some(list) = attrs.get("group_list") {
            args.group_list = list.clone();
        }
        if let Some(text) = attrs.get("link_open_text") {
            args.link_open_text = text.clone();
        }
        if let Some(text) = attrs.get("link_close_text") {
            args.link_close_text = text.clone();
        }
        reader.flag("sso", &mut args.sso);
        reader.flag("tile", &mut args.tile);
        reader.flag("show_description", &mut args.show_description);
        reader.flag("show_images", &mut args.show_images);
        reader.number("excerpt_length", &mut args.excerpt_length);
        reader.flag("show_header_metadata", &mut args.show_header_metadata);
        reader.flag("show_join_link", &mut args.show_join_link);
        reader.flag("add_button_styles", &mut args.add_button_styles);
        args.id = reader.id();
        args
    }

    /// Trimmed, non-empty names from `group_list`.
    #[must_use]
    pub fn selected_groups(&self) -> Vec<&str> {
        self.group_list
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .collect()
    }
}

/// Options for one topic list embed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicArgs {
    pub source: TopicSource,
    pub period: Period,
    /// Category slug; when set the listing is that category's latest topics.
    pub category: Option<String>,
    pub max_topics: usize,
    pub tile: bool,
    pub enable_live_refresh: bool,
    pub username_position: Position,
    pub date_position: Position,
    pub category_position: Position,
    pub display_avatars: bool,
    pub id: Option<String>,
}

impl Default for TopicArgs {
    fn default() -> Self {
        Self {
            source: TopicSource::Latest,
            period: Period::Daily,
            category: None,
            max_topics: 6,
            tile: false,
            enable_live_refresh: false,
            username_position: Position::Top,
            date_position: Position::Top,
            category_position: Position::Bottom,
            display_avatars: true,
            id: None,
        }
    }
}

impl TopicArgs {
    #[must_use]
    pub fn from_attributes(attrs: &HashMap<String, String>) -> Self {
        let mut args = Self::default();
        let reader = AttrReader(attrs);
        reader.parsed("source", TopicSource::parse, &mut args.source);
        reader.parsed("period", Period::parse, &mut args.period);
        args.category = attrs
            .get("category")
            .map(|slug| slug.trim().to_string())
            .filter(|slug| !slug.is_empty());
        reader.number("max_topics", &mut args.max_topics);
        reader.flag("tile", &mut args.tile);
        reader.flag("enable_ajax", &mut args.enable_live_refresh);
        reader.flag("enable_live_refresh", &mut args.enable_live_refresh);
        reader.parsed("username_position", Position::parse, &mut args.username_position);
        reader.parsed("date_position", Position::parse, &mut args.date_position);
        reader.parsed("category_position", Position::parse, &mut args.category_position);
        reader.flag("display_avatars", &mut args.display_avatars);
        args.id = reader.id();
        args
    }

    /// Forum path of the listing these options select.
    #[must_use]
    pub fn listing_path(&self) -> String {
        match (&self.category, self.source) {
            (Some(slug), _) => format!("/c/{}.json", urlencoding::encode(slug)),
            (None, TopicSource::Latest) => "/latest.json".to_string(),
            (None, TopicSource::Top) => format!("/top/{}.json", self.period),
        }
    }
}

struct AttrReader<'a>(&'a HashMap<String, String>);

impl AttrReader<'_> {
    fn flag(&self, key: &str, target: &mut bool) {
        self.parsed(key, parse_bool, target);
    }

    fn number(&self, key: &str, target: &mut usize) {
        self.parsed(key, |value| value.trim().parse().ok(), target);
    }

    fn parsed<T>(&self, key: &str, parse: impl Fn(&str) -> Option<T>, target: &mut T) {
        if let Some(raw) = self.0.get(key) {
            match parse(raw) {
                Some(value) => *target = value,
                None => warn!(key, value = %raw, "Ignoring invalid embed attribute"),
            }
        }
    }

    fn id(&self) -> Option<String> {
        self.0
            .get("id")
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
    }
}
