//! Formatting helpers shared by the groups and topics pipelines.

use std::fmt::Write as _;

use chrono::{DateTime, FixedOffset, Offset, Utc};
use maud::{Markup, Render};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Node, Selector};

use crate::components::{escape, CategoryBadge};
use crate::constants::DEFAULT_DATE_FORMAT;
use crate::forum::{Category, Topic};

/// Description text and image URLs pulled out of a rich-text biography.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Excerpt {
    pub description: String,
    /// Image URLs in document order.
    pub images: Vec<String>,
}

impl Excerpt {
    /// The lead image, if any.
    #[must_use]
    pub fn image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }
}

static MARKDOWN_IMAGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"!\[[^\]]*\]\(\s*<?([^\s)>]+)>?(?:\s+"[^"]*")?\s*\)"#).expect("Invalid image regex")
});

static MARKDOWN_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([^\]]*)\]\([^)]*\)").expect("Invalid link regex"));

/// Single `*em*`, `_em_` and `~~strike~~` spans opening at a word boundary.
static MARKDOWN_EMPHASIS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(^|[^\w])(?:\*([^*\s](?:[^*]*[^*\s])?)\*|_([^_\s](?:[^_]*[^_\s])?)_|~~([^~\s](?:[^~]*[^~\s])?)~~)",
    )
    .expect("Invalid emphasis regex")
});

static MARKDOWN_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s{0,3}#{1,6}\s+").expect("Invalid heading regex"));

static IMG_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("img[src]").expect("Invalid selector"));

/// Extract a plain-text excerpt and image URLs from markdown or HTML.
///
/// Markdown images become image URLs, markdown links keep only their text,
/// and the visible text has its whitespace collapsed. When the text is
/// longer than `max_length` characters it is cut at a word boundary and
/// `...` is appended.
#[must_use]
pub fn extract_excerpt(rich_text: &str, max_length: usize) -> Excerpt {
    // Markdown images are turned into <img> tags so both forms share one
    // document order once parsed.
    let html = MARKDOWN_IMAGE.replace_all(rich_text, |caps: &regex::Captures<'_>| {
        format!("<img src=\"{}\">", escape(&caps[1]))
    });
    let html = MARKDOWN_LINK.replace_all(&html, "$1");
    let html = MARKDOWN_HEADING.replace_all(&html, "");
    let html = html.replace("**", "").replace("__", "").replace('`', "");
    let html = MARKDOWN_EMPHASIS.replace_all(&html, |caps: &regex::Captures<'_>| {
        let inner = caps
            .get(2)
            .or_else(|| caps.get(3))
            .or_else(|| caps.get(4))
            .map_or("", |m| m.as_str());
        format!("{}{inner}", &caps[1])
    });

    let document = Html::parse_fragment(&html);

    let images = document
        .select(&IMG_SELECTOR)
        .filter_map(|img| img.value().attr("src"))
        .map(str::trim)
        .filter(|src| !src.is_empty())
        .map(ToString::to_string)
        .collect();

    let mut text = String::new();
    for node in document.root_element().descendants() {
        if let Node::Text(fragment) = node.value() {
            let hidden = node.ancestors().any(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .is_some_and(|el| matches!(el.name(), "script" | "style"))
            });
            if !hidden {
                text.push_str(fragment);
                text.push(' ');
            }
        }
    }
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");

    Excerpt {
        description: truncate_words(&text, max_length),
        images,
    }
}

/// Cut `text` to at most `max_len` characters at a word boundary, appending
/// `...` when anything was removed.
#[must_use]
pub fn truncate_words(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        return text.to_string();
    }
    if max_len == 0 {
        return String::new();
    }

    let cut = text
        .char_indices()
        .nth(max_len)
        .map_or(text.len(), |(idx, _)| idx);
    let head = &text[..cut];
    let next_is_space = text[cut..].starts_with(char::is_whitespace);

    let kept = if next_is_space {
        head
    } else {
        // Back off to the last complete word; a single overlong word is hard-cut
        head.rfind(char::is_whitespace).map_or(head, |idx| &head[..idx])
    };

    let mut truncated = kept.trim_end().to_string();
    truncated.push_str("...");
    truncated
}

/// Member count label: `1 member`, otherwise `n members`.
#[must_use]
pub fn pluralize_count(n: i64) -> String {
    if n == 1 {
        "1 member".to_string()
    } else {
        format!("{n} members")
    }
}

/// Badge for the topic's category, if the category is in `categories`.
#[must_use]
pub fn resolve_category_badge(topic: &Topic, categories: &[Category]) -> Option<Markup> {
    let id = topic.category_id?;
    categories
        .iter()
        .find(|category| category.id == id)
        .map(|category| CategoryBadge::new(category).render())
}

/// Format a UTC timestamp in the given offset using a strftime format.
///
/// An invalid format string falls back to the default `%Y/%m/%d`.
#[must_use]
pub fn format_date(timestamp: DateTime<Utc>, utc_offset_minutes: i32, format: &str) -> String {
    let offset = utc_offset_minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .unwrap_or_else(|| Utc.fix());
    let local = timestamp.with_timezone(&offset);

    let mut out = String::new();
    if write!(out, "{}", local.format(format)).is_ok() {
        return out;
    }
    out.clear();
    let _ = write!(out, "{}", local.format(DEFAULT_DATE_FORMAT));
    out
}
