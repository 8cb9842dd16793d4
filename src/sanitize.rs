//! Allow-list sanitization of rendered topic lists.
//!
//! Topic bodies are forum-cooked HTML and extension points can inject
//! arbitrary markup, so the final fragment is cleaned with ammonia. Inline
//! `style` attributes survive only with properties from the safe list;
//! `data-*` attributes are always dropped.

use std::borrow::Cow;
use std::collections::BTreeSet;
use std::sync::Arc;

/// CSS properties allowed in inline styles by default.
pub const DEFAULT_SAFE_STYLES: &[&str] = &[
    "background",
    "background-color",
    "border",
    "border-radius",
    "color",
    "font-style",
    "font-weight",
    "height",
    "margin",
    "padding",
    "text-align",
    "width",
];

#[derive(Debug, Clone)]
pub struct Sanitizer {
    safe_styles: BTreeSet<String>,
}

impl Default for Sanitizer {
    fn default() -> Self {
        Self::new(DEFAULT_SAFE_STYLES)
    }
}

impl Sanitizer {
    #[must_use]
    pub fn new(safe_styles: &[&str]) -> Self {
        Self {
            safe_styles: safe_styles.iter().map(|s| s.to_ascii_lowercase()).collect(),
        }
    }

    /// A sanitizer that additionally allows `extra` style properties.
    ///
    /// The extension lives only as long as the returned value, so one call
    /// can widen the list without affecting concurrent renders.
    #[must_use]
    pub fn with_styles(&self, extra: &[&str]) -> Self {
        let mut safe_styles = self.safe_styles.clone();
        safe_styles.extend(extra.iter().map(|s| s.to_ascii_lowercase()));
        Self { safe_styles }
    }

    #[must_use]
    pub fn allows_style(&self, property: &str) -> bool {
        self.safe_styles.contains(&property.trim().to_ascii_lowercase())
    }

    /// Clean `html`, keeping the default tag set plus `class`, `style` and
    /// `aria-hidden` attributes.
    #[must_use]
    pub fn clean(&self, html: &str) -> String {
        let allowed = Arc::new(self.safe_styles.clone());
        let mut builder = ammonia::Builder::default();
        builder
            .add_generic_attributes(&["class", "style", "aria-hidden"])
            .link_rel(None)
            .attribute_filter(move |_element, attribute, value| {
                if attribute == "style" {
                    filter_style(&allowed, value).map(Cow::Owned)
                } else {
                    Some(Cow::Borrowed(value))
                }
            });
        builder.clean(html).to_string()
    }
}

/// Keep only declarations whose property is in `allowed`.
fn filter_style(allowed: &BTreeSet<String>, value: &str) -> Option<String> {
    let kept: Vec<String> = value
        .split(';')
        .filter_map(|declaration| {
            let (property, val) = declaration.split_once(':')?;
            let property = property.trim().to_ascii_lowercase();
            let val = val.trim();
            (allowed.contains(&property) && !val.is_empty() && !val.contains("url("))
                .then(|| format!("{property}: {val};"))
        })
        .collect();
    if kept.is_empty() {
        None
    } else {
        Some(kept.join(" "))
    }
}
