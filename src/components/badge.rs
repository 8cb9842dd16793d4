//! Category badge for topic list items.

use maud::{html, Markup, Render};

use crate::forum::Category;

/// Swatch colour used when a category has no usable colour.
const FALLBACK_COLOR: &str = "e9e9e9";

/// A coloured swatch followed by the category name.
#[derive(Debug, Clone)]
pub struct CategoryBadge<'a> {
    pub category: &'a Category,
}

impl<'a> CategoryBadge<'a> {
    #[must_use]
    pub const fn new(category: &'a Category) -> Self {
        Self { category }
    }

    /// The category colour as a CSS hex value.
    ///
    /// The forum sends bare hex digits; anything else falls back to a
    /// neutral grey so no arbitrary text reaches the style attribute.
    #[must_use]
    pub fn swatch_color(&self) -> String {
        let color = self.category.color.trim().trim_start_matches('#');
        let valid = matches!(color.len(), 3 | 6) && color.chars().all(|c| c.is_ascii_hexdigit());
        format!("#{}", if valid { color } else { FALLBACK_COLOR })
    }
}

impl Render for CategoryBadge<'_> {
    fn render(&self) -> Markup {
        let style = format!(
            "background-color: {}; display: inline-block;",
            self.swatch_color()
        );
        html! {
            span class=(format!("wpds-category-badge wpds-category-{}", self.category.slug)) {
                span class="wpds-category-icon" style=(style) {}
                span class="wpds-category-name" { (self.category.name) }
            }
        }
    }
}
