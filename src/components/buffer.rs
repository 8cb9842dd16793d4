//! Incremental HTML builder for fragments that extension points can rewrite.
//!
//! Group cards and topic items are assembled in stages, and hooks receive
//! the markup accumulated so far. maud's `html!` needs balanced elements,
//! so open and close tags are written here while balanced pieces go through
//! `push`. Every dynamic value is escaped through maud.

use maud::{html, Render};

/// Escape text for use in HTML content or a double-quoted attribute.
#[must_use]
pub fn escape(text: &str) -> String {
    html! { (text) }.into_string()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HtmlBuffer {
    html: String,
}

impl HtmlBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Write `<tag class="...">`. An empty class list writes a bare tag.
    pub fn open(&mut self, tag: &'static str, class: &str) -> &mut Self {
        self.html.push('<');
        self.html.push_str(tag);
        if !class.is_empty() {
            self.html.push_str(" class=\"");
            self.html.push_str(&escape(class));
            self.html.push('"');
        }
        self.html.push('>');
        self
    }

    pub fn close(&mut self, tag: &'static str) -> &mut Self {
        self.html.push_str("</");
        self.html.push_str(tag);
        self.html.push('>');
        self
    }

    /// Append a balanced piece of markup.
    pub fn push(&mut self, markup: &impl Render) -> &mut Self {
        markup.render_to(&mut self.html);
        self
    }

    /// Hand the accumulated markup to `filter` and continue with its result.
    pub fn filter(&mut self, filter: impl FnOnce(String) -> String) -> &mut Self {
        let current = std::mem::take(&mut self.html);
        self.html = filter(current);
        self
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.html
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.html
    }
}
