//! Links into the forum.
//!
//! A link is described by its visible text, a forum-relative path, CSS
//! classes and whether it should route through single sign-on. With SSO
//! the forum's SSO endpoint is asked to return to the path after login.

use maud::{html, Markup, Render};

/// A link descriptor resolved against the forum URL when rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForumLink<'a> {
    pub base_url: &'a str,
    pub text: String,
    pub path: String,
    pub classes: &'a str,
    pub sso: bool,
}

impl<'a> ForumLink<'a> {
    #[must_use]
    pub fn new(base_url: &'a str, text: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            base_url,
            text: text.into(),
            path: path.into(),
            classes: "",
            sso: false,
        }
    }

    #[must_use]
    pub const fn with_classes(mut self, classes: &'a str) -> Self {
        self.classes = classes;
        self
    }

    #[must_use]
    pub const fn with_sso(mut self, sso: bool) -> Self {
        self.sso = sso;
        self
    }

    /// Absolute URL the link points at.
    #[must_use]
    pub fn href(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        if self.sso {
            format!(
                "{base}/session/sso?return_path={}",
                urlencoding::encode(&self.path)
            )
        } else {
            format!("{base}{}", self.path)
        }
    }
}

impl Render for ForumLink<'_> {
    fn render(&self) -> Markup {
        html! {
            a class=[(!self.classes.is_empty()).then_some(self.classes)] href=(self.href()) {
                (self.text)
            }
        }
    }
}
