//! Named extension points for rendered output.
//!
//! A filter receives the markup accumulated so far together with the domain
//! object and render options, and returns the markup to continue with. It
//! may append to it or replace it outright. An observer sees the same inputs
//! and returns nothing. Callbacks run in registration order.

use crate::args::{GroupArgs, TopicArgs};
use crate::forum::{Category, Group, Topic, TopicsResponse};

/// Filter around a single group card.
pub type GroupFilter = Box<dyn Fn(String, &Group, &GroupArgs) -> String + Send + Sync>;

/// Filter over the fully assembled groups fragment.
pub type GroupListFilter = Box<dyn Fn(String, &[Group], &GroupArgs) -> String + Send + Sync>;

/// Filter around a single topic list item. The `&str` is the resolved
/// original-poster avatar URL (empty when unknown).
pub type TopicFilter =
    Box<dyn Fn(String, &Topic, Option<&Category>, &str, &TopicArgs) -> String + Send + Sync>;

/// Filter over the avatar `<img>` of a topic item; also receives the avatar URL.
pub type AvatarFilter = Box<dyn Fn(String, &str) -> String + Send + Sync>;

/// Filter over the whole topic list fragment.
pub type TopicListFilter = Box<dyn Fn(String, &TopicsResponse, &TopicArgs) -> String + Send + Sync>;

/// Observer fired before a topic list is formatted.
pub type TopicListObserver = Box<dyn Fn(&TopicsResponse, &TopicArgs) + Send + Sync>;

/// Filter deciding whether the built-in topic list formatting runs.
pub type FormattingToggle = Box<dyn Fn(bool) -> bool + Send + Sync>;

/// Extension points fired while rendering group cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupPoint {
    /// Start of the card body, before the image and header.
    AboveHeader,
    /// End of the card body, immediately before the footer.
    AboveFooter,
    /// After the footer, immediately before the card closes.
    BelowFooter,
}

/// Extension points fired while rendering topic list items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicPoint {
    AboveHeader,
    AboveFooter,
    BelowFooter,
}

/// Registry of callbacks for every extension point.
#[derive(Default)]
pub struct Hooks {
    group_above_header: Vec<GroupFilter>,
    group_above_footer: Vec<GroupFilter>,
    group_below_footer: Vec<GroupFilter>,
    formatted_groups: Vec<GroupListFilter>,
    before_topiclist: Vec<TopicListObserver>,
    use_plugin_formatting: Vec<FormattingToggle>,
    topiclist_above_header: Vec<TopicFilter>,
    topiclist_above_footer: Vec<TopicFilter>,
    topiclist_below_footer: Vec<TopicFilter>,
    topiclist_avatar: Vec<AvatarFilter>,
    after_topiclist_formatting: Vec<TopicListFilter>,
}

impl std::fmt::Debug for Hooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hooks")
            .field("group_filters", &self.group_filter_count())
            .field("topic_filters", &self.topic_filter_count())
            .finish_non_exhaustive()
    }
}

impl Hooks {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // Registration

    pub fn on_group(
        &mut self,
        point: GroupPoint,
        filter: impl Fn(String, &Group, &GroupArgs) -> String + Send + Sync + 'static,
    ) -> &mut Self {
        let list = match point {
            GroupPoint::AboveHeader => &mut self.group_above_header,
            GroupPoint::AboveFooter => &mut self.group_above_footer,
            GroupPoint::BelowFooter => &mut self.group_below_footer,
        };
        list.push(Box::new(filter));
        self
    }

    pub fn on_formatted_groups(
        &mut self,
        filter: impl Fn(String, &[Group], &GroupArgs) -> String + Send + Sync + 'static,
    ) -> &mut Self {
        self.formatted_groups.push(Box::new(filter));
        self
    }

    pub fn on_before_topiclist(
        &mut self,
        observer: impl Fn(&TopicsResponse, &TopicArgs) + Send + Sync + 'static,
    ) -> &mut Self {
        self.before_topiclist.push(Box::new(observer));
        self
    }

    /// Return `false` from `toggle` to skip the built-in topic list markup and
    /// supply your own through [`Hooks::on_after_topiclist`].
    pub fn on_use_plugin_formatting(
        &mut self,
        toggle: impl Fn(bool) -> bool + Send + Sync + 'static,
    ) -> &mut Self {
        self.use_plugin_formatting.push(Box::new(toggle));
        self
    }

    pub fn on_topic(
        &mut self,
        point: TopicPoint,
        filter: impl Fn(String, &Topic, Option<&Category>, &str, &TopicArgs) -> String
            + Send
            + Sync
            + 'static,
    ) -> &mut Self {
        let list = match point {
            TopicPoint::AboveHeader => &mut self.topiclist_above_header,
            TopicPoint::AboveFooter => &mut self.topiclist_above_footer,
            TopicPoint::BelowFooter => &mut self.topiclist_below_footer,
        };
        list.push(Box::new(filter));
        self
    }

    pub fn on_topic_avatar(
        &mut self,
        filter: impl Fn(String, &str) -> String + Send + Sync + 'static,
    ) -> &mut Self {
        self.topiclist_avatar.push(Box::new(filter));
        self
    }

    pub fn on_after_topiclist(
        &mut self,
        filter: impl Fn(String, &TopicsResponse, &TopicArgs) -> String + Send + Sync + 'static,
    ) -> &mut Self {
        self.after_topiclist_formatting.push(Box::new(filter));
        self
    }

    // Dispatch

    #[must_use]
    pub fn apply_group(&self, point: GroupPoint, markup: String, group: &Group, args: &GroupArgs) -> String {
        let list = match point {
            GroupPoint::AboveHeader => &self.group_above_header,
            GroupPoint::AboveFooter => &self.group_above_footer,
            GroupPoint::BelowFooter => &self.group_below_footer,
        };
        list.iter().fold(markup, |acc, filter| filter(acc, group, args))
    }

    #[must_use]
    pub fn apply_formatted_groups(&self, markup: String, groups: &[Group], args: &GroupArgs) -> String {
        self.formatted_groups
            .iter()
            .fold(markup, |acc, filter| filter(acc, groups, args))
    }

    pub fn notify_before_topiclist(&self, response: &TopicsResponse, args: &TopicArgs) {
        for observer in &self.before_topiclist {
            observer(response, args);
        }
    }

    #[must_use]
    pub fn use_plugin_formatting(&self) -> bool {
        self.use_plugin_formatting
            .iter()
            .fold(true, |acc, toggle| toggle(acc))
    }

    #[must_use]
    pub fn apply_topic(
        &self,
        point: TopicPoint,
        markup: String,
        topic: &Topic,
        category: Option<&Category>,
        avatar_url: &str,
        args: &TopicArgs,
    ) -> String {
        let list = match point {
            TopicPoint::AboveHeader => &self.topiclist_above_header,
            TopicPoint::AboveFooter => &self.topiclist_above_footer,
            TopicPoint::BelowFooter => &self.topiclist_below_footer,
        };
        list.iter()
            .fold(markup, |acc, filter| filter(acc, topic, category, avatar_url, args))
    }

    #[must_use]
    pub fn apply_topic_avatar(&self, markup: String, avatar_url: &str) -> String {
        self.topiclist_avatar
            .iter()
            .fold(markup, |acc, filter| filter(acc, avatar_url))
    }

    #[must_use]
    pub fn apply_after_topiclist(&self, markup: String, response: &TopicsResponse, args: &TopicArgs) -> String {
        self.after_topiclist_formatting
            .iter()
            .fold(markup, |acc, filter| filter(acc, response, args))
    }

    fn group_filter_count(&self) -> usize {
        self.group_above_header.len()
            + self.group_above_footer.len()
            + self.group_below_footer.len()
            + self.formatted_groups.len()
    }

    fn topic_filter_count(&self) -> usize {
        self.before_topiclist.len()
            + self.use_plugin_formatting.len()
            + self.topiclist_above_header.len()
            + self.topiclist_above_footer.len()
            + self.topiclist_below_footer.len()
            + self.topiclist_avatar.len()
            + self.after_topiclist_formatting.len()
    }
}
