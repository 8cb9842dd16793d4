//! Entry point for hosts embedding forum content.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use crate::args::{GroupArgs, TopicArgs};
use crate::cache::{GroupSnapshotStore, JsonFileSnapshot, MemorySnapshot};
use crate::config::Config;
use crate::error::Result;
use crate::forum::{ForumClient, TopicsResponse};
use crate::groups::GroupsPipeline;
use crate::hooks::Hooks;
use crate::sanitize::Sanitizer;
use crate::topics::TopicsPipeline;

/// Renders groups and topic lists for a single forum.
///
/// Hooks are fixed at construction; register every extension point on
/// [`Hooks`] before building the renderer.
pub struct Renderer {
    groups: GroupsPipeline,
    topics: TopicsPipeline,
}

impl Renderer {
    /// Build a renderer from `config`.
    ///
    /// The group snapshot is persisted to `config.group_snapshot_path` when
    /// set and kept in memory otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &Config, hooks: Hooks) -> Result<Self> {
        let snapshot: Arc<dyn GroupSnapshotStore> = match &config.group_snapshot_path {
            Some(path) => Arc::new(JsonFileSnapshot::new(path)),
            None => Arc::new(MemorySnapshot::new()),
        };
        Self::with_snapshot(config, hooks, snapshot)
    }

    /// Build a renderer that keeps its group snapshot in `snapshot`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_snapshot(
        config: &Config,
        hooks: Hooks,
        snapshot: Arc<dyn GroupSnapshotStore>,
    ) -> Result<Self> {
        let client = ForumClient::new(config)?;
        let hooks = Arc::new(hooks);

        info!(
            forum = config.base_url.as_deref().unwrap_or("<unset>"),
            ttl_secs = config.cache_ttl.as_secs(),
            diagnostic_mode = config.diagnostic_mode,
            "Renderer ready"
        );

        Ok(Self {
            groups: GroupsPipeline::new(client.clone(), snapshot, Arc::clone(&hooks), config.cache_ttl),
            topics: TopicsPipeline::new(client, hooks, Sanitizer::default(), config),
        })
    }

    /// Render the groups embed. Failures render as an empty string.
    pub async fn render_groups(&self, args: &GroupArgs) -> String {
        self.groups.render_groups(args).await
    }

    /// Render the topic list embed. Failures render as an empty string.
    pub async fn render_topics(&self, args: &TopicArgs) -> String {
        self.topics.render_topics(args).await
    }

    /// Render a groups embed from raw placeholder attributes.
    pub async fn render_groups_placeholder(&self, attrs: &HashMap<String, String>) -> String {
        self.render_groups(&GroupArgs::from_attributes(attrs)).await
    }

    /// Render a topic list embed from raw placeholder attributes.
    pub async fn render_topics_placeholder(&self, attrs: &HashMap<String, String>) -> String {
        self.render_topics(&TopicArgs::from_attributes(attrs)).await
    }

    /// Render an already fetched topic listing, bypassing both caches.
    #[must_use]
    pub fn render_topic_response(&self, response: &TopicsResponse, args: &TopicArgs) -> String {
        self.topics.format_topics(response, args)
    }

    #[must_use]
    pub const fn groups(&self) -> &GroupsPipeline {
        &self.groups
    }

    #[must_use]
    pub const fn topics(&self) -> &TopicsPipeline {
        &self.topics
    }

    /// Drop the group snapshot and every cached response and fragment.
    pub async fn clear_cache(&self) {
        self.groups.clear_cache().await;
        self.topics.clear_cache();
    }
}
