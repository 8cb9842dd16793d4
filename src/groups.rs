//! Group cards: fetch non-automatic groups, filter, render, cache.

use std::sync::Arc;

use maud::html;
use tracing::{debug, info, warn};

use crate::args::GroupArgs;
use crate::cache::{CacheKey, GroupSnapshotStore, ResourceCache, ResourceKind};
use crate::components::{ForumLink, HtmlBuffer};
use crate::error::{EmbedError, Result};
use crate::forum::{ForumClient, Group};
use crate::formatter::{extract_excerpt, pluralize_count};
use crate::hooks::{GroupPoint, Hooks};

pub struct GroupsPipeline {
    client: ForumClient,
    snapshot: Arc<dyn GroupSnapshotStore>,
    hooks: Arc<Hooks>,
    /// Filtered group lists per embed.
    raw: ResourceCache<Vec<Group>>,
    /// Assembled HTML per embed, before the final filter.
    rendered: ResourceCache<String>,
}

impl GroupsPipeline {
    #[must_use]
    pub fn new(
        client: ForumClient,
        snapshot: Arc<dyn GroupSnapshotStore>,
        hooks: Arc<Hooks>,
        ttl: std::time::Duration,
    ) -> Self {
        Self {
            client,
            snapshot,
            hooks,
            raw: ResourceCache::new(ttl),
            rendered: ResourceCache::new(ttl),
        }
    }

    /// Render the groups embed, degrading every failure to an empty string.
    pub async fn render_groups(&self, args: &GroupArgs) -> String {
        match self.get_groups(args).await {
            Ok(groups) => self.format_groups(&groups, args),
            Err(EmbedError::EmptyResult(what)) => {
                debug!(id = ?args.id, "No {what} to render");
                String::new()
            }
            Err(e) => {
                warn!(id = ?args.id, "Failed to render groups: {e}");
                String::new()
            }
        }
    }

    /// The groups selected by `args`, from cache when fresh.
    ///
    /// # Errors
    ///
    /// Returns [`EmbedError::EmptyResult`] when no group survives the
    /// allow-list, or the client's error when groups cannot be fetched.
    pub async fn get_groups(&self, args: &GroupArgs) -> Result<Vec<Group>> {
        let key = CacheKey::new(ResourceKind::Groups, args.id.as_deref());
        if let Some(groups) = self.raw.get(&key) {
            debug!(key = %key, count = groups.len(), "Using cached groups");
            return Ok(groups);
        }

        let all = self.non_automatic_groups().await?;
        let selected = args.selected_groups();
        let groups: Vec<Group> = if selected.is_empty() {
            all
        } else {
            all.into_iter()
                .filter(|group| selected.contains(&group.name.as_str()))
                .collect()
        };

        if groups.is_empty() {
            return Err(EmbedError::EmptyResult("groups"));
        }

        debug!(key = %key, count = groups.len(), "Caching groups");
        self.raw.set(key, groups.clone());
        Ok(groups)
    }

    /// Assemble the groups fragment.
    ///
    /// The assembled HTML is cached per embed id; the `formatted_groups`
    /// filter runs on every call, after the cache.
    #[must_use]
    pub fn format_groups(&self, groups: &[Group], args: &GroupArgs) -> String {
        if groups.is_empty() {
            return String::new();
        }

        let key = CacheKey::new(ResourceKind::Groups, args.id.as_deref());
        let html = if let Some(html) = self.rendered.get(&key) {
            html
        } else {
            let html = self.build_groups_html(groups, args);
            self.rendered.set(key, html.clone());
            html
        };

        self.hooks.apply_formatted_groups(html, groups, args)
    }

    /// Assemble the groups fragment without touching the cache.
    #[must_use]
    pub fn build_groups_html(&self, groups: &[Group], args: &GroupArgs) -> String {
        let base_url = self.client.base_url().unwrap_or_default();
        let tile_class = if args.tile { "wpds-tile" } else { "wpds-no-tile" };

        let mut out = HtmlBuffer::new();
        out.open("div", "wpds-groups wpds-tile-wrapper")
            .open("div", tile_class);
        for group in groups {
            self.render_card(&mut out, group, args, base_url);
        }
        out.close("div").close("div");
        out.into_string()
    }

    fn render_card(&self, out: &mut HtmlBuffer, group: &Group, args: &GroupArgs, base_url: &str) {
        let name = group.display_name();
        let path = group.path();
        let join_enabled = group.allow_membership_requests && args.show_join_link;

        let title_link = ForumLink::new(base_url, name.clone(), path.clone())
            .with_classes("wpds-group-title-link")
            .with_sso(args.sso);
        let join_classes = if args.add_button_styles {
            "wpds-join-group wpds-button"
        } else {
            "wpds-join-group"
        };
        let join_link = ForumLink::new(base_url, join_text(args, &name), path)
            .with_classes(join_classes)
            .with_sso(args.sso);

        let excerpt = group
            .bio_raw
            .as_deref()
            .map(|bio| extract_excerpt(bio, args.excerpt_length))
            .unwrap_or_default();
        let image = excerpt.image().filter(|_| args.show_images);
        let flair = group
            .flair_url
            .as_deref()
            .filter(|url| args.show_images && !url.is_empty());
        let members = group.user_count.filter(|count| *count > 0);
        let show_metadata = args.show_header_metadata && (flair.is_some() || members.is_some());

        out.open("div", "wpds-group").open("div", "wpds-group-clamp");
        out.filter(|markup| self.hooks.apply_group(GroupPoint::AboveHeader, markup, group, args));

        if let Some(src) = image {
            out.push(&html! {
                div class="wpds-group-image" { img src=(src); }
            });
        }

        out.push(&html! {
            header {
                h4 class="wpds-groupname" { (title_link) }
                @if show_metadata {
                    div class="wpds-metadata" {
                        @if let Some(flair_url) = flair {
                            img class="wpds-group-avatar" src=(flair_url);
                        }
                        @if let Some(count) = members {
                            span class="wpds-member-number" { (pluralize_count(count)) }
                        }
                    }
                }
            }
        });

        if args.show_description && !excerpt.description.is_empty() {
            out.push(&html! {
                div class="wpds-group-description" { (excerpt.description) }
            });
        }

        out.filter(|markup| self.hooks.apply_group(GroupPoint::AboveFooter, markup, group, args));
        out.close("div");

        out.push(&html! {
            footer {
                @if join_enabled {
                    div class="wpds-footer-link" { (join_link) }
                }
            }
        });

        out.filter(|markup| self.hooks.apply_group(GroupPoint::BelowFooter, markup, group, args));
        out.close("div");
    }

    /// Drop the group snapshot and every cached list and fragment.
    ///
    /// The next render fetches groups from the forum again.
    pub async fn clear_cache(&self) {
        self.snapshot.clear().await;
        self.raw.clear();
        self.rendered.clear();
        info!("Cleared group caches and snapshot");
    }

    async fn non_automatic_groups(&self) -> Result<Vec<Group>> {
        if let Some(groups) = self.snapshot.load().await.filter(|groups| !groups.is_empty()) {
            debug!(count = groups.len(), "Using group snapshot");
            return Ok(groups);
        }

        let groups = self.client.fetch_groups().await?;
        if !groups.is_empty() {
            self.snapshot.save(&groups).await;
        }
        Ok(groups)
    }
}

/// Visible join-link text, e.g. `Join the dev team`.
fn join_text(args: &GroupArgs, name: &str) -> String {
    [args.link_open_text.trim(), name, args.link_close_text.trim()]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
