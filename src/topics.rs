//! Topic lists: filter a listing, resolve original posters, render items.

use std::sync::Arc;

use maud::{html, Markup, PreEscaped};
use tracing::{debug, warn};

use crate::args::{Period, Position, TopicArgs, TopicSource};
use crate::cache::{CacheKey, ResourceCache, ResourceKind};
use crate::components::HtmlBuffer;
use crate::config::Config;
use crate::constants::TOPIC_AVATAR_SIZE;
use crate::error::{EmbedError, Result};
use crate::forum::{ForumClient, Topic, TopicsResponse};
use crate::formatter::{format_date, resolve_category_badge};
use crate::hooks::{Hooks, TopicPoint};
use crate::sanitize::Sanitizer;

/// Style properties the topic list markup relies on beyond the safe defaults.
const TOPIC_LIST_STYLES: &[&str] = &["display"];

pub struct TopicsPipeline {
    client: ForumClient,
    hooks: Arc<Hooks>,
    sanitizer: Sanitizer,
    date_format: String,
    utc_offset_minutes: i32,
    live_refresh: bool,
    diagnostic_mode: bool,
    /// Decoded listings per embed.
    raw: ResourceCache<TopicsResponse>,
    /// Finished fragments per embed.
    rendered: ResourceCache<String>,
}

impl TopicsPipeline {
    #[must_use]
    pub fn new(client: ForumClient, hooks: Arc<Hooks>, sanitizer: Sanitizer, config: &Config) -> Self {
        Self {
            client,
            hooks,
            sanitizer,
            date_format: config.date_format.clone(),
            utc_offset_minutes: config.utc_offset_minutes,
            live_refresh: config.live_refresh,
            diagnostic_mode: config.diagnostic_mode,
            raw: ResourceCache::new(config.cache_ttl),
            rendered: ResourceCache::new(config.cache_ttl),
        }
    }

    /// Fetch, format and cache the listing selected by `args`.
    ///
    /// Failures are logged and rendered as an empty string.
    pub async fn render_topics(&self, args: &TopicArgs) -> String {
        let key = CacheKey::new(ResourceKind::Topics, args.id.as_deref());
        if let Some(html) = self.rendered.get(&key) {
            debug!(key = %key, "Using cached topic list");
            return html;
        }

        let response = match self.get_topics(args).await {
            Ok(response) => response,
            Err(e) => {
                warn!(id = ?args.id, "Failed to load topics: {e}");
                return String::new();
            }
        };

        let html = self.format_topics(&response, args);
        if !html.is_empty() {
            self.rendered.set(key, html.clone());
        }
        html
    }

    /// The listing selected by `args`, from cache when fresh.
    ///
    /// # Errors
    ///
    /// Returns the client's error when the listing cannot be fetched, or
    /// [`EmbedError::EmptyResult`] when the response has no topic list.
    pub async fn get_topics(&self, args: &TopicArgs) -> Result<TopicsResponse> {
        let key = CacheKey::new(ResourceKind::Topics, args.id.as_deref());
        if let Some(response) = self.raw.get(&key) {
            debug!(key = %key, "Using cached topic listing");
            return Ok(response);
        }

        let response = self.client.fetch_topics(&args.listing_path()).await?;
        if response.topic_list.is_none() {
            return Err(EmbedError::EmptyResult("topics"));
        }

        self.raw.set(key, response.clone());
        Ok(response)
    }

    /// Render a topic listing response.
    ///
    /// Returns an empty string when the forum URL is unconfigured or the
    /// response carries no topic list.
    #[must_use]
    pub fn format_topics(&self, response: &TopicsResponse, args: &TopicArgs) -> String {
        let Some(base_url) = self.client.base_url() else {
            return String::new();
        };
        let Some(topic_list) = response.topic_list.as_ref() else {
            return String::new();
        };

        self.hooks.notify_before_topiclist(response, args);

        let output = if self.hooks.use_plugin_formatting() {
            self.build_topic_list(base_url, &topic_list.topics, response, args)
        } else {
            debug!("Built-in topic list formatting disabled by hook");
            String::new()
        };

        // The swatch and live-refresh markup need `display`; the widened
        // list only exists for this call.
        let sanitizer = self.sanitizer.with_styles(TOPIC_LIST_STYLES);
        let output = self.hooks.apply_after_topiclist(output, response, args);
        if self.diagnostic_mode {
            output
        } else {
            sanitizer.clean(&output)
        }
    }

    /// Whether the embed should refresh itself in the browser.
    #[must_use]
    pub fn live_refresh_active(&self, args: &TopicArgs) -> bool {
        self.live_refresh
            && args.enable_live_refresh
            && (args.source == TopicSource::Latest || args.period == Period::Daily)
    }

    /// Drop every cached listing and fragment.
    pub fn clear_cache(&self) {
        self.raw.clear();
        self.rendered.clear();
    }

    fn build_topic_list(
        &self,
        base_url: &str,
        topics: &[Topic],
        response: &TopicsResponse,
        args: &TopicArgs,
    ) -> String {
        let live = self.live_refresh_active(args);
        let wrapper_class = if live {
            "wpds-tile-wrapper wpds-topiclist-refresh"
        } else {
            "wpds-tile-wrapper"
        };
        let list_class = if args.tile {
            "wpds-topiclist wpds-tile"
        } else {
            "wpds-topiclist"
        };

        let mut out = HtmlBuffer::new();
        out.open("div", wrapper_class);
        if live {
            out.push(&live_refresh_options(args));
        }
        out.open("ul", list_class);

        let mut rendered = 0;
        for topic in topics {
            if rendered >= args.max_topics {
                break;
            }
            if !topic.is_display_eligible() {
                continue;
            }
            self.render_item(&mut out, base_url, topic, response, args);
            rendered += 1;
        }

        debug!(rendered, available = topics.len(), "Formatted topic list");
        out.close("ul").close("div");
        out.into_string()
    }

    fn render_item(
        &self,
        out: &mut HtmlBuffer,
        base_url: &str,
        topic: &Topic,
        response: &TopicsResponse,
        args: &TopicArgs,
    ) {
        let topic_url = format!("{base_url}{}", topic.path());
        let created_at = format_date(topic.created_at, self.utc_offset_minutes, &self.date_format);
        let category = response.category(topic);
        let badge = resolve_category_badge(topic, &response.categories);
        let poster = response.original_poster(topic);
        let username = poster.map(|user| user.username.as_str()).unwrap_or_default();
        let avatar_url = poster
            .map(|user| user.avatar_url(base_url, TOPIC_AVATAR_SIZE))
            .unwrap_or_default();
        let likes_class = if topic.like_count > 0 {
            "wpds-topiclist-likes wpds-has-likes"
        } else {
            "wpds-topiclist-likes"
        };
        let item_class = category.map_or_else(
            || "wpds-topic".to_string(),
            |category| format!("wpds-topic {}", category.slug),
        );
        let cooked = topic.cooked.as_deref().filter(|cooked| !cooked.trim().is_empty());

        out.open("li", &item_class);
        out.filter(|markup| {
            self.hooks
                .apply_topic(TopicPoint::AboveHeader, markup, topic, category, &avatar_url, args)
        });
        out.open("div", "wpds-topiclist-clamp");

        out.push(&html! {
            header {
                @if args.username_position == Position::Top && !username.is_empty() {
                    span class="wpds-topiclist-username" { (username) }
                    @if args.date_position == Position::Top {
                        " " span class="wpds-term" { "posted on " }
                    }
                }
                @if args.date_position == Position::Top {
                    span class="wpds-created-at" { (created_at) }
                }
                h4 class="wpds-topic-title" {
                    a href=(topic_url) { (topic.title) }
                }
                @if args.category_position == Position::Top {
                    (category_badge(badge.as_ref()))
                }
            }
        });

        if let Some(cooked) = cooked {
            out.push(&html! {
                div class="wpds-topiclist-content" { (PreEscaped(cooked)) }
            });
        }

        out.filter(|markup| {
            self.hooks
                .apply_topic(TopicPoint::AboveFooter, markup, topic, category, &avatar_url, args)
        });
        out.close("div");

        out.open("footer", "").open("div", "wpds-topiclist-footer-meta");
        if args.display_avatars && !avatar_url.is_empty() {
            let avatar = html! {
                img class="wpds-latest-avatar" src=(avatar_url) alt=(username);
            };
            let avatar = self.hooks.apply_topic_avatar(avatar.into_string(), &avatar_url);
            out.push(&PreEscaped(avatar));
        }
        out.push(&html! {
            @if args.username_position == Position::Bottom && !username.is_empty() {
                span class="wpds-topiclist-username" { (username) }
            }
            @if args.date_position == Position::Bottom {
                span class="wpds-created-at" { (created_at) }
            }
            @if args.category_position == Position::Bottom {
                (category_badge(badge.as_ref()))
            }
            span class="wpds-likes-and-replies" {
                span class=(likes_class) {
                    i class="icon-heart" aria-hidden="true" {}
                    span class="wpds-topiclist-like-count" { (topic.like_count) }
                }
                a class="wpds-topiclist-reply-link" href=(topic_url) {
                    i class="icon-reply" aria-hidden="true" {}
                    span class="wpds-topiclist-replies" { (topic.reply_count()) }
                }
            }
        });
        out.close("div").close("footer");

        out.filter(|markup| {
            self.hooks
                .apply_topic(TopicPoint::BelowFooter, markup, topic, category, &avatar_url, args)
        });
        out.close("li");
    }
}

fn category_badge(badge: Option<&Markup>) -> Markup {
    html! {
        @if let Some(badge) = badge {
            span class="wpds-shortcode-category" { (badge) }
        }
    }
}

/// Hidden element carrying the embed options for the browser-side refresher.
fn live_refresh_options(args: &TopicArgs) -> Markup {
    html! {
        div class="wpds-topiclist-options" style="display: none;"
            data-id=[args.id.as_deref()]
            data-source=(args.source.as_str())
            data-period=(args.period.as_str())
            data-category=[args.category.as_deref()]
            data-max-topics=(args.max_topics)
            data-tile=(flag(args.tile))
            data-username-position=(args.username_position.as_str())
            data-date-position=(args.date_position.as_str())
            data-category-position=(args.category_position.as_str())
            data-display-avatars=(flag(args.display_avatars)) {}
    }
}

const fn flag(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::forum::{Category, Poster, TopicList, User};

    fn config() -> Config {
        Config {
            diagnostic_mode: true,
            ..Config::for_forum("https://forum.example.com")
        }
    }

    fn pipeline_with(config: &Config, hooks: Hooks) -> TopicsPipeline {
        let client = ForumClient::new(config).unwrap();
        TopicsPipeline::new(client, Arc::new(hooks), Sanitizer::default(), config)
    }

    fn topic(id: i64, user_id: i64) -> Topic {
        Topic {
            id,
            slug: format!("topic-{id}"),
            title: format!("Topic {id}"),
            created_at: Utc.with_ymd_and_hms(2024, 3, 9, 12, 0, 0).unwrap(),
            pinned_globally: false,
            archetype: "regular".to_string(),
            like_count: 2,
            posts_count: 4,
            posters: vec![Poster {
                user_id,
                description: "Original Poster".to_string(),
            }],
            cooked: None,
            category_id: Some(5),
        }
    }

    fn response(topics: Vec<Topic>) -> TopicsResponse {
        TopicsResponse {
            users: vec![User {
                id: 42,
                username: "alice".to_string(),
                avatar_template: "/{size}/a.png".to_string(),
            }],
            topic_list: Some(TopicList { topics }),
            categories: vec![Category {
                id: 5,
                name: "General".to_string(),
                slug: "general".to_string(),
                color: "0088CC".to_string(),
                text_color: "FFFFFF".to_string(),
            }],
        }
    }

    #[test]
    fn test_item_markup() {
        let html = pipeline_with(&config(), Hooks::new())
            .format_topics(&response(vec![topic(1, 42)]), &TopicArgs::default());

        assert!(html.starts_with(r#"<div class="wpds-tile-wrapper"><ul class="wpds-topiclist"><li class="wpds-topic general">"#));
        assert!(html.contains(r#"<span class="wpds-topiclist-username">alice</span> <span class="wpds-term">posted on </span><span class="wpds-created-at">2024/03/09</span>"#));
        assert!(html.contains(r#"<h4 class="wpds-topic-title"><a href="https://forum.example.com/t/topic-1/1">Topic 1</a></h4>"#));
        assert!(html.contains(r#"<img class="wpds-latest-avatar" src="https://forum.example.com/44/a.png" alt="alice">"#));
        assert!(html.contains(r#"<span class="wpds-topiclist-likes wpds-has-likes">"#));
        assert!(html.contains(r#"<span class="wpds-topiclist-replies">3</span>"#));
        // Category defaults to the footer
        let footer = html.find("<footer>").unwrap();
        assert!(html.find("wpds-shortcode-category").unwrap() > footer);
        assert!(html.ends_with("</footer></li></ul></div>"));
    }

    #[test]
    fn test_max_topics_counts_only_rendered() {
        let mut pinned = topic(1, 42);
        pinned.pinned_globally = true;
        let topics = vec![pinned, topic(2, -1), topic(3, 42), topic(4, 42), topic(5, 42)];
        let args = TopicArgs {
            max_topics: 2,
            ..TopicArgs::default()
        };
        let html = pipeline_with(&config(), Hooks::new()).format_topics(&response(topics), &args);

        assert_eq!(html.matches("<li").count(), 2);
        assert!(html.contains("/t/topic-3/3"));
        assert!(html.contains("/t/topic-4/4"));
        assert!(!html.contains("/t/topic-1/1"));
        assert!(!html.contains("/t/topic-2/2"));
        assert!(!html.contains("/t/topic-5/5"));
    }

    #[test]
    fn test_unknown_original_poster_renders_without_avatar() {
        let mut t = topic(1, 7);
        t.posters[0].description = "Frequent Poster".to_string();
        let html = pipeline_with(&config(), Hooks::new())
            .format_topics(&response(vec![topic(2, 42), t]), &TopicArgs::default());

        // The second item must not inherit alice from the first
        let second = &html[html.find("topic-1/1").unwrap()..];
        assert!(!second.contains("alice"));
        assert!(!second.contains("wpds-latest-avatar"));
    }

    #[test]
    fn test_unconfigured_or_missing_list_is_empty() {
        let unconfigured = Config::default();
        assert_eq!(
            pipeline_with(&unconfigured, Hooks::new())
                .format_topics(&response(vec![topic(1, 42)]), &TopicArgs::default()),
            ""
        );

        let empty = TopicsResponse::default();
        assert_eq!(
            pipeline_with(&config(), Hooks::new()).format_topics(&empty, &TopicArgs::default()),
            ""
        );
    }

    #[test]
    fn test_live_refresh_conditions() {
        let enabled = Config {
            live_refresh: true,
            ..config()
        };
        let pipeline = pipeline_with(&enabled, Hooks::new());
        let opted_in = TopicArgs {
            enable_live_refresh: true,
            ..TopicArgs::default()
        };
        assert!(pipeline.live_refresh_active(&opted_in));
        assert!(!pipeline.live_refresh_active(&TopicArgs::default()));

        let top_weekly = TopicArgs {
            source: TopicSource::Top,
            period: Period::Weekly,
            ..opted_in.clone()
        };
        assert!(!pipeline.live_refresh_active(&top_weekly));

        let top_daily = TopicArgs {
            period: Period::Daily,
            ..top_weekly
        };
        assert!(pipeline.live_refresh_active(&top_daily));

        assert!(!pipeline_with(&config(), Hooks::new()).live_refresh_active(&opted_in));
    }

    #[test]
    fn test_live_refresh_markup_kept_in_diagnostic_mode() {
        let enabled = Config {
            live_refresh: true,
            ..config()
        };
        let args = TopicArgs {
            enable_live_refresh: true,
            id: Some("home".to_string()),
            ..TopicArgs::default()
        };
        let html = pipeline_with(&enabled, Hooks::new()).format_topics(&response(vec![topic(1, 42)]), &args);
        assert!(html.starts_with(r#"<div class="wpds-tile-wrapper wpds-topiclist-refresh"><div class="wpds-topiclist-options" style="display: none;" data-id="home" data-source="latest""#));
    }

    #[test]
    fn test_sanitized_output_drops_data_attributes() {
        let sanitized = Config {
            diagnostic_mode: false,
            live_refresh: true,
            ..config()
        };
        let args = TopicArgs {
            enable_live_refresh: true,
            ..TopicArgs::default()
        };
        let html = pipeline_with(&sanitized, Hooks::new()).format_topics(&response(vec![topic(1, 42)]), &args);
        assert!(!html.contains("data-source"));
        assert!(html.contains("display: none;"));
        assert!(html.contains("display: inline-block;"));
    }

    #[test]
    fn test_disabled_formatting_defers_to_after_hook() {
        let mut hooks = Hooks::new();
        hooks
            .on_use_plugin_formatting(|_| false)
            .on_after_topiclist(|markup, response, _| {
                let count = response.topic_list.as_ref().map_or(0, |list| list.topics.len());
                format!("{markup}<p>{count} topics</p>")
            });
        let html = pipeline_with(&config(), hooks).format_topics(&response(vec![topic(1, 42)]), &TopicArgs::default());
        assert_eq!(html, "<p>1 topics</p>");
    }

    #[test]
    fn test_item_hooks_and_avatar_filter() {
        let mut hooks = Hooks::new();
        hooks
            .on_topic(TopicPoint::AboveHeader, |markup, topic, category, avatar, _| {
                format!(
                    "{markup}<p class=\"pre\">{}|{}|{avatar}</p>",
                    topic.id,
                    category.map_or("", |c| c.slug.as_str())
                )
            })
            .on_topic(TopicPoint::BelowFooter, |markup, _, _, _, _| markup + "<p class=\"post\"></p>")
            .on_topic_avatar(|_, url| format!("<span class=\"avatar\">{url}</span>"));
        let html = pipeline_with(&config(), hooks).format_topics(&response(vec![topic(1, 42)]), &TopicArgs::default());

        assert!(html.contains(r#"<p class="pre">1|general|https://forum.example.com/44/a.png</p><div class="wpds-topiclist-clamp">"#));
        assert!(html.contains(r#"<span class="avatar">https://forum.example.com/44/a.png</span>"#));
        assert!(html.contains(r#"</footer><p class="post"></p></li>"#));
    }

    #[tokio::test]
    async fn test_rendered_tier_rebuilds_from_raw_listing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/latest.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(response(vec![topic(1, 42)])))
            .expect(1)
            .mount(&server)
            .await;

        let pipeline = pipeline_with(&Config::for_forum(&server.uri()), Hooks::new());
        let args = TopicArgs::default();
        let first = pipeline.render_topics(&args).await;
        assert!(first.contains("/t/topic-1/1"));

        let key = CacheKey::new(ResourceKind::Topics, None);
        pipeline.rendered.invalidate(&key);
        assert!(pipeline.rendered.get(&key).is_none());

        let second = pipeline.render_topics(&args).await;
        assert_eq!(first, second);
        assert_eq!(server.received_requests().await.unwrap_or_default().len(), 1);
    }
}
