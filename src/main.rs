use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use discourse_embeds::forum::TopicsResponse;
use discourse_embeds::{Config, GroupArgs, Hooks, Renderer, TopicArgs};

#[derive(Parser, Debug)]
#[command(name = "discourse-embeds", version, about = "Render Discourse groups and topic lists as HTML", long_about = None)]
struct Cli {
    /// Forum URL, overriding DISCOURSE_URL
    #[arg(long, global = true)]
    forum: Option<String>,

    /// Render without sanitizing the output
    #[arg(long, global = true)]
    diagnostic: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the groups embed
    Groups {
        /// Embed attribute as key=value, e.g. `group_list=dev-team,ops`
        #[arg(short, long = "attr", value_parser = parse_attribute)]
        attrs: Vec<(String, String)>,
    },
    /// Render a topic list embed
    Topics {
        /// Embed attribute as key=value, e.g. `source=top`
        #[arg(short, long = "attr", value_parser = parse_attribute)]
        attrs: Vec<(String, String)>,

        /// Render a saved listing response instead of fetching one
        #[arg(long)]
        from_file: Option<PathBuf>,
    },
}

fn parse_attribute(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty attribute name in '{raw}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    init_tracing()?;

    let cli = Cli::parse();

    let mut config = Config::from_env().context("Failed to load configuration")?;
    if let Some(forum) = cli.forum {
        config.base_url = Some(forum.trim_end_matches('/').to_string());
    }
    if cli.diagnostic {
        config.diagnostic_mode = true;
    }
    config.validate().context("Invalid configuration")?;

    let renderer = Renderer::new(&config, Hooks::new()).context("Failed to build renderer")?;

    let html = match cli.command {
        Command::Groups { attrs } => {
            let attrs: HashMap<String, String> = attrs.into_iter().collect();
            renderer.render_groups(&GroupArgs::from_attributes(&attrs)).await
        }
        Command::Topics { attrs, from_file } => {
            let attrs: HashMap<String, String> = attrs.into_iter().collect();
            let args = TopicArgs::from_attributes(&attrs);
            match from_file {
                Some(path) => {
                    let raw = tokio::fs::read_to_string(&path)
                        .await
                        .with_context(|| format!("Failed to read {}", path.display()))?;
                    let response: TopicsResponse = serde_json::from_str(&raw)
                        .with_context(|| format!("Failed to parse {}", path.display()))?;
                    renderer.render_topic_response(&response, &args)
                }
                None => renderer.render_topics(&args).await,
            }
        }
    };

    if html.is_empty() {
        info!("Nothing to render");
    }
    println!("{html}");
    Ok(())
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,discourse_embeds=info"));

    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| matches!(v.to_lowercase().as_str(), "json" | "structured"))
        .unwrap_or(false);

    // Logs go to stderr so stdout carries only the rendered fragment
    if use_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    }

    Ok(())
}
