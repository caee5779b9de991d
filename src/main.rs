use anyhow::{Context, Result};
use autolink::config::{Configuration, HashtagPlatform};
use autolink::preview::PreviewPlatform;
use autolink::render::{self, Node};
use autolink::Autolink;
use clap::{Parser, ValueEnum};
use std::io::{Read, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Colored labels with OSC 8 hyperlinks
    Ansi,
    /// Rendered nodes as JSON
    Json,
    /// Visible text only
    Plain,
}

#[derive(Parser, Debug)]
#[command(name = "autolink")]
#[command(about = "Link e-mail addresses, URLs, phone numbers, hashtags and mentions in text")]
#[command(version)]
struct Args {
    /// Text to link; read from stdin when omitted
    text: Option<String>,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Do not link e-mail addresses
    #[arg(long)]
    no_email: bool,

    /// Do not link URLs
    #[arg(long)]
    no_url: bool,

    /// Do not link phone numbers
    #[arg(long)]
    no_phone: bool,

    /// Platform hashtags open in
    #[arg(long, value_enum)]
    hashtag: Option<HashtagPlatform>,

    /// Link @handle mentions
    #[arg(long)]
    mention: bool,

    /// Keep http(s):// and www. in URL labels
    #[arg(long)]
    keep_prefix: bool,

    /// Maximum label length, 0 disables truncation
    #[arg(long)]
    truncate: Option<usize>,

    /// Marker placed where a label was shortened
    #[arg(long)]
    truncate_chars: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value = "ansi")]
    format: OutputFormat,

    /// Activate the link at this node index and report the URL it opens
    #[arg(long)]
    activate: Option<usize>,

    /// App scheme to treat as installed when probing (repeatable)
    #[arg(long = "app-scheme")]
    app_schemes: Vec<String>,
}

impl Args {
    fn configuration(&self) -> Result<Configuration> {
        let mut config = match &self.config {
            Some(path) => Configuration::load(path)?,
            None => Configuration::default(),
        };
        if self.no_email {
            config.email = false;
        }
        if self.no_url {
            config.url = false;
        }
        if self.no_phone {
            config.phone = false;
        }
        if let Some(hashtag) = self.hashtag {
            config.hashtag = hashtag;
        }
        if self.mention {
            config.mention = true;
        }
        if self.keep_prefix {
            config.strip_prefix = false;
        }
        if let Some(truncate) = self.truncate {
            config.truncate = truncate;
        }
        if let Some(marker) = &self.truncate_chars {
            config.truncate_chars = marker.clone();
        }
        Ok(config)
    }

    fn input_text(&self) -> Result<String> {
        match &self.text {
            Some(text) => Ok(text.clone()),
            None => {
                let mut text = String::new();
                std::io::stdin()
                    .read_to_string(&mut text)
                    .context("Failed to read text from stdin")?;
                Ok(text)
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // WHY: stdout carries rendered output, so structured logs go to stderr
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .json()
        .init();

    let args = Args::parse();
    info!(?args, "Parsed CLI arguments");

    let config = args.configuration()?;
    let text = args.input_text()?;
    let platform = Arc::new(PreviewPlatform::new(args.app_schemes.clone()));
    let autolink = Autolink::new(config, platform)?;

    let Some(nodes) = autolink.render(&text) else {
        // Inert fallback: the raw text, nothing linked
        print!("{text}");
        return Ok(());
    };
    info!("Rendered {} nodes", nodes.len());

    match args.activate {
        Some(index) => activate(&autolink, &nodes, index).await?,
        None => write_nodes(&autolink, &nodes, args.format)?,
    }

    Ok(())
}

fn write_nodes(autolink: &Autolink, nodes: &[Node], format: OutputFormat) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    match format {
        OutputFormat::Ansi => render::write_ansi(nodes, autolink.dispatcher(), &mut stdout)?,
        OutputFormat::Json => serde_json::to_writer_pretty(&mut stdout, nodes)?,
        OutputFormat::Plain => stdout.write_all(render::to_plain_text(nodes).as_bytes())?,
    }
    writeln!(stdout)?;
    Ok(())
}

async fn activate(autolink: &Autolink, nodes: &[Node], index: usize) -> Result<()> {
    let link = nodes
        .iter()
        .filter_map(Node::as_link)
        .find(|link| link.index == index)
        .with_context(|| format!("No link at node index {index}"))?;

    match autolink.activate(link).settle().await {
        Some(opened) => {
            if let Some(error) = opened.error {
                anyhow::bail!("Failed to open {}: {}", opened.url, error);
            }
        }
        None => info!("Activation handled without opening a URL"),
    }
    Ok(())
}
