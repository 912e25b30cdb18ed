mod catalog;
mod client;
mod config;
mod models;
mod response;
mod routes;
mod upload;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use crate::client::MediaClient;
use crate::config::{ClientConfig, ServerConfig};
use crate::models::{GenerationResult, MediaRequest, ANIMATION_STYLES, DEFAULT_ANIMATION_STYLE};
use crate::upload::{Caption, MediaFile, MediaKind};

#[derive(Parser)]
#[clap(name = "caption-studio")]
#[clap(about = "Caption images and videos, or turn captions into images and animations")]
#[clap(version)]
struct Cli {
    /// Backend root URL; empty means same origin
    #[clap(long, global = true, env = "CAPTION_STUDIO_API_BASE")]
    base_url: Option<String>,
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a caption for an image (max 5MB)
    Caption { path: PathBuf },
    /// Generate a caption and summary for a video (max 50MB)
    VideoCaption { path: PathBuf },
    /// Generate an image from a caption
    Image { caption: String },
    /// Generate an animated video from a caption
    Animate {
        caption: String,
        #[clap(long, default_value = DEFAULT_ANIMATION_STYLE, value_parser = clap::builder::PossibleValuesParser::new(ANIMATION_STYLES))]
        style: String,
    },
    /// List previously generated images
    Images,
    /// Check whether the backend is reachable
    Health,
    /// Run the demo backend
    Serve {
        #[clap(long, env = "PORT")]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    if let Commands::Serve { port } = cli.command {
        let mut config = ServerConfig::from_env();
        if let Some(port) = port {
            config.port = port;
        }
        return routes::serve(config).await;
    }

    let mut config = ClientConfig::from_env();
    if let Some(base) = cli.base_url {
        config.base_url = base;
    }
    let client = MediaClient::new(config);

    let request = match cli.command {
        Commands::Health => {
            let reachable = client.check_connectivity().await;
            println!("{} is {}", client.config().api_root(), if reachable { "reachable" } else { "unreachable" });
            if !reachable {
                anyhow::bail!("Cannot connect to the server. Please check that the backend is running.");
            }
            return Ok(());
        }
        Commands::Images => {
            let images = client.list_stored_images().await?;
            if images.is_empty() {
                println!("No images saved yet. Generate some images and they will appear here.");
            }
            for image in images {
                println!("{}  {}  {}", image.created_at.format("%Y-%m-%d %H:%M"), client.media_url(&image.image_url), image.caption);
            }
            return Ok(());
        }
        Commands::Caption { path } => MediaRequest::Image(MediaFile::load(path, MediaKind::Image).await?),
        Commands::VideoCaption { path } => MediaRequest::Video(MediaFile::load(path, MediaKind::Video).await?),
        Commands::Image { caption } => MediaRequest::ImageFromCaption(Caption::new(&caption)?),
        Commands::Animate { caption, style } => MediaRequest::VideoFromCaption { caption: Caption::new(&caption)?, style },
        Commands::Serve { .. } => unreachable!("handled above"),
    };

    if !client.check_connectivity().await {
        tracing::warn!("⚠️ Backend at {} looks unreachable, trying anyway", client.config().api_root());
    }

    let result = client.generate(request).await?;
    print_result(&client, &result);
    Ok(())
}

fn print_result(client: &MediaClient, result: &GenerationResult) {
    match result {
        GenerationResult::Caption(r) => {
            println!("Caption: {}", r.caption);
            if let Some(url) = &r.image_url {
                println!("Image: {}", client.media_url(url));
            }
        }
        GenerationResult::VideoCaption(r) => {
            println!("Caption: {}", r.caption);
            println!("Summary: {}", r.summary);
            if let Some(url) = &r.animated_video_url {
                println!("Animated video: {}", client.media_url(url));
            }
        }
        GenerationResult::Image(r) => println!("Image: {}", client.media_url(&r.image_url)),
        GenerationResult::Video(r) => println!("Video: {}", client.media_url(&r.video_url)),
    }
    if let Some(id) = result.id() {
        println!("Id: {}", id);
    }
}
