pub mod contract;
pub mod discover;
pub mod generate;
pub mod load_config;
pub mod plan;
pub mod produce;
pub mod render;
pub mod speech;
pub mod upload;
pub mod video;
pub mod visuals;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use generate::GeminiClient;
use load_config::load_config;
use produce::produce;
use render::StudioRenderer;
use speech::GoogleTts;
use upload::YouTubeClient;
use visuals::SlideRenderer;

#[derive(Parser)]
#[clap(
    name = "autocourse",
    version,
    about = "Generate, render and publish daily course lessons to YouTube"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Produce and upload the next pending lesson(s) using the given config file
    Produce {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
    },
    /// Run the one-time OAuth authorization flow and persist credentials
    Authorize {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
    },
    /// Bootstrap a new content plan from a YouTube topic search (via yt-dlp)
    Plan {
        /// Topic to search for
        #[clap(long)]
        topic: String,
        /// How many lessons to create
        #[clap(long, default_value_t = 10)]
        count: usize,
        /// Where to write the new plan
        #[clap(long, default_value = "content_plan_new.json")]
        out: PathBuf,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Produce { config } => {
            let config = load_config(config)?;

            let generator = GeminiClient::new(
                config.google_api_key.clone(),
                config.produce.presenter.clone(),
                config.produce.series.clone(),
            );
            let visuals = SlideRenderer::from_font_file(
                &config.font_file,
                config.pexels_api_key.clone(),
                format!(
                    "{} by {}",
                    config.produce.series, config.produce.presenter
                ),
            )?;
            let renderer = StudioRenderer::new(config.render, visuals, GoogleTts::default());
            let uploader = YouTubeClient::new(config.upload);

            println!("Production starting...");
            match produce(&config.produce, &generator, &renderer, &uploader).await {
                Ok(report) => {
                    println!("Production complete.\nReport:");
                    println!("{:#?}", report);
                    Ok(())
                }
                Err(e) => {
                    eprintln!("[ERROR] Production failed: {}", e);
                    Err(anyhow::Error::msg(e))
                }
            }
        }
        Commands::Authorize { config } => {
            let settings = load_config::load_upload_settings(config)?;
            let uploader = YouTubeClient::new(settings);
            uploader
                .authorize()
                .await
                .map_err(|e| anyhow::anyhow!("Authorization failed: {e}"))?;
            println!("Authorization complete.");
            Ok(())
        }
        Commands::Plan { topic, count, out } => discover::run(&topic, count, &out),
    }
}
