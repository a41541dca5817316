/// # folio-publish CLI Interface (Module)
///
/// Command parsing and the async [`run`] entrypoint shared by `main()` and integration tests.
///
/// All workflow logic (validation, conversion, path resolution, commits) lives in
/// `folio-publish-core`. This module only wires configuration, the GitHub client and the chosen
/// front end together.
///
/// ## Subcommands
/// - `serve`: run the HTTP endpoint the admin form posts to.
/// - `publish`: publish one JSON submission file and print the result.
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use folio_publish_core::codec::WebpEncoder;
use folio_publish_core::publish::Publisher;
use folio_publish_core::submission::SubmissionPayload;

use crate::github::GitHubClient;
use crate::load_config::{load_config, AppConfig};
use crate::server::{self, SuccessResponse};

/// CLI for folio-publish: commit portfolio projects to a GitHub repository.
#[derive(Parser)]
#[clap(
    name = "folio-publish",
    version,
    about = "Convert project images to WebP and commit them with markdown entries to GitHub"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve the submission endpoint for the admin form
    Serve {
        /// Path to the YAML config file
        #[clap(long)]
        config: Option<PathBuf>,
        /// Address to listen on, overriding `server.bind`
        #[clap(long)]
        bind: Option<SocketAddr>,
    },
    /// Publish a single submission from a JSON file
    Publish {
        /// Path to the YAML config file
        #[clap(long)]
        config: Option<PathBuf>,
        /// JSON file in the same format the form posts
        #[clap(long)]
        submission: PathBuf,
    },
}

fn build_publisher(config: &AppConfig) -> Result<Publisher<GitHubClient, WebpEncoder>> {
    let client = GitHubClient::new(config.github.clone())?;
    Ok(Publisher::new(
        client,
        WebpEncoder::new(),
        config.publish.clone(),
    ))
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    // Emit a top-level 'trace_initialised' event at the very start
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Serve { config, bind } => {
            let mut config = load_config(config)?;
            if let Some(bind) = bind {
                config.server.bind = bind;
            }
            tracing::info!(command = "serve", bind = %config.server.bind, "Starting server");
            let publisher = Arc::new(build_publisher(&config)?);
            let router = server::create_router(publisher, &config.server);
            server::serve(router, &config.server).await
        }
        Commands::Publish { config, submission } => {
            let config = load_config(config)?;
            let raw = std::fs::read_to_string(&submission)
                .with_context(|| format!("Failed to read submission file {:?}", submission))?;
            let payload: SubmissionPayload = serde_json::from_str(&raw)
                .with_context(|| format!("Failed to parse submission file {:?}", submission))?;
            tracing::info!(command = "publish", file = ?submission, "Publishing submission");

            let publisher = build_publisher(&config)?;
            let submission = payload.into_submission()?;
            match publisher.publish(&submission).await {
                Ok(report) => {
                    tracing::info!(command = "publish", ?report, "Publish complete");
                    println!("{}", serde_json::to_string_pretty(&SuccessResponse::from(report))?);
                    Ok(())
                }
                Err(e) => {
                    tracing::error!(command = "publish", error = %e, "Publish failed");
                    Err(anyhow::Error::new(e))
                }
            }
        }
    }
}
