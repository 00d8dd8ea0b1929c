use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tab_importer::config::read_config;
use tab_importer::{EntityType, HttpApi, ImportSources, Importer, TournamentSettings};

/// Import a tournament from a directory of CSV files into a tournament API
#[derive(Parser, Debug)]
#[command(name = "tab_importer")]
#[command(version)]
struct Args {
    /// Directory holding one CSV file per kind of object
    path: PathBuf,

    /// Kinds of object to import, by file name without extension (default: all)
    items: Vec<EntityType>,

    /// URL of the tournament site
    #[arg(short, long)]
    url: Option<String>,

    /// API token
    #[arg(short, long)]
    key: Option<String>,

    /// Tournament slug (default: derived from the directory name)
    #[arg(short, long)]
    slug: Option<String>,

    /// Tournament name (default: the directory name)
    #[arg(long)]
    name: Option<String>,

    /// Tournament short name (default: the directory name, shortened)
    #[arg(long)]
    short_name: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = read_config();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging_config.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let site_url = args.url.or(config.api_url.clone())
        .ok_or_else(|| anyhow!("No site URL given, pass --url or set api_url in the config"))?;
    let token = args.key.or(config.api_token.clone())
        .ok_or_else(|| anyhow!("No API token given, pass --key or set api_token in the config"))?;

    let directory = args.path.canonicalize()
        .with_context(|| format!("Can not open {}", args.path.display()))?;
    let directory_name = directory.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .ok_or_else(|| anyhow!("Can not name a tournament after {}", directory.display()))?;

    let mut settings = TournamentSettings::for_directory(site_url, &directory_name);
    if let Some(slug) = args.slug {
        settings.slug = slug;
    }
    if let Some(name) = args.name {
        settings.name = name;
    }
    if let Some(short_name) = args.short_name {
        settings.short_name = Some(short_name);
    }

    let sources = ImportSources::from_dir(&directory)?;
    if sources.is_empty() {
        warn!("No importable files in {}", directory.display());
    }

    let api = Arc::new(HttpApi::new(token, config.request_timeout())?);
    let (sender, mut receiver) = mpsc::unbounded_channel();
    let printer = tokio::spawn(async move {
        while let Some(activity) = receiver.recv().await {
            println!("{}", activity);
        }
    });

    let mut importer = Importer::new(api)
        .with_activity_log(sender)
        .with_max_concurrent_requests(config.max_concurrent_requests);
    if !args.items.is_empty() {
        importer = importer.with_selection(args.items);
    }

    let summary = importer.run(&settings, sources).await?;
    drop(importer);
    printer.await?;

    if summary.total_failed() > 0 {
        warn!("Finished with {} errors", summary.total_failed());
    } else {
        info!("Finished importing {}", summary.imported_types());
    }

    Ok(())
}
