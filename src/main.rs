use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use prerna_ai::capture::{CaptureExporter, ChromeCapture};
use prerna_ai::card::render_card;
use prerna_ai::config;
use prerna_ai::export::LocalDownloads;
use prerna_ai::gemini::GeminiClient;
use prerna_ai::model::Category;
use prerna_ai::orchestrator::{
    DownloadOutcome, Phase, PosterOrchestrator, Services, Settings, ShareOutcome,
};
use prerna_ai::share::{NoShare, PageShare, ShareTarget};
use prerna_ai::social::{FacebookClient, SocialSession};

#[derive(Debug, Parser)]
#[command(author, version, about = "Generate inspirational quote posters")]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate a poster, optionally saving and sharing it
    Generate {
        #[arg(long, default_value_t = Category::Motivational)]
        category: Category,
        /// Capture the card and save it as PNG into app.output_dir
        #[arg(long)]
        download: bool,
        /// Capture the card and share it (posts to --page when given)
        #[arg(long)]
        share: bool,
        /// Facebook page id to share to
        #[arg(long)]
        page: Option<String>,
        /// Also write the card HTML to this path
        #[arg(long)]
        html: Option<PathBuf>,
    },
    /// List the Facebook pages the configured user manages
    Pages,
    /// List available categories
    Categories,
    /// Write an example config file
    InitConfig {
        #[arg(long)]
        force: bool,
    },
}

/// Stand-in exporter when no capture was requested.
struct NoCapture;

#[async_trait]
impl CaptureExporter for NoCapture {
    async fn mount(&self, _html: &str) -> Result<()> {
        Err(anyhow!("capture not enabled"))
    }

    async fn fonts_ready(&self) -> Result<()> {
        Err(anyhow!("capture not enabled"))
    }

    async fn rasterize(&self, _pixel_ratio: u32) -> Result<Vec<u8>> {
        Err(anyhow!("capture not enabled"))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    match args.command {
        Command::InitConfig { force } => init_config(&args.config, force),
        Command::Categories => {
            for c in Category::ALL {
                println!("{} {:<13} {}", c.icon(), c.as_str(), c.label());
            }
            Ok(())
        }
        Command::Pages => {
            let cfg = config::load(Some(&args.config))?;
            let mut session = SocialSession::new(Arc::new(FacebookClient::from_config(&cfg)?));
            for page in session.connect().await? {
                println!("{}\t{}", page.id, page.name);
            }
            Ok(())
        }
        Command::Generate {
            category,
            download,
            share,
            page,
            html,
        } => generate(&args.config, category, download, share, page, html).await,
    }
}

fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(anyhow!(
            "{} already exists (use --force to overwrite)",
            path.display()
        ));
    }
    std::fs::write(path, config::example())
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), "wrote example config");
    Ok(())
}

async fn generate(
    config_path: &Path,
    category: Category,
    download: bool,
    share: bool,
    page: Option<String>,
    html: Option<PathBuf>,
) -> Result<()> {
    let cfg = config::load(Some(config_path))?;
    cfg.ensure_dirs()?;

    let gemini = Arc::new(GeminiClient::from_config(&cfg)?);
    let exporter: Arc<dyn CaptureExporter> = if download || share {
        Arc::new(ChromeCapture::launch(&cfg.app.output_dir)?)
    } else {
        Arc::new(NoCapture)
    };
    let share_target: Arc<dyn ShareTarget> = match (&page, share) {
        (Some(page_id), true) => {
            let mut session = SocialSession::new(Arc::new(FacebookClient::from_config(&cfg)?));
            session.connect().await?;
            Arc::new(PageShare::new(Arc::new(Mutex::new(session)), page_id.clone()))
        }
        _ => Arc::new(NoShare),
    };

    let orchestrator = PosterOrchestrator::new(
        Services {
            content: gemini.clone(),
            images: gemini,
            exporter,
            saver: Arc::new(LocalDownloads::new(&cfg.app.output_dir)),
            share: share_target,
        },
        Settings::from_config(&cfg),
    );

    let state = orchestrator.request_new_poster(category).await;
    if let Phase::Error(message) = &state.phase {
        eprintln!("{}", message);
        return Ok(());
    }
    if let Some(content) = &state.content {
        println!("{}\n\n{}\n\n[theme: {}]", content.title, content.body, content.theme);
    }

    if let (Some(path), Some(content), Some(image)) = (&html, &state.content, &state.image) {
        tokio::fs::write(path, render_card(category, content, image))
            .await
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!(path = %path.display(), "wrote card html");
    }

    if download {
        match orchestrator.download().await {
            DownloadOutcome::Saved(path) => println!("Saved {}", path.display()),
            DownloadOutcome::Failed(notice) => eprintln!("{}", notice),
            DownloadOutcome::Busy => warn!("download already running"),
        }
    }
    if share {
        match orchestrator.share().await {
            ShareOutcome::SharedFile | ShareOutcome::SharedText => println!("Shared."),
            ShareOutcome::Unsupported(notice) => eprintln!("{}", notice),
            ShareOutcome::Failed(err) => eprintln!("Share failed: {}", err),
            ShareOutcome::Cancelled | ShareOutcome::Busy => {}
        }
    }
    Ok(())
}
