//! Poster generation, capture, save and share flows.
//!
//! All observable state lives in [`PosterState`] and changes only through
//! [`PosterState::apply`]. Overlapping `request_new_poster` calls are not
//! serialized: each applies its events as it progresses, so the last write wins.
use anyhow::{anyhow, Result};
use chrono::Utc;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument, warn};

use crate::capture::CaptureExporter;
use crate::card::render_card;
use crate::config::Config;
use crate::export::FileSaver;
use crate::generation::{content_or_fallback, image_or_fallback, ContentGenerator, ImageGenerator};
use crate::model::{
    Category, GeneratedContent, ImageRef, PosterFile, DEFAULT_SHARE_TITLE,
    GENERATION_ERROR_MESSAGE, SAVE_FAILED_NOTICE, SHARE_CAPTION, SHARE_UNSUPPORTED_NOTICE,
};
use crate::share::{ShareError, ShareTarget};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Generating,
    Error(String),
    Ready,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PosterState {
    pub active_category: Category,
    pub phase: Phase,
    pub content: Option<GeneratedContent>,
    pub image: Option<ImageRef>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PosterEvent {
    Started(Category),
    /// Both halves of one cycle, applied together.
    Generated {
        content: GeneratedContent,
        image: ImageRef,
    },
    Failed(String),
}

impl PosterState {
    pub fn apply(&mut self, event: PosterEvent) {
        match event {
            PosterEvent::Started(category) => {
                self.active_category = category;
                self.phase = Phase::Generating;
            }
            PosterEvent::Generated { content, image } => {
                self.content = Some(content);
                self.image = Some(image);
                self.phase = Phase::Ready;
            }
            PosterEvent::Failed(message) => self.phase = Phase::Error(message),
        }
    }

    pub fn is_generating(&self) -> bool {
        self.phase == Phase::Generating
    }

    pub fn error(&self) -> Option<&str> {
        match &self.phase {
            Phase::Error(msg) => Some(msg),
            _ => None,
        }
    }

    /// Card markup, if a finished poster is on screen.
    fn rendered_card(&self) -> Option<String> {
        match (&self.phase, &self.content, &self.image) {
            (Phase::Ready, Some(content), Some(image)) => {
                Some(render_card(self.active_category, content, image))
            }
            _ => None,
        }
    }
}

/// Single-in-flight marker for one user action.
#[derive(Debug, Default)]
pub struct InFlight(AtomicBool);

impl InFlight {
    pub fn try_acquire(&self) -> Option<InFlightToken<'_>> {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightToken(&self.0))
    }

    pub fn is_active(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Releases its [`InFlight`] on drop.
#[derive(Debug)]
pub struct InFlightToken<'a>(&'a AtomicBool);

impl Drop for InFlightToken<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    Saved(PathBuf),
    /// A download is already running.
    Busy,
    Failed(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShareOutcome {
    SharedFile,
    SharedText,
    Unsupported(&'static str),
    Cancelled,
    Failed(String),
    Busy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    /// Delay between font readiness and rasterization.
    pub settle: Duration,
    pub pixel_ratio: u32,
    /// When false, generator failures surface as the error phase instead of
    /// being replaced by fallback content/images.
    pub use_fallbacks: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            settle: Duration::from_millis(800),
            pixel_ratio: 2,
            use_fallbacks: true,
        }
    }
}

impl Settings {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            settle: Duration::from_millis(cfg.app.capture_settle_ms),
            pixel_ratio: cfg.app.pixel_ratio,
            use_fallbacks: cfg.app.use_fallbacks,
        }
    }
}

/// External capabilities the orchestrator sequences.
#[derive(Clone)]
pub struct Services {
    pub content: Arc<dyn ContentGenerator>,
    pub images: Arc<dyn ImageGenerator>,
    pub exporter: Arc<dyn CaptureExporter>,
    pub saver: Arc<dyn FileSaver>,
    pub share: Arc<dyn ShareTarget>,
}

pub struct PosterOrchestrator {
    services: Services,
    settings: Settings,
    state: Mutex<PosterState>,
    downloading: InFlight,
    sharing: InFlight,
}

impl PosterOrchestrator {
    pub fn new(services: Services, settings: Settings) -> Self {
        Self {
            services,
            settings,
            state: Mutex::new(PosterState::default()),
            downloading: InFlight::default(),
            sharing: InFlight::default(),
        }
    }

    pub async fn state(&self) -> PosterState {
        self.state.lock().await.clone()
    }

    async fn update(&self, event: PosterEvent) {
        debug!(?event, "poster event");
        self.state.lock().await.apply(event);
    }

    /// Generate text then image for `category`. Always leaves the generating
    /// phase, ending in `Ready` or `Error`.
    #[instrument(skip_all, fields(category = %category))]
    pub async fn request_new_poster(&self, category: Category) -> PosterState {
        self.update(PosterEvent::Started(category)).await;
        if let Err(err) = self.generate(category).await {
            error!(?err, "poster generation failed");
            self.update(PosterEvent::Failed(GENERATION_ERROR_MESSAGE.to_string()))
                .await;
        }
        self.state().await
    }

    async fn generate(&self, category: Category) -> Result<()> {
        let content = if self.settings.use_fallbacks {
            content_or_fallback(self.services.content.as_ref(), category).await
        } else {
            let content = self.services.content.generate_content(category).await?;
            if !content.is_complete() {
                return Err(anyhow!("generated content is incomplete"));
            }
            content
        };
        let image = if self.settings.use_fallbacks {
            image_or_fallback(self.services.images.as_ref(), &content.theme).await
        } else {
            self.services.images.generate_image(&content.theme).await?
        };
        info!(theme = %content.theme, "poster ready");
        self.update(PosterEvent::Generated { content, image }).await;
        Ok(())
    }

    /// Rasterize the current card. `None` when no card is ready or capture
    /// fails; there is no retry.
    #[instrument(skip_all)]
    pub async fn capture_current_card(&self) -> Option<PosterFile> {
        let html = match self.state.lock().await.rendered_card() {
            Some(html) => html,
            None => {
                warn!("no rendered card to capture");
                return None;
            }
        };
        match self.capture(&html).await {
            Ok(bytes) => Some(PosterFile::new(Utc::now().timestamp_millis(), bytes)),
            Err(err) => {
                error!(?err, "capture error");
                None
            }
        }
    }

    async fn capture(&self, html: &str) -> Result<Vec<u8>> {
        let exporter = &self.services.exporter;
        exporter.mount(html).await?;
        exporter.fonts_ready().await?;
        tokio::time::sleep(self.settings.settle).await;
        exporter.rasterize(self.settings.pixel_ratio).await
    }

    #[instrument(skip_all)]
    pub async fn download(&self) -> DownloadOutcome {
        let Some(_token) = self.downloading.try_acquire() else {
            debug!("download already in flight");
            return DownloadOutcome::Busy;
        };
        let Some(file) = self.capture_current_card().await else {
            return DownloadOutcome::Failed(SAVE_FAILED_NOTICE);
        };
        match self.services.saver.save(&file).await {
            Ok(path) => DownloadOutcome::Saved(path),
            Err(err) => {
                error!(?err, "saving poster failed");
                DownloadOutcome::Failed(SAVE_FAILED_NOTICE)
            }
        }
    }

    #[instrument(skip_all)]
    pub async fn share(&self) -> ShareOutcome {
        let Some(_token) = self.sharing.try_acquire() else {
            debug!("share already in flight");
            return ShareOutcome::Busy;
        };
        let file = self.capture_current_card().await;
        let content = self.state.lock().await.content.clone();
        let (title, body) = content
            .map(|c| (c.title, c.body))
            .unwrap_or_default();
        let share = &self.services.share;

        let result = match &file {
            Some(file) if share.can_share_files(file) => {
                let share_title = if title.is_empty() { DEFAULT_SHARE_TITLE } else { title.as_str() };
                share
                    .share_file(file, share_title, SHARE_CAPTION)
                    .await
                    .map(|_| ShareOutcome::SharedFile)
            }
            _ if share.can_share_text() => {
                let text = format!("{}\n\n{}\n\nSent via Prerna AI", title, body);
                share
                    .share_text(&title, &text)
                    .await
                    .map(|_| ShareOutcome::SharedText)
            }
            _ => return ShareOutcome::Unsupported(SHARE_UNSUPPORTED_NOTICE),
        };

        match result {
            Ok(outcome) => outcome,
            Err(ShareError::Cancelled) => {
                debug!("share cancelled by user");
                ShareOutcome::Cancelled
            }
            Err(err) => {
                error!(%err, "sharing failed");
                ShareOutcome::Failed(err.to_string())
            }
        }
    }

    pub fn is_downloading(&self) -> bool {
        self.downloading.is_active()
    }

    pub fn is_sharing(&self) -> bool {
        self.sharing.is_active()
    }
}
