//! Rasterizing the rendered card into a PNG.
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use headless_chrome::browser::tab::Tab;
use headless_chrome::protocol::cdp::Page;
use headless_chrome::{Browser, LaunchOptions};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::card::CARD_ELEMENT_ID;

/// Renders card markup and turns it into image bytes.
///
/// Callers mount the document, wait for [`CaptureExporter::fonts_ready`], let
/// layout settle, and only then call [`CaptureExporter::rasterize`]: the
/// exporter snapshots whatever layout is current at that moment.
#[async_trait]
pub trait CaptureExporter: Send + Sync {
    async fn mount(&self, html: &str) -> Result<()>;
    async fn fonts_ready(&self) -> Result<()>;
    async fn rasterize(&self, pixel_ratio: u32) -> Result<Vec<u8>>;
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
struct CardRect {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

/// Headless Chrome backed exporter. Holds one tab for the process lifetime.
pub struct ChromeCapture {
    _browser: Browser,
    tab: Arc<Tab>,
    scratch_dir: PathBuf,
}

impl ChromeCapture {
    /// Launch a headless browser. `scratch_dir` receives the transient card
    /// documents and must exist.
    pub fn launch(scratch_dir: impl Into<PathBuf>) -> Result<Self> {
        let options = LaunchOptions::default_builder()
            .headless(true)
            .window_size(Some((500, 820)))
            .build()
            .map_err(|e| anyhow!("failed to build launch options: {}", e))?;
        let browser = Browser::new(options).context("failed to launch Chrome")?;
        let tab = browser.new_tab().context("failed to open tab")?;
        info!("headless Chrome ready for capture");
        Ok(Self {
            _browser: browser,
            tab,
            scratch_dir: scratch_dir.into(),
        })
    }
}

#[async_trait]
impl CaptureExporter for ChromeCapture {
    async fn mount(&self, html: &str) -> Result<()> {
        let path = self
            .scratch_dir
            .join(format!(".card-{}.html", uuid::Uuid::new_v4()));
        tokio::fs::write(&path, html)
            .await
            .with_context(|| format!("failed to write card document: {}", path.display()))?;
        let abs = tokio::fs::canonicalize(&path).await?;
        let url = format!("file://{}", abs.display());

        let tab = self.tab.clone();
        let nav = tokio::task::spawn_blocking(move || -> Result<()> {
            tab.navigate_to(&url)?.wait_until_navigated()?;
            Ok(())
        })
        .await
        .context("navigation task panicked")?;

        if let Err(err) = tokio::fs::remove_file(&path).await {
            warn!(?err, path = %path.display(), "failed to remove card document");
        }
        nav.context("failed to load card document")
    }

    async fn fonts_ready(&self) -> Result<()> {
        let tab = self.tab.clone();
        tokio::task::spawn_blocking(move || -> Result<()> {
            tab.evaluate("document.fonts.ready.then(() => true)", true)?;
            Ok(())
        })
        .await
        .context("font wait task panicked")?
        .context("failed waiting for fonts")
    }

    async fn rasterize(&self, pixel_ratio: u32) -> Result<Vec<u8>> {
        let tab = self.tab.clone();
        let script = format!(
            "(() => {{ const r = document.getElementById('{}').getBoundingClientRect(); \
             return JSON.stringify({{ x: r.x, y: r.y, width: r.width, height: r.height }}); }})()",
            CARD_ELEMENT_ID
        );
        tokio::task::spawn_blocking(move || -> Result<Vec<u8>> {
            let measured = tab.evaluate(&script, false)?;
            let raw = measured
                .value
                .as_ref()
                .and_then(|v| v.as_str())
                .ok_or_else(|| anyhow!("card element not found"))?;
            let rect: CardRect = serde_json::from_str(raw).context("invalid card bounds")?;
            debug!(?rect, pixel_ratio, "capturing card");
            let clip = Page::Viewport {
                x: rect.x,
                y: rect.y,
                width: rect.width,
                height: rect.height,
                scale: f64::from(pixel_ratio),
            };
            tab.capture_screenshot(
                Page::CaptureScreenshotFormatOption::Png,
                None,
                Some(clip),
                true,
            )
        })
        .await
        .context("capture task panicked")?
        .context("failed to capture card")
    }
}
