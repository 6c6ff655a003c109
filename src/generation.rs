//! Text and image generation seams plus the fallback policy around them.
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use tracing::{instrument, warn};

use crate::model::{Category, GeneratedContent, ImageRef};

/// Image used whenever background generation fails.
pub const FALLBACK_IMAGE_URL: &str =
    "https://images.unsplash.com/photo-1464822759023-fed622ff2c3b?auto=format&fit=crop&q=80&w=1000";

/// Aspect ratio requested for generated backgrounds.
pub const IMAGE_ASPECT_RATIO: &str = "9:16";

#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate_content(&self, category: Category) -> Result<GeneratedContent>;
}

#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate_image(&self, theme: &str) -> Result<ImageRef>;
}

/// Full prompt sent for a category, including the JSON-only instruction.
pub fn content_prompt(category: Category) -> String {
    format!("{} Return ONLY a JSON object.", category.prompt())
}

/// Background prompt for a theme with the fixed stylistic modifiers.
pub fn image_prompt(theme: &str) -> String {
    format!(
        "Cinematic professional high-quality background. Theme: {}. Minimalist design, high resolution, soft lighting, mood-setting. No people, no text in the image itself. High contrast.",
        theme
    )
}

/// Slice from the first `{` to the last `}` inclusive. Falls back to the whole
/// input when either brace is missing or they are out of order.
pub fn extract_json_object(text: &str) -> &str {
    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start <= end => &text[start..=end],
        _ => text,
    }
}

/// Parse model output into content, tolerating chatter around the JSON.
pub fn parse_generated_content(text: &str) -> Result<GeneratedContent> {
    let json = extract_json_object(text);
    let content: GeneratedContent =
        serde_json::from_str(json).context("model output is not a valid content object")?;
    if !content.is_complete() {
        return Err(anyhow!("model output has empty title, body or theme"));
    }
    Ok(content)
}

/// Ask for content; on any failure return the hardcoded content for `category`.
#[instrument(skip_all, fields(category = %category))]
pub async fn content_or_fallback(
    generator: &dyn ContentGenerator,
    category: Category,
) -> GeneratedContent {
    match generator.generate_content(category).await {
        Ok(content) if content.is_complete() => content,
        Ok(_) => {
            warn!("generated content incomplete; using fallback");
            GeneratedContent::fallback(category)
        }
        Err(err) => {
            warn!(?err, "failed to generate content; using fallback");
            GeneratedContent::fallback(category)
        }
    }
}

/// Ask for a background; on any failure return [`FALLBACK_IMAGE_URL`].
#[instrument(skip_all, fields(theme = %theme))]
pub async fn image_or_fallback(generator: &dyn ImageGenerator, theme: &str) -> ImageRef {
    match generator.generate_image(theme).await {
        Ok(image) => image,
        Err(err) => {
            warn!(?err, "image generation failed; using fallback image");
            ImageRef::Remote(FALLBACK_IMAGE_URL.to_string())
        }
    }
}
