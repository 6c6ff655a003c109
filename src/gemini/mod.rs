use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use base64::Engine;
use reqwest::{Client, StatusCode, Url};
use serde_json::{json, Value};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::gemini::model::GenerateContentResp;
use crate::generation::{
    content_prompt, image_prompt, parse_generated_content, ContentGenerator, ImageGenerator,
    IMAGE_ASPECT_RATIO,
};
use crate::model::{Category, GeneratedContent, ImageRef};

pub mod model;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/";

#[derive(Clone)]
pub struct GeminiClient {
    http: Client,
    base_url: Url,
    api_key: String,
    text_model: String,
    image_model: String,
}

impl fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url)
            .field("text_model", &self.text_model)
            .field("image_model", &self.image_model)
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    pub fn new(api_key: String, text_model: String, image_model: String) -> Result<Self> {
        let base_url = Url::parse(GEMINI_API_BASE).context("invalid default Gemini URL")?;
        Self::with_base_url(api_key, text_model, image_model, base_url, Duration::from_secs(60))
    }

    pub fn with_base_url(
        api_key: String,
        text_model: String,
        image_model: String,
        base_url: Url,
        timeout: Duration,
    ) -> Result<Self> {
        let http = Client::builder()
            .user_agent("prerna-ai/0.1")
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url,
            api_key,
            text_model,
            image_model,
        })
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        let base_url = Url::parse(&cfg.gemini.base_url)
            .with_context(|| format!("invalid gemini.base_url: {}", cfg.gemini.base_url))?;
        Self::with_base_url(
            cfg.gemini.api_key.clone(),
            cfg.gemini.text_model.clone(),
            cfg.gemini.image_model.clone(),
            base_url,
            Duration::from_secs(cfg.gemini.timeout_seconds),
        )
    }

    fn endpoint(&self, model: &str) -> Result<Url> {
        self.base_url
            .join(&format!("v1beta/models/{}:generateContent", model))
            .context("invalid Gemini base URL")
    }

    pub fn build_request(&self, model: &str, body: &Value) -> Result<reqwest::Request> {
        if self.api_key.trim().is_empty() {
            return Err(anyhow!("Gemini API key is not configured"));
        }
        self.http
            .post(self.endpoint(model)?)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(body)
            .build()
            .context("failed to build Gemini request")
    }

    async fn execute(&self, model: &str, body: Value) -> Result<GenerateContentResp> {
        let request = self.build_request(model, &body)?;
        debug!(url = %request.url(), model, "sending generateContent");

        let res = self
            .http
            .execute(request)
            .await
            .context("failed to reach Gemini")?;

        if res.status() == StatusCode::TOO_MANY_REQUESTS {
            let body = res.text().await.unwrap_or_default();
            warn!("Rate limited by Gemini: {}", body);
            return Err(anyhow!("received 429 from Gemini: {}", body));
        }
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            warn!("Gemini API error - Status: {}, Body: {}", status, body);
            return Err(anyhow!("gemini error {}: {}", status, body));
        }

        let response_body = res.text().await.context("failed to read Gemini response")?;
        serde_json::from_str(&response_body).context("invalid Gemini response JSON")
    }

    pub async fn generate_text(&self, category: Category) -> Result<GeneratedContent> {
        let body = build_content_request(category);
        let resp = self.execute(&self.text_model, body).await?;
        let text = resp.text().ok_or_else(|| anyhow!("model returned no text"))?;
        let content = parse_generated_content(&text)?;
        info!(category = %category, theme = %content.theme, "generated content");
        Ok(content)
    }

    pub async fn generate_background(&self, theme: &str) -> Result<ImageRef> {
        let body = build_image_request(theme);
        let resp = self.execute(&self.image_model, body).await?;
        let image = image_from_response(&resp)?;
        info!(theme, "generated background image");
        Ok(image)
    }
}

#[async_trait]
impl ContentGenerator for GeminiClient {
    async fn generate_content(&self, category: Category) -> Result<GeneratedContent> {
        GeminiClient::generate_text(self, category).await
    }
}

#[async_trait]
impl ImageGenerator for GeminiClient {
    async fn generate_image(&self, theme: &str) -> Result<ImageRef> {
        GeminiClient::generate_background(self, theme).await
    }
}

pub fn build_content_request(category: Category) -> Value {
    json!({
        "contents": [
            { "parts": [ { "text": content_prompt(category) } ] }
        ],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": {
                "type": "OBJECT",
                "properties": {
                    "title": {
                        "type": "STRING",
                        "description": "A short, catchy headline (3-6 words) in Hindi.",
                    },
                    "body": {
                        "type": "STRING",
                        "description": "A detailed but concise message (15-30 words) in Hindi.",
                    },
                    "theme": {
                        "type": "STRING",
                        "description": format!(
                            "A one-word English theme for image generation related to {} (e.g., 'sunset', 'candles', 'chart', 'cityscape').",
                            category
                        ),
                    },
                },
                "required": ["title", "body", "theme"],
            }
        }
    })
}

pub fn build_image_request(theme: &str) -> Value {
    json!({
        "contents": [
            { "parts": [ { "text": image_prompt(theme) } ] }
        ],
        "generationConfig": {
            "imageConfig": { "aspectRatio": IMAGE_ASPECT_RATIO }
        }
    })
}

/// Pick the first inline image part from a response.
pub fn image_from_response(resp: &GenerateContentResp) -> Result<ImageRef> {
    let parts_present = resp
        .candidates
        .first()
        .and_then(|c| c.content.as_ref())
        .is_some();
    if !parts_present {
        return Err(anyhow!("invalid response format: no parts"));
    }
    let inline = resp
        .first_inline_data()
        .ok_or_else(|| anyhow!("no image data found in response"))?;
    base64::engine::general_purpose::STANDARD
        .decode(&inline.data)
        .context("image data is not valid base64")?;
    Ok(ImageRef::Inline {
        mime_type: inline.mime_type.clone(),
        data_base64: inline.data.clone(),
    })
}
