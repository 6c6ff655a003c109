use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Generic message shown when a generation cycle fails.
pub const GENERATION_ERROR_MESSAGE: &str = "Technical dikkat aa gayi hai. Phirse try karein.";
/// Shown when the card could not be captured for saving.
pub const SAVE_FAILED_NOTICE: &str = "Image save nahi ho payi. Screenshot le lo!";
/// Shown when no share route is available.
pub const SHARE_UNSUPPORTED_NOTICE: &str =
    "Aapka platform sharing support nahi karta. Save karke share karein.";

pub const DEFAULT_SHARE_TITLE: &str = "Prerna AI Quote";
pub const SHARE_CAPTION: &str = "Check out this quote from Prerna AI!";

/// Fixed file name prefix for captured posters.
pub const POSTER_FILE_PREFIX: &str = "prerna-ai";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    Motivational,
    Love,
    Trading,
    Friendship,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Motivational,
        Category::Love,
        Category::Trading,
        Category::Friendship,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Motivational => "motivational",
            Category::Love => "love",
            Category::Trading => "trading",
            Category::Friendship => "friendship",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::Motivational => "Motivational",
            Category::Love => "Love",
            Category::Trading => "Trading",
            Category::Friendship => "Friendship",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Category::Motivational => "🚀",
            Category::Love => "❤️",
            Category::Trading => "📈",
            Category::Friendship => "🤝",
        }
    }

    /// Prompt variant sent to the content generator.
    pub fn prompt(&self) -> &'static str {
        match self {
            Category::Love => "Generate a beautiful, romantic, and deep love quote in Hindi (Shayari style or modern). It should be emotional and perfect for a couple's photo background.",
            Category::Trading => "Generate a high-energy motivational quote about stock market trading, crypto, or financial discipline in Hindi. Mention success, patience, or risk management.",
            Category::Friendship => "Generate a heartwarming quote about true friendship and loyalty in Hindi. Something that friends would want to share with each other.",
            Category::Motivational => "Generate a powerful motivational quote for success, hard work, or personal growth in Hindi. Make it punchy and impactful.",
        }
    }

    /// Theme used by the hardcoded fallback content.
    pub fn fallback_theme(&self) -> &'static str {
        match self {
            Category::Trading => "stock market",
            Category::Love => "romantic sunset",
            Category::Motivational | Category::Friendship => "success gold",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown category '{0}' (expected motivational, love, trading or friendship)")]
pub struct ParseCategoryError(pub String);

impl FromStr for Category {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ParseCategoryError(s.to_string()))
    }
}

/// Text payload produced by the content generator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GeneratedContent {
    pub title: String,
    pub body: String,
    pub theme: String,
}

impl GeneratedContent {
    /// Hardcoded content used when generation fails.
    pub fn fallback(category: Category) -> Self {
        Self {
            title: "सफलता की राह".to_string(),
            body: "आज का संघर्ष कल की जीत है। खुद पर भरोसा रखें और मेहनत जारी रखें।".to_string(),
            theme: category.fallback_theme().to_string(),
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.title.trim().is_empty() && !self.body.trim().is_empty() && !self.theme.trim().is_empty()
    }
}

/// Background image for a card: inline bytes from the provider or a remote URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageRef {
    Inline { mime_type: String, data_base64: String },
    Remote(String),
}

impl ImageRef {
    /// Value usable as an `<img src>` / CSS `url()`.
    pub fn to_src(&self) -> String {
        match self {
            ImageRef::Inline { mime_type, data_base64 } => {
                format!("data:{};base64,{}", mime_type, data_base64)
            }
            ImageRef::Remote(url) => url.clone(),
        }
    }
}

/// A page the authenticated user manages. Held in memory only.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SocialPage {
    pub id: String,
    pub name: String,
    pub access_token: String,
}

impl fmt::Debug for SocialPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SocialPage")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// A captured poster ready to be saved or shared.
#[derive(Clone, PartialEq, Eq)]
pub struct PosterFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl PosterFile {
    pub const MIME_TYPE: &'static str = "image/png";

    pub fn new(timestamp_millis: i64, bytes: Vec<u8>) -> Self {
        Self {
            file_name: format!("{}-{}.png", POSTER_FILE_PREFIX, timestamp_millis),
            bytes,
        }
    }
}

impl fmt::Debug for PosterFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PosterFile")
            .field("file_name", &self.file_name)
            .field("len", &self.bytes.len())
            .finish()
    }
}
