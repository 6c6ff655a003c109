//! Share routes for a captured poster.
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::model::PosterFile;
use crate::social::SocialSession;

#[derive(Debug, Error)]
pub enum ShareError {
    /// The user backed out; not a failure.
    #[error("share cancelled")]
    Cancelled,
    #[error("share failed: {0}")]
    Failed(String),
}

#[async_trait]
pub trait ShareTarget: Send + Sync {
    fn can_share_files(&self, file: &PosterFile) -> bool;
    fn can_share_text(&self) -> bool;
    async fn share_file(&self, file: &PosterFile, title: &str, text: &str) -> Result<(), ShareError>;
    async fn share_text(&self, title: &str, text: &str) -> Result<(), ShareError>;
}

/// A platform without any share route.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoShare;

#[async_trait]
impl ShareTarget for NoShare {
    fn can_share_files(&self, _file: &PosterFile) -> bool {
        false
    }

    fn can_share_text(&self) -> bool {
        false
    }

    async fn share_file(&self, _file: &PosterFile, _title: &str, _text: &str) -> Result<(), ShareError> {
        Err(ShareError::Failed("sharing is not supported".into()))
    }

    async fn share_text(&self, _title: &str, _text: &str) -> Result<(), ShareError> {
        Err(ShareError::Failed("sharing is not supported".into()))
    }
}

/// Shares by posting to one page through a connected social session.
pub struct PageShare {
    session: Arc<Mutex<SocialSession>>,
    page_id: String,
}

impl PageShare {
    pub fn new(session: Arc<Mutex<SocialSession>>, page_id: impl Into<String>) -> Self {
        Self {
            session,
            page_id: page_id.into(),
        }
    }
}

fn caption(title: &str, text: &str) -> String {
    if title.is_empty() {
        text.to_string()
    } else {
        format!("{}\n\n{}", title, text)
    }
}

#[async_trait]
impl ShareTarget for PageShare {
    fn can_share_files(&self, file: &PosterFile) -> bool {
        !file.bytes.is_empty()
    }

    fn can_share_text(&self) -> bool {
        true
    }

    async fn share_file(&self, file: &PosterFile, title: &str, text: &str) -> Result<(), ShareError> {
        let mut session = self.session.lock().await;
        session
            .publish(&self.page_id, file, &caption(title, text))
            .await
            .map(|_| ())
            .map_err(|e| ShareError::Failed(e.to_string()))
    }

    async fn share_text(&self, _title: &str, text: &str) -> Result<(), ShareError> {
        let mut session = self.session.lock().await;
        session
            .publish_text(&self.page_id, text)
            .await
            .map(|_| ())
            .map_err(|e| ShareError::Failed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caption_joins_title_and_text() {
        assert_eq!(caption("T", "body"), "T\n\nbody");
        assert_eq!(caption("", "body"), "body");
    }

    #[tokio::test]
    async fn no_share_supports_nothing() {
        let f = PosterFile::new(1, vec![1]);
        assert!(!NoShare.can_share_files(&f));
        assert!(!NoShare.can_share_text());
        assert!(matches!(NoShare.share_text("t", "x").await, Err(ShareError::Failed(_))));
    }
}
