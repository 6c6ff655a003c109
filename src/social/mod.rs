//! Publishing captured posters to a social network page.
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::model::{PosterFile, SocialPage};

pub mod facebook;
pub mod session;

pub use facebook::FacebookClient;
pub use session::{PublisherState, SocialSession};

pub const LOGIN_REJECTED: &str = "User cancelled login or did not fully authorize.";

#[derive(Debug, Error)]
pub enum SocialError {
    #[error("social app is not configured: {0}")]
    NotConfigured(&'static str),
    #[error("{0}")]
    LoginRejected(&'static str),
    /// Error payload exactly as returned by the provider.
    #[error("provider error: {0}")]
    Provider(Value),
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("cannot {action} while {state}")]
    InvalidState {
        action: &'static str,
        state: &'static str,
    },
    #[error("page {0} is not managed by this user")]
    UnknownPage(String),
}

/// Capability surface of a social network SDK.
#[async_trait]
pub trait SocialPublisher: Send + Sync {
    async fn init(&self) -> Result<(), SocialError>;

    /// Returns the user access token.
    async fn login(&self) -> Result<String, SocialError>;

    async fn list_pages(&self, user_token: &str) -> Result<Vec<SocialPage>, SocialError>;

    /// Post an image with a caption; returns the provider's confirmation.
    async fn publish(
        &self,
        page: &SocialPage,
        image: &PosterFile,
        caption: &str,
    ) -> Result<Value, SocialError>;

    async fn publish_text(&self, page: &SocialPage, message: &str) -> Result<Value, SocialError>;
}
