use serde_json::{json, Value};
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

use super::{SocialError, SocialPublisher};
use crate::model::{PosterFile, SocialPage};

/// Where a publishing session stands. Tokens live only in memory.
#[derive(Clone, PartialEq)]
pub enum PublisherState {
    Uninitialized,
    Ready,
    Authenticated { user_token: String },
    PagesListed { pages: Vec<SocialPage> },
    Posted { pages: Vec<SocialPage>, response: Value },
    PostFailed { pages: Vec<SocialPage>, error: Value },
}

impl PublisherState {
    pub fn name(&self) -> &'static str {
        match self {
            PublisherState::Uninitialized => "uninitialized",
            PublisherState::Ready => "ready",
            PublisherState::Authenticated { .. } => "authenticated",
            PublisherState::PagesListed { .. } => "pages listed",
            PublisherState::Posted { .. } => "posted",
            PublisherState::PostFailed { .. } => "post failed",
        }
    }

    fn pages(&self) -> Option<&[SocialPage]> {
        match self {
            PublisherState::PagesListed { pages }
            | PublisherState::Posted { pages, .. }
            | PublisherState::PostFailed { pages, .. } => Some(pages),
            _ => None,
        }
    }
}

impl fmt::Debug for PublisherState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Drives a [`SocialPublisher`] through init → login → list pages → post,
/// rejecting calls made out of order. Each step is one round trip.
pub struct SocialSession {
    publisher: Arc<dyn SocialPublisher>,
    state: PublisherState,
}

impl SocialSession {
    pub fn new(publisher: Arc<dyn SocialPublisher>) -> Self {
        Self {
            publisher,
            state: PublisherState::Uninitialized,
        }
    }

    pub fn state(&self) -> &PublisherState {
        &self.state
    }

    fn invalid(&self, action: &'static str) -> SocialError {
        SocialError::InvalidState {
            action,
            state: self.state.name(),
        }
    }

    pub async fn init(&mut self) -> Result<(), SocialError> {
        if self.state != PublisherState::Uninitialized {
            return Err(self.invalid("initialize"));
        }
        self.publisher.init().await?;
        self.state = PublisherState::Ready;
        Ok(())
    }

    pub async fn login(&mut self) -> Result<(), SocialError> {
        if self.state != PublisherState::Ready {
            return Err(self.invalid("log in"));
        }
        let user_token = self.publisher.login().await?;
        self.state = PublisherState::Authenticated { user_token };
        Ok(())
    }

    pub async fn list_pages(&mut self) -> Result<&[SocialPage], SocialError> {
        let user_token = match &self.state {
            PublisherState::Authenticated { user_token } => user_token.clone(),
            _ => return Err(self.invalid("list pages")),
        };
        let pages = self.publisher.list_pages(&user_token).await?;
        self.state = PublisherState::PagesListed { pages };
        Ok(self.state.pages().unwrap_or_default())
    }

    /// Convenience for the common init → login → list sequence.
    pub async fn connect(&mut self) -> Result<&[SocialPage], SocialError> {
        self.init().await?;
        self.login().await?;
        self.list_pages().await
    }

    fn page(&self, page_id: &str) -> Result<SocialPage, SocialError> {
        let pages = self.state.pages().ok_or_else(|| self.invalid("publish"))?;
        pages
            .iter()
            .find(|p| p.id == page_id)
            .cloned()
            .ok_or_else(|| SocialError::UnknownPage(page_id.to_string()))
    }

    pub async fn publish(
        &mut self,
        page_id: &str,
        image: &PosterFile,
        caption: &str,
    ) -> Result<Value, SocialError> {
        let page = self.page(page_id)?;
        let result = self.publisher.publish(&page, image, caption).await;
        self.settle(result)
    }

    pub async fn publish_text(&mut self, page_id: &str, message: &str) -> Result<Value, SocialError> {
        let page = self.page(page_id)?;
        let result = self.publisher.publish_text(&page, message).await;
        self.settle(result)
    }

    fn settle(&mut self, result: Result<Value, SocialError>) -> Result<Value, SocialError> {
        let pages = self.state.pages().map(<[SocialPage]>::to_vec).unwrap_or_default();
        match result {
            Ok(response) => {
                info!("post confirmed");
                self.state = PublisherState::Posted {
                    pages,
                    response: response.clone(),
                };
                Ok(response)
            }
            Err(err) => {
                warn!(%err, "post failed");
                let error = match &err {
                    SocialError::Provider(payload) => payload.clone(),
                    other => json!({ "message": other.to_string() }),
                };
                self.state = PublisherState::PostFailed { pages, error };
                Err(err)
            }
        }
    }
}
