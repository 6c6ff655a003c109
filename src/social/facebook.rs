use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use tracing::{info, instrument, warn};

use super::{SocialError, SocialPublisher, LOGIN_REJECTED};
use crate::config::{Config, PLACEHOLDER_FB_APP_ID};
use crate::model::{PosterFile, SocialPage};

const GRAPH_API_BASE: &str = "https://graph.facebook.com/";

/// Graph API client. The user token is supplied up front because a terminal
/// has no login dialog; `login` verifies it.
#[derive(Clone)]
pub struct FacebookClient {
    http: Client,
    base_url: Url,
    app_id: String,
    version: String,
    user_token: String,
}

impl fmt::Debug for FacebookClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FacebookClient")
            .field("base_url", &self.base_url)
            .field("app_id", &self.app_id)
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

#[derive(Deserialize)]
struct AccountsResponse {
    #[serde(default)]
    data: Vec<SocialPage>,
}

impl FacebookClient {
    pub fn new(app_id: String, version: String, user_token: String) -> Result<Self, SocialError> {
        let base_url = Url::parse(GRAPH_API_BASE).map_err(|_| SocialError::NotConfigured("graph base url"))?;
        Self::with_base_url(app_id, version, user_token, base_url)
    }

    pub fn with_base_url(
        app_id: String,
        version: String,
        user_token: String,
        base_url: Url,
    ) -> Result<Self, SocialError> {
        let http = Client::builder().user_agent("prerna-ai/0.1").build()?;
        Ok(Self {
            http,
            base_url,
            app_id,
            version,
            user_token,
        })
    }

    pub fn from_config(cfg: &Config) -> Result<Self, SocialError> {
        Self::new(
            cfg.facebook.app_id.clone(),
            cfg.facebook.graph_version.clone(),
            cfg.facebook.user_token.clone(),
        )
    }

    fn endpoint(&self, path: &str) -> Result<Url, SocialError> {
        self.base_url
            .join(&format!("{}/{}", self.version, path))
            .map_err(|_| SocialError::NotConfigured("graph endpoint"))
    }

    pub fn build_me_request(&self, user_token: &str) -> Result<reqwest::Request, SocialError> {
        Ok(self
            .http
            .get(self.endpoint("me")?)
            .query(&[("access_token", user_token)])
            .build()?)
    }

    pub fn build_accounts_request(&self, user_token: &str) -> Result<reqwest::Request, SocialError> {
        Ok(self
            .http
            .get(self.endpoint("me/accounts")?)
            .query(&[("access_token", user_token)])
            .build()?)
    }

    pub fn build_photo_request(
        &self,
        page: &SocialPage,
        image: &PosterFile,
        caption: &str,
    ) -> Result<reqwest::Request, SocialError> {
        let source = reqwest::multipart::Part::bytes(image.bytes.clone())
            .file_name(image.file_name.clone())
            .mime_str(PosterFile::MIME_TYPE)?;
        let form = reqwest::multipart::Form::new()
            .text("access_token", page.access_token.clone())
            .part("source", source)
            .text("message", caption.to_string());
        Ok(self
            .http
            .post(self.endpoint(&format!("{}/photos", page.id))?)
            .multipart(form)
            .build()?)
    }

    pub fn build_feed_request(
        &self,
        page: &SocialPage,
        message: &str,
    ) -> Result<reqwest::Request, SocialError> {
        Ok(self
            .http
            .post(self.endpoint(&format!("{}/feed", page.id))?)
            .form(&[("access_token", page.access_token.as_str()), ("message", message)])
            .build()?)
    }

    async fn execute(&self, request: reqwest::Request) -> Result<Value, SocialError> {
        let path = request.url().path().to_string();
        let res = self.http.execute(request).await?;
        let status = res.status();
        let body = res.text().await?;
        let result = parse_graph_response(status, &body);
        if let Err(err) = &result {
            warn!(%path, %status, %err, "graph api call failed");
        }
        result
    }
}

/// Graph API responses carry failures in an `error` object; pass it out raw.
/// A body that is not JSON is never a confirmation, whatever the status.
pub fn parse_graph_response(status: StatusCode, raw: &str) -> Result<Value, SocialError> {
    let body: Value = serde_json::from_str(raw)
        .map_err(|_| SocialError::Provider(Value::String(raw.to_string())))?;
    if let Some(error) = body.get("error") {
        return Err(SocialError::Provider(error.clone()));
    }
    if !status.is_success() {
        return Err(SocialError::Provider(body));
    }
    Ok(body)
}

#[async_trait]
impl SocialPublisher for FacebookClient {
    async fn init(&self) -> Result<(), SocialError> {
        if self.app_id.trim().is_empty() || self.app_id.trim() == PLACEHOLDER_FB_APP_ID {
            return Err(SocialError::NotConfigured(
                "facebook.app_id must be replaced with a real app id",
            ));
        }
        info!(app_id = %self.app_id, version = %self.version, "graph api client ready");
        Ok(())
    }

    #[instrument(skip_all)]
    async fn login(&self) -> Result<String, SocialError> {
        if self.user_token.trim().is_empty() {
            return Err(SocialError::LoginRejected(LOGIN_REJECTED));
        }
        let me = self.execute(self.build_me_request(&self.user_token)?).await?;
        let user = me.get("name").and_then(serde_json::Value::as_str).unwrap_or("?");
        info!(user, "logged in");
        Ok(self.user_token.clone())
    }

    #[instrument(skip_all)]
    async fn list_pages(&self, user_token: &str) -> Result<Vec<SocialPage>, SocialError> {
        let body = self.execute(self.build_accounts_request(user_token)?).await?;
        let accounts: AccountsResponse =
            serde_json::from_value(body.clone()).map_err(|_| SocialError::Provider(body))?;
        info!(count = accounts.data.len(), "listed pages");
        Ok(accounts.data)
    }

    #[instrument(skip_all, fields(page_id = %page.id, file = %image.file_name))]
    async fn publish(
        &self,
        page: &SocialPage,
        image: &PosterFile,
        caption: &str,
    ) -> Result<Value, SocialError> {
        let response = self.execute(self.build_photo_request(page, image, caption)?).await?;
        info!("published photo");
        Ok(response)
    }

    #[instrument(skip_all, fields(page_id = %page.id))]
    async fn publish_text(&self, page: &SocialPage, message: &str) -> Result<Value, SocialError> {
        let response = self.execute(self.build_feed_request(page, message)?).await?;
        info!("published text post");
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client() -> FacebookClient {
        FacebookClient::new("123".into(), "v18.0".into(), "user-token".into()).unwrap()
    }

    fn page() -> SocialPage {
        SocialPage {
            id: "42".into(),
            name: "Quotes".into(),
            access_token: "page-token".into(),
        }
    }

    #[test]
    fn accounts_request_targets_me_accounts() {
        let req = client().build_accounts_request("user-token").unwrap();
        assert_eq!(req.method(), reqwest::Method::GET);
        assert_eq!(req.url().path(), "/v18.0/me/accounts");
        assert_eq!(req.url().query(), Some("access_token=user-token"));
    }

    #[test]
    fn photo_request_is_multipart_post_to_page() {
        let file = PosterFile::new(1, vec![0x89, 0x50]);
        let req = client().build_photo_request(&page(), &file, "caption").unwrap();
        assert_eq!(req.method(), reqwest::Method::POST);
        assert_eq!(req.url().path(), "/v18.0/42/photos");
        let ct = req
            .headers()
            .get("content-type")
            .and_then(|h| h.to_str().ok())
            .unwrap();
        assert!(ct.starts_with("multipart/form-data"));
    }

    #[test]
    fn feed_request_is_form_encoded() {
        let req = client().build_feed_request(&page(), "hello").unwrap();
        assert_eq!(req.url().path(), "/v18.0/42/feed");
        let body = req.body().and_then(|b| b.as_bytes()).unwrap();
        let body = std::str::from_utf8(body).unwrap();
        assert!(body.contains("access_token=page-token"));
        assert!(body.contains("message=hello"));
    }

    #[test]
    fn graph_error_payload_is_passed_through() {
        let payload = json!({ "error": { "message": "Invalid OAuth access token.", "code": 190 } });
        match parse_graph_response(StatusCode::BAD_REQUEST, &payload.to_string()) {
            Err(SocialError::Provider(err)) => assert_eq!(err["code"], 190),
            other => panic!("unexpected: {:?}", other),
        }
        let body = json!({ "id": "1", "post_id": "42_1" }).to_string();
        let ok = parse_graph_response(StatusCode::OK, &body).unwrap();
        assert_eq!(ok["post_id"], "42_1");
    }

    #[test]
    fn non_json_success_body_is_not_a_confirmation() {
        match parse_graph_response(StatusCode::OK, "<html>upstream proxy</html>") {
            Err(SocialError::Provider(raw)) => assert_eq!(raw, "<html>upstream proxy</html>"),
            other => panic!("unexpected: {:?}", other),
        }
        assert!(matches!(
            parse_graph_response(StatusCode::OK, ""),
            Err(SocialError::Provider(_))
        ));
        match parse_graph_response(StatusCode::BAD_GATEWAY, "{\"detail\":\"gateway\"}") {
            Err(SocialError::Provider(body)) => assert_eq!(body["detail"], "gateway"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[tokio::test]
    async fn init_rejects_placeholder_app_id() {
        let c = FacebookClient::new(PLACEHOLDER_FB_APP_ID.into(), "v18.0".into(), "".into()).unwrap();
        assert!(matches!(c.init().await, Err(SocialError::NotConfigured(_))));
    }

    #[tokio::test]
    async fn login_without_token_is_rejected() {
        let c = FacebookClient::new("123".into(), "v18.0".into(), " ".into()).unwrap();
        match c.login().await {
            Err(SocialError::LoginRejected(msg)) => assert_eq!(msg, LOGIN_REJECTED),
            other => panic!("unexpected: {:?}", other),
        }
    }
}
