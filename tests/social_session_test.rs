use std::sync::Arc;
use tokio::sync::Mutex;

use prerna_ai::model::{PosterFile, SocialPage};
use prerna_ai::share::{PageShare, ShareError, ShareTarget};
use prerna_ai::social::{PublisherState, SocialError, SocialPublisher, SocialSession};
use serde_json::{json, Value};

#[derive(Clone, Default)]
struct RecordingPublisher {
    reject_post: bool,
    posts: Arc<Mutex<Vec<(String, String, String)>>>,
    texts: Arc<Mutex<Vec<(String, String)>>>,
}

fn pages() -> Vec<SocialPage> {
    vec![
        SocialPage {
            id: "100".into(),
            name: "Daily Prerna".into(),
            access_token: "page-token-100".into(),
        },
        SocialPage {
            id: "200".into(),
            name: "Trading Quotes".into(),
            access_token: "page-token-200".into(),
        },
    ]
}

#[async_trait::async_trait]
impl SocialPublisher for RecordingPublisher {
    async fn init(&self) -> Result<(), SocialError> {
        Ok(())
    }

    async fn login(&self) -> Result<String, SocialError> {
        Ok("user-token".into())
    }

    async fn list_pages(&self, user_token: &str) -> Result<Vec<SocialPage>, SocialError> {
        assert_eq!(user_token, "user-token");
        Ok(pages())
    }

    async fn publish(
        &self,
        page: &SocialPage,
        image: &PosterFile,
        caption: &str,
    ) -> Result<Value, SocialError> {
        self.posts.lock().await.push((
            page.access_token.clone(),
            image.file_name.clone(),
            caption.to_string(),
        ));
        if self.reject_post {
            return Err(SocialError::Provider(
                json!({ "message": "(#200) permission denied", "code": 200 }),
            ));
        }
        Ok(json!({ "id": "photo-1", "post_id": format!("{}_1", page.id) }))
    }

    async fn publish_text(&self, page: &SocialPage, message: &str) -> Result<Value, SocialError> {
        self.texts
            .lock()
            .await
            .push((page.id.clone(), message.to_string()));
        Ok(json!({ "id": format!("{}_2", page.id) }))
    }
}

#[tokio::test]
async fn session_walks_the_state_machine() {
    let publisher = RecordingPublisher::default();
    let mut session = SocialSession::new(Arc::new(publisher.clone()));
    assert_eq!(session.state().name(), "uninitialized");

    session.init().await.unwrap();
    assert_eq!(*session.state(), PublisherState::Ready);
    session.login().await.unwrap();
    assert_eq!(session.state().name(), "authenticated");
    let listed = session.list_pages().await.unwrap().to_vec();
    assert_eq!(listed, pages());

    let file = PosterFile::new(42, vec![1, 2, 3]);
    let resp = session.publish("200", &file, "caption").await.unwrap();
    assert_eq!(resp["post_id"], "200_1");
    assert_eq!(session.state().name(), "posted");
    assert_eq!(
        *publisher.posts.lock().await,
        vec![(
            "page-token-200".to_string(),
            "prerna-ai-42.png".to_string(),
            "caption".to_string()
        )]
    );

    // Pages stay known after a post.
    session.publish_text("100", "hello").await.unwrap();
    assert_eq!(publisher.texts.lock().await.len(), 1);
}

#[tokio::test]
async fn out_of_order_calls_are_rejected() {
    let mut session = SocialSession::new(Arc::new(RecordingPublisher::default()));
    assert!(matches!(
        session.login().await,
        Err(SocialError::InvalidState { action: "log in", state: "uninitialized" })
    ));
    assert!(matches!(
        session.list_pages().await,
        Err(SocialError::InvalidState { .. })
    ));
    let file = PosterFile::new(1, vec![1]);
    assert!(matches!(
        session.publish("100", &file, "c").await,
        Err(SocialError::InvalidState { .. })
    ));

    session.init().await.unwrap();
    assert!(matches!(session.init().await, Err(SocialError::InvalidState { .. })));
}

#[tokio::test]
async fn unknown_page_is_rejected() {
    let mut session = SocialSession::new(Arc::new(RecordingPublisher::default()));
    session.connect().await.unwrap();
    let file = PosterFile::new(1, vec![1]);
    match session.publish("999", &file, "c").await {
        Err(SocialError::UnknownPage(id)) => assert_eq!(id, "999"),
        other => panic!("unexpected: {:?}", other),
    }
}

#[tokio::test]
async fn provider_error_is_kept_raw() {
    let publisher = RecordingPublisher {
        reject_post: true,
        ..Default::default()
    };
    let mut session = SocialSession::new(Arc::new(publisher));
    session.connect().await.unwrap();
    let file = PosterFile::new(1, vec![1]);
    match session.publish("100", &file, "c").await {
        Err(SocialError::Provider(payload)) => assert_eq!(payload["code"], 200),
        other => panic!("unexpected: {:?}", other),
    }
    match session.state() {
        PublisherState::PostFailed { error, pages: kept } => {
            assert_eq!(error["code"], 200);
            assert_eq!(kept.len(), 2);
        }
        other => panic!("unexpected state: {:?}", other),
    }
}

#[tokio::test]
async fn page_share_posts_through_session() {
    let publisher = RecordingPublisher::default();
    let mut session = SocialSession::new(Arc::new(publisher.clone()));
    session.connect().await.unwrap();
    let share = PageShare::new(Arc::new(Mutex::new(session)), "100");

    let file = PosterFile::new(7, vec![9]);
    assert!(share.can_share_files(&file));
    share.share_file(&file, "Title", "Check it").await.unwrap();
    let posts = publisher.posts.lock().await.clone();
    assert_eq!(posts[0].2, "Title\n\nCheck it");

    share.share_text("Title", "just text").await.unwrap();
    assert_eq!(
        *publisher.texts.lock().await,
        vec![("100".to_string(), "just text".to_string())]
    );
}

#[tokio::test]
async fn page_share_reports_failures() {
    let publisher = RecordingPublisher {
        reject_post: true,
        ..Default::default()
    };
    let mut session = SocialSession::new(Arc::new(publisher));
    session.connect().await.unwrap();
    let share = PageShare::new(Arc::new(Mutex::new(session)), "100");
    let file = PosterFile::new(7, vec![9]);
    assert!(matches!(
        share.share_file(&file, "t", "c").await,
        Err(ShareError::Failed(_))
    ));
}
