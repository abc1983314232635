use async_trait::async_trait;
use axum::Router;
use email_otp_gate::{
    axum_api::otp_router, EmailSender, GateError, InMemoryStorage, OtpConfig, OtpService,
};
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
pub struct TestEmailSender {
    pub sent_emails: Arc<Mutex<Vec<(String, String, String)>>>,
}

impl TestEmailSender {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EmailSender for TestEmailSender {
    async fn send_email(
        &self,
        recipient: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), GateError> {
        self.sent_emails.lock().unwrap().push((
            recipient.to_string(),
            subject.to_string(),
            body.to_string(),
        ));
        Ok(())
    }
}

#[allow(dead_code)]
pub async fn spawn_app() -> (Router, Arc<TestEmailSender>, Arc<InMemoryStorage>) {
    let storage = Arc::new(InMemoryStorage::new());
    let email_sender = Arc::new(TestEmailSender::new());

    let otp_service =
        OtpService::new(OtpConfig::default(), storage.clone(), email_sender.clone()).unwrap();

    let router = otp_router(Arc::new(otp_service));
    (router, email_sender, storage)
}

#[allow(dead_code)]
pub async fn post_json(app: &Router, uri: &str, body: serde_json::Value) -> axum::response::Response {
    use axum::{
        body::Body,
        http::{header, Request},
    };
    use tower::util::ServiceExt; // for oneshot

    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
}
