#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::extract::State;
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use propertypro::accounts::TokenIssuer;
use propertypro::assistant::OpenAiChatClient;
use propertypro::config::{LlmConfig, QubeConfig, RoutingConfig};
use propertypro::db::{self, SqliteStore};
use propertypro::mail::{DepartmentRoutes, MailError, MailTransport, OutboundEmail};
use propertypro::policies::{PolicyDocument, PolicyLibrary};
use propertypro::qube::{QubeClient, WebhookVerifier};
use propertypro::{api_router, ApiState, Integrations};
use serde_json::{json, Value};
use tower::ServiceExt;

pub const CHAT_REPLY: &str = "Thanks for reaching out. We will be in touch.";
pub const LEGAL_MAILBOX: &str = "legal@propertypro.test";

/// Serves `router` on an ephemeral local port and returns its base URL.
pub async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("fake server");
    });
    format!("http://{addr}")
}

/// Chat-completions stand-in. Classification prompts get a `legal` verdict,
/// everything else gets [`CHAT_REPLY`].
#[derive(Clone, Default)]
pub struct FakeOpenAi {
    requests: Arc<Mutex<Vec<(Option<String>, Value)>>>,
}

impl FakeOpenAi {
    pub fn requests(&self) -> Vec<(Option<String>, Value)> {
        self.requests.lock().expect("requests mutex").clone()
    }

    pub async fn start(&self) -> String {
        let router = Router::new()
            .route("/chat/completions", post(complete))
            .with_state(self.clone());
        serve(router).await
    }
}

async fn complete(
    State(fake): State<FakeOpenAi>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let system = body["messages"][0]["content"]
        .as_str()
        .unwrap_or_default()
        .to_string();
    fake.requests
        .lock()
        .expect("requests mutex")
        .push((authorization, body));

    let content = if system.contains("classification") {
        r#"{"category": "legal", "confidence": 0.92, "explanation": "eviction notice"}"#
    } else {
        CHAT_REPLY
    };
    Json(json!({
        "choices": [{ "message": { "role": "assistant", "content": content } }]
    }))
}

#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutboundEmail>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<OutboundEmail> {
        self.sent.lock().expect("mailer mutex").clone()
    }
}

#[async_trait]
impl MailTransport for RecordingMailer {
    async fn send(&self, email: OutboundEmail) -> Result<(), MailError> {
        self.sent.lock().expect("mailer mutex").push(email);
        Ok(())
    }
}

pub fn routing() -> RoutingConfig {
    RoutingConfig {
        complaints: "complaints@propertypro.test".to_string(),
        arrears: "arrears@propertypro.test".to_string(),
        repairs: "repairs@propertypro.test".to_string(),
        legal: LEGAL_MAILBOX.to_string(),
        customer_service: "customer-service@propertypro.test".to_string(),
        support: "support@propertypro.test".to_string(),
    }
}

/// The assembled API backed by an in-memory database, a fake model server,
/// and an unconfigured Qube client.
pub struct Harness {
    pub router: Router,
    pub openai: FakeOpenAi,
    pub mailer: Arc<RecordingMailer>,
}

impl Harness {
    pub async fn start() -> Self {
        let openai = FakeOpenAi::default();
        let api_base = openai.start().await;
        let llm = OpenAiChatClient::new(&LlmConfig {
            api_key: Some("sk-test".to_string()),
            api_base,
            model: "gpt-test".to_string(),
        })
        .expect("llm client");
        let cases = QubeClient::new(&QubeConfig {
            api_url: "http://127.0.0.1:9/v1".to_string(),
            client_id: None,
            client_secret: None,
            webhook_secret: None,
        })
        .expect("qube client");

        let pool = db::connect_in_memory().await.expect("in-memory database");
        let mailer = Arc::new(RecordingMailer::default());
        let state = ApiState::new(
            SqliteStore::new(pool),
            TokenIssuer::from_secret("integration-secret", 30),
            DepartmentRoutes::new(routing()),
            WebhookVerifier::new(Some("whsec-integration".to_string())),
            Integrations {
                llm: Arc::new(llm),
                mailer: mailer.clone(),
                cases: Arc::new(cases),
                policies: Arc::new(PolicyLibrary::from_documents(vec![PolicyDocument {
                    source: "maintenance.txt".to_string(),
                    content: "Emergency maintenance is available 24/7.".to_string(),
                }])),
            },
        );

        Self {
            router: api_router(state),
            openai,
            mailer,
        }
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request builds");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router responds");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), 1 << 20)
            .await
            .expect("read body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, body)
    }

    /// Registers an account and returns a bearer token for it.
    pub async fn sign_up(&self, email: &str, role: &str) -> String {
        let (status, _) = self
            .send(
                Method::POST,
                "/register",
                None,
                Some(json!({
                    "email": email,
                    "password": "correct horse",
                    "full_name": "Test Person",
                    "role": role,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register {email}");

        let (status, body) = self
            .send(
                Method::POST,
                "/login",
                None,
                Some(json!({ "email": email, "password": "correct horse" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login {email}");
        body["access_token"]
            .as_str()
            .expect("access token")
            .to_string()
    }
}
