use std::collections::VecDeque;
use std::sync::{Arc, Mutex, OnceLock};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request};
use axum::response::Response;
use axum::Router;
use serde_json::Value;

use crate::accounts::password::hash_password;
use crate::accounts::{Role, TokenIssuer, User, UserId, UserRepository};
use crate::assistant::{CompletionRequest, LanguageModel, LlmError};
use crate::config::RoutingConfig;
use crate::db::{self, SqliteStore};
use crate::http::{api_router, ApiState, Integrations};
use crate::mail::{
    DepartmentRoutes, MailError, MailTransport, Mailbox, MailboxError, OutboundEmail, RawMessage,
};
use crate::policies::{PolicyDocument, PolicyLibrary};
use crate::properties::PropertyId;
use crate::qube::{CaseGateway, CasePayload, NewComment, QubeCase, QubeError, WebhookVerifier};

pub(crate) const TEST_PASSWORD: &str = "hunter22";
pub(crate) const WEBHOOK_SECRET: &str = "whsec-test";

pub(crate) async fn memory_store() -> SqliteStore {
    let pool = db::connect_in_memory().await.expect("in-memory database");
    SqliteStore::new(pool)
}

fn test_password_hash() -> String {
    static HASH: OnceLock<String> = OnceLock::new();
    HASH.get_or_init(|| hash_password(TEST_PASSWORD).expect("hash test password"))
        .clone()
}

/// An unsaved active user whose password is [`TEST_PASSWORD`].
pub(crate) fn user(role: Role, email: &str) -> User {
    User {
        id: UserId::generate(),
        email: email.to_string(),
        hashed_password: test_password_hash(),
        full_name: format!("{} User", role.as_str()),
        role,
        is_active: true,
        created_at: db::now(),
        updated_at: None,
    }
}

pub(crate) fn routing_config() -> RoutingConfig {
    RoutingConfig {
        complaints: "complaints@propertypro.test".to_string(),
        arrears: "arrears@propertypro.test".to_string(),
        repairs: "repairs@propertypro.test".to_string(),
        legal: "legal@propertypro.test".to_string(),
        customer_service: "customer-service@propertypro.test".to_string(),
        support: "support@propertypro.test".to_string(),
    }
}

pub(crate) fn policy_library() -> PolicyLibrary {
    PolicyLibrary::from_documents(vec![
        PolicyDocument {
            source: "maintenance.txt".to_string(),
            content: "Emergency maintenance is available 24/7.".to_string(),
        },
        PolicyDocument {
            source: "billing.txt".to_string(),
            content: "Rent is due on the 1st of each month.".to_string(),
        },
    ])
}

/// Replays queued completions in order; an empty queue is an outage.
#[derive(Default)]
pub(crate) struct ScriptedModel {
    replies: Mutex<VecDeque<Result<String, LlmError>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedModel {
    pub(crate) fn new<'a>(replies: impl IntoIterator<Item = &'a str>) -> Self {
        Self::with_results(replies.into_iter().map(|reply| Ok(reply.to_string())).collect())
    }

    pub(crate) fn with_results(replies: Vec<Result<String, LlmError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::default(),
        }
    }

    pub(crate) fn failing() -> Self {
        Self::default()
    }

    pub(crate) fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().expect("requests mutex").clone()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError> {
        self.requests.lock().expect("requests mutex").push(request);
        self.replies
            .lock()
            .expect("replies mutex")
            .pop_front()
            .unwrap_or(Err(LlmError::Api {
                status: 503,
                body: "model unavailable".to_string(),
            }))
    }
}

#[derive(Default)]
pub(crate) struct RecordingMailer {
    sent: Mutex<Vec<OutboundEmail>>,
    reject: bool,
}

impl RecordingMailer {
    pub(crate) fn rejecting() -> Self {
        Self {
            reject: true,
            ..Self::default()
        }
    }

    pub(crate) fn sent(&self) -> Vec<OutboundEmail> {
        self.sent.lock().expect("mailer mutex").clone()
    }
}

#[async_trait]
impl MailTransport for RecordingMailer {
    async fn send(&self, email: OutboundEmail) -> Result<(), MailError> {
        if self.reject {
            return Err(MailError::InvalidAddress {
                address: email.to,
                reason: "relay refused".to_string(),
            });
        }
        self.sent.lock().expect("mailer mutex").push(email);
        Ok(())
    }
}

pub(crate) struct StaticMailbox {
    messages: Mutex<Vec<RawMessage>>,
    reachable: bool,
}

impl StaticMailbox {
    pub(crate) fn new(messages: Vec<RawMessage>) -> Self {
        Self {
            messages: Mutex::new(messages),
            reachable: true,
        }
    }

    pub(crate) fn unreachable() -> Self {
        Self {
            messages: Mutex::default(),
            reachable: false,
        }
    }
}

#[async_trait]
impl Mailbox for StaticMailbox {
    async fn fetch_unseen(&self) -> Result<Vec<RawMessage>, MailboxError> {
        if !self.reachable {
            return Err(MailboxError::NotConfigured);
        }
        Ok(std::mem::take(&mut *self.messages.lock().expect("mailbox mutex")))
    }
}

/// In-process case store handing out `QB-<n>` ids.
#[derive(Default)]
pub(crate) struct StubCases {
    upserts: Mutex<Vec<(CasePayload, Option<String>)>>,
    listed: Mutex<Vec<Vec<PropertyId>>>,
    comments: Mutex<Vec<(String, NewComment)>>,
    unavailable: Mutex<Option<String>>,
}

impl StubCases {
    /// Upserts of `case_id` answer 503 from now on.
    pub(crate) fn fail_upserts_for(&self, case_id: &str) {
        *self.unavailable.lock().expect("cases mutex") = Some(case_id.to_string());
    }

    pub(crate) fn upserts(&self) -> Vec<(CasePayload, Option<String>)> {
        self.upserts.lock().expect("cases mutex").clone()
    }

    pub(crate) fn listed(&self) -> Vec<Vec<PropertyId>> {
        self.listed.lock().expect("cases mutex").clone()
    }

    pub(crate) fn comments(&self) -> Vec<(String, NewComment)> {
        self.comments.lock().expect("cases mutex").clone()
    }
}

pub(crate) fn qube_case(case_id: &str) -> QubeCase {
    QubeCase {
        case_id: case_id.to_string(),
        title: "Leaking tap".to_string(),
        description: "Kitchen tap drips".to_string(),
        status: "open".to_string(),
        priority: "medium".to_string(),
        category: "maintenance".to_string(),
        tenant_id: None,
        property_id: None,
        created_at: None,
        updated_at: None,
        qube_comments: Vec::new(),
    }
}

#[async_trait]
impl CaseGateway for StubCases {
    async fn upsert_case(
        &self,
        payload: &CasePayload,
        existing: Option<&str>,
    ) -> Result<String, QubeError> {
        let unavailable = self.unavailable.lock().expect("cases mutex").clone();
        if existing.is_some() && existing == unavailable.as_deref() {
            return Err(QubeError::Api {
                status: 503,
                body: "qube unavailable".to_string(),
            });
        }
        let mut upserts = self.upserts.lock().expect("cases mutex");
        let case_id = existing
            .map(str::to_string)
            .unwrap_or_else(|| format!("QB-{}", upserts.len() + 1));
        upserts.push((payload.clone(), existing.map(str::to_string)));
        Ok(case_id)
    }

    async fn list_cases(&self, property_ids: &[PropertyId]) -> Result<Vec<QubeCase>, QubeError> {
        self.listed
            .lock()
            .expect("cases mutex")
            .push(property_ids.to_vec());
        Ok(property_ids
            .iter()
            .map(|id| {
                let mut case = qube_case(&format!("QB-P{id}"));
                case.property_id = Some(id.to_string());
                case
            })
            .collect())
    }

    async fn get_case(&self, case_id: &str) -> Result<QubeCase, QubeError> {
        if case_id == "missing" {
            return Err(QubeError::Api {
                status: 404,
                body: "case not found".to_string(),
            });
        }
        Ok(qube_case(case_id))
    }

    async fn add_comment(
        &self,
        case_id: &str,
        comment: &NewComment,
    ) -> Result<Value, QubeError> {
        self.comments
            .lock()
            .expect("cases mutex")
            .push((case_id.to_string(), comment.clone()));
        Ok(serde_json::json!({
            "comment_id": "C-1",
            "case_id": case_id,
            "content": comment.content,
            "author": comment.author,
        }))
    }
}

/// Full API wired to an in-memory database and recording fakes.
pub(crate) struct TestApi {
    pub(crate) store: SqliteStore,
    pub(crate) state: ApiState,
    pub(crate) llm: Arc<ScriptedModel>,
    pub(crate) mailer: Arc<RecordingMailer>,
    pub(crate) cases: Arc<StubCases>,
    tokens: TokenIssuer,
}

impl TestApi {
    pub(crate) async fn new() -> Self {
        Self::with_model(ScriptedModel::failing()).await
    }

    pub(crate) async fn with_model(model: ScriptedModel) -> Self {
        let store = memory_store().await;
        let tokens = TokenIssuer::from_secret("test-secret", 30);
        let llm = Arc::new(model);
        let mailer = Arc::new(RecordingMailer::default());
        let cases = Arc::new(StubCases::default());

        let state = ApiState::new(
            store.clone(),
            tokens.clone(),
            DepartmentRoutes::new(routing_config()),
            WebhookVerifier::new(Some(WEBHOOK_SECRET.to_string())),
            Integrations {
                llm: llm.clone(),
                mailer: mailer.clone(),
                cases: cases.clone(),
                policies: Arc::new(policy_library()),
            },
        );

        Self {
            store,
            state,
            llm,
            mailer,
            cases,
            tokens,
        }
    }

    pub(crate) fn router(&self) -> Router {
        api_router(self.state.clone())
    }

    /// Stores a user and returns it with a bearer token.
    pub(crate) async fn seed_user(&self, role: Role, email: &str) -> (User, String) {
        let user = UserRepository::insert(&self.store, user(role, email))
            .await
            .expect("seed user");
        let token = self.tokens.issue(&user.id).expect("issue token");
        (user, token)
    }
}

pub(crate) fn json_request(
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request builds"),
        None => builder.body(Body::empty()).expect("request builds"),
    }
}

pub(crate) async fn json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1 << 20)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json body")
}
