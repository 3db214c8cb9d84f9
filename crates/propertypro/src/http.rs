//! Shared axum state and the assembled API router.

use std::sync::Arc;

use axum::extract::FromRef;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;

use crate::accounts::{self, AccountService, TokenIssuer};
use crate::admin::{self, AdminStatsService};
use crate::assistant::{self, ChatAssistant, LanguageModel};
use crate::db::SqliteStore;
use crate::mail::{self, DepartmentRoutes, EmailResponder, MailTransport};
use crate::policies::PolicySearch;
use crate::properties::{self, PropertyService};
use crate::qube::{self, CaseGateway, QubeSyncService, WebhookVerifier};
use crate::tickets::{self, TicketNotifier, TicketResponder, TicketService};

/// External systems the API talks to.
#[derive(Clone)]
pub struct Integrations {
    pub llm: Arc<dyn LanguageModel>,
    pub mailer: Arc<dyn MailTransport>,
    pub cases: Arc<dyn CaseGateway>,
    pub policies: Arc<dyn PolicySearch>,
}

#[derive(Clone)]
pub struct ApiState {
    pub accounts: Arc<AccountService>,
    pub properties: Arc<PropertyService>,
    pub tickets: Arc<TicketService>,
    pub admin: Arc<AdminStatsService>,
    pub chat: Arc<ChatAssistant>,
    pub email: Arc<EmailResponder>,
    pub qube: Arc<QubeSyncService>,
}

impl ApiState {
    pub fn new(
        store: SqliteStore,
        tokens: TokenIssuer,
        routes: DepartmentRoutes,
        verifier: WebhookVerifier,
        integrations: Integrations,
    ) -> Self {
        let store = Arc::new(store);
        let Integrations {
            llm,
            mailer,
            cases,
            policies,
        } = integrations;

        let tickets = TicketService::new(
            store.clone(),
            store.clone(),
            TicketResponder::new(llm.clone(), policies),
            TicketNotifier::new(store.clone(), store.clone(), mailer.clone()),
        );

        Self {
            accounts: Arc::new(AccountService::new(store.clone(), tokens)),
            properties: Arc::new(PropertyService::new(store.clone())),
            tickets: Arc::new(tickets),
            admin: Arc::new(AdminStatsService::new(
                store.clone(),
                store.clone(),
                store.clone(),
            )),
            chat: Arc::new(ChatAssistant::new(llm.clone())),
            email: Arc::new(EmailResponder::new(llm, routes, mailer)),
            qube: Arc::new(QubeSyncService::new(
                store.clone(),
                store,
                cases,
                verifier,
            )),
        }
    }
}

macro_rules! state_part {
    ($field:ident: $ty:ty) => {
        impl FromRef<ApiState> for Arc<$ty> {
            fn from_ref(state: &ApiState) -> Self {
                state.$field.clone()
            }
        }
    };
}

state_part!(accounts: AccountService);
state_part!(properties: PropertyService);
state_part!(tickets: TicketService);
state_part!(admin: AdminStatsService);
state_part!(chat: ChatAssistant);
state_part!(email: EmailResponder);
state_part!(qube: QubeSyncService);

/// Every business route, with state applied.
pub fn api_router(state: ApiState) -> Router {
    Router::new()
        .route("/", get(welcome))
        .merge(accounts::router())
        .merge(properties::router())
        .merge(tickets::router())
        .merge(admin::router())
        .merge(assistant::router())
        .merge(mail::router())
        .merge(qube::router())
        .with_state(state)
}

async fn welcome() -> Json<serde_json::Value> {
    Json(json!({ "message": "Welcome to PropertyPro API" }))
}
