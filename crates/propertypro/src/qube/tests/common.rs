use serde_json::json;

use crate::accounts::{Role, User};
use crate::qube::WebhookVerifier;
use crate::testing::{TestApi, WEBHOOK_SECRET};
use crate::tickets::{NewTicket, Ticket, TicketPriority};

pub(super) async fn tenant_ticket(api: &TestApi) -> (User, Ticket) {
    let (tenant, _) = api.seed_user(Role::Tenant, "tess@example.com").await;
    let ticket = api
        .state
        .tickets
        .create(
            &tenant,
            NewTicket {
                title: "Leaking tap".to_string(),
                description: "Kitchen tap drips all night".to_string(),
                category: "maintenance".to_string(),
                priority: TicketPriority::Medium,
                property_id: None,
            },
        )
        .await
        .expect("ticket created");
    (tenant, ticket)
}

pub(super) fn case_updated(case_id: &str, status: &str) -> Vec<u8> {
    json!({
        "event_type": "case.updated",
        "case": { "case_id": case_id, "status": status }
    })
    .to_string()
    .into_bytes()
}

pub(super) fn signed(body: &[u8]) -> String {
    WebhookVerifier::sign(WEBHOOK_SECRET, body)
}
