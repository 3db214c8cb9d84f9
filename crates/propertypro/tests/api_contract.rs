mod common;

use axum::http::{Method, StatusCode};
use common::{Harness, CHAT_REPLY, LEGAL_MAILBOX};
use serde_json::json;

fn flat() -> serde_json::Value {
    json!({
        "address": "4 Mill Lane",
        "property_type": "apartment",
        "size": 720.0,
        "bedrooms": 2,
        "bathrooms": 1,
        "rent_amount": 1450.0
    })
}

#[tokio::test]
async fn welcome_route_is_public() {
    let harness = Harness::start().await;
    let (status, body) = harness.send(Method::GET, "/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Welcome to PropertyPro API");
}

#[tokio::test]
async fn registration_login_and_profile() {
    let harness = Harness::start().await;
    let payload = json!({
        "email": "dana@example.com",
        "password": "correct horse",
        "full_name": "Dana Reyes"
    });

    let (status, body) = harness
        .send(Method::POST, "/register", None, Some(payload.clone()))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["email"], "dana@example.com");
    assert_eq!(body["role"], "tenant");
    assert!(body.get("hashed_password").is_none());

    let (status, body) = harness
        .send(Method::POST, "/register", None, Some(payload))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Email already registered");

    let (status, body) = harness
        .send(
            Method::POST,
            "/login",
            None,
            Some(json!({ "email": "dana@example.com", "password": "wrong" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Incorrect email or password");

    let (status, body) = harness
        .send(
            Method::POST,
            "/login",
            None,
            Some(json!({ "email": "dana@example.com", "password": "correct horse" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "bearer");
    let token = body["access_token"].as_str().expect("token").to_string();

    let (status, body) = harness
        .send(Method::GET, "/users/me", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["full_name"], "Dana Reyes");

    let (status, _) = harness
        .send(Method::GET, "/users/me", Some("not-a-jwt"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn property_catalogue_is_managed_by_admins() {
    let harness = Harness::start().await;
    let admin = harness.sign_up("admin@example.com", "admin").await;
    let tenant = harness.sign_up("tenant@example.com", "tenant").await;

    let (status, body) = harness
        .send(Method::POST, "/properties", Some(&tenant), Some(flat()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Not authorized to create properties");

    let (status, created) = harness
        .send(Method::POST, "/properties", Some(&admin), Some(flat()))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], "available");
    harness
        .send(Method::POST, "/properties", Some(&admin), Some(flat()))
        .await;

    let (status, page) = harness
        .send(Method::GET, "/properties?skip=1&limit=1", Some(&tenant), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page.as_array().map(Vec::len), Some(1));
    assert_ne!(page[0]["id"], created["id"]);

    let uri = format!("/properties/{}", created["id"]);
    let (status, updated) = harness
        .send(
            Method::PATCH,
            &uri,
            Some(&admin),
            Some(json!({ "status": "rented", "rent_amount": 1500.0 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "rented");
    assert_eq!(updated["rent_amount"], 1500.0);

    let (status, body) = harness
        .send(Method::GET, "/properties/999", Some(&tenant), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Property 999 not found");
}

#[tokio::test]
async fn ticket_reply_is_drafted_by_the_model() {
    let harness = Harness::start().await;
    let tenant = harness.sign_up("tenant@example.com", "tenant").await;

    let (status, ticket) = harness
        .send(
            Method::POST,
            "/tickets",
            Some(&tenant),
            Some(json!({
                "title": "No hot water",
                "description": "Emergency: the boiler stopped overnight",
                "priority": "high"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(ticket["ai_response"], CHAT_REPLY);

    let requests = harness.openai.requests();
    let (authorization, body) = &requests[0];
    assert_eq!(authorization.as_deref(), Some("Bearer sk-test"));
    assert_eq!(body["model"], "gpt-test");
    assert_eq!(body["max_tokens"], 200);
    assert!(body["messages"][1]["content"]
        .as_str()
        .is_some_and(|prompt| prompt.contains("Emergency maintenance is available 24/7.")));

    let (status, listed) = harness
        .send(Method::GET, "/tickets", Some(&tenant), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed[0]["id"], ticket["id"]);

    let sent = harness.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "tenant@example.com");
}

#[tokio::test]
async fn legal_mail_is_answered_and_escalated() {
    let harness = Harness::start().await;
    let admin = harness.sign_up("admin@example.com", "admin").await;
    let tenant = harness.sign_up("tenant@example.com", "tenant").await;
    let email = json!({
        "sender_email": "Renter@Example.com",
        "subject": "Notice to quit",
        "content": "I received an eviction notice and want to dispute it."
    });

    let (status, _) = harness
        .send(
            Method::POST,
            "/api/email/respond",
            Some(&tenant),
            Some(email.clone()),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, reply) = harness
        .send(Method::POST, "/api/email/respond", Some(&admin), Some(email))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply["response"], CHAT_REPLY);
    assert_eq!(reply["category"]["category"], "legal");
    assert_eq!(reply["category"]["department"], "Legal");
    assert_eq!(reply["escalated"], true);

    let sent = harness.mailer.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].to, LEGAL_MAILBOX);
    assert_eq!(sent[0].subject, "Escalated: Notice to quit");
    assert_eq!(sent[1].to, "renter@example.com");
    assert_eq!(sent[1].subject, "Re: Notice to quit");
}

#[tokio::test]
async fn chat_is_open_to_anonymous_visitors() {
    let harness = Harness::start().await;

    let (status, body) = harness
        .send(
            Method::POST,
            "/api/chat",
            None,
            Some(json!({ "message": "Do you allow pets?" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"], CHAT_REPLY);
    let requests = harness.openai.requests();
    let request = &requests[0].1;
    assert_eq!(request["max_tokens"], 150);
    assert!(request["messages"][1]["content"]
        .as_str()
        .is_some_and(|prompt| prompt.contains("tenant services: Do you allow pets?")));
}

#[tokio::test]
async fn qube_calls_without_credentials_surface_as_server_errors() {
    let harness = Harness::start().await;
    let token = harness.sign_up("tenant@example.com", "tenant").await;

    let (status, body) = harness
        .send(Method::GET, "/api/qube/cases/QB-1", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"]
        .as_str()
        .is_some_and(|message| message.contains("QUBE_CLIENT_ID")));
}
