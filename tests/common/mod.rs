//! Shared harness: runs the full application on an ephemeral port with
//! the in-memory repository and a fake payment processor.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::{Value, json};
use tokio_test::assert_ok;

use horizon_trust::api;
use horizon_trust::api::auth::issue_token;
use horizon_trust::api::signature::{SIGNATURE_HEADER, WebhookVerifier};
use horizon_trust::app_state::AppState;
use horizon_trust::config::ServiceConfig;
use horizon_trust::domain::{Actor, Role, UserId};
use horizon_trust::error::ServiceError;
use horizon_trust::persistence::{CampaignRepository, InMemoryRepository};
use horizon_trust::service::PaymentProcessor;
use horizon_trust::service::payment::{IntentRequest, PaymentIntent};

pub const STORY: &str = "Our community well in Kisumu collapsed during the spring floods. \
    Three hundred families now walk more than two hours each day to reach clean water. \
    We have partnered with a registered local contractor who has already surveyed the site. \
    The budget below covers drilling, a solar pump, and a concrete apron around the well head. \
    Every purchase will be documented with receipts, and we will post photos of each stage.";

pub const WEBHOOK_SECRET: &str = "whsec_integration";

/// Opens intents without leaving the process.
#[derive(Debug, Default)]
pub struct FakeProcessor {
    pub opened: AtomicU32,
}

#[async_trait]
impl PaymentProcessor for FakeProcessor {
    async fn create_payment_intent(
        &self,
        request: &IntentRequest<'_>,
    ) -> Result<PaymentIntent, ServiceError> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        let id = format!("pi_{}", request.idempotency_key.simple());
        Ok(PaymentIntent {
            client_secret: format!("{id}_secret"),
            id,
        })
    }
}

/// A running server plus an HTTP client.
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: reqwest::Client,
    pub payments: Arc<FakeProcessor>,
    secret: String,
}

pub async fn spawn() -> TestServer {
    let config = ServiceConfig {
        jwt_secret: "integration-secret".to_string(),
        stripe_webhook_secret: Some(WEBHOOK_SECRET.to_string()),
        ..ServiceConfig::default()
    };
    let repo: Arc<dyn CampaignRepository> = Arc::new(InMemoryRepository::new());
    let payments = Arc::new(FakeProcessor::default());
    let processor: Arc<dyn PaymentProcessor> = Arc::clone(&payments) as Arc<dyn PaymentProcessor>;
    let state = assert_ok!(AppState::build(&config, repo, processor));
    let app = api::build_app(state, Duration::from_secs(5));

    let listener = assert_ok!(tokio::net::TcpListener::bind("127.0.0.1:0").await);
    let addr = assert_ok!(listener.local_addr());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    TestServer {
        addr,
        client: reqwest::Client::new(),
        payments,
        secret: config.jwt_secret,
    }
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    pub fn ws_url_with_token(&self, token: &str) -> String {
        format!("ws://{}/ws?token={token}", self.addr)
    }

    /// A fresh user with `role` and a token for it.
    pub fn login(&self, role: Role) -> (Actor, String) {
        let actor = Actor::new(UserId::new(), role);
        let token = assert_ok!(issue_token(&self.secret, &actor, chrono::Duration::hours(1)));
        (actor, token)
    }

    pub async fn send(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (u16, Value) {
        let mut request = self.client.request(method, self.url(path));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = assert_ok!(request.send().await);
        let status = response.status().as_u16();
        let body = response.json::<Value>().await.unwrap_or(Value::Null);
        (status, body)
    }

    /// Posts `event` to the payment webhook with `signature` as the raw
    /// `Stripe-Signature` header.
    pub async fn deliver_with_signature(
        &self,
        event: &Value,
        signature: Option<&str>,
    ) -> (u16, Value) {
        let mut request = self
            .client
            .post(self.url("/api/v1/payments/webhook"))
            .header("content-type", "application/json")
            .body(event.to_string());
        if let Some(signature) = signature {
            request = request.header(SIGNATURE_HEADER, signature);
        }
        let response = assert_ok!(request.send().await);
        let status = response.status().as_u16();
        let body = response.json::<Value>().await.unwrap_or(Value::Null);
        (status, body)
    }

    /// Posts `event` to the payment webhook signed with the server's secret.
    pub async fn deliver(&self, event: Value) -> (u16, Value) {
        let signature = WebhookVerifier::new(WEBHOOK_SECRET, 300)
            .sign(chrono::Utc::now().timestamp(), event.to_string().as_bytes());
        self.deliver_with_signature(&event, Some(&signature)).await
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> (u16, Value) {
        self.send(Method::GET, path, token, None).await
    }

    pub async fn post(&self, path: &str, token: Option<&str>, body: Value) -> (u16, Value) {
        self.send(Method::POST, path, token, Some(body)).await
    }

    pub async fn patch(&self, path: &str, token: Option<&str>, body: Value) -> (u16, Value) {
        self.send(Method::PATCH, path, token, Some(body)).await
    }

    /// Creates a complete draft and returns its id.
    pub async fn create_complete_draft(&self, owner_token: &str) -> String {
        let (status, body) = self
            .post("/api/v1/campaigns", Some(owner_token), complete_draft())
            .await;
        assert_eq!(status, 201, "create failed: {body}");
        body["data"]["id"].as_str().map(str::to_string).unwrap_or_default()
    }

    /// Creates and submits a complete campaign; returns its id.
    pub async fn submitted_campaign(&self, owner_token: &str) -> String {
        let id = self.create_complete_draft(owner_token).await;
        let (status, body) = self
            .post(&format!("/api/v1/campaigns/{id}/submit"), Some(owner_token), json!({}))
            .await;
        assert_eq!(status, 200, "submit failed: {body}");
        id
    }

    /// Creates, submits, and approves a campaign; returns its id.
    pub async fn funding_campaign(&self, owner_token: &str) -> String {
        let id = self.submitted_campaign(owner_token).await;
        let (_, reviewer) = self.login(Role::Moderator);
        let (status, body) = self
            .post(&format!("/api/v1/campaigns/{id}/approve"), Some(&reviewer), json!({}))
            .await;
        assert_eq!(status, 200, "approve failed: {body}");
        id
    }
}

pub fn complete_draft() -> Value {
    json!({
        "title": "Rebuild the Kisumu community well",
        "story_markdown": STORY,
        "category": "community",
        "goal_amount": 10_000,
        "currency": "USD",
        "media": [{ "url": "https://cdn.example.org/well.jpg", "kind": "image" }],
        "budget_breakdown": [{ "item": "Drilling", "amount": 10_000 }]
    })
}

pub fn webhook(event_type: &str, intent_id: &str) -> Value {
    json!({
        "id": "evt_test",
        "type": event_type,
        "data": { "object": { "id": intent_id } }
    })
}
