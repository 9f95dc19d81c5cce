#![allow(dead_code)]

use axum::body::Body;
use axum::http::Request;
use axum::routing::RouterIntoService;
use chrono::NaiveDate;
use ed25519_dalek::SigningKey;
use ed25519_dalek::pkcs8::EncodePrivateKey;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use progress_api::app::{AppState, build_bootstrap_router, build_router};
use progress_api::model::{
    DueDate, Indicator, NewDueDate, NewIndicator, NewProgressReport, NewUser, ProgressReport,
    User,
};
use progress_api::store::ProgressStore;
use progress_api::store::memory::InMemoryStore;
use progress_authz::{ActorClaims, ActorTokenVerifier, Role, VerificationKey};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

pub const SIGNING_SEED: [u8; 32] = [11u8; 32];
pub const KID: &str = "idp-current";
pub const ISSUER: &str = "progress-idp";
pub const AUDIENCE: &str = "progress-api";
pub const BOOTSTRAP_TOKEN: &str = "bootstrap-secret";

pub async fn read_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}

pub fn json_request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: serde_json::Value,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).expect("request")
}

pub fn empty_request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::empty()).expect("request")
}

pub fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_secs() as i64
}

pub fn claims_for(sub: &str) -> ActorClaims {
    ActorClaims {
        iss: ISSUER.to_string(),
        aud: AUDIENCE.to_string(),
        sub: sub.to_string(),
        exp: now() + 600,
        iat: now(),
        jti: None,
    }
}

pub fn mint_with(seed: [u8; 32], claims: &ActorClaims) -> String {
    let der = SigningKey::from_bytes(&seed).to_pkcs8_der().expect("pkcs8");
    let mut header = Header::new(Algorithm::EdDSA);
    header.kid = Some(KID.to_string());
    jsonwebtoken::encode(&header, claims, &EncodingKey::from_ed_der(der.as_bytes()))
        .expect("encode")
}

pub fn token_for(user: &User) -> String {
    mint_with(SIGNING_SEED, &claims_for(&user.id.to_string()))
}

pub fn verifier() -> ActorTokenVerifier {
    let public = SigningKey::from_bytes(&SIGNING_SEED)
        .verifying_key()
        .to_bytes();
    let key = VerificationKey::from_bytes(KID, public).expect("key");
    ActorTokenVerifier::new(ISSUER, AUDIENCE, 0, vec![key])
}

pub fn state(store: Arc<InMemoryStore>, bootstrap_enabled: bool) -> AppState {
    let store: Arc<dyn ProgressStore> = store;
    AppState {
        store,
        verifier: verifier(),
        bootstrap_enabled,
        bootstrap_token: bootstrap_enabled.then(|| BOOTSTRAP_TOKEN.to_string()),
    }
}

/// A populated registry: one user per role plus a second contributor, an
/// indicator managed by each contributor, and a due date.
pub struct Fixture {
    pub store: Arc<InMemoryStore>,
    pub manager: User,
    pub contributor: User,
    pub other_contributor: User,
    pub guest: User,
    pub owned: Indicator,
    pub foreign: Indicator,
    pub due_date: DueDate,
}

async fn user(store: &InMemoryStore, email: &str, role: Role) -> User {
    store
        .create_user(NewUser {
            email: email.to_string(),
            name: email.split('@').next().unwrap_or(email).to_string(),
            role,
        })
        .await
        .expect("user")
}

pub async fn fixture() -> Fixture {
    let store = Arc::new(InMemoryStore::new());
    let manager = user(&store, "manager@example.org", Role::Manager).await;
    let contributor = user(&store, "contributor@example.org", Role::Contributor).await;
    let other_contributor = user(&store, "other@example.org", Role::Contributor).await;
    let guest = user(&store, "guest@example.org", Role::Guest).await;
    let owned = store
        .create_indicator(NewIndicator {
            title: "Owned indicator".to_string(),
            manager_id: contributor.id,
        })
        .await
        .expect("owned indicator");
    let foreign = store
        .create_indicator(NewIndicator {
            title: "Foreign indicator".to_string(),
            manager_id: other_contributor.id,
        })
        .await
        .expect("foreign indicator");
    let due_date = store
        .create_due_date(NewDueDate {
            due_date: NaiveDate::from_ymd_opt(2026, 12, 31).expect("date"),
            indicator_id: Some(owned.id),
        })
        .await
        .expect("due date");
    Fixture {
        store,
        manager,
        contributor,
        other_contributor,
        guest,
        owned,
        foreign,
        due_date,
    }
}

impl Fixture {
    pub fn app(&self) -> RouterIntoService<Body, ()> {
        build_router(state(self.store.clone(), false)).into_service()
    }

    pub fn bootstrap_app(&self, enabled: bool) -> RouterIntoService<Body, ()> {
        build_bootstrap_router(state(self.store.clone(), enabled)).into_service()
    }

    /// Store a report directly, bypassing the HTTP layer.
    pub async fn report(&self, indicator: &Indicator, draft: bool) -> ProgressReport {
        self.report_by(&self.manager, indicator, draft).await
    }

    /// Store a report last written by `author`.
    pub async fn report_by(
        &self,
        author: &User,
        indicator: &Indicator,
        draft: bool,
    ) -> ProgressReport {
        self.store
            .create_progress_report(NewProgressReport {
                indicator_id: Some(indicator.id),
                due_date_id: Some(self.due_date.id),
                title: Some(format!("{} report", indicator.title)),
                draft: Some(draft),
                ..NewProgressReport::stamped(author.id)
            })
            .await
            .expect("report")
    }

    pub fn create_body(&self, indicator: &Indicator) -> serde_json::Value {
        serde_json::json!({
            "progress_report": {
                "indicator_id": indicator.id.get(),
                "due_date_id": self.due_date.id.get(),
                "title": "Quarterly update",
                "draft": true
            }
        })
    }
}
