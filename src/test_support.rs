use axum::{
    body::Body,
    extract::FromRef,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use crate::{
    app::build_app,
    auth::{jwt::JwtKeys, password::Password},
    state::AppState,
    users::repo_types::{NewUser, Role, User},
};

pub struct TestApp {
    pub state: AppState,
    pub router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        let state = AppState::fake();
        let router = build_app(state.clone());
        Self { state, router }
    }

    pub fn keys(&self) -> JwtKeys {
        JwtKeys::from_ref(&self.state)
    }
}

/// Inserts a user directly, the only way to get an admin.
pub async fn seed_user(state: &AppState, name: &str, email: &str, password: &str, role: Role) -> User {
    state
        .users
        .create(NewUser {
            user_name: name.into(),
            email: email.into(),
            password_hash: Password::parse(password).expect("policy").hash().await.expect("hash"),
            role,
        })
        .await
        .expect("seed user")
}

/// Sends one request through the router. Non-JSON bodies come back as strings.
pub async fn call(
    router: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let req = match body {
        Some(json) => req
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string())),
        None => req.body(Body::empty()),
    }
    .expect("request");

    let res = router.clone().oneshot(req).await.expect("infallible");
    let status = res.status();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .expect("body");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, value)
}
