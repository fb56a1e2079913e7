//! Config-gated session login.
//!
//! When login is disabled (the default) the guard middleware passes every
//! request through and `/api/login` simply rejects, mirroring a deployment
//! with no users configured. When enabled, a successful login issues an
//! opaque token kept in an in-memory map and handed to the client as an
//! HttpOnly cookie; sessions do not survive a restart.

use axum::Json;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

use crate::server::error::ApiError;
use crate::server::routes::AppState;

pub const SESSION_COOKIE: &str = "numspool_session";

/// In-memory session registry: token → username.
#[derive(Default)]
pub struct Sessions {
    tokens: RwLock<HashMap<String, String>>,
}

impl Sessions {
    /// Issues a fresh session token for `username`.
    pub fn issue(&self, username: &str) -> String {
        let token = Uuid::new_v4().to_string();
        self.tokens
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(token.clone(), username.to_owned());
        token
    }

    pub fn revoke(&self, token: &str) {
        self.tokens
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .remove(token);
    }

    pub fn contains(&self, token: &str) -> bool {
        self.tokens
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .contains_key(token)
    }
}

/// Middleware guarding the API routes when login is enabled.
pub async fn require_login(
    State(state): State<AppState>,
    jar: CookieJar,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !state.config.login.enabled {
        return Ok(next.run(req).await);
    }

    let authed = jar
        .get(SESSION_COOKIE)
        .is_some_and(|cookie| state.sessions.contains(cookie.value()));
    if authed {
        Ok(next.run(req).await)
    } else {
        Err(ApiError::Unauthorized)
    }
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub code: u16,
    pub message: String,
}

/// POST /api/login
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), ApiError> {
    if !state.config.login.validate(&req.username, &req.password) {
        return Err(ApiError::Unauthorized);
    }

    let token = state.sessions.issue(&req.username);
    tracing::info!(username = %req.username, "login successful");

    let cookie = Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .build();

    Ok((
        jar.add(cookie),
        Json(LoginResponse {
            code: 200,
            message: "login successful".to_owned(),
        }),
    ))
}

/// POST /api/logout
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<LoginResponse>) {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        state.sessions.revoke(cookie.value());
    }

    (
        jar.remove(Cookie::build((SESSION_COOKIE, "")).path("/").build()),
        Json(LoginResponse {
            code: 200,
            message: "logged out".to_owned(),
        }),
    )
}
