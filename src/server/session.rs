//! Cookie sessions
//!
//! Sessions live in process memory, keyed by an opaque UUID carried in the
//! `projectnote_session` cookie. Sessions idle past the configured TTL are
//! dropped, and restarting the server signs everyone out.

use std::collections::HashMap;
use std::convert::Infallible;
use std::time::{Duration, Instant};
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, StatusCode},
    response::{IntoResponse, Response},
};
use tokio::sync::RwLock;
use crate::model::UserProfile;
use super::SharedState;

pub const SESSION_COOKIE: &str = "projectnote_session";

/// Idle lifetime used when none is configured
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(12 * 60 * 60);

#[derive(Debug, Clone)]
struct Session {
    profile: UserProfile,
    last_seen: Instant,
}

#[derive(Debug)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
    ttl: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_TTL)
    }
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Start a session and return its id. Expired sessions are pruned first.
    pub async fn create(&self, profile: UserProfile) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| session.last_seen.elapsed() < self.ttl);
        if sessions.len() < before {
            tracing::debug!(pruned = before - sessions.len(), "Pruned expired sessions");
        }
        sessions.insert(
            id.clone(),
            Session {
                profile,
                last_seen: Instant::now(),
            },
        );
        id
    }

    /// Profile of a live session; refreshes its idle timer
    pub async fn get(&self, id: &str) -> Option<UserProfile> {
        let mut sessions = self.sessions.write().await;
        let session = self.live(&mut sessions, id)?;
        session.last_seen = Instant::now();
        Some(session.profile.clone())
    }

    /// Replace the profile of a live session
    pub async fn update(&self, id: &str, profile: UserProfile) -> bool {
        let mut sessions = self.sessions.write().await;
        match self.live(&mut sessions, id) {
            Some(session) => {
                session.profile = profile;
                session.last_seen = Instant::now();
                true
            }
            None => false,
        }
    }

    pub async fn remove(&self, id: &str) -> Option<UserProfile> {
        self.sessions.write().await.remove(id).map(|session| session.profile)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    fn live<'a>(&self, sessions: &'a mut HashMap<String, Session>, id: &str) -> Option<&'a mut Session> {
        let expired = sessions.get(id)?.last_seen.elapsed() >= self.ttl;
        if expired {
            sessions.remove(id);
            tracing::debug!("Session expired");
            return None;
        }
        sessions.get_mut(id)
    }
}

/// Session id from the request's `Cookie` headers
pub fn session_id(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}

pub fn session_cookie(id: &str) -> String {
    format!("{SESSION_COOKIE}={id}; Path=/; HttpOnly; SameSite=Lax")
}

pub fn expired_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax")
}

/// 302 to `location`
pub fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

/// 302 to the login page, remembering where the caller was headed
pub fn login_redirect(parts: &Parts) -> Response {
    let next = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    found(&format!("/login?next={}", urlencoding::encode(next)))
}

/// Signed-in caller. Anonymous requests are redirected to the login page.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub session_id: String,
    pub profile: UserProfile,
}

impl FromRequestParts<SharedState> for CurrentUser {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &SharedState) -> Result<Self, Self::Rejection> {
        match MaybeUser::from_request_parts(parts, state).await {
            Ok(MaybeUser(Some(user))) => Ok(user),
            _ => {
                tracing::debug!(path = %parts.uri.path(), "Anonymous request to protected route");
                Err(login_redirect(parts))
            }
        }
    }
}

/// Caller who may or may not be signed in
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<CurrentUser>);

impl FromRequestParts<SharedState> for MaybeUser {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &SharedState) -> Result<Self, Self::Rejection> {
        let Some(id) = session_id(parts) else {
            return Ok(MaybeUser(None));
        };
        let user = state.sessions.get(&id).await.map(|profile| CurrentUser {
            session_id: id,
            profile,
        });
        Ok(MaybeUser(user))
    }
}
