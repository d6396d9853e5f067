//! Login / register against the auth endpoints, with the session kept in
//! an injected store

use crate::api::http::{Envelope, HttpClient};
use crate::config::MarketConfig;
use crate::error::{MarketError, Result};
use crate::storage::{KeyValueStore, StorageKey};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuthUser {
    pub id: serde_json::Value,
    pub name: Option<String>,
    pub email: String,
    pub role: Option<String>,
    pub is_premium: bool,
}

/// `{ user, token }` as returned by login and register
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSession {
    pub user: AuthUser,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub struct RegisterRequest<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

pub struct AuthClient {
    http: HttpClient,
    store: Arc<dyn KeyValueStore>,
}

impl AuthClient {
    pub fn new(config: &MarketConfig, store: Arc<dyn KeyValueStore>) -> Result<Self> {
        Ok(Self {
            http: HttpClient::new(
                &config.api_base,
                config.request_timeout,
                config.requests_per_minute,
            )?,
            store,
        })
    }

    /// `POST /auth/login`; persists the session on success
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession> {
        let (email, password) = credentials(email, password)?;
        let session = self
            .authenticate("auth/login", &LoginRequest { email, password })
            .await?;
        tracing::info!(email, "logged in");
        Ok(session)
    }

    /// `POST /auth/register`; persists the session on success
    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<AuthSession> {
        let (email, password) = credentials(email, password)?;
        let name = name.trim();
        let session = self
            .authenticate(
                "auth/register",
                &RegisterRequest {
                    name,
                    email,
                    password,
                },
            )
            .await?;
        tracing::info!(email, "registered");
        Ok(session)
    }

    async fn authenticate<B: Serialize>(&self, path: &str, body: &B) -> Result<AuthSession> {
        let session: Envelope<AuthSession> =
            self.http.post_json(path, body).await.map_err(|e| match e {
                MarketError::ApiError { status: 400 | 401 | 403 | 409 | 422, message } => {
                    MarketError::AuthError(message)
                }
                other => other,
            })?;
        let session = session.into_inner();
        if session.token.trim().is_empty() {
            return Err(MarketError::AuthError("server returned an empty token".to_string()));
        }
        persist_session(self.store.as_ref(), &session)?;
        Ok(session)
    }

    pub fn logout(&self) -> Result<()> {
        clear_session(self.store.as_ref())
    }

    pub fn current_session(&self) -> Option<AuthSession> {
        load_session(self.store.as_ref())
    }

    pub fn is_authenticated(&self) -> bool {
        self.current_session().is_some()
    }
}

fn credentials<'a>(email: &'a str, password: &'a str) -> Result<(&'a str, &'a str)> {
    let email = email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(MarketError::InvalidInput(format!("invalid email: {email:?}")));
    }
    if password.is_empty() {
        return Err(MarketError::InvalidInput("password is empty".to_string()));
    }
    Ok((email, password))
}

pub fn persist_session(store: &dyn KeyValueStore, session: &AuthSession) -> Result<()> {
    store.set(StorageKey::AuthToken, &session.token)?;
    store.set(StorageKey::AuthUser, &serde_json::to_string(&session.user)?)?;
    Ok(())
}

pub fn clear_session(store: &dyn KeyValueStore) -> Result<()> {
    store.clear(StorageKey::AuthToken)?;
    store.clear(StorageKey::AuthUser)?;
    Ok(())
}

/// Session from the store; missing token or an unreadable user blob means
/// signed out
pub fn load_session(store: &dyn KeyValueStore) -> Option<AuthSession> {
    let token = store.get(StorageKey::AuthToken).filter(|t| !t.is_empty())?;
    let user = store.get(StorageKey::AuthUser)?;
    match serde_json::from_str(&user) {
        Ok(user) => Some(AuthSession { user, token }),
        Err(e) => {
            tracing::warn!("stored user is unreadable, treating as signed out: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use serde_json::json;

    fn session() -> AuthSession {
        AuthSession {
            user: AuthUser {
                id: json!(12),
                name: Some("Lan".to_string()),
                email: "lan@example.vn".to_string(),
                role: None,
                is_premium: true,
            },
            token: "jwt-token".to_string(),
        }
    }

    #[test]
    fn test_session_round_trip_through_store() {
        let store = MemoryStore::new();
        assert_eq!(load_session(&store), None);

        persist_session(&store, &session()).unwrap();
        assert_eq!(load_session(&store), Some(session()));

        clear_session(&store).unwrap();
        assert_eq!(load_session(&store), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_corrupt_user_means_signed_out() {
        let store = MemoryStore::new();
        store.set(StorageKey::AuthToken, "t").unwrap();
        store.set(StorageKey::AuthUser, "{oops").unwrap();
        assert_eq!(load_session(&store), None);
    }

    #[test]
    fn test_login_response_shapes() {
        let bare = json!({"user": {"id": "u1", "email": "a@b.vn"}, "token": "x"});
        let wrapped = json!({"data": bare.clone()});
        for body in [bare, wrapped] {
            let session: Envelope<AuthSession> = serde_json::from_value(body).unwrap();
            let session = session.into_inner();
            assert_eq!(session.token, "x");
            assert_eq!(session.user.email, "a@b.vn");
            assert!(!session.user.is_premium);
        }
    }

    #[test]
    fn test_credentials_validation() {
        assert!(credentials("  a@b.vn ", "pw").is_ok());
        assert!(credentials("nobody", "pw").is_err());
        assert!(credentials("a@b.vn", "").is_err());
    }

    #[tokio::test]
    async fn test_invalid_credentials_never_hit_the_network() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let client = AuthClient::new(&MarketConfig::default(), store).unwrap();
        let err = client.login("", "pw").await.unwrap_err();
        assert!(matches!(err, MarketError::InvalidInput(_)));
        assert!(!client.is_authenticated());
    }
}
