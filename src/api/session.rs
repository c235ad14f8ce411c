//! Server-side session handling.
//!
//! The session cookie carries only an opaque id; the identity lives in the
//! configured session store.

use axum::{extract::FromRequestParts, http::request::Parts};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::task::JoinHandle;
use tower_sessions::{
    Expiry, ExpiredDeletion, MemoryStore, Session, SessionManagerLayer, SessionStore,
    cookie::SameSite,
};
use tower_sessions_sqlx_store::SqliteStore;
use tracing::{debug, warn};

use super::ApiError;
use crate::config::{ServerConfig, SessionStoreKind};
use crate::db::Store;

const IDENTITY_KEY: &str = "identity";

const EXPIRY_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// What a live session knows about its user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionIdentity {
    pub user_id: String,
    pub username: String,
}

/// Binds the identity to the session under a fresh id.
pub async fn establish(session: &Session, identity: &SessionIdentity) -> Result<(), ApiError> {
    session
        .cycle_id()
        .await
        .map_err(|e| ApiError::internal(format!("Failed to rotate session: {e}")))?;

    session
        .insert(IDENTITY_KEY, identity)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))
}

pub async fn current(session: &Session) -> Result<Option<SessionIdentity>, ApiError> {
    session
        .get::<SessionIdentity>(IDENTITY_KEY)
        .await
        .map_err(|e| ApiError::internal(format!("Session error: {e}")))
}

/// Drops all session state. Harmless when nothing was stored.
pub async fn invalidate(session: &Session) -> Result<(), ApiError> {
    session
        .flush()
        .await
        .map_err(|e| ApiError::internal(format!("Failed to end session: {e}")))
}

/// Extractor for handlers that require a logged-in user.
#[derive(Debug, Clone)]
pub struct AuthUser(pub SessionIdentity);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|(_, msg)| ApiError::internal(msg))?;

        let identity = current(&session)
            .await?
            .ok_or_else(ApiError::unauthenticated)?;

        tracing::Span::current().record("user_id", identity.user_id.as_str());

        Ok(Self(identity))
    }
}

#[derive(Clone)]
pub enum SessionBackend {
    Memory(MemoryStore),
    Database(SqliteStore),
}

impl SessionBackend {
    pub async fn from_config(kind: SessionStoreKind, store: &Store) -> anyhow::Result<Self> {
        match kind {
            SessionStoreKind::Memory => Ok(Self::Memory(MemoryStore::default())),
            SessionStoreKind::Database => {
                let pool = store.conn.get_sqlite_connection_pool().clone();
                let session_store = SqliteStore::new(pool);
                session_store
                    .migrate()
                    .await
                    .map_err(|e| anyhow::anyhow!("Failed to prepare session table: {e}"))?;
                Ok(Self::Database(session_store))
            }
        }
    }

    /// Periodically removes expired rows from the database store.
    ///
    /// `MemoryStore` has no expired-entry deletion, so the memory backend
    /// gets no sweeper and keeps expired sessions until logout or restart.
    #[must_use]
    pub fn spawn_expiry_sweeper(&self) -> Option<JoinHandle<()>> {
        let Self::Database(store) = self else {
            return None;
        };
        let store = store.clone();

        Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(EXPIRY_SWEEP_INTERVAL);
            loop {
                interval.tick().await;
                match store.delete_expired().await {
                    Ok(()) => debug!("Expired sessions swept"),
                    Err(e) => warn!("Failed to sweep expired sessions: {e}"),
                }
            }
        }))
    }
}

pub fn with_session_layer<S>(store: S, config: &ServerConfig) -> SessionManagerLayer<S>
where
    S: SessionStore + Clone,
{
    SessionManagerLayer::new(store)
        .with_secure(config.secure_cookies)
        .with_http_only(true)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(
            config.session_inactivity_minutes,
        )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn identity() -> SessionIdentity {
        SessionIdentity {
            user_id: "user-1".to_string(),
            username: "alice".to_string(),
        }
    }

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    #[tokio::test]
    async fn test_establish_then_current() {
        let session = session();
        assert!(current(&session).await.unwrap().is_none());

        establish(&session, &identity()).await.unwrap();
        assert_eq!(current(&session).await.unwrap(), Some(identity()));
    }

    #[tokio::test]
    async fn test_invalidate_clears_identity() {
        let session = session();
        establish(&session, &identity()).await.unwrap();

        invalidate(&session).await.unwrap();
        assert!(current(&session).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_invalidate_without_identity_is_ok() {
        let session = session();
        assert!(invalidate(&session).await.is_ok());
    }

    async fn temp_store() -> Store {
        let path = std::env::temp_dir().join(format!("sharex-session-{}.db", uuid::Uuid::new_v4()));
        Store::new(&format!("sqlite://{}", path.display()))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_memory_backend_has_no_sweeper() {
        let backend = SessionBackend::Memory(MemoryStore::default());
        assert!(backend.spawn_expiry_sweeper().is_none());
    }

    #[tokio::test]
    async fn test_default_backend_is_swept() {
        let store = temp_store().await;
        let kind = crate::config::Config::default().server.session_store;

        let backend = SessionBackend::from_config(kind, &store).await.unwrap();
        assert!(matches!(backend, SessionBackend::Database(_)));

        let sweeper = backend.spawn_expiry_sweeper().expect("sweeper task");
        sweeper.abort();
    }

    #[tokio::test]
    async fn test_database_sweep_removes_expired_sessions() {
        let store = temp_store().await;
        let SessionBackend::Database(sessions) =
            SessionBackend::from_config(SessionStoreKind::Database, &store)
                .await
                .unwrap()
        else {
            panic!("expected database backend");
        };

        let session = Session::new(
            None,
            Arc::new(sessions.clone()),
            Some(Expiry::AtDateTime(
                time::OffsetDateTime::now_utc() - time::Duration::minutes(1),
            )),
        );
        establish(&session, &identity()).await.unwrap();
        session.save().await.unwrap();
        let id = session.id().expect("saved session has an id");

        sessions.delete_expired().await.unwrap();
        assert!(sessions.load(&id).await.unwrap().is_none());

        let rows = sea_orm::ConnectionTrait::query_one(
            &store.conn,
            sea_orm::Statement::from_string(
                sea_orm::DatabaseBackend::Sqlite,
                "SELECT COUNT(*) AS n FROM tower_sessions".to_string(),
            ),
        )
        .await
        .unwrap()
        .unwrap()
        .try_get::<i64>("", "n")
        .unwrap();
        assert_eq!(rows, 0);
    }
}
