use std::sync::Arc;

use storage::repository::KeyValueStore;

pub const CLIENT_ID_KEY: &str = "sgxp.client_id";

/// Stable per-installation identifier used to scope quests on the backend.
///
/// This is not a credential; it only keeps one player's Suit Log apart from
/// another's.
#[derive(Clone)]
pub struct ClientIdentity {
    store: Arc<dyn KeyValueStore>,
}

impl ClientIdentity {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Return the stored client id, generating and persisting one on first use.
    ///
    /// When storage cannot be used the returned id is ephemeral.
    pub async fn get_or_create(&self) -> String {
        match self.store.get(CLIENT_ID_KEY).await {
            Ok(Some(existing)) if !existing.trim().is_empty() => return existing,
            Ok(_) => {}
            Err(error) => {
                tracing::warn!(%error, "client id storage unavailable; using an ephemeral id");
                return new_client_id();
            }
        }

        let id = new_client_id();
        if let Err(error) = self.store.set(CLIENT_ID_KEY, &id).await {
            tracing::warn!(%error, "failed to persist client id; it will change next session");
        }
        id
    }
}

fn new_client_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage::repository::{InMemoryStore, UnavailableStore};

    #[tokio::test]
    async fn returns_the_same_id_across_calls() {
        let store = Arc::new(InMemoryStore::new());
        let identity = ClientIdentity::new(store.clone());

        let first = identity.get_or_create().await;
        let second = identity.get_or_create().await;
        assert_eq!(first, second);
        assert_eq!(store.get(CLIENT_ID_KEY).await.unwrap(), Some(first.clone()));

        let reopened = ClientIdentity::new(store);
        assert_eq!(reopened.get_or_create().await, first);
    }

    #[tokio::test]
    async fn replaces_blank_stored_id() {
        let store = Arc::new(InMemoryStore::new());
        store.set(CLIENT_ID_KEY, "   ").await.unwrap();

        let id = ClientIdentity::new(store).get_or_create().await;
        assert!(uuid::Uuid::parse_str(&id).is_ok());
    }

    #[tokio::test]
    async fn unavailable_storage_yields_fresh_ephemeral_ids() {
        let identity = ClientIdentity::new(Arc::new(UnavailableStore));
        let first = identity.get_or_create().await;
        let second = identity.get_or_create().await;
        assert!(!first.is_empty());
        assert_ne!(first, second);
    }
}
