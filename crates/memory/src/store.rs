use std::collections::HashMap;

use {async_trait::async_trait, tokio::sync::RwLock, tracing::debug, uuid::Uuid};

use crate::{
    Error, Result,
    record::{Connection, MemoryRecord},
};

/// Persistent storage for memory records and author/room connections.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    async fn get_by_id(&self, id: Uuid) -> Result<Option<MemoryRecord>>;

    /// Insert a new record. Fails with [`Error::Duplicate`] if the id exists.
    async fn create(&self, record: MemoryRecord) -> Result<()>;

    /// Make sure the author is known and joined to the room. Repeated calls
    /// refresh the username and display name.
    async fn ensure_connection(&self, connection: &Connection) -> Result<()>;
}

/// Check-then-create. Returns `true` when the record was written, `false`
/// when a record with the same id was already there.
pub async fn create_if_absent(store: &dyn MemoryStore, record: MemoryRecord) -> Result<bool> {
    if store.get_by_id(record.id).await?.is_some() {
        debug!(memory_id = %record.id, "memory already persisted");
        return Ok(false);
    }
    match store.create(record).await {
        Ok(()) => Ok(true),
        // Lost a race with another writer; the record exists either way.
        Err(Error::Duplicate { .. }) => Ok(false),
        Err(e) => Err(e),
    }
}

/// Process-local store, used by tests and one-shot runs.
#[derive(Default)]
pub struct InMemoryStore {
    records: RwLock<HashMap<Uuid, MemoryRecord>>,
    connections: RwLock<HashMap<(Uuid, Uuid), Connection>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    pub async fn records(&self) -> Vec<MemoryRecord> {
        let mut records: Vec<_> = self.records.read().await.values().cloned().collect();
        records.sort_by_key(|r| r.created_at);
        records
    }

    pub async fn connections(&self) -> Vec<Connection> {
        self.connections.read().await.values().cloned().collect()
    }
}

#[async_trait]
impl MemoryStore for InMemoryStore {
    async fn get_by_id(&self, id: Uuid) -> Result<Option<MemoryRecord>> {
        Ok(self.records.read().await.get(&id).cloned())
    }

    async fn create(&self, record: MemoryRecord) -> Result<()> {
        let mut records = self.records.write().await;
        if records.contains_key(&record.id) {
            return Err(Error::Duplicate { id: record.id });
        }
        records.insert(record.id, record);
        Ok(())
    }

    async fn ensure_connection(&self, connection: &Connection) -> Result<()> {
        self.connections
            .write()
            .await
            .insert((connection.entity_id, connection.room_id), connection.clone());
        Ok(())
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::record::{ChannelType, MemoryContent},
    };

    fn record(id: Uuid, text: &str) -> MemoryRecord {
        MemoryRecord {
            id,
            agent_id: Uuid::nil(),
            entity_id: Uuid::nil(),
            room_id: Uuid::nil(),
            content: MemoryContent {
                text: text.into(),
                source: "twitter".into(),
                ..Default::default()
            },
            created_at: 1_700_000_000_000,
        }
    }

    #[tokio::test]
    async fn create_rejects_duplicates() {
        let store = InMemoryStore::new();
        let id = Uuid::new_v4();
        store.create(record(id, "first")).await.unwrap();
        let err = store.create(record(id, "second")).await.unwrap_err();
        assert!(matches!(err, Error::Duplicate { .. }));
        assert_eq!(store.get_by_id(id).await.unwrap().unwrap().content.text, "first");
    }

    #[tokio::test]
    async fn create_if_absent_is_idempotent() {
        let store = InMemoryStore::new();
        let id = Uuid::new_v4();
        assert!(create_if_absent(&store, record(id, "a")).await.unwrap());
        assert!(!create_if_absent(&store, record(id, "a")).await.unwrap());
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn ensure_connection_upserts() {
        let store = InMemoryStore::new();
        let mut conn = Connection {
            entity_id: Uuid::new_v4(),
            room_id: Uuid::new_v4(),
            username: Some("old".into()),
            name: None,
            source: "twitter".into(),
            channel_type: ChannelType::Group,
        };
        store.ensure_connection(&conn).await.unwrap();
        conn.username = Some("new".into());
        store.ensure_connection(&conn).await.unwrap();

        let conns = store.connections().await;
        assert_eq!(conns.len(), 1);
        assert_eq!(conns[0].username.as_deref(), Some("new"));
    }
}
