/// SQLite implementation of the `MemoryStore` trait.
use {async_trait::async_trait, sqlx::SqlitePool, uuid::Uuid};

use crate::{
    Error, Result,
    error::Context,
    record::{Connection, MemoryContent, MemoryRecord},
    store::MemoryStore,
};

pub struct SqliteMemoryStore {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct MemoryRow {
    id: String,
    agent_id: String,
    entity_id: String,
    room_id: String,
    content: String,
    created_at: i64,
}

impl TryFrom<MemoryRow> for MemoryRecord {
    type Error = Error;

    fn try_from(row: MemoryRow) -> Result<Self> {
        Ok(Self {
            id: parse_uuid(&row.id)?,
            agent_id: parse_uuid(&row.agent_id)?,
            entity_id: parse_uuid(&row.entity_id)?,
            room_id: parse_uuid(&row.room_id)?,
            content: serde_json::from_str::<MemoryContent>(&row.content)?,
            created_at: row.created_at,
        })
    }
}

fn parse_uuid(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).with_context(|| format!("invalid uuid in memories table: {raw}"))
}

impl SqliteMemoryStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if needed) the database at `path` and initialize the
    /// schema.
    pub async fn open(path: &std::path::Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create {}", parent.display()))?;
        }
        let url = format!("sqlite:{}?mode=rwc", path.display());
        let pool = SqlitePool::connect(&url).await?;
        Self::init(&pool).await?;
        Ok(Self::new(pool))
    }

    /// Create the `memories` and `connections` tables.
    pub async fn init(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS memories (
                id         TEXT    PRIMARY KEY,
                agent_id   TEXT    NOT NULL,
                entity_id  TEXT    NOT NULL,
                room_id    TEXT    NOT NULL,
                content    TEXT    NOT NULL,
                created_at INTEGER NOT NULL
            )",
        )
        .execute(pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_memories_room_created
             ON memories (room_id, created_at)",
        )
        .execute(pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS connections (
                entity_id    TEXT NOT NULL,
                room_id      TEXT NOT NULL,
                username     TEXT,
                name         TEXT,
                source       TEXT NOT NULL,
                channel_type TEXT NOT NULL,
                PRIMARY KEY (entity_id, room_id)
            )",
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Most recent records first.
    pub async fn list_recent(&self, limit: u32) -> Result<Vec<MemoryRecord>> {
        let rows = sqlx::query_as::<_, MemoryRow>(
            "SELECT id, agent_id, entity_id, room_id, content, created_at
             FROM memories
             ORDER BY created_at DESC
             LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(MemoryRecord::try_from).collect()
    }

    /// Records of one conversation, oldest first.
    pub async fn list_by_room(&self, room_id: Uuid) -> Result<Vec<MemoryRecord>> {
        let rows = sqlx::query_as::<_, MemoryRow>(
            "SELECT id, agent_id, entity_id, room_id, content, created_at
             FROM memories
             WHERE room_id = ?
             ORDER BY created_at ASC",
        )
        .bind(room_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(MemoryRecord::try_from).collect()
    }
}

#[async_trait]
impl MemoryStore for SqliteMemoryStore {
    async fn get_by_id(&self, id: Uuid) -> Result<Option<MemoryRecord>> {
        let row = sqlx::query_as::<_, MemoryRow>(
            "SELECT id, agent_id, entity_id, room_id, content, created_at
             FROM memories WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(MemoryRecord::try_from).transpose()
    }

    async fn create(&self, record: MemoryRecord) -> Result<()> {
        let content = serde_json::to_string(&record.content)?;
        let result = sqlx::query(
            "INSERT OR IGNORE INTO memories
             (id, agent_id, entity_id, room_id, content, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(record.id.to_string())
        .bind(record.agent_id.to_string())
        .bind(record.entity_id.to_string())
        .bind(record.room_id.to_string())
        .bind(content)
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::Duplicate { id: record.id });
        }
        Ok(())
    }

    async fn ensure_connection(&self, connection: &Connection) -> Result<()> {
        sqlx::query(
            "INSERT INTO connections
             (entity_id, room_id, username, name, source, channel_type)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT (entity_id, room_id) DO UPDATE SET
                username = excluded.username,
                name     = excluded.name",
        )
        .bind(connection.entity_id.to_string())
        .bind(connection.room_id.to_string())
        .bind(&connection.username)
        .bind(&connection.name)
        .bind(&connection.source)
        .bind(connection.channel_type.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{record::ChannelType, store::create_if_absent},
    };

    async fn test_store() -> SqliteMemoryStore {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        SqliteMemoryStore::init(&pool).await.unwrap();
        SqliteMemoryStore::new(pool)
    }

    fn sample(room_id: Uuid, created_at: i64) -> MemoryRecord {
        MemoryRecord {
            id: Uuid::new_v4(),
            agent_id: Uuid::nil(),
            entity_id: Uuid::new_v4(),
            room_id,
            content: MemoryContent {
                text: "hello".into(),
                source: "twitter".into(),
                url: Some("https://twitter.com/bot/status/1".into()),
                image_urls: vec!["https://pbs.example/img.png".into()],
                in_reply_to: Some(Uuid::new_v4()),
                post_id: Some("1".into()),
            },
            created_at,
        }
    }

    #[tokio::test]
    async fn create_and_get_roundtrips_content() {
        let store = test_store().await;
        let record = sample(Uuid::new_v4(), 1_700_000_000_000);
        store.create(record.clone()).await.unwrap();

        let loaded = store.get_by_id(record.id).await.unwrap().unwrap();
        assert_eq!(loaded, record);
        assert!(store.get_by_id(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_create_is_reported() {
        let store = test_store().await;
        let record = sample(Uuid::new_v4(), 1);
        store.create(record.clone()).await.unwrap();
        let err = store.create(record.clone()).await.unwrap_err();
        assert!(matches!(err, Error::Duplicate { id } if id == record.id));
        assert!(!create_if_absent(&store, record).await.unwrap());
    }

    #[tokio::test]
    async fn lists_by_room_in_order() {
        let store = test_store().await;
        let room = Uuid::new_v4();
        for ts in [30, 10, 20] {
            store.create(sample(room, ts)).await.unwrap();
        }
        store.create(sample(Uuid::new_v4(), 5)).await.unwrap();

        let in_room = store.list_by_room(room).await.unwrap();
        let stamps: Vec<i64> = in_room.iter().map(|r| r.created_at).collect();
        assert_eq!(stamps, vec![10, 20, 30]);

        let recent = store.list_recent(2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].created_at, 30);
    }

    #[tokio::test]
    async fn ensure_connection_updates_names() {
        let store = test_store().await;
        let mut conn = Connection {
            entity_id: Uuid::new_v4(),
            room_id: Uuid::new_v4(),
            username: Some("alice".into()),
            name: Some("Alice".into()),
            source: "twitter".into(),
            channel_type: ChannelType::Group,
        };
        store.ensure_connection(&conn).await.unwrap();
        conn.name = Some("Alice B.".into());
        store.ensure_connection(&conn).await.unwrap();

        let (count, name): (i64, Option<String>) =
            sqlx::query_as("SELECT COUNT(*), MAX(name) FROM connections")
                .fetch_one(&store.pool)
                .await
                .unwrap();
        assert_eq!(count, 1);
        assert_eq!(name.as_deref(), Some("Alice B."));
    }

    #[tokio::test]
    async fn open_creates_database_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("memory.db");
        let store = SqliteMemoryStore::open(&path).await.unwrap();
        store.create(sample(Uuid::new_v4(), 1)).await.unwrap();
        assert!(path.exists());
    }
}
