use async_trait::async_trait;
use log::{debug, error, info, warn};
use serde_json::Value;
use sqlx::{
    postgres::{PgListener, PgPoolOptions},
    FromRow, Pool, Postgres,
};
use tokio::sync::broadcast;
use uuid::Uuid;

use super::{remote_failure, Document, DocumentStore, Filter, CHANGE_FEED_CAPACITY};
use crate::errors::AppError;

pub type PGPool = Pool<Postgres>;

const CHANGE_CHANNEL: &str = "document_changes";

#[derive(Debug, FromRow)]
struct DocumentRow {
    id: String,
    data: Value,
}

impl From<DocumentRow> for Document {
    fn from(row: DocumentRow) -> Self {
        Document {
            id: row.id,
            data: row.data,
        }
    }
}

/// Documents live in a single `documents` table keyed by (collection, id)
/// with a JSONB body. Changes fan out through `pg_notify` so every instance
/// sees mutations made by the others.
pub struct PgStore {
    pool: PGPool,
    changes: broadcast::Sender<String>,
}

impl PgStore {
    pub async fn connect(db_url: &str) -> Result<Self, AppError> {
        let pool: PGPool = PgPoolOptions::new()
            .max_connections(5)
            .connect(db_url)
            .await
            .map_err(|err| remote_failure("database connection failed", err))?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|err| remote_failure("database migration failed", err))?;

        let (changes, _) = broadcast::channel(CHANGE_FEED_CAPACITY);
        let mut listener = PgListener::connect_with(&pool)
            .await
            .map_err(|err| remote_failure("change listener connection failed", err))?;
        listener
            .listen(CHANGE_CHANNEL)
            .await
            .map_err(|err| remote_failure("LISTEN failed", err))?;
        tokio::spawn(forward_changes(listener, changes.clone()));

        Ok(PgStore { pool, changes })
    }

    async fn notify(&self, collection: &str) -> Result<(), AppError> {
        sqlx::query("SELECT pg_notify($1, $2)")
            .bind(CHANGE_CHANNEL)
            .bind(collection)
            .execute(&self.pool)
            .await
            .map_err(|err| remote_failure("pg_notify failed", err))?;
        Ok(())
    }
}

async fn forward_changes(mut listener: PgListener, changes: broadcast::Sender<String>) {
    info!("listening for document changes on '{}'", CHANGE_CHANNEL);
    loop {
        match listener.recv().await {
            Ok(notification) => {
                debug!("change notification for '{}'", notification.payload());
                let _ = changes.send(notification.payload().to_string());
            }
            Err(err) => {
                // PgListener reconnects on its own; a hard error ends the feed.
                error!("change listener stopped: {}", err);
                break;
            }
        }
    }
}

#[async_trait]
impl DocumentStore for PgStore {
    async fn create(&self, collection: &str, data: Value) -> Result<String, AppError> {
        let id = Uuid::new_v4().simple().to_string();
        sqlx::query("INSERT INTO documents (collection, id, data) VALUES ($1, $2, $3)")
            .bind(collection)
            .bind(&id)
            .bind(&data)
            .execute(&self.pool)
            .await
            .map_err(|err| remote_failure("insert failed", err))?;
        self.notify(collection).await?;
        Ok(id)
    }

    async fn put(&self, collection: &str, id: &str, data: Value) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO documents (collection, id, data) VALUES ($1, $2, $3)
            ON CONFLICT (collection, id) DO UPDATE SET data = EXCLUDED.data",
        )
        .bind(collection)
        .bind(id)
        .bind(&data)
        .execute(&self.pool)
        .await
        .map_err(|err| remote_failure("upsert failed", err))?;
        self.notify(collection).await
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, AppError> {
        let row = sqlx::query_as::<_, DocumentRow>(
            "SELECT id, data FROM documents WHERE collection = $1 AND id = $2",
        )
        .bind(collection)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| remote_failure("select failed", err))?;
        Ok(row.map(Document::from))
    }

    async fn list(&self, collection: &str) -> Result<Vec<Document>, AppError> {
        let rows = sqlx::query_as::<_, DocumentRow>(
            "SELECT id, data FROM documents WHERE collection = $1 ORDER BY seq",
        )
        .bind(collection)
        .fetch_all(&self.pool)
        .await
        .map_err(|err| remote_failure("select failed", err))?;
        Ok(rows.into_iter().map(Document::from).collect())
    }

    async fn update(&self, collection: &str, id: &str, fields: Value) -> Result<(), AppError> {
        if !fields.is_object() {
            return Err(AppError::bad_request("document fields must be an object"));
        }
        let res = sqlx::query(
            "UPDATE documents SET data = data || $3 WHERE collection = $1 AND id = $2",
        )
        .bind(collection)
        .bind(id)
        .bind(&fields)
        .execute(&self.pool)
        .await
        .map_err(|err| remote_failure("update failed", err))?;
        if res.rows_affected() == 0 {
            return Err(AppError::not_found(format!("{collection}/{id}")));
        }
        self.notify(collection).await
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool, AppError> {
        let res = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|err| remote_failure("delete failed", err))?;
        let removed = res.rows_affected() > 0;
        if removed {
            self.notify(collection).await?;
        } else {
            warn!("delete of missing document {}/{}", collection, id);
        }
        Ok(removed)
    }

    async fn query(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>, AppError> {
        let rows = sqlx::query_as::<_, DocumentRow>(
            "SELECT id, data FROM documents WHERE collection = $1 AND data @> $2 ORDER BY seq",
        )
        .bind(collection)
        .bind(filter.containment())
        .fetch_all(&self.pool)
        .await
        .map_err(|err| remote_failure("query failed", err))?;
        Ok(rows.into_iter().map(Document::from).collect())
    }

    fn changes(&self) -> broadcast::Receiver<String> {
        self.changes.subscribe()
    }
}
