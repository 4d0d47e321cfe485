//! SQLite-backed vector index using the `sqlite-vec` extension.
//!
//! Collections are rows in a `collections` table; entries carry their
//! float32 embedding as a blob produced by `vec_f32()` and are ranked with
//! `vec_distance_cosine()` at query time.

use std::mem::transmute;
use std::os::raw::c_char;
use std::path::Path;
use std::sync::OnceLock;

use async_trait::async_trait;
use tokio_rusqlite::{Connection, ffi};

use super::{EntryMetadata, IndexedEntry, NearestEntry, StoreError, VectorIndex};
use crate::keys::SourceKey;

#[derive(Clone)]
pub struct SqliteVectorIndex {
    conn: Connection,
}

impl SqliteVectorIndex {
    /// Opens (or creates) the database at `path` and prepares the schema.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        Self::register_sqlite_vec()?;
        let conn = Connection::open(path)
            .await
            .map_err(|err| StoreError(err.to_string()))?;

        // Fail fast if the extension did not load.
        conn.call(|conn| {
            conn.query_row("select vec_version()", [], |row| row.get::<_, String>(0))
                .map(|_| ())
        })
        .await
        .map_err(|err| StoreError(format!("sqlite-vec unavailable: {err}")))?;

        conn.call(|conn| {
            conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS collections (
                     name TEXT PRIMARY KEY,
                     source_url TEXT NOT NULL
                 );
                 CREATE TABLE IF NOT EXISTS entries (
                     collection TEXT NOT NULL,
                     id TEXT NOT NULL,
                     chunk_index INTEGER NOT NULL,
                     token_count INTEGER NOT NULL,
                     source_url TEXT NOT NULL,
                     content TEXT NOT NULL,
                     embedding BLOB NOT NULL,
                     PRIMARY KEY (collection, id)
                 );
                 CREATE INDEX IF NOT EXISTS entries_by_collection
                     ON entries (collection);",
            )
        })
        .await
        .map_err(|err| StoreError(err.to_string()))?;

        Ok(Self { conn })
    }

    /// Registers sqlite-vec as an auto-extension, once per process.
    ///
    /// SQLite's auto-extension list is process-global, so this is the one
    /// piece of shared state the store cannot avoid.
    fn register_sqlite_vec() -> Result<(), StoreError> {
        static REGISTERED: OnceLock<Result<(), String>> = OnceLock::new();

        REGISTERED
            .get_or_init(|| unsafe {
                type SqliteExtensionInit = unsafe extern "C" fn(
                    *mut ffi::sqlite3,
                    *mut *mut c_char,
                    *const ffi::sqlite3_api_routines,
                ) -> i32;

                let init: unsafe extern "C" fn() = sqlite_vec::sqlite3_vec_init;
                let init_fn: SqliteExtensionInit =
                    transmute::<unsafe extern "C" fn(), SqliteExtensionInit>(init);
                let rc = ffi::sqlite3_auto_extension(Some(init_fn));
                if rc != 0 {
                    Err(format!("failed to register sqlite-vec extension (code {rc})"))
                } else {
                    Ok(())
                }
            })
            .clone()
            .map_err(StoreError)
    }
}

#[async_trait]
impl VectorIndex for SqliteVectorIndex {
    async fn create(&self, key: &SourceKey, source_url: &str) -> Result<(), StoreError> {
        let name = key.as_str().to_string();
        let source_url = source_url.to_string();
        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT OR REPLACE INTO collections (name, source_url) VALUES (?1, ?2)",
                    (name.as_str(), source_url.as_str()),
                )
                .map(|_| ())
            })
            .await
            .map_err(|err| StoreError(err.to_string()))
    }

    async fn destroy(&self, key: &SourceKey) -> Result<(), StoreError> {
        let name = key.as_str().to_string();
        self.conn
            .call(move |conn| {
                conn.execute("DELETE FROM entries WHERE collection = ?1", [name.as_str()])?;
                conn.execute("DELETE FROM collections WHERE name = ?1", [name.as_str()])?;
                Ok(())
            })
            .await
            .map_err(|err: tokio_rusqlite::Error<tokio_rusqlite::rusqlite::Error>| {
                StoreError(err.to_string())
            })
    }

    async fn insert(&self, key: &SourceKey, entries: Vec<IndexedEntry>) -> Result<(), StoreError> {
        if entries.is_empty() {
            return Ok(());
        }
        let collection = key.as_str().to_string();
        // Serialize vectors up front so the blocking closure only runs SQL.
        let mut rows = Vec::with_capacity(entries.len());
        for entry in entries {
            let vector_json = serde_json::to_string(&entry.vector)
                .map_err(|err| StoreError(err.to_string()))?;
            rows.push((entry, vector_json));
        }

        self.conn
            .call(move |conn| {
                let tx = conn
                    .transaction()?;
                {
                    let mut stmt = tx
                        .prepare(
                            "INSERT INTO entries
                                 (collection, id, chunk_index, token_count,
                                  source_url, content, embedding)
                             VALUES (?1, ?2, ?3, ?4, ?5, ?6, vec_f32(?7))",
                        )?;
                    for (entry, vector_json) in rows {
                        stmt.execute((
                            collection.as_str(),
                            entry.id.as_str(),
                            entry.metadata.chunk_index as i64,
                            entry.metadata.token_count as i64,
                            entry.metadata.source_url.as_str(),
                            entry.text.as_str(),
                            vector_json.as_str(),
                        ))?;
                    }
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(|err: tokio_rusqlite::Error<tokio_rusqlite::rusqlite::Error>| {
                StoreError(err.to_string())
            })
    }

    async fn nearest(
        &self,
        key: &SourceKey,
        query_vector: &[f32],
        k: usize,
    ) -> Result<Vec<NearestEntry>, StoreError> {
        let collection = key.as_str().to_string();
        let vector_json =
            serde_json::to_string(query_vector).map_err(|err| StoreError(err.to_string()))?;

        self.conn
            .call(move |conn| {
                let mut stmt = conn
                    .prepare(
                        "SELECT content, chunk_index, token_count, source_url,
                                vec_distance_cosine(embedding, vec_f32(?1)) AS distance
                         FROM entries
                         WHERE collection = ?2
                         ORDER BY distance ASC
                         LIMIT ?3",
                    )?;

                let rows = stmt
                    .query_map(
                        (vector_json.as_str(), collection.as_str(), k as i64),
                        |row| {
                            Ok(NearestEntry {
                                text: row.get(0)?,
                                metadata: EntryMetadata {
                                    chunk_index: row.get::<_, i64>(1)? as usize,
                                    token_count: row.get::<_, i64>(2)? as usize,
                                    source_url: row.get(3)?,
                                },
                                distance: row.get::<_, f64>(4)? as f32,
                            })
                        },
                    )?;

                let mut results = Vec::new();
                for row in rows {
                    results.push(row?);
                }
                Ok(results)
            })
            .await
            .map_err(|err: tokio_rusqlite::Error<tokio_rusqlite::rusqlite::Error>| {
                StoreError(err.to_string())
            })
    }

    async fn len(&self, key: &SourceKey) -> Result<usize, StoreError> {
        let collection = key.as_str().to_string();
        self.conn
            .call(move |conn| {
                let count: i64 = conn
                    .query_row(
                        "SELECT COUNT(*) FROM entries WHERE collection = ?1",
                        [collection.as_str()],
                        |row| row.get(0),
                    )?;
                Ok(count as usize)
            })
            .await
            .map_err(|err: tokio_rusqlite::Error<tokio_rusqlite::rusqlite::Error>| {
                StoreError(err.to_string())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::derive_key;
    use tempfile::tempdir;

    fn entry(index: usize, text: &str, vector: Vec<f32>) -> IndexedEntry {
        IndexedEntry {
            id: format!("chunk_{index}"),
            vector,
            text: text.to_string(),
            metadata: EntryMetadata {
                source_url: "http://a.test".to_string(),
                chunk_index: index,
                token_count: text.split_whitespace().count(),
            },
        }
    }

    async fn open_temp() -> (tempfile::TempDir, SqliteVectorIndex) {
        let dir = tempdir().unwrap();
        let store = SqliteVectorIndex::open(dir.path().join("index.db"))
            .await
            .unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn insert_then_nearest_ranks_by_distance() {
        let (_dir, store) = open_temp().await;
        let key = derive_key("http://a.test");
        store.create(&key, "http://a.test").await.unwrap();
        store
            .insert(
                &key,
                vec![
                    entry(0, "north", vec![1.0, 0.0]),
                    entry(1, "east", vec![0.0, 1.0]),
                    entry(2, "northish", vec![0.9, 0.1]),
                ],
            )
            .await
            .unwrap();

        let hits = store.nearest(&key, &[1.0, 0.0], 3).await.unwrap();
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].text, "north");
        assert_eq!(hits[1].text, "northish");
        assert_eq!(hits[2].text, "east");
        assert!(hits[0].distance <= hits[1].distance);
        assert!(hits[1].distance <= hits[2].distance);
        assert_eq!(hits[0].metadata.chunk_index, 0);
        assert_eq!(hits[0].metadata.source_url, "http://a.test");
    }

    #[tokio::test]
    async fn destroy_removes_all_entries() {
        let (_dir, store) = open_temp().await;
        let key = derive_key("http://a.test");
        store.create(&key, "http://a.test").await.unwrap();
        store
            .insert(&key, vec![entry(0, "one", vec![1.0, 0.0])])
            .await
            .unwrap();
        assert_eq!(store.len(&key).await.unwrap(), 1);

        store.destroy(&key).await.unwrap();
        assert_eq!(store.len(&key).await.unwrap(), 0);
        assert!(store.nearest(&key, &[1.0, 0.0], 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn destroying_a_missing_collection_is_fine() {
        let (_dir, store) = open_temp().await;
        store.destroy(&derive_key("http://never.indexed")).await.unwrap();
    }

    #[tokio::test]
    async fn collections_are_isolated_from_each_other() {
        let (_dir, store) = open_temp().await;
        let key_a = derive_key("http://a.test");
        let key_b = derive_key("http://b.test");
        store.create(&key_a, "http://a.test").await.unwrap();
        store.create(&key_b, "http://b.test").await.unwrap();
        store
            .insert(&key_a, vec![entry(0, "from a", vec![1.0, 0.0])])
            .await
            .unwrap();

        assert_eq!(store.len(&key_a).await.unwrap(), 1);
        assert_eq!(store.len(&key_b).await.unwrap(), 0);
        assert!(store.nearest(&key_b, &[1.0, 0.0], 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn limit_caps_returned_entries() {
        let (_dir, store) = open_temp().await;
        let key = derive_key("http://a.test");
        store.create(&key, "http://a.test").await.unwrap();
        store
            .insert(
                &key,
                vec![
                    entry(0, "a", vec![1.0, 0.0]),
                    entry(1, "b", vec![0.5, 0.5]),
                    entry(2, "c", vec![0.0, 1.0]),
                ],
            )
            .await
            .unwrap();
        let hits = store.nearest(&key, &[1.0, 0.0], 2).await.unwrap();
        assert_eq!(hits.len(), 2);
    }
}
