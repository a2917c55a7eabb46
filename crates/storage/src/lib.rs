use async_trait::async_trait;
use domain::Document;
use sqlx::{migrate::MigrateDatabase, sqlite::SqlitePoolOptions, Pool, Sqlite};
use std::{fs, path::Path};
use thiserror::Error;

mod credentials;
mod firestore;
mod repo;

pub use credentials::{CredentialsError, TokenSource, DEFAULT_METADATA_TOKEN_URL};
pub use firestore::{FirestoreConfig, FirestoreStore};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("request to document store failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("document store returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed document {0}")]
    Malformed(String),

    #[error(transparent)]
    Credentials(#[from] CredentialsError),
}

/// Point lookups by collection and document id.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;
}

/// SQLite-backed document table, for local runs and tests.
#[derive(Clone)]
pub struct Db {
    pub(crate) pool: Pool<Sqlite>,
}

impl Db {
    pub async fn new(db_url: &str) -> anyhow::Result<Self> {
        let in_memory = db_url.contains(":memory:");
        if db_url.starts_with("sqlite://") && !in_memory {
            let path_str = db_url.trim_start_matches("sqlite://");
            let path = Path::new(path_str);
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    fs::create_dir_all(parent)?;
                }
            }
        }
        if !in_memory && !Sqlite::database_exists(db_url).await.unwrap_or(false) {
            Sqlite::create_database(db_url).await?;
        }

        // every connection to :memory: is its own database
        let mut options = SqlitePoolOptions::new();
        if in_memory {
            options = options
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }
        let pool = options.connect(db_url).await?;

        if !in_memory {
            sqlx::query("PRAGMA journal_mode = WAL;")
                .execute(&pool)
                .await?;
            sqlx::query("PRAGMA synchronous = NORMAL;")
                .execute(&pool)
                .await?;
        }
        sqlx::migrate!("../../migrations").run(&pool).await?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl DocumentStore for Db {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        self.get_document(collection, id).await
    }
}
