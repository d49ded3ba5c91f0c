//! Batched identifier sources for sequence and row-id columns.
//!
//! Identifier generators never ask for one id at a time; they request a
//! [`BatchRequest`] worth of ids and serve them from a local buffer.
//! [`CounterSource`] keeps per-key counters in process. [`PostgresSequenceSource`]
//! draws from a PostgreSQL sequence with `nextval`.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use tokio_postgres::{Client, NoTls};
use tracing::{debug, error, info};

/// Error type for identifier sources.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Counter would leave the i64 range
    #[error("identifier counter '{0}' overflowed")]
    Overflow(String),

    /// Source returned no identifiers
    #[error("identifier source returned an empty batch for '{0}'")]
    EmptyBatch(String),

    /// Shared state is unusable
    #[error("identifier source state poisoned")]
    Poisoned,

    /// Database error
    #[error("database error: {0}")]
    Database(#[from] tokio_postgres::Error),
}

/// A request for the next batch of identifiers under `key`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRequest {
    /// Counter or sequence name
    pub key: String,
    /// Number of identifiers wanted
    pub size: usize,
    /// First identifier when `key` has never been used
    pub start: i64,
    /// Increment between identifiers
    pub step: i64,
}

/// Source of identifier batches.
#[async_trait]
pub trait IdentifierSource: Send + Sync {
    /// Fetch the next batch of identifiers, in increasing sequence order.
    async fn next_batch(&self, request: &BatchRequest) -> Result<Vec<i64>, SourceError>;
}

/// In-process per-key counters.
///
/// All generators sharing a key share one counter, so their identifiers never
/// collide. A batch that reaches the end of the i64 range is cut short after
/// the last representable id; the next request for that key fails with
/// [`SourceError::Overflow`].
#[derive(Debug, Default)]
pub struct CounterSource {
    // `None` once the last representable id has been handed out
    counters: Mutex<HashMap<String, Option<i64>>>,
}

impl CounterSource {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IdentifierSource for CounterSource {
    async fn next_batch(&self, request: &BatchRequest) -> Result<Vec<i64>, SourceError> {
        let mut counters = self.counters.lock().map_err(|_| SourceError::Poisoned)?;
        let next = counters
            .entry(request.key.clone())
            .or_insert(Some(request.start));

        let mut ids = Vec::with_capacity(request.size);
        while ids.len() < request.size {
            let Some(id) = *next else {
                break;
            };
            ids.push(id);
            *next = id.checked_add(request.step);
        }

        if ids.is_empty() && request.size > 0 {
            return Err(SourceError::Overflow(request.key.clone()));
        }
        if next.is_none() {
            debug!(
                "Counter '{}' reached the end of its range after {} ids",
                request.key,
                ids.len()
            );
        }
        Ok(ids)
    }
}

/// Identifier batches drawn from a PostgreSQL sequence.
///
/// The request key is the sequence name; `start` and `step` are owned by the
/// sequence definition in the database.
pub struct PostgresSequenceSource {
    client: Client,
}

impl PostgresSequenceSource {
    /// Wrap an existing client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Connect to the database at `url`.
    pub async fn connect(url: &str) -> Result<Self, SourceError> {
        let (client, connection) = tokio_postgres::connect(url, NoTls).await?;

        // Spawn connection handler
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!("PostgreSQL connection error: {e}");
            }
        });

        info!("Connected to PostgreSQL identifier source");
        Ok(Self::new(client))
    }
}

#[async_trait]
impl IdentifierSource for PostgresSequenceSource {
    async fn next_batch(&self, request: &BatchRequest) -> Result<Vec<i64>, SourceError> {
        let size = i64::try_from(request.size).unwrap_or(i64::MAX);
        let rows = self
            .client
            .query(
                "SELECT nextval($1::text::regclass) FROM generate_series(1, $2::bigint)",
                &[&request.key, &size],
            )
            .await?;

        debug!(
            "Fetched {} identifiers from sequence '{}'",
            rows.len(),
            request.key
        );
        Ok(rows.iter().map(|row| row.get::<_, i64>(0)).collect())
    }
}
