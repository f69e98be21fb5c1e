use async_trait::async_trait;
use sqlx::{
    PgPool, Row,
    postgres::{PgPoolOptions, PgRow},
};
use uuid::Uuid;

use crate::{
    AggregateId, EntityRecord, Result, StoreError, TenantId,
    store::{Change, ChangeSet, EntityStore},
};

/// PostgreSQL-backed entity store.
///
/// Entities are kept as JSONB documents in the `entities` table, keyed by
/// `(entity_type, id)` with the owning tenant in its own column.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to `database_url` with a pool of up to `max_connections`.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_record(row: PgRow) -> Result<EntityRecord> {
        Ok(EntityRecord {
            id: AggregateId::from_uuid(row.try_get::<Uuid, _>("id")?),
            tenant_id: TenantId::new(row.try_get::<String, _>("tenant_id")?),
            entity_type: row.try_get("entity_type")?,
            body: row.try_get("body")?,
            stored_at: row.try_get("stored_at")?,
        })
    }
}

#[async_trait]
impl EntityStore for PostgresStore {
    #[tracing::instrument(skip(self, changes), fields(changes = changes.len()))]
    async fn save(&self, changes: ChangeSet) -> Result<()> {
        changes.validate()?;

        let mut tx = self.pool.begin().await?;

        for change in changes.into_changes() {
            match change {
                Change::Insert(record) => {
                    sqlx::query(
                        r#"
                        INSERT INTO entities (entity_type, id, tenant_id, body, stored_at)
                        VALUES ($1, $2, $3, $4, $5)
                        "#,
                    )
                    .bind(&record.entity_type)
                    .bind(record.id.as_uuid())
                    .bind(record.tenant_id.as_str())
                    .bind(&record.body)
                    .bind(record.stored_at)
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| {
                        if let sqlx::Error::Database(ref db_err) = e
                            && db_err.constraint() == Some("entities_pkey")
                        {
                            return StoreError::DuplicateId {
                                entity_type: record.entity_type.clone(),
                                id: record.id,
                            };
                        }
                        StoreError::Database(e)
                    })?;
                }
                Change::Update(record) => {
                    let result = sqlx::query(
                        r#"
                        UPDATE entities
                        SET body = $4, stored_at = $5
                        WHERE entity_type = $1 AND id = $2 AND tenant_id = $3
                        "#,
                    )
                    .bind(&record.entity_type)
                    .bind(record.id.as_uuid())
                    .bind(record.tenant_id.as_str())
                    .bind(&record.body)
                    .bind(record.stored_at)
                    .execute(&mut *tx)
                    .await?;

                    if result.rows_affected() == 0 {
                        return Err(StoreError::NotFound {
                            entity_type: record.entity_type,
                            id: record.id,
                        });
                    }
                }
            }
        }

        // Dropping the transaction on any early return rolls it back
        tx.commit().await?;
        Ok(())
    }

    async fn find_record(
        &self,
        tenant_id: &TenantId,
        entity_type: &str,
        id: AggregateId,
    ) -> Result<Option<EntityRecord>> {
        let row: Option<PgRow> = sqlx::query(
            r#"
            SELECT entity_type, id, tenant_id, body, stored_at
            FROM entities
            WHERE entity_type = $1 AND id = $2 AND tenant_id = $3
            "#,
        )
        .bind(entity_type)
        .bind(id.as_uuid())
        .bind(tenant_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_record).transpose()
    }
}
