use async_trait::async_trait;
use roster_core::models::CredentialDelivery;
use roster_core::AppError;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use super::store::CredentialDeliveryStore;

const DELIVERY_COLUMNS: &str =
    "id, member_ref, member_id, email, status, attempts, last_error, created_at, updated_at";

/// Repository for the pending credential delivery queue
#[derive(Clone)]
pub struct CredentialDeliveryRepository {
    pool: PgPool,
}

impl CredentialDeliveryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialDeliveryStore for CredentialDeliveryRepository {
    #[tracing::instrument(skip(self, reason), fields(db.table = "credential_deliveries", db.operation = "upsert"))]
    async fn record_failure(
        &self,
        member_ref: Uuid,
        member_id: &str,
        email: &str,
        reason: &str,
    ) -> Result<CredentialDelivery, AppError> {
        let sql = format!(
            r#"
            INSERT INTO credential_deliveries (member_ref, member_id, email, status, attempts, last_error)
            VALUES ($1, $2, $3, 'pending', 1, $4)
            ON CONFLICT (member_ref) DO UPDATE
            SET member_id = EXCLUDED.member_id,
                email = EXCLUDED.email,
                status = 'pending',
                attempts = credential_deliveries.attempts + 1,
                last_error = EXCLUDED.last_error,
                updated_at = NOW()
            RETURNING {}
            "#,
            DELIVERY_COLUMNS
        );

        let entry = sqlx::query_as::<Postgres, CredentialDelivery>(&sql)
            .bind(member_ref)
            .bind(member_id)
            .bind(email)
            .bind(reason)
            .fetch_one(&self.pool)
            .await?;

        Ok(entry)
    }

    #[tracing::instrument(skip(self), fields(db.table = "credential_deliveries", db.operation = "update"))]
    async fn mark_delivered(&self, member_ref: Uuid) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE credential_deliveries
            SET status = 'delivered', last_error = NULL, updated_at = NOW()
            WHERE member_ref = $1
            "#,
        )
        .bind(member_ref)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip(self), fields(db.table = "credential_deliveries", db.operation = "select"))]
    async fn get(&self, member_ref: Uuid) -> Result<Option<CredentialDelivery>, AppError> {
        let sql = format!(
            "SELECT {} FROM credential_deliveries WHERE member_ref = $1",
            DELIVERY_COLUMNS
        );
        let entry = sqlx::query_as::<Postgres, CredentialDelivery>(&sql)
            .bind(member_ref)
            .fetch_optional(&self.pool)
            .await?;

        Ok(entry)
    }

    #[tracing::instrument(skip(self), fields(db.table = "credential_deliveries", db.operation = "select"))]
    async fn list_pending(&self) -> Result<Vec<CredentialDelivery>, AppError> {
        let sql = format!(
            "SELECT {} FROM credential_deliveries WHERE status = 'pending' ORDER BY created_at ASC",
            DELIVERY_COLUMNS
        );
        let entries = sqlx::query_as::<Postgres, CredentialDelivery>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(entries)
    }
}
