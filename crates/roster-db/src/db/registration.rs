use async_trait::async_trait;
use roster_core::models::{
    NewRegistration, Registration, RegistrationQuery, RegistrationStatus, StatusFilter,
};
use roster_core::AppError;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use super::errors::{like_pattern, map_unique_violation, search_term};
use super::store::RegistrationStore;

const REGISTRATION_COLUMNS: &str = r#"
    id, name, email, mobile, company_name, profession, nationality, membership_type,
    designation, civil_id, passport_number, alternate_mobile, alternate_email,
    industry_sector, alternate_industry_sector, company_address, company_website,
    linkedin, expected_benefits, proposed_contribution, proposer1, proposer2,
    photo, consent, status, unique_id, member_id, membership_validity,
    created_at, updated_at
"#;

// $1 = optional status, $2 = optional ILIKE pattern
const LIST_FILTER: &str = r#"
    ($1::registration_status IS NULL OR status = $1)
    AND ($2::text IS NULL OR name ILIKE $2 OR email ILIKE $2 OR company_name ILIKE $2)
"#;

/// Repository for applicant registrations
#[derive(Clone)]
pub struct RegistrationRepository {
    pool: PgPool,
}

impl RegistrationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RegistrationStore for RegistrationRepository {
    #[tracing::instrument(skip(self), fields(db.table = "registrations", db.operation = "select"))]
    async fn email_in_use(&self, email: &str) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<Postgres, bool>(
            "SELECT EXISTS(SELECT 1 FROM registrations WHERE lower(email) = lower($1) AND status <> 'Rejected')",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    #[tracing::instrument(skip(self, registration), fields(db.table = "registrations", db.operation = "insert"))]
    async fn insert(&self, registration: NewRegistration) -> Result<Registration, AppError> {
        let p = registration.profile;
        let sql = format!(
            r#"
            INSERT INTO registrations (
                name, email, mobile, company_name, profession, nationality, membership_type,
                designation, civil_id, passport_number, alternate_mobile, alternate_email,
                industry_sector, alternate_industry_sector, company_address, company_website,
                linkedin, expected_benefits, proposed_contribution, proposer1, proposer2,
                photo, consent, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16,
                    $17, $18, $19, $20, $21, $22, $23, 'Pending')
            RETURNING {}
            "#,
            REGISTRATION_COLUMNS
        );

        let created = sqlx::query_as::<Postgres, Registration>(&sql)
            .bind(p.name)
            .bind(p.email)
            .bind(p.mobile)
            .bind(p.company_name)
            .bind(p.profession)
            .bind(p.nationality)
            .bind(p.membership_type)
            .bind(p.designation)
            .bind(p.civil_id)
            .bind(p.passport_number)
            .bind(p.alternate_mobile)
            .bind(p.alternate_email)
            .bind(p.industry_sector)
            .bind(p.alternate_industry_sector)
            .bind(p.company_address)
            .bind(p.company_website)
            .bind(p.linkedin)
            .bind(p.expected_benefits)
            .bind(p.proposed_contribution)
            .bind(p.proposer1)
            .bind(p.proposer2)
            .bind(registration.photo)
            .bind(registration.consent)
            .fetch_one(&self.pool)
            .await
            .map_err(map_unique_violation)?;

        Ok(created)
    }

    #[tracing::instrument(skip(self), fields(db.table = "registrations", db.operation = "select", db.record_id = %id))]
    async fn get(&self, id: Uuid) -> Result<Option<Registration>, AppError> {
        let sql = format!(
            "SELECT {} FROM registrations WHERE id = $1",
            REGISTRATION_COLUMNS
        );
        let registration = sqlx::query_as::<Postgres, Registration>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(registration)
    }

    #[tracing::instrument(skip(self), fields(db.table = "registrations", db.operation = "select"))]
    async fn list(&self, query: &RegistrationQuery) -> Result<(Vec<Registration>, i64), AppError> {
        let status = match query.status {
            StatusFilter::All => None,
            StatusFilter::Only(status) => Some(status),
        };
        let pattern = search_term(query.search.as_deref()).map(like_pattern);

        let total = sqlx::query_scalar::<Postgres, i64>(&format!(
            "SELECT COUNT(*) FROM registrations WHERE {}",
            LIST_FILTER
        ))
        .bind(status)
        .bind(pattern.as_deref())
        .fetch_one(&self.pool)
        .await?;

        let sql = format!(
            "SELECT {} FROM registrations WHERE {} ORDER BY created_at DESC, id LIMIT $3 OFFSET $4",
            REGISTRATION_COLUMNS, LIST_FILTER
        );
        let items = sqlx::query_as::<Postgres, Registration>(&sql)
            .bind(status)
            .bind(pattern.as_deref())
            .bind(query.page.limit)
            .bind(query.page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok((items, total))
    }

    #[tracing::instrument(skip(self), fields(db.table = "registrations", db.operation = "update", db.record_id = %id))]
    async fn mark_approved(
        &self,
        id: Uuid,
        unique_id: &str,
        member_id: &str,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE registrations
            SET status = 'Approved', unique_id = $2, member_id = $3, updated_at = NOW()
            WHERE id = $1 AND status <> 'Approved'
            "#,
        )
        .bind(id)
        .bind(unique_id)
        .bind(member_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip(self), fields(db.table = "registrations", db.operation = "update", db.record_id = %id))]
    async fn mark_rejected(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE registrations SET status = $2, updated_at = NOW() WHERE id = $1 AND status = 'Pending'",
        )
        .bind(id)
        .bind(RegistrationStatus::Rejected)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip(self), fields(db.table = "registrations", db.operation = "update", db.record_id = %id))]
    async fn set_membership_validity(
        &self,
        id: Uuid,
        validity: Option<String>,
    ) -> Result<Option<Registration>, AppError> {
        let sql = format!(
            r#"
            UPDATE registrations
            SET membership_validity = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            REGISTRATION_COLUMNS
        );
        let updated = sqlx::query_as::<Postgres, Registration>(&sql)
            .bind(id)
            .bind(validity)
            .fetch_optional(&self.pool)
            .await?;

        Ok(updated)
    }
}
