use async_trait::async_trait;
use roster_core::models::{Member, MemberQuery, NewMember};
use roster_core::{AppError, FieldKind, MemberChanges};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::errors::{like_pattern, map_unique_violation, search_term};
use super::store::MemberStore;

const MEMBER_COLUMNS: &str = r#"
    id, registration_id, unique_id, member_id, role,
    name, email, mobile, company_name, profession, nationality, membership_type,
    designation, civil_id, passport_number, alternate_mobile, alternate_email,
    industry_sector, alternate_industry_sector, company_address, company_website,
    linkedin, expected_benefits, proposed_contribution, proposer1, proposer2,
    membership_validity, company_brief, instagram, twitter, facebook, photo, logo,
    password_hash, created_at, updated_at
"#;

// $1 = optional ILIKE pattern
const LIST_FILTER: &str = r#"
    ($1::text IS NULL
        OR name ILIKE $1 OR email ILIKE $1 OR mobile ILIKE $1
        OR member_id ILIKE $1 OR company_name ILIKE $1)
"#;

/// Repository for provisioned members
#[derive(Clone)]
pub struct MemberRepository {
    pool: PgPool,
}

impl MemberRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MemberStore for MemberRepository {
    #[tracing::instrument(skip(self), fields(db.table = "members", db.operation = "select"))]
    async fn max_unique_id(&self) -> Result<Option<String>, AppError> {
        let max = sqlx::query_scalar::<Postgres, String>(
            r#"SELECT unique_id FROM members WHERE unique_id ~ '^\d{5}$' ORDER BY unique_id DESC LIMIT 1"#,
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(max)
    }

    #[tracing::instrument(skip(self), fields(db.table = "members", db.operation = "select"))]
    async fn max_member_id(&self, prefix: char) -> Result<Option<String>, AppError> {
        // Equal-length digit strings order numerically, so longer wins first.
        let max = sqlx::query_scalar::<Postgres, String>(
            r#"
            SELECT member_id FROM members
            WHERE member_id ~ $1
            ORDER BY length(member_id) DESC, member_id DESC
            LIMIT 1
            "#,
        )
        .bind(format!(r"^{}\d+$", prefix))
        .fetch_optional(&self.pool)
        .await?;

        Ok(max)
    }

    #[tracing::instrument(skip(self), fields(db.table = "members", db.operation = "select"))]
    async fn email_exists(&self, email: &str) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<Postgres, bool>(
            "SELECT EXISTS(SELECT 1 FROM members WHERE lower(email) = lower($1))",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    #[tracing::instrument(
        skip(self, member),
        fields(db.table = "members", db.operation = "insert", member_id = %member.member_id)
    )]
    async fn insert(&self, member: NewMember) -> Result<Member, AppError> {
        let p = member.profile;
        let sql = format!(
            r#"
            INSERT INTO members (
                registration_id, unique_id, member_id, role,
                name, email, mobile, company_name, profession, nationality, membership_type,
                designation, civil_id, passport_number, alternate_mobile, alternate_email,
                industry_sector, alternate_industry_sector, company_address, company_website,
                linkedin, expected_benefits, proposed_contribution, proposer1, proposer2,
                membership_validity, photo, password_hash
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16,
                    $17, $18, $19, $20, $21, $22, $23, $24, $25, $26, $27, $28)
            RETURNING {}
            "#,
            MEMBER_COLUMNS
        );

        let created = sqlx::query_as::<Postgres, Member>(&sql)
            .bind(member.registration_id)
            .bind(member.unique_id)
            .bind(member.member_id)
            .bind(member.role)
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
            .bind(member.membership_validity)
            .bind(member.photo)
            .bind(member.password_hash)
            .fetch_one(&self.pool)
            .await
            .map_err(map_unique_violation)?;

        Ok(created)
    }

    #[tracing::instrument(skip(self), fields(db.table = "members", db.operation = "select", db.record_id = %id))]
    async fn get(&self, id: Uuid) -> Result<Option<Member>, AppError> {
        let sql = format!("SELECT {} FROM members WHERE id = $1", MEMBER_COLUMNS);
        let member = sqlx::query_as::<Postgres, Member>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(member)
    }

    #[tracing::instrument(skip(self), fields(db.table = "members", db.operation = "select"))]
    async fn find_by_registration(
        &self,
        registration_id: Uuid,
    ) -> Result<Option<Member>, AppError> {
        let sql = format!(
            "SELECT {} FROM members WHERE registration_id = $1",
            MEMBER_COLUMNS
        );
        let member = sqlx::query_as::<Postgres, Member>(&sql)
            .bind(registration_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(member)
    }

    #[tracing::instrument(skip(self), fields(db.table = "members", db.operation = "select"))]
    async fn list(&self, query: &MemberQuery) -> Result<(Vec<Member>, i64), AppError> {
        let pattern = search_term(query.search.as_deref()).map(like_pattern);

        let total = sqlx::query_scalar::<Postgres, i64>(&format!(
            "SELECT COUNT(*) FROM members WHERE {}",
            LIST_FILTER
        ))
        .bind(pattern.as_deref())
        .fetch_one(&self.pool)
        .await?;

        let sql = format!(
            "SELECT {} FROM members WHERE {} ORDER BY unique_id ASC LIMIT $2 OFFSET $3",
            MEMBER_COLUMNS, LIST_FILTER
        );
        let items = sqlx::query_as::<Postgres, Member>(&sql)
            .bind(pattern.as_deref())
            .bind(query.page.limit)
            .bind(query.page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok((items, total))
    }

    #[tracing::instrument(
        skip(self, changes),
        fields(db.table = "members", db.operation = "update", db.record_id = %id, fields = changes.len())
    )]
    async fn update_fields(
        &self,
        id: Uuid,
        changes: &MemberChanges,
    ) -> Result<Option<Member>, AppError> {
        if changes.is_empty() {
            return self.get(id).await;
        }

        // Column names come from the static field registry, never from the request.
        let mut builder = QueryBuilder::<Postgres>::new("UPDATE members SET ");
        let mut assignments = builder.separated(", ");
        for (spec, value) in changes.iter() {
            assignments.push(format!("{} = ", spec.column));
            assignments.push_bind_unseparated(value.map(str::to_string));
            if spec.kind == FieldKind::Role {
                assignments.push_unseparated("::member_role");
            }
        }
        assignments.push("updated_at = NOW()");

        builder.push(" WHERE id = ");
        builder.push_bind(id);
        builder.push(" RETURNING ");
        builder.push(MEMBER_COLUMNS);

        let updated = builder
            .build_query_as::<Member>()
            .fetch_optional(&self.pool)
            .await
            .map_err(map_unique_violation)?;

        Ok(updated)
    }

    #[tracing::instrument(skip(self, password_hash), fields(db.table = "members", db.operation = "update", db.record_id = %id))]
    async fn set_password_hash(&self, id: Uuid, password_hash: &str) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE members SET password_hash = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(password_hash)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
