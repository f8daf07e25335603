//! # Profile Repository
//!
//! Shop owner profiles, keyed by the authenticated user id.

use chrono::{DateTime, Utc};
use shopbook_core::{ProfileUpdate, UserProfile};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;

const PROFILE_COLUMNS: &str = "id, phone, business_name, is_pro, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct ProfileRepository {
    pool: SqlitePool,
}

impl ProfileRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProfileRepository { pool }
    }

    pub async fn get_by_id(&self, user_id: &str) -> DbResult<Option<UserProfile>> {
        let sql = format!("SELECT {} FROM profiles WHERE id = ?1", PROFILE_COLUMNS);
        let profile = sqlx::query_as::<_, UserProfile>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(profile)
    }

    pub async fn insert(&self, profile: &UserProfile) -> DbResult<()> {
        debug!(user_id = %profile.id, "Inserting profile");

        sqlx::query(
            r#"
            INSERT INTO profiles (id, phone, business_name, is_pro, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&profile.id)
        .bind(&profile.phone)
        .bind(&profile.business_name)
        .bind(profile.is_pro)
        .bind(profile.created_at)
        .bind(profile.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn update(
        &self,
        user_id: &str,
        update: &ProfileUpdate,
        now: DateTime<Utc>,
    ) -> DbResult<Option<UserProfile>> {
        let sql = format!(
            r#"
            UPDATE profiles SET
                business_name = COALESCE(?2, business_name),
                is_pro = COALESCE(?3, is_pro),
                updated_at = ?4
            WHERE id = ?1
            RETURNING {}
            "#,
            PROFILE_COLUMNS
        );
        let profile = sqlx::query_as::<_, UserProfile>(&sql)
            .bind(user_id)
            .bind(update.business_name.as_deref().map(str::trim))
            .bind(update.is_pro)
            .bind(now)
            .fetch_optional(&self.pool)
            .await?;

        Ok(profile)
    }
}
