//! Profile lookups against the user_profiles table
//!
//! Profile lifecycle (registration, suspension, token rotation) belongs to
//! the profile service. Reconciliation reads; `insert_profile` exists for
//! seeding development and test databases.

use async_trait::async_trait;
use covlink_common::Result;
use sqlx::{Row, SqlitePool};

use crate::models::Profile;
use crate::stores::ProfileRepository;

/// Sqlx-backed profile reader
#[derive(Debug, Clone)]
pub struct SqlProfileRepository {
    pool: SqlitePool,
}

impl SqlProfileRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileRepository for SqlProfileRepository {
    async fn get_profile_by_phone_number(
        &self,
        phone_number: &str,
        include_suspended: bool,
    ) -> Result<Option<Profile>> {
        let row = sqlx::query(
            r#"
            SELECT uid, phone_number, first_name, last_name, push_tokens, suspended
            FROM user_profiles
            WHERE phone_number = ? AND (suspended = 0 OR ? = 1)
            "#,
        )
        .bind(phone_number)
        .bind(include_suspended)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let push_tokens: String = row.get("push_tokens");
                let push_tokens: Vec<String> = serde_json::from_str(&push_tokens)?;

                Ok(Some(Profile {
                    uid: row.get("uid"),
                    phone_number: row.get("phone_number"),
                    first_name: row.get("first_name"),
                    last_name: row.get("last_name"),
                    push_tokens,
                    suspended: row.get::<i64, _>("suspended") != 0,
                }))
            }
            None => Ok(None),
        }
    }
}

/// Insert a profile row. Seeding aid for dev and test databases.
pub async fn insert_profile(pool: &SqlitePool, profile: &Profile) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO user_profiles (uid, phone_number, first_name, last_name, push_tokens, suspended)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&profile.uid)
    .bind(&profile.phone_number)
    .bind(&profile.first_name)
    .bind(&profile.last_name)
    .bind(serde_json::to_string(&profile.push_tokens)?)
    .bind(profile.suspended)
    .execute(pool)
    .await?;

    Ok(())
}
