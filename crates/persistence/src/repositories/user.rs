//! User directory repository.

use async_trait::async_trait;
use domain::models::User;
use domain::ports::{StoreResult, UserDirectory};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::UserEntity;
use crate::metrics::QueryTimer;

/// Repository for users and user_friends.
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Inserts or refreshes a user profile.
    pub async fn upsert_user(&self, user: &User) -> Result<(), sqlx::Error> {
        let timer = QueryTimer::new("upsert_user");
        let result = sqlx::query(
            r#"
            INSERT INTO users (id, display_name, is_pro)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE SET display_name = EXCLUDED.display_name, is_pro = EXCLUDED.is_pro
            "#,
        )
        .bind(user.id)
        .bind(&user.display_name)
        .bind(user.is_pro)
        .execute(&self.pool)
        .await;
        timer.finish(&result);
        result.map(|_| ())
    }

    /// Records a friendship in both directions.
    pub async fn add_friendship(&self, user_a: Uuid, user_b: Uuid) -> Result<(), sqlx::Error> {
        let timer = QueryTimer::new("add_friendship");
        let result = sqlx::query(
            r#"
            INSERT INTO user_friends (user_id, friend_id)
            VALUES ($1, $2), ($2, $1)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(user_a)
        .bind(user_b)
        .execute(&self.pool)
        .await;
        timer.finish(&result);
        result.map(|_| ())
    }
}

#[async_trait]
impl UserDirectory for UserRepository {
    async fn find_user(&self, user_id: Uuid) -> StoreResult<Option<User>> {
        let timer = QueryTimer::new("find_user");
        let result = sqlx::query_as::<_, UserEntity>(
            "SELECT id, display_name, is_pro FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await;
        timer.finish(&result);
        Ok(result?.map(Into::into))
    }

    async fn are_friends(&self, user_a: Uuid, user_b: Uuid) -> StoreResult<bool> {
        let timer = QueryTimer::new("are_friends");
        let result: Result<bool, sqlx::Error> = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM user_friends WHERE user_id = $1 AND friend_id = $2)",
        )
        .bind(user_a)
        .bind(user_b)
        .fetch_one(&self.pool)
        .await;
        timer.finish(&result);
        Ok(result?)
    }
}
