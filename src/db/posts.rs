//! Post storage.

use sqlx::sqlite::SqlitePool;

#[derive(Clone)]
pub struct PostStore {
    pool: SqlitePool,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Post {
    pub id: i64,
    pub uuid: String,
    pub user_id: i64,
    pub title: String,
    pub content: String,
    pub created_at: String,
    pub updated_at: String,
}

impl PostStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new post. Returns the post UUID.
    pub async fn create(
        &self,
        user_id: i64,
        title: &str,
        content: &str,
    ) -> Result<String, sqlx::Error> {
        let uuid = uuid::Uuid::new_v4().to_string();

        sqlx::query("INSERT INTO posts (uuid, user_id, title, content) VALUES (?, ?, ?, ?)")
            .bind(&uuid)
            .bind(user_id)
            .bind(title)
            .bind(content)
            .execute(&self.pool)
            .await?;

        Ok(uuid)
    }

    /// Get a post by UUID regardless of owner.
    /// Callers compare `user_id` themselves so they can tell "missing" from "not yours".
    pub async fn get_by_uuid(&self, uuid: &str) -> Result<Option<Post>, sqlx::Error> {
        sqlx::query_as(
            "SELECT id, uuid, user_id, title, content, created_at, updated_at
             FROM posts WHERE uuid = ?",
        )
        .bind(uuid)
        .fetch_optional(&self.pool)
        .await
    }

    /// List all posts for a user, newest first.
    pub async fn list_by_user(&self, user_id: i64) -> Result<Vec<Post>, sqlx::Error> {
        sqlx::query_as(
            "SELECT id, uuid, user_id, title, content, created_at, updated_at
             FROM posts WHERE user_id = ?
             ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    /// Update a post by UUID. Only updates if the post belongs to the given user.
    /// Returns true if the post was updated.
    pub async fn update(
        &self,
        uuid: &str,
        user_id: i64,
        title: &str,
        content: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE posts SET title = ?, content = ?, updated_at = datetime('now')
             WHERE uuid = ? AND user_id = ?",
        )
        .bind(title)
        .bind(content)
        .bind(uuid)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a post by UUID. Only deletes if the post belongs to the given user.
    /// Returns true if the post was deleted.
    pub async fn delete(&self, uuid: &str, user_id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM posts WHERE uuid = ? AND user_id = ?")
            .bind(uuid)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
