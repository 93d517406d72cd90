//! Database repository for the publish ledger.

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::posts::{NewPost, Post},
};
use crate::types::PostId;
use chrono::{DateTime, Utc};
use sqlx::{Connection, SqliteConnection};
use tracing::instrument;

pub struct Posts<'c> {
    db: &'c mut SqliteConnection,
}

impl<'c> Posts<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }

    /// Record a successful publish: posting -> posted. Platforms without a
    /// usable remote identifier leave `platform_post_id` null.
    #[instrument(skip(self, platform_post_id), fields(post_id = id), err)]
    pub async fn mark_posted(
        &mut self,
        id: PostId,
        posted_at: DateTime<Utc>,
        platform_post_id: Option<&str>,
    ) -> Result<Post> {
        let mut tx = self.db.begin().await?;
        let post = sqlx::query_as::<_, Post>(
            r#"
            UPDATE posts
            SET status = 'posted', posted_at = $2, platform_post_id = $3
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(posted_at)
        .bind(platform_post_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(DbError::NotFound)?;
        tx.commit().await?;

        Ok(post)
    }

    /// Record a failed publish: posting -> error.
    #[instrument(skip(self, detail), fields(post_id = id), err)]
    pub async fn mark_error(&mut self, id: PostId, detail: &str) -> Result<Post> {
        let mut tx = self.db.begin().await?;
        let post = sqlx::query_as::<_, Post>(
            r#"
            UPDATE posts
            SET status = 'error', error = $2
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(detail)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(DbError::NotFound)?;
        tx.commit().await?;

        Ok(post)
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Posts<'c> {
    type CreateRequest = NewPost;
    type Response = Post;
    type Id = PostId;

    #[instrument(skip(self, request), fields(platform = %request.platform), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let mut tx = self.db.begin().await?;
        let post = sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO posts (platform, caption, status, scheduled_time, media_path, branded_path)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(&request.platform)
        .bind(&request.caption)
        .bind(request.status)
        .bind(request.scheduled_time)
        .bind(&request.media_path)
        .bind(&request.branded_path)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(post)
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let post = sqlx::query_as::<_, Post>("SELECT * FROM posts WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(post)
    }

    #[instrument(skip(self), err)]
    async fn recent(&mut self, limit: i64) -> Result<Vec<Self::Response>> {
        let posts = sqlx::query_as::<_, Post>("SELECT * FROM posts ORDER BY id DESC LIMIT $1")
            .bind(limit)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(posts)
    }
}
