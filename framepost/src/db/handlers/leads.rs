//! Database repository for the lead ledger.

use crate::db::{
    errors::Result,
    handlers::repository::Repository,
    models::leads::{Lead, NewLead},
};
use crate::types::LeadId;
use chrono::Utc;
use sqlx::{Connection, SqliteConnection};
use tracing::instrument;

pub struct Leads<'c> {
    db: &'c mut SqliteConnection,
}

impl<'c> Leads<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Leads<'c> {
    type CreateRequest = NewLead;
    type Response = Lead;
    type Id = LeadId;

    #[instrument(skip(self, request), fields(email = %request.email), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let mut tx = self.db.begin().await?;
        let lead = sqlx::query_as::<_, Lead>(
            r#"
            INSERT INTO leads (name, email, phone, service, message, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(&request.name)
        .bind(&request.email)
        .bind(&request.phone)
        .bind(&request.service)
        .bind(&request.message)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(lead)
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let lead = sqlx::query_as::<_, Lead>("SELECT * FROM leads WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(lead)
    }

    #[instrument(skip(self), err)]
    async fn recent(&mut self, limit: i64) -> Result<Vec<Self::Response>> {
        let leads = sqlx::query_as::<_, Lead>("SELECT * FROM leads ORDER BY id DESC LIMIT $1")
            .bind(limit)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(leads)
    }
}
