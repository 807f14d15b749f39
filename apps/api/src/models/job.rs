use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct JobRow {
    pub id: Uuid,
    pub title: String,
    pub company: String,
    pub description: String,
    pub required_skills: Vec<String>,
    pub min_experience: Option<i32>,
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
}
