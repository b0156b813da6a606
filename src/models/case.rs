//! Case rows, assignments, tasks and notes.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::client::Client;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Case {
    pub case_id: Uuid,
    pub case_number: String,
    pub title: String,
    pub case_type: String,
    pub status: String,
    pub date_of_loss: Option<NaiveDate>,
    pub description: Option<String>,
    pub referral_source: Option<String>,
    pub client_id: Uuid,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Shallow projection of a staff user for embedding in responses.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserSummary {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
}

/// Assignment joined with the assigned user's summary.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AssignmentWithUser {
    pub assignment_id: Uuid,
    pub case_id: Uuid,
    pub user_id: Uuid,
    pub role: String,
    pub assigned_at: DateTime<Utc>,
    pub user_name: String,
    pub user_email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CaseTask {
    pub task_id: Uuid,
    pub case_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub priority: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub assigned_to: Option<Uuid>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CaseNote {
    pub note_id: Uuid,
    pub case_id: Uuid,
    pub body: String,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Case with its direct relation graph loaded.
#[derive(Debug, Clone, Serialize)]
pub struct CaseWithRelations {
    #[serde(flatten)]
    pub case: Case,
    pub client: Client,
    pub creator: UserSummary,
    pub assignments: Vec<AssignmentWithUser>,
}

/// One entry in the case timeline, normalized across tasks, notes and
/// documents.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TimelineEntry {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub date: DateTime<Utc>,
    pub user: Option<String>,
    pub status: Option<String>,
}

/// Derived statistics attached to the case overview.
#[derive(Debug, Clone, Serialize)]
pub struct CaseStatistics {
    pub total_medical_bills: rust_decimal::Decimal,
    pub document_count: i64,
    pub tasks_by_status: Vec<StatusCount>,
    pub policies: Vec<PolicyProjection>,
    pub case_age_days: Option<i64>,
}

#[derive(Debug, Clone, Serialize, FromRow, PartialEq)]
pub struct StatusCount {
    pub status: String,
    pub count: i64,
}

/// Lightweight policy projection for the overview payload.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PolicyProjection {
    pub policy_id: Uuid,
    pub policy_type: String,
    pub company: String,
    pub policy_number: String,
    pub status: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CaseOverview {
    #[serde(flatten)]
    pub case: CaseWithRelations,
    pub statistics: CaseStatistics,
}
