//! Medical treatment rows: providers, records and injuries.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MedicalProvider {
    pub provider_id: Uuid,
    pub case_id: Uuid,
    pub name: String,
    pub provider_type: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub first_treatment: Option<NaiveDate>,
    pub last_treatment: Option<NaiveDate>,
    /// Denormalized sum of this provider's record costs, maintained in the
    /// same transaction as any record write.
    pub total_bills: Decimal,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MedicalRecord {
    pub record_id: Uuid,
    pub case_id: Uuid,
    pub provider_id: Option<Uuid>,
    pub record_date: NaiveDate,
    pub record_type: String,
    pub description: Option<String>,
    pub cost: Option<Decimal>,
    pub bill_received: bool,
    pub records_received: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Injury {
    pub injury_id: Uuid,
    pub case_id: Uuid,
    pub body_part: String,
    pub description: Option<String>,
    pub severity: String,
    pub resolved: bool,
    pub narrative_status: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Provider with its records loaded.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderWithRecords {
    #[serde(flatten)]
    pub provider: MedicalProvider,
    pub records: Vec<MedicalRecord>,
}

/// Injuries grouped by severity with a resolved/active split.
#[derive(Debug, Clone, Serialize, FromRow, PartialEq)]
pub struct InjurySeverityGroup {
    pub severity: String,
    pub total: i64,
    pub resolved: i64,
    pub active: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MedicalSummary {
    pub provider_count: i64,
    pub record_count: i64,
    pub injuries_by_severity: Vec<InjurySeverityGroup>,
    pub total_bills: Decimal,
}
