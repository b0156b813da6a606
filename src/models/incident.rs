//! Incident rows and the records hanging off an incident.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Incident {
    pub incident_id: Uuid,
    pub case_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub weather: Option<String>,
    pub road_conditions: Option<String>,
    pub lighting: Option<String>,
    pub incident_type: String,
    pub incident_subtype: Option<String>,
    pub severity: String,
    pub description: Option<String>,
    pub cause_factors: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct IncidentVehicle {
    pub vehicle_id: Uuid,
    pub incident_id: Uuid,
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub license_plate: Option<String>,
    pub driver_name: Option<String>,
    pub owner_name: Option<String>,
    pub damage_description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct IncidentWitness {
    pub witness_id: Uuid,
    pub incident_id: Uuid,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub statement: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct IncidentEvidence {
    pub evidence_id: Uuid,
    pub incident_id: Uuid,
    pub evidence_type: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub collected_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PoliceReport {
    pub report_id: Uuid,
    pub incident_id: Uuid,
    pub report_number: String,
    pub agency: Option<String>,
    pub officer_name: Option<String>,
    pub officer_badge: Option<String>,
    pub report_date: Option<NaiveDate>,
    pub narrative: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Citation {
    pub citation_id: Uuid,
    pub report_id: Uuid,
    pub citation_number: String,
    pub statute: Option<String>,
    pub description: Option<String>,
    pub issued_to: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Police report with its citations loaded.
#[derive(Debug, Clone, Serialize)]
pub struct PoliceReportWithCitations {
    #[serde(flatten)]
    pub report: PoliceReport,
    pub citations: Vec<Citation>,
}

/// Incident with every owned collection loaded.
#[derive(Debug, Clone, Serialize)]
pub struct IncidentWithRelations {
    #[serde(flatten)]
    pub incident: Incident,
    pub vehicles: Vec<IncidentVehicle>,
    pub witnesses: Vec<IncidentWitness>,
    pub evidence: Vec<IncidentEvidence>,
    pub police_report: Option<PoliceReportWithCitations>,
}
