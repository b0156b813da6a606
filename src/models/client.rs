//! Client rows and the sub-records a client owns.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Client {
    pub client_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub middle_name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub government_id: Option<String>,
    pub gender: Option<String>,
    pub marital_status: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ClientContact {
    pub contact_id: Uuid,
    pub client_id: Uuid,
    pub kind: String,
    pub value: String,
    pub is_primary: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EmergencyContact {
    pub contact_id: Uuid,
    pub client_id: Uuid,
    pub name: String,
    pub relationship: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FamilyMember {
    pub member_id: Uuid,
    pub client_id: Uuid,
    pub name: String,
    pub relationship: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Employment {
    pub employment_id: Uuid,
    pub client_id: Uuid,
    pub employer: String,
    pub occupation: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub annual_income: Option<Decimal>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CommunicationPreferences {
    pub client_id: Uuid,
    pub preferred_method: String,
    pub do_not_contact: bool,
    pub notes: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Client with its directly owned records loaded.
#[derive(Debug, Clone, Serialize)]
pub struct ClientWithRelations {
    #[serde(flatten)]
    pub client: Client,
    pub contacts: Vec<ClientContact>,
    pub emergency_contacts: Vec<EmergencyContact>,
    pub family_members: Vec<FamilyMember>,
    pub employments: Vec<Employment>,
    pub communication_preferences: Option<CommunicationPreferences>,
}
