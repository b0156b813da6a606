//! Insurance policies, claims, and the derived summary shapes.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InsurancePolicy {
    pub policy_id: Uuid,
    pub case_id: Uuid,
    pub policy_type: String,
    pub company: String,
    pub policy_number: String,
    pub holder_name: String,
    pub effective_date: Option<NaiveDate>,
    pub expiration_date: Option<NaiveDate>,
    pub premium: Option<Decimal>,
    pub deductible: Option<Decimal>,
    pub coverage_limits: Option<JsonValue>,
    pub status: String,
    pub agent_name: Option<String>,
    pub agent_phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InsuranceClaim {
    pub claim_id: Uuid,
    pub policy_id: Uuid,
    pub claim_number: String,
    pub date_reported: Option<NaiveDate>,
    pub status: String,
    pub amount: Option<Decimal>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Policy with its claims loaded.
#[derive(Debug, Clone, Serialize)]
pub struct PolicyWithClaims {
    #[serde(flatten)]
    pub policy: InsurancePolicy,
    pub claims: Vec<InsuranceClaim>,
}

#[derive(Debug, Clone, Serialize, FromRow, PartialEq)]
pub struct ClaimStatusGroup {
    pub status: String,
    pub count: i64,
    pub total_amount: Decimal,
}

#[derive(Debug, Clone, Serialize, FromRow, PartialEq)]
pub struct PolicyTypeGroup {
    pub policy_type: String,
    pub count: i64,
    pub total_premium: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct InsuranceSummary {
    pub policy_count: i64,
    pub claim_count: i64,
    pub total_claim_amount: Decimal,
    pub average_claim_amount: Decimal,
    pub claims_by_status: Vec<ClaimStatusGroup>,
    pub policies_by_type: Vec<PolicyTypeGroup>,
}

/// One coverage bucket in the coverage analysis.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CoverageBucket {
    pub present: bool,
    pub policies: Vec<CoveragePolicy>,
    pub open_claims: i64,
}

/// Projection of a policy inside a coverage bucket.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CoveragePolicy {
    pub policy_id: Uuid,
    pub policy_type: String,
    pub company: String,
    pub policy_number: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CoverageAnalysis {
    pub auto: CoverageBucket,
    pub health: CoverageBucket,
    pub liability: CoverageBucket,
    pub umbrella: CoverageBucket,
    pub gaps: Vec<String>,
    pub recommendations: Vec<String>,
}
