//! Insurance service: policies, claims, the insurance summary, and the
//! rule-based coverage analysis.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{
    ClaimStatus, ClaimStatusGroup, CoverageAnalysis, CoverageBucket, CoveragePolicy,
    InsuranceClaim, InsurancePolicy, InsuranceSummary, PolicyStatus, PolicyType, PolicyTypeGroup,
    PolicyWithClaims,
};

const POLICY_COLUMNS: &str = "policy_id, case_id, policy_type, company, policy_number, \
     holder_name, effective_date, expiration_date, premium, deductible, coverage_limits, status, \
     agent_name, agent_phone, created_at, updated_at";

const CLAIM_COLUMNS: &str = "claim_id, policy_id, claim_number, date_reported, status, amount, \
     description, created_at, updated_at";

#[derive(Debug, Clone, Deserialize)]
pub struct NewPolicy {
    pub policy_type: String,
    pub company: String,
    pub policy_number: String,
    pub holder_name: String,
    pub effective_date: Option<NaiveDate>,
    pub expiration_date: Option<NaiveDate>,
    pub premium: Option<Decimal>,
    pub deductible: Option<Decimal>,
    pub coverage_limits: Option<JsonValue>,
    pub status: Option<String>,
    pub agent_name: Option<String>,
    pub agent_phone: Option<String>,
}

impl NewPolicy {
    pub fn validate(&self) -> AppResult<()> {
        self.policy_type.parse::<PolicyType>()?;
        if let Some(status) = &self.status {
            status.parse::<PolicyStatus>()?;
        }
        for (field, value) in [
            ("company", &self.company),
            ("policy_number", &self.policy_number),
            ("holder_name", &self.holder_name),
        ] {
            if value.trim().is_empty() {
                return Err(AppError::Validation(format!("{field} must not be empty")));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PolicyUpdate {
    pub policy_type: Option<String>,
    pub company: Option<String>,
    pub policy_number: Option<String>,
    pub holder_name: Option<String>,
    pub effective_date: Option<NaiveDate>,
    pub expiration_date: Option<NaiveDate>,
    pub premium: Option<Decimal>,
    pub deductible: Option<Decimal>,
    pub coverage_limits: Option<JsonValue>,
    pub status: Option<String>,
    pub agent_name: Option<String>,
    pub agent_phone: Option<String>,
}

impl PolicyUpdate {
    pub fn validate(&self) -> AppResult<()> {
        if let Some(policy_type) = &self.policy_type {
            policy_type.parse::<PolicyType>()?;
        }
        if let Some(status) = &self.status {
            status.parse::<PolicyStatus>()?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewClaim {
    pub claim_number: String,
    pub date_reported: Option<NaiveDate>,
    pub status: Option<String>,
    pub amount: Option<Decimal>,
    pub description: Option<String>,
}

impl NewClaim {
    pub fn validate(&self) -> AppResult<()> {
        if self.claim_number.trim().is_empty() {
            return Err(AppError::Validation("claim_number must not be empty".into()));
        }
        if let Some(status) = &self.status {
            status.parse::<ClaimStatus>()?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClaimUpdate {
    pub claim_number: Option<String>,
    pub date_reported: Option<NaiveDate>,
    pub status: Option<String>,
    pub amount: Option<Decimal>,
    pub description: Option<String>,
}

impl ClaimUpdate {
    pub fn validate(&self) -> AppResult<()> {
        if let Some(status) = &self.status {
            status.parse::<ClaimStatus>()?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct InsuranceService {
    pool: PgPool,
}

impl InsuranceService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_policy(&self, case_id: Uuid, new: NewPolicy) -> AppResult<InsurancePolicy> {
        new.validate()?;
        self.ensure_case(case_id).await?;

        let status = new.status.unwrap_or_else(|| PolicyStatus::Active.to_string());
        let policy = sqlx::query_as::<_, InsurancePolicy>(&format!(
            "INSERT INTO insurance_policies (policy_id, case_id, policy_type, company, \
                 policy_number, holder_name, effective_date, expiration_date, premium, deductible, \
                 coverage_limits, status, agent_name, agent_phone, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, now(), now()) \
             RETURNING {POLICY_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(case_id)
        .bind(&new.policy_type)
        .bind(&new.company)
        .bind(&new.policy_number)
        .bind(&new.holder_name)
        .bind(new.effective_date)
        .bind(new.expiration_date)
        .bind(new.premium)
        .bind(new.deductible)
        .bind(&new.coverage_limits)
        .bind(&status)
        .bind(&new.agent_name)
        .bind(&new.agent_phone)
        .fetch_one(&self.pool)
        .await?;

        info!("Created {} policy {} on case {}", policy.policy_type, policy.policy_id, case_id);
        Ok(policy)
    }

    pub async fn list_policies(&self, case_id: Uuid) -> AppResult<Vec<PolicyWithClaims>> {
        self.ensure_case(case_id).await?;

        let policies = sqlx::query_as::<_, InsurancePolicy>(&format!(
            "SELECT {POLICY_COLUMNS} FROM insurance_policies \
             WHERE case_id = $1 ORDER BY created_at"
        ))
        .bind(case_id)
        .fetch_all(&self.pool)
        .await?;

        let mut result = Vec::with_capacity(policies.len());
        for policy in policies {
            let claims = sqlx::query_as::<_, InsuranceClaim>(&format!(
                "SELECT {CLAIM_COLUMNS} FROM insurance_claims \
                 WHERE policy_id = $1 ORDER BY created_at"
            ))
            .bind(policy.policy_id)
            .fetch_all(&self.pool)
            .await?;
            result.push(PolicyWithClaims { policy, claims });
        }
        Ok(result)
    }

    pub async fn update_policy(
        &self,
        policy_id: Uuid,
        update: PolicyUpdate,
    ) -> AppResult<InsurancePolicy> {
        update.validate()?;

        let policy = sqlx::query_as::<_, InsurancePolicy>(&format!(
            "UPDATE insurance_policies SET \
                 policy_type = COALESCE($2, policy_type), \
                 company = COALESCE($3, company), \
                 policy_number = COALESCE($4, policy_number), \
                 holder_name = COALESCE($5, holder_name), \
                 effective_date = COALESCE($6, effective_date), \
                 expiration_date = COALESCE($7, expiration_date), \
                 premium = COALESCE($8, premium), \
                 deductible = COALESCE($9, deductible), \
                 coverage_limits = COALESCE($10, coverage_limits), \
                 status = COALESCE($11, status), \
                 agent_name = COALESCE($12, agent_name), \
                 agent_phone = COALESCE($13, agent_phone), \
                 updated_at = now() \
             WHERE policy_id = $1 \
             RETURNING {POLICY_COLUMNS}"
        ))
        .bind(policy_id)
        .bind(&update.policy_type)
        .bind(&update.company)
        .bind(&update.policy_number)
        .bind(&update.holder_name)
        .bind(update.effective_date)
        .bind(update.expiration_date)
        .bind(update.premium)
        .bind(update.deductible)
        .bind(&update.coverage_limits)
        .bind(&update.status)
        .bind(&update.agent_name)
        .bind(&update.agent_phone)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound("policy"))?;

        Ok(policy)
    }

    pub async fn delete_policy(&self, policy_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM insurance_policies WHERE policy_id = $1")
            .bind(policy_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("policy"));
        }
        info!("Deleted policy {}", policy_id);
        Ok(())
    }

    pub async fn create_claim(&self, policy_id: Uuid, new: NewClaim) -> AppResult<InsuranceClaim> {
        new.validate()?;

        let policy_exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM insurance_policies WHERE policy_id = $1)",
        )
        .bind(policy_id)
        .fetch_one(&self.pool)
        .await?;
        if !policy_exists {
            return Err(AppError::NotFound("policy"));
        }

        let status = new.status.unwrap_or_else(|| ClaimStatus::Open.to_string());
        let claim = sqlx::query_as::<_, InsuranceClaim>(&format!(
            "INSERT INTO insurance_claims (claim_id, policy_id, claim_number, date_reported, \
                 status, amount, description, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, now(), now()) \
             RETURNING {CLAIM_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(policy_id)
        .bind(&new.claim_number)
        .bind(new.date_reported)
        .bind(&status)
        .bind(new.amount)
        .bind(&new.description)
        .fetch_one(&self.pool)
        .await?;

        info!("Created claim {} on policy {}", claim.claim_number, policy_id);
        Ok(claim)
    }

    pub async fn update_claim(
        &self,
        claim_id: Uuid,
        update: ClaimUpdate,
    ) -> AppResult<InsuranceClaim> {
        update.validate()?;

        let claim = sqlx::query_as::<_, InsuranceClaim>(&format!(
            "UPDATE insurance_claims SET \
                 claim_number = COALESCE($2, claim_number), \
                 date_reported = COALESCE($3, date_reported), \
                 status = COALESCE($4, status), \
                 amount = COALESCE($5, amount), \
                 description = COALESCE($6, description), \
                 updated_at = now() \
             WHERE claim_id = $1 \
             RETURNING {CLAIM_COLUMNS}"
        ))
        .bind(claim_id)
        .bind(&update.claim_number)
        .bind(update.date_reported)
        .bind(&update.status)
        .bind(update.amount)
        .bind(&update.description)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound("claim"))?;

        Ok(claim)
    }

    pub async fn delete_claim(&self, claim_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM insurance_claims WHERE claim_id = $1")
            .bind(claim_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("claim"));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Aggregations
    // ------------------------------------------------------------------

    pub async fn summary(&self, case_id: Uuid) -> AppResult<InsuranceSummary> {
        self.ensure_case(case_id).await?;

        let policy_count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM insurance_policies WHERE case_id = $1",
        )
        .bind(case_id)
        .fetch_one(&self.pool);

        let claim_totals = sqlx::query_as::<_, (i64, Decimal)>(
            "SELECT COUNT(*), COALESCE(SUM(c.amount), 0) \
             FROM insurance_claims c \
             JOIN insurance_policies p ON p.policy_id = c.policy_id \
             WHERE p.case_id = $1",
        )
        .bind(case_id)
        .fetch_one(&self.pool);

        let claims_by_status = sqlx::query_as::<_, ClaimStatusGroup>(
            "SELECT c.status, COUNT(*) AS count, COALESCE(SUM(c.amount), 0) AS total_amount \
             FROM insurance_claims c \
             JOIN insurance_policies p ON p.policy_id = c.policy_id \
             WHERE p.case_id = $1 GROUP BY c.status ORDER BY c.status",
        )
        .bind(case_id)
        .fetch_all(&self.pool);

        let policies_by_type = sqlx::query_as::<_, PolicyTypeGroup>(
            "SELECT policy_type, COUNT(*) AS count, COALESCE(SUM(premium), 0) AS total_premium \
             FROM insurance_policies \
             WHERE case_id = $1 GROUP BY policy_type ORDER BY policy_type",
        )
        .bind(case_id)
        .fetch_all(&self.pool);

        let (policy_count, (claim_count, total_claim_amount), claims_by_status, policies_by_type) =
            tokio::try_join!(policy_count, claim_totals, claims_by_status, policies_by_type)?;

        let average_claim_amount = if claim_count > 0 {
            total_claim_amount / Decimal::from(claim_count)
        } else {
            Decimal::ZERO
        };

        Ok(InsuranceSummary {
            policy_count,
            claim_count,
            total_claim_amount,
            average_claim_amount,
            claims_by_status,
            policies_by_type,
        })
    }

    pub async fn coverage_analysis(&self, case_id: Uuid) -> AppResult<CoverageAnalysis> {
        self.ensure_case(case_id).await?;

        let policies_sql = format!(
            "SELECT {POLICY_COLUMNS} FROM insurance_policies \
             WHERE case_id = $1 ORDER BY created_at"
        );
        let policies = sqlx::query_as::<_, InsurancePolicy>(&policies_sql)
            .bind(case_id)
            .fetch_all(&self.pool);

        let claims_sql = format!(
            "SELECT {CLAIM_COLUMNS} FROM insurance_claims \
             WHERE policy_id IN (SELECT policy_id FROM insurance_policies WHERE case_id = $1)"
        );
        let claims = sqlx::query_as::<_, InsuranceClaim>(&claims_sql)
            .bind(case_id)
            .fetch_all(&self.pool);

        let (policies, claims) = tokio::try_join!(policies, claims)?;
        Ok(analyze_coverage(&policies, &claims))
    }

    async fn ensure_case(&self, case_id: Uuid) -> AppResult<()> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM cases WHERE case_id = $1)")
                .bind(case_id)
                .fetch_one(&self.pool)
                .await?;
        if exists {
            Ok(())
        } else {
            Err(AppError::NotFound("case"))
        }
    }
}

/// Fixed, rule-based coverage checklist over the case's policies.
fn analyze_coverage(policies: &[InsurancePolicy], claims: &[InsuranceClaim]) -> CoverageAnalysis {
    let bucket = |wanted: PolicyType| -> CoverageBucket {
        let selected: Vec<&InsurancePolicy> = policies
            .iter()
            .filter(|p| p.policy_type.parse::<PolicyType>() == Ok(wanted))
            .collect();

        let open_claims = claims
            .iter()
            .filter(|c| {
                matches!(
                    c.status.parse::<ClaimStatus>(),
                    Ok(ClaimStatus::Open) | Ok(ClaimStatus::Pending)
                ) && selected.iter().any(|p| p.policy_id == c.policy_id)
            })
            .count() as i64;

        CoverageBucket {
            present: !selected.is_empty(),
            policies: selected
                .iter()
                .map(|p| CoveragePolicy {
                    policy_id: p.policy_id,
                    policy_type: p.policy_type.clone(),
                    company: p.company.clone(),
                    policy_number: p.policy_number.clone(),
                })
                .collect(),
            open_claims,
        }
    };

    let auto = bucket(PolicyType::Auto);
    let health = bucket(PolicyType::Health);
    let liability = bucket(PolicyType::Liability);
    let umbrella = bucket(PolicyType::Umbrella);

    let mut gaps = Vec::new();
    let mut recommendations = Vec::new();
    if !auto.present {
        gaps.push("No auto insurance coverage identified".to_string());
        recommendations
            .push("Investigate auto insurance for all vehicles involved in the incident".to_string());
    }
    if !health.present {
        gaps.push("No health insurance coverage identified".to_string());
        recommendations
            .push("Confirm the client's health insurance for medical billing".to_string());
    }
    if !liability.present && !umbrella.present {
        gaps.push("No liability or umbrella coverage identified".to_string());
        recommendations.push(
            "Evaluate third-party liability and umbrella policies as additional recovery sources"
                .to_string(),
        );
    }

    CoverageAnalysis {
        auto,
        health,
        liability,
        umbrella,
        gaps,
        recommendations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn policy(policy_type: &str) -> InsurancePolicy {
        InsurancePolicy {
            policy_id: Uuid::new_v4(),
            case_id: Uuid::new_v4(),
            policy_type: policy_type.to_string(),
            company: "Acme Mutual".to_string(),
            policy_number: "P-100".to_string(),
            holder_name: "Pat Doe".to_string(),
            effective_date: None,
            expiration_date: None,
            premium: None,
            deductible: None,
            coverage_limits: None,
            status: "active".to_string(),
            agent_name: None,
            agent_phone: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn claim(policy_id: Uuid, status: &str) -> InsuranceClaim {
        InsuranceClaim {
            claim_id: Uuid::new_v4(),
            policy_id,
            claim_number: "C-1".to_string(),
            date_reported: None,
            status: status.to_string(),
            amount: None,
            description: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn health_only_case_reports_auto_and_liability_gaps() {
        let analysis = analyze_coverage(&[policy("health")], &[]);

        assert!(analysis.health.present);
        assert!(!analysis.auto.present);
        assert!(!analysis.liability.present);
        assert!(!analysis.umbrella.present);

        assert_eq!(analysis.gaps.len(), 2);
        assert!(analysis.gaps.iter().any(|g| g.contains("auto")));
        assert!(analysis.gaps.iter().any(|g| g.contains("liability or umbrella")));
        assert!(!analysis.gaps.iter().any(|g| g.contains("health")));
        assert_eq!(analysis.recommendations.len(), 2);
    }

    #[test]
    fn umbrella_satisfies_the_liability_check() {
        let analysis = analyze_coverage(&[policy("auto"), policy("health"), policy("umbrella")], &[]);
        assert!(analysis.gaps.is_empty());
        assert!(analysis.recommendations.is_empty());
    }

    #[test]
    fn open_and_pending_claims_are_counted_per_bucket() {
        let auto_policy = policy("auto");
        let claims = vec![
            claim(auto_policy.policy_id, "open"),
            claim(auto_policy.policy_id, "pending"),
            claim(auto_policy.policy_id, "denied"),
            claim(Uuid::new_v4(), "open"),
        ];
        let analysis = analyze_coverage(&[auto_policy], &claims);
        assert_eq!(analysis.auto.open_claims, 2);
        assert_eq!(analysis.auto.policies.len(), 1);
    }
}
