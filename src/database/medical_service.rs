//! Medical service: providers, billable records, injuries, and the medical
//! summary.
//!
//! `medical_providers.total_bills` is denormalized; every record write that
//! can move it recomputes the sum inside the same transaction.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::info;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{
    Injury, InjurySeverity, InjurySeverityGroup, MedicalProvider, MedicalRecord, MedicalSummary,
    ProviderStatus, ProviderWithRecords,
};

const PROVIDER_COLUMNS: &str = "provider_id, case_id, name, provider_type, phone, address, \
     first_treatment, last_treatment, total_bills, status, created_at, updated_at";

const RECORD_COLUMNS: &str = "record_id, case_id, provider_id, record_date, record_type, \
     description, cost, bill_received, records_received, created_at, updated_at";

const INJURY_COLUMNS: &str = "injury_id, case_id, body_part, description, severity, resolved, \
     narrative_status, created_at, updated_at";

#[derive(Debug, Clone, Deserialize)]
pub struct NewProvider {
    pub name: String,
    pub provider_type: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub first_treatment: Option<NaiveDate>,
    pub last_treatment: Option<NaiveDate>,
    pub status: Option<String>,
}

impl NewProvider {
    pub fn validate(&self) -> AppResult<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::Validation("name must not be empty".into()));
        }
        if let Some(status) = &self.status {
            status.parse::<ProviderStatus>()?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderUpdate {
    pub name: Option<String>,
    pub provider_type: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub first_treatment: Option<NaiveDate>,
    pub last_treatment: Option<NaiveDate>,
    pub status: Option<String>,
}

impl ProviderUpdate {
    pub fn validate(&self) -> AppResult<()> {
        if let Some(status) = &self.status {
            status.parse::<ProviderStatus>()?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewRecord {
    pub provider_id: Option<Uuid>,
    pub record_date: NaiveDate,
    pub record_type: String,
    pub description: Option<String>,
    pub cost: Option<Decimal>,
    #[serde(default)]
    pub bill_received: bool,
    #[serde(default)]
    pub records_received: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordUpdate {
    pub provider_id: Option<Uuid>,
    pub record_date: Option<NaiveDate>,
    pub record_type: Option<String>,
    pub description: Option<String>,
    pub cost: Option<Decimal>,
    pub bill_received: Option<bool>,
    pub records_received: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewInjury {
    pub body_part: String,
    pub description: Option<String>,
    pub severity: String,
    #[serde(default)]
    pub resolved: bool,
    pub narrative_status: Option<String>,
}

impl NewInjury {
    pub fn validate(&self) -> AppResult<()> {
        if self.body_part.trim().is_empty() {
            return Err(AppError::Validation("body_part must not be empty".into()));
        }
        self.severity.parse::<InjurySeverity>()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InjuryUpdate {
    pub body_part: Option<String>,
    pub description: Option<String>,
    pub severity: Option<String>,
    pub resolved: Option<bool>,
    pub narrative_status: Option<String>,
}

impl InjuryUpdate {
    pub fn validate(&self) -> AppResult<()> {
        if let Some(severity) = &self.severity {
            severity.parse::<InjurySeverity>()?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct MedicalService {
    pool: PgPool,
}

impl MedicalService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ------------------------------------------------------------------
    // Providers
    // ------------------------------------------------------------------

    pub async fn create_provider(
        &self,
        case_id: Uuid,
        new: NewProvider,
    ) -> AppResult<MedicalProvider> {
        new.validate()?;
        self.ensure_case(case_id).await?;

        let status = new.status.unwrap_or_else(|| ProviderStatus::Active.to_string());
        let provider = sqlx::query_as::<_, MedicalProvider>(&format!(
            "INSERT INTO medical_providers (provider_id, case_id, name, provider_type, phone, \
                 address, first_treatment, last_treatment, total_bills, status, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 0, $9, now(), now()) \
             RETURNING {PROVIDER_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(case_id)
        .bind(&new.name)
        .bind(&new.provider_type)
        .bind(&new.phone)
        .bind(&new.address)
        .bind(new.first_treatment)
        .bind(new.last_treatment)
        .bind(&status)
        .fetch_one(&self.pool)
        .await?;

        info!("Created provider '{}' on case {}", provider.name, case_id);
        Ok(provider)
    }

    pub async fn list_providers(&self, case_id: Uuid) -> AppResult<Vec<ProviderWithRecords>> {
        self.ensure_case(case_id).await?;

        let providers = sqlx::query_as::<_, MedicalProvider>(&format!(
            "SELECT {PROVIDER_COLUMNS} FROM medical_providers \
             WHERE case_id = $1 ORDER BY created_at"
        ))
        .bind(case_id)
        .fetch_all(&self.pool)
        .await?;

        let mut result = Vec::with_capacity(providers.len());
        for provider in providers {
            let records = sqlx::query_as::<_, MedicalRecord>(&format!(
                "SELECT {RECORD_COLUMNS} FROM medical_records \
                 WHERE provider_id = $1 ORDER BY record_date DESC"
            ))
            .bind(provider.provider_id)
            .fetch_all(&self.pool)
            .await?;
            result.push(ProviderWithRecords { provider, records });
        }
        Ok(result)
    }

    pub async fn get_provider(&self, provider_id: Uuid) -> AppResult<ProviderWithRecords> {
        let provider = self.fetch_provider(provider_id).await?;
        let records = sqlx::query_as::<_, MedicalRecord>(&format!(
            "SELECT {RECORD_COLUMNS} FROM medical_records \
             WHERE provider_id = $1 ORDER BY record_date DESC"
        ))
        .bind(provider_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ProviderWithRecords { provider, records })
    }

    pub async fn update_provider(
        &self,
        provider_id: Uuid,
        update: ProviderUpdate,
    ) -> AppResult<MedicalProvider> {
        update.validate()?;

        let provider = sqlx::query_as::<_, MedicalProvider>(&format!(
            "UPDATE medical_providers SET \
                 name = COALESCE($2, name), \
                 provider_type = COALESCE($3, provider_type), \
                 phone = COALESCE($4, phone), \
                 address = COALESCE($5, address), \
                 first_treatment = COALESCE($6, first_treatment), \
                 last_treatment = COALESCE($7, last_treatment), \
                 status = COALESCE($8, status), \
                 updated_at = now() \
             WHERE provider_id = $1 \
             RETURNING {PROVIDER_COLUMNS}"
        ))
        .bind(provider_id)
        .bind(&update.name)
        .bind(&update.provider_type)
        .bind(&update.phone)
        .bind(&update.address)
        .bind(update.first_treatment)
        .bind(update.last_treatment)
        .bind(&update.status)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound("provider"))?;

        Ok(provider)
    }

    pub async fn delete_provider(&self, provider_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM medical_providers WHERE provider_id = $1")
            .bind(provider_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("provider"));
        }
        info!("Deleted provider {}", provider_id);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Records
    // ------------------------------------------------------------------

    pub async fn create_record(&self, case_id: Uuid, new: NewRecord) -> AppResult<MedicalRecord> {
        if new.record_type.trim().is_empty() {
            return Err(AppError::Validation("record_type must not be empty".into()));
        }
        self.ensure_case(case_id).await?;

        if let Some(provider_id) = new.provider_id {
            let provider = self.fetch_provider(provider_id).await?;
            if provider.case_id != case_id {
                return Err(AppError::BadRequest(
                    "provider belongs to a different case".into(),
                ));
            }
        }

        let mut tx = self.pool.begin().await?;

        let record = sqlx::query_as::<_, MedicalRecord>(&format!(
            "INSERT INTO medical_records (record_id, case_id, provider_id, record_date, \
                 record_type, description, cost, bill_received, records_received, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, now(), now()) \
             RETURNING {RECORD_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(case_id)
        .bind(new.provider_id)
        .bind(new.record_date)
        .bind(&new.record_type)
        .bind(&new.description)
        .bind(new.cost)
        .bind(new.bill_received)
        .bind(new.records_received)
        .fetch_one(&mut *tx)
        .await?;

        if let Some(provider_id) = record.provider_id {
            recompute_total_bills(&mut tx, provider_id).await?;
        }

        tx.commit().await?;

        info!("Created medical record {} on case {}", record.record_id, case_id);
        Ok(record)
    }

    pub async fn list_records(&self, case_id: Uuid) -> AppResult<Vec<MedicalRecord>> {
        self.ensure_case(case_id).await?;
        let records = sqlx::query_as::<_, MedicalRecord>(&format!(
            "SELECT {RECORD_COLUMNS} FROM medical_records \
             WHERE case_id = $1 ORDER BY record_date DESC"
        ))
        .bind(case_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    pub async fn update_record(
        &self,
        record_id: Uuid,
        update: RecordUpdate,
    ) -> AppResult<MedicalRecord> {
        let before = sqlx::query_as::<_, MedicalRecord>(&format!(
            "SELECT {RECORD_COLUMNS} FROM medical_records WHERE record_id = $1"
        ))
        .bind(record_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound("record"))?;

        if let Some(provider_id) = update.provider_id {
            let provider = self.fetch_provider(provider_id).await?;
            if provider.case_id != before.case_id {
                return Err(AppError::BadRequest(
                    "provider belongs to a different case".into(),
                ));
            }
        }

        let mut tx = self.pool.begin().await?;

        let record = sqlx::query_as::<_, MedicalRecord>(&format!(
            "UPDATE medical_records SET \
                 provider_id = COALESCE($2, provider_id), \
                 record_date = COALESCE($3, record_date), \
                 record_type = COALESCE($4, record_type), \
                 description = COALESCE($5, description), \
                 cost = COALESCE($6, cost), \
                 bill_received = COALESCE($7, bill_received), \
                 records_received = COALESCE($8, records_received), \
                 updated_at = now() \
             WHERE record_id = $1 \
             RETURNING {RECORD_COLUMNS}"
        ))
        .bind(record_id)
        .bind(update.provider_id)
        .bind(update.record_date)
        .bind(&update.record_type)
        .bind(&update.description)
        .bind(update.cost)
        .bind(update.bill_received)
        .bind(update.records_received)
        .fetch_one(&mut *tx)
        .await?;

        // Both the old and the new provider totals can move.
        if let Some(old_provider) = before.provider_id {
            recompute_total_bills(&mut tx, old_provider).await?;
        }
        if let Some(new_provider) = record.provider_id {
            if before.provider_id != Some(new_provider) {
                recompute_total_bills(&mut tx, new_provider).await?;
            }
        }

        tx.commit().await?;
        Ok(record)
    }

    pub async fn delete_record(&self, record_id: Uuid) -> AppResult<()> {
        let before = sqlx::query_as::<_, MedicalRecord>(&format!(
            "SELECT {RECORD_COLUMNS} FROM medical_records WHERE record_id = $1"
        ))
        .bind(record_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound("record"))?;

        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM medical_records WHERE record_id = $1")
            .bind(record_id)
            .execute(&mut *tx)
            .await?;

        if let Some(provider_id) = before.provider_id {
            recompute_total_bills(&mut tx, provider_id).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Injuries
    // ------------------------------------------------------------------

    pub async fn create_injury(&self, case_id: Uuid, new: NewInjury) -> AppResult<Injury> {
        new.validate()?;
        self.ensure_case(case_id).await?;

        let injury = sqlx::query_as::<_, Injury>(&format!(
            "INSERT INTO injuries (injury_id, case_id, body_part, description, severity, \
                 resolved, narrative_status, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, now(), now()) \
             RETURNING {INJURY_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(case_id)
        .bind(&new.body_part)
        .bind(&new.description)
        .bind(&new.severity)
        .bind(new.resolved)
        .bind(&new.narrative_status)
        .fetch_one(&self.pool)
        .await?;

        Ok(injury)
    }

    pub async fn list_injuries(&self, case_id: Uuid) -> AppResult<Vec<Injury>> {
        self.ensure_case(case_id).await?;
        let injuries = sqlx::query_as::<_, Injury>(&format!(
            "SELECT {INJURY_COLUMNS} FROM injuries WHERE case_id = $1 ORDER BY created_at"
        ))
        .bind(case_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(injuries)
    }

    pub async fn update_injury(&self, injury_id: Uuid, update: InjuryUpdate) -> AppResult<Injury> {
        update.validate()?;

        let injury = sqlx::query_as::<_, Injury>(&format!(
            "UPDATE injuries SET \
                 body_part = COALESCE($2, body_part), \
                 description = COALESCE($3, description), \
                 severity = COALESCE($4, severity), \
                 resolved = COALESCE($5, resolved), \
                 narrative_status = COALESCE($6, narrative_status), \
                 updated_at = now() \
             WHERE injury_id = $1 \
             RETURNING {INJURY_COLUMNS}"
        ))
        .bind(injury_id)
        .bind(&update.body_part)
        .bind(&update.description)
        .bind(&update.severity)
        .bind(update.resolved)
        .bind(&update.narrative_status)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound("injury"))?;

        Ok(injury)
    }

    pub async fn delete_injury(&self, injury_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM injuries WHERE injury_id = $1")
            .bind(injury_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("injury"));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Summary
    // ------------------------------------------------------------------

    pub async fn summary(&self, case_id: Uuid) -> AppResult<MedicalSummary> {
        self.ensure_case(case_id).await?;

        let provider_count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM medical_providers WHERE case_id = $1",
        )
        .bind(case_id)
        .fetch_one(&self.pool);

        let record_count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM medical_records WHERE case_id = $1",
        )
        .bind(case_id)
        .fetch_one(&self.pool);

        let injuries = sqlx::query_as::<_, InjurySeverityGroup>(
            "SELECT severity, COUNT(*) AS total, \
                    COUNT(*) FILTER (WHERE resolved) AS resolved, \
                    COUNT(*) FILTER (WHERE NOT resolved) AS active \
             FROM injuries WHERE case_id = $1 GROUP BY severity ORDER BY severity",
        )
        .bind(case_id)
        .fetch_all(&self.pool);

        let total_bills = sqlx::query_scalar::<_, Decimal>(
            "SELECT COALESCE(SUM(total_bills), 0) FROM medical_providers WHERE case_id = $1",
        )
        .bind(case_id)
        .fetch_one(&self.pool);

        let (provider_count, record_count, injuries_by_severity, total_bills) =
            tokio::try_join!(provider_count, record_count, injuries, total_bills)?;

        Ok(MedicalSummary {
            provider_count,
            record_count,
            injuries_by_severity,
            total_bills,
        })
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

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

    async fn fetch_provider(&self, provider_id: Uuid) -> AppResult<MedicalProvider> {
        sqlx::query_as::<_, MedicalProvider>(&format!(
            "SELECT {PROVIDER_COLUMNS} FROM medical_providers WHERE provider_id = $1"
        ))
        .bind(provider_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound("provider"))
    }
}

/// Re-derive a provider's `total_bills` from its records, inside the caller's
/// transaction.
async fn recompute_total_bills(
    tx: &mut Transaction<'_, Postgres>,
    provider_id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE medical_providers SET \
             total_bills = COALESCE( \
                 (SELECT SUM(cost) FROM medical_records WHERE provider_id = $1), 0), \
             updated_at = now() \
         WHERE provider_id = $1",
    )
    .bind(provider_id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}
