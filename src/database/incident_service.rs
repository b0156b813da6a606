//! Incident service: the one-per-case event record and everything attached to
//! it.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{
    Citation, Incident, IncidentEvidence, IncidentSeverity, IncidentVehicle, IncidentWitness,
    IncidentWithRelations, PoliceReport, PoliceReportWithCitations,
};

const INCIDENT_COLUMNS: &str = "incident_id, case_id, occurred_at, street, city, state, zip, \
     weather, road_conditions, lighting, incident_type, incident_subtype, severity, description, \
     cause_factors, created_at, updated_at";

const REPORT_COLUMNS: &str = "report_id, incident_id, report_number, agency, officer_name, \
     officer_badge, report_date, narrative, created_at";

#[derive(Debug, Clone, Deserialize)]
pub struct NewIncident {
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
    #[serde(default)]
    pub cause_factors: Vec<String>,
}

impl NewIncident {
    pub fn validate(&self) -> AppResult<()> {
        if self.incident_type.trim().is_empty() {
            return Err(AppError::Validation("incident_type must not be empty".into()));
        }
        self.severity.parse::<IncidentSeverity>()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IncidentUpdate {
    pub occurred_at: Option<DateTime<Utc>>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub weather: Option<String>,
    pub road_conditions: Option<String>,
    pub lighting: Option<String>,
    pub incident_type: Option<String>,
    pub incident_subtype: Option<String>,
    pub severity: Option<String>,
    pub description: Option<String>,
    pub cause_factors: Option<Vec<String>>,
}

impl IncidentUpdate {
    pub fn validate(&self) -> AppResult<()> {
        if let Some(severity) = &self.severity {
            severity.parse::<IncidentSeverity>()?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewVehicle {
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub license_plate: Option<String>,
    pub driver_name: Option<String>,
    pub owner_name: Option<String>,
    pub damage_description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewWitness {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub statement: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewEvidence {
    pub evidence_type: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub collected_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewPoliceReport {
    pub report_number: String,
    pub agency: Option<String>,
    pub officer_name: Option<String>,
    pub officer_badge: Option<String>,
    pub report_date: Option<NaiveDate>,
    pub narrative: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCitation {
    pub citation_number: String,
    pub statute: Option<String>,
    pub description: Option<String>,
    pub issued_to: Option<String>,
}

#[derive(Clone, Debug)]
pub struct IncidentService {
    pool: PgPool,
}

impl IncidentService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the case's incident. A case carries at most one; a second
    /// create is rejected.
    pub async fn create(&self, case_id: Uuid, new: NewIncident) -> AppResult<Incident> {
        new.validate()?;
        self.ensure_case(case_id).await?;

        let existing: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM incidents WHERE case_id = $1)")
                .bind(case_id)
                .fetch_one(&self.pool)
                .await?;
        if existing {
            return Err(AppError::BadRequest(
                "an incident already exists for this case".into(),
            ));
        }

        let incident = sqlx::query_as::<_, Incident>(&format!(
            "INSERT INTO incidents (incident_id, case_id, occurred_at, street, city, state, zip, \
                 weather, road_conditions, lighting, incident_type, incident_subtype, severity, \
                 description, cause_factors, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, now(), now()) \
             RETURNING {INCIDENT_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(case_id)
        .bind(new.occurred_at)
        .bind(&new.street)
        .bind(&new.city)
        .bind(&new.state)
        .bind(&new.zip)
        .bind(&new.weather)
        .bind(&new.road_conditions)
        .bind(&new.lighting)
        .bind(&new.incident_type)
        .bind(&new.incident_subtype)
        .bind(&new.severity)
        .bind(&new.description)
        .bind(&new.cause_factors)
        .fetch_one(&self.pool)
        .await?;

        info!("Created incident {} on case {}", incident.incident_id, case_id);
        Ok(incident)
    }

    pub async fn get_for_case(&self, case_id: Uuid) -> AppResult<IncidentWithRelations> {
        self.ensure_case(case_id).await?;

        let incident = sqlx::query_as::<_, Incident>(&format!(
            "SELECT {INCIDENT_COLUMNS} FROM incidents WHERE case_id = $1"
        ))
        .bind(case_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound("incident"))?;

        self.load_relations(incident).await
    }

    pub async fn update(
        &self,
        incident_id: Uuid,
        update: IncidentUpdate,
    ) -> AppResult<IncidentWithRelations> {
        update.validate()?;

        let incident = sqlx::query_as::<_, Incident>(&format!(
            "UPDATE incidents SET \
                 occurred_at = COALESCE($2, occurred_at), \
                 street = COALESCE($3, street), \
                 city = COALESCE($4, city), \
                 state = COALESCE($5, state), \
                 zip = COALESCE($6, zip), \
                 weather = COALESCE($7, weather), \
                 road_conditions = COALESCE($8, road_conditions), \
                 lighting = COALESCE($9, lighting), \
                 incident_type = COALESCE($10, incident_type), \
                 incident_subtype = COALESCE($11, incident_subtype), \
                 severity = COALESCE($12, severity), \
                 description = COALESCE($13, description), \
                 cause_factors = COALESCE($14, cause_factors), \
                 updated_at = now() \
             WHERE incident_id = $1 \
             RETURNING {INCIDENT_COLUMNS}"
        ))
        .bind(incident_id)
        .bind(update.occurred_at)
        .bind(&update.street)
        .bind(&update.city)
        .bind(&update.state)
        .bind(&update.zip)
        .bind(&update.weather)
        .bind(&update.road_conditions)
        .bind(&update.lighting)
        .bind(&update.incident_type)
        .bind(&update.incident_subtype)
        .bind(&update.severity)
        .bind(&update.description)
        .bind(&update.cause_factors)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound("incident"))?;

        self.load_relations(incident).await
    }

    pub async fn delete(&self, incident_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM incidents WHERE incident_id = $1")
            .bind(incident_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("incident"));
        }
        info!("Deleted incident {}", incident_id);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Owned collections
    // ------------------------------------------------------------------

    pub async fn add_vehicle(
        &self,
        incident_id: Uuid,
        new: NewVehicle,
    ) -> AppResult<IncidentVehicle> {
        self.ensure_incident(incident_id).await?;

        let vehicle = sqlx::query_as::<_, IncidentVehicle>(
            "INSERT INTO incident_vehicles (vehicle_id, incident_id, make, model, year, \
                 license_plate, driver_name, owner_name, damage_description) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING vehicle_id, incident_id, make, model, year, license_plate, driver_name, \
                 owner_name, damage_description, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(incident_id)
        .bind(&new.make)
        .bind(&new.model)
        .bind(new.year)
        .bind(&new.license_plate)
        .bind(&new.driver_name)
        .bind(&new.owner_name)
        .bind(&new.damage_description)
        .fetch_one(&self.pool)
        .await?;

        Ok(vehicle)
    }

    pub async fn delete_vehicle(&self, vehicle_id: Uuid) -> AppResult<()> {
        self.delete_child("incident_vehicles", "vehicle_id", vehicle_id, "vehicle")
            .await
    }

    pub async fn add_witness(
        &self,
        incident_id: Uuid,
        new: NewWitness,
    ) -> AppResult<IncidentWitness> {
        if new.name.trim().is_empty() {
            return Err(AppError::Validation("name must not be empty".into()));
        }
        self.ensure_incident(incident_id).await?;

        let witness = sqlx::query_as::<_, IncidentWitness>(
            "INSERT INTO incident_witnesses (witness_id, incident_id, name, phone, email, statement) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING witness_id, incident_id, name, phone, email, statement, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(incident_id)
        .bind(&new.name)
        .bind(&new.phone)
        .bind(&new.email)
        .bind(&new.statement)
        .fetch_one(&self.pool)
        .await?;

        Ok(witness)
    }

    pub async fn delete_witness(&self, witness_id: Uuid) -> AppResult<()> {
        self.delete_child("incident_witnesses", "witness_id", witness_id, "witness")
            .await
    }

    pub async fn add_evidence(
        &self,
        incident_id: Uuid,
        new: NewEvidence,
    ) -> AppResult<IncidentEvidence> {
        if new.evidence_type.trim().is_empty() {
            return Err(AppError::Validation("evidence_type must not be empty".into()));
        }
        self.ensure_incident(incident_id).await?;

        let evidence = sqlx::query_as::<_, IncidentEvidence>(
            "INSERT INTO incident_evidence (evidence_id, incident_id, evidence_type, description, \
                 location, collected_at) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING evidence_id, incident_id, evidence_type, description, location, \
                 collected_at, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(incident_id)
        .bind(&new.evidence_type)
        .bind(&new.description)
        .bind(&new.location)
        .bind(new.collected_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(evidence)
    }

    pub async fn delete_evidence(&self, evidence_id: Uuid) -> AppResult<()> {
        self.delete_child("incident_evidence", "evidence_id", evidence_id, "evidence")
            .await
    }

    // ------------------------------------------------------------------
    // Police report and citations
    // ------------------------------------------------------------------

    /// Attach the police report. Requires the incident to exist; a second
    /// report on the same incident is rejected.
    pub async fn create_police_report(
        &self,
        incident_id: Uuid,
        new: NewPoliceReport,
    ) -> AppResult<PoliceReport> {
        if new.report_number.trim().is_empty() {
            return Err(AppError::Validation("report_number must not be empty".into()));
        }
        self.ensure_incident(incident_id).await?;

        let existing: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM police_reports WHERE incident_id = $1)",
        )
        .bind(incident_id)
        .fetch_one(&self.pool)
        .await?;
        if existing {
            return Err(AppError::BadRequest(
                "a police report already exists for this incident".into(),
            ));
        }

        let report = sqlx::query_as::<_, PoliceReport>(&format!(
            "INSERT INTO police_reports (report_id, incident_id, report_number, agency, \
                 officer_name, officer_badge, report_date, narrative) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {REPORT_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(incident_id)
        .bind(&new.report_number)
        .bind(&new.agency)
        .bind(&new.officer_name)
        .bind(&new.officer_badge)
        .bind(new.report_date)
        .bind(&new.narrative)
        .fetch_one(&self.pool)
        .await?;

        info!("Created police report {} on incident {}", report.report_id, incident_id);
        Ok(report)
    }

    pub async fn add_citation(&self, report_id: Uuid, new: NewCitation) -> AppResult<Citation> {
        if new.citation_number.trim().is_empty() {
            return Err(AppError::Validation("citation_number must not be empty".into()));
        }

        let report_exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM police_reports WHERE report_id = $1)",
        )
        .bind(report_id)
        .fetch_one(&self.pool)
        .await?;
        if !report_exists {
            return Err(AppError::NotFound("police report"));
        }

        let citation = sqlx::query_as::<_, Citation>(
            "INSERT INTO citations (citation_id, report_id, citation_number, statute, \
                 description, issued_to) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING citation_id, report_id, citation_number, statute, description, \
                 issued_to, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(report_id)
        .bind(&new.citation_number)
        .bind(&new.statute)
        .bind(&new.description)
        .bind(&new.issued_to)
        .fetch_one(&self.pool)
        .await?;

        Ok(citation)
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    async fn load_relations(&self, incident: Incident) -> AppResult<IncidentWithRelations> {
        let vehicles = sqlx::query_as::<_, IncidentVehicle>(
            "SELECT vehicle_id, incident_id, make, model, year, license_plate, driver_name, \
                    owner_name, damage_description, created_at \
             FROM incident_vehicles WHERE incident_id = $1 ORDER BY created_at",
        )
        .bind(incident.incident_id)
        .fetch_all(&self.pool);

        let witnesses = sqlx::query_as::<_, IncidentWitness>(
            "SELECT witness_id, incident_id, name, phone, email, statement, created_at \
             FROM incident_witnesses WHERE incident_id = $1 ORDER BY created_at",
        )
        .bind(incident.incident_id)
        .fetch_all(&self.pool);

        let evidence = sqlx::query_as::<_, IncidentEvidence>(
            "SELECT evidence_id, incident_id, evidence_type, description, location, \
                    collected_at, created_at \
             FROM incident_evidence WHERE incident_id = $1 ORDER BY created_at",
        )
        .bind(incident.incident_id)
        .fetch_all(&self.pool);

        let report_sql =
            format!("SELECT {REPORT_COLUMNS} FROM police_reports WHERE incident_id = $1");
        let report = sqlx::query_as::<_, PoliceReport>(&report_sql)
            .bind(incident.incident_id)
            .fetch_optional(&self.pool);

        let (vehicles, witnesses, evidence, report) =
            tokio::try_join!(vehicles, witnesses, evidence, report)?;

        let police_report = match report {
            Some(report) => {
                let citations = sqlx::query_as::<_, Citation>(
                    "SELECT citation_id, report_id, citation_number, statute, description, \
                            issued_to, created_at \
                     FROM citations WHERE report_id = $1 ORDER BY created_at",
                )
                .bind(report.report_id)
                .fetch_all(&self.pool)
                .await?;
                Some(PoliceReportWithCitations { report, citations })
            }
            None => None,
        };

        Ok(IncidentWithRelations {
            incident,
            vehicles,
            witnesses,
            evidence,
            police_report,
        })
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

    async fn ensure_incident(&self, incident_id: Uuid) -> AppResult<()> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM incidents WHERE incident_id = $1)")
                .bind(incident_id)
                .fetch_one(&self.pool)
                .await?;
        if exists {
            Ok(())
        } else {
            Err(AppError::NotFound("incident"))
        }
    }

    async fn delete_child(
        &self,
        table: &str,
        id_column: &str,
        id: Uuid,
        label: &'static str,
    ) -> AppResult<()> {
        let result = sqlx::query(&format!("DELETE FROM {table} WHERE {id_column} = $1"))
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(label));
        }
        Ok(())
    }
}
