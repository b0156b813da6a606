//! Client service: person records with soft delete and owned sub-records.

use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::info;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{
    Case, Client, ClientContact, ClientWithRelations, CommunicationPreferences, EmergencyContact,
    Employment, FamilyMember, StatusCount,
};
use crate::pagination::{Page, ResolvedPage};

const CLIENT_COLUMNS: &str = "client_id, first_name, last_name, middle_name, date_of_birth, \
     government_id, gender, marital_status, active, created_at, updated_at";

#[derive(Debug, Clone, Deserialize)]
pub struct NewClient {
    pub first_name: String,
    pub last_name: String,
    pub middle_name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub government_id: Option<String>,
    pub gender: Option<String>,
    pub marital_status: Option<String>,
    #[serde(default)]
    pub contacts: Vec<NewContact>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewContact {
    pub kind: String,
    pub value: String,
    #[serde(default)]
    pub is_primary: bool,
}

impl NewClient {
    pub fn validate(&self) -> AppResult<()> {
        if self.first_name.trim().is_empty() || self.last_name.trim().is_empty() {
            return Err(AppError::Validation(
                "first_name and last_name must not be empty".into(),
            ));
        }
        for contact in &self.contacts {
            if contact.value.trim().is_empty() {
                return Err(AppError::Validation("contact value must not be empty".into()));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub middle_name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub government_id: Option<String>,
    pub gender: Option<String>,
    pub marital_status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientFilter {
    pub search: Option<String>,
    /// Defaults to `true`: inactive (soft-deleted) clients are hidden unless
    /// asked for.
    pub active: Option<bool>,
}

#[derive(Clone, Debug)]
pub struct ClientService {
    pool: PgPool,
}

impl ClientService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, new: NewClient) -> AppResult<ClientWithRelations> {
        new.validate()?;

        let mut tx = self.pool.begin().await?;

        let client = sqlx::query_as::<_, Client>(&format!(
            "INSERT INTO clients (client_id, first_name, last_name, middle_name, date_of_birth, \
                 government_id, gender, marital_status, active, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, true, now(), now()) \
             RETURNING {CLIENT_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&new.first_name)
        .bind(&new.last_name)
        .bind(&new.middle_name)
        .bind(new.date_of_birth)
        .bind(&new.government_id)
        .bind(&new.gender)
        .bind(&new.marital_status)
        .fetch_one(&mut *tx)
        .await?;

        for contact in &new.contacts {
            sqlx::query(
                "INSERT INTO client_contacts (contact_id, client_id, kind, value, is_primary) \
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(Uuid::new_v4())
            .bind(client.client_id)
            .bind(&contact.kind)
            .bind(&contact.value)
            .bind(contact.is_primary)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(
            "Created client {} {} ({})",
            client.first_name, client.last_name, client.client_id
        );
        self.load_relations(client).await
    }

    pub async fn list(&self, filter: ClientFilter, page: ResolvedPage) -> AppResult<Page<Client>> {
        let mut count_query: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM clients WHERE 1=1");
        push_client_filters(&mut count_query, &filter);
        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut data_query: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {CLIENT_COLUMNS} FROM clients WHERE 1=1"));
        push_client_filters(&mut data_query, &filter);
        data_query
            .push(" ORDER BY last_name, first_name LIMIT ")
            .push_bind(page.limit_i64())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let data = data_query
            .build_query_as::<Client>()
            .fetch_all(&self.pool)
            .await?;

        Ok(Page::new(data, total, page))
    }

    /// Returns the client regardless of the `active` flag.
    pub async fn get(&self, client_id: Uuid) -> AppResult<ClientWithRelations> {
        let client = self.fetch_client(client_id).await?;
        self.load_relations(client).await
    }

    pub async fn update(
        &self,
        client_id: Uuid,
        update: ClientUpdate,
    ) -> AppResult<ClientWithRelations> {
        self.fetch_client(client_id).await?;

        let client = sqlx::query_as::<_, Client>(&format!(
            "UPDATE clients SET \
                 first_name = COALESCE($2, first_name), \
                 last_name = COALESCE($3, last_name), \
                 middle_name = COALESCE($4, middle_name), \
                 date_of_birth = COALESCE($5, date_of_birth), \
                 government_id = COALESCE($6, government_id), \
                 gender = COALESCE($7, gender), \
                 marital_status = COALESCE($8, marital_status), \
                 updated_at = now() \
             WHERE client_id = $1 \
             RETURNING {CLIENT_COLUMNS}"
        ))
        .bind(client_id)
        .bind(&update.first_name)
        .bind(&update.last_name)
        .bind(&update.middle_name)
        .bind(update.date_of_birth)
        .bind(&update.government_id)
        .bind(&update.gender)
        .bind(&update.marital_status)
        .fetch_one(&self.pool)
        .await?;

        info!("Updated client {}", client_id);
        self.load_relations(client).await
    }

    /// Soft delete: flips `active` off, keeping the row and its history.
    pub async fn delete(&self, client_id: Uuid) -> AppResult<()> {
        let result =
            sqlx::query("UPDATE clients SET active = false, updated_at = now() WHERE client_id = $1")
                .bind(client_id)
                .execute(&self.pool)
                .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("client"));
        }
        info!("Deactivated client {}", client_id);
        Ok(())
    }

    pub async fn list_cases(&self, client_id: Uuid) -> AppResult<Vec<Case>> {
        self.fetch_client(client_id).await?;
        let cases = sqlx::query_as::<_, Case>(
            "SELECT case_id, case_number, title, case_type, status, date_of_loss, description, \
                    referral_source, client_id, created_by, created_at, updated_at \
             FROM cases WHERE client_id = $1 ORDER BY created_at DESC",
        )
        .bind(client_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(cases)
    }

    /// Per-client tally of cases by status.
    pub async fn case_summary(&self, client_id: Uuid) -> AppResult<Vec<StatusCount>> {
        self.fetch_client(client_id).await?;
        let counts = sqlx::query_as::<_, StatusCount>(
            "SELECT status, COUNT(*) AS count FROM cases \
             WHERE client_id = $1 GROUP BY status ORDER BY status",
        )
        .bind(client_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(counts)
    }

    async fn fetch_client(&self, client_id: Uuid) -> AppResult<Client> {
        sqlx::query_as::<_, Client>(&format!(
            "SELECT {CLIENT_COLUMNS} FROM clients WHERE client_id = $1"
        ))
        .bind(client_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound("client"))
    }

    async fn load_relations(&self, client: Client) -> AppResult<ClientWithRelations> {
        let contacts = sqlx::query_as::<_, ClientContact>(
            "SELECT contact_id, client_id, kind, value, is_primary, created_at \
             FROM client_contacts WHERE client_id = $1 ORDER BY created_at",
        )
        .bind(client.client_id)
        .fetch_all(&self.pool);

        let emergency_contacts = sqlx::query_as::<_, EmergencyContact>(
            "SELECT contact_id, client_id, name, relationship, phone, created_at \
             FROM emergency_contacts WHERE client_id = $1 ORDER BY created_at",
        )
        .bind(client.client_id)
        .fetch_all(&self.pool);

        let family_members = sqlx::query_as::<_, FamilyMember>(
            "SELECT member_id, client_id, name, relationship, date_of_birth, created_at \
             FROM family_members WHERE client_id = $1 ORDER BY created_at",
        )
        .bind(client.client_id)
        .fetch_all(&self.pool);

        let employments = sqlx::query_as::<_, Employment>(
            "SELECT employment_id, client_id, employer, occupation, start_date, end_date, \
                    annual_income, created_at \
             FROM employments WHERE client_id = $1 ORDER BY created_at",
        )
        .bind(client.client_id)
        .fetch_all(&self.pool);

        let communication_preferences = sqlx::query_as::<_, CommunicationPreferences>(
            "SELECT client_id, preferred_method, do_not_contact, notes, updated_at \
             FROM communication_preferences WHERE client_id = $1",
        )
        .bind(client.client_id)
        .fetch_optional(&self.pool);

        let (contacts, emergency_contacts, family_members, employments, communication_preferences) =
            tokio::try_join!(
                contacts,
                emergency_contacts,
                family_members,
                employments,
                communication_preferences
            )?;

        Ok(ClientWithRelations {
            client,
            contacts,
            emergency_contacts,
            family_members,
            employments,
            communication_preferences,
        })
    }
}

fn push_client_filters(query: &mut QueryBuilder<Postgres>, filter: &ClientFilter) {
    query
        .push(" AND active = ")
        .push_bind(filter.active.unwrap_or(true));
    if let Some(search) = &filter.search {
        let pattern = format!("%{}%", search.trim());
        query
            .push(" AND (first_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR last_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR government_id ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}
