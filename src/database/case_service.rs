//! Case service: CRUD, assignments, tasks, notes, and the overview/timeline
//! aggregations.

use chrono::{Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use tracing::info;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{
    AssignmentWithUser, Case, CaseNote, CaseOverview, CaseStatistics, CaseStatus, CaseTask,
    CaseType, CaseWithRelations, Client, PolicyProjection, StatusCount, TaskStatus, TimelineEntry,
    UserSummary,
};
use crate::pagination::{Page, ResolvedPage};

pub const PRIMARY_ATTORNEY_ROLE: &str = "Primary Attorney";

const CASE_COLUMNS: &str = "case_id, case_number, title, case_type, status, date_of_loss, \
     description, referral_source, client_id, created_by, created_at, updated_at";

#[derive(Debug, Clone, Deserialize)]
pub struct NewCase {
    pub title: String,
    pub case_type: String,
    pub status: Option<String>,
    pub case_number: Option<String>,
    pub date_of_loss: Option<NaiveDate>,
    pub description: Option<String>,
    pub referral_source: Option<String>,
    pub client_id: Uuid,
}

impl NewCase {
    pub fn validate(&self) -> AppResult<()> {
        if self.title.trim().is_empty() {
            return Err(AppError::Validation("title must not be empty".into()));
        }
        self.case_type.parse::<CaseType>()?;
        if let Some(status) = &self.status {
            status.parse::<CaseStatus>()?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CaseUpdate {
    pub title: Option<String>,
    pub case_type: Option<String>,
    pub status: Option<String>,
    pub date_of_loss: Option<NaiveDate>,
    pub description: Option<String>,
    pub referral_source: Option<String>,
}

impl CaseUpdate {
    pub fn validate(&self) -> AppResult<()> {
        if let Some(title) = &self.title {
            if title.trim().is_empty() {
                return Err(AppError::Validation("title must not be empty".into()));
            }
        }
        if let Some(case_type) = &self.case_type {
            case_type.parse::<CaseType>()?;
        }
        if let Some(status) = &self.status {
            status.parse::<CaseStatus>()?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CaseFilter {
    pub search: Option<String>,
    pub status: Option<String>,
    pub case_type: Option<String>,
    pub client_id: Option<Uuid>,
    pub assigned_to: Option<Uuid>,
}

impl CaseFilter {
    pub fn validate(&self) -> AppResult<()> {
        if let Some(status) = &self.status {
            status.parse::<CaseStatus>()?;
        }
        if let Some(case_type) = &self.case_type {
            case_type.parse::<CaseType>()?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewAssignment {
    pub user_id: Uuid,
    pub role: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub assigned_to: Option<Uuid>,
}

impl NewTask {
    pub fn validate(&self) -> AppResult<()> {
        if self.title.trim().is_empty() {
            return Err(AppError::Validation("title must not be empty".into()));
        }
        if let Some(status) = &self.status {
            status.parse::<TaskStatus>()?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub assigned_to: Option<Uuid>,
}

impl TaskUpdate {
    pub fn validate(&self) -> AppResult<()> {
        if let Some(status) = &self.status {
            status.parse::<TaskStatus>()?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewNote {
    pub body: String,
}

impl NewNote {
    pub fn validate(&self) -> AppResult<()> {
        if self.body.trim().is_empty() {
            return Err(AppError::Validation("body must not be empty".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NoteUpdate {
    pub body: Option<String>,
}

/// Row shape shared by the three timeline queries.
#[derive(Debug, FromRow)]
struct TimelineRow {
    id: Uuid,
    title: String,
    description: Option<String>,
    status: Option<String>,
    date: chrono::DateTime<Utc>,
    user_name: Option<String>,
}

#[derive(Clone, Debug)]
pub struct CaseService {
    pool: PgPool,
}

impl CaseService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a case and its Primary Attorney assignment in one transaction.
    pub async fn create(&self, new: NewCase, actor: Uuid) -> AppResult<CaseWithRelations> {
        new.validate()?;

        let client_exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM clients WHERE client_id = $1)")
                .bind(new.client_id)
                .fetch_one(&self.pool)
                .await?;
        if !client_exists {
            return Err(AppError::NotFound("client"));
        }

        let mut tx = self.pool.begin().await?;

        let case_number = match new.case_number.as_deref() {
            Some(number) if !number.trim().is_empty() => number.trim().to_string(),
            _ => {
                let year = Utc::now().year();
                let count: i64 =
                    sqlx::query_scalar("SELECT COUNT(*) FROM cases WHERE case_number LIKE $1")
                        .bind(format!("LE-{year}-%"))
                        .fetch_one(&mut *tx)
                        .await?;
                format_case_number(year, count + 1)
            }
        };

        let case_id = Uuid::new_v4();
        let status = new.status.unwrap_or_else(|| CaseStatus::Intake.to_string());

        let case = sqlx::query_as::<_, Case>(&format!(
            "INSERT INTO cases (case_id, case_number, title, case_type, status, date_of_loss, \
             description, referral_source, client_id, created_by, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, now(), now()) \
             RETURNING {CASE_COLUMNS}"
        ))
        .bind(case_id)
        .bind(&case_number)
        .bind(&new.title)
        .bind(&new.case_type)
        .bind(&status)
        .bind(new.date_of_loss)
        .bind(&new.description)
        .bind(&new.referral_source)
        .bind(new.client_id)
        .bind(actor)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO case_assignments (assignment_id, case_id, user_id, role) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(Uuid::new_v4())
        .bind(case_id)
        .bind(actor)
        .bind(PRIMARY_ATTORNEY_ROLE)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!("Created case {} ({})", case.case_number, case.case_id);
        self.load_relations(case).await
    }

    pub async fn list(&self, filter: CaseFilter, page: ResolvedPage) -> AppResult<Page<Case>> {
        filter.validate()?;

        let mut count_query: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM cases WHERE 1=1");
        push_case_filters(&mut count_query, &filter);
        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut data_query: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {CASE_COLUMNS} FROM cases WHERE 1=1"));
        push_case_filters(&mut data_query, &filter);
        data_query
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(page.limit_i64())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let data = data_query
            .build_query_as::<Case>()
            .fetch_all(&self.pool)
            .await?;

        Ok(Page::new(data, total, page))
    }

    pub async fn get(&self, case_id: Uuid) -> AppResult<CaseWithRelations> {
        let case = self.fetch_case(case_id).await?;
        self.load_relations(case).await
    }

    pub async fn update(&self, case_id: Uuid, update: CaseUpdate) -> AppResult<CaseWithRelations> {
        update.validate()?;
        self.fetch_case(case_id).await?;

        let case = sqlx::query_as::<_, Case>(&format!(
            "UPDATE cases SET \
                 title = COALESCE($2, title), \
                 case_type = COALESCE($3, case_type), \
                 status = COALESCE($4, status), \
                 date_of_loss = COALESCE($5, date_of_loss), \
                 description = COALESCE($6, description), \
                 referral_source = COALESCE($7, referral_source), \
                 updated_at = now() \
             WHERE case_id = $1 \
             RETURNING {CASE_COLUMNS}"
        ))
        .bind(case_id)
        .bind(&update.title)
        .bind(&update.case_type)
        .bind(&update.status)
        .bind(update.date_of_loss)
        .bind(&update.description)
        .bind(&update.referral_source)
        .fetch_one(&self.pool)
        .await?;

        info!("Updated case {}", case_id);
        self.load_relations(case).await
    }

    /// Hard delete; dependent rows go with the case via FK cascade.
    pub async fn delete(&self, case_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM cases WHERE case_id = $1")
            .bind(case_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("case"));
        }
        info!("Deleted case {}", case_id);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Assignments
    // ------------------------------------------------------------------

    pub async fn add_assignment(
        &self,
        case_id: Uuid,
        new: NewAssignment,
    ) -> AppResult<AssignmentWithUser> {
        if new.role.trim().is_empty() {
            return Err(AppError::Validation("role must not be empty".into()));
        }
        self.fetch_case(case_id).await?;

        let user_exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE user_id = $1)")
                .bind(new.user_id)
                .fetch_one(&self.pool)
                .await?;
        if !user_exists {
            return Err(AppError::NotFound("user"));
        }

        let duplicate: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM case_assignments \
             WHERE case_id = $1 AND user_id = $2 AND role = $3)",
        )
        .bind(case_id)
        .bind(new.user_id)
        .bind(&new.role)
        .fetch_one(&self.pool)
        .await?;
        if duplicate {
            return Err(AppError::BadRequest(format!(
                "user is already assigned to this case as {}",
                new.role
            )));
        }

        let assignment = sqlx::query_as::<_, AssignmentWithUser>(
            "WITH inserted AS ( \
                 INSERT INTO case_assignments (assignment_id, case_id, user_id, role) \
                 VALUES ($1, $2, $3, $4) \
                 RETURNING assignment_id, case_id, user_id, role, assigned_at) \
             SELECT i.assignment_id, i.case_id, i.user_id, i.role, i.assigned_at, \
                    u.name AS user_name, u.email AS user_email \
             FROM inserted i JOIN users u ON u.user_id = i.user_id",
        )
        .bind(Uuid::new_v4())
        .bind(case_id)
        .bind(new.user_id)
        .bind(&new.role)
        .fetch_one(&self.pool)
        .await?;

        info!("Assigned {} to case {} as {}", new.user_id, case_id, new.role);
        Ok(assignment)
    }

    pub async fn remove_assignment(&self, case_id: Uuid, assignment_id: Uuid) -> AppResult<()> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM case_assignments WHERE case_id = $1")
                .bind(case_id)
                .fetch_one(&self.pool)
                .await?;
        if count <= 1 {
            return Err(AppError::BadRequest(
                "a case must keep at least one assignment".into(),
            ));
        }

        let result =
            sqlx::query("DELETE FROM case_assignments WHERE assignment_id = $1 AND case_id = $2")
                .bind(assignment_id)
                .bind(case_id)
                .execute(&self.pool)
                .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("assignment"));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Tasks and notes
    // ------------------------------------------------------------------

    pub async fn list_tasks(&self, case_id: Uuid) -> AppResult<Vec<CaseTask>> {
        self.fetch_case(case_id).await?;
        let tasks = sqlx::query_as::<_, CaseTask>(
            "SELECT task_id, case_id, title, description, status, priority, due_date, \
                    assigned_to, created_by, created_at, updated_at \
             FROM case_tasks WHERE case_id = $1 ORDER BY created_at DESC",
        )
        .bind(case_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(tasks)
    }

    pub async fn create_task(
        &self,
        case_id: Uuid,
        new: NewTask,
        actor: Uuid,
    ) -> AppResult<CaseTask> {
        new.validate()?;
        self.fetch_case(case_id).await?;

        let status = new.status.unwrap_or_else(|| TaskStatus::Pending.to_string());
        let task = sqlx::query_as::<_, CaseTask>(
            "INSERT INTO case_tasks (task_id, case_id, title, description, status, priority, \
                 due_date, assigned_to, created_by, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, now(), now()) \
             RETURNING task_id, case_id, title, description, status, priority, due_date, \
                 assigned_to, created_by, created_at, updated_at",
        )
        .bind(Uuid::new_v4())
        .bind(case_id)
        .bind(&new.title)
        .bind(&new.description)
        .bind(&status)
        .bind(&new.priority)
        .bind(new.due_date)
        .bind(new.assigned_to)
        .bind(actor)
        .fetch_one(&self.pool)
        .await?;

        info!("Created task '{}' on case {}", task.title, case_id);
        Ok(task)
    }

    pub async fn update_task(&self, task_id: Uuid, update: TaskUpdate) -> AppResult<CaseTask> {
        update.validate()?;

        let task = sqlx::query_as::<_, CaseTask>(
            "UPDATE case_tasks SET \
                 title = COALESCE($2, title), \
                 description = COALESCE($3, description), \
                 status = COALESCE($4, status), \
                 priority = COALESCE($5, priority), \
                 due_date = COALESCE($6, due_date), \
                 assigned_to = COALESCE($7, assigned_to), \
                 updated_at = now() \
             WHERE task_id = $1 \
             RETURNING task_id, case_id, title, description, status, priority, due_date, \
                 assigned_to, created_by, created_at, updated_at",
        )
        .bind(task_id)
        .bind(&update.title)
        .bind(&update.description)
        .bind(&update.status)
        .bind(&update.priority)
        .bind(update.due_date)
        .bind(update.assigned_to)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound("task"))?;

        Ok(task)
    }

    pub async fn delete_task(&self, task_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM case_tasks WHERE task_id = $1")
            .bind(task_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("task"));
        }
        Ok(())
    }

    pub async fn list_notes(&self, case_id: Uuid) -> AppResult<Vec<CaseNote>> {
        self.fetch_case(case_id).await?;
        let notes = sqlx::query_as::<_, CaseNote>(
            "SELECT note_id, case_id, body, created_by, created_at, updated_at \
             FROM case_notes WHERE case_id = $1 ORDER BY created_at DESC",
        )
        .bind(case_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(notes)
    }

    pub async fn create_note(
        &self,
        case_id: Uuid,
        new: NewNote,
        actor: Uuid,
    ) -> AppResult<CaseNote> {
        new.validate()?;
        self.fetch_case(case_id).await?;

        let note = sqlx::query_as::<_, CaseNote>(
            "INSERT INTO case_notes (note_id, case_id, body, created_by, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, now(), now()) \
             RETURNING note_id, case_id, body, created_by, created_at, updated_at",
        )
        .bind(Uuid::new_v4())
        .bind(case_id)
        .bind(&new.body)
        .bind(actor)
        .fetch_one(&self.pool)
        .await?;

        Ok(note)
    }

    pub async fn update_note(&self, note_id: Uuid, update: NoteUpdate) -> AppResult<CaseNote> {
        if let Some(body) = &update.body {
            if body.trim().is_empty() {
                return Err(AppError::Validation("body must not be empty".into()));
            }
        }

        let note = sqlx::query_as::<_, CaseNote>(
            "UPDATE case_notes SET body = COALESCE($2, body), updated_at = now() \
             WHERE note_id = $1 \
             RETURNING note_id, case_id, body, created_by, created_at, updated_at",
        )
        .bind(note_id)
        .bind(&update.body)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound("note"))?;

        Ok(note)
    }

    pub async fn delete_note(&self, note_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM case_notes WHERE note_id = $1")
            .bind(note_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("note"));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Aggregations
    // ------------------------------------------------------------------

    /// Case payload extended with derived statistics. The secondary reads run
    /// concurrently and fail the whole aggregation on any error.
    pub async fn overview(&self, case_id: Uuid) -> AppResult<CaseOverview> {
        let case = self.get(case_id).await?;

        let bills = sqlx::query_scalar::<_, Decimal>(
            "SELECT COALESCE(SUM(total_bills), 0) FROM medical_providers WHERE case_id = $1",
        )
        .bind(case_id)
        .fetch_one(&self.pool);

        let documents = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM documents WHERE case_id = $1",
        )
        .bind(case_id)
        .fetch_one(&self.pool);

        let tasks = sqlx::query_as::<_, StatusCount>(
            "SELECT status, COUNT(*) AS count FROM case_tasks \
             WHERE case_id = $1 GROUP BY status ORDER BY status",
        )
        .bind(case_id)
        .fetch_all(&self.pool);

        let policies = sqlx::query_as::<_, PolicyProjection>(
            "SELECT policy_id, policy_type, company, policy_number, status \
             FROM insurance_policies WHERE case_id = $1 ORDER BY created_at",
        )
        .bind(case_id)
        .fetch_all(&self.pool);

        let (total_medical_bills, document_count, tasks_by_status, policies) =
            tokio::try_join!(bills, documents, tasks, policies)?;

        let statistics = CaseStatistics {
            total_medical_bills,
            document_count,
            tasks_by_status,
            policies,
            case_age_days: case_age_days(case.case.date_of_loss, Utc::now().date_naive()),
        };

        Ok(CaseOverview {
            case,
            statistics,
        })
    }

    /// Recent tasks, notes and documents merged into one date-descending list.
    pub async fn timeline(&self, case_id: Uuid) -> AppResult<Vec<TimelineEntry>> {
        self.fetch_case(case_id).await?;

        let tasks = sqlx::query_as::<_, TimelineRow>(
            "SELECT t.task_id AS id, t.title, t.description, t.status, \
                    t.created_at AS date, u.name AS user_name \
             FROM case_tasks t LEFT JOIN users u ON u.user_id = t.assigned_to \
             WHERE t.case_id = $1 ORDER BY t.created_at DESC LIMIT 10",
        )
        .bind(case_id)
        .fetch_all(&self.pool);

        let notes = sqlx::query_as::<_, TimelineRow>(
            "SELECT n.note_id AS id, 'Note'::text AS title, n.body AS description, \
                    NULL::text AS status, n.created_at AS date, u.name AS user_name \
             FROM case_notes n LEFT JOIN users u ON u.user_id = n.created_by \
             WHERE n.case_id = $1 ORDER BY n.created_at DESC LIMIT 10",
        )
        .bind(case_id)
        .fetch_all(&self.pool);

        let documents = sqlx::query_as::<_, TimelineRow>(
            "SELECT d.document_id AS id, d.name AS title, d.category AS description, \
                    NULL::text AS status, d.created_at AS date, u.name AS user_name \
             FROM documents d LEFT JOIN users u ON u.user_id = d.uploaded_by \
             WHERE d.case_id = $1 ORDER BY d.created_at DESC LIMIT 5",
        )
        .bind(case_id)
        .fetch_all(&self.pool);

        let (tasks, notes, documents) = tokio::try_join!(tasks, notes, documents)?;

        Ok(merge_timeline(tasks, notes, documents))
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    async fn fetch_case(&self, case_id: Uuid) -> AppResult<Case> {
        sqlx::query_as::<_, Case>(&format!(
            "SELECT {CASE_COLUMNS} FROM cases WHERE case_id = $1"
        ))
        .bind(case_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound("case"))
    }

    async fn load_relations(&self, case: Case) -> AppResult<CaseWithRelations> {
        let client = sqlx::query_as::<_, Client>(
            "SELECT client_id, first_name, last_name, middle_name, date_of_birth, \
                    government_id, gender, marital_status, active, created_at, updated_at \
             FROM clients WHERE client_id = $1",
        )
        .bind(case.client_id)
        .fetch_one(&self.pool)
        .await?;

        let creator = sqlx::query_as::<_, UserSummary>(
            "SELECT user_id, name, email FROM users WHERE user_id = $1",
        )
        .bind(case.created_by)
        .fetch_one(&self.pool)
        .await?;

        let assignments = sqlx::query_as::<_, AssignmentWithUser>(
            "SELECT a.assignment_id, a.case_id, a.user_id, a.role, a.assigned_at, \
                    u.name AS user_name, u.email AS user_email \
             FROM case_assignments a JOIN users u ON u.user_id = a.user_id \
             WHERE a.case_id = $1 ORDER BY a.assigned_at",
        )
        .bind(case.case_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(CaseWithRelations {
            case,
            client,
            creator,
            assignments,
        })
    }
}

fn push_case_filters(query: &mut QueryBuilder<Postgres>, filter: &CaseFilter) {
    if let Some(status) = &filter.status {
        query.push(" AND status = ").push_bind(status.clone());
    }
    if let Some(case_type) = &filter.case_type {
        query.push(" AND case_type = ").push_bind(case_type.clone());
    }
    if let Some(client_id) = filter.client_id {
        query.push(" AND client_id = ").push_bind(client_id);
    }
    if let Some(user_id) = filter.assigned_to {
        query
            .push(" AND EXISTS (SELECT 1 FROM case_assignments a WHERE a.case_id = cases.case_id AND a.user_id = ")
            .push_bind(user_id)
            .push(")");
    }
    if let Some(search) = &filter.search {
        let pattern = format!("%{}%", search.trim());
        query
            .push(" AND (case_number ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

/// `LE-<year>-<seq>`, sequence zero-padded to three digits.
pub fn format_case_number(year: i32, sequence: i64) -> String {
    format!("LE-{year}-{sequence:03}")
}

/// Absolute day distance between the date of loss and today.
fn case_age_days(date_of_loss: Option<NaiveDate>, today: NaiveDate) -> Option<i64> {
    date_of_loss.map(|dol| (today - dol).num_days().abs())
}

fn merge_timeline(
    tasks: Vec<TimelineRow>,
    notes: Vec<TimelineRow>,
    documents: Vec<TimelineRow>,
) -> Vec<TimelineEntry> {
    let mut entries: Vec<TimelineEntry> = tasks
        .into_iter()
        .map(|row| row.into_entry("task"))
        .chain(notes.into_iter().map(|row| row.into_entry("note")))
        .chain(documents.into_iter().map(|row| row.into_entry("document")))
        .collect();
    entries.sort_by(|a, b| b.date.cmp(&a.date));
    entries
}

impl TimelineRow {
    fn into_entry(self, kind: &str) -> TimelineEntry {
        TimelineEntry {
            kind: kind.to_string(),
            id: self.id,
            title: self.title,
            description: self.description,
            date: self.date,
            user: self.user_name,
            status: self.status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn row(title: &str, secs: i64) -> TimelineRow {
        TimelineRow {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: None,
            status: None,
            date: Utc.timestamp_opt(secs, 0).unwrap(),
            user_name: None,
        }
    }

    #[test]
    fn case_numbers_are_zero_padded() {
        assert_eq!(format_case_number(2024, 1), "LE-2024-001");
        assert_eq!(format_case_number(2024, 42), "LE-2024-042");
        assert_eq!(format_case_number(2026, 1234), "LE-2026-1234");
    }

    #[test]
    fn timeline_is_sorted_descending_across_sources() {
        let merged = merge_timeline(
            vec![row("task-new", 400), row("task-old", 100)],
            vec![row("note", 300)],
            vec![row("document", 200)],
        );

        assert_eq!(merged.len(), 4);
        let titles: Vec<&str> = merged.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, ["task-new", "note", "document", "task-old"]);
        let kinds: Vec<&str> = merged.iter().map(|e| e.kind.as_str()).collect();
        assert_eq!(kinds, ["task", "note", "document", "task"]);
    }

    #[test]
    fn case_age_uses_absolute_distance() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 27).unwrap();
        let loss = NaiveDate::from_ymd_opt(2026, 8, 17).unwrap();
        assert_eq!(case_age_days(Some(loss), today), Some(10));
        let future = NaiveDate::from_ymd_opt(2026, 9, 1).unwrap();
        assert_eq!(case_age_days(Some(future), today), Some(5));
        assert_eq!(case_age_days(None, today), None);
    }
}
