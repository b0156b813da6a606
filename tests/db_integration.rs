//! Integration tests against a real Postgres database.
//!
//! These are `#[ignore]`d by default; run them with a live database:
//! `TEST_DATABASE_URL=postgresql://... cargo test -- --ignored`.

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use lexcase::database::{
    CaseFilter, ClientFilter, DatabaseConfig, DatabaseManager, NewAssignment, NewCase, NewClient,
    NewContact, NewProvider, NewRecord, RecordUpdate,
};
use lexcase::error::AppError;
use lexcase::pagination::{PageParams, DEFAULT_LIMIT};

async fn get_test_manager() -> DatabaseManager {
    let database_url = std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .expect("TEST_DATABASE_URL or DATABASE_URL must be set");
    let manager = DatabaseManager::new(DatabaseConfig {
        database_url,
        ..DatabaseConfig::default()
    })
    .await
    .expect("failed to connect to database");
    manager.apply_schema().await.expect("failed to apply schema");
    manager
}

async fn seed_user(pool: &PgPool) -> Uuid {
    let user_id = Uuid::new_v4();
    sqlx::query("INSERT INTO users (user_id, name, email, role) VALUES ($1, $2, $3, 'attorney')")
        .bind(user_id)
        .bind("Test Attorney")
        .bind(format!("attorney-{user_id}@example.com"))
        .execute(pool)
        .await
        .expect("failed to seed user");
    user_id
}

fn new_client(last_name: &str) -> NewClient {
    NewClient {
        first_name: "Pat".to_string(),
        last_name: last_name.to_string(),
        middle_name: None,
        date_of_birth: None,
        government_id: None,
        gender: None,
        marital_status: None,
        contacts: vec![NewContact {
            kind: "phone".to_string(),
            value: "555-0100".to_string(),
            is_primary: true,
        }],
    }
}

fn new_case(client_id: Uuid, title: &str) -> NewCase {
    NewCase {
        title: title.to_string(),
        case_type: "auto_accident".to_string(),
        status: None,
        case_number: None,
        date_of_loss: None,
        description: None,
        referral_source: None,
        client_id,
    }
}

#[tokio::test]
#[ignore]
async fn client_create_then_get_round_trip() {
    let manager = get_test_manager().await;
    let clients = manager.client_service();

    let marker = Uuid::new_v4().simple().to_string();
    let created = clients.create(new_client(&marker)).await.expect("create");
    assert_eq!(created.client.last_name, marker);
    assert_eq!(created.contacts.len(), 1);

    let fetched = clients.get(created.client.client_id).await.expect("get");
    assert_eq!(fetched.client.client_id, created.client.client_id);
    assert_eq!(fetched.contacts[0].value, "555-0100");
}

#[tokio::test]
#[ignore]
async fn soft_deleted_client_hidden_from_list_but_fetchable() {
    let manager = get_test_manager().await;
    let clients = manager.client_service();

    let marker = Uuid::new_v4().simple().to_string();
    let created = clients.create(new_client(&marker)).await.expect("create");
    clients.delete(created.client.client_id).await.expect("delete");

    let page = clients
        .list(
            ClientFilter {
                search: Some(marker.clone()),
                active: None,
            },
            PageParams::default().resolve(DEFAULT_LIMIT),
        )
        .await
        .expect("list");
    assert!(
        page.data.is_empty(),
        "deactivated client should not appear in the default listing"
    );

    // Direct fetch still works.
    let fetched = clients.get(created.client.client_id).await.expect("get");
    assert!(!fetched.client.active);
}

#[tokio::test]
#[ignore]
async fn case_create_assigns_primary_attorney_and_numbers_the_case() {
    let manager = get_test_manager().await;
    let clients = manager.client_service();
    let cases = manager.case_service();
    let actor = seed_user(manager.pool()).await;

    let client = clients
        .create(new_client(&Uuid::new_v4().simple().to_string()))
        .await
        .expect("create client");

    let case = cases
        .create(new_case(client.client.client_id, "Rear-end collision"), actor)
        .await
        .expect("create case");

    let year = chrono::Utc::now().format("%Y").to_string();
    assert!(
        case.case.case_number.starts_with(&format!("LE-{year}-")),
        "unexpected case number {}",
        case.case.case_number
    );

    let primaries: Vec<_> = case
        .assignments
        .iter()
        .filter(|a| a.role == "Primary Attorney")
        .collect();
    assert_eq!(primaries.len(), 1);
    assert_eq!(primaries[0].user_id, actor);
}

#[tokio::test]
#[ignore]
async fn duplicate_assignment_is_rejected() {
    let manager = get_test_manager().await;
    let clients = manager.client_service();
    let cases = manager.case_service();
    let actor = seed_user(manager.pool()).await;

    let client = clients
        .create(new_client(&Uuid::new_v4().simple().to_string()))
        .await
        .expect("create client");
    let case = cases
        .create(new_case(client.client.client_id, "Slip and fall"), actor)
        .await
        .expect("create case");

    let err = cases
        .add_assignment(
            case.case.case_id,
            NewAssignment {
                user_id: actor,
                role: "Primary Attorney".to_string(),
            },
        )
        .await
        .expect_err("duplicate assignment must fail");
    assert!(matches!(err, AppError::BadRequest(_)));
}

#[tokio::test]
#[ignore]
async fn provider_total_bills_follows_record_writes() {
    let manager = get_test_manager().await;
    let clients = manager.client_service();
    let cases = manager.case_service();
    let medical = manager.medical_service();
    let actor = seed_user(manager.pool()).await;

    let client = clients
        .create(new_client(&Uuid::new_v4().simple().to_string()))
        .await
        .expect("create client");
    let case = cases
        .create(new_case(client.client.client_id, "Treatment totals"), actor)
        .await
        .expect("create case");
    let case_id = case.case.case_id;

    let provider = medical
        .create_provider(
            case_id,
            NewProvider {
                name: "Mercy General".to_string(),
                provider_type: "hospital".to_string(),
                phone: None,
                address: None,
                first_treatment: None,
                last_treatment: None,
                status: None,
            },
        )
        .await
        .expect("create provider");

    let record = medical
        .create_record(
            case_id,
            NewRecord {
                provider_id: Some(provider.provider_id),
                record_date: chrono::Utc::now().date_naive(),
                record_type: "ER visit".to_string(),
                description: None,
                cost: Some(Decimal::new(125050, 2)),
                bill_received: true,
                records_received: false,
            },
        )
        .await
        .expect("create record");

    let after_create = medical.get_provider(provider.provider_id).await.expect("get");
    assert_eq!(after_create.provider.total_bills, Decimal::new(125050, 2));

    medical
        .update_record(
            record.record_id,
            RecordUpdate {
                cost: Some(Decimal::new(200000, 2)),
                ..RecordUpdate::default()
            },
        )
        .await
        .expect("update record");
    let after_update = medical.get_provider(provider.provider_id).await.expect("get");
    assert_eq!(after_update.provider.total_bills, Decimal::new(200000, 2));

    medical.delete_record(record.record_id).await.expect("delete record");
    let after_delete = medical.get_provider(provider.provider_id).await.expect("get");
    assert_eq!(after_delete.provider.total_bills, Decimal::ZERO);
}

#[tokio::test]
#[ignore]
async fn case_listing_pagination_meta_is_consistent() {
    let manager = get_test_manager().await;
    let clients = manager.client_service();
    let cases = manager.case_service();
    let actor = seed_user(manager.pool()).await;

    let client = clients
        .create(new_client(&Uuid::new_v4().simple().to_string()))
        .await
        .expect("create client");
    for i in 0..3 {
        cases
            .create(new_case(client.client.client_id, &format!("Matter {i}")), actor)
            .await
            .expect("create case");
    }

    let filter = CaseFilter {
        client_id: Some(client.client.client_id),
        ..CaseFilter::default()
    };
    let page = cases
        .list(
            filter.clone(),
            PageParams {
                page: Some(1),
                limit: Some(2),
            }
            .resolve(DEFAULT_LIMIT),
        )
        .await
        .expect("list page 1");
    assert_eq!(page.meta.total, 3);
    assert_eq!(page.meta.total_pages, 2);
    assert_eq!(page.data.len(), 2);

    let page2 = cases
        .list(
            filter,
            PageParams {
                page: Some(2),
                limit: Some(2),
            }
            .resolve(DEFAULT_LIMIT),
        )
        .await
        .expect("list page 2");
    assert_eq!(page2.data.len(), 1);
}

#[tokio::test]
#[ignore]
async fn case_delete_cascades_to_children() {
    let manager = get_test_manager().await;
    let clients = manager.client_service();
    let cases = manager.case_service();
    let actor = seed_user(manager.pool()).await;

    let client = clients
        .create(new_client(&Uuid::new_v4().simple().to_string()))
        .await
        .expect("create client");
    let case = cases
        .create(new_case(client.client.client_id, "To be removed"), actor)
        .await
        .expect("create case");
    let case_id = case.case.case_id;

    cases.delete(case_id).await.expect("delete case");

    let err = cases.get(case_id).await.expect_err("case is gone");
    assert!(matches!(err, AppError::NotFound(_)));

    let orphans: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM case_assignments WHERE case_id = $1")
            .bind(case_id)
            .fetch_one(manager.pool())
            .await
            .expect("count assignments");
    assert_eq!(orphans, 0);
}
