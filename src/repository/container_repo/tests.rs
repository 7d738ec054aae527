use super::{ContainerRepository, StatusSwap};
use crate::domain::container::{ActivityEntry, Container, ContainerPatch};
use crate::domain::types::{ActivityRole, ContainerSize, ContainerStatus, SencamerStatus};
use crate::repository::error::RepositoryError;
use chrono::{Duration, NaiveDate, Utc};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

fn setup_test_db() -> Arc<Mutex<Connection>> {
    let conn = Connection::open_in_memory().unwrap();
    crate::db::configure_sqlite_connection(&conn).unwrap();
    crate::db::init_schema(&conn).unwrap();
    Arc::new(Mutex::new(conn))
}

fn make_container(id: &str, number: &str, supplier: &str) -> Container {
    Container {
        id: id.to_string(),
        container_number: number.to_string(),
        status: ContainerStatus::Transit,
        sencamer_status: SencamerStatus::Processing,
        sencamer_expiration_date: None,
        supplier: supplier.to_string(),
        textile_type: "Seda Natural".to_string(),
        container_size: Some(ContainerSize::Gp20),
        weight: Some("18,200 Kg".to_string()),
        vessel: Some("CMA CGM Marco Polo".to_string()),
        departure_date: NaiveDate::from_ymd_opt(2024, 9, 12),
        arrival_date: None,
        eta: Some(Utc::now() + Duration::days(30)),
        location: None,
        assigned_to: None,
        sla_deadline: None,
        activity_log: vec![ActivityEntry::system("creado desde carga de BL")],
        created_at: Utc::now(),
        updated_at: None,
    }
}

#[test]
fn test_insert_and_find_by_id() {
    let repo = ContainerRepository::new(setup_test_db());
    let container = make_container("c1", "COSU-9876543", "SilkRoad Fabrics");

    repo.insert_if_absent(&container, Some("COSU-9876543_BL.pdf")).unwrap();

    let found = repo.find_by_id("c1").unwrap().unwrap();
    assert_eq!(found.container_number, "COSU-9876543");
    assert_eq!(found.status, ContainerStatus::Transit);
    assert_eq!(found.container_size, Some(ContainerSize::Gp20));
    assert_eq!(found.departure_date, NaiveDate::from_ymd_opt(2024, 9, 12));
    assert_eq!(found.activity_log.len(), 1);
    assert_eq!(found.activity_log[0].role, ActivityRole::System);
}

#[test]
fn test_duplicate_number_rejected_without_write() {
    let repo = ContainerRepository::new(setup_test_db());
    repo.insert_if_absent(&make_container("c1", "COSU-9876543", "SilkRoad Fabrics"), None)
        .unwrap();

    let result = repo.insert_if_absent(&make_container("c2", "COSU-9876543", "Otro"), None);

    match result {
        Err(RepositoryError::DuplicateContainerNumber {
            container_number,
            existing_status,
            existing_supplier,
        }) => {
            assert_eq!(container_number, "COSU-9876543");
            assert_eq!(existing_status, "TRANSIT");
            assert_eq!(existing_supplier, "SilkRoad Fabrics");
        }
        other => panic!("期望重复错误, 实际: {:?}", other),
    }
    assert_eq!(repo.count().unwrap(), 1);
    assert!(repo.find_by_id("c2").unwrap().is_none());
}

#[test]
fn test_duplicate_detected_by_raw_name() {
    let repo = ContainerRepository::new(setup_test_db());
    // 早期记录: 文件名未匹配箱号格式,直接以文件名作为箱号
    repo.insert_if_absent(&make_container("c1", "scan_0042.pdf", "Shanghai Fabrics Co."), None)
        .unwrap();

    let result = repo.insert_if_absent(
        &make_container("c2", "scan_0042", "Shanghai Fabrics Co."),
        Some("scan_0042.pdf"),
    );

    assert!(matches!(result, Err(RepositoryError::DuplicateContainerNumber { .. })));
    assert_eq!(repo.count().unwrap(), 1);
}

#[test]
fn test_list_all_orders_by_creation_desc() {
    let repo = ContainerRepository::new(setup_test_db());
    let mut older = make_container("c1", "HLBU-1234567", "TextileGlobe Solutions");
    older.created_at = Utc::now() - Duration::hours(2);
    let newer = make_container("c2", "MSCU-4567890", "DenimWorld");

    repo.insert_if_absent(&older, None).unwrap();
    repo.insert_if_absent(&newer, None).unwrap();

    let all = repo.list_all().unwrap();
    let ids: Vec<_> = all.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["c2", "c1"]);
    assert_eq!(all[1].activity_log.len(), 1);
}

#[test]
fn test_transition_status_and_not_found() {
    let repo = ContainerRepository::new(setup_test_db());
    repo.insert_if_absent(&make_container("c1", "HLBU-1234567", "A"), None).unwrap();
    let entry = ActivityEntry::system("TRANSIT -> PORT");

    let swap = repo
        .transition_status("c1", ContainerStatus::Transit, ContainerStatus::Port, &entry, Utc::now())
        .unwrap();
    assert_eq!(swap, StatusSwap::Applied);
    let found = repo.find_by_id("c1").unwrap().unwrap();
    assert_eq!(found.status, ContainerStatus::Port);
    assert!(found.updated_at.is_some());
    assert_eq!(found.activity_log.len(), 2);

    let missing = repo.transition_status("nope", ContainerStatus::Transit, ContainerStatus::Port, &entry, Utc::now());
    assert!(matches!(missing, Err(RepositoryError::NotFound { .. })));
}

#[test]
fn test_transition_status_with_stale_from_writes_nothing() {
    let repo = ContainerRepository::new(setup_test_db());
    repo.insert_if_absent(&make_container("c1", "HLBU-1234567", "A"), None).unwrap();
    let entry = ActivityEntry::system("TRANSIT -> PORT");
    repo.transition_status("c1", ContainerStatus::Transit, ContainerStatus::Port, &entry, Utc::now())
        .unwrap();

    // 第二个写入者仍以 TRANSIT 为前提
    let swap = repo
        .transition_status("c1", ContainerStatus::Transit, ContainerStatus::Port, &entry, Utc::now())
        .unwrap();

    assert_eq!(swap, StatusSwap::Stale { current: ContainerStatus::Port });
    let found = repo.find_by_id("c1").unwrap().unwrap();
    assert_eq!(found.status, ContainerStatus::Port);
    assert_eq!(found.activity_log.len(), 2);
}

#[test]
fn test_update_fields_keeps_status() {
    let repo = ContainerRepository::new(setup_test_db());
    repo.insert_if_absent(&make_container("c1", "OOCL-9988776", "GlobalLinen"), None).unwrap();

    let patch = ContainerPatch {
        sencamer_status: Some(SencamerStatus::Expired),
        location: Some("Galpón 3".to_string()),
        ..Default::default()
    };
    let updated = repo.update_fields("c1", &patch, Utc::now()).unwrap();
    assert_eq!(updated.sencamer_status, SencamerStatus::Expired);

    let found = repo.find_by_id("c1").unwrap().unwrap();
    assert_eq!(found.sencamer_status, SencamerStatus::Expired);
    assert_eq!(found.location.as_deref(), Some("Galpón 3"));
    assert_eq!(found.status, ContainerStatus::Transit);
}

#[test]
fn test_activity_is_append_only_in_order() {
    let repo = ContainerRepository::new(setup_test_db());
    repo.insert_if_absent(&make_container("c1", "HLBU-1234567", "A"), None).unwrap();

    repo.append_activity("c1", &ActivityEntry::new("Ana", ActivityRole::Analyst, "peso corregido"))
        .unwrap();
    repo.append_activity("c1", &ActivityEntry::new("Carlos", ActivityRole::Manager, "ok"))
        .unwrap();

    let found = repo.find_by_id("c1").unwrap().unwrap();
    let messages: Vec<_> = found.activity_log.iter().map(|e| e.message.as_str()).collect();
    assert_eq!(messages, vec!["creado desde carga de BL", "peso corregido", "ok"]);

    let missing = repo.append_activity("nope", &ActivityEntry::system("x"));
    assert!(matches!(missing, Err(RepositoryError::NotFound { .. })));
}

#[test]
fn test_delete_cascades_activity() {
    let db = setup_test_db();
    let repo = ContainerRepository::new(db.clone());
    repo.insert_if_absent(&make_container("c1", "HLBU-1234567", "A"), None).unwrap();

    repo.delete("c1").unwrap();

    assert_eq!(repo.count().unwrap(), 0);
    let remaining: i64 = db
        .lock()
        .unwrap()
        .query_row("SELECT COUNT(*) FROM container_activity", [], |row| row.get(0))
        .unwrap();
    assert_eq!(remaining, 0);
    assert!(matches!(repo.delete("c1"), Err(RepositoryError::NotFound { .. })));
}

#[test]
fn test_ensure_absent_detects_existing() {
    let repo = ContainerRepository::new(setup_test_db());
    repo.insert_if_absent(&make_container("c1", "COSU-9876543", "SilkRoad Fabrics"), None)
        .unwrap();

    assert!(repo.ensure_absent("HLBU-1234567", Some("HLBU-1234567_BL.pdf")).is_ok());
    assert!(matches!(
        repo.ensure_absent("COSU-9876543", None),
        Err(RepositoryError::DuplicateContainerNumber { .. })
    ));
}

#[test]
fn test_find_by_number() {
    let repo = ContainerRepository::new(setup_test_db());
    repo.insert_if_absent(&make_container("c1", "HLBU-1234567", "A"), None).unwrap();

    assert_eq!(repo.find_by_number("HLBU-1234567").unwrap().unwrap().id, "c1");
    assert!(repo.find_by_number("HLBU-0000000").unwrap().is_none());
}
