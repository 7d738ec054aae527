// ==========================================
// 驾驶舱与报表导出端到端测试
// ==========================================
// 测试范围:
// 1. KPI: 在港、SENCAMER 问题、滞港风险 (阈值可配置)
// 2. 看板: 搜索与"仅问题项"过滤
// 3. CSV 导出: BOM、分号分隔、固定列序
// ==========================================


use chrono::{Duration, Utc};
use test_helpers::TestEnv;
use textile_control_tower::config::config_keys;
use textile_control_tower::domain::types::SencamerStatus;
use textile_control_tower::domain::{ContainerPatch, NewContainer};
use textile_control_tower::engine::board::BoardFilter;
use textile_control_tower::export::UTF8_BOM;

async fn seed(env: &TestEnv) {
    let registry = &env.state.registry;

    let mut soon = NewContainer::new("HLBU-1234567", "Shanghai Fabrics Co.", "Poliéster");
    soon.eta = Some(Utc::now() + Duration::hours(36));
    registry.create(soon).await.unwrap();

    let mut late = NewContainer::new("MSCU-4567890", "DenimWorld", "Denim");
    late.eta = Some(Utc::now() + Duration::days(5));
    let late = registry.create(late).await.unwrap();
    registry.advance(&late.id).await.unwrap();

    let mut far = NewContainer::new("COSU-9876543", "SilkRoad Fabrics", "Seda");
    far.eta = Some(Utc::now() + Duration::days(20));
    let far = registry.create(far).await.unwrap();
    env.state
        .container_api
        .update_fields(
            &far.id,
            ContainerPatch {
                sencamer_status: Some(SencamerStatus::Expired),
                ..Default::default()
            },
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_kpis_follow_configured_threshold() {
    let env = TestEnv::new().unwrap();
    seed(&env).await;

    let kpis = env.state.dashboard_api.kpis().await.unwrap();
    assert_eq!(kpis.total, 3);
    assert_eq!(kpis.in_port, 1);
    assert_eq!(kpis.sencamer_issues, 1);
    assert_eq!(kpis.demurrage_risk, 1);

    env.state
        .config_api
        .update_config(config_keys::DEMURRAGE_THRESHOLD_DAYS, "7")
        .unwrap();
    let kpis = env.state.dashboard_api.kpis().await.unwrap();
    assert_eq!(kpis.demurrage_risk, 2);
}

#[tokio::test]
async fn test_board_issue_filter() {
    let env = TestEnv::new().unwrap();
    seed(&env).await;

    let view = env
        .state
        .dashboard_api
        .board(BoardFilter {
            search: None,
            issues_only: true,
        })
        .await
        .unwrap();

    assert_eq!(view.kpis.total, 1);
    let numbers: Vec<_> = view
        .columns
        .iter()
        .flat_map(|c| c.containers.iter().map(|x| x.container_number.as_str()))
        .collect();
    assert_eq!(numbers, vec!["COSU-9876543"]);
}

#[tokio::test]
async fn test_export_csv_layout() {
    let env = TestEnv::new().unwrap();
    seed(&env).await;

    let csv = env.state.dashboard_api.export_csv().await.unwrap();

    assert!(csv.starts_with(UTF8_BOM));
    let lines: Vec<_> = csv.trim_start_matches(UTF8_BOM).lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines.iter().all(|l| l.split(';').count() == 10));
    // 最新创建的在前
    assert!(lines[1].starts_with("COSU-9876543;"));
    assert!(lines[1].contains(";EXPIRED;"));
}
