// ==========================================
// 单证上传端到端测试
// ==========================================
// 测试范围:
// 1. 上传目录结构 (日期_主单证名) 与文件名清洗
// 2. 重复箱号拒绝,且不落盘
// 3. 未匹配箱号格式时以文件名作为箱号
// ==========================================


use chrono::Utc;
use test_helpers::{batch, TestEnv};
use textile_control_tower::api::{ApiError, ShipmentDetails};

#[tokio::test]
async fn test_upload_writes_dated_folder_with_sanitized_names() {
    let env = TestEnv::new().unwrap();

    let outcome = env
        .state
        .container_api
        .register_upload(
            batch(&["factura #12.pdf", "BL COSU-9876543.pdf"]),
            ShipmentDetails::new("SilkRoad Fabrics", "Seda Natural"),
        )
        .await
        .unwrap();

    let expected_folder = format!("{}_BL_COSU-9876543", Utc::now().date_naive().format("%Y-%m-%d"));
    assert_eq!(outcome.receipt.folder_name, expected_folder);
    assert_eq!(outcome.receipt.primary_name, "BL COSU-9876543.pdf");

    let folder = env.upload_dir.path().join(&expected_folder);
    assert!(folder.join("factura__12.pdf").is_file());
    assert!(folder.join("BL_COSU-9876543.pdf").is_file());
    assert_eq!(outcome.container.container_number, "COSU-9876543");
}

#[tokio::test]
async fn test_duplicate_batch_is_rejected_before_any_write() {
    let env = TestEnv::new().unwrap();
    let api = &env.state.container_api;
    api.register_upload(batch(&["HLBU-1234567_BL.pdf"]), ShipmentDetails::new("TextileGlobe", "Algodón"))
        .await
        .unwrap();
    let folders_before = std::fs::read_dir(env.upload_dir.path()).unwrap().count();

    let err = api
        .register_upload(
            batch(&["HLBU-1234567 reenvio BL.pdf", "invoice.pdf"]),
            ShipmentDetails::new("TextileGlobe", "Algodón"),
        )
        .await
        .unwrap_err();

    match &err {
        ApiError::DuplicateContainer {
            container_number,
            existing_status,
            existing_supplier,
        } => {
            assert_eq!(container_number, "HLBU-1234567");
            assert_eq!(existing_status, "TRANSIT");
            assert_eq!(existing_supplier, "TextileGlobe");
        }
        other => panic!("Expected DuplicateContainer, got {:?}", other),
    }
    assert!(err.user_message().contains("HLBU-1234567"));
    assert_eq!(std::fs::read_dir(env.upload_dir.path()).unwrap().count(), folders_before);
    assert_eq!(api.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_unmatched_name_becomes_container_number_and_blocks_reupload() {
    let env = TestEnv::new().unwrap();
    let api = &env.state.container_api;

    let first = api
        .register_upload(batch(&["scan_0042.pdf"]), ShipmentDetails::new("Proveedor X", "Mezcla"))
        .await
        .unwrap();
    assert_eq!(first.container.container_number, "scan_0042.pdf");

    let err = api
        .register_upload(batch(&["scan_0042.pdf"]), ShipmentDetails::new("Proveedor X", "Mezcla"))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::DuplicateContainer { .. }));
}
