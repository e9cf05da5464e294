use assetforge_core::db::open_db_in_memory;
use assetforge_core::{
    AuditReason, CatalogRepository, ItemService, NewItem, RepoError, SqliteCatalogRepository,
    SqliteItemRepository,
};

#[test]
fn service_conveniences_route_through_update() {
    let conn = open_db_in_memory().unwrap();
    let catalogs = SqliteCatalogRepository::try_new(&conn).unwrap();
    let service = ItemService::new(SqliteItemRepository::try_new(&conn).unwrap());
    let dt = catalogs.find_type_by_code("DT").unwrap().unwrap().id;
    let sr = catalogs.find_type_by_code("SR").unwrap().unwrap().id;
    catalogs.register_ip("172.16.0.10").unwrap();

    let item = service.create(&NewItem::new("build box", dt)).unwrap();
    assert!(service.rename(item.id, "Build box").unwrap());
    assert!(service
        .set_ip(item.id, Some("172.16.0.10"), Some("static lease"))
        .unwrap());
    assert!(service.reclassify(item.id, sr, None).unwrap());

    let current = service.get_required(item.id).unwrap();
    assert_eq!(current.name, "Build box");
    assert_eq!(current.ip_address.as_deref(), Some("172.16.0.10"));
    assert_eq!(current.asset_tag, "SDMM-SR-0001");

    assert!(service.set_ip(item.id, None, None).unwrap());
    assert_eq!(service.get_required(item.id).unwrap().ip_address, None);

    let reasons: Vec<AuditReason> = service
        .history_for_item(item.id, None)
        .unwrap()
        .into_iter()
        .map(|entry| entry.reason)
        .collect();
    assert_eq!(reasons.len(), 5);
    assert!(reasons[..4].iter().all(|reason| *reason == AuditReason::Update));
    assert_eq!(reasons[4], AuditReason::Create);
}

#[test]
fn get_required_reports_missing_items() {
    let conn = open_db_in_memory().unwrap();
    let service = ItemService::new(SqliteItemRepository::try_new(&conn).unwrap());

    assert!(matches!(
        service.get_required(12).unwrap_err(),
        RepoError::NotFound(12)
    ));
    assert_eq!(service.get(12).unwrap(), None);
}

#[test]
fn service_archive_and_delete_follow_store_semantics() {
    let conn = open_db_in_memory().unwrap();
    let catalogs = SqliteCatalogRepository::try_new(&conn).unwrap();
    let service = ItemService::new(SqliteItemRepository::try_new(&conn).unwrap());
    let ap = catalogs.find_type_by_code("AP").unwrap().unwrap().id;
    let lobby = catalogs.create_location("Lobby", None).unwrap();

    let item = service.create(&NewItem::new("Ceiling AP", ap)).unwrap();
    assert!(service.move_location(item.id, Some(lobby.id), None).unwrap());
    service.add_audit_note(item.id, "firmware checked").unwrap();
    assert!(service.archive(item.id, Some("replaced")).unwrap());
    assert!(!service.archive(item.id, None).unwrap());
    assert!(service.delete(item.id, None).unwrap());
    assert!(!service.delete(item.id, None).unwrap());
}
