use assetforge_core::db::open_db_in_memory;
use assetforge_core::{
    CatalogRepository, ImportRow, ImportRowError, ImportService, ItemListQuery, ItemRepository,
    ItemService, RepoError, SqliteCatalogRepository, SqliteItemRepository,
};

#[test]
fn import_creates_valid_rows_and_reports_rejected_ones() {
    let conn = open_db_in_memory().unwrap();
    let catalogs = SqliteCatalogRepository::try_new(&conn).unwrap();
    catalogs.register_ip("10.5.0.1").unwrap();
    catalogs.create_sub_type("Thin client", None).unwrap();

    let rows = vec![
        ImportRow {
            name: "Reception PC".to_string(),
            hardware_type: "pc".to_string(),
            location: Some("Front office".to_string()),
            user: Some("Sam".to_string()),
            group: Some("Admin".to_string()),
            sub_type: Some("thin client".to_string()),
            ip_address: Some("10.5.0.1".to_string()),
            ..ImportRow::default()
        },
        ImportRow {
            name: "Second PC".to_string(),
            hardware_type: "PC".to_string(),
            ip_address: Some("10.5.0.1".to_string()),
            ..ImportRow::default()
        },
        ImportRow {
            name: "Mystery".to_string(),
            hardware_type: "Hoverboard".to_string(),
            ..ImportRow::default()
        },
        ImportRow {
            name: "Hall phone".to_string(),
            hardware_type: "Landline Phone".to_string(),
            location: Some("front office".to_string()),
            extension: Some("2200".to_string()),
            ..ImportRow::default()
        },
        ImportRow {
            name: "Untyped".to_string(),
            ..ImportRow::default()
        },
        ImportRow {
            name: "Bad sub-type".to_string(),
            hardware_type: "LT".to_string(),
            sub_type: Some("Convertible".to_string()),
            ..ImportRow::default()
        },
    ];

    let service = ImportService::new(
        SqliteCatalogRepository::try_new(&conn).unwrap(),
        SqliteItemRepository::try_new(&conn).unwrap(),
    );
    let report = service.import_rows(&rows).unwrap();

    let tags: Vec<&str> = report
        .created
        .iter()
        .map(|item| item.asset_tag.as_str())
        .collect();
    assert_eq!(tags, vec!["SDMM-PC-0001", "SDMM-TP-0001"]);
    let reception = &report.created[0];
    assert_eq!(reception.location_name.as_deref(), Some("Front office"));
    assert_eq!(reception.user_name.as_deref(), Some("Sam"));
    assert_eq!(reception.group_name.as_deref(), Some("Admin"));
    assert_eq!(reception.sub_type_name.as_deref(), Some("Thin client"));
    let phone = &report.created[1];
    assert_eq!(phone.extension.as_deref(), Some("2200"));
    assert_eq!(phone.location_id, reception.location_id);

    let skipped: Vec<usize> = report.skipped.iter().map(|skip| skip.row).collect();
    assert_eq!(skipped, vec![2, 3, 5, 6]);
    assert!(matches!(
        report.skipped[0].error,
        ImportRowError::Rejected(RepoError::DuplicateIp { .. })
    ));
    assert!(matches!(
        &report.skipped[1].error,
        ImportRowError::UnknownType(name) if name == "Hoverboard"
    ));
    assert!(matches!(report.skipped[2].error, ImportRowError::MissingType));
    assert!(matches!(
        report.skipped[3].error,
        ImportRowError::UnknownSubType(_)
    ));
    assert_eq!(
        report.messages()[1],
        "row 3: unknown hardware type `Hoverboard`"
    );
}

#[test]
fn import_drops_extension_for_non_landline_types() {
    let conn = open_db_in_memory().unwrap();
    let service = ImportService::new(
        SqliteCatalogRepository::try_new(&conn).unwrap(),
        SqliteItemRepository::try_new(&conn).unwrap(),
    );

    let report = service
        .import_rows(&[ImportRow {
            name: "Desk laptop".to_string(),
            hardware_type: "Laptop".to_string(),
            extension: Some("3100".to_string()),
            ..ImportRow::default()
        }])
        .unwrap();
    assert_eq!(report.created.len(), 1);
    assert_eq!(report.created[0].extension, None);
    assert!(report.skipped.is_empty());

    let history = SqliteItemRepository::try_new(&conn)
        .unwrap()
        .history_for_item(report.created[0].id, None)
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].note.as_deref(), Some("imported"));

    let items = ItemService::new(SqliteItemRepository::try_new(&conn).unwrap());
    assert_eq!(items.list(&ItemListQuery::default()).unwrap().len(), 1);
}
