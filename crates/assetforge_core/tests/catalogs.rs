use assetforge_core::db::open_db_in_memory;
use assetforge_core::{
    CatalogRepository, ItemRepository, ItemValidationError, NewItem, RepoError,
    SqliteCatalogRepository, SqliteItemRepository,
};
use rusqlite::Connection;

#[test]
fn seeded_types_include_landline_phone() {
    let conn = open_db_in_memory().unwrap();
    let catalogs = SqliteCatalogRepository::try_new(&conn).unwrap();

    let codes: Vec<String> = catalogs
        .list_types()
        .unwrap()
        .into_iter()
        .map(|hardware_type| hardware_type.code)
        .collect();
    assert_eq!(codes.len(), 8);
    for code in ["AP", "DT", "LT", "PC", "PR", "SR", "SW", "TP"] {
        assert!(codes.iter().any(|seeded| seeded == code), "missing {code}");
    }

    let phone = catalogs.find_type_by_name("landline phone").unwrap().unwrap();
    assert_eq!(phone.code, "TP");
    assert_eq!(catalogs.find_type_by_code("tp").unwrap(), Some(phone.clone()));
    assert_eq!(catalogs.get_type(phone.id).unwrap(), Some(phone));
}

#[test]
fn create_type_uppercases_code_and_rejects_duplicates() {
    let conn = open_db_in_memory().unwrap();
    let catalogs = SqliteCatalogRepository::try_new(&conn).unwrap();

    let tablet = catalogs.create_type("Tablet", "tb").unwrap();
    assert_eq!(tablet.code, "TB");

    assert!(matches!(
        catalogs.create_type("Slate", "TB").unwrap_err(),
        RepoError::DuplicateName { name, .. } if name == "TB"
    ));
    assert!(matches!(
        catalogs.create_type("tablet", "TT").unwrap_err(),
        RepoError::DuplicateName { catalog: "hardware type", .. }
    ));
    assert!(matches!(
        catalogs.create_type("  ", "XX").unwrap_err(),
        RepoError::Validation(ItemValidationError::MissingCatalogField("hardware type name"))
    ));
}

#[test]
fn blank_catalog_input_is_a_recoverable_validation_error() {
    let conn = open_db_in_memory().unwrap();
    let catalogs = SqliteCatalogRepository::try_new(&conn).unwrap();

    let errors = vec![
        catalogs.create_type("Tablet", " ").unwrap_err(),
        catalogs.create_location("   ", None).unwrap_err(),
        catalogs.create_user("", Some("nobody@example.com")).unwrap_err(),
        catalogs.create_group("\t").unwrap_err(),
        catalogs.create_sub_type(" ", None).unwrap_err(),
        catalogs.register_ip("  ").unwrap_err(),
    ];
    for err in &errors {
        assert!(matches!(err, RepoError::Validation(_)), "{err}");
        assert!(err.is_recoverable(), "{err}");
        assert_eq!(err.code(), "validation");
    }
    assert_eq!(errors[1].to_string(), "location name is required");
    assert_eq!(errors[5].to_string(), "IP address is required");

    assert!(catalogs.list_locations().unwrap().is_empty());
    assert!(catalogs.list_ips().unwrap().is_empty());
}

#[test]
fn ensure_finds_existing_rows_case_insensitively() {
    let conn = open_db_in_memory().unwrap();
    let catalogs = SqliteCatalogRepository::try_new(&conn).unwrap();

    let created = catalogs.ensure_location("Server Room").unwrap();
    let found = catalogs.ensure_location("  server room ").unwrap();
    assert_eq!(created, found);
    assert_eq!(catalogs.list_locations().unwrap().len(), 1);

    let user = catalogs.ensure_user("Robin").unwrap();
    assert_eq!(catalogs.ensure_user("ROBIN").unwrap().id, user.id);
    let group = catalogs.ensure_group("Support").unwrap();
    assert_eq!(catalogs.ensure_group("support").unwrap().id, group.id);

    assert!(matches!(
        catalogs.create_group("SUPPORT").unwrap_err(),
        RepoError::DuplicateName { catalog: "group", .. }
    ));
}

#[test]
fn nested_locations_require_existing_parent() {
    let conn = open_db_in_memory().unwrap();
    let catalogs = SqliteCatalogRepository::try_new(&conn).unwrap();

    let building = catalogs.create_location("Building 1", None).unwrap();
    let floor = catalogs
        .create_location("Floor 2", Some(building.id))
        .unwrap();
    assert_eq!(floor.parent_id, Some(building.id));

    assert!(matches!(
        catalogs.create_location("Nowhere", Some(999)).unwrap_err(),
        RepoError::UnknownReference {
            catalog: "location",
            id: 999
        }
    ));
}

#[test]
fn users_keep_optional_email() {
    let conn = open_db_in_memory().unwrap();
    let catalogs = SqliteCatalogRepository::try_new(&conn).unwrap();

    let with_email = catalogs.create_user("Kai", Some(" kai@example.com ")).unwrap();
    let without = catalogs.create_user("Lee", Some("  ")).unwrap();
    assert_eq!(with_email.email.as_deref(), Some("kai@example.com"));
    assert_eq!(without.email, None);
    assert_eq!(
        catalogs.find_user_by_name("kai").unwrap(),
        Some(with_email)
    );
}

#[test]
fn sub_types_may_belong_to_a_known_type() {
    let conn = open_db_in_memory().unwrap();
    let catalogs = SqliteCatalogRepository::try_new(&conn).unwrap();
    let printer = catalogs.find_type_by_code("PR").unwrap().unwrap();

    let laser = catalogs.create_sub_type("Laser", Some(printer.id)).unwrap();
    assert_eq!(laser.type_id, Some(printer.id));
    let generic = catalogs.create_sub_type("Generic", None).unwrap();
    assert_eq!(generic.type_id, None);
    assert_eq!(catalogs.find_sub_type_by_name("LASER").unwrap(), Some(laser));
    assert_eq!(catalogs.list_sub_types().unwrap().len(), 2);

    assert!(matches!(
        catalogs.create_sub_type("Inkjet", Some(4_040)).unwrap_err(),
        RepoError::UnknownType(4_040)
    ));
}

#[test]
fn known_ip_catalog_tracks_availability() {
    let conn = open_db_in_memory().unwrap();
    let catalogs = SqliteCatalogRepository::try_new(&conn).unwrap();
    let repo = SqliteItemRepository::try_new(&conn).unwrap();

    let first = catalogs.register_ip(" 10.9.0.1 ").unwrap();
    assert_eq!(first.address, "10.9.0.1");
    assert_eq!(catalogs.register_ip("10.9.0.1").unwrap(), first);
    catalogs.register_ip("10.9.0.2").unwrap();
    assert_eq!(catalogs.list_ips().unwrap().len(), 2);
    assert_eq!(catalogs.find_ip("10.9.0.3").unwrap(), None);

    let pc = catalogs.find_type_by_code("PC").unwrap().unwrap().id;
    let mut new_item = NewItem::new("Router console", pc);
    new_item.ip_address = Some("10.9.0.1".to_string());
    let holder = repo.create_item(&new_item).unwrap();

    let available: Vec<String> = catalogs
        .list_available_ips()
        .unwrap()
        .into_iter()
        .map(|ip| ip.address)
        .collect();
    assert_eq!(available, vec!["10.9.0.2".to_string()]);

    repo.archive_item(holder.id, None).unwrap();
    assert_eq!(catalogs.list_available_ips().unwrap().len(), 2);
}

#[test]
fn repositories_refuse_unmigrated_connections() {
    let conn = Connection::open_in_memory().unwrap();
    assert!(matches!(
        SqliteCatalogRepository::try_new(&conn),
        Err(RepoError::UninitializedConnection { .. })
    ));
    assert!(matches!(
        SqliteItemRepository::try_new(&conn),
        Err(RepoError::UninitializedConnection { .. })
    ));
}
