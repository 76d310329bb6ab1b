use std::path::Path;

fn seed_path() -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../data/catalog.yaml")
}

#[test]
fn seed_catalog_loads_and_validates() {
    let catalog = bom_catalog::load_yaml(&seed_path())
        .unwrap_or_else(|e| panic!("Failed to load seed catalog: {e}"));

    assert_eq!(catalog.version, bom_catalog::LATEST_VERSION);
    assert!(!catalog.models.is_empty());
    assert!(
        catalog
            .options
            .iter()
            .any(|o| o.component_group == "Turbocharger")
    );
    assert!(
        catalog
            .requirements
            .iter()
            .all(|r| r.min_value.is_some() || r.max_value.is_some())
    );
}

#[test]
fn yaml_and_json_saves_reload_identically() {
    let catalog = bom_catalog::load_yaml(&seed_path()).unwrap();
    let dir = tempfile::tempdir().unwrap();

    let yaml_path = dir.path().join("catalog.yaml");
    bom_catalog::save_yaml(&yaml_path, &catalog).unwrap();
    assert_eq!(bom_catalog::load_path(&yaml_path).unwrap(), catalog);

    let json_path = dir.path().join("catalog.json");
    bom_catalog::save_json(&json_path, &catalog).unwrap();
    assert_eq!(bom_catalog::load_path(&json_path).unwrap(), catalog);
}

#[test]
fn save_refuses_inconsistent_catalog() {
    let mut catalog = bom_catalog::load_yaml(&seed_path()).unwrap();
    let dup = catalog.options[0].clone();
    catalog.options.push(dup);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.yaml");
    let err = bom_catalog::save_yaml(&path, &catalog).unwrap_err();
    assert!(matches!(err, bom_catalog::CatalogError::Integrity(_)));
    assert!(!path.exists());
}
