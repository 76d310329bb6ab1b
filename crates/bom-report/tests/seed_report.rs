use bom_core::{ModelId, OptionId};
use bom_report::{ItemStatus, Objective, OptimizationIntent, optimize, report_for_model};
use bom_store::{MemoryStore, OptionCatalog};
use std::path::Path;

fn store() -> MemoryStore {
    let seed = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../data/catalog.yaml");
    let catalog = bom_catalog::load_yaml(&seed).unwrap();
    MemoryStore::new(catalog).unwrap()
}

fn item_status(report: &bom_report::ConfigurationReport, id: &str) -> ItemStatus {
    report
        .bom_hierarchy
        .iter()
        .flat_map(|s| &s.subsystems)
        .flat_map(|s| &s.component_groups)
        .flat_map(|g| &g.items)
        .find(|i| i.option_id.as_str() == id)
        .map(|i| i.status)
        .unwrap()
}

#[test]
fn engine_upgrade_shows_in_report() {
    let store = store();
    let report = report_for_model(
        &store,
        &ModelId::from("MDL-LONGHAUL"),
        vec![OptionId::from("103")],
    )
    .unwrap();

    assert_eq!(item_status(&report, "103"), ItemStatus::Upgraded);
    assert_eq!(item_status(&report, "101"), ItemStatus::Base);
    assert_eq!(item_status(&report, "111"), ItemStatus::Default);

    let systems: Vec<&str> = report.bom_hierarchy.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(systems, vec!["Cab", "Chassis", "Powertrain"]);

    let hierarchy_cost: f64 = report.bom_hierarchy.iter().map(|s| s.total_cost).sum();
    assert_eq!(report.totals.options_cost, hierarchy_cost);
    assert_eq!(report.totals.total_cost, report.model.base_msrp + 14_500.0);
    assert!(report.default_option_ids.contains(&OptionId::from("101")));
}

#[test]
fn unknown_model_is_not_found() {
    let err = report_for_model(&store(), &ModelId::from("MDL-NOPE"), vec![]).unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn comfort_focus_on_seed_catalog() {
    let store = store();
    let rows = store
        .options_for_model(Some(&ModelId::from("MDL-LONGHAUL")))
        .unwrap();
    let result = optimize(
        &rows,
        &OptimizationIntent {
            maximize: vec![bom_catalog::PerformanceCategory::Comfort],
            minimize: Some(Objective::Cost),
        },
    );
    assert!(result.option_ids.contains(&OptionId::from("302")));
    assert!(result.option_ids.contains(&OptionId::from("222")));
    assert!(result.option_ids.contains(&OptionId::from("132")));
    // One pick per component group.
    let groups: std::collections::HashSet<&str> = result
        .recommendations
        .iter()
        .map(|r| r.component_group.as_str())
        .collect();
    assert_eq!(groups.len(), result.recommendations.len());
}
