//! Configuration report builder.

use bom_catalog::{ModelOptionRow, PerformanceCategory, TruckModel};
use bom_core::{Mass, ModelId, OptionId, lb, total_mass};
use bom_store::{OptionCatalog, StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    /// Active and the model's default for the group.
    Default,
    /// Selected over the default at a higher cost.
    Upgraded,
    /// Selected over the default at equal or lower cost, or with no default.
    Downgraded,
    /// Not active.
    Base,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BomItem {
    pub option_id: OptionId,
    pub option_name: String,
    pub description: String,
    pub cost: f64,
    #[serde(with = "bom_core::units::pounds")]
    pub weight: Mass,
    pub performance_category: PerformanceCategory,
    pub performance_score: f64,
    pub status: ItemStatus,
    pub is_selected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentGroupNode {
    pub name: String,
    pub items: Vec<BomItem>,
    pub selected_item: Option<BomItem>,
    pub total_cost: f64,
    #[serde(with = "bom_core::units::pounds")]
    pub total_weight: Mass,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubsystemNode {
    pub name: String,
    pub component_groups: Vec<ComponentGroupNode>,
    pub total_cost: f64,
    #[serde(with = "bom_core::units::pounds")]
    pub total_weight: Mass,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemNode {
    pub name: String,
    pub subsystems: Vec<SubsystemNode>,
    pub total_cost: f64,
    #[serde(with = "bom_core::units::pounds")]
    pub total_weight: Mass,
}

/// Whole-truck numbers: base model plus every active option.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportTotals {
    pub options_cost: f64,
    #[serde(with = "bom_core::units::pounds")]
    pub options_weight: Mass,
    pub total_cost: f64,
    #[serde(with = "bom_core::units::pounds")]
    pub total_weight: Mass,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationReport {
    pub model: TruckModel,
    pub bom_hierarchy: Vec<SystemNode>,
    pub selected_option_ids: Vec<OptionId>,
    pub default_option_ids: Vec<OptionId>,
    pub all_options: Vec<ModelOptionRow>,
    pub totals: ReportTotals,
}

type GroupKey<'a> = (&'a str, &'a str, &'a str);

fn group_key(row: &ModelOptionRow) -> GroupKey<'_> {
    (
        row.option.system.as_str(),
        row.option.subsystem.as_str(),
        row.option.component_group.as_str(),
    )
}

/// Builds the hierarchy from rows in catalog listing order.
///
/// The active option of a group is the last selected option of that group in
/// row order, or the group's default when nothing in it is selected. Systems
/// are sorted by name; subsystems and groups keep first-seen order.
pub fn build_hierarchy(rows: &[ModelOptionRow], selected: &[OptionId]) -> Vec<SystemNode> {
    let selected: HashSet<&OptionId> = selected.iter().collect();

    let mut defaults: HashMap<GroupKey<'_>, &ModelOptionRow> = HashMap::new();
    let mut active: HashMap<GroupKey<'_>, &OptionId> = HashMap::new();
    for row in rows {
        let key = group_key(row);
        if row.is_default {
            defaults.insert(key, row);
        }
        if selected.contains(&row.option.option_id) {
            active.insert(key, &row.option.option_id);
        } else if row.is_default {
            active.entry(key).or_insert(&row.option.option_id);
        }
    }

    let mut systems: Vec<SystemNode> = Vec::new();
    for row in rows {
        let key = group_key(row);
        let option = &row.option;
        let is_active = active.get(&key) == Some(&&option.option_id);
        let is_selected = selected.contains(&option.option_id);

        let status = if !is_active {
            ItemStatus::Base
        } else if row.is_default {
            ItemStatus::Default
        } else if is_selected {
            match defaults.get(&key) {
                Some(default) if option.cost_usd > default.option.cost_usd => ItemStatus::Upgraded,
                _ => ItemStatus::Downgraded,
            }
        } else {
            ItemStatus::Default
        };

        let item = BomItem {
            option_id: option.option_id.clone(),
            option_name: option.option_name.clone(),
            description: option.description.clone(),
            cost: option.cost_usd,
            weight: lb(option.weight_lb),
            performance_category: option.performance_category,
            performance_score: option.performance_score,
            status,
            is_selected: is_active,
        };

        let system = match systems.iter().position(|s| s.name == option.system) {
            Some(i) => &mut systems[i],
            None => {
                systems.push(SystemNode {
                    name: option.system.clone(),
                    subsystems: Vec::new(),
                    total_cost: 0.0,
                    total_weight: lb(0.0),
                });
                let last = systems.len() - 1;
                &mut systems[last]
            }
        };
        let subsystem = match system.subsystems.iter().position(|s| s.name == option.subsystem) {
            Some(i) => &mut system.subsystems[i],
            None => {
                system.subsystems.push(SubsystemNode {
                    name: option.subsystem.clone(),
                    component_groups: Vec::new(),
                    total_cost: 0.0,
                    total_weight: lb(0.0),
                });
                let last = system.subsystems.len() - 1;
                &mut system.subsystems[last]
            }
        };
        let group = match subsystem
            .component_groups
            .iter()
            .position(|g| g.name == option.component_group)
        {
            Some(i) => &mut subsystem.component_groups[i],
            None => {
                subsystem.component_groups.push(ComponentGroupNode {
                    name: option.component_group.clone(),
                    items: Vec::new(),
                    selected_item: None,
                    total_cost: 0.0,
                    total_weight: lb(0.0),
                });
                let last = subsystem.component_groups.len() - 1;
                &mut subsystem.component_groups[last]
            }
        };

        if is_active {
            group.total_cost = item.cost;
            group.total_weight = item.weight;
            group.selected_item = Some(item.clone());
        }
        group.items.push(item);
    }

    for system in &mut systems {
        for subsystem in &mut system.subsystems {
            subsystem.total_cost = subsystem.component_groups.iter().map(|g| g.total_cost).sum();
            subsystem.total_weight =
                total_mass(subsystem.component_groups.iter().map(|g| g.total_weight));
        }
        system.total_cost = system.subsystems.iter().map(|s| s.total_cost).sum();
        system.total_weight = total_mass(system.subsystems.iter().map(|s| s.total_weight));
    }

    systems.sort_by(|a, b| a.name.cmp(&b.name));
    systems
}

/// Full report for a model header and its availability rows.
pub fn build_report(
    model: TruckModel,
    rows: Vec<ModelOptionRow>,
    selected: Vec<OptionId>,
) -> ConfigurationReport {
    let bom_hierarchy = build_hierarchy(&rows, &selected);
    let default_option_ids = rows
        .iter()
        .filter(|r| r.is_default)
        .map(|r| r.option.option_id.clone())
        .collect();

    let options_cost: f64 = bom_hierarchy.iter().map(|s| s.total_cost).sum();
    let options_weight = total_mass(bom_hierarchy.iter().map(|s| s.total_weight));
    let totals = ReportTotals {
        options_cost,
        options_weight,
        total_cost: model.base_msrp + options_cost,
        total_weight: lb(model.base_weight_lb) + options_weight,
    };

    ConfigurationReport {
        model,
        bom_hierarchy,
        selected_option_ids: selected,
        default_option_ids,
        all_options: rows,
        totals,
    }
}

/// Loads the model and its rows, then builds the report. Unknown model is
/// `NotFound`.
pub fn report_for_model<C: OptionCatalog + ?Sized>(
    catalog: &C,
    model_id: &ModelId,
    selected: Vec<OptionId>,
) -> StoreResult<ConfigurationReport> {
    let model = catalog
        .get_model(model_id)?
        .ok_or_else(|| StoreError::not_found("Model", model_id.as_str()))?;
    let rows = catalog.options_for_model(Some(model_id))?;
    Ok(build_report(model, rows, selected))
}


#[cfg(test)]
mod proptests {
    use super::*;
    use bom_catalog::BomOption;
    use proptest::prelude::*;

    fn arb_rows() -> impl Strategy<Value = Vec<ModelOptionRow>> {
        prop::collection::vec((0usize..3, 0usize..3, 0u16..3000, any::<bool>()), 1..20).prop_map(
            |specs| {
                specs
                    .into_iter()
                    .enumerate()
                    .map(|(i, (system, group, cost, default))| ModelOptionRow {
                        option: BomOption {
                            option_id: OptionId::new(format!("O{i}")),
                            option_name: format!("Option {i}"),
                            system: format!("S{system}"),
                            subsystem: "Sub".to_string(),
                            component_group: format!("G{system}{group}"),
                            description: String::new(),
                            cost_usd: f64::from(cost),
                            weight_lb: f64::from(cost) / 4.0,
                            performance_category: PerformanceCategory::Economy,
                            performance_score: 1.0,
                            specs: Default::default(),
                        },
                        model_id: ModelId::from("M1"),
                        is_default: default,
                    })
                    .collect()
            },
        )
    }

    proptest! {
        #[test]
        fn one_active_item_per_group_and_totals_add_up(
            rows in arb_rows(),
            picks in prop::collection::vec(any::<prop::sample::Index>(), 0..5),
        ) {
            let selected: Vec<OptionId> = picks
                .iter()
                .map(|p| rows[p.index(rows.len())].option.option_id.clone())
                .collect();
            let systems = build_hierarchy(&rows, &selected);

            let mut item_count = 0;
            for system in &systems {
                let mut system_cost = 0.0;
                for subsystem in &system.subsystems {
                    for group in &subsystem.component_groups {
                        item_count += group.items.len();
                        let active: Vec<&BomItem> =
                            group.items.iter().filter(|i| i.is_selected).collect();
                        prop_assert!(active.len() <= 1);
                        let expected = active.first().map_or(0.0, |i| i.cost);
                        prop_assert_eq!(group.total_cost, expected);
                        for item in &group.items {
                            prop_assert_eq!(item.status == ItemStatus::Base, !item.is_selected);
                        }
                    }
                    system_cost += subsystem.total_cost;
                }
                prop_assert_eq!(system.total_cost, system_cost);
            }
            prop_assert_eq!(item_count, rows.len());
        }
    }
}
