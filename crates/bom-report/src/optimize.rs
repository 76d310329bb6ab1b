//! Typed optimizer: one pick per component group for a structured intent.
//!
//! The intent comes from natural-language parsing upstream; nothing here
//! evaluates generated queries.

use bom_catalog::{ModelOptionRow, PerformanceCategory};
use bom_core::{Mass, OptionId, lb, total_mass};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Objective {
    Cost,
    Weight,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationIntent {
    #[serde(default)]
    pub maximize: Vec<PerformanceCategory>,
    #[serde(default)]
    pub minimize: Option<Objective>,
}

impl OptimizationIntent {
    pub fn is_empty(&self) -> bool {
        self.maximize.is_empty() && self.minimize.is_none()
    }

    pub fn describe(&self) -> String {
        let maximize: Vec<&str> = self.maximize.iter().map(|c| c.as_str()).collect();
        match (maximize.is_empty(), self.minimize) {
            (true, None) | (true, Some(Objective::Cost)) => "Minimized cost".to_string(),
            (true, Some(Objective::Weight)) => "Minimized weight".to_string(),
            (false, None) => format!("Maximized {}", maximize.join(", ")),
            (false, Some(Objective::Cost)) => {
                format!("Maximized {} while minimizing cost elsewhere", maximize.join(", "))
            }
            (false, Some(Objective::Weight)) => {
                format!("Maximized {} while minimizing weight elsewhere", maximize.join(", "))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub option_id: OptionId,
    pub option_name: String,
    pub system: String,
    pub subsystem: String,
    pub component_group: String,
    pub cost: f64,
    #[serde(with = "bom_core::units::pounds")]
    pub weight: Mass,
    pub performance_category: PerformanceCategory,
    pub performance_score: f64,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationResult {
    pub intent: OptimizationIntent,
    pub recommendations: Vec<Recommendation>,
    pub option_ids: Vec<OptionId>,
    pub total_cost: f64,
    #[serde(with = "bom_core::units::pounds")]
    pub total_weight: Mass,
    pub summary: String,
}

fn metric(row: &ModelOptionRow, objective: Objective) -> f64 {
    match objective {
        Objective::Cost => row.option.cost_usd,
        Objective::Weight => row.option.weight_lb,
    }
}

fn cmp_f64(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

/// Highest score first, then lowest metric.
fn by_score(objective: Objective) -> impl Fn(&ModelOptionRow, &ModelOptionRow) -> Ordering {
    move |a, b| {
        cmp_f64(b.option.performance_score, a.option.performance_score)
            .then_with(|| cmp_f64(metric(a, objective), metric(b, objective)))
    }
}

/// Lowest metric first, then highest score.
fn by_metric(objective: Objective) -> impl Fn(&ModelOptionRow, &ModelOptionRow) -> Ordering {
    move |a, b| {
        cmp_f64(metric(a, objective), metric(b, objective))
            .then_with(|| cmp_f64(b.option.performance_score, a.option.performance_score))
    }
}

/// First row that no later row strictly beats; keeps listing order on ties.
fn best<'a>(
    rows: impl IntoIterator<Item = &'a ModelOptionRow>,
    order: impl Fn(&ModelOptionRow, &ModelOptionRow) -> Ordering,
) -> Option<&'a ModelOptionRow> {
    rows.into_iter().fold(None, |current, row| match current {
        Some(current) if order(row, current) != Ordering::Less => Some(current),
        _ => Some(row),
    })
}

fn reason(row: &ModelOptionRow) -> String {
    let option = &row.option;
    if option.performance_score >= 8.0 {
        format!(
            "Top performer ({}, score: {})",
            option.performance_category, option.performance_score
        )
    } else if option.cost_usd == 0.0 {
        "Base option ($0)".to_string()
    } else if option.cost_usd <= 500.0 {
        format!("Budget-friendly (${:.0})", option.cost_usd)
    } else {
        format!(
            "{} (score: {})",
            option.performance_category, option.performance_score
        )
    }
}

/// Picks one option per component group of `rows` (one model's availability
/// rows) according to `intent`.
///
/// - Groups offering a maximized category take their best-scoring option in
///   those categories, ties to the lower cost or weight.
/// - Other groups take the lowest cost (or weight), ties to the higher score,
///   unless the intent only maximizes, in which case they are left out.
pub fn optimize(rows: &[ModelOptionRow], intent: &OptimizationIntent) -> OptimizationResult {
    let objective = intent.minimize.unwrap_or(Objective::Cost);

    let mut groups: BTreeMap<(&str, &str, &str), Vec<&ModelOptionRow>> = BTreeMap::new();
    for row in rows {
        groups
            .entry((
                row.option.system.as_str(),
                row.option.subsystem.as_str(),
                row.option.component_group.as_str(),
            ))
            .or_default()
            .push(row);
    }

    let mut recommendations = Vec::new();
    for group_rows in groups.values() {
        let in_focus: Vec<&ModelOptionRow> = group_rows
            .iter()
            .copied()
            .filter(|r| intent.maximize.contains(&r.option.performance_category))
            .collect();

        let pick = if !in_focus.is_empty() {
            best(in_focus, by_score(objective))
        } else if intent.maximize.is_empty() || intent.minimize.is_some() {
            best(group_rows.iter().copied(), by_metric(objective))
        } else {
            None
        };

        if let Some(row) = pick {
            let option = &row.option;
            recommendations.push(Recommendation {
                option_id: option.option_id.clone(),
                option_name: option.option_name.clone(),
                system: option.system.clone(),
                subsystem: option.subsystem.clone(),
                component_group: option.component_group.clone(),
                cost: option.cost_usd,
                weight: lb(option.weight_lb),
                performance_category: option.performance_category,
                performance_score: option.performance_score,
                reason: reason(row),
            });
        }
    }

    let total_cost = recommendations.iter().map(|r| r.cost).sum();
    let total_weight = total_mass(recommendations.iter().map(|r| r.weight));
    let summary = format!(
        "{} across {} component groups.",
        intent.describe(),
        recommendations.len()
    );

    OptimizationResult {
        intent: intent.clone(),
        option_ids: recommendations.iter().map(|r| r.option_id.clone()).collect(),
        recommendations,
        total_cost,
        total_weight,
        summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bom_catalog::BomOption;
    use bom_core::ModelId;

    fn row(
        id: &str,
        group: &str,
        cost: f64,
        weight: f64,
        category: PerformanceCategory,
        score: f64,
    ) -> ModelOptionRow {
        ModelOptionRow {
            option: BomOption {
                option_id: OptionId::from(id),
                option_name: id.to_string(),
                system: "Cab".to_string(),
                subsystem: "Interior".to_string(),
                component_group: group.to_string(),
                description: String::new(),
                cost_usd: cost,
                weight_lb: weight,
                performance_category: category,
                performance_score: score,
                specs: Default::default(),
            },
            model_id: ModelId::from("M1"),
            is_default: false,
        }
    }

    fn rows() -> Vec<ModelOptionRow> {
        use PerformanceCategory::*;
        vec![
            row("S0", "Seat", 0.0, 60.0, Economy, 3.0),
            row("S1", "Seat", 1450.0, 85.0, Comfort, 9.0),
            row("S2", "Seat", 900.0, 70.0, Comfort, 9.0),
            row("C0", "Collision", 0.0, 5.0, Safety, 5.0),
            row("C1", "Collision", 2800.0, 9.0, Safety, 10.0),
            row("M0", "Mirror", 300.0, 12.0, Economy, 4.0),
            row("M1", "Mirror", 100.0, 20.0, Economy, 6.0),
        ]
    }

    fn picked(result: &OptimizationResult) -> Vec<&str> {
        result.option_ids.iter().map(|id| id.as_str()).collect()
    }

    #[test]
    fn maximize_with_cost_elsewhere() {
        let intent = OptimizationIntent {
            maximize: vec![PerformanceCategory::Comfort],
            minimize: Some(Objective::Cost),
        };
        let result = optimize(&rows(), &intent);
        // Groups sort by name: Collision, Mirror, Seat.
        assert_eq!(picked(&result), vec!["C0", "M1", "S2"]);
        assert_eq!(result.total_cost, 1000.0);
    }

    #[test]
    fn maximize_only_skips_unrelated_groups() {
        let intent = OptimizationIntent {
            maximize: vec![PerformanceCategory::Safety],
            minimize: None,
        };
        let result = optimize(&rows(), &intent);
        assert_eq!(picked(&result), vec!["C1"]);
        assert_eq!(result.recommendations[0].reason, "Top performer (Safety, score: 10)");
    }

    #[test]
    fn minimize_weight_everywhere() {
        let intent = OptimizationIntent {
            maximize: vec![],
            minimize: Some(Objective::Weight),
        };
        let result = optimize(&rows(), &intent);
        assert_eq!(picked(&result), vec!["C0", "M0", "S0"]);
        assert!((bom_core::to_lb(result.total_weight) - 77.0).abs() < 1e-9);
    }

    #[test]
    fn empty_intent_defaults_to_cost() {
        let result = optimize(&rows(), &OptimizationIntent::default());
        assert_eq!(picked(&result), vec!["C0", "M1", "S0"]);
        assert!(result.summary.starts_with("Minimized cost"));
    }

    #[test]
    fn full_ties_keep_listing_order() {
        use PerformanceCategory::*;
        let rows = vec![
            row("A", "Seat", 100.0, 10.0, Comfort, 5.0),
            row("B", "Seat", 100.0, 10.0, Comfort, 5.0),
        ];
        let result = optimize(&rows, &OptimizationIntent::default());
        assert_eq!(picked(&result), vec!["A"]);
    }
}
