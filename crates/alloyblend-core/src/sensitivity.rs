//! Post-optimal interpretation of dual values and reduced costs.
//!
//! Only optimal, purely continuous solutions are analysed. For anything else
//! [`analyze`] reports why no analysis is available instead of producing
//! numbers that LP duality does not back.

use alloyblend_solver::{BasisStatus, ConstraintOp, SensitivityRange, Solution};
use serde::Serialize;
use thiserror::Error;

use crate::builder::{BlendModel, BoundSide, RowKind};
use crate::model::BlendingProblem;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unavailable {
    #[error("solution is not optimal")]
    NotOptimal,
    #[error("model contains integer variables")]
    MixedInteger,
    #[error("backend returned no dual information")]
    NoDuals,
}

#[derive(Debug, Clone, Serialize)]
pub struct SensitivityReport {
    pub shadow_prices: Vec<ShadowPrice>,
    pub reduced_costs: Vec<ReducedCost>,
    /// Rows holding with equality at the optimum
    pub binding_constraints: Vec<String>,
    /// An alternative optimum with the same cost exists
    pub degenerate: bool,
    /// Nonbasic materials with a zero reduced cost: unused ones could enter,
    /// fully used ones could leave, at no extra cost
    pub alternative_materials: Vec<String>,
    /// Binding inequality rows with a zero shadow price; the blend can move
    /// off them at no extra cost
    pub alternative_constraints: Vec<String>,
    /// Cost of one more unit of blend at the current composition
    pub marginal_cost_per_unit: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ShadowPrice {
    pub constraint: String,
    /// Change in total cost per unit increase of the row's right-hand side
    pub value: f64,
    pub binding: bool,
    /// Change in total cost when the bound moves up by one unit of its own
    /// measure (percentage point, property unit, ratio unit)
    pub per_unit_change: Option<f64>,
    pub interpretation: String,
    /// Right-hand side range keeping the basis feasible; `None` is unbounded
    pub rhs_lower: Option<f64>,
    pub rhs_upper: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReducedCost {
    pub material: String,
    pub quantity: f64,
    pub value: f64,
    pub in_solution: bool,
    pub interpretation: String,
    /// Cost-per-kg range keeping the blend optimal; `None` is unbounded
    pub cost_lower: Option<f64>,
    pub cost_upper: Option<f64>,
}

/// Interpret the duals of an optimal continuous blend.
///
/// `tolerance` is relative: quantities and row slacks are compared against
/// `tolerance * target_weight`, reduced costs against `tolerance` scaled by
/// the largest material cost.
pub fn analyze(
    problem: &BlendingProblem,
    model: &BlendModel,
    solution: &Solution,
    tolerance: f64,
) -> Result<SensitivityReport, Unavailable> {
    if !solution.is_optimal() {
        return Err(Unavailable::NotOptimal);
    }
    if model.is_mixed_integer() {
        return Err(Unavailable::MixedInteger);
    }
    let analysis = solution.analysis.as_ref().ok_or(Unavailable::NoDuals)?;
    if analysis.duals.len() != model.rows.len() || analysis.reduced_costs.len() != model.lp.num_variables() {
        return Err(Unavailable::NoDuals);
    }

    let weight = problem.alloy_spec.target_weight;
    let mass_tol = tolerance * weight;
    let max_cost = problem.raw_materials.iter().fold(1.0_f64, |acc, m| acc.max(m.cost_per_kg));
    let cost_tol = tolerance * max_cost;
    let values = &solution.values;

    let mut shadow_prices = Vec::with_capacity(model.rows.len());
    let mut binding_constraints = Vec::new();
    let mut alternative_constraints = Vec::new();
    let mut marginal_cost_per_unit = None;

    for (i, (row, info)) in model.lp.constraints.iter().zip(&model.rows).enumerate() {
        let dual = clean(analysis.duals[i], cost_tol);
        let scale = row.coefficients.iter().fold(1.0_f64, |acc, a| acc.max(a.abs()));
        let binding = (row.activity(values) - row.rhs).abs() <= mass_tol * scale;
        if binding {
            binding_constraints.push(info.name.clone());
            // Nonbasic slack with zero reduced cost
            if row.op != ConstraintOp::Eq && dual == 0.0 {
                alternative_constraints.push(info.name.clone());
            }
        }
        if info.kind == RowKind::MassBalance {
            marginal_cost_per_unit = Some(dual);
        }

        let per_unit_change = per_unit_change(problem, model, &info.kind, dual, values);
        let (rhs_lower, rhs_upper) = range_ends(analysis.rhs_ranges.as_deref(), i);

        shadow_prices.push(ShadowPrice {
            constraint: info.name.clone(),
            value: dual,
            binding,
            per_unit_change,
            interpretation: interpret_row(&info.kind, dual, per_unit_change, binding),
            rhs_lower,
            rhs_upper,
        });
    }

    let mut reduced_costs = Vec::with_capacity(model.material_columns.len());
    let mut alternative_materials = Vec::new();

    for (material, &column) in problem.raw_materials.iter().zip(&model.material_columns) {
        let quantity = values.get(column).copied().unwrap_or(0.0).max(0.0);
        let status = analysis.basis.get(column).copied().unwrap_or(BasisStatus::Basic);
        let value = clean(analysis.reduced_costs[column], cost_tol);
        let in_solution = quantity > mass_tol;

        let nonbasic = match status {
            BasisStatus::AtLower => !in_solution,
            BasisStatus::AtUpper => true,
            BasisStatus::Basic => false,
        };
        if nonbasic && value == 0.0 {
            alternative_materials.push(material.name.clone());
        }

        let interpretation = match status {
            BasisStatus::Basic => format!("{} is in the blend; its reduced cost is zero", material.name),
            BasisStatus::AtLower if value > 0.0 => format!(
                "Cost must fall by {:.4} per kg before {} enters the blend",
                value, material.name
            ),
            BasisStatus::AtLower => format!("{} could enter the blend at no extra cost", material.name),
            BasisStatus::AtUpper if value < 0.0 => format!(
                "All available {} is used; each extra kg would save {:.4}",
                material.name,
                -value
            ),
            BasisStatus::AtUpper => format!(
                "All available {} is used, but less of it would cost the same",
                material.name
            ),
        };
        let (cost_lower, cost_upper) = range_ends(analysis.cost_ranges.as_deref(), column);

        reduced_costs.push(ReducedCost {
            material: material.name.clone(),
            quantity,
            value,
            in_solution,
            interpretation,
            cost_lower,
            cost_upper,
        });
    }

    Ok(SensitivityReport {
        shadow_prices,
        reduced_costs,
        binding_constraints,
        degenerate: !alternative_materials.is_empty() || !alternative_constraints.is_empty(),
        alternative_materials,
        alternative_constraints,
        marginal_cost_per_unit,
    })
}

/// Snap numerical noise to zero
fn clean(value: f64, tolerance: f64) -> f64 {
    if value.abs() <= tolerance { 0.0 } else { value }
}

fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

fn range_ends(ranges: Option<&[SensitivityRange]>, index: usize) -> (Option<f64>, Option<f64>) {
    ranges
        .and_then(|r| r.get(index))
        .map(|r| (finite(r.lower), finite(r.upper)))
        .unwrap_or((None, None))
}

/// First-order cost change when a row's bound moves up by one unit of its
/// own measure. Rows are homogeneous in blend mass, so moving a percentage
/// bound by one point shifts every coefficient by `-1/100`, which at the
/// optimum is worth `dual * target_weight / 100`.
fn per_unit_change(
    problem: &BlendingProblem,
    model: &BlendModel,
    kind: &RowKind,
    dual: f64,
    values: &[f64],
) -> Option<f64> {
    let weight = problem.alloy_spec.target_weight;
    match kind {
        RowKind::ElementMin { .. } | RowKind::ElementMax { .. } | RowKind::ElementTarget { .. } => {
            Some(dual * weight / 100.0)
        }
        RowKind::Impurity => Some(dual * weight / 100.0),
        RowKind::Property { .. } => Some(dual * weight),
        RowKind::ElementRatio { denominator, .. } => {
            let quantities = model.quantities(values);
            let denominator_mass: f64 = problem
                .raw_materials
                .iter()
                .zip(&quantities)
                .map(|(m, q)| m.percent_of(denominator) / 100.0 * q)
                .sum();
            Some(dual * denominator_mass)
        }
        RowKind::MassBalance
        | RowKind::MaterialLimit { .. }
        | RowKind::Environmental { .. } => Some(dual),
        RowKind::IndicatorLink { .. } | RowKind::Cardinality => None,
    }
}

fn interpret_row(kind: &RowKind, dual: f64, per_unit: Option<f64>, binding: bool) -> String {
    if dual == 0.0 {
        return if binding {
            "Binding, but small changes do not affect cost".to_string()
        } else {
            "Not binding: small changes do not affect cost".to_string()
        };
    }
    let change = per_unit.unwrap_or(dual);
    let effect = |amount: f64| {
        if amount > 0.0 {
            format!("raises cost by {:.4}", amount)
        } else {
            format!("lowers cost by {:.4}", -amount)
        }
    };

    match kind {
        RowKind::MassBalance => format!("Each additional unit of blend at this composition costs {:.4}", dual),
        RowKind::ElementMin { symbol } => format!(
            "Minimum {} is binding: raising it by 1 percentage point {}",
            symbol,
            effect(change)
        ),
        RowKind::ElementMax { symbol } => format!(
            "Maximum {} is binding: raising it by 1 percentage point {}",
            symbol,
            effect(change)
        ),
        RowKind::ElementTarget { symbol } => format!(
            "Target {}: moving it up by 1 percentage point {}",
            symbol,
            effect(change)
        ),
        RowKind::Impurity => format!(
            "Impurity limit is binding: allowing 1 more percentage point {}",
            effect(change)
        ),
        RowKind::Property { property, side } => {
            let side = match side {
                BoundSide::Min => "minimum",
                BoundSide::Max => "maximum",
            };
            format!("Raising the {} {} by 1 unit {}", property, side, effect(change))
        }
        RowKind::MaterialLimit { material, side } => {
            let side = match side {
                BoundSide::Min => "minimum",
                BoundSide::Max => "maximum",
            };
            format!("Raising the {} quantity of {} by 1 kg {}", side, material, effect(change))
        }
        RowKind::Environmental { name } => {
            format!("Each additional unit of {} allowance {}", name, effect(change))
        }
        RowKind::ElementRatio { numerator, denominator, .. } => format!(
            "Raising the {}/{} ratio bound by 1 {}",
            numerator,
            denominator,
            effect(change)
        ),
        RowKind::IndicatorLink { .. } | RowKind::Cardinality => format!("Shadow price {:.4}", dual),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::ConstraintBuilder;
    use crate::model::{AdditionalConstraint, AlloySpecification, Element, RawMaterial};
    use crate::properties::PropertyModel;
    use alloyblend_solver::{SolveOptions, Solver, SolverBackend};
    use std::collections::BTreeMap;

    fn solve(problem: &BlendingProblem) -> (BlendModel, Solution) {
        let model = ConstraintBuilder::build_model(problem).unwrap();
        let solution = Solver::new().solve(&model.lp, &SolveOptions::default()).unwrap();
        (model, solution)
    }

    fn scenario_a() -> BlendingProblem {
        BlendingProblem::new(
            "scenario-a",
            vec![
                RawMaterial::new("A", 2.0, 1.0e6).with_element("X", 100.0),
                RawMaterial::new("B", 1.0, 1.0e6),
                RawMaterial::new("C", 3.0, 1.0e6).with_element("X", 100.0),
            ],
            AlloySpecification::new("alloy", 100.0, vec![Element::new("X", 30.0, 30.0)]).with_max_impurities(100.0),
        )
    }

    #[test]
    fn test_mass_balance_dual_is_marginal_blend_cost() {
        let problem = scenario_a();
        let (model, solution) = solve(&problem);
        let report = analyze(&problem, &model, &solution, 1e-6).unwrap();

        // One more unit at 30% X costs 0.3 * 2 + 0.7 * 1
        let marginal = report.marginal_cost_per_unit.unwrap();
        assert!((marginal - 1.3).abs() < 1e-6, "marginal = {}", marginal);

        let x = &report.shadow_prices[model.row_index("X_target").unwrap()];
        assert!(x.binding);
        // One more point of X swaps 1 kg of B for 1 kg of A
        assert!((x.per_unit_change.unwrap() - 1.0).abs() < 1e-6, "per point = {:?}", x.per_unit_change);
    }

    #[test]
    fn test_overpriced_material_has_positive_reduced_cost() {
        let problem = scenario_a();
        let (model, solution) = solve(&problem);
        let report = analyze(&problem, &model, &solution, 1e-6).unwrap();

        let c = &report.reduced_costs[2];
        assert_eq!(c.material, "C");
        assert!(!c.in_solution);
        assert!((c.value - 1.0).abs() < 1e-6, "rc = {}", c.value);
        assert!((c.cost_lower.unwrap() - 2.0).abs() < 1e-6, "range = {:?}", c.cost_lower);
        assert!(c.cost_upper.is_none());

        let a = &report.reduced_costs[0];
        assert!(a.in_solution);
        assert_eq!(a.value, 0.0);
        assert!(!report.degenerate);
    }

    #[test]
    fn test_tied_material_flags_degenerate_optimum() {
        let mut problem = scenario_a();
        problem.raw_materials[2].cost_per_kg = 2.0;
        let (model, solution) = solve(&problem);
        let report = analyze(&problem, &model, &solution, 1e-6).unwrap();

        assert!(report.degenerate);
        assert_eq!(report.alternative_materials.len(), 1);
    }

    #[test]
    fn test_not_available_for_mixed_integer_models() {
        let problem = scenario_a().with_constraint(AdditionalConstraint::MaxMaterials { count: 2 });
        let (model, solution) = solve(&problem);
        assert!(solution.is_optimal());
        assert_eq!(analyze(&problem, &model, &solution, 1e-6).unwrap_err(), Unavailable::MixedInteger);
    }

    #[test]
    fn test_not_available_when_not_optimal() {
        let problem = scenario_a();
        let model = ConstraintBuilder::build_model(&problem).unwrap();
        let solution = Solution::infeasible();
        assert_eq!(analyze(&problem, &model, &solution, 1e-6).unwrap_err(), Unavailable::NotOptimal);
    }

    #[test]
    fn test_minimum_bound_interpretation() {
        let problem = BlendingProblem::new(
            "min",
            vec![
                RawMaterial::new("A", 2.0, 1.0e6).with_element("X", 100.0),
                RawMaterial::new("B", 1.0, 1.0e6),
            ],
            AlloySpecification::new("alloy", 200.0, vec![Element::new("X", 25.0, 60.0)]).with_max_impurities(100.0),
        );
        let (model, solution) = solve(&problem);
        let report = analyze(&problem, &model, &solution, 1e-6).unwrap();

        let x_min = &report.shadow_prices[model.row_index("X_min").unwrap()];
        // Each extra point of X costs 2 kg of A instead of B
        assert!((x_min.per_unit_change.unwrap() - 2.0).abs() < 1e-6, "{:?}", x_min);
        assert!(x_min.interpretation.contains("raises cost by 2.0000"), "{}", x_min.interpretation);

        let x_max = &report.shadow_prices[model.row_index("X_max").unwrap()];
        assert!(!x_max.binding);
        assert_eq!(x_max.value, 0.0);
        assert_eq!(report.binding_constraints, vec!["total_weight", "X_min"]);
        assert!(!report.degenerate);
    }

    fn equal_cost_pair(a_availability: f64, x_min: f64, x_max: f64) -> BlendingProblem {
        BlendingProblem::new(
            "tied",
            vec![
                RawMaterial::new("A", 1.0, a_availability).with_element("X", 100.0),
                RawMaterial::new("B", 1.0, 1.0e6),
            ],
            AlloySpecification::new("alloy", 100.0, vec![Element::new("X", x_min, x_max)]).with_max_impurities(100.0),
        )
    }

    #[test]
    fn test_binding_row_with_zero_dual_flags_degenerate_optimum() {
        // Every blend between 20% and 60% X costs 100
        let problem = equal_cost_pair(1.0e6, 20.0, 60.0);
        let (model, solution) = solve(&problem);
        let report = analyze(&problem, &model, &solution, 1e-6).unwrap();

        assert!((solution.objective_value.unwrap() - 100.0).abs() < 1e-6);
        assert!(report.degenerate, "report: {:?}", report);
        assert_eq!(report.alternative_constraints.len(), 1, "{:?}", report.alternative_constraints);
        let row = report.alternative_constraints[0].as_str();
        assert!(row == "X_min" || row == "X_max", "row: {}", row);
        assert!(report.binding_constraints.iter().any(|name| name == row));
    }

    #[test]
    fn test_material_at_availability_with_zero_reduced_cost_is_alternative() {
        // A is either unused or capped at 50 kg; both cost 100
        let problem = equal_cost_pair(50.0, 0.0, 100.0);
        let (model, solution) = solve(&problem);
        let report = analyze(&problem, &model, &solution, 1e-6).unwrap();

        assert!(report.degenerate);
        assert_eq!(report.alternative_materials, vec!["A"]);
        assert!(report.alternative_constraints.is_empty());
    }

    fn priced_pair(a_cost: f64, b_cost: f64) -> BlendingProblem {
        BlendingProblem::new(
            "pair",
            vec![
                RawMaterial::new("A", a_cost, 1.0e6).with_element("X", 100.0),
                RawMaterial::new("B", b_cost, 1.0e6),
            ],
            AlloySpecification::new("alloy", 100.0, vec![Element::new("X", 0.0, 100.0)]).with_max_impurities(100.0),
        )
    }

    #[test]
    fn test_hardness_minimum_cost_per_unit() {
        // hardness = 10 + %X, so a minimum of 40 needs 30% X
        let mut problem = priced_pair(2.0, 1.0);
        problem.alloy_spec.min_hardness = Some(40.0);
        problem.alloy_spec.hardness_coefficients = Some(PropertyModel {
            coefficients: BTreeMap::from([("X".to_string(), 1.0)]),
            intercept: 10.0,
        });
        let (model, solution) = solve(&problem);
        let report = analyze(&problem, &model, &solution, 1e-6).unwrap();

        assert!((solution.objective_value.unwrap() - 130.0).abs() < 1e-6);
        let row = &report.shadow_prices[model.row_index("hardness_min").unwrap()];
        assert!(row.binding);
        // One more unit of hardness is one more point of X: 1 kg of A for B
        assert!((row.per_unit_change.unwrap() - 1.0).abs() < 1e-6, "{:?}", row);
        assert!((row.value - 0.01).abs() < 1e-9, "dual = {}", row.value);
    }

    #[test]
    fn test_melting_point_maximum_cost_per_unit() {
        // melting point = 1000 + 10 * %X, so a maximum of 1400 caps X at 40%
        let mut problem = priced_pair(1.0, 2.0);
        problem.alloy_spec.melting_point_max = Some(1400.0);
        problem.alloy_spec.melting_point_coefficients = Some(PropertyModel {
            coefficients: BTreeMap::from([("X".to_string(), 10.0)]),
            intercept: 1000.0,
        });
        let (model, solution) = solve(&problem);
        let report = analyze(&problem, &model, &solution, 1e-6).unwrap();

        assert!((solution.objective_value.unwrap() - 160.0).abs() < 1e-6);
        let row = &report.shadow_prices[model.row_index("melting_point_max").unwrap()];
        // One more degree allows 0.1 kg more of the cheaper A
        assert!((row.per_unit_change.unwrap() + 0.1).abs() < 1e-6, "{:?}", row);
        assert!(row.interpretation.contains("lowers cost by 0.1000"), "{}", row.interpretation);
    }

    #[test]
    fn test_ratio_minimum_cost_per_unit() {
        let problem = BlendingProblem::new(
            "ratio",
            vec![
                RawMaterial::new("A", 1.0, 1.0e6).with_element("X", 20.0).with_element("Y", 20.0),
                RawMaterial::new("B", 2.0, 1.0e6).with_element("X", 40.0).with_element("Y", 10.0),
            ],
            AlloySpecification::new(
                "alloy",
                100.0,
                vec![Element::new("X", 0.0, 100.0), Element::new("Y", 0.0, 100.0)],
            )
            .with_max_impurities(100.0),
        )
        .with_constraint(AdditionalConstraint::ElementRatio {
            numerator: "X".to_string(),
            denominator: "Y".to_string(),
            min_ratio: Some(1.5),
            max_ratio: None,
        });
        let (model, solution) = solve(&problem);
        let report = analyze(&problem, &model, &solution, 1e-6).unwrap();

        // B >= 0.4 A with A + B = 100
        let b = 100.0 / 1.4 * 0.4;
        assert!((solution.objective_value.unwrap() - (100.0 + b)).abs() < 1e-6);

        let row = &report.shadow_prices[model.row_index("X/Y_min").unwrap()];
        assert!((row.value - 1.0 / 0.35).abs() < 1e-6, "dual = {}", row.value);
        // d(cost)/d(ratio) = 100 * 0.96 / 1.4^2
        let expected = 100.0 * 0.96 / (1.4 * 1.4);
        assert!((row.per_unit_change.unwrap() - expected).abs() < 1e-6, "{:?}", row);
    }
}
