use std::collections::HashSet;

use alloyblend_solver::{ConstraintOp, LpProblem, Variable};
use serde::Serialize;

use crate::error::ConstraintError;
use crate::model::{AdditionalConstraint, BlendingProblem, RawMaterial};
use crate::properties::Property;

/// Which side of a range a row enforces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundSide {
    Min,
    Max,
}

/// Domain meaning of a model row
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RowKind {
    MassBalance,
    ElementMin { symbol: String },
    ElementMax { symbol: String },
    ElementTarget { symbol: String },
    Impurity,
    Property { property: Property, side: BoundSide },
    MaterialLimit { material: String, side: BoundSide },
    Environmental { name: String },
    ElementRatio { numerator: String, denominator: String, side: BoundSide },
    IndicatorLink { material: String },
    Cardinality,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RowInfo {
    pub name: String,
    pub kind: RowKind,
}

/// A blending problem compiled into a linear program
#[derive(Debug, Clone)]
pub struct BlendModel {
    pub lp: LpProblem,
    /// One entry per LP row, same order
    pub rows: Vec<RowInfo>,
    /// LP column of each raw material, in input order
    pub material_columns: Vec<usize>,
    /// Binary use-indicator columns, empty unless a cardinality cap is set
    pub indicator_columns: Vec<usize>,
}

impl BlendModel {
    pub fn is_mixed_integer(&self) -> bool {
        self.lp.is_mixed_integer()
    }

    pub fn row_index(&self, name: &str) -> Option<usize> {
        self.rows.iter().position(|r| r.name == name)
    }

    /// Material quantities out of a full solution vector
    pub fn quantities(&self, values: &[f64]) -> Vec<f64> {
        self.material_columns
            .iter()
            .map(|&j| values.get(j).copied().unwrap_or(0.0).max(0.0))
            .collect()
    }
}

/// Compiles a validated [`BlendingProblem`] into a [`BlendModel`].
///
/// Every percentage bound is written relative to the blend's own mass, so
/// `pct(e) >= p` becomes `sum((c_ie - p) / 100 * x_i) >= 0`. Together with
/// the mass-balance row this needs no division by the total.
pub struct ConstraintBuilder<'a> {
    problem: &'a BlendingProblem,
    lp: LpProblem,
    rows: Vec<RowInfo>,
    material_columns: Vec<usize>,
    indicator_columns: Vec<usize>,
}

impl<'a> ConstraintBuilder<'a> {
    pub fn new(problem: &'a BlendingProblem) -> Self {
        Self {
            problem,
            lp: LpProblem::new(),
            rows: Vec::new(),
            material_columns: Vec::new(),
            indicator_columns: Vec::new(),
        }
    }

    /// Shorthand for `ConstraintBuilder::new(problem).build()`
    pub fn build_model(problem: &BlendingProblem) -> Result<BlendModel, ConstraintError> {
        ConstraintBuilder::new(problem).build()
    }

    pub fn build(mut self) -> Result<BlendModel, ConstraintError> {
        let problem = self.problem;

        // One bounded column per material, objective = cost per kg
        for material in &problem.raw_materials {
            let column = self.lp.add_variable(
                Variable::continuous(material.name.clone()).with_bounds(0.0, Some(material.availability)),
            );
            self.material_columns.push(column);
        }
        let costs = problem.raw_materials.iter().map(|m| m.cost_per_kg).collect();
        self.lp.set_objective(costs, true);

        // Mass balance: sum of all quantities = target weight
        let ones = vec![1.0; problem.raw_materials.len()];
        self.push_row("total_weight", RowKind::MassBalance, ones, ConstraintOp::Eq, problem.alloy_spec.target_weight);

        self.add_element_rows();
        self.add_impurity_row();
        self.add_property_rows(Property::Hardness, "hardness");
        self.add_property_rows(Property::MeltingPoint, "melting_point");

        for constraint in &problem.additional_constraints.constraints {
            self.add_additional(constraint)?;
        }

        Ok(BlendModel {
            lp: self.lp,
            rows: self.rows,
            material_columns: self.material_columns,
            indicator_columns: self.indicator_columns,
        })
    }

    fn push_row(&mut self, name: impl Into<String>, kind: RowKind, mut coeffs: Vec<f64>, op: ConstraintOp, rhs: f64) {
        let name = name.into();
        coeffs.resize(self.lp.num_variables(), 0.0);
        self.lp.add_constraint(name.clone(), coeffs, op, rhs);
        self.rows.push(RowInfo { name, kind });
    }

    /// Per-material coefficients `f(material) - level`
    fn relative_coeffs(&self, level: f64, f: impl Fn(&RawMaterial) -> f64) -> Vec<f64> {
        self.problem.raw_materials.iter().map(|m| f(m) - level).collect()
    }

    fn add_element_rows(&mut self) {
        let problem = self.problem;
        for element in &problem.alloy_spec.elements {
            let symbol = element.symbol.as_str();
            let fraction = |m: &RawMaterial| m.percent_of(symbol) / 100.0;

            if let Some(target) = element.fixed_percent() {
                let coeffs = self.relative_coeffs(target / 100.0, fraction);
                let kind = RowKind::ElementTarget { symbol: symbol.to_string() };
                self.push_row(format!("{}_target", symbol), kind, coeffs, ConstraintOp::Eq, 0.0);
                continue;
            }

            if element.min_percent > 0.0 {
                let coeffs = self.relative_coeffs(element.min_percent / 100.0, fraction);
                let kind = RowKind::ElementMin { symbol: symbol.to_string() };
                self.push_row(format!("{}_min", symbol), kind, coeffs, ConstraintOp::Ge, 0.0);
            }
            if element.max_percent < 100.0 {
                let coeffs = self.relative_coeffs(element.max_percent / 100.0, fraction);
                let kind = RowKind::ElementMax { symbol: symbol.to_string() };
                self.push_row(format!("{}_max", symbol), kind, coeffs, ConstraintOp::Le, 0.0);
            }
        }
    }

    fn add_impurity_row(&mut self) {
        let problem = self.problem;
        let spec = &problem.alloy_spec;
        if spec.max_impurities >= 100.0 {
            return;
        }
        let coeffs = self.relative_coeffs(spec.max_impurities / 100.0, |m| m.unspecified_fraction(spec.symbols()));
        self.push_row("max_impurities", RowKind::Impurity, coeffs, ConstraintOp::Le, 0.0);
    }

    fn add_property_rows(&mut self, property: Property, label: &str) {
        let problem = self.problem;
        let spec = &problem.alloy_spec;
        let (min, max) = spec.property_bounds(property);
        if min.is_none() && max.is_none() {
            return;
        }

        // Each material contributes its own property value per kg
        let model = spec.property_model(property);
        let bounds = [(min, BoundSide::Min, ConstraintOp::Ge, "min"), (max, BoundSide::Max, ConstraintOp::Le, "max")];
        for (bound, side, op, suffix) in bounds {
            if let Some(bound) = bound {
                let coeffs = self.relative_coeffs(bound, |m| model.evaluate(&m.composition));
                self.push_row(format!("{}_{}", label, suffix), RowKind::Property { property, side }, coeffs, op, 0.0);
            }
        }
    }

    fn add_additional(&mut self, constraint: &AdditionalConstraint) -> Result<(), ConstraintError> {
        match constraint {
            AdditionalConstraint::MaxMaterials { count } => self.add_cardinality(*count),
            AdditionalConstraint::MaterialLimit {
                material,
                min_quantity,
                max_quantity,
            } => self.add_material_limit(material, *min_quantity, *max_quantity),
            AdditionalConstraint::Environmental { name, factors, max_total } => {
                let context = format!("environmental '{}'", name);
                if !(max_total.is_finite() && *max_total >= 0.0) {
                    return Err(invalid(&context, format!("max_total must be non-negative, got {}", max_total)));
                }
                for (material, factor) in factors {
                    self.material_index(material, &context)?;
                    if !(factor.is_finite() && *factor >= 0.0) {
                        return Err(invalid(&context, format!("factor for '{}' must be non-negative", material)));
                    }
                }
                let coeffs = self
                    .problem
                    .raw_materials
                    .iter()
                    .map(|m| factors.get(&m.name).copied().unwrap_or(0.0))
                    .collect();
                let kind = RowKind::Environmental { name: name.clone() };
                self.push_row(format!("environmental_{}", name), kind, coeffs, ConstraintOp::Le, *max_total);
                Ok(())
            }
            AdditionalConstraint::ElementRatio {
                numerator,
                denominator,
                min_ratio,
                max_ratio,
            } => self.add_ratio(numerator, denominator, *min_ratio, *max_ratio),
        }
    }

    fn material_index(&self, material: &str, context: &str) -> Result<usize, ConstraintError> {
        self.problem
            .raw_materials
            .iter()
            .position(|m| m.name == material)
            .ok_or_else(|| ConstraintError::UnknownMaterial {
                context: context.to_string(),
                material: material.to_string(),
            })
    }

    fn add_material_limit(&mut self, material: &str, min: Option<f64>, max: Option<f64>) -> Result<(), ConstraintError> {
        let context = format!("material_limit '{}'", material);
        let index = self.material_index(material, &context)?;

        if min.is_none() && max.is_none() {
            return Err(invalid(&context, "needs min_quantity or max_quantity"));
        }
        for value in [min, max].into_iter().flatten() {
            if !(value.is_finite() && value >= 0.0) {
                return Err(invalid(&context, format!("quantities must be non-negative, got {}", value)));
            }
        }
        if let (Some(lo), Some(hi)) = (min, max) {
            if lo > hi {
                return Err(invalid(&context, format!("min_quantity {} exceeds max_quantity {}", lo, hi)));
            }
        }

        let mut unit = vec![0.0; self.problem.raw_materials.len()];
        unit[index] = 1.0;
        if let Some(lo) = min {
            let kind = RowKind::MaterialLimit { material: material.to_string(), side: BoundSide::Min };
            self.push_row(format!("{}_min_quantity", material), kind, unit.clone(), ConstraintOp::Ge, lo);
        }
        if let Some(hi) = max {
            let kind = RowKind::MaterialLimit { material: material.to_string(), side: BoundSide::Max };
            self.push_row(format!("{}_max_quantity", material), kind, unit, ConstraintOp::Le, hi);
        }
        Ok(())
    }

    /// Linearised ratio: `num / den >= R` becomes `num - R * den >= 0`
    fn add_ratio(
        &mut self,
        numerator: &str,
        denominator: &str,
        min: Option<f64>,
        max: Option<f64>,
    ) -> Result<(), ConstraintError> {
        let context = format!("element_ratio '{}/{}'", numerator, denominator);
        let known: HashSet<String> = self.problem.all_symbols().into_iter().collect();
        for symbol in [numerator, denominator] {
            if !known.contains(symbol) {
                return Err(ConstraintError::UnknownElement {
                    context: context.clone(),
                    symbol: symbol.to_string(),
                });
            }
        }
        if min.is_none() && max.is_none() {
            return Err(invalid(&context, "needs min_ratio or max_ratio"));
        }
        for value in [min, max].into_iter().flatten() {
            if !(value.is_finite() && value >= 0.0) {
                return Err(invalid(&context, format!("ratios must be non-negative, got {}", value)));
            }
        }

        let bounds = [(min, BoundSide::Min, ConstraintOp::Ge, "min"), (max, BoundSide::Max, ConstraintOp::Le, "max")];
        for (ratio, side, op, suffix) in bounds {
            if let Some(r) = ratio {
                let coeffs = self
                    .problem
                    .raw_materials
                    .iter()
                    .map(|m| (m.percent_of(numerator) - r * m.percent_of(denominator)) / 100.0)
                    .collect();
                let kind = RowKind::ElementRatio {
                    numerator: numerator.to_string(),
                    denominator: denominator.to_string(),
                    side,
                };
                self.push_row(format!("{}/{}_{}", numerator, denominator, suffix), kind, coeffs, op, 0.0);
            }
        }
        Ok(())
    }

    /// Binary use-indicators with `x_i <= availability_i * y_i` and `sum(y) <= count`
    fn add_cardinality(&mut self, count: usize) -> Result<(), ConstraintError> {
        if count == 0 {
            return Err(invalid("max_materials", "count must be at least 1"));
        }

        if self.indicator_columns.is_empty() {
            let problem = self.problem;
            for material in &problem.raw_materials {
                let column = self.lp.add_variable(Variable::binary(format!("use_{}", material.name)));
                self.indicator_columns.push(column);
            }
            for (i, material) in problem.raw_materials.iter().enumerate() {
                let mut coeffs = vec![0.0; self.lp.num_variables()];
                coeffs[self.material_columns[i]] = 1.0;
                coeffs[self.indicator_columns[i]] = -material.availability;
                let kind = RowKind::IndicatorLink { material: material.name.clone() };
                self.push_row(format!("{}_link", material.name), kind, coeffs, ConstraintOp::Le, 0.0);
            }
        }

        let mut coeffs = vec![0.0; self.lp.num_variables()];
        for &column in &self.indicator_columns {
            coeffs[column] = 1.0;
        }
        self.push_row("max_materials", RowKind::Cardinality, coeffs, ConstraintOp::Le, count as f64);
        Ok(())
    }
}

fn invalid(context: &str, reason: impl Into<String>) -> ConstraintError {
    ConstraintError::InvalidParameter {
        context: context.to_string(),
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AlloySpecification, Element, RawMaterial};
    use std::collections::BTreeMap;

    fn two_material_problem() -> BlendingProblem {
        BlendingProblem::new(
            "two",
            vec![
                RawMaterial::new("A", 2.0, 1000.0).with_element("X", 100.0),
                RawMaterial::new("B", 1.0, 1000.0).with_element("Y", 100.0),
            ],
            AlloySpecification::new(
                "alloy",
                100.0,
                vec![Element::new("X", 20.0, 40.0), Element::new("Y", 0.0, 100.0)],
            ),
        )
    }

    fn names(model: &BlendModel) -> Vec<&str> {
        model.rows.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn test_rows_in_deterministic_order() {
        let model = ConstraintBuilder::build_model(&two_material_problem()).unwrap();

        assert_eq!(names(&model), vec!["total_weight", "X_min", "X_max", "max_impurities"]);
        assert_eq!(model.lp.variables[0].upper, Some(1000.0));
        assert_eq!(model.lp.objective.coefficients, vec![2.0, 1.0]);
        assert!(!model.is_mixed_integer());

        // X >= 20% of the blend: (1 - 0.2) * A + (0 - 0.2) * B >= 0
        let x_min = &model.lp.constraints[1];
        assert_eq!(x_min.op, ConstraintOp::Ge);
        assert!((x_min.coefficients[0] - 0.8).abs() < 1e-12);
        assert!((x_min.coefficients[1] + 0.2).abs() < 1e-12);
        assert_eq!(x_min.rhs, 0.0);
    }

    #[test]
    fn test_rebuild_is_identical() {
        let problem = two_material_problem();
        let first = ConstraintBuilder::build_model(&problem).unwrap();
        let second = ConstraintBuilder::build_model(&problem).unwrap();
        assert_eq!(first.lp, second.lp);
        assert_eq!(first.rows, second.rows);
    }

    #[test]
    fn test_pinned_element_collapses_to_one_row() {
        let mut problem = two_material_problem();
        problem.alloy_spec.elements[0] = Element::new("X", 30.0, 30.0).with_target(30.0);
        let model = ConstraintBuilder::build_model(&problem).unwrap();

        assert_eq!(names(&model), vec!["total_weight", "X_target", "max_impurities"]);
        assert_eq!(model.lp.constraints[1].op, ConstraintOp::Eq);
    }

    #[test]
    fn test_target_replaces_min_and_max() {
        let mut problem = two_material_problem();
        problem.alloy_spec.elements[0] = Element::new("X", 20.0, 40.0).with_target(25.0);
        let model = ConstraintBuilder::build_model(&problem).unwrap();
        assert_eq!(names(&model), vec!["total_weight", "X_target", "max_impurities"]);
    }

    #[test]
    fn test_impurity_row_uses_unspecified_content() {
        let mut problem = two_material_problem();
        problem.raw_materials[1].composition = BTreeMap::from([("Y".to_string(), 90.0), ("Si".to_string(), 4.0)]);
        problem.alloy_spec.max_impurities = 5.0;
        let model = ConstraintBuilder::build_model(&problem).unwrap();

        let row = &model.lp.constraints[model.row_index("max_impurities").unwrap()];
        assert!((row.coefficients[0] + 0.05).abs() < 1e-12, "A: {}", row.coefficients[0]);
        assert!((row.coefficients[1] - 0.05).abs() < 1e-12, "B: {}", row.coefficients[1]);

        problem.alloy_spec.max_impurities = 100.0;
        let model = ConstraintBuilder::build_model(&problem).unwrap();
        assert!(model.row_index("max_impurities").is_none());
    }

    #[test]
    fn test_property_rows() {
        let mut problem = two_material_problem();
        problem.alloy_spec.min_hardness = Some(10.0);
        problem.alloy_spec.hardness_coefficients = Some(crate::properties::PropertyModel {
            coefficients: BTreeMap::from([("X".to_string(), 0.5)]),
            intercept: 0.0,
        });
        let model = ConstraintBuilder::build_model(&problem).unwrap();

        let row = &model.lp.constraints[model.row_index("hardness_min").unwrap()];
        // A alone has hardness 50, B alone 0
        assert_eq!(row.coefficients, vec![40.0, -10.0]);
        assert_eq!(row.op, ConstraintOp::Ge);
    }

    #[test]
    fn test_cardinality_adds_binary_indicators() {
        let problem = two_material_problem().with_constraint(AdditionalConstraint::MaxMaterials { count: 1 });
        let model = ConstraintBuilder::build_model(&problem).unwrap();

        assert!(model.is_mixed_integer());
        assert_eq!(model.indicator_columns, vec![2, 3]);
        let link = &model.lp.constraints[model.row_index("A_link").unwrap()];
        assert_eq!(link.coefficients, vec![1.0, 0.0, -1000.0, 0.0]);
        let cap = &model.lp.constraints[model.row_index("max_materials").unwrap()];
        assert_eq!(cap.coefficients, vec![0.0, 0.0, 1.0, 1.0]);
        assert_eq!(cap.rhs, 1.0);
        // rows built before the indicators were widened
        assert_eq!(model.lp.constraints[0].coefficients.len(), 4);
        assert_eq!(model.rows.last().unwrap().kind, RowKind::Cardinality);
    }

    #[test]
    fn test_unknown_references_are_rejected() {
        let problem = two_material_problem().with_constraint(AdditionalConstraint::MaterialLimit {
            material: "C".to_string(),
            min_quantity: None,
            max_quantity: Some(5.0),
        });
        let err = ConstraintBuilder::build_model(&problem).unwrap_err();
        assert!(matches!(err, ConstraintError::UnknownMaterial { ref material, .. } if material == "C"));

        let problem = two_material_problem().with_constraint(AdditionalConstraint::ElementRatio {
            numerator: "X".to_string(),
            denominator: "Zr".to_string(),
            min_ratio: Some(1.0),
            max_ratio: None,
        });
        let err = ConstraintBuilder::build_model(&problem).unwrap_err();
        assert!(matches!(err, ConstraintError::UnknownElement { ref symbol, .. } if symbol == "Zr"));

        let problem = two_material_problem().with_constraint(AdditionalConstraint::Environmental {
            name: "co2".to_string(),
            factors: BTreeMap::from([("Z".to_string(), 1.0)]),
            max_total: 10.0,
        });
        assert!(ConstraintBuilder::build_model(&problem).is_err());
    }

    #[test]
    fn test_additional_rows_are_appended_last() {
        let problem = two_material_problem()
            .with_constraint(AdditionalConstraint::Environmental {
                name: "co2".to_string(),
                factors: BTreeMap::from([("A".to_string(), 1.5)]),
                max_total: 60.0,
            })
            .with_constraint(AdditionalConstraint::ElementRatio {
                numerator: "X".to_string(),
                denominator: "Y".to_string(),
                min_ratio: None,
                max_ratio: Some(0.5),
            });
        let model = ConstraintBuilder::build_model(&problem).unwrap();

        assert_eq!(
            names(&model),
            vec!["total_weight", "X_min", "X_max", "max_impurities", "environmental_co2", "X/Y_max"]
        );
        let ratio = &model.lp.constraints[5];
        assert_eq!(ratio.coefficients, vec![1.0, -0.5]);
    }

    #[test]
    fn test_material_limit_validation() {
        let problem = two_material_problem().with_constraint(AdditionalConstraint::MaterialLimit {
            material: "A".to_string(),
            min_quantity: Some(10.0),
            max_quantity: Some(5.0),
        });
        let err = ConstraintBuilder::build_model(&problem).unwrap_err();
        assert!(matches!(err, ConstraintError::InvalidParameter { .. }));
    }
}
