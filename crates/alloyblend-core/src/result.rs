use std::collections::BTreeMap;

use alloyblend_solver::{Solution, SolutionStatus};
use serde::Serialize;

use crate::builder::{BlendModel, RowKind};
use crate::model::BlendingProblem;
use crate::properties::{self, PropertyEstimate};
use crate::sensitivity::SensitivityReport;

/// Outcome of one solve, in domain terms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OptimizationStatus {
    Optimal,
    Infeasible,
    Unbounded,
    /// Stopped early; quantities hold the best feasible blend, if any
    TimeLimitReached,
    SolverError,
}

impl From<SolutionStatus> for OptimizationStatus {
    fn from(status: SolutionStatus) -> Self {
        match status {
            SolutionStatus::Optimal => OptimizationStatus::Optimal,
            SolutionStatus::Infeasible => OptimizationStatus::Infeasible,
            SolutionStatus::Unbounded => OptimizationStatus::Unbounded,
            SolutionStatus::TimeLimitReached => OptimizationStatus::TimeLimitReached,
            SolutionStatus::Error => OptimizationStatus::SolverError,
        }
    }
}

impl std::fmt::Display for OptimizationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OptimizationStatus::Optimal => write!(f, "OPTIMAL"),
            OptimizationStatus::Infeasible => write!(f, "INFEASIBLE"),
            OptimizationStatus::Unbounded => write!(f, "UNBOUNDED"),
            OptimizationStatus::TimeLimitReached => write!(f, "TIME_LIMIT_REACHED"),
            OptimizationStatus::SolverError => write!(f, "SOLVER_ERROR"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OptimizationResult {
    pub status: OptimizationStatus,
    /// Present only when the status is `OPTIMAL`
    pub objective_value: Option<f64>,
    /// False when quantities hold an incumbent from a stopped solve
    pub proven_optimal: bool,
    /// Material name -> quantity
    pub solution: BTreeMap<String, f64>,
    /// Element symbol -> achieved percentage of the blend
    pub element_percentages: BTreeMap<String, f64>,
    pub total_weight: f64,
    pub total_cost: f64,
    pub constraints_satisfied: BTreeMap<String, bool>,
    /// Seconds spent inside the solver backend
    pub solve_time: f64,
    pub message: String,
    /// Rows that cannot be met together, worst first (infeasible problems)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<String>,
    pub sensitivity: Option<SensitivityReport>,
    pub properties: Option<PropertyEstimate>,
}

impl OptimizationResult {
    pub fn is_optimal(&self) -> bool {
        self.status == OptimizationStatus::Optimal
    }

    pub fn quantity(&self, material: &str) -> f64 {
        self.solution.get(material).copied().unwrap_or(0.0)
    }

    pub fn percentage(&self, symbol: &str) -> f64 {
        self.element_percentages.get(symbol).copied().unwrap_or(0.0)
    }

    /// Every satisfaction flag is true
    pub fn all_satisfied(&self) -> bool {
        self.constraints_satisfied.values().all(|ok| *ok)
    }
}

/// Map raw solver output back to domain units.
///
/// `tolerance` is relative to the target weight. Statuses without a usable
/// point produce empty quantity and percentage maps.
pub fn assemble(
    problem: &BlendingProblem,
    model: &BlendModel,
    solution: &Solution,
    solve_time: f64,
    tolerance: f64,
) -> OptimizationResult {
    let status = OptimizationStatus::from(solution.status);
    let mut result = OptimizationResult {
        status,
        objective_value: None,
        proven_optimal: status == OptimizationStatus::Optimal,
        solution: BTreeMap::new(),
        element_percentages: BTreeMap::new(),
        total_weight: 0.0,
        total_cost: 0.0,
        constraints_satisfied: BTreeMap::new(),
        solve_time,
        message: solution.message.clone(),
        diagnostics: solution.violations.iter().map(|v| v.description.clone()).collect(),
        sensitivity: None,
        properties: None,
    };

    if !solution.has_values() {
        return result;
    }

    let quantities = model.quantities(&solution.values);
    result.total_weight = quantities.iter().sum();
    result.total_cost = problem
        .raw_materials
        .iter()
        .zip(&quantities)
        .map(|(m, q)| m.cost_per_kg * q)
        .sum();
    result.solution = problem
        .raw_materials
        .iter()
        .zip(&quantities)
        .map(|(m, q)| (m.name.clone(), *q))
        .collect();
    result.element_percentages = problem.blend_composition(&quantities);
    result.constraints_satisfied = check_constraints(problem, model, &solution.values, &quantities, tolerance);
    result.properties = properties::estimate(problem, &quantities);
    if status == OptimizationStatus::Optimal {
        result.objective_value = solution.objective_value;
    }

    result
}

/// Satisfaction flag per constraint, checked in mass units with
/// `tolerance * target_weight` slack
fn check_constraints(
    problem: &BlendingProblem,
    model: &BlendModel,
    values: &[f64],
    quantities: &[f64],
    tolerance: f64,
) -> BTreeMap<String, bool> {
    let mut satisfied = BTreeMap::new();
    let slack = tolerance * problem.alloy_spec.target_weight;
    let total: f64 = quantities.iter().sum();

    // Element bounds are always reported, even where no row was needed
    for element in &problem.alloy_spec.elements {
        let mass: f64 = problem
            .raw_materials
            .iter()
            .zip(quantities)
            .map(|(m, q)| m.percent_of(&element.symbol) / 100.0 * q)
            .sum();
        let min_mass = element.min_percent / 100.0 * total;
        let max_mass = element.max_percent / 100.0 * total;

        satisfied.insert(format!("{}_min", element.symbol), mass >= min_mass - slack);
        satisfied.insert(format!("{}_max", element.symbol), mass <= max_mass + slack);
        if let Some(target) = element.target_percent {
            let target_mass = target / 100.0 * total;
            satisfied.insert(format!("{}_target", element.symbol), (mass - target_mass).abs() <= slack);
        }
    }

    for (row, info) in model.lp.constraints.iter().zip(&model.rows) {
        match info.kind {
            RowKind::ElementMin { .. }
            | RowKind::ElementMax { .. }
            | RowKind::ElementTarget { .. }
            | RowKind::IndicatorLink { .. } => continue,
            _ => {}
        }
        let scale = row.coefficients.iter().fold(1.0_f64, |acc, a| acc.max(a.abs()));
        let activity = row.activity(values);
        satisfied.insert(info.name.clone(), row.is_satisfied(activity, slack * scale));
    }

    satisfied
}
