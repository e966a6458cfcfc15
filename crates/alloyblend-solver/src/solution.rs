/// The result of solving an LP/MILP problem
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone)]
pub struct Solution {
    /// Solution status
    pub status: SolutionStatus,
    /// Variable values (optimal, or best feasible when the status says so)
    pub values: Vec<f64>,
    /// Objective value, present only when the status is `Optimal`
    pub objective_value: Option<f64>,
    /// Post-optimal data, present only for optimal continuous problems
    pub analysis: Option<Analysis>,
    /// Constraint violations (populated when infeasible)
    pub violations: Vec<ConstraintViolation>,
    /// Human-readable backend message
    pub message: String,
    pub statistics: SolverStatistics,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolutionStatus {
    /// An optimal solution was found
    Optimal,
    /// The problem is infeasible (no solution exists)
    Infeasible,
    /// The problem is unbounded
    Unbounded,
    /// Stopped by the time limit or an interrupt; values hold the best
    /// feasible point found, if any, and are not proven optimal
    TimeLimitReached,
    /// Backend failure (numerical breakdown, iteration limit, licensing)
    Error,
}

impl std::fmt::Display for SolutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SolutionStatus::Optimal => write!(f, "OPTIMAL"),
            SolutionStatus::Infeasible => write!(f, "INFEASIBLE"),
            SolutionStatus::Unbounded => write!(f, "UNBOUNDED"),
            SolutionStatus::TimeLimitReached => write!(f, "TIME_LIMIT_REACHED"),
            SolutionStatus::Error => write!(f, "SOLVER_ERROR"),
        }
    }
}

/// Dual information of an optimal continuous solution
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone)]
pub struct Analysis {
    /// Dual value per row: change in objective per unit increase of the row's RHS
    pub duals: Vec<f64>,

    /// Reduced cost per variable
    /// For non-basic variables, indicates how much cost must change to enter solution
    pub reduced_costs: Vec<f64>,

    /// Where each variable sits relative to the optimal basis
    pub basis: Vec<BasisStatus>,

    /// Objective coefficient ranges that keep the basis optimal
    pub cost_ranges: Option<Vec<SensitivityRange>>,

    /// RHS ranges that keep the basis feasible
    pub rhs_ranges: Option<Vec<SensitivityRange>>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BasisStatus {
    Basic,
    AtLower,
    AtUpper,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct SensitivityRange {
    /// Variable or constraint name
    pub name: String,
    /// Current value
    pub current: f64,
    /// Lower bound of range where solution structure stays same
    pub lower: f64,
    /// Upper bound of range where solution structure stays same
    pub upper: f64,
}

/// Information about a violated constraint
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone)]
pub struct ConstraintViolation {
    /// Constraint name
    pub constraint: String,
    /// Required value (from constraint RHS)
    pub required: f64,
    /// Actual value achieved
    pub actual: f64,
    /// How much the constraint is violated by
    pub violation_amount: f64,
    /// Human-readable description of what's wrong
    pub description: String,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, Default)]
pub struct SolverStatistics {
    pub iterations: u64,
    /// Branch-and-bound nodes explored (zero for pure LP)
    pub nodes: u64,
    pub solve_time_ms: f64,
}

impl Solution {
    pub fn new(status: SolutionStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            values: Vec::new(),
            objective_value: None,
            analysis: None,
            violations: Vec::new(),
            message: message.into(),
            statistics: SolverStatistics::default(),
        }
    }

    pub fn optimal(objective_value: f64, values: Vec<f64>) -> Self {
        Self {
            status: SolutionStatus::Optimal,
            values,
            objective_value: Some(objective_value),
            analysis: None,
            violations: Vec::new(),
            message: "Optimal solution found".to_string(),
            statistics: SolverStatistics::default(),
        }
    }

    pub fn infeasible() -> Self {
        Self::new(
            SolutionStatus::Infeasible,
            "Problem is infeasible: no solution satisfies all constraints",
        )
    }

    pub fn infeasible_with_violations(violations: Vec<ConstraintViolation>) -> Self {
        Self {
            violations,
            ..Self::infeasible()
        }
    }

    pub fn unbounded() -> Self {
        Self::new(
            SolutionStatus::Unbounded,
            "Problem is unbounded: objective can be improved infinitely",
        )
    }

    /// Stopped early; `values` is the best feasible point, empty if none was found
    pub fn interrupted(values: Vec<f64>, message: impl Into<String>) -> Self {
        Self {
            values,
            ..Self::new(SolutionStatus::TimeLimitReached, message)
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(SolutionStatus::Error, message)
    }

    pub fn with_statistics(mut self, statistics: SolverStatistics) -> Self {
        self.statistics = statistics;
        self
    }

    pub fn is_optimal(&self) -> bool {
        self.status == SolutionStatus::Optimal
    }

    /// Whether `values` holds a usable point
    pub fn has_values(&self) -> bool {
        matches!(
            self.status,
            SolutionStatus::Optimal | SolutionStatus::TimeLimitReached
        ) && !self.values.is_empty()
    }
}
