use crate::backend::SolverError;

/// A linear (optionally mixed-integer) program
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LpProblem {
    /// Decision variables, in column order
    pub variables: Vec<Variable>,
    /// Objective function coefficients
    pub objective: Objective,
    /// Constraint rows, in row order
    pub constraints: Vec<Constraint>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub kind: VariableKind,
    pub lower: f64,
    /// `None` means unbounded above
    pub upper: Option<f64>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableKind {
    Continuous,
    Integer,
    Binary,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Objective {
    /// Coefficients for each variable
    pub coefficients: Vec<f64>,
    /// Whether to minimize or maximize
    pub minimize: bool,
}

impl Default for Objective {
    fn default() -> Self {
        Self {
            coefficients: Vec::new(),
            minimize: true,
        }
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    /// Name/label for the constraint (for diagnostics)
    pub name: String,
    /// Coefficients for each variable
    pub coefficients: Vec<f64>,
    /// Comparison operator
    pub op: ConstraintOp,
    /// Right-hand side value
    pub rhs: f64,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintOp {
    /// Less than or equal (<=)
    Le,
    /// Greater than or equal (>=)
    Ge,
    /// Equal (=)
    Eq,
}

impl std::fmt::Display for ConstraintOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConstraintOp::Le => write!(f, "<="),
            ConstraintOp::Ge => write!(f, ">="),
            ConstraintOp::Eq => write!(f, "="),
        }
    }
}

impl Variable {
    pub fn continuous(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: VariableKind::Continuous,
            lower: 0.0,
            upper: None,
        }
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: VariableKind::Integer,
            lower: 0.0,
            upper: None,
        }
    }

    pub fn binary(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: VariableKind::Binary,
            lower: 0.0,
            upper: Some(1.0),
        }
    }

    pub fn with_bounds(mut self, lower: f64, upper: Option<f64>) -> Self {
        self.lower = lower;
        self.upper = upper;
        self
    }

    pub fn is_integer(&self) -> bool {
        matches!(self.kind, VariableKind::Integer | VariableKind::Binary)
    }
}

impl Constraint {
    /// Evaluate the row's left-hand side at `values`
    pub fn activity(&self, values: &[f64]) -> f64 {
        self.coefficients
            .iter()
            .zip(values)
            .map(|(a, x)| a * x)
            .sum()
    }

    /// Whether `activity` satisfies the row within an absolute tolerance
    pub fn is_satisfied(&self, activity: f64, tolerance: f64) -> bool {
        match self.op {
            ConstraintOp::Le => activity <= self.rhs + tolerance,
            ConstraintOp::Ge => activity >= self.rhs - tolerance,
            ConstraintOp::Eq => (activity - self.rhs).abs() <= tolerance,
        }
    }
}

impl LpProblem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a variable and return its column index.
    ///
    /// The objective and every existing row are widened with a zero coefficient.
    pub fn add_variable(&mut self, variable: Variable) -> usize {
        self.variables.push(variable);
        self.objective.coefficients.push(0.0);
        for c in &mut self.constraints {
            c.coefficients.push(0.0);
        }
        self.variables.len() - 1
    }

    pub fn set_objective(&mut self, coefficients: Vec<f64>, minimize: bool) {
        self.objective = Objective { coefficients, minimize };
    }

    /// Append a row and return its index
    pub fn add_constraint(&mut self, name: impl Into<String>, coefficients: Vec<f64>, op: ConstraintOp, rhs: f64) -> usize {
        self.constraints.push(Constraint {
            name: name.into(),
            coefficients,
            op,
            rhs,
        });
        self.constraints.len() - 1
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    pub fn num_integer_variables(&self) -> usize {
        self.variables.iter().filter(|v| v.is_integer()).count()
    }

    pub fn is_mixed_integer(&self) -> bool {
        self.variables.iter().any(Variable::is_integer)
    }

    /// Objective value at `values`, in the problem's own sense
    pub fn objective_at(&self, values: &[f64]) -> f64 {
        self.objective
            .coefficients
            .iter()
            .zip(values)
            .map(|(c, x)| c * x)
            .sum()
    }

    /// Check the model is well formed before handing it to a backend
    pub fn validate(&self) -> Result<(), SolverError> {
        let mut errors = Vec::new();
        let n = self.num_variables();

        if self.objective.coefficients.len() != n {
            errors.push(format!(
                "objective has {} coefficients but problem has {} variables",
                self.objective.coefficients.len(),
                n
            ));
        }
        if self.objective.coefficients.iter().any(|c| !c.is_finite()) {
            errors.push("objective has a non-finite coefficient".to_string());
        }

        for (i, c) in self.constraints.iter().enumerate() {
            if c.coefficients.len() != n {
                errors.push(format!(
                    "row {} '{}' has {} coefficients but problem has {} variables",
                    i,
                    c.name,
                    c.coefficients.len(),
                    n
                ));
            }
            if !c.rhs.is_finite() || c.coefficients.iter().any(|a| !a.is_finite()) {
                errors.push(format!("row {} '{}' has a non-finite coefficient", i, c.name));
            }
        }

        for (j, v) in self.variables.iter().enumerate() {
            if !v.lower.is_finite() {
                errors.push(format!("variable {} '{}' has a non-finite lower bound", j, v.name));
            }
            if let Some(upper) = v.upper {
                if upper.is_nan() || v.lower > upper {
                    errors.push(format!(
                        "variable {} '{}' has lower bound ({}) > upper bound ({})",
                        j, v.name, v.lower, upper
                    ));
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(SolverError::InvalidModel(errors.join("; ")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_variable_widens_rows() {
        let mut problem = LpProblem::new();
        let x = problem.add_variable(Variable::continuous("x"));
        problem.add_constraint("cap", vec![1.0], ConstraintOp::Le, 5.0);
        let y = problem.add_variable(Variable::binary("y"));

        assert_eq!((x, y), (0, 1));
        assert_eq!(problem.constraints[0].coefficients, vec![1.0, 0.0]);
        assert_eq!(problem.objective.coefficients.len(), 2);
        assert!(problem.is_mixed_integer());
        assert_eq!(problem.num_integer_variables(), 1);
    }

    #[test]
    fn test_validate_reports_every_defect() {
        let mut problem = LpProblem::new();
        problem.add_variable(Variable::continuous("x").with_bounds(3.0, Some(1.0)));
        problem.add_constraint("short", vec![], ConstraintOp::Ge, 1.0);
        problem.add_constraint("nan", vec![f64::NAN], ConstraintOp::Ge, 1.0);

        let err = problem.validate().unwrap_err();
        let text = err.to_string();
        assert!(text.contains("'short'"), "missing length defect: {}", text);
        assert!(text.contains("'nan'"), "missing non-finite defect: {}", text);
        assert!(text.contains("lower bound (3)"), "missing bound defect: {}", text);
    }

    #[test]
    fn test_row_satisfaction() {
        let row = Constraint {
            name: "r".to_string(),
            coefficients: vec![1.0, 2.0],
            op: ConstraintOp::Eq,
            rhs: 5.0,
        };
        let activity = row.activity(&[1.0, 2.0]);
        assert_eq!(activity, 5.0);
        assert!(row.is_satisfied(activity + 1e-9, 1e-6));
        assert!(!row.is_satisfied(activity + 1e-3, 1e-6));
    }
}
