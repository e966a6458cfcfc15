// HiGHS adapter: translates an LpProblem into a HiGHS row problem.

use highs::{HighsModelStatus, RowProblem, Sense};
use tracing::debug;
use web_time::Instant;

use crate::backend::{SolveOptions, SolverBackend, SolverError};
use crate::problem::{ConstraintOp, LpProblem};
use crate::solution::{Analysis, BasisStatus, Solution, SolverStatistics};

pub struct HighsSolver;

impl HighsSolver {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HighsSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl SolverBackend for HighsSolver {
    fn solve(&self, problem: &LpProblem, options: &SolveOptions) -> Result<Solution, SolverError> {
        problem.validate()?;
        let start = Instant::now();

        if options.should_stop(None) {
            return Ok(Solution::interrupted(Vec::new(), "Interrupted before the solve started"));
        }

        let mut pb = RowProblem::default();
        let mut cols = Vec::with_capacity(problem.num_variables());

        for (var, &cost) in problem.variables.iter().zip(&problem.objective.coefficients) {
            let upper = var.upper.unwrap_or(f64::INFINITY);
            let col = if var.is_integer() {
                pb.add_integer_column(cost, var.lower..=upper)
            } else {
                pb.add_column(cost, var.lower..=upper)
            };
            cols.push(col);
        }

        for constraint in &problem.constraints {
            let terms: Vec<_> = constraint
                .coefficients
                .iter()
                .enumerate()
                .filter(|(_, a)| **a != 0.0)
                .map(|(j, &a)| (cols[j], a))
                .collect();

            match constraint.op {
                ConstraintOp::Le => pb.add_row(..=constraint.rhs, &terms),
                ConstraintOp::Ge => pb.add_row(constraint.rhs.., &terms),
                ConstraintOp::Eq => pb.add_row(constraint.rhs..=constraint.rhs, &terms),
            };
        }

        let sense = if problem.objective.minimize {
            Sense::Minimise
        } else {
            Sense::Maximise
        };

        let mut model = pb.optimise(sense);
        model.make_quiet();
        if let Some(limit) = options.time_limit {
            model.set_option("time_limit", limit.as_secs_f64());
        }
        let solved = model.solve();

        let statistics = SolverStatistics {
            iterations: 0,
            nodes: 0,
            solve_time_ms: start.elapsed().as_secs_f64() * 1000.0,
        };

        let solution = match solved.status() {
            HighsModelStatus::Optimal => {
                let data = solved.get_solution();
                let values = data.columns().to_vec();
                let objective = problem.objective_at(&values);
                let mut solution = Solution::optimal(objective, values);

                if !problem.is_mixed_integer() {
                    solution.analysis = Some(Analysis {
                        duals: data.dual_rows().to_vec(),
                        reduced_costs: data.dual_columns().to_vec(),
                        basis: basis_from_values(problem, &solution.values),
                        cost_ranges: None,
                        rhs_ranges: None,
                    });
                }
                solution
            }
            HighsModelStatus::Infeasible => Solution::infeasible(),
            HighsModelStatus::Unbounded | HighsModelStatus::UnboundedOrInfeasible => Solution::unbounded(),
            HighsModelStatus::ReachedTimeLimit | HighsModelStatus::ReachedIterationLimit => {
                let values = solved.get_solution().columns().to_vec();
                let feasible = problem
                    .constraints
                    .iter()
                    .all(|c| c.is_satisfied(c.activity(&values), 1e-6 * (1.0 + c.rhs.abs())));
                let values = if feasible { values } else { Vec::new() };
                Solution::interrupted(values, "HiGHS stopped before proving optimality")
            }
            status => Solution::error(format!("HiGHS solver returned status: {:?}", status)),
        };

        debug!(status = %solution.status, "HiGHS solve finished");
        Ok(solution.with_statistics(statistics))
    }

    fn name(&self) -> &str {
        "highs"
    }

    fn supports_mip(&self) -> bool {
        true
    }

    fn supports_sensitivity(&self) -> bool {
        true
    }
}

/// HiGHS does not expose basis status through this binding; infer it from bounds
fn basis_from_values(problem: &LpProblem, values: &[f64]) -> Vec<BasisStatus> {
    problem
        .variables
        .iter()
        .zip(values)
        .map(|(var, &x)| {
            if (x - var.lower).abs() <= 1e-9 {
                BasisStatus::AtLower
            } else if var.upper.is_some_and(|u| (x - u).abs() <= 1e-9) {
                BasisStatus::AtUpper
            } else {
                BasisStatus::Basic
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::Variable;
    use crate::solution::SolutionStatus;

    #[test]
    fn test_highs_minimization() {
        let mut problem = LpProblem::new();
        problem.add_variable(Variable::continuous("x").with_bounds(0.0, Some(3.0)));
        problem.add_variable(Variable::continuous("y"));
        problem.set_objective(vec![2.0, 3.0], true);
        problem.add_constraint("sum", vec![1.0, 1.0], ConstraintOp::Ge, 4.0);

        let solution = HighsSolver::new().solve(&problem, &SolveOptions::default()).unwrap();

        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert!((solution.objective_value.unwrap() - 9.0).abs() < 1e-6);
        let analysis = solution.analysis.unwrap();
        assert_eq!(analysis.basis[0], BasisStatus::AtUpper);
    }
}
