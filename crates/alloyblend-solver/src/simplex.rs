use tracing::debug;
use web_time::Instant;

use crate::backend::{SolveOptions, SolverBackend, SolverError};
use crate::branch;
use crate::problem::{ConstraintOp, LpProblem};
use crate::solution::{
    Analysis, BasisStatus, ConstraintViolation, SensitivityRange, Solution, SolverStatistics,
};

/// Lower and optional upper bound per column for a single LP solve
pub(crate) type Bounds = Vec<(f64, Option<f64>)>;

/// Consecutive degenerate pivots tolerated before switching to Bland's rule
const DEGENERATE_RUN_LIMIT: usize = 50;

/// Bounded two-phase simplex solver for linear programming problems
pub struct Solver {
    /// Tolerance for floating point comparisons
    tolerance: f64,
}

impl Default for Solver {
    fn default() -> Self {
        Self { tolerance: 1e-9 }
    }
}

impl SolverBackend for Solver {
    fn solve(&self, problem: &LpProblem, options: &SolveOptions) -> Result<Solution, SolverError> {
        problem.validate()?;
        let start = Instant::now();

        let solution = if problem.is_mixed_integer() {
            branch::branch_and_bound(self, problem, options, start)
        } else {
            self.solve_continuous(problem, options, start)
        };

        debug!(
            status = %solution.status,
            iterations = solution.statistics.iterations,
            nodes = solution.statistics.nodes,
            "Simplex solve finished"
        );
        Ok(solution)
    }

    fn name(&self) -> &str {
        "simplex"
    }

    fn supports_mip(&self) -> bool {
        true
    }

    fn supports_sensitivity(&self) -> bool {
        true
    }
}

pub(crate) enum LpOutcome {
    Optimal(LpPoint),
    Infeasible,
    Unbounded,
    /// Stopped early; carries the current point when it is already feasible
    Interrupted(Option<Vec<f64>>),
    IterationLimit,
}

pub(crate) struct LpPoint {
    pub values: Vec<f64>,
    /// Objective in minimisation sense
    pub objective: f64,
    pub analysis: Option<Analysis>,
}

enum Phase {
    Done,
    Unbounded,
    Stopped,
    IterationLimit,
}

impl Solver {
    pub fn new() -> Self {
        Self::default()
    }

    fn solve_continuous(&self, problem: &LpProblem, options: &SolveOptions, start: Instant) -> Solution {
        let deadline = options.deadline(start);
        let mut iterations = 0;
        let outcome = self.solve_bounded(problem, &root_bounds(problem), options, deadline, true, &mut iterations);

        let solution = match outcome {
            LpOutcome::Optimal(point) => {
                let objective = problem.objective_at(&point.values);
                let mut solution = Solution::optimal(objective, point.values);
                solution.analysis = point.analysis;
                solution
            }
            LpOutcome::Infeasible => {
                Solution::infeasible_with_violations(self.diagnose_infeasibility(problem, options, deadline))
            }
            LpOutcome::Unbounded => Solution::unbounded(),
            LpOutcome::Interrupted(values) => Solution::interrupted(
                values.unwrap_or_default(),
                "Solve stopped before optimality was proven",
            ),
            LpOutcome::IterationLimit => Solution::error(format!(
                "Iteration limit of {} reached",
                options.max_iterations
            )),
        };

        solution.with_statistics(SolverStatistics {
            iterations,
            nodes: 0,
            solve_time_ms: start.elapsed().as_secs_f64() * 1000.0,
        })
    }

    /// Solve the continuous relaxation of `problem` under `bounds`
    pub(crate) fn solve_bounded(
        &self,
        problem: &LpProblem,
        bounds: &[(f64, Option<f64>)],
        options: &SolveOptions,
        deadline: Option<Instant>,
        analyze: bool,
        iterations: &mut u64,
    ) -> LpOutcome {
        let Some(mut tableau) = Tableau::build(problem, bounds, self.tolerance) else {
            return LpOutcome::Infeasible;
        };

        // Phase 1: Find initial basic feasible solution
        if tableau.n_artificial > 0 {
            tableau.load_phase1_objective();
            let limit = tableau.n_vars + tableau.n_slack + tableau.n_artificial;
            match self.iterate(&mut tableau, limit, options, deadline, iterations) {
                Phase::Done => {}
                Phase::Stopped => return LpOutcome::Interrupted(None),
                Phase::IterationLimit => return LpOutcome::IterationLimit,
                // Phase 1 objective is bounded below by zero
                Phase::Unbounded => return LpOutcome::Infeasible,
            }
            let infeasibility = -tableau.objective_cell();
            if infeasibility > 1e-7 * (1.0 + tableau.rhs_scale) {
                return LpOutcome::Infeasible;
            }
            tableau.drive_out_artificials();
        }

        // Phase 2: Optimize with artificial columns barred from entering
        tableau.load_phase2_objective();
        let limit = tableau.n_vars + tableau.n_slack;
        match self.iterate(&mut tableau, limit, options, deadline, iterations) {
            Phase::Done => {}
            Phase::Unbounded => return LpOutcome::Unbounded,
            Phase::Stopped => return LpOutcome::Interrupted(Some(tableau.values())),
            Phase::IterationLimit => return LpOutcome::IterationLimit,
        }

        let values = tableau.values();
        let objective = tableau.costs.iter().zip(&values).map(|(c, x)| c * x).sum();
        let analysis = analyze.then(|| self.analyze(&tableau, problem));

        LpOutcome::Optimal(LpPoint {
            values,
            objective,
            analysis,
        })
    }

    fn iterate(
        &self,
        tableau: &mut Tableau,
        entering_limit: usize,
        options: &SolveOptions,
        deadline: Option<Instant>,
        iterations: &mut u64,
    ) -> Phase {
        let mut pivots = 0;
        let mut degenerate_run = 0;

        loop {
            if pivots >= options.max_iterations {
                return Phase::IterationLimit;
            }
            if options.should_stop(deadline) {
                return Phase::Stopped;
            }

            let bland = degenerate_run > DEGENERATE_RUN_LIMIT;
            let Some(pivot_col) = self.find_pivot_column(tableau, entering_limit, bland) else {
                return Phase::Done;
            };
            let Some(pivot_row) = self.find_pivot_row(tableau, pivot_col) else {
                return Phase::Unbounded;
            };

            if tableau.rhs(pivot_row) <= self.tolerance {
                degenerate_run += 1;
            } else {
                degenerate_run = 0;
            }
            tableau.pivot(pivot_row, pivot_col);
            pivots += 1;
            *iterations += 1;
        }
    }

    /// Most negative reduced cost (Dantzig), or the first negative one (Bland)
    fn find_pivot_column(&self, tableau: &Tableau, limit: usize, bland: bool) -> Option<usize> {
        let obj = &tableau.data[tableau.obj_row()];
        let mut best = -self.tolerance;
        let mut best_col = None;

        for (j, &d) in obj.iter().enumerate().take(limit) {
            if d < best {
                if bland {
                    return Some(j);
                }
                best = d;
                best_col = Some(j);
            }
        }

        best_col
    }

    /// Minimum ratio test, ties broken towards the smallest basic index
    fn find_pivot_row(&self, tableau: &Tableau, col: usize) -> Option<usize> {
        let mut min_ratio = f64::INFINITY;
        let mut min_row: Option<usize> = None;

        for i in 0..tableau.basic.len() {
            let val = tableau.data[i][col];
            if val > self.tolerance {
                let ratio = tableau.rhs(i).max(0.0) / val;
                let better = match min_row {
                    None => true,
                    Some(r) => {
                        ratio < min_ratio - self.tolerance
                            || (ratio <= min_ratio + self.tolerance && tableau.basic[i] < tableau.basic[r])
                    }
                };
                if better {
                    min_ratio = ratio;
                    min_row = Some(i);
                }
            }
        }

        min_row
    }

    fn analyze(&self, tableau: &Tableau, problem: &LpProblem) -> Analysis {
        let n = tableau.n_vars;
        let m = tableau.basic.len();
        let obj = &tableau.data[tableau.obj_row()];
        let sign = if problem.objective.minimize { 1.0 } else { -1.0 };
        let inf = f64::INFINITY;

        let mut is_basic = vec![false; obj.len()];
        let mut basic_row = vec![None; n];
        for (i, &b) in tableau.basic.iter().enumerate() {
            is_basic[b] = true;
            if b < n {
                basic_row[b] = Some(i);
            }
        }

        // Shadow prices: each row's unit column carries -y in the objective row
        let duals_min: Vec<f64> = (0..tableau.n_structural_rows)
            .map(|i| {
                let y = -obj[tableau.unit_cols[i]];
                if tableau.flipped[i] { -y } else { y }
            })
            .collect();

        // Reduced costs against the structural rows only, so that variables
        // held at their upper bound show the value of more availability
        let reduced_min: Vec<f64> = (0..n)
            .map(|j| {
                let priced: f64 = problem
                    .constraints
                    .iter()
                    .zip(&duals_min)
                    .map(|(c, y)| c.coefficients[j] * y)
                    .sum();
                tableau.costs[j] - priced
            })
            .collect();

        let basis: Vec<BasisStatus> = (0..n)
            .map(|j| {
                if !is_basic[j] {
                    BasisStatus::AtLower
                } else if tableau.upper_rows[j].is_some_and(|r| !is_basic[tableau.unit_cols[r]]) {
                    BasisStatus::AtUpper
                } else {
                    BasisStatus::Basic
                }
            })
            .collect();

        let priced_cols = n + tableau.n_slack;
        let cost_ranges = (0..n)
            .map(|j| {
                let (dec, inc) = match (basis[j], basic_row[j]) {
                    (BasisStatus::AtLower, _) => (reduced_min[j].max(0.0), inf),
                    (BasisStatus::AtUpper, _) => (inf, (-reduced_min[j]).max(0.0)),
                    (BasisStatus::Basic, Some(r)) => {
                        let mut inc = inf;
                        let mut dec = inf;
                        for k in (0..priced_cols).filter(|&k| !is_basic[k]) {
                            let alpha = tableau.data[r][k];
                            let d = obj[k].max(0.0);
                            if alpha > self.tolerance {
                                inc = inc.min(d / alpha);
                            } else if alpha < -self.tolerance {
                                dec = dec.min(d / -alpha);
                            }
                        }
                        (dec, inc)
                    }
                    (BasisStatus::Basic, None) => (inf, inf),
                };
                let current = problem.objective.coefficients[j];
                let (lower, upper) = if problem.objective.minimize {
                    (current - dec, current + inc)
                } else {
                    (current - inc, current + dec)
                };
                SensitivityRange {
                    name: problem.variables[j].name.clone(),
                    current,
                    lower,
                    upper,
                }
            })
            .collect();

        let rhs_ranges = problem
            .constraints
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let k = tableau.unit_cols[i];
                let mut inc = inf;
                let mut dec = inf;
                for r in 0..m {
                    let beta = tableau.data[r][k];
                    let xb = tableau.rhs(r).max(0.0);
                    if beta > self.tolerance {
                        dec = dec.min(xb / beta);
                    } else if beta < -self.tolerance {
                        inc = inc.min(xb / -beta);
                    }
                }
                let (dec, inc) = if tableau.flipped[i] { (inc, dec) } else { (dec, inc) };
                SensitivityRange {
                    name: c.name.clone(),
                    current: c.rhs,
                    lower: c.rhs - dec,
                    upper: c.rhs + inc,
                }
            })
            .collect();

        Analysis {
            duals: duals_min.iter().map(|y| sign * y).collect(),
            reduced_costs: reduced_min.iter().map(|d| sign * d).collect(),
            basis,
            cost_ranges: Some(cost_ranges),
            rhs_ranges: Some(rhs_ranges),
        }
    }

    /// When the original problem is infeasible, solve it with only `<=` and
    /// `=` rows and report which of the original rows that point breaks
    fn diagnose_infeasibility(
        &self,
        problem: &LpProblem,
        options: &SolveOptions,
        deadline: Option<Instant>,
    ) -> Vec<ConstraintViolation> {
        let mut relaxed = problem.clone();
        relaxed.constraints.retain(|c| c.op != ConstraintOp::Ge);

        let mut iterations = 0;
        match self.solve_bounded(&relaxed, &root_bounds(problem), options, deadline, false, &mut iterations) {
            LpOutcome::Optimal(point) => self.find_violations(problem, &point.values),
            _ => Vec::new(),
        }
    }

    /// Find which constraints are violated by a given solution
    fn find_violations(&self, problem: &LpProblem, values: &[f64]) -> Vec<ConstraintViolation> {
        let mut violations = Vec::new();

        for c in &problem.constraints {
            let lhs = c.activity(values);
            let tolerance = 1e-6 * (1.0 + c.rhs.abs());
            if c.is_satisfied(lhs, tolerance) {
                continue;
            }

            let (violation_amount, description) = match c.op {
                ConstraintOp::Le => {
                    let amt = lhs - c.rhs;
                    (amt, format!("{} exceeds maximum of {:.4} by {:.4}", c.name, c.rhs, amt))
                }
                ConstraintOp::Ge => {
                    let amt = c.rhs - lhs;
                    (amt, format!("{} is below minimum of {:.4} by {:.4}", c.name, c.rhs, amt))
                }
                ConstraintOp::Eq => {
                    let diff = (lhs - c.rhs).abs();
                    (diff, format!("{} requires exactly {:.4} but got {:.4}", c.name, c.rhs, lhs))
                }
            };

            violations.push(ConstraintViolation {
                constraint: c.name.clone(),
                required: c.rhs,
                actual: lhs,
                violation_amount,
                description,
            });
        }

        // Sort by violation amount (worst first)
        violations.sort_by(|a, b| b.violation_amount.total_cmp(&a.violation_amount));

        violations
    }
}

/// Column bounds exactly as declared on the problem
pub(crate) fn root_bounds(problem: &LpProblem) -> Bounds {
    problem.variables.iter().map(|v| (v.lower, v.upper)).collect()
}

/// Dense simplex tableau in standard form.
///
/// Columns are laid out as structural, slack/surplus, artificial, then RHS.
/// Rows are the problem rows followed by one `x <= u - l` row per finite
/// upper bound; every variable is shifted so its lower bound sits at zero.
struct Tableau {
    data: Vec<Vec<f64>>,
    basic: Vec<usize>,
    n_vars: usize,
    n_slack: usize,
    n_artificial: usize,
    n_structural_rows: usize,
    /// Column that starts as +e_i for row i
    unit_cols: Vec<usize>,
    /// Row was negated to make its RHS non-negative
    flipped: Vec<bool>,
    /// Upper-bound row per variable
    upper_rows: Vec<Option<usize>>,
    lower_shift: Vec<f64>,
    /// Objective coefficients in minimisation sense
    costs: Vec<f64>,
    rhs_scale: f64,
}

impl Tableau {
    fn build(problem: &LpProblem, bounds: &[(f64, Option<f64>)], tolerance: f64) -> Option<Self> {
        let n = problem.num_variables();
        let sign = if problem.objective.minimize { 1.0 } else { -1.0 };
        let costs: Vec<f64> = problem.objective.coefficients.iter().map(|c| sign * c).collect();
        let lower_shift: Vec<f64> = bounds.iter().map(|b| b.0).collect();

        let mut rows: Vec<(Vec<f64>, ConstraintOp, f64)> = problem
            .constraints
            .iter()
            .map(|c| {
                let shifted: f64 = c.coefficients.iter().zip(&lower_shift).map(|(a, l)| a * l).sum();
                (c.coefficients.clone(), c.op, c.rhs - shifted)
            })
            .collect();
        let n_structural_rows = rows.len();

        let mut upper_rows = vec![None; n];
        for (j, &(lower, upper)) in bounds.iter().enumerate() {
            let Some(upper) = upper else { continue };
            if upper < lower - tolerance {
                return None;
            }
            if upper.is_finite() {
                let mut coeffs = vec![0.0; n];
                coeffs[j] = 1.0;
                upper_rows[j] = Some(rows.len());
                rows.push((coeffs, ConstraintOp::Le, (upper - lower).max(0.0)));
            }
        }

        // Make every RHS non-negative
        let m = rows.len();
        let mut flipped = vec![false; m];
        for (i, row) in rows.iter_mut().enumerate() {
            if row.2 < 0.0 {
                flipped[i] = true;
                row.0.iter_mut().for_each(|a| *a = -*a);
                row.2 = -row.2;
                row.1 = match row.1 {
                    ConstraintOp::Le => ConstraintOp::Ge,
                    ConstraintOp::Ge => ConstraintOp::Le,
                    ConstraintOp::Eq => ConstraintOp::Eq,
                };
            }
        }

        let n_slack = rows.iter().filter(|r| r.1 != ConstraintOp::Eq).count();
        let n_artificial = rows.iter().filter(|r| r.1 != ConstraintOp::Le).count();
        let total_cols = n + n_slack + n_artificial + 1;

        let mut data = vec![vec![0.0; total_cols]; m + 1];
        let mut basic = vec![0; m];
        let mut unit_cols = vec![0; m];
        let mut slack_idx = n;
        let mut artificial_idx = n + n_slack;
        let mut rhs_scale: f64 = 0.0;

        for (i, (coeffs, op, rhs)) in rows.iter().enumerate() {
            data[i][..n].copy_from_slice(coeffs);
            data[i][total_cols - 1] = *rhs;
            if i < n_structural_rows {
                rhs_scale = rhs_scale.max(*rhs);
            }

            match op {
                ConstraintOp::Le => {
                    data[i][slack_idx] = 1.0;
                    basic[i] = slack_idx;
                    unit_cols[i] = slack_idx;
                    slack_idx += 1;
                }
                ConstraintOp::Ge => {
                    data[i][slack_idx] = -1.0; // surplus
                    slack_idx += 1;
                    data[i][artificial_idx] = 1.0;
                    basic[i] = artificial_idx;
                    unit_cols[i] = artificial_idx;
                    artificial_idx += 1;
                }
                ConstraintOp::Eq => {
                    data[i][artificial_idx] = 1.0;
                    basic[i] = artificial_idx;
                    unit_cols[i] = artificial_idx;
                    artificial_idx += 1;
                }
            }
        }

        Some(Self {
            data,
            basic,
            n_vars: n,
            n_slack,
            n_artificial,
            n_structural_rows,
            unit_cols,
            flipped,
            upper_rows,
            lower_shift,
            costs,
            rhs_scale,
        })
    }

    fn obj_row(&self) -> usize {
        self.basic.len()
    }

    fn rhs_col(&self) -> usize {
        self.data[self.obj_row()].len() - 1
    }

    fn rhs(&self, row: usize) -> f64 {
        self.data[row][self.rhs_col()]
    }

    /// Negated current objective value
    fn objective_cell(&self) -> f64 {
        self.data[self.obj_row()][self.rhs_col()]
    }

    fn subtract_from_objective(&mut self, row: usize, factor: f64) {
        let m = self.obj_row();
        let (rows, obj) = self.data.split_at_mut(m);
        for (o, a) in obj[0].iter_mut().zip(&rows[row]) {
            *o -= factor * a;
        }
    }

    /// Minimise the sum of artificial variables
    fn load_phase1_objective(&mut self) {
        let m = self.obj_row();
        let art_start = self.n_vars + self.n_slack;
        let obj = &mut self.data[m];
        obj.iter_mut().for_each(|v| *v = 0.0);
        for v in &mut obj[art_start..art_start + self.n_artificial] {
            *v = 1.0;
        }

        for i in 0..m {
            if self.basic[i] >= art_start {
                self.subtract_from_objective(i, 1.0);
            }
        }
    }

    fn load_phase2_objective(&mut self) {
        let m = self.obj_row();
        let n = self.n_vars;
        let obj = &mut self.data[m];
        obj.iter_mut().for_each(|v| *v = 0.0);
        obj[..n].copy_from_slice(&self.costs);

        for i in 0..m {
            let b = self.basic[i];
            let cb = if b < n { self.costs[b] } else { 0.0 };
            if cb != 0.0 {
                self.subtract_from_objective(i, cb);
            }
        }
    }

    /// Pivot zero-level artificials out of the basis where a real column allows it
    fn drive_out_artificials(&mut self) {
        let art_start = self.n_vars + self.n_slack;
        for i in 0..self.basic.len() {
            if self.basic[i] < art_start {
                continue;
            }
            let candidate = (0..art_start)
                .filter(|&j| self.data[i][j].abs() > 1e-7)
                .max_by(|&a, &b| self.data[i][a].abs().total_cmp(&self.data[i][b].abs()));
            if let Some(col) = candidate {
                self.pivot(i, col);
            }
        }
    }

    fn pivot(&mut self, row: usize, col: usize) {
        self.basic[row] = col;

        // Scale pivot row
        let pivot_val = self.data[row][col];
        for v in &mut self.data[row] {
            *v /= pivot_val;
        }

        // Eliminate column in other rows
        let pivot_row = self.data[row].clone();
        for (i, r) in self.data.iter_mut().enumerate() {
            if i == row {
                continue;
            }
            let factor = r[col];
            if factor != 0.0 {
                for (v, p) in r.iter_mut().zip(&pivot_row) {
                    *v -= factor * p;
                }
            }
        }
    }

    /// Structural variable values in the original (unshifted) space
    fn values(&self) -> Vec<f64> {
        let mut values = self.lower_shift.clone();
        for (i, &b) in self.basic.iter().enumerate() {
            if b < self.n_vars {
                values[b] += self.rhs(i).max(0.0);
            }
        }
        values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Interrupt;
    use crate::problem::Variable;
    use crate::solution::SolutionStatus;

    fn continuous(names: &[&str]) -> LpProblem {
        let mut problem = LpProblem::new();
        for name in names {
            problem.add_variable(Variable::continuous(*name));
        }
        problem
    }

    fn solve(problem: &LpProblem) -> Solution {
        Solver::new().solve(problem, &SolveOptions::default()).unwrap()
    }

    #[test]
    fn test_simple_maximization() {
        // Maximize: 3x + 2y
        // Subject to:
        //   x + y <= 4
        //   x <= 3
        //   y <= 3
        //   x, y >= 0
        // Optimal: x=3, y=1, obj=11
        let mut problem = continuous(&["x", "y"]);
        problem.set_objective(vec![3.0, 2.0], false);
        problem.add_constraint("sum", vec![1.0, 1.0], ConstraintOp::Le, 4.0);
        problem.add_constraint("x_max", vec![1.0, 0.0], ConstraintOp::Le, 3.0);
        problem.add_constraint("y_max", vec![0.0, 1.0], ConstraintOp::Le, 3.0);

        let solution = solve(&problem);

        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert!((solution.values[0] - 3.0).abs() < 1e-6, "x = {} (expected 3)", solution.values[0]);
        assert!((solution.values[1] - 1.0).abs() < 1e-6, "y = {} (expected 1)", solution.values[1]);
        let obj = solution.objective_value.unwrap();
        assert!((obj - 11.0).abs() < 1e-6, "obj = {} (expected 11)", obj);
    }

    #[test]
    fn test_minimization_with_ge() {
        // Minimize: 2x + 3y
        // Subject to:
        //   x + y >= 4
        //   x <= 3
        //   y <= 3
        // Optimal: x=3, y=1, obj=9
        let mut problem = continuous(&["x", "y"]);
        problem.set_objective(vec![2.0, 3.0], true);
        problem.add_constraint("sum", vec![1.0, 1.0], ConstraintOp::Ge, 4.0);
        problem.add_constraint("x_max", vec![1.0, 0.0], ConstraintOp::Le, 3.0);
        problem.add_constraint("y_max", vec![0.0, 1.0], ConstraintOp::Le, 3.0);

        let solution = solve(&problem);

        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert!((solution.values[0] - 3.0).abs() < 1e-6, "x = {} (expected 3)", solution.values[0]);
        assert!((solution.values[1] - 1.0).abs() < 1e-6, "y = {} (expected 1)", solution.values[1]);
        assert!((solution.objective_value.unwrap() - 9.0).abs() < 1e-6);

        // sum row binds: one more unit of demand costs the marginal y
        let analysis = solution.analysis.unwrap();
        assert!((analysis.duals[0] - 3.0).abs() < 1e-6, "sum dual = {}", analysis.duals[0]);
        // x_max binds: one more unit of x capacity saves 1
        assert!((analysis.duals[1] + 1.0).abs() < 1e-6, "x_max dual = {}", analysis.duals[1]);
        assert!(analysis.duals[2].abs() < 1e-9);
    }

    #[test]
    fn test_infeasible() {
        // x >= 5
        // x <= 3
        let mut problem = continuous(&["x"]);
        problem.set_objective(vec![1.0], true);
        problem.add_constraint("lower", vec![1.0], ConstraintOp::Ge, 5.0);
        problem.add_constraint("upper", vec![1.0], ConstraintOp::Le, 3.0);

        let solution = solve(&problem);

        assert_eq!(solution.status, SolutionStatus::Infeasible);
        assert!(solution.objective_value.is_none());
        assert_eq!(solution.violations.len(), 1);
        assert_eq!(solution.violations[0].constraint, "lower");
    }

    #[test]
    fn test_negative_cost_without_cap_is_unbounded() {
        let mut problem = continuous(&["scrap"]);
        problem.set_objective(vec![-1.0], true);
        problem.add_constraint("floor", vec![1.0], ConstraintOp::Ge, 1.0);

        let solution = solve(&problem);

        assert_eq!(solution.status, SolutionStatus::Unbounded);
        assert!(solution.analysis.is_none());
    }

    #[test]
    fn test_variable_bounds_and_negative_rhs() {
        // Minimize x - y with 2 <= x <= 5, y <= 4, and -x - y >= -8 (x + y <= 8)
        let mut problem = LpProblem::new();
        problem.add_variable(Variable::continuous("x").with_bounds(2.0, Some(5.0)));
        problem.add_variable(Variable::continuous("y").with_bounds(0.0, Some(4.0)));
        problem.set_objective(vec![1.0, -1.0], true);
        problem.add_constraint("cap", vec![-1.0, -1.0], ConstraintOp::Ge, -8.0);

        let solution = solve(&problem);

        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert!((solution.values[0] - 2.0).abs() < 1e-6, "x = {}", solution.values[0]);
        assert!((solution.values[1] - 4.0).abs() < 1e-6, "y = {}", solution.values[1]);

        let analysis = solution.analysis.unwrap();
        assert_eq!(analysis.basis[1], BasisStatus::AtUpper);
        // y is held by its own bound, so more availability is worth 1 per unit
        assert!((analysis.reduced_costs[1] + 1.0).abs() < 1e-6, "rc_y = {}", analysis.reduced_costs[1]);
        // cap row is slack
        assert!(analysis.duals[0].abs() < 1e-9);
    }

    #[test]
    fn test_reduced_cost_and_cost_range() {
        // Minimize 2a + b + 3c subject to a + b + c = 10, a >= 4
        let mut problem = continuous(&["a", "b", "c"]);
        problem.set_objective(vec![2.0, 1.0, 3.0], true);
        problem.add_constraint("total", vec![1.0, 1.0, 1.0], ConstraintOp::Eq, 10.0);
        problem.add_constraint("a_min", vec![1.0, 0.0, 0.0], ConstraintOp::Ge, 4.0);

        let solution = solve(&problem);
        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert!((solution.values[0] - 4.0).abs() < 1e-6);
        assert!((solution.values[1] - 6.0).abs() < 1e-6);

        let analysis = solution.analysis.unwrap();
        assert!((analysis.duals[0] - 1.0).abs() < 1e-6, "total dual = {}", analysis.duals[0]);
        assert!((analysis.duals[1] - 1.0).abs() < 1e-6, "a_min dual = {}", analysis.duals[1]);
        assert!((analysis.reduced_costs[2] - 2.0).abs() < 1e-6, "rc_c = {}", analysis.reduced_costs[2]);
        assert!(analysis.reduced_costs[0].abs() < 1e-9);
        assert_eq!(analysis.basis[2], BasisStatus::AtLower);

        let ranges = analysis.cost_ranges.unwrap();
        // c enters once its cost falls to 1
        assert!((ranges[2].lower - 1.0).abs() < 1e-6, "c range = {:?}", ranges[2]);
        assert!(ranges[2].upper.is_infinite());
        // b stays cheapest while its cost is at most 2
        assert!((ranges[1].upper - 2.0).abs() < 1e-6, "b range = {:?}", ranges[1]);

        let rhs = analysis.rhs_ranges.unwrap();
        // a_min can move between 0 and 10 before the basis changes
        assert!((rhs[1].lower - 0.0).abs() < 1e-6, "a_min range = {:?}", rhs[1]);
        assert!((rhs[1].upper - 10.0).abs() < 1e-6, "a_min range = {:?}", rhs[1]);
    }

    #[test]
    fn test_redundant_equality_rows() {
        let mut problem = continuous(&["x", "y"]);
        problem.set_objective(vec![1.0, 2.0], true);
        problem.add_constraint("e1", vec![1.0, 1.0], ConstraintOp::Eq, 3.0);
        problem.add_constraint("e2", vec![2.0, 2.0], ConstraintOp::Eq, 6.0);

        let solution = solve(&problem);

        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert!((solution.values[0] - 3.0).abs() < 1e-6);
        assert!((solution.objective_value.unwrap() - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_interrupt_stops_solve() {
        let mut problem = continuous(&["x", "y"]);
        problem.set_objective(vec![1.0, 1.0], true);
        problem.add_constraint("floor", vec![1.0, 1.0], ConstraintOp::Ge, 1.0);

        let interrupt = Interrupt::new();
        interrupt.trigger();
        let options = SolveOptions::default().with_interrupt(interrupt);
        let solution = Solver::new().solve(&problem, &options).unwrap();

        assert_eq!(solution.status, SolutionStatus::TimeLimitReached);
        assert!(solution.objective_value.is_none());
    }

    #[test]
    fn test_malformed_model_is_an_error() {
        let mut problem = continuous(&["x"]);
        problem.add_constraint("bad", vec![1.0, 2.0], ConstraintOp::Le, 1.0);

        let result = Solver::new().solve(&problem, &SolveOptions::default());
        assert!(matches!(result, Err(SolverError::InvalidModel(_))));
    }
}
