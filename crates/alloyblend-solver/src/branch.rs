// Depth-first branch-and-bound over the bounded simplex.

use tracing::{debug, warn};
use web_time::Instant;

use crate::backend::SolveOptions;
use crate::problem::LpProblem;
use crate::simplex::{Bounds, LpOutcome, Solver, root_bounds};
use crate::solution::{Solution, SolverStatistics};

/// Distance from the nearest integer still treated as integral
const INTEGRALITY_TOLERANCE: f64 = 1e-6;

pub(crate) fn branch_and_bound(
    solver: &Solver,
    problem: &LpProblem,
    options: &SolveOptions,
    start: Instant,
) -> Solution {
    let deadline = options.deadline(start);

    let mut root = root_bounds(problem);
    for (bounds, var) in root.iter_mut().zip(&problem.variables) {
        if var.is_integer() {
            bounds.0 = (bounds.0 - INTEGRALITY_TOLERANCE).ceil();
            bounds.1 = bounds.1.map(|u| (u + INTEGRALITY_TOLERANCE).floor());
        }
    }

    let mut stack: Vec<Bounds> = vec![root];
    // (objective in minimisation sense, values)
    let mut incumbent: Option<(f64, Vec<f64>)> = None;
    let mut iterations = 0;
    let mut nodes = 0;
    let mut stopped: Option<String> = None;

    let statistics = |iterations: u64, nodes: u64| SolverStatistics {
        iterations,
        nodes,
        solve_time_ms: start.elapsed().as_secs_f64() * 1000.0,
    };

    while let Some(bounds) = stack.pop() {
        if options.should_stop(deadline) {
            stopped = Some("Time limit or interrupt reached during branch-and-bound".to_string());
            break;
        }
        if nodes >= options.max_nodes as u64 {
            warn!(max_nodes = options.max_nodes, "Branch-and-bound node limit reached");
            stopped = Some(format!("Node limit of {} reached", options.max_nodes));
            break;
        }
        nodes += 1;

        match solver.solve_bounded(problem, &bounds, options, deadline, false, &mut iterations) {
            LpOutcome::Optimal(point) => {
                if let Some((best, _)) = &incumbent {
                    if point.objective >= *best - 1e-9 * (1.0 + best.abs()) {
                        continue;
                    }
                }

                match most_fractional(problem, &point.values) {
                    None => {
                        debug!(objective = point.objective, nodes, "New incumbent");
                        incumbent = Some((point.objective, point.values));
                    }
                    Some(j) => {
                        let v = point.values[j];
                        let mut up = bounds.clone();
                        up[j].0 = v.ceil();
                        let mut down = bounds;
                        down[j].1 = Some(v.floor());
                        // Explore the rounded-down side first
                        stack.push(up);
                        stack.push(down);
                    }
                }
            }
            LpOutcome::Infeasible => continue,
            LpOutcome::Unbounded => {
                return Solution::unbounded().with_statistics(statistics(iterations, nodes));
            }
            LpOutcome::Interrupted(_) => {
                stopped = Some("Time limit or interrupt reached during branch-and-bound".to_string());
                break;
            }
            LpOutcome::IterationLimit => {
                return Solution::error(format!(
                    "Iteration limit of {} reached at node {}",
                    options.max_iterations, nodes
                ))
                .with_statistics(statistics(iterations, nodes));
            }
        }
    }

    let solution = match (stopped, incumbent) {
        (Some(reason), incumbent) => {
            let values = incumbent.map(|(_, v)| snap_integers(problem, v)).unwrap_or_default();
            Solution::interrupted(values, reason)
        }
        (None, Some((_, values))) => {
            let values = snap_integers(problem, values);
            let objective = problem.objective_at(&values);
            let mut solution = Solution::optimal(objective, values);
            solution.message = format!("Optimal solution found after {} nodes", nodes);
            solution
        }
        (None, None) => Solution::infeasible(),
    };

    solution.with_statistics(statistics(iterations, nodes))
}

/// Integer column whose value is furthest from integral, if any
fn most_fractional(problem: &LpProblem, values: &[f64]) -> Option<usize> {
    problem
        .variables
        .iter()
        .zip(values)
        .enumerate()
        .filter(|(_, (var, _))| var.is_integer())
        .map(|(j, (_, v))| (j, (v - v.round()).abs()))
        .filter(|(_, frac)| *frac > INTEGRALITY_TOLERANCE)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(j, _)| j)
}

fn snap_integers(problem: &LpProblem, mut values: Vec<f64>) -> Vec<f64> {
    for (v, var) in values.iter_mut().zip(&problem.variables) {
        if var.is_integer() {
            *v = v.round();
        }
    }
    values
}
