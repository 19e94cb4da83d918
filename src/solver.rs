//! The solver boundary.
//!
//! The formulator hands a [`Problem`](crate::formulation::Problem) to a [`Solver`] and receives a
//! [`SolverOutcome`] back: a status, the objective value and best bound when a solution exists,
//! and a value for every declared variable. Infeasibility is a legitimate outcome, not an error;
//! `Err` is reserved for a solver rejecting the problem outright, which indicates a formulation
//! bug.
//!
//! The default backend is the HiGHS solver via the `highs` crate. Any MILP library can be
//! substituted by implementing [`Solver`].
use crate::formulation::{ObjectiveSense, Problem, VarId, VariableKind};
use anyhow::{Result, anyhow};
use highs::{HighsModelStatus, RowProblem, Sense};
use log::warn;

/// The status of a solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum SolveStatus {
    /// An optimal solution was found
    Optimal,
    /// A feasible but not proven optimal solution was found (e.g. the time limit was reached)
    Feasible,
    /// The problem has no feasible solution
    Infeasible,
    /// The objective is unbounded
    Unbounded,
    /// The solver could not classify the problem
    Unknown,
}

impl SolveStatus {
    /// Whether a variable assignment is available for this status.
    pub fn has_solution(self) -> bool {
        matches!(self, SolveStatus::Optimal | SolveStatus::Feasible)
    }
}

/// The result of handing a problem to a solver.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverOutcome {
    /// The solve status
    pub status: SolveStatus,
    /// The objective value, when a solution exists
    pub objective: Option<f64>,
    /// The best known objective bound; `None` when the backend cannot report one
    pub best_bound: Option<f64>,
    /// A value per declared variable, in column order; empty when no solution exists
    pub values: Vec<f64>,
}

impl SolverOutcome {
    /// The value of a variable in the solution.
    ///
    /// # Panics
    ///
    /// Panics if no solution is available; check [`SolveStatus::has_solution`] first.
    pub fn value(&self, var: VarId) -> f64 {
        self.values[var.index()]
    }

    fn without_solution(status: SolveStatus) -> Self {
        SolverOutcome {
            status,
            objective: None,
            best_bound: None,
            values: Vec::new(),
        }
    }
}

/// A black-box MILP solver.
pub trait Solver {
    /// Solve the problem, blocking until done or until the backend's own budget runs out.
    fn solve(&self, problem: &Problem) -> Result<SolverOutcome>;
}

/// The HiGHS backend.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HighsSolver {
    /// Wall-clock budget in seconds; on expiry the best known feasible solution is returned
    pub time_limit: Option<f64>,
    /// Whether to let HiGHS log to the console
    pub verbose: bool,
}

impl Solver for HighsSolver {
    fn solve(&self, problem: &Problem) -> Result<SolverOutcome> {
        let mut pb = RowProblem::default();

        // Add variables
        let mut columns = Vec::with_capacity(problem.num_variables());
        for def in problem.variables() {
            let column = match def.kind {
                VariableKind::Continuous => pb.add_column(def.objective, def.min..=def.max),
                VariableKind::Binary | VariableKind::Integer => {
                    pb.add_integer_column(def.objective, def.min..=def.max)
                }
            };
            columns.push(column);
        }

        // Add constraints
        for constraint in problem.constraints() {
            let terms = constraint
                .terms
                .iter()
                .map(|&(var, coefficient)| (columns[var.index()], coefficient));
            pb.add_row(constraint.min..=constraint.max, terms);
        }

        let sense = match problem.sense() {
            ObjectiveSense::Minimise => Sense::Minimise,
            ObjectiveSense::Maximise => Sense::Maximise,
        };
        let mut model = pb.optimise(sense);

        model.set_option("output_flag", self.verbose);
        if let Some(time_limit) = self.time_limit {
            model.set_option("time_limit", time_limit);
        }

        let solved = model
            .try_solve()
            .map_err(|status| anyhow!("Solver rejected the problem: {status:?}"))?;

        let outcome = match solved.status() {
            HighsModelStatus::Optimal => {
                let objective = solved.objective_value();
                SolverOutcome {
                    status: SolveStatus::Optimal,
                    objective: Some(objective),
                    // The bindings don't expose the dual bound; at optimality it equals the
                    // objective
                    best_bound: Some(objective),
                    values: solved.get_solution().columns().to_vec(),
                }
            }
            HighsModelStatus::ReachedTimeLimit | HighsModelStatus::ReachedIterationLimit => {
                warn!("Solver budget exhausted; returning best known solution");
                SolverOutcome {
                    status: SolveStatus::Feasible,
                    objective: Some(solved.objective_value()),
                    best_bound: None,
                    values: solved.get_solution().columns().to_vec(),
                }
            }
            HighsModelStatus::Infeasible => {
                SolverOutcome::without_solution(SolveStatus::Infeasible)
            }
            HighsModelStatus::Unbounded | HighsModelStatus::UnboundedOrInfeasible => {
                SolverOutcome::without_solution(SolveStatus::Unbounded)
            }
            status => {
                warn!("Solver returned unexpected status: {status:?}");
                SolverOutcome::without_solution(SolveStatus::Unknown)
            }
        };

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formulation::{ObjectiveSense, Problem, VariableKind};
    use float_cmp::assert_approx_eq;

    /// Maximise x + 2y subject to x + y <= 4, y <= 3, x and y continuous non-negative.
    #[test]
    fn test_solve_lp() {
        let mut problem = Problem::new(ObjectiveSense::Maximise);
        let x = problem.add_variable(VariableKind::Continuous, 0.0, f64::INFINITY, 1.0);
        let y = problem.add_variable(VariableKind::Continuous, 0.0, f64::INFINITY, 2.0);
        problem.add_le(4.0, vec![(x, 1.0), (y, 1.0)]);
        problem.add_le(3.0, vec![(y, 1.0)]);

        let outcome = HighsSolver::default().solve(&problem).unwrap();
        assert_eq!(outcome.status, SolveStatus::Optimal);
        assert_approx_eq!(f64, outcome.objective.unwrap(), 7.0);
        assert_approx_eq!(f64, outcome.value(x), 1.0);
        assert_approx_eq!(f64, outcome.value(y), 3.0);
    }

    /// Minimise x with x integer, 0.5 <= x <= 2.5: the integrality forces x = 1.
    #[test]
    fn test_solve_integer() {
        let mut problem = Problem::new(ObjectiveSense::Minimise);
        let x = problem.add_variable(VariableKind::Integer, 0.0, 10.0, 1.0);
        problem.add_constraint(0.5, 2.5, vec![(x, 1.0)]);

        let outcome = HighsSolver::default().solve(&problem).unwrap();
        assert_eq!(outcome.status, SolveStatus::Optimal);
        assert_approx_eq!(f64, outcome.value(x), 1.0);
    }

    /// x >= 2 and x <= 1 cannot both hold.
    #[test]
    fn test_solve_infeasible() {
        let mut problem = Problem::new(ObjectiveSense::Minimise);
        let x = problem.add_variable(VariableKind::Continuous, 0.0, f64::INFINITY, 1.0);
        problem.add_ge(2.0, vec![(x, 1.0)]);
        problem.add_le(1.0, vec![(x, 1.0)]);

        let outcome = HighsSolver::default().solve(&problem).unwrap();
        assert_eq!(outcome.status, SolveStatus::Infeasible);
        assert!(outcome.values.is_empty());
        assert!(!outcome.status.has_solution());
    }
}
