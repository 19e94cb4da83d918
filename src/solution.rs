//! Code for decoding a solver outcome into a facility plan.
//!
//! Extraction only happens for outcomes carrying a solution. Operating and building costs are
//! recomputed as dot products against the input cost tables rather than read off the objective,
//! so a mismatch between formulation and data would show up here.
use crate::formulation::Formulation;
use crate::id::{CandidateID, ClusterID, Period, ProductID, Scenario, SupplierID};
use crate::problem::ProblemData;
use crate::solver::{SolveStatus, SolverOutcome};
use indexmap::IndexMap;

/// Tolerance for reading a binary variable as set.
const BINARY_TOLERANCE: f64 = 0.5;

/// A decoded facility plan.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanSummary {
    /// The solve status (Optimal or Feasible)
    pub status: SolveStatus,
    /// The objective value
    pub objective: f64,
    /// The relative optimality gap
    pub mip_gap: f64,
    /// Total operating cost, recomputed from the operating cost table
    pub operating_cost: f64,
    /// Total building cost, recomputed from the setup cost table
    pub building_cost: f64,
    /// Build indicator per (candidate, period)
    pub build: IndexMap<(CandidateID, Period), f64>,
    /// Open indicator per (candidate, period)
    pub open: IndexMap<(CandidateID, Period), f64>,
    /// Supply per (candidate, supplier, period, scenario)
    pub supply: IndexMap<(CandidateID, SupplierID, Period, Scenario), f64>,
    /// Delivery per (candidate, cluster, product, period, scenario)
    pub delivered: IndexMap<(CandidateID, ClusterID, ProductID, Period, Scenario), f64>,
}

impl PlanSummary {
    /// The period a candidate is built in, if any.
    pub fn build_period(&self, candidate: CandidateID) -> Option<Period> {
        self.build
            .iter()
            .find(|&(&(c, _), &value)| c == candidate && value > BINARY_TOLERANCE)
            .map(|(&(_, period), _)| period)
    }

    /// Whether a candidate is open in a period.
    pub fn is_open(&self, candidate: CandidateID, period: Period) -> bool {
        self.open
            .get(&(candidate, period))
            .is_some_and(|&value| value > BINARY_TOLERANCE)
    }

    /// Candidates with any build or open activity over the horizon, in declaration order.
    pub fn active_candidates(&self) -> Vec<CandidateID> {
        let mut active = Vec::new();
        for (&(candidate, _), _) in &self.build {
            if !active.contains(&candidate)
                && self.build_period(candidate).is_some()
            {
                active.push(candidate);
            }
        }
        active
    }
}

/// Decode a solver outcome into a plan.
///
/// Returns `None` when the outcome carries no solution (infeasible, unbounded or unknown); the
/// caller reports the terminal status instead.
pub fn decode(
    outcome: &SolverOutcome,
    formulation: &Formulation,
    data: &ProblemData,
) -> Option<PlanSummary> {
    if !outcome.status.has_solution() {
        return None;
    }

    let variables = &formulation.variables;
    let build: IndexMap<_, _> = variables
        .build
        .iter()
        .map(|(&key, &var)| (key, outcome.value(var)))
        .collect();
    let open: IndexMap<_, _> = variables
        .open
        .iter()
        .map(|(&key, &var)| (key, outcome.value(var)))
        .collect();
    let supply: IndexMap<_, _> = variables
        .supply
        .iter()
        .map(|(&key, &var)| (key, outcome.value(var)))
        .collect();
    let delivered: IndexMap<_, _> = variables
        .delivered
        .iter()
        .map(|(key, &var)| (key.clone(), outcome.value(var)))
        .collect();

    // Cross-check the fixed costs against the input tables
    let mut operating_cost = 0.0;
    let mut building_cost = 0.0;
    for (&(candidate, _), value) in &open {
        operating_cost += value * data.candidates[&candidate].operating_cost;
    }
    for (&(candidate, _), value) in &build {
        building_cost += value * data.candidates[&candidate].setup_cost;
    }

    let objective = outcome
        .objective
        .expect("Outcome with solution must have an objective");
    let best_bound = outcome.best_bound.unwrap_or(objective);
    let mip_gap = (objective - best_bound).abs() / (1e-10 + objective.abs());

    Some(PlanSummary {
        status: outcome.status,
        objective,
        mip_gap,
        operating_cost,
        building_cost,
        build,
        open,
        supply,
        delivered,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::problem_data;
    use crate::formulation::{FormulationConfig, formulate_deterministic};
    use crate::solver::SolverOutcome;
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    #[rstest]
    fn test_decode_no_solution(problem_data: ProblemData) {
        let formulation = formulate_deterministic(&problem_data, &FormulationConfig::default());
        let outcome = SolverOutcome {
            status: SolveStatus::Infeasible,
            objective: None,
            best_bound: None,
            values: Vec::new(),
        };
        assert!(decode(&outcome, &formulation, &problem_data).is_none());
    }

    #[rstest]
    fn test_decode_recomputes_fixed_costs(problem_data: ProblemData) {
        let formulation = formulate_deterministic(&problem_data, &FormulationConfig::default());
        let candidate = CandidateID(1);

        // Candidate 1 built in period 1 and open from then on; everything else zero
        let mut values = vec![0.0; formulation.problem.num_variables()];
        values[formulation.variables.build_var(candidate, 1).index()] = 1.0;
        values[formulation.variables.open_var(candidate, 1).index()] = 1.0;
        values[formulation.variables.open_var(candidate, 2).index()] = 1.0;
        let outcome = SolverOutcome {
            status: SolveStatus::Optimal,
            objective: Some(120.0),
            best_bound: Some(120.0),
            values,
        };

        let plan = decode(&outcome, &formulation, &problem_data).unwrap();
        assert_approx_eq!(f64, plan.building_cost, 100.0);
        assert_approx_eq!(f64, plan.operating_cost, 20.0);
        assert_approx_eq!(f64, plan.mip_gap, 0.0);
        assert_eq!(plan.build_period(candidate), Some(1));
        assert_eq!(plan.build_period(CandidateID(3)), None);
        assert!(plan.is_open(candidate, 2));
        assert!(!plan.is_open(CandidateID(3), 1));
        assert_eq!(plan.active_candidates(), vec![candidate]);
    }
}
