//! Code for building the facility location optimisation problem.
//!
//! The formulator is solver-agnostic: it produces a [`Problem`] holding typed variable
//! definitions, a linear objective (as per-variable coefficients) and sparse linear constraints.
//! A [`VariableMap`] keys every decision variable by its domain tuple; it is used both to
//! generate constraints and to read values back out of a solution.
//!
//! Two problem variants are supported. The deterministic variant plans against a single demand
//! realisation with integer supply and stock quantities. The stochastic variant replicates the
//! recourse variables and constraints per scenario, keeps `build`/`open` as scenario-independent
//! first-stage decisions and averages the variable costs uniformly across scenarios.
use crate::id::{CandidateID, ClusterID, Period, ProductID, Scenario, SupplierID};
use crate::problem::ProblemData;
use indexmap::IndexMap;
use serde_string_enum::{DeserializeLabeledStringEnum, SerializeLabeledStringEnum};

mod constraints;

/// The scenario index used by the deterministic variant.
pub const DETERMINISTIC_SCENARIO: Scenario = 1;

/// The kind of a decision variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableKind {
    /// A 0/1 indicator
    Binary,
    /// A non-negative integer quantity
    Integer,
    /// A continuous quantity
    Continuous,
}

/// A typed handle for a decision variable.
///
/// Resolves to a dense column position; the solver adapter maps it onto its own column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VarId(usize);

impl VarId {
    /// The dense column position of this variable.
    pub fn index(self) -> usize {
        self.0
    }
}

/// The definition of a decision variable: kind, bounds and objective coefficient.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDef {
    /// The variable's kind
    pub kind: VariableKind,
    /// The variable's minimum value
    pub min: f64,
    /// The variable's maximum value
    pub max: f64,
    /// The coefficient of the variable in the objective
    pub objective: f64,
}

/// A linear constraint of the form `min <= a1*x1 + a2*x2 + ... <= max`.
///
/// One-sided constraints use an infinite bound on the other side.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearConstraint {
    /// The minimum value for the constraint
    pub min: f64,
    /// The maximum value for the constraint
    pub max: f64,
    /// Sparse terms: variable handle and coefficient
    pub terms: Vec<(VarId, f64)>,
}

/// Whether the objective is to be minimised or maximised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectiveSense {
    /// Minimise the objective
    Minimise,
    /// Maximise the objective
    Maximise,
}

/// A solver-agnostic optimisation problem.
#[derive(Debug, Clone, PartialEq)]
pub struct Problem {
    sense: ObjectiveSense,
    variables: Vec<VariableDef>,
    constraints: Vec<LinearConstraint>,
}

impl Problem {
    /// Create an empty problem with the given objective sense.
    pub fn new(sense: ObjectiveSense) -> Self {
        Problem {
            sense,
            variables: Vec::new(),
            constraints: Vec::new(),
        }
    }

    /// Declare a new variable, returning its handle.
    pub fn add_variable(
        &mut self,
        kind: VariableKind,
        min: f64,
        max: f64,
        objective: f64,
    ) -> VarId {
        assert!(min <= max, "Variable bounds are inverted");
        assert!(objective.is_finite(), "Objective coefficient must be finite");

        self.variables.push(VariableDef {
            kind,
            min,
            max,
            objective,
        });
        VarId(self.variables.len() - 1)
    }

    /// Add a constraint with both bounds.
    pub fn add_constraint(&mut self, min: f64, max: f64, terms: Vec<(VarId, f64)>) {
        // Every constraint's free indices must be declared variables
        for (var, coeff) in &terms {
            assert!(
                var.0 < self.variables.len(),
                "Constraint references undeclared variable"
            );
            assert!(coeff.is_finite(), "Constraint coefficient must be finite");
        }

        self.constraints.push(LinearConstraint { min, max, terms });
    }

    /// Add a `<= max` constraint.
    pub fn add_le(&mut self, max: f64, terms: Vec<(VarId, f64)>) {
        self.add_constraint(f64::NEG_INFINITY, max, terms);
    }

    /// Add a `>= min` constraint.
    pub fn add_ge(&mut self, min: f64, terms: Vec<(VarId, f64)>) {
        self.add_constraint(min, f64::INFINITY, terms);
    }

    /// Add an `== rhs` constraint.
    pub fn add_eq(&mut self, rhs: f64, terms: Vec<(VarId, f64)>) {
        self.add_constraint(rhs, rhs, terms);
    }

    /// The objective sense.
    pub fn sense(&self) -> ObjectiveSense {
        self.sense
    }

    /// The declared variables, in column order.
    pub fn variables(&self) -> &[VariableDef] {
        &self.variables
    }

    /// The constraints, in row order.
    pub fn constraints(&self) -> &[LinearConstraint] {
        &self.constraints
    }

    /// The number of declared variables.
    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    /// The number of constraints.
    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }
}

/// How delivery must cover cluster demand.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    SerializeLabeledStringEnum,
    DeserializeLabeledStringEnum,
)]
pub enum CoverageMode {
    /// Allocate each cluster's demand exactly, as fractions summing to one
    #[default]
    #[string = "exact"]
    Exact,
    /// Deliver at least each cluster's demand, as integer quantities
    #[string = "at-least"]
    AtLeast,
}

/// Options controlling the formulation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FormulationConfig {
    /// How delivery must cover cluster demand (deterministic variant only; the stochastic
    /// variant always allocates exactly)
    pub coverage: CoverageMode,
}

/// A map for looking up the problem's decision variables by their domain indices.
///
/// The entries are ordered (see [`IndexMap`]), so iteration order is the declaration order.
/// The deterministic variant stores its recourse variables under scenario
/// [`DETERMINISTIC_SCENARIO`].
#[derive(Debug, Default, Clone, PartialEq)]
pub struct VariableMap {
    /// May-build indicators per (candidate, period)
    pub build: IndexMap<(CandidateID, Period), VarId>,
    /// Operating indicators per (candidate, period)
    pub open: IndexMap<(CandidateID, Period), VarId>,
    /// Supply drawn per (candidate, supplier, period, scenario)
    pub supply: IndexMap<(CandidateID, SupplierID, Period, Scenario), VarId>,
    /// Stock held per (candidate, product, period, scenario)
    pub stocked: IndexMap<(CandidateID, ProductID, Period, Scenario), VarId>,
    /// Delivery per (candidate, cluster, product, period, scenario)
    pub delivered: IndexMap<(CandidateID, ClusterID, ProductID, Period, Scenario), VarId>,
}

impl VariableMap {
    /// Get the build variable for the given parameters.
    pub fn build_var(&self, candidate: CandidateID, period: Period) -> VarId {
        *self
            .build
            .get(&(candidate, period))
            .expect("No build variable for given params")
    }

    /// Get the open variable for the given parameters.
    pub fn open_var(&self, candidate: CandidateID, period: Period) -> VarId {
        *self
            .open
            .get(&(candidate, period))
            .expect("No open variable for given params")
    }

    /// Get the supply variable for the given parameters.
    pub fn supply_var(
        &self,
        candidate: CandidateID,
        supplier: SupplierID,
        period: Period,
        scenario: Scenario,
    ) -> VarId {
        *self
            .supply
            .get(&(candidate, supplier, period, scenario))
            .expect("No supply variable for given params")
    }

    /// Get the stocked variable for the given parameters.
    pub fn stocked_var(
        &self,
        candidate: CandidateID,
        product: ProductID,
        period: Period,
        scenario: Scenario,
    ) -> VarId {
        *self
            .stocked
            .get(&(candidate, product, period, scenario))
            .expect("No stocked variable for given params")
    }

    /// Get the delivered variable for the given parameters.
    pub fn delivered_var(
        &self,
        candidate: CandidateID,
        cluster: &ClusterID,
        product: ProductID,
        period: Period,
        scenario: Scenario,
    ) -> VarId {
        *self
            .delivered
            .get(&(candidate, cluster.clone(), product, period, scenario))
            .expect("No delivered variable for given params")
    }
}

/// An assembled optimisation problem plus its variable map.
#[derive(Debug, Clone, PartialEq)]
pub struct Formulation {
    /// The solver-agnostic problem
    pub problem: Problem,
    /// The map from domain indices to variable handles
    pub variables: VariableMap,
}

/// Declare the first-stage build/open variables for every candidate and period.
///
/// Their objective coefficients carry the fixed costs: setup cost on `build`, per-period
/// operating cost on `open`.
fn add_lifecycle_variables(
    problem: &mut Problem,
    variables: &mut VariableMap,
    data: &ProblemData,
) {
    for candidate in data.candidates.values() {
        for &period in &data.periods {
            let build = problem.add_variable(VariableKind::Binary, 0.0, 1.0, candidate.setup_cost);
            let existing = variables.build.insert((candidate.id, period), build);
            assert!(existing.is_none(), "Duplicate entry for build variable");

            let open =
                problem.add_variable(VariableKind::Binary, 0.0, 1.0, candidate.operating_cost);
            let existing = variables.open.insert((candidate.id, period), open);
            assert!(existing.is_none(), "Duplicate entry for open variable");
        }
    }
}

/// Build the deterministic (single-scenario) problem.
pub fn formulate_deterministic(data: &ProblemData, config: &FormulationConfig) -> Formulation {
    let mut problem = Problem::new(ObjectiveSense::Minimise);
    let mut variables = VariableMap::default();
    let aggregates = data.scenario(DETERMINISTIC_SCENARIO);

    add_lifecycle_variables(&mut problem, &mut variables, data);

    // Supply and stock are integer unit quantities
    for &candidate in data.candidates.keys() {
        for supplier in data.suppliers.values() {
            for &period in &data.periods {
                let cost = data.supply_costs[&(supplier.id, candidate)];
                let var = problem.add_variable(VariableKind::Integer, 0.0, f64::INFINITY, cost);
                variables.supply.insert(
                    (candidate, supplier.id, period, DETERMINISTIC_SCENARIO),
                    var,
                );
            }
        }
        for &product in &data.products {
            for &period in &data.periods {
                let var = problem.add_variable(VariableKind::Integer, 0.0, f64::INFINITY, 0.0);
                variables
                    .stocked
                    .insert((candidate, product, period, DETERMINISTIC_SCENARIO), var);
            }
        }
    }

    // Delivery: a [0,1] fraction of cluster demand under exact coverage, an integer quantity
    // under at-least coverage
    for &candidate in data.candidates.keys() {
        for cluster in data.clusters.clusters() {
            for &product in &data.products {
                for &period in &data.periods {
                    let unit_cost =
                        aggregates.delivery_costs[&(candidate, cluster.clone(), period)];
                    let var = match config.coverage {
                        CoverageMode::Exact => {
                            let demand =
                                aggregates.demand.cluster_total(cluster, product, period);
                            problem.add_variable(
                                VariableKind::Continuous,
                                0.0,
                                1.0,
                                demand * unit_cost,
                            )
                        }
                        CoverageMode::AtLeast => problem.add_variable(
                            VariableKind::Integer,
                            0.0,
                            f64::INFINITY,
                            unit_cost,
                        ),
                    };
                    variables.delivered.insert(
                        (
                            candidate,
                            cluster.clone(),
                            product,
                            period,
                            DETERMINISTIC_SCENARIO,
                        ),
                        var,
                    );
                }
            }
        }
    }

    constraints::add_lifecycle_constraints(&mut problem, &variables, data);
    constraints::add_deterministic_constraints(
        &mut problem,
        &variables,
        data,
        aggregates,
        config.coverage,
    );

    Formulation { problem, variables }
}

/// Build the stochastic (expected-cost) problem over every scenario in the data.
///
/// `build`/`open` stay scenario-independent; every recourse variable and constraint is
/// replicated per scenario with that scenario's demand, proportion and cost aggregates.
pub fn formulate_stochastic(data: &ProblemData, _config: &FormulationConfig) -> Formulation {
    let mut problem = Problem::new(ObjectiveSense::Minimise);
    let mut variables = VariableMap::default();
    let scenario_weight = 1.0 / data.scenarios.len() as f64;

    add_lifecycle_variables(&mut problem, &mut variables, data);

    for &scenario in &data.scenarios {
        let aggregates = data.scenario(scenario);

        // Supply is the fraction of a scenario's total (product, period) demand routed from a
        // supplier through a candidate; its unit cost scales with that total
        for &candidate in data.candidates.keys() {
            for supplier in data.suppliers.values() {
                for &period in &data.periods {
                    let total = aggregates
                        .demand
                        .network_total(supplier.product_group, period);
                    let cost = scenario_weight
                        * total
                        * data.supply_costs[&(supplier.id, candidate)];
                    let var = problem.add_variable(VariableKind::Continuous, 0.0, 1.0, cost);
                    variables
                        .supply
                        .insert((candidate, supplier.id, period, scenario), var);
                }
            }
            for &product in &data.products {
                for &period in &data.periods {
                    let var =
                        problem.add_variable(VariableKind::Continuous, 0.0, f64::INFINITY, 0.0);
                    variables
                        .stocked
                        .insert((candidate, product, period, scenario), var);
                }
            }
        }

        for &candidate in data.candidates.keys() {
            for cluster in data.clusters.clusters() {
                for &product in &data.products {
                    for &period in &data.periods {
                        let demand = aggregates.demand.cluster_total(cluster, product, period);
                        let unit_cost =
                            aggregates.delivery_costs[&(candidate, cluster.clone(), period)];
                        let var = problem.add_variable(
                            VariableKind::Continuous,
                            0.0,
                            1.0,
                            scenario_weight * demand * unit_cost,
                        );
                        variables
                            .delivered
                            .insert((candidate, cluster.clone(), product, period, scenario), var);
                    }
                }
            }
        }
    }

    constraints::add_lifecycle_constraints(&mut problem, &variables, data);
    for &scenario in &data.scenarios {
        constraints::add_stochastic_scenario_constraints(
            &mut problem,
            &variables,
            data,
            data.scenario(scenario),
            scenario,
        );
    }

    Formulation { problem, variables }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::problem_data;
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    // The fixture data has 2 candidates, 1 supplier, 1 product, 2 periods, 2 clusters and
    // 3 (cluster, product, period) keys with demand.

    #[rstest]
    fn test_deterministic_exact_dimensions(problem_data: crate::problem::ProblemData) {
        let formulation = formulate_deterministic(&problem_data, &FormulationConfig::default());

        // build 4 + open 4 + supply 4 + stocked 4 + delivered 8
        assert_eq!(formulation.problem.num_variables(), 24);
        // lifecycle 10 + supplier capacity 2 + stock balance 4 + storage 4
        // + coverage 3 + open gating 6 + delivery coupling 4
        assert_eq!(formulation.problem.num_constraints(), 33);
    }

    #[rstest]
    fn test_deterministic_at_least_dimensions(problem_data: crate::problem::ProblemData) {
        let config = FormulationConfig {
            coverage: CoverageMode::AtLeast,
        };
        let formulation = formulate_deterministic(&problem_data, &config);

        assert_eq!(formulation.problem.num_variables(), 24);
        // No per-candidate gating rows; coverage becomes a lower bound
        assert_eq!(formulation.problem.num_constraints(), 27);

        // Delivered is an unbounded integer quantity
        let delivered = formulation.variables.delivered_var(
            crate::id::CandidateID(1),
            &"North".into(),
            crate::id::ProductID(1),
            1,
            DETERMINISTIC_SCENARIO,
        );
        let def = &formulation.problem.variables()[delivered.index()];
        assert_eq!(def.kind, VariableKind::Integer);
        assert!(def.max.is_infinite());
    }

    #[rstest]
    fn test_stochastic_dimensions(problem_data: crate::problem::ProblemData) {
        let formulation = formulate_stochastic(&problem_data, &FormulationConfig::default());

        assert_eq!(formulation.problem.num_variables(), 24);
        // lifecycle 10 + supply gating 4 + supply balance 2 + supplier capacity 2
        // + stock balance 4 + storage 4 + coverage 3 + delivery gating 6 + coupling 4
        assert_eq!(formulation.problem.num_constraints(), 39);
    }

    #[rstest]
    fn test_deterministic_objective_coefficients(problem_data: crate::problem::ProblemData) {
        let formulation = formulate_deterministic(&problem_data, &FormulationConfig::default());
        let candidate = crate::id::CandidateID(1);

        let build = formulation.variables.build_var(candidate, 1);
        assert_approx_eq!(
            f64,
            formulation.problem.variables()[build.index()].objective,
            100.0
        );

        let open = formulation.variables.open_var(candidate, 1);
        assert_approx_eq!(
            f64,
            formulation.problem.variables()[open.index()].objective,
            10.0
        );

        // Supplier 1 sits 10 miles from candidate 1 with a 0.2 rate: 2 * 10 * 0.2 / 1000
        let supply = formulation.variables.supply_var(
            candidate,
            crate::id::SupplierID(1),
            1,
            DETERMINISTIC_SCENARIO,
        );
        assert_approx_eq!(
            f64,
            formulation.problem.variables()[supply.index()].objective,
            0.004
        );

        // The North weighted distance from candidate 1 in period 1 is 2.0 miles; the cluster
        // demand is 10, so the fraction's coefficient is 10 * (2 * 2.0 * 0.5 / 1000)
        let delivered = formulation.variables.delivered_var(
            candidate,
            &"North".into(),
            crate::id::ProductID(1),
            1,
            DETERMINISTIC_SCENARIO,
        );
        assert_approx_eq!(
            f64,
            formulation.problem.variables()[delivered.index()].objective,
            0.02
        );
    }

    #[test]
    #[should_panic(expected = "Constraint references undeclared variable")]
    fn test_add_constraint_checks_variables() {
        let mut problem = Problem::new(ObjectiveSense::Minimise);
        let mut other = Problem::new(ObjectiveSense::Minimise);
        let foreign = other.add_variable(VariableKind::Continuous, 0.0, 1.0, 0.0);
        problem.add_le(1.0, vec![(foreign, 1.0)]);
    }
}
