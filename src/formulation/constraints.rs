//! Constraint generation for both problem variants.
use super::{CoverageMode, DETERMINISTIC_SCENARIO, Problem, VarId, VariableMap};
use crate::id::Scenario;
use crate::problem::{ProblemData, ScenarioAggregates};

/// Add the facility lifecycle constraints, shared by both variants.
///
/// Per candidate: at most one build over the horizon; open in the first period exactly when
/// built in it; open is monotone over time, implied by a build in the same period, and
/// impossible without a build in the same or an earlier period.
pub(super) fn add_lifecycle_constraints(
    problem: &mut Problem,
    variables: &VariableMap,
    data: &ProblemData,
) {
    for &candidate in data.candidates.keys() {
        let build_terms: Vec<_> = data
            .periods
            .iter()
            .map(|&period| (variables.build_var(candidate, period), 1.0))
            .collect();
        problem.add_le(1.0, build_terms);

        let mut cumulative_builds: Vec<(VarId, f64)> = Vec::new();
        let mut prev_open: Option<VarId> = None;
        for &period in &data.periods {
            let open = variables.open_var(candidate, period);
            let build = variables.build_var(candidate, period);
            cumulative_builds.push((build, -1.0));

            if let Some(prev) = prev_open {
                // Stays open once open
                problem.add_ge(0.0, vec![(open, 1.0), (prev, -1.0)]);
                // Opens in the period it is built
                problem.add_ge(0.0, vec![(open, 1.0), (build, -1.0)]);
                // Cannot be open without a build in this or an earlier period
                let mut terms = vec![(open, 1.0)];
                terms.extend(cumulative_builds.iter().copied());
                problem.add_le(0.0, terms);
            } else {
                // First period: open exactly when built now
                problem.add_eq(0.0, vec![(open, 1.0), (build, -1.0)]);
            }

            prev_open = Some(open);
        }
    }
}

/// Add the supply, stock and delivery constraints of the deterministic variant.
pub(super) fn add_deterministic_constraints(
    problem: &mut Problem,
    variables: &VariableMap,
    data: &ProblemData,
    aggregates: &ScenarioAggregates,
    coverage: CoverageMode,
) {
    const SC: Scenario = DETERMINISTIC_SCENARIO;

    // Suppliers cannot ship more than their capacity in a period
    for supplier in data.suppliers.values() {
        for &period in &data.periods {
            let terms: Vec<_> = data
                .candidates
                .keys()
                .map(|&candidate| (variables.supply_var(candidate, supplier.id, period, SC), 1.0))
                .collect();
            problem.add_le(supplier.capacity, terms);
        }
    }

    // Stock of a product equals the supply drawn from that product's suppliers
    for &candidate in data.candidates.keys() {
        for &product in &data.products {
            for &period in &data.periods {
                let mut terms = vec![(variables.stocked_var(candidate, product, period, SC), 1.0)];
                terms.extend(
                    data.suppliers
                        .values()
                        .filter(|supplier| supplier.product_group == product)
                        .map(|supplier| {
                            (variables.supply_var(candidate, supplier.id, period, SC), -1.0)
                        }),
                );
                problem.add_eq(0.0, terms);
            }
        }
    }

    // Total stock is bounded by capacity and forced to zero when the site is closed
    for candidate in data.candidates.values() {
        for &period in &data.periods {
            let mut terms: Vec<_> = data
                .products
                .iter()
                .map(|&product| (variables.stocked_var(candidate.id, product, period, SC), 1.0))
                .collect();
            terms.push((
                variables.open_var(candidate.id, period),
                -candidate.capacity,
            ));
            problem.add_le(0.0, terms);
        }
    }

    // Demand coverage, for keys with demand only
    for cluster in data.clusters.clusters() {
        for &product in &data.products {
            for &period in &data.periods {
                let demand = aggregates.demand.cluster_total(cluster, product, period);
                if demand <= 0.0 {
                    continue;
                }

                let terms: Vec<_> = data
                    .candidates
                    .keys()
                    .map(|&candidate| {
                        (
                            variables.delivered_var(candidate, cluster, product, period, SC),
                            1.0,
                        )
                    })
                    .collect();

                match coverage {
                    CoverageMode::Exact => {
                        problem.add_eq(1.0, terms);
                        // A closed site cannot take a share of the allocation
                        for &candidate in data.candidates.keys() {
                            problem.add_le(
                                0.0,
                                vec![
                                    (
                                        variables
                                            .delivered_var(candidate, cluster, product, period, SC),
                                        1.0,
                                    ),
                                    (variables.open_var(candidate, period), -1.0),
                                ],
                            );
                        }
                    }
                    CoverageMode::AtLeast => problem.add_ge(demand, terms),
                }
            }
        }
    }

    // Deliveries out of a site cannot exceed its stock of the product
    for &candidate in data.candidates.keys() {
        for &product in &data.products {
            for &period in &data.periods {
                let mut terms: Vec<_> = data
                    .clusters
                    .clusters()
                    .filter_map(|cluster| {
                        let coefficient = match coverage {
                            // Delivered is a fraction of cluster demand
                            CoverageMode::Exact => {
                                aggregates.demand.cluster_total(cluster, product, period)
                            }
                            // Delivered is already a quantity
                            CoverageMode::AtLeast => 1.0,
                        };
                        (coefficient > 0.0).then(|| {
                            (
                                variables.delivered_var(candidate, cluster, product, period, SC),
                                coefficient,
                            )
                        })
                    })
                    .collect();
                terms.push((variables.stocked_var(candidate, product, period, SC), -1.0));
                problem.add_le(0.0, terms);
            }
        }
    }
}

/// Add one scenario's supply, stock and delivery constraints for the stochastic variant.
///
/// Supply variables are fractions of the scenario's total (product, period) demand, so capacity
/// and stock rows scale them by that total.
pub(super) fn add_stochastic_scenario_constraints(
    problem: &mut Problem,
    variables: &VariableMap,
    data: &ProblemData,
    aggregates: &ScenarioAggregates,
    scenario: Scenario,
) {
    // No supply into a closed site
    for &candidate in data.candidates.keys() {
        for supplier in data.suppliers.values() {
            for &period in &data.periods {
                problem.add_le(
                    0.0,
                    vec![
                        (
                            variables.supply_var(candidate, supplier.id, period, scenario),
                            1.0,
                        ),
                        (variables.open_var(candidate, period), -1.0),
                    ],
                );
            }
        }
    }

    // The network draws exactly its total demand of each product in each period
    for &product in &data.products {
        for &period in &data.periods {
            if aggregates.demand.network_total(product, period) <= 0.0 {
                continue;
            }

            let terms: Vec<_> = data
                .candidates
                .keys()
                .flat_map(|&candidate| {
                    data.suppliers
                        .values()
                        .filter(|supplier| supplier.product_group == product)
                        .map(move |supplier| {
                            (
                                variables.supply_var(candidate, supplier.id, period, scenario),
                                1.0,
                            )
                        })
                })
                .collect();
            problem.add_eq(1.0, terms);
        }
    }

    // Suppliers cannot ship more than their capacity in a period
    for supplier in data.suppliers.values() {
        for &period in &data.periods {
            let total = aggregates
                .demand
                .network_total(supplier.product_group, period);
            if total <= 0.0 {
                continue;
            }

            let terms: Vec<_> = data
                .candidates
                .keys()
                .map(|&candidate| {
                    (
                        variables.supply_var(candidate, supplier.id, period, scenario),
                        total,
                    )
                })
                .collect();
            problem.add_le(supplier.capacity, terms);
        }
    }

    // Stock of a product equals the quantity drawn from that product's suppliers
    for &candidate in data.candidates.keys() {
        for &product in &data.products {
            for &period in &data.periods {
                let total = aggregates.demand.network_total(product, period);
                let mut terms = vec![(
                    variables.stocked_var(candidate, product, period, scenario),
                    1.0,
                )];
                terms.extend(
                    data.suppliers
                        .values()
                        .filter(|supplier| supplier.product_group == product)
                        .map(|supplier| {
                            (
                                variables.supply_var(candidate, supplier.id, period, scenario),
                                -total,
                            )
                        }),
                );
                problem.add_eq(0.0, terms);
            }
        }
    }

    // Total stock is bounded by capacity and forced to zero when the site is closed
    for candidate in data.candidates.values() {
        for &period in &data.periods {
            let mut terms: Vec<_> = data
                .products
                .iter()
                .map(|&product| {
                    (
                        variables.stocked_var(candidate.id, product, period, scenario),
                        1.0,
                    )
                })
                .collect();
            terms.push((
                variables.open_var(candidate.id, period),
                -candidate.capacity,
            ));
            problem.add_le(0.0, terms);
        }
    }

    // Exact demand coverage per cluster, with closed sites gated out
    for cluster in data.clusters.clusters() {
        for &product in &data.products {
            for &period in &data.periods {
                let demand = aggregates.demand.cluster_total(cluster, product, period);
                if demand <= 0.0 {
                    continue;
                }

                let terms: Vec<_> = data
                    .candidates
                    .keys()
                    .map(|&candidate| {
                        (
                            variables
                                .delivered_var(candidate, cluster, product, period, scenario),
                            1.0,
                        )
                    })
                    .collect();
                problem.add_eq(1.0, terms);

                for &candidate in data.candidates.keys() {
                    problem.add_le(
                        0.0,
                        vec![
                            (
                                variables
                                    .delivered_var(candidate, cluster, product, period, scenario),
                                1.0,
                            ),
                            (variables.open_var(candidate, period), -1.0),
                        ],
                    );
                }
            }
        }
    }

    // Deliveries out of a site cannot exceed its stock of the product
    for &candidate in data.candidates.keys() {
        for &product in &data.products {
            for &period in &data.periods {
                let mut terms: Vec<_> = data
                    .clusters
                    .clusters()
                    .filter_map(|cluster| {
                        let demand = aggregates.demand.cluster_total(cluster, product, period);
                        (demand > 0.0).then(|| {
                            (
                                variables
                                    .delivered_var(candidate, cluster, product, period, scenario),
                                demand,
                            )
                        })
                    })
                    .collect();
                terms.push((
                    variables.stocked_var(candidate, product, period, scenario),
                    -1.0,
                ));
                problem.add_le(0.0, terms);
            }
        }
    }
}
