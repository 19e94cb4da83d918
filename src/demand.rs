//! Code for aggregating point-level demand into cluster-level demand.
//!
//! For each scenario the aggregator produces three views of the demand data:
//!
//! 1. cluster totals per (cluster, product, period), which become the right-hand sides of the
//!    demand coverage constraints;
//! 2. each point's proportion of its cluster's product-summed demand per period, which weight the
//!    distance reduction;
//! 3. network totals per (product, period), which normalise the stochastic variant's supply
//!    fractions.
//!
//! A cluster with zero demand in a period gets an all-zero proportion vector. The division is
//! guarded here so a NaN can never reach the distance weight reducer.
use crate::cluster::ClusterAssignments;
use crate::id::{ClusterID, Period, ProductID, Scenario};
use crate::input::demand::DemandTable;
use anyhow::Result;
use std::collections::HashMap;

/// Aggregated demand for one scenario.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DemandAggregate {
    cluster_totals: HashMap<(ClusterID, ProductID, Period), f64>,
    proportions: HashMap<(ClusterID, Period), Vec<f64>>,
    network_totals: HashMap<(ProductID, Period), f64>,
}

impl DemandAggregate {
    /// A cluster's total demand for a product in a period (zero if absent).
    pub fn cluster_total(&self, cluster: &ClusterID, product: ProductID, period: Period) -> f64 {
        *self
            .cluster_totals
            .get(&(cluster.clone(), product, period))
            .unwrap_or(&0.0)
    }

    /// The demand proportions of a cluster's member points in a period, in membership order.
    ///
    /// Empty when the cluster has no members; all-zero when the cluster has no demand in the
    /// period.
    pub fn proportions(&self, cluster: &ClusterID, period: Period) -> &[f64] {
        self.proportions
            .get(&(cluster.clone(), period))
            .map_or(&[], |proportions| proportions.as_slice())
    }

    /// The network-wide total demand for a product in a period (zero if absent).
    pub fn network_total(&self, product: ProductID, period: Period) -> f64 {
        *self.network_totals.get(&(product, period)).unwrap_or(&0.0)
    }
}

/// Aggregate point-level demand for one scenario.
pub fn aggregate(
    demand: &DemandTable,
    scenario: Scenario,
    assignments: &ClusterAssignments,
) -> Result<DemandAggregate> {
    let mut cluster_totals = HashMap::new();
    let mut proportions = HashMap::new();
    let mut network_totals = HashMap::new();

    for cluster in assignments.clusters() {
        let districts: Vec<_> = assignments.member_districts(cluster).collect();

        for &period in &demand.periods {
            // Per-point demand summed over products, for the proportion weights
            let point_totals: Vec<f64> = districts
                .iter()
                .map(|&district| {
                    demand
                        .products
                        .iter()
                        .map(|&product| demand.get(district, product, period, scenario))
                        .sum()
                })
                .collect();
            let period_total: f64 = point_totals.iter().sum();

            let weights = if period_total > 0.0 {
                point_totals
                    .iter()
                    .map(|point_total| point_total / period_total)
                    .collect()
            } else {
                // Zero cluster demand: the proportion is defined as zero, not NaN
                vec![0.0; point_totals.len()]
            };

            debug_assert!(
                period_total == 0.0
                    || float_cmp::approx_eq!(
                        f64,
                        weights.iter().sum(),
                        1.0,
                        epsilon = 1e-9
                    ),
                "Proportions for cluster {cluster} in period {period} do not sum to 1"
            );
            proportions.insert((cluster.clone(), period), weights);

            for &product in &demand.products {
                let total: f64 = districts
                    .iter()
                    .map(|&district| demand.get(district, product, period, scenario))
                    .sum();
                if total > 0.0 {
                    cluster_totals.insert((cluster.clone(), product, period), total);
                    *network_totals.entry((product, period)).or_insert(0.0) += total;
                }
            }
        }
    }

    Ok(DemandAggregate {
        cluster_totals,
        proportions,
        network_totals,
    })
}
