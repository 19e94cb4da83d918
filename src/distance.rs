//! Code for reducing the district distance matrix to cluster distances.
//!
//! For each (cluster, period) the reducer takes the columns of the district distance matrix that
//! belong to the cluster's member points and computes their demand-proportion-weighted sum. The
//! result is one distance per matrix row, i.e. per potential facility site. The reduction is one
//! dot product per row over the cluster's column block, so the cost is
//! O(rows x points-in-cluster) per (cluster, period).
use crate::cluster::ClusterAssignments;
use crate::demand::DemandAggregate;
use crate::id::{ClusterID, DistrictID, Period};
use crate::input::distance::DistrictDistances;
use anyhow::{Context, Result};
use std::collections::HashMap;

/// Demand-weighted facility-to-cluster distances for one scenario.
///
/// Values are stored per (cluster, period) as a vector aligned with the distance matrix's row
/// order; sites are looked up by district index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeightedDistances {
    values: HashMap<(ClusterID, Period), Vec<f64>>,
    row_positions: HashMap<DistrictID, usize>,
}

impl WeightedDistances {
    /// The weighted distance from a site to a cluster in a period.
    pub fn get(&self, site: DistrictID, cluster: &ClusterID, period: Period) -> Result<f64> {
        let row = *self
            .row_positions
            .get(&site)
            .with_context(|| format!("No distance row for district {site}"))?;
        let values = self
            .values
            .get(&(cluster.clone(), period))
            .with_context(|| format!("No weighted distances for cluster {cluster}, period {period}"))?;
        Ok(values[row])
    }
}

/// Reduce the district distance matrix to weighted cluster distances for one scenario.
pub fn reduce(
    distances: &DistrictDistances,
    aggregate: &DemandAggregate,
    assignments: &ClusterAssignments,
    periods: &[Period],
) -> Result<WeightedDistances> {
    let mut values = HashMap::new();

    for cluster in assignments.clusters() {
        // Column positions of the cluster's member points, fixed across periods
        let columns = assignments
            .member_districts(cluster)
            .map(|district| {
                distances.column_position(district).with_context(|| {
                    format!("No district distance column for district {district} (cluster {cluster})")
                })
            })
            .collect::<Result<Vec<_>>>()?;

        for &period in periods {
            let weights = aggregate.proportions(cluster, period);

            let reduced: Vec<f64> = distances
                .iter_rows()
                .map(|(_, row)| {
                    columns
                        .iter()
                        .zip(weights)
                        .map(|(&column, weight)| row[column] * weight)
                        .sum()
                })
                .collect();

            values.insert((cluster.clone(), period), reduced);
        }
    }

    Ok(WeightedDistances {
        values,
        row_positions: distances
            .row_labels()
            .enumerate()
            .map(|(position, district)| (district, position))
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::assign_clusters;
    use crate::demand::aggregate;
    use crate::fixture::{demand_table, district_distances, lookup, points};
    use crate::input::demand::DemandTable;
    use crate::input::district::DemandPoint;
    use float_cmp::assert_approx_eq;
    use rstest::rstest;
    use std::collections::HashMap;

    #[rstest]
    fn test_reduce_weighted_distance(
        points: Vec<DemandPoint>,
        lookup: HashMap<String, ClusterID>,
        demand_table: DemandTable,
        district_distances: DistrictDistances,
    ) {
        let assignments = assign_clusters(&points, &lookup).unwrap();
        let agg = aggregate(&demand_table, 1, &assignments).unwrap();
        let weighted = reduce(&district_distances, &agg, &assignments, &[1, 2]).unwrap();

        // North = districts 1, 2 with proportions 0.6, 0.4 in period 1.
        // From district 3: 0.6 * 9 + 0.4 * 4 = 7.0
        assert_approx_eq!(
            f64,
            weighted.get(DistrictID(3), &"North".into(), 1).unwrap(),
            7.0
        );
        // From district 1: 0.6 * 0 + 0.4 * 5 = 2.0
        assert_approx_eq!(
            f64,
            weighted.get(DistrictID(1), &"North".into(), 1).unwrap(),
            2.0
        );
    }

    #[rstest]
    fn test_weighted_distance_within_bounds(
        points: Vec<DemandPoint>,
        lookup: HashMap<String, ClusterID>,
        demand_table: DemandTable,
        district_distances: DistrictDistances,
    ) {
        let assignments = assign_clusters(&points, &lookup).unwrap();
        let agg = aggregate(&demand_table, 1, &assignments).unwrap();
        let weighted = reduce(&district_distances, &agg, &assignments, &[1]).unwrap();

        // A convex combination cannot leave the range of its member distances
        for site in [1, 2, 3].map(DistrictID) {
            let cluster = ClusterID::new("North");
            let value = weighted.get(site, &cluster, 1).unwrap();
            let member_distances: Vec<f64> = assignments
                .member_districts(&cluster)
                .map(|district| {
                    let column = district_distances.column_position(district).unwrap();
                    let (_, row) = district_distances
                        .iter_rows()
                        .find(|(label, _)| *label == site)
                        .unwrap();
                    row[column]
                })
                .collect();
            let min = member_distances.iter().copied().fold(f64::INFINITY, f64::min);
            let max = member_distances.iter().copied().fold(0.0, f64::max);
            assert!(value >= min - 1e-9 && value <= max + 1e-9);
        }
    }

    #[rstest]
    fn test_reduce_zero_demand_is_zero(
        points: Vec<DemandPoint>,
        lookup: HashMap<String, ClusterID>,
        demand_table: DemandTable,
        district_distances: DistrictDistances,
    ) {
        let assignments = assign_clusters(&points, &lookup).unwrap();
        let agg = aggregate(&demand_table, 1, &assignments).unwrap();
        let weighted = reduce(&district_distances, &agg, &assignments, &[1, 2]).unwrap();

        // South has no demand in period 2, so its weights are all zero
        assert_approx_eq!(
            f64,
            weighted.get(DistrictID(1), &"South".into(), 2).unwrap(),
            0.0
        );
    }
}
