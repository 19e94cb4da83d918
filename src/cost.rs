//! Code for deriving per-unit transport costs from distances and vehicle rates.
//!
//! Costs are round-trip (factor 2) and use the vehicle's variable cost in pounds per mile and
//! tonne; demand quantities are in kg, so the division by 1000 converts to the costing unit.
//! Both tables are computed eagerly: the formulator queries them once per decision variable.
use crate::cluster::ClusterAssignments;
use crate::distance::WeightedDistances;
use crate::id::{CandidateID, ClusterID, Period, SupplierID, VehicleType};
use crate::input::candidate::CandidateMap;
use crate::input::distance::SupplierDistances;
use crate::input::supplier::SupplierMap;
use crate::input::vehicle::VehicleTable;
use anyhow::{Context, Result};
use std::collections::HashMap;

/// Round-trip distance factor.
const ROUND_TRIP: f64 = 2.0;

/// Demand is in kg, vehicle rates are per tonne.
const KG_PER_TONNE: f64 = 1000.0;

/// Per-unit cost of shipping from each supplier to each candidate site.
pub type SupplyCostMap = HashMap<(SupplierID, CandidateID), f64>;

/// Per-unit cost of delivering from each candidate site to each cluster in each period.
pub type DeliveryCostMap = HashMap<(CandidateID, ClusterID, Period), f64>;

/// Per-unit transport cost for a single leg.
fn unit_cost(distance: f64, rate: f64) -> f64 {
    ROUND_TRIP * distance * rate / KG_PER_TONNE
}

/// Compute supplier-to-candidate costs.
///
/// The rate depends on each supplier's own vehicle type.
pub fn supply_costs(
    suppliers: &SupplierMap,
    candidates: &CandidateMap,
    distances: &SupplierDistances,
    vehicles: &VehicleTable,
) -> Result<SupplyCostMap> {
    let mut costs = SupplyCostMap::new();
    for supplier in suppliers.values() {
        let rate = vehicles.rate(supplier.vehicle_type)?;
        for &candidate in candidates.keys() {
            let distance = distances
                .get(supplier.id, candidate.district())
                .with_context(|| {
                    format!(
                        "No distance from supplier {} to candidate {candidate}",
                        supplier.id
                    )
                })?;
            costs.insert((supplier.id, candidate), unit_cost(distance, rate));
        }
    }

    Ok(costs)
}

/// Compute candidate-to-cluster delivery costs for one scenario.
///
/// All delivery legs use the configured delivery vehicle type.
pub fn delivery_costs(
    candidates: &CandidateMap,
    assignments: &ClusterAssignments,
    periods: &[Period],
    weighted: &WeightedDistances,
    vehicles: &VehicleTable,
    delivery_vehicle: VehicleType,
) -> Result<DeliveryCostMap> {
    let rate = vehicles.rate(delivery_vehicle)?;

    let mut costs = DeliveryCostMap::new();
    for &candidate in candidates.keys() {
        for cluster in assignments.clusters() {
            for &period in periods {
                let distance = weighted.get(candidate.district(), cluster, period)?;
                costs.insert(
                    (candidate, cluster.clone(), period),
                    unit_cost(distance, rate),
                );
            }
        }
    }

    Ok(costs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    #[test]
    fn test_unit_cost_round_trip() {
        // 10 miles at 0.5 pounds per mile-tonne: 2 * 10 * 0.5 / 1000
        assert_approx_eq!(f64, unit_cost(10.0, 0.5), 0.01);
    }

    #[test]
    fn test_unit_cost_non_negative() {
        for (distance, rate) in [(0.0, 0.0), (0.0, 1.0), (12.5, 0.857), (1e6, 1e3)] {
            assert!(unit_cost(distance, rate) >= 0.0);
        }
    }
}
