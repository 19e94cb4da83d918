//! Code for assembling the problem data the formulator consumes.
//!
//! `ProblemData` is the single context passed by reference through the pipeline: the read-only
//! reference tables plus the derived aggregates. Aggregates are recomputed once per scenario and
//! stored per scenario; they are never merged or overwritten in place.
use crate::cluster::{ClusterAssignments, assign_clusters};
use crate::cost::{self, DeliveryCostMap, SupplyCostMap};
use crate::demand::{self, DemandAggregate};
use crate::distance::{self, WeightedDistances};
use crate::id::{Period, ProductID, Scenario};
use crate::input::RawTables;
use crate::input::candidate::CandidateMap;
use crate::input::supplier::SupplierMap;
use crate::settings::Settings;
use anyhow::{Context, Result, ensure};
use log::info;

/// The aggregates derived for a single demand scenario.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioAggregates {
    /// Cluster demand totals, proportions and network totals
    pub demand: DemandAggregate,
    /// Demand-weighted facility-to-cluster distances
    pub weighted_distances: WeightedDistances,
    /// Per-unit delivery costs derived from the weighted distances
    pub delivery_costs: DeliveryCostMap,
}

/// Everything the model formulator needs, derived once per run.
#[derive(Debug, Clone, PartialEq)]
pub struct ProblemData {
    /// Suppliers, keyed by index
    pub suppliers: SupplierMap,
    /// Candidate facility sites, keyed by index
    pub candidates: CandidateMap,
    /// Product group indices
    pub products: Vec<ProductID>,
    /// Time period indices
    pub periods: Vec<Period>,
    /// Scenario indices (a single entry for the deterministic problem)
    pub scenarios: Vec<Scenario>,
    /// Point-to-cluster assignments and membership index
    pub clusters: ClusterAssignments,
    /// Per-unit supplier-to-candidate costs (scenario-independent)
    pub supply_costs: SupplyCostMap,
    per_scenario: Vec<ScenarioAggregates>,
}

impl ProblemData {
    /// Run the aggregation pipeline over the raw tables.
    pub fn build(raw: &RawTables, settings: &Settings) -> Result<Self> {
        let clusters = assign_clusters(&raw.points, &raw.lookup)?;
        info!(
            "Mapped {} demand points onto {} clusters",
            raw.points.len(),
            clusters.num_clusters()
        );

        let supply_costs = cost::supply_costs(
            &raw.suppliers,
            &raw.candidates,
            &raw.supplier_distances,
            &raw.vehicles,
        )?;

        // Derive aggregates scenario by scenario; each scenario's tables are kept separate
        let mut per_scenario = Vec::with_capacity(raw.demand.scenarios.len());
        for &scenario in &raw.demand.scenarios {
            let aggregate = demand::aggregate(&raw.demand, scenario, &clusters)
                .with_context(|| format!("Aggregating demand for scenario {scenario}"))?;
            let weighted = distance::reduce(
                &raw.district_distances,
                &aggregate,
                &clusters,
                &raw.demand.periods,
            )
            .with_context(|| format!("Reducing distances for scenario {scenario}"))?;
            let delivery_costs = cost::delivery_costs(
                &raw.candidates,
                &clusters,
                &raw.demand.periods,
                &weighted,
                &raw.vehicles,
                settings.delivery_vehicle,
            )?;

            per_scenario.push(ScenarioAggregates {
                demand: aggregate,
                weighted_distances: weighted,
                delivery_costs,
            });
        }

        ensure!(!per_scenario.is_empty(), "No demand scenarios to plan for");

        Ok(ProblemData {
            suppliers: raw.suppliers.clone(),
            candidates: raw.candidates.clone(),
            products: raw.demand.products.clone(),
            periods: raw.demand.periods.clone(),
            scenarios: raw.demand.scenarios.clone(),
            clusters,
            supply_costs,
            per_scenario,
        })
    }

    /// The derived aggregates for a scenario.
    ///
    /// # Panics
    ///
    /// Panics if the scenario index is out of range; scenario indices come from `self.scenarios`.
    pub fn scenario(&self, scenario: Scenario) -> &ScenarioAggregates {
        &self.per_scenario[scenario as usize - 1]
    }
}
