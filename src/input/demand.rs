//! Code for reading point-level demand, with and without scenarios.
use super::{input_err_msg, read_csv};
use crate::id::{DistrictID, Period, ProductID, Scenario};
use anyhow::{Context, Result, ensure};
use std::collections::HashMap;
use std::path::Path;

const DEMAND_FILE_NAME: &str = "DemandPeriods.csv";
const DEMAND_SCENARIOS_FILE_NAME: &str = "DemandPeriodScenarios.csv";

/// A demand entry for one point, product and period.
#[derive(Debug, Clone, serde::Deserialize, PartialEq)]
struct DemandRow {
    #[serde(rename = "Customer")]
    customer: DistrictID,
    #[serde(rename = "Product")]
    product: ProductID,
    #[serde(rename = "Period")]
    period: Period,
    #[serde(rename = "Demand")]
    demand: f64,
}

/// A demand entry for one point, product, period and scenario.
#[derive(Debug, Clone, serde::Deserialize, PartialEq)]
struct DemandScenarioRow {
    #[serde(rename = "Customer")]
    customer: DistrictID,
    #[serde(rename = "Product")]
    product: ProductID,
    #[serde(rename = "Period")]
    period: Period,
    #[serde(rename = "Scenario")]
    scenario: Scenario,
    #[serde(rename = "Demand")]
    demand: f64,
}

/// Point-level demand, keyed by point, product, period and scenario.
///
/// Also carries the index extents discovered from the data: products and periods run 1..=max,
/// matching the integer labelling of the input tables. Missing entries are zero demand.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DemandTable {
    entries: HashMap<(DistrictID, ProductID, Period, Scenario), f64>,
    /// All product indices, in order
    pub products: Vec<ProductID>,
    /// All period indices, in order
    pub periods: Vec<Period>,
    /// All scenario indices in use, in order
    pub scenarios: Vec<Scenario>,
}

impl DemandTable {
    /// The demand at a point for a product, period and scenario (zero if absent).
    pub fn get(
        &self,
        point: DistrictID,
        product: ProductID,
        period: Period,
        scenario: Scenario,
    ) -> f64 {
        *self
            .entries
            .get(&(point, product, period, scenario))
            .unwrap_or(&0.0)
    }

    /// Iterate over all nonzero demand entries.
    pub fn iter(
        &self,
    ) -> impl Iterator<Item = (&(DistrictID, ProductID, Period, Scenario), &f64)> {
        self.entries.iter()
    }
}

#[cfg(test)]
impl DemandTable {
    /// Build a table directly from entries, deriving the index extents.
    pub(crate) fn from_entries_for_test(
        entries: &[((DistrictID, ProductID, Period, Scenario), f64)],
    ) -> Self {
        let scenario_count = entries
            .iter()
            .map(|((_, _, _, scenario), _)| *scenario)
            .max()
            .unwrap_or(1);
        build_table(entries.iter().copied(), scenario_count).unwrap()
    }
}

/// Read point-level demand from the model directory.
///
/// With `scenario_count == 1` the per-period demand table is read and every entry is assigned to
/// scenario 1; otherwise the scenario-extended table is read and entries for scenarios beyond
/// `scenario_count` are dropped.
pub fn read_demand(model_dir: &Path, scenario_count: u32) -> Result<DemandTable> {
    if scenario_count <= 1 {
        let file_path = model_dir.join(DEMAND_FILE_NAME);
        let iter = read_csv::<DemandRow>(&file_path)?;
        let entries = iter.map(|row| ((row.customer, row.product, row.period, 1), row.demand));
        build_table(entries, 1).with_context(|| input_err_msg(file_path))
    } else {
        let file_path = model_dir.join(DEMAND_SCENARIOS_FILE_NAME);
        let iter = read_csv::<DemandScenarioRow>(&file_path)?;
        let entries = iter.map(|row| {
            (
                (row.customer, row.product, row.period, row.scenario),
                row.demand,
            )
        });
        build_table(entries, scenario_count).with_context(|| input_err_msg(file_path))
    }
}

fn build_table<I>(iter: I, scenario_count: u32) -> Result<DemandTable>
where
    I: Iterator<Item = ((DistrictID, ProductID, Period, Scenario), f64)>,
{
    let mut entries = HashMap::new();
    let mut max_product = 0;
    let mut max_period = 0;
    let mut max_scenario = 0;

    for ((point, product, period, scenario), demand) in iter {
        ensure!(
            demand.is_finite() && demand >= 0.0,
            "Demand must be a valid non-negative number \
            (customer: {point}, product: {product}, period: {period}, scenario: {scenario})"
        );
        ensure!(
            product.0 >= 1 && period >= 1 && scenario >= 1,
            "Product, period and scenario indices must start at 1 \
            (customer: {point}, product: {product}, period: {period}, scenario: {scenario})"
        );
        max_scenario = max_scenario.max(scenario);

        if scenario > scenario_count {
            continue;
        }

        ensure!(
            entries
                .insert((point, product, period, scenario), demand)
                .is_none(),
            "Duplicate demand entry \
            (customer: {point}, product: {product}, period: {period}, scenario: {scenario})"
        );
        max_product = max_product.max(product.0);
        max_period = max_period.max(period);
    }

    ensure!(!entries.is_empty(), "Demand file cannot be empty");
    ensure!(
        max_scenario >= scenario_count,
        "Requested {scenario_count} scenarios but the demand file only covers {max_scenario}"
    );

    Ok(DemandTable {
        entries,
        products: (1..=max_product).map(ProductID).collect(),
        periods: (1..=max_period).collect(),
        scenarios: (1..=scenario_count).collect(),
    })
}
