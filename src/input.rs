//! Common routines for reading the model's input tables.
//!
//! Each table lives in its own CSV file in the model directory; the column names are the wire
//! contract and are matched exactly (serde rename attributes on the row structs).
use crate::id::ClusterID;
use crate::settings::Settings;
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::Path;

pub mod candidate;
pub mod demand;
pub mod distance;
pub mod district;
pub mod supplier;
pub mod vehicle;

use self::candidate::CandidateMap;
use self::demand::DemandTable;
use self::distance::{DistrictDistances, SupplierDistances};
use self::district::DemandPoint;
use self::supplier::SupplierMap;
use self::vehicle::VehicleTable;

/// An error message to use if reading an input file fails
pub fn input_err_msg<P: AsRef<Path>>(file_path: P) -> String {
    format!("Error reading {}", file_path.as_ref().to_string_lossy())
}

/// Read a CSV file, deserialising each row into a `T`.
///
/// Rows are read eagerly so that malformed records surface here, with the file path as context.
pub fn read_csv<T: DeserializeOwned>(file_path: &Path) -> Result<impl Iterator<Item = T>> {
    let reader =
        csv::Reader::from_path(file_path).with_context(|| input_err_msg(file_path))?;

    let mut rows = Vec::new();
    for result in reader.into_deserialize() {
        rows.push(result.with_context(|| input_err_msg(file_path))?);
    }

    Ok(rows.into_iter())
}

/// The raw input tables, as read from the model directory.
///
/// These are reference data: loaded once, never mutated. All derived aggregates are computed from
/// them by the pipeline in [`crate::problem`].
pub struct RawTables {
    /// Suppliers, keyed by index
    pub suppliers: SupplierMap,
    /// Candidate facility sites, keyed by index
    pub candidates: CandidateMap,
    /// Vehicle types and their cost rates
    pub vehicles: VehicleTable,
    /// Demand points, in input row order
    pub points: Vec<DemandPoint>,
    /// Reference code to cluster name lookup (keys normalised)
    pub lookup: HashMap<String, ClusterID>,
    /// Point-level demand per product, period and scenario
    pub demand: DemandTable,
    /// Supplier to district distances
    pub supplier_distances: SupplierDistances,
    /// District to district distances
    pub district_distances: DistrictDistances,
}

/// Read every input table from the model directory.
///
/// The demand file read depends on the configured scenario count: a single scenario reads the
/// per-period demand table, more than one reads the scenario-extended table.
pub fn load_tables(model_dir: &Path, settings: &Settings) -> Result<RawTables> {
    let suppliers = supplier::read_suppliers(model_dir)?;
    let candidates = candidate::read_candidates(model_dir)?;
    let vehicles = vehicle::read_vehicles(model_dir)?;
    let points = district::read_points(model_dir)?;
    let lookup = district::read_cluster_lookup(model_dir)?;
    let demand = demand::read_demand(model_dir, settings.scenarios.max(1))?;
    let supplier_distances = distance::read_supplier_distances(model_dir)?;
    let district_distances = distance::read_district_distances(model_dir)?;

    // Cross-table checks that don't belong to any single reader
    for supplier in suppliers.values() {
        anyhow::ensure!(
            vehicles.contains(supplier.vehicle_type),
            "Supplier {} uses vehicle type {}, which is not in the vehicle table",
            supplier.id,
            supplier.vehicle_type
        );
    }
    anyhow::ensure!(
        vehicles.contains(settings.delivery_vehicle),
        "Delivery vehicle type {} is not in the vehicle table",
        settings.delivery_vehicle
    );

    Ok(RawTables {
        suppliers,
        candidates,
        vehicles,
        points,
        lookup,
        demand,
        supplier_distances,
        district_distances,
    })
}
