//! Code for reading the vehicle types table.
use super::{input_err_msg, read_csv};
use crate::id::VehicleType;
use anyhow::{Context, Result, ensure};
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::Path;

const VEHICLES_FILE_NAME: &str = "vehicleType.csv";

/// A vehicle type and its cost rates.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Vehicle {
    /// The vehicle type's index
    #[serde(rename = "Vehicle type")]
    pub vehicle_type: VehicleType,
    /// Load capacity in tonnes
    #[serde(rename = "Capacity")]
    pub capacity: f64,
    /// Fixed cost in pounds per mile travelled
    #[serde(rename = "Cost per mile")]
    pub cost_per_mile: f64,
    /// Variable cost in pounds per mile and tonne transported
    #[serde(rename = "Cost per mile and tonne")]
    pub cost_per_mile_tonne: f64,
    /// Emissions in kg CO2 per mile and tonne transported
    #[serde(rename = "CO2 per mile and tonne")]
    pub co2_per_mile_tonne: f64,
}

/// The vehicle types available to the network, keyed by index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VehicleTable(IndexMap<VehicleType, Vehicle>);

impl VehicleTable {
    /// Whether the table contains the given vehicle type
    pub fn contains(&self, vehicle_type: VehicleType) -> bool {
        self.0.contains_key(&vehicle_type)
    }

    /// The variable cost rate (pounds per mile and tonne) for the given vehicle type.
    pub fn rate(&self, vehicle_type: VehicleType) -> Result<f64> {
        let vehicle = self
            .0
            .get(&vehicle_type)
            .with_context(|| format!("Unknown vehicle type {vehicle_type}"))?;
        Ok(vehicle.cost_per_mile_tonne)
    }
}

impl FromIterator<(VehicleType, Vehicle)> for VehicleTable {
    fn from_iter<I: IntoIterator<Item = (VehicleType, Vehicle)>>(iter: I) -> Self {
        VehicleTable(iter.into_iter().collect())
    }
}

/// Read the vehicle types table from the model directory.
pub fn read_vehicles(model_dir: &Path) -> Result<VehicleTable> {
    let file_path = model_dir.join(VEHICLES_FILE_NAME);
    let iter = read_csv(&file_path)?;
    read_vehicles_from_iter(iter).with_context(|| input_err_msg(file_path))
}

fn read_vehicles_from_iter<I>(iter: I) -> Result<VehicleTable>
where
    I: Iterator<Item = Vehicle>,
{
    let mut map = IndexMap::new();
    for vehicle in iter {
        for (name, value) in [
            ("capacity", vehicle.capacity),
            ("cost per mile", vehicle.cost_per_mile),
            ("cost per mile and tonne", vehicle.cost_per_mile_tonne),
            ("CO2 per mile and tonne", vehicle.co2_per_mile_tonne),
        ] {
            ensure!(
                value.is_finite() && value >= 0.0,
                "Vehicle type {} {name} must be a valid non-negative number",
                vehicle.vehicle_type
            );
        }

        let vehicle_type = vehicle.vehicle_type;
        ensure!(
            map.insert(vehicle_type, vehicle).is_none(),
            "Duplicate vehicle type entry (vehicle type: {vehicle_type})"
        );
    }

    ensure!(!map.is_empty(), "Vehicle types file cannot be empty");

    Ok(VehicleTable(map))
}
