//! Code for reading the suppliers table.
use super::{input_err_msg, read_csv};
use crate::id::{ProductID, SupplierID, VehicleType};
use anyhow::{Context, Result, ensure};
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::Path;

const SUPPLIERS_FILE_NAME: &str = "Suppliers.csv";

/// A supplier of one product group.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Supplier {
    /// The supplier's index
    #[serde(rename = "Supplier")]
    pub id: SupplierID,
    /// The maximum quantity the supplier can ship per period
    #[serde(rename = "Capacity")]
    pub capacity: f64,
    /// The product group this supplier ships
    #[serde(rename = "Product group")]
    pub product_group: ProductID,
    /// The vehicle type the supplier ships with
    #[serde(rename = "Vehicle type")]
    pub vehicle_type: VehicleType,
}

/// A map of suppliers, keyed by index
pub type SupplierMap = IndexMap<SupplierID, Supplier>;

/// Read the suppliers table from the model directory.
pub fn read_suppliers(model_dir: &Path) -> Result<SupplierMap> {
    let file_path = model_dir.join(SUPPLIERS_FILE_NAME);
    let iter = read_csv(&file_path)?;
    read_suppliers_from_iter(iter).with_context(|| input_err_msg(file_path))
}

fn read_suppliers_from_iter<I>(iter: I) -> Result<SupplierMap>
where
    I: Iterator<Item = Supplier>,
{
    let mut map = SupplierMap::new();
    for supplier in iter {
        ensure!(
            supplier.capacity.is_finite() && supplier.capacity > 0.0,
            "Supplier {} capacity must be a valid number greater than zero",
            supplier.id
        );

        let id = supplier.id;
        ensure!(
            map.insert(id, supplier).is_none(),
            "Duplicate supplier entry (supplier: {id})"
        );
    }

    ensure!(!map.is_empty(), "Suppliers file cannot be empty");

    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_error;

    fn supplier(id: u32, capacity: f64) -> Supplier {
        Supplier {
            id: SupplierID(id),
            capacity,
            product_group: ProductID(1),
            vehicle_type: VehicleType(1),
        }
    }

    #[test]
    fn test_read_suppliers_from_iter() {
        let suppliers = [supplier(1, 100.0), supplier(2, 50.0)];
        let map = read_suppliers_from_iter(suppliers.clone().into_iter()).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map[&SupplierID(2)], suppliers[1]);
    }

    #[test]
    fn test_read_suppliers_from_iter_duplicate() {
        let suppliers = [supplier(1, 100.0), supplier(1, 50.0)];
        assert_error!(
            read_suppliers_from_iter(suppliers.into_iter()),
            "Duplicate supplier entry (supplier: 1)"
        );
    }

    #[test]
    fn test_read_suppliers_from_iter_bad_capacity() {
        for capacity in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert_error!(
                read_suppliers_from_iter(std::iter::once(supplier(1, capacity))),
                "Supplier 1 capacity must be a valid number greater than zero"
            );
        }
    }

    #[test]
    fn test_read_suppliers_from_iter_empty() {
        assert_error!(
            read_suppliers_from_iter(std::iter::empty()),
            "Suppliers file cannot be empty"
        );
    }
}
