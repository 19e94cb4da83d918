//! Code for reading the distance matrices.
//!
//! Both matrices are dense grids with integer-labelled columns: the first column holds the row
//! label (a supplier or district index), the remaining columns are district indices. They are
//! parsed by hand rather than with serde, since the column set varies per model.
use super::input_err_msg;
use crate::id::{DistrictID, SupplierID};
use anyhow::{Context, Result, ensure};
use indexmap::IndexMap;
use std::path::Path;

const SUPPLIER_DISTANCES_FILE_NAME: &str = "Distance Supplier-District.csv";
const DISTRICT_DISTANCES_FILE_NAME: &str = "Distance District-District.csv";

/// Distances from each supplier to each district.
#[derive(Debug, Clone, PartialEq)]
pub struct SupplierDistances {
    columns: IndexMap<DistrictID, usize>,
    rows: IndexMap<SupplierID, Vec<f64>>,
}

impl SupplierDistances {
    /// The distance from a supplier to a district.
    pub fn get(&self, supplier: SupplierID, district: DistrictID) -> Result<f64> {
        let row = self
            .rows
            .get(&supplier)
            .with_context(|| format!("No distance row for supplier {supplier}"))?;
        let col = self
            .columns
            .get(&district)
            .with_context(|| format!("No supplier distance column for district {district}"))?;
        Ok(row[*col])
    }
}

/// Distances between every pair of districts.
///
/// Rows double as the facility-site axis: the weighted distance reducer produces one value per
/// row, and candidate sites are looked up by their district's row position.
#[derive(Debug, Clone, PartialEq)]
pub struct DistrictDistances {
    columns: IndexMap<DistrictID, usize>,
    rows: IndexMap<DistrictID, Vec<f64>>,
}

impl DistrictDistances {
    /// The column position of a district, if present.
    pub fn column_position(&self, district: DistrictID) -> Option<usize> {
        self.columns.get(&district).copied()
    }

    /// The row position of a district, if present.
    pub fn row_position(&self, district: DistrictID) -> Option<usize> {
        self.rows.get_index_of(&district)
    }

    /// The number of rows (facility sites).
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Iterate over the distance rows in input order.
    pub fn iter_rows(&self) -> impl Iterator<Item = (DistrictID, &[f64])> {
        self.rows.iter().map(|(id, row)| (*id, row.as_slice()))
    }

    /// The row labels in input order.
    pub fn row_labels(&self) -> impl Iterator<Item = DistrictID> + '_ {
        self.rows.keys().copied()
    }
}

#[cfg(test)]
impl DistrictDistances {
    /// Build a symmetric grid directly, with the same labels on both axes.
    pub(crate) fn from_grid_for_test(labels: &[u32], values: &[Vec<f64>]) -> Self {
        DistrictDistances {
            columns: labels
                .iter()
                .enumerate()
                .map(|(position, &label)| (DistrictID(label), position))
                .collect(),
            rows: labels
                .iter()
                .zip(values)
                .map(|(&label, row)| (DistrictID(label), row.clone()))
                .collect(),
        }
    }
}

#[cfg(test)]
impl SupplierDistances {
    /// Build a grid directly from row and column labels.
    pub(crate) fn from_grid_for_test(
        suppliers: &[u32],
        districts: &[u32],
        values: &[Vec<f64>],
    ) -> Self {
        SupplierDistances {
            columns: districts
                .iter()
                .enumerate()
                .map(|(position, &label)| (DistrictID(label), position))
                .collect(),
            rows: suppliers
                .iter()
                .zip(values)
                .map(|(&label, row)| (SupplierID(label), row.clone()))
                .collect(),
        }
    }
}

/// Read the supplier-to-district distance matrix from the model directory.
pub fn read_supplier_distances(model_dir: &Path) -> Result<SupplierDistances> {
    let file_path = model_dir.join(SUPPLIER_DISTANCES_FILE_NAME);
    let (columns, rows) =
        read_grid(&file_path).with_context(|| input_err_msg(&file_path))?;
    Ok(SupplierDistances {
        columns,
        rows: rows.into_iter().map(|(id, row)| (SupplierID(id), row)).collect(),
    })
}

/// Read the district-to-district distance matrix from the model directory.
pub fn read_district_distances(model_dir: &Path) -> Result<DistrictDistances> {
    let file_path = model_dir.join(DISTRICT_DISTANCES_FILE_NAME);
    let (columns, rows) =
        read_grid(&file_path).with_context(|| input_err_msg(&file_path))?;
    Ok(DistrictDistances {
        columns,
        rows: rows.into_iter().map(|(id, row)| (DistrictID(id), row)).collect(),
    })
}

/// Parse an integer-labelled distance grid.
fn read_grid(file_path: &Path) -> Result<(IndexMap<DistrictID, usize>, IndexMap<u32, Vec<f64>>)> {
    let mut reader = csv::Reader::from_path(file_path)?;

    let headers = reader.headers()?.clone();
    ensure!(headers.len() >= 2, "Distance grid must have at least one column");

    let mut columns = IndexMap::new();
    for (position, label) in headers.iter().skip(1).enumerate() {
        let district: u32 = label
            .trim()
            .parse()
            .with_context(|| format!("Column label '{label}' is not a district index"))?;
        ensure!(
            columns.insert(DistrictID(district), position).is_none(),
            "Duplicate distance column for district {district}"
        );
    }

    let mut rows = IndexMap::new();
    for record in reader.records() {
        let record = record?;
        ensure!(
            record.len() == headers.len(),
            "Distance row has {} fields, expected {}",
            record.len(),
            headers.len()
        );

        let label: u32 = record[0]
            .trim()
            .parse()
            .with_context(|| format!("Row label '{}' is not an index", &record[0]))?;

        let mut row = Vec::with_capacity(record.len() - 1);
        for field in record.iter().skip(1) {
            let value: f64 = field
                .trim()
                .parse()
                .with_context(|| format!("Bad distance value '{field}' in row {label}"))?;
            ensure!(
                value.is_finite() && value >= 0.0,
                "Distance in row {label} must be a valid non-negative number"
            );
            row.push(value);
        }

        ensure!(
            rows.insert(label, row).is_none(),
            "Duplicate distance row for index {label}"
        );
    }

    ensure!(!rows.is_empty(), "Distance grid cannot be empty");

    Ok((columns, rows))
}
