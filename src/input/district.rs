//! Code for reading the demand points table and the point-to-cluster lookup.
//!
//! Demand points are postcode districts. Each carries a reference code (a full postcode) which the
//! lookup table maps to a cluster name. Reference codes are normalised by stripping internal
//! spaces before matching, since the two tables disagree on spacing.
use super::{input_err_msg, read_csv};
use crate::id::{ClusterID, DistrictID};
use anyhow::{Context, Result, ensure};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

const POINTS_FILE_NAME: &str = "PostcodeDistricts.csv";
const LOOKUP_FILE_NAME: &str = "ClusterLookup.csv";

/// A fine-grained demand point (a postcode district).
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DemandPoint {
    /// The district's index, used in the demand table and distance matrices
    #[serde(rename = "District ID")]
    pub district: DistrictID,
    /// The reference code used to find the district's cluster in the lookup table
    #[serde(rename = "Reference PC")]
    pub reference_code: String,
}

/// A row of the point-to-cluster lookup table.
#[derive(Debug, Clone, Deserialize, PartialEq)]
struct LookupRow {
    #[serde(rename = "Reference PC")]
    reference_code: String,
    #[serde(rename = "Cluster")]
    cluster: String,
}

/// Strip internal spaces from a reference code.
pub fn normalise_code(code: &str) -> String {
    code.split_whitespace().collect()
}

/// Read the demand points table from the model directory.
///
/// Points are returned in input row order; that order defines the membership indices used to
/// slice the distance matrices.
pub fn read_points(model_dir: &Path) -> Result<Vec<DemandPoint>> {
    let file_path = model_dir.join(POINTS_FILE_NAME);
    let iter = read_csv(&file_path)?;
    read_points_from_iter(iter).with_context(|| input_err_msg(file_path))
}

fn read_points_from_iter<I>(iter: I) -> Result<Vec<DemandPoint>>
where
    I: Iterator<Item = DemandPoint>,
{
    let mut points = Vec::new();
    let mut seen = std::collections::HashSet::new();
    for point in iter {
        ensure!(
            seen.insert(point.district),
            "Duplicate demand point entry (district: {})",
            point.district
        );
        points.push(point);
    }

    ensure!(!points.is_empty(), "Demand points file cannot be empty");

    Ok(points)
}

/// Read the point-to-cluster lookup from the model directory.
///
/// Keys are normalised reference codes.
pub fn read_cluster_lookup(model_dir: &Path) -> Result<HashMap<String, ClusterID>> {
    let file_path = model_dir.join(LOOKUP_FILE_NAME);
    let iter = read_csv(&file_path)?;
    read_lookup_from_iter(iter).with_context(|| input_err_msg(file_path))
}

fn read_lookup_from_iter<I>(iter: I) -> Result<HashMap<String, ClusterID>>
where
    I: Iterator<Item = LookupRow>,
{
    let mut map = HashMap::new();
    for row in iter {
        // Later rows for the same code win, as long as they agree
        let code = normalise_code(&row.reference_code);
        let cluster = ClusterID::from(row.cluster);
        if let Some(existing) = map.insert(code, cluster.clone()) {
            ensure!(
                existing == cluster,
                "Reference code {} maps to both {existing} and {cluster}",
                row.reference_code
            );
        }
    }

    ensure!(!map.is_empty(), "Cluster lookup file cannot be empty");

    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_error;

    #[test]
    fn test_normalise_code() {
        assert_eq!(normalise_code("AB1 2CD"), "AB12CD");
        assert_eq!(normalise_code("AB12CD"), "AB12CD");
    }

    #[test]
    fn test_read_points_from_iter_duplicate() {
        let point = DemandPoint {
            district: DistrictID(1),
            reference_code: "AB1 2CD".to_string(),
        };
        assert_error!(
            read_points_from_iter([point.clone(), point].into_iter()),
            "Duplicate demand point entry (district: 1)"
        );
    }

    #[test]
    fn test_read_lookup_from_iter() {
        let rows = [
            LookupRow {
                reference_code: "AB1 2CD".to_string(),
                cluster: "North".to_string(),
            },
            LookupRow {
                reference_code: "EF3 4GH".to_string(),
                cluster: "South".to_string(),
            },
        ];
        let map = read_lookup_from_iter(rows.into_iter()).unwrap();
        assert_eq!(map["AB12CD"], ClusterID::new("North"));
        assert_eq!(map["EF34GH"], ClusterID::new("South"));
    }

    #[test]
    fn test_read_lookup_from_iter_conflict() {
        let rows = [
            LookupRow {
                reference_code: "AB1 2CD".to_string(),
                cluster: "North".to_string(),
            },
            LookupRow {
                reference_code: "AB12CD".to_string(),
                cluster: "South".to_string(),
            },
        ];
        assert_error!(
            read_lookup_from_iter(rows.into_iter()),
            "Reference code AB12CD maps to both North and South"
        );
    }
}
