//! Code for mapping fine-grained demand points onto coarser clusters.
//!
//! Each demand point belongs to exactly one cluster, found by looking up the point's reference
//! code in an external lookup table. The membership index records, per cluster, the row positions
//! of its member points; those positions are what the distance weight reducer uses to slice the
//! district distance matrix.
use crate::id::{ClusterID, DistrictID};
use crate::input::district::{DemandPoint, normalise_code};
use anyhow::{Result, bail};
use indexmap::IndexMap;
use std::collections::HashMap;

/// The result of assigning every demand point to a cluster.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterAssignments {
    membership: IndexMap<ClusterID, Vec<usize>>,
    cluster_by_district: HashMap<DistrictID, ClusterID>,
    districts: Vec<DistrictID>,
}

impl ClusterAssignments {
    /// Iterate over cluster IDs, in first-seen order.
    pub fn clusters(&self) -> impl Iterator<Item = &ClusterID> {
        self.membership.keys()
    }

    /// The number of clusters.
    pub fn num_clusters(&self) -> usize {
        self.membership.len()
    }

    /// The row positions of a cluster's member points.
    pub fn members(&self, cluster: &ClusterID) -> &[usize] {
        self.membership
            .get(cluster)
            .map_or(&[], |members| members.as_slice())
    }

    /// The district indices of a cluster's member points, in membership order.
    pub fn member_districts(&self, cluster: &ClusterID) -> impl Iterator<Item = DistrictID> {
        self.members(cluster).iter().map(|&row| self.districts[row])
    }

    /// The cluster a district belongs to, if the district is a known demand point.
    pub fn cluster_for(&self, district: DistrictID) -> Option<&ClusterID> {
        self.cluster_by_district.get(&district)
    }
}

/// Assign every demand point to its cluster via the lookup table.
///
/// A point whose reference code has no lookup entry is a fatal error: dropping it would silently
/// understate its cluster's demand.
pub fn assign_clusters(
    points: &[DemandPoint],
    lookup: &HashMap<String, ClusterID>,
) -> Result<ClusterAssignments> {
    let mut membership: IndexMap<ClusterID, Vec<usize>> = IndexMap::new();
    let mut cluster_by_district = HashMap::with_capacity(points.len());
    let mut districts = Vec::with_capacity(points.len());

    for (row, point) in points.iter().enumerate() {
        let code = normalise_code(&point.reference_code);
        let Some(cluster) = lookup.get(&code) else {
            bail!(
                "No cluster entry for reference code '{}' (district {})",
                point.reference_code,
                point.district
            );
        };

        membership.entry(cluster.clone()).or_default().push(row);
        cluster_by_district.insert(point.district, cluster.clone());
        districts.push(point.district);
    }

    Ok(ClusterAssignments {
        membership,
        cluster_by_district,
        districts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{assert_error, points, lookup};
    use rstest::rstest;

    #[rstest]
    fn test_assign_clusters(points: Vec<DemandPoint>, lookup: HashMap<String, ClusterID>) {
        let assignments = assign_clusters(&points, &lookup).unwrap();

        assert_eq!(assignments.num_clusters(), 2);
        assert_eq!(assignments.members(&"North".into()), &[0, 1]);
        assert_eq!(assignments.members(&"South".into()), &[2]);
        assert_eq!(
            assignments.member_districts(&"North".into()).collect::<Vec<_>>(),
            vec![DistrictID(1), DistrictID(2)]
        );
        assert_eq!(
            assignments.cluster_for(DistrictID(3)),
            Some(&ClusterID::new("South"))
        );
        assert_eq!(assignments.cluster_for(DistrictID(4)), None);
    }

    #[rstest]
    fn test_assign_clusters_unmapped(points: Vec<DemandPoint>) {
        let empty = HashMap::new();
        assert_error!(
            assign_clusters(&points, &empty),
            "No cluster entry for reference code 'AB1 2CD' (district 1)"
        );
    }

    #[rstest]
    fn test_members_unknown_cluster_is_empty(
        points: Vec<DemandPoint>,
        lookup: HashMap<String, ClusterID>,
    ) {
        let assignments = assign_clusters(&points, &lookup).unwrap();
        assert!(assignments.members(&"Nowhere".into()).is_empty());
    }
}
