//! Fixtures for tests
use crate::id::{CandidateID, ClusterID, DistrictID, ProductID, SupplierID, VehicleType};
use crate::input::RawTables;
use crate::input::candidate::{Candidate, CandidateMap};
use crate::input::demand::DemandTable;
use crate::input::distance::{DistrictDistances, SupplierDistances};
use crate::input::district::DemandPoint;
use crate::input::supplier::{Supplier, SupplierMap};
use crate::input::vehicle::{Vehicle, VehicleTable};
use crate::problem::ProblemData;
use crate::settings::Settings;
use rstest::fixture;
use std::collections::HashMap;

/// Assert that an error with the given message occurs
macro_rules! assert_error {
    ($result:expr, $msg:expr) => {
        assert_eq!(
            $result.unwrap_err().chain().next().unwrap().to_string(),
            $msg
        );
    };
}
pub(crate) use assert_error;

#[fixture]
pub fn points() -> Vec<DemandPoint> {
    vec![
        DemandPoint {
            district: DistrictID(1),
            reference_code: "AB1 2CD".to_string(),
        },
        DemandPoint {
            district: DistrictID(2),
            reference_code: "AB2 3EF".to_string(),
        },
        DemandPoint {
            district: DistrictID(3),
            reference_code: "EF3 4GH".to_string(),
        },
    ]
}

#[fixture]
pub fn lookup() -> HashMap<String, ClusterID> {
    HashMap::from([
        ("AB12CD".to_string(), "North".into()),
        ("AB23EF".to_string(), "North".into()),
        ("EF34GH".to_string(), "South".into()),
    ])
}

#[fixture]
pub fn demand_table() -> DemandTable {
    DemandTable::from_entries_for_test(&[
        ((DistrictID(1), ProductID(1), 1, 1), 6.0),
        ((DistrictID(2), ProductID(1), 1, 1), 4.0),
        ((DistrictID(3), ProductID(1), 1, 1), 5.0),
        ((DistrictID(1), ProductID(1), 2, 1), 8.0),
    ])
}

#[fixture]
pub fn district_distances() -> DistrictDistances {
    DistrictDistances::from_grid_for_test(
        &[1, 2, 3],
        &[
            vec![0.0, 5.0, 9.0],
            vec![5.0, 0.0, 4.0],
            vec![9.0, 4.0, 0.0],
        ],
    )
}

#[fixture]
pub fn supplier_distances() -> SupplierDistances {
    SupplierDistances::from_grid_for_test(&[1], &[1, 2, 3], &[vec![10.0, 20.0, 30.0]])
}

#[fixture]
pub fn suppliers() -> SupplierMap {
    std::iter::once((
        SupplierID(1),
        Supplier {
            id: SupplierID(1),
            capacity: 100.0,
            product_group: ProductID(1),
            vehicle_type: VehicleType(1),
        },
    ))
    .collect()
}

#[fixture]
pub fn candidates() -> CandidateMap {
    [
        Candidate {
            id: CandidateID(1),
            capacity: 50.0,
            setup_cost: 100.0,
            operating_cost: 10.0,
        },
        Candidate {
            id: CandidateID(3),
            capacity: 50.0,
            setup_cost: 120.0,
            operating_cost: 12.0,
        },
    ]
    .into_iter()
    .map(|candidate| (candidate.id, candidate))
    .collect()
}

#[fixture]
pub fn vehicles() -> VehicleTable {
    [(1, 0.2), (3, 0.5)]
        .into_iter()
        .map(|(vehicle_type, rate)| {
            (
                VehicleType(vehicle_type),
                Vehicle {
                    vehicle_type: VehicleType(vehicle_type),
                    capacity: 9.0,
                    cost_per_mile: 1.666,
                    cost_per_mile_tonne: rate,
                    co2_per_mile_tonne: 0.11,
                },
            )
        })
        .collect()
}

#[fixture]
pub fn raw_tables(
    suppliers: SupplierMap,
    candidates: CandidateMap,
    vehicles: VehicleTable,
    points: Vec<DemandPoint>,
    lookup: HashMap<String, ClusterID>,
    demand_table: DemandTable,
    supplier_distances: SupplierDistances,
    district_distances: DistrictDistances,
) -> RawTables {
    RawTables {
        suppliers,
        candidates,
        vehicles,
        points,
        lookup,
        demand: demand_table,
        supplier_distances,
        district_distances,
    }
}

#[fixture]
pub fn problem_data(raw_tables: RawTables) -> ProblemData {
    ProblemData::build(&raw_tables, &Settings::default()).unwrap()
}
