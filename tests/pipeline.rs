//! End-to-end tests: write a small model directory, run the whole pipeline and solve it.
use float_cmp::assert_approx_eq;
use mecwlp::formulation::{
    DETERMINISTIC_SCENARIO, FormulationConfig, formulate_deterministic, formulate_stochastic,
};
use mecwlp::id::{CandidateID, ClusterID, ProductID};
use mecwlp::input::load_tables;
use mecwlp::problem::ProblemData;
use mecwlp::settings::Settings;
use mecwlp::solution::decode;
use mecwlp::solver::{HighsSolver, SolveStatus, Solver};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tempfile::tempdir;

/// Two candidate sites serving one cluster of two districts from a single supplier. Candidate 1
/// is closer to both the supplier and the demand, so it should be the one built.
fn write_model(model_dir: &Path) {
    let write = |name: &str, contents: &str| {
        let mut file = File::create(model_dir.join(name)).unwrap();
        writeln!(file, "{contents}").unwrap();
    };

    write(
        "Suppliers.csv",
        "Supplier,Capacity,Product group,Vehicle type\n1,100,1,1",
    );
    write(
        "Candidates.csv",
        "Candidate,Capacity,Setup cost,Operating cost\n1,50,100,10\n2,50,100,10",
    );
    write(
        "vehicleType.csv",
        "Vehicle type,Capacity,Cost per mile,Cost per mile and tonne,CO2 per mile and tonne\n\
        1,9.0,1.666,0.2,0.11\n\
        3,1.5,1.285,0.5,0.30",
    );
    write(
        "PostcodeDistricts.csv",
        "District ID,Reference PC\n1,AB1 2CD\n2,AB2 3EF",
    );
    write(
        "ClusterLookup.csv",
        "Reference PC,Cluster\nAB12CD,Central\nAB23EF,Central",
    );
    write(
        "DemandPeriods.csv",
        "Customer,Product,Period,Demand\n1,1,1,6\n2,1,1,4\n1,1,2,6\n2,1,2,4",
    );
    write(
        "DemandPeriodScenarios.csv",
        "Customer,Product,Period,Scenario,Demand\n\
        1,1,1,1,6\n2,1,1,1,4\n1,1,2,1,6\n2,1,2,1,4\n\
        1,1,1,2,12\n2,1,1,2,8\n1,1,2,2,12\n2,1,2,2,8",
    );
    write("Distance Supplier-District.csv", "Supplier,1,2\n1,10,50");
    write("Distance District-District.csv", "District,1,2\n1,0,8\n2,8,0");
}

#[test]
fn test_deterministic_run() {
    let dir = tempdir().unwrap();
    write_model(dir.path());

    let settings = Settings::default();
    let raw = load_tables(dir.path(), &settings).unwrap();
    let data = ProblemData::build(&raw, &settings).unwrap();
    let formulation = formulate_deterministic(&data, &FormulationConfig::default());

    let outcome = HighsSolver::default().solve(&formulation.problem).unwrap();
    assert_eq!(outcome.status, SolveStatus::Optimal);

    let plan = decode(&outcome, &formulation, &data).unwrap();

    // The cheaper candidate is built in period 1 and stays open
    let winner = CandidateID(1);
    assert_eq!(plan.build_period(winner), Some(1));
    assert_eq!(plan.build_period(CandidateID(2)), None);
    assert!(plan.is_open(winner, 1));
    assert!(plan.is_open(winner, 2));
    assert_eq!(plan.active_candidates(), vec![winner]);

    // Lifecycle monotonicity over consecutive periods
    for candidate in [CandidateID(1), CandidateID(2)] {
        let open_1 = u32::from(plan.is_open(candidate, 1));
        let open_2 = u32::from(plan.is_open(candidate, 2));
        assert!(open_1 <= open_2);
    }

    // The cluster's demand of 10 is fully covered in each period
    let cluster = ClusterID::new("Central");
    let aggregates = data.scenario(DETERMINISTIC_SCENARIO);
    for period in [1, 2] {
        let demand = aggregates.demand.cluster_total(&cluster, ProductID(1), period);
        assert_approx_eq!(f64, demand, 10.0);

        let fraction: f64 = [CandidateID(1), CandidateID(2)]
            .iter()
            .map(|&candidate| {
                plan.delivered[&(
                    candidate,
                    cluster.clone(),
                    ProductID(1),
                    period,
                    DETERMINISTIC_SCENARIO,
                )]
            })
            .sum();
        assert_approx_eq!(f64, fraction, 1.0, epsilon = 1e-6);
        assert_approx_eq!(f64, fraction * demand, 10.0, epsilon = 1e-5);
    }

    // setup 100 + operating 2*10 + supply 2*10*0.004 + delivery 2*10*0.0032
    assert_approx_eq!(f64, plan.objective, 120.144, epsilon = 1e-6);
    assert_approx_eq!(f64, plan.building_cost, 100.0, epsilon = 1e-6);
    assert_approx_eq!(f64, plan.operating_cost, 20.0, epsilon = 1e-6);
    assert_approx_eq!(f64, plan.mip_gap, 0.0, epsilon = 1e-9);
}

#[test]
fn test_stochastic_run() {
    let dir = tempdir().unwrap();
    write_model(dir.path());

    let settings = Settings {
        scenarios: 2,
        ..Settings::default()
    };
    let raw = load_tables(dir.path(), &settings).unwrap();
    let data = ProblemData::build(&raw, &settings).unwrap();
    assert_eq!(data.scenarios, vec![1, 2]);

    let formulation = formulate_stochastic(&data, &FormulationConfig::default());
    let outcome = HighsSolver::default().solve(&formulation.problem).unwrap();
    assert_eq!(outcome.status, SolveStatus::Optimal);

    let plan = decode(&outcome, &formulation, &data).unwrap();

    // First-stage decisions are scenario-independent: one site, built once
    let winner = CandidateID(1);
    assert_eq!(plan.build_period(winner), Some(1));
    assert_eq!(plan.build_period(CandidateID(2)), None);

    // Each scenario's demand is fully allocated in each period
    let cluster = ClusterID::new("Central");
    for scenario in [1, 2] {
        for period in [1, 2] {
            let fraction: f64 = [CandidateID(1), CandidateID(2)]
                .iter()
                .map(|&candidate| {
                    plan.delivered
                        [&(candidate, cluster.clone(), ProductID(1), period, scenario)]
                })
                .sum();
            assert_approx_eq!(f64, fraction, 1.0, epsilon = 1e-6);
        }
    }

    // Fixed costs 120, plus scenario-averaged variable costs:
    // scenario 1 moves 10 units per period, scenario 2 moves 20
    assert_approx_eq!(f64, plan.objective, 120.216, epsilon = 1e-6);
}

#[test]
fn test_unmapped_point_is_fatal() {
    let dir = tempdir().unwrap();
    write_model(dir.path());

    // Remove district 2's lookup entry
    let mut file = File::create(dir.path().join("ClusterLookup.csv")).unwrap();
    writeln!(file, "Reference PC,Cluster\nAB12CD,Central").unwrap();

    let settings = Settings::default();
    let raw = load_tables(dir.path(), &settings).unwrap();
    let error = ProblemData::build(&raw, &settings).unwrap_err();
    assert_eq!(
        error.chain().next().unwrap().to_string(),
        "No cluster entry for reference code 'AB2 3EF' (district 2)"
    );
}
