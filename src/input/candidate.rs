//! Code for reading the candidate facility sites table.
use super::{input_err_msg, read_csv};
use crate::id::CandidateID;
use anyhow::{Context, Result, ensure};
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::Path;

const CANDIDATES_FILE_NAME: &str = "Candidates.csv";

/// A candidate warehouse site.
///
/// A candidate's index is the index of the district it sits in, so its distances can be looked up
/// directly in the distance matrices.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Candidate {
    /// The candidate's index (a district index)
    #[serde(rename = "Candidate")]
    pub id: CandidateID,
    /// The maximum total stock the site can hold in a period
    #[serde(rename = "Capacity")]
    pub capacity: f64,
    /// One-off cost of building the site
    #[serde(rename = "Setup cost")]
    pub setup_cost: f64,
    /// Per-period cost of operating the site once open
    #[serde(rename = "Operating cost")]
    pub operating_cost: f64,
}

/// A map of candidate sites, keyed by index
pub type CandidateMap = IndexMap<CandidateID, Candidate>;

/// Read the candidates table from the model directory.
pub fn read_candidates(model_dir: &Path) -> Result<CandidateMap> {
    let file_path = model_dir.join(CANDIDATES_FILE_NAME);
    let iter = read_csv(&file_path)?;
    read_candidates_from_iter(iter).with_context(|| input_err_msg(file_path))
}

fn read_candidates_from_iter<I>(iter: I) -> Result<CandidateMap>
where
    I: Iterator<Item = Candidate>,
{
    let mut map = CandidateMap::new();
    for candidate in iter {
        ensure!(
            candidate.capacity.is_finite() && candidate.capacity > 0.0,
            "Candidate {} capacity must be a valid number greater than zero",
            candidate.id
        );
        for (name, value) in [
            ("setup cost", candidate.setup_cost),
            ("operating cost", candidate.operating_cost),
        ] {
            ensure!(
                value.is_finite() && value >= 0.0,
                "Candidate {} {name} must be a valid non-negative number",
                candidate.id
            );
        }

        let id = candidate.id;
        ensure!(
            map.insert(id, candidate).is_none(),
            "Duplicate candidate entry (candidate: {id})"
        );
    }

    ensure!(!map.is_empty(), "Candidates file cannot be empty");

    Ok(map)
}
