//! The module responsible for writing output data to disk.
use crate::id::{CandidateID, Period};
use crate::solution::PlanSummary;
use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// The root folder in which model-specific output folders will be created
const OUTPUT_DIRECTORY_ROOT: &str = "mecwlp_results";

/// The output file name for the build schedule
const BUILD_FILE_NAME: &str = "build.csv";

/// The output file name for the open schedule
const OPEN_FILE_NAME: &str = "open.csv";

/// The output file name for the run summary
const SUMMARY_FILE_NAME: &str = "run_summary.csv";

/// Indicator value above which a relaxed binary is read as set
const BINARY_TOLERANCE: f64 = 0.5;

/// Get the output directory for the model at the specified directory path
pub fn get_output_dir(model_dir: &Path) -> Result<PathBuf> {
    // Canonicalise in case the user has specified "."
    let model_dir = model_dir
        .canonicalize()
        .context("Could not resolve path to model")?;

    let model_name = model_dir
        .file_name()
        .context("Model cannot be in root folder")?
        .to_str()
        .context("Invalid chars in model dir name")?;

    Ok([OUTPUT_DIRECTORY_ROOT, model_name].iter().collect())
}

/// Create a new output directory for the model specified at `model_dir`.
pub fn create_output_directory(output_dir: &Path) -> Result<()> {
    if output_dir.is_dir() {
        // already exists
        return Ok(());
    }

    fs::create_dir_all(output_dir)?;

    Ok(())
}

/// Represents the row of the run summary CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct SummaryRow {
    number_of_scenarios: u32,
    objective: f64,
    operating_costs: f64,
    building_costs: f64,
    run_time_seconds: f64,
}

/// An object for writing the solved plan to file
pub struct DataWriter {
    build_writer: csv::Writer<File>,
    open_writer: csv::Writer<File>,
    summary_writer: csv::Writer<File>,
}

impl DataWriter {
    /// Open CSV files to write output data to
    ///
    /// # Arguments
    ///
    /// * `output_path` - Folder where files will be saved
    pub fn create(output_path: &Path) -> Result<Self> {
        let new_writer = |file_name| {
            let file_path = output_path.join(file_name);
            csv::Writer::from_path(file_path)
        };

        Ok(Self {
            build_writer: new_writer(BUILD_FILE_NAME)?,
            open_writer: new_writer(OPEN_FILE_NAME)?,
            summary_writer: new_writer(SUMMARY_FILE_NAME)?,
        })
    }

    /// Write the build and open schedules as wide tables.
    ///
    /// Columns are periods; only candidates with nonzero activity get a row.
    pub fn write_schedules(&mut self, plan: &PlanSummary, periods: &[Period]) -> Result<()> {
        write_indicator_table(&mut self.build_writer, &plan.build, periods)?;
        write_indicator_table(&mut self.open_writer, &plan.open, periods)?;

        Ok(())
    }

    /// Write the run summary row.
    pub fn write_summary(
        &mut self,
        scenario_count: u32,
        plan: &PlanSummary,
        run_time: Duration,
    ) -> Result<()> {
        self.summary_writer.serialize(SummaryRow {
            number_of_scenarios: scenario_count,
            objective: plan.objective,
            operating_costs: plan.operating_cost,
            building_costs: plan.building_cost,
            run_time_seconds: run_time.as_secs_f64(),
        })?;

        Ok(())
    }

    /// Flush the underlying streams
    pub fn flush(&mut self) -> Result<()> {
        self.build_writer.flush()?;
        self.open_writer.flush()?;
        self.summary_writer.flush()?;

        Ok(())
    }
}

/// Write one indicator map as a wide candidate-by-period table.
fn write_indicator_table(
    writer: &mut csv::Writer<File>,
    values: &IndexMap<(CandidateID, Period), f64>,
    periods: &[Period],
) -> Result<()> {
    let mut header = vec!["Candidate".to_string()];
    header.extend(periods.iter().map(ToString::to_string));
    writer.write_record(&header)?;

    // Candidates in declaration order
    let mut candidates = Vec::new();
    for &(candidate, _) in values.keys() {
        if !candidates.contains(&candidate) {
            candidates.push(candidate);
        }
    }

    for candidate in candidates {
        let row: Vec<f64> = periods
            .iter()
            .map(|&period| *values.get(&(candidate, period)).unwrap_or(&0.0))
            .collect();
        if !row.iter().any(|&value| value > BINARY_TOLERANCE) {
            continue;
        }

        let mut record = vec![candidate.to_string()];
        record.extend(
            row.iter()
                .map(|&value| (if value > BINARY_TOLERANCE { "1" } else { "0" }).to_string()),
        );
        writer.write_record(&record)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::SolveStatus;
    use indexmap::indexmap;
    use tempfile::tempdir;

    fn plan() -> PlanSummary {
        PlanSummary {
            status: SolveStatus::Optimal,
            objective: 110.0,
            mip_gap: 0.0,
            operating_cost: 10.0,
            building_cost: 100.0,
            build: indexmap! {
                (CandidateID(1), 1) => 1.0,
                (CandidateID(1), 2) => 0.0,
                (CandidateID(2), 1) => 0.0,
                (CandidateID(2), 2) => 0.0,
            },
            open: indexmap! {
                (CandidateID(1), 1) => 1.0,
                (CandidateID(1), 2) => 1.0,
                (CandidateID(2), 1) => 0.0,
                (CandidateID(2), 2) => 0.0,
            },
            supply: IndexMap::new(),
            delivered: IndexMap::new(),
        }
    }

    #[test]
    fn test_write_schedules() {
        let dir = tempdir().unwrap();

        {
            let mut writer = DataWriter::create(dir.path()).unwrap();
            writer.write_schedules(&plan(), &[1, 2]).unwrap();
            writer.flush().unwrap();
        }

        // Only candidate 1 has activity
        let build = fs::read_to_string(dir.path().join(BUILD_FILE_NAME)).unwrap();
        assert_eq!(build, "Candidate,1,2\n1,1,0\n");
        let open = fs::read_to_string(dir.path().join(OPEN_FILE_NAME)).unwrap();
        assert_eq!(open, "Candidate,1,2\n1,1,1\n");
    }

    #[test]
    fn test_write_summary() {
        let dir = tempdir().unwrap();

        {
            let mut writer = DataWriter::create(dir.path()).unwrap();
            writer
                .write_summary(1, &plan(), Duration::from_millis(1500))
                .unwrap();
            writer.flush().unwrap();
        }

        let records: Vec<SummaryRow> =
            csv::Reader::from_path(dir.path().join(SUMMARY_FILE_NAME))
                .unwrap()
                .into_deserialize()
                .collect::<Result<_, _>>()
                .unwrap();
        assert_eq!(
            records,
            vec![SummaryRow {
                number_of_scenarios: 1,
                objective: 110.0,
                operating_costs: 10.0,
                building_costs: 100.0,
                run_time_seconds: 1.5,
            }]
        );
    }
}
