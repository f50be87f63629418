/////////////////////////////////////////////////////////////////////////////////////
//
// SIRQD cohort model
//
// stats module
//
// calculates statistics
//
////////////////////////////////////////////////////////////////////////////////////
use crate::cohort::DailyRecord;
use crate::data_management::Scenario;
use crate::error::ModelError;
use csv::{Writer, WriterBuilder};
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

// one row of the scenario summary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub scenario: usize,
    pub variable: String,
    pub value: Option<f64>,
    pub peak_day: usize,
    pub peak_infected: f64,
    pub final_susceptible: f64,
    pub final_recovered: f64,
    pub final_dead: f64,
    pub attack_rate: f64,
    pub max_mass_drift: f64,
}

impl RunSummary {
    pub fn new(scenario: &Scenario, records: &[DailyRecord]) -> RunSummary {
        let mut peak_day = 0;
        let mut peak_infected = f64::NEG_INFINITY;
        let mut max_mass_drift: f64 = 0.0;
        for r in records {
            // first day wins ties
            if r.infected() > peak_infected {
                peak_day = r.day;
                peak_infected = r.infected();
            }
            max_mass_drift = max_mass_drift.max((r.total_mass() - 1.0).abs());
        }

        let (final_susceptible, final_recovered, final_dead) = match records.last() {
            Some(r) => (r.susceptible, r.recovered, r.dead),
            None => (0.0, 0.0, 0.0),
        };
        if records.is_empty() {
            peak_infected = 0.0;
        }

        RunSummary {
            scenario: scenario.number,
            variable: scenario
                .variable
                .map(|v| v.to_string())
                .unwrap_or_default(),
            value: scenario.value,
            peak_day,
            peak_infected,
            final_susceptible,
            final_recovered,
            final_dead,
            attack_rate: 1.0 - final_susceptible,
            max_mass_drift,
        }
    }
}

pub struct ScenarioLog {
    file_path: PathBuf,
}

impl ScenarioLog {
    // create (or replace) the summary file and write its header
    pub fn new(file_path: &Path) -> Result<ScenarioLog, ModelError> {
        let mut wtr = Writer::from_path(file_path)?;
        wtr.write_record(&[
            "scenario",
            "variable",
            "value",
            "peak_day",
            "peak_infected",
            "final_susceptible",
            "final_recovered",
            "final_dead",
            "attack_rate",
            "max_mass_drift",
        ])?;
        wtr.flush().map_err(|e| ModelError::io(file_path, e))?;
        Ok(ScenarioLog {
            file_path: file_path.to_path_buf(),
        })
    }

    pub fn append(&self, summary: &RunSummary) -> Result<(), ModelError> {
        let file: File = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.file_path)
            .map_err(|e| ModelError::io(&self.file_path, e))?;
        let mut wtr = WriterBuilder::new().has_headers(false).from_writer(file);
        wtr.serialize(summary)?;
        wtr.flush().map_err(|e| ModelError::io(&self.file_path, e))?;
        Ok(())
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }
}
