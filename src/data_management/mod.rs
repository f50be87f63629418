/////////////////////////////////////////////////////////////////////////////////////
//
// SIRQD cohort model
//
// data_managment module
//
// functions to read and write from file system
//
////////////////////////////////////////////////////////////////////////////////////

use crate::cohort::{CohortIntegrator, CohortParms, DailyRecord};
use crate::error::ModelError;
use crate::utilities;
use log::info;
use std::fmt;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use yaml_rust::{Yaml, YamlLoader};

pub const PARAMETER_FILE: &str = "parms.yaml";
pub const RESULTS_DIR: &str = "results";
pub const TIME_EVOLUTION_FILE: &str = "time_evolution.dat";
pub const SUMMARY_FILE: &str = "scenario_summary.csv";
const DEFAULT_GENERATION_FILE: &str = "data/time_generation.dat";
const DEFAULT_INCUBATION_FILE: &str = "data/incubation_period.dat";

// -------------------------------- File paths -------------------------------------------------------------
pub struct ModelDataStore {
    model_dir: PathBuf,
    parameter_file: PathBuf,
    results_dir: PathBuf,
}

impl ModelDataStore {
    // create file paths starting at model_root
    // create the results folder if need be - previous results are overwritten file by file
    pub fn new(model_root: &str) -> Result<ModelDataStore, ModelError> {
        let model_dir = PathBuf::from(model_root);
        if !model_dir.is_dir() {
            return Err(ModelError::io(
                &model_dir,
                std::io::Error::new(std::io::ErrorKind::NotFound, "model directory not found"),
            ));
        }
        let parameter_file = model_dir.join(PARAMETER_FILE);
        let results_dir = model_dir.join(RESULTS_DIR);
        fs::create_dir_all(&results_dir).map_err(|e| ModelError::io(&results_dir, e))?;
        info!("model root: {}", model_dir.display());

        Ok(ModelDataStore {
            model_dir,
            parameter_file,
            results_dir,
        })
    }

    pub fn get_model_parms(&self) -> Result<ModelParameters, ModelError> {
        let parm_string = fs::read_to_string(&self.parameter_file)
            .map_err(|e| ModelError::io(&self.parameter_file, e))?;
        let docs = YamlLoader::load_from_str(&parm_string).map_err(|e| ModelError::Yaml {
            path: self.parameter_file.clone(),
            source: e,
        })?;

        // there can be multiple docs in Yaml file.  Only the first one interests us.
        let doc = docs.first().ok_or(ModelError::EmptyParameterFile)?;
        let parms = ModelParameters::from_yaml(doc)?;
        info!(
            "parameters loaded from {} - {}",
            self.parameter_file.display(),
            parms.cohort_parms
        );
        Ok(parms)
    }

    // generation time and incubation period weights, NT+1 values each
    pub fn load_distributions(
        &self,
        parms: &ModelParameters,
    ) -> Result<(Vec<f64>, Vec<f64>), ModelError> {
        let expected = parms.cohort_parms.nt + 1;
        let generation = load_distribution(&self.model_dir.join(&parms.generation_file), expected)?;
        let incubation = load_distribution(&self.model_dir.join(&parms.incubation_file), expected)?;
        info!("distributions loaded - {} values each", expected);
        Ok((generation, incubation))
    }

    fn get_scenario_directory(&self, scenario: &Scenario) -> PathBuf {
        match scenario.variable {
            Some(_) => self
                .results_dir
                .join(format!("scenario_{:04}", scenario.number)),
            None => self.results_dir.clone(),
        }
    }

    // a sweep gets one folder per scenario, a single run writes straight into results
    pub fn create_scenario_directory(&self, scenario: &Scenario) -> Result<PathBuf, ModelError> {
        let dir_full_path = self.get_scenario_directory(scenario);
        fs::create_dir_all(&dir_full_path).map_err(|e| ModelError::io(&dir_full_path, e))?;
        Ok(dir_full_path)
    }

    pub fn summary_file(&self) -> PathBuf {
        self.results_dir.join(SUMMARY_FILE)
    }
}

fn load_distribution(path: &Path, expected: usize) -> Result<Vec<f64>, ModelError> {
    let text = fs::read_to_string(path).map_err(|e| ModelError::io(path, e))?;
    let values = utilities::parse_numbers(&text, path)?;
    if values.len() != expected {
        return Err(ModelError::DistributionLength {
            path: path.to_path_buf(),
            expected,
            found: values.len(),
        });
    }
    Ok(values)
}

// ----------------------------- Scenario parameters -------------------------------------------------------
//
//  Scenario parameters manage a series of runs each differing from the base run by one rate constant
#[derive(Hash, Debug, Copy, Clone, Eq, PartialEq)]
pub enum SensitivityVariable {
    InfectionRate,
    DetectionRate,
    MortalityRate,
    QuarantineExposure,
    QuarantineInfectiousness,
}

impl SensitivityVariable {
    pub fn apply(&self, parms: &mut CohortParms, value: f64) {
        match self {
            SensitivityVariable::InfectionRate => parms.ci = value,
            SensitivityVariable::DetectionRate => parms.cq = value,
            SensitivityVariable::MortalityRate => parms.cd = value,
            SensitivityVariable::QuarantineExposure => parms.hs = value,
            SensitivityVariable::QuarantineInfectiousness => parms.hi = value,
        }
    }
}

impl fmt::Display for SensitivityVariable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let key = match self {
            SensitivityVariable::InfectionRate => "ci",
            SensitivityVariable::DetectionRate => "cq",
            SensitivityVariable::MortalityRate => "cd",
            SensitivityVariable::QuarantineExposure => "hs",
            SensitivityVariable::QuarantineInfectiousness => "hi",
        };
        write!(f, "{}", key)
    }
}

impl FromStr for SensitivityVariable {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<SensitivityVariable, ModelError> {
        match s.to_ascii_lowercase().as_str() {
            "ci" => Ok(SensitivityVariable::InfectionRate),
            "cq" => Ok(SensitivityVariable::DetectionRate),
            "cd" => Ok(SensitivityVariable::MortalityRate),
            "hs" => Ok(SensitivityVariable::QuarantineExposure),
            "hi" => Ok(SensitivityVariable::QuarantineInfectiousness),
            _ => Err(ModelError::UnknownVariable(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    pub number: usize, // 1-based
    pub variable: Option<SensitivityVariable>,
    pub value: Option<f64>,
    pub parms: CohortParms,
}

#[derive(Debug, Clone)]
pub struct ModelParameters {
    pub model_name: String,
    pub model_description: String,
    pub cohort_parms: CohortParms,
    pub generation_file: PathBuf,
    pub incubation_file: PathBuf,
    pub variable: Option<SensitivityVariable>,
    pub value_vector: Vec<f64>,
    current_increment: Option<usize>,
}

impl ModelParameters {
    pub fn new(
        model_name: String,
        model_description: String,
        cohort_parms: CohortParms,
        variable: Option<SensitivityVariable>, // rate constant altered from one run to the next
        value_vector: Vec<f64>,                // values to be tested in each scenario run
    ) -> ModelParameters {
        ModelParameters {
            model_name,
            model_description,
            cohort_parms,
            generation_file: PathBuf::from(DEFAULT_GENERATION_FILE),
            incubation_file: PathBuf::from(DEFAULT_INCUBATION_FILE),
            variable,
            value_vector,
            current_increment: None,
        }
    }

    pub fn from_yaml(doc: &Yaml) -> Result<ModelParameters, ModelError> {
        let model_name = required_str(doc, "model_name")?;
        let model_description = required_str(doc, "model_description")?;

        // parse - cohort parms, anything missing keeps its reference value
        let defaults = CohortParms::default();
        let cp = &doc["cohort_parms"];
        let rp = &doc["rate_parms"];
        let cohort_parms = CohortParms {
            nt: optional_count(cp, "cohort_parms.nt", defaults.nt)?,
            tfin: optional_count(cp, "cohort_parms.tfin", defaults.tfin)?,
            seed: optional_real(cp, "cohort_parms.seed", defaults.seed)?,
            ci: optional_real(rp, "rate_parms.ci", defaults.ci)?,
            cq: optional_real(rp, "rate_parms.cq", defaults.cq)?,
            cd: optional_real(rp, "rate_parms.cd", defaults.cd)?,
            hs: optional_real(rp, "rate_parms.hs", defaults.hs)?,
            hi: optional_real(rp, "rate_parms.hi", defaults.hi)?,
        };

        // parse - Scenario parms, optional
        let sp = &doc["scenario_parms"];
        let (variable, value_vector) = if sp.is_badvalue() {
            (None, Vec::new())
        } else {
            let variable: SensitivityVariable =
                required_str(sp, "scenario_parms.scenario_variable")?.parse()?;
            let values = sp["scenario_values"]
                .as_vec()
                .ok_or_else(|| ModelError::InvalidParameter {
                    key: String::from("scenario_parms.scenario_values"),
                    expected: "a list of numbers",
                })?
                .iter()
                .map(|v| {
                    as_real(v).ok_or_else(|| ModelError::InvalidParameter {
                        key: String::from("scenario_parms.scenario_values"),
                        expected: "a list of numbers",
                    })
                })
                .collect::<Result<Vec<f64>, ModelError>>()?;
            (Some(variable), values)
        };

        let mut parms = ModelParameters::new(
            String::from(model_name),
            String::from(model_description),
            cohort_parms,
            variable,
            value_vector,
        );

        // parse - distribution files
        let df = &doc["distribution_files"];
        if let Some(f) = optional_str(df, "generation_time")? {
            parms.generation_file = PathBuf::from(f);
        }
        if let Some(f) = optional_str(df, "incubation_period")? {
            parms.incubation_file = PathBuf::from(f);
        }
        Ok(parms)
    }

    pub fn scenario_count(&self) -> usize {
        match self.variable {
            Some(_) => self.value_vector.len(),
            None => 1,
        }
    }
}

impl fmt::Display for ModelParameters {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Model name {}\nModel description {}\n{}",
            self.model_name, self.model_description, self.cohort_parms
        )?;
        if let Some(variable) = self.variable {
            write!(
                f,
                "\nSensitivity analysis on {} with values {:?}",
                variable, self.value_vector
            )?;
        }
        Ok(())
    }
}

// the Iterator trait for scenario parameters issues
// a sequence of scenarios each one differing from the base parameters
// by the value of the variable being sensitivity tested
impl Iterator for ModelParameters {
    type Item = Scenario;

    fn next(&mut self) -> Option<Scenario> {
        let increment = match self.current_increment {
            Some(increment) => increment + 1,
            None => 0,
        };
        self.current_increment = Some(increment);

        if increment >= self.scenario_count() {
            return None;
        }

        let mut parms = self.cohort_parms;
        let value = match self.variable {
            Some(variable) => {
                let value = self.value_vector[increment];
                variable.apply(&mut parms, value);
                Some(value)
            }
            None => None,
        };

        Some(Scenario {
            number: increment + 1,
            variable: self.variable,
            value,
            parms,
        })
    }
}

// yaml-rust keeps 2 and 2.0 apart - both are fine for a rate
fn as_real(v: &Yaml) -> Option<f64> {
    match v {
        Yaml::Integer(i) => Some(*i as f64),
        _ => v.as_f64(),
    }
}

fn leaf<'y>(section: &'y Yaml, key: &str) -> &'y Yaml {
    let name = key.rsplit('.').next().unwrap_or(key);
    &section[name]
}

fn required_str<'y>(section: &'y Yaml, key: &str) -> Result<&'y str, ModelError> {
    match leaf(section, key) {
        Yaml::BadValue => Err(ModelError::MissingParameter(String::from(key))),
        v => v.as_str().ok_or_else(|| ModelError::InvalidParameter {
            key: String::from(key),
            expected: "a string",
        }),
    }
}

fn optional_str<'y>(section: &'y Yaml, key: &str) -> Result<Option<&'y str>, ModelError> {
    match leaf(section, key) {
        Yaml::BadValue => Ok(None),
        v => v.as_str().map(Some).ok_or_else(|| ModelError::InvalidParameter {
            key: String::from(key),
            expected: "a string",
        }),
    }
}

fn optional_real(section: &Yaml, key: &str, default: f64) -> Result<f64, ModelError> {
    match leaf(section, key) {
        Yaml::BadValue => Ok(default),
        v => as_real(v).ok_or_else(|| ModelError::InvalidParameter {
            key: String::from(key),
            expected: "a number",
        }),
    }
}

fn optional_count(section: &Yaml, key: &str, default: usize) -> Result<usize, ModelError> {
    match leaf(section, key) {
        Yaml::BadValue => Ok(default),
        Yaml::Integer(i) if *i >= 0 => Ok(*i as usize),
        _ => Err(ModelError::InvalidParameter {
            key: String::from(key),
            expected: "a non-negative integer",
        }),
    }
}

// ----------------------------- Output model results ------------------------------------------------------

/// Destination for the daily records of one run.
pub trait RecordSink {
    fn write_record(&mut self, record: &DailyRecord) -> Result<(), ModelError>;
    fn finish(&mut self) -> Result<(), ModelError>;
}

pub const TIME_EVOLUTION_HEADER: &str = " #  T    D        R        I        Q        S";

// fixed width text table: one header line then one line per day
pub struct TimeEvolutionWriter<W: Write> {
    out: W,
    path: PathBuf,
}

impl TimeEvolutionWriter<BufWriter<File>> {
    // any previous file at path is replaced
    pub fn create(path: &Path) -> Result<Self, ModelError> {
        let file = File::create(path).map_err(|e| ModelError::io(path, e))?;
        TimeEvolutionWriter::new(BufWriter::new(file), path)
    }
}

impl<W: Write> TimeEvolutionWriter<W> {
    pub fn new(mut out: W, path: &Path) -> Result<Self, ModelError> {
        writeln!(out, "{}", TIME_EVOLUTION_HEADER).map_err(|e| ModelError::io(path, e))?;
        Ok(TimeEvolutionWriter {
            out,
            path: path.to_path_buf(),
        })
    }
}

impl<W: Write> RecordSink for TimeEvolutionWriter<W> {
    fn write_record(&mut self, r: &DailyRecord) -> Result<(), ModelError> {
        writeln!(
            self.out,
            "{:4} {:.6} {:.6} {:.6} {:.6} {:.6}",
            r.day, r.dead, r.recovered, r.infected_undetected, r.infected_detected, r.susceptible
        )
        .map_err(|e| ModelError::io(&self.path, e))
    }

    fn finish(&mut self) -> Result<(), ModelError> {
        self.out.flush().map_err(|e| ModelError::io(&self.path, e))
    }
}

// drive the integrator to the end of the horizon, sending every day to the sink
pub fn record_run<S: RecordSink>(
    integrator: CohortIntegrator,
    sink: &mut S,
) -> Result<Vec<DailyRecord>, ModelError> {
    let mut records = Vec::with_capacity(integrator.len());
    for record in integrator {
        sink.write_record(&record)?;
        records.push(record);
    }
    sink.finish()?;
    Ok(records)
}
