use log::{debug, error, info, warn, LevelFilter};
use simple_logger::SimpleLogger;
use sirqd::data_management::{self, Scenario, TimeEvolutionWriter, TIME_EVOLUTION_FILE};
use sirqd::stats::{RunSummary, ScenarioLog};
use sirqd::{CohortIntegrator, DailyRecord, ModelError};
use std::env;
use std::process;

const MASS_DRIFT_WARNING: f64 = 1e-9;

fn main() {
    if let Err(e) = SimpleLogger::new()
        .with_level(LevelFilter::Info)
        .env()
        .init()
    {
        eprintln!("Could not start logger - {}", e);
    }

    if let Err(e) = run() {
        error!("{}", e);
        process::exit(1);
    }
}

fn run() -> Result<(), ModelError> {
    // process command line arguments (for now just the model root directory location)
    let model_root = env::args().nth(1).ok_or(ModelError::Usage)?;

    // The model data store handles all models inputs and outputs
    let model_data_store = data_management::ModelDataStore::new(&model_root)?;
    let model_parms = model_data_store.get_model_parms()?;
    let (generation, incubation) = model_data_store.load_distributions(&model_parms)?;

    info!("--------------------SIRQD Model-----------------------");
    for line in model_parms.to_string().lines() {
        info!("{}", line);
    }
    info!(
        "Model runs {} scenarios of {} days",
        model_parms.scenario_count(),
        model_parms.cohort_parms.tfin + 1
    );

    let summary_log = ScenarioLog::new(&model_data_store.summary_file())?;

    // loop around scenarios
    for scenario in model_parms {
        info!("Starting scenario {} - {}", scenario.number, scenario.parms);
        let scenario_dir = model_data_store.create_scenario_directory(&scenario)?;
        let output_path = scenario_dir.join(TIME_EVOLUTION_FILE);

        let mut sink = TimeEvolutionWriter::create(&output_path)?;
        let integrator = CohortIntegrator::new(scenario.parms, &generation, &incubation);
        let records = data_management::record_run(integrator, &mut sink)?;
        info!("Scenario {} written to {}", scenario.number, output_path.display());

        let summary = RunSummary::new(&scenario, &records);
        check_run(&scenario, &summary, &records);
        summary_log.append(&summary)?;
    }

    info!("Scenario summary written to {}", summary_log.file_path().display());
    Ok(())
}

// observations only - the records are never altered
fn check_run(scenario: &Scenario, summary: &RunSummary, records: &[DailyRecord]) {
    debug!(
        "Scenario {} - max mass drift {:e}",
        scenario.number, summary.max_mass_drift
    );
    if summary.max_mass_drift > MASS_DRIFT_WARNING {
        warn!(
            "Scenario {} - population fractions drift from 1 by up to {:e}",
            scenario.number, summary.max_mass_drift
        );
    }
    if let Some(r) = records.iter().find(|r| r.susceptible < 0.0) {
        warn!(
            "Scenario {} - susceptible fraction is negative from day {}",
            scenario.number, r.day
        );
    }
}
