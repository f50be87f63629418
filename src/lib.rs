/////////////////////////////////////////////////////////////////////////////////////
//
// SIRQD cohort model
//
// Susceptible - Infected - Quarantined - Recovered - Dead epidemic model with
// infected people tracked by days since infection
//
////////////////////////////////////////////////////////////////////////////////////

pub mod cohort;
pub mod data_management;
pub mod error;
pub mod stats;
pub mod utilities;

pub use cohort::{run, CohortIntegrator, CohortParms, DailyRecord};
pub use error::ModelError;
