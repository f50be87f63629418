/////////////////////////////////////////////////////////////////////////////////////
//
// SIRQD cohort model
//
// utilities module
//
// various functions that can be of use across the app
//
////////////////////////////////////////////////////////////////////////////////////

use crate::error::ModelError;
use std::path::Path;

// sum in age order, starting from +0.0 so an empty track prints as 0.000000
pub fn cohort_sum(cohorts: &[f64]) -> f64 {
    let mut total = 0.0;
    for c in cohorts {
        total += c;
    }
    total
}

// read every whitespace separated number in a .dat text
// lines starting with '#' are comments
pub fn parse_numbers(text: &str, source: &Path) -> Result<Vec<f64>, ModelError> {
    let mut values: Vec<f64> = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.starts_with('#') {
            continue;
        }
        for token in line.split_whitespace() {
            let value = parse_real(token).ok_or_else(|| ModelError::InvalidNumber {
                path: source.to_path_buf(),
                line: index + 1,
                token: token.to_string(),
            })?;
            values.push(value);
        }
    }
    Ok(values)
}

// Fortran style exponents (1.0D-3) show up in hand made distribution files
fn parse_real(token: &str) -> Option<f64> {
    match token.parse::<f64>() {
        Ok(v) => Some(v),
        Err(_) => token.replace(|c| c == 'd' || c == 'D', "e").parse().ok(),
    }
}
