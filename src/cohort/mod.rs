/////////////////////////////////////////////////////////////////////////////////////
//
// SIRQD cohort model
//
// cohort module
//
// infected people are tracked by days since infection in two parallel tracks:
// undetected (I) and quarantined (Q).  The population fractions S, R and D
// are plain scalars.
//
// In each day - the oldest cohort dies or recovers, every cohort ages by one day,
// new infections enter at age 0, and part of each undetected cohort is detected
//
////////////////////////////////////////////////////////////////////////////////////

use crate::utilities;
use std::fmt;

// Parameters --------------------------------------------------------------------------------------

/// Fixed constants of one run.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CohortParms {
    pub nt: usize,   // oldest cohort age (days)
    pub tfin: usize, // last simulated day
    pub ci: f64,     // infection rate
    pub cq: f64,     // detection rate multiplier
    pub cd: f64,     // mortality of a retiring cohort
    pub hs: f64,     // relative exposure to quarantined people
    pub hi: f64,     // relative infectiousness of quarantined people
    pub seed: f64,   // initial infected fraction, placed in I[0]
}

impl Default for CohortParms {
    fn default() -> CohortParms {
        CohortParms {
            nt: 20,
            tfin: 200,
            ci: 2.5,
            cq: 0.5,
            cd: 0.01,
            hs: 0.1,
            hi: 0.5,
            seed: 1.0e-6,
        }
    }
}

impl fmt::Display for CohortParms {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "NT {} TFIN {} CI {} CQ {} CD {} HS {} HI {} seed {:e}",
            self.nt, self.tfin, self.ci, self.cq, self.cd, self.hs, self.hi, self.seed
        )
    }
}

// Daily record ------------------------------------------------------------------------------------
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DailyRecord {
    pub day: usize,
    pub dead: f64,
    pub recovered: f64,
    pub infected_undetected: f64,
    pub infected_detected: f64,
    pub susceptible: f64,
}

impl DailyRecord {
    // should stay within rounding of 1.0
    pub fn total_mass(&self) -> f64 {
        self.susceptible
            + self.recovered
            + self.dead
            + self.infected_undetected
            + self.infected_detected
    }

    pub fn infected(&self) -> f64 {
        self.infected_undetected + self.infected_detected
    }
}

// Integrator --------------------------------------------------------------------------------------

/// Steps the cohort model one day at a time.
///
/// The integrator is an iterator yielding exactly `tfin + 1` records, days `0..=tfin`.
/// Nothing is validated: negative or NaN weights flow through to the records,
/// and `S` is allowed to go negative when the force of infection is large.
#[derive(Debug, Clone)]
pub struct CohortIntegrator<'a> {
    parms: CohortParms,
    generation: &'a [f64],
    incubation: &'a [f64],
    infected: Vec<f64>,
    quarantined: Vec<f64>,
    susceptible: f64,
    recovered: f64,
    dead: f64,
    next_day: usize,
}

impl<'a> CohortIntegrator<'a> {
    pub fn new(
        parms: CohortParms,
        generation: &'a [f64],
        incubation: &'a [f64],
    ) -> CohortIntegrator<'a> {
        let cohort_count = parms.nt + 1;
        assert_eq!(
            generation.len(),
            cohort_count,
            "Generation time distribution must have NT+1 values"
        );
        assert_eq!(
            incubation.len(),
            cohort_count,
            "Incubation distribution must have NT+1 values"
        );

        let mut infected = vec![0.0; cohort_count];
        infected[0] = parms.seed;

        CohortIntegrator {
            parms,
            generation,
            incubation,
            infected,
            quarantined: vec![0.0; cohort_count],
            susceptible: 1.0 - parms.seed,
            recovered: 0.0,
            dead: 0.0,
            next_day: 0,
        }
    }

    /// Undetected and quarantined cohorts, indexed by age in days.
    pub fn cohorts(&self) -> (&[f64], &[f64]) {
        (&self.infected, &self.quarantined)
    }

    // one full day - the order of the sub-steps matters
    fn advance(&mut self) -> DailyRecord {
        let nt = self.parms.nt;
        let CohortParms {
            ci, cq, cd, hs, hi, ..
        } = self.parms;

        // the oldest cohort leaves - dead or recovered
        let oldest_infected = self.infected[nt];
        let oldest_quarantined = self.quarantined[nt];
        self.dead += (oldest_infected + hi * oldest_quarantined) * cd;
        self.recovered += oldest_infected * (1.0 - cd) + oldest_quarantined * (1.0 - cd * hi);

        // everybody gets one day older, slot NT is overwritten
        self.infected.copy_within(0..nt, 1);
        self.quarantined.copy_within(0..nt, 1);

        // new infections from the aged cohorts
        let force: f64 = self
            .generation
            .iter()
            .zip(self.infected.iter().zip(self.quarantined.iter()))
            .map(|(g, (i, q))| g * (i + hs * q))
            .sum();
        let new_infected = self.susceptible * ci * force;
        self.infected[0] = new_infected;
        self.quarantined[0] = 0.0;
        self.susceptible -= new_infected;

        // detection moves people from I to Q
        for ((i, q), p) in self
            .infected
            .iter_mut()
            .zip(self.quarantined.iter_mut())
            .zip(self.incubation.iter())
        {
            let moved = *i * detection_rate(*p, cq);
            *i -= moved;
            *q += moved;
        }

        DailyRecord {
            day: self.next_day,
            dead: self.dead,
            recovered: self.recovered,
            infected_undetected: utilities::cohort_sum(&self.infected),
            infected_detected: utilities::cohort_sum(&self.quarantined),
            susceptible: self.susceptible,
        }
    }
}

impl<'a> Iterator for CohortIntegrator<'a> {
    type Item = DailyRecord;

    fn next(&mut self) -> Option<DailyRecord> {
        if self.next_day > self.parms.tfin {
            return None;
        }
        let record = self.advance();
        self.next_day += 1;
        Some(record)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.parms.tfin + 1).saturating_sub(self.next_day);
        (remaining, Some(remaining))
    }
}

impl<'a> ExactSizeIterator for CohortIntegrator<'a> {}

// fraction of a cohort detected in one day, never more than the whole cohort
// a NaN weight is passed through rather than clamped
fn detection_rate(incubation_weight: f64, cq: f64) -> f64 {
    let rate = incubation_weight * cq;
    if rate > 1.0 {
        1.0
    } else {
        rate
    }
}

/// Runs a whole horizon and keeps every record.
pub fn run(parms: CohortParms, generation: &[f64], incubation: &[f64]) -> Vec<DailyRecord> {
    CohortIntegrator::new(parms, generation, incubation).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const SEED: f64 = 1.0e-6;

    fn zeros(parms: &CohortParms) -> Vec<f64> {
        vec![0.0; parms.nt + 1]
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= 1e-15,
            "expected {:e}, got {:e}",
            expected, actual
        );
    }

    #[test]
    fn emits_one_record_per_day() {
        let parms = CohortParms::default();
        let g = zeros(&parms);
        let p = zeros(&parms);
        let records = run(parms, &g, &p);
        assert_eq!(records.len(), parms.tfin + 1);
        for (expected_day, r) in records.iter().enumerate() {
            assert_eq!(r.day, expected_day);
        }
    }

    #[test]
    fn size_hint_counts_down() {
        let parms = CohortParms {
            tfin: 3,
            ..CohortParms::default()
        };
        let g = zeros(&parms);
        let p = zeros(&parms);
        let mut integrator = CohortIntegrator::new(parms, &g, &p);
        assert_eq!(integrator.len(), 4);
        integrator.next();
        assert_eq!(integrator.len(), 3);
        assert_eq!(integrator.by_ref().count(), 3);
        assert!(integrator.next().is_none());
    }

    #[test]
    fn first_day_with_single_generation_weight() {
        let parms = CohortParms::default();
        let mut g = zeros(&parms);
        g[1] = 1.0;
        let p = zeros(&parms);

        let first = run(parms, &g, &p)[0];

        // the seed aged into I[1]; it infects S * CI * seed into I[0]
        let new_infected = (1.0 - SEED) * parms.ci * SEED;
        assert_eq!(first.day, 0);
        assert_eq!(first.dead, 0.0);
        assert_eq!(first.recovered, 0.0);
        assert_eq!(first.infected_detected, 0.0);
        assert_close(first.infected_undetected, SEED + new_infected);
        assert_close(first.susceptible, 1.0 - SEED - new_infected);
    }

    #[test]
    fn seed_ages_out_without_transmission() {
        let parms = CohortParms::default();
        let g = zeros(&parms);
        let p = zeros(&parms);
        let records = run(parms, &g, &p);

        // the seed sits in I[1] after day 0 and reaches I[NT] on day NT-1
        for r in &records[..parms.nt] {
            assert_eq!(r.infected_undetected, SEED);
            assert_eq!(r.dead + r.recovered, 0.0);
        }
        for r in &records[parms.nt..] {
            assert_eq!(r.infected_undetected, 0.0);
            assert_eq!(r.infected_detected, 0.0);
            assert_close(r.dead + r.recovered, SEED);
            assert_close(r.dead, SEED * parms.cd);
        }
        assert_eq!(records[parms.tfin].susceptible, 1.0 - SEED);
    }

    #[test]
    fn quarantined_cohort_retires_with_reduced_mortality() {
        let parms = CohortParms {
            cq: 1.0,
            ..CohortParms::default()
        };
        let g = zeros(&parms);
        let p = vec![1.0; parms.nt + 1];
        let records = run(parms, &g, &p);

        // everyone is detected on day 0
        assert_eq!(records[0].infected_undetected, 0.0);
        assert_eq!(records[0].infected_detected, SEED);

        let last = records[parms.tfin];
        assert_close(last.dead, parms.hi * SEED * parms.cd);
        assert_close(last.recovered, SEED * (1.0 - parms.cd * parms.hi));
    }

    #[test]
    fn detection_is_clamped_to_whole_cohort() {
        let parms = CohortParms {
            cq: 1.0e6,
            tfin: 0,
            ..CohortParms::default()
        };
        let g = zeros(&parms);
        let p = vec![0.5; parms.nt + 1];
        let mut integrator = CohortIntegrator::new(parms, &g, &p);
        integrator.next();

        let (infected, quarantined) = integrator.cohorts();
        assert!(infected.iter().all(|&i| i == 0.0));
        assert_eq!(quarantined[1], SEED);
    }

    #[test]
    fn detection_rate_saturates_at_one() {
        assert_eq!(detection_rate(0.2, 0.5), 0.1);
        assert_eq!(detection_rate(3.0, 0.5), 1.0);
        assert!(detection_rate(f64::NAN, 0.5).is_nan());
    }

    #[test]
    fn nan_weights_propagate() {
        let parms = CohortParms::default();
        let mut g = zeros(&parms);
        g[3] = f64::NAN;
        let p = zeros(&parms);
        let records = run(parms, &g, &p);
        assert!(records[0].susceptible.is_nan());
        assert!(records[parms.tfin].infected_undetected.is_nan());
    }

    #[test]
    fn susceptible_can_go_negative() {
        let parms = CohortParms {
            ci: 1.0e9,
            seed: 0.01,
            ..CohortParms::default()
        };
        let mut g = zeros(&parms);
        g[1] = 1.0;
        let p = zeros(&parms);
        let records = run(parms, &g, &p);
        assert!(records[0].susceptible < 0.0);
    }

    #[test]
    fn runs_are_repeatable() {
        let parms = CohortParms::default();
        let g: Vec<f64> = (0..=parms.nt).map(|k| (k as f64 * 0.3).sin().abs() / 10.0).collect();
        let p: Vec<f64> = (0..=parms.nt).map(|k| k as f64 / 40.0).collect();
        assert_eq!(run(parms, &g, &p), run(parms, &g, &p));
    }

    #[test]
    #[should_panic(expected = "NT+1")]
    fn rejects_short_distribution() {
        let parms = CohortParms::default();
        let g = vec![0.0; parms.nt];
        let p = zeros(&parms);
        CohortIntegrator::new(parms, &g, &p);
    }

    fn weights() -> impl Strategy<Value = Vec<f64>> {
        prop::collection::vec(0.0..0.3f64, 21)
    }

    proptest! {
        #[test]
        fn mass_is_conserved(g in weights(), p in weights(), ci in 0.0..3.0f64) {
            let parms = CohortParms { ci, ..CohortParms::default() };
            for r in run(parms, &g, &p) {
                prop_assert!(r.susceptible >= 0.0);
                prop_assert!((r.total_mass() - 1.0).abs() < 1e-9, "day {} mass {}", r.day, r.total_mass());
            }
        }

        #[test]
        fn recovered_and_dead_never_decrease(g in weights(), p in weights()) {
            let records = run(CohortParms::default(), &g, &p);
            for pair in records.windows(2) {
                prop_assert!(pair[1].recovered >= pair[0].recovered);
                prop_assert!(pair[1].dead >= pair[0].dead);
            }
        }

        #[test]
        fn cohorts_stay_non_negative(g in weights(), p in weights(), cq in 0.0..10.0f64) {
            let parms = CohortParms { cq, ..CohortParms::default() };
            let mut integrator = CohortIntegrator::new(parms, &g, &p);
            while integrator.next().is_some() {
                let (infected, quarantined) = integrator.cohorts();
                prop_assert!(infected.iter().all(|&i| i >= 0.0));
                prop_assert!(quarantined.iter().all(|&q| q >= 0.0));
            }
        }

        #[test]
        fn same_inputs_same_records(g in weights(), p in weights()) {
            let parms = CohortParms::default();
            prop_assert_eq!(run(parms, &g, &p), run(parms, &g, &p));
        }
    }
}
