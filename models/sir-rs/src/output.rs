use serde::Serialize;

use crate::model::{Compartment, StateVector};

pub const CSV_HEADERS: [&str; 5] = ["time", "S", "I", "R", "C"];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trajectory {
    pub times: Vec<f64>,
    pub states: Vec<StateVector>,
    /// Number of right-hand side evaluations the integrator performed.
    pub evaluations: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Summary {
    pub peak_time: f64,
    pub peak_infected: f64,
    pub final_susceptible: f64,
    pub final_cumulative_incidence: f64,
}

impl Trajectory {
    pub fn new(times: Vec<f64>, states: Vec<StateVector>, evaluations: u32) -> Trajectory {
        Trajectory {
            times,
            states,
            evaluations,
        }
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn rows(&self) -> Vec<Vec<String>> {
        self.times
            .iter()
            .zip(&self.states)
            .map(|(time, state)| {
                std::iter::once(time)
                    .chain(state.iter())
                    .map(|value| value.to_string())
                    .collect()
            })
            .collect()
    }

    pub fn summary(&self) -> Option<Summary> {
        let infected = Compartment::Infected.index();
        let (peak_time, peak_state) = self
            .times
            .iter()
            .zip(&self.states)
            .max_by(|(_, a), (_, b)| a[infected].total_cmp(&b[infected]))?;
        let last = self.states.last()?;
        Some(Summary {
            peak_time: *peak_time,
            peak_infected: peak_state[infected],
            final_susceptible: last[Compartment::Susceptible.index()],
            final_cumulative_incidence: last[Compartment::CumulativeIncidence.index()],
        })
    }
}
