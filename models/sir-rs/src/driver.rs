//! Runs a [`SirModel`] through an `ode_solvers` integrator.

use log::{debug, warn};
use ode_solvers::{Dopri5, Rk4};
use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::model::{OdeState, SirModel, StateVector, check_population};
use crate::output::Trajectory;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InitialState {
    pub susceptible: f64,
    pub infected: f64,
    #[serde(default)]
    pub recovered: f64,
    #[serde(default)]
    pub cumulative_incidence: f64,
}

impl InitialState {
    pub fn to_vector(&self) -> StateVector {
        [
            self.susceptible,
            self.infected,
            self.recovered,
            self.cumulative_incidence,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Method {
    /// Fixed-step classic Runge-Kutta; `step` is the integration step.
    #[default]
    Rk4,
    /// Adaptive Dormand-Prince 5(4); `step` is the output spacing.
    Dopri5 { abs_tol: f64, rel_tol: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub initial_state: InitialState,
    #[serde(default)]
    pub t_start: f64,
    pub t_end: f64,
    #[serde(default = "default_step")]
    pub step: f64,
    #[serde(default)]
    pub method: Method,
}

/// Upper bound on `(t_end - t_start) / step`, the number of samples the
/// integrator preallocates for.
pub const MAX_SAMPLES: f64 = 10_000_000.0;

fn default_step() -> f64 {
    1.0
}

impl RunConfig {
    pub fn validate(&self) -> Result<(), ModelError> {
        if !self.t_start.is_finite() || !self.t_end.is_finite() || self.t_end <= self.t_start {
            return Err(ModelError::InvalidRun(format!(
                "time span [{}, {}] is empty or not finite",
                self.t_start, self.t_end
            )));
        }
        if !self.step.is_finite() || self.step <= 0.0 {
            return Err(ModelError::InvalidRun(format!(
                "step must be positive, got {}",
                self.step
            )));
        }
        let samples = ((self.t_end - self.t_start) / self.step).ceil();
        if !samples.is_finite() || samples > MAX_SAMPLES {
            return Err(ModelError::InvalidRun(format!(
                "span [{}, {}] with step {} needs {samples} samples, at most {MAX_SAMPLES} allowed",
                self.t_start, self.t_end, self.step
            )));
        }
        if let Method::Dopri5 { abs_tol, rel_tol } = self.method
            && !(abs_tol > 0.0 && rel_tol > 0.0)
        {
            return Err(ModelError::InvalidRun(format!(
                "tolerances must be positive, got abs_tol = {abs_tol}, rel_tol = {rel_tol}"
            )));
        }
        let state = self.initial_state.to_vector();
        if let Some(value) = state.iter().find(|v| !v.is_finite() || **v < 0.0) {
            return Err(ModelError::InvalidRun(format!(
                "initial compartments must be finite and non-negative, got {value}"
            )));
        }
        check_population(&state)
    }
}

pub fn simulate(model: &SirModel, config: &RunConfig) -> Result<Trajectory, ModelError> {
    config.validate()?;
    if config.initial_state.infected == 0.0 {
        warn!("no initial infections, the run stays at the disease-free equilibrium");
    }

    let y0 = OdeState::from(config.initial_state.to_vector());
    let (stats, x_out, y_out) = match config.method {
        Method::Rk4 => {
            let mut stepper = Rk4::new(*model, config.t_start, y0, config.t_end, config.step);
            let stats = stepper
                .integrate()
                .map_err(|err| ModelError::Integration(format!("{err:?}")))?;
            (stats, stepper.x_out().clone(), stepper.y_out().clone())
        }
        Method::Dopri5 { abs_tol, rel_tol } => {
            let mut stepper = Dopri5::new(
                *model,
                config.t_start,
                config.t_end,
                config.step,
                y0,
                rel_tol,
                abs_tol,
            );
            let stats = stepper
                .integrate()
                .map_err(|err| ModelError::Integration(format!("{err:?}")))?;
            (stats, stepper.x_out().clone(), stepper.y_out().clone())
        }
    };
    debug!(
        "{:?}: {} samples, {} evaluations, {} accepted steps",
        config.method,
        x_out.len(),
        stats.num_eval,
        stats.accepted_steps
    );

    let states: Vec<StateVector> = y_out.into_iter().map(Into::into).collect();
    if let Some(time) = x_out
        .iter()
        .zip(&states)
        .find(|(_, state)| state.iter().any(|v| !v.is_finite()))
        .map(|(time, _)| *time)
    {
        return Err(ModelError::NonFiniteState { time });
    }

    Ok(Trajectory::new(x_out, states, stats.num_eval))
}
