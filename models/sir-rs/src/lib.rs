//! SIR compartmental model with a cumulative-incidence accumulator, written as
//! a right-hand side for external ODE integrators.
//!
//! The model exposes two operations: [`SirModel::initialize`], which asks the
//! host to populate the `{iota, rho}` parameter vector, and
//! [`SirModel::derivatives`], which evaluates the rates of change of
//! `[S, I, R, C]`. [`driver`] plugs the model into `ode_solvers` and [`host`]
//! connects it to a Model Run Protocol environment.

pub mod driver;
pub mod error;
pub mod host;
pub mod model;
pub mod output;
pub mod parameters;

pub use error::ModelError;
pub use model::{Compartment, NUM_STATES, SirModel, StateVector, derivatives};
pub use parameters::{NUM_PARAMETERS, ParameterSetter, Parameters};
