use std::convert::Infallible;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Number of entries in the parameter vector.
pub const NUM_PARAMETERS: usize = 2;

/// Parameter names in vector order. Hosts that look parameters up by name
/// fill the buffer in this order.
pub const PARAMETER_NAMES: [&str; NUM_PARAMETERS] = ["iota", "rho"];

pub type ParameterVector = [f64; NUM_PARAMETERS];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Parameters {
    /// Transmission rate.
    pub iota: f64,
    /// Recovery rate.
    pub rho: f64,
}

impl Parameters {
    pub fn from_vector(vector: ParameterVector) -> Result<Self, ModelError> {
        let parameters = Self {
            iota: vector[0],
            rho: vector[1],
        };
        parameters.validate()?;
        Ok(parameters)
    }

    pub fn to_vector(&self) -> ParameterVector {
        [self.iota, self.rho]
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        for (name, value) in PARAMETER_NAMES.into_iter().zip(self.to_vector()) {
            if !value.is_finite() || value < 0.0 {
                return Err(ModelError::InvalidParameter { name, value });
            }
        }
        Ok(())
    }

    /// Basic reproduction number, `iota / rho`. Infinite when `rho` is zero.
    pub fn basic_reproduction_number(&self) -> f64 {
        self.iota / self.rho
    }
}

/// Host capability that populates the parameter vector from its own
/// configuration.
///
/// The model passes the count it declares together with a buffer of exactly
/// that length. Implementations fill the buffer and return how many
/// parameters the host has configured; a host holding a different number of
/// values must leave the buffer alone and report its own count so the model
/// can reject the mismatch.
pub trait ParameterSetter {
    type Error: std::error::Error + Send + Sync + 'static;

    fn set_parameters(&mut self, declared: usize, buffer: &mut [f64])
    -> Result<usize, Self::Error>;
}

impl ParameterSetter for &[f64] {
    type Error = Infallible;

    fn set_parameters(
        &mut self,
        declared: usize,
        buffer: &mut [f64],
    ) -> Result<usize, Self::Error> {
        if self.len() == declared {
            buffer.copy_from_slice(*self);
        }
        Ok(self.len())
    }
}

impl ParameterSetter for Parameters {
    type Error = Infallible;

    fn set_parameters(
        &mut self,
        declared: usize,
        buffer: &mut [f64],
    ) -> Result<usize, Self::Error> {
        if declared == NUM_PARAMETERS {
            buffer.copy_from_slice(&self.to_vector());
        }
        Ok(NUM_PARAMETERS)
    }
}

/// Runs the host setter once and returns the validated parameters.
pub fn initialize<S: ParameterSetter + ?Sized>(setter: &mut S) -> Result<Parameters, ModelError> {
    let mut buffer: ParameterVector = [0.0; NUM_PARAMETERS];
    let supplied = setter
        .set_parameters(NUM_PARAMETERS, &mut buffer)
        .map_err(|err| ModelError::Setter(Box::new(err)))?;
    if supplied != NUM_PARAMETERS {
        return Err(ModelError::ParameterCount {
            expected: NUM_PARAMETERS,
            found: supplied,
        });
    }
    Parameters::from_vector(buffer)
}
