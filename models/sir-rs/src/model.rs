use ode_solvers::{SVector, System};

use crate::error::ModelError;
use crate::parameters::{self, ParameterSetter, Parameters};

pub const NUM_STATES: usize = 4;

/// `[S, I, R, C]`: susceptible, infected, recovered and cumulative incidence.
pub type StateVector = [f64; NUM_STATES];

/// State representation used by `ode_solvers`.
pub type OdeState = SVector<f64, NUM_STATES>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compartment {
    Susceptible,
    Infected,
    Recovered,
    /// Running total of S -> I transitions. Never feeds back into the other
    /// compartments.
    CumulativeIncidence,
}

impl Compartment {
    pub const ALL: [Compartment; NUM_STATES] = [
        Compartment::Susceptible,
        Compartment::Infected,
        Compartment::Recovered,
        Compartment::CumulativeIncidence,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            Compartment::Susceptible => "S",
            Compartment::Infected => "I",
            Compartment::Recovered => "R",
            Compartment::CumulativeIncidence => "C",
        }
    }
}

/// Total population `S + I + R`. Cumulative incidence is not part of it.
pub fn population(state: &StateVector) -> f64 {
    state[0] + state[1] + state[2]
}

/// Rejects states whose population is zero, negative or NaN.
pub fn check_population(state: &StateVector) -> Result<(), ModelError> {
    let n = population(state);
    if n > 0.0 {
        Ok(())
    } else {
        Err(ModelError::DegeneratePopulation(n))
    }
}

/// Right-hand side of the SIR system.
///
/// `time` does not enter the equations; it is accepted so the signature
/// matches what integrators call.
///
/// Precondition: `S + I + R != 0`. This is not checked here; a zero
/// population yields NaN or infinite rates, which integrators surface as a
/// failed step. Use [`check_population`] to validate a state up front.
pub fn derivatives(_time: f64, state: &StateVector, parameters: &Parameters) -> StateVector {
    let [s, i, r, _] = *state;
    let Parameters { iota, rho } = *parameters;
    let infection = iota * i * s / (s + i + r);
    let recovery = rho * i;
    [-infection, infection - recovery, recovery, infection]
}

/// The SIR model with its parameters loaded. A value of this type only
/// exists after initialization, so every evaluation sees a populated
/// parameter vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SirModel {
    parameters: Parameters,
}

impl SirModel {
    pub fn new(parameters: Parameters) -> Result<Self, ModelError> {
        parameters.validate()?;
        Ok(Self { parameters })
    }

    /// Asks the host to populate `{iota, rho}` and builds the model from them.
    pub fn initialize<S: ParameterSetter + ?Sized>(setter: &mut S) -> Result<Self, ModelError> {
        let parameters = parameters::initialize(setter)?;
        Ok(Self { parameters })
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    pub fn derivatives(&self, time: f64, state: &StateVector) -> StateVector {
        derivatives(time, state, &self.parameters)
    }

    /// Slice-based form of [`SirModel::derivatives`] for hosts that hand over
    /// raw buffers. `neq` and both lengths are checked before anything is
    /// written.
    pub fn evaluate(
        &self,
        neq: usize,
        time: f64,
        state: &[f64],
        out: &mut [f64],
    ) -> Result<(), ModelError> {
        if neq != NUM_STATES {
            return Err(ModelError::EquationCount {
                expected: NUM_STATES,
                found: neq,
            });
        }
        let state: &StateVector = state.try_into().map_err(|_| ModelError::StateLength {
            which: "state",
            expected: NUM_STATES,
            found: state.len(),
        })?;
        if out.len() != NUM_STATES {
            return Err(ModelError::StateLength {
                which: "derivative",
                expected: NUM_STATES,
                found: out.len(),
            });
        }
        out.copy_from_slice(&self.derivatives(time, state));
        Ok(())
    }
}

impl System<f64, OdeState> for SirModel {
    fn system(&self, x: f64, y: &OdeState, dy: &mut OdeState) {
        let state: StateVector = (*y).into();
        *dy = OdeState::from(self.derivatives(x, &state));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn model(iota: f64, rho: f64) -> SirModel {
        SirModel::new(Parameters { iota, rho }).unwrap()
    }

    const STATES: [StateVector; 4] = [
        [999.0, 1.0, 0.0, 0.0],
        [500.0, 300.0, 200.0, 450.0],
        [1.0, 1e6, 3.0, 2.0],
        [0.25, 0.5, 0.25, 0.0],
    ];

    #[test]
    fn test_outbreak_start() {
        let d = model(0.5, 0.2).derivatives(0.0, &[999.0, 1.0, 0.0, 0.0]);
        assert_abs_diff_eq!(d[0], -0.4995, epsilon = 1e-12);
        assert_abs_diff_eq!(d[1], 0.2995, epsilon = 1e-12);
        assert_abs_diff_eq!(d[2], 0.2, epsilon = 1e-12);
        assert_abs_diff_eq!(d[3], 0.4995, epsilon = 1e-12);
    }

    #[test]
    fn test_no_transmission() {
        let rho = 0.3;
        let d = model(0.0, rho).derivatives(5.0, &[100.0, 10.0, 0.0, 0.0]);
        assert_eq!(d[0], 0.0);
        assert_abs_diff_eq!(d[1], -rho * 10.0, epsilon = 1e-12);
        assert_abs_diff_eq!(d[2], rho * 10.0, epsilon = 1e-12);
        assert_eq!(d[3], 0.0);
    }

    #[test]
    fn test_population_is_conserved() {
        for (iota, rho) in [(0.5, 0.2), (2.0, 0.0), (0.0, 1.5), (0.01, 0.01)] {
            let model = model(iota, rho);
            for state in &STATES {
                let d = model.derivatives(0.0, state);
                let scale = d.iter().map(|x| x.abs()).fold(1.0, f64::max);
                assert_abs_diff_eq!(d[0] + d[1] + d[2], 0.0, epsilon = 1e-12 * scale);
            }
        }
    }

    #[test]
    fn test_incidence_mirrors_susceptible_outflow() {
        let model = model(0.7, 0.1);
        for state in &STATES {
            let d = model.derivatives(0.0, state);
            assert_eq!(d[3], -d[0]);
            assert!(d[3] >= 0.0);
        }
    }

    #[test]
    fn test_disease_free_state_is_fixed_point() {
        let model = model(0.9, 0.4);
        let d = model.derivatives(0.0, &[1000.0, 0.0, 25.0, 12.0]);
        assert!(d.iter().all(|x| *x == 0.0));
    }

    #[test]
    fn test_no_recovery_flow_without_rho() {
        let model = model(0.9, 0.0);
        for state in &STATES {
            assert_eq!(model.derivatives(0.0, state)[2], 0.0);
        }
    }

    #[test]
    fn test_time_does_not_enter_equations() {
        let model = model(0.5, 0.2);
        let state = [600.0, 50.0, 350.0, 80.0];
        assert_eq!(model.derivatives(0.0, &state), model.derivatives(1e4, &state));
    }

    #[test]
    fn test_zero_population_is_not_silent() {
        let model = model(0.5, 0.2);
        let d = model.derivatives(0.0, &[0.0, 0.0, 0.0, 3.0]);
        assert!(d[0].is_nan());
        assert!(d[3].is_nan());

        let d = model.derivatives(0.0, &[2.0, 1.0, -3.0, 0.0]);
        assert!(d[0].is_infinite());

        assert!(matches!(
            check_population(&[0.0, 0.0, 0.0, 3.0]),
            Err(ModelError::DegeneratePopulation(_))
        ));
        assert!(check_population(&[999.0, 1.0, 0.0, 0.0]).is_ok());
    }

    #[test]
    fn test_evaluate_matches_derivatives() {
        let model = model(0.5, 0.2);
        let state = [999.0, 1.0, 0.0, 0.0];
        let mut out = [f64::NAN; NUM_STATES];
        model.evaluate(4, 0.0, &state, &mut out).unwrap();
        assert_eq!(out, model.derivatives(0.0, &state));
    }

    #[test]
    fn test_evaluate_checks_lengths() {
        let model = model(0.5, 0.2);
        let mut out = [0.0; NUM_STATES];
        assert!(matches!(
            model.evaluate(3, 0.0, &[999.0, 1.0, 0.0, 0.0], &mut out),
            Err(ModelError::EquationCount {
                expected: 4,
                found: 3
            })
        ));
        assert!(matches!(
            model.evaluate(4, 0.0, &[999.0, 1.0, 0.0], &mut out),
            Err(ModelError::StateLength { which: "state", .. })
        ));
        let mut short = [0.0; 3];
        assert!(matches!(
            model.evaluate(4, 0.0, &[999.0, 1.0, 0.0, 0.0], &mut short),
            Err(ModelError::StateLength {
                which: "derivative",
                ..
            })
        ));
        assert_eq!(out, [0.0; NUM_STATES]);
    }

    #[test]
    fn test_ode_system_matches_derivatives() {
        let model = model(0.5, 0.2);
        let y = OdeState::new(999.0, 1.0, 0.0, 0.0);
        let mut dy = OdeState::zeros();
        model.system(0.0, &y, &mut dy);
        let expected = model.derivatives(0.0, &[999.0, 1.0, 0.0, 0.0]);
        for (k, compartment) in Compartment::ALL.iter().enumerate() {
            assert_eq!(compartment.index(), k);
            assert_eq!(dy[k], expected[k]);
        }
    }

    #[test]
    fn test_initialize_from_host() {
        let mut host: &[f64] = &[0.5, 0.2];
        let model = SirModel::initialize(&mut host).unwrap();
        assert_eq!(model.parameters(), &Parameters { iota: 0.5, rho: 0.2 });

        let mut host: &[f64] = &[0.5, 0.2, 0.1];
        assert!(matches!(
            SirModel::initialize(&mut host),
            Err(ModelError::ParameterCount { .. })
        ));
    }

    #[test]
    fn test_new_rejects_negative_rates() {
        assert!(matches!(
            SirModel::new(Parameters {
                iota: -1.0,
                rho: 0.2
            }),
            Err(ModelError::InvalidParameter { name: "iota", .. })
        ));
    }
}
