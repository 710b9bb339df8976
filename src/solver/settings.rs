//! Options, tolerances, and task modes for the integration driver.

use std::ops::Index;

use bon::Builder;

use crate::Float;

#[derive(Builder, Clone, Debug)]
/// Options for the integration context.
///
/// Everything has a usable default; `Settings::default()` reproduces the
/// classic solver defaults (scalar tolerances 1e-6, at most 5000 internal
/// steps per request, automatic initial step, maximum order 12/5 for the
/// non-stiff/stiff method).
pub struct Settings {
    /// Relative tolerance for the local error test.
    #[builder(default = 1e-6, into)]
    pub rtol: Tolerance,
    /// Absolute tolerance for the local error test.
    #[builder(default = 1e-6, into)]
    pub atol: Tolerance,
    /// Log a notice whenever the integrator switches methods.
    #[builder(default = false)]
    pub ixpr: bool,
    /// Maximum number of internal steps per `step_to` request.
    #[builder(default = 5000)]
    pub mxstep: usize,
    /// Maximum number of t + h == t roundoff warnings to log.
    #[builder(default = 10)]
    pub mxhnil: usize,
    /// Initial step size. `None` lets the solver compute one.
    pub h0: Option<Float>,
    /// Maximum order for the non-stiff (Adams) method, clamped to 12.
    #[builder(default = 12)]
    pub mxordn: usize,
    /// Maximum order for the stiff (BDF) method, clamped to 5.
    #[builder(default = 5)]
    pub mxords: usize,
    /// Maximal step size. `None` means unbounded.
    pub hmax: Option<Float>,
    /// Minimum step size.
    #[builder(default = 0.0)]
    pub hmin: Float,
    /// Jacobian mode for the stiff corrector. Only 2 (internally generated
    /// full dense finite-difference Jacobian) is supported; 1, 4 and 5 are
    /// recognized but rejected as unsupported, 3 is illegal.
    #[builder(default = 2)]
    pub jt: usize,
    /// Lower half-bandwidth for the banded modes (jt 4 or 5).
    pub ml: Option<usize>,
    /// Upper half-bandwidth for the banded modes (jt 4 or 5).
    pub mu: Option<usize>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings::builder().build()
    }
}

/// Tolerance enum to allow scalar or vector tolerances
/// using [`Into`] trait for easy conversion from `Float`, `[Float; N]`, or `Vec<Float>`.
/// The four classic tolerance shapes are the cross product of scalar/vector
/// rtol and atol; the error-weight computation indexes both uniformly.
#[derive(Clone, Debug)]
pub enum Tolerance {
    Scalar(Float),
    Vector(Vec<Float>),
}

impl Tolerance {
    /// Largest tolerance value.
    pub(crate) fn max_value(&self) -> Float {
        match self {
            Tolerance::Scalar(v) => *v,
            Tolerance::Vector(vs) => vs.iter().cloned().fold(Float::NEG_INFINITY, Float::max),
        }
    }

    /// Smallest tolerance value (used by the sign validation).
    pub(crate) fn min_value(&self) -> Float {
        match self {
            Tolerance::Scalar(v) => *v,
            Tolerance::Vector(vs) => vs.iter().cloned().fold(Float::INFINITY, Float::min),
        }
    }

    /// Number of components a vector tolerance provides, or `None` for a
    /// scalar (which covers any n).
    pub(crate) fn len(&self) -> Option<usize> {
        match self {
            Tolerance::Scalar(_) => None,
            Tolerance::Vector(vs) => Some(vs.len()),
        }
    }
}

impl From<Float> for Tolerance {
    fn from(val: Float) -> Self {
        Tolerance::Scalar(val)
    }
}

impl From<&[Float]> for Tolerance {
    fn from(val: &[Float]) -> Self {
        Tolerance::Vector(val.to_vec())
    }
}

impl<const N: usize> From<[Float; N]> for Tolerance {
    fn from(val: [Float; N]) -> Self {
        Tolerance::Vector(val.to_vec())
    }
}

impl From<Vec<Float>> for Tolerance {
    fn from(val: Vec<Float>) -> Self {
        Tolerance::Vector(val)
    }
}

impl Index<usize> for Tolerance {
    type Output = Float;

    fn index(&self, index: usize) -> &Self::Output {
        match self {
            Tolerance::Scalar(v) => v,
            Tolerance::Vector(vs) => &vs[index],
        }
    }
}

/// What a `step_to` call should do (the classic itask modes 1..5).
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Task {
    /// Integrate to `tout` and return the interpolated solution there.
    Integrate,
    /// Take a single internal step and return.
    OneStep,
    /// Integrate until the first internal step at or past `tout`, then
    /// return the internal state without interpolating.
    IntegratePast,
    /// As `Integrate`, but never step past `tcrit`.
    IntegrateClamped { tcrit: Float },
    /// As `OneStep`, but never step past `tcrit`; lands on `tcrit` exactly
    /// when close enough.
    OneStepClamped { tcrit: Float },
}

impl Task {
    /// The classic integer itask code.
    pub fn code(&self) -> i32 {
        match self {
            Task::Integrate => 1,
            Task::OneStep => 2,
            Task::IntegratePast => 3,
            Task::IntegrateClamped { .. } => 4,
            Task::OneStepClamped { .. } => 5,
        }
    }

    pub(crate) fn tcrit(&self) -> Option<Float> {
        match self {
            Task::IntegrateClamped { tcrit } | Task::OneStepClamped { tcrit } => Some(*tcrit),
            _ => None,
        }
    }
}
