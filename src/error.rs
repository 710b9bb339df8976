//! Errors surfaced by the high-level API.

use thiserror::Error;

use crate::{core::status::Status, Float};

/// Errors for the `solve_ivp` helper and the interpolation surface.
///
/// The low-level driver reports through `istate`; this type wraps the same
/// outcomes (plus interpolation misuse) for callers that want `Result`s.
#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error("illegal input: {0}")]
    IllegalInput(String),
    #[error("maximum step count reached before t = {tout} (stopped at t = {t})")]
    ExcessWork { t: Float, tout: Float },
    #[error("requested accuracy exceeds machine precision at t = {t} (suggested tolerance scale factor {tolsf})")]
    ExcessAccuracy { t: Float, tolsf: Float },
    #[error("repeated local error test failures at t = {t} with h = {h}")]
    ErrorTestFailures { t: Float, h: Float },
    #[error("repeated corrector convergence failures at t = {t} with h = {h}")]
    ConvergenceFailures { t: Float, h: Float },
    #[error("error weight for component {index} became non-positive at t = {t}")]
    BadErrorWeight { t: Float, index: usize },
    #[error("derivative order {k} is outside 0..={nq}")]
    BadDerivativeOrder { k: usize, nq: usize },
    #[error("interpolation time {t} is outside the covered interval [{tmin}, {tmax}]")]
    InterpolationOutOfRange { t: Float, tmin: Float, tmax: Float },
}

impl Error {
    /// Map a failed driver outcome onto an error value.
    ///
    /// `t` and `h` are the context's current time and step; `tolsf` the last
    /// tolerance scale factor; `imxer` the worst-weighted component index.
    pub(crate) fn from_status(
        status: Status,
        t: Float,
        tout: Float,
        h: Float,
        tolsf: Float,
        imxer: usize,
    ) -> Option<Error> {
        match status {
            Status::Success => None,
            Status::ExcessWork => Some(Error::ExcessWork { t, tout }),
            Status::ExcessAccuracy => Some(Error::ExcessAccuracy { t, tolsf }),
            Status::IllegalInput => Some(Error::IllegalInput(
                "see the diagnostic log for the offending argument".into(),
            )),
            Status::ErrorTestFailures => Some(Error::ErrorTestFailures { t, h }),
            Status::ConvergenceFailures => Some(Error::ConvergenceFailures { t, h }),
            Status::BadErrorWeight => Some(Error::BadErrorWeight { t, index: imxer }),
        }
    }
}
