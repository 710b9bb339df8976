//! Completion status of an integration request.

/// Outcome of a [`crate::solver::Lsoda::step_to`] call.
///
/// Each variant corresponds to one of the integer `istate` codes reported at
/// the driver boundary; [`Status::from_istate`] and [`Status::istate`]
/// convert between the two encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The requested task was completed (istate 2).
    Success,
    /// `mxstep` internal steps were taken without reaching `tout` (istate -1).
    ExcessWork,
    /// The requested accuracy exceeds machine precision (istate -2).
    ExcessAccuracy,
    /// Illegal input was detected before any state was touched (istate -3).
    IllegalInput,
    /// The local error test failed repeatedly or with |h| = hmin (istate -4).
    ErrorTestFailures,
    /// The corrector failed to converge repeatedly or with |h| = hmin
    /// (istate -5).
    ConvergenceFailures,
    /// An error weight became non-positive (istate -6).
    BadErrorWeight,
}

impl Status {
    /// The integer `istate` code for this outcome.
    pub fn istate(self) -> i32 {
        match self {
            Status::Success => 2,
            Status::ExcessWork => -1,
            Status::ExcessAccuracy => -2,
            Status::IllegalInput => -3,
            Status::ErrorTestFailures => -4,
            Status::ConvergenceFailures => -5,
            Status::BadErrorWeight => -6,
        }
    }

    /// Decode an output `istate`. Returns `None` for the input-only codes
    /// (1 and 3) and anything out of range.
    pub fn from_istate(istate: i32) -> Option<Status> {
        match istate {
            2 => Some(Status::Success),
            -1 => Some(Status::ExcessWork),
            -2 => Some(Status::ExcessAccuracy),
            -3 => Some(Status::IllegalInput),
            -4 => Some(Status::ErrorTestFailures),
            -5 => Some(Status::ConvergenceFailures),
            -6 => Some(Status::BadErrorWeight),
            _ => None,
        }
    }
}
