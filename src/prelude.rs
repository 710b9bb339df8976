//! Convenient prelude: import the most commonly used traits, types, and functions.
//!
//! Bring this into scope with:
//!
//! ```rust
//! use lsoda::prelude::*;
//! ```
//!
//! Re-exports included:
//! - Core trait and outcome type: `ODE`, `Status`.
//! - Solver context: `Lsoda`, `Settings`, `Task`, `Tolerance`, `Stats`.
//! - High-level API: `solve_ivp`, `IvpSolution`, `Error`.

pub use crate::core::{ode::ODE, status::Status};
pub use crate::error::Error;
pub use crate::solve::{solve_ivp, solve_ivp_with, IvpSolution};
pub use crate::solver::{Lsoda, Method, Settings, Stats, Task, Tolerance};
pub use crate::Float;
