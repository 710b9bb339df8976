//! High-level solve-over-a-grid entry point.

mod solve_ivp;

pub use solve_ivp::{solve_ivp, solve_ivp_with, IvpSolution};
