//! Convenience entry point: integrate over a time grid.

use crate::{
    core::{ode::ODE, status::Status},
    error::Error,
    solver::{Lsoda, Settings, Stats, Task, Tolerance},
    Float,
};

/// Solution over a requested time grid, plus the final solver counters.
#[derive(Debug, Clone)]
pub struct IvpSolution {
    /// The requested output times (the first entry is the initial time).
    pub t: Vec<Float>,
    /// The state at each output time; `y[0]` is the initial condition.
    pub y: Vec<Vec<Float>>,
    /// Counters and step state at the end of the integration.
    pub stats: Stats,
}

impl IvpSolution {
    /// The solution as one table: each row is `[t, y1, ..., yn]`.
    pub fn table(&self) -> Vec<Vec<Float>> {
        self.t
            .iter()
            .zip(self.y.iter())
            .map(|(t, y)| {
                let mut row = Vec::with_capacity(y.len() + 1);
                row.push(*t);
                row.extend_from_slice(y);
                row
            })
            .collect()
    }
}

/// Integrate `f` from `t_eval[0]` through each requested output time.
///
/// A single integration context serves the whole grid: the driver is asked
/// to advance to each `t_eval` entry in turn, interpolating its answer
/// there, so the internal step sequence is identical to one long
/// integration.
pub fn solve_ivp<F>(
    f: &F,
    y0: &[Float],
    t_eval: &[Float],
    rtol: impl Into<Tolerance>,
    atol: impl Into<Tolerance>,
) -> Result<IvpSolution, Error>
where
    F: ODE,
{
    let settings = Settings::builder().rtol(rtol.into()).atol(atol.into()).build();
    solve_ivp_with(f, y0, t_eval, settings)
}

/// [`solve_ivp`] with full [`Settings`] control.
pub fn solve_ivp_with<F>(
    f: &F,
    y0: &[Float],
    t_eval: &[Float],
    settings: Settings,
) -> Result<IvpSolution, Error>
where
    F: ODE,
{
    if t_eval.is_empty() {
        return Err(Error::IllegalInput("t_eval is empty".into()));
    }

    let mut solver = Lsoda::with_settings(settings);
    let mut y = y0.to_vec();
    let mut t = t_eval[0];
    let mut istate = 1;

    let mut ts = Vec::with_capacity(t_eval.len());
    let mut ys = Vec::with_capacity(t_eval.len());
    ts.push(t);
    ys.push(y.clone());

    for &tout in &t_eval[1..] {
        solver.step_to(f, &mut y, &mut t, tout, Task::Integrate, &mut istate);
        if istate != 2 {
            let status = Status::from_istate(istate).unwrap_or(Status::IllegalInput);
            let stats = solver.stats();
            return Err(Error::from_status(status, t, tout, stats.h, stats.tolsf, stats.imxer)
                .unwrap_or_else(|| {
                    Error::IllegalInput("solver reported an unexpected state".into())
                }));
        }
        ts.push(t);
        ys.push(y.clone());
    }

    Ok(IvpSolution {
        t: ts,
        y: ys,
        stats: solver.stats(),
    })
}
