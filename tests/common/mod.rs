//! Shared test problems.

#![allow(dead_code)]

use lsoda::prelude::*;

/// y' = -y, y(0) = 1: y(t) = exp(-t).
pub struct Decay;

impl ODE for Decay {
    fn ode(&self, _t: Float, y: &[Float], dydt: &mut [Float]) {
        dydt[0] = -y[0];
    }
}

/// Simple harmonic oscillator: y0' = y1, y1' = -y0.
pub struct SHO;

impl ODE for SHO {
    fn ode(&self, _t: Float, y: &[Float], dydt: &mut [Float]) {
        dydt[0] = y[1];
        dydt[1] = -y[0];
    }
}

/// The Robertson chemical kinetics problem, the classic stiff benchmark.
pub struct Robertson;

impl ODE for Robertson {
    fn ode(&self, _t: Float, y: &[Float], dydt: &mut [Float]) {
        dydt[0] = -0.04 * y[0] + 1.0e4 * y[1] * y[2];
        dydt[2] = 3.0e7 * y[1] * y[1];
        dydt[1] = -dydt[0] - dydt[2];
    }
}

/// Van der Pol oscillator with stiffness parameter mu.
pub struct VanDerPol {
    pub mu: Float,
}

impl ODE for VanDerPol {
    fn ode(&self, _t: Float, y: &[Float], dydt: &mut [Float]) {
        dydt[0] = y[1];
        dydt[1] = self.mu * (1.0 - y[0] * y[0]) * y[1] - y[0];
    }
}

/// y' = 0: the solution never moves.
pub struct Constant;

impl ODE for Constant {
    fn ode(&self, _t: Float, _y: &[Float], dydt: &mut [Float]) {
        for d in dydt.iter_mut() {
            *d = 0.0;
        }
    }
}
