//! Corrector iteration for the implicit formulas.
//!
//! Up to `maxcor` iterations resolve the nonlinear system left by the
//! predictor: functional (fixed-point) iteration for the Adams method,
//! or the chord method with an internally generated finite-difference
//! Jacobian for BDF. The sum of the corrections accumulates in `acor`;
//! the Nordsieck array is never touched here.

use crate::{
    core::ode::ODE,
    linalg::{fnorm, lu_factor, lu_solve, vmnorm},
    Float, ETA,
};

use super::{Iter, Lsoda, Method};

/// What the corrector loop concluded for this step attempt.
pub(crate) enum CorrectorOutcome {
    /// Converged after `m` additional iterations with last correction norm
    /// `del`.
    Converged { m: usize, del: Float },
    /// Not converged; the prediction was rolled back and the step should be
    /// retried with h scaled by `rh`.
    Retry { rh: Float },
    /// Not converged and out of options (|h| already at hmin, or too many
    /// failures on this step).
    Fail,
}

impl Lsoda {
    /// Run the corrector at the freshly predicted state.
    ///
    /// `pnorm` is the weighted norm of the predicted y (for the roundoff
    /// convergence shortcut), `told` the time to restore on failure, `ncf`
    /// the failure count for this step attempt.
    pub(crate) fn correct<F: ODE>(
        &mut self,
        f: &F,
        y: &mut [Float],
        pnorm: Float,
        told: Float,
        ncf: &mut usize,
    ) -> CorrectorOutcome {
        let n = self.n;
        let mut m = 0;
        let mut del;
        let mut delp = 0.0;
        let mut rate = 0.0;

        for i in 1..=n {
            y[i] = self.yh[1][i];
        }
        f.ode(self.tn, &y[1..], &mut self.savf[1..]);
        self.nfe += 1;

        loop {
            if m == 0 {
                // Reevaluate and factor P = I - h*el0*J if requested.
                if self.ipup {
                    self.jacobian(f, y);
                    self.ipup = false;
                    self.rc = 1.0;
                    self.nslp = self.nst;
                    self.conv_rate = 0.7;
                    if self.ierpj {
                        return self.corrector_failure(told, ncf);
                    }
                }
                for i in 1..=n {
                    self.acor[i] = 0.0;
                }
            }

            if self.miter == Iter::Functional {
                // Update y directly from the last function evaluation.
                for i in 1..=n {
                    self.savf[i] = self.h * self.savf[i] - self.yh[2][i];
                    y[i] = self.savf[i] - self.acor[i];
                }
                del = vmnorm(n, y, &self.ewt);
                for i in 1..=n {
                    y[i] = self.yh[1][i] + self.el[1] * self.savf[i];
                    self.acor[i] = self.savf[i];
                }
            } else {
                // Chord method: solve P * dy = residual.
                for i in 1..=n {
                    y[i] = self.h * self.savf[i] - (self.yh[2][i] + self.acor[i]);
                }
                lu_solve(&self.wm, n, &self.ipvt, y);
                del = vmnorm(n, y, &self.ewt);
                for i in 1..=n {
                    self.acor[i] += y[i];
                    y[i] = self.yh[1][i] + self.el[1] * self.acor[i];
                }
            }

            // A change of iterates on the order of roundoff counts as
            // converged without forming a new rate estimate. Otherwise at
            // least two iterations are forced for the Adams method so the
            // local Lipschitz constant can be estimated.
            if del <= 100.0 * pnorm * ETA {
                break;
            }
            if m != 0 || self.meth != Method::Adams {
                if m != 0 {
                    let mut rm = 1024.0;
                    if del <= 1024.0 * delp {
                        rm = del / delp;
                    }
                    rate = Float::max(rate, rm);
                    self.conv_rate = Float::max(0.2 * self.conv_rate, rm);
                }
                let dcon = del * Float::min(1.0, 1.5 * self.conv_rate)
                    / (self.tesco[self.nq][2] * self.conit);
                if dcon <= 1.0 {
                    self.pdest = Float::max(self.pdest, rate / (self.h * self.el[1]).abs());
                    if self.pdest != 0.0 {
                        self.pdlast = self.pdest;
                    }
                    break;
                }
            }

            m += 1;
            if m == self.maxcor || (m >= 2 && del > 2.0 * delp) {
                // Not converging. With a current Jacobian (or none at all)
                // this attempt is lost; with a stale one, refresh it and
                // restart the iteration.
                if self.miter == Iter::Functional || self.jcur {
                    return self.corrector_failure(told, ncf);
                }
                self.ipup = true;
                m = 0;
                rate = 0.0;
                delp = 0.0;
                for i in 1..=n {
                    y[i] = self.yh[1][i];
                }
                f.ode(self.tn, &y[1..], &mut self.savf[1..]);
                self.nfe += 1;
            } else {
                delp = del;
                f.ode(self.tn, &y[1..], &mut self.savf[1..]);
                self.nfe += 1;
            }
        }

        CorrectorOutcome::Converged { m, del }
    }

    /// Build and factor the iteration matrix P = I - h*el0*J with J from
    /// column-wise forward differences.
    fn jacobian<F: ODE>(&mut self, f: &F, y: &mut [Float]) {
        self.nje += 1;
        self.ierpj = false;
        self.jcur = true;
        let hl0 = self.h * self.el0;

        let fac = vmnorm(self.n, &self.savf, &self.ewt);
        let mut r0 = 1000.0 * self.h.abs() * ETA * self.n as Float * fac;
        if r0 == 0.0 {
            r0 = 1.0;
        }
        for j in 1..=self.n {
            let yj = y[j];
            let r = Float::max(self.sqrteta * yj.abs(), r0 / self.ewt[j]);
            y[j] += r;
            let fac = -hl0 / r;
            f.ode(self.tn, &y[1..], &mut self.acor[1..]);
            for i in 1..=self.n {
                self.wm[i][j] = (self.acor[i] - self.savf[i]) * fac;
            }
            y[j] = yj;
        }
        self.nfe += self.n;

        // Norm of J consistent with the weighted max-norm on vectors, while
        // wm still holds -h*el0*J.
        self.pdnorm = fnorm(self.n, &self.wm, &self.ewt) / hl0.abs();

        for i in 1..=self.n {
            self.wm[i][i] += 1.0;
        }
        if lu_factor(&mut self.wm, self.n, &mut self.ipvt).is_some() {
            self.ierpj = true;
        }
    }

    /// Roll back the prediction after a convergence failure and decide
    /// between retrying with a smaller step and giving up.
    fn corrector_failure(&mut self, told: Float, ncf: &mut usize) -> CorrectorOutcome {
        *ncf += 1;
        self.rmax = 2.0;
        self.tn = told;
        self.unpredict();
        if self.h.abs() <= self.hmin * 1.00001 || *ncf == self.mxncf {
            return CorrectorOutcome::Fail;
        }
        self.ipup = self.miter == Iter::Chord;
        CorrectorOutcome::Retry { rh: 0.25 }
    }
}
