//! One step of the integration: prediction, correction, local error test,
//! and the step-size / order / method selection that follows.

use crate::{core::ode::ODE, linalg::vmnorm, Float, ETA};

use super::{
    coeffs::SM1,
    corrector::CorrectorOutcome,
    Iter, Lsoda, Method,
};

impl Lsoda {
    /// Perform one step of the integration, communicating with the driver
    /// through `jstart` (0 first step, 1 continue, -1 parameters changed,
    /// -2 new h only) and `kflag` (0 success, -1 repeated error-test
    /// failure, -2 repeated convergence failure).
    pub(crate) fn step<F: ODE>(&mut self, f: &F, y: &mut [Float]) {
        self.kflag = 0;
        let told = self.tn;
        let mut ncf = 0;
        self.ierpj = false;
        self.jcur = false;

        if self.jstart == 0 {
            // First step of the problem: order 1, and rmax large enough to
            // compensate for the deliberately small initial h. Both
            // coefficient families are generated once so the switching
            // ratios cm1/cm2 can be cached.
            self.lmax = self.maxord + 1;
            self.nq = 1;
            self.l = 2;
            self.ialth = 2;
            self.rmax = 10000.0;
            self.rc = 0.0;
            self.el0 = 1.0;
            self.conv_rate = 0.7;
            self.hold = self.h;
            self.nslp = 0;
            self.ipup = self.miter == Iter::Chord;
            self.icount = 20;
            self.irflag = false;
            self.pdest = 0.0;
            self.pdlast = 0.0;
            self.ratio = 5.0;
            self.compute_coeffs(Method::Bdf);
            for i in 1..=5 {
                self.cm2[i] = self.tesco[i][2] * self.elco[i][i + 1];
            }
            self.compute_coeffs(Method::Adams);
            for i in 1..=12 {
                self.cm1[i] = self.tesco[i][2] * self.elco[i][i + 1];
            }
            self.reset_coeffs();
        }

        if self.jstart == -1 {
            // Parameters changed: force a matrix update, honor a changed
            // method, and rescale if the driver adjusted h.
            self.ipup = self.miter == Iter::Chord;
            self.lmax = self.maxord + 1;
            if self.ialth == 1 {
                self.ialth = 2;
            }
            if self.mused != Some(self.meth) {
                self.compute_coeffs(self.meth);
                self.ialth = self.l;
                self.reset_coeffs();
            }
            if self.h != self.hold {
                let rh = self.h / self.hold;
                self.h = self.hold;
                self.rescale(rh);
            }
        }

        if self.jstart == -2 && self.h != self.hold {
            let rh = self.h / self.hold;
            self.h = self.hold;
            self.rescale(rh);
        }

        'retry: loop {
            // Predict, then correct; a recoverable corrector failure
            // shrinks h and redoes the prediction.
            let (m, del, pnorm) = loop {
                if (self.rc - 1.0).abs() > self.ccmax {
                    self.ipup = self.miter == Iter::Chord;
                }
                if self.nst >= self.nslp + self.msbp {
                    self.ipup = self.miter == Iter::Chord;
                }
                self.tn += self.h;
                self.predict();
                let pnorm = vmnorm(self.n, &self.yh[1], &self.ewt);
                match self.correct(f, y, pnorm, told, &mut ncf) {
                    CorrectorOutcome::Converged { m, del } => break (m, del, pnorm),
                    CorrectorOutcome::Retry { rh } => {
                        let rh = Float::max(rh, self.hmin / self.h.abs());
                        self.rescale(rh);
                    }
                    CorrectorOutcome::Fail => {
                        self.kflag = -2;
                        self.hold = self.h;
                        self.jstart = 1;
                        return;
                    }
                }
            };

            // The corrector converged; jcur is cleared to signal that the
            // Jacobian may need updating later. Local error test now.
            self.jcur = false;
            let dsm = if m == 0 {
                del / self.tesco[self.nq][2]
            } else {
                vmnorm(self.n, &self.acor, &self.ewt) / self.tesco[self.nq][2]
            };

            if dsm <= 1.0 {
                // The step is accepted. Fold the correction into the
                // Nordsieck history, then consider a method switch every
                // msbp-scale interval, and the usual step/order change when
                // the ialth countdown expires.
                self.kflag = 0;
                self.nst += 1;
                self.hu = self.h;
                self.nqu = self.nq;
                self.mused = Some(self.meth);
                for j in 1..=self.l {
                    let r = self.el[j];
                    for i in 1..=self.n {
                        self.yh[j][i] += r * self.acor[i];
                    }
                }

                self.icount -= 1;
                if self.icount < 0 {
                    let mut rh = 0.0;
                    self.method_switch(dsm, pnorm, &mut rh);
                    if self.mused != Some(self.meth) {
                        let rh = Float::max(rh, self.hmin / self.h.abs());
                        self.rescale(rh);
                        self.rmax = 10.0;
                        self.finalize_step();
                        return;
                    }
                }

                self.ialth -= 1;
                if self.ialth == 0 {
                    let mut rhup = 0.0;
                    if self.l != self.lmax {
                        for i in 1..=self.n {
                            self.savf[i] = self.acor[i] - self.yh[self.lmax][i];
                        }
                        let dup = vmnorm(self.n, &self.savf, &self.ewt) / self.tesco[self.nq][3];
                        let exup = 1.0 / (self.l + 1) as Float;
                        rhup = 1.0 / (1.4 * dup.powf(exup) + 0.0000014);
                    }

                    let (orderflag, rh) = self.order_select(rhup, dsm);
                    match orderflag {
                        // No change in h or nq.
                        0 => {}
                        // h changes, nq does not.
                        1 => {
                            let rh = Float::max(rh, self.hmin / self.h.abs());
                            self.rescale(rh);
                            self.rmax = 10.0;
                        }
                        // Both change.
                        _ => {
                            self.reset_coeffs();
                            let rh = Float::max(rh, self.hmin / self.h.abs());
                            self.rescale(rh);
                            self.rmax = 10.0;
                        }
                    }
                    self.finalize_step();
                    return;
                }

                if self.ialth > 1 || self.l == self.lmax {
                    self.finalize_step();
                    return;
                }

                // One step away from considering an order increase: stash
                // the scaled correction for the rhup estimate.
                for i in 1..=self.n {
                    self.yh[self.lmax][i] = self.acor[i];
                }
                self.finalize_step();
                return;
            }

            // The error test failed. Restore tn and the history, and retry
            // with a reduced step and possibly a reduced order. After 2 or
            // more failures h is forced down by a factor of 5 or more.
            self.kflag -= 1;
            self.tn = told;
            self.unpredict();
            self.rmax = 2.0;
            if self.h.abs() <= self.hmin * 1.00001 {
                self.kflag = -1;
                self.hold = self.h;
                self.jstart = 1;
                return;
            }

            if self.kflag > -3 {
                let (orderflag, mut rh) = self.order_select(0.0, dsm);
                if orderflag == 2 {
                    self.reset_coeffs();
                } else if orderflag == 0 {
                    rh = rh.min(0.2);
                }
                let rh = Float::max(rh, self.hmin / self.h.abs());
                self.rescale(rh);
                continue 'retry;
            }

            // 3 or more failures: the higher derivatives accumulated in the
            // history are assumed to be of the wrong order. Recompute the
            // first derivative from scratch, drop to order 1, and shrink h
            // by 10 until the step succeeds or kflag reaches -10.
            if self.kflag == -10 {
                self.kflag = -1;
                self.hold = self.h;
                self.jstart = 1;
                return;
            }
            let rh = Float::max(0.1, self.hmin / self.h.abs());
            self.h *= rh;
            for i in 1..=self.n {
                y[i] = self.yh[1][i];
            }
            f.ode(self.tn, &y[1..], &mut self.savf[1..]);
            self.nfe += 1;
            for i in 1..=self.n {
                self.yh[2][i] = self.h * self.savf[i];
            }
            self.ipup = self.miter == Iter::Chord;
            self.ialth = 5;
            if self.nq > 1 {
                self.nq = 1;
                self.l = 2;
                self.reset_coeffs();
            }
            continue 'retry;
        }
    }

    /// Advance the history to the predicted state: multiply `yh` by the
    /// Pascal triangle matrix via the reverse-indexed in-place update.
    pub(crate) fn predict(&mut self) {
        for j in (1..=self.nq).rev() {
            for i1 in j..=self.nq {
                let (head, tail) = self.yh.split_at_mut(i1 + 1);
                let dst = &mut head[i1];
                let src = &tail[0];
                for i in 1..=self.n {
                    dst[i] += src[i];
                }
            }
        }
    }

    /// Exact inverse of [`Lsoda::predict`], used when a step attempt is
    /// rolled back. Any mutation of `yh` between the two calls breaks the
    /// mirror-image property.
    pub(crate) fn unpredict(&mut self) {
        for j in (1..=self.nq).rev() {
            for i1 in j..=self.nq {
                let (head, tail) = self.yh.split_at_mut(i1 + 1);
                let dst = &mut head[i1];
                let src = &tail[0];
                for i in 1..=self.n {
                    dst[i] -= src[i];
                }
            }
        }
    }

    /// Apply the step ratio `rh`, bounded by rmax, hmax, and (for Adams)
    /// the stability region, then rescale the history columns by powers of
    /// the ratio. Changing h locks further changes out for `l` steps.
    fn rescale(&mut self, rh: Float) {
        let mut rh = rh.min(self.rmax);
        rh /= Float::max(1.0, self.h.abs() * self.hmxi * rh);

        // For Adams, restrict the new step by the stability region; if that
        // is what limited it, note the fact so later roundoff trouble can be
        // attributed to stability-limited stepping.
        if self.meth == Method::Adams {
            self.irflag = false;
            let pdh = Float::max(self.h.abs() * self.pdlast, 0.000001);
            if rh * pdh * 1.00001 >= SM1[self.nq] {
                rh = SM1[self.nq] / pdh;
                self.irflag = true;
            }
        }

        let mut r = 1.0;
        for j in 2..=self.l {
            r *= rh;
            for i in 1..=self.n {
                self.yh[j][i] *= r;
            }
        }
        self.h *= rh;
        self.rc *= rh;
        self.ialth = self.l;
    }

    /// Step and order selection after the error test (successful or not).
    ///
    /// Candidate growth factors are computed at orders nq-1, nq, and nq+1
    /// (`rhup` comes from the caller since only a successful step has the
    /// saved derivative to estimate it). Returns `(orderflag, rh)`:
    /// 0 = no change, 1 = change h only, 2 = nq (and h) changed.
    fn order_select(&mut self, mut rhup: Float, dsm: Float) -> (u8, Float) {
        let exsm = 1.0 / self.l as Float;
        let mut rhsm = 1.0 / (1.2 * dsm.powf(exsm) + 0.0000012);

        let mut rhdn = 0.0;
        if self.nq != 1 {
            let ddn = vmnorm(self.n, &self.yh[self.l], &self.ewt) / self.tesco[self.nq][1];
            let exdn = 1.0 / self.nq as Float;
            rhdn = 1.0 / (1.3 * ddn.powf(exdn) + 0.0000013);
        }

        // For Adams, each candidate is also limited by the stability region.
        let mut pdh = 0.0;
        if self.meth == Method::Adams {
            pdh = Float::max(self.h.abs() * self.pdlast, 0.000001);
            if self.l < self.lmax {
                rhup = rhup.min(SM1[self.l] / pdh);
            }
            rhsm = rhsm.min(SM1[self.nq] / pdh);
            if self.nq > 1 {
                rhdn = rhdn.min(SM1[self.nq - 1] / pdh);
            }
            self.pdest = 0.0;
        }

        let newq;
        let mut rh;
        if rhsm >= rhup {
            if rhsm >= rhdn {
                newq = self.nq;
                rh = rhsm;
            } else {
                newq = self.nq - 1;
                rh = rhdn;
                if self.kflag < 0 && rh > 1.0 {
                    rh = 1.0;
                }
            }
        } else if rhup <= rhdn {
            newq = self.nq - 1;
            rh = rhdn;
            if self.kflag < 0 && rh > 1.0 {
                rh = 1.0;
            }
        } else {
            // The order increase wins; it only happens for a gain of at
            // least 10 percent, and needs one extra scaled derivative.
            rh = rhup;
            if rh >= 1.1 {
                let r = self.el[self.l] / self.l as Float;
                self.nq = self.l;
                self.l = self.nq + 1;
                for i in 1..=self.n {
                    self.yh[self.l][i] = self.acor[i] * r;
                }
                return (2, rh);
            }
            self.ialth = 3;
            return (0, rh);
        }

        // The 10 percent test, bypassed when an Adams step is restricted by
        // stability.
        if self.meth == Method::Adams {
            if rh * pdh * 1.00001 < SM1[newq] && self.kflag == 0 && rh < 1.1 {
                self.ialth = 3;
                return (0, rh);
            }
        } else if self.kflag == 0 && rh < 1.1 {
            self.ialth = 3;
            return (0, rh);
        }

        if self.kflag <= -2 {
            rh = rh.min(0.2);
        }

        if newq == self.nq {
            return (1, rh);
        }
        self.nq = newq;
        self.l = self.nq + 1;
        (2, rh)
    }

    /// Consider switching method families. Called once the `icount`
    /// countdown from the last switch (or start) runs out, on every
    /// accepted step. A switch must promise a step-size advantage of at
    /// least `ratio` (5) to be taken.
    fn method_switch(&mut self, dsm: Float, pnorm: Float, rh: &mut Float) {
        if self.meth == Method::Adams {
            // Consider switching to BDF. Order above 5 means the problem is
            // being handled comfortably; not stiff.
            if self.nq > 5 {
                return;
            }

            let nqm2;
            let rh2;
            if dsm <= 100.0 * pnorm * ETA || self.pdest == 0.0 {
                // Error estimate and Lipschitz constant are polluted by
                // roundoff. Switch only if stability restricted the last
                // step, and double h for lack of better information.
                if !self.irflag {
                    return;
                }
                rh2 = 2.0;
                nqm2 = self.nq.min(self.mxords);
            } else {
                // The usual test: compare the ideal Adams step (stability
                // included) with the ideal BDF step at the order BDF would
                // use.
                let exsm = 1.0 / self.l as Float;
                let mut rh1 = 1.0 / (1.2 * dsm.powf(exsm) + 0.0000012);
                let mut rh1it = 2.0 * rh1;
                let pdh = self.pdlast * self.h.abs();
                if pdh * rh1 > 0.00001 {
                    rh1it = SM1[self.nq] / pdh;
                }
                rh1 = rh1.min(rh1it);

                if self.nq > self.mxords {
                    let lm2 = self.mxords + 1;
                    let exm2 = 1.0 / lm2 as Float;
                    let lm2p1 = lm2 + 1;
                    let dm2 = vmnorm(self.n, &self.yh[lm2p1], &self.ewt) / self.cm2[self.mxords];
                    rh2 = 1.0 / (1.2 * dm2.powf(exm2) + 0.0000012);
                    nqm2 = self.mxords;
                } else {
                    let dm2 = dsm * (self.cm1[self.nq] / self.cm2[self.nq]);
                    rh2 = 1.0 / (1.2 * dm2.powf(exsm) + 0.0000012);
                    nqm2 = self.nq;
                }

                if rh2 < self.ratio * rh1 {
                    return;
                }
            }

            *rh = rh2;
            self.icount = 20;
            self.meth = Method::Bdf;
            self.miter = Iter::Chord;
            self.pdlast = 0.0;
            self.nq = nqm2;
            self.l = self.nq + 1;
            return;
        }

        // Currently BDF; consider switching to Adams. The Adams step is
        // limited by its stability region, and a step so small that the
        // error estimate would drown in roundoff keeps us on BDF.
        let exsm = 1.0 / self.l as Float;
        let mut rh1;
        let mut dm1;
        let nqm1;
        let exm1;
        if self.mxordn < self.nq {
            nqm1 = self.mxordn;
            let lm1 = self.mxordn + 1;
            exm1 = 1.0 / lm1 as Float;
            let lm1p1 = lm1 + 1;
            dm1 = vmnorm(self.n, &self.yh[lm1p1], &self.ewt) / self.cm1[self.mxordn];
            rh1 = 1.0 / (1.2 * dm1.powf(exm1) + 0.0000012);
        } else {
            dm1 = dsm * (self.cm2[self.nq] / self.cm1[self.nq]);
            rh1 = 1.0 / (1.2 * dm1.powf(exsm) + 0.0000012);
            nqm1 = self.nq;
            exm1 = exsm;
        }
        let mut rh1it = 2.0 * rh1;
        let pdh = self.pdnorm * self.h.abs();
        if pdh * rh1 > 0.00001 {
            rh1it = SM1[nqm1] / pdh;
        }
        rh1 = rh1.min(rh1it);
        let rh2 = 1.0 / (1.2 * dsm.powf(exsm) + 0.0000012);
        if rh1 * self.ratio < 5.0 * rh2 {
            return;
        }
        let alpha = Float::max(0.001, rh1);
        dm1 *= alpha.powf(exm1);
        if dm1 <= 1000.0 * ETA * pnorm {
            return;
        }

        *rh = rh1;
        self.icount = 20;
        self.meth = Method::Adams;
        self.miter = Iter::Functional;
        self.pdlast = 0.0;
        self.nq = nqm1;
        self.l = self.nq + 1;
    }

    /// Wrap up a completed step: leave `acor` scaled to the actual local
    /// error estimate and mark the step machine ready to continue.
    fn finalize_step(&mut self) {
        let r = 1.0 / self.tesco[self.nqu][2];
        for i in 1..=self.n {
            self.acor[i] *= r;
        }
        self.hold = self.h;
        self.jstart = 1;
    }
}
