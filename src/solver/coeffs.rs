//! Method coefficient generation.
//!
//! The corrector polynomial coefficients `elco` and the error-test
//! constants `tesco` are built from the generating polynomials of the two
//! method families. For the implicit Adams method of order nq,
//!
//!   dl/dx = (x+1)*(x+2)*...*(x+nq-1) / (nq-1)!,   l(-1) = 0,
//!
//! and for the BDF methods,
//!
//!   l(x) = (x+1)*(x+2)*...*(x+nq) / k,   k = nq! * (1 + 1/2 + ... + 1/nq).
//!
//! `tesco[nq][1..=3]` hold the test constants for step selection at orders
//! nq-1, nq, and nq+1 respectively.

use crate::Float;

use super::{Lsoda, Method};

/// Maximum order per method: 12 for Adams, 5 for BDF.
pub(crate) const MORD: [usize; 2] = [12, 5];

/// Adams stability-region bound per order, indexed 1..=12.
pub(crate) const SM1: [Float; 13] = [
    0.0, 0.5, 0.575, 0.55, 0.45, 0.35, 0.25, 0.2, 0.15, 0.1, 0.075, 0.05, 0.025,
];

impl Lsoda {
    /// Fill `elco` and `tesco` for every order of the given method family.
    ///
    /// Called once at the start of the problem for both families (to cache
    /// the `cm1`/`cm2` switching ratios) and again whenever the method
    /// changes.
    pub(crate) fn compute_coeffs(&mut self, meth: Method) {
        // Workspace for the generating polynomial coefficients.
        let mut pc = [0.0 as Float; 13];

        if meth == Method::Adams {
            self.elco[1][1] = 1.0;
            self.elco[1][2] = 1.0;
            self.tesco[1][1] = 0.0;
            self.tesco[1][2] = 2.0;
            self.tesco[2][1] = 1.0;
            self.tesco[12][3] = 0.0;
            pc[1] = 1.0;
            let mut rqfac = 1.0;
            for nq in 2..=12 {
                // pc holds p(x) = (x+1)*(x+2)*...*(x+nq-1), built by
                // multiplying the previous polynomial by (x+nq-1).
                let rq1fac = rqfac;
                rqfac /= nq as Float;
                let nqm1 = nq - 1;
                let fnqm1 = nqm1 as Float;
                let nqp1 = nq + 1;
                pc[nq] = 0.0;
                for i in (2..=nq).rev() {
                    pc[i] = pc[i - 1] + fnqm1 * pc[i];
                }
                pc[1] *= fnqm1;

                // Integrals of p(x) and x*p(x) over [-1, 0].
                let mut pint = pc[1];
                let mut xpin = pc[1] / 2.0;
                let mut tsign = 1.0;
                for i in 2..=nq {
                    tsign = -tsign;
                    pint += tsign * pc[i] / i as Float;
                    xpin += tsign * pc[i] / (i + 1) as Float;
                }

                self.elco[nq][1] = pint * rq1fac;
                self.elco[nq][2] = 1.0;
                for i in 2..=nq {
                    self.elco[nq][i + 1] = rq1fac * pc[i] / i as Float;
                }
                let agamq = rqfac * xpin;
                let ragq = 1.0 / agamq;
                self.tesco[nq][2] = ragq;
                if nq < 12 {
                    self.tesco[nqp1][1] = ragq * rqfac / nqp1 as Float;
                }
                self.tesco[nqm1][3] = ragq;
            }
            return;
        }

        // BDF: pc holds p(x) = (x+1)*(x+2)*...*(x+nq), normalized by its
        // linear coefficient.
        pc[1] = 1.0;
        let mut rq1fac = 1.0;
        for nq in 1..=5 {
            let fnq = nq as Float;
            let nqp1 = nq + 1;
            pc[nqp1] = 0.0;
            for i in (2..=nq + 1).rev() {
                pc[i] = pc[i - 1] + fnq * pc[i];
            }
            pc[1] *= fnq;

            for i in 1..=nqp1 {
                self.elco[nq][i] = pc[i] / pc[2];
            }
            self.elco[nq][2] = 1.0;
            self.tesco[nq][1] = rq1fac;
            self.tesco[nq][2] = nqp1 as Float / self.elco[nq][1];
            self.tesco[nq][3] = (nq + 2) as Float / self.elco[nq][1];
            rq1fac /= fnq;
        }
    }

    /// Refresh the compact `el` vector (and the constants hanging off it)
    /// from `elco` after any change of order or method.
    pub(crate) fn reset_coeffs(&mut self) {
        let ep1 = self.elco[self.nq];
        for i in 1..=self.l {
            self.el[i] = ep1[i];
        }
        self.rc = self.rc * self.el[1] / self.el0;
        self.el0 = self.el[1];
        self.conit = 0.5 / (self.nq + 2) as Float;
    }
}

#[cfg(test)]
mod tests {
    use super::super::{Lsoda, Method};

    #[test]
    fn adams_order_one_is_backward_euler() {
        let mut s = Lsoda::new();
        s.compute_coeffs(Method::Adams);
        assert_eq!(s.elco[1][1], 1.0);
        assert_eq!(s.elco[1][2], 1.0);
        assert_eq!(s.tesco[1][2], 2.0);
    }

    #[test]
    fn adams_order_two_matches_trapezoid() {
        let mut s = Lsoda::new();
        s.compute_coeffs(Method::Adams);
        // Order 2 implicit Adams is the trapezoidal rule: l(x) has
        // el = [1/2, 1, 1/2].
        assert!((s.elco[2][1] - 0.5).abs() < 1e-15);
        assert_eq!(s.elco[2][2], 1.0);
        assert!((s.elco[2][3] - 0.5).abs() < 1e-15);
    }

    #[test]
    fn bdf_leading_terms() {
        let mut s = Lsoda::new();
        s.compute_coeffs(Method::Bdf);
        // BDF1 is backward Euler: el = [1, 1].
        assert!((s.elco[1][1] - 1.0).abs() < 1e-15);
        assert_eq!(s.elco[1][2], 1.0);
        // BDF2: l(x) = (x+1)(x+2)/3 scaled so el[2] = 1, giving
        // el = [2/3, 1, 1/3].
        assert!((s.elco[2][1] - 2.0 / 3.0).abs() < 1e-15);
        assert!((s.elco[2][3] - 1.0 / 3.0).abs() < 1e-15);
        // The leading term ratio elco[nq][nq+1] / elco[nq][2] is
        // 1 / (nq! * (1 + 1/2 + ... + 1/nq)) renormalized; spot-check nq = 2:
        // p(x) = x^2 + 3x + 2 -> pc = [2, 3, 1], el = [2/3, 1, 1/3].
        assert!((s.elco[2][3] / s.elco[2][2] - 1.0 / 3.0).abs() < 1e-15);
    }

    #[test]
    fn test_constants_positive() {
        let mut s = Lsoda::new();
        s.compute_coeffs(Method::Adams);
        for nq in 1..=12 {
            assert!(s.tesco[nq][2] > 0.0, "tesco[{nq}][2] not positive");
        }
        s.compute_coeffs(Method::Bdf);
        for nq in 1..=5 {
            assert!(s.tesco[nq][1] > 0.0);
            assert!(s.tesco[nq][2] > 0.0);
            assert!(s.tesco[nq][3] > 0.0);
        }
    }
}
