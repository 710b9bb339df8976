//! Interpolated values of the solution and its derivatives.
//!
//! The Nordsieck history corresponds uniquely to a vector-valued polynomial
//! of degree nq; evaluating it (or its k-th derivative) at any t inside the
//! last step interval gives
//!
//!   dky[i] = sum over j = k..nq of c(j,k) * (t - tn)^(j-k) * h^(-j) * yh[j+1][i]
//!
//! with the falling-factorial coefficients c(j,k) = j*(j-1)*...*(j-k+1).
//! The sum is evaluated by Horner's rule in reverse order.

use crate::{error::Error, Float, ETA};

use super::{sign, Lsoda};

impl Lsoda {
    /// Evaluate the k-th derivative of the solution polynomial at `t`,
    /// writing into the (0-indexed) slice `dky` of length n.
    ///
    /// `t` must lie in the interval covered by the last step,
    /// `[tn - hu, tn]`, up to a fuzz of `100*ETA*(|tn| + |hu|)`, and
    /// `k` must be between 0 and the current order.
    pub fn interpolate(&self, t: Float, k: usize, dky: &mut [Float]) -> Result<(), Error> {
        if !self.init {
            return Err(Error::IllegalInput(
                "interpolate called before any successful step".into(),
            ));
        }
        let mut work = vec![0.0; self.n + 1];
        self.interp_into(t, k, &mut work)?;
        dky.copy_from_slice(&work[1..]);
        Ok(())
    }

    /// 1-indexed interpolation core shared with the driver.
    pub(crate) fn interp_into(&self, t: Float, k: usize, dky: &mut [Float]) -> Result<(), Error> {
        if k > self.nq {
            log::error!("[lsoda] interpolation derivative order k = {k} illegal");
            return Err(Error::BadDerivativeOrder { k, nq: self.nq });
        }

        let tfuzz = 100.0 * ETA * sign(self.tn.abs() + self.hu.abs(), self.hu);
        let tp = self.tn - self.hu - tfuzz;
        let tn1 = self.tn + tfuzz;
        if (t - tp) * (t - tn1) > 0.0 {
            log::error!(
                "[lsoda] interpolation time t = {t} not in interval tcur - hu to tcur"
            );
            return Err(Error::InterpolationOutOfRange {
                t,
                tmin: Float::min(tp, tn1),
                tmax: Float::max(tp, tn1),
            });
        }

        let s = (t - self.tn) / self.h;
        let mut ic: usize = 1;
        for jj in (self.l - k)..=self.nq {
            ic *= jj;
        }
        let mut c = ic as Float;
        for i in 1..=self.n {
            dky[i] = c * self.yh[self.l][i];
        }

        for j in (k..self.nq).rev() {
            let jp1 = j + 1;
            let mut ic: usize = 1;
            for jj in (jp1 - k)..=j {
                ic *= jj;
            }
            c = ic as Float;
            for i in 1..=self.n {
                dky[i] = c * self.yh[jp1][i] + s * dky[i];
            }
        }
        if k == 0 {
            return Ok(());
        }

        let r = self.h.powi(-(k as i32));
        for i in 1..=self.n {
            dky[i] *= r;
        }
        Ok(())
    }
}
