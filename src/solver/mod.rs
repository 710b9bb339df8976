//! The integration context and its driver.
//!
//! [`Lsoda`] owns every array and scalar the integrator needs; one context
//! serves one problem at a time and is reused across `step_to` calls.
//! Internally all vectors are 1-indexed (element 0 is padding) so the
//! arithmetic lines up with the ODEPACK reference; the public boundary is
//! 0-indexed.

mod coeffs;
mod corrector;
mod interp;
mod settings;
mod step;

pub use settings::{Settings, Task, Tolerance};

use crate::{
    core::ode::ODE,
    linalg::vmnorm,
    Float, ETA,
};

use coeffs::MORD;

/// Integration method identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// Implicit Adams-Moulton predictor-corrector (non-stiff).
    Adams,
    /// Backward Differentiation Formulas (stiff).
    Bdf,
}

impl Method {
    /// The classic integer method code (1 = Adams, 2 = BDF).
    pub fn code(self) -> usize {
        match self {
            Method::Adams => 1,
            Method::Bdf => 2,
        }
    }
}

/// Corrector iteration variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Iter {
    /// Functional (fixed-point) iteration, no matrix.
    Functional,
    /// Chord (modified Newton) iteration with an LU-factored iteration
    /// matrix P = I - h*el0*J.
    Chord,
}

/// Snapshot of the integration counters and step state.
#[derive(Debug, Clone, Copy)]
pub struct Stats {
    /// Accepted steps so far.
    pub nst: usize,
    /// Right-hand-side evaluations.
    pub nfe: usize,
    /// Jacobian evaluations (and LU factorizations).
    pub nje: usize,
    /// Current method order.
    pub nq: usize,
    /// Order used on the last accepted step.
    pub nqu: usize,
    /// Step size to be attempted next.
    pub h: Float,
    /// Step size of the last accepted step.
    pub hu: Float,
    /// Internal time reached.
    pub tn: Float,
    /// Time of the last method switch.
    pub tsw: Float,
    /// Method currently selected.
    pub meth: Method,
    /// Method used on the last accepted step (`None` before the first).
    pub mused: Option<Method>,
    /// Component (0-indexed) with the largest weighted error on a -4/-5
    /// return.
    pub imxer: usize,
    /// Tolerance scale factor computed on a -2/-3 accuracy return.
    pub tolsf: Float,
}

/// The integration context.
///
/// Create one per problem with [`Lsoda::new`] or [`Lsoda::with_settings`],
/// then advance it with repeated [`Lsoda::step_to`] calls. All storage is
/// allocated on the first call (`istate = 1`) and reused afterwards; a
/// context is not thread-safe and two concurrent integrations need two
/// contexts.
pub struct Lsoda {
    settings: Settings,

    // Problem size and call-state bookkeeping.
    n: usize,
    init: bool,
    illin: usize,
    imxer: usize,
    tolsf: Float,

    // Method selection.
    meth: Method,
    mused: Option<Method>,
    miter: Iter,
    maxord: usize,
    mxordn: usize,
    mxords: usize,

    // Step state.
    jstart: i32,
    kflag: i32,
    nq: usize,
    l: usize,
    lmax: usize,
    tn: Float,
    h: Float,
    hu: Float,
    hold: Float,
    hmin: Float,
    hmxi: Float,
    tsw: Float,
    nst: usize,
    nfe: usize,
    nje: usize,
    nqu: usize,
    nslast: usize,
    nhnil: usize,
    mxstep: usize,
    mxhnil: usize,
    ixpr: bool,

    // Corrector control.
    ccmax: Float,
    maxcor: usize,
    msbp: usize,
    mxncf: usize,
    ipup: bool,
    jcur: bool,
    ierpj: bool,
    conv_rate: Float,
    rc: Float,
    el0: Float,
    conit: Float,
    nslp: usize,
    sqrteta: Float,

    // Step/order/method adaptation.
    ialth: usize,
    rmax: Float,
    pdnorm: Float,
    pdest: Float,
    pdlast: Float,
    ratio: Float,
    icount: i32,
    irflag: bool,

    // Method coefficient tables (1-indexed by order).
    el: [Float; 14],
    elco: [[Float; 14]; 13],
    tesco: [[Float; 4]; 13],
    cm1: [Float; 13],
    cm2: [Float; 6],

    // Working storage, sized on the first call.
    yh: Vec<Vec<Float>>,
    wm: Vec<Vec<Float>>,
    ewt: Vec<Float>,
    savf: Vec<Float>,
    acor: Vec<Float>,
    ipvt: Vec<usize>,
}

impl Default for Lsoda {
    fn default() -> Self {
        Lsoda::new()
    }
}

impl Lsoda {
    /// Context with default [`Settings`].
    pub fn new() -> Self {
        Lsoda::with_settings(Settings::default())
    }

    /// Context with explicit [`Settings`].
    pub fn with_settings(settings: Settings) -> Self {
        Lsoda {
            settings,
            n: 0,
            init: false,
            illin: 0,
            imxer: 0,
            tolsf: 0.0,
            meth: Method::Adams,
            mused: None,
            miter: Iter::Functional,
            maxord: MORD[0],
            mxordn: MORD[0],
            mxords: MORD[1],
            jstart: 0,
            kflag: 0,
            nq: 0,
            l: 0,
            lmax: 0,
            tn: 0.0,
            h: 0.0,
            hu: 0.0,
            hold: 0.0,
            hmin: 0.0,
            hmxi: 0.0,
            tsw: 0.0,
            nst: 0,
            nfe: 0,
            nje: 0,
            nqu: 0,
            nslast: 0,
            nhnil: 0,
            mxstep: 0,
            mxhnil: 0,
            ixpr: false,
            ccmax: 0.0,
            maxcor: 0,
            msbp: 0,
            mxncf: 0,
            ipup: false,
            jcur: false,
            ierpj: false,
            conv_rate: 0.0,
            rc: 0.0,
            el0: 0.0,
            conit: 0.0,
            nslp: 0,
            sqrteta: 0.0,
            ialth: 0,
            rmax: 0.0,
            pdnorm: 0.0,
            pdest: 0.0,
            pdlast: 0.0,
            ratio: 0.0,
            icount: 0,
            irflag: false,
            el: [0.0; 14],
            elco: [[0.0; 14]; 13],
            tesco: [[0.0; 4]; 13],
            cm1: [0.0; 13],
            cm2: [0.0; 6],
            yh: Vec::new(),
            wm: Vec::new(),
            ewt: Vec::new(),
            savf: Vec::new(),
            acor: Vec::new(),
            ipvt: Vec::new(),
        }
    }

    /// Replace the tolerances; takes effect on the next call made with
    /// `istate = 3` (or a fresh `istate = 1` start).
    pub fn set_tolerances(&mut self, rtol: impl Into<Tolerance>, atol: impl Into<Tolerance>) {
        self.settings.rtol = rtol.into();
        self.settings.atol = atol.into();
    }

    /// Counters and step state of this context.
    pub fn stats(&self) -> Stats {
        Stats {
            nst: self.nst,
            nfe: self.nfe,
            nje: self.nje,
            nq: self.nq,
            nqu: self.nqu,
            h: self.h,
            hu: self.hu,
            tn: self.tn,
            tsw: self.tsw,
            meth: self.meth,
            mused: self.mused,
            imxer: self.imxer,
            tolsf: self.tolsf,
        }
    }

    /// Advance the solution in `y` from `*t` toward `tout`.
    ///
    /// `istate` must be 1 on the first call for a problem, 2 to continue,
    /// or 3 to continue after changing tolerances or settings. On return it
    /// holds 2 on success or a negative completion code (see [`crate::Status`]).
    /// `itask` selects what "advance" means; see [`Task`].
    ///
    /// On any return with `istate >= 2` or `istate <= -4`, `y` and `*t` hold
    /// the solution state described by the task semantics; on illegal input
    /// (`istate = -3`) they are untouched.
    pub fn step_to<F: ODE>(
        &mut self,
        f: &F,
        y: &mut [Float],
        t: &mut Float,
        tout: Float,
        itask: Task,
        istate: &mut i32,
    ) {
        let mut y1 = Vec::with_capacity(y.len() + 1);
        y1.push(0.0);
        y1.extend_from_slice(y);
        self.drive(f, &mut y1, t, tout, itask, istate);
        y.copy_from_slice(&y1[1..]);
    }

    fn drive<F: ODE>(
        &mut self,
        f: &F,
        y: &mut [Float],
        t: &mut Float,
        tout: Float,
        itask: Task,
        istate: &mut i32,
    ) {
        // Block a: legality of istate and the call sequencing.
        if *istate < 1 || *istate > 3 {
            log::error!("[lsoda] illegal istate = {istate}");
            return self.illegal(istate);
        }
        if !self.init && (*istate == 2 || *istate == 3) {
            log::error!("[lsoda] istate > 1 but lsoda not initialized");
            return self.illegal(istate);
        }

        let neq = y.len() - 1;
        let mut ihit = false;

        // Block b: the initial call (istate = 1) and parameter-change
        // continuations (istate = 3) validate everything and (re)load the
        // option block.
        if *istate == 1 || *istate == 3 {
            if neq == 0 {
                log::error!("[lsoda] neq = 0 is less than 1");
                return self.illegal(istate);
            }
            if *istate == 3 && neq > self.n {
                log::error!("[lsoda] istate = 3 and neq increased");
                return self.illegal(istate);
            }
            self.n = neq;

            let jt = self.settings.jt;
            if jt == 3 || jt < 1 || jt > 5 {
                log::error!("[lsoda] jt = {jt} illegal");
                return self.illegal(istate);
            }
            if jt > 2 {
                match (self.settings.ml, self.settings.mu) {
                    (Some(ml), _) if ml >= self.n => {
                        log::error!("[lsoda] ml = {ml} not between 1 and neq");
                        return self.illegal(istate);
                    }
                    (_, Some(mu)) if mu >= self.n => {
                        log::error!("[lsoda] mu = {mu} not between 1 and neq");
                        return self.illegal(istate);
                    }
                    _ => {}
                }
            }
            if jt != 2 {
                log::error!("[lsoda] jt = {jt} is an unsupported Jacobian mode; only the internal full finite-difference Jacobian (jt = 2) is available");
                return self.illegal(istate);
            }

            // Optional inputs.
            self.ixpr = self.settings.ixpr;
            self.mxstep = if self.settings.mxstep == 0 { 5000 } else { self.settings.mxstep };
            self.mxhnil = self.settings.mxhnil;
            if *istate == 1 {
                self.mxordn = match self.settings.mxordn {
                    0 => MORD[0],
                    m => m.min(MORD[0]),
                };
                self.mxords = match self.settings.mxords {
                    0 => MORD[1],
                    m => m.min(MORD[1]),
                };
                if let Some(h0) = self.settings.h0 {
                    if (tout - *t) * h0 < 0.0 {
                        log::error!(
                            "[lsoda] tout = {tout} behind t = {t}. integration direction is given by {h0}"
                        );
                        return self.illegal(istate);
                    }
                }
            }
            match self.settings.hmax {
                Some(hmax) if hmax < 0.0 => {
                    log::error!("[lsoda] hmax < 0.");
                    return self.illegal(istate);
                }
                Some(hmax) if hmax > 0.0 => self.hmxi = 1.0 / hmax,
                _ => self.hmxi = 0.0,
            }
            self.hmin = self.settings.hmin;
            if self.hmin < 0.0 {
                log::error!("[lsoda] hmin < 0.");
                return self.illegal(istate);
            }

            // Tolerance legality.
            if let Some(len) = self.settings.rtol.len() {
                if len < self.n {
                    log::error!("[lsoda] rtol vector shorter than neq");
                    return self.illegal(istate);
                }
            }
            if let Some(len) = self.settings.atol.len() {
                if len < self.n {
                    log::error!("[lsoda] atol vector shorter than neq");
                    return self.illegal(istate);
                }
            }
            let rtol_min = self.settings.rtol.min_value();
            if rtol_min < 0.0 {
                log::error!("[lsoda] rtol = {rtol_min} is less than 0.");
                return self.illegal(istate);
            }
            let atol_min = self.settings.atol.min_value();
            if atol_min < 0.0 {
                log::error!("[lsoda] atol = {atol_min} is less than 0.");
                return self.illegal(istate);
            }
        }

        // Allocate the working storage on the initial call; istate = 3 keeps
        // the existing arrays (n never grows).
        if *istate == 1 {
            self.sqrteta = ETA.sqrt();
            self.meth = Method::Adams;
            let lenyh = 1 + self.mxordn.max(self.mxords);
            self.yh = vec![vec![0.0; self.n + 1]; lenyh + 1];
            self.wm = vec![vec![0.0; self.n + 1]; self.n + 1];
            self.ewt = vec![0.0; self.n + 1];
            self.savf = vec![0.0; self.n + 1];
            self.acor = vec![0.0; self.n + 1];
            self.ipvt = vec![0; self.n + 1];
        }

        // Signal parameter changes to the step core.
        if *istate == 3 {
            self.jstart = -1;
        }

        // Block c: remaining initializations, the first call to f, and the
        // initial step size.
        if *istate == 1 {
            self.tn = *t;
            self.tsw = *t;
            self.maxord = self.mxordn;
            let mut h0 = self.settings.h0.unwrap_or(0.0);
            if let Some(tcrit) = itask.tcrit() {
                if (tcrit - tout) * (tout - *t) < 0.0 {
                    log::error!("[lsoda] itask = 4 or 5 and tcrit behind tout");
                    return self.illegal(istate);
                }
                if h0 != 0.0 && (*t + h0 - tcrit) * h0 > 0.0 {
                    h0 = tcrit - *t;
                }
            }

            self.jstart = 0;
            self.nhnil = 0;
            self.nst = 0;
            self.nje = 0;
            self.nslast = 0;
            self.hu = 0.0;
            self.nqu = 0;
            self.mused = None;
            self.miter = Iter::Functional;
            self.ccmax = 0.3;
            self.maxcor = 3;
            self.msbp = 20;
            self.mxncf = 10;

            // Initial call to f, result into yh[2].
            f.ode(*t, &y[1..], &mut self.yh[2][1..]);
            self.nfe = 1;
            for i in 1..=self.n {
                self.yh[1][i] = y[i];
            }

            // Load and invert the error weights (h is temporarily 1).
            self.nq = 1;
            self.h = 1.0;
            ewset(
                &mut self.ewt,
                &self.settings.rtol,
                &self.settings.atol,
                self.n,
                y,
            );
            for i in 1..=self.n {
                if self.ewt[i] <= 0.0 {
                    log::error!("[lsoda] ewt[{}] = {} <= 0.", i - 1, self.ewt[i]);
                    *istate = -6;
                    return self.fatal_return(y, t);
                }
                self.ewt[i] = 1.0 / self.ewt[i];
            }

            // Initial step size h0, unless the user supplied one. The rule:
            // h0^(-2) = 1 / (tol * w0^2) + tol * ||f||^2 with the weighted
            // norm, w0 = max(|t|, |tout|), and tol from the tolerances,
            // clamped to [100*ETA, 1e-3].
            if h0 == 0.0 {
                let tdist = (tout - *t).abs();
                let w0 = Float::max(t.abs(), tout.abs());
                if tdist < 2.0 * ETA * w0 {
                    log::error!("[lsoda] tout too close to t to start integration");
                    return self.illegal(istate);
                }
                let mut tol = self.settings.rtol.max_value();
                if tol <= 0.0 {
                    for i in 1..=self.n {
                        let atoli = self.settings.atol[i - 1];
                        let ayi = y[i].abs();
                        if ayi != 0.0 {
                            tol = Float::max(tol, atoli / ayi);
                        }
                    }
                }
                tol = tol.max(100.0 * ETA).min(0.001);
                let mut sum = vmnorm(self.n, &self.yh[2], &self.ewt);
                sum = 1.0 / (tol * w0 * w0) + tol * sum * sum;
                h0 = 1.0 / sum.sqrt();
                h0 = h0.min(tdist);
                h0 = sign(h0, tout - *t);
            }

            // Honor the hmax bound.
            let rh = h0.abs() * self.hmxi;
            if rh > 1.0 {
                h0 /= rh;
            }

            self.h = h0;
            for i in 1..=self.n {
                self.yh[2][i] *= h0;
            }
        }

        // Block d: continuation calls check stop conditions before stepping.
        if *istate == 2 || *istate == 3 {
            self.nslast = self.nst;
            match itask {
                Task::Integrate => {
                    if (self.tn - tout) * self.h >= 0.0 {
                        if self.interp_into(tout, 0, y).is_err() {
                            log::error!(
                                "[lsoda] trouble from interpolation, itask = 1, tout = {tout}"
                            );
                            return self.illegal(istate);
                        }
                        *t = tout;
                        *istate = 2;
                        self.illin = 0;
                        return;
                    }
                }
                Task::OneStep => {}
                Task::IntegratePast => {
                    let tp = self.tn - self.hu * (1.0 + 100.0 * ETA);
                    if (tp - tout) * self.h > 0.0 {
                        log::error!("[lsoda] itask = 3 and tout behind tcur - hu");
                        return self.illegal(istate);
                    }
                    if (self.tn - tout) * self.h >= 0.0 {
                        return self.success_return(y, t, itask, ihit, istate);
                    }
                }
                Task::IntegrateClamped { tcrit } => {
                    if (self.tn - tcrit) * self.h > 0.0 {
                        log::error!("[lsoda] itask = 4 or 5 and tcrit behind tcur");
                        return self.illegal(istate);
                    }
                    if (tcrit - tout) * self.h < 0.0 {
                        log::error!("[lsoda] itask = 4 or 5 and tcrit behind tout");
                        return self.illegal(istate);
                    }
                    if (self.tn - tout) * self.h >= 0.0 {
                        if self.interp_into(tout, 0, y).is_err() {
                            log::error!(
                                "[lsoda] trouble from interpolation, itask = 4, tout = {tout}"
                            );
                            return self.illegal(istate);
                        }
                        *t = tout;
                        *istate = 2;
                        self.illin = 0;
                        return;
                    }
                }
                Task::OneStepClamped { tcrit } => {
                    if (self.tn - tcrit) * self.h > 0.0 {
                        log::error!("[lsoda] itask = 4 or 5 and tcrit behind tcur");
                        return self.illegal(istate);
                    }
                    let hmx = self.tn.abs() + self.h.abs();
                    ihit = (self.tn - tcrit).abs() <= 100.0 * ETA * hmx;
                    if ihit {
                        return self.success_return(y, t, itask, ihit, istate);
                    }
                    let tnext = self.tn + self.h * (1.0 + 4.0 * ETA);
                    if (tnext - tcrit) * self.h > 0.0 {
                        self.h = (tcrit - self.tn) * (1.0 - 4.0 * ETA);
                        if *istate == 2 {
                            self.jstart = -2;
                        }
                    }
                }
            }
        }

        // Block e: the main integration loop. Each pass refreshes the error
        // weights, guards against a too-tight tolerance and vanishing steps,
        // and takes one core step.
        loop {
            if !(*istate == 1 && self.nst == 0) {
                if self.nst - self.nslast >= self.mxstep {
                    log::error!(
                        "[lsoda] {} steps taken before reaching tout",
                        self.mxstep
                    );
                    *istate = -1;
                    return self.fatal_return(y, t);
                }
                ewset(
                    &mut self.ewt,
                    &self.settings.rtol,
                    &self.settings.atol,
                    self.n,
                    &self.yh[1],
                );
                for i in 1..=self.n {
                    if self.ewt[i] <= 0.0 {
                        log::error!("[lsoda] ewt[{}] = {} <= 0.", i - 1, self.ewt[i]);
                        *istate = -6;
                        return self.fatal_return(y, t);
                    }
                    self.ewt[i] = 1.0 / self.ewt[i];
                }
            }

            self.tolsf = ETA * vmnorm(self.n, &self.yh[1], &self.ewt);
            if self.tolsf > 1.0 {
                self.tolsf *= 2.0;
                if self.nst == 0 {
                    log::error!(
                        "[lsoda] at start of problem, too much accuracy requested for precision of machine, suggested scaling factor = {}",
                        self.tolsf
                    );
                    return self.illegal(istate);
                }
                log::error!(
                    "[lsoda] at t = {}, too much accuracy requested for precision of machine, suggested scaling factor = {}",
                    *t,
                    self.tolsf
                );
                *istate = -2;
                return self.fatal_return(y, t);
            }

            if self.tn + self.h == self.tn {
                self.nhnil += 1;
                if self.nhnil <= self.mxhnil {
                    log::warn!(
                        "[lsoda] internal t = {} and h = {} are such that t + h = t on the next step; solver will continue anyway",
                        self.tn,
                        self.h
                    );
                    if self.nhnil == self.mxhnil {
                        log::warn!(
                            "[lsoda] above warning has been issued {} times, it will not be issued again for this problem",
                            self.nhnil
                        );
                    }
                }
            }

            self.step(f, y);

            if self.kflag == 0 {
                // Block f: a successful step. Complete a pending method
                // switch, then apply the task-specific return logic.
                self.init = true;
                if self.mused != Some(self.meth) {
                    self.tsw = self.tn;
                    self.maxord = match self.meth {
                        Method::Adams => self.mxordn,
                        Method::Bdf => self.mxords,
                    };
                    self.jstart = -1;
                    if self.ixpr {
                        match self.meth {
                            Method::Bdf => {
                                log::info!("[lsoda] a switch to the stiff method has occurred at t = {}", self.tn)
                            }
                            Method::Adams => {
                                log::info!("[lsoda] a switch to the nonstiff method has occurred at t = {}", self.tn)
                            }
                        }
                    }
                }

                match itask {
                    Task::Integrate => {
                        if (self.tn - tout) * self.h < 0.0 {
                            continue;
                        }
                        let _ = self.interp_into(tout, 0, y);
                        *t = tout;
                        *istate = 2;
                        self.illin = 0;
                        return;
                    }
                    Task::OneStep => {
                        return self.success_return(y, t, itask, ihit, istate);
                    }
                    Task::IntegratePast => {
                        if (self.tn - tout) * self.h >= 0.0 {
                            return self.success_return(y, t, itask, ihit, istate);
                        }
                        continue;
                    }
                    Task::IntegrateClamped { tcrit } => {
                        if (self.tn - tout) * self.h >= 0.0 {
                            let _ = self.interp_into(tout, 0, y);
                            *t = tout;
                            *istate = 2;
                            self.illin = 0;
                            return;
                        }
                        let hmx = self.tn.abs() + self.h.abs();
                        ihit = (self.tn - tcrit).abs() <= 100.0 * ETA * hmx;
                        if ihit {
                            return self.success_return(y, t, itask, ihit, istate);
                        }
                        let tnext = self.tn + self.h * (1.0 + 4.0 * ETA);
                        if (tnext - tcrit) * self.h <= 0.0 {
                            continue;
                        }
                        self.h = (tcrit - self.tn) * (1.0 - 4.0 * ETA);
                        self.jstart = -2;
                        continue;
                    }
                    Task::OneStepClamped { tcrit } => {
                        let hmx = self.tn.abs() + self.h.abs();
                        ihit = (self.tn - tcrit).abs() <= 100.0 * ETA * hmx;
                        return self.success_return(y, t, itask, ihit, istate);
                    }
                }
            }

            // kflag = -1: error test failed repeatedly or with |h| = hmin.
            // kflag = -2: corrector convergence failed likewise.
            log::error!(
                "[lsoda] at t = {} and step size h = {}, the {}",
                self.tn,
                self.h,
                if self.kflag == -1 {
                    "error test failed repeatedly or with |h| = hmin"
                } else {
                    "corrector convergence failed repeatedly or with |h| = hmin"
                }
            );
            *istate = if self.kflag == -1 { -4 } else { -5 };
            let mut big = 0.0;
            self.imxer = 0;
            for i in 1..=self.n {
                let size = self.acor[i].abs() * self.ewt[i];
                if big < size {
                    big = size;
                    self.imxer = i - 1;
                }
            }
            return self.fatal_return(y, t);
        }
    }

    /// Record an illegal-input return. Five in a row without an intervening
    /// success log the infinite-loop diagnostic instead.
    fn illegal(&mut self, istate: &mut i32) {
        if self.illin == 5 {
            log::error!(
                "[lsoda] repeated occurrence of illegal input. run aborted.. apparent infinite loop"
            );
        } else {
            self.illin += 1;
            *istate = -3;
        }
    }

    /// Copy the last good state back to the caller on a fatal return.
    fn fatal_return(&mut self, y: &mut [Float], t: &mut Float) {
        for i in 1..=self.n {
            y[i] = self.yh[1][i];
        }
        *t = self.tn;
        self.illin = 0;
    }

    /// A successful non-interpolating return: report the internal state,
    /// snapping to tcrit when the clamped tasks hit it.
    fn success_return(
        &mut self,
        y: &mut [Float],
        t: &mut Float,
        itask: Task,
        ihit: bool,
        istate: &mut i32,
    ) {
        for i in 1..=self.n {
            y[i] = self.yh[1][i];
        }
        *t = self.tn;
        if let Some(tcrit) = itask.tcrit() {
            if ihit {
                *t = tcrit;
            }
        }
        *istate = 2;
        self.illin = 0;
    }
}

/// Error-weight vector: ewt[i] = rtol[i]*|ycur[i]| + atol[i], covering the
/// four scalar/vector tolerance shapes through [`Tolerance`]'s indexing.
/// The caller checks positivity and inverts.
fn ewset(ewt: &mut [Float], rtol: &Tolerance, atol: &Tolerance, n: usize, ycur: &[Float]) {
    for i in 1..=n {
        ewt[i] = rtol[i - 1] * ycur[i].abs() + atol[i - 1];
    }
}

/// Fortran SIGN: |a| with the sign of b.
pub(crate) fn sign(a: Float, b: Float) -> Float {
    if b >= 0.0 {
        a.abs()
    } else {
        -a.abs()
    }
}
