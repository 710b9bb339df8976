//! End-to-end integration scenarios: non-stiff, stiff, and switching
//! problems with known answers.

use lsoda::prelude::*;

mod common;
use common::{Decay, Robertson, SHO, VanDerPol};

#[test]
fn exponential_decay_stays_nonstiff() {
    let mut solver = Lsoda::with_settings(Settings::builder().rtol(1e-8).atol(1e-8).build());
    let mut y = [1.0];
    let mut t = 0.0;
    let mut istate = 1;
    solver.step_to(&Decay, &mut y, &mut t, 1.0, Task::Integrate, &mut istate);

    assert_eq!(istate, 2);
    assert_eq!(t, 1.0);
    assert!((y[0] - 0.36787944117).abs() < 5e-8, "y(1) = {}", y[0]);
    // An easy problem never leaves the Adams method.
    assert_eq!(solver.stats().mused, Some(Method::Adams));
    assert!(solver.stats().nst > 0);
}

#[test]
fn robertson_switches_to_bdf() {
    let mut solver = Lsoda::with_settings(Settings::builder().rtol(1e-6).atol(1e-10).build());
    let mut y = [1.0, 0.0, 0.0];
    let mut t = 0.0;
    let mut istate = 1;

    solver.step_to(&Robertson, &mut y, &mut t, 1.0, Task::Integrate, &mut istate);
    assert_eq!(istate, 2);
    // The stiffness shows up well before t = 1.
    assert_eq!(solver.stats().mused, Some(Method::Bdf));

    solver.step_to(&Robertson, &mut y, &mut t, 40.0, Task::Integrate, &mut istate);
    assert_eq!(istate, 2);
    assert!((y[0] - 0.7158).abs() < 5e-4, "y1(40) = {}", y[0]);
    assert!((y[1] - 9.186e-6).abs() < 5e-4, "y2(40) = {}", y[1]);
    assert!((y[2] - 0.2842).abs() < 5e-4, "y3(40) = {}", y[2]);
    // Conservation: the three concentrations always sum to 1.
    assert!((y[0] + y[1] + y[2] - 1.0).abs() < 1e-5);
}

#[test]
fn van_der_pol_1000_completes() {
    let vdp = VanDerPol { mu: 1000.0 };
    let mut solver = Lsoda::with_settings(Settings::builder().rtol(1e-6).atol(1e-8).build());
    let mut y = [2.0, 0.0];
    let mut t = 0.0;
    let mut istate = 1;

    for tout in [500.0, 1000.0, 1500.0, 2000.0, 2500.0, 3000.0] {
        solver.step_to(&vdp, &mut y, &mut t, tout, Task::Integrate, &mut istate);
        assert_eq!(istate, 2, "failed at tout = {tout}, t = {t}");
    }
    assert_eq!(t, 3000.0);
    // The relaxation oscillation stays within its limit cycle bounds.
    assert!(y[0].abs() < 2.5, "y1(3000) = {}", y[0]);
    // A problem this stiff finishes on the BDF method.
    assert_eq!(solver.stats().mused, Some(Method::Bdf));
    assert!(solver.stats().nje > 0);
}

#[test]
fn harmonic_oscillator_round_trip() {
    let tend = 2.0 * std::f64::consts::PI;
    let sol = solve_ivp(&SHO, &[1.0, 0.0], &[0.0, tend], 1e-10, 1e-10).unwrap();
    let y = sol.y.last().unwrap();
    assert!((y[0] - 1.0).abs() < 5e-8, "y1(2pi) = {}", y[0]);
    assert!(y[1].abs() < 5e-8, "y2(2pi) = {}", y[1]);
}

#[test]
fn solve_ivp_grid_matches_single_shot() {
    // Many small tout requests and one big one integrate the same problem.
    let grid: Vec<f64> = (0..=10).map(|i| i as f64 * 0.1).collect();
    let sol = solve_ivp(&Decay, &[1.0], &grid, 1e-8, 1e-8).unwrap();
    assert_eq!(sol.t.len(), 11);
    assert_eq!(sol.y.len(), 11);
    // Row 0 is the initial condition.
    assert_eq!(sol.y[0], vec![1.0]);
    for (t, y) in sol.t.iter().zip(sol.y.iter()) {
        assert!((y[0] - (-t).exp()).abs() < 1e-7, "t = {t}: y = {}", y[0]);
    }

    let table = sol.table();
    assert_eq!(table.len(), 11);
    assert_eq!(table[3].len(), 2);
    assert_eq!(table[3][0], sol.t[3]);
    assert_eq!(table[3][1], sol.y[3][0]);
}

#[test]
fn interpolation_within_last_step() {
    let mut solver = Lsoda::with_settings(Settings::builder().rtol(1e-9).atol(1e-9).build());
    let mut y = [1.0, 0.0];
    let mut t = 0.0;
    let mut istate = 1;
    solver.step_to(&SHO, &mut y, &mut t, 1.0, Task::Integrate, &mut istate);
    assert_eq!(istate, 2);

    // Value at the current internal time matches the reported state.
    let stats = solver.stats();
    let mut yi = [0.0, 0.0];
    solver.interpolate(stats.tn, 0, &mut yi).unwrap();
    assert!((yi[0] - stats.tn.cos()).abs() < 1e-7);

    // First derivative of cos is -sin.
    let mut dyi = [0.0, 0.0];
    solver.interpolate(stats.tn, 1, &mut dyi).unwrap();
    assert!((dyi[0] + stats.tn.sin()).abs() < 1e-6);

    // Far outside the last step interval is rejected.
    assert!(solver.interpolate(stats.tn + 100.0, 0, &mut yi).is_err());
    // So is a derivative order beyond the current method order.
    assert!(solver.interpolate(stats.tn, 13, &mut yi).is_err());
}

#[test]
fn one_step_mode_reports_internal_steps() {
    let mut solver = Lsoda::new();
    let mut y = [1.0];
    let mut t = 0.0;
    let mut istate = 1;
    let mut nst_prev = 0;

    for _ in 0..5 {
        solver.step_to(&Decay, &mut y, &mut t, 10.0, Task::OneStep, &mut istate);
        assert_eq!(istate, 2);
        let stats = solver.stats();
        // Each call takes exactly one internal step and reports tn.
        assert_eq!(stats.nst, nst_prev + 1);
        assert_eq!(t, stats.tn);
        assert!(stats.hu != 0.0);
        assert!(stats.nqu >= 1);
        nst_prev = stats.nst;
    }
}
