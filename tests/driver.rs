//! Driver boundary behavior: input validation, istate codes, tolerance
//! shapes, and the critical-time task modes.

use lsoda::prelude::*;

mod common;
use common::{Constant, Decay};

#[test]
fn zero_neq_rejected_without_touching_state() {
    let mut solver = Lsoda::new();
    let mut y: [Float; 0] = [];
    let mut t = 0.0;
    let mut istate = 1;
    solver.step_to(&Decay, &mut y, &mut t, 1.0, Task::Integrate, &mut istate);
    assert_eq!(istate, -3);
    assert_eq!(t, 0.0);
}

#[test]
fn tout_equal_to_t_rejected() {
    let mut solver = Lsoda::new();
    let mut y = [1.0];
    let mut t = 1.0;
    let mut istate = 1;
    solver.step_to(&Decay, &mut y, &mut t, 1.0, Task::Integrate, &mut istate);
    assert_eq!(istate, -3);
    assert_eq!(y[0], 1.0);
    assert_eq!(t, 1.0);
}

#[test]
fn tout_too_close_to_t_rejected() {
    let mut solver = Lsoda::new();
    let mut y = [1.0];
    let mut t = 1.0;
    let mut istate = 1;
    let tout = 1.0 + f64::EPSILON;
    solver.step_to(&Decay, &mut y, &mut t, tout, Task::Integrate, &mut istate);
    assert_eq!(istate, -3);
    assert_eq!(y[0], 1.0);
}

#[test]
fn bad_istate_rejected() {
    let mut solver = Lsoda::new();
    let mut y = [1.0];
    let mut t = 0.0;
    let mut istate = 7;
    solver.step_to(&Decay, &mut y, &mut t, 1.0, Task::Integrate, &mut istate);
    assert_eq!(istate, -3);
}

#[test]
fn continuation_before_init_rejected() {
    let mut solver = Lsoda::new();
    let mut y = [1.0];
    let mut t = 0.0;
    let mut istate = 2;
    solver.step_to(&Decay, &mut y, &mut t, 1.0, Task::Integrate, &mut istate);
    assert_eq!(istate, -3);
}

#[test]
fn negative_tolerance_rejected() {
    let mut solver = Lsoda::with_settings(Settings::builder().rtol(-1e-6).build());
    let mut y = [1.0];
    let mut t = 0.0;
    let mut istate = 1;
    solver.step_to(&Decay, &mut y, &mut t, 1.0, Task::Integrate, &mut istate);
    assert_eq!(istate, -3);
}

#[test]
fn short_tolerance_vector_rejected() {
    let mut solver = Lsoda::with_settings(Settings::builder().atol(vec![1e-8]).build());
    let mut y = [1.0, 1.0];
    let mut t = 0.0;
    let mut istate = 1;
    solver.step_to(&Constant, &mut y, &mut t, 1.0, Task::Integrate, &mut istate);
    assert_eq!(istate, -3);
}

#[test]
fn unsupported_jacobian_modes_rejected() {
    for jt in [1, 3, 4, 5, 6] {
        let mut solver = Lsoda::with_settings(Settings::builder().jt(jt).build());
        let mut y = [1.0];
        let mut t = 0.0;
        let mut istate = 1;
        solver.step_to(&Decay, &mut y, &mut t, 1.0, Task::Integrate, &mut istate);
        assert_eq!(istate, -3, "jt = {jt} should be rejected");
    }
}

#[test]
fn tcrit_behind_tout_rejected() {
    let mut solver = Lsoda::new();
    let mut y = [1.0];
    let mut t = 0.0;
    let mut istate = 1;
    solver.step_to(
        &Decay,
        &mut y,
        &mut t,
        2.0,
        Task::IntegrateClamped { tcrit: 1.0 },
        &mut istate,
    );
    assert_eq!(istate, -3);
}

// The zero vector field leaves y exactly where it started, whatever the
// shape of the tolerances.
#[test]
fn zero_field_round_trip_all_tolerance_shapes() {
    let y0 = [2.0, -3.0];
    let atol = 1e-10;
    let shapes: [(Tolerance, Tolerance); 4] = [
        (1e-6.into(), atol.into()),
        (1e-6.into(), vec![atol, atol].into()),
        (vec![1e-6, 1e-6].into(), atol.into()),
        (vec![1e-6, 1e-6].into(), vec![atol, atol].into()),
    ];
    for (rtol, atol_tol) in shapes {
        let mut solver =
            Lsoda::with_settings(Settings::builder().rtol(rtol.clone()).atol(atol_tol).build());
        let mut y = y0;
        let mut t = 0.0;
        let mut istate = 1;
        solver.step_to(&Constant, &mut y, &mut t, 1.0, Task::Integrate, &mut istate);
        assert_eq!(istate, 2, "shape {rtol:?}");
        for (yi, y0i) in y.iter().zip(y0.iter()) {
            assert!((yi - y0i).abs() <= atol, "y moved: {yi} vs {y0i}");
        }
    }
}

#[test]
fn one_step_clamped_lands_on_tcrit() {
    let mut solver = Lsoda::new();
    let mut y = [1.0];
    let mut t = 0.0;
    let mut istate = 1;

    let mut steps = 0;
    while t < 1.0 && steps < 500 {
        solver.step_to(
            &Decay,
            &mut y,
            &mut t,
            1.0e10,
            Task::OneStepClamped { tcrit: 1.0 },
            &mut istate,
        );
        assert_eq!(istate, 2, "failed at t = {t}");
        steps += 1;
        if t == 1.0 {
            break;
        }
    }
    assert_eq!(t, 1.0, "did not land on tcrit after {steps} steps");
    assert!((y[0] - (-1.0f64).exp()).abs() < 1e-5);
}

#[test]
fn integrate_clamped_never_steps_past_tcrit() {
    let mut solver = Lsoda::new();
    let mut y = [1.0];
    let mut t = 0.0;
    let mut istate = 1;
    solver.step_to(
        &Decay,
        &mut y,
        &mut t,
        0.5,
        Task::IntegrateClamped { tcrit: 0.5 },
        &mut istate,
    );
    assert_eq!(istate, 2);
    assert_eq!(t, 0.5);
    assert!(solver.stats().tn <= 0.5 * (1.0 + 1e-12));
    assert!((y[0] - (-0.5f64).exp()).abs() < 1e-5);
}

#[test]
fn integrate_past_returns_internal_time() {
    let mut solver = Lsoda::new();
    let mut y = [1.0];
    let mut t = 0.0;
    let mut istate = 1;
    solver.step_to(&Decay, &mut y, &mut t, 0.5, Task::IntegratePast, &mut istate);
    assert_eq!(istate, 2);
    // The reported time is an internal mesh point at or past tout.
    assert!(t >= 0.5);
    assert_eq!(t, solver.stats().tn);
}

#[test]
fn step_budget_reported_as_excess_work() {
    let mut solver = Lsoda::with_settings(Settings::builder().mxstep(3).build());
    let mut y = [1.0];
    let mut t = 0.0;
    let mut istate = 1;
    solver.step_to(&Decay, &mut y, &mut t, 100.0, Task::Integrate, &mut istate);
    assert_eq!(istate, -1);
    // t advanced to wherever the budget ran out.
    assert!(t > 0.0 && t < 100.0);
}

#[test]
fn continuation_resumes_where_it_stopped() {
    let mut solver = Lsoda::with_settings(Settings::builder().rtol(1e-8).atol(1e-8).build());
    let mut y = [1.0];
    let mut t = 0.0;
    let mut istate = 1;
    solver.step_to(&Decay, &mut y, &mut t, 0.5, Task::Integrate, &mut istate);
    assert_eq!(istate, 2);
    solver.step_to(&Decay, &mut y, &mut t, 1.0, Task::Integrate, &mut istate);
    assert_eq!(istate, 2);
    assert!((y[0] - (-1.0f64).exp()).abs() < 1e-7);
}

#[test]
fn tolerance_change_with_istate_3() {
    let mut solver = Lsoda::with_settings(Settings::builder().rtol(1e-4).atol(1e-4).build());
    let mut y = [1.0];
    let mut t = 0.0;
    let mut istate = 1;
    solver.step_to(&Decay, &mut y, &mut t, 0.5, Task::Integrate, &mut istate);
    assert_eq!(istate, 2);

    solver.set_tolerances(1e-10, 1e-10);
    istate = 3;
    solver.step_to(&Decay, &mut y, &mut t, 1.0, Task::Integrate, &mut istate);
    assert_eq!(istate, 2);
    // The error inherited from the loose first leg dominates; the point is
    // that the istate = 3 path accepts the new tolerances and continues.
    assert!((y[0] - (-1.0f64).exp()).abs() < 1e-3);
}

#[test]
fn solve_ivp_empty_grid_is_error() {
    assert!(solve_ivp(&Decay, &[1.0], &[], 1e-6, 1e-6).is_err());
}

#[test]
fn status_codes_round_trip() {
    for code in [2, -1, -2, -3, -4, -5, -6] {
        let status = Status::from_istate(code).unwrap();
        assert_eq!(status.istate(), code);
    }
    assert!(Status::from_istate(1).is_none());
    assert!(Status::from_istate(0).is_none());
}
