use anyhow::{format_err, Result};

use crate::bus_types::BusType;
use crate::error::{HelmError, ModelError};
use crate::mpc::{Branch, Bus, Case, PQ, REF};
use crate::mpopt::HelmOpt;
use crate::pf::{runpf, PowerFlow, Status};
use crate::qlim::{Bound, LimitState};
use crate::tests::mpcase::*;

fn setup() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn t_is(got: f64, expected: f64, tol: f64, msg: &str) -> Result<()> {
    if (got - expected).abs() > tol {
        return Err(format_err!(
            "{}: expected {} got {} (tolerance {})",
            msg,
            expected,
            got,
            tol
        ));
    }
    Ok(())
}

fn t_balance(pf: &PowerFlow) -> Result<()> {
    let balance = pf.balance.ok_or(format_err!("missing power balance"))?;
    if balance.residual() > 1e-6 * balance.demanded.norm() {
        return Err(format_err!("power balance not satisfied: {:?}", balance));
    }
    Ok(())
}

/// Net power injected into the network at bus `bus_i` from branch flows.
fn branch_injection(pf: &PowerFlow, bus_i: usize) -> (f64, f64) {
    let mut s = (0.0, 0.0);
    for br in &pf.branch {
        if br.f_bus == bus_i {
            s.0 += br.pf;
            s.1 += br.qf;
        }
        if br.t_bus == bus_i {
            s.0 += br.pt;
            s.1 += br.qt;
        }
    }
    s
}

fn tight() -> Result<HelmOpt> {
    Ok(HelmOpt::builder().mismatch(1e-10).build()?)
}

#[test]
fn test_helm_case2() -> Result<()> {
    setup();
    let pf = runpf(&case2(), &HelmOpt::default())?;

    assert_eq!(pf.status, Status::Converged);
    assert_eq!(pf.restarts, 0);
    assert_eq!(pf.trace.len(), 1);
    assert!(pf.trace[0] < 30);
    assert_eq!(pf.trace[0] % 2, 1);

    let b1 = pf.bus(1).ok_or(format_err!("bus 1"))?;
    let b2 = pf.bus(2).ok_or(format_err!("bus 2"))?;
    t_is(b1.vm, 1.0, 1e-12, "slack Vm")?;
    t_is(b1.va, 0.0, 1e-9, "slack Va")?;
    assert!(b2.vm < 1.0);
    t_is(b2.vm, 0.930275, 1e-4, "Vm bus 2")?;
    t_is(b2.va, -5.8613, 1e-2, "Va bus 2")?;

    Ok(())
}

#[test]
fn test_helm_case2_flows() -> Result<()> {
    setup();
    let pf = runpf(&case2(), &tight()?)?;
    assert!(pf.converged());

    let br = &pf.branch[0];
    assert_eq!((br.f_bus, br.t_bus), (1, 2));
    t_is(br.pt, -100.0, 1e-6, "Pt")?;
    t_is(br.qt, -50.0, 1e-6, "Qt")?;
    t_is(br.p_total, br.pf + br.pt, 1e-9, "P loss")?;
    t_is(br.q_total, 10.0 * br.p_total, 1e-6, "Q loss = x/r P loss")?;

    let b1 = pf.bus(1).ok_or(format_err!("bus 1"))?;
    t_is(b1.pg, br.pf, 1e-9, "slack Pg")?;
    t_is(b1.qg, br.qf, 1e-9, "slack Qg")?;
    t_is(b1.pg, 101.4444, 1e-3, "slack Pg")?;

    t_balance(&pf)
}

#[test]
fn test_helm_q_limits() -> Result<()> {
    setup();
    let opt = HelmOpt::builder().mismatch(1e-8).build()?;
    let pf = runpf(&case3_qlim(), &opt)?;

    assert!(pf.converged());
    assert_eq!(pf.restarts, 1);
    assert_eq!(pf.trace.len(), 2);

    let b2 = pf.bus(2).ok_or(format_err!("bus 2"))?;
    assert_eq!(b2.bus_type, BusType::PQ);
    assert_eq!(b2.limit, LimitState::Limited(Bound::Upper));
    t_is(b2.qg, 10.0, 1e-9, "Qg bus 2")?;
    t_is(b2.pg, 50.0, 1e-9, "Pg bus 2")?;
    assert!(b2.vm < 1.05);
    t_is(b2.vm, 0.952783, 1e-5, "Vm bus 2")?;

    // bus 2 now injects exactly its limited output
    let (p, q) = branch_injection(&pf, 2);
    t_is(p, 50.0, 1e-5, "P injection bus 2")?;
    t_is(q, 10.0, 1e-5, "Q injection bus 2")?;

    let b1 = pf.bus(1).ok_or(format_err!("bus 1"))?;
    assert_eq!(b1.limit, LimitState::Normal);

    t_balance(&pf)
}

#[test]
fn test_helm_successive_q_limits() -> Result<()> {
    setup();
    let opt = HelmOpt::builder().mismatch(1e-8).build()?;
    let pf = runpf(&case4_qlim(), &opt)?;

    assert!(pf.converged());
    assert_eq!(pf.restarts, 2);
    assert_eq!(pf.trace.len(), pf.restarts + 1);

    for (bus_i, qmax) in [(2, 10.0), (3, 70.0)] {
        let b = pf.bus(bus_i).ok_or(format_err!("bus {}", bus_i))?;
        assert_eq!(b.bus_type, BusType::PQ);
        assert_eq!(b.limit, LimitState::Limited(Bound::Upper));
        t_is(b.qg, qmax, 1e-9, "Qg at limit")?;

        let (_, q) = branch_injection(&pf, bus_i);
        t_is(q, qmax, 1e-5, "Q injection")?;
    }
    t_is(pf.bus[1].vm, 0.974427, 1e-5, "Vm bus 2")?;
    t_is(pf.bus[2].vm, 1.005874, 1e-5, "Vm bus 3")?;
    t_is(pf.bus[3].vm, 0.937413, 1e-5, "Vm bus 4")?;

    t_balance(&pf)
}

#[test]
fn test_helm_ignore_q_limits() -> Result<()> {
    setup();
    let opt = HelmOpt::builder().enforce_q_limits(false).build()?;
    let pf = runpf(&case3_qlim(), &opt)?;

    assert!(pf.converged());
    assert_eq!(pf.restarts, 0);
    assert_eq!(pf.trace.len(), 1);

    let b2 = pf.bus(2).ok_or(format_err!("bus 2"))?;
    assert_eq!(b2.bus_type, BusType::PV);
    assert_eq!(b2.limit, LimitState::Normal);
    t_is(b2.vm, 1.05, 1e-4, "Vm bus 2")?;
    assert!(b2.qg > 10.0);

    Ok(())
}

#[test]
fn test_helm_lossless() -> Result<()> {
    setup();
    let pf = runpf(&case3_lossless(), &tight()?)?;
    assert!(pf.converged());

    let balance = pf.balance.ok_or(format_err!("missing power balance"))?;
    t_is(balance.mismatch.re, 0.0, 1e-6, "real losses")?;
    t_is(balance.generated.re, balance.demanded.re, 1e-6, "P balance")?;

    let b1 = pf.bus(1).ok_or(format_err!("bus 1"))?;
    t_is(b1.pg, 40.0, 1e-6, "slack Pg")?;
    let b2 = pf.bus(2).ok_or(format_err!("bus 2"))?;
    t_is(b2.vm, 1.02, 1e-8, "Vm bus 2")?;

    t_balance(&pf)
}

#[test]
fn test_helm_transformers() -> Result<()> {
    setup();
    let pf = runpf(&case4_tap(), &tight()?)?;
    assert!(pf.converged());
    assert_eq!(pf.restarts, 0);

    t_is(pf.bus[0].vm, 1.02, 1e-10, "slack Vm")?;
    t_is(pf.bus[1].vm, 1.01, 1e-8, "Vm bus 2")?;
    t_is(pf.bus[2].vm, 1.016535, 1e-5, "Vm bus 3")?;
    t_is(pf.bus[3].vm, 1.000791, 1e-5, "Vm bus 4")?;

    // load buses draw their demand through the branches and shunt
    let (p, q) = branch_injection(&pf, 4);
    t_is(p, -40.0, 1e-6, "P injection bus 4")?;
    t_is(q, -10.0, 1e-6, "Q injection bus 4")?;

    let (p, _) = branch_injection(&pf, 2);
    t_is(p, 20.0, 1e-6, "P injection bus 2")?;

    t_balance(&pf)
}

#[test]
fn test_helm_pv_conductance() -> Result<()> {
    setup();
    let pf = runpf(&case3_pv_shunt(), &tight()?)?;
    assert!(pf.converged());

    // Pg = branch flows + Gs |V|^2
    let b2 = pf.bus(2).ok_or(format_err!("bus 2"))?;
    t_is(b2.vm, 1.02, 1e-8, "Vm bus 2")?;
    let (p, _) = branch_injection(&pf, 2);
    t_is(p + 5.0 * b2.vm * b2.vm, 50.0, 1e-6, "P injection bus 2")?;

    t_balance(&pf)
}

#[test]
fn test_helm_scale() -> Result<()> {
    setup();
    let opt = HelmOpt::builder().scale(2.0).build()?;
    let pf = runpf(&case2(), &opt)?;
    assert!(pf.converged());

    let b2 = pf.bus(2).ok_or(format_err!("bus 2"))?;
    t_is(b2.pd, 200.0, 1e-9, "Pd bus 2")?;
    t_is(b2.qd, 100.0, 1e-9, "Qd bus 2")?;
    t_is(b2.vm, 0.828513, 1e-4, "Vm bus 2")?;

    Ok(())
}

#[test]
fn test_helm_diverged() -> Result<()> {
    setup();
    let mut case = case2();
    case.bus[1].pd = 2000.0;
    case.bus[1].qd = 1000.0;

    let pf = runpf(&case, &HelmOpt::default())?;
    assert_eq!(pf.status, Status::Diverged);
    assert_eq!(pf.trace, vec![100]);
    assert!(pf.bus.is_empty());
    assert!(pf.branch.is_empty());
    assert!(pf.balance.is_none());

    // feasible, but not enough coefficients for the tolerance
    let opt = HelmOpt::builder()
        .mismatch(1e-10)
        .max_coefficients(5)
        .build()?;
    let pf = runpf(&case2(), &opt)?;
    assert_eq!(pf.status, Status::Diverged);
    assert_eq!(pf.trace, vec![5]);

    Ok(())
}

#[test]
fn test_helm_overflow() -> Result<()> {
    setup();
    let mut case = case2();
    case.bus[1].pd = 1e7;
    case.bus[1].qd = 5e6;

    // coefficients grow without bound and overflow before the limit
    let pf = runpf(&case, &HelmOpt::default())?;
    assert_eq!(pf.status, Status::Diverged);
    assert_eq!(pf.trace.len(), 1);
    assert!(pf.trace[0] < 100);
    assert!(pf.bus.is_empty());
    assert!(pf.balance.is_none());

    Ok(())
}

#[test]
fn test_helm_islanded() -> Result<()> {
    setup();
    let mut case = case2();
    case.bus.push(Bus::new(3, PQ).load(10.0, 5.0));

    match runpf(&case, &HelmOpt::default()) {
        Err(HelmError::Factorization(_)) => Ok(()),
        other => Err(format_err!("expected factorization error, got {:?}", other)),
    }
}

#[test]
fn test_helm_model_errors() -> Result<()> {
    setup();
    let opt = HelmOpt::default();

    let model_err = |case: Case| -> Result<ModelError> {
        match runpf(&case, &opt) {
            Err(HelmError::Model(err)) => Ok(err),
            other => Err(format_err!("expected model error, got {:?}", other)),
        }
    };

    assert_eq!(model_err(Case::default())?, ModelError::Empty);

    let mut case = case2();
    case.base_mva = 0.0;
    assert_eq!(model_err(case)?, ModelError::BaseMva(0.0));

    let mut case = case2();
    case.bus[0].bus_type = PQ;
    assert_eq!(model_err(case)?, ModelError::NoSlack);

    let mut case = case2();
    case.bus[1].bus_type = REF;
    assert_eq!(model_err(case)?, ModelError::MultipleSlack(vec![1, 2]));

    let mut case = case2();
    case.bus[1].bus_i = 1;
    assert_eq!(model_err(case)?, ModelError::DuplicateBus(1));

    let case = case2().branch(Branch::new(2, 7, 0.01, 0.1, 0.0));
    assert_eq!(
        model_err(case)?,
        ModelError::UnknownBus {
            element: "branch",
            index: 1,
            bus: 7
        }
    );

    Ok(())
}
