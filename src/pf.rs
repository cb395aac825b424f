use crate::bus_types::{bus_types, BusType};
use crate::debug::format_polar_vec;
use crate::error::{HelmError, ModelError};
use crate::helm::{helm_series, PadeCheck, SeriesOutcome};
use crate::lu::RSparseLU;
use crate::mpc::Case;
use crate::mpopt::HelmOpt;
use crate::operator::make_operator;
use crate::order::BusOrder;
use crate::pfsoln::{pfsoln, BranchSoln, BusSoln, PowerBalance};
use crate::qlim::{check_q_limits, LimitState};
use crate::sbus::{make_injections, Injections};
use crate::series::{Embedding, Series};
use crate::traits::{Factorization, LinearSolver};
use crate::ybus::{make_ybus, Network};

use num_complex::Complex64;
use sparsetools::csc::CSC;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Converged,
    /// The series did not settle within the coefficient limit. The
    /// operating point has no physical solution.
    Diverged,
}

/// Power flow results. Bus and branch results are empty unless the run
/// converged.
#[derive(Debug, Clone)]
pub struct PowerFlow {
    pub status: Status,
    /// Number of series coefficients used in each cycle. One entry per
    /// limit-triggered restart plus one for the final cycle.
    pub trace: Vec<usize>,
    pub restarts: usize,
    pub bus: Vec<BusSoln>,
    pub branch: Vec<BranchSoln>,
    pub balance: Option<PowerBalance>,
}

impl PowerFlow {
    pub fn converged(&self) -> bool {
        self.status == Status::Converged
    }

    /// Solution of the bus with external number `bus_i`.
    pub fn bus(&self, bus_i: usize) -> Option<&BusSoln> {
        self.bus.iter().find(|b| b.bus_i == bus_i)
    }
}

/// State of a single power flow run.
pub struct HelmContext {
    base_mva: f64,
    opt: HelmOpt,
    order: BusOrder,

    net: Network,
    inj: Injections,
    bus_type: Vec<BusType>,
    state: Vec<LimitState>,
    s_bus: Vec<Complex64>,

    series: Series,
    check: PadeCheck,

    trace: Vec<usize>,
    restarts: usize,
}

impl HelmContext {
    /// Validates the case and builds the network model.
    pub fn new(case: &Case, opt: &HelmOpt) -> Result<Self, HelmError> {
        if !(case.base_mva.is_finite() && case.base_mva > 0.0) {
            return Err(ModelError::BaseMva(case.base_mva).into());
        }
        let order = BusOrder::new(&case.bus)?;
        let (refbus, bus_type) =
            bus_types(&case.bus, &case.gen, &order, opt.enforce_q_limits)?;
        let inj = make_injections(
            case.base_mva,
            &case.bus,
            &case.gen,
            &order,
            refbus,
            opt.scale,
        )?;
        let net = make_ybus(case.base_mva, &case.bus, &case.branch, &order)?;

        let nb = order.len();
        let state = LimitState::initial(&bus_type);
        let s_bus = inj.s_bus();

        Ok(Self {
            base_mva: case.base_mva,
            opt: opt.clone(),
            order,
            net,
            inj,
            bus_type,
            state,
            s_bus,
            series: Series::new(nb, opt.max_coefficients),
            check: PadeCheck::new(nb, opt.mismatch),
            trace: Vec::new(),
            restarts: 0,
        })
    }
}

enum Stage {
    Build,
    Factorize(CSC<usize, f64>),
    Series(Box<dyn Factorization>),
    CheckLimits(Vec<Complex64>),
    Converged(Vec<Complex64>),
    Diverged,
}

/// Runs a HELM power flow with the default sparse LU solver.
pub fn runpf(case: &Case, opt: &HelmOpt) -> Result<PowerFlow, HelmError> {
    runpf_with(case, opt, &RSparseLU::default())
}

/// Runs a HELM power flow.
///
/// The embedding operator is factorized once per classification cycle.
/// When a generator is forced to a reactive limit the bus becomes PQ,
/// the operator is rebuilt and the series restarts from order zero.
pub fn runpf_with(
    case: &Case,
    opt: &HelmOpt,
    linsol: &dyn LinearSolver,
) -> Result<PowerFlow, HelmError> {
    let t0 = Instant::now();
    let mut ctx = HelmContext::new(case, opt)?;

    let mut stage = Stage::Build;
    loop {
        stage = match stage {
            Stage::Build => Stage::Factorize(make_operator(&ctx.net, &ctx.bus_type)),

            Stage::Factorize(m) => {
                let lu = linsol.factor(&m).map_err(HelmError::Factorization)?;
                ctx.series.reset();
                ctx.check.reset();
                ctx.s_bus = ctx.inj.s_bus();
                Stage::Series(lu)
            }

            Stage::Series(lu) => {
                let emb = Embedding {
                    net: &ctx.net,
                    bus_type: &ctx.bus_type,
                    s_bus: &ctx.s_bus,
                    vs: &ctx.inj.vs,
                };
                let outcome = helm_series(&emb, lu.as_ref(), &mut ctx.series, &mut ctx.check)
                    .map_err(HelmError::Factorization)?;

                match outcome {
                    SeriesOutcome::Converged { coefficients, v } => {
                        ctx.trace.push(coefficients);
                        Stage::CheckLimits(v)
                    }
                    SeriesOutcome::Diverged { coefficients } => {
                        ctx.trace.push(coefficients);
                        Stage::Diverged
                    }
                }
            }

            Stage::CheckLimits(v) => {
                if !ctx.opt.enforce_q_limits {
                    Stage::Converged(v)
                } else {
                    let violated = check_q_limits(
                        &ctx.net,
                        &v,
                        &mut ctx.inj,
                        &mut ctx.bus_type,
                        &mut ctx.state,
                    );
                    if violated.is_empty() {
                        Stage::Converged(v)
                    } else {
                        ctx.restarts += 1;
                        log::debug!(
                            "restart {}: {} bus(es) at reactive limit",
                            ctx.restarts,
                            violated.len()
                        );
                        Stage::Build
                    }
                }
            }

            Stage::Converged(v) => {
                log::info!(
                    "HELM converged with {} coefficients, {} restart(s) in {:?}",
                    ctx.trace.last().copied().unwrap_or_default(),
                    ctx.restarts,
                    t0.elapsed()
                );
                log::debug!("V: {}", format_polar_vec(&v));

                let (bus, branch, balance) = pfsoln(
                    ctx.base_mva,
                    &ctx.net,
                    &v,
                    &ctx.inj,
                    &ctx.bus_type,
                    &ctx.state,
                    &ctx.order,
                );
                return Ok(PowerFlow {
                    status: Status::Converged,
                    trace: ctx.trace,
                    restarts: ctx.restarts,
                    bus,
                    branch,
                    balance: Some(balance),
                });
            }

            Stage::Diverged => {
                log::info!(
                    "HELM diverged: no convergence with {} coefficients",
                    ctx.opt.max_coefficients
                );
                return Ok(PowerFlow {
                    status: Status::Diverged,
                    trace: ctx.trace,
                    restarts: ctx.restarts,
                    bus: Vec::new(),
                    branch: Vec::new(),
                    balance: None,
                });
            }
        };
    }
}
