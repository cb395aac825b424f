use crate::bus_types::BusType;
use crate::math::polar_deg;
use crate::order::BusOrder;
use crate::qlim::LimitState;
use crate::sbus::Injections;
use crate::ybus::Network;
use num_complex::Complex64;

/// Solved state of a bus. Powers are in MW/MVAr.
#[derive(Debug, Clone, PartialEq)]
pub struct BusSoln {
    pub bus_i: usize,
    /// Final classification.
    pub bus_type: BusType,
    pub limit: LimitState,

    pub v: Complex64,
    /// Voltage magnitude (p.u.).
    pub vm: f64,
    /// Voltage angle (degrees).
    pub va: f64,

    pub pg: f64,
    pub qg: f64,
    pub pd: f64,
    pub qd: f64,
}

/// Power flow through a branch (MW/MVAr).
#[derive(Debug, Clone, PartialEq)]
pub struct BranchSoln {
    pub f_bus: usize,
    pub t_bus: usize,
    /// Power injected at the "from" end.
    pub pf: f64,
    pub qf: f64,
    /// Power injected at the "to" end.
    pub pt: f64,
    pub qt: f64,
    /// Branch losses, `Sf + St`.
    pub p_total: f64,
    pub q_total: f64,
}

/// System-wide power balance (MVA).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerBalance {
    pub generated: Complex64,
    pub demanded: Complex64,
    /// Branch losses plus power absorbed by bus shunts.
    pub mismatch: Complex64,
}

impl PowerBalance {
    /// `|generated - demanded - mismatch|`, zero for an exact solution.
    pub fn residual(&self) -> f64 {
        (self.generated - self.demanded - self.mismatch).norm()
    }
}

/// Updates bus, generator and branch results for a converged voltage
/// profile.
///
/// Slack generation is the network injection plus the local demand.
/// Regulating buses produce `Qg = Q_inj + Qd`. Buses forced to a reactive
/// limit keep the limit.
pub fn pfsoln(
    base_mva: f64,
    net: &Network,
    v: &[Complex64],
    inj: &Injections,
    bus_type: &[BusType],
    state: &[LimitState],
    order: &BusOrder,
) -> (Vec<BusSoln>, Vec<BranchSoln>, PowerBalance) {
    let s_inj = net.s_inj(v);

    let bus: Vec<BusSoln> = (0..v.len())
        .map(|i| {
            let (pg, qg) = match bus_type[i] {
                BusType::Slack => (s_inj[i].re + inj.pd[i], s_inj[i].im + inj.qd[i]),
                BusType::PV | BusType::PVLim => (inj.pg[i], s_inj[i].im + inj.qd[i]),
                BusType::PQ => (inj.pg[i], inj.qg[i]),
            };
            let (vm, va) = polar_deg(v[i]);
            BusSoln {
                bus_i: order.i2e[i],
                bus_type: bus_type[i],
                limit: state[i],
                v: v[i],
                vm,
                va,
                pg: pg * base_mva,
                qg: qg * base_mva,
                pd: inj.pd[i] * base_mva,
                qd: inj.qd[i] * base_mva,
            }
        })
        .collect();

    let branch: Vec<BranchSoln> = net
        .branch
        .iter()
        .map(|br| {
            let (v_f, v_t) = (v[br.f], v[br.t]);
            let (i_f, i_t) = br.currents(v_f, v_t);
            let s_f = v_f * i_f.conj() * base_mva;
            let s_t = v_t * i_t.conj() * base_mva;
            let s_total = s_f + s_t;
            BranchSoln {
                f_bus: order.i2e[br.f],
                t_bus: order.i2e[br.t],
                pf: s_f.re,
                qf: s_f.im,
                pt: s_t.re,
                qt: s_t.im,
                p_total: s_total.re,
                q_total: s_total.im,
            }
        })
        .collect();

    let generated = Complex64::new(
        bus.iter().map(|b| b.pg).sum(),
        bus.iter().map(|b| b.qg).sum(),
    );
    let demanded = Complex64::new(
        bus.iter().map(|b| b.pd).sum(),
        bus.iter().map(|b| b.qd).sum(),
    );

    let losses: Complex64 = branch
        .iter()
        .map(|br| Complex64::new(br.p_total, br.q_total))
        .sum();
    let shunt: Complex64 = v
        .iter()
        .zip(net.bus_shunt.iter())
        .map(|(v, y)| v.norm_sqr() * y.conj() * base_mva)
        .sum();

    let balance = PowerBalance {
        generated,
        demanded,
        mismatch: losses + shunt,
    };

    (bus, branch, balance)
}
