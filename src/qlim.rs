use crate::bus_types::BusType;
use crate::sbus::Injections;
use crate::ybus::Network;
use num_complex::Complex64;

/// Reactive limit that was violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Upper,
    Lower,
}

/// Reactive limit status of a bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitState {
    /// Regulating voltage, limits still to be checked.
    Active,
    /// Converted to PQ with its output fixed at the violated limit.
    Limited(Bound),
    /// Not subject to reactive limits.
    Normal,
}

impl LimitState {
    /// Initial state for each bus classification.
    pub fn initial(bus_type: &[BusType]) -> Vec<LimitState> {
        bus_type
            .iter()
            .map(|bt| match bt {
                BusType::PVLim => LimitState::Active,
                _ => LimitState::Normal,
            })
            .collect()
    }
}

/// Reactive power injected into the network at each bus, from the
/// real and imaginary parts of the admittance matrix.
pub fn q_inj(net: &Network, v: &[Complex64]) -> Vec<f64> {
    let e: Vec<f64> = v.iter().map(|v| v.re).collect();
    let f: Vec<f64> = v.iter().map(|v| v.im).collect();

    // I = (G + jB)(e + jf)
    let g_e = &net.g_bus * &e;
    let g_f = &net.g_bus * &f;
    let b_e = &net.b_bus * &e;
    let b_f = &net.b_bus * &f;

    (0..v.len())
        .map(|i| {
            let i_re = g_e[i] - b_f[i];
            let i_im = b_e[i] + g_f[i];
            f[i] * i_re - e[i] * i_im
        })
        .collect()
}

/// Checks the reactive output of every voltage regulating bus that is
/// subject to limits.
///
/// Generation is `Qg = Q_inj + Qd`. A bus outside `[Qmin, Qmax]` is
/// reclassified as PQ with `Qg` fixed at the violated bound. Buses within
/// their limits keep the computed `Qg`. Returns the violating buses.
pub fn check_q_limits(
    net: &Network,
    v: &[Complex64],
    inj: &mut Injections,
    bus_type: &mut [BusType],
    state: &mut [LimitState],
) -> Vec<usize> {
    let q = q_inj(net, v);
    let mut violated = Vec::new();

    for i in 0..bus_type.len() {
        if bus_type[i] != BusType::PVLim {
            continue;
        }
        let qg = q[i] + inj.qd[i];

        let bound = if qg > inj.qmax[i] {
            inj.qg[i] = inj.qmax[i];
            Some(Bound::Upper)
        } else if qg < inj.qmin[i] {
            inj.qg[i] = inj.qmin[i];
            Some(Bound::Lower)
        } else {
            inj.qg[i] = qg;
            None
        };

        if let Some(bound) = bound {
            log::info!(
                "bus {} reactive output {:.4} p.u. exceeds {:?} limit {:.4}, switching to PQ",
                i,
                qg,
                bound,
                inj.qg[i]
            );
            bus_type[i] = BusType::PQ;
            state[i] = LimitState::Limited(bound);
            violated.push(i);
        }
    }

    violated
}
