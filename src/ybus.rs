use crate::cmplx;
use crate::error::ModelError;
use crate::math::J;
use crate::mpc::{Branch, Bus};
use crate::order::BusOrder;
use num_complex::Complex64;
use sparsetools::coo::Coo;
use sparsetools::csr::{CCSR, CSR};
use std::collections::BTreeMap;
use std::f64::consts::PI;

/// Two-port admittance of a single branch:
///
/// ```txt
///      | If |   | Yff  Yft |   | Vf |
///      |    | = |          | * |    |
///      | It |   | Ytf  Ytt |   | Vt |
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct BranchAdmittance {
    /// Internal index of the "from" bus.
    pub f: usize,
    /// Internal index of the "to" bus.
    pub t: usize,
    pub y: [[Complex64; 2]; 2],
}

impl BranchAdmittance {
    /// Currents injected into the branch at the "from" and "to" ends.
    pub fn currents(&self, v_f: Complex64, v_t: Complex64) -> (Complex64, Complex64) {
        let [[y_ff, y_ft], [y_tf, y_tt]] = self.y;
        (y_ff * v_f + y_ft * v_t, y_tf * v_f + y_tt * v_t)
    }
}

/// Network admittance model.
///
/// The bus admittance matrix is split into a series part `y_trans`, which
/// is symmetric and has zero row sums, a per-bus shunt `y_shunt` and, for
/// phase shifting transformers, per-bus off-diagonal corrections `phase`:
///
/// ```txt
///     Ybus = Ytrans + diag(Yshunt) + Phase
/// ```
#[derive(Clone)]
pub struct Network {
    /// Complete bus admittance matrix.
    pub y_bus: CSR<usize, Complex64>,
    /// Real part of `y_bus` (conductance).
    pub g_bus: CSR<usize, f64>,
    /// Imaginary part of `y_bus` (susceptance).
    pub b_bus: CSR<usize, f64>,

    /// Series admittance rows, `(bus, y)` sorted by bus. Each row
    /// includes its own diagonal so the buses also form the adjacency
    /// list of the row.
    pub y_trans: Vec<Vec<(usize, Complex64)>>,

    /// Total shunt admittance at each bus: bus shunts, line charging
    /// and off-nominal tap terms.
    pub y_shunt: Vec<Complex64>,

    /// Bus shunt elements only.
    pub bus_shunt: Vec<Complex64>,

    /// Phase shift corrections, `(target bus, y)` sorted by target.
    pub phase: Vec<Vec<(usize, Complex64)>>,

    /// Two-port admittance of each branch, in input order.
    pub branch: Vec<BranchAdmittance>,
}

impl Network {
    pub fn nb(&self) -> usize {
        self.y_trans.len()
    }

    /// Buses connected to bus `i`, including `i`, in ascending order.
    pub fn adjacent(&self, i: usize) -> impl Iterator<Item = usize> + '_ {
        self.y_trans[i].iter().map(|&(j, _)| j)
    }

    pub fn has_conductance(&self, i: usize) -> bool {
        self.y_shunt[i].re != 0.0
    }

    pub fn has_phase_shift(&self, i: usize) -> bool {
        !self.phase[i].is_empty()
    }

    /// Complex power injected into the network at each bus.
    pub fn s_inj(&self, v: &[Complex64]) -> Vec<Complex64> {
        let i_bus = &self.y_bus * v;
        v.iter()
            .zip(i_bus.iter())
            .map(|(v, i)| v * i.conj())
            .collect()
    }
}

/// Builds the network admittance model.
///
/// Branches with zero impedance contribute no series admittance, only
/// their charging susceptance. A tap ratio of zero means nominal ratio.
pub fn make_ybus(
    base_mva: f64,
    bus: &[Bus],
    branch: &[Branch],
    order: &BusOrder,
) -> Result<Network, ModelError> {
    let nb = bus.len();

    let bus_shunt: Vec<Complex64> = bus
        .iter()
        .map(|b| cmplx!(b.gs, b.bs) / base_mva)
        .collect();

    let mut y_trans: Vec<BTreeMap<usize, Complex64>> = (0..nb)
        .map(|i| BTreeMap::from([(i, Complex64::default())]))
        .collect();
    let mut y_shunt = bus_shunt.clone();
    let mut phase: Vec<BTreeMap<usize, Complex64>> = vec![BTreeMap::new(); nb];
    let mut y_br = Vec::with_capacity(branch.len());

    for (i, br) in branch.iter().enumerate() {
        let f = order.index(br.f_bus, "branch", i)?;
        let t = order.index(br.t_bus, "branch", i)?;

        let z = cmplx!(br.br_r, br.br_x);
        let y_s = if z == Complex64::default() {
            log::warn!(
                "branch {} ({}-{}) has zero impedance, series admittance ignored",
                i,
                br.f_bus,
                br.t_bus
            );
            Complex64::default()
        } else {
            1.0 / z
        }; // series admittance
        let tap = if br.tap == 0.0 { 1.0 } else { br.tap }; // default tap ratio = 1
        let shift = br.shift * PI / 180.0;

        let y_tt = y_s + J * (br.br_b / 2.0);
        let y_ff = y_tt / (tap * tap);
        let y_ser = y_s / tap;
        let y_ft = -y_ser * Complex64::from_polar(1.0, shift);
        let y_tf = -y_ser * Complex64::from_polar(1.0, -shift);

        *y_trans[f].entry(f).or_default() += y_ser;
        *y_trans[t].entry(t).or_default() += y_ser;
        *y_trans[f].entry(t).or_default() -= y_ser;
        *y_trans[t].entry(f).or_default() -= y_ser;

        y_shunt[f] += y_ff - y_ser;
        y_shunt[t] += y_tt - y_ser;

        if br.shift != 0.0 {
            *phase[f].entry(t).or_default() += y_ft + y_ser;
            *phase[t].entry(f).or_default() += y_tf + y_ser;
        }

        y_br.push(BranchAdmittance {
            f,
            t,
            y: [[y_ff, y_ft], [y_tf, y_tt]],
        });
    }

    let mut y_bus = Coo::with_size(nb, nb);
    for (i, row) in y_trans.iter().enumerate() {
        for (&j, &y) in row {
            let y_ps = phase[i].get(&j).copied().unwrap_or_default();
            if j == i {
                y_bus.push(i, j, y + y_shunt[i]);
            } else {
                y_bus.push(i, j, y + y_ps);
            }
        }
    }

    let y_trans: Vec<Vec<(usize, Complex64)>> =
        y_trans.into_iter().map(|r| r.into_iter().collect()).collect();
    let phase: Vec<Vec<(usize, Complex64)>> =
        phase.into_iter().map(|r| r.into_iter().collect()).collect();

    let y_bus = y_bus.to_csr();
    Ok(Network {
        g_bus: y_bus.real(),
        b_bus: y_bus.imag(),
        y_bus,
        y_trans,
        y_shunt,
        bus_shunt,
        phase,
        branch: y_br,
    })
}
