use crate::error::ModelError;
use crate::mpc::{Bus, Gen};
use crate::order::BusOrder;
use num_complex::Complex64;

/// Specified per-bus quantities in per-unit.
///
/// Generators at the same bus are aggregated: active power and reactive
/// limits are summed and the voltage setpoint of the last generator
/// listed for the bus is used.
/// `qg` is unknown until a solution exists. It is filled by the Q limit
/// check and, for buses forced to a limit, holds the violated bound.
#[derive(Clone, Debug)]
pub struct Injections {
    pub pg: Vec<f64>,
    pub qg: Vec<f64>,
    pub pd: Vec<f64>,
    pub qd: Vec<f64>,
    pub qmax: Vec<f64>,
    pub qmin: Vec<f64>,
    /// Voltage magnitude setpoint (1.0 for buses without generators).
    pub vs: Vec<f64>,
}

/// Builds the per-unit injection data, with loads and generator outputs
/// multiplied by `scale`. Slack generation is not specified and is left
/// at zero.
pub fn make_injections(
    base_mva: f64,
    bus: &[Bus],
    gen: &[Gen],
    order: &BusOrder,
    refbus: usize,
    scale: f64,
) -> Result<Injections, ModelError> {
    let nb = bus.len();

    let mut inj = Injections {
        pg: vec![0.0; nb],
        qg: vec![0.0; nb],
        pd: bus.iter().map(|b| b.pd * scale / base_mva).collect(),
        qd: bus.iter().map(|b| b.qd * scale / base_mva).collect(),
        qmax: vec![0.0; nb],
        qmin: vec![0.0; nb],
        vs: vec![1.0; nb],
    };

    for (i, g) in gen.iter().enumerate() {
        let k = order.index(g.gen_bus, "generator", i)?;
        inj.vs[k] = g.vg;
        inj.pg[k] += g.pg * scale / base_mva;
        inj.qmax[k] += g.qmax / base_mva;
        inj.qmin[k] += g.qmin / base_mva;
    }
    inj.pg[refbus] = 0.0;

    Ok(inj)
}

impl Injections {
    /// Net complex power injection (generation minus load) at each bus.
    pub fn s_bus(&self) -> Vec<Complex64> {
        (0..self.pg.len())
            .map(|i| Complex64::new(self.pg[i] - self.pd[i], self.qg[i] - self.qd[i]))
            .collect()
    }
}
