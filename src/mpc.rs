// Bus type codes used in input records.
pub const PQ: usize = 1;
pub const PV: usize = 2;
pub const REF: usize = 3;

/// Case models a power system as buses, generators and branches.
///
/// Powers are in MW/MVAr and are converted to per-unit on `base_mva`.
/// Branch impedances are already in per-unit.
#[derive(Clone, Debug)]
pub struct Case {
    /// System MVA base used for converting power into per-unit quantities.
    /// Default value is 100.
    pub base_mva: f64,

    /// Power system nodes, including static loads and shunts.
    pub bus: Vec<Bus>,

    /// Generators.
    pub gen: Vec<Gen>,

    /// Transmission lines and transformers.
    pub branch: Vec<Branch>,
}

impl Default for Case {
    fn default() -> Self {
        Self {
            base_mva: 100.0,
            bus: Vec::default(),
            gen: Vec::default(),
            branch: Vec::default(),
        }
    }
}

impl Case {
    pub fn new(base_mva: f64) -> Self {
        Self {
            base_mva,
            ..Default::default()
        }
    }

    pub fn bus(mut self, bus: Bus) -> Self {
        self.bus.push(bus);
        self
    }

    pub fn gen(mut self, gen: Gen) -> Self {
        self.gen.push(gen);
        self
    }

    pub fn branch(mut self, branch: Branch) -> Self {
        self.branch.push(branch);
        self
    }
}

/// Bus is a node in the power system graph structure.
/// Static loads and shunts are included in the Bus definition.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Bus {
    /// Bus number.
    pub bus_i: usize,

    /// Bus type code. Only `REF` is significant: every other
    /// bus is seeded as PQ and generator buses are reclassified.
    pub bus_type: usize,

    /// Real power demand (MW).
    pub pd: f64,

    /// Reactive power demand (MVAr).
    pub qd: f64,

    /// Shunt conductance (MW at V = 1.0 p.u.).
    pub gs: f64,

    /// Shunt susceptance (MVAr at V = 1.0 p.u.).
    pub bs: f64,
}

impl Bus {
    pub fn new(bus_i: usize, bus_type: usize) -> Self {
        Self {
            bus_i,
            bus_type,
            ..Default::default()
        }
    }

    pub fn load(mut self, pd: f64, qd: f64) -> Self {
        self.pd = pd;
        self.qd = qd;
        self
    }

    pub fn shunt(mut self, gs: f64, bs: f64) -> Self {
        self.gs = gs;
        self.bs = bs;
        self
    }

    pub fn is_ref(&self) -> bool {
        self.bus_type == REF
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Gen {
    /// Bus number.
    pub gen_bus: usize,

    /// Real power output (MW).
    pub pg: f64,

    /// Maximum reactive power output (MVAr).
    pub qmax: f64,

    /// Minimum reactive power output (MVAr).
    pub qmin: f64,

    /// Voltage magnitude setpoint (p.u.).
    pub vg: f64,
}

impl Default for Gen {
    fn default() -> Self {
        Self {
            gen_bus: 0,
            pg: 0.0,
            qmax: f64::INFINITY,
            qmin: f64::NEG_INFINITY,
            vg: 1.0,
        }
    }
}

impl Gen {
    pub fn new(gen_bus: usize, pg: f64, vg: f64) -> Self {
        Self {
            gen_bus,
            pg,
            vg,
            ..Default::default()
        }
    }

    pub fn q_limits(mut self, qmin: f64, qmax: f64) -> Self {
        self.qmin = qmin;
        self.qmax = qmax;
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Branch {
    /// From bus number.
    pub f_bus: usize,

    /// To bus number.
    pub t_bus: usize,

    /// Resistance (p.u.).
    pub br_r: f64,

    /// Reactance (p.u.).
    pub br_x: f64,

    /// Total line charging susceptance (p.u.).
    pub br_b: f64,

    /// Transformer off nominal turns ratio. Zero for lines.
    pub tap: f64,

    /// Transformer phase shift angle (degrees).
    pub shift: f64,
}

impl Branch {
    pub fn new(f_bus: usize, t_bus: usize, br_r: f64, br_x: f64, br_b: f64) -> Self {
        Self {
            f_bus,
            t_bus,
            br_r,
            br_x,
            br_b,
            ..Default::default()
        }
    }

    pub fn transformer(mut self, tap: f64, shift: f64) -> Self {
        self.tap = tap;
        self.shift = shift;
        self
    }
}
