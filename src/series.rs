use crate::bus_types::BusType;
use crate::debug::format_rect_vec;
use crate::math::is_finite;
use crate::traits::Factorization;
use crate::ybus::Network;
use num_complex::Complex64;
use num_traits::Zero;

/// Fixed inputs of one classification cycle.
pub struct Embedding<'a> {
    pub net: &'a Network,
    pub bus_type: &'a [BusType],
    /// Specified complex power injection (generation minus load).
    pub s_bus: &'a [Complex64],
    /// Voltage magnitude setpoints.
    pub vs: &'a [f64],
}

/// Power series coefficients of the embedded bus voltages `V(s)` and
/// their reciprocals `W(s) = 1/V(s)`.
///
/// Coefficients of bus `i` are stored contiguously in arena buffers sized
/// for `capacity` orders. The buffers are allocated once and [`reset`]
/// between classification cycles.
///
/// [`reset`]: Series::reset
pub struct Series {
    nb: usize,
    capacity: usize,
    len: usize,

    v: Vec<Complex64>,
    w: Vec<Complex64>,

    /// Active power accumulators `Σ Ytrans_ik V_k[n]` of regulated buses.
    acc: Vec<Complex64>,
    /// Last `|V|^2` convolution of each regulated bus.
    vv_prev: Vec<f64>,

    rhs: Vec<f64>,
}

impl Series {
    pub fn new(nb: usize, capacity: usize) -> Self {
        let mut series = Self {
            nb,
            capacity,
            len: 0,
            v: vec![Complex64::zero(); nb * capacity],
            w: vec![Complex64::zero(); nb * capacity],
            acc: vec![Complex64::zero(); nb * capacity],
            vv_prev: vec![0.0; nb],
            rhs: vec![0.0; 2 * nb],
        };
        series.reset();
        series
    }

    /// Discards all coefficients above order zero, `V[0] = W[0] = 1`.
    pub fn reset(&mut self) {
        self.v.fill(Complex64::zero());
        self.w.fill(Complex64::zero());
        self.acc.fill(Complex64::zero());
        self.vv_prev.fill(0.0);
        for i in 0..self.nb {
            self.v[i * self.capacity] = Complex64::new(1.0, 0.0);
            self.w[i * self.capacity] = Complex64::new(1.0, 0.0);
        }
        self.len = 1;
    }

    /// Number of coefficients held for each bus.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_full(&self) -> bool {
        self.len == self.capacity
    }

    /// Voltage coefficients of bus `i`.
    pub fn v(&self, i: usize) -> &[Complex64] {
        let k = i * self.capacity;
        &self.v[k..k + self.len]
    }

    /// Reciprocal voltage coefficients of bus `i`.
    pub fn w(&self, i: usize) -> &[Complex64] {
        let k = i * self.capacity;
        &self.w[k..k + self.len]
    }

    /// False once the newest order of any bus has overflowed.
    pub fn is_finite(&self) -> bool {
        let n = self.len - 1;
        (0..self.nb).all(|i| {
            let k = i * self.capacity + n;
            is_finite(self.v[k]) && is_finite(self.w[k])
        })
    }

    fn v_at(&self, i: usize, n: usize) -> Complex64 {
        self.v[i * self.capacity + n]
    }

    fn acc_at(&self, i: usize, n: usize) -> Complex64 {
        self.acc[i * self.capacity + n]
    }

    /// Computes the next order of coefficients for every bus and returns
    /// the new number of coefficients.
    ///
    /// The right-hand side of order `n` depends only on orders below `n`,
    /// so the system is solved with the factorization of the embedding
    /// operator of the current cycle.
    pub fn next_order(
        &mut self,
        emb: &Embedding,
        lu: &dyn Factorization,
    ) -> Result<usize, String> {
        if self.is_full() {
            return Err(format!("series capacity {} exhausted", self.capacity));
        }
        let n = self.len;

        for i in 0..self.nb {
            let (re, im) = match emb.bus_type[i] {
                BusType::Slack => self.slack_rhs(emb, i, n),
                BusType::PQ => self.pq_rhs(emb, i, n),
                BusType::PV | BusType::PVLim => self.pv_rhs(emb, i, n),
            };
            self.rhs[2 * i] = re;
            self.rhs[2 * i + 1] = im;
        }

        let mut x = self.rhs.clone();
        lu.solve(&mut x)?;

        for i in 0..self.nb {
            let k = i * self.capacity;
            self.v[k + n] = match emb.bus_type[i] {
                BusType::Slack => Complex64::new(self.rhs[2 * i], self.rhs[2 * i + 1]),
                _ => Complex64::new(x[2 * i], x[2 * i + 1]),
            };

            let w = (0..n)
                .map(|m| self.w[k + m] * self.v[k + n - m])
                .sum::<Complex64>();
            self.w[k + n] = -w;
        }
        self.len = n + 1;

        if log::log_enabled!(log::Level::Trace) {
            let column: Vec<Complex64> = (0..self.nb).map(|i| self.v_at(i, n)).collect();
            log::trace!("V[{}]: {}", n, format_rect_vec(&column));
        }

        Ok(self.len)
    }

    fn slack_rhs(&self, emb: &Embedding, i: usize, n: usize) -> (f64, f64) {
        if n == 1 {
            (emb.vs[i] - 1.0, 0.0)
        } else {
            (0.0, 0.0)
        }
    }

    fn pq_rhs(&self, emb: &Embedding, i: usize, n: usize) -> (f64, f64) {
        let net = emb.net;
        let k = i * self.capacity;

        let mut r = emb.s_bus[i].conj() * self.w[k + n - 1].conj()
            - net.y_shunt[i] * self.v[k + n - 1];
        for &(j, y) in &net.phase[i] {
            r -= y * self.v_at(j, n - 1);
        }
        (r.re, r.im)
    }

    fn pv_rhs(&mut self, emb: &Embedding, i: usize, n: usize) -> (f64, f64) {
        let net = emb.net;

        let p = if n == 1 {
            emb.s_bus[i].re
                - net.y_shunt[i].re
                - net.phase[i].iter().map(|(_, y)| y.re).sum::<f64>()
        } else {
            let pp: Complex64 = net.y_trans[i]
                .iter()
                .map(|&(j, y)| y * self.v_at(j, n - 1))
                .sum();
            self.acc[i * self.capacity + n - 1] = pp;

            let mut c = self.v_at(i, 1).conj() * pp;
            for x in 1..n - 1 {
                c += self.v_at(i, n - x).conj() * self.acc_at(i, x);
            }
            let mut p = -c.re;

            if net.has_conductance(i) {
                p -= net.y_shunt[i].re * (self.vv_prev[i] + 2.0 * self.v_at(i, n - 1).re);
            }
            if net.has_phase_shift(i) {
                let mut q = Complex64::zero();
                for x in 0..n {
                    let i_ps: Complex64 = net.phase[i]
                        .iter()
                        .map(|&(j, y)| y * self.v_at(j, n - 1 - x))
                        .sum();
                    q += self.v_at(i, x).conj() * i_ps;
                }
                p -= q.re;
            }
            p
        };

        let vv = if n == 1 {
            emb.vs[i] * emb.vs[i] - 1.0
        } else {
            let vv: f64 = (1..n)
                .map(|k| (self.v_at(i, k) * self.v_at(i, n - k).conj()).re)
                .sum();
            self.vv_prev[i] = vv;
            -vv
        };

        (p, vv / 2.0)
    }
}
