use crate::bus_types::BusType;
use crate::ybus::Network;
use sparsetools::coo::Coo;
use sparsetools::csc::CSC;

/// Forms the real embedding operator.
///
/// Unknowns are ordered `[Re V0, Im V0, Re V1, Im V1, ...]`. Rows `2i`
/// and `2i+1` hold the boundary condition of bus `i`:
///
/// ```txt
///     Slack:  Re Vi = .. , Im Vi = ..
///     PQ:     Σ Ytrans_ij Vj = ..               (complex row pair)
///     PV:     Re(Σ Ytrans_ij Vj) = .. , Re Vi = ..
/// ```
///
/// The operator depends only on topology and classification, so it is
/// rebuilt after every reclassification and unchanged between orders.
pub fn make_operator(net: &Network, bus_type: &[BusType]) -> CSC<usize, f64> {
    let nb = net.nb();
    let nnz: usize = net.y_trans.iter().map(|row| 4 * row.len()).sum();

    let mut m = Coo::with_capacity(2 * nb, 2 * nb, nnz);

    for (i, bt) in bus_type.iter().enumerate() {
        let (re, im) = (2 * i, 2 * i + 1);

        match bt {
            BusType::Slack => {
                m.push(re, re, 1.0);
                m.push(im, im, 1.0);
            }
            BusType::PQ => {
                for &(j, y) in &net.y_trans[i] {
                    m.push(re, 2 * j, y.re);
                    m.push(re, 2 * j + 1, -y.im);
                    m.push(im, 2 * j, y.im);
                    m.push(im, 2 * j + 1, y.re);
                }
            }
            BusType::PV | BusType::PVLim => {
                for &(j, y) in &net.y_trans[i] {
                    m.push(re, 2 * j, y.re);
                    m.push(re, 2 * j + 1, -y.im);
                }
                m.push(im, re, 1.0);
            }
        }
    }

    m.to_csc()
}
