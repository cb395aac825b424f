use crate::error::ModelError;
use crate::mpc::{Bus, Gen};
use crate::order::BusOrder;

/// Classification of a bus, selecting the boundary condition it
/// contributes to the embedding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusType {
    /// Reference voltage magnitude and angle.
    Slack,
    /// Fixed voltage magnitude and active power, reactive limits ignored.
    PV,
    /// Fixed voltage magnitude and active power, reactive output still to
    /// be checked against its limits.
    PVLim,
    /// Fixed active and reactive power.
    PQ,
}

/// Builds the initial classification of each bus.
///
/// The single bus with type `REF` is the slack. Every other bus with
/// at least one generator is `PVLim` if Q limits are enforced or `PV`
/// otherwise. All remaining buses are PQ. Returns the internal index of
/// the slack bus and the classification vector.
pub fn bus_types(
    bus: &[Bus],
    gen: &[Gen],
    order: &BusOrder,
    enforce_q_limits: bool,
) -> Result<(usize, Vec<BusType>), ModelError> {
    let slack: Vec<usize> = bus
        .iter()
        .enumerate()
        .filter(|(_, b)| b.is_ref())
        .map(|(i, _)| i)
        .collect();
    let refbus = match slack.as_slice() {
        [] => return Err(ModelError::NoSlack),
        [i] => *i,
        _ => {
            return Err(ModelError::MultipleSlack(
                slack.iter().map(|&i| bus[i].bus_i).collect(),
            ))
        }
    };

    let gen_type = if enforce_q_limits {
        BusType::PVLim
    } else {
        BusType::PV
    };

    let mut bus_type = vec![BusType::PQ; bus.len()];
    for (i, g) in gen.iter().enumerate() {
        let k = order.index(g.gen_bus, "generator", i)?;
        bus_type[k] = gen_type;
    }
    bus_type[refbus] = BusType::Slack;

    Ok((refbus, bus_type))
}
