use crate::error::ModelError;
use crate::mpc::Bus;
use std::collections::HashMap;

/// Mapping between external bus numbers and consecutive internal indexes.
#[derive(Clone, Debug)]
pub struct BusOrder {
    pub e2i: HashMap<usize, usize>,
    pub i2e: Vec<usize>,
}

impl BusOrder {
    /// Numbers buses in the order they appear in `bus`.
    pub fn new(bus: &[Bus]) -> Result<Self, ModelError> {
        if bus.is_empty() {
            return Err(ModelError::Empty);
        }
        let mut e2i = HashMap::with_capacity(bus.len());
        let mut i2e = Vec::with_capacity(bus.len());
        for (i, b) in bus.iter().enumerate() {
            if e2i.insert(b.bus_i, i).is_some() {
                return Err(ModelError::DuplicateBus(b.bus_i));
            }
            i2e.push(b.bus_i);
        }
        Ok(Self { e2i, i2e })
    }

    pub fn len(&self) -> usize {
        self.i2e.len()
    }

    pub fn is_empty(&self) -> bool {
        self.i2e.is_empty()
    }

    /// Internal index of external bus number `bus`, referenced by the
    /// `index`-th record of kind `element`.
    pub fn index(
        &self,
        bus: usize,
        element: &'static str,
        index: usize,
    ) -> Result<usize, ModelError> {
        self.e2i.get(&bus).copied().ok_or(ModelError::UnknownBus {
            element,
            index,
            bus,
        })
    }
}
