mod bus_types;
mod error;
mod helm;
mod lu;
mod mpc;
mod mpopt;
mod operator;
mod order;
mod pade;
mod pf;
mod pfsoln;
mod qlim;
mod sbus;
mod series;
mod traits;
mod ybus;

pub mod debug;
pub mod math;

#[cfg(test)]
mod tests;

pub use bus_types::*;
pub use error::*;
pub use helm::*;
pub use lu::*;
pub use mpc::*;
pub use mpopt::*;
pub use operator::*;
pub use order::*;
pub use pade::*;
pub use pf::*;
pub use pfsoln::*;
pub use qlim::*;
pub use sbus::*;
pub use series::*;
pub use traits::*;
pub use ybus::*;
