pub mod commitment;
pub mod gadgets;
pub mod transfer;

pub use transfer::{NUM_PUBLIC_INPUTS, TransferCircuit};
