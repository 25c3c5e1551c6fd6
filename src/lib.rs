//! Cycle-level simulator of a 4-bit load-store processor.
//!
//! The processor is built from gate-level combinational logic ([`logic`]),
//! functional units and stage registers ([`architectures`]), and is clocked
//! through the [`framework::CpuSim`] trait.

mod asm;
mod dsl;
mod logging;
mod utils;

pub mod architectures;
pub mod framework;
pub mod isa;
pub mod logic;
pub mod object;
pub mod record;

#[cfg(test)]
mod test;

pub use architectures::processor::Processor;
pub use asm::{assemble, AssembleOption};
pub use logging::logging_setup;
pub use object::Object;
pub use utils::{mem_diff, mem_print, parse_literal};
