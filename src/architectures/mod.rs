//! Hardware description of the processor.
//!
//! [`control`] is the pure decode table of the controller, [`hardware`] the
//! functional units it drives and [`processor`] the wiring between them.

pub mod control;
pub mod hardware;
pub mod hardware_async;
pub mod processor;
