//! A general clocked CPU simulator interface.
//!
//! During a CPU cycle, signals in stage registers are propagated through the
//! combinational logic circuits. The results are latched into the stage
//! registers on the rising clock edge. Therefore two basic operations are
//! enough to simulate the processor, see [`CpuSim`].

use std::{
    cell::{Ref, RefCell, RefMut},
    rc::Rc,
};

use crate::isa::{Addr, Word, MEM_WORDS};

/// Size of the data memory in words.
pub const MEM_SIZE: usize = MEM_WORDS;

/// Data memory shared by hardware units (and inspected by the harness).
#[derive(Debug, Clone, Default)]
pub struct MemData(Rc<RefCell<[Word; MEM_SIZE]>>);

impl MemData {
    pub fn init(memory: [Word; MEM_SIZE]) -> Self {
        Self(Rc::new(RefCell::new(memory)))
    }
    pub fn read(&self) -> Ref<'_, [Word; MEM_SIZE]> {
        self.0.borrow()
    }
    pub fn write(&self) -> RefMut<'_, [Word; MEM_SIZE]> {
        self.0.borrow_mut()
    }
    /// Copy of the current memory contents.
    pub fn snapshot(&self) -> [Word; MEM_SIZE] {
        *self.0.borrow()
    }
}

/// The boundary of a simulated core: clock, reset and the observability
/// surface used by test harnesses and viewers.
pub trait CpuSim {
    /// Propagate signals through the combinational logic circuits, computing
    /// the next value of every register from the current ones. Nothing
    /// observable changes until [`CpuSim::initiate_next_cycle`].
    fn propagate_signals(&mut self);

    /// The rising clock edge: commit the values computed by
    /// [`CpuSim::propagate_signals`] and let edge-triggered units act. This
    /// function should be called after [`CpuSim::propagate_signals`].
    /// Otherwise the edge commits the values of the previous propagation.
    fn initiate_next_cycle(&mut self);

    /// Drive the reset line. Asserting it takes effect immediately, without
    /// waiting for a clock edge, and dominates every tick while held.
    fn set_reset(&mut self, level: bool);

    /// Whether the harness should stop clocking the core.
    fn is_terminate(&self) -> bool;

    /// Get the current program counter.
    fn program_counter(&self) -> Addr;

    /// Number of clock edges seen so far.
    fn cycle_count(&self) -> u64;

    /// Get current data memory.
    fn mem(&self) -> [Word; MEM_SIZE];

    /// Simulate one clock period. The core never halts, so this clocks it
    /// whether or not [`CpuSim::is_terminate`] holds.
    fn step(&mut self) {
        self.propagate_signals();
        self.initiate_next_cycle();
    }

    /// Step until [`CpuSim::is_terminate`], returning the number of cycles
    /// taken by this call.
    fn run(&mut self, max_cycles: u64) -> anyhow::Result<u64> {
        let start = self.cycle_count();
        while !self.is_terminate() {
            if self.cycle_count() - start >= max_cycles {
                anyhow::bail!("exceed maximum CPU cycle limit ({max_cycles})");
            }
            self.step();
        }
        Ok(self.cycle_count() - start)
    }
}
