//! The asynchronous 16x4 RAM, an alternate memory for teaching. It is not
//! wired into the processor, whose controller relies on a registered read.
//!
//! Reads are combinational: `dout` follows `addr` within the same cycle. When
//! the chip is not selected, or is being written, the output is high impedance
//! (`None`).

use crate::{
    define_units,
    framework::MemData,
    isa::{Addr, Word, WORD_MASK},
};

define_units! {
    AsyncRam aram {
        .input(addr: Addr, din: Word, cs: bool, we: bool)
        .output(dout: Option<Word>)
        binary: MemData
    } {
        *dout = None;
        if !cs {
            return;
        }
        let addr = (addr & WORD_MASK) as usize;
        if we {
            binary.write()[addr] = din & WORD_MASK;
        } else {
            *dout = Some(binary.read()[addr]);
        }
    }
}

impl Units {
    pub fn init(memory: MemData) -> Self {
        Self {
            aram: AsyncRam { binary: memory },
        }
    }
}
