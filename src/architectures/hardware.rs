//! This module defines hardware units integrated in the processor.
//! The units are defined using the `define_units!` macro.

use crate::{
    define_units,
    framework::{MemData, MEM_SIZE},
    isa::{encode, op_code, Addr, Inst, Word, INST_MASK, WORD_MASK},
    logic::{adder_4b, alu_4b},
};

use super::control::{ControlSignals, FsmState};

/// Filler for unused program slots. The reserved opcode writes `M[0]` back
/// unchanged, so clocking past the program leaves memory intact.
pub const EMPTY_SLOT: Inst = encode(op_code::RSV, 0, 0);

define_units! {
    /// Program store. The instruction it presents is latched into the
    /// instruction register during FETCH. Slots past the program hold
    /// [`EMPTY_SLOT`].
    InstructionRom irom {
        .input(pc: Addr)
        .output(inst: Inst)
        rom: [Inst; MEM_SIZE]
    } {
        *inst = rom[(pc & WORD_MASK) as usize] & INST_MASK;
    }

    /// Decodes the current state and opcode into control signals, and
    /// computes the next state.
    Controller ctrl {
        .input(state: FsmState, opcode: u8)
        .output(sig: ControlSignals, next_state: FsmState)
    } {
        *sig = ControlSignals::decode(state, opcode);
        *next_state = state.next();
    }

    /// Note that we do not simply write `pc + 1`: the program counter is
    /// advanced through a ripple-carry adder and wraps at 16.
    PcIncrement pc_inc {
        .input(old_pc: Addr)
        .output(new_pc: Addr)
    } {
        let (sum, _carry) = adder_4b(old_pc, 1, false);
        *new_pc = sum;
    }

    ArithmeticLogicUnit alu {
        .input(a: Word, b: Word, s: u8, cin: bool)
        .output(f: Word, cout: bool)
    } {
        (*f, *cout) = alu_4b(a, b, s, cin);
    }

    /// 16x4 synchronous RAM, triggered on the clock edge.
    ///
    /// With `cs` deasserted nothing happens. Otherwise `we` writes `din` to
    /// `addr`, and a read updates `dout`, which keeps its value until the
    /// next read (a registered read port).
    SyncRam ram {
        .input(addr: Addr, din: Word, cs: bool, we: bool)
        .output(
            /// Data read on the last edge with `cs && !we`.
            dout: Word
        )
        binary: MemData
    } {
        if !cs {
            return;
        }
        let addr = (addr & WORD_MASK) as usize;
        if we {
            tracing::info!("write memory: addr = {:#x}, din = {:#x}", addr, din);
            binary.write()[addr] = din & WORD_MASK;
        } else {
            *dout = binary.read()[addr];
            tracing::debug!("read memory: addr = {:#x}, dout = {:#x}", addr, *dout);
        }
    }
}

impl Units {
    /// Init CPU hardware with given program and data memory.
    pub fn init(program: &[Inst], memory: MemData) -> anyhow::Result<Self> {
        if program.len() > MEM_SIZE {
            anyhow::bail!(
                "program has {} instructions, the program store holds {}",
                program.len(),
                MEM_SIZE
            );
        }
        let mut rom = [EMPTY_SLOT; MEM_SIZE];
        for (slot, &inst) in rom.iter_mut().zip(program) {
            if inst > INST_MASK {
                anyhow::bail!("invalid instruction word: {:#x}", inst);
            }
            *slot = inst;
        }
        Ok(Self {
            irom: InstructionRom { rom },
            ctrl: Controller {},
            pc_inc: PcIncrement {},
            alu: ArithmeticLogicUnit {},
            ram: SyncRam { binary: memory },
        })
    }

    pub fn mem(&self) -> [Word; MEM_SIZE] {
        self.ram.binary.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pc_wraparound() {
        let mut unit = PcIncrement {};
        let mut out = unit_out::PcIncrement::default();
        PcIncrement::trigger(&mut unit, unit_in::PcIncrement { old_pc: 15 }, &mut out);
        assert_eq!(out.new_pc, 0);
        PcIncrement::trigger(&mut unit, unit_in::PcIncrement { old_pc: 7 }, &mut out);
        assert_eq!(out.new_pc, 8);
    }

    #[test]
    fn test_sync_ram_registered_read() {
        let mem = MemData::init([0; MEM_SIZE]);
        let mut ram = SyncRam { binary: mem.clone() };
        let mut out = unit_out::SyncRam::default();

        let write = unit_in::SyncRam { addr: 3, din: 0xa, cs: true, we: true };
        SyncRam::trigger(&mut ram, write, &mut out);
        assert_eq!(mem.read()[3], 0xa);
        // a write does not touch the read port
        assert_eq!(out.dout, 0);

        let read = unit_in::SyncRam { addr: 3, din: 0, cs: true, we: false };
        SyncRam::trigger(&mut ram, read, &mut out);
        assert_eq!(out.dout, 0xa);

        // deselected: no access, output held
        let idle = unit_in::SyncRam { addr: 4, din: 7, cs: false, we: true };
        SyncRam::trigger(&mut ram, idle, &mut out);
        assert_eq!(out.dout, 0xa);
        assert_eq!(mem.read()[4], 0);
    }

    #[test]
    fn test_units_init_rejects_wide_word() {
        assert!(Units::init(&[0x800], MemData::default()).is_err());
        assert!(Units::init(&[0; MEM_SIZE + 1], MemData::default()).is_err());
        let units = Units::init(&[encode(op_code::ADD, 2, 3)], MemData::default()).unwrap();
        assert_eq!(units.irom.rom[0], encode(op_code::ADD, 2, 3));
        assert!(units.irom.rom[1..].iter().all(|&inst| inst == EMPTY_SLOT));
    }
}
