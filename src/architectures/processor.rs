//! The 4-bit load-store processor: controller, program counter, instruction
//! register, ALU with a registered output, and a synchronous RAM, wired
//! together.
//!
//! A clock period has two phases. [`CpuSim::propagate_signals`] evaluates the
//! combinational logic from a snapshot of the registers (`cur_state`) and
//! writes the next register values into `nex_state`. [`CpuSim::initiate_next_cycle`]
//! is the rising edge: the RAM acts on the inputs latched during propagation
//! and `nex_state` replaces `cur_state`. Nothing read during propagation can
//! observe a value written in the same cycle.

use serde::Serialize;

use super::{
    control::{AddrSel, ControlSignals, DataSel, FsmState},
    hardware::*,
};
use crate::{
    framework::{CpuSim, MemData, MEM_SIZE},
    isa::{self, op_code, Addr, Decoded, Inst, Word},
    object::Object,
    record::{CycleRecord, RamAccess, Recorder},
};

crate::define_stages! {
    /// Controller state register.
    CtrlStage ctrl { state: FsmState = FsmState::Init }
    /// Program counter.
    PcStage pc { pc: Addr = 0 }
    /// Instruction register, loaded during FETCH.
    IrStage ir { inst: Inst = 0 }
    /// Registered ALU output. This is the only value ever written back to
    /// memory.
    AluStage alu { f: Word = 0, cout: bool = false }
}

/// Intermediate signals of the current cycle.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct Inter {
    pub decoded: Decoded,
    pub sig: ControlSignals,
    pub alua: Word,
    pub alub: Word,
    /// Combinational ALU output, registered on the edge.
    pub alu_f: Word,
    pub alu_cout: bool,
    pub ram_addr: Addr,
    pub ram_din: Word,
}

pub struct Processor {
    cur_unit_in: UnitInputSignal,
    cur_unit_out: UnitOutputSignal,
    cur_inter: Inter,
    cur_state: StageState,
    nex_state: StageState,
    units: Units,
    program_len: usize,
    /// Level of the reset line.
    reset: bool,
    cycle_count: u64,
    recorder: Option<Recorder>,
}

impl Processor {
    /// Build a processor with the given program and initial data memory.
    /// The processor starts right after a reset pulse, in INIT.
    pub fn new(program: &[Inst], memory: [Word; MEM_SIZE]) -> anyhow::Result<Self> {
        let units = Units::init(program, MemData::init(memory))?;
        Ok(Self {
            cur_unit_in: UnitInputSignal::default(),
            cur_unit_out: UnitOutputSignal::default(),
            cur_inter: Inter::default(),
            cur_state: StageState::default(),
            nex_state: StageState::default(),
            units,
            program_len: program.len(),
            reset: false,
            cycle_count: 0,
            recorder: None,
        })
    }

    pub fn from_object(obj: &Object) -> anyhow::Result<Self> {
        Self::new(&obj.program, obj.init_mem())
    }

    /// Start recording a [`CycleRecord`] on every clock edge.
    pub fn enable_recording(&mut self) {
        self.recorder.get_or_insert_with(Recorder::default);
    }
    pub fn recorder(&self) -> Option<&Recorder> {
        self.recorder.as_ref()
    }

    pub fn state(&self) -> FsmState {
        self.cur_state.ctrl.state
    }
    /// Content of the instruction register.
    pub fn instruction(&self) -> Inst {
        self.cur_state.ir.inst
    }
    /// Registered ALU output and carry.
    pub fn alu_result(&self) -> (Word, bool) {
        (self.cur_state.alu.f, self.cur_state.alu.cout)
    }
    /// Stage registers of the current cycle.
    pub fn stages(&self) -> &StageState {
        &self.cur_state
    }
    /// Intermediate signals computed by the last propagation.
    pub fn signals(&self) -> &Inter {
        &self.cur_inter
    }
    pub fn reset_asserted(&self) -> bool {
        self.reset
    }
}

impl CpuSim for Processor {
    fn propagate_signals(&mut self) {
        if self.reset {
            return;
        }
        let Self {
            cur_unit_in: ins,
            cur_unit_out: outs,
            cur_state: cur,
            units,
            ..
        } = self;
        let mut nex = *cur;

        // :==========================: Controller :===========================:

        let decoded = isa::decode(cur.ir.inst);
        let Decoded { opcode, op1, op2 } = decoded;

        ins.ctrl = unit_in::Controller {
            state: cur.ctrl.state,
            opcode,
        };
        Controller::trigger(&mut units.ctrl, ins.ctrl.clone(), &mut outs.ctrl);
        let sig = outs.ctrl.sig;
        nex.ctrl.state = outs.ctrl.next_state;

        // :===========================: Fetch Stage :===========================:

        ins.irom = unit_in::InstructionRom { pc: cur.pc.pc };
        InstructionRom::trigger(&mut units.irom, ins.irom.clone(), &mut outs.irom);
        if sig.ir_load {
            nex.ir.inst = outs.irom.inst;
            tracing::info!(
                "FETCH: pc = {:#x}, inst = {} ({})",
                cur.pc.pc,
                isa::format_inst(outs.irom.inst),
                isa::decode(outs.irom.inst)
            );
        }

        ins.pc_inc = unit_in::PcIncrement { old_pc: cur.pc.pc };
        PcIncrement::trigger(&mut units.pc_inc, ins.pc_inc.clone(), &mut outs.pc_inc);
        if sig.pc_inc {
            nex.pc.pc = outs.pc_inc.new_pc;
        }

        // :==========================: Execute Stage :==========================:

        // The RAM read port holds the operand read during LOAD.
        let alua = if sig.alu_a_imm { op2 } else { outs.ram.dout };
        let alub = op2;

        ins.alu = unit_in::ArithmeticLogicUnit {
            a: alua,
            b: alub,
            s: sig.alu_sel,
            cin: sig.alu_cin,
        };
        ArithmeticLogicUnit::trigger(&mut units.alu, ins.alu.clone(), &mut outs.alu);
        nex.alu.f = outs.alu.f;
        nex.alu.cout = outs.alu.cout;

        if cur.ctrl.state == FsmState::Execute {
            tracing::info!(
                "EXECUTE: {} a = {:#x} b = {:#x} s = {:03b} -> f = {:#x}, cout = {}",
                op_code::name_of(opcode),
                alua,
                alub,
                sig.alu_sel,
                outs.alu.f,
                outs.alu.cout as u8
            );
        }

        // :==========================: Memory Stage :===========================:

        let ram_addr = match sig.addr_sel {
            AddrSel::Operand => op1,
            AddrSel::Pc => cur.pc.pc,
        };
        let ram_din = match sig.data_sel {
            DataSel::AluResult => cur.alu.f,
            DataSel::Imm => op2,
        };

        // Latched here; the RAM acts on the clock edge.
        ins.ram = unit_in::SyncRam {
            addr: ram_addr,
            din: ram_din,
            cs: sig.ram_cs,
            we: sig.ram_we,
        };

        match cur.ctrl.state {
            FsmState::Load => tracing::info!("LOAD: addr = {:#x}", ram_addr),
            FsmState::Store => tracing::info!("STORE: M[{:#x}] <- {:#x}", ram_addr, ram_din),
            _ => {}
        }

        self.cur_inter = Inter {
            decoded,
            sig,
            alua,
            alub,
            alu_f: outs.alu.f,
            alu_cout: outs.alu.cout,
            ram_addr,
            ram_din,
        };
        self.nex_state = nex;
    }

    fn initiate_next_cycle(&mut self) {
        self.cycle_count += 1;
        if self.reset {
            // reset dominates: no transitions, no memory writes
            self.cur_state = StageState::default();
            self.nex_state = StageState::default();
            return;
        }

        let ram_in = std::mem::take(&mut self.cur_unit_in.ram);
        SyncRam::trigger(&mut self.units.ram, ram_in.clone(), &mut self.cur_unit_out.ram);

        if let Some(recorder) = &mut self.recorder {
            let cur = &self.cur_state;
            recorder.push(CycleRecord {
                cycle: self.cycle_count,
                state: cur.ctrl.state,
                pc: cur.pc.pc,
                inst: cur.ir.inst,
                alu_out: cur.alu.f,
                alu_cout: cur.alu.cout,
                ram: ram_in.cs.then(|| RamAccess {
                    addr: ram_in.addr,
                    write: ram_in.we,
                    data: if ram_in.we {
                        ram_in.din
                    } else {
                        self.cur_unit_out.ram.dout
                    },
                }),
            });
        }

        self.cur_state = self.nex_state;
    }

    fn set_reset(&mut self, level: bool) {
        if level {
            self.cur_state = StageState::default();
            self.nex_state = StageState::default();
            self.cur_unit_in.ram = Default::default();
            self.cur_inter = Inter::default();
            if !self.reset {
                tracing::debug!("reset asserted");
            }
        } else if self.reset {
            tracing::debug!("reset released");
        }
        self.reset = level;
    }

    /// The program is exhausted once the controller is about to fetch past
    /// the last loaded instruction. A full 16-slot program never ends since
    /// the program counter wraps.
    fn is_terminate(&self) -> bool {
        self.cur_state.ctrl.state == FsmState::Fetch
            && self.cur_state.pc.pc as usize >= self.program_len
    }

    fn program_counter(&self) -> Addr {
        self.cur_state.pc.pc
    }

    fn cycle_count(&self) -> u64 {
        self.cycle_count
    }

    fn mem(&self) -> [Word; MEM_SIZE] {
        self.units.mem()
    }
}

impl std::fmt::Display for Processor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (alu, cout) = self.alu_result();
        writeln!(
            f,
            "cycle {cycle}  state {state}  pc {pc:#x}  ir {ir} ({inst})  alu {alu:#x} cout {cout}",
            cycle = self.cycle_count,
            state = self.state(),
            pc = self.program_counter(),
            ir = isa::format_inst(self.instruction()),
            inst = isa::decode(self.instruction()),
            cout = cout as u8,
        )?;
        let mem = self.mem();
        write!(f, "mem")?;
        for (addr, val) in mem.iter().enumerate() {
            write!(f, " {addr:x}:{val:x}")?;
        }
        writeln!(f)
    }
}
