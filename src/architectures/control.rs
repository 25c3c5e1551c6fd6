//! The controller: a five-state machine and its output table.
//!
//! The controller cycles `INIT -> FETCH -> LOAD -> EXECUTE -> STORE -> FETCH`
//! unconditionally. Its outputs are a pure function of the current state and
//! the opcode held in the instruction register, see [`ControlSignals::decode`].

use ansi_term::Colour;
use serde::Serialize;

use crate::isa::{alu_fn, op_code};

/// Controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum FsmState {
    /// Entered on reset, left on the first clock edge.
    #[default]
    Init,
    /// Latch the instruction at PC and advance PC.
    Fetch,
    /// Read the operand addressed by operand 1.
    Load,
    /// Run the ALU; its output is registered on the edge.
    Execute,
    /// Write the registered ALU output back to operand 1.
    Store,
}

impl FsmState {
    pub fn next(self) -> Self {
        match self {
            FsmState::Init => FsmState::Fetch,
            FsmState::Fetch => FsmState::Load,
            FsmState::Load => FsmState::Execute,
            FsmState::Execute => FsmState::Store,
            FsmState::Store => FsmState::Fetch,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            FsmState::Init => "INIT",
            FsmState::Fetch => "FETCH",
            FsmState::Load => "LOAD",
            FsmState::Execute => "EXECUTE",
            FsmState::Store => "STORE",
        }
    }
}

impl std::fmt::Display for FsmState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let colour = match self {
            FsmState::Init => Colour::Fixed(8),
            FsmState::Fetch => Colour::Cyan,
            FsmState::Load => Colour::Yellow,
            FsmState::Execute => Colour::Purple,
            FsmState::Store => Colour::Green,
        };
        if f.alternate() {
            write!(f, "{}", self.name())
        } else {
            write!(f, "{}", colour.paint(self.name()))
        }
    }
}

/// Source of the memory address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum AddrSel {
    #[default]
    Pc,
    /// Operand 1 of the instruction register.
    Operand,
}

/// Source of the memory write data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum DataSel {
    /// Operand 2 of the instruction register.
    #[default]
    Imm,
    /// The registered ALU output.
    AluResult,
}

/// Control signals emitted by the controller during one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ControlSignals {
    /// Memory chip select.
    pub ram_cs: bool,
    /// Memory write enable, only meaningful with `ram_cs`.
    pub ram_we: bool,
    pub addr_sel: AddrSel,
    pub data_sel: DataSel,
    /// Advance the program counter on the edge.
    pub pc_inc: bool,
    /// Load the instruction register on the edge.
    pub ir_load: bool,
    pub alu_sel: u8,
    pub alu_cin: bool,
    /// Feed the immediate instead of the memory operand into ALU input A.
    pub alu_a_imm: bool,
}

/// ALU selector, carry-in and A-input source for an opcode.
pub fn alu_dispatch(opcode: u8) -> (u8, bool, bool) {
    match opcode {
        // store-immediate passes operand 2 through the ALU
        op_code::STO => (alu_fn::PASS, false, true),
        op_code::ADD => (alu_fn::ADD, false, false),
        op_code::SUB => (alu_fn::SUB, true, false),
        op_code::AND => (alu_fn::AND, false, false),
        op_code::OR => (alu_fn::OR, false, false),
        op_code::XOR => (alu_fn::XOR, false, false),
        op_code::NOT => (alu_fn::NOT, false, false),
        _ => (alu_fn::PASS, false, false),
    }
}

impl ControlSignals {
    /// The output table of the controller.
    ///
    /// | state   | memory | address | data | pc   | alu    |
    /// |---------|--------|---------|------|------|--------|
    /// | INIT    | -      | -       | -    | hold | 0      |
    /// | FETCH   | read   | pc      | -    | +1   | 0      |
    /// | LOAD    | read   | op1     | -    | hold | 0      |
    /// | EXECUTE | -      | -       | -    | hold | opcode |
    /// | STORE   | write  | op1     | alu  | hold | hold   |
    pub fn decode(state: FsmState, opcode: u8) -> Self {
        let (alu_sel, alu_cin, alu_a_imm) = alu_dispatch(opcode);
        match state {
            FsmState::Init => Self::default(),
            FsmState::Fetch => Self {
                ram_cs: true,
                addr_sel: AddrSel::Pc,
                pc_inc: true,
                ir_load: true,
                ..Default::default()
            },
            FsmState::Load => Self {
                ram_cs: true,
                addr_sel: AddrSel::Operand,
                ..Default::default()
            },
            FsmState::Execute => Self {
                alu_sel,
                alu_cin,
                alu_a_imm,
                ..Default::default()
            },
            FsmState::Store => Self {
                ram_cs: true,
                ram_we: true,
                addr_sel: AddrSel::Operand,
                data_sel: DataSel::AluResult,
                alu_sel,
                alu_cin,
                alu_a_imm,
                ..Default::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATES: [FsmState; 5] = [
        FsmState::Init,
        FsmState::Fetch,
        FsmState::Load,
        FsmState::Execute,
        FsmState::Store,
    ];

    #[test]
    fn test_cycle_order() {
        let mut s = FsmState::default();
        assert_eq!(s, FsmState::Init);
        let mut seen = vec![];
        for _ in 0..9 {
            s = s.next();
            seen.push(s);
        }
        use FsmState::*;
        assert_eq!(
            seen,
            [Fetch, Load, Execute, Store, Fetch, Load, Execute, Store, Fetch]
        );
    }

    #[test]
    fn test_single_memory_access() {
        for state in STATES {
            for opcode in 0..8 {
                let sig = ControlSignals::decode(state, opcode);
                let expect_cs = matches!(state, FsmState::Fetch | FsmState::Load | FsmState::Store);
                assert_eq!(sig.ram_cs, expect_cs, "{state:#} {opcode}");
                assert_eq!(sig.ram_we, state == FsmState::Store, "{state:#} {opcode}");
                assert_eq!(sig.pc_inc, state == FsmState::Fetch, "{state:#} {opcode}");
                assert_eq!(sig.ir_load, state == FsmState::Fetch, "{state:#} {opcode}");
            }
        }
    }

    #[test]
    fn test_execute_dispatch() {
        for opcode in 1..=6 {
            let sig = ControlSignals::decode(FsmState::Execute, opcode);
            assert_eq!(sig.alu_sel, opcode);
            assert!(!sig.alu_a_imm);
            assert_eq!(sig.alu_cin, opcode == op_code::SUB);
        }
        let sto = ControlSignals::decode(FsmState::Execute, op_code::STO);
        assert_eq!(sto.alu_sel, alu_fn::PASS);
        assert!(sto.alu_a_imm);
        let rsv = ControlSignals::decode(FsmState::Execute, op_code::RSV);
        assert_eq!(rsv.alu_sel, alu_fn::PASS);
        assert!(!rsv.alu_a_imm);
        // outside EXECUTE/STORE the ALU passes A through
        assert_eq!(ControlSignals::decode(FsmState::Load, op_code::ADD).alu_sel, alu_fn::PASS);
    }

    #[test]
    fn test_store_selects_alu_result() {
        let sig = ControlSignals::decode(FsmState::Store, op_code::ADD);
        assert_eq!(sig.addr_sel, AddrSel::Operand);
        assert_eq!(sig.data_sel, DataSel::AluResult);
        assert_eq!(sig.alu_sel, alu_fn::ADD);
    }
}
