//! Instruction set of the 4-bit load-store processor.
//!
//! An instruction is an 11-bit word laid out as
//! `opcode[10:8] | operand1[7:4] | operand2[3:0]`. Operand 1 is a data memory
//! address (source and destination), operand 2 is an immediate.

use crate::utils::mem_diff;

/// A 4-bit data word. Only the lower 4 bits are meaningful.
pub type Word = u8;
/// A 4-bit data memory address.
pub type Addr = u8;
/// An 11-bit instruction word.
pub type Inst = u16;

pub const WORD_MASK: u8 = 0xf;
pub const INST_BITS: u32 = 11;
pub const INST_MASK: Inst = (1 << INST_BITS) - 1;
/// Number of words in the data memory. The program store has the same
/// number of slots since the program counter is 4 bits wide as well.
pub const MEM_WORDS: usize = 16;

macro_rules! define_code {
    {
        @mod $modname:ident;
        @type $typ:ty;
        $( $cname:ident = $cval:expr; )*
    } => {
        pub mod $modname {
            $(pub const $cname : $typ = $cval; )*
            #[allow(unused)]
            pub fn name_of(code: $typ) -> &'static str {
                match code {
                    $($cname => stringify!($cname), )*
                    _ => "no name"
                }
            }
        }
    };
}

define_code! {
    @mod op_code;
    @type u8;
    STO = 0b000;
    ADD = 0b001;
    SUB = 0b010;
    AND = 0b011;
    OR = 0b100;
    XOR = 0b101;
    NOT = 0b110;
    // reserved
    RSV = 0b111;
}

define_code! {
    @mod alu_fn;
    @type u8;
    PASS = 0b000;
    ADD = 0b001;
    SUB = 0b010;
    AND = 0b011;
    OR = 0b100;
    XOR = 0b101;
    NOT = 0b110;
    ZERO = 0b111;
}

/// Fields of an instruction word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub struct Decoded {
    pub opcode: u8,
    /// Memory address of the operand, also the destination.
    pub op1: Addr,
    /// The immediate.
    pub op2: Word,
}

pub fn decode(inst: Inst) -> Decoded {
    Decoded {
        opcode: ((inst >> 8) & 0b111) as u8,
        op1: ((inst >> 4) & 0xf) as Addr,
        op2: (inst & 0xf) as Word,
    }
}

pub const fn encode(opcode: u8, op1: Addr, op2: Word) -> Inst {
    ((opcode as Inst & 0b111) << 8) | ((op1 as Inst & 0xf) << 4) | (op2 as Inst & 0xf)
}

/// Render an instruction word as `ooo_aaaa_iiii`.
pub fn format_inst(inst: Inst) -> String {
    let Decoded { opcode, op1, op2 } = decode(inst);
    format!("{opcode:03b}_{op1:04b}_{op2:04b}")
}

impl std::fmt::Display for Decoded {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = op_code::name_of(self.opcode).to_lowercase();
        match self.opcode {
            op_code::RSV => write!(f, ".inst {:#05x}", encode(self.opcode, self.op1, self.op2)),
            op_code::NOT if self.op2 == 0 => write!(f, "{name} {:#x}", self.op1),
            _ => write!(f, "{name} {:#x}, {:#x}", self.op1, self.op2),
        }
    }
}

/// Result of a program on the instruction-level model.
pub struct StandardResult {
    pub mem: [Word; MEM_WORDS],
    pub n_insts: u64,
}

/// Execute a program w.r.t. the ISA definition, one whole instruction at a
/// time. This function is used to verify the cycle-level processor.
pub fn simulate(
    program: &[Inst],
    mut mem: [Word; MEM_WORDS],
    tty_out: bool,
) -> anyhow::Result<StandardResult> {
    if program.len() > MEM_WORDS {
        anyhow::bail!(
            "program has {} instructions, the program store holds {}",
            program.len(),
            MEM_WORDS
        );
    }
    let original = mem;
    let mut n_insts = 0;

    for &inst in program {
        if inst > INST_MASK {
            anyhow::bail!("invalid instruction word: {:#x}", inst);
        }
        n_insts += 1;
        let Decoded { opcode, op1, op2 } = decode(inst);
        let v = mem[op1 as usize];
        let r = match opcode {
            op_code::STO => op2,
            op_code::ADD => v.wrapping_add(op2),
            op_code::SUB => v.wrapping_sub(op2),
            op_code::AND => v & op2,
            op_code::OR => v | op2,
            op_code::XOR => v ^ op2,
            op_code::NOT => !v,
            // the reserved opcode writes the operand back unchanged
            _ => v,
        };
        mem[op1 as usize] = r & WORD_MASK;
    }

    if tty_out {
        eprintln!("total instructions: {}", n_insts);
        mem_diff(&original, &mem);
    }

    Ok(StandardResult { mem, n_insts })
}
