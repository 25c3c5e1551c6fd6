//! This module provides parsing utilities for the processor's assembly.
use anyhow::{Context, Result};

use pest::{iterators::Pair, Parser};
use pest_derive::Parser;

use crate::{
    isa::{encode, op_code, Addr, Inst, Word, INST_BITS},
    object::{Object, SourceInfo},
    utils::parse_literal,
};

#[derive(Parser)]
#[grammar = "src/grammar.pest"] // relative to the manifest
pub struct Nib4AsmParser;

pub fn parse(src: &str) -> Result<pest::iterators::Pairs<'_, Rule>> {
    Ok(Nib4AsmParser::parse(Rule::main, src)
        .context("fail to parse assembly")?
        .next()
        .context("empty parse tree")?
        .into_inner())
}

#[derive(Default)]
pub struct AssembleOption {
    verbose: bool,
}

impl AssembleOption {
    pub fn set_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

/// Parse a numeric operand that must fit in `bits` bits.
fn number(pair: Pair<'_, Rule>, bits: u32, what: &str) -> Result<u64> {
    let (line, col) = pair.as_span().start_pos().line_col();
    let s = pair.as_str();
    let val = parse_literal(s).with_context(|| format!("{line}:{col}: invalid number `{s}`"))?;
    if val >> bits != 0 {
        anyhow::bail!("{line}:{col}: {what} `{s}` does not fit in {bits} bits");
    }
    Ok(val)
}

fn opcode_of(mnemonic: &str) -> Option<u8> {
    Some(match mnemonic.to_ascii_lowercase().as_str() {
        "sto" => op_code::STO,
        "add" => op_code::ADD,
        "sub" => op_code::SUB,
        "and" => op_code::AND,
        "or" => op_code::OR,
        "xor" => op_code::XOR,
        "not" => op_code::NOT,
        _ => return None,
    })
}

/// transform assembly code to binary object code
pub fn assemble(src: &str, option: AssembleOption) -> Result<Object> {
    macro_rules! verbo {
        ($e:expr) => {
            if option.verbose {
                tracing::trace!("{:?}", $e);
            }
        };
    }
    let src_lines: Vec<&str> = src.lines().collect();
    let mut obj = Object::default();
    let lines = parse(src).context("fail to assemble source")?;

    for line in lines.filter(|p| p.as_rule() == Rule::line) {
        let (lineno, _) = line.as_span().start_pos().line_col();
        let text = src_lines.get(lineno - 1).copied().unwrap_or_default();
        let mut src_info = SourceInfo::new(text.trim_end());

        if let Some(pair) = line.into_inner().next() {
            verbo!(&pair);
            let rule = pair.as_rule();
            let mut it = pair.into_inner();
            match rule {
                Rule::inst => {
                    let mnemonic = it.next().context("missing mnemonic")?.as_str();
                    let opcode = opcode_of(mnemonic)
                        .with_context(|| format!("line {lineno}: unknown mnemonic `{mnemonic}`"))?;
                    let op1 = number(it.next().context("missing address")?, 4, "address")?;
                    let op2 = match it.next() {
                        Some(p) => number(p, 4, "immediate")?,
                        None if opcode == op_code::NOT => 0,
                        None => anyhow::bail!(
                            "line {lineno}: `{mnemonic}` expects an immediate operand"
                        ),
                    };
                    let inst = encode(opcode, op1 as Addr, op2 as Word);
                    let slot = obj.push_inst(inst).with_context(|| format!("line {lineno}"))?;
                    src_info.addr = Some(slot);
                    src_info.inst = Some(inst);
                }
                Rule::d_inst => {
                    let word = it.next().context("missing word")?;
                    let inst = number(word, INST_BITS, "word")? as Inst;
                    let slot = obj.push_inst(inst).with_context(|| format!("line {lineno}"))?;
                    src_info.addr = Some(slot);
                    src_info.inst = Some(inst);
                }
                Rule::d_data => {
                    let addr = number(it.next().context("missing address")?, 4, "address")? as Addr;
                    let val = number(it.next().context("missing value")?, 4, "value")? as Word;
                    obj.data[addr as usize] = val;
                    src_info.data = Some((addr, val));
                }
                _ => unreachable!("grammar only yields statements here"),
            }
        }
        verbo!(&src_info);
        obj.source.push(src_info);
    }
    Ok(obj)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub const SAMPLE: &str = "# sample program
sto 4, 5      ; M[4] = 5
add 4, 6      ; M[4] = 0xb
STO 0x1, 0xF
sub 1, 0b0111
not 0xf       // M[15] = ~M[15]
";

    #[test]
    fn test_assemble() -> Result<()> {
        let obj = assemble(SAMPLE, AssembleOption::default())?;
        assert_eq!(obj.program, [0x045, 0x146, 0x01f, 0x217, 0x6f0]);
        assert_eq!(obj.source.len(), 7);
        assert_eq!(obj.source[0].addr, None);
        assert_eq!(obj.source[2].addr, Some(1));
        assert_eq!(obj.source[2].src, "add 4, 6      ; M[4] = 0xb");

        let listing = obj.to_string();
        assert!(listing.contains("0x1: 001_0100_0110 | add 4, 6"));
        Ok(())
    }

    #[test]
    fn test_directives() -> Result<()> {
        let obj = assemble(
            ".data 3, 9\n.data 0xf, 0b1010\n.inst 0x7ff\nadd 3, 1\n",
            AssembleOption::default(),
        )?;
        assert_eq!(obj.data[3], 9);
        assert_eq!(obj.data[15], 10);
        assert_eq!(obj.program, [0x7ff, 0x131]);
        assert_eq!(obj.source[0].data, Some((3, 9)));
        assert!(obj.to_string().contains("M[0x3] = 0x9"));
        Ok(())
    }

    #[test]
    fn test_assemble_errors() {
        let asm = |s: &str| assemble(s, AssembleOption::default());
        assert!(asm("sto 4, 16").is_err());
        assert!(asm("add 16, 1").is_err());
        assert!(asm("add 4").is_err());
        assert!(asm("mov 1, 2").is_err());
        assert!(asm("add4, 1").is_err());
        assert!(asm(".inst 0x800").is_err());
        assert!(asm(&"add 0, 1\n".repeat(17)).is_err());
        assert!(asm(&"add 0, 1\n".repeat(16)).is_ok());
    }

    #[test]
    fn test_not_immediate() -> Result<()> {
        let obj = assemble("not 3\nnot 3, 0x5\n", AssembleOption::default())?;
        assert_eq!(obj.program, [0x630, 0x635]);
        Ok(())
    }
}
