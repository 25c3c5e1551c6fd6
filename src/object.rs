//! This file provides the binary representation of a program: the
//! instruction words, the initial data memory, and the source lines they
//! were assembled from.

use std::fmt::Display;

use anyhow::Context;
use regex::Regex;

use crate::{
    framework::MEM_SIZE,
    isa::{decode, format_inst, Addr, Inst, Word, INST_BITS},
};

#[derive(Debug, Clone)]
pub struct SourceInfo {
    /// Program slot of the instruction on this line.
    pub addr: Option<Addr>,
    pub inst: Option<Inst>,
    /// Data memory cell preloaded by this line.
    pub data: Option<(Addr, Word)>,
    pub src: String,
}

impl SourceInfo {
    pub fn new(src: impl Into<String>) -> Self {
        Self {
            addr: None,
            inst: None,
            data: None,
            src: src.into(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Object {
    pub program: Vec<Inst>,
    pub data: [Word; MEM_SIZE],
    pub source: Vec<SourceInfo>,
}

impl Object {
    /// Initial contents of the data memory.
    pub fn init_mem(&self) -> [Word; MEM_SIZE] {
        self.data
    }

    /// Append an instruction, returning its program slot.
    pub(crate) fn push_inst(&mut self, inst: Inst) -> anyhow::Result<Addr> {
        if self.program.len() >= MEM_SIZE {
            anyhow::bail!("program store is full ({} instructions)", MEM_SIZE);
        }
        self.program.push(inst);
        Ok((self.program.len() - 1) as Addr)
    }

    /// Read a program image in `$readmemb` form: one 11-bit binary
    /// instruction word per line, `_` separators and `//` comments allowed.
    pub fn from_mem_image(text: &str) -> anyhow::Result<Self> {
        let word = Regex::new(r"^[01][01_]*$")?;
        let mut obj = Object::default();
        for (lineno, line) in text.lines().enumerate() {
            let lineno = lineno + 1;
            let mut info = SourceInfo::new(line.trim());
            let content = line.split("//").next().unwrap_or_default().trim();
            if !content.is_empty() {
                if !word.is_match(content) {
                    anyhow::bail!("line {lineno}: expect a binary word, found `{content}`");
                }
                let digits: String = content.chars().filter(|c| *c != '_').collect();
                if digits.len() > INST_BITS as usize {
                    anyhow::bail!("line {lineno}: `{content}` is wider than {INST_BITS} bits");
                }
                let inst = Inst::from_str_radix(&digits, 2)
                    .with_context(|| format!("line {lineno}: invalid word `{content}`"))?;
                info.addr = Some(obj.push_inst(inst).with_context(|| format!("line {lineno}"))?);
                info.inst = Some(inst);
            }
            obj.source.push(info);
        }
        Ok(obj)
    }

    /// Render the program in `$readmemb` form.
    pub fn to_mem_image(&self) -> String {
        let mut out = String::new();
        for &inst in &self.program {
            out += &format!("{:011b} // {}\n", inst, decode(inst));
        }
        out
    }
}

impl Display for Object {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for info in &self.source {
            match (info.addr, info.inst, info.data) {
                (Some(addr), Some(inst), _) => {
                    writeln!(f, "{:#03x}: {} | {}", addr, format_inst(inst), info.src)?
                }
                (_, _, Some((addr, val))) => writeln!(
                    f,
                    "{:<19}| {}",
                    format!("M[{:#x}] = {:#x}", addr, val),
                    info.src
                )?,
                _ => writeln!(f, "{:19}| {}", "", info.src)?,
            }
        }
        Ok(())
    }
}
