//! Waveform history of a simulation, one record per clock cycle.

use serde::Serialize;

use crate::{
    architectures::control::FsmState,
    isa::{Addr, Inst, Word},
};

/// A memory access performed on a clock edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RamAccess {
    pub addr: Addr,
    pub write: bool,
    /// The value written, or the value read.
    pub data: Word,
}

/// Signals visible during one cycle, and the memory access completed at its
/// end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleRecord {
    /// 1-based cycle number.
    pub cycle: u64,
    pub state: FsmState,
    pub pc: Addr,
    pub inst: Inst,
    /// Registered ALU output.
    pub alu_out: Word,
    pub alu_cout: bool,
    pub ram: Option<RamAccess>,
}

#[derive(Debug, Default, Clone)]
pub struct Recorder {
    pub(crate) records: Vec<CycleRecord>,
}

impl Recorder {
    pub fn push(&mut self, record: CycleRecord) {
        self.records.push(record)
    }
    pub fn records(&self) -> &[CycleRecord] {
        &self.records
    }
    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(&self.records)?)
    }
}

impl std::fmt::Display for Recorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        const HEADS: [&str; 6] = ["cycle", "state", "pc", "ir", "alu", "mem"];
        let mut rows: [String; 6] = Default::default();
        for r in &self.records {
            let alu = format!("{:x}{}", r.alu_out, if r.alu_cout { "c" } else { "" });
            let mem = match r.ram {
                Some(a) => format!(
                    "{}{:x}={:x}",
                    if a.write { 'w' } else { 'r' },
                    a.addr,
                    a.data
                ),
                None => "-".to_string(),
            };
            rows[0] += &format!("{:>6}", r.cycle);
            rows[1] += &format!("{:>6}", &r.state.name()[..4]);
            rows[2] += &format!("{:>6x}", r.pc);
            rows[3] += &format!("{:>6}", format!("{:03x}", r.inst));
            rows[4] += &format!("{:>6}", alu);
            rows[5] += &format!("{:>6}", mem);
        }
        for (head, row) in HEADS.iter().zip(rows.iter()) {
            writeln!(f, "{head:<6}|{row}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Recorder {
        let mut rec = Recorder::default();
        rec.push(CycleRecord {
            cycle: 1,
            state: FsmState::Init,
            pc: 0,
            inst: 0,
            alu_out: 0,
            alu_cout: false,
            ram: None,
        });
        rec.push(CycleRecord {
            cycle: 2,
            state: FsmState::Store,
            pc: 1,
            inst: 0x146,
            alu_out: 0xb,
            alu_cout: true,
            ram: Some(RamAccess {
                addr: 4,
                write: true,
                data: 0xb,
            }),
        });
        rec
    }

    #[test]
    fn test_waveform_table() {
        let table = sample().to_string();
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 6);
        assert!(lines[1].contains("INIT") && lines[1].contains("STOR"));
        assert!(lines[4].ends_with("bc"));
        assert!(lines[5].ends_with("w4=b"));
    }

    #[test]
    fn test_json() -> anyhow::Result<()> {
        let json = sample().to_json()?;
        let value: serde_json::Value = serde_json::from_str(&json)?;
        assert_eq!(value[1]["state"], "Store");
        assert_eq!(value[1]["ram"]["addr"], 4);
        assert!(value[0]["ram"].is_null());
        Ok(())
    }
}
