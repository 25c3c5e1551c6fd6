//! This module contains utilities for verifying the correctness of the
//! processor against the instruction-level model.


use crate::{framework::CpuSim, Object, Processor};

pub struct SimTester {
    max_cycles: u64,
}

impl Default for SimTester {
    fn default() -> Self {
        Self { max_cycles: 1000 }
    }
}

impl SimTester {
    /// Assemble and run a program until it is exhausted.
    fn simulate(&self, src: &str) -> anyhow::Result<(Processor, Object)> {
        let obj = make_obj(src)?;
        let mut cpu = Processor::from_object(&obj)?;
        cpu.run(self.max_cycles)?;
        Ok((cpu, obj))
    }
}

fn make_obj(src: &str) -> anyhow::Result<Object> {
    let obj = crate::assemble(src, crate::AssembleOption::default().set_verbose(false))?;

    Ok(obj)
}

#[test]
fn test_alu_ops() -> anyhow::Result<()> {
    SimTester::default().test_alu_ops()
}

#[test]
fn test_dependent_ops() -> anyhow::Result<()> {
    SimTester::default().test_dependent_ops()
}

#[test]
fn test_reserved_op() -> anyhow::Result<()> {
    SimTester::default().test_reserved_op()
}

#[test]
fn test_sample_against_isa() -> anyhow::Result<()> {
    SimTester::default().test_isa(crate::asm::tests::SAMPLE)
}
