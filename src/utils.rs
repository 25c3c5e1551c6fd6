use ansi_term::Colour;

use crate::{framework::MEM_SIZE, isa::Word};

/// Parse numeric literal: decimal, `0x` hex or `0b` binary, with optional
/// `_` separators.
pub fn parse_literal(s: &str) -> Option<u64> {
    let s: String = s.chars().filter(|c| *c != '_').collect();
    if let Ok(r) = s.parse() {
        return Some(r);
    }
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        return u64::from_str_radix(hex, 16).ok();
    }
    if let Some(bin) = s.strip_prefix("0b").or_else(|| s.strip_prefix("0B")) {
        return u64::from_str_radix(bin, 2).ok();
    }
    None
}

pub fn mem_diff(left: &[Word; MEM_SIZE], right: &[Word; MEM_SIZE]) {
    for (addr, (l, r)) in left.iter().zip(right.iter()).enumerate() {
        if l != r {
            println!("{:#03x}: {:#x} -> {:#x}", addr, l, r);
        }
    }
}

pub fn mem_print(bin: &[Word; MEM_SIZE]) {
    println!("addr  val  bin");
    for (addr, val) in bin.iter().enumerate() {
        let line = format!("{:#03x}   {:#x}  {:04b}", addr, val, val);
        if *val != 0 {
            println!("{}", Colour::Green.bold().paint(line));
        } else {
            println!("{}", Colour::Fixed(8).paint(line));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::parse_literal;

    #[test]
    fn test_parse_literal() {
        assert_eq!(parse_literal("12"), Some(12));
        assert_eq!(parse_literal("0xf"), Some(15));
        assert_eq!(parse_literal("0XA"), Some(10));
        assert_eq!(parse_literal("0b000_0100_0101"), Some(0x45));
        assert_eq!(parse_literal("1_000"), Some(1000));
        assert_eq!(parse_literal("0x"), None);
        assert_eq!(parse_literal("ten"), None);
    }
}
