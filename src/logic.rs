//! Combinational logic of the datapath, built bottom-up from a single custom
//! XOR gate: full adder, 4-bit ripple-carry adder, and the ALU.
//!
//! Data bits never go through the native `^` or `+` operators here. Every
//! exclusive-or is an instance of [`xor_1b`] and every sum an instance of
//! [`full_adder`].

use crate::isa::{alu_fn::*, Word, WORD_MASK};

/// Bit `i` of a word.
#[inline]
pub fn bit(w: Word, i: u32) -> bool {
    (w >> i) & 1 == 1
}

fn pack(b0: bool, b1: bool, b2: bool, b3: bool) -> Word {
    (b0 as Word) | (b1 as Word) << 1 | (b2 as Word) << 2 | (b3 as Word) << 3
}

/// C = (A & ~B) | (~A & B)
pub fn xor_1b(a: bool, b: bool) -> bool {
    (a && !b) || (!a && b)
}

/// 1-bit full adder. Returns `(sum, carry_out)`.
pub fn full_adder(a: bool, b: bool, cin: bool) -> (bool, bool) {
    let ab = xor_1b(a, b);
    let s = xor_1b(ab, cin);
    let cout = (a && b) || (cin && ab);
    (s, cout)
}

/// 4-bit ripple-carry adder, least significant bit first. Overflow goes to
/// the returned carry.
pub fn adder_4b(a: Word, b: Word, cin: bool) -> (Word, bool) {
    let (s0, c1) = full_adder(bit(a, 0), bit(b, 0), cin);
    let (s1, c2) = full_adder(bit(a, 1), bit(b, 1), c1);
    let (s2, c3) = full_adder(bit(a, 2), bit(b, 2), c2);
    let (s3, cout) = full_adder(bit(a, 3), bit(b, 3), c3);
    (pack(s0, s1, s2, s3), cout)
}

/// Bitwise XOR of two words by four parallel gates.
pub fn xor_4b(a: Word, b: Word) -> Word {
    pack(
        xor_1b(bit(a, 0), bit(b, 0)),
        xor_1b(bit(a, 1), bit(b, 1)),
        xor_1b(bit(a, 2), bit(b, 2)),
        xor_1b(bit(a, 3), bit(b, 3)),
    )
}

/// The 4-bit ALU. Returns `(f, carry_out)`.
///
/// | s | f |
/// |---|---|
/// | 0 | a |
/// | 1 | a + b + cin |
/// | 2 | a - b |
/// | 3 | a & b |
/// | 4 | a \| b |
/// | 5 | a xor b |
/// | 6 | !a |
/// | 7 | 0 |
///
/// Only the adder operations produce a carry. Subtraction is computed as
/// `a + !b + 1`, so the carry-in supplied by the caller is ignored for it and
/// the carry out is 1 when no borrow occurs.
pub fn alu_4b(a: Word, b: Word, s: u8, cin: bool) -> (Word, bool) {
    let a = a & WORD_MASK;
    let b = b & WORD_MASK;
    match s & 0b111 {
        PASS => (a, false),
        ADD => adder_4b(a, b, cin),
        SUB => adder_4b(a, !b & WORD_MASK, true),
        AND => (a & b, false),
        OR => (a | b, false),
        XOR => (xor_4b(a, b), false),
        NOT => (!a & WORD_MASK, false),
        _ => (0, false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xor_1b() {
        assert!(!xor_1b(false, false));
        assert!(xor_1b(false, true));
        assert!(xor_1b(true, false));
        assert!(!xor_1b(true, true));
    }

    #[test]
    fn test_full_adder() {
        for n in 0u8..8 {
            let (a, b, cin) = (n & 1 != 0, n & 2 != 0, n & 4 != 0);
            let total = a as u8 + b as u8 + cin as u8;
            assert_eq!(full_adder(a, b, cin), (total & 1 == 1, total >= 2), "{a} {b} {cin}");
        }
        assert_eq!(full_adder(true, true, true), (true, true));
    }

    #[test]
    fn test_adder_4b() {
        assert_eq!(adder_4b(5, 3, false), (8, false));
        assert_eq!(adder_4b(15, 1, false), (0, true));
        assert_eq!(adder_4b(15, 15, false), (14, true));
        assert_eq!(adder_4b(9, 6, true), (0, true));
        for a in 0..16u8 {
            for b in 0..16u8 {
                for cin in [false, true] {
                    let total = a + b + cin as u8;
                    assert_eq!(adder_4b(a, b, cin), (total % 16, total >= 16));
                }
            }
        }
    }

    #[test]
    fn test_alu_table() {
        let (a, b) = (0b1010, 0b0110);
        assert_eq!(alu_4b(a, b, PASS, false), (10, false));
        assert_eq!(alu_4b(a, b, ADD, false), (0, true));
        assert_eq!(alu_4b(a, b, SUB, false).0, 4);
        assert_eq!(alu_4b(a, b, AND, false), (2, false));
        assert_eq!(alu_4b(a, b, OR, false), (14, false));
        assert_eq!(alu_4b(a, b, XOR, false), (12, false));
        assert_eq!(alu_4b(a, b, NOT, false), (5, false));
        assert_eq!(alu_4b(a, b, ZERO, true), (0, false));
    }

    #[test]
    fn test_alu_sub_borrow() {
        assert_eq!(alu_4b(7, 3, SUB, false), (4, true));
        // the carry-in is forced, the caller's value does not matter
        assert_eq!(alu_4b(7, 3, SUB, true), (4, true));
        // 3 - 7 borrows
        assert_eq!(alu_4b(3, 7, SUB, false), (12, false));
        for a in 0..16u8 {
            for b in 0..16u8 {
                assert_eq!(alu_4b(a, b, SUB, false).0, a.wrapping_sub(b) & WORD_MASK);
                assert_eq!(alu_4b(a, b, XOR, false).0, a ^ b);
            }
        }
    }

    /// Return the source of `pub fn name` in this file, up to its closing brace.
    fn body_of<'a>(src: &'a str, name: &str) -> &'a str {
        let start = src
            .find(&format!("pub fn {name}("))
            .unwrap_or_else(|| panic!("{name} not found"));
        let len = src[start..].find("\n}\n").expect("unterminated function");
        &src[start..start + len]
    }

    #[test]
    fn test_structural_reuse() {
        let src = include_str!("logic.rs");

        let xor = body_of(src, "xor_1b");
        assert!(!xor.contains('^'), "xor_1b must be built from and/or/not");

        let fa = body_of(src, "full_adder");
        assert_eq!(fa.matches("xor_1b(").count(), 2);
        assert!(!fa.contains('^'));

        let adder = body_of(src, "adder_4b");
        assert_eq!(adder.matches("full_adder(").count(), 4);
        assert!(!adder.contains(" + "));

        let alu = body_of(src, "alu_4b");
        assert!(alu.contains("adder_4b("));
        let xor4 = body_of(src, "xor_4b");
        assert_eq!(xor4.matches("xor_1b(").count(), 4);
    }
}
