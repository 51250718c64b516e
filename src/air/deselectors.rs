//! Opcode deselector polynomials: a Lagrange-basis polynomial in the
//! current-instruction column that evaluates to `1` at one symbol and `0`
//! at every other, letting a single transition-constraint vector select
//! "the constraint that applies when the current instruction is `X`"
//! without a per-opcode selector bit column.
//!
//! There is no equivalent structure in `original_source/` — the Python
//! reference represents per-opcode constraints directly as case-split
//! symbolic polynomials. The Lagrange-style deselector below is the
//! standard way an AIR with a small fixed instruction alphabet encodes
//! "exactly one of these N branches is active" without per-opcode selector
//! columns.
//!
//! The alphabet includes a ninth, non-executable symbol `0` alongside the
//! eight real opcodes: `VirtualMachine::simulate` (vm.rs) pads the
//! processor table up to the next power of two by repeating a halted
//! state with `current_instruction = 0`, and the padding rows must satisfy
//! the same transition constraints as real ones — so `0` gets its own
//! "freeze everything" branch in the deselector alphabet rather than being
//! excluded from the transition zerofier's reach.

use crate::field::{BFE, XFE};

/// The eight instructions this VM's bytecode is built from.
pub const OPCODES: [u8; 8] = [b'+', b'-', b'<', b'>', b'[', b']', b'.', b','];

/// The sentinel `current_instruction` value used to pad the processor
/// table past the end of real execution.
pub const PAD_SYMBOL: u8 = 0;

/// The full deselector alphabet: the pad symbol plus the eight opcodes.
/// Order doesn't matter for correctness, only that it's used consistently.
pub const ALL_SYMBOLS: [u8; 9] = [PAD_SYMBOL, b'+', b'-', b'<', b'>', b'[', b']', b'.', b','];

/// Degree of `deselector(_, _)` as a polynomial in `ci`: one linear factor
/// per symbol other than the target, over a 9-symbol alphabet.
pub const DESELECTOR_DEGREE: usize = ALL_SYMBOLS.len() - 1;

/// `prod_{s != target} (ci - s) / (target - s)`: `1` when `ci == target`,
/// `0` when `ci` equals any other symbol in `ALL_SYMBOLS`.
pub fn deselector(ci: XFE, target_symbol: u8) -> XFE {
    let target = XFE::lift(&BFE::from(target_symbol as u64));
    let mut numerator = XFE::one();
    let mut denominator = XFE::one();
    for &symbol in ALL_SYMBOLS.iter() {
        if symbol == target_symbol {
            continue;
        }
        let symbol_val = XFE::lift(&BFE::from(symbol as u64));
        numerator = numerator * (ci - symbol_val);
        denominator = denominator * (target - symbol_val);
    }
    numerator * denominator.inv()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deselector_is_one_at_its_own_symbol_and_zero_elsewhere() {
        for &target in ALL_SYMBOLS.iter() {
            for &ci in ALL_SYMBOLS.iter() {
                let value = deselector(XFE::lift(&BFE::from(ci as u64)), target);
                if ci == target {
                    assert_eq!(value, XFE::one());
                } else {
                    assert_eq!(value, XFE::zero());
                }
            }
        }
    }
}
