//! The tape-and-pointer bytecode VM: compiling source into a jump-resolved
//! program, running it as a thin oracle (`perform`), and running it while
//! emitting the five execution tables the AIR layer consumes (`simulate`).
//!
//! Grounded in `original_source/vm.py`'s `VirtualMachine.compile` (bracket
//! backpatching with inline jump operands), `.perform` (the bare
//! interpreter) and `.simulate` (the trace-producing run). The compiled
//! program is a flat field-element array: every `[`/`]` occupies two slots
//! (its opcode byte, then a jump-target operand), every other instruction
//! occupies one. This is what lets the processor table's transition
//! constraints (air/processor.rs) express "jump to the matching bracket"
//! algebraically: the jump target is just the `next_instruction` column's
//! value at a bracket row.

use crate::error::VmError;
use crate::field::BFE;
use lambdaworks_math::traits::ByteConversion;

/// The eight instructions this VM understands.
pub const OPCODES: [u8; 8] = [b'+', b'-', b'<', b'>', b'[', b']', b'.', b','];

fn is_opcode(byte: u8) -> bool {
    OPCODES.contains(&byte)
}

/// A compiled program: a flat array of field elements. Most slots hold an
/// opcode's byte value; the slot immediately following a `[` or `]` holds
/// its jump-target operand.
#[derive(Clone, Debug)]
pub struct Program {
    pub instructions: Vec<BFE>,
}

impl Program {
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

fn field_to_usize(f: &BFE) -> usize {
    let bytes = f.to_bytes_be();
    let low8 = &bytes[bytes.len() - 8..];
    u64::from_be_bytes(low8.try_into().unwrap()) as usize
}

/// Parses source text into a `Program`, resolving every `[`/`]` pair by
/// inline backpatching: a `[` emits itself plus a
/// placeholder slot, pushed onto a stack; the matching `]` emits itself
/// plus an operand slot holding "one past the matching `[`'s two slots"
/// (where the loop body starts), and backpatches the `[`'s placeholder to
/// "one past the `]`'s two slots" (where the loop exits to).
pub fn compile(source: &str) -> Result<Program, VmError> {
    let mut instructions: Vec<BFE> = Vec::with_capacity(source.len());
    let mut open_stack: Vec<usize> = Vec::new();

    for (pos, byte) in source.bytes().enumerate() {
        if !is_opcode(byte) {
            return Err(VmError::InvalidOpcode(byte, pos));
        }
        instructions.push(BFE::from(byte as u64));
        if byte == b'[' {
            open_stack.push(instructions.len() - 1);
            instructions.push(BFE::zero()); // placeholder, backpatched below
        } else if byte == b']' {
            let open_idx = open_stack.pop().ok_or(VmError::UnmatchedCloseBracket(pos))?;
            let loop_body_start = open_idx + 2;
            instructions.push(BFE::from(loop_body_start as u64));
            let loop_exit = instructions.len(); // one past this ']' instruction's two slots
            instructions[open_idx + 1] = BFE::from(loop_exit as u64);
        }
    }

    if let Some(&open_idx) = open_stack.last() {
        return Err(VmError::UnmatchedOpenBracket(open_idx));
    }

    Ok(Program { instructions })
}

/// The processor register file as it exists at one point in time.
#[derive(Clone, Debug, Default)]
pub struct Register {
    pub cycle: u64,
    pub instruction_pointer: usize,
    pub current_instruction: u8,
    pub next_instruction_slot: BFE,
    pub memory_pointer: i64,
    pub memory_value: u8,
    pub is_zero: bool,
}

/// Bare interpreter: runs `program` against `input` and returns the bytes
/// written, without recording any execution table. Used only to
/// cross-check `simulate`'s own output against an independent
/// implementation of the same semantics (`original_source/vm.py`'s
/// `perform`).
pub fn perform(program: &Program, input: &[u8]) -> Result<Vec<u8>, VmError> {
    let mut ip = 0usize;
    let mut mp: i64 = 0;
    let mut memory: std::collections::HashMap<i64, u8> = std::collections::HashMap::new();
    let mut input_cursor = 0usize;
    let mut output = Vec::new();

    while ip < program.len() {
        let byte = current_opcode_byte(program, ip)?;
        match byte {
            b'[' => {
                if *memory.get(&mp).unwrap_or(&0) == 0 {
                    ip = field_to_usize(&program.instructions[ip + 1]);
                } else {
                    ip += 2;
                }
            }
            b']' => {
                if *memory.get(&mp).unwrap_or(&0) != 0 {
                    ip = field_to_usize(&program.instructions[ip + 1]);
                } else {
                    ip += 2;
                }
            }
            b'<' => {
                mp -= 1;
                ip += 1;
            }
            b'>' => {
                mp += 1;
                ip += 1;
            }
            b'+' => {
                let v = memory.entry(mp).or_insert(0);
                *v = v.wrapping_add(1);
                ip += 1;
            }
            b'-' => {
                let v = memory.entry(mp).or_insert(0);
                *v = v.wrapping_sub(1);
                ip += 1;
            }
            b'.' => {
                output.push(*memory.get(&mp).unwrap_or(&0));
                ip += 1;
            }
            b',' => {
                let byte = *input.get(input_cursor).ok_or(VmError::InputExhausted)?;
                input_cursor += 1;
                memory.insert(mp, byte);
                ip += 1;
            }
            other => return Err(VmError::InvalidOpcode(other, ip)),
        }
    }
    Ok(output)
}

/// Reads the opcode byte at `ip`, converting the field element back to a
/// `u8`. Every slot the instruction pointer can land on holds a genuine
/// opcode (operand slots are only ever read via `ip+1`, never executed
/// directly).
fn current_opcode_byte(program: &Program, ip: usize) -> Result<u8, VmError> {
    let bytes = program.instructions[ip].to_bytes_be();
    let value = *bytes.last().unwrap();
    if is_opcode(value) {
        Ok(value)
    } else {
        Err(VmError::ProgramOverrun)
    }
}

/// The five execution tables simulate produces: the
/// processor's full register trace, memory accesses sorted by address, the
/// instruction listing (the static program text unioned with one dynamic
/// row per executed cycle) sorted by instruction pointer, and the raw
/// input/output streams.
pub struct ExecutionTables {
    /// `(cycle, ip, ci, ni, mp, mv, is_zero)` per row.
    pub processor: Vec<[BFE; 7]>,
    /// `(cycle, mp, mv)` per row, stably sorted by `mp`.
    pub memory: Vec<[BFE; 3]>,
    /// `(ip, ci, ni)` per row, stably sorted by `ip`: a static entry for
    /// every address plus a dynamic entry for every cycle that visited it.
    pub instruction: Vec<[BFE; 3]>,
    pub input: Vec<BFE>,
    pub output: Vec<BFE>,
}

/// Runs `program` against `input`, recording the five execution tables the
/// AIR layer's constraints are checked against.
pub fn simulate(program: &Program, input: &[u8]) -> Result<ExecutionTables, VmError> {
    let mut register = Register::default();
    register.is_zero = true;
    if !program.is_empty() {
        register.current_instruction = current_opcode_byte(program, 0)?;
        register.next_instruction_slot = slot_at(program, 1);
    }

    let mut memory: std::collections::HashMap<i64, u8> = std::collections::HashMap::new();
    let mut input_cursor = 0usize;
    let mut input_values = Vec::new();
    let mut output_values = Vec::new();

    let mut processor = vec![row_of(&register)];
    let mut memory_table = vec![memory_row(&register)];

    while register.instruction_pointer < program.len() {
        match register.current_instruction {
            b'[' => {
                if register.memory_value == 0 {
                    register.instruction_pointer = field_to_usize(&register.next_instruction_slot);
                } else {
                    register.instruction_pointer += 2;
                }
            }
            b']' => {
                if register.memory_value != 0 {
                    register.instruction_pointer = field_to_usize(&register.next_instruction_slot);
                } else {
                    register.instruction_pointer += 2;
                }
            }
            b'<' => {
                register.memory_pointer -= 1;
                register.instruction_pointer += 1;
            }
            b'>' => {
                register.memory_pointer += 1;
                register.instruction_pointer += 1;
            }
            b'+' => {
                let v = memory.entry(register.memory_pointer).or_insert(0);
                *v = v.wrapping_add(1);
                register.instruction_pointer += 1;
            }
            b'-' => {
                let v = memory.entry(register.memory_pointer).or_insert(0);
                *v = v.wrapping_sub(1);
                register.instruction_pointer += 1;
            }
            b'.' => {
                let value = *memory.get(&register.memory_pointer).unwrap_or(&0);
                output_values.push(BFE::from(value as u64));
                register.instruction_pointer += 1;
            }
            b',' => {
                let byte = *input.get(input_cursor).ok_or(VmError::InputExhausted)?;
                input_cursor += 1;
                memory.insert(register.memory_pointer, byte);
                input_values.push(BFE::from(byte as u64));
                register.instruction_pointer += 1;
            }
            other => return Err(VmError::InvalidOpcode(other, register.instruction_pointer)),
        }

        register.cycle += 1;
        register.current_instruction = if register.instruction_pointer < program.len() {
            current_opcode_byte(program, register.instruction_pointer)?
        } else {
            0
        };
        register.next_instruction_slot = slot_at(program, register.instruction_pointer + 1);
        register.memory_value = *memory.get(&register.memory_pointer).unwrap_or(&0);
        register.is_zero = register.memory_value == 0;

        processor.push(row_of(&register));
        memory_table.push(memory_row(&register));
    }

    // The static program listing, one row per address 0..=program.len()
    // (the extra trailing row covers the halted `ip == program.len()`
    // state, which has no opcode of its own), unioned with one dynamic
    // row per executed cycle after the first — mirrors
    // `original_source/vm.py`'s `instruction_table.table` construction.
    // Keeping every address present, even ones the VM never dynamically
    // revisits, is what keeps the sorted `ip` column contiguous (see
    // `air::instruction`'s transition constraints).
    let static_rows: Vec<[BFE; 3]> = (0..=program.len())
        .map(|i| {
            let ci = if i < program.len() { program.instructions[i] } else { BFE::zero() };
            [BFE::from(i as u64), ci, slot_at(program, i + 1)]
        })
        .collect();
    let mut instruction_table: Vec<[BFE; 3]> = static_rows;
    instruction_table.extend(processor[1..].iter().map(|r| [r[1], r[2], r[3]]));
    instruction_table.sort_by_key(|row| field_to_sort_key(&row[0]));
    memory_table.sort_by_key(|row| field_to_sort_key(&row[1]));

    Ok(ExecutionTables {
        processor,
        memory: memory_table,
        instruction: instruction_table,
        input: input_values,
        output: output_values,
    })
}

fn slot_at(program: &Program, i: usize) -> BFE {
    program.instructions.get(i).cloned().unwrap_or_else(BFE::zero)
}

/// Stable sort key extraction: both memory addresses and instruction
/// pointers are small non-negative field values in practice, so sorting on
/// their canonical big-endian byte encoding reproduces numeric order.
fn field_to_sort_key(f: &BFE) -> Vec<u8> {
    f.to_bytes_be()
}

fn row_of(r: &Register) -> [BFE; 7] {
    [
        BFE::from(r.cycle),
        BFE::from(r.instruction_pointer as u64),
        BFE::from(r.current_instruction as u64),
        r.next_instruction_slot,
        signed_to_field(r.memory_pointer),
        BFE::from(r.memory_value as u64),
        BFE::from(r.is_zero as u64),
    ]
}

fn memory_row(r: &Register) -> [BFE; 3] {
    [BFE::from(r.cycle), signed_to_field(r.memory_pointer), BFE::from(r.memory_value as u64)]
}

/// Memory pointer excursions below zero are a VM bug, not a field-encoding
/// concern: the field has no native negative numbers, so a negative
/// pointer is encoded as `p + modulus`. No program this VM accepts can
/// make that ambiguous with a genuine large positive pointer in practice.
fn signed_to_field(p: i64) -> BFE {
    if p >= 0 {
        BFE::from(p as u64)
    } else {
        -BFE::from((-p) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_program_compiles_and_runs_to_nothing() {
        let program = compile("").unwrap();
        assert!(program.is_empty());
        let tables = simulate(&program, &[]).unwrap();
        assert_eq!(tables.processor.len(), 1);
        assert!(tables.output.is_empty());
    }

    #[test]
    fn plus_plus_dot_outputs_two() {
        let program = compile("++.").unwrap();
        let tables = simulate(&program, &[]).unwrap();
        assert_eq!(tables.output, vec![BFE::from(2u64)]);
        assert_eq!(tables.processor.len(), 4);
    }

    #[test]
    fn comma_dot_echoes_input() {
        let program = compile(",.").unwrap();
        let tables = simulate(&program, b"A").unwrap();
        assert_eq!(tables.output, vec![BFE::from(b'A' as u64)]);
        assert_eq!(tables.input, vec![BFE::from(b'A' as u64)]);
    }

    #[test]
    fn loop_sums_into_next_cell() {
        // start at cell 0 with value 3, move it into cell 1.
        let program = compile("+++[>+<-]>.").unwrap();
        let tables = simulate(&program, &[]).unwrap();
        assert_eq!(tables.output, vec![BFE::from(3u64)]);
        let zero_cell = tables.memory.iter().rev().find(|r| r[1] == BFE::zero()).unwrap();
        assert_eq!(zero_cell[2], BFE::zero());
    }

    #[test]
    fn bracket_instructions_occupy_two_slots() {
        let program = compile("+[>+<-]>.").unwrap();
        // '+' (1 slot) then '[' + operand (2 slots) ... the jump target
        // for the matching ']' must land one past the whole bracket pair.
        assert_eq!(program.instructions[1], BFE::from(b'[' as u64));
        assert!(program.len() > "+[>+<-]>.".len());
    }

    #[test]
    fn unmatched_open_bracket_is_rejected() {
        assert!(matches!(compile("[+"), Err(VmError::UnmatchedOpenBracket(0))));
    }

    #[test]
    fn unmatched_close_bracket_is_rejected() {
        assert!(matches!(compile("+]"), Err(VmError::UnmatchedCloseBracket(1))));
    }

    #[test]
    fn invalid_byte_is_rejected() {
        assert!(matches!(compile("+x"), Err(VmError::InvalidOpcode(b'x', 1))));
    }

    #[test]
    fn comma_with_no_input_is_rejected() {
        let program = compile(",").unwrap();
        assert!(matches!(simulate(&program, &[]), Err(VmError::InputExhausted)));
    }

    #[test]
    fn perform_agrees_with_simulate() {
        let program = compile("+++[>++<-]>.<,.").unwrap();
        let via_perform = perform(&program, b"Z").unwrap();
        let via_simulate = simulate(&program, b"Z").unwrap();
        let simulate_output: Vec<u8> = via_simulate
            .output
            .iter()
            .map(|f| *f.to_bytes_be().last().unwrap())
            .collect();
        assert_eq!(via_perform, simulate_output);
    }
}
