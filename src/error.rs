//! Error types for every fallible boundary: VM
//! compilation, prover-side preconditions (bugs, not adversarial input), and
//! verifier-side hard rejections (always hard — no partial acceptance).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TranscriptError {
    #[error("transcript exhausted: verifier tried to pull past the end of the proof")]
    Exhausted,
    #[error("transcript item type mismatch: pulled a different variant than expected")]
    TypeMismatch,
}

#[derive(Debug, Error)]
pub enum VmError {
    #[error("unbalanced '[' at program position {0}: no matching ']'")]
    UnmatchedOpenBracket(usize),
    #[error("unbalanced ']' at program position {0}: no matching '['")]
    UnmatchedCloseBracket(usize),
    #[error("byte {0:#04x} at position {1} is not one of the eight VM opcodes")]
    InvalidOpcode(u8, usize),
    #[error("instruction pointer ran off the end of the program without halting")]
    ProgramOverrun,
    #[error("',' executed with no remaining input bytes")]
    InputExhausted,
}

#[derive(Debug, Error)]
pub enum MerkleError {
    #[error("a salted Merkle tree must be built over a non-empty power-of-two number of leaves, got {0}")]
    NotPowerOfTwo(usize),
    #[error("leaf index {index} out of range for a tree of {leaf_count} leaves")]
    IndexOutOfRange { index: usize, leaf_count: usize },
}

#[derive(Debug, Error)]
pub enum ProverError {
    #[error("domain generator does not have the required order: omega^(N-1) != omega^-1")]
    BadDomainOrder,
    #[error("codeword length {actual} does not match the declared domain length {expected}")]
    CodewordLengthMismatch { actual: usize, expected: usize },
    #[error("FRI configuration yields zero usable rounds (initial length {initial_length}, expansion factor {expansion_factor})")]
    NoFriRounds {
        initial_length: usize,
        expansion_factor: usize,
    },
    #[error("quotient {label} has degree {actual}, exceeding its bound {bound}")]
    QuotientDegreeExceeded {
        label: &'static str,
        actual: isize,
        bound: isize,
    },
    #[error("requested {requested} colinearity tests but the final codeword only has {available} positions")]
    TooManyQueries { requested: usize, available: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MerklePosition {
    A,
    B,
    C,
}

#[derive(Debug, Error)]
pub enum VerifierError {
    #[error("domain generator does not have the required order in round {round}")]
    BadDomainOrder { round: usize },
    #[error("Merkle opening failed at {position:?} in round {round}, slot {slot}")]
    MerkleVerificationFailed {
        round: usize,
        slot: usize,
        position: MerklePosition,
    },
    #[error("colinearity check failed in round {round}, slot {slot}")]
    ColinearityFailed { round: usize, slot: usize },
    #[error("final codeword has degree {observed}, exceeding the allowed bound {bound}")]
    FinalCodewordOverDegree { observed: isize, bound: isize },
    #[error("final codeword does not reproduce its own low-degree interpolant")]
    FinalCodewordNotConsistent,
    #[error("boundary constraint {index} failed on table {table}")]
    BoundaryConstraintFailed { table: &'static str, index: usize },
    #[error("transition constraint {index} failed on table {table}")]
    TransitionConstraintFailed { table: &'static str, index: usize },
    #[error("terminal constraint {index} failed on table {table}")]
    TerminalConstraintFailed { table: &'static str, index: usize },
    #[error("trace opening failed for the {tree} tree at domain index {index}")]
    TraceOpeningFailed { tree: &'static str, index: usize },
    #[error("the combined quotient recomputed from opened trace rows at index {index} does not match the value FRI itself opened there")]
    CombinedQuotientMismatch { index: usize },
    #[error("the claimed input/output evaluation terminal does not match the one recomputed from this proof's own public input/output bytes")]
    PublicIoMismatch,
    #[error(transparent)]
    Transcript(#[from] TranscriptError),
}

/// Top-level error for `stark::prove`: either the VM rejected the program/input, or a prover-side
/// precondition failed (a bug, not adversarial input).
#[derive(Debug, Error)]
pub enum StarkError {
    #[error(transparent)]
    Vm(#[from] VmError),
    #[error(transparent)]
    Prove(#[from] ProverError),
}
