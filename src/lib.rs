//! A STARK proving/verifying system for a tape-and-pointer bytecode VM
//!. This crate is a library, not a CLI: the two entry
//! points a caller needs are [`stark::prove`] and [`stark::verify`].
//!
//! Layer map, bottom to top: [`field`]/[`polynomial`]/[`domain`] are the
//! algebra substrate; [`merkle`] and [`transcript`] are the cryptographic
//! plumbing (salted commitments and the Fiat–Shamir oracle); [`fri`] is the
//! low-degree test; [`vm`] compiles and runs the VM, emitting execution
//! tables; [`air`] turns those tables into constraint-quotient codewords;
//! [`stark`] wires all of it into one proof.

pub mod air;
pub mod domain;
pub mod error;
pub mod field;
pub mod fri;
pub mod merkle;
pub mod polynomial;
pub mod stark;
pub mod transcript;
pub mod vm;

pub use error::{MerkleError, ProverError, StarkError, TranscriptError, VerifierError, VmError};
pub use field::{BaseField, ExtensionFieldElement, BFE, XFE};
pub use stark::{prove, verify, Proof, StarkOptions, VerifiedIo};
pub use vm::Program;
