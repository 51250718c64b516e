//! Fiat–Shamir transcript: an append-only oracle the prover pushes items
//! onto and the verifier pulls the same items back off of, in lockstep.
//!
//! The transcript's wire layout is treated as an external, abstract oracle —
//! only the interface (`push`/`pull`/`*_challenge_seed`) matters downstream.
//! This module gives it a concrete, minimal shape grounded in this
//! codebase's own `Transcript::append`/`challenge()` pair (same `sha3`
//! hash), generalized to the push/pull queue semantics `original_source/fri.py`'s
//! `proof_stream` exposes.

use crate::error::TranscriptError;
use crate::field::{bfe_to_bytes, xfe_to_bytes, BFE, XFE};
use sha3::{Digest, Sha3_256};

/// One item exchanged over the transcript. Matches §6's
/// `bytes | field_elt | codeword | merkle_opening` union, plus the extension
/// field and Merkle-root cases this crate actually pushes.
#[derive(Clone, Debug, PartialEq)]
pub enum ProofItem {
    Bytes(Vec<u8>),
    BaseField(BFE),
    ExtField(XFE),
    BaseCodeword(Vec<BFE>),
    ExtCodeword(Vec<XFE>),
    MerkleRoot([u8; 32]),
    MerkleOpening { salt: [u8; 32], path: Vec<[u8; 32]> },
    /// One opened row of the base trace:
    /// all base-field columns of all five tables at one LDE domain index,
    /// in the fixed table order processor/instruction/memory/input/output.
    BaseRow(Vec<BFE>),
    /// One opened row of the extension trace, same index/table ordering.
    ExtRow(Vec<XFE>),
}

impl ProofItem {
    fn to_bytes(&self) -> Vec<u8> {
        match self {
            ProofItem::Bytes(b) => b.clone(),
            ProofItem::BaseField(f) => bfe_to_bytes(f),
            ProofItem::ExtField(x) => xfe_to_bytes(x),
            ProofItem::BaseCodeword(c) => c.iter().flat_map(bfe_to_bytes).collect(),
            ProofItem::ExtCodeword(c) => c.iter().flat_map(xfe_to_bytes).collect(),
            ProofItem::MerkleRoot(r) => r.to_vec(),
            ProofItem::MerkleOpening { salt, path } => {
                let mut out = salt.to_vec();
                for node in path {
                    out.extend_from_slice(node);
                }
                out
            }
            ProofItem::BaseRow(row) => row.iter().flat_map(bfe_to_bytes).collect(),
            ProofItem::ExtRow(row) => row.iter().flat_map(xfe_to_bytes).collect(),
        }
    }
}

/// The append-only oracle. The prover instantiates one empty and pushes as
/// it builds the proof; the verifier instantiates one `from_items` (the
/// persisted stream it received) and pulls in the same order.
#[derive(Clone, Debug, Default)]
pub struct ProofStream {
    items: Vec<ProofItem>,
    read_cursor: usize,
    pushed_bytes: Vec<u8>,
    pulled_bytes: Vec<u8>,
}

impl ProofStream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reconstructs a transcript from a previously persisted item sequence
    ///, ready for the verifier to pull.
    pub fn from_items(items: Vec<ProofItem>) -> Self {
        Self {
            items,
            read_cursor: 0,
            pushed_bytes: Vec::new(),
            pulled_bytes: Vec::new(),
        }
    }

    pub fn push(&mut self, item: ProofItem) {
        self.pushed_bytes.extend(item.to_bytes());
        self.items.push(item);
    }

    pub fn pull(&mut self) -> Result<ProofItem, TranscriptError> {
        let item = self
            .items
            .get(self.read_cursor)
            .cloned()
            .ok_or(TranscriptError::Exhausted)?;
        self.read_cursor += 1;
        self.pulled_bytes.extend(item.to_bytes());
        Ok(item)
    }

    pub fn pull_bytes(&mut self) -> Result<Vec<u8>, TranscriptError> {
        match self.pull()? {
            ProofItem::Bytes(b) => Ok(b),
            _ => Err(TranscriptError::TypeMismatch),
        }
    }

    pub fn pull_base_field(&mut self) -> Result<BFE, TranscriptError> {
        match self.pull()? {
            ProofItem::BaseField(f) => Ok(f),
            _ => Err(TranscriptError::TypeMismatch),
        }
    }

    pub fn pull_ext_field(&mut self) -> Result<XFE, TranscriptError> {
        match self.pull()? {
            ProofItem::ExtField(f) => Ok(f),
            _ => Err(TranscriptError::TypeMismatch),
        }
    }

    pub fn pull_base_codeword(&mut self) -> Result<Vec<BFE>, TranscriptError> {
        match self.pull()? {
            ProofItem::BaseCodeword(c) => Ok(c),
            _ => Err(TranscriptError::TypeMismatch),
        }
    }

    pub fn pull_merkle_root(&mut self) -> Result<[u8; 32], TranscriptError> {
        match self.pull()? {
            ProofItem::MerkleRoot(r) => Ok(r),
            _ => Err(TranscriptError::TypeMismatch),
        }
    }

    pub fn pull_merkle_opening(&mut self) -> Result<([u8; 32], Vec<[u8; 32]>), TranscriptError> {
        match self.pull()? {
            ProofItem::MerkleOpening { salt, path } => Ok((salt, path)),
            _ => Err(TranscriptError::TypeMismatch),
        }
    }

    pub fn pull_base_row(&mut self) -> Result<Vec<BFE>, TranscriptError> {
        match self.pull()? {
            ProofItem::BaseRow(r) => Ok(r),
            _ => Err(TranscriptError::TypeMismatch),
        }
    }

    pub fn pull_ext_row(&mut self) -> Result<Vec<XFE>, TranscriptError> {
        match self.pull()? {
            ProofItem::ExtRow(r) => Ok(r),
            _ => Err(TranscriptError::TypeMismatch),
        }
    }

    /// Hash of everything pushed so far. Called by the prover to derive its
    /// next challenge — folding the transcript collapses the interactive
    /// protocol.
    pub fn prover_challenge_seed(&self) -> [u8; 32] {
        hash(&self.pushed_bytes)
    }

    /// Hash of everything pulled so far. Identical to
    /// `prover_challenge_seed` at any matching point in the protocol,
    /// provided both sides touch the transcript in the same canonical
    /// order.
    pub fn verifier_challenge_seed(&self) -> [u8; 32] {
        hash(&self.pulled_bytes)
    }

    /// The persisted proof: every item this transcript has seen pushed, in
    /// push order. This *is* the proof.
    pub fn into_items(self) -> Vec<ProofItem> {
        self.items
    }

    pub fn items(&self) -> &[ProofItem] {
        &self.items
    }
}

fn hash(bytes: &[u8]) -> [u8; 32] {
    let mut hasher = Sha3_256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out
}

/// Draws a base-field challenge from a 32-byte seed, taking the first 8
/// bytes as a big-endian `u64` (mirrors `transcript_to_field` elsewhere in
/// this codebase).
pub fn seed_to_base_field(seed: &[u8; 32]) -> BFE {
    let value = u64::from_be_bytes(seed[..8].try_into().unwrap());
    BFE::from(value)
}

pub fn seed_to_ext_field(seed: &[u8; 32]) -> XFE {
    XFE::sample(seed)
}

/// Rejection-sampled index derivation: hash `(seed || counter)` with a long-output hash,
/// reduce to `[0, size)`, and reject collisions on the corresponding
/// reduced index modulo `reduced_size` so each query attests to a distinct
/// final-codeword position.
pub fn sample_indices(seed: &[u8; 32], size: usize, reduced_size: usize, number: usize) -> Vec<usize> {
    assert!(
        number <= reduced_size,
        "cannot sample more indices than available in the final codeword"
    );
    let mut indices = Vec::with_capacity(number);
    let mut reduced_seen = std::collections::HashSet::new();
    let mut counter: u64 = 0;
    while indices.len() < number {
        let mut hasher = Sha3_256::new();
        hasher.update(seed);
        hasher.update(counter.to_be_bytes());
        let digest = hasher.finalize();
        let big = u64::from_be_bytes(digest[..8].try_into().unwrap());
        let index = (big as usize) % size;
        let reduced = index % reduced_size;
        counter += 1;
        if reduced_seen.insert(reduced) {
            indices.push(index);
        }
    }
    indices
}
