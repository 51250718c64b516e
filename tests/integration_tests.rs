//! Black-box end-to-end scenarios, exercised only through the public API:
//! `stark::prove`/`stark::verify` for the VM scenarios, `fri::` directly for
//! the two FRI-only scenarios.

use bfstark::domain::Domain;
use bfstark::field::{BaseField, BFE, XFE};
use bfstark::fri::{self, FriConfig, FriOptions};
use bfstark::polynomial::XPolynomial;
use bfstark::stark::{prove, verify, StarkOptions};
use bfstark::transcript::{sample_indices, ProofStream};
use lambdaworks_math::field::traits::IsFFTField;

/// A FRI instance small enough that even a one-row VM trace (E1's empty
/// program) still leaves FRI a couple of rounds to run.
fn small_options() -> StarkOptions {
    StarkOptions {
        fri: FriOptions {
            expansion_factor: 4,
            num_colinearity_tests: 2,
        },
        coset_offset: 3,
    }
}

#[test]
fn e1_empty_program_empty_input_round_trips() {
    let options = small_options();
    let proof = prove("", &[], &options).expect("empty program must produce a proof");
    let verified = verify(proof, &options).expect("trivial constant-quotient proof must verify");
    assert!(verified.input.is_empty());
    assert!(verified.output.is_empty());
}

#[test]
fn e2_two_plusses_then_dot_outputs_two() {
    let options = small_options();
    let proof = prove("++.", &[], &options).expect("++. must produce a proof");
    let verified = verify(proof, &options).expect("++. proof must verify");
    assert!(verified.input.is_empty());
    assert_eq!(verified.output, vec![2u8]);
}

#[test]
fn e3_comma_dot_echoes_single_input_byte() {
    let options = small_options();
    let proof = prove(",.", b"A", &options).expect(",. must produce a proof");
    let verified = verify(proof, &options).expect(",. proof must verify");
    assert_eq!(verified.input, b"A".to_vec());
    assert_eq!(verified.output, b"A".to_vec());
}

#[test]
fn e4_loop_moves_value_into_next_cell() {
    let options = small_options();
    // +[>+<-]: cell 0 starts at 1, the loop moves it into cell 1 one unit
    // at a time until cell 0 reads zero again.
    let proof = prove("+[>+<-]", &[], &options).expect("+[>+<-] must produce a proof");
    let verified = verify(proof, &options).expect("+[>+<-] proof must verify");
    assert!(verified.input.is_empty());
    assert!(verified.output.is_empty());
}

#[test]
fn e2_tampered_proof_is_rejected() {
    let options = small_options();
    let proof = prove("++.", &[], &options).unwrap();
    let mut items = proof.items;
    // Flip one byte inside the first pushed item (the claimed processor
    // height) so the proof's own public statement is internally altered.
    if let bfstark::transcript::ProofItem::Bytes(b) = &mut items[0] {
        b[b.len() - 1] ^= 0xFF;
    }
    let tampered = bfstark::stark::Proof { items };
    assert!(verify(tampered, &options).is_err());
}

fn domain_of_size(n: usize, offset: u64) -> Domain {
    let order = n.trailing_zeros() as u64;
    let generator = BaseField::get_primitive_root_of_unity(order).unwrap();
    Domain::new(BFE::from(offset), generator, n)
}

/// E5: commit to the evaluations of `p(X) = X^(N0/rho - 1)` over a
/// domain of size N0 with blowup rho; the verifier must accept. Then
/// corrupt one leaf of the initial codeword and confirm rejection.
#[test]
fn e5_fri_direct_completeness_and_tampered_leaf_rejection() {
    let n0 = 256;
    let rho = 4;
    let degree = n0 / rho - 1;

    let config = FriConfig {
        domain: domain_of_size(n0, 3),
        options: FriOptions {
            expansion_factor: rho,
            num_colinearity_tests: 4,
        },
    };

    let coeffs: Vec<XFE> = (0..=degree).map(|i| XFE::lift(&BFE::from(i as u64 + 1))).collect();
    let poly = XPolynomial::new(coeffs);
    let codeword = config.domain.xevaluate(&poly);

    let mut prover_transcript = ProofStream::new();
    let layers = fri::commit_phase(&config, codeword, &mut prover_transcript).unwrap();
    fri::query_phase(&config, &layers, &mut prover_transcript).unwrap();

    let mut verifier_transcript = ProofStream::from_items(prover_transcript.clone().into_items());
    let mut sink = Vec::new();
    assert!(fri::verify(&config, &mut verifier_transcript, &mut sink).is_ok());

    // Corrupt one revealed evaluation value from the initial codeword.
    let mut items = prover_transcript.into_items();
    for item in items.iter_mut() {
        if let bfstark::transcript::ProofItem::ExtField(v) = item {
            *v = *v + XFE::one();
            break;
        }
    }
    let mut tampered_transcript = ProofStream::from_items(items);
    let mut sink = Vec::new();
    let result = fri::verify(&config, &mut tampered_transcript, &mut sink);
    assert!(result.is_err(), "tampering a leaf must be caught at the Merkle or colinearity stage");
}

/// E6: with N0 = 256, rho = 4, t = 4, the reduced sampled indices (mod the
/// final codeword length) are pairwise distinct, across 1000 independent
/// seeds.
#[test]
fn e6_sampling_disjointness_across_many_seeds() {
    let n0 = 256usize;
    let rho = 4usize;
    let t = 4usize;

    let config = FriConfig {
        domain: domain_of_size(n0, 3),
        options: FriOptions {
            expansion_factor: rho,
            num_colinearity_tests: t,
        },
    };
    let num_rounds = config.num_rounds();
    let final_len = n0 >> num_rounds;

    for trial in 0..1000u64 {
        let seed = {
            use sha3::{Digest, Sha3_256};
            let mut hasher = Sha3_256::new();
            hasher.update(trial.to_be_bytes());
            let digest = hasher.finalize();
            let mut out = [0u8; 32];
            out.copy_from_slice(&digest);
            out
        };
        let indices = sample_indices(&seed, n0 / 2, final_len, t);
        assert_eq!(indices.len(), t);
        let mut reduced: Vec<usize> = indices.iter().map(|i| i % final_len).collect();
        reduced.sort_unstable();
        reduced.dedup();
        assert_eq!(reduced.len(), t, "seed {trial} produced colliding reduced indices");
    }
}
