//! The memory table: the processor's `(cycle, mp, mv)` triples re-sorted
//! by address, with a permutation-argument column tying it back to the
//! processor table's own `mpa` accumulator. `vm::simulate` emits exactly one memory row per processor row
//! (see `vm.rs`), so this table's real height always equals the
//! processor table's.

use crate::air::challenges::VmChallenges;
use crate::air::{BoundaryConstraint, Table, TerminalConstraint, TransitionConstraint};
use crate::field::XFE;

pub const WIDTH: usize = 4;
pub const CYCLE: usize = 0;
pub const MP: usize = 1;
pub const MV: usize = 2;
pub const MPA: usize = 3;

pub struct MemoryTable {
    pub padded_rows: Vec<[XFE; WIDTH]>,
    pub real_height: usize,
    pub challenges: VmChallenges,
    pub memory_permutation_terminal: XFE,
}

impl MemoryTable {
    pub fn build(base_rows: &[[XFE; 3]], target_height: usize, challenges: VmChallenges) -> Self {
        let real_height = base_rows.len();
        let mut padded: Vec<[XFE; WIDTH]> = Vec::with_capacity(target_height.max(1));
        let last = base_rows.last().copied().unwrap_or([XFE::zero(); 3]);

        for i in 0..target_height.max(1) {
            let row = base_rows.get(i).copied().unwrap_or(last);
            padded.push([row[0], row[1], row[2], XFE::zero()]);
        }

        let weight = |row: &[XFE; WIDTH]| challenges.d * row[CYCLE] + challenges.e * row[MP] + challenges.f * row[MV];
        padded[0][MPA] = challenges.beta - weight(&padded[0]);
        for i in 0..padded.len().saturating_sub(1) {
            let next_weight = weight(&padded[i + 1]);
            padded[i + 1][MPA] = padded[i][MPA] * (challenges.beta - next_weight);
        }

        let anchor = if real_height == 0 { 0 } else { real_height - 1 };
        let memory_permutation_terminal = padded[anchor][MPA];

        Self {
            padded_rows: padded,
            real_height,
            challenges,
            memory_permutation_terminal,
        }
    }

    /// Verifier-side reconstruction (see `ProcessorTable::from_claims`).
    pub fn from_claims(real_height: usize, challenges: VmChallenges, memory_permutation_terminal: XFE) -> Self {
        Self {
            padded_rows: Vec::new(),
            real_height,
            challenges,
            memory_permutation_terminal,
        }
    }
}

impl Table for MemoryTable {
    fn name(&self) -> &'static str {
        "memory"
    }
    fn width(&self) -> usize {
        WIDTH
    }
    fn height(&self) -> usize {
        self.real_height
    }
    fn trace_length(&self) -> usize {
        crate::air::padded_height(self.real_height).max(1)
    }

    fn boundary_constraints(&self) -> Vec<BoundaryConstraint> {
        let ch = self.challenges;
        vec![
            BoundaryConstraint { row: 0, eval: Box::new(|r: &[XFE]| r[CYCLE]) },
            BoundaryConstraint { row: 0, eval: Box::new(|r: &[XFE]| r[MP]) },
            BoundaryConstraint { row: 0, eval: Box::new(|r: &[XFE]| r[MV]) },
            BoundaryConstraint {
                row: 0,
                eval: Box::new(move |r: &[XFE]| r[MPA] - (ch.beta - (ch.d * r[CYCLE] + ch.e * r[MP] + ch.f * r[MV]))),
            },
        ]
    }

    fn transition_constraints(&self) -> Vec<TransitionConstraint> {
        let ch = self.challenges;
        vec![
            TransitionConstraint {
                degree: 2,
                eval: Box::new(|cur: &[XFE], next: &[XFE]| {
                    let delta = next[MP] - cur[MP];
                    delta * (delta - XFE::one())
                }),
            },
            TransitionConstraint {
                degree: 3,
                eval: Box::new(|cur: &[XFE], next: &[XFE]| {
                    let delta = next[MP] - cur[MP];
                    (XFE::one() - delta) * (next[MV] - cur[MV]) * (next[CYCLE] - cur[CYCLE] - XFE::one())
                }),
            },
            TransitionConstraint {
                degree: 2,
                eval: Box::new(move |cur: &[XFE], next: &[XFE]| {
                    let next_weight = ch.d * next[CYCLE] + ch.e * next[MP] + ch.f * next[MV];
                    next[MPA] - cur[MPA] * (ch.beta - next_weight)
                }),
            },
        ]
    }

    fn terminal_constraints(&self) -> Vec<TerminalConstraint> {
        let anchor = if self.real_height == 0 { 0 } else { self.real_height - 1 };
        let terminal = self.memory_permutation_terminal;
        vec![TerminalConstraint {
            row: anchor,
            degree: 1,
            eval: Box::new(move |r: &[XFE]| r[MPA] - terminal),
        }]
    }

    fn trace_columns(&self) -> Vec<Vec<XFE>> {
        (0..WIDTH)
            .map(|j| self.padded_rows.iter().map(|row| row[j]).collect())
            .collect()
    }
}
