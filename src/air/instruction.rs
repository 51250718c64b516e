//! The instruction table: the static program listing (one row per address,
//! including the halted `ip == program.len()` slot) unioned with the
//! processor's own `(ip, ci, ni)` columns for every cycle after the first,
//! re-sorted by instruction address. Only a row that shares its address
//! with the row before it (a dynamic duplicate of the static entry
//! introducing that address) contributes to the `ipa` running product, so
//! its terminal lands on the same value as the processor table's own `ppa`
//! terminal even though the two tables have different heights.

use crate::air::challenges::VmChallenges;
use crate::air::{BoundaryConstraint, Table, TerminalConstraint, TransitionConstraint};
use crate::field::XFE;

pub const WIDTH: usize = 4;
pub const IP: usize = 0;
pub const CI: usize = 1;
pub const NI: usize = 2;
pub const IPA: usize = 3;

pub struct InstructionTable {
    pub padded_rows: Vec<[XFE; WIDTH]>,
    pub real_height: usize,
    pub challenges: VmChallenges,
    pub instruction_permutation_terminal: XFE,
}

impl InstructionTable {
    pub fn build(base_rows: &[[XFE; 3]], target_height: usize, challenges: VmChallenges) -> Self {
        let real_height = base_rows.len();
        let mut padded: Vec<[XFE; WIDTH]> = Vec::with_capacity(target_height.max(1));
        let last = base_rows.last().copied().unwrap_or([XFE::zero(); 3]);

        for i in 0..target_height.max(1) {
            let row = base_rows.get(i).copied().unwrap_or(last);
            padded.push([row[0], row[1], row[2], XFE::zero()]);
        }

        let weight =
            |row: &[XFE; WIDTH]| challenges.a * row[IP] + challenges.b * row[CI] + challenges.c * row[NI];
        padded[0][IPA] = challenges.alpha - weight(&padded[0]);
        for i in 0..padded.len().saturating_sub(1) {
            let delta = padded[i + 1][IP] - padded[i][IP];
            let next_weight = weight(&padded[i + 1]);
            let factor = delta + (XFE::one() - delta) * (challenges.alpha - next_weight);
            padded[i + 1][IPA] = padded[i][IPA] * factor;
        }

        let anchor = if real_height == 0 { 0 } else { real_height - 1 };
        let instruction_permutation_terminal = padded[anchor][IPA];

        Self {
            padded_rows: padded,
            real_height,
            challenges,
            instruction_permutation_terminal,
        }
    }

    /// Verifier-side reconstruction (see `ProcessorTable::from_claims`).
    pub fn from_claims(real_height: usize, challenges: VmChallenges, instruction_permutation_terminal: XFE) -> Self {
        Self {
            padded_rows: Vec::new(),
            real_height,
            challenges,
            instruction_permutation_terminal,
        }
    }
}

impl Table for InstructionTable {
    fn name(&self) -> &'static str {
        "instruction"
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
        vec![BoundaryConstraint {
            row: 0,
            eval: Box::new(move |r: &[XFE]| r[IPA] - (ch.alpha - (ch.a * r[IP] + ch.b * r[CI] + ch.c * r[NI]))),
        }]
    }

    fn transition_constraints(&self) -> Vec<TransitionConstraint> {
        let ch = self.challenges;
        vec![
            TransitionConstraint {
                degree: 2,
                eval: Box::new(|cur: &[XFE], next: &[XFE]| {
                    let delta = next[IP] - cur[IP];
                    delta * (delta - XFE::one())
                }),
            },
            TransitionConstraint {
                degree: 2,
                eval: Box::new(|cur: &[XFE], next: &[XFE]| {
                    (XFE::one() - (next[IP] - cur[IP])) * (next[CI] - cur[CI])
                }),
            },
            TransitionConstraint {
                degree: 2,
                eval: Box::new(|cur: &[XFE], next: &[XFE]| {
                    (XFE::one() - (next[IP] - cur[IP])) * (next[NI] - cur[NI])
                }),
            },
            TransitionConstraint {
                // Only a row sharing its address with its predecessor (a
                // dynamic duplicate of a static entry) multiplies into the
                // running product; a row introducing a new address leaves
                // it unchanged.
                degree: 3,
                eval: Box::new(move |cur: &[XFE], next: &[XFE]| {
                    let delta = next[IP] - cur[IP];
                    let next_weight = ch.a * next[IP] + ch.b * next[CI] + ch.c * next[NI];
                    let factor = delta + (XFE::one() - delta) * (ch.alpha - next_weight);
                    next[IPA] - cur[IPA] * factor
                }),
            },
        ]
    }

    fn terminal_constraints(&self) -> Vec<TerminalConstraint> {
        let anchor = if self.real_height == 0 { 0 } else { self.real_height - 1 };
        let terminal = self.instruction_permutation_terminal;
        vec![TerminalConstraint {
            row: anchor,
            degree: 1,
            eval: Box::new(move |r: &[XFE]| r[IPA] - terminal),
        }]
    }

    fn trace_columns(&self) -> Vec<Vec<XFE>> {
        (0..WIDTH)
            .map(|j| self.padded_rows.iter().map(|row| row[j]).collect())
            .collect()
    }
}
