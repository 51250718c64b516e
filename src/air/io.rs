//! The input and output tables: a single `mv` column per read or write,
//! plus a Horner-style evaluation-argument column tying each one back to
//! the processor table's `ea_in`/`ea_out` accumulator. Grounded in `original_source/vm.py`'s
//! `evaluation_terminal` static method (`acc = alpha*acc + t`), generalized
//! here to a full transition/boundary constraint pair instead of a
//! reference-only helper.

use crate::air::{BoundaryConstraint, Table, TerminalConstraint, TransitionConstraint};
use crate::field::XFE;

pub const WIDTH: usize = 2;
pub const MV: usize = 0;
pub const EA: usize = 1;

/// Which side of the VM's I/O this table represents — purely for the
/// `name()` label and for documenting which challenge (`gamma` for input,
/// `delta` for output) the caller must pass into `build`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IoRole {
    Input,
    Output,
}

pub struct IoTable {
    pub role: IoRole,
    pub padded_rows: Vec<[XFE; WIDTH]>,
    pub real_height: usize,
    pub challenge: XFE,
    pub evaluation_terminal: XFE,
}

impl IoTable {
    /// `mv_values` is the table's single base column in read/write order;
    /// `challenge` is `gamma` for input or `delta` for output.
    pub fn build(role: IoRole, mv_values: &[XFE], target_height: usize, challenge: XFE) -> Self {
        let real_height = mv_values.len();
        let mut padded: Vec<[XFE; WIDTH]> = Vec::with_capacity(target_height.max(1));
        let last = mv_values.last().copied().unwrap_or(XFE::zero());

        for i in 0..target_height.max(1) {
            let mv = mv_values.get(i).copied().unwrap_or(last);
            padded.push([mv, XFE::zero()]);
        }

        if real_height > 0 {
            padded[0][EA] = padded[0][MV];
            for i in 0..padded.len().saturating_sub(1) {
                padded[i + 1][EA] = padded[i][EA] * challenge + padded[i + 1][MV];
            }
        }

        let anchor = if real_height == 0 { 0 } else { real_height - 1 };
        let evaluation_terminal = padded[anchor][EA];

        Self {
            role,
            padded_rows: padded,
            real_height,
            challenge,
            evaluation_terminal,
        }
    }

    /// Verifier-side reconstruction (see `ProcessorTable::from_claims`).
    pub fn from_claims(role: IoRole, real_height: usize, challenge: XFE, evaluation_terminal: XFE) -> Self {
        Self {
            role,
            padded_rows: Vec::new(),
            real_height,
            challenge,
            evaluation_terminal,
        }
    }
}

impl Table for IoTable {
    fn name(&self) -> &'static str {
        match self.role {
            IoRole::Input => "input",
            IoRole::Output => "output",
        }
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
        if self.real_height == 0 {
            return vec![];
        }
        vec![BoundaryConstraint { row: 0, eval: Box::new(|r: &[XFE]| r[EA] - r[MV]) }]
    }

    fn transition_constraints(&self) -> Vec<TransitionConstraint> {
        if self.real_height == 0 {
            return vec![];
        }
        let challenge = self.challenge;
        vec![TransitionConstraint {
            degree: 2,
            eval: Box::new(move |cur: &[XFE], next: &[XFE]| next[EA] - (cur[EA] * challenge + next[MV])),
        }]
    }

    fn terminal_constraints(&self) -> Vec<TerminalConstraint> {
        if self.real_height == 0 {
            return vec![];
        }
        let anchor = self.real_height - 1;
        let terminal = self.evaluation_terminal;
        vec![TerminalConstraint {
            row: anchor,
            degree: 1,
            eval: Box::new(move |r: &[XFE]| r[EA] - terminal),
        }]
    }

    fn trace_columns(&self) -> Vec<Vec<XFE>> {
        (0..WIDTH)
            .map(|j| self.padded_rows.iter().map(|row| row[j]).collect())
            .collect()
    }
}
