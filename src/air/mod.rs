//! The AIR layer: per-table boundary/transition/terminal constraints and the
//! machinery that turns them into low-degree quotient codewords.
//!
//! Grounded directly in `original_source/table_extension.py`'s
//! `TableExtension` base class: the same three zerofier shapes (boundary —
//! vanishes at a named row; transition — vanishes at every row but the
//! last; terminal — vanishes only at the last row), the same batch-inverted
//! zerofier codewords, the same composition order (boundary, then
//! transition, then terminal). Constraints themselves are represented as
//! Rust closures with companion degree metadata rather than as the
//! original's symbolic multivariate polynomials, since this crate evaluates
//! constraints numerically over the LDE domain instead of building a
//! symbolic AST first.

use crate::domain::Domain;
use crate::error::ProverError;
use crate::field::{batch_inverse_xfe, BFE, XFE};

pub mod challenges;
pub mod deselectors;
pub mod instruction;
pub mod io;
pub mod memory;
pub mod processor;

/// A constraint tying a single row to zero, anchored at one row index of
/// the (unpadded) trace.
pub struct BoundaryConstraint {
    pub row: usize,
    pub eval: Box<dyn Fn(&[XFE]) -> XFE + Send + Sync>,
}

/// A constraint tying a row to its successor, required to vanish at every
/// row except the last.
pub struct TransitionConstraint {
    /// Degree of the constraint as a polynomial in the `2*width` row
    /// variables — drives the composition degree bound.
    pub degree: usize,
    pub eval: Box<dyn Fn(&[XFE], &[XFE]) -> XFE + Send + Sync>,
}

/// A constraint anchored at one row of the (unpadded) trace — almost always
/// its last row, `height() - 1`. Anchoring at the real last row rather than
/// the padded table's last row means padding rows are free to carry
/// whatever values the transition recurrence produces; only the claimed
/// terminal at the genuine end of execution is ever checked.
pub struct TerminalConstraint {
    pub row: usize,
    pub degree: usize,
    pub eval: Box<dyn Fn(&[XFE]) -> XFE + Send + Sync>,
}

/// Shared shape every table (processor, memory, instruction, input, output)
/// implements.
pub trait Table {
    fn name(&self) -> &'static str;
    /// Number of extension columns (base + extension).
    fn width(&self) -> usize;
    /// Number of rows actually produced by the trace (before padding to a
    /// power of two).
    fn height(&self) -> usize;
    /// Number of rows in `trace_columns()` after padding: this table's own
    /// `padded_height(height())`, i.e. the order of its own interpolation
    /// subgroup. Drives the
    /// boundary-quotient composition-degree bound below.
    fn trace_length(&self) -> usize;
    fn boundary_constraints(&self) -> Vec<BoundaryConstraint>;
    fn transition_constraints(&self) -> Vec<TransitionConstraint>;
    fn terminal_constraints(&self) -> Vec<TerminalConstraint>;
    /// Every column (base columns lifted to `X`, extension columns as-is),
    /// each padded with a repeated final row up to `padded_height(height())`
    /// entries — the per-table trace the prover interpolates and evaluates
    /// over the shared LDE domain.
    fn trace_columns(&self) -> Vec<Vec<XFE>>;
}

/// The padded subgroup size every table's trace domain uses: the smallest
/// power of two at least as large as `height`, or `1` for an empty table.
pub fn padded_height(height: usize) -> usize {
    if height == 0 {
        return 0;
    }
    height.next_power_of_two()
}

/// Evaluates every boundary constraint's codeword and divides it by the
/// zerofier `domain(i) - omicron^row`, one codeword per constraint
/// (`table_extension.py`'s `boundary_quotients`, generalized to an
/// arbitrary anchor row per constraint instead of a hardcoded row 0).
pub fn boundary_quotients(
    table: &dyn Table,
    omicron: &BFE,
    lde_domain: &Domain,
    codewords: &[Vec<XFE>],
) -> Result<Vec<Vec<XFE>>, ProverError> {
    if table.height() == 0 {
        return Ok(vec![]);
    }
    let points: Vec<BFE> = lde_domain.points();
    let constraints = table.boundary_constraints();
    let mut out = Vec::with_capacity(constraints.len());

    for constraint in &constraints {
        let anchor = omicron.pow(constraint.row as u64);
        let zerofier: Vec<XFE> = points.iter().map(|p| XFE::lift(p) - XFE::lift(&anchor)).collect();
        let zerofier_inv = batch_inverse_xfe(&zerofier);

        let codeword: Vec<XFE> = (0..lde_domain.length)
            .map(|i| {
                let row: Vec<XFE> = codewords.iter().map(|c| c[i]).collect();
                (constraint.eval)(&row) * zerofier_inv[i]
            })
            .collect();
        out.push(codeword);
    }
    Ok(out)
}

pub fn boundary_quotient_degree_bounds(table: &dyn Table) -> Vec<isize> {
    if table.height() == 0 {
        return vec![];
    }
    let n = table.trace_length();
    let composition_degree = n as isize - 1;
    vec![composition_degree - 1; table.boundary_constraints().len()]
}

/// Evaluates every transition constraint against `(row_i, row_{i+1})` pairs
/// wrapping around the LDE domain at the interpolation-subgroup stride, and
/// divides by the zerofier `(domain(i)^n - 1) / (domain(i) - omicron^-1)`
/// (vanishes at every subgroup point but the last — `table_extension.py`'s
/// `transition_quotients`).
pub fn transition_quotients(
    table: &dyn Table,
    omicron: &BFE,
    lde_domain: &Domain,
    codewords: &[Vec<XFE>],
) -> Result<Vec<Vec<XFE>>, ProverError> {
    if table.height() == 0 {
        return Ok(vec![]);
    }
    let n = padded_height(table.height());
    let points: Vec<BFE> = lde_domain.points();
    let omicron_inv = omicron.inv();
    let stride = lde_domain.length / n;

    let subgroup_zerofier: Vec<XFE> = points
        .iter()
        .map(|p| XFE::lift(&p.pow(n as u64)) - XFE::one())
        .collect();
    let subgroup_zerofier_inv = batch_inverse_xfe(&subgroup_zerofier);
    let zerofier_inv: Vec<XFE> = (0..lde_domain.length)
        .map(|i| subgroup_zerofier_inv[i] * (XFE::lift(&points[i]) - XFE::lift(&omicron_inv)))
        .collect();

    let constraints = table.transition_constraints();
    let mut out = Vec::with_capacity(constraints.len());
    for constraint in &constraints {
        let codeword: Vec<XFE> = (0..lde_domain.length)
            .map(|i| {
                let next = (i + stride) % lde_domain.length;
                let current_row: Vec<XFE> = codewords.iter().map(|c| c[i]).collect();
                let next_row: Vec<XFE> = codewords.iter().map(|c| c[next]).collect();
                (constraint.eval)(&current_row, &next_row) * zerofier_inv[i]
            })
            .collect();
        out.push(codeword);
    }
    Ok(out)
}

pub fn transition_quotient_degree_bounds(table: &dyn Table) -> Vec<isize> {
    if table.height() == 0 {
        return vec![];
    }
    let n = padded_height(table.height());
    let trace_degree = n as isize - 1;
    table
        .transition_constraints()
        .iter()
        .map(|c| trace_degree * c.degree as isize - trace_degree)
        .collect()
}

/// Evaluates every terminal constraint against its anchor row, divided by
/// the zerofier `domain(i) - omicron^row` (vanishes only at that one
/// subgroup point — generalizes `table_extension.py`'s `terminal_quotients`,
/// which always anchors at the final padded row, to an explicit per-
/// constraint anchor so padding rows never need to satisfy it).
pub fn terminal_quotients(
    table: &dyn Table,
    omicron: &BFE,
    lde_domain: &Domain,
    codewords: &[Vec<XFE>],
) -> Result<Vec<Vec<XFE>>, ProverError> {
    if table.height() == 0 {
        return Ok(vec![]);
    }
    let points: Vec<BFE> = lde_domain.points();
    let constraints = table.terminal_constraints();
    let mut out = Vec::with_capacity(constraints.len());
    for constraint in &constraints {
        let anchor = omicron.pow(constraint.row as u64);
        let zerofier: Vec<XFE> = points.iter().map(|p| XFE::lift(p) - XFE::lift(&anchor)).collect();
        let zerofier_inv = batch_inverse_xfe(&zerofier);
        let codeword: Vec<XFE> = (0..lde_domain.length)
            .map(|i| {
                let row: Vec<XFE> = codewords.iter().map(|c| c[i]).collect();
                (constraint.eval)(&row) * zerofier_inv[i]
            })
            .collect();
        out.push(codeword);
    }
    Ok(out)
}

pub fn terminal_quotient_degree_bounds(table: &dyn Table) -> Vec<isize> {
    if table.height() == 0 {
        return vec![];
    }
    let n = padded_height(table.height());
    let degree = n as isize - 1;
    table
        .terminal_constraints()
        .iter()
        .map(|c| c.degree as isize * degree - 1)
        .collect()
}

/// All of a table's quotient codewords, in the fixed order boundary,
/// transition, terminal (`table_extension.py`'s `all_quotients`).
pub fn all_quotients(
    table: &dyn Table,
    omicron: &BFE,
    lde_domain: &Domain,
    codewords: &[Vec<XFE>],
) -> Result<Vec<Vec<XFE>>, ProverError> {
    let mut out = boundary_quotients(table, omicron, lde_domain, codewords)?;
    out.extend(transition_quotients(table, omicron, lde_domain, codewords)?);
    out.extend(terminal_quotients(table, omicron, lde_domain, codewords)?);
    Ok(out)
}

pub fn all_quotient_degree_bounds(table: &dyn Table) -> Vec<isize> {
    let mut out = boundary_quotient_degree_bounds(table);
    out.extend(transition_quotient_degree_bounds(table));
    out.extend(terminal_quotient_degree_bounds(table));
    out
}

/// Point-evaluation counterpart of `boundary_quotients`: evaluates every
/// boundary constraint at one already-opened row and divides by the
/// zerofier at that one domain point (`table_extension.py`'s
/// `evaluate_boundary_quotients`, used here by the verifier to recompute a
/// quotient value from an opened trace row instead of a full codeword).
pub fn evaluate_boundary_quotients(table: &dyn Table, omicron: &BFE, point: &BFE, row: &[XFE]) -> Vec<XFE> {
    if table.height() == 0 {
        return vec![];
    }
    table
        .boundary_constraints()
        .iter()
        .map(|constraint| {
            let anchor = omicron.pow(constraint.row as u64);
            let zerofier_inv = (XFE::lift(point) - XFE::lift(&anchor)).inv();
            (constraint.eval)(row) * zerofier_inv
        })
        .collect()
}

/// Point-evaluation counterpart of `transition_quotients`.
pub fn evaluate_transition_quotients(
    table: &dyn Table,
    omicron: &BFE,
    point: &BFE,
    cur_row: &[XFE],
    next_row: &[XFE],
) -> Vec<XFE> {
    if table.height() == 0 {
        return vec![];
    }
    let n = padded_height(table.height());
    let omicron_inv = omicron.inv();
    let subgroup_zerofier_inv = (XFE::lift(&point.pow(n as u64)) - XFE::one()).inv();
    let zerofier_inv = subgroup_zerofier_inv * (XFE::lift(point) - XFE::lift(&omicron_inv));

    table
        .transition_constraints()
        .iter()
        .map(|constraint| (constraint.eval)(cur_row, next_row) * zerofier_inv)
        .collect()
}

/// Point-evaluation counterpart of `terminal_quotients`.
pub fn evaluate_terminal_quotients(table: &dyn Table, omicron: &BFE, point: &BFE, row: &[XFE]) -> Vec<XFE> {
    if table.height() == 0 {
        return vec![];
    }
    table
        .terminal_constraints()
        .iter()
        .map(|constraint| {
            let anchor = omicron.pow(constraint.row as u64);
            let zerofier_inv = (XFE::lift(point) - XFE::lift(&anchor)).inv();
            (constraint.eval)(row) * zerofier_inv
        })
        .collect()
}

/// All of a table's quotient values at one domain point, in the same fixed
/// order `all_quotients` uses (`table_extension.py`'s `evaluate_quotients`).
pub fn evaluate_all_quotients(
    table: &dyn Table,
    omicron: &BFE,
    point: &BFE,
    cur_row: &[XFE],
    next_row: &[XFE],
) -> Vec<XFE> {
    let mut out = evaluate_boundary_quotients(table, omicron, point, cur_row);
    out.extend(evaluate_transition_quotients(table, omicron, point, cur_row, next_row));
    out.extend(evaluate_terminal_quotients(table, omicron, point, cur_row));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ToyTable {
        height: usize,
    }

    impl Table for ToyTable {
        fn name(&self) -> &'static str {
            "toy"
        }
        fn width(&self) -> usize {
            1
        }
        fn height(&self) -> usize {
            self.height
        }
        fn trace_length(&self) -> usize {
            self.height.max(1)
        }
        fn boundary_constraints(&self) -> Vec<BoundaryConstraint> {
            vec![BoundaryConstraint {
                row: 0,
                eval: Box::new(|row: &[XFE]| row[0]),
            }]
        }
        fn transition_constraints(&self) -> Vec<TransitionConstraint> {
            vec![TransitionConstraint {
                degree: 2,
                eval: Box::new(|cur: &[XFE], next: &[XFE]| next[0] - cur[0] - XFE::one()),
            }]
        }
        fn terminal_constraints(&self) -> Vec<TerminalConstraint> {
            vec![]
        }
        fn trace_columns(&self) -> Vec<Vec<XFE>> {
            vec![(0..self.height.max(1)).map(|i| XFE::lift(&BFE::from(i as u64))).collect()]
        }
    }

    #[test]
    fn empty_table_produces_no_quotients() {
        let table = ToyTable { height: 0 };
        assert!(all_quotient_degree_bounds(&table).is_empty());
    }

    #[test]
    fn degree_bounds_have_one_entry_per_constraint() {
        let table = ToyTable { height: 4 };
        let bounds = boundary_quotient_degree_bounds(&table);
        assert_eq!(bounds.len(), 1);
        let bounds = transition_quotient_degree_bounds(&table);
        assert_eq!(bounds.len(), 1);
    }

    #[test]
    fn point_evaluation_matches_codeword_quotient_at_same_index() {
        use lambdaworks_math::field::traits::IsFFTField;

        let table = ToyTable { height: 4 };
        let order = 4u64.trailing_zeros() as u64;
        let omicron = crate::field::BaseField::get_primitive_root_of_unity(order).unwrap();
        let lde_domain = Domain::new(BFE::from(3u64), omicron.clone(), 16);

        let coeffs = vec![BFE::from(0u64), BFE::from(1u64), BFE::from(2u64), BFE::from(3u64)];
        let base_codeword = lde_domain.evaluate(&lambdaworks_math::polynomial::Polynomial::new(&coeffs));
        let codewords = vec![base_codeword.iter().map(XFE::lift).collect::<Vec<_>>()];

        let all = all_quotients(&table, &omicron, &lde_domain, &codewords).unwrap();
        let n = padded_height(table.height());
        let stride = lde_domain.length / n;

        for i in [0usize, 3, 7] {
            let next = (i + stride) % lde_domain.length;
            let point = lde_domain.point(i);
            let cur_row = vec![codewords[0][i]];
            let next_row = vec![codewords[0][next]];
            let pointwise = evaluate_all_quotients(&table, &omicron, &point, &cur_row, &next_row);
            let from_codeword: Vec<XFE> = all.iter().map(|c| c[i]).collect();
            assert_eq!(pointwise, from_codeword, "mismatch at index {i}");
        }
    }
}
