//! FILENAME: engine/src/cell.rs
//! PURPOSE: Defines the fundamental data structures for a single
//! spreadsheet cell: its content variant and its dependency edges.
//! CONTEXT: A `Cell` never looks itself up by position — `Sheet` is the
//! only thing that knows where a cell lives. Edges are stored as
//! `Position` sets, not pointers, so ownership stays entirely with the
//! sheet's grid.

use std::collections::BTreeSet;

use parser::{coerce_text_to_number, format_number, Expression, FormulaError, SheetRead};
use position::Position;

use crate::formula::FormulaCell;

/// The calculated result of `GetValue` on a cell — broader than
/// `parser::FormulaValue` because a cell (unlike a formula operand) can
/// also hold text.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Number(f64),
    Text(String),
    Error(FormulaError),
}

impl CellValue {
    /// Renders this value the way `PrintValues` does: a number, a string,
    /// or an error mnemonic.
    pub fn display(&self) -> String {
        match self {
            CellValue::Number(n) => format_number(*n),
            CellValue::Text(s) => s.clone(),
            CellValue::Error(e) => e.to_string(),
        }
    }
}

/// The three closed content variants a cell can hold.
#[derive(Debug, Clone, PartialEq)]
pub enum CellKind {
    Empty,
    Text(String),
    Formula(FormulaCell),
}

/// A single grid entry: its content plus the dependency edges that content
/// implies. `depends_on` and `dependents` are non-owning references,
/// maintained bidirectionally by `Sheet`.
#[derive(Debug, Clone)]
pub struct Cell {
    kind: CellKind,
    depends_on: BTreeSet<Position>,
    dependents: BTreeSet<Position>,
}

impl Cell {
    pub fn empty() -> Self {
        Cell {
            kind: CellKind::Empty,
            depends_on: BTreeSet::new(),
            dependents: BTreeSet::new(),
        }
    }

    pub fn text(raw: String) -> Self {
        Cell {
            kind: CellKind::Text(raw),
            depends_on: BTreeSet::new(),
            dependents: BTreeSet::new(),
        }
    }

    pub fn formula(expr: Expression) -> Self {
        Cell {
            kind: CellKind::Formula(FormulaCell::new(expr)),
            depends_on: BTreeSet::new(),
            dependents: BTreeSet::new(),
        }
    }

    pub fn kind(&self) -> &CellKind {
        &self.kind
    }

    pub fn depends_on(&self) -> &BTreeSet<Position> {
        &self.depends_on
    }

    pub fn dependents(&self) -> &BTreeSet<Position> {
        &self.dependents
    }

    pub fn depends_on_mut(&mut self) -> &mut BTreeSet<Position> {
        &mut self.depends_on
    }

    pub fn dependents_mut(&mut self) -> &mut BTreeSet<Position> {
        &mut self.dependents
    }

    /// The canonical text form: empty string, the raw text, or `"=" +
    /// canonical_text()` for a formula.
    pub fn text_form(&self) -> String {
        match &self.kind {
            CellKind::Empty => String::new(),
            CellKind::Text(raw) => raw.clone(),
            CellKind::Formula(formula) => format!("={}", formula.canonical_text()),
        }
    }

    /// The evaluated value, per §4.5: empty reads as zero, text coerces to
    /// a number when possible else renders as its (escape-stripped)
    /// string, and a formula evaluates lazily with memoization.
    pub fn value(&self, sheet: &dyn SheetRead) -> CellValue {
        match &self.kind {
            CellKind::Empty => CellValue::Number(0.0),
            CellKind::Text(raw) => text_value(raw),
            CellKind::Formula(formula) => match formula.value(sheet) {
                parser::FormulaValue::Number(n) => CellValue::Number(n),
                parser::FormulaValue::Error(e) => CellValue::Error(e),
            },
        }
    }

    /// Clears a formula cell's memoized result. A no-op on non-formula
    /// cells.
    pub fn invalidate_cache(&self) {
        if let CellKind::Formula(formula) = &self.kind {
            formula.invalidate();
        }
    }

    pub fn is_formula(&self) -> bool {
        matches!(self.kind, CellKind::Formula(_))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.kind, CellKind::Empty)
    }

    /// Resets this cell's content to `Empty` and drops its outgoing edges,
    /// while preserving `dependents`. Used by `Sheet::clear_cell` when
    /// other live formulas still reference this position: they keep a
    /// coherent edge to a materialized empty cell rather than a dangling
    /// one that can never be relinked on the next `SetCell` here.
    pub fn reset_to_empty(&mut self) {
        self.kind = CellKind::Empty;
        self.depends_on.clear();
    }
}

fn text_value(raw: &str) -> CellValue {
    match coerce_text_to_number(raw) {
        Some(n) => CellValue::Number(n),
        None => {
            let display = raw.strip_prefix('\'').unwrap_or(raw);
            CellValue::Text(display.to_string())
        }
    }
}
