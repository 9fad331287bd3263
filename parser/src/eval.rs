//! FILENAME: parser/src/eval.rs
//! PURPOSE: The evaluation contract between a parsed formula and the sheet
//! that hosts it: `FormulaValue`, `FormulaError`, the `SheetRead`/`CellRead`
//! read interface, and `Expression::evaluate`.

use std::collections::BTreeSet;
use std::fmt;

use position::Position;

use crate::ast::{BinaryOperator, CellRefTarget, Expression, UnaryOperator};

/// The result of evaluating a formula: a finite number, or an error kind
/// that propagates unchanged through any formula consuming it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FormulaValue {
    Number(f64),
    Error(FormulaError),
}

/// Error kinds embedded in formula results. Never raised to the caller of
/// a sheet operation — only `InvalidPosition`, `FormulaParseError`, and
/// `CircularDependency` (defined in the `engine` crate) surface that way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormulaError {
    /// A reference to a position that is syntactically a cell reference
    /// but lies outside the sheet's valid bounds.
    Ref,
    /// A text operand could not be coerced to a number.
    Value,
    /// Division by zero, or a result that is not finite.
    Arithmetic,
}

impl fmt::Display for FormulaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mnemonic = match self {
            FormulaError::Ref => "#REF!",
            FormulaError::Value => "#VALUE!",
            FormulaError::Arithmetic => "#ARITHM!",
        };
        write!(f, "{}", mnemonic)
    }
}

/// What the evaluator sees when it queries a single cell through
/// `SheetRead`. `Absent` and `Empty` are both treated as the numeric zero
/// by `evaluate`; the distinction exists for interface completeness (the
/// engine itself never actually returns `Absent` to a formula, since any
/// position a formula references is auto-materialized as `Empty`).
#[derive(Debug, Clone, PartialEq)]
pub enum CellRead {
    Absent,
    Empty,
    Text(String),
    Formula(FormulaValue),
}

/// The read-only view of a sheet that a parsed formula evaluates against.
/// Implemented by `engine::Sheet`; kept here so `parser` never depends on
/// `engine`.
pub trait SheetRead {
    fn get_cell(&self, pos: Position) -> CellRead;
}

/// Strips a leading apostrophe escape and attempts to parse the remainder
/// as a finite integer. Used identically for a directly-read text cell and
/// for a formula operand that resolves to one, per the coercion rule this
/// engine adopts: parse the *entire* string as an integer, or treat it as
/// a non-numeric string. No partial/prefix parsing.
pub fn coerce_text_to_number(raw: &str) -> Option<f64> {
    let unescaped = raw.strip_prefix('\'').unwrap_or(raw);
    unescaped.parse::<i64>().ok().map(|n| n as f64)
}

impl Expression {
    /// Evaluates this expression against `sheet`, following references
    /// recursively. Errors encountered on any operand propagate unchanged.
    pub fn evaluate(&self, sheet: &dyn SheetRead) -> FormulaValue {
        match self {
            Expression::Number(n) => FormulaValue::Number(*n),

            Expression::CellRef { target, .. } => match target {
                CellRefTarget::OutOfRange => FormulaValue::Error(FormulaError::Ref),
                CellRefTarget::Valid(pos) => match sheet.get_cell(*pos) {
                    CellRead::Absent | CellRead::Empty => FormulaValue::Number(0.0),
                    CellRead::Text(raw) => match coerce_text_to_number(&raw) {
                        Some(n) => FormulaValue::Number(n),
                        None => FormulaValue::Error(FormulaError::Value),
                    },
                    CellRead::Formula(value) => value,
                },
            },

            Expression::Unary { op, expr } => {
                let value = expr.evaluate(sheet);
                match (op, value) {
                    (_, FormulaValue::Error(e)) => FormulaValue::Error(e),
                    (UnaryOperator::Negate, FormulaValue::Number(n)) => {
                        FormulaValue::Number(-n)
                    }
                }
            }

            Expression::Binary { op, left, right } => {
                let lhs = left.evaluate(sheet);
                let rhs = right.evaluate(sheet);
                let (lhs, rhs) = match (lhs, rhs) {
                    (FormulaValue::Error(e), _) => return FormulaValue::Error(e),
                    (_, FormulaValue::Error(e)) => return FormulaValue::Error(e),
                    (FormulaValue::Number(l), FormulaValue::Number(r)) => (l, r),
                };

                let result = match op {
                    BinaryOperator::Add => lhs + rhs,
                    BinaryOperator::Subtract => lhs - rhs,
                    BinaryOperator::Multiply => lhs * rhs,
                    BinaryOperator::Divide => {
                        if rhs == 0.0 {
                            return FormulaValue::Error(FormulaError::Arithmetic);
                        }
                        lhs / rhs
                    }
                };

                if result.is_finite() {
                    FormulaValue::Number(result)
                } else {
                    FormulaValue::Error(FormulaError::Arithmetic)
                }
            }
        }
    }

    /// Renders this expression back to the normalised text form used after
    /// the leading `=` of a formula cell's canonical text.
    pub fn canonical_text(&self) -> String {
        match self {
            Expression::Number(n) => format_number(*n),
            Expression::CellRef { text, .. } => text.clone(),
            Expression::Unary { op, expr } => match op {
                UnaryOperator::Negate => format!("-{}", expr.canonical_text()),
            },
            Expression::Binary { op, left, right } => {
                format!(
                    "{}{}{}",
                    left.canonical_text(),
                    op.symbol(),
                    right.canonical_text()
                )
            }
        }
    }

    /// Enumerates the positions this expression references, in position
    /// order, deduplicated. Out-of-range references are excluded — they
    /// never materialize a cell and never participate in dependency edges.
    pub fn referenced_positions(&self) -> Vec<Position> {
        let mut set = BTreeSet::new();
        collect_positions(self, &mut set);
        set.into_iter().collect()
    }
}

fn collect_positions(expr: &Expression, out: &mut BTreeSet<Position>) {
    match expr {
        Expression::Number(_) => {}
        Expression::CellRef { target, .. } => {
            if let CellRefTarget::Valid(pos) = target {
                out.insert(*pos);
            }
        }
        Expression::Unary { expr, .. } => collect_positions(expr, out),
        Expression::Binary { left, right, .. } => {
            collect_positions(left, out);
            collect_positions(right, out);
        }
    }
}

/// Renders a finite double the way formula results and cell values print:
/// integral values drop the decimal point, everything else uses Rust's
/// default float formatting.
pub fn format_number(n: f64) -> String {
    if n == n.trunc() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}
