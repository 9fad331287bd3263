//! FILENAME: engine/src/sheet.rs
//! PURPOSE: Owns the grid of cells, the printable-bound tracking, and the
//! operations that mutate cell content: `set_cell`, `get_cell`,
//! `clear_cell`. Also implements `parser::SheetRead` so formulas can query
//! other cells through the same object that owns them.
//! CONTEXT: The dependency graph lives as `depends_on`/`dependents` sets on
//! each `Cell` (see `cell.rs`); this module is where those sets get wired
//! up, cycle-checked, and walked for cache invalidation.

use std::collections::{HashMap, HashSet};
use std::io::{self, Write};

use parser::{self, CellRead, Expression, SheetRead};
use position::Position;

use crate::cell::{Cell, CellValue};
use crate::error::SheetError;

/// The tight bounding rectangle of occupied cells, anchored at `(0, 0)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    pub rows: u32,
    pub cols: u32,
}

impl Size {
    pub const EMPTY: Size = Size { rows: 0, cols: 0 };
}

/// A spreadsheet: a sparse grid of cells plus the printable bound used by
/// `print_values`/`print_texts`.
#[derive(Debug, Default)]
pub struct Sheet {
    cells: HashMap<Position, Cell>,
    printable_rows: u32,
    printable_cols: u32,
}

impl Sheet {
    pub fn new() -> Self {
        Sheet {
            cells: HashMap::new(),
            printable_rows: 0,
            printable_cols: 0,
        }
    }

    /// Classifies and installs `text` at `pos`. Fails atomically —
    /// `InvalidPosition`, `FormulaParseError`, or `CircularDependency`
    /// leave the sheet exactly as it was.
    pub fn set_cell(&mut self, pos: Position, text: &str) -> Result<(), SheetError> {
        if !pos.is_valid() {
            return Err(SheetError::InvalidPosition(pos));
        }

        let new_kind = classify(pos, text)?;

        let refs = match &new_kind {
            ClassifiedKind::Formula(expr) => expr.referenced_positions(),
            _ => Vec::new(),
        };

        if self.creates_cycle(pos, &refs) {
            log::warn!("rejecting SetCell at {:?}: would create a cycle", pos);
            return Err(SheetError::CircularDependency(pos));
        }

        // Materialization happens only after the cycle check succeeds.
        // A freshly materialized Empty cell has no outgoing edges, so it
        // cannot have affected the check above — this is what lets the
        // whole operation stay atomic without a separate rollback path.
        for &q in &refs {
            if !self.cells.contains_key(&q) {
                self.cells.insert(q, Cell::empty());
                self.grow_bounds(q);
            }
        }

        let inherited_dependents = self
            .cells
            .get(&pos)
            .map(|prior| prior.dependents().clone())
            .unwrap_or_default();

        if let Some(prior) = self.cells.get(&pos) {
            let old_deps: Vec<Position> = prior.depends_on().iter().copied().collect();
            for dep in old_deps {
                if let Some(cell) = self.cells.get_mut(&dep) {
                    cell.dependents_mut().remove(&pos);
                }
            }
        }

        let mut new_cell = match new_kind {
            ClassifiedKind::Empty => Cell::empty(),
            ClassifiedKind::Text(raw) => Cell::text(raw),
            ClassifiedKind::Formula(expr) => Cell::formula(expr),
        };
        *new_cell.dependents_mut() = inherited_dependents;
        for &q in &refs {
            new_cell.depends_on_mut().insert(q);
        }

        let dep_count = new_cell.depends_on().len();
        self.cells.insert(pos, new_cell);

        for &q in &refs {
            if let Some(cell) = self.cells.get_mut(&q) {
                cell.dependents_mut().insert(pos);
            }
        }

        self.invalidate_from(pos);
        self.grow_bounds(pos);

        log::debug!(
            "set_cell({:?}): kind installed, {} outgoing edges",
            pos,
            dep_count
        );

        Ok(())
    }

    /// Returns the cell at `pos`, or `None` if absent or outside the
    /// printable region.
    pub fn get_cell(&self, pos: Position) -> Result<Option<&Cell>, SheetError> {
        if !pos.is_valid() {
            return Err(SheetError::InvalidPosition(pos));
        }
        if pos.row >= self.printable_rows || pos.col >= self.printable_cols {
            return Ok(None);
        }
        Ok(self.cells.get(&pos))
    }

    /// Removes the cell at `pos`, unlinking its outgoing edges and
    /// invalidating any dependent formula caches. A no-op if no cell
    /// exists there.
    pub fn clear_cell(&mut self, pos: Position) -> Result<(), SheetError> {
        if !pos.is_valid() {
            return Err(SheetError::InvalidPosition(pos));
        }

        let Some(cell) = self.cells.get(&pos) else {
            return Ok(());
        };

        let outgoing: Vec<Position> = cell.depends_on().iter().copied().collect();
        self.invalidate_from(pos);

        for dep in outgoing {
            if let Some(target) = self.cells.get_mut(&dep) {
                target.dependents_mut().remove(&pos);
            }
        }

        // A cell that other live formulas still depend on can't simply
        // vanish from the grid: if it did, a later SetCell at the same
        // position would have no prior cell to inherit `dependents` from,
        // leaving those formulas with a dangling edge that never gets
        // reconnected. Demote it to a materialized Empty cell instead and
        // only evict the slot once nothing depends on it.
        let cell = self.cells.get_mut(&pos).expect("checked present above");
        cell.reset_to_empty();
        if cell.dependents().is_empty() {
            self.cells.remove(&pos);
        }
        self.recompute_bounds();

        log::debug!("clear_cell({:?})", pos);

        Ok(())
    }

    pub fn printable_size(&self) -> Size {
        Size {
            rows: self.printable_rows,
            cols: self.printable_cols,
        }
    }

    /// All positions currently holding a cell (materialized `Empty` cells
    /// included). Exposed for invariant checks over the whole grid.
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        self.cells.keys().copied()
    }

    /// Renders the printable region as tab-separated evaluated values, one
    /// row per line.
    pub fn print_values<W: Write>(&self, sink: &mut W) -> io::Result<()> {
        self.print_region(sink, |cell, sheet| cell.value(sheet).display())
    }

    /// Renders the printable region as tab-separated canonical text, one
    /// row per line.
    pub fn print_texts<W: Write>(&self, sink: &mut W) -> io::Result<()> {
        self.print_region(sink, |cell, _sheet| cell.text_form())
    }

    fn print_region<W: Write>(
        &self,
        sink: &mut W,
        render: impl Fn(&Cell, &Sheet) -> String,
    ) -> io::Result<()> {
        for row in 0..self.printable_rows {
            let mut fields = Vec::with_capacity(self.printable_cols as usize);
            for col in 0..self.printable_cols {
                let text = match self.cells.get(&Position::new(row, col)) {
                    Some(cell) => render(cell, self),
                    None => String::new(),
                };
                fields.push(text);
            }
            writeln!(sink, "{}", fields.join("\t"))?;
        }
        Ok(())
    }

    /// DFS from `refs`, following each visited cell's existing `depends_on`
    /// edges, checking whether `pos` is reachable. Linear in the size of
    /// the reachable subgraph. This single check subsumes the spec's
    /// separate "does the formula reference itself" step: a direct
    /// self-reference is just the one-hop case of this walk.
    fn creates_cycle(&self, pos: Position, refs: &[Position]) -> bool {
        let mut visited = HashSet::new();
        let mut stack: Vec<Position> = refs.to_vec();
        while let Some(current) = stack.pop() {
            if current == pos {
                return true;
            }
            if !visited.insert(current) {
                continue;
            }
            if let Some(cell) = self.cells.get(&current) {
                stack.extend(cell.depends_on().iter().copied());
            }
        }
        false
    }

    /// DFS from `pos` over `dependents` edges, clearing every formula
    /// cell's cache. A visited set keeps this linear even though
    /// acyclicity already guarantees termination without one.
    fn invalidate_from(&self, pos: Position) {
        let mut visited = HashSet::new();
        let mut stack = vec![pos];
        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            if let Some(cell) = self.cells.get(&current) {
                if current != pos {
                    cell.invalidate_cache();
                }
                stack.extend(cell.dependents().iter().copied());
            }
        }
    }

    fn grow_bounds(&mut self, pos: Position) {
        self.printable_rows = self.printable_rows.max(pos.row + 1);
        self.printable_cols = self.printable_cols.max(pos.col + 1);
    }

    fn recompute_bounds(&mut self) {
        let mut rows = 0;
        let mut cols = 0;
        for pos in self.cells.keys() {
            rows = rows.max(pos.row + 1);
            cols = cols.max(pos.col + 1);
        }
        self.printable_rows = rows;
        self.printable_cols = cols;
    }
}

enum ClassifiedKind {
    Empty,
    Text(String),
    Formula(Expression),
}

/// Classifies raw input text per §4.2: empty text is `Empty`; `=`-prefixed
/// text with more than one character is parsed as a formula; anything else
/// is a text literal (a bare `"="` included).
fn classify(pos: Position, text: &str) -> Result<ClassifiedKind, SheetError> {
    if text.is_empty() {
        return Ok(ClassifiedKind::Empty);
    }
    if text.starts_with('=') && text.len() > 1 {
        let body = &text[1..];
        let expr = parser::parse(body)
            .map_err(|e| SheetError::FormulaParseError(pos, e.to_string()))?;
        return Ok(ClassifiedKind::Formula(expr));
    }
    Ok(ClassifiedKind::Text(text.to_string()))
}

impl SheetRead for Sheet {
    fn get_cell(&self, pos: Position) -> CellRead {
        match self.cells.get(&pos) {
            None => CellRead::Empty,
            Some(cell) => match cell.kind() {
                crate::cell::CellKind::Empty => CellRead::Empty,
                crate::cell::CellKind::Text(raw) => CellRead::Text(raw.clone()),
                crate::cell::CellKind::Formula(formula) => {
                    CellRead::Formula(formula.value(self))
                }
            },
        }
    }
}

/// Renders a `CellValue` the way `print_values` does. Exposed for callers
/// that read a single cell's value directly rather than through the
/// printer (e.g. `GetValue` in the spec's external interface).
pub fn display_value(value: &CellValue) -> String {
    value.display()
}
