//! FILENAME: engine/src/lib.rs
//! PURPOSE: Main library entry point for the spreadsheet engine.
//! CONTEXT: Re-exports public types and modules for use by other crates.

pub mod cell;
pub mod error;
pub mod formula;
pub mod printer;
pub mod sheet;

pub use cell::{Cell, CellKind, CellValue};
pub use error::SheetError;
pub use formula::FormulaCell;
pub use printer::{print_texts, print_values};
pub use sheet::{Sheet, Size};

// Re-exported so callers of `engine` don't need a direct `position`
// dependency just to construct a `Position`.
pub use position::Position;

#[cfg(test)]
mod tests {
    use super::*;

    fn value_at(sheet: &Sheet, pos: Position) -> CellValue {
        sheet
            .get_cell(pos)
            .unwrap()
            .expect("cell should exist")
            .value(sheet)
    }

    // Concrete scenario 1 (spec §8): A1=2, A2==A1+1 -> 3, printed as "2\n3\n".
    #[test]
    fn formula_reads_referenced_cell() {
        let mut sheet = Sheet::new();
        sheet.set_cell(Position::new(0, 0), "2").unwrap();
        sheet.set_cell(Position::new(1, 0), "=A1+1").unwrap();

        assert_eq!(value_at(&sheet, Position::new(1, 0)), CellValue::Number(3.0));

        let mut out = Vec::new();
        print_values(&sheet, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "2\n3\n");
    }

    // Concrete scenario 2: changing an upstream cell invalidates downstream
    // caches.
    #[test]
    fn changing_upstream_invalidates_downstream_cache() {
        let mut sheet = Sheet::new();
        sheet.set_cell(Position::new(0, 0), "2").unwrap();
        sheet.set_cell(Position::new(1, 0), "=A1+1").unwrap();
        assert_eq!(value_at(&sheet, Position::new(1, 0)), CellValue::Number(3.0));

        sheet.set_cell(Position::new(0, 0), "5").unwrap();
        assert_eq!(value_at(&sheet, Position::new(1, 0)), CellValue::Number(6.0));
    }

    // Concrete scenario 3: a two-cell cycle is rejected, and the losing
    // side keeps its reference to the (still-empty) other cell.
    #[test]
    fn two_cell_cycle_is_rejected() {
        let mut sheet = Sheet::new();
        sheet.set_cell(Position::new(0, 0), "=B1").unwrap();
        let err = sheet.set_cell(Position::new(1, 0), "=A1").unwrap_err();
        assert_eq!(err, SheetError::CircularDependency(Position::new(1, 0)));

        // B1 was auto-materialized as Empty and A1 is unaffected.
        assert_eq!(value_at(&sheet, Position::new(0, 0)), CellValue::Number(0.0));
    }

    // Concrete scenario 4: a direct self-reference is rejected and nothing
    // is installed.
    #[test]
    fn self_reference_is_rejected_and_nothing_installed() {
        let mut sheet = Sheet::new();
        let err = sheet.set_cell(Position::new(0, 0), "=A1").unwrap_err();
        assert_eq!(err, SheetError::CircularDependency(Position::new(0, 0)));
        assert!(sheet.get_cell(Position::new(0, 0)).unwrap().is_none());
    }

    // Concrete scenario 5: clearing the only cell shrinks the printable
    // region back to (0, 0).
    #[test]
    fn clearing_last_cell_shrinks_printable_size() {
        let mut sheet = Sheet::new();
        sheet.set_cell(Position::new(1, 1), "hello").unwrap();
        sheet.clear_cell(Position::new(1, 1)).unwrap();
        assert_eq!(sheet.printable_size(), Size::EMPTY);
    }

    // Concrete scenario 6: an apostrophe-escaped literal keeps its `=` as
    // plain text.
    #[test]
    fn apostrophe_escapes_a_literal_equals() {
        let mut sheet = Sheet::new();
        sheet.set_cell(Position::new(0, 0), "'=literal").unwrap();
        let cell = sheet.get_cell(Position::new(0, 0)).unwrap().unwrap();
        assert_eq!(cell.text_form(), "'=literal");
        assert_eq!(cell.value(&sheet), CellValue::Text("=literal".to_string()));

        let mut out = Vec::new();
        print_values(&sheet, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "=literal\n");
    }

    // Concrete scenario 7: division by zero embeds an Arithmetic error.
    #[test]
    fn division_by_zero_embeds_arithmetic_error() {
        let mut sheet = Sheet::new();
        sheet.set_cell(Position::new(0, 0), "=1/0").unwrap();

        let mut out = Vec::new();
        print_values(&sheet, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "#ARITHM!\n");
    }

    // Concrete scenario 8: referencing an absent cell auto-materializes it
    // as a non-null empty cell.
    #[test]
    fn referencing_absent_cell_auto_materializes_it() {
        let mut sheet = Sheet::new();
        sheet.set_cell(Position::new(0, 0), "=B1").unwrap();
        let b1 = sheet.get_cell(Position::new(1, 0)).unwrap();
        assert!(b1.is_some());
        assert!(b1.unwrap().is_empty());
    }

    #[test]
    fn bare_equals_is_treated_as_text() {
        let mut sheet = Sheet::new();
        sheet.set_cell(Position::new(0, 0), "=").unwrap();
        let cell = sheet.get_cell(Position::new(0, 0)).unwrap().unwrap();
        assert_eq!(cell.text_form(), "=");
        assert_eq!(cell.value(&sheet), CellValue::Text("=".to_string()));
    }

    #[test]
    fn invalid_position_is_rejected() {
        let mut sheet = Sheet::new();
        let bad = Position::new(position::MAX_ROWS, 0);
        assert_eq!(
            sheet.set_cell(bad, "1").unwrap_err(),
            SheetError::InvalidPosition(bad)
        );
    }

    #[test]
    fn malformed_formula_is_a_parse_error_with_no_state_change() {
        let mut sheet = Sheet::new();
        assert!(sheet.set_cell(Position::new(0, 0), "=1+").is_err());
        assert!(sheet.get_cell(Position::new(0, 0)).unwrap().is_none());
        assert_eq!(sheet.printable_size(), Size::EMPTY);
    }

    // Clearing a cell that other formulas still depend on must not sever
    // the dependency edge: a later SetCell at the same position has to
    // re-invalidate those formulas' caches, not leave them dangling.
    #[test]
    fn clearing_a_depended_on_cell_keeps_future_invalidation_wired() {
        let mut sheet = Sheet::new();
        sheet.set_cell(Position::new(0, 0), "=B1").unwrap();
        assert_eq!(value_at(&sheet, Position::new(0, 0)), CellValue::Number(0.0));

        sheet.clear_cell(Position::new(1, 0)).unwrap();
        // B1 is demoted to an auto-materialized empty cell, not deleted,
        // because A1 still references it.
        let b1 = sheet.get_cell(Position::new(1, 0)).unwrap();
        assert!(b1.is_some());
        assert!(b1.unwrap().is_empty());

        sheet.set_cell(Position::new(1, 0), "5").unwrap();
        assert_eq!(value_at(&sheet, Position::new(0, 0)), CellValue::Number(5.0));

        sheet.set_cell(Position::new(1, 0), "9").unwrap();
        assert_eq!(value_at(&sheet, Position::new(0, 0)), CellValue::Number(9.0));
    }

    #[test]
    fn replacing_a_cell_keeps_its_dependents() {
        let mut sheet = Sheet::new();
        sheet.set_cell(Position::new(0, 0), "1").unwrap();
        sheet.set_cell(Position::new(1, 0), "=A1+1").unwrap();

        // Replace A1 with a different formula; A2 should still see it.
        sheet.set_cell(Position::new(0, 0), "=10").unwrap();
        assert_eq!(value_at(&sheet, Position::new(1, 0)), CellValue::Number(11.0));
    }
}
