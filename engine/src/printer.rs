//! FILENAME: engine/src/printer.rs
//! PURPOSE: Streaming renderers for a sheet's printable region.
//! CONTEXT: Function-based, not method-based, mirroring how the
//! persistence layer's writers take the data they render as a parameter
//! rather than being methods on it — the core crate never owns a sink.

use std::io::{self, Write};

use crate::sheet::Sheet;

/// Writes tab-delimited evaluated values for the printable region to
/// `sink`, one row per line.
pub fn print_values<W: Write>(sheet: &Sheet, sink: &mut W) -> io::Result<()> {
    sheet.print_values(sink)
}

/// Writes tab-delimited canonical text for the printable region to `sink`,
/// one row per line.
pub fn print_texts<W: Write>(sheet: &Sheet, sink: &mut W) -> io::Result<()> {
    sheet.print_texts(sink)
}
