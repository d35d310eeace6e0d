//! Terminal rendition of the widget state and message log.
//!
//! Source lines carrying markers are printed with a gutter, followed by a
//! caret line per marker (`^` for errors, `-` for context) and the text of
//! any annotation anchored on that line. Messages follow, one per line.

use std::fmt;

use wylab_session::{BufferWidget, MarkerClass, MessageLog, MessageSeverity, TextWidget};

/// Widget state plus message log, printable with `{}`.
pub struct Report<'a> {
    widget: &'a BufferWidget,
    log: &'a MessageLog,
}

impl<'a> Report<'a> {
    pub fn new(widget: &'a BufferWidget, log: &'a MessageLog) -> Self {
        Report { widget, log }
    }
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self.widget.text();
        let lines: Vec<&str> = text.lines().collect();

        let mut rows: Vec<u32> = self
            .widget
            .markers()
            .map(|m| m.range.start.row)
            .chain(self.widget.annotations().iter().map(|a| a.row))
            .collect();
        rows.sort_unstable();
        rows.dedup();

        for row in rows {
            let source = lines.get(row as usize).copied().unwrap_or("");
            writeln!(f, "{:>4} | {}", row + 1, source)?;

            // Carets never extend past the line, whatever columns the server sent.
            let width = source.chars().count();
            for marker in self.widget.markers().filter(|m| m.range.start.row == row) {
                let start = (marker.range.start.column as usize).min(width);
                let end = if marker.range.end.row == row {
                    (marker.range.end.column as usize).min(width)
                } else {
                    width
                };
                let end = end.max(start + 1);
                let glyph = match marker.class {
                    MarkerClass::ErrorMessage => "^",
                    MarkerClass::ContextMessage => "-",
                };
                writeln!(f, "     | {}{}", " ".repeat(start), glyph.repeat(end - start))?;
            }

            for annotation in self.widget.annotations().iter().filter(|a| a.row == row) {
                for (i, line) in annotation.text.lines().enumerate() {
                    let label = if i == 0 { "= error: " } else { "         " };
                    writeln!(f, "     {}{}", label, line)?;
                }
            }
        }

        for message in self.log.iter() {
            let prefix = match message.severity {
                MessageSeverity::Success => "ok",
                MessageSeverity::Error => "error",
            };
            writeln!(f, "[{}] {}", prefix, message.text)?;
        }

        Ok(())
    }
}
