//! Renders compile errors onto a text widget.
//!
//! Each positioned error gets one primary annotation at its start and one
//! `error-message` underline over its span; each positioned context entry of
//! that error gets a `context-message` underline of its own. Errors without
//! a position become plain log messages instead.
//!
//! Error sets are replaced wholesale: [`ErrorMapper::render`] first removes
//! everything the previous render created. The mapper remembers the handle of
//! every marker it adds, so clearing removes exactly those markers and never
//! relies on the widget offering a "remove everything" call.

use wylab_core::{ErrorRecord, MarkerId, Span};

use crate::log::{MessageLog, MessageSeverity};
use crate::widget::{Annotation, MarkerClass, Position, Range, Severity, TextWidget};

/// Counts of what one render produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderSummary {
    pub annotations: usize,
    pub markers: usize,
    pub messages: usize,
}

#[derive(Debug, Default)]
pub struct ErrorMapper {
    markers: Vec<MarkerId>,
}

impl ErrorMapper {
    pub fn new() -> Self {
        ErrorMapper::default()
    }

    /// Handles of the markers created by the last render.
    pub fn tracked_markers(&self) -> &[MarkerId] {
        &self.markers
    }

    /// Removes all annotations and every marker this mapper created.
    pub fn clear_all<W: TextWidget + ?Sized>(&mut self, widget: &mut W) {
        widget.clear_annotations();
        for marker in self.markers.drain(..) {
            widget.remove_marker(marker);
        }
    }

    /// Replaces the rendered error set with `errors`, in input order.
    ///
    /// Identical coordinates are not deduplicated; every error and every
    /// context entry gets its own annotation or marker.
    pub fn render<W: TextWidget + ?Sized>(
        &mut self,
        widget: &mut W,
        log: &mut MessageLog,
        errors: &[ErrorRecord],
    ) -> RenderSummary {
        self.clear_all(widget);

        let mut summary = RenderSummary::default();
        let mut annotations = Vec::new();

        for error in errors {
            let Some(span) = error.span else {
                log.append(MessageSeverity::Error, error.detail_text());
                summary.messages += 1;
                continue;
            };

            annotations.push(Annotation {
                row: span.row(),
                column: span.start,
                text: error.detail_text(),
                severity: Severity::Error,
            });
            self.underline(widget, span, MarkerClass::ErrorMessage);
            summary.markers += 1;

            for context in &error.context {
                match context.span {
                    Some(span) => {
                        self.underline(widget, span, MarkerClass::ContextMessage);
                        summary.markers += 1;
                    }
                    None => {
                        tracing::debug!(text = %context.text, "context entry has no position, skipped");
                    }
                }
            }
        }

        summary.annotations = annotations.len();
        if !annotations.is_empty() {
            widget.set_annotations(annotations);
        }

        tracing::debug!(
            annotations = summary.annotations,
            markers = summary.markers,
            messages = summary.messages,
            "rendered compile errors"
        );
        summary
    }

    fn underline<W: TextWidget + ?Sized>(&mut self, widget: &mut W, span: Span, class: MarkerClass) {
        let range = Range::new(
            Position::new(span.row(), span.start),
            Position::new(span.row(), span.end_exclusive()),
        );
        let severity = match class {
            MarkerClass::ErrorMessage => Severity::Error,
            MarkerClass::ContextMessage => Severity::Info,
        };
        let marker = widget.add_marker(range, class, severity);
        self.markers.push(marker);
    }
}
