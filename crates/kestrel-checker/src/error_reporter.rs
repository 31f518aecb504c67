//! Error Reporter
//!
//! Diagnostics are queued as `PendingDiagnostic` with a span and rendered
//! once, when the run finishes, so type arguments are only formatted for
//! diagnostics that survive.

use kestrel_common::Span;
use kestrel_common::diagnostics::Diagnostic;
use kestrel_solver::{
    DiagnosticArg, DiagnosticSeverity, PendingDiagnostic, TypeEnvironment, TypeFormatter,
};

use crate::state::CheckerState;

impl CheckerState<'_> {
    /// Queue `diag`, anchoring it at `span` unless it already carries one.
    /// Warnings are dropped when the options say so.
    pub fn report(&mut self, diag: PendingDiagnostic, span: Span) {
        if diag.severity == DiagnosticSeverity::Warning && !self.ctx.options.report_warnings {
            return;
        }
        let diag = if diag.span.is_some() {
            diag
        } else {
            diag.with_span(span)
        };
        self.ctx.diagnostics.push(diag);
    }

    pub fn report_all(&mut self, diags: impl IntoIterator<Item = PendingDiagnostic>, span: Span) {
        for diag in diags {
            self.report(diag, span);
        }
    }

    pub fn report_error(&mut self, code: u32, args: Vec<DiagnosticArg>, span: Span) {
        self.report(PendingDiagnostic::error(code, args), span);
    }

    pub fn report_warning(&mut self, code: u32, args: Vec<DiagnosticArg>, span: Span) {
        self.report(PendingDiagnostic::warning(code, args), span);
    }
}

/// Render queued diagnostics in report order.
pub fn render_diagnostics(env: &TypeEnvironment, pending: &[PendingDiagnostic]) -> Vec<Diagnostic> {
    let mut formatter = TypeFormatter::new(env);
    pending
        .iter()
        .map(|diag| diag.render(&mut formatter, Span::dummy()))
        .collect()
}
