//! Lazy diagnostics produced by the solver.
//!
//! The relation engine, instantiation and call resolution do not format
//! messages. They produce a [`PendingDiagnostic`]: a code plus structured
//! arguments (`TypeId`s, atoms, numbers). The checker attaches a span and
//! renders it with a [`TypeFormatter`] only when the diagnostic is kept, so
//! speculative work never pays for string formatting.

use kestrel_common::diagnostics::{Diagnostic, format_message, get_diagnostic_message};
use kestrel_common::limits::CANDIDATE_DIAGNOSTIC_LIMIT;
use kestrel_common::{Atom, Span, internal_error};
use std::sync::Arc;

use crate::format::TypeFormatter;
use crate::signature::Signature;
use crate::types::TypeId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DiagnosticSeverity {
    Error,
    Warning,
}

// =============================================================================
// Lazy Diagnostic Arguments
// =============================================================================

/// Argument for a diagnostic message template.
#[derive(Clone, Debug, PartialEq)]
pub enum DiagnosticArg {
    /// Formatted through `TypeFormatter` at render time.
    Type(TypeId),
    Atom(Atom),
    String(Arc<str>),
    Number(usize),
    /// Call argument types, comma separated. `None` is an untyped lambda.
    Arguments(Vec<Option<TypeId>>),
    /// Candidate signatures, capped at `CANDIDATE_DIAGNOSTIC_LIMIT`.
    Signatures(Vec<Signature>),
}

macro_rules! impl_from_diagnostic_arg {
    ($($source:ty => $variant:ident),* $(,)?) => {
        $(impl From<$source> for DiagnosticArg {
            fn from(v: $source) -> Self { Self::$variant(v) }
        })*
    };
}

impl_from_diagnostic_arg! {
    TypeId => Type,
    Atom   => Atom,
    usize  => Number,
}

impl From<&str> for DiagnosticArg {
    fn from(s: &str) -> Self {
        Self::String(s.into())
    }
}

impl From<String> for DiagnosticArg {
    fn from(s: String) -> Self {
        Self::String(s.into())
    }
}

/// A diagnostic that hasn't been rendered yet.
#[derive(Clone, Debug, PartialEq)]
pub struct PendingDiagnostic {
    pub code: u32,
    pub args: Vec<DiagnosticArg>,
    pub span: Option<Span>,
    pub severity: DiagnosticSeverity,
}

impl PendingDiagnostic {
    pub fn error(code: u32, args: Vec<DiagnosticArg>) -> Self {
        Self {
            code,
            args,
            span: None,
            severity: DiagnosticSeverity::Error,
        }
    }

    pub fn warning(code: u32, args: Vec<DiagnosticArg>) -> Self {
        Self {
            code,
            args,
            span: None,
            severity: DiagnosticSeverity::Warning,
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    /// Render into a user-facing diagnostic. A missing span falls back to
    /// `fallback`; an unknown code is a checker bug.
    pub fn render(&self, formatter: &mut TypeFormatter<'_>, fallback: Span) -> Diagnostic {
        let Some(message) = get_diagnostic_message(self.code) else {
            internal_error!("no message registered for diagnostic code {}", self.code);
        };
        let rendered: Vec<String> = self
            .args
            .iter()
            .map(|arg| match arg {
                DiagnosticArg::Type(ty) => formatter.format(*ty),
                DiagnosticArg::Atom(atom) => formatter.atom(*atom).to_string(),
                DiagnosticArg::String(s) => s.to_string(),
                DiagnosticArg::Number(n) => n.to_string(),
                DiagnosticArg::Arguments(args) => args
                    .iter()
                    .map(|arg| match arg {
                        Some(ty) => formatter.format(*ty),
                        None => "<lambda>".to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join(", "),
                DiagnosticArg::Signatures(sigs) => {
                    let mut shown: Vec<String> = sigs
                        .iter()
                        .take(CANDIDATE_DIAGNOSTIC_LIMIT)
                        .map(|sig| formatter.signature(sig))
                        .collect();
                    if sigs.len() > CANDIDATE_DIAGNOSTIC_LIMIT {
                        shown.push(format!("... {} more", sigs.len() - CANDIDATE_DIAGNOSTIC_LIMIT));
                    }
                    shown.join("; ")
                }
            })
            .collect();
        let refs: Vec<&str> = rendered.iter().map(String::as_str).collect();
        let text = format_message(message.message, &refs);
        let span = self.span.unwrap_or(fallback);
        match self.severity {
            DiagnosticSeverity::Error => Diagnostic::error(span, text, self.code),
            DiagnosticSeverity::Warning => Diagnostic::warning(span, text, self.code),
        }
    }
}

// =============================================================================
// Diagnostic Codes
// =============================================================================

/// Short aliases for the codes the solver reports. Canonical definitions
/// live in `kestrel_common::diagnostics::diagnostic_codes`.
pub mod codes {
    use kestrel_common::diagnostics::diagnostic_codes as dc;

    // Relations
    pub use dc::ARGUMENT_NOT_ASSIGNABLE_TO_PARAMETER as ARG_NOT_ASSIGNABLE;
    pub use dc::CAST_UNREACHABLE;
    pub use dc::RETURN_TYPE_MISMATCH;
    pub use dc::TYPE_NOT_ASSIGNABLE_TO_TYPE as TYPE_NOT_ASSIGNABLE;

    // Instantiation
    pub use dc::TYPE_INSTANTIATION_EXCESSIVELY_DEEP as INSTANTIATION_TOO_DEEP;
    pub use dc::TYPE_IS_NOT_GENERIC as NOT_GENERIC;
    pub use dc::TYPE_PARAMETER_CONSTRAINT_NOT_SATISFIED as CONSTRAINT_NOT_SATISFIED;
    pub use dc::WRONG_TYPE_ARGUMENT_COUNT as TYPE_ARG_COUNT_MISMATCH;

    // Calls
    pub use dc::AMBIGUOUS_CALL;
    pub use dc::EXPECTED_ARGUMENTS as ARG_COUNT_MISMATCH;
    pub use dc::LAMBDA_PARAMETER_COUNT_MISMATCH as LAMBDA_ARITY_MISMATCH;
    pub use dc::MEMBER_IS_NOT_ACCESSIBLE as MEMBER_NOT_ACCESSIBLE;
    pub use dc::NO_MATCHING_SIGNATURE;
    pub use dc::PROPERTY_DOES_NOT_EXIST_ON_TYPE as PROPERTY_NOT_FOUND;
    pub use dc::TYPE_HAS_NO_CALL_SIGNATURES as NOT_CALLABLE;
}
