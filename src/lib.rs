//! Kestrel type-checking engine.
//!
//! The work is split across the workspace crates:
//! - `kestrel-common` - atoms, spans, limits and the diagnostic message table
//! - `kestrel-solver` - the type model, relations, instantiation and
//!   signature resolution
//! - `kestrel-checker` - function-body checking with smart casts
//!
//! This crate re-exports their entry points and adds [`CheckSession`],
//! configuration loading and tracing setup.

use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

pub mod config;
pub mod tracing_config;

pub use kestrel_checker::ast;
pub use kestrel_checker::{
    CheckResult, CheckerOptions, ScopeKind, ScopeTable, VarKind, check_program,
};
pub use kestrel_common::diagnostics::{Diagnostic, diagnostic_codes};
pub use kestrel_common::{Atom, Span};
pub use kestrel_solver::{
    ClassBuilder, ParamInfo, Signature, SignatureFlags, TypeEnvironment, TypeId,
};

struct SessionState {
    env: TypeEnvironment,
    options: CheckerOptions,
    runs: usize,
}

/// One type environment shared by successive checking runs.
///
/// Every operation holds the session lock for its whole duration, so a
/// driver checking several modules from different threads gets one run at a
/// time against a consistent environment.
pub struct CheckSession {
    state: Mutex<SessionState>,
}

impl CheckSession {
    pub fn new(options: CheckerOptions) -> Self {
        CheckSession {
            state: Mutex::new(SessionState {
                env: TypeEnvironment::new(),
                options,
                runs: 0,
            }),
        }
    }

    /// Session configured from a `kestrel.json` file.
    pub fn from_config_file(path: &Path) -> anyhow::Result<Self> {
        Ok(Self::new(config::load_options(path)?))
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        // A panic inside a run leaves only append-only caches behind.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` against the environment, e.g. to declare classes and
    /// functions before checking.
    pub fn with_env<R>(&self, f: impl FnOnce(&TypeEnvironment) -> R) -> R {
        f(&self.lock().env)
    }

    pub fn options(&self) -> CheckerOptions {
        self.lock().options.clone()
    }

    pub fn set_options(&self, options: CheckerOptions) {
        self.lock().options = options;
    }

    /// Number of completed `check` calls.
    pub fn runs(&self) -> usize {
        self.lock().runs
    }

    pub fn check(&self, scopes: &ScopeTable, program: &ast::Program) -> CheckResult {
        let mut state = self.lock();
        let result = check_program(&state.env, scopes, state.options.clone(), program);
        state.runs += 1;
        debug!(
            run = state.runs,
            diagnostics = result.diagnostics.len(),
            "session check finished"
        );
        result
    }
}

impl Default for CheckSession {
    fn default() -> Self {
        Self::new(CheckerOptions::default())
    }
}
