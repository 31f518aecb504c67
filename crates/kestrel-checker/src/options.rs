//! Checker configuration.

use kestrel_common::limits;
use serde::{Deserialize, Serialize};

/// Options that affect a checking run.
///
/// Deserialized from camelCase JSON; missing keys take their defaults.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct CheckerOptions {
    /// Keep warning diagnostics in the result.
    pub report_warnings: bool,
    /// Narrow variables along control flow. When off every read sees the
    /// declared type.
    pub smart_casts: bool,
    /// Resolve a call with a union argument once per union member instead of
    /// reporting "no matching signature".
    pub allow_union_splitting: bool,
    /// Nesting limit for generic type annotations.
    pub max_instantiation_depth: u32,
}

impl Default for CheckerOptions {
    fn default() -> Self {
        CheckerOptions {
            report_warnings: true,
            smart_casts: true,
            allow_union_splitting: false,
            max_instantiation_depth: limits::MAX_INSTANTIATION_DEPTH,
        }
    }
}
