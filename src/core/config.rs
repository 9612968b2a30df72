//! Filter configuration.
//!
//! The allow and deny lists are semicolon-delimited operator names. They are
//! parsed once into a [`FilterConfig`] that is handed to the filter at
//! construction, so tests can build arbitrary configurations without touching
//! process state. The built-in deny set and denied-parameter map are fixed.

use std::env;

use hashbrown::{HashMap, HashSet};

/// Environment variable holding the allow list.
pub const ALLOW_OPS_ENV: &str = "OPCOMPAT_ALLOW_OPS";
/// Environment variable holding the deny list.
pub const DENY_OPS_ENV: &str = "OPCOMPAT_DENY_OPS";

const DELIM: char = ';';

const DEFAULT_DENY_OPS: &[&str] = &["feed", "fetch", "conv2d", "conv2d_grad", "dropout", "matmul"];

const DENY_PARAM_COND: &[(&str, &[&str])] = &[
    ("batch_norm", &["ReserveSpace"]),
    ("batch_norm_grad", &["ReserveSpace"]),
];

/// Split a delimited op list, dropping empty entries.
pub fn split_op_list(list: &str) -> HashSet<String> {
    list.split(DELIM)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Render a set of op names for diagnostics, sorted for stable output.
pub fn debug_info(names: &HashSet<String>) -> String {
    let mut sorted: Vec<&str> = names.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    format!("[{}]", sorted.join(", "))
}

/// Allow/deny configuration for the compatibility filter.
#[derive(Debug, Clone)]
pub struct FilterConfig {
    allow_ops: HashSet<String>,
    deny_ops: HashSet<String>,
    default_deny_ops: HashSet<String>,
    deny_param_cond: HashMap<String, HashSet<String>>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self::from_lists("", "")
    }
}

impl FilterConfig {
    /// Build a configuration from semicolon-delimited allow and deny lists.
    pub fn from_lists(allow: &str, deny: &str) -> Self {
        Self {
            allow_ops: split_op_list(allow),
            deny_ops: split_op_list(deny),
            default_deny_ops: DEFAULT_DENY_OPS.iter().map(|s| s.to_string()).collect(),
            deny_param_cond: DENY_PARAM_COND
                .iter()
                .map(|(op, params)| {
                    (op.to_string(), params.iter().map(|p| p.to_string()).collect())
                })
                .collect(),
        }
    }

    /// Build a configuration from [`ALLOW_OPS_ENV`] and [`DENY_OPS_ENV`].
    /// Unset variables count as empty lists.
    pub fn from_env() -> Self {
        let allow = env::var(ALLOW_OPS_ENV).unwrap_or_default();
        let deny = env::var(DENY_OPS_ENV).unwrap_or_default();
        Self::from_lists(&allow, &deny)
    }

    pub fn allow_ops(&self) -> &HashSet<String> {
        &self.allow_ops
    }

    pub fn deny_ops(&self) -> &HashSet<String> {
        &self.deny_ops
    }

    pub fn is_default_denied(&self, canonical: &str) -> bool {
        self.default_deny_ops.contains(canonical)
    }

    /// Attribute names that disqualify the given canonical op.
    pub fn denied_params(&self, canonical: &str) -> Option<&HashSet<String>> {
        self.deny_param_cond.get(canonical)
    }

    /// Apply the allow/deny gating to an already computed base decision.
    ///
    /// A non-empty allow list alone decides; otherwise a non-empty deny list
    /// decides; otherwise the base decision stands.
    pub fn gate(&self, canonical: &str, base_supported: bool) -> bool {
        if !self.allow_ops.is_empty() {
            return base_supported && self.allow_ops.contains(canonical);
        }
        if !self.deny_ops.is_empty() {
            return base_supported && !self.deny_ops.contains(canonical);
        }
        base_supported
    }
}
