//! Dialect op name to backend canonical name translation.
//!
//! Ops listed here are known to the backend under a different name. Every
//! other op is canonicalized by stripping its dialect prefix and looked up in
//! the operator registry.

use std::sync::OnceLock;

use hashbrown::HashMap;

const OP_NAMES: &[(&str, &str)] = &[
    ("pd_op.full", "fill_constant"),
    ("pd_op.sum", "reduce_sum"),
    ("pd_op.max", "reduce_max"),
    ("pd_op.add", "elementwise_add"),
    ("pd_op.elementwise_pow", "pow"),
    ("pd_op.multiply", "elementwise_mul"),
    ("pd_op.maximum", "max"),
    ("pd_op.minimum", "min"),
    ("pd_op.reshape", "reshape"),
    ("pd_op.squeeze", "reshape"),
    ("pd_op.unsqueeze", "reshape"),
    ("pd_op.split_with_num", "split"),
    ("pd_op.expand", "broadcast_to"),
    ("cinn_op.generate_shape", "generate_shape"),
    ("cinn_op.broadcast", "broadcast_to"),
];

/// Dialect-qualified name of the constant-fill op.
pub const FULL_OP: &str = "pd_op.full";

fn table() -> &'static HashMap<&'static str, &'static str> {
    static TABLE: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    TABLE.get_or_init(|| OP_NAMES.iter().copied().collect())
}

/// Translated name for a dialect-qualified op name, if it has one.
pub fn translate(op_name: &str) -> Option<&'static str> {
    table().get(op_name).copied()
}

/// Whether the dialect-qualified name has a translation entry.
pub fn is_translated(op_name: &str) -> bool {
    table().contains_key(op_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate() {
        assert_eq!(translate("pd_op.sum"), Some("reduce_sum"));
        assert_eq!(translate("pd_op.unsqueeze"), Some("reshape"));
        assert_eq!(translate("cinn_op.broadcast"), Some("broadcast_to"));
        assert_eq!(translate("pd_op.abs"), None);
        assert!(is_translated(FULL_OP));
    }
}
