//! Backend operator registry.
//!
//! Every operator the backend can compile is registered here under its
//! canonical name, optionally together with its fusion pattern kind. The
//! compatibility filter consults the registry for two things: whether a
//! canonical name is known at all, and which [`OpPatternKind`] the fusion pass
//! should treat it as.

use std::fmt;

use hashbrown::HashMap;

/// Fusion-pattern classification of an operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OpPatternKind {
    ElementWise,
    Broadcast,
    Injective,
    Reduction,
    OutFusible,
    NonFusible,
}

impl OpPatternKind {
    pub const fn name(self) -> &'static str {
        match self {
            OpPatternKind::ElementWise => "elementwise",
            OpPatternKind::Broadcast => "broadcast",
            OpPatternKind::Injective => "injective",
            OpPatternKind::Reduction => "reduction",
            OpPatternKind::OutFusible => "out_fusible",
            OpPatternKind::NonFusible => "non_fusible",
        }
    }
}

impl fmt::Display for OpPatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// Unary math ops fuse as plain elementwise.
const ELEMENTWISE_OPS: &[&str] = &[
    "abs", "exp", "log", "sqrt", "rsqrt", "relu", "sigmoid", "tanh", "negative", "sin", "cos",
    "floor", "ceil", "round", "sign", "erf", "scale", "cast", "select", "fill_constant",
    "logical_not", "isnan", "isinf", "identity", "assign", "dropout", "batch_norm",
    "batch_norm_grad",
];

// Binary ops are registered as broadcast so shape inference handles mismatched ranks.
const BROADCAST_OPS: &[&str] = &[
    "broadcast_to", "elementwise_add", "elementwise_sub", "elementwise_mul", "elementwise_div",
    "pow", "max", "min", "equal", "not_equal", "greater_than", "greater_equal", "less_than",
    "less_equal", "logical_and", "logical_or", "bitwise_and", "bitwise_or", "remainder",
];

const INJECTIVE_OPS: &[&str] = &[
    "reshape", "transpose", "slice", "concat", "split", "gather", "squeeze", "expand_dims",
    "arange", "reverse", "flip",
];

const REDUCTION_OPS: &[&str] = &[
    "reduce_sum", "reduce_max", "reduce_min", "reduce_prod", "reduce_all", "reduce_any",
];

const OUT_FUSIBLE_OPS: &[&str] = &["matmul", "mul", "conv2d", "conv2d_grad", "pool2d"];

const NON_FUSIBLE_OPS: &[&str] = &[
    "sort", "argsort", "argmax", "argmin", "top_k", "uniform_random", "gaussian_random",
    "randint", "cholesky", "one_hot", "cumsum",
];

/// Registry of backend operators keyed by canonical name.
#[derive(Debug, Clone, Default)]
pub struct OperatorRegistry {
    /// Canonical name to pattern kind, `None` for operators without one.
    ops: HashMap<String, Option<OpPatternKind>>,
}

impl OperatorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry populated with the backend's built-in operators.
    pub fn with_builtin_ops() -> Self {
        let mut registry = Self::new();
        let groups = [
            (ELEMENTWISE_OPS, OpPatternKind::ElementWise),
            (BROADCAST_OPS, OpPatternKind::Broadcast),
            (INJECTIVE_OPS, OpPatternKind::Injective),
            (REDUCTION_OPS, OpPatternKind::Reduction),
            (OUT_FUSIBLE_OPS, OpPatternKind::OutFusible),
            (NON_FUSIBLE_OPS, OpPatternKind::NonFusible),
        ];
        for (names, kind) in groups {
            for name in names {
                registry.register_with_pattern(name, kind);
            }
        }
        // Lowered through an external kernel, so the fusion pass never sees a pattern.
        registry.register("custom_call");
        registry
    }

    /// Register an operator without a pattern kind.
    pub fn register(&mut self, name: &str) -> &mut Self {
        self.ops.insert(name.to_string(), None);
        self
    }

    /// Register an operator with its pattern kind, replacing any previous entry.
    pub fn register_with_pattern(&mut self, name: &str, kind: OpPatternKind) -> &mut Self {
        self.ops.insert(name.to_string(), Some(kind));
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.ops.contains_key(name)
    }

    /// Pattern kind of a registered operator, `None` when unregistered or unset.
    pub fn pattern_kind(&self, name: &str) -> Option<OpPatternKind> {
        self.ops.get(name).copied().flatten()
    }
}
