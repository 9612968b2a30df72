//! opcompat - operator compatibility for an AST-based kernel compiler.
//!
//! Given operations of a tensor IR, opcompat decides which of them may be
//! handed to the backend compiler and, for those, produces the backend's
//! canonical operator name, converted attributes, scalar kinds and fusion
//! pattern kinds.
//!
//! # Primary Usage
//!
//! ```
//! use opcompat::core::{CompatibilityFilter, FilterConfig, OperatorRegistry};
//! use opcompat::program::Program;
//!
//! let program = Program::parse(
//!     "%x : tensor<4x8xf32>\n%y = pd_op.abs(%x) : tensor<4x8xf32>\n",
//! )
//! .unwrap();
//! let registry = OperatorRegistry::with_builtin_ops();
//! let filter = CompatibilityFilter::new(FilterConfig::default(), &registry);
//!
//! let abs = program.find_op("pd_op.abs").unwrap();
//! assert!(filter.is_supported(&program, abs));
//! assert_eq!(filter.canonical_name(&program, abs).unwrap(), "abs");
//! ```
//!
//! # Architecture
//!
//! - [`core`] - Filter, registry, configuration and conversion tables
//! - [`program`] - Textual IR used by tests and the command-line front end

pub mod core;
pub mod program;

pub use self::core::{
    // Filter
    CompatibilityFilter, FilterConfig, OpAdaptor,
    // Registry
    OperatorRegistry, OpPatternKind,
    // Conversion results
    Attribute, AttributeMap, BackendType, ScalarList,
    // IR view
    IrAttribute, IrType, ScalarKind,
    // Errors
    CompatError, CompatResult,
};
pub use program::Program;
