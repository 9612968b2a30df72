// This module gathers the compatibility layer's building blocks: the closed IR type and
// attribute variants with their backend counterparts, the OpAdaptor trait through which the
// host graph is read, the backend operator registry with fusion pattern kinds, the static
// name-translation table, the allow/deny configuration, the op mapper hooks, arena-backed name
// generation and the CompatibilityFilter that ties them together.

//! Core compatibility infrastructure.
//!
//! # Key Components
//!
//! - [`CompatibilityFilter`] decides support and converts names, attributes,
//!   types and pattern kinds.
//! - [`OpAdaptor`] is the read-only view of the host IR.
//! - [`OperatorRegistry`] lists backend operators and their [`OpPatternKind`].
//! - [`FilterConfig`] carries the allow/deny lists.
//! - [`NameContext`] generates kernel, group and value names in an arena.

pub mod adaptor;
pub mod attributes;
pub mod config;
pub mod error;
pub mod filter;
pub mod mapper;
pub mod names;
pub mod registry;
pub mod session;
pub mod types;

pub use adaptor::OpAdaptor;

pub use attributes::{
    convert_attribute,
    Attribute,
    AttributeMap,
    IrAttribute,
    Place,
    ScalarList,
};

pub use config::{FilterConfig, ALLOW_OPS_ENV, DENY_OPS_ENV};

pub use error::{CompatError, CompatResult};

pub use filter::{
    broadcast_axes,
    shape_product,
    CompatibilityFilter,
    STOP_GRADIENT_ATTR,
    VALUE_NAME_PREFIX,
};

pub use mapper::{DefaultOpMapper, MapperKind, NoOpMapper, OpMapper};

pub use registry::{OpPatternKind, OperatorRegistry};

pub use session::NameContext;

pub use types::{BackendType, DataType, IrType, ScalarKind, TensorType};
