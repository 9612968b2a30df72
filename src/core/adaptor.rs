// This module defines the OpAdaptor trait, the read-only bridge between opcompat and the host
// IR graph. The compatibility filter never owns or mutates IR; it asks the adaptor for an
// operation's dialect-qualified name, its operands and results, its attributes, the type of
// each value, the operations consuming a value and the operation defining it. Associated
// reference types keep the trait independent of how the host stores its graph. The textual
// Program in crate::program implements it for tests and the command-line front end.

//! OpAdaptor responsibilities.
//!
//! The adaptor exposes the IR structure the filter needs and nothing more:
//! - Reference types for operations and values.
//! - Operation name, operands (possibly null), results and attributes.
//! - Value types, uses in program order and defining operations.
//! - A dense per-value index used for stable value naming.

use super::attributes::IrAttribute;
use super::types::IrType;

/// Read-only view of an IR graph.
pub trait OpAdaptor {
    type OpRef: Copy + Eq + std::hash::Hash + std::fmt::Debug;
    type ValueRef: Copy + Eq + std::hash::Hash + std::fmt::Debug;

    /// Dialect-qualified operation name, e.g. `pd_op.sum`.
    fn op_name(&self, op: Self::OpRef) -> &str;

    /// Operands in order. `None` marks a null operand slot.
    fn op_operands(&self, op: Self::OpRef) -> Box<dyn Iterator<Item = Option<Self::ValueRef>> + '_>;

    /// Results in order.
    fn op_results(&self, op: Self::OpRef) -> Box<dyn Iterator<Item = Self::ValueRef> + '_>;

    /// Attributes of the operation.
    fn op_attributes(&self, op: Self::OpRef) -> Box<dyn Iterator<Item = (&str, &IrAttribute)> + '_>;

    /// Single attribute lookup.
    fn op_attribute(&self, op: Self::OpRef, name: &str) -> Option<&IrAttribute> {
        self.op_attributes(op)
            .find(|(key, _)| *key == name)
            .map(|(_, attr)| attr)
    }

    /// Type of a value, if it has one.
    fn value_type(&self, val: Self::ValueRef) -> Option<&IrType>;

    /// Operations consuming a value, first use first.
    fn value_uses(&self, val: Self::ValueRef) -> Box<dyn Iterator<Item = Self::OpRef> + '_>;

    /// Operation producing the value, `None` for block arguments.
    fn defining_op(&self, val: Self::ValueRef) -> Option<Self::OpRef>;

    /// Dense index of the value, unique within the graph.
    fn value_index(&self, val: Self::ValueRef) -> usize;

    fn value_first_use(&self, val: Self::ValueRef) -> Option<Self::OpRef> {
        self.value_uses(val).next()
    }

    fn value_use_count(&self, val: Self::ValueRef) -> usize {
        self.value_uses(val).count()
    }

    /// Result at the given position.
    fn op_result(&self, op: Self::OpRef, idx: usize) -> Option<Self::ValueRef> {
        self.op_results(op).nth(idx)
    }

    /// Operand at the given position, `None` when out of range or null.
    fn op_operand(&self, op: Self::OpRef, idx: usize) -> Option<Self::ValueRef> {
        self.op_operands(op).nth(idx).flatten()
    }
}
