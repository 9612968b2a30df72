//! Per-op customization of operands and attributes.
//!
//! Some IR ops carry information the backend expects in a different place.
//! A reduce op takes its axes as a second operand produced by a constant
//! int-array op, while the backend wants them as a `dim` attribute and only
//! consumes the data operand. A broadcast op needs its target shape and the
//! axis mapping spelled out. An [`OpMapper`] performs those rewrites after the
//! generic attribute conversion.

use log::{trace, warn};

use super::adaptor::OpAdaptor;
use super::attributes::{Attribute, AttributeMap, IrAttribute};
use super::filter::broadcast_axes;

/// Which part of an op a mapper customizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapperKind {
    Operand,
    Attribute,
}

/// Hook for op-specific operand and attribute handling.
pub trait OpMapper {
    /// Whether this mapper customizes the given part of `op`.
    fn has<A: OpAdaptor>(&self, adaptor: &A, op: A::OpRef, kind: MapperKind) -> bool;

    /// Operands the backend actually consumes.
    fn real_operand_sources<A: OpAdaptor>(&self, adaptor: &A, op: A::OpRef) -> Vec<A::ValueRef>;

    /// Append or override backend attributes after the generic conversion.
    fn append_variant_attrs<A: OpAdaptor>(&self, adaptor: &A, op: A::OpRef, attrs: &mut AttributeMap);
}

/// Mapper that customizes nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpMapper;

impl OpMapper for NoOpMapper {
    fn has<A: OpAdaptor>(&self, _adaptor: &A, _op: A::OpRef, _kind: MapperKind) -> bool {
        false
    }

    fn real_operand_sources<A: OpAdaptor>(&self, adaptor: &A, op: A::OpRef) -> Vec<A::ValueRef> {
        adaptor.op_operands(op).flatten().collect()
    }

    fn append_variant_attrs<A: OpAdaptor>(&self, _adaptor: &A, _op: A::OpRef, _attrs: &mut AttributeMap) {}
}

const REDUCE_OPS: &[&str] = &["pd_op.sum", "pd_op.max"];
const BROADCAST_OPS: &[&str] = &["pd_op.expand", "cinn_op.broadcast"];

/// Mapper for the reduce and broadcast ops the backend needs reshaped.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultOpMapper;

impl DefaultOpMapper {
    /// Reduce axes, taken from the constant producer of operand 1 or, failing
    /// that, from an `axis` attribute on the op itself.
    fn reduce_axes<A: OpAdaptor>(adaptor: &A, op: A::OpRef) -> Option<Vec<i32>> {
        let from_producer = adaptor
            .op_operand(op, 1)
            .and_then(|axis| adaptor.defining_op(axis))
            .and_then(|producer| adaptor.op_attribute(producer, "value"));
        match from_producer.or_else(|| adaptor.op_attribute(op, "axis"))? {
            IrAttribute::IntArray(values) => Some(values.iter().map(|&v| v as i32).collect()),
            IrAttribute::Array(items) => items
                .iter()
                .map(|item| match item {
                    IrAttribute::Int32(v) => Some(*v),
                    IrAttribute::Int64(v) => Some(*v as i32),
                    _ => None,
                })
                .collect(),
            _ => None,
        }
    }

    fn append_reduce_attrs<A: OpAdaptor>(adaptor: &A, op: A::OpRef, attrs: &mut AttributeMap) {
        match Self::reduce_axes(adaptor, op) {
            Some(dim) => {
                attrs.insert("dim".to_string(), Attribute::from(dim));
            }
            None => warn!("{}: reduce axes are not a constant int array", adaptor.op_name(op)),
        }
        let keep_dim = matches!(adaptor.op_attribute(op, "keepdim"), Some(IrAttribute::Bool(true)));
        attrs.insert("keep_dim".to_string(), Attribute::Bool(keep_dim));
    }

    fn append_broadcast_attrs<A: OpAdaptor>(adaptor: &A, op: A::OpRef, attrs: &mut AttributeMap) {
        let dims_of = |val: Option<A::ValueRef>| -> Option<Vec<i64>> {
            let ty = adaptor.value_type(val?)?;
            ty.as_dense_tensor().map(|t| t.dims.clone())
        };
        let (Some(in_shape), Some(out_shape)) =
            (dims_of(adaptor.op_operand(op, 0)), dims_of(adaptor.op_result(op, 0)))
        else {
            warn!("{}: broadcast operand or result is not a dense tensor", adaptor.op_name(op));
            return;
        };

        let axes = broadcast_axes(&in_shape, &out_shape);
        attrs.insert(
            "broadcast_axes".to_string(),
            Attribute::from(axes.iter().map(|&a| a as i32).collect::<Vec<_>>()),
        );
        attrs.insert(
            "out_shape".to_string(),
            Attribute::from(out_shape.iter().map(|&d| d as i32).collect::<Vec<_>>()),
        );
    }
}

impl OpMapper for DefaultOpMapper {
    fn has<A: OpAdaptor>(&self, adaptor: &A, op: A::OpRef, kind: MapperKind) -> bool {
        let name = adaptor.op_name(op);
        match kind {
            MapperKind::Operand => REDUCE_OPS.contains(&name),
            MapperKind::Attribute => REDUCE_OPS.contains(&name) || BROADCAST_OPS.contains(&name),
        }
    }

    fn real_operand_sources<A: OpAdaptor>(&self, adaptor: &A, op: A::OpRef) -> Vec<A::ValueRef> {
        if REDUCE_OPS.contains(&adaptor.op_name(op)) {
            return adaptor.op_operand(op, 0).into_iter().collect();
        }
        adaptor.op_operands(op).flatten().collect()
    }

    fn append_variant_attrs<A: OpAdaptor>(&self, adaptor: &A, op: A::OpRef, attrs: &mut AttributeMap) {
        let name = adaptor.op_name(op);
        trace!("append variant attrs for {}", name);
        if REDUCE_OPS.contains(&name) {
            Self::append_reduce_attrs(adaptor, op, attrs);
        } else if BROADCAST_OPS.contains(&name) {
            Self::append_broadcast_attrs(adaptor, op, attrs);
        }
    }
}
