//! [`OpAdaptor`] implementation for [`Program`].

use super::Program;
use crate::core::{IrAttribute, IrType, OpAdaptor};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OpId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ValueId(pub u32);

impl OpAdaptor for Program {
    type OpRef = OpId;
    type ValueRef = ValueId;

    fn op_name(&self, op: OpId) -> &str {
        &self.ops[op.0 as usize].name
    }

    fn op_operands(&self, op: OpId) -> Box<dyn Iterator<Item = Option<ValueId>> + '_> {
        Box::new(
            self.ops[op.0 as usize]
                .operands
                .iter()
                .map(|operand| operand.map(ValueId)),
        )
    }

    fn op_results(&self, op: OpId) -> Box<dyn Iterator<Item = ValueId> + '_> {
        Box::new(self.ops[op.0 as usize].results.iter().map(|&id| ValueId(id)))
    }

    fn op_attributes(&self, op: OpId) -> Box<dyn Iterator<Item = (&str, &IrAttribute)> + '_> {
        Box::new(
            self.ops[op.0 as usize]
                .attributes
                .iter()
                .map(|(key, attr)| (key.as_str(), attr)),
        )
    }

    fn op_attribute(&self, op: OpId, name: &str) -> Option<&IrAttribute> {
        self.ops[op.0 as usize].attributes.get(name)
    }

    fn value_type(&self, val: ValueId) -> Option<&IrType> {
        self.values[val.0 as usize].ty.as_ref()
    }

    fn value_uses(&self, val: ValueId) -> Box<dyn Iterator<Item = OpId> + '_> {
        Box::new(self.values[val.0 as usize].uses.iter().map(|&op| OpId(op)))
    }

    fn defining_op(&self, val: ValueId) -> Option<OpId> {
        self.values[val.0 as usize].def.map(|(op, _)| OpId(op))
    }

    fn value_index(&self, val: ValueId) -> usize {
        val.0 as usize
    }

    fn value_use_count(&self, val: ValueId) -> usize {
        self.values[val.0 as usize].uses.len()
    }
}
