//! Textual IR programs for driving the compatibility filter.
//!
//! A program is a flat list of operations in SSA order. It exists so the
//! filter can be exercised without a host framework: tests and the
//! command-line front end parse a program and hand it to the filter through
//! the [`OpAdaptor`](crate::core::OpAdaptor) implementation in [`adaptor`].
//!
//! # Format
//!
//! ```text
//! ; Comments start with semicolon
//! %x : tensor<4x8xf32>
//! %axis = pd_op.full_int_array() {value = ints[1]} : tensor<1xi64>
//! %s = pd_op.sum(%x, %axis) {keepdim = false, dtype = dtype(float32)} : tensor<4xf32>
//! pd_op.fetch(%s) {name = "out"}
//! ```
//!
//! A line `%v : T` declares an argument with no defining op. `_` in an
//! operand list is a null operand.

use std::collections::BTreeMap;
use std::fmt;

use crate::core::{CompatResult, IrAttribute, IrType};

pub mod adaptor;
pub mod parser;

pub use adaptor::{OpId, ValueId};

#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub ops: Vec<OpData>,
    pub values: Vec<ValueData>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OpData {
    /// Dialect-qualified name.
    pub name: String,
    pub operands: Vec<Option<u32>>,
    pub results: Vec<u32>,
    pub attributes: BTreeMap<String, IrAttribute>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValueData {
    pub name: String,
    pub ty: Option<IrType>,
    /// Defining op and result position; `None` for arguments.
    pub def: Option<(u32, u32)>,
    /// Consuming ops in program order, one entry per use.
    pub uses: Vec<u32>,
}

impl Program {
    pub fn new() -> Self {
        Self { ops: Vec::new(), values: Vec::new() }
    }

    pub fn parse(text: &str) -> CompatResult<Self> {
        parser::parse_program(text)
    }

    /// All ops in program order.
    pub fn op_ids(&self) -> impl Iterator<Item = OpId> + '_ {
        (0..self.ops.len() as u32).map(OpId)
    }

    /// First op with the given dialect-qualified name.
    pub fn find_op(&self, name: &str) -> Option<OpId> {
        self.ops.iter().position(|op| op.name == name).map(|i| OpId(i as u32))
    }

    /// Op defining the named value.
    pub fn op_defining(&self, value_name: &str) -> Option<OpId> {
        let val = self.value(value_name)?;
        self.values[val.0 as usize].def.map(|(op, _)| OpId(op))
    }

    pub fn value(&self, name: &str) -> Option<ValueId> {
        self.values.iter().position(|v| v.name == name).map(|i| ValueId(i as u32))
    }

    pub fn value_data(&self, id: ValueId) -> &ValueData {
        &self.values[id.0 as usize]
    }

    fn write_value_list(&self, f: &mut fmt::Formatter<'_>, ids: &[u32]) -> fmt::Result {
        for (i, id) in ids.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "%{}", self.values[*id as usize].name)?;
        }
        Ok(())
    }
}

impl Default for Program {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for val in self.values.iter().filter(|v| v.def.is_none()) {
            match &val.ty {
                Some(ty) => writeln!(f, "%{} : {}", val.name, ty)?,
                None => writeln!(f, "%{}", val.name)?,
            }
        }

        for op in &self.ops {
            if !op.results.is_empty() {
                self.write_value_list(f, &op.results)?;
                f.write_str(" = ")?;
            }
            write!(f, "{}(", op.name)?;
            for (i, operand) in op.operands.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                match operand {
                    Some(id) => write!(f, "%{}", self.values[*id as usize].name)?,
                    None => f.write_str("_")?,
                }
            }
            f.write_str(")")?;

            if !op.attributes.is_empty() {
                f.write_str(" {")?;
                for (i, (key, attr)) in op.attributes.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key} = {attr}")?;
                }
                f.write_str("}")?;
            }

            if !op.results.is_empty() {
                f.write_str(" : ")?;
                for (i, id) in op.results.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    match &self.values[*id as usize].ty {
                        Some(ty) => write!(f, "{ty}")?,
                        None => f.write_str("?")?,
                    }
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
