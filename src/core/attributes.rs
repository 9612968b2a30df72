// This module holds both sides of attribute conversion. IrAttribute is the closed set of
// attribute kinds an IR operation can carry: the numeric and string scalars, symbolic-shape
// symbols, int arrays, data types, device places, generic arrays and type-valued attributes.
// Attribute is what the backend builder consumes: a scalar or a homogeneous list of one of the
// numeric scalar kinds. convert_attribute maps the former onto the latter. A symbolic-shape
// attribute and an empty array convert to nothing at all; arrays with an element kind the
// backend has no list for, and type-valued attributes, are conversion errors.

//! Source and backend attribute representations.

use std::collections::BTreeMap;
use std::fmt::{self, Write};

use super::error::{CompatError, CompatResult};
use super::types::{DataType, IrType};

/// Device an operation is pinned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Place {
    Cpu,
    Gpu(u32),
    GpuPinned,
    Xpu(u32),
}

impl fmt::Display for Place {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Place::Cpu => f.write_str("cpu"),
            Place::Gpu(id) => write!(f, "gpu:{id}"),
            Place::GpuPinned => f.write_str("gpu_pinned"),
            Place::Xpu(id) => write!(f, "xpu:{id}"),
        }
    }
}

/// Attribute value as stored on an IR operation.
#[derive(Debug, Clone, PartialEq)]
pub enum IrAttribute {
    Bool(bool),
    Float(f32),
    Double(f64),
    Int32(i32),
    Int64(i64),
    Str(String),
    /// Symbolic dimension produced by shape analysis.
    Symbol(String),
    IntArray(Vec<i64>),
    DataType(DataType),
    Place(Place),
    Array(Vec<IrAttribute>),
    Type(IrType),
}

impl IrAttribute {
    /// Short kind name for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            IrAttribute::Bool(_) => "bool",
            IrAttribute::Float(_) => "float",
            IrAttribute::Double(_) => "double",
            IrAttribute::Int32(_) => "int32",
            IrAttribute::Int64(_) => "int64",
            IrAttribute::Str(_) => "str",
            IrAttribute::Symbol(_) => "symbol",
            IrAttribute::IntArray(_) => "int_array",
            IrAttribute::DataType(_) => "data_type",
            IrAttribute::Place(_) => "place",
            IrAttribute::Array(_) => "array",
            IrAttribute::Type(_) => "type",
        }
    }
}

/// Quoted string using only the escapes the program parser reads back.
fn write_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_char('"')?;
    for ch in s.chars() {
        match ch {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\t' => f.write_str("\\t")?,
            '\r' => f.write_str("\\r")?,
            '\0' => f.write_str("\\0")?,
            c if c.is_control() => write!(f, "\\u{{{:x}}}", c as u32)?,
            c => f.write_char(c)?,
        }
    }
    f.write_char('"')
}

impl fmt::Display for IrAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IrAttribute::Bool(v) => write!(f, "{v}"),
            IrAttribute::Float(v) => write!(f, "{v:?} : f32"),
            IrAttribute::Double(v) => write!(f, "{v:?} : f64"),
            IrAttribute::Int32(v) => write!(f, "{v} : i32"),
            IrAttribute::Int64(v) => write!(f, "{v} : i64"),
            IrAttribute::Str(s) => write_quoted(f, s),
            IrAttribute::Symbol(s) => write!(f, "sym({s})"),
            IrAttribute::IntArray(values) => write!(f, "ints{values:?}"),
            IrAttribute::DataType(dtype) => write!(f, "dtype({dtype})"),
            IrAttribute::Place(place) => write!(f, "place({place})"),
            IrAttribute::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            IrAttribute::Type(ty) => write!(f, "type({ty})"),
        }
    }
}

/// Homogeneous list of one numeric scalar kind.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarList {
    Bool(Vec<bool>),
    I32(Vec<i32>),
    I64(Vec<i64>),
    F32(Vec<f32>),
    F64(Vec<f64>),
}

/// Attribute value as consumed by the backend builder.
#[derive(Debug, Clone, PartialEq)]
pub enum Attribute {
    Bool(bool),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Str(String),
    List(ScalarList),
}

impl From<Vec<i32>> for Attribute {
    fn from(v: Vec<i32>) -> Self {
        Attribute::List(ScalarList::I32(v))
    }
}

fn write_list<T: fmt::Debug>(f: &mut fmt::Formatter<'_>, items: &[T], suffix: &str) -> fmt::Result {
    write!(f, "{items:?} : {suffix}")
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attribute::Bool(v) => write!(f, "{v}"),
            Attribute::I32(v) => write!(f, "{v} : i32"),
            Attribute::I64(v) => write!(f, "{v} : i64"),
            Attribute::F32(v) => write!(f, "{v:?} : f32"),
            Attribute::F64(v) => write!(f, "{v:?} : f64"),
            Attribute::Str(s) => write!(f, "{s:?}"),
            Attribute::List(ScalarList::Bool(v)) => write_list(f, v, "bool"),
            Attribute::List(ScalarList::I32(v)) => write_list(f, v, "i32"),
            Attribute::List(ScalarList::I64(v)) => write_list(f, v, "i64"),
            Attribute::List(ScalarList::F32(v)) => write_list(f, v, "f32"),
            Attribute::List(ScalarList::F64(v)) => write_list(f, v, "f64"),
        }
    }
}

/// Converted attributes keyed by attribute name.
pub type AttributeMap = BTreeMap<String, Attribute>;

fn collect_list<T>(
    items: &[IrAttribute],
    pick: impl Fn(&IrAttribute) -> Option<T>,
) -> CompatResult<Vec<T>> {
    items
        .iter()
        .map(|item| {
            pick(item).ok_or_else(|| CompatError::UnsupportedArrayElement {
                kind: format!("mixed array element {}", item.kind_name()),
            })
        })
        .collect()
}

fn convert_array(items: &[IrAttribute]) -> CompatResult<Option<Attribute>> {
    let Some(first) = items.first() else {
        return Ok(None);
    };
    let list = match first {
        IrAttribute::Int32(_) => ScalarList::I32(collect_list(items, |a| match a {
            IrAttribute::Int32(v) => Some(*v),
            _ => None,
        })?),
        IrAttribute::Int64(_) => ScalarList::I64(collect_list(items, |a| match a {
            IrAttribute::Int64(v) => Some(*v),
            _ => None,
        })?),
        IrAttribute::Bool(_) => ScalarList::Bool(collect_list(items, |a| match a {
            IrAttribute::Bool(v) => Some(*v),
            _ => None,
        })?),
        IrAttribute::Float(_) => ScalarList::F32(collect_list(items, |a| match a {
            IrAttribute::Float(v) => Some(*v),
            _ => None,
        })?),
        IrAttribute::Double(_) => ScalarList::F64(collect_list(items, |a| match a {
            IrAttribute::Double(v) => Some(*v),
            _ => None,
        })?),
        other => {
            return Err(CompatError::UnsupportedArrayElement {
                kind: other.kind_name().to_string(),
            })
        }
    };
    Ok(Some(Attribute::List(list)))
}

/// Converts one IR attribute into its backend form.
///
/// Returns `Ok(None)` for attributes the backend does not need: symbolic
/// shape symbols and empty arrays. Int arrays are narrowed to `i32`.
pub fn convert_attribute(src: &IrAttribute) -> CompatResult<Option<Attribute>> {
    let dst = match src {
        IrAttribute::Bool(v) => Attribute::Bool(*v),
        IrAttribute::Float(v) => Attribute::F32(*v),
        IrAttribute::Double(v) => Attribute::F64(*v),
        IrAttribute::Int32(v) => Attribute::I32(*v),
        IrAttribute::Int64(v) => Attribute::I64(*v),
        IrAttribute::Str(s) => Attribute::Str(s.clone()),
        IrAttribute::Symbol(_) => return Ok(None),
        IrAttribute::IntArray(values) => {
            Attribute::List(ScalarList::I32(values.iter().map(|&v| v as i32).collect()))
        }
        IrAttribute::DataType(dtype) => Attribute::Str(dtype.name().to_string()),
        IrAttribute::Array(items) => return convert_array(items),
        IrAttribute::Place(_) | IrAttribute::Type(_) => {
            return Err(CompatError::UnknownAttribute { attr: src.to_string() })
        }
    };
    Ok(Some(dst))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::ScalarKind;

    #[test]
    fn test_scalar_conversion() {
        assert_eq!(convert_attribute(&IrAttribute::Bool(true)).unwrap(), Some(Attribute::Bool(true)));
        assert_eq!(convert_attribute(&IrAttribute::Float(0.5)).unwrap(), Some(Attribute::F32(0.5)));
        assert_eq!(convert_attribute(&IrAttribute::Double(2.0)).unwrap(), Some(Attribute::F64(2.0)));
        assert_eq!(convert_attribute(&IrAttribute::Int32(-3)).unwrap(), Some(Attribute::I32(-3)));
        assert_eq!(convert_attribute(&IrAttribute::Int64(1 << 40)).unwrap(), Some(Attribute::I64(1 << 40)));
        assert_eq!(
            convert_attribute(&IrAttribute::Str("NCHW".into())).unwrap(),
            Some(Attribute::Str("NCHW".into()))
        );
    }

    #[test]
    fn test_int_array_narrows_to_i32() {
        let converted = convert_attribute(&IrAttribute::IntArray(vec![1, 2, 3])).unwrap();
        assert_eq!(converted, Some(Attribute::List(ScalarList::I32(vec![1, 2, 3]))));
    }

    #[test]
    fn test_symbol_is_dropped() {
        assert_eq!(convert_attribute(&IrAttribute::Symbol("S0".into())).unwrap(), None);
    }

    #[test]
    fn test_data_type_becomes_name() {
        let converted = convert_attribute(&IrAttribute::DataType(DataType::Float16)).unwrap();
        assert_eq!(converted, Some(Attribute::Str("float16".into())));
    }

    #[test]
    fn test_array_dispatches_on_element_kind() {
        let ints = IrAttribute::Array(vec![IrAttribute::Int64(4), IrAttribute::Int64(5)]);
        assert_eq!(
            convert_attribute(&ints).unwrap(),
            Some(Attribute::List(ScalarList::I64(vec![4, 5])))
        );

        let flags = IrAttribute::Array(vec![IrAttribute::Bool(false), IrAttribute::Bool(true)]);
        assert_eq!(
            convert_attribute(&flags).unwrap(),
            Some(Attribute::List(ScalarList::Bool(vec![false, true])))
        );

        let doubles = IrAttribute::Array(vec![IrAttribute::Double(0.25)]);
        assert_eq!(
            convert_attribute(&doubles).unwrap(),
            Some(Attribute::List(ScalarList::F64(vec![0.25])))
        );

        assert_eq!(convert_attribute(&IrAttribute::Array(vec![])).unwrap(), None);
    }

    #[test]
    fn test_array_of_strings_is_rejected() {
        let strs = IrAttribute::Array(vec![IrAttribute::Str("a".into())]);
        assert!(matches!(
            convert_attribute(&strs),
            Err(CompatError::UnsupportedArrayElement { .. })
        ));
    }

    #[test]
    fn test_mixed_array_is_rejected() {
        let mixed = IrAttribute::Array(vec![IrAttribute::Int32(1), IrAttribute::Int64(2)]);
        assert!(matches!(
            convert_attribute(&mixed),
            Err(CompatError::UnsupportedArrayElement { .. })
        ));
    }

    #[test]
    fn test_type_attribute_is_unknown() {
        let ty = IrAttribute::Type(IrType::Scalar(ScalarKind::F32));
        assert_eq!(
            convert_attribute(&ty),
            Err(CompatError::UnknownAttribute { attr: "type(f32)".into() })
        );
    }

    #[test]
    fn test_attribute_display() {
        assert_eq!(Attribute::List(ScalarList::I32(vec![1, 2])).to_string(), "[1, 2] : i32");
        assert_eq!(Attribute::F32(1.0).to_string(), "1.0 : f32");
        assert_eq!(Attribute::Str("x".into()).to_string(), "\"x\"");
    }
}
