//! IR types and their backend counterparts.
//!
//! The IR side is a closed set of variants: scalars, dense tensors, sparse
//! tensors, homogeneous vectors of types and opaque dialect types. Element
//! kinds of scalars and tensors are [`ScalarKind`]; the backend only knows the
//! smaller [`BackendType`] enumeration, and the mapping between the two lives
//! in [`CompatibilityFilter::convert_type`](crate::core::CompatibilityFilter::convert_type).

use std::fmt;

/// Element kind of a scalar or tensor in the IR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    BF16,
    F16,
    F32,
    F64,
    I8,
    U8,
    I16,
    I32,
    I64,
    Index,
    Bool,
    Complex64,
    Complex128,
}

impl ScalarKind {
    /// Textual spelling used by the IR printer and parser.
    pub const fn name(self) -> &'static str {
        use ScalarKind::*;
        match self {
            BF16 => "bf16",
            F16 => "f16",
            F32 => "f32",
            F64 => "f64",
            I8 => "i8",
            U8 => "u8",
            I16 => "i16",
            I32 => "i32",
            I64 => "i64",
            Index => "index",
            Bool => "bool",
            Complex64 => "c64",
            Complex128 => "c128",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        use ScalarKind::*;
        let kind = match s {
            "bf16" => BF16,
            "f16" => F16,
            "f32" => F32,
            "f64" => F64,
            "i8" => I8,
            "u8" => U8,
            "i16" => I16,
            "i32" => I32,
            "i64" => I64,
            "index" => Index,
            "bool" => Bool,
            "c64" => Complex64,
            "c128" => Complex128,
            _ => return None,
        };
        Some(kind)
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Shape and element kind of a tensor. A dynamic extent is `-1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TensorType {
    pub dims: Vec<i64>,
    pub dtype: ScalarKind,
}

impl TensorType {
    pub fn new(dims: Vec<i64>, dtype: ScalarKind) -> Self {
        Self { dims, dtype }
    }

    pub fn rank(&self) -> usize {
        self.dims.len()
    }
}

/// Type of an IR value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IrType {
    Scalar(ScalarKind),
    DenseTensor(TensorType),
    SparseTensor(TensorType),
    /// Homogeneous list of types, e.g. the input of a concat.
    Vector(Vec<IrType>),
    /// A dialect type the compatibility layer knows nothing about.
    Opaque(String),
}

impl IrType {
    pub fn dense(dims: &[i64], dtype: ScalarKind) -> Self {
        IrType::DenseTensor(TensorType::new(dims.to_vec(), dtype))
    }

    pub fn as_dense_tensor(&self) -> Option<&TensorType> {
        match self {
            IrType::DenseTensor(t) => Some(t),
            _ => None,
        }
    }

    pub fn is_dense_tensor(&self) -> bool {
        matches!(self, IrType::DenseTensor(_))
    }

    /// Element types to inspect for per-operand checks: the list members for a
    /// vector type, the type itself otherwise.
    pub fn members(&self) -> &[IrType] {
        match self {
            IrType::Vector(types) => types,
            other => std::slice::from_ref(other),
        }
    }
}

fn write_tensor(f: &mut fmt::Formatter<'_>, tag: &str, t: &TensorType) -> fmt::Result {
    write!(f, "{tag}<")?;
    for dim in &t.dims {
        if *dim < 0 {
            f.write_str("?x")?;
        } else {
            write!(f, "{dim}x")?;
        }
    }
    write!(f, "{}>", t.dtype)
}

impl fmt::Display for IrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IrType::Scalar(kind) => write!(f, "{kind}"),
            IrType::DenseTensor(t) => write_tensor(f, "tensor", t),
            IrType::SparseTensor(t) => write_tensor(f, "sparse", t),
            IrType::Vector(types) => {
                f.write_str("vec<")?;
                for (i, ty) in types.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{ty}")?;
                }
                f.write_str(">")
            }
            IrType::Opaque(name) => write!(f, "!{name}"),
        }
    }
}

/// Scalar kinds understood by the backend compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendType {
    BF16,
    F16,
    F32,
    F64,
    I8,
    UI8,
    I16,
    I32,
    I64,
    /// One-bit unsigned integer, the backend's boolean.
    UI1,
}

impl BackendType {
    pub const fn bits(self) -> u32 {
        use BackendType::*;
        match self {
            UI1 => 1,
            I8 | UI8 => 8,
            BF16 | F16 | I16 => 16,
            F32 | I32 => 32,
            F64 | I64 => 64,
        }
    }
}

/// Data type carried by datatype-valued attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Undefined,
    Bool,
    Int8,
    UInt8,
    Int16,
    Int32,
    Int64,
    Float16,
    BFloat16,
    Float32,
    Float64,
    Complex64,
    Complex128,
    PString,
}

impl DataType {
    /// Canonical string name handed to the backend.
    pub const fn name(self) -> &'static str {
        use DataType::*;
        match self {
            Undefined => "Undefined",
            Bool => "bool",
            Int8 => "int8",
            UInt8 => "uint8",
            Int16 => "int16",
            Int32 => "int32",
            Int64 => "int64",
            Float16 => "float16",
            BFloat16 => "bfloat16",
            Float32 => "float32",
            Float64 => "float64",
            Complex64 => "complex64",
            Complex128 => "complex128",
            PString => "pstring",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        use DataType::*;
        [
            Undefined, Bool, Int8, UInt8, Int16, Int32, Int64, Float16, BFloat16, Float32,
            Float64, Complex64, Complex128, PString,
        ]
        .into_iter()
        .find(|dt| dt.name() == s)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_display() {
        assert_eq!(IrType::dense(&[4, -1, 8], ScalarKind::F32).to_string(), "tensor<4x?x8xf32>");
        assert_eq!(IrType::dense(&[], ScalarKind::I64).to_string(), "tensor<i64>");
        let vec = IrType::Vector(vec![
            IrType::dense(&[2], ScalarKind::F16),
            IrType::Scalar(ScalarKind::Bool),
        ]);
        assert_eq!(vec.to_string(), "vec<tensor<2xf16>, bool>");
        assert_eq!(IrType::Opaque("cf.stack".into()).to_string(), "!cf.stack");
    }

    #[test]
    fn test_members() {
        let t = IrType::dense(&[3], ScalarKind::F32);
        assert_eq!(t.members(), std::slice::from_ref(&t));

        let vec = IrType::Vector(vec![t.clone(), t.clone()]);
        assert_eq!(vec.members().len(), 2);
    }

    #[test]
    fn test_scalar_names_roundtrip_through_parser_spelling() {
        for kind in [ScalarKind::BF16, ScalarKind::Index, ScalarKind::Bool, ScalarKind::Complex128] {
            assert_eq!(ScalarKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(ScalarKind::from_name("f128"), None);
    }

    #[test]
    fn test_data_type_names() {
        assert_eq!(DataType::Float32.name(), "float32");
        assert_eq!(DataType::from_name("bfloat16"), Some(DataType::BFloat16));
        assert_eq!(DataType::from_name("float"), None);
    }

    #[test]
    fn test_backend_type_bits() {
        assert_eq!(BackendType::UI1.bits(), 1);
        assert_eq!(BackendType::BF16.bits(), 16);
        assert_eq!(BackendType::I64.bits(), 64);
    }
}
