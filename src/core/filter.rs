// This module implements CompatibilityFilter, which decides whether an IR operation may be
// handed to the AST-based backend compiler and translates supported operations into the
// backend's vocabulary. The support decision runs a fixed sequence of checks and stops at the
// first failure: every operand must be a dense tensor (list operands member-wise), no operand
// may be rank zero, a constant-fill op is only claimed when its first consumer is not, the op
// must be registered with the backend and absent from the built-in deny set, and finally the
// configured allow or deny list gates the result. The conversion side canonicalizes names,
// converts attributes (device places become a force_cpu flag, the op mapper appends extras),
// maps element types onto backend scalar kinds and looks up fusion pattern kinds. Lookup
// failures are returned as CompatError; the support decision itself never fails.

//! Op compatibility filter.

use log::{debug, info, trace, warn};

use super::adaptor::OpAdaptor;
use super::attributes::{self, Attribute, AttributeMap, IrAttribute, Place};
use super::config::{debug_info, FilterConfig};
use super::error::{CompatError, CompatResult};
use super::mapper::{DefaultOpMapper, MapperKind, OpMapper};
use super::names::{self, FULL_OP};
use super::registry::{OpPatternKind, OperatorRegistry};
use super::session::NameContext;
use super::types::{BackendType, IrType, ScalarKind};

/// Bookkeeping attribute never forwarded to the backend.
pub const STOP_GRADIENT_ATTR: &str = "stop_gradient";

/// Prefix of generated value names.
pub const VALUE_NAME_PREFIX: &str = "var_";

/// Product of all extents, 1 for an empty shape; `None` when it overflows `i32`.
pub fn shape_product(shape: &[i32]) -> Option<i32> {
    shape.iter().try_fold(1i32, |acc, &dim| acc.checked_mul(dim))
}

/// Right-aligned mapping from input axes to output axes of a broadcast.
///
/// Input axis `in_rank - i` maps to output axis `out_rank - i`.
pub fn broadcast_axes(in_shape: &[i64], out_shape: &[i64]) -> Vec<i64> {
    let in_rank = in_shape.len();
    let out_rank = out_shape.len() as i64;
    let mut axes = vec![0i64; in_rank];
    for i in 1..=in_rank {
        axes[in_rank - i] = out_rank - i as i64;
    }
    axes
}

/// Decides backend support for IR operations and converts supported ones.
pub struct CompatibilityFilter<'r, M: OpMapper = DefaultOpMapper> {
    config: FilterConfig,
    registry: &'r OperatorRegistry,
    mapper: M,
}

impl<'r> CompatibilityFilter<'r, DefaultOpMapper> {
    /// Create a filter using the default op mapper.
    pub fn new(config: FilterConfig, registry: &'r OperatorRegistry) -> Self {
        Self::with_mapper(config, registry, DefaultOpMapper)
    }
}

impl<'r, M: OpMapper> CompatibilityFilter<'r, M> {
    /// Create a filter with a custom op mapper.
    pub fn with_mapper(config: FilterConfig, registry: &'r OperatorRegistry, mapper: M) -> Self {
        info!("The allowed backend ops: {}", debug_info(config.allow_ops()));
        info!("The denied backend ops: {}", debug_info(config.deny_ops()));
        Self { config, registry, mapper }
    }

    /// Whether `op` may be delegated to the backend compiler.
    pub fn is_supported<A: OpAdaptor>(&self, adaptor: &A, op: A::OpRef) -> bool {
        let op_name = adaptor.op_name(op);
        if !Self::all_input_dense_tensor(adaptor, op)
            || Self::has_zero_dim_input(adaptor, op)
            || self.is_unimplemented(adaptor, op)
        {
            debug!(
                "Found {} HaveZeroDimInput or UnimplementOps or NotAllInputDenseTensor, marking unsupported",
                op_name
            );
            return false;
        }

        let canonical = match self.canonical_name(adaptor, op) {
            Ok(name) => name,
            Err(e) => {
                warn!("{}", e);
                return false;
            }
        };

        let registered = self.is_registered(op_name, &canonical);
        let base_supported = registered && !self.config.is_default_denied(&canonical);
        debug!("{} is_support: {} registered: {}", canonical, base_supported, registered);

        let supported = self.config.gate(&canonical, base_supported);
        debug!("is_supported of {} is: {}", op_name, supported);
        supported
    }

    fn all_input_dense_tensor<A: OpAdaptor>(adaptor: &A, op: A::OpRef) -> bool {
        adaptor
            .op_operands(op)
            .flatten()
            .filter_map(|val| adaptor.value_type(val))
            .all(|ty| ty.members().iter().all(IrType::is_dense_tensor))
    }

    fn has_zero_dim_input<A: OpAdaptor>(adaptor: &A, op: A::OpRef) -> bool {
        adaptor
            .op_operands(op)
            .flatten()
            .filter_map(|val| adaptor.value_type(val))
            .any(|ty| {
                ty.members()
                    .iter()
                    .filter_map(IrType::as_dense_tensor)
                    .any(|t| t.rank() == 0)
            })
    }

    // A constant fill goes wherever its first consumer goes: when that
    // consumer stays outside the backend, so does the fill. Only the first
    // use is inspected, which assumes a single consumer; with fan-out the
    // first consumer decides for all of them.
    fn is_unimplemented<A: OpAdaptor>(&self, adaptor: &A, op: A::OpRef) -> bool {
        if adaptor.op_name(op) != FULL_OP {
            return false;
        }
        let Some(out) = adaptor.op_result(op, 0) else {
            return false;
        };
        match adaptor.value_first_use(out) {
            Some(user) => !self.is_supported(adaptor, user),
            None => false,
        }
    }

    fn is_registered(&self, op_name: &str, canonical: &str) -> bool {
        names::is_translated(op_name) || self.registry.contains(canonical)
    }

    /// Whether `op` carries an attribute that the denied-parameter table
    /// rules out for its canonical name.
    pub fn has_denied_param<A: OpAdaptor>(&self, adaptor: &A, op: A::OpRef) -> bool {
        let Ok(canonical) = self.canonical_name(adaptor, op) else {
            return false;
        };
        let Some(params) = self.config.denied_params(&canonical) else {
            return false;
        };
        adaptor.op_attributes(op).any(|(name, _)| params.contains(name))
    }

    /// Backend name of `op`: the translation table entry if there is one,
    /// otherwise the name with its dialect prefix stripped.
    pub fn canonical_name<A: OpAdaptor>(&self, adaptor: &A, op: A::OpRef) -> CompatResult<String> {
        let name = adaptor.op_name(op);
        let canonical = match names::translate(name) {
            Some(translated) => translated,
            None => match name.split_once('.') {
                Some((_, stripped)) => {
                    trace!("GetOpName: {} -> {}", name, stripped);
                    stripped
                }
                None => name,
            },
        };
        if canonical.is_empty() {
            return Err(CompatError::EmptyCanonicalName { op: name.to_string() });
        }
        Ok(canonical.to_string())
    }

    /// Unique kernel function name for `op`.
    pub fn op_func_name<'a, A: OpAdaptor>(
        &self,
        ctx: &NameContext<'a>,
        adaptor: &A,
        op: A::OpRef,
    ) -> CompatResult<&'a str> {
        let canonical = self.canonical_name(adaptor, op)?;
        Ok(ctx.new_name(&format!("fn_{canonical}")))
    }

    /// Name for a fused group: `fn` followed by a unique name per op.
    pub fn group_ops_name<A: OpAdaptor>(
        &self,
        ctx: &NameContext<'_>,
        adaptor: &A,
        ops: &[A::OpRef],
    ) -> CompatResult<String> {
        let mut name = String::from("fn");
        for &op in ops {
            let canonical = self.canonical_name(adaptor, op)?;
            name.push('_');
            name.push_str(ctx.new_name(&canonical));
        }
        Ok(name)
    }

    /// Stable backend name of a value.
    pub fn value_name<'a, A: OpAdaptor>(
        &self,
        ctx: &NameContext<'a>,
        adaptor: &A,
        val: A::ValueRef,
    ) -> &'a str {
        ctx.pretty_unique_name(adaptor.value_index(val), VALUE_NAME_PREFIX)
    }

    /// Operands the backend consumes, after op mapper narrowing.
    pub fn real_operand_sources<A: OpAdaptor>(&self, adaptor: &A, op: A::OpRef) -> Vec<A::ValueRef> {
        if self.mapper.has(adaptor, op, MapperKind::Operand) {
            self.mapper.real_operand_sources(adaptor, op)
        } else {
            adaptor.op_operands(op).flatten().collect()
        }
    }

    /// Convert every attribute of `op` into backend form.
    pub fn convert_attributes<A: OpAdaptor>(&self, adaptor: &A, op: A::OpRef) -> CompatResult<AttributeMap> {
        let mut dst_attrs = AttributeMap::new();
        for (name, attr) in adaptor.op_attributes(op) {
            debug!("deal with {}", name);
            if name == STOP_GRADIENT_ATTR {
                continue;
            }
            if let IrAttribute::Place(place) = attr {
                dst_attrs.insert("force_cpu".to_string(), Attribute::Bool(*place == Place::Cpu));
                continue;
            }
            if let Some(converted) = Self::convert_attribute(attr)? {
                dst_attrs.insert(name.to_string(), converted);
            }
        }

        if self.mapper.has(adaptor, op, MapperKind::Attribute) {
            self.mapper.append_variant_attrs(adaptor, op, &mut dst_attrs);
        }
        debug!("dst_attrs.len(): {}", dst_attrs.len());
        Ok(dst_attrs)
    }

    /// Convert a single attribute; `None` when the backend has no use for it.
    pub fn convert_attribute(src: &IrAttribute) -> CompatResult<Option<Attribute>> {
        attributes::convert_attribute(src)
    }

    /// Backend scalar kind of an IR element type.
    pub fn convert_type(ty: &IrType) -> CompatResult<BackendType> {
        let unmapped = || CompatError::UnmappedType { ty: ty.to_string() };
        let IrType::Scalar(kind) = ty else {
            return Err(unmapped());
        };
        let backend = match kind {
            ScalarKind::BF16 => BackendType::BF16,
            ScalarKind::F16 => BackendType::F16,
            ScalarKind::F32 => BackendType::F32,
            ScalarKind::F64 => BackendType::F64,
            ScalarKind::I8 => BackendType::I8,
            ScalarKind::U8 => BackendType::UI8,
            ScalarKind::I16 => BackendType::I16,
            ScalarKind::I32 => BackendType::I32,
            ScalarKind::I64 => BackendType::I64,
            ScalarKind::Index => BackendType::I32,
            ScalarKind::Bool => BackendType::UI1,
            ScalarKind::Complex64 | ScalarKind::Complex128 => return Err(unmapped()),
        };
        Ok(backend)
    }

    /// Fusion pattern kind of `op` as the fusion pass should see it.
    pub fn op_kind<A: OpAdaptor>(&self, adaptor: &A, op: A::OpRef) -> CompatResult<OpPatternKind> {
        let canonical = self.canonical_name(adaptor, op)?;
        if canonical == "generate_shape" {
            return Ok(OpPatternKind::NonFusible);
        }
        let mut kind = self
            .registry
            .pattern_kind(&canonical)
            .ok_or_else(|| CompatError::MissingPattern { op: canonical.clone() })?;
        // Binary ops register as broadcast for shape inference but fuse elementwise.
        if kind == OpPatternKind::Broadcast && canonical != "broadcast_to" {
            kind = OpPatternKind::ElementWise;
        }
        debug!("{} OpPatternKind: {}", canonical, kind);
        Ok(kind)
    }

    /// Extents of a dense-tensor value.
    pub fn value_shape<A: OpAdaptor>(adaptor: &A, val: A::ValueRef) -> Option<Vec<i32>> {
        let tensor = adaptor.value_type(val)?.as_dense_tensor()?;
        Some(tensor.dims.iter().map(|&d| d as i32).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Filter<'r> = CompatibilityFilter<'r>;

    #[test]
    fn test_shape_product() {
        assert_eq!(shape_product(&[2, 3, 4]), Some(24));
        assert_eq!(shape_product(&[]), Some(1));
        assert_eq!(shape_product(&[5, 0]), Some(0));
        assert_eq!(shape_product(&[-1, 4]), Some(-4));
    }

    #[test]
    fn test_shape_product_overflow() {
        assert_eq!(shape_product(&[65536, 65536]), None);
        assert_eq!(shape_product(&[46341, 46341]), None);
        assert_eq!(shape_product(&[46340, 46340]), Some(2_147_395_600));
    }

    #[test]
    fn test_broadcast_axes_right_aligned() {
        assert_eq!(broadcast_axes(&[3, 1], &[2, 3, 4]), vec![1, 2]);
        assert_eq!(broadcast_axes(&[4], &[2, 3, 4]), vec![2]);
        assert_eq!(broadcast_axes(&[], &[2, 3]), Vec::<i64>::new());
        assert_eq!(broadcast_axes(&[2, 3], &[2, 3]), vec![0, 1]);
    }

    #[test]
    fn test_convert_type_table() {
        let cases = [
            (ScalarKind::BF16, BackendType::BF16),
            (ScalarKind::F16, BackendType::F16),
            (ScalarKind::F32, BackendType::F32),
            (ScalarKind::F64, BackendType::F64),
            (ScalarKind::I8, BackendType::I8),
            (ScalarKind::U8, BackendType::UI8),
            (ScalarKind::I16, BackendType::I16),
            (ScalarKind::I32, BackendType::I32),
            (ScalarKind::I64, BackendType::I64),
            (ScalarKind::Index, BackendType::I32),
            (ScalarKind::Bool, BackendType::UI1),
        ];
        for (kind, expected) in cases {
            assert_eq!(Filter::convert_type(&IrType::Scalar(kind)).unwrap(), expected);
        }
    }

    #[test]
    fn test_convert_type_unmapped() {
        assert_eq!(
            Filter::convert_type(&IrType::Scalar(ScalarKind::Complex64)),
            Err(CompatError::UnmappedType { ty: "c64".into() })
        );
        assert!(matches!(
            Filter::convert_type(&IrType::dense(&[2], ScalarKind::F32)),
            Err(CompatError::UnmappedType { .. })
        ));
    }
}
