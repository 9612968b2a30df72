//! Attribute, operand, type and name conversion for supported ops.

use bumpalo::Bump;
use indoc::indoc;
use opcompat::core::{
    Attribute, AttributeMap, BackendType, CompatError, CompatibilityFilter, FilterConfig, IrType,
    NameContext, NoOpMapper, OpAdaptor, OperatorRegistry, ScalarKind, ScalarList,
};
use opcompat::program::{OpId, Program};
use pretty_assertions::assert_eq;

fn parse(text: &str) -> Program {
    Program::parse(text).unwrap_or_else(|e| panic!("Failed to parse program: {e}\n{text}"))
}

fn def(program: &Program, value: &str) -> OpId {
    program
        .op_defining(value)
        .unwrap_or_else(|| panic!("no op defines %{value}"))
}

fn i32_list(values: &[i32]) -> Attribute {
    Attribute::List(ScalarList::I32(values.to_vec()))
}

fn attr_map(entries: Vec<(&str, Attribute)>) -> AttributeMap {
    entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}

const PROGRAM: &str = indoc! {"
    ; reduce over axis 1, then broadcast back
    %x : tensor<3x1xf32>
    %axis = pd_op.full_int_array() {value = ints[1], stop_gradient = [true]} : tensor<1xi64>
    %s = pd_op.sum(%x, %axis) {keepdim = false, dtype = dtype(float32), stop_gradient = [false]} : tensor<3xf32>
    %shape = pd_op.full_int_array() {value = ints[2, 3, 4]} : tensor<3xi64>
    %e = pd_op.expand(%x, %shape) : tensor<2x3x4xf32>
    %one = pd_op.full() {value = 1.0 : f32, shape = ints[1], dtype = dtype(float32), place = place(cpu), stop_gradient = [true]} : tensor<1xf32>
    %g = pd_op.full() {value = 2.0 : f64, place = place(gpu:0)} : tensor<1xf64>
    %y = pd_op.add(%e, %one) {sym_dim = sym(S0)} : tensor<2x3x4xf32>
    %t = pd_op.cast(%y) {hint = type(f32)} : tensor<2x3x4xf32>
    %u = pd_op.split(%y) {sections = [\"a\", \"b\"]} : tensor<2x3x4xf32>
"};

#[test]
fn test_full_attributes() {
    let program = parse(PROGRAM);
    let registry = OperatorRegistry::with_builtin_ops();
    let filter = CompatibilityFilter::new(FilterConfig::default(), &registry);

    let attrs = filter.convert_attributes(&program, def(&program, "one")).unwrap();
    assert_eq!(
        attrs,
        attr_map(vec![
            ("dtype", Attribute::Str("float32".into())),
            ("force_cpu", Attribute::Bool(true)),
            ("shape", i32_list(&[1])),
            ("value", Attribute::F32(1.0)),
        ])
    );

    let attrs = filter.convert_attributes(&program, def(&program, "g")).unwrap();
    assert_eq!(
        attrs,
        attr_map(vec![
            ("force_cpu", Attribute::Bool(false)),
            ("value", Attribute::F64(2.0)),
        ])
    );
}

#[test]
fn test_int_array_narrows_wide_elements() {
    let program = parse(indoc! {"
        %axes = pd_op.full_int_array() {value = ints[4294967296, 4294967297, -1, 2147483648]} : tensor<4xi64>
    "});
    let registry = OperatorRegistry::with_builtin_ops();
    let filter = CompatibilityFilter::new(FilterConfig::default(), &registry);

    let attrs = filter.convert_attributes(&program, def(&program, "axes")).unwrap();
    assert_eq!(attrs["value"], i32_list(&[0, 1, -1, i32::MIN]));
}

#[test]
fn test_symbol_attribute_is_dropped() {
    let program = parse(PROGRAM);
    let registry = OperatorRegistry::with_builtin_ops();
    let filter = CompatibilityFilter::new(FilterConfig::default(), &registry);

    let attrs = filter.convert_attributes(&program, def(&program, "y")).unwrap();
    assert!(attrs.is_empty());
}

#[test]
fn test_reduce_attributes_from_axis_producer() {
    let program = parse(PROGRAM);
    let registry = OperatorRegistry::with_builtin_ops();
    let filter = CompatibilityFilter::new(FilterConfig::default(), &registry);

    let attrs = filter.convert_attributes(&program, def(&program, "s")).unwrap();
    assert_eq!(
        attrs,
        attr_map(vec![
            ("dim", i32_list(&[1])),
            ("dtype", Attribute::Str("float32".into())),
            ("keep_dim", Attribute::Bool(false)),
            ("keepdim", Attribute::Bool(false)),
        ])
    );
}

#[test]
fn test_reduce_axis_attribute_fallback() {
    let program = parse(indoc! {"
        %x : tensor<4x8xf32>
        %m = pd_op.max(%x) {axis = ints[0, 1], keepdim = true} : tensor<1x1xf32>
    "});
    let registry = OperatorRegistry::with_builtin_ops();
    let filter = CompatibilityFilter::new(FilterConfig::default(), &registry);

    let attrs = filter.convert_attributes(&program, def(&program, "m")).unwrap();
    assert_eq!(attrs["dim"], i32_list(&[0, 1]));
    assert_eq!(attrs["keep_dim"], Attribute::Bool(true));
}

#[test]
fn test_broadcast_attributes() {
    let program = parse(PROGRAM);
    let registry = OperatorRegistry::with_builtin_ops();
    let filter = CompatibilityFilter::new(FilterConfig::default(), &registry);

    let attrs = filter.convert_attributes(&program, def(&program, "e")).unwrap();
    assert_eq!(
        attrs,
        attr_map(vec![
            ("broadcast_axes", i32_list(&[1, 2])),
            ("out_shape", i32_list(&[2, 3, 4])),
        ])
    );
}

#[test]
fn test_no_op_mapper_skips_variant_attrs() {
    let program = parse(PROGRAM);
    let registry = OperatorRegistry::with_builtin_ops();
    let filter = CompatibilityFilter::with_mapper(FilterConfig::default(), &registry, NoOpMapper);

    let sum = def(&program, "s");
    let attrs = filter.convert_attributes(&program, sum).unwrap();
    assert!(!attrs.contains_key("dim"));
    assert!(!attrs.contains_key("keep_dim"));
    assert_eq!(filter.real_operand_sources(&program, sum).len(), 2);
}

#[test]
fn test_real_operand_sources() {
    let program = parse(PROGRAM);
    let registry = OperatorRegistry::with_builtin_ops();
    let filter = CompatibilityFilter::new(FilterConfig::default(), &registry);

    let x = program.value("x").unwrap();
    let sum = def(&program, "s");
    assert_eq!(filter.real_operand_sources(&program, sum), vec![x]);

    let add = def(&program, "y");
    let expected: Vec<_> = program.op_operands(add).flatten().collect();
    assert_eq!(filter.real_operand_sources(&program, add), expected);
}

#[test]
fn test_unknown_attribute_kind_fails() {
    let program = parse(PROGRAM);
    let registry = OperatorRegistry::with_builtin_ops();
    let filter = CompatibilityFilter::new(FilterConfig::default(), &registry);

    assert_eq!(
        filter.convert_attributes(&program, def(&program, "t")),
        Err(CompatError::UnknownAttribute { attr: "type(f32)".into() })
    );
    assert!(matches!(
        filter.convert_attributes(&program, def(&program, "u")),
        Err(CompatError::UnsupportedArrayElement { .. })
    ));
}

#[test]
fn test_convert_value_element_types() {
    let program = parse(indoc! {"
        %a : tensor<2xbf16>
        %b : tensor<2xindex>
        %c : tensor<2xbool>
        %d : tensor<2xc128>
    "});
    type Filter<'r> = CompatibilityFilter<'r>;
    let element = |name: &str| {
        let ty = program.value_type(program.value(name).unwrap()).unwrap();
        IrType::Scalar(ty.as_dense_tensor().unwrap().dtype)
    };

    assert_eq!(Filter::convert_type(&element("a")), Ok(BackendType::BF16));
    assert_eq!(Filter::convert_type(&element("b")), Ok(BackendType::I32));
    assert_eq!(Filter::convert_type(&element("c")), Ok(BackendType::UI1));
    assert_eq!(
        Filter::convert_type(&element("d")),
        Err(CompatError::UnmappedType { ty: "c128".into() })
    );
}

#[test]
fn test_value_shape() {
    let program = parse(indoc! {"
        %x : tensor<4x?xf32>
        %s : f32
    "});
    type Filter<'r> = CompatibilityFilter<'r>;
    assert_eq!(Filter::value_shape(&program, program.value("x").unwrap()), Some(vec![4, -1]));
    assert_eq!(Filter::value_shape(&program, program.value("s").unwrap()), None);
}

#[test]
fn test_generated_names() {
    let program = parse(indoc! {"
        %x : tensor<4xf32>
        %axis = pd_op.full_int_array() {value = ints[0]} : tensor<1xi64>
        %s0 = pd_op.sum(%x, %axis) : tensor<f32>
        %s1 = pd_op.sum(%x, %axis) : tensor<f32>
        %y = pd_op.add(%x, %x) : tensor<4xf32>
        %z = pd_op.exp(%y) : tensor<4xf32>
    "});
    let registry = OperatorRegistry::with_builtin_ops();
    let filter = CompatibilityFilter::new(FilterConfig::default(), &registry);
    let arena = Bump::new();
    let ctx = NameContext::new(&arena);

    let s0 = def(&program, "s0");
    let s1 = def(&program, "s1");
    assert_eq!(filter.op_func_name(&ctx, &program, s0).unwrap(), "fn_reduce_sum");
    assert_eq!(filter.op_func_name(&ctx, &program, s1).unwrap(), "fn_reduce_sum_0");

    let group = [def(&program, "y"), def(&program, "z")];
    assert_eq!(filter.group_ops_name(&ctx, &program, &group).unwrap(), "fn_elementwise_add_exp");
    assert_eq!(filter.group_ops_name(&ctx, &program, &group).unwrap(), "fn_elementwise_add_0_exp_0");

    let y = program.value("y").unwrap();
    let z = program.value("z").unwrap();
    assert_eq!(filter.value_name(&ctx, &program, z), "var_0");
    assert_eq!(filter.value_name(&ctx, &program, y), "var_1");
    assert_eq!(filter.value_name(&ctx, &program, z), "var_0");
}

#[test]
fn test_element_kind_helpers() {
    assert_eq!(ScalarKind::from_name("index"), Some(ScalarKind::Index));
    assert_eq!(BackendType::UI1.bits(), 1);
}
