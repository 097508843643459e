use anyhow::Result;
use pretty_assertions::assert_eq;
use serde_json::json;

use schemapack::{
    CompiledRoutine, PackError, PackOptions, RoutineStore, SchemaCompiler, pack, pack_module,
};

use crate::{FixtureCompiler, assert_fully_linked, packed, packed_with};

#[test]
fn test_shared_routine_is_declared_once() -> Result<()> {
    let mut compiler = FixtureCompiler::new();
    compiler.add_schema(json!({"type": "string"}), Some("str"))?;
    let module = packed(
        &mut compiler,
        &json!({"properties": {"first": {"$ref": "str"}, "last": {"$ref": "str"}}}),
    )?;

    assert_fully_linked(&module);
    assert_eq!(module.text().matches("var str = ").count(), 1);
    assert_eq!(
        module.symbols().collect::<Vec<_>>(),
        vec!["str", "property0", "property1", "validate"]
    );
    Ok(())
}

#[test]
fn test_mutual_recursion_uses_forward_declarations() -> Result<()> {
    let mut compiler = FixtureCompiler::new();
    compiler.add_schema(json!({"properties": {"next": {"$ref": "b"}}}), Some("a"))?;
    compiler.add_schema(json!({"properties": {"next": {"$ref": "a"}}}), Some("b"))?;
    let module = packed(&mut compiler, &json!({"$ref": "a"}))?;

    assert_fully_linked(&module);
    let text = module.text();
    assert!(text.starts_with("'use strict';\nvar a, property0, b, property0_1;\na = function (data) {\n"));
    assert!(text.contains("(data.next === undefined || property0(data.next))"));
    assert!(text.contains("(data.next === undefined || property0_1(data.next))"));
    assert!(text.contains("\nvar validate = function (data) {\n  return a(data);\n};\n"));
    Ok(())
}

#[test]
fn test_self_recursive_schema() -> Result<()> {
    let mut compiler = FixtureCompiler::new();
    let module = packed(
        &mut compiler,
        &json!({"$id": "tree", "type": "object", "properties": {"child": {"$ref": "#"}}}),
    )?;

    assert_fully_linked(&module);
    let text = module.text();
    assert!(text.contains("var validate, property0;\n"));
    assert!(text.contains("property0 = function (data) {\n  return validate(data);\n};\n"));
    Ok(())
}

#[test]
fn test_eager_cycle_is_rejected() {
    let mut store = RoutineStore::new();
    let a = store.reserve();
    let b = store.insert(
        CompiledRoutine::new(
            "(function () { var f = refs.a; return function (d) { return f(d); }; })()",
        )
        .with_slot("a", a),
    );
    store
        .define(
            a,
            CompiledRoutine::new(
                "(function () { var f = refs.b; return function (d) { return f(d); }; })()",
            )
            .with_slot("b", b),
        )
        .unwrap();
    let root = store.insert(CompiledRoutine::new("function (d) { return refs.a(d); }").with_slot("a", a));

    let err = pack(&store, root, &PackOptions::default()).unwrap_err();
    assert_eq!(
        err,
        PackError::UnsupportedConstruct {
            entity: "cyclic group [a, b]".to_string(),
            reason: "eager references inside the group form a cycle".to_string(),
        }
    );
}

#[test]
fn test_call_invoked_reader_is_defined_after_its_target() {
    let mut store = RoutineStore::new();
    let a = store.reserve();
    let b = store.insert(
        CompiledRoutine::new("function (d) { return refs.a(d); }").with_slot("a", a),
    );
    store
        .define(
            a,
            CompiledRoutine::new(
                "(function () { var f = refs.b; return function (d) { return f(d); }; }).call(this)",
            )
            .with_slot("b", b),
        )
        .unwrap();
    let root = store.insert(CompiledRoutine::new("function (d) { return refs.a(d); }").with_slot("a", a));

    let text = pack(&store, root, &PackOptions::default()).unwrap();
    assert_eq!(
        text,
        "'use strict';\n\
         var b, a;\n\
         b = function (d) { return a(d); };\n\
         b.errors = null;\n\
         a = (function () { var f = b; return function (d) { return f(d); }; }).call(this);\n\
         a.errors = null;\n\
         var validate = function (d) { return a(d); };\n\
         validate.errors = null;\n\
         module.exports = validate;\n"
    );
}

#[test]
fn test_constructed_readers_in_a_cycle_are_rejected() {
    let mut store = RoutineStore::new();
    let a = store.reserve();
    let b = store.insert(
        CompiledRoutine::new("new function () { var f = refs.a; this.run = function (d) { return f(d); }; }().run")
            .with_slot("a", a),
    );
    store
        .define(
            a,
            CompiledRoutine::new(
                "(function () { var f = refs.b; return function (d) { return f(d); }; }).apply(null, [])",
            )
            .with_slot("b", b),
        )
        .unwrap();
    let root = store.insert(CompiledRoutine::new("function (d) { return refs.a(d); }").with_slot("a", a));

    let err = pack(&store, root, &PackOptions::default()).unwrap_err();
    assert_eq!(
        err,
        PackError::UnsupportedConstruct {
            entity: "cyclic group [a, b]".to_string(),
            reason: "eager references inside the group form a cycle".to_string(),
        }
    );
}

#[test]
fn test_eager_reference_to_acyclic_dependency() {
    let mut store = RoutineStore::new();
    let limits = store.insert(json!({"min": 1}));
    let root = store.insert(
        CompiledRoutine::new(
            "(function (min) { return function (d) { return d >= min; }; })(refs.limits.min)",
        )
        .with_slot("limits", limits),
    );

    let text = pack(&store, root, &PackOptions::default()).unwrap();
    assert_eq!(
        text,
        "'use strict';\n\
         var limits = {\"min\":1};\n\
         var validate = (function (min) { return function (d) { return d >= min; }; })(limits.min);\n\
         validate.errors = null;\n\
         module.exports = validate;\n"
    );
}

#[test]
fn test_packing_is_deterministic() -> Result<()> {
    let schema = json!({
        "properties": {
            "name": {"type": "string", "minLength": 1, "pattern": "^[A-Z]"},
            "tag": {"const": "x", "default": "x"},
            "self": {"$ref": "#"}
        }
    });

    let mut compiler = FixtureCompiler::new();
    let root = compiler.compile(&schema)?;
    let options = PackOptions::default();
    let first = pack(compiler.source(), root, &options)?;
    let second = pack(compiler.source(), root, &options)?;
    assert_eq!(first, second);

    let mut other = FixtureCompiler::new();
    let third = packed(&mut other, &schema)?;
    assert_eq!(first, third.text());
    Ok(())
}

#[test]
fn test_options_shape_the_module() -> Result<()> {
    let options = PackOptions {
        root_symbol: "check".to_string(),
        runtime_path: "./runtime/".to_string(),
        strict_mode: false,
        reserved: vec!["ucs2length".to_string()],
        ..Default::default()
    };
    let mut compiler = FixtureCompiler::new();
    let module = packed_with(&mut compiler, &json!({"minLength": 3}), &options)?;

    assert_fully_linked(&module);
    assert_eq!(
        module.text(),
        "var ucs2length_1 = require('./runtime/ucs2length');\n\
         var check = function (data) {\n  return ucs2length_1(data) >= 3;\n};\n\
         check.errors = null;\n\
         module.exports = check;\n"
    );
    Ok(())
}

#[test]
fn test_custom_registry_identifier() {
    let mut store = RoutineStore::new();
    let leaf = store.insert(json!([1, 2]));
    let root = store.insert(
        CompiledRoutine::new("function (d) { return refVal.list.indexOf(d) >= 0; }")
            .with_slot("list", leaf),
    );

    let options = PackOptions {
        registry_ident: "refVal".to_string(),
        ..Default::default()
    };
    let module = pack_module(&store, root, &options).unwrap();
    assert!(module.text().contains("return list.indexOf(d) >= 0;"));
}

#[test]
fn test_missing_dependency_names_referrer() {
    let mut store = RoutineStore::new();
    let ghost = store.reserve();
    let root = store.insert(
        CompiledRoutine::new("function (d) { return refs.str(d); }")
            .with_schema_id("http://example.com/root.json")
            .with_slot("str", ghost),
    );

    let err = pack(&store, root, &PackOptions::default()).unwrap_err();
    assert_eq!(
        err.to_string(),
        format!(
            "routine 'http://example.com/root.json' references missing entity {} through slot 'str'",
            ghost
        )
    );
}

#[test]
fn test_dynamic_registry_access_is_unsupported() {
    let mut store = RoutineStore::new();
    let root = store.insert(CompiledRoutine::new(
        "function (d) { var key = 'x'; return refs[key](d); }",
    ));

    let err = pack(&store, root, &PackOptions::default()).unwrap_err();
    assert!(matches!(err, PackError::UnsupportedConstruct { .. }));
}
