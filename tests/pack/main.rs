use std::collections::{HashMap, HashSet};

use anyhow::{Context, Result, bail};
use serde_json::Value;

use schemapack::{
    CompiledRoutine, EntityId, KeywordImpl, PackOptions, PackedModule, PatternLiteral,
    RoutineStore, RuntimeHelper, SchemaCompiler, pack_module,
};

mod graph;

/// A tiny schema compiler producing routines shaped like real compiled ones.
///
/// Supports `type`, `minLength`, `pattern`, `const`, `$ref` (to added schemas
/// or `#`), `properties` with `default`, `$async` and added keywords.
#[derive(Default)]
pub struct FixtureCompiler {
    store: RoutineStore,
    schemas: HashMap<String, Value>,
    compiled: HashMap<String, EntityId>,
    keywords: HashMap<String, EntityId>,
    helpers: HashMap<RuntimeHelper, EntityId>,
}

impl FixtureCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    fn helper(&mut self, helper: RuntimeHelper) -> EntityId {
        if let Some(&id) = self.helpers.get(&helper) {
            return id;
        }
        let id = self.store.insert(helper);
        self.helpers.insert(helper, id);
        id
    }

    fn compile_routine(
        &mut self,
        schema: &Value,
        key: Option<&str>,
        root: Option<EntityId>,
    ) -> Result<EntityId> {
        if let Some(key) = key
            && let Some(&id) = self.compiled.get(key)
        {
            return Ok(id);
        }

        let id = self.store.reserve();
        if let Some(key) = key {
            self.compiled.insert(key.to_string(), id);
        }
        let root = match key {
            Some(_) => id,
            None => root.unwrap_or(id),
        };
        let is_async = schema.get("$async").and_then(Value::as_bool).unwrap_or(false);

        let mut statements: Vec<String> = Vec::new();
        let mut checks: Vec<String> = Vec::new();
        let mut slots: Vec<(String, EntityId)> = Vec::new();

        if let Some(ty) = schema.get("type").and_then(Value::as_str) {
            checks.push(format!("typeof data == '{}'", ty));
        }
        if let Some(min) = schema.get("minLength").and_then(Value::as_u64) {
            slots.push(("ucs2length".to_string(), self.helper(RuntimeHelper::Ucs2Length)));
            checks.push(format!("refs.ucs2length(data) >= {}", min));
        }
        if let Some(pattern) = schema.get("pattern").and_then(Value::as_str) {
            let slot = format!("pattern{}", slots.len());
            slots.push((slot.clone(), self.store.insert(PatternLiteral::new(pattern))));
            checks.push(format!("refs.{}.test(data)", slot));
        }
        if let Some(constant) = schema.get("const") {
            slots.push(("equal".to_string(), self.helper(RuntimeHelper::Equal)));
            let slot = format!("const{}", slots.len());
            slots.push((slot.clone(), self.store.insert(constant.clone())));
            checks.push(format!("refs.equal(data, refs.{})", slot));
        }
        if let Some(target) = schema.get("$ref").and_then(Value::as_str) {
            let target_id = if target == "#" {
                root
            } else {
                let sub = self
                    .schemas
                    .get(target)
                    .cloned()
                    .with_context(|| format!("unknown schema '{}'", target))?;
                self.compile_routine(&sub, Some(target), None)?
            };
            slots.push((target.to_string(), target_id));
            checks.push(format!("refs[{:?}](data)", target));
        }
        if let Some(properties) = schema.get("properties").and_then(Value::as_object) {
            for (name, sub) in properties {
                if let Some(default) = sub.get("default") {
                    let slot = format!("default{}", slots.len());
                    slots.push((slot.clone(), self.store.insert(default.clone())));
                    statements.push(format!(
                        "if (data.{0} === undefined) data.{0} = refs.{1};",
                        name, slot
                    ));
                }
                let has_checks = sub
                    .as_object()
                    .is_some_and(|sub| sub.keys().any(|k| k != "default"));
                if has_checks {
                    let slot = format!("property{}", slots.len());
                    let sub_id = self.compile_routine(sub, None, Some(root))?;
                    slots.push((slot.clone(), sub_id));
                    checks.push(format!(
                        "(data.{0} === undefined || refs.{1}(data.{0}))",
                        name, slot
                    ));
                }
            }
        }
        if let Some(object) = schema.as_object() {
            for (keyword, value) in object {
                if let Some(&keyword_id) = self.keywords.get(keyword) {
                    slots.push((keyword.clone(), keyword_id));
                    checks.push(format!("refs[{:?}]({}, data)", keyword, value));
                }
            }
        }

        let condition = if checks.is_empty() {
            "true".to_string()
        } else {
            checks.join(" && ")
        };

        let mut source = String::from(if is_async {
            "async function (data) {\n"
        } else {
            "function (data) {\n"
        });
        for statement in &statements {
            source.push_str(&format!("  {}\n", statement));
        }
        if is_async {
            slots.push((
                "ValidationError".to_string(),
                self.helper(RuntimeHelper::ValidationError),
            ));
            source.push_str(&format!(
                "  if (!({})) throw new refs.ValidationError([{{ keywordPath: 'type', message: 'is invalid', schemaPath: '#' }}]);\n  return true;\n",
                condition
            ));
        } else {
            source.push_str(&format!("  return {};\n", condition));
        }
        source.push('}');

        let mut routine = CompiledRoutine::new(source);
        for (name, target) in slots {
            routine = routine.with_slot(name, target);
        }
        if let Some(key) = key {
            routine = routine.with_schema_id(key);
        }
        if is_async {
            routine = routine.asynchronous();
        }
        self.store.define(id, routine)?;
        Ok(id)
    }
}

impl SchemaCompiler for FixtureCompiler {
    type Source = RoutineStore;
    type Keyword = KeywordImpl;

    fn compile(&mut self, schema: &Value) -> Result<EntityId> {
        if !schema.is_object() {
            bail!("schema must be an object");
        }
        let key = schema.get("$id").and_then(Value::as_str).map(str::to_string);
        self.compile_routine(schema, key.as_deref(), None)
    }

    fn add_schema(&mut self, schema: Value, key: Option<&str>) -> Result<()> {
        let key = key
            .or_else(|| schema.get("$id").and_then(Value::as_str))
            .context("schema needs a key or $id")?
            .to_string();
        self.schemas.insert(key, schema);
        Ok(())
    }

    fn add_keyword(&mut self, name: &str, definition: KeywordImpl) -> Result<()> {
        let id = self.store.insert(definition);
        self.keywords.insert(name.to_string(), id);
        Ok(())
    }

    fn source(&self) -> &RoutineStore {
        &self.store
    }
}

pub fn packed(compiler: &mut FixtureCompiler, schema: &Value) -> Result<PackedModule> {
    packed_with(compiler, schema, &PackOptions::default())
}

pub fn packed_with(
    compiler: &mut FixtureCompiler,
    schema: &Value,
    options: &PackOptions,
) -> Result<PackedModule> {
    let root = compiler.compile(schema)?;
    Ok(pack_module(compiler.source(), root, options)?)
}

/// Checks every packed module must pass regardless of the schema.
pub fn assert_fully_linked(module: &PackedModule) {
    let text = module.text();
    assert!(
        !text.contains("refs.") && !text.contains("refs["),
        "registry lookup left in:\n{}",
        text
    );

    let symbols: HashSet<&str> = module.symbols().collect();
    assert_eq!(
        symbols.len(),
        module.declarations().len(),
        "duplicate symbol in:\n{}",
        text
    );

    let export = format!("module.exports = {};\n", module.root_symbol());
    assert!(text.ends_with(&export), "root not exported in:\n{}", text);
}
