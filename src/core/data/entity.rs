//! Entities a compiled routine can reference at runtime.
//!
//! Every entity is owned by the compiler's bookkeeping and identified by an
//! [`EntityId`]. Identity, not structural equality, decides whether two
//! reference sites point at the same thing.

use enum_dispatch::enum_dispatch;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================
// Identity
// ============================================================

/// Opaque identity handed out by an [`EntitySource`](super::EntitySource).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Coarse entity category, used for naming and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    Routine,
    Keyword,
    Format,
    Pattern,
    Value,
    Runtime,
}

impl EntityKind {
    /// Prefix used when a name has to come from a counter.
    pub fn counter_prefix(self) -> &'static str {
        match self {
            EntityKind::Routine => "ref",
            EntityKind::Keyword => "keyword",
            EntityKind::Format => "format",
            EntityKind::Pattern => "pattern",
            EntityKind::Value => "value",
            EntityKind::Runtime => "runtime",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Routine => write!(f, "routine"),
            EntityKind::Keyword => write!(f, "keyword"),
            EntityKind::Format => write!(f, "format"),
            EntityKind::Pattern => write!(f, "pattern"),
            EntityKind::Value => write!(f, "value"),
            EntityKind::Runtime => write!(f, "runtime helper"),
        }
    }
}

// ============================================================
// Reference slots
// ============================================================

/// A named dependency edge inside a routine body.
///
/// The body reaches the target through the registry lookup `refs.<name>`
/// (or `refs["<name>"]`), which packing rewrites to a local symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceSlot {
    pub name: String,
    pub target: EntityId,
}

impl ReferenceSlot {
    pub fn new(name: impl Into<String>, target: EntityId) -> Self {
        Self {
            name: name.into(),
            target,
        }
    }
}

// ============================================================
// Entity variants
// ============================================================

/// A validation routine produced by the schema compiler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledRoutine {
    /// JavaScript expression evaluating to the validation function.
    pub source: String,
    #[serde(default)]
    pub slots: Vec<ReferenceSlot>,
    /// `$id` / `id` of the schema this routine was compiled from.
    #[serde(default)]
    pub schema_id: Option<String>,
    /// The routine returns a promise instead of a boolean.
    #[serde(default)]
    pub is_async: bool,
}

impl CompiledRoutine {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            slots: Vec::new(),
            schema_id: None,
            is_async: false,
        }
    }

    pub fn with_slot(mut self, name: impl Into<String>, target: EntityId) -> Self {
        self.slots.push(ReferenceSlot::new(name, target));
        self
    }

    pub fn with_schema_id(mut self, id: impl Into<String>) -> Self {
        self.schema_id = Some(id.into());
        self
    }

    pub fn asynchronous(mut self) -> Self {
        self.is_async = true;
        self
    }

    /// First slot with the given name.
    pub fn slot(&self, name: &str) -> Option<&ReferenceSlot> {
        self.slots.iter().find(|slot| slot.name == name)
    }
}

/// How a custom keyword takes part in validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeywordKind {
    /// Generates code that is inlined into the routine body.
    Inline,
    /// Expands into other schema keywords at compile time.
    Macro,
    /// Calls a validation function at runtime.
    Validate,
    /// Compiles the schema value into a validation function.
    Compile,
}

/// A user-registered keyword implementation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordImpl {
    pub keyword: String,
    pub kind: KeywordKind,
    /// JavaScript source of the runtime function, when it has one.
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub slots: Vec<ReferenceSlot>,
}

impl KeywordImpl {
    pub fn new(keyword: impl Into<String>, kind: KeywordKind, source: Option<String>) -> Self {
        Self {
            keyword: keyword.into(),
            kind,
            source,
            slots: Vec::new(),
        }
    }

    pub fn with_slot(mut self, name: impl Into<String>, target: EntityId) -> Self {
        self.slots.push(ReferenceSlot::new(name, target));
        self
    }
}

/// A named format checker supplied by the compiler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatChecker {
    pub name: String,
    pub check: FormatCheck,
    /// Edges used by a function checker's source.
    #[serde(default)]
    pub slots: Vec<ReferenceSlot>,
}

impl FormatChecker {
    pub fn new(name: impl Into<String>, check: FormatCheck) -> Self {
        Self {
            name: name.into(),
            check,
            slots: Vec::new(),
        }
    }

    pub fn with_slot(mut self, name: impl Into<String>, target: EntityId) -> Self {
        self.slots.push(ReferenceSlot::new(name, target));
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatCheck {
    /// Regular expression tested against the string.
    Regex(PatternLiteral),
    /// JavaScript function source taking the string.
    Function(String),
    /// Implemented natively by the compiler; has no text form.
    Native,
}

/// A regular expression hoisted out of a routine body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternLiteral {
    pub source: String,
    #[serde(default)]
    pub flags: String,
}

impl PatternLiteral {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            flags: String::new(),
        }
    }

    pub fn with_flags(mut self, flags: impl Into<String>) -> Self {
        self.flags = flags.into();
        self
    }
}

/// Helpers shipped with the validator runtime package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuntimeHelper {
    /// Deep equality, used by `uniqueItems`, `enum` and `const`.
    Equal,
    /// Unicode-aware string length, used by `minLength`/`maxLength`.
    Ucs2Length,
    /// Error class rejected by asynchronous validators.
    ValidationError,
}

impl RuntimeHelper {
    pub fn symbol(self) -> &'static str {
        match self {
            RuntimeHelper::Equal => "equal",
            RuntimeHelper::Ucs2Length => "ucs2length",
            RuntimeHelper::ValidationError => "ValidationError",
        }
    }

    /// Module file under the runtime path.
    pub fn module(self) -> &'static str {
        match self {
            RuntimeHelper::Equal => "equal",
            RuntimeHelper::Ucs2Length => "ucs2length",
            RuntimeHelper::ValidationError => "validation_error",
        }
    }
}

// ============================================================
// Entity
// ============================================================

/// Behaviour shared by every entity variant.
///
/// Dispatched over [`Entity`] with `enum_dispatch`.
#[enum_dispatch]
pub trait Referent {
    fn kind(&self) -> EntityKind;

    /// Human-readable description for error messages.
    fn describe(&self) -> String;

    /// Outgoing edges, in body order.
    fn slots(&self) -> &[ReferenceSlot] {
        &[]
    }

    /// JavaScript text that has to be parsed and rewritten, if any.
    fn code(&self) -> Option<&str> {
        None
    }

    /// Name this entity would like to be bound to.
    fn preferred_name(&self) -> Option<String> {
        None
    }
}

impl Referent for CompiledRoutine {
    fn kind(&self) -> EntityKind {
        EntityKind::Routine
    }

    fn describe(&self) -> String {
        match &self.schema_id {
            Some(id) => format!("routine '{}'", id),
            None => "anonymous routine".to_string(),
        }
    }

    fn slots(&self) -> &[ReferenceSlot] {
        &self.slots
    }

    fn code(&self) -> Option<&str> {
        Some(&self.source)
    }

    fn preferred_name(&self) -> Option<String> {
        self.schema_id.clone()
    }
}

impl Referent for KeywordImpl {
    fn kind(&self) -> EntityKind {
        EntityKind::Keyword
    }

    fn describe(&self) -> String {
        format!("keyword '{}'", self.keyword)
    }

    fn slots(&self) -> &[ReferenceSlot] {
        &self.slots
    }

    fn code(&self) -> Option<&str> {
        self.source.as_deref()
    }

    fn preferred_name(&self) -> Option<String> {
        Some(format!("keyword_{}", self.keyword))
    }
}

impl Referent for FormatChecker {
    fn kind(&self) -> EntityKind {
        EntityKind::Format
    }

    fn describe(&self) -> String {
        format!("format '{}'", self.name)
    }

    fn slots(&self) -> &[ReferenceSlot] {
        &self.slots
    }

    fn code(&self) -> Option<&str> {
        match &self.check {
            FormatCheck::Function(source) => Some(source),
            _ => None,
        }
    }

    fn preferred_name(&self) -> Option<String> {
        Some(format!("format_{}", self.name))
    }
}

impl Referent for PatternLiteral {
    fn kind(&self) -> EntityKind {
        EntityKind::Pattern
    }

    fn describe(&self) -> String {
        format!("pattern /{}/{}", self.source, self.flags)
    }
}

impl Referent for Value {
    fn kind(&self) -> EntityKind {
        EntityKind::Value
    }

    fn describe(&self) -> String {
        "schema value".to_string()
    }
}

impl Referent for RuntimeHelper {
    fn kind(&self) -> EntityKind {
        EntityKind::Runtime
    }

    fn describe(&self) -> String {
        format!("runtime helper '{}'", self.symbol())
    }

    fn preferred_name(&self) -> Option<String> {
        Some(self.symbol().to_string())
    }
}

/// Anything a reference slot can point at.
#[enum_dispatch(Referent)]
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    Routine(CompiledRoutine),
    Keyword(KeywordImpl),
    Format(FormatChecker),
    Pattern(PatternLiteral),
    Value(Value),
    Runtime(RuntimeHelper),
}

impl Entity {
    pub fn as_routine(&self) -> Option<&CompiledRoutine> {
        match self {
            Entity::Routine(routine) => Some(routine),
            _ => None,
        }
    }
}
