//! Packing validator instance.
//!
//! Wraps a schema compiler so that every validator it hands out has gone
//! through packing: compile, pack to text, load the text as a module. This
//! exercises the packed artifact on every call instead of the live one.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::config::PackOptions;
use crate::core::data::{EntityId, EntitySource};
use crate::core::pipeline::pack;

/// One validation error, as reported by a validator's `errors` property.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorRecord {
    pub keyword_path: String,
    pub message: String,
    pub schema_path: String,
    #[serde(default)]
    pub params: Value,
}

/// Rejection of an asynchronous validator.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("validation failed with {} error(s)", .errors.len())]
pub struct ValidationFailure {
    pub errors: Vec<ErrorRecord>,
}

pub type PendingVerdict = Pin<Box<dyn Future<Output = Result<bool, ValidationFailure>>>>;

/// Outcome of invoking a validator.
pub enum Verdict {
    /// Synchronous validators answer immediately.
    Done(bool),
    /// Asynchronous validators answer with a promise.
    Pending(PendingVerdict),
}

impl Verdict {
    /// `Some(valid)` for synchronous verdicts.
    pub fn done(&self) -> Option<bool> {
        match self {
            Verdict::Done(valid) => Some(*valid),
            Verdict::Pending(_) => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Verdict::Pending(_))
    }
}

impl fmt::Debug for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Done(valid) => f.debug_tuple("Done").field(valid).finish(),
            Verdict::Pending(_) => f.write_str("Pending(..)"),
        }
    }
}

/// A loaded packed module.
pub trait PackedValidator {
    /// Invoke the exported function. Validators may assign defaults or
    /// remove properties, so the data is mutable.
    fn call(&mut self, data: &mut Value) -> Verdict;

    /// Errors of the last synchronous call; `None` after success.
    fn errors(&self) -> Option<&[ErrorRecord]>;
}

/// Loads module text as a module and returns its export.
pub trait ModuleLoader {
    type Module: PackedValidator;

    fn load(&self, text: &str) -> Result<Self::Module>;
}

/// The compiler whose output gets packed.
pub trait SchemaCompiler {
    type Source: EntitySource + ?Sized;
    /// Keyword definition accepted by [`SchemaCompiler::add_keyword`].
    type Keyword;

    /// Compile a schema and return the id of its root routine.
    fn compile(&mut self, schema: &Value) -> Result<EntityId>;

    fn add_schema(&mut self, schema: Value, key: Option<&str>) -> Result<()>;

    fn add_keyword(&mut self, name: &str, definition: Self::Keyword) -> Result<()>;

    /// Bookkeeping of everything compiled so far.
    fn source(&self) -> &Self::Source;
}

pub struct PackInstance<C: SchemaCompiler, L: ModuleLoader> {
    compiler: C,
    loader: L,
    options: PackOptions,
    errors: Option<Vec<ErrorRecord>>,
}

impl<C: SchemaCompiler, L: ModuleLoader> PackInstance<C, L> {
    pub fn new(compiler: C, loader: L) -> Self {
        Self {
            compiler,
            loader,
            options: PackOptions::default(),
            errors: None,
        }
    }

    pub fn with_options(compiler: C, loader: L, options: PackOptions) -> Result<Self> {
        options.validate().context("Invalid pack options")?;
        Ok(Self {
            compiler,
            loader,
            options,
            errors: None,
        })
    }

    /// Compile `schema` and return the packed module text.
    pub fn pack(&mut self, schema: &Value) -> Result<String> {
        let root = self
            .compiler
            .compile(schema)
            .context("Failed to compile schema")?;
        let text = pack(self.compiler.source(), root, &self.options)
            .with_context(|| format!("Failed to pack routine {}", root))?;
        Ok(text)
    }

    /// Compile `schema`, pack it and load the packed module.
    pub fn compile(&mut self, schema: &Value) -> Result<L::Module> {
        let text = self.pack(schema)?;
        self.loader
            .load(&text)
            .context("Failed to load packed module")
    }

    /// Validate `data` against `schema` through a freshly packed validator.
    ///
    /// After a synchronous failure [`errors`](Self::errors) holds the
    /// validator's errors; otherwise it is cleared.
    pub fn validate(&mut self, schema: &Value, data: &mut Value) -> Result<Verdict> {
        let mut validator = self.compile(schema)?;
        let verdict = validator.call(data);
        self.errors = match verdict {
            Verdict::Done(false) => validator.errors().map(<[ErrorRecord]>::to_vec),
            _ => None,
        };
        tracing::debug!(verdict = ?verdict, "validated with packed module");
        Ok(verdict)
    }

    pub fn errors(&self) -> Option<&[ErrorRecord]> {
        self.errors.as_deref()
    }

    pub fn add_schema(&mut self, schema: Value, key: Option<&str>) -> Result<()> {
        self.compiler.add_schema(schema, key)
    }

    pub fn add_keyword(&mut self, name: &str, definition: C::Keyword) -> Result<()> {
        self.compiler.add_keyword(name, definition)
    }

    pub fn compiler(&self) -> &C {
        &self.compiler
    }

    pub fn options(&self) -> &PackOptions {
        &self.options
    }
}
