//! Value types exchanged with the compiler

use crate::result::ResultCode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// NVRTC version as reported by `nvrtcVersion`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Version {
    pub major: i32,
    pub minor: i32,
}

impl Version {
    pub fn new(major: i32, minor: i32) -> Self {
        Self { major, minor }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// In-memory header made available to `#include` under `include_name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub include_name: String,
    pub source: String,
}

impl Header {
    pub fn new(include_name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            include_name: include_name.into(),
            source: source.into(),
        }
    }
}

/// Input for a one-shot [`crate::Compiler::compile`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompileRequest {
    pub source: String,
    pub name: Option<String>,
    pub headers: Vec<Header>,
    pub options: Vec<String>,
    pub name_expressions: Vec<String>,
}

impl CompileRequest {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_header(mut self, header: Header) -> Self {
        self.headers.push(header);
        self
    }

    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options.extend(options.into_iter().map(Into::into));
        self
    }

    pub fn with_name_expression(mut self, expression: impl Into<String>) -> Self {
        self.name_expressions.push(expression.into());
        self
    }
}

/// Result of a one-shot compile.
///
/// A failed compilation is still an `Ok` output: `status` carries the code,
/// `ptx` is `None` and `log` holds the diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompileOutput {
    pub program_name: String,
    pub status: ResultCode,
    pub ptx: Option<String>,
    pub log: String,
    pub lowered_names: BTreeMap<String, String>,
    pub compile_time_ms: f64,
}

impl CompileOutput {
    pub fn succeeded(&self) -> bool {
        self.status.is_success()
    }

    pub fn has_diagnostics(&self) -> bool {
        !self.log.trim().is_empty()
    }
}
