//! Scoped ownership of a native program handle
//!
//! A [`Program`] creates its handle on construction and destroys it exactly
//! once, either through [`Program::destroy`] or on drop. It also tracks the
//! created → compiled → destroyed lifecycle so output queries are only issued
//! once a compile attempt has happened.

use crate::api::{CompilerApi, RawProgram};
use crate::config::DEFAULT_PROGRAM_NAME;
use crate::library::NvrtcLibrary;
use crate::result::ResultCode;
use crate::types::Header;
use crate::{NvrtcError, Result};
use std::ffi::{CStr, CString};
use tracing::{debug, warn};

/// Outcome of the most recent compile attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgramState {
    /// No compile attempt yet
    Created,
    /// Last attempt succeeded; PTX and log are available
    Compiled,
    /// Last attempt failed with this code; only the log is available
    Failed(ResultCode),
}

pub struct Program<'a, A: CompilerApi + ?Sized = NvrtcLibrary> {
    api: &'a A,
    handle: RawProgram,
    name: String,
    state: ProgramState,
    attempts: u32,
}

fn to_c_strings<S: AsRef<str>>(values: &[S], what: &'static str) -> Result<Vec<CString>> {
    values
        .iter()
        .map(|value| CString::new(value.as_ref()).map_err(NvrtcError::invalid_string(what)))
        .collect()
}

fn as_refs(values: &[CString]) -> Vec<&CStr> {
    values.iter().map(CString::as_c_str).collect()
}

/// Decode a NUL-terminated native buffer.
fn buffer_to_string(mut buffer: Vec<u8>) -> String {
    while buffer.last() == Some(&0) {
        buffer.pop();
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

impl<'a, A: CompilerApi + ?Sized> Program<'a, A> {
    /// Create a program from `source`. `name` of `None` lets the native side
    /// pick `"default_program"`.
    pub fn new(api: &'a A, source: &str, name: Option<&str>, headers: &[Header]) -> Result<Self> {
        let source_c = CString::new(source).map_err(NvrtcError::invalid_string("program source"))?;
        let name_c = name
            .map(CString::new)
            .transpose()
            .map_err(NvrtcError::invalid_string("program name"))?;
        let header_sources: Vec<&str> = headers.iter().map(|h| h.source.as_str()).collect();
        let include_names: Vec<&str> = headers.iter().map(|h| h.include_name.as_str()).collect();
        let header_sources = to_c_strings(&header_sources, "header source")?;
        let include_names = to_c_strings(&include_names, "header include name")?;

        let handle = api.create_program(
            &source_c,
            name_c.as_deref(),
            &as_refs(&header_sources),
            &as_refs(&include_names),
        )?;

        let name = name.unwrap_or(DEFAULT_PROGRAM_NAME).to_string();
        debug!("Program {} created with {} headers", name, headers.len());

        Ok(Self {
            api,
            handle,
            name,
            state: ProgramState::Created,
            attempts: 0,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> ProgramState {
        self.state
    }

    /// Compile attempts that reached the native library.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Register a name expression; must happen before the first compile.
    pub fn add_name_expression(&mut self, expression: &str) -> Result<()> {
        let expression =
            CString::new(expression).map_err(NvrtcError::invalid_string("name expression"))?;
        self.api.add_name_expression(&self.handle, &expression)
    }

    /// Run one compile attempt. Each attempt replaces the PTX and log
    /// available for retrieval. Failures carry the native code verbatim;
    /// the diagnostics are in [`Program::log`].
    pub fn compile<S: AsRef<str>>(&mut self, options: &[S]) -> Result<()> {
        let options = to_c_strings(options, "compiler option")?;
        let result = self.api.compile_program(&self.handle, &as_refs(&options));

        match &result {
            Ok(()) => {
                self.attempts += 1;
                self.state = ProgramState::Compiled;
                debug!("Program {} compiled (attempt {})", self.name, self.attempts);
            }
            Err(err) => {
                if let Some(code) = err.code() {
                    self.attempts += 1;
                    self.state = ProgramState::Failed(code);
                    debug!(
                        "Program {} failed to compile (attempt {}): {}",
                        self.name, self.attempts, code
                    );
                }
            }
        }

        result
    }

    fn ensure_attempted(&self) -> Result<()> {
        match self.state {
            ProgramState::Created => Err(NvrtcError::NotCompiled),
            _ => Ok(()),
        }
    }

    fn ensure_compiled(&self) -> Result<()> {
        match self.state {
            ProgramState::Created => Err(NvrtcError::NotCompiled),
            ProgramState::Failed(code) => Err(NvrtcError::CompilationFailed { code }),
            ProgramState::Compiled => Ok(()),
        }
    }

    /// PTX size in bytes including the trailing NUL.
    pub fn ptx_size(&self) -> Result<usize> {
        self.ensure_compiled()?;
        self.api.ptx_size(&self.handle)
    }

    /// Raw PTX bytes. The length equals [`Program::ptx_size`], trailing NUL
    /// included.
    pub fn ptx(&self) -> Result<Vec<u8>> {
        let size = self.ptx_size()?;
        let mut buffer = vec![0u8; size];
        self.api.ptx(&self.handle, &mut buffer)?;
        Ok(buffer)
    }

    /// PTX as text, without the trailing NUL.
    pub fn ptx_string(&self) -> Result<String> {
        self.ptx().map(buffer_to_string)
    }

    /// Log size in bytes including the trailing NUL. Available after failed
    /// attempts too.
    pub fn log_size(&self) -> Result<usize> {
        self.ensure_attempted()?;
        self.api.program_log_size(&self.handle)
    }

    /// Diagnostics from the last attempt, without the trailing NUL.
    pub fn log(&self) -> Result<String> {
        let size = self.log_size()?;
        if size == 0 {
            return Ok(String::new());
        }
        let mut buffer = vec![0u8; size];
        self.api.program_log(&self.handle, &mut buffer)?;
        Ok(buffer_to_string(buffer))
    }

    /// Mangled name for an expression registered with
    /// [`Program::add_name_expression`]; valid after a successful compile.
    pub fn lowered_name(&self, expression: &str) -> Result<String> {
        self.ensure_compiled()?;
        let expression =
            CString::new(expression).map_err(NvrtcError::invalid_string("name expression"))?;
        self.api.lowered_name(&self.handle, &expression)
    }

    /// Destroy the program now, surfacing the native result. Drop does the
    /// same, logging failures instead of returning them.
    pub fn destroy(mut self) -> Result<()> {
        self.release()
    }

    /// Exactly one native destroy per handle: the handle is taken out before
    /// the call, so a failing destroy is not retried on drop.
    fn release(&mut self) -> Result<()> {
        if self.handle.is_null() {
            return Ok(());
        }
        let mut handle = std::mem::take(&mut self.handle);
        self.api.destroy_program(&mut handle)
    }
}

impl<A: CompilerApi + ?Sized> Drop for Program<'_, A> {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            warn!("Failed to destroy program {}: {}", self.name, e);
        }
    }
}

impl<A: CompilerApi + ?Sized> std::fmt::Debug for Program<'_, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Program")
            .field("name", &self.name)
            .field("state", &self.state)
            .field("attempts", &self.attempts)
            .finish()
    }
}
