//! In-memory stand-in for the native library used by unit tests
//!
//! Follows the observable NVRTC contract: sizes include the trailing NUL,
//! a failed compile leaves a log but no PTX, name expressions must be added
//! before compiling and lowered names only exist afterwards.

use crate::api::{CompilerApi, RawProgram};
use crate::result::ResultCode;
use crate::types::Version;
use crate::{NvrtcError, Result};
use std::cell::RefCell;
use std::collections::HashMap;
use std::ffi::CStr;

/// Source text containing this marker fails to compile.
pub const SYNTAX_ERROR: &str = "@@syntax_error@@";

#[derive(Debug, Default)]
struct FakeProgram {
    source: String,
    name: Option<String>,
    headers: Vec<(String, String)>,
    options: Vec<String>,
    compiled: Option<bool>,
    name_expressions: Vec<String>,
    ptx: Vec<u8>,
    log: Vec<u8>,
}

#[derive(Debug, Default)]
struct State {
    next_id: usize,
    programs: HashMap<usize, FakeProgram>,
    created: usize,
    destroyed: usize,
    null_header_arrays: usize,
    last_options: Vec<String>,
}

#[derive(Debug, Default)]
pub struct FakeCompiler {
    state: RefCell<State>,
}

fn text(value: &CStr) -> String {
    value.to_string_lossy().into_owned()
}

fn with_nul(text: &str) -> Vec<u8> {
    let mut bytes = text.as_bytes().to_vec();
    bytes.push(0);
    bytes
}

impl FakeCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn created(&self) -> usize {
        self.state.borrow().created
    }

    pub fn destroyed(&self) -> usize {
        self.state.borrow().destroyed
    }

    pub fn live_programs(&self) -> usize {
        self.state.borrow().programs.len()
    }

    /// Number of create calls made with zero headers.
    pub fn null_header_arrays(&self) -> usize {
        self.state.borrow().null_header_arrays
    }

    /// Options passed to the most recent compile call.
    pub fn last_options(&self) -> Vec<String> {
        self.state.borrow().last_options.clone()
    }

    fn with_program<T>(
        &self,
        program: &RawProgram,
        call: &'static str,
        f: impl FnOnce(&mut FakeProgram) -> Result<T>,
    ) -> Result<T> {
        program.ensure_live(call)?;
        let mut state = self.state.borrow_mut();
        let entry = state
            .programs
            .get_mut(&(program.as_ptr() as usize))
            .ok_or(NvrtcError::Api {
                call,
                code: ResultCode::InvalidProgram,
            })?;
        f(entry)
    }
}

fn lowered(expression: &str) -> String {
    let bare = expression.trim_start_matches('&');
    format!("_Z{}{}v", bare.len(), bare)
}

impl CompilerApi for FakeCompiler {
    fn version(&self) -> Result<Version> {
        Ok(Version::new(12, 4))
    }

    fn create_program(
        &self,
        source: &CStr,
        name: Option<&CStr>,
        headers: &[&CStr],
        include_names: &[&CStr],
    ) -> Result<RawProgram> {
        if headers.len() != include_names.len() {
            return Err(NvrtcError::HeaderMismatch {
                headers: headers.len(),
                include_names: include_names.len(),
            });
        }
        let mut state = self.state.borrow_mut();
        if headers.is_empty() {
            state.null_header_arrays += 1;
        }
        state.next_id += 1;
        // Handles are fake addresses; keep them aligned and non-null.
        let id = state.next_id * 16;
        state.programs.insert(
            id,
            FakeProgram {
                source: text(source),
                name: name.map(text),
                headers: include_names
                    .iter()
                    .zip(headers)
                    .map(|(include, header)| (text(include), text(header)))
                    .collect(),
                ..FakeProgram::default()
            },
        );
        state.created += 1;
        // SAFETY: the fake never dereferences handles.
        Ok(unsafe { RawProgram::from_ptr(id as crate::ffi::nvrtcProgram) })
    }

    fn destroy_program(&self, program: &mut RawProgram) -> Result<()> {
        program.ensure_live("nvrtcDestroyProgram")?;
        let mut state = self.state.borrow_mut();
        if state
            .programs
            .remove(&(program.as_ptr() as usize))
            .is_none()
        {
            return Err(NvrtcError::Api {
                call: "nvrtcDestroyProgram",
                code: ResultCode::InvalidProgram,
            });
        }
        state.destroyed += 1;
        *program = RawProgram::null();
        Ok(())
    }

    fn compile_program(&self, program: &RawProgram, options: &[&CStr]) -> Result<()> {
        let options: Vec<String> = options.iter().map(|o| text(o)).collect();
        self.state.borrow_mut().last_options = options.clone();
        self.with_program(program, "nvrtcCompileProgram", |p| {
            p.options = options;
            let name = p.name.clone().unwrap_or_else(|| "default_program".into());

            if let Some(bad) = p.options.iter().find(|o| !o.starts_with('-')) {
                p.compiled = Some(false);
                p.ptx.clear();
                p.log = with_nul(&format!("nvrtc: error: invalid option '{bad}'\n"));
                return Err(NvrtcError::Api {
                    call: "nvrtcCompileProgram",
                    code: ResultCode::InvalidOption,
                });
            }

            let missing_header = p
                .source
                .lines()
                .filter_map(|line| line.trim().strip_prefix("#include \""))
                .map(|rest| rest.trim_end_matches('"'))
                .find(|include| !p.headers.iter().any(|(known, _)| known.as_str() == *include))
                .map(str::to_string);

            if p.source.contains(SYNTAX_ERROR) || missing_header.is_some() {
                let message = match missing_header {
                    Some(include) => format!("{name}(1): catastrophic error: cannot open source file \"{include}\"\n"),
                    None => format!("{name}(1): error: expected a declaration\n"),
                };
                p.compiled = Some(false);
                p.ptx.clear();
                p.log = with_nul(&format!("{message}\n1 error detected in the compilation of \"{name}\".\n"));
                return Err(NvrtcError::Api {
                    call: "nvrtcCompileProgram",
                    code: ResultCode::Compilation,
                });
            }

            p.compiled = Some(true);
            p.ptx = with_nul(&format!(
                "//\n// Generated by NVIDIA NVVM Compiler\n// {name}\n//\n\n.version 8.4\n.target sm_52\n.address_size 64\n"
            ));
            p.log = vec![0];
            Ok(())
        })
    }

    fn ptx_size(&self, program: &RawProgram) -> Result<usize> {
        self.with_program(program, "nvrtcGetPTXSize", |p| match p.compiled {
            Some(true) => Ok(p.ptx.len()),
            _ => Err(NvrtcError::Api {
                call: "nvrtcGetPTXSize",
                code: ResultCode::InvalidProgram,
            }),
        })
    }

    fn ptx(&self, program: &RawProgram, buffer: &mut [u8]) -> Result<()> {
        self.with_program(program, "nvrtcGetPTX", |p| {
            if buffer.len() < p.ptx.len() {
                return Err(NvrtcError::BufferTooSmall {
                    required: p.ptx.len(),
                    provided: buffer.len(),
                });
            }
            buffer[..p.ptx.len()].copy_from_slice(&p.ptx);
            Ok(())
        })
    }

    fn program_log_size(&self, program: &RawProgram) -> Result<usize> {
        self.with_program(program, "nvrtcGetProgramLogSize", |p| {
            Ok(p.log.len().max(1))
        })
    }

    fn program_log(&self, program: &RawProgram, buffer: &mut [u8]) -> Result<()> {
        self.with_program(program, "nvrtcGetProgramLog", |p| {
            let log = if p.log.is_empty() { vec![0] } else { p.log.clone() };
            if buffer.len() < log.len() {
                return Err(NvrtcError::BufferTooSmall {
                    required: log.len(),
                    provided: buffer.len(),
                });
            }
            buffer[..log.len()].copy_from_slice(&log);
            Ok(())
        })
    }

    fn error_string(&self, code: ResultCode) -> String {
        code.description().to_string()
    }

    fn add_name_expression(&self, program: &RawProgram, expression: &CStr) -> Result<()> {
        self.with_program(program, "nvrtcAddNameExpression", |p| {
            if p.compiled.is_some() {
                return Err(NvrtcError::Api {
                    call: "nvrtcAddNameExpression",
                    code: ResultCode::NoNameExpressionsAfterCompilation,
                });
            }
            p.name_expressions.push(text(expression));
            Ok(())
        })
    }

    fn lowered_name(&self, program: &RawProgram, expression: &CStr) -> Result<String> {
        self.with_program(program, "nvrtcGetLoweredName", |p| {
            if p.compiled != Some(true) {
                return Err(NvrtcError::Api {
                    call: "nvrtcGetLoweredName",
                    code: ResultCode::NoLoweredNamesBeforeCompilation,
                });
            }
            let expression = text(expression);
            if !p.name_expressions.contains(&expression) {
                return Err(NvrtcError::Api {
                    call: "nvrtcGetLoweredName",
                    code: ResultCode::NameExpressionNotValid,
                });
            }
            Ok(lowered(&expression))
        })
    }
}
