//! One-shot compilation
//!
//! [`Compiler`] runs the full create → compile → fetch → destroy sequence for
//! a [`CompileRequest`] and always collects the log, so callers get the
//! diagnostics without driving a [`Program`] themselves.

use crate::api::CompilerApi;
use crate::config::NvrtcConfig;
use crate::program::Program;
use crate::result::ResultCode;
use crate::types::{CompileOutput, CompileRequest, Version};
use crate::{NvrtcError, Result};
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, info, warn};

pub struct Compiler<A: CompilerApi> {
    api: A,
    config: NvrtcConfig,
}

impl<A: CompilerApi> Compiler<A> {
    pub fn new(api: A, config: NvrtcConfig) -> Self {
        Self { api, config }
    }

    pub fn version(&self) -> Result<Version> {
        self.api.version()
    }

    /// Compile `request`. A compilation failure is reported through
    /// [`CompileOutput::status`] and the log, not as an `Err`; errors are
    /// reserved for failures outside the compiler proper (creation, retrieval,
    /// invalid strings).
    pub fn compile(&self, request: &CompileRequest) -> Result<CompileOutput> {
        let name = request
            .name
            .as_deref()
            .unwrap_or(self.config.program_name.as_str());
        let mut program = Program::new(&self.api, &request.source, Some(name), &request.headers)?;

        for expression in &request.name_expressions {
            program.add_name_expression(expression)?;
        }

        let options: Vec<&str> = self
            .config
            .default_options
            .iter()
            .chain(&request.options)
            .map(String::as_str)
            .collect();
        debug!("Compiling {} with options {:?}", name, options);

        let started = Instant::now();
        let status = match program.compile(options.as_slice()) {
            Ok(()) => ResultCode::Success,
            Err(err) => match err.code() {
                Some(code) => code,
                None => return Err(err),
            },
        };
        let compile_time_ms = started.elapsed().as_secs_f64() * 1000.0;

        let log = program.log()?;
        let (ptx, lowered_names) = if status.is_success() {
            let mut lowered_names = BTreeMap::new();
            for expression in &request.name_expressions {
                lowered_names.insert(expression.clone(), program.lowered_name(expression)?);
            }
            (Some(program.ptx_string()?), lowered_names)
        } else {
            (None, BTreeMap::new())
        };

        if status.is_success() {
            info!("Compiled {} in {:.2}ms", name, compile_time_ms);
        } else {
            warn!(
                "Compilation of {} failed: {}",
                name,
                self.api.error_string(status)
            );
        }

        program.destroy()?;

        Ok(CompileOutput {
            program_name: name.to_string(),
            status,
            ptx,
            log,
            lowered_names,
            compile_time_ms,
        })
    }

    /// Like [`Compiler::compile`], but a failed compilation is an
    /// [`NvrtcError::Compilation`] carrying the log.
    pub fn compile_ptx(&self, request: &CompileRequest) -> Result<String> {
        let output = self.compile(request)?;
        match output.ptx {
            Some(ptx) if output.status.is_success() => Ok(ptx),
            _ => Err(NvrtcError::Compilation {
                code: output.status,
                log: output.log,
            }),
        }
    }
}
