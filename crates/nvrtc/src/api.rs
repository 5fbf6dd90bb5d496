//! The NVRTC call boundary
//!
//! [`CompilerApi`] maps one-to-one onto the native entry points. Arguments are
//! already Rust values (`&CStr`, slices, mutable byte buffers); implementations
//! do the pointer marshaling and return the native status unchanged on failure.

use crate::ffi::nvrtcProgram;
use crate::result::ResultCode;
use crate::types::Version;
use crate::{NvrtcError, Result};
use std::ffi::CStr;

/// Native program handle.
///
/// Neither `Copy` nor `Clone`: the only way to obtain one is
/// from `create_program`, and `destroy_program` nulls it, so a handle cannot
/// be released twice through safe code. Ownership of the native resource
/// lives in [`crate::Program`].
#[derive(Debug, PartialEq, Eq)]
pub struct RawProgram(nvrtcProgram);

impl RawProgram {
    pub fn null() -> Self {
        Self(std::ptr::null_mut())
    }

    /// # Safety
    /// `ptr` must be null or a live handle returned by `nvrtcCreateProgram`
    /// that no other `RawProgram` refers to.
    pub unsafe fn from_ptr(ptr: nvrtcProgram) -> Self {
        Self(ptr)
    }

    pub fn as_ptr(&self) -> nvrtcProgram {
        self.0
    }

    pub fn is_null(&self) -> bool {
        self.0.is_null()
    }

    /// Reject null (destroyed) handles before they reach the native side.
    pub fn ensure_live(&self, call: &'static str) -> Result<()> {
        if self.is_null() {
            return Err(NvrtcError::Api {
                call,
                code: ResultCode::InvalidProgram,
            });
        }
        Ok(())
    }
}

impl Default for RawProgram {
    fn default() -> Self {
        Self::null()
    }
}

/// One-to-one binding of the NVRTC entry points.
///
/// Calls block until the native library returns. Concurrent use of the same
/// [`RawProgram`] from several threads is undefined; callers serialize access
/// per handle.
pub trait CompilerApi {
    /// `nvrtcVersion`
    fn version(&self) -> Result<Version>;

    /// `nvrtcCreateProgram`. `name` of `None` passes NULL and the native side
    /// uses `"default_program"`. Empty header lists pass NULL arrays.
    fn create_program(
        &self,
        source: &CStr,
        name: Option<&CStr>,
        headers: &[&CStr],
        include_names: &[&CStr],
    ) -> Result<RawProgram>;

    /// `nvrtcDestroyProgram`. Nulls `program` on success. A null handle is
    /// rejected with [`ResultCode::InvalidProgram`] without a native call.
    fn destroy_program(&self, program: &mut RawProgram) -> Result<()>;

    /// `nvrtcCompileProgram`
    fn compile_program(&self, program: &RawProgram, options: &[&CStr]) -> Result<()>;

    /// `nvrtcGetPTXSize`, including the trailing NUL.
    fn ptx_size(&self, program: &RawProgram) -> Result<usize>;

    /// `nvrtcGetPTX`. `buffer` must hold at least [`CompilerApi::ptx_size`]
    /// bytes; shorter buffers are rejected before the native write.
    fn ptx(&self, program: &RawProgram, buffer: &mut [u8]) -> Result<()>;

    /// `nvrtcGetProgramLogSize`, including the trailing NUL.
    fn program_log_size(&self, program: &RawProgram) -> Result<usize>;

    /// `nvrtcGetProgramLog`, same buffer contract as [`CompilerApi::ptx`].
    fn program_log(&self, program: &RawProgram, buffer: &mut [u8]) -> Result<()>;

    /// `nvrtcGetErrorString`. Never fails; unrecognized codes yield
    /// `"NVRTC_ERROR unknown"`.
    fn error_string(&self, code: ResultCode) -> String;

    /// `nvrtcAddNameExpression`
    fn add_name_expression(&self, program: &RawProgram, expression: &CStr) -> Result<()>;

    /// `nvrtcGetLoweredName`. The returned name is copied out of
    /// program-owned memory.
    fn lowered_name(&self, program: &RawProgram, expression: &CStr) -> Result<String>;
}

impl<T: CompilerApi + ?Sized> CompilerApi for &T {
    fn version(&self) -> Result<Version> {
        (**self).version()
    }

    fn create_program(
        &self,
        source: &CStr,
        name: Option<&CStr>,
        headers: &[&CStr],
        include_names: &[&CStr],
    ) -> Result<RawProgram> {
        (**self).create_program(source, name, headers, include_names)
    }

    fn destroy_program(&self, program: &mut RawProgram) -> Result<()> {
        (**self).destroy_program(program)
    }

    fn compile_program(&self, program: &RawProgram, options: &[&CStr]) -> Result<()> {
        (**self).compile_program(program, options)
    }

    fn ptx_size(&self, program: &RawProgram) -> Result<usize> {
        (**self).ptx_size(program)
    }

    fn ptx(&self, program: &RawProgram, buffer: &mut [u8]) -> Result<()> {
        (**self).ptx(program, buffer)
    }

    fn program_log_size(&self, program: &RawProgram) -> Result<usize> {
        (**self).program_log_size(program)
    }

    fn program_log(&self, program: &RawProgram, buffer: &mut [u8]) -> Result<()> {
        (**self).program_log(program, buffer)
    }

    fn error_string(&self, code: ResultCode) -> String {
        (**self).error_string(code)
    }

    fn add_name_expression(&self, program: &RawProgram, expression: &CStr) -> Result<()> {
        (**self).add_name_expression(program, expression)
    }

    fn lowered_name(&self, program: &RawProgram, expression: &CStr) -> Result<String> {
        (**self).lowered_name(program, expression)
    }
}
