//! NVRTC C ABI declarations
//!
//! Raw types and function-pointer signatures for the entry points exported by
//! the NVRTC shared library. Symbols are resolved at run time by
//! [`crate::library::NvrtcLibrary`], so nothing here links against the
//! library directly.

#![allow(non_camel_case_types)]
#![allow(non_snake_case)]

use libc::{c_char, c_int, size_t};

/// Status code returned by every NVRTC entry point.
/// Plain `c_int`: newer libraries return values outside the set below.
pub type nvrtcResult = c_int;

pub const NVRTC_SUCCESS: nvrtcResult = 0;
pub const NVRTC_ERROR_OUT_OF_MEMORY: nvrtcResult = 1;
pub const NVRTC_ERROR_PROGRAM_CREATION_FAILURE: nvrtcResult = 2;
pub const NVRTC_ERROR_INVALID_INPUT: nvrtcResult = 3;
pub const NVRTC_ERROR_INVALID_PROGRAM: nvrtcResult = 4;
pub const NVRTC_ERROR_INVALID_OPTION: nvrtcResult = 5;
pub const NVRTC_ERROR_COMPILATION: nvrtcResult = 6;
pub const NVRTC_ERROR_BUILTIN_OPERATION_FAILURE: nvrtcResult = 7;
pub const NVRTC_ERROR_NO_NAME_EXPRESSIONS_AFTER_COMPILATION: nvrtcResult = 8;
pub const NVRTC_ERROR_NO_LOWERED_NAMES_BEFORE_COMPILATION: nvrtcResult = 9;
pub const NVRTC_ERROR_NAME_EXPRESSION_NOT_VALID: nvrtcResult = 10;
pub const NVRTC_ERROR_INTERNAL_ERROR: nvrtcResult = 11;

#[repr(C)]
pub struct _nvrtcProgram {
    _private: [u8; 0],
}

/// Opaque program handle owned by the native library.
pub type nvrtcProgram = *mut _nvrtcProgram;

pub type nvrtcGetErrorString_t = unsafe extern "C" fn(result: nvrtcResult) -> *const c_char;

pub type nvrtcVersion_t = unsafe extern "C" fn(major: *mut c_int, minor: *mut c_int) -> nvrtcResult;

pub type nvrtcCreateProgram_t = unsafe extern "C" fn(
    prog: *mut nvrtcProgram,
    src: *const c_char,
    name: *const c_char,
    numHeaders: c_int,
    headers: *const *const c_char,
    includeNames: *const *const c_char,
) -> nvrtcResult;

pub type nvrtcDestroyProgram_t = unsafe extern "C" fn(prog: *mut nvrtcProgram) -> nvrtcResult;

pub type nvrtcCompileProgram_t = unsafe extern "C" fn(
    prog: nvrtcProgram,
    numOptions: c_int,
    options: *const *const c_char,
) -> nvrtcResult;

pub type nvrtcGetPTXSize_t =
    unsafe extern "C" fn(prog: nvrtcProgram, ptxSizeRet: *mut size_t) -> nvrtcResult;

pub type nvrtcGetPTX_t = unsafe extern "C" fn(prog: nvrtcProgram, ptx: *mut c_char) -> nvrtcResult;

pub type nvrtcGetProgramLogSize_t =
    unsafe extern "C" fn(prog: nvrtcProgram, logSizeRet: *mut size_t) -> nvrtcResult;

pub type nvrtcGetProgramLog_t =
    unsafe extern "C" fn(prog: nvrtcProgram, log: *mut c_char) -> nvrtcResult;

// Name expressions appeared in CUDA 8.0; older libraries lack these symbols.
pub type nvrtcAddNameExpression_t =
    unsafe extern "C" fn(prog: nvrtcProgram, name_expression: *const c_char) -> nvrtcResult;

pub type nvrtcGetLoweredName_t = unsafe extern "C" fn(
    prog: nvrtcProgram,
    name_expression: *const c_char,
    lowered_name: *mut *const c_char,
) -> nvrtcResult;

/// NUL-terminated symbol names, as passed to `libloading::Library::get`.
pub mod symbols {
    pub const GET_ERROR_STRING: &[u8] = b"nvrtcGetErrorString\0";
    pub const VERSION: &[u8] = b"nvrtcVersion\0";
    pub const CREATE_PROGRAM: &[u8] = b"nvrtcCreateProgram\0";
    pub const DESTROY_PROGRAM: &[u8] = b"nvrtcDestroyProgram\0";
    pub const COMPILE_PROGRAM: &[u8] = b"nvrtcCompileProgram\0";
    pub const GET_PTX_SIZE: &[u8] = b"nvrtcGetPTXSize\0";
    pub const GET_PTX: &[u8] = b"nvrtcGetPTX\0";
    pub const GET_PROGRAM_LOG_SIZE: &[u8] = b"nvrtcGetProgramLogSize\0";
    pub const GET_PROGRAM_LOG: &[u8] = b"nvrtcGetProgramLog\0";
    pub const ADD_NAME_EXPRESSION: &[u8] = b"nvrtcAddNameExpression\0";
    pub const GET_LOWERED_NAME: &[u8] = b"nvrtcGetLoweredName\0";

    /// Symbol name without the trailing NUL, for error messages.
    pub fn display(symbol: &[u8]) -> &str {
        let trimmed = symbol.strip_suffix(b"\0").unwrap_or(symbol);
        std::str::from_utf8(trimmed).unwrap_or("<non-utf8 symbol>")
    }
}
