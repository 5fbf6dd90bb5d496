//! NVRTC result codes

use crate::ffi::{self, nvrtcResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Description returned for codes outside the known set, matching the
/// native `nvrtcGetErrorString` fallback.
pub const UNKNOWN_DESCRIPTION: &str = "NVRTC_ERROR unknown";

/// Status of an NVRTC call.
///
/// The discriminants match the native header. Codes introduced by libraries
/// newer than this crate are carried as [`ResultCode::Unknown`] with their raw
/// value, so matching on a `ResultCode` never has to be exhaustive over the
/// native enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResultCode {
    Success,
    OutOfMemory,
    ProgramCreationFailure,
    InvalidInput,
    InvalidProgram,
    InvalidOption,
    Compilation,
    BuiltinOperationFailure,
    NoNameExpressionsAfterCompilation,
    NoLoweredNamesBeforeCompilation,
    NameExpressionNotValid,
    InternalError,
    Unknown(i32),
}

impl ResultCode {
    /// Every recognized code, in native order.
    pub const KNOWN: [ResultCode; 12] = [
        ResultCode::Success,
        ResultCode::OutOfMemory,
        ResultCode::ProgramCreationFailure,
        ResultCode::InvalidInput,
        ResultCode::InvalidProgram,
        ResultCode::InvalidOption,
        ResultCode::Compilation,
        ResultCode::BuiltinOperationFailure,
        ResultCode::NoNameExpressionsAfterCompilation,
        ResultCode::NoLoweredNamesBeforeCompilation,
        ResultCode::NameExpressionNotValid,
        ResultCode::InternalError,
    ];

    pub fn from_raw(raw: nvrtcResult) -> Self {
        match raw {
            ffi::NVRTC_SUCCESS => ResultCode::Success,
            ffi::NVRTC_ERROR_OUT_OF_MEMORY => ResultCode::OutOfMemory,
            ffi::NVRTC_ERROR_PROGRAM_CREATION_FAILURE => ResultCode::ProgramCreationFailure,
            ffi::NVRTC_ERROR_INVALID_INPUT => ResultCode::InvalidInput,
            ffi::NVRTC_ERROR_INVALID_PROGRAM => ResultCode::InvalidProgram,
            ffi::NVRTC_ERROR_INVALID_OPTION => ResultCode::InvalidOption,
            ffi::NVRTC_ERROR_COMPILATION => ResultCode::Compilation,
            ffi::NVRTC_ERROR_BUILTIN_OPERATION_FAILURE => ResultCode::BuiltinOperationFailure,
            ffi::NVRTC_ERROR_NO_NAME_EXPRESSIONS_AFTER_COMPILATION => {
                ResultCode::NoNameExpressionsAfterCompilation
            }
            ffi::NVRTC_ERROR_NO_LOWERED_NAMES_BEFORE_COMPILATION => {
                ResultCode::NoLoweredNamesBeforeCompilation
            }
            ffi::NVRTC_ERROR_NAME_EXPRESSION_NOT_VALID => ResultCode::NameExpressionNotValid,
            ffi::NVRTC_ERROR_INTERNAL_ERROR => ResultCode::InternalError,
            other => ResultCode::Unknown(other),
        }
    }

    pub fn as_raw(self) -> nvrtcResult {
        match self {
            ResultCode::Success => ffi::NVRTC_SUCCESS,
            ResultCode::OutOfMemory => ffi::NVRTC_ERROR_OUT_OF_MEMORY,
            ResultCode::ProgramCreationFailure => ffi::NVRTC_ERROR_PROGRAM_CREATION_FAILURE,
            ResultCode::InvalidInput => ffi::NVRTC_ERROR_INVALID_INPUT,
            ResultCode::InvalidProgram => ffi::NVRTC_ERROR_INVALID_PROGRAM,
            ResultCode::InvalidOption => ffi::NVRTC_ERROR_INVALID_OPTION,
            ResultCode::Compilation => ffi::NVRTC_ERROR_COMPILATION,
            ResultCode::BuiltinOperationFailure => ffi::NVRTC_ERROR_BUILTIN_OPERATION_FAILURE,
            ResultCode::NoNameExpressionsAfterCompilation => {
                ffi::NVRTC_ERROR_NO_NAME_EXPRESSIONS_AFTER_COMPILATION
            }
            ResultCode::NoLoweredNamesBeforeCompilation => {
                ffi::NVRTC_ERROR_NO_LOWERED_NAMES_BEFORE_COMPILATION
            }
            ResultCode::NameExpressionNotValid => ffi::NVRTC_ERROR_NAME_EXPRESSION_NOT_VALID,
            ResultCode::InternalError => ffi::NVRTC_ERROR_INTERNAL_ERROR,
            ResultCode::Unknown(raw) => raw,
        }
    }

    pub fn is_success(self) -> bool {
        self == ResultCode::Success
    }

    /// Convert to a `Result`, tagging failures with the entry point that
    /// produced them.
    pub fn check(self, call: &'static str) -> crate::Result<()> {
        if self.is_success() {
            Ok(())
        } else {
            Err(crate::NvrtcError::Api { call, code: self })
        }
    }

    /// Local stringification, identical to what the native
    /// `nvrtcGetErrorString` returns for the same code.
    pub fn description(self) -> &'static str {
        match self {
            ResultCode::Success => "NVRTC_SUCCESS",
            ResultCode::OutOfMemory => "NVRTC_ERROR_OUT_OF_MEMORY",
            ResultCode::ProgramCreationFailure => "NVRTC_ERROR_PROGRAM_CREATION_FAILURE",
            ResultCode::InvalidInput => "NVRTC_ERROR_INVALID_INPUT",
            ResultCode::InvalidProgram => "NVRTC_ERROR_INVALID_PROGRAM",
            ResultCode::InvalidOption => "NVRTC_ERROR_INVALID_OPTION",
            ResultCode::Compilation => "NVRTC_ERROR_COMPILATION",
            ResultCode::BuiltinOperationFailure => "NVRTC_ERROR_BUILTIN_OPERATION_FAILURE",
            ResultCode::NoNameExpressionsAfterCompilation => {
                "NVRTC_ERROR_NO_NAME_EXPRESSIONS_AFTER_COMPILATION"
            }
            ResultCode::NoLoweredNamesBeforeCompilation => {
                "NVRTC_ERROR_NO_LOWERED_NAMES_BEFORE_COMPILATION"
            }
            ResultCode::NameExpressionNotValid => "NVRTC_ERROR_NAME_EXPRESSION_NOT_VALID",
            ResultCode::InternalError => "NVRTC_ERROR_INTERNAL_ERROR",
            ResultCode::Unknown(_) => UNKNOWN_DESCRIPTION,
        }
    }
}

impl From<nvrtcResult> for ResultCode {
    fn from(raw: nvrtcResult) -> Self {
        ResultCode::from_raw(raw)
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultCode::Unknown(raw) => write!(f, "{UNKNOWN_DESCRIPTION} ({raw})"),
            known => f.write_str(known.description()),
        }
    }
}
