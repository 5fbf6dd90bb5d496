//! Run-time loading of the NVRTC shared library
//!
//! The library is opened with `libloading` instead of being linked, so the
//! choice of binary (bitness, CUDA release) is made at load time: an explicit
//! path from [`NvrtcConfig`] wins, otherwise [`candidate_names`] is tried in
//! order.

use crate::api::{CompilerApi, RawProgram};
use crate::config::NvrtcConfig;
use crate::ffi::{self, symbols};
use crate::result::ResultCode;
use crate::types::Version;
use crate::{NvrtcError, Result};
use libc::{c_char, c_int, size_t};
use libloading::Library;
use std::ffi::CStr;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Windows DLL suffixes, newest release first.
#[cfg(windows)]
const WINDOWS_RELEASES: &[&str] = &[
    "120_0", "112_0", "111_0", "110_0", "102_0", "101_0", "100_0", "92", "91", "90", "80", "75",
];

/// Library names tried, in order, when no explicit path is configured.
#[cfg(windows)]
pub fn candidate_names() -> Vec<String> {
    let bits = if cfg!(target_pointer_width = "64") {
        "64"
    } else {
        "32"
    };
    WINDOWS_RELEASES
        .iter()
        .map(|release| format!("nvrtc{bits}_{release}.dll"))
        .collect()
}

/// Library names tried, in order, when no explicit path is configured.
#[cfg(target_os = "macos")]
pub fn candidate_names() -> Vec<String> {
    vec!["libnvrtc.dylib".to_string()]
}

/// Library names tried, in order, when no explicit path is configured.
#[cfg(not(any(windows, target_os = "macos")))]
pub fn candidate_names() -> Vec<String> {
    [
        "libnvrtc.so",
        "libnvrtc.so.12",
        "libnvrtc.so.11.2",
        "libnvrtc.so.11.0",
        "libnvrtc.so.10.2",
    ]
    .iter()
    .map(|name| name.to_string())
    .collect()
}

/// Entry points resolved from the loaded library.
struct Symbols {
    get_error_string: ffi::nvrtcGetErrorString_t,
    version: ffi::nvrtcVersion_t,
    create_program: ffi::nvrtcCreateProgram_t,
    destroy_program: ffi::nvrtcDestroyProgram_t,
    compile_program: ffi::nvrtcCompileProgram_t,
    get_ptx_size: ffi::nvrtcGetPTXSize_t,
    get_ptx: ffi::nvrtcGetPTX_t,
    get_program_log_size: ffi::nvrtcGetProgramLogSize_t,
    get_program_log: ffi::nvrtcGetProgramLog_t,
    add_name_expression: Option<ffi::nvrtcAddNameExpression_t>,
    get_lowered_name: Option<ffi::nvrtcGetLoweredName_t>,
}

impl Symbols {
    /// # Safety
    /// `library` must be an NVRTC build whose exports match the signatures
    /// declared in [`crate::ffi`].
    unsafe fn resolve(library: &Library) -> Result<Self> {
        Ok(Self {
            get_error_string: required(library, symbols::GET_ERROR_STRING)?,
            version: required(library, symbols::VERSION)?,
            create_program: required(library, symbols::CREATE_PROGRAM)?,
            destroy_program: required(library, symbols::DESTROY_PROGRAM)?,
            compile_program: required(library, symbols::COMPILE_PROGRAM)?,
            get_ptx_size: required(library, symbols::GET_PTX_SIZE)?,
            get_ptx: required(library, symbols::GET_PTX)?,
            get_program_log_size: required(library, symbols::GET_PROGRAM_LOG_SIZE)?,
            get_program_log: required(library, symbols::GET_PROGRAM_LOG)?,
            add_name_expression: optional(library, symbols::ADD_NAME_EXPRESSION),
            get_lowered_name: optional(library, symbols::GET_LOWERED_NAME),
        })
    }
}

unsafe fn required<T: Copy>(library: &Library, symbol: &'static [u8]) -> Result<T> {
    library
        .get::<T>(symbol)
        .map(|resolved| *resolved)
        .map_err(|source| NvrtcError::MissingSymbol {
            symbol: symbols::display(symbol),
            source,
        })
}

unsafe fn optional<T: Copy>(library: &Library, symbol: &'static [u8]) -> Option<T> {
    match library.get::<T>(symbol) {
        Ok(resolved) => Some(*resolved),
        Err(_) => {
            debug!("Optional symbol {} not exported", symbols::display(symbol));
            None
        }
    }
}

/// A loaded NVRTC library.
///
/// The function pointers stay valid for as long as `_library` is held, which
/// is the lifetime of this value. It is `None` only for in-process symbol
/// tables, which have no library to keep open.
pub struct NvrtcLibrary {
    api: Symbols,
    path: PathBuf,
    _library: Option<Library>,
}

impl NvrtcLibrary {
    /// Load using the default candidate list.
    pub fn load() -> Result<Self> {
        Self::from_config(&NvrtcConfig::default())
    }

    /// Load the library named by `config.library_path`, or the first
    /// candidate that opens when no path is configured.
    pub fn from_config(config: &NvrtcConfig) -> Result<Self> {
        match &config.library_path {
            Some(path) => Self::open(path),
            None => Self::open_first(candidate_names()),
        }
    }

    /// Load a specific library file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        // SAFETY: loading runs the library's initializers; NVRTC has no
        // initialization side effects beyond its own state.
        let library = unsafe { Library::new(path) }.map_err(|source| NvrtcError::LibraryLoad {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_library(library, path.to_path_buf())
    }

    /// Try each name in order and keep the first that opens.
    pub fn open_first<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut tried = Vec::new();
        for name in names {
            let name = name.as_ref();
            // SAFETY: as in `open`.
            match unsafe { Library::new(name) } {
                Ok(library) => return Self::from_library(library, PathBuf::from(name)),
                Err(e) => {
                    debug!("Could not open {}: {}", name, e);
                    tried.push(name.to_string());
                }
            }
        }
        Err(NvrtcError::LibraryNotFound { tried })
    }

    fn from_library(library: Library, path: PathBuf) -> Result<Self> {
        // SAFETY: the library was opened under an NVRTC name; the declared
        // signatures follow nvrtc.h.
        let api = unsafe { Symbols::resolve(&library)? };
        info!("Loaded NVRTC library from {}", path.display());
        Ok(Self {
            api,
            path,
            _library: Some(library),
        })
    }

    #[cfg(test)]
    fn from_symbols(api: Symbols) -> Self {
        Self {
            api,
            path: PathBuf::from("<in-process>"),
            _library: None,
        }
    }

    /// Path or name the library was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the optional name-expression entry points are available.
    pub fn supports_name_expressions(&self) -> bool {
        self.api.add_name_expression.is_some() && self.api.get_lowered_name.is_some()
    }
}

impl std::fmt::Debug for NvrtcLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NvrtcLibrary")
            .field("path", &self.path)
            .field("name_expressions", &self.supports_name_expressions())
            .finish()
    }
}

fn c_count(what: &'static str, count: usize) -> Result<c_int> {
    c_int::try_from(count).map_err(|_| NvrtcError::TooManyEntries { what, count })
}

fn pointer_array(strings: &[&CStr]) -> Vec<*const c_char> {
    strings.iter().map(|s| s.as_ptr()).collect()
}

/// NULL for an empty array, as the native side permits when the count is 0.
fn array_or_null(pointers: &[*const c_char]) -> *const *const c_char {
    if pointers.is_empty() {
        std::ptr::null()
    } else {
        pointers.as_ptr()
    }
}

fn ensure_capacity(required: usize, provided: usize) -> Result<()> {
    if provided < required {
        return Err(NvrtcError::BufferTooSmall { required, provided });
    }
    Ok(())
}

const VERSION: &str = "nvrtcVersion";
const CREATE_PROGRAM: &str = "nvrtcCreateProgram";
const DESTROY_PROGRAM: &str = "nvrtcDestroyProgram";
const COMPILE_PROGRAM: &str = "nvrtcCompileProgram";
const GET_PTX_SIZE: &str = "nvrtcGetPTXSize";
const GET_PTX: &str = "nvrtcGetPTX";
const GET_PROGRAM_LOG_SIZE: &str = "nvrtcGetProgramLogSize";
const GET_PROGRAM_LOG: &str = "nvrtcGetProgramLog";
const ADD_NAME_EXPRESSION: &str = "nvrtcAddNameExpression";
const GET_LOWERED_NAME: &str = "nvrtcGetLoweredName";

impl CompilerApi for NvrtcLibrary {
    fn version(&self) -> Result<Version> {
        let mut major: c_int = 0;
        let mut minor: c_int = 0;
        let code = unsafe { (self.api.version)(&mut major, &mut minor) };
        ResultCode::from_raw(code).check(VERSION)?;
        Ok(Version::new(major, minor))
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
        let num_headers = c_count("headers", headers.len())?;
        let header_ptrs = pointer_array(headers);
        let include_ptrs = pointer_array(include_names);

        let mut program: ffi::nvrtcProgram = std::ptr::null_mut();
        let code = unsafe {
            (self.api.create_program)(
                &mut program,
                source.as_ptr(),
                name.map_or(std::ptr::null(), CStr::as_ptr),
                num_headers,
                array_or_null(&header_ptrs),
                array_or_null(&include_ptrs),
            )
        };
        ResultCode::from_raw(code).check(CREATE_PROGRAM)?;
        debug!("Created NVRTC program {:p} with {} headers", program, num_headers);
        // SAFETY: freshly returned by nvrtcCreateProgram and not shared.
        Ok(unsafe { RawProgram::from_ptr(program) })
    }

    fn destroy_program(&self, program: &mut RawProgram) -> Result<()> {
        program.ensure_live(DESTROY_PROGRAM)?;
        let mut raw = program.as_ptr();
        let code = unsafe { (self.api.destroy_program)(&mut raw) };
        ResultCode::from_raw(code).check(DESTROY_PROGRAM)?;
        debug!("Destroyed NVRTC program {:p}", program.as_ptr());
        *program = RawProgram::null();
        Ok(())
    }

    fn compile_program(&self, program: &RawProgram, options: &[&CStr]) -> Result<()> {
        program.ensure_live(COMPILE_PROGRAM)?;
        let num_options = c_count("options", options.len())?;
        let option_ptrs = pointer_array(options);
        let code = unsafe {
            (self.api.compile_program)(program.as_ptr(), num_options, array_or_null(&option_ptrs))
        };
        ResultCode::from_raw(code).check(COMPILE_PROGRAM)
    }

    fn ptx_size(&self, program: &RawProgram) -> Result<usize> {
        program.ensure_live(GET_PTX_SIZE)?;
        let mut size: size_t = 0;
        let code = unsafe { (self.api.get_ptx_size)(program.as_ptr(), &mut size) };
        ResultCode::from_raw(code).check(GET_PTX_SIZE)?;
        Ok(size)
    }

    fn ptx(&self, program: &RawProgram, buffer: &mut [u8]) -> Result<()> {
        let required = self.ptx_size(program)?;
        ensure_capacity(required, buffer.len())?;
        let code = unsafe { (self.api.get_ptx)(program.as_ptr(), buffer.as_mut_ptr().cast()) };
        ResultCode::from_raw(code).check(GET_PTX)
    }

    fn program_log_size(&self, program: &RawProgram) -> Result<usize> {
        program.ensure_live(GET_PROGRAM_LOG_SIZE)?;
        let mut size: size_t = 0;
        let code = unsafe { (self.api.get_program_log_size)(program.as_ptr(), &mut size) };
        ResultCode::from_raw(code).check(GET_PROGRAM_LOG_SIZE)?;
        Ok(size)
    }

    fn program_log(&self, program: &RawProgram, buffer: &mut [u8]) -> Result<()> {
        let required = self.program_log_size(program)?;
        ensure_capacity(required, buffer.len())?;
        let code =
            unsafe { (self.api.get_program_log)(program.as_ptr(), buffer.as_mut_ptr().cast()) };
        ResultCode::from_raw(code).check(GET_PROGRAM_LOG)
    }

    fn error_string(&self, code: ResultCode) -> String {
        let message = unsafe { (self.api.get_error_string)(code.as_raw()) };
        if message.is_null() {
            return code.description().to_string();
        }
        // SAFETY: non-null results point at static NUL-terminated strings.
        unsafe { CStr::from_ptr(message) }
            .to_string_lossy()
            .into_owned()
    }

    fn add_name_expression(&self, program: &RawProgram, expression: &CStr) -> Result<()> {
        let add = self.api.add_name_expression.ok_or(NvrtcError::Unsupported {
            symbol: ADD_NAME_EXPRESSION,
        })?;
        program.ensure_live(ADD_NAME_EXPRESSION)?;
        let code = unsafe { add(program.as_ptr(), expression.as_ptr()) };
        ResultCode::from_raw(code).check(ADD_NAME_EXPRESSION)
    }

    fn lowered_name(&self, program: &RawProgram, expression: &CStr) -> Result<String> {
        let lower = self.api.get_lowered_name.ok_or(NvrtcError::Unsupported {
            symbol: GET_LOWERED_NAME,
        })?;
        program.ensure_live(GET_LOWERED_NAME)?;
        let mut lowered: *const c_char = std::ptr::null();
        let code = unsafe { lower(program.as_ptr(), expression.as_ptr(), &mut lowered) };
        ResultCode::from_raw(code).check(GET_LOWERED_NAME)?;
        if lowered.is_null() {
            return Err(NvrtcError::Api {
                call: GET_LOWERED_NAME,
                code: ResultCode::InternalError,
            });
        }
        // SAFETY: the string lives as long as the program; it is copied here.
        Ok(unsafe { CStr::from_ptr(lowered) }
            .to_string_lossy()
            .into_owned())
    }
}


/// The real binding driven through a table of in-process entry points that
/// record what crosses the boundary.
#[cfg(test)]
mod binding_tests {
    use super::*;
    use crate::program::Program;
    use std::cell::RefCell;
    use std::ffi::CString;

    const PTX: &[u8] = b".version 8.4\n.target sm_52\n\0";
    const LOG: &[u8] = b"stub.cu(1): warning: variable \"x\" was declared but never referenced\n\0";
    const STUB_HANDLE: usize = 0x40;

    #[derive(Debug, Default)]
    struct Calls {
        created: usize,
        name_null: bool,
        num_headers: Option<c_int>,
        headers_null: bool,
        include_names_null: bool,
        first_include: Option<String>,
        compiled: usize,
        num_options: Option<c_int>,
        options_null: bool,
        options: Vec<String>,
        destroyed: usize,
        get_ptx: usize,
        get_log: usize,
    }

    thread_local! {
        static CALLS: RefCell<Calls> = RefCell::new(Calls::default());
    }

    fn record(f: impl FnOnce(&mut Calls)) {
        CALLS.with(|calls| f(&mut calls.borrow_mut()));
    }

    fn calls<T>(f: impl FnOnce(&Calls) -> T) -> T {
        CALLS.with(|calls| f(&calls.borrow()))
    }

    unsafe fn lossy(ptr: *const c_char) -> String {
        CStr::from_ptr(ptr).to_string_lossy().into_owned()
    }

    unsafe extern "C" fn stub_get_error_string(result: ffi::nvrtcResult) -> *const c_char {
        match result {
            ffi::NVRTC_ERROR_COMPILATION => b"NVRTC_ERROR_COMPILATION\0".as_ptr().cast(),
            _ => std::ptr::null(),
        }
    }

    unsafe extern "C" fn stub_version(major: *mut c_int, minor: *mut c_int) -> ffi::nvrtcResult {
        *major = 12;
        *minor = 4;
        ffi::NVRTC_SUCCESS
    }

    unsafe extern "C" fn stub_create_program(
        prog: *mut ffi::nvrtcProgram,
        _src: *const c_char,
        name: *const c_char,
        num_headers: c_int,
        headers: *const *const c_char,
        include_names: *const *const c_char,
    ) -> ffi::nvrtcResult {
        let first_include = if num_headers > 0 && !include_names.is_null() {
            Some(lossy(*include_names))
        } else {
            None
        };
        record(|c| {
            c.created += 1;
            c.name_null = name.is_null();
            c.num_headers = Some(num_headers);
            c.headers_null = headers.is_null();
            c.include_names_null = include_names.is_null();
            c.first_include = first_include;
        });
        *prog = STUB_HANDLE as ffi::nvrtcProgram;
        ffi::NVRTC_SUCCESS
    }

    unsafe extern "C" fn stub_destroy_program(prog: *mut ffi::nvrtcProgram) -> ffi::nvrtcResult {
        record(|c| c.destroyed += 1);
        *prog = std::ptr::null_mut();
        ffi::NVRTC_SUCCESS
    }

    unsafe extern "C" fn stub_compile_program(
        _prog: ffi::nvrtcProgram,
        num_options: c_int,
        options: *const *const c_char,
    ) -> ffi::nvrtcResult {
        let mut seen = Vec::new();
        if !options.is_null() {
            for index in 0..num_options as usize {
                seen.push(lossy(*options.add(index)));
            }
        }
        record(|c| {
            c.compiled += 1;
            c.num_options = Some(num_options);
            c.options_null = options.is_null();
            c.options = seen;
        });
        ffi::NVRTC_SUCCESS
    }

    unsafe extern "C" fn stub_get_ptx_size(
        _prog: ffi::nvrtcProgram,
        size: *mut size_t,
    ) -> ffi::nvrtcResult {
        *size = PTX.len();
        ffi::NVRTC_SUCCESS
    }

    unsafe extern "C" fn stub_get_ptx(_prog: ffi::nvrtcProgram, ptx: *mut c_char) -> ffi::nvrtcResult {
        record(|c| c.get_ptx += 1);
        std::ptr::copy_nonoverlapping(PTX.as_ptr().cast(), ptx, PTX.len());
        ffi::NVRTC_SUCCESS
    }

    unsafe extern "C" fn stub_get_program_log_size(
        _prog: ffi::nvrtcProgram,
        size: *mut size_t,
    ) -> ffi::nvrtcResult {
        *size = LOG.len();
        ffi::NVRTC_SUCCESS
    }

    unsafe extern "C" fn stub_get_program_log(
        _prog: ffi::nvrtcProgram,
        log: *mut c_char,
    ) -> ffi::nvrtcResult {
        record(|c| c.get_log += 1);
        std::ptr::copy_nonoverlapping(LOG.as_ptr().cast(), log, LOG.len());
        ffi::NVRTC_SUCCESS
    }

    unsafe extern "C" fn stub_add_name_expression(
        _prog: ffi::nvrtcProgram,
        _name_expression: *const c_char,
    ) -> ffi::nvrtcResult {
        ffi::NVRTC_SUCCESS
    }

    unsafe extern "C" fn stub_get_lowered_name(
        _prog: ffi::nvrtcProgram,
        _name_expression: *const c_char,
        lowered_name: *mut *const c_char,
    ) -> ffi::nvrtcResult {
        *lowered_name = b"_Z4fillPf\0".as_ptr().cast();
        ffi::NVRTC_SUCCESS
    }

    fn stub_symbols(name_expressions: bool) -> Symbols {
        Symbols {
            get_error_string: stub_get_error_string,
            version: stub_version,
            create_program: stub_create_program,
            destroy_program: stub_destroy_program,
            compile_program: stub_compile_program,
            get_ptx_size: stub_get_ptx_size,
            get_ptx: stub_get_ptx,
            get_program_log_size: stub_get_program_log_size,
            get_program_log: stub_get_program_log,
            add_name_expression: name_expressions
                .then_some(stub_add_name_expression as ffi::nvrtcAddNameExpression_t),
            get_lowered_name: name_expressions
                .then_some(stub_get_lowered_name as ffi::nvrtcGetLoweredName_t),
        }
    }

    /// Fresh call record; the harness may reuse a thread between tests.
    fn library(name_expressions: bool) -> NvrtcLibrary {
        CALLS.with(|calls| *calls.borrow_mut() = Calls::default());
        NvrtcLibrary::from_symbols(stub_symbols(name_expressions))
    }

    fn c(text: &str) -> CString {
        CString::new(text).unwrap()
    }

    #[test]
    fn test_version_out_params() {
        assert_eq!(library(true).version().unwrap(), Version::new(12, 4));
    }

    #[test]
    fn test_zero_headers_and_options_pass_null_arrays() {
        let library = library(true);
        let source = c("extern \"C\" __global__ void k() {}");

        let raw = library.create_program(&source, None, &[], &[]).unwrap();
        library.compile_program(&raw, &[]).unwrap();

        calls(|c| {
            assert_eq!(c.num_headers, Some(0));
            assert!(c.headers_null);
            assert!(c.include_names_null);
            assert!(c.name_null);
            assert_eq!(c.num_options, Some(0));
            assert!(c.options_null);
        });
    }

    #[test]
    fn test_headers_and_options_are_marshaled_as_arrays() {
        let library = library(true);
        let source = c("#include \"scale.h\"\n");
        let name = c("scale.cu");
        let header = c("#define SCALE 2\n");
        let include = c("scale.h");
        let arch = c("--gpu-architecture=compute_80");

        let raw = library
            .create_program(
                &source,
                Some(name.as_c_str()),
                &[header.as_c_str()],
                &[include.as_c_str()],
            )
            .unwrap();
        library.compile_program(&raw, &[arch.as_c_str()]).unwrap();

        calls(|c| {
            assert_eq!(c.num_headers, Some(1));
            assert!(!c.headers_null);
            assert!(!c.name_null);
            assert_eq!(c.first_include.as_deref(), Some("scale.h"));
            assert_eq!(c.options, vec!["--gpu-architecture=compute_80"]);
        });
    }

    #[test]
    fn test_mismatched_headers_never_reach_native() {
        let library = library(true);
        let source = c("int x;");
        let header = c("#define N 1\n");

        let err = library
            .create_program(&source, None, &[header.as_c_str()], &[])
            .unwrap_err();
        assert!(matches!(err, NvrtcError::HeaderMismatch { headers: 1, include_names: 0 }));
        assert_eq!(calls(|c| c.created), 0);
    }

    #[test]
    fn test_sizes_include_trailing_nul() {
        let library = library(true);
        let raw = library.create_program(&c("int x;"), None, &[], &[]).unwrap();

        let size = library.ptx_size(&raw).unwrap();
        assert_eq!(size, PTX.len());
        let mut buffer = vec![0u8; size];
        library.ptx(&raw, &mut buffer).unwrap();
        assert_eq!(buffer, PTX);
        assert_eq!(buffer.last(), Some(&0));

        assert_eq!(library.program_log_size(&raw).unwrap(), LOG.len());
    }

    #[test]
    fn test_undersized_buffers_never_reach_native() {
        let library = library(true);
        let raw = library.create_program(&c("int x;"), None, &[], &[]).unwrap();

        let mut short = vec![0u8; PTX.len() - 1];
        let err = library.ptx(&raw, &mut short).unwrap_err();
        assert!(matches!(err, NvrtcError::BufferTooSmall { .. }));

        let mut short = vec![0u8; LOG.len() - 1];
        let err = library.program_log(&raw, &mut short).unwrap_err();
        assert!(matches!(err, NvrtcError::BufferTooSmall { .. }));

        calls(|c| {
            assert_eq!(c.get_ptx, 0);
            assert_eq!(c.get_log, 0);
        });
    }

    #[test]
    fn test_second_destroy_makes_no_native_call() {
        let library = library(true);
        let mut raw = library.create_program(&c("int x;"), None, &[], &[]).unwrap();

        library.destroy_program(&mut raw).unwrap();
        assert!(raw.is_null());

        let err = library.destroy_program(&mut raw).unwrap_err();
        assert_eq!(err.code(), Some(ResultCode::InvalidProgram));
        let err = library.compile_program(&raw, &[]).unwrap_err();
        assert_eq!(err.code(), Some(ResultCode::InvalidProgram));

        calls(|c| {
            assert_eq!(c.destroyed, 1);
            assert_eq!(c.compiled, 0);
        });
    }

    #[test]
    fn test_error_string_falls_back_when_native_returns_null() {
        let library = library(true);
        assert_eq!(
            library.error_string(ResultCode::Compilation),
            "NVRTC_ERROR_COMPILATION"
        );
        assert_eq!(
            library.error_string(ResultCode::InvalidOption),
            "NVRTC_ERROR_INVALID_OPTION"
        );
        assert_eq!(
            library.error_string(ResultCode::Unknown(99)),
            "NVRTC_ERROR unknown"
        );
    }

    #[test]
    fn test_absent_name_expression_symbols_are_unsupported() {
        let library = library(false);
        assert!(!library.supports_name_expressions());
        let raw = library.create_program(&c("int x;"), None, &[], &[]).unwrap();

        let err = library.add_name_expression(&raw, &c("&fill")).unwrap_err();
        assert!(matches!(
            err,
            NvrtcError::Unsupported { symbol: "nvrtcAddNameExpression" }
        ));
        let err = library.lowered_name(&raw, &c("&fill")).unwrap_err();
        assert!(matches!(
            err,
            NvrtcError::Unsupported { symbol: "nvrtcGetLoweredName" }
        ));
    }

    #[test]
    fn test_lowered_name_copied_out() {
        let library = library(true);
        assert!(library.supports_name_expressions());
        let raw = library.create_program(&c("int x;"), None, &[], &[]).unwrap();
        library.add_name_expression(&raw, &c("&fill")).unwrap();
        assert_eq!(library.lowered_name(&raw, &c("&fill")).unwrap(), "_Z4fillPf");
    }

    #[test]
    fn test_program_over_binding_releases_once() {
        let library = library(true);
        {
            let mut program = Program::new(&library, "int x;", Some("stub.cu"), &[]).unwrap();
            program.compile(&["--std=c++17"]).unwrap();
            assert_eq!(program.ptx_string().unwrap(), ".version 8.4\n.target sm_52\n");
            assert!(program.log().unwrap().contains("never referenced"));
        }
        calls(|c| {
            assert_eq!(c.created, 1);
            assert_eq!(c.destroyed, 1);
        });
    }

    #[cfg(unix)]
    #[test]
    fn test_non_nvrtc_library_reports_missing_symbol() {
        let process: Library = libloading::os::unix::Library::this().into();
        // SAFETY: resolution fails before any symbol is called.
        match unsafe { Symbols::resolve(&process) } {
            Err(NvrtcError::MissingSymbol { symbol, .. }) => {
                assert_eq!(symbol, "nvrtcGetErrorString")
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("test binary should not export NVRTC symbols"),
        }
    }
}
