//! # NVRTC bindings
//!
//! Rust bindings to NVIDIA's runtime compilation library, which turns CUDA
//! C++ source into PTX at run time. All compilation work happens inside the
//! native library; this crate declares the call boundary and makes it safe
//! to use.
//!
//! ## Layers
//! - [`ffi`]: raw C ABI declarations
//! - [`CompilerApi`]: one-to-one binding of the entry points, implemented by
//!   [`NvrtcLibrary`] which loads the shared library at run time
//! - [`Program`]: scoped owner of one program handle, destroyed exactly once
//! - [`Compiler`]: one-shot compile of a [`CompileRequest`]
//!
//! ## Example
//! ```no_run
//! use nvrtc::{Compiler, CompileRequest, NvrtcConfig, NvrtcLibrary};
//!
//! let library = NvrtcLibrary::load()?;
//! let compiler = Compiler::new(library, NvrtcConfig::default());
//! let output = compiler.compile(
//!     &CompileRequest::new("extern \"C\" __global__ void k() {}")
//!         .with_options(["--gpu-architecture=compute_70"]),
//! )?;
//! if !output.succeeded() {
//!     eprintln!("{}", output.log);
//! }
//! # Ok::<(), nvrtc::NvrtcError>(())
//! ```

pub mod api;
pub mod cli;
pub mod compiler;
pub mod config;
pub mod error;
pub mod ffi;
pub mod library;
pub mod options;
pub mod program;
pub mod result;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use api::{CompilerApi, RawProgram};
pub use compiler::Compiler;
pub use config::{load_config, load_from_file, NvrtcConfig};
pub use error::{ConfigurationError, NvrtcError, Result};
pub use library::{candidate_names, NvrtcLibrary};
pub use options::CompileOptions;
pub use program::{Program, ProgramState};
pub use result::ResultCode;
pub use types::{CompileOutput, CompileRequest, Header, Version};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
