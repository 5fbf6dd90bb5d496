//! Typed builder for NVRTC compiler options

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileOptions {
    /// Virtual architecture, e.g. `compute_80`
    pub gpu_architecture: Option<String>,
    /// Language dialect, e.g. `c++17`
    pub std: Option<String>,
    /// `(name, value)` preprocessor definitions
    pub defines: Vec<(String, Option<String>)>,
    pub include_paths: Vec<String>,
    pub device_debug: bool,
    pub line_info: bool,
    pub fast_math: bool,
    pub fmad: Option<bool>,
    pub relocatable_device_code: bool,
    /// Passed through verbatim after everything above
    pub extra: Vec<String>,
}

impl CompileOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gpu_architecture(mut self, arch: impl Into<String>) -> Self {
        self.gpu_architecture = Some(arch.into());
        self
    }

    pub fn std(mut self, std: impl Into<String>) -> Self {
        self.std = Some(std.into());
        self
    }

    pub fn define(mut self, name: impl Into<String>) -> Self {
        self.defines.push((name.into(), None));
        self
    }

    pub fn define_value(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.defines.push((name.into(), Some(value.into())));
        self
    }

    pub fn include_path(mut self, path: impl Into<String>) -> Self {
        self.include_paths.push(path.into());
        self
    }

    pub fn device_debug(mut self, enabled: bool) -> Self {
        self.device_debug = enabled;
        self
    }

    pub fn line_info(mut self, enabled: bool) -> Self {
        self.line_info = enabled;
        self
    }

    pub fn fast_math(mut self, enabled: bool) -> Self {
        self.fast_math = enabled;
        self
    }

    pub fn fmad(mut self, enabled: bool) -> Self {
        self.fmad = Some(enabled);
        self
    }

    pub fn relocatable_device_code(mut self, enabled: bool) -> Self {
        self.relocatable_device_code = enabled;
        self
    }

    pub fn raw(mut self, option: impl Into<String>) -> Self {
        self.extra.push(option.into());
        self
    }

    /// Render as NVRTC command-line flags.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if let Some(arch) = &self.gpu_architecture {
            args.push(format!("--gpu-architecture={arch}"));
        }
        if let Some(std) = &self.std {
            args.push(format!("--std={std}"));
        }
        for (name, value) in &self.defines {
            match value {
                Some(value) => args.push(format!("-D{name}={value}")),
                None => args.push(format!("-D{name}")),
            }
        }
        for path in &self.include_paths {
            args.push(format!("--include-path={path}"));
        }
        if self.device_debug {
            args.push("--device-debug".to_string());
        }
        if self.line_info {
            args.push("--generate-line-info".to_string());
        }
        if self.fast_math {
            args.push("--use_fast_math".to_string());
        }
        if let Some(fmad) = self.fmad {
            args.push(format!("--fmad={fmad}"));
        }
        if self.relocatable_device_code {
            args.push("--relocatable-device-code=true".to_string());
        }
        args.extend(self.extra.iter().cloned());

        args
    }
}
