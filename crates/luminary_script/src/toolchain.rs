//! Cross-compiler driver.
//!
//! Every command line is built from the fixed argument templates in
//! [`ToolchainConfig`]; callers only supply file paths.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info};

use crate::error::LinkError;

pub const DEFAULT_COMPILER: &str = "m68k-elf-gcc";
pub const DEFAULT_OBJCOPY: &str = "m68k-elf-objcopy";
pub const DEFAULT_OBJDUMP: &str = "m68k-elf-objdump";

const COMPILER_ARGS: &[&str] = &[
    "-m68000",
    "-O3",
    "-Wall",
    "-fno-builtin",
    "-nostdlib",
    "-n",
    "-fno-inline",
    "-fpie",
    "-x",
    "c++",
    "-c",
    "-Wl,-N",
];
const OBJCOPY_ARGS: &[&str] = &["-j", ".text", "-O", "binary"];
const OBJDUMP_ARGS: &[&str] = &["-t", "-r", "-C"];

/// Tool locations and argument templates.
#[derive(Debug, Clone)]
pub struct ToolchainConfig {
    /// Toolchain root. Executables are looked up in its `bin` directory;
    /// when unset they are resolved through `PATH`.
    pub compiler_dir: Option<PathBuf>,
    pub compiler: String,
    pub objcopy: String,
    pub objdump: String,
    pub compiler_args: Vec<String>,
    pub objcopy_args: Vec<String>,
    pub objdump_args: Vec<String>,
    pub include_dirs: Vec<PathBuf>,
    pub defines: Vec<String>,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        let owned = |args: &[&str]| args.iter().map(|a| (*a).to_string()).collect();
        Self {
            compiler_dir: None,
            compiler: DEFAULT_COMPILER.to_string(),
            objcopy: DEFAULT_OBJCOPY.to_string(),
            objdump: DEFAULT_OBJDUMP.to_string(),
            compiler_args: owned(COMPILER_ARGS),
            objcopy_args: owned(OBJCOPY_ARGS),
            objdump_args: owned(OBJDUMP_ARGS),
            include_dirs: Vec::new(),
            defines: Vec::new(),
        }
    }
}

impl ToolchainConfig {
    #[must_use]
    pub fn with_compiler_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.compiler_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn with_include_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.include_dirs.push(dir.into());
        self
    }

    #[must_use]
    pub fn with_define(mut self, define: impl Into<String>) -> Self {
        self.defines.push(define.into());
        self
    }

    /// Path of the executable `tool`.
    #[must_use]
    pub fn tool_path(&self, tool: &str) -> PathBuf {
        match &self.compiler_dir {
            Some(dir) => dir.join("bin").join(tool),
            None => PathBuf::from(tool),
        }
    }

    /// Compiler arguments for `source` → `object`.
    #[must_use]
    pub fn compile_args(&self, source: &Path, object: &Path) -> Vec<String> {
        let mut args = self.compiler_args.clone();
        if let Some(dir) = &self.compiler_dir {
            args.push(format!("-B{}", dir.display()));
        }
        args.extend(self.include_dirs.iter().map(|d| format!("-I{}", d.display())));
        args.extend(self.defines.iter().map(|d| format!("-D{d}")));
        args.push(source.display().to_string());
        args.push("-o".to_string());
        args.push(object.display().to_string());
        args
    }

    #[must_use]
    pub fn objcopy_args(&self, object: &Path, binary: &Path) -> Vec<String> {
        let mut args = self.objcopy_args.clone();
        args.push(object.display().to_string());
        args.push(binary.display().to_string());
        args
    }

    #[must_use]
    pub fn objdump_args(&self, object: &Path) -> Vec<String> {
        let mut args = self.objdump_args.clone();
        args.push(object.display().to_string());
        args
    }
}

/// The three external steps of building a script unit.
pub trait Toolchain {
    /// Compile `source` into the relocatable `object`.
    fn compile(&self, source: &Path, object: &Path) -> Result<(), LinkError>;

    /// Extract the raw code section of `object` into `binary`.
    fn extract_binary(&self, object: &Path, binary: &Path) -> Result<(), LinkError>;

    /// Symbol table and relocation records of `object` as text.
    fn dump_symbols(&self, object: &Path) -> Result<String, LinkError>;
}

/// Runs the configured tools as blocking subprocesses.
#[derive(Debug, Clone, Default)]
pub struct ExternalToolchain {
    config: ToolchainConfig,
}

impl ExternalToolchain {
    #[must_use]
    pub fn new(config: ToolchainConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &ToolchainConfig {
        &self.config
    }

    fn run(&self, tool: &str, args: &[String]) -> Result<String, LinkError> {
        let program = self.config.tool_path(tool);
        debug!(tool = %program.display(), ?args, "running tool");

        let output = Command::new(&program)
            .args(args)
            .output()
            .map_err(|source| LinkError::Spawn {
                tool: tool.to_string(),
                source,
            })?;

        if !output.status.success() {
            return Err(LinkError::Tool {
                tool: tool.to_string(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Toolchain for ExternalToolchain {
    fn compile(&self, source: &Path, object: &Path) -> Result<(), LinkError> {
        self.run(&self.config.compiler, &self.config.compile_args(source, object))?;
        info!(source = %source.display(), "script unit compiled");
        Ok(())
    }

    fn extract_binary(&self, object: &Path, binary: &Path) -> Result<(), LinkError> {
        self.run(&self.config.objcopy, &self.config.objcopy_args(object, binary))?;
        Ok(())
    }

    fn dump_symbols(&self, object: &Path) -> Result<String, LinkError> {
        self.run(&self.config.objdump, &self.config.objdump_args(object))
    }
}
