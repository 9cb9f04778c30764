//! Build oracle: turns generated runner source into a process and runs it.

use crate::error::{EngineError, EngineResult};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Everything needed to build and run one runner program.
#[derive(Debug, Clone)]
pub struct RunnerInvocation<'a> {
    /// `Cargo.toml` of the runner package
    pub manifest: &'a str,

    /// `src/main.rs` of the runner package
    pub source: &'a str,

    /// Extra environment for the runner process
    pub env: Vec<(String, String)>,
}

/// Combined output and exit code of a runner process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutput {
    pub output: String,
    pub code: Option<i32>,
}

impl RunOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Exit status for error messages.
    pub fn status(&self) -> String {
        match self.code {
            Some(code) => format!("exit code {code}"),
            None => "no exit code (terminated by signal)".to_string(),
        }
    }
}

/// Builds a runner program and executes it.
///
/// A build failure must return [`EngineError::Build`] and must not execute
/// anything.
pub trait BuildOracle {
    fn build_and_run(&self, invocation: &RunnerInvocation<'_>) -> EngineResult<RunOutput>;
}

/// [`BuildOracle`] backed by `cargo build`.
#[derive(Debug, Clone)]
pub struct CargoOracle {
    cargo: String,
    package: String,
    work_dir: Option<PathBuf>,
}

impl CargoOracle {
    /// `work_dir` keeps the package and its build cache between runs; a
    /// temporary directory is used when it is `None`.
    pub fn new(cargo: impl Into<String>, package: impl Into<String>, work_dir: Option<PathBuf>) -> Self {
        Self {
            cargo: cargo.into(),
            package: package.into(),
            work_dir,
        }
    }

    /// Write the runner package (`Cargo.toml` and `src/main.rs`) into `dir`.
    pub fn write_package(dir: &Path, manifest: &str, source: &str) -> EngineResult<()> {
        let src = dir.join("src");
        std::fs::create_dir_all(&src).map_err(EngineError::filesystem(&src))?;

        let manifest_path = dir.join("Cargo.toml");
        std::fs::write(&manifest_path, manifest).map_err(EngineError::filesystem(&manifest_path))?;
        let main_path = src.join("main.rs");
        std::fs::write(&main_path, source).map_err(EngineError::filesystem(&main_path))?;
        Ok(())
    }

    fn build(&self, dir: &Path) -> EngineResult<PathBuf> {
        let manifest = dir.join("Cargo.toml");
        let target_dir = dir.join("target");
        log::debug!("Building runner in {}", dir.display());

        let output = Command::new(&self.cargo)
            .arg("build")
            .arg("--quiet")
            .arg("--manifest-path")
            .arg(&manifest)
            .arg("--target-dir")
            .arg(&target_dir)
            .output()
            .map_err(|e| EngineError::Build {
                version: None,
                diagnostics: format!("failed to start {}: {e}", self.cargo),
            })?;

        if !output.status.success() {
            return Err(EngineError::Build {
                version: None,
                diagnostics: combined(&output.stdout, &output.stderr),
            });
        }

        Ok(target_dir
            .join("debug")
            .join(format!("{}{}", self.package, std::env::consts::EXE_SUFFIX)))
    }

    fn run_in(&self, dir: &Path, invocation: &RunnerInvocation<'_>) -> EngineResult<RunOutput> {
        Self::write_package(dir, invocation.manifest, invocation.source)?;
        let binary = self.build(dir)?;

        log::debug!("Running {}", binary.display());
        let output = Command::new(&binary)
            .envs(invocation.env.iter().map(|(k, v)| (k, v)))
            .output()
            .map_err(EngineError::filesystem(&binary))?;

        Ok(RunOutput {
            output: combined(&output.stdout, &output.stderr),
            code: output.status.code(),
        })
    }
}

impl BuildOracle for CargoOracle {
    fn build_and_run(&self, invocation: &RunnerInvocation<'_>) -> EngineResult<RunOutput> {
        match &self.work_dir {
            Some(dir) => self.run_in(dir, invocation),
            None => {
                let dir = tempfile::tempdir().map_err(EngineError::filesystem(Path::new(".")))?;
                self.run_in(dir.path(), invocation)
            }
        }
    }
}

fn combined(stdout: &[u8], stderr: &[u8]) -> String {
    let mut text = String::from_utf8_lossy(stdout).into_owned();
    let err = String::from_utf8_lossy(stderr);
    if !text.is_empty() && !err.is_empty() && !text.ends_with('\n') {
        text.push('\n');
    }
    text.push_str(&err);
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invocation() -> RunnerInvocation<'static> {
        RunnerInvocation {
            manifest: "[package]\nname = \"runner\"\n",
            source: "fn main() {}\n",
            env: vec![("TIDEMARK_DATABASE".to_string(), "duckdb://x".to_string())],
        }
    }

    #[test]
    fn test_write_package_layout() {
        let dir = tempfile::tempdir().unwrap();
        CargoOracle::write_package(dir.path(), "[package]\n", "fn main() {}\n").unwrap();
        assert_eq!(
            std::fs::read_to_string(dir.path().join("Cargo.toml")).unwrap(),
            "[package]\n"
        );
        assert_eq!(
            std::fs::read_to_string(dir.path().join("src/main.rs")).unwrap(),
            "fn main() {}\n"
        );
    }

    #[test]
    fn test_missing_build_tool_is_build_error() {
        let oracle = CargoOracle::new("tidemark-no-such-cargo", "runner", None);
        let err = oracle.build_and_run(&invocation()).unwrap_err();
        assert!(matches!(err, EngineError::Build { version: None, .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_build_does_not_run() {
        let dir = tempfile::tempdir().unwrap();
        let oracle = CargoOracle::new("false", "runner", Some(dir.path().to_path_buf()));
        let err = oracle.build_and_run(&invocation()).unwrap_err();
        assert!(matches!(err, EngineError::Build { .. }));
        assert!(!dir.path().join("target").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_successful_build_without_binary_fails_to_run() {
        let oracle = CargoOracle::new("true", "runner", None);
        let err = oracle.build_and_run(&invocation()).unwrap_err();
        assert!(matches!(err, EngineError::Filesystem { .. }));
    }

    #[test]
    fn test_run_output_status() {
        let ok = RunOutput {
            output: String::new(),
            code: Some(0),
        };
        assert!(ok.success());
        let failed = RunOutput {
            output: String::new(),
            code: Some(3),
        };
        assert!(!failed.success());
        assert_eq!(failed.status(), "exit code 3");
    }

    #[test]
    fn test_combined_output_separates_streams() {
        assert_eq!(combined(b"out", b"err"), "out\nerr");
        assert_eq!(combined(b"", b"err"), "err");
        assert_eq!(combined(b"out\n", b""), "out\n");
    }
}
