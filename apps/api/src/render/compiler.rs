//! Document compiler: assembled LaTeX → PDF via an external toolchain.
//!
//! Each compile gets its own scratch directory, removed on every exit path
//! when the `TempDir` guard drops. The toolchain runs exactly twice so
//! cross-references settle. After each pass a PDF on disk counts as success
//! whatever the exit status, since pdflatex exits nonzero on mere warnings.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use bytes::Bytes;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info, warn};

const PASSES: u8 = 2;
const TEX_FILE: &str = "resume.tex";
const PDF_FILE: &str = "resume.pdf";
/// Characters of toolchain output kept for diagnostics.
const OUTPUT_TAIL_CHARS: usize = 3000;

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("LaTeX toolchain '{0}' not found; install a TeX distribution or set LATEX_BIN")]
    ToolchainMissing(String),

    #[error("LaTeX compilation timed out after {secs}s (pass {pass})")]
    Timeout { pass: u8, secs: u64 },

    #[error("LaTeX compilation failed (pass {pass}, {status}):\n{output}")]
    Failed {
        pass: u8,
        status: String,
        output: String,
    },

    #[error("LaTeX toolchain produced no PDF")]
    ArtifactMissing,

    #[error("scratch workspace I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
pub struct LatexCompiler {
    program: String,
    timeout: Duration,
    scratch_root: Option<PathBuf>,
}

impl LatexCompiler {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
            scratch_root: None,
        }
    }

    /// Creates scratch directories under `root` instead of the system temp dir.
    pub fn with_scratch_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.scratch_root = Some(root.into());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub async fn compile(&self, markup: &str) -> Result<Bytes, CompileError> {
        let program = find_program(&self.program)
            .ok_or_else(|| CompileError::ToolchainMissing(self.program.clone()))?;

        let mut builder = tempfile::Builder::new();
        builder.prefix("resume-");
        let workspace = match &self.scratch_root {
            Some(root) => builder.tempdir_in(root)?,
            None => builder.tempdir()?,
        };
        let dir = workspace.path();
        let tex_path = dir.join(TEX_FILE);
        let pdf_path = dir.join(PDF_FILE);
        tokio::fs::write(&tex_path, markup).await?;

        for pass in 1..=PASSES {
            self.run_pass(&program, dir, &tex_path, &pdf_path, pass)
                .await?;
        }

        if !tokio::fs::try_exists(&pdf_path).await? {
            return Err(CompileError::ArtifactMissing);
        }
        let pdf = tokio::fs::read(&pdf_path).await?;
        info!("Compiled resume PDF ({} bytes)", pdf.len());
        Ok(Bytes::from(pdf))
    }

    async fn run_pass(
        &self,
        program: &Path,
        dir: &Path,
        tex_path: &Path,
        pdf_path: &Path,
        pass: u8,
    ) -> Result<(), CompileError> {
        let mut command = Command::new(program);
        command
            .arg("-interaction=nonstopmode")
            .arg("-output-directory")
            .arg(dir)
            .arg(tex_path)
            .current_dir(dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!("Running {} (pass {pass})", program.display());
        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| CompileError::Timeout {
                pass,
                secs: self.timeout.as_secs(),
            })??;

        if tokio::fs::try_exists(pdf_path).await? {
            if !output.status.success() {
                warn!(
                    "LaTeX pass {pass} exited with {} but produced a PDF",
                    output.status
                );
            }
            return Ok(());
        }

        if !output.status.success() {
            let stdout = String::from_utf8_lossy(&output.stdout);
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CompileError::Failed {
                pass,
                status: output.status.to_string(),
                output: format!(
                    "STDOUT (tail):\n{}\nSTDERR (tail):\n{}",
                    tail(&stdout, OUTPUT_TAIL_CHARS),
                    tail(&stderr, OUTPUT_TAIL_CHARS)
                ),
            });
        }
        Ok(())
    }
}

/// Last `n` characters of `s`.
fn tail(s: &str, n: usize) -> &str {
    let count = s.chars().count();
    if count <= n {
        return s;
    }
    let start = s
        .char_indices()
        .nth(count - n)
        .map(|(i, _)| i)
        .unwrap_or(0);
    &s[start..]
}

/// Resolves `program` to an executable file, searching `PATH` for bare names.
fn find_program(program: &str) -> Option<PathBuf> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(program))
        .find(|p| p.is_file())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use std::sync::Mutex;
    use std::time::Instant;

    /// Serializes stub creation and execution so no forked child inherits a
    /// script that is still open for writing.
    static STUB_LOCK: Mutex<()> = Mutex::new(());

    fn write_stub(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("fake-pdflatex");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn compiler(stub: &Path, scratch: &Path, timeout: Duration) -> LatexCompiler {
        LatexCompiler::new(stub.to_string_lossy(), timeout).with_scratch_root(scratch)
    }

    fn is_empty_dir(dir: &Path) -> bool {
        std::fs::read_dir(dir).unwrap().next().is_none()
    }

    #[tokio::test]
    async fn test_nonzero_exit_with_artifact_succeeds() {
        let _guard = STUB_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let bin = tempfile::tempdir().unwrap();
        let scratch = tempfile::tempdir().unwrap();
        let stub = write_stub(bin.path(), "echo '%PDF-1.4 stub' > resume.pdf\nexit 1");

        let pdf = compiler(&stub, scratch.path(), Duration::from_secs(10))
            .compile("\\documentclass{article}")
            .await
            .unwrap();
        assert!(pdf.starts_with(b"%PDF"));
        assert!(is_empty_dir(scratch.path()), "scratch workspace not removed");
    }

    #[tokio::test]
    async fn test_nonzero_exit_without_artifact_fails_with_output() {
        let _guard = STUB_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let bin = tempfile::tempdir().unwrap();
        let scratch = tempfile::tempdir().unwrap();
        let stub = write_stub(bin.path(), "echo '! Undefined control sequence.'\nexit 1");

        let err = compiler(&stub, scratch.path(), Duration::from_secs(10))
            .compile("\\bogus")
            .await
            .unwrap_err();
        match &err {
            CompileError::Failed { pass, output, .. } => {
                assert_eq!(*pass, 1);
                assert!(output.contains("Undefined control sequence"));
            }
            other => panic!("expected Failed, got {other:?}"),
        }
        assert!(is_empty_dir(scratch.path()));
    }

    #[tokio::test]
    async fn test_clean_exit_without_artifact_is_missing() {
        let _guard = STUB_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let bin = tempfile::tempdir().unwrap();
        let scratch = tempfile::tempdir().unwrap();
        let stub = write_stub(bin.path(), "exit 0");

        let err = compiler(&stub, scratch.path(), Duration::from_secs(10))
            .compile("x")
            .await
            .unwrap_err();
        assert!(matches!(err, CompileError::ArtifactMissing));
    }

    #[tokio::test]
    async fn test_hung_toolchain_times_out() {
        let _guard = STUB_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let bin = tempfile::tempdir().unwrap();
        let scratch = tempfile::tempdir().unwrap();
        let stub = write_stub(bin.path(), "exec sleep 30");

        let started = Instant::now();
        let err = compiler(&stub, scratch.path(), Duration::from_millis(300))
            .compile("x")
            .await
            .unwrap_err();
        assert!(matches!(err, CompileError::Timeout { pass: 1, .. }));
        assert!(started.elapsed() < Duration::from_secs(10));
        assert!(is_empty_dir(scratch.path()));
    }

    #[tokio::test]
    async fn test_toolchain_runs_exactly_twice() {
        let _guard = STUB_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let bin = tempfile::tempdir().unwrap();
        let scratch = tempfile::tempdir().unwrap();
        let counter = bin.path().join("runs.log");
        let stub = write_stub(
            bin.path(),
            &format!(
                "echo run >> '{}'\necho '%PDF' > resume.pdf",
                counter.display()
            ),
        );

        compiler(&stub, scratch.path(), Duration::from_secs(10))
            .compile("x")
            .await
            .unwrap();
        let runs = std::fs::read_to_string(&counter).unwrap();
        assert_eq!(runs.lines().count(), 2);
    }

    #[tokio::test]
    async fn test_missing_toolchain_fails_before_running() {
        let scratch = tempfile::tempdir().unwrap();
        let err = LatexCompiler::new("definitely-not-a-latex-binary", Duration::from_secs(1))
            .with_scratch_root(scratch.path())
            .compile("x")
            .await
            .unwrap_err();
        assert!(matches!(err, CompileError::ToolchainMissing(ref p) if p == "definitely-not-a-latex-binary"));
        assert!(is_empty_dir(scratch.path()));
    }

    #[test]
    fn test_tail_keeps_last_chars() {
        assert_eq!(tail("abcdef", 3), "def");
        assert_eq!(tail("ab", 3), "ab");
        assert_eq!(tail("ééé", 2), "éé");
    }
}
