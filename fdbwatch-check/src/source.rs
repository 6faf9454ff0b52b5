//! Where raw status output comes from.
//!
//! The check only needs the stdout, stderr and exit code of one status
//! invocation. [`StatusSource`] abstracts over running the status tool
//! ([`FdbCli`](crate::FdbCli)) and replaying a saved document ([`FileSource`]).

use std::fmt::Debug;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::CheckError;

/// Captured result of one status invocation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
}

impl CommandOutput {
    /// Output of a successful invocation.
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            exit_code: Some(0),
        }
    }

    pub fn is_success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

impl From<std::process::Output> for CommandOutput {
    fn from(output: std::process::Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code(),
        }
    }
}

/// Trait for fetching one raw status snapshot.
///
/// # Example
///
/// ```rust,no_run
/// use fdbwatch_check::{FileSource, StatusSource};
///
/// # async fn example() -> Result<(), fdbwatch_check::CheckError> {
/// let source = FileSource::new("status.json");
/// let output = source.fetch().await?;
/// println!("{} bytes from {}", output.stdout.len(), source.description());
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait StatusSource: Send + Sync + Debug {
    /// Produce the output of one status invocation.
    ///
    /// Only failures to obtain any output are errors here; an empty or
    /// unsuccessful output is returned as-is and judged by the check.
    async fn fetch(&self) -> Result<CommandOutput, CheckError>;

    /// Returns a human-readable description of the source, used in logs.
    fn description(&self) -> &str;
}

/// A source that replays a status document saved to disk.
///
/// Each fetch re-reads the file and reports it as a successful invocation.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    description: String,
}

impl FileSource {
    /// Create a new file source for the given path.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let description = format!("file: {}", path.display());
        Self { path, description }
    }

    /// Returns the path being replayed.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl StatusSource for FileSource {
    async fn fetch(&self) -> Result<CommandOutput, CheckError> {
        let contents = tokio::fs::read_to_string(&self.path).await?;
        Ok(CommandOutput::success(contents))
    }

    fn description(&self) -> &str {
        &self.description
    }
}
