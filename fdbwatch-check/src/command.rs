//! Running `fdbcli --exec "status json"`.
//!
//! The argument list is assembled from an [`InstanceConfig`]:
//!
//! ```text
//! <base_command...> [-C <cluster_file>] [--tls_<option> <value>]... --exec "status json"
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use fdbwatch_check::{FdbCli, InstanceConfig, StatusSource};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = InstanceConfig {
//!         cluster_file: Some("/etc/foundationdb/fdb.cluster".into()),
//!         ..Default::default()
//!     };
//!
//!     let source = FdbCli::new(&config)?.with_timeout(Duration::from_secs(10));
//!     let output = source.fetch().await?;
//!     println!("exit code: {:?}", output.exit_code);
//!     Ok(())
//! }
//! ```

use std::fmt;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::{CheckError, CommandOutput, InstanceConfig, StatusSource};

/// Arguments appended to every invocation.
pub const STATUS_ARGS: [&str; 2] = ["--exec", "status json"];

/// A fully assembled status command line.
#[derive(Clone, PartialEq, Eq)]
pub struct StatusCommand {
    program: String,
    args: Vec<String>,
}

impl StatusCommand {
    /// Assemble the command line for an instance.
    pub fn from_config(config: &InstanceConfig) -> Result<Self, CheckError> {
        let mut base = config.base_command().into_iter();
        let program = base
            .next()
            .filter(|program| !program.is_empty())
            .ok_or_else(|| CheckError::Config("base_command must not be empty".to_string()))?;
        let mut args: Vec<String> = base.collect();

        if let Some(cluster_file) = &config.cluster_file {
            args.push("-C".to_string());
            args.push(cluster_file.display().to_string());
        }

        for (key, value) in config.tls_options() {
            args.push(format!("--{key}"));
            args.push(value);
        }

        args.extend(STATUS_ARGS.iter().map(|arg| arg.to_string()));

        Ok(Self { program, args })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

/// Renders the command line with the TLS password masked.
impl fmt::Display for StatusCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        let mut mask_next = false;
        for arg in &self.args {
            if mask_next {
                f.write_str(" ****")?;
            } else if arg.contains(char::is_whitespace) {
                write!(f, " \"{arg}\"")?;
            } else {
                write!(f, " {arg}")?;
            }
            mask_next = arg == "--tls_password";
        }
        Ok(())
    }
}

impl fmt::Debug for StatusCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StatusCommand({self})")
    }
}

/// Status source that runs the status tool as a subprocess.
///
/// No timeout is applied unless one is set with [`FdbCli::with_timeout`];
/// when it elapses the child process is killed.
#[derive(Debug, Clone)]
pub struct FdbCli {
    command: StatusCommand,
    timeout: Option<Duration>,
    description: String,
}

impl FdbCli {
    /// Create a source for an instance.
    pub fn new(config: &InstanceConfig) -> Result<Self, CheckError> {
        Ok(Self::from_command(StatusCommand::from_config(config)?))
    }

    /// Create a source from an already assembled command.
    pub fn from_command(command: StatusCommand) -> Self {
        let description = format!("command: {command}");
        Self {
            command,
            timeout: None,
            description,
        }
    }

    /// Bound each invocation by a timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn command(&self) -> &StatusCommand {
        &self.command
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

#[async_trait]
impl StatusSource for FdbCli {
    async fn fetch(&self) -> Result<CommandOutput, CheckError> {
        debug!(command = %self.command, "running status command");

        let mut command = Command::new(&self.command.program);
        command
            .args(&self.command.args)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, command.output())
                .await
                .map_err(|_| CheckError::Timeout(limit))??,
            None => command.output().await?,
        };

        Ok(output.into())
    }

    fn description(&self) -> &str {
        &self.description
    }
}
