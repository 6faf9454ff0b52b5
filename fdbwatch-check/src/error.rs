//! Error types for the check.

use std::time::Duration;

use thiserror::Error;

/// Errors that end a poll cycle.
///
/// Every variant except [`CheckError::Config`] is reported as a CRITICAL
/// service check before it is returned.
#[derive(Debug, Error)]
pub enum CheckError {
    /// The status command printed nothing.
    #[error("status command produced no output")]
    EmptyOutput,

    /// The status command exited unsuccessfully.
    #[error("status command exited with {}: {stderr}", exit_description(.code))]
    NonZeroExit { code: Option<i32>, stderr: String },

    /// The status command could not be started, or the source could not be read.
    #[error("status source failed: {0}")]
    Source(#[from] std::io::Error),

    /// The status command did not finish in time.
    #[error("status command timed out after {0:?}")]
    Timeout(Duration),

    /// The output was not valid JSON.
    #[error("failed to parse status json: {0}")]
    Parse(#[from] serde_json::Error),

    /// The document has no usable `cluster` object.
    #[error("status json doesn't include cluster data")]
    MissingCluster,

    /// The check was configured with unusable settings.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl CheckError {
    /// Message attached to the CRITICAL service check for this error.
    pub fn service_check_message(&self) -> String {
        match self {
            CheckError::EmptyOutput => "Did not receive a response from `status json`".to_string(),
            CheckError::NonZeroExit { .. } => "`fdbcli` returned non-zero error code".to_string(),
            CheckError::Source(err) => format!("Could not read status output: {err}"),
            CheckError::Timeout(limit) => {
                format!("`fdbcli` did not respond within {}s", limit.as_secs_f64())
            }
            CheckError::Parse(_) => "Could not parse `status json`".to_string(),
            CheckError::MissingCluster => "`status json` doesn't include cluster data".to_string(),
            CheckError::Config(msg) => format!("Invalid configuration: {msg}"),
        }
    }
}

fn exit_description(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("code {code}"),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = CheckError::NonZeroExit {
            code: Some(1),
            stderr: "ERROR: timed out".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "status command exited with code 1: ERROR: timed out"
        );

        let err = CheckError::NonZeroExit {
            code: None,
            stderr: String::new(),
        };
        assert!(err.to_string().contains("terminated by signal"));
    }

    #[test]
    fn test_service_check_messages() {
        assert_eq!(
            CheckError::EmptyOutput.service_check_message(),
            "Did not receive a response from `status json`"
        );
        assert_eq!(
            CheckError::Timeout(Duration::from_millis(1500)).service_check_message(),
            "`fdbcli` did not respond within 1.5s"
        );

        let parse = serde_json::from_str::<serde_json::Value>("nope").unwrap_err();
        assert_eq!(
            CheckError::from(parse).service_check_message(),
            "Could not parse `status json`"
        );

        let missing = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        assert_eq!(
            CheckError::from(missing).service_check_message(),
            "Could not read status output: no such file"
        );
    }
}
