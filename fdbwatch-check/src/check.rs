//! One poll cycle: fetch, validate, parse, translate.

use std::time::Duration;

use fdbwatch_types::StatusDocument;
use tracing::{debug, warn};

use crate::{
    CheckError, CommandOutput, FdbCli, InstanceConfig, MetricsSink, ServiceCheckStatus,
    StatusSource, StatusTranslator,
};

/// The FoundationDB check.
///
/// Each call to [`check`](Self::check) runs the status source once and either
/// emits the translated metrics followed by an OK/WARNING health check, or a
/// single CRITICAL health check and the error. Nothing is kept between calls.
///
/// # Example
///
/// ```rust,no_run
/// use std::time::Duration;
/// use fdbwatch_check::{FoundationdbCheck, InstanceConfig, RecordingSink};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let check = FoundationdbCheck::builder()
///         .instance(InstanceConfig::default())
///         .timeout(Duration::from_secs(10))
///         .build()?;
///
///     let mut sink = RecordingSink::new();
///     let health = check.check(&mut sink).await?;
///     println!("{health}: {} records", sink.len());
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct FoundationdbCheck {
    source: Box<dyn StatusSource>,
    translator: StatusTranslator,
}

impl FoundationdbCheck {
    /// Create a check from a source and a translator.
    pub fn new(source: Box<dyn StatusSource>, translator: StatusTranslator) -> Self {
        Self { source, translator }
    }

    /// Create a new builder for configuring the check.
    pub fn builder() -> FoundationdbCheckBuilder {
        FoundationdbCheckBuilder::default()
    }

    pub fn source(&self) -> &dyn StatusSource {
        self.source.as_ref()
    }

    pub fn translator(&self) -> &StatusTranslator {
        &self.translator
    }

    /// Run one poll cycle against the configured source.
    pub async fn check<S: MetricsSink + ?Sized>(
        &self,
        sink: &mut S,
    ) -> Result<ServiceCheckStatus, CheckError> {
        debug!(source = self.source.description(), "polling status");
        match self.source.fetch().await {
            Ok(output) => self.check_output(&output, sink),
            Err(err) => Err(self.report_failure(err, sink)),
        }
    }

    /// Judge and translate an already captured status output.
    pub fn check_output<S: MetricsSink + ?Sized>(
        &self,
        output: &CommandOutput,
        sink: &mut S,
    ) -> Result<ServiceCheckStatus, CheckError> {
        let translated = match parse_output(output) {
            Ok(document) => self.translator.translate(&document, sink),
            Err(err) => Err(err),
        };
        translated.map_err(|err| self.report_failure(err, sink))
    }

    fn report_failure<S: MetricsSink + ?Sized>(&self, err: CheckError, sink: &mut S) -> CheckError {
        warn!(error = %err, "status check failed");
        sink.service_check(
            &self.translator.service_check_name(),
            ServiceCheckStatus::Critical,
            self.translator.tags(),
            Some(&err.service_check_message()),
        );
        err
    }
}

/// Validate a captured output and parse it into a document with a cluster.
///
/// Checks, in order: non-empty output, exit status, JSON syntax, presence of
/// the `cluster` object.
pub fn parse_output(output: &CommandOutput) -> Result<StatusDocument, CheckError> {
    if output.stdout.trim().is_empty() {
        return Err(CheckError::EmptyOutput);
    }

    if !output.is_success() {
        return Err(CheckError::NonZeroExit {
            code: output.exit_code,
            stderr: output.stderr.trim().to_string(),
        });
    }

    let document = StatusDocument::from_json(&output.stdout)?;
    if document.cluster.is_none() {
        return Err(CheckError::MissingCluster);
    }
    Ok(document)
}

/// Builder for FoundationdbCheck.
#[derive(Debug, Default)]
pub struct FoundationdbCheckBuilder {
    instance: Option<InstanceConfig>,
    source: Option<Box<dyn StatusSource>>,
    timeout: Option<Duration>,
    namespace: Option<String>,
}

impl FoundationdbCheckBuilder {
    /// Set the instance configuration (command line and tags).
    pub fn instance(mut self, config: InstanceConfig) -> Self {
        self.instance = Some(config);
        self
    }

    /// Use a custom status source instead of running `fdbcli`.
    pub fn source(mut self, source: impl StatusSource + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Bound each `fdbcli` invocation (default: no timeout).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the metric namespace (default: "foundationdb").
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Build the check.
    ///
    /// Fails when the instance's command line cannot be assembled.
    pub fn build(self) -> Result<FoundationdbCheck, CheckError> {
        let instance = self.instance.unwrap_or_default();

        let source = match self.source {
            Some(source) => source,
            None => {
                let mut cli = FdbCli::new(&instance)?;
                if let Some(timeout) = self.timeout {
                    cli = cli.with_timeout(timeout);
                }
                Box::new(cli)
            }
        };

        let mut translator = StatusTranslator::new().with_tags(instance.tags);
        if let Some(namespace) = self.namespace {
            translator = translator.with_namespace(namespace);
        }

        Ok(FoundationdbCheck::new(source, translator))
    }
}
