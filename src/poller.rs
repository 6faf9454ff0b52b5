//! The host poll loop.

use std::io::Write;
use std::time::{Duration, Instant};

use anyhow::Result;
use fdbwatch_check::{FoundationdbCheck, RecordingSink, ServiceCheckStatus};
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use crate::duration::format_duration;
use crate::output::RecordWriter;

/// Runs the check on a fixed interval and writes every record it emits.
pub struct Poller<W: Write> {
    check: FoundationdbCheck,
    writer: RecordWriter<W>,
    interval: Duration,
}

impl<W: Write> Poller<W> {
    pub fn new(check: FoundationdbCheck, writer: RecordWriter<W>, interval: Duration) -> Self {
        Self {
            check,
            writer,
            interval,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn writer(&self) -> &RecordWriter<W> {
        &self.writer
    }

    /// Run one poll and write its records.
    ///
    /// A failed check still writes its CRITICAL service check and resolves to
    /// [`ServiceCheckStatus::Critical`]. Only output errors are returned.
    pub async fn poll_once(&mut self) -> Result<ServiceCheckStatus> {
        let started = Instant::now();
        let mut sink = RecordingSink::new();

        let status = match self.check.check(&mut sink).await {
            Ok(status) => {
                info!(
                    %status,
                    records = sink.len(),
                    elapsed = %format_duration(started.elapsed()),
                    "poll complete"
                );
                status
            }
            Err(err) => {
                error!(
                    error = %err,
                    source = self.check.source().description(),
                    "poll failed"
                );
                ServiceCheckStatus::Critical
            }
        };

        self.writer.write_records(sink.records())?;
        Ok(status)
    }

    /// Poll until Ctrl-C.
    pub async fn run(&mut self) -> Result<()> {
        info!(
            interval = %format_duration(self.interval),
            source = self.check.source().description(),
            "starting poll loop"
        );

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.poll_once().await?;
                }
                result = &mut shutdown => {
                    result?;
                    info!("shutting down");
                    return Ok(());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputFormat;
    use fdbwatch_check::FileSource;
    use tempfile::NamedTempFile;

    fn poller(path: &std::path::Path) -> Poller<Vec<u8>> {
        let check = FoundationdbCheck::builder()
            .source(FileSource::new(path))
            .build()
            .unwrap();
        Poller::new(
            check,
            RecordWriter::new(Vec::new(), OutputFormat::Text),
            Duration::from_secs(15),
        )
    }

    fn output(poller: &Poller<Vec<u8>>) -> String {
        String::from_utf8(poller.writer().get_ref().clone()).unwrap()
    }

    #[test]
    fn test_poll_once_writes_records() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"cluster": {{"machines": {{"m1": {{}}}}, "degraded_processes": 0}}}}"#
        )
        .unwrap();

        let mut poller = poller(file.path());
        let status = tokio_test::block_on(poller.poll_once()).unwrap();

        assert_eq!(status, ServiceCheckStatus::Ok);
        let output = output(&poller);
        assert_eq!(
            output.lines().collect::<Vec<_>>(),
            [
                "gauge foundationdb.machines 1",
                "gauge foundationdb.degraded_processes 0",
                "service_check foundationdb.can_connect OK",
            ]
        );
    }

    #[test]
    fn test_poll_once_reports_failure_as_critical() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let mut poller = poller(file.path());
        let status = tokio_test::block_on(poller.poll_once()).unwrap();

        assert_eq!(status, ServiceCheckStatus::Critical);
        assert_eq!(
            output(&poller),
            "service_check foundationdb.can_connect CRITICAL \"Could not parse `status json`\"\n"
        );
    }

    #[test]
    fn test_polls_are_independent() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"cluster": {{"degraded_processes": 3}}}}"#).unwrap();

        let mut poller = poller(file.path());
        for _ in 0..2 {
            let status = tokio_test::block_on(poller.poll_once()).unwrap();
            assert_eq!(status, ServiceCheckStatus::Warning);
        }

        let output = output(&poller);
        let lines: Vec<_> = output.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[..2], lines[2..]);
    }
}
