//! Translation of a status document into metrics.
//!
//! The translator walks the typed document depth-first and emits one
//! metric per present field. Absent fields are skipped silently: the status
//! tool omits fields depending on each process's roles and the tool version,
//! so absence is the normal case, not an error.
//!
//! ## Metrics
//!
//! All names are prefixed with the namespace (`foundationdb` by default).
//!
//! | Section | Metrics |
//! |---|---|
//! | cluster | `machines`, `processes`, `instances` (count), `degraded_processes` |
//! | process | `process.cpu.*`, `process.disk.*`, `process.memory.*`, `process.network.*` |
//! | role | `process.role.*`, `process.role.*_latency_statistics.*` |
//! | data | `data.*`, `data.moving_data.*` |
//! | other | `datacenter_lag.seconds`, `workload.transactions.*`, `workload.operations.*`, `latency_probe.*` |
//!
//! Rate-counter fields (`{hz, counter}`) become a `<name>.hz` gauge and a
//! `<name>.counter` monotonic count.

use fdbwatch_types::{Cluster, HzCounter, LatencyStatistics, Process, Role, StatusDocument};
use tracing::debug;

use crate::{CheckError, MetricsSink, ServiceCheckStatus};

/// Default metric namespace.
pub const DEFAULT_NAMESPACE: &str = "foundationdb";

/// Name of the health service check, relative to the namespace.
pub const CAN_CONNECT: &str = "can_connect";

/// Message attached to the WARNING health check.
pub const DEGRADED_MESSAGE: &str = "There are degraded processes";

/// Stateless mapping from a status document to metric emissions.
#[derive(Debug, Clone)]
pub struct StatusTranslator {
    namespace: String,
    tags: Vec<String>,
}

impl Default for StatusTranslator {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusTranslator {
    /// Create a translator with the default namespace and no extra tags.
    pub fn new() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            tags: Vec::new(),
        }
    }

    /// Set the metric namespace.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Attach extra tags to every emission.
    pub fn with_tags(mut self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Fully qualified name of the health service check.
    pub fn service_check_name(&self) -> String {
        self.metric_name(CAN_CONNECT)
    }

    /// Emit all metrics of a document, followed by the health service check.
    ///
    /// Fails with [`CheckError::MissingCluster`] before emitting anything when
    /// the document has no `cluster` object.
    pub fn translate<S: MetricsSink + ?Sized>(
        &self,
        document: &StatusDocument,
        sink: &mut S,
    ) -> Result<ServiceCheckStatus, CheckError> {
        let cluster = document.cluster.as_ref().ok_or(CheckError::MissingCluster)?;
        self.report_cluster(cluster, sink);
        Ok(self.report_health(cluster, sink))
    }

    /// Emit the cluster-wide metrics and everything nested under processes.
    pub fn report_cluster<S: MetricsSink + ?Sized>(&self, cluster: &Cluster, sink: &mut S) {
        let tags = self.tags.as_slice();

        if let Some(machines) = cluster.machine_count() {
            self.gauge(sink, "machines", Some(machines as f64), tags);
        }

        if let Some(processes) = &cluster.processes {
            self.gauge(sink, "processes", Some(processes.len() as f64), tags);
            let instances = cluster.instance_count().unwrap_or_default();
            self.count(sink, "instances", Some(instances as f64), tags);

            for (id, process) in processes {
                if process.address.is_none() {
                    debug!(process = %id, "skipping process without an address");
                    continue;
                }
                self.report_process(process, sink);
            }
        }

        if let Some(data) = &cluster.data {
            for (field, value) in data.gauges() {
                self.gauge(sink, &format!("data.{field}"), value, tags);
            }
            if let Some(moving) = &data.moving_data {
                self.gauge(sink, "data.moving_data.in_flight_bytes", moving.in_flight_bytes, tags);
                self.gauge(sink, "data.moving_data.in_queue_bytes", moving.in_queue_bytes, tags);
                self.gauge(
                    sink,
                    "data.moving_data.total_written_bytes",
                    moving.total_written_bytes,
                    tags,
                );
            }
        }

        if let Some(lag) = &cluster.datacenter_lag {
            self.gauge(sink, "datacenter_lag.seconds", lag.seconds, tags);
        }

        if let Some(workload) = &cluster.workload {
            for (key, counter) in workload.transactions.iter().flatten() {
                self.hz_counter(sink, &format!("workload.transactions.{key}"), Some(counter), tags);
            }
            for (key, counter) in workload.operations.iter().flatten() {
                self.hz_counter(sink, &format!("workload.operations.{key}"), Some(counter), tags);
            }
        }

        for (key, value) in cluster.latency_probe.iter().flatten() {
            self.gauge(sink, &format!("latency_probe.{key}"), Some(*value), tags);
        }

        if let Some(degraded) = cluster.degraded_processes {
            self.gauge(sink, "degraded_processes", Some(degraded), tags);
        }
    }

    /// Emit the metrics of one process and its roles.
    ///
    /// Processes without an `address` emit nothing.
    pub fn report_process<S: MetricsSink + ?Sized>(&self, process: &Process, sink: &mut S) {
        let Some(tags) = self.process_tags(process) else {
            return;
        };

        if let Some(cpu) = &process.cpu {
            self.gauge(sink, "process.cpu.usage_cores", cpu.usage_cores, &tags);
        }

        if let Some(disk) = &process.disk {
            self.gauge(sink, "process.disk.free_bytes", disk.free_bytes, &tags);
            self.gauge(sink, "process.disk.total_bytes", disk.total_bytes, &tags);
            if let Some(reads) = &disk.reads {
                self.gauge(sink, "process.disk.reads.hz", reads.hz, &tags);
                self.count(sink, "process.disk.reads.count", reads.total(), &tags);
            }
            if let Some(writes) = &disk.writes {
                self.gauge(sink, "process.disk.writes.hz", writes.hz, &tags);
                self.count(sink, "process.disk.writes.count", writes.total(), &tags);
            }
        }

        if let Some(memory) = &process.memory {
            self.gauge(sink, "process.memory.available_bytes", memory.available_bytes, &tags);
            self.gauge(sink, "process.memory.limit_bytes", memory.limit_bytes, &tags);
            self.gauge(
                sink,
                "process.memory.unused_allocated_memory",
                memory.unused_allocated_memory,
                &tags,
            );
            self.gauge(sink, "process.memory.used_bytes", memory.used_bytes, &tags);
        }

        if let Some(network) = &process.network {
            self.gauge(
                sink,
                "process.network.current_connections",
                network.current_connections,
                &tags,
            );
            for (field, counter) in network.hz_counters() {
                self.hz_counter(sink, &format!("process.network.{field}"), counter.as_ref(), &tags);
            }
        }

        for role in process.roles.iter().flatten() {
            self.report_role(role, &tags, sink);
        }
    }

    /// Emit the metrics of one role, tagged on top of its process's tags.
    ///
    /// Roles without a `role` type emit nothing.
    pub fn report_role<S: MetricsSink + ?Sized>(
        &self,
        role: &Role,
        process_tags: &[String],
        sink: &mut S,
    ) {
        let Some(kind) = role.role.as_deref() else {
            debug!(id = ?role.id, "skipping role without a type");
            return;
        };

        let mut tags = process_tags.to_vec();
        tags.push(format!("role:{kind}"));
        if let Some(id) = &role.id {
            tags.push(format!("role_id:{id}"));
        }

        for (field, counter) in role.hz_counters() {
            self.hz_counter(sink, &format!("process.role.{field}"), counter.as_ref(), &tags);
        }
        for (field, value) in role.gauges() {
            self.gauge(sink, &format!("process.role.{field}"), value, &tags);
        }

        if let Some(lag) = &role.data_lag {
            self.gauge(sink, "process.role.data_lag.seconds", lag.seconds, &tags);
        }
        if let Some(lag) = &role.durability_lag {
            self.gauge(sink, "process.role.durability_lag.seconds", lag.seconds, &tags);
        }

        if let Some(grv) = &role.grv_latency_statistics {
            self.report_statistics(
                sink,
                "process.role.grv_latency_statistics.default",
                grv.default.as_ref(),
                &tags,
            );
        }
        self.report_statistics(
            sink,
            "process.role.read_latency_statistics",
            role.read_latency_statistics.as_ref(),
            &tags,
        );
        self.report_statistics(
            sink,
            "process.role.commit_latency_statistics",
            role.commit_latency_statistics.as_ref(),
            &tags,
        );
    }

    /// Emit the health service check for a traversed cluster.
    fn report_health<S: MetricsSink + ?Sized>(
        &self,
        cluster: &Cluster,
        sink: &mut S,
    ) -> ServiceCheckStatus {
        let name = self.service_check_name();
        if cluster.is_degraded() {
            sink.service_check(
                &name,
                ServiceCheckStatus::Warning,
                &self.tags,
                Some(DEGRADED_MESSAGE),
            );
            ServiceCheckStatus::Warning
        } else {
            sink.service_check(&name, ServiceCheckStatus::Ok, &self.tags, None);
            ServiceCheckStatus::Ok
        }
    }

    /// Tags of a process, `None` when it has no address.
    fn process_tags(&self, process: &Process) -> Option<Vec<String>> {
        let address = process.address.as_deref()?;

        let mut tags = self.tags.clone();
        tags.push(format!("process:{address}"));
        if let Some(locality) = &process.locality {
            let fields = [
                ("machineid", &locality.machineid),
                ("processid", &locality.processid),
                ("zoneid", &locality.zoneid),
            ];
            for (key, value) in fields {
                if let Some(value) = value {
                    tags.push(format!("{key}:{value}"));
                }
            }
        }
        Some(tags)
    }

    fn report_statistics<S: MetricsSink + ?Sized>(
        &self,
        sink: &mut S,
        metric: &str,
        statistics: Option<&LatencyStatistics>,
        tags: &[String],
    ) {
        let Some(statistics) = statistics else {
            return;
        };
        self.count(sink, &format!("{metric}.count"), statistics.count, tags);
        for (field, value) in statistics.gauges() {
            self.gauge(sink, &format!("{metric}.{field}"), value, tags);
        }
    }

    fn hz_counter<S: MetricsSink + ?Sized>(
        &self,
        sink: &mut S,
        metric: &str,
        counter: Option<&HzCounter>,
        tags: &[String],
    ) {
        let Some(counter) = counter else {
            return;
        };
        self.gauge(sink, &format!("{metric}.hz"), counter.hz, tags);
        self.count(sink, &format!("{metric}.counter"), counter.counter, tags);
    }

    fn gauge<S: MetricsSink + ?Sized>(
        &self,
        sink: &mut S,
        metric: &str,
        value: Option<f64>,
        tags: &[String],
    ) {
        if let Some(value) = value {
            sink.gauge(&self.metric_name(metric), value, tags);
        }
    }

    fn count<S: MetricsSink + ?Sized>(
        &self,
        sink: &mut S,
        metric: &str,
        value: Option<f64>,
        tags: &[String],
    ) {
        if let Some(value) = value {
            sink.monotonic_count(&self.metric_name(metric), value, tags);
        }
    }

    fn metric_name(&self, metric: &str) -> String {
        if self.namespace.is_empty() {
            metric.to_string()
        } else {
            format!("{}.{}", self.namespace, metric)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MetricRecord, RecordingSink};

    fn translate(json: &str) -> (Result<ServiceCheckStatus, CheckError>, RecordingSink) {
        let document = StatusDocument::from_json(json).unwrap();
        let mut sink = RecordingSink::new();
        let result = StatusTranslator::new().translate(&document, &mut sink);
        (result, sink)
    }

    fn names(sink: &RecordingSink) -> Vec<&str> {
        sink.records().iter().map(MetricRecord::name).collect()
    }

    #[test]
    fn test_missing_cluster_emits_nothing() {
        let (result, sink) = translate(r#"{"client": {"coordinators": {}}}"#);
        assert!(matches!(result, Err(CheckError::MissingCluster)));
        assert!(sink.is_empty());
    }

    #[test]
    fn test_minimal_document() {
        let (result, sink) =
            translate(r#"{"cluster":{"processes":{"1.1.1.1:4500":{"address":"1.1.1.1:4500"}}}}"#);

        assert_eq!(result.unwrap(), ServiceCheckStatus::Ok);
        assert_eq!(
            names(&sink),
            [
                "foundationdb.processes",
                "foundationdb.instances",
                "foundationdb.can_connect"
            ]
        );
        assert_eq!(sink.value_of("foundationdb.processes"), Some(1.0));
        assert!(matches!(
            sink.named("foundationdb.instances").next(),
            Some(MetricRecord::MonotonicCount { value, .. }) if *value == 0.0
        ));
    }

    #[test]
    fn test_degraded_processes_warn() {
        let (result, sink) = translate(r#"{"cluster":{"degraded_processes":2}}"#);

        assert_eq!(result.unwrap(), ServiceCheckStatus::Warning);
        assert_eq!(sink.value_of("foundationdb.degraded_processes"), Some(2.0));

        let check = sink.service_checks().next().unwrap();
        assert_eq!(
            check,
            &MetricRecord::ServiceCheck {
                name: "foundationdb.can_connect".to_string(),
                status: ServiceCheckStatus::Warning,
                tags: vec![],
                message: Some(DEGRADED_MESSAGE.to_string()),
            }
        );
    }

    #[test]
    fn test_float_degraded_processes_warn() {
        let (result, sink) = translate(r#"{"cluster":{"degraded_processes":2.0}}"#);

        assert_eq!(result.unwrap(), ServiceCheckStatus::Warning);
        assert_eq!(sink.value_of("foundationdb.degraded_processes"), Some(2.0));
    }

    #[test]
    fn test_counts_use_document_sizes() {
        let (result, sink) = translate(
            r#"{"cluster": {
                "machines": {"a": {}, "b": null, "c": "x"},
                "processes": {
                    "p": {"address": "10.0.0.1:4500", "roles": [{"role": "log"}, null, "storage"]},
                    "q": null
                }
            }}"#,
        );

        assert!(result.is_ok());
        assert_eq!(sink.value_of("foundationdb.machines"), Some(3.0));
        assert_eq!(sink.value_of("foundationdb.processes"), Some(2.0));
        assert_eq!(sink.value_of("foundationdb.instances"), Some(3.0));
    }

    #[test]
    fn test_zero_degraded_processes_is_ok() {
        let (result, sink) = translate(r#"{"cluster":{"degraded_processes":0}}"#);
        assert_eq!(result.unwrap(), ServiceCheckStatus::Ok);
        assert_eq!(sink.value_of("foundationdb.degraded_processes"), Some(0.0));
    }

    #[test]
    fn test_role_without_type_emits_nothing() {
        let role: Role =
            serde_json::from_str(r#"{"id": "abc", "stored_bytes": 10, "mutations": {"hz": 1}}"#)
                .unwrap();
        let mut sink = RecordingSink::new();
        StatusTranslator::new().report_role(&role, &["process:a".to_string()], &mut sink);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_hz_only_counter() {
        let role: Role = serde_json::from_str(r#"{"role": "log", "input_bytes": {"hz": 4.5}}"#)
            .unwrap();
        let mut sink = RecordingSink::new();
        StatusTranslator::new().report_role(&role, &[], &mut sink);

        assert_eq!(sink.len(), 1);
        assert_eq!(
            sink.records()[0],
            MetricRecord::Gauge {
                name: "foundationdb.process.role.input_bytes.hz".to_string(),
                value: 4.5,
                tags: vec!["role:log".to_string()],
            }
        );
    }

    #[test]
    fn test_process_tags() {
        let (_, sink) = translate(
            r#"{"cluster": {"processes": {"p": {
                "address": "10.0.0.1:4500",
                "locality": {"machineid": "m1", "processid": "p1", "zoneid": "z1"},
                "cpu": {"usage_cores": 0.5},
                "roles": [{"role": "storage", "id": "s1", "stored_bytes": 100}]
            }}}}"#,
        );

        let cpu = sink.named("foundationdb.process.cpu.usage_cores").next().unwrap();
        assert_eq!(
            cpu.tags(),
            ["process:10.0.0.1:4500", "machineid:m1", "processid:p1", "zoneid:z1"]
        );

        let stored = sink.named("foundationdb.process.role.stored_bytes").next().unwrap();
        assert_eq!(stored.value(), Some(100.0));
        assert_eq!(
            stored.tags(),
            [
                "process:10.0.0.1:4500",
                "machineid:m1",
                "processid:p1",
                "zoneid:z1",
                "role:storage",
                "role_id:s1"
            ]
        );
    }

    #[test]
    fn test_process_without_address_skipped() {
        let (_, sink) = translate(
            r#"{"cluster": {"processes": {"p": {"cpu": {"usage_cores": 0.5}, "roles": [{"role": "log"}]}}}}"#,
        );

        assert_eq!(sink.value_of("foundationdb.processes"), Some(1.0));
        assert_eq!(sink.value_of("foundationdb.instances"), Some(1.0));
        assert!(sink.named("foundationdb.process.cpu.usage_cores").next().is_none());
    }

    #[test]
    fn test_disk_and_network() {
        let (_, sink) = translate(
            r#"{"cluster": {"processes": {"p": {
                "address": "a",
                "disk": {"free_bytes": 10, "reads": {"hz": 2.0, "counter": 40}, "writes": {"hz": 1.0, "count": 7}},
                "network": {"current_connections": {"value": 3}, "megabits_sent": {"hz": 0.1, "counter": 12}}
            }}}}"#,
        );

        assert_eq!(sink.value_of("foundationdb.process.disk.free_bytes"), Some(10.0));
        assert!(sink.named("foundationdb.process.disk.total_bytes").next().is_none());
        assert_eq!(sink.value_of("foundationdb.process.disk.reads.hz"), Some(2.0));
        assert_eq!(sink.value_of("foundationdb.process.disk.reads.count"), Some(40.0));
        assert_eq!(sink.value_of("foundationdb.process.disk.writes.count"), Some(7.0));
        assert_eq!(
            sink.value_of("foundationdb.process.network.current_connections"),
            Some(3.0)
        );
        assert_eq!(
            sink.value_of("foundationdb.process.network.megabits_sent.counter"),
            Some(12.0)
        );
        assert!(sink
            .named("foundationdb.process.network.connection_errors.hz")
            .next()
            .is_none());
    }

    #[test]
    fn test_role_statistics_and_lag() {
        let role: Role = serde_json::from_str(
            r#"{
                "role": "proxy",
                "data_lag": {"seconds": 0.5},
                "durability_lag": {"versions": 10},
                "grv_latency_statistics": {"default": {"count": 3, "p50": 0.001}, "batch": {"count": 9}},
                "commit_latency_statistics": {"count": 8, "min": 0.001, "max": 0.1, "p25": 0.002, "p50": 0.003, "p90": 0.05, "p99": 0.09}
            }"#,
        )
        .unwrap();
        let mut sink = RecordingSink::new();
        StatusTranslator::new().report_role(&role, &[], &mut sink);

        assert_eq!(
            names(&sink),
            [
                "foundationdb.process.role.data_lag.seconds",
                "foundationdb.process.role.grv_latency_statistics.default.count",
                "foundationdb.process.role.grv_latency_statistics.default.p50",
                "foundationdb.process.role.commit_latency_statistics.count",
                "foundationdb.process.role.commit_latency_statistics.min",
                "foundationdb.process.role.commit_latency_statistics.max",
                "foundationdb.process.role.commit_latency_statistics.p25",
                "foundationdb.process.role.commit_latency_statistics.p50",
                "foundationdb.process.role.commit_latency_statistics.p90",
                "foundationdb.process.role.commit_latency_statistics.p99",
            ]
        );
        assert!(matches!(
            sink.records()[3],
            MetricRecord::MonotonicCount { value, .. } if value == 8.0
        ));
    }

    #[test]
    fn test_roles_map_and_list_emit_same_metrics() {
        let (_, from_list) = translate(
            r#"{"cluster": {"processes": {"p": {"address": "a", "roles": [{"role": "log", "id": "l1", "mutations": {"hz": 1, "counter": 2}}]}}}}"#,
        );
        let (_, from_map) = translate(
            r#"{"cluster": {"processes": {"p": {"address": "a", "roles": {"l1": {"role": "log", "mutations": {"hz": 1, "counter": 2}}}}}}}"#,
        );
        assert_eq!(from_list.records(), from_map.records());
    }

    #[test]
    fn test_cluster_sections() {
        let (result, sink) = translate(
            r#"{"cluster": {
                "machines": {"m1": {}, "m2": {}},
                "data": {"total_kv_size_bytes": 100, "moving_data": {"in_queue_bytes": 5}},
                "datacenter_lag": {"seconds": 1.25, "versions": 1250000},
                "workload": {
                    "transactions": {"committed": {"hz": 10, "counter": 1000}},
                    "operations": {"reads": {"hz": 20}}
                },
                "latency_probe": {"commit_seconds": 0.02}
            }}"#,
        );

        assert_eq!(result.unwrap(), ServiceCheckStatus::Ok);
        assert_eq!(
            names(&sink),
            [
                "foundationdb.machines",
                "foundationdb.data.total_kv_size_bytes",
                "foundationdb.data.moving_data.in_queue_bytes",
                "foundationdb.datacenter_lag.seconds",
                "foundationdb.workload.transactions.committed.hz",
                "foundationdb.workload.transactions.committed.counter",
                "foundationdb.workload.operations.reads.hz",
                "foundationdb.latency_probe.commit_seconds",
                "foundationdb.can_connect",
            ]
        );
        assert_eq!(sink.value_of("foundationdb.machines"), Some(2.0));
        assert_eq!(sink.value_of("foundationdb.datacenter_lag.seconds"), Some(1.25));
    }

    #[test]
    fn test_wrong_shape_field_is_skipped() {
        let (result, sink) = translate(
            r#"{"cluster": {"processes": {"p": {"address": "a", "memory": {"used_bytes": "many", "limit_bytes": 8}}}}}"#,
        );
        assert!(result.is_ok());
        assert!(sink.named("foundationdb.process.memory.used_bytes").next().is_none());
        assert_eq!(sink.value_of("foundationdb.process.memory.limit_bytes"), Some(8.0));
    }

    #[test]
    fn test_translation_is_repeatable() {
        let document = StatusDocument::from_json(
            r#"{"cluster": {"processes": {"p": {"address": "a", "roles": [{"role": "storage", "read_latency_statistics": {"count": 1, "p99": 0.5}}]}}, "degraded_processes": 1}}"#,
        )
        .unwrap();
        let translator = StatusTranslator::new();

        let mut first = RecordingSink::new();
        let mut second = RecordingSink::new();
        translator.translate(&document, &mut first).unwrap();
        translator.translate(&document, &mut second).unwrap();

        assert!(!first.is_empty());
        assert_eq!(first.records(), second.records());
    }

    #[test]
    fn test_instance_tags_and_namespace() {
        let document = StatusDocument::from_json(r#"{"cluster": {"machines": {"m": {}}}}"#).unwrap();
        let translator = StatusTranslator::new()
            .with_namespace("fdb")
            .with_tags(["env:prod"]);
        let mut sink = RecordingSink::new();
        translator.translate(&document, &mut sink).unwrap();

        for record in sink.records() {
            assert!(record.name().starts_with("fdb."));
            assert_eq!(record.tags(), ["env:prod"]);
        }
        assert_eq!(translator.service_check_name(), "fdb.can_connect");
    }
}
