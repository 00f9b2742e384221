//! Merges the rows of many reports and removes duplicates.
//!
//! Reports are always merged in path order, whatever order they were parsed
//! in, so the surviving copy of a duplicated row is stable across runs.
use std::path::PathBuf;

use itertools::Itertools;
use log::debug;

use crate::model::{DocumentRows, HostRecord, ServiceRow};

/// Identity of a service row across reports.
type ServiceKey = (
    Option<String>,
    String,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
);

fn service_key(row: &ServiceRow) -> ServiceKey {
    (
        row.address.clone(),
        row.port.clone(),
        row.transport_protocol.clone(),
        row.service_name.clone(),
        row.state.clone(),
        row.tunnel.clone(),
    )
}

/// Keeps the first host row seen for each address.
pub fn dedup_hosts(hosts: impl IntoIterator<Item = HostRecord>) -> Vec<HostRecord> {
    hosts
        .into_iter()
        .unique_by(|host| host.address.clone())
        .collect()
}

/// Keeps the first service row seen for each
/// (address, port, protocol, service name, state, tunnel).
pub fn dedup_services(services: impl IntoIterator<Item = ServiceRow>) -> Vec<ServiceRow> {
    services.into_iter().unique_by(service_key).collect()
}

/// The final, deduplicated datasets.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AggregateReport {
    /// Unique by address.
    pub hosts: Vec<HostRecord>,
    /// Unique by address, port, protocol, service name, state and tunnel.
    pub services: Vec<ServiceRow>,
}

impl AggregateReport {
    /// Applies both identity policies. Running it again changes nothing.
    #[must_use]
    pub fn dedup(self) -> Self {
        Self {
            hosts: dedup_hosts(self.hosts),
            services: dedup_services(self.services),
        }
    }
}

/// Collects per-report rows until every report has been parsed.
#[derive(Debug, Default)]
pub struct Aggregator {
    documents: Vec<(PathBuf, DocumentRows)>,
}

impl Aggregator {
    /// An aggregator with no reports yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the rows parsed out of `path`.
    pub fn add(&mut self, path: impl Into<PathBuf>, rows: DocumentRows) {
        self.documents.push((path.into(), rows));
    }

    /// Number of reports recorded so far.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// True until a report is recorded.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Orders the reports by path, concatenates their rows and deduplicates.
    pub fn finish(mut self) -> AggregateReport {
        self.documents.sort_by(|(a, _), (b, _)| a.cmp(b));

        let mut report = AggregateReport::default();
        for (path, rows) in self.documents {
            debug!(
                "Merging {}: {} host(s), {} service row(s)",
                path.display(),
                rows.hosts.len(),
                rows.services.len()
            );
            report.hosts.extend(rows.hosts);
            report.services.extend(rows.services);
        }

        let total = (report.hosts.len(), report.services.len());
        let report = report.dedup();
        debug!(
            "Deduplicated {} -> {} host(s), {} -> {} service row(s)",
            total.0,
            report.hosts.len(),
            total.1,
            report.services.len()
        );
        report
    }
}

/// One-shot form of [`Aggregator`].
pub fn aggregate(
    documents: impl IntoIterator<Item = (PathBuf, DocumentRows)>,
) -> AggregateReport {
    let mut aggregator = Aggregator::new();
    for (path, rows) in documents {
        aggregator.add(path, rows);
    }
    aggregator.finish()
}

#[cfg(test)]
mod tests {
    use super::{aggregate, dedup_hosts, dedup_services, AggregateReport, Aggregator};
    use crate::model::{DocumentRows, HostRecord, ServiceRow};
    use std::path::PathBuf;

    fn host(address: &str, name: &str) -> HostRecord {
        HostRecord {
            address: Some(address.to_owned()),
            name: Some(name.to_owned()),
            ..HostRecord::default()
        }
    }

    fn service(address: &str, port: &str, name: &str, title: &str) -> ServiceRow {
        ServiceRow {
            address: Some(address.to_owned()),
            port: port.to_owned(),
            transport_protocol: "tcp".to_owned(),
            service_name: Some(name.to_owned()),
            state: Some("open".to_owned()),
            http_title: Some(title.to_owned()),
            ..ServiceRow::default()
        }
    }

    #[test]
    fn first_host_per_address_wins() {
        let hosts = dedup_hosts([
            host("10.0.0.1", "first"),
            host("10.0.0.2", "other"),
            host("10.0.0.1", "second"),
        ]);

        assert_eq!(hosts, [host("10.0.0.1", "first"), host("10.0.0.2", "other")]);
    }

    #[test]
    fn service_identity_ignores_non_key_fields() {
        let services = dedup_services([
            service("10.0.0.1", "80", "http", "first"),
            service("10.0.0.1", "80", "http", "second"),
            service("10.0.0.1", "80", "N/A", "third"),
            service("10.0.0.1", "443", "http", "fourth"),
        ]);

        let titles: Vec<_> = services
            .iter()
            .map(|row| row.http_title.as_deref().unwrap())
            .collect();
        assert_eq!(titles, ["first", "third", "fourth"]);
    }

    #[test]
    fn absent_service_name_differs_from_not_available() {
        let mut absent = service("10.0.0.1", "80", "N/A", "absent");
        absent.service_name = None;
        let services = dedup_services([service("10.0.0.1", "80", "N/A", "na"), absent]);

        assert_eq!(services.len(), 2);
    }

    #[test]
    fn dedup_is_idempotent() {
        let report = AggregateReport {
            hosts: vec![host("a", "1"), host("b", "2"), host("a", "3")],
            services: vec![
                service("a", "22", "ssh", "x"),
                service("a", "22", "ssh", "y"),
            ],
        };

        let once = report.dedup();
        let twice = once.clone().dedup();
        assert_eq!(once, twice);
    }

    #[test]
    fn reports_merge_in_path_order() {
        let rows = |name: &str| DocumentRows {
            hosts: vec![host("10.0.0.1", name)],
            services: vec![service("10.0.0.1", "80", "http", name)],
        };

        let mut aggregator = Aggregator::new();
        aggregator.add("scans/b.xml", rows("b"));
        aggregator.add("scans/a.xml", rows("a"));
        assert_eq!(aggregator.len(), 2);

        let report = aggregator.finish();
        assert_eq!(report.hosts, [host("10.0.0.1", "a")]);
        assert_eq!(report.services.len(), 1);
        assert_eq!(report.services[0].http_title.as_deref(), Some("a"));
    }

    #[test]
    fn aggregate_of_nothing_is_empty() {
        let report = aggregate(Vec::<(PathBuf, DocumentRows)>::new());
        assert_eq!(report, AggregateReport::default());
    }
}
