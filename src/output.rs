//! Writes the two datasets as CSV files.
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use csv::{QuoteStyle, WriterBuilder};
use log::debug;

use crate::model::{HostRecord, ServiceRow};
use crate::Result;

/// File name of the host dataset.
pub const HOSTS_CSV_FILENAME: &str = "hosts.csv";
/// File name of the service dataset.
pub const SERVICES_CSV_FILENAME: &str = "services.csv";

/// How rows are rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputOptions {
    /// Field delimiter, a single ASCII byte.
    pub delimiter: u8,
    /// Placed between vulnerability links inside their single field.
    pub link_separator: String,
    /// Whether the service dataset carries the `cpe` column.
    pub include_cpe: bool,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            delimiter: b';',
            link_separator: "\n".to_owned(),
            include_cpe: true,
        }
    }
}

/// A row type with a fixed, declared column order.
pub trait Tabular {
    /// Column names, in order.
    fn headers(options: &OutputOptions) -> Vec<&'static str>;

    /// One value per column; absent values are empty strings.
    fn fields(&self, options: &OutputOptions) -> Vec<String>;
}

fn value(field: Option<&String>) -> String {
    field.cloned().unwrap_or_default()
}

impl Tabular for HostRecord {
    fn headers(_: &OutputOptions) -> Vec<&'static str> {
        vec!["address", "mac", "name", "os_name", "os_flavor", "os_sp"]
    }

    fn fields(&self, _: &OutputOptions) -> Vec<String> {
        vec![
            value(self.address.as_ref()),
            value(self.mac.as_ref()),
            value(self.name.as_ref()),
            value(self.os_name.as_ref()),
            value(self.os_flavor.as_ref()),
            value(self.os_service_pack.as_ref()),
        ]
    }
}

impl Tabular for ServiceRow {
    fn headers(options: &OutputOptions) -> Vec<&'static str> {
        let mut headers = vec![
            "IP-address",
            "hostname",
            "mac",
            "mac-vendor",
            "os_name",
            "port",
            "transport-protocol",
            "service-name",
            "state",
            "tunnel",
            "http-title",
            "info",
        ];
        if options.include_cpe {
            headers.push("cpe");
        }
        headers.push("vulnerability-links");
        headers
    }

    fn fields(&self, options: &OutputOptions) -> Vec<String> {
        let mut fields = vec![
            value(self.address.as_ref()),
            value(self.hostname.as_ref()),
            value(self.mac.as_ref()),
            value(self.mac_vendor.as_ref()),
            value(self.os_name.as_ref()),
            self.port.clone(),
            self.transport_protocol.clone(),
            value(self.service_name.as_ref()),
            value(self.state.as_ref()),
            value(self.tunnel.as_ref()),
            value(self.http_title.as_ref()),
            value(self.info.as_ref()),
        ];
        if options.include_cpe {
            fields.push(value(self.cpe.as_ref()));
        }
        fields.push(self.vulnerability_links.join(&options.link_separator));
        fields
    }
}

/// Writes a header and every row to `writer`, quoting every field.
pub fn write_records<W: io::Write, T: Tabular>(
    writer: W,
    rows: &[T],
    options: &OutputOptions,
) -> Result<()> {
    let mut wtr = WriterBuilder::new()
        .delimiter(options.delimiter)
        .quote_style(QuoteStyle::Always)
        .from_writer(writer);

    wtr.write_record(T::headers(options))?;
    for row in rows {
        wtr.write_record(row.fields(options))?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Writes `rows` to `dir/file_name`, creating `dir` if needed.
///
/// Returns `None` without touching the filesystem when there are no rows.
pub fn write_csv<T: Tabular>(
    dir: &Path,
    file_name: &str,
    rows: &[T],
    options: &OutputOptions,
) -> Result<Option<PathBuf>> {
    if rows.is_empty() {
        return Ok(None);
    }

    fs::create_dir_all(dir).map_err(|e| crate::Error::io(dir, e))?;
    let path = dir.join(file_name);
    let file = File::create(&path).map_err(|e| crate::Error::io(&path, e))?;
    write_records(file, rows, options)?;
    debug!("Wrote {} row(s) to {}", rows.len(), path.display());
    Ok(Some(path))
}

#[cfg(test)]
mod tests {
    use super::{write_csv, write_records, OutputOptions, Tabular};
    use crate::model::{HostRecord, ServiceRow};
    use tempfile::tempdir;

    fn render<T: Tabular>(rows: &[T], options: &OutputOptions) -> String {
        let mut out = Vec::new();
        write_records(&mut out, rows, options).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn hosts_are_fully_quoted_with_semicolons() {
        let host = HostRecord {
            address: Some("10.0.0.1".to_owned()),
            name: Some("web".to_owned()),
            ..HostRecord::default()
        };

        assert_eq!(
            render(&[host], &OutputOptions::default()),
            "\"address\";\"mac\";\"name\";\"os_name\";\"os_flavor\";\"os_sp\"\n\
             \"10.0.0.1\";\"\";\"web\";\"\";\"\";\"\"\n"
        );
    }

    #[test]
    fn service_columns_line_up_with_headers() {
        let options = OutputOptions::default();
        let row = ServiceRow::default();

        assert_eq!(ServiceRow::headers(&options).len(), row.fields(&options).len());

        let options = OutputOptions {
            include_cpe: false,
            ..OutputOptions::default()
        };
        assert!(!ServiceRow::headers(&options).contains(&"cpe"));
        assert_eq!(ServiceRow::headers(&options).len(), row.fields(&options).len());
    }

    #[test]
    fn links_are_joined_with_the_separator() {
        let row = ServiceRow {
            vulnerability_links: vec![
                "https://vulners.com/cve/CVE-1".to_owned(),
                "https://vulners.com/cve/CVE-2".to_owned(),
            ],
            ..ServiceRow::default()
        };
        let options = OutputOptions {
            link_separator: " | ".to_owned(),
            ..OutputOptions::default()
        };

        let fields = row.fields(&options);
        assert_eq!(
            fields.last().map(String::as_str),
            Some("https://vulners.com/cve/CVE-1 | https://vulners.com/cve/CVE-2")
        );
    }

    #[test]
    fn custom_delimiter_is_used() {
        let options = OutputOptions {
            delimiter: b',',
            ..OutputOptions::default()
        };
        let out = render(&[HostRecord::default()], &options);
        assert!(out.starts_with("\"address\",\"mac\","));
    }

    #[test]
    fn empty_dataset_writes_nothing() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("out");

        let written = write_csv::<HostRecord>(&out, "hosts.csv", &[], &OutputOptions::default());
        assert_eq!(written.unwrap(), None);
        assert!(!out.exists());
    }

    #[test]
    fn output_directory_is_created() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("nested").join("out");

        let written = write_csv(&out, "hosts.csv", &[HostRecord::default()], &OutputOptions::default())
            .unwrap()
            .unwrap();
        assert_eq!(written, out.join("hosts.csv"));
        assert!(written.is_file());
    }
}
