//! In-progress contexts built while streaming a report, and the flat rows
//! they are projected into.

/// Minimum service detection confidence for the detected name to be trusted.
pub const MIN_CONFIDENCE: u8 = 5;

/// Placeholder service name used when detection confidence is too low.
pub const UNTRUSTED_SERVICE_NAME: &str = "N/A";

/// One scanned machine, alive between `<host>` and `</host>`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct HostContext {
    /// First `ipv4` address.
    pub ip: Option<String>,
    /// First `ipv6` address, used only when the host has no IPv4 address.
    pub ipv6: Option<String>,
    /// First `mac` address.
    pub mac: Option<String>,
    /// Vendor attached to the first `mac` address.
    pub mac_vendor: Option<String>,
    /// Hostnames in document order.
    pub hostnames: Vec<String>,
    /// Name of the first `osmatch`.
    pub os_name: Option<String>,
    /// `osfamily` of the first `osclass` carrying one.
    pub os_flavor: Option<String>,
    /// `osgen` of the first `osclass` carrying one.
    pub os_service_pack: Option<String>,
    /// Closed ports, in document order.
    pub ports: Vec<PortContext>,
}

impl HostContext {
    /// Address the host is identified by: IPv4 first, then IPv6.
    pub fn address(&self) -> Option<&str> {
        self.ip.as_deref().or(self.ipv6.as_deref())
    }

    /// Hostname shown in both datasets. Only the first one is kept.
    pub fn display_name(&self) -> Option<&str> {
        self.hostnames.first().map(String::as_str)
    }
}

/// One `<port>` of a host.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PortContext {
    /// The `portid` attribute.
    pub port_id: String,
    /// Transport protocol, e.g. `tcp`.
    pub protocol: String,
    /// State of the first `<state>` child.
    pub state: Option<String>,
    /// The first `<service>` child.
    pub service: Option<ServiceContext>,
    pub(crate) scripts: PortScripts,
}

impl PortContext {
    /// A port with no state or service yet.
    pub fn new(port_id: impl Into<String>, protocol: impl Into<String>) -> Self {
        Self {
            port_id: port_id.into(),
            protocol: protocol.into(),
            ..Self::default()
        }
    }
}

/// Script results seen under a port, held until the port closes so they can
/// be resolved against a fully read service.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct PortScripts {
    pub http_title: Option<String>,
    pub vulners: Option<Vec<ScriptTable>>,
}

/// A `<table>` inside a script result.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScriptTable {
    /// The table's `key` attribute.
    pub key: Option<String>,
    /// `<elem key="...">value</elem>` children, in document order.
    pub elems: Vec<(Option<String>, String)>,
    /// Nested tables, in document order.
    pub tables: Vec<ScriptTable>,
}

impl ScriptTable {
    /// Value of the first elem with the given key.
    pub fn elem(&self, key: &str) -> Option<&str> {
        self.elems
            .iter()
            .find(|(k, _)| k.as_deref() == Some(key))
            .map(|(_, v)| v.as_str())
    }
}

/// The `<service>` detected on a port.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ServiceContext {
    /// Detected service name.
    pub name: Option<String>,
    /// Tunnel wrapping the service, e.g. `ssl`.
    pub tunnel: Option<String>,
    /// Product name, e.g. `Apache httpd`.
    pub product: Option<String>,
    /// Product version.
    pub version: Option<String>,
    /// The `extrainfo` attribute.
    pub extra_info: Option<String>,
    /// Detection confidence, 0 when absent or unparsable.
    pub confidence: u8,
    /// Output of the port's first `http-title` script.
    pub http_title: Option<String>,
    /// Platform identifier, the first `<cpe>` child.
    pub cpe: Option<String>,
    /// At most three links, in document order.
    pub vulnerability_links: Vec<String>,
}

impl ServiceContext {
    /// Detected name if confidence reaches [`MIN_CONFIDENCE`], otherwise "N/A".
    pub fn display_name(&self) -> &str {
        match &self.name {
            Some(name) if self.confidence >= MIN_CONFIDENCE => name,
            _ => UNTRUSTED_SERVICE_NAME,
        }
    }

    /// Product, version and extra info joined by single spaces, skipping
    /// empty parts. Only the ends of the result are trimmed.
    pub fn info(&self) -> String {
        [&self.product, &self.version, &self.extra_info]
            .into_iter()
            .filter_map(Option::as_deref)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
            .trim()
            .to_owned()
    }
}

/// One row of the host dataset.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct HostRecord {
    /// IPv4 address, or IPv6 when there is none. The dedup key.
    pub address: Option<String>,
    /// MAC address, only known for hosts on the local segment.
    pub mac: Option<String>,
    /// First hostname.
    pub name: Option<String>,
    /// Best OS guess.
    pub os_name: Option<String>,
    /// OS family of the best guess.
    pub os_flavor: Option<String>,
    /// Written as `os_sp`.
    pub os_service_pack: Option<String>,
}

/// One row of the service dataset, one per port of a host.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ServiceRow {
    /// Address of the owning host.
    pub address: Option<String>,
    /// First hostname of the owning host.
    pub hostname: Option<String>,
    /// MAC address of the owning host.
    pub mac: Option<String>,
    /// Vendor of that MAC address.
    pub mac_vendor: Option<String>,
    /// Best OS guess of the owning host.
    pub os_name: Option<String>,
    /// Port number as written in the report.
    pub port: String,
    /// Transport protocol, e.g. `tcp`.
    pub transport_protocol: String,
    /// `None` when the port had no service at all, "N/A" when the service
    /// name was not trusted.
    pub service_name: Option<String>,
    /// Port state, e.g. `open`.
    pub state: Option<String>,
    /// Tunnel wrapping the service, e.g. `ssl`.
    pub tunnel: Option<String>,
    /// Output of the port's `http-title` script.
    pub http_title: Option<String>,
    /// See [`ServiceContext::info`].
    pub info: Option<String>,
    /// Platform identifier of the service.
    pub cpe: Option<String>,
    /// Joined into a single field when written.
    pub vulnerability_links: Vec<String>,
    /// Kept for filtering, never written out.
    pub confidence: Option<u8>,
}

/// Rows produced by one report.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DocumentRows {
    /// One per host, in document order.
    pub hosts: Vec<HostRecord>,
    /// One per port, in document order.
    pub services: Vec<ServiceRow>,
}

impl DocumentRows {
    /// True when the report held no host.
    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty() && self.services.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{HostContext, ServiceContext, UNTRUSTED_SERVICE_NAME};
    use parameterized::parameterized;

    fn service(name: &str, confidence: u8) -> ServiceContext {
        ServiceContext {
            name: Some(name.to_owned()),
            confidence,
            ..ServiceContext::default()
        }
    }

    #[parameterized(confidence = { 0, 4, 5, 10 }, expected = { "N/A", "N/A", "http", "http" })]
    fn display_name_follows_confidence(confidence: u8, expected: &str) {
        assert_eq!(service("http", confidence).display_name(), expected);
    }

    #[test]
    fn display_name_without_name_is_untrusted() {
        let service = ServiceContext {
            confidence: 10,
            ..ServiceContext::default()
        };
        assert_eq!(service.display_name(), UNTRUSTED_SERVICE_NAME);
    }

    #[parameterized(product = {
        Some("Apache httpd"), Some("OpenSSH"), None, Some("  nginx "), None, Some("Apache httpd ")
    }, version = {
        Some("2.4.41"), Some("7.4"), Some("1.0"), None, None, Some(" 2.4")
    }, extra = {
        Some(""), Some("protocol 2.0"), None, Some(""), Some(""), None
    }, expected = {
        "Apache httpd 2.4.41", "OpenSSH 7.4 protocol 2.0", "1.0", "nginx", "", "Apache httpd   2.4"
    })]
    fn info_joins_non_empty_parts(
        product: Option<&str>,
        version: Option<&str>,
        extra: Option<&str>,
        expected: &str,
    ) {
        let service = ServiceContext {
            product: product.map(str::to_owned),
            version: version.map(str::to_owned),
            extra_info: extra.map(str::to_owned),
            ..ServiceContext::default()
        };
        assert_eq!(service.info(), expected);
    }

    #[test]
    fn address_prefers_ipv4() {
        let mut host = HostContext {
            ipv6: Some("::1".to_owned()),
            ..HostContext::default()
        };
        assert_eq!(host.address(), Some("::1"));

        host.ip = Some("10.0.0.1".to_owned());
        assert_eq!(host.address(), Some("10.0.0.1"));
    }

    #[test]
    fn display_name_is_first_hostname() {
        let host = HostContext {
            hostnames: vec!["a.example".to_owned(), "b.example".to_owned()],
            ..HostContext::default()
        };
        assert_eq!(host.display_name(), Some("a.example"));
        assert_eq!(HostContext::default().display_name(), None);
    }
}
