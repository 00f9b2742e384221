//! Correlates the `vulners` NSE script output with a service's CPE.
//!
//! The script nests its findings as
//!
//! ```xml
//! <script id="vulners">
//!   <table key="cpe:/a:openbsd:openssh:7.4">
//!     <table>
//!       <elem key="id">CVE-2023-38408</elem>
//!       <elem key="type">cve</elem>
//!     </table>
//!   </table>
//! </script>
//! ```
//!
//! Only the outer table whose key equals the service CPE is considered.
use crate::model::ScriptTable;

/// Maximum number of links kept per service.
pub const MAX_LINKS: usize = 3;

const VULNERS_BASE_URL: &str = "https://vulners.com";

/// Builds up to [`MAX_LINKS`] reference links for `cpe` out of the vulners
/// tables. Entries lacking a `type` or an `id` are skipped and do not count
/// towards the limit.
///
/// ```rust
/// # use nmap2csv::model::ScriptTable;
/// # use nmap2csv::vulners::correlate;
/// let entry = ScriptTable {
///     elems: vec![
///         (Some("type".to_owned()), "cve".to_owned()),
///         (Some("id".to_owned()), "CVE-2021-41773".to_owned()),
///     ],
///     ..ScriptTable::default()
/// };
/// let outer = ScriptTable {
///     key: Some("cpe:/a:apache:http_server:2.4.49".to_owned()),
///     tables: vec![entry],
///     ..ScriptTable::default()
/// };
///
/// let links = correlate(Some("cpe:/a:apache:http_server:2.4.49"), &[outer]);
/// assert_eq!(links, ["https://vulners.com/cve/CVE-2021-41773"]);
/// ```
pub fn correlate(cpe: Option<&str>, tables: &[ScriptTable]) -> Vec<String> {
    let Some(cpe) = cpe else {
        return Vec::new();
    };

    tables
        .iter()
        .find(|table| table.key.as_deref() == Some(cpe))
        .map(|table| {
            table
                .tables
                .iter()
                .filter_map(|entry| Some((entry.elem("type")?, entry.elem("id")?)))
                .take(MAX_LINKS)
                .map(|(kind, id)| format!("{VULNERS_BASE_URL}/{kind}/{id}"))
                .collect()
        })
        .unwrap_or_default()
}
