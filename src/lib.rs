//! This crate exposes the internal functionality of `nmap2csv`, a converter
//! from [Nmap](https://nmap.org) XML reports to spreadsheet-friendly CSV.
//!
//! Every report is streamed through [`parser::parse_document`], which never
//! builds a document tree: an explicit stack of host, port and service
//! contexts follows the element nesting, and each host is projected into
//! rows as soon as it closes. The rows of many reports are then merged with
//! [`aggregate::Aggregator`] and deduplicated.
//!
//! ## Datasets
//!
//! - **hosts**: one row per address, with MAC, first hostname and OS guess.
//! - **services**: one row per host, port and detected service. The service
//!   name is only trusted with a detection confidence of at least
//!   [`model::MIN_CONFIDENCE`]; otherwise it reads `N/A`. Up to three
//!   [vulners](https://vulners.com) links are attached when the `vulners`
//!   script reported findings for the service CPE.
//!
//! ## Usage Example
//!
//! ```rust
//! use std::path::PathBuf;
//!
//! use nmap2csv::aggregate::Aggregator;
//! use nmap2csv::parser::parse_document;
//!
//! let report = r#"<nmaprun><host>
//!   <address addr="10.0.0.1" addrtype="ipv4"/>
//!   <hostnames><hostname name="web.local"/></hostnames>
//!   <ports><port protocol="tcp" portid="80">
//!     <state state="open"/>
//!     <service name="http" product="Apache httpd" version="2.4.41" conf="10"/>
//!   </port></ports>
//! </host></nmaprun>"#;
//!
//! let mut aggregator = Aggregator::new();
//! aggregator.add(PathBuf::from("b.xml"), parse_document(report.as_bytes())?);
//! aggregator.add(PathBuf::from("a.xml"), parse_document(report.as_bytes())?);
//!
//! let merged = aggregator.finish();
//! assert_eq!(merged.hosts.len(), 1);
//! assert_eq!(merged.services[0].info.as_deref(), Some("Apache httpd 2.4.41"));
//! # Ok::<(), nmap2csv::Error>(())
//! ```
//!
//! ## Error Handling
//!
//! A report that is not well-formed XML, or that ends with elements still
//! open, fails with an [`Error`]. Nothing parsed from other reports is lost;
//! the caller decides whether to skip the report or abort.
#![warn(missing_docs)]

pub mod tui;

pub mod input;

pub mod model;

pub mod parser;

pub mod vulners;

pub mod projector;

pub mod aggregate;

pub mod discovery;

pub mod output;

mod error;

pub use error::{Error, Result};
pub use model::DocumentRows;
