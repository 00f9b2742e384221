//! Streams an Nmap XML report and projects it into flat rows.
//!
//! The report is never held in memory as a tree. Each element pushes a
//! frame on an explicit context stack; the fields the datasets need are read
//! from attributes as elements open, and a host is turned into rows as soon
//! as its `</host>` is seen.
mod frame;

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::debug;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::model::{PortContext, ServiceContext};
use crate::{DocumentRows, Error, Result};
use frame::{ContextStack, Frame, ScriptKind};

/// Parses a whole report from `source`.
///
/// ```rust
/// # use nmap2csv::parser::parse_document;
/// let xml = r#"<nmaprun><host>
///   <address addr="10.0.0.1" addrtype="ipv4"/>
///   <ports><port protocol="tcp" portid="22">
///     <state state="open"/>
///     <service name="ssh" conf="10"/>
///   </port></ports>
/// </host></nmaprun>"#;
///
/// let rows = parse_document(xml.as_bytes()).unwrap();
/// assert_eq!(rows.hosts[0].address.as_deref(), Some("10.0.0.1"));
/// assert_eq!(rows.services[0].service_name.as_deref(), Some("ssh"));
/// ```
pub fn parse_document<R: BufRead>(source: R) -> Result<DocumentRows> {
    let mut reader = Reader::from_reader(source);
    reader.config_mut().trim_text(true);

    let mut stack = ContextStack::default();
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(element) => open(&mut stack, &element)?,
            Event::Empty(element) => {
                open(&mut stack, &element)?;
                stack.close();
            }
            Event::End(_) => stack.close(),
            Event::Text(text) if stack.accepts_text() => stack.text(&text.unescape()?),
            Event::CData(data) if stack.accepts_text() => {
                stack.text(&String::from_utf8_lossy(&data));
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    let rows = stack.finish()?;
    debug!(
        "Parsed {} host(s) and {} service row(s)",
        rows.hosts.len(),
        rows.services.len()
    );
    Ok(rows)
}

/// Opens and parses the report at `path`.
pub fn parse_file(path: impl AsRef<Path>) -> Result<DocumentRows> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    debug!("Parsing {}", path.display());
    parse_document(BufReader::new(file))
}

/// Handles an open event: extracts fields into the current context and
/// pushes the frame for the element.
fn open(stack: &mut ContextStack, element: &BytesStart<'_>) -> Result<()> {
    let frame = match element.local_name().as_ref() {
        b"host" => Frame::Host(Default::default()),
        b"address" => {
            if let Some(host) = stack.host_mut() {
                let addr = attr(element, "addr")?;
                match attr(element, "addrtype")?.as_deref() {
                    Some("ipv4") if host.ip.is_none() => host.ip = addr,
                    Some("ipv6") if host.ipv6.is_none() => host.ipv6 = addr,
                    Some("mac") if host.mac.is_none() => {
                        host.mac = addr;
                        host.mac_vendor = attr(element, "vendor")?;
                    }
                    _ => {}
                }
            }
            other(element)
        }
        b"hostname" => {
            if let Some(host) = stack.host_mut() {
                if let Some(name) = attr(element, "name")? {
                    host.hostnames.push(name);
                }
            }
            other(element)
        }
        b"osmatch" => {
            if let Some(host) = stack.host_mut() {
                if host.os_name.is_none() {
                    host.os_name = attr(element, "name")?;
                }
            }
            other(element)
        }
        b"osclass" => {
            if let Some(host) = stack.host_mut() {
                if host.os_service_pack.is_none() {
                    host.os_service_pack = attr(element, "osgen")?;
                }
                if host.os_flavor.is_none() {
                    host.os_flavor = attr(element, "osfamily")?;
                }
            }
            other(element)
        }
        b"port" if stack.in_host() => Frame::Port(PortContext::new(
            attr(element, "portid")?.unwrap_or_default(),
            attr(element, "protocol")?.unwrap_or_default(),
        )),
        b"state" => {
            if let Some(Frame::Port(port)) = stack.top_mut() {
                if port.state.is_none() {
                    port.state = attr(element, "state")?;
                }
            }
            other(element)
        }
        b"service" if matches!(stack.top(), Some(Frame::Port(_))) => {
            Frame::Service(service(element)?)
        }
        b"cpe" if matches!(stack.top(), Some(Frame::Service(_))) => Frame::Cpe(String::new()),
        b"script" if matches!(stack.top(), Some(Frame::Port(_) | Frame::Service(_))) => {
            let id = attr(element, "id")?;
            Frame::Script(ScriptKind::new(id.as_deref(), attr(element, "output")?))
        }
        b"table"
            if matches!(
                stack.top(),
                Some(Frame::Table(_) | Frame::Script(ScriptKind::Vulners(_)))
            ) =>
        {
            Frame::Table(crate::model::ScriptTable {
                key: attr(element, "key")?,
                ..Default::default()
            })
        }
        b"elem" if matches!(stack.top(), Some(Frame::Table(_))) => Frame::Elem {
            key: attr(element, "key")?,
            value: String::new(),
        },
        _ => other(element),
    };

    stack.push(frame);
    Ok(())
}

fn service(element: &BytesStart<'_>) -> Result<ServiceContext> {
    Ok(ServiceContext {
        name: attr(element, "name")?,
        tunnel: attr(element, "tunnel")?,
        product: attr(element, "product")?,
        version: attr(element, "version")?,
        extra_info: attr(element, "extrainfo")?,
        confidence: attr(element, "conf")?
            .and_then(|conf| conf.trim().parse().ok())
            .unwrap_or(0),
        ..ServiceContext::default()
    })
}

fn other(element: &BytesStart<'_>) -> Frame {
    Frame::Other(String::from_utf8_lossy(element.local_name().as_ref()).into())
}

/// Unescaped value of the attribute named `key`, if present.
fn attr(element: &BytesStart<'_>, key: &str) -> Result<Option<String>> {
    for attribute in element.attributes() {
        let attribute = attribute?;
        if attribute.key.as_ref() == key.as_bytes() {
            return Ok(Some(attribute.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}
