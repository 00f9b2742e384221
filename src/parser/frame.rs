//! The explicit context stack mirroring the report's element nesting.
use log::trace;

use crate::model::{
    DocumentRows, HostContext, PortContext, PortScripts, ScriptTable, ServiceContext,
};
use crate::projector::project_host;
use crate::vulners::correlate;

const HTTP_TITLE_SCRIPT: &str = "http-title";
const VULNERS_SCRIPT: &str = "vulners";

/// Which script result a `<script>` frame is collecting.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum ScriptKind {
    HttpTitle(Option<String>),
    Vulners(Vec<ScriptTable>),
    Ignored,
}

impl ScriptKind {
    pub(crate) fn new(id: Option<&str>, output: Option<String>) -> Self {
        match id {
            Some(HTTP_TITLE_SCRIPT) => Self::HttpTitle(output),
            Some(VULNERS_SCRIPT) => Self::Vulners(Vec::new()),
            other => {
                trace!("Ignoring script {other:?}");
                Self::Ignored
            }
        }
    }
}

/// One open element. Every open event pushes exactly one frame and every
/// close event pops one, so the stack depth is the document depth.
#[derive(Debug)]
pub(crate) enum Frame {
    Host(HostContext),
    Port(PortContext),
    Service(ServiceContext),
    Script(ScriptKind),
    Table(ScriptTable),
    Elem { key: Option<String>, value: String },
    Cpe(String),
    Other(Box<str>),
}

impl Frame {
    fn tag(&self) -> &str {
        match self {
            Self::Host(_) => "host",
            Self::Port(_) => "port",
            Self::Service(_) => "service",
            Self::Script(_) => "script",
            Self::Table(_) => "table",
            Self::Elem { .. } => "elem",
            Self::Cpe(_) => "cpe",
            Self::Other(name) => &**name,
        }
    }
}

impl PortContext {
    /// Moves the script results held on the port into its service, now that
    /// the service and its CPE are fully read.
    fn resolve_scripts(&mut self) {
        let PortScripts {
            http_title,
            vulners,
        } = std::mem::take(&mut self.scripts);

        if let Some(service) = self.service.as_mut() {
            service.http_title = http_title;
            if let Some(tables) = vulners {
                service.vulnerability_links = correlate(service.cpe.as_deref(), &tables);
            }
        }
    }
}

/// Tracks the open elements of one document and collects the rows of every
/// host that closes.
#[derive(Debug, Default)]
pub(crate) struct ContextStack {
    frames: Vec<Frame>,
    rows: DocumentRows,
}

impl ContextStack {
    pub(crate) fn push(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    pub(crate) fn top(&self) -> Option<&Frame> {
        self.frames.last()
    }

    pub(crate) fn top_mut(&mut self) -> Option<&mut Frame> {
        self.frames.last_mut()
    }

    /// The innermost host, wherever it sits below the top.
    pub(crate) fn host_mut(&mut self) -> Option<&mut HostContext> {
        self.frames.iter_mut().rev().find_map(|frame| match frame {
            Frame::Host(host) => Some(host),
            _ => None,
        })
    }

    pub(crate) fn in_host(&self) -> bool {
        self.frames.iter().any(|frame| matches!(frame, Frame::Host(_)))
    }

    /// The innermost port of the current host.
    fn port_mut(&mut self) -> Option<&mut PortContext> {
        for frame in self.frames.iter_mut().rev() {
            match frame {
                Frame::Port(port) => return Some(port),
                Frame::Host(_) => return None,
                _ => {}
            }
        }
        None
    }

    /// Whether the top frame captures character data.
    pub(crate) fn accepts_text(&self) -> bool {
        matches!(self.top(), Some(Frame::Elem { .. } | Frame::Cpe(_)))
    }

    pub(crate) fn text(&mut self, text: &str) {
        match self.top_mut() {
            Some(Frame::Elem { value, .. } | Frame::Cpe(value)) => value.push_str(text),
            _ => {}
        }
    }

    /// Pops the innermost frame and hands its content to its parent.
    pub(crate) fn close(&mut self) {
        let Some(frame) = self.frames.pop() else {
            return;
        };

        match frame {
            Frame::Host(host) => {
                trace!("Closing host {:?} with {} port(s)", host.address(), host.ports.len());
                project_host(host, &mut self.rows);
            }
            Frame::Port(mut port) => {
                port.resolve_scripts();
                if let Some(host) = self.host_mut() {
                    host.ports.push(port);
                }
            }
            Frame::Service(service) => {
                if let Some(Frame::Port(port)) = self.top_mut() {
                    if port.service.is_none() {
                        port.service = Some(service);
                    }
                }
            }
            Frame::Script(kind) => {
                let Some(port) = self.port_mut() else {
                    return;
                };
                match kind {
                    ScriptKind::HttpTitle(Some(title)) => {
                        port.scripts.http_title.get_or_insert(title);
                    }
                    ScriptKind::Vulners(tables) => {
                        port.scripts.vulners.get_or_insert(tables);
                    }
                    ScriptKind::HttpTitle(None) | ScriptKind::Ignored => {}
                }
            }
            Frame::Table(table) => match self.top_mut() {
                Some(Frame::Table(parent)) => parent.tables.push(table),
                Some(Frame::Script(ScriptKind::Vulners(tables))) => tables.push(table),
                _ => {}
            },
            Frame::Elem { key, value } => {
                if let Some(Frame::Table(parent)) = self.top_mut() {
                    parent.elems.push((key, value));
                }
            }
            Frame::Cpe(cpe) => {
                if let Some(Frame::Service(service)) = self.top_mut() {
                    if service.cpe.is_none() && !cpe.is_empty() {
                        service.cpe = Some(cpe);
                    }
                }
            }
            Frame::Other(_) => {}
        }
    }

    /// Returns the collected rows, or an error if elements are still open.
    pub(crate) fn finish(self) -> crate::Result<DocumentRows> {
        match self.frames.last() {
            None => Ok(self.rows),
            Some(innermost) => Err(crate::Error::Truncated {
                open: self.frames.len(),
                innermost: innermost.tag().to_owned(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ContextStack, Frame, ScriptKind};
    use crate::model::{HostContext, PortContext, ScriptTable, ServiceContext};

    #[test]
    fn closing_a_port_attaches_it_to_the_host() {
        let mut stack = ContextStack::default();
        stack.push(Frame::Host(HostContext::default()));
        stack.push(Frame::Other("ports".into()));
        stack.push(Frame::Port(PortContext::new("22", "tcp")));
        stack.close();
        stack.close();

        let Some(host) = stack.host_mut() else {
            panic!("host frame should still be open");
        };
        assert_eq!(host.ports.len(), 1);
        assert_eq!(host.ports[0].port_id, "22");
    }

    #[test]
    fn second_service_is_ignored() {
        let mut stack = ContextStack::default();
        stack.push(Frame::Host(HostContext::default()));
        stack.push(Frame::Port(PortContext::new("80", "tcp")));
        for name in ["http", "https"] {
            stack.push(Frame::Service(ServiceContext {
                name: Some(name.to_owned()),
                confidence: 10,
                ..ServiceContext::default()
            }));
            stack.close();
        }
        stack.close();
        stack.close();

        let rows = stack.finish().unwrap();
        assert_eq!(rows.services.len(), 1);
        assert_eq!(rows.services[0].service_name.as_deref(), Some("http"));
    }

    #[test]
    fn vulners_tables_nest_under_script() {
        let mut stack = ContextStack::default();
        stack.push(Frame::Script(ScriptKind::Vulners(Vec::new())));
        stack.push(Frame::Table(ScriptTable {
            key: Some("cpe:/a:x:y".to_owned()),
            ..ScriptTable::default()
        }));
        stack.push(Frame::Table(ScriptTable::default()));
        stack.push(Frame::Elem {
            key: Some("id".to_owned()),
            value: String::new(),
        });
        assert!(stack.accepts_text());
        stack.text("CVE-2020-1");
        stack.close();
        stack.close();
        stack.close();

        let Some(Frame::Script(ScriptKind::Vulners(tables))) = stack.top() else {
            panic!("script frame should be on top");
        };
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].tables[0].elem("id"), Some("CVE-2020-1"));
    }

    #[test]
    fn unclosed_frames_are_an_error() {
        let mut stack = ContextStack::default();
        stack.push(Frame::Other("nmaprun".into()));
        stack.push(Frame::Host(HostContext::default()));

        let err = stack.finish().unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Truncated { open: 2, ref innermost } if innermost == "host"
        ));
    }
}
