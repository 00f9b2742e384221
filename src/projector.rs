//! Turns a closed host into its host row and service rows.
use crate::model::{DocumentRows, HostContext, HostRecord, ServiceRow};

/// Projects `host` into one [`HostRecord`] and one [`ServiceRow`] per port,
/// appending both to `rows`. The host is consumed.
pub fn project_host(host: HostContext, rows: &mut DocumentRows) {
    let address = host.address().map(str::to_owned);
    let name = host.display_name().map(str::to_owned);

    rows.services.reserve(host.ports.len());
    for port in host.ports {
        let service = port.service.as_ref();
        rows.services.push(ServiceRow {
            address: address.clone(),
            hostname: name.clone(),
            mac: host.mac.clone(),
            mac_vendor: host.mac_vendor.clone(),
            os_name: host.os_name.clone(),
            service_name: service.map(|s| s.display_name().to_owned()),
            tunnel: service.and_then(|s| s.tunnel.clone()),
            http_title: service.and_then(|s| s.http_title.clone()),
            info: service.map(|s| s.info()),
            cpe: service.and_then(|s| s.cpe.clone()),
            vulnerability_links: service
                .map(|s| s.vulnerability_links.clone())
                .unwrap_or_default(),
            confidence: service.map(|s| s.confidence),
            port: port.port_id,
            transport_protocol: port.protocol,
            state: port.state,
        });
    }

    rows.hosts.push(HostRecord {
        address,
        mac: host.mac,
        name,
        os_name: host.os_name,
        os_flavor: host.os_flavor,
        os_service_pack: host.os_service_pack,
    });
}
