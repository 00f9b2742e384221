use std::fmt::Write;
use std::hint::black_box;
use std::path::PathBuf;

use criterion::{criterion_group, criterion_main, Criterion};
use nmap2csv::aggregate::aggregate;
use nmap2csv::parser::parse_document;

fn report(hosts: usize, ports: usize) -> String {
    let mut xml = String::from("<?xml version=\"1.0\"?>\n<nmaprun scanner=\"nmap\">\n");
    for host in 0..hosts {
        let _ = write!(
            xml,
            "<host><address addr=\"10.0.{}.{}\" addrtype=\"ipv4\"/><hostnames><hostname name=\"h{host}.lab\"/></hostnames><ports>",
            host / 256,
            host % 256
        );
        for port in 0..ports {
            let _ = write!(
                xml,
                "<port protocol=\"tcp\" portid=\"{}\"><state state=\"open\"/>\
                 <service name=\"http\" product=\"nginx\" version=\"1.18\" conf=\"10\"><cpe>cpe:/a:nginx:nginx:1.18</cpe></service>\
                 <script id=\"vulners\" output=\"\"><table key=\"cpe:/a:nginx:nginx:1.18\">\
                 <table><elem key=\"id\">CVE-2021-23017</elem><elem key=\"type\">cve</elem></table>\
                 <table><elem key=\"id\">CVE-2019-20372</elem><elem key=\"type\">cve</elem></table>\
                 </table></script></port>",
                8000 + port
            );
        }
        xml.push_str("</ports></host>\n");
    }
    xml.push_str("</nmaprun>\n");
    xml
}

fn bench_parse(c: &mut Criterion) {
    let small = report(16, 4);
    let large = report(1024, 20);

    c.bench_function("parse 16 hosts", |b| {
        b.iter(|| parse_document(black_box(small.as_bytes())))
    });

    let mut group = c.benchmark_group("large report");
    group.sample_size(10);
    group.bench_function("parse 1024 hosts", |b| {
        b.iter(|| parse_document(black_box(large.as_bytes())))
    });
    group.bench_function("parse and merge twice", |b| {
        b.iter(|| {
            let first = parse_document(large.as_bytes()).unwrap_or_default();
            let second = parse_document(large.as_bytes()).unwrap_or_default();
            aggregate([
                (PathBuf::from("a.xml"), first),
                (PathBuf::from("b.xml"), second),
            ])
        })
    });
    group.finish();
}

criterion_group!(benches, bench_parse);
criterion_main!(benches);
