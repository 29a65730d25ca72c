use chrono::{TimeZone, Utc};
use notemeter::{AggregateCounters, BasicStats, DocumentRecord, MetricsServer, Tags, Timestamps};
use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::sync::Arc;
use std::time::Duration;

fn get(addr: SocketAddr, path: &str) -> String {
    let mut stream = TcpStream::connect(addr).unwrap();
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();
    write!(
        stream,
        "GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n"
    )
    .unwrap();
    let mut response = String::new();
    stream.read_to_string(&mut response).unwrap();
    response
}

fn record(name: &str, words: u64) -> DocumentRecord {
    let mut tags = Tags::default();
    tags.push_front_matter("project");
    let t = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    DocumentRecord {
        note_name: name.to_string(),
        file_path: format!("{name}.md"),
        stats: BasicStats {
            word_count: words,
            ..BasicStats::default()
        },
        fields: BTreeMap::new(),
        tags,
        links: Vec::new(),
        timestamps: Timestamps {
            created_at: t,
            modified_at: t,
        },
    }
}

fn start() -> (MetricsServer, Arc<AggregateCounters>) {
    let counters = Arc::new(AggregateCounters::new());
    let server =
        MetricsServer::start("127.0.0.1:0".parse().unwrap(), Arc::clone(&counters)).unwrap();
    (server, counters)
}

#[test]
fn test_metrics_path_serves_snapshot() {
    let (server, counters) = start();
    counters.fold(&record("Plan", 12), "Work");

    let response = get(server.local_addr(), "/metrics");
    assert!(response.starts_with("HTTP/1.1 200"));
    assert!(response.contains("text/plain; version=0.0.4"));
    assert!(response.contains("obsidian_vault_words{vault=\"Work\"} 12"));
    assert!(response.contains("obsidian_notes_total{vault=\"Work\"} 1"));
    server.stop();
}

#[test]
fn test_snapshot_reflects_later_folds() {
    let (server, counters) = start();
    let before = get(server.local_addr(), "/metrics");
    assert!(!before.contains("vault=\"Work\""));

    counters.fold(&record("Plan", 3), "Work");
    counters.fold(&record("Ideas", 4), "Work");
    let after = get(server.local_addr(), "/metrics");
    assert!(after.contains("obsidian_vault_notes{vault=\"Work\"} 2"));
    assert!(after.contains("obsidian_vault_words{vault=\"Work\"} 7"));
    server.stop();
}

#[test]
fn test_other_paths_are_not_found() {
    let (server, _counters) = start();
    for path in ["/", "/metrics/extra", "/health"] {
        let response = get(server.local_addr(), path);
        assert!(response.starts_with("HTTP/1.1 404"), "{path}: {response}");
    }
    server.stop();
}

#[test]
fn test_stop_releases_port() {
    let (server, _counters) = start();
    let addr = server.local_addr();
    server.stop();
    assert!(TcpStream::connect_timeout(&addr, Duration::from_millis(500)).is_err());
}

#[test]
fn test_bind_conflict_is_an_error() {
    let (server, counters) = start();
    let taken = server.local_addr();
    assert!(MetricsServer::start(taken, counters).is_err());
    server.stop();
}
