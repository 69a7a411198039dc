//! # DNS Discovery Benchmarks
//!
//! | Path | Work per iteration |
//! |------|--------------------|
//! | Entry parsing | One TXT record decoded |
//! | Root verification | One keccak256 plus one ECDSA verify |
//! | Random descent | One `next_node` against a warm cache |
//! | Full sync | Every entry of a tree resolved and hashed |

use std::sync::Arc;
use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use dns_discovery::adapters::MemoryResolver;
use dns_discovery::test_utils::{build_tree, make_node, publish_tree};
use dns_discovery::{Client, DiscoveryConfig, LinkEntry, TreeEntry};

const DOMAIN: &str = "nodes.example.org";

fn bench_entry_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("entry-parsing");

    let tree = build_tree(1, 1, &[1, 2, 3], &[]);
    let samples = [
        ("root", tree.root.to_string()),
        ("node", TreeEntry::Node(make_node(7)).to_string()),
        ("link", tree.link(DOMAIN).to_string()),
    ];
    for (kind, text) in &samples {
        group.bench_with_input(BenchmarkId::new("parse", kind), text, |b, text| {
            b.iter(|| black_box(TreeEntry::parse(text).is_ok()))
        });
    }

    group.finish();
}

fn bench_root_verification(c: &mut Criterion) {
    let tree = build_tree(1, 42, &[1], &[]);
    let key = tree.public_key;
    let root = tree.root.clone();

    c.bench_function("root-verify", |b| {
        b.iter(|| black_box(root.verify_signature(&key).is_ok()))
    });
}

fn bench_random_descent(c: &mut Criterion) {
    let mut group = c.benchmark_group("random-descent");

    for size in [13u8, 100, 250] {
        let resolver = Arc::new(MemoryResolver::new());
        let nodes: Vec<u8> = (1..=size).collect();
        let url = publish_tree(&resolver, DOMAIN, 1, 1, &nodes, &[]);
        let client = Arc::new(Client::new(resolver, DiscoveryConfig::default()));
        let iterator = client.new_iterator();
        if iterator.add_tree(&url).is_err() {
            continue;
        }
        // Warm the entry cache
        for _ in 0..(size as usize * 20) {
            iterator.next_node();
        }

        group.bench_with_input(BenchmarkId::new("next_node", size), &iterator, |b, it| {
            b.iter(|| black_box(it.next_node()))
        });
    }

    group.finish();
}

fn bench_full_sync(c: &mut Criterion) {
    let mut group = c.benchmark_group("full-sync");
    group.measurement_time(Duration::from_secs(10));

    for size in [10u8, 100, 250] {
        let resolver = Arc::new(MemoryResolver::new());
        let nodes: Vec<u8> = (1..=size).collect();
        let link = LinkEntry::new(build_tree(2, 1, &[], &[]).public_key, "peer.example.org");
        let url = publish_tree(&resolver, DOMAIN, 1, 1, &nodes, &[link]);
        let client = Client::new(resolver, DiscoveryConfig::default());

        group.throughput(Throughput::Elements(u64::from(size)));
        group.bench_with_input(BenchmarkId::new("sync_tree", size), &url, |b, url| {
            b.iter(|| black_box(client.sync_tree(url).map(|snapshot| snapshot.nodes.len())))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_entry_parsing,
    bench_root_verification,
    bench_random_descent,
    bench_full_sync
);
criterion_main!(benches);
