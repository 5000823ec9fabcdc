use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use http::header::IF_NONE_MATCH;
use http::HeaderMap;
use static_routes::conditional::{is_fresh, RequestValidators};
use static_routes::{build_routes, ETag, RouteTable, StaticConfig, TtlCache};
use std::hint::black_box;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

fn bench_cache_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("ttl_cache");
    for keys in [16usize, 250, 4096] {
        let cache: TtlCache<PathBuf, u64> =
            TtlCache::with_limits("bench", Duration::from_secs(3600), Duration::from_secs(300), keys);
        let paths: Vec<PathBuf> = (0..keys)
            .map(|i| PathBuf::from(format!("/srv/public/asset-{i}.js")))
            .collect();
        for (i, p) in paths.iter().enumerate() {
            cache.insert(p.clone(), i as u64);
        }
        let probe = paths[keys / 2].clone();
        let missing = PathBuf::from("/srv/public/missing.js");

        group.bench_with_input(BenchmarkId::new("hit", keys), &probe, |b, p| {
            b.iter(|| black_box(cache.get(p)))
        });
        group.bench_with_input(BenchmarkId::new("miss", keys), &missing, |b, p| {
            b.iter(|| black_box(cache.get(p)))
        });
    }
    group.finish();
}

fn bench_conditional(c: &mut Criterion) {
    let etag = ETag::from_bytes(b"body");
    let modified = Some(SystemTime::now());

    let mut matching = HeaderMap::new();
    matching.insert(IF_NONE_MATCH, etag.to_header_value());
    let matching = RequestValidators::from_headers(&matching);

    let mut list = HeaderMap::new();
    list.insert(
        IF_NONE_MATCH,
        format!("\"a\", W/\"b\", \"c\", {}", etag).parse().unwrap(),
    );
    let list = RequestValidators::from_headers(&list);

    c.bench_function("conditional/exact", |b| {
        b.iter(|| black_box(is_fresh(&matching, &etag, modified)))
    });
    c.bench_function("conditional/list", |b| {
        b.iter(|| black_box(is_fresh(&list, &etag, modified)))
    });
}

fn bench_etag(c: &mut Criterion) {
    let mut group = c.benchmark_group("etag");
    for size in [1024usize, 64 * 1024, 1024 * 1024] {
        let body = vec![b'x'; size];
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &body, |b, body| {
            b.iter(|| black_box(ETag::from_bytes(body)))
        });
    }
    group.finish();
}

fn bench_dispatch(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    for i in 0..64 {
        std::fs::write(dir.path().join(format!("file-{i}.css")), vec![b'a'; 2048]).unwrap();
    }
    let rt = tokio::runtime::Runtime::new().unwrap();

    for (name, config) in [
        ("static", StaticConfig::new(dir.path()).force_static(true)),
        ("dynamic", StaticConfig::new(dir.path())),
    ] {
        let mut table = RouteTable::new();
        table.extend(rt.block_on(build_routes(&config)).unwrap()).unwrap();
        let request = http::Request::get("/public/file-7.css").body(()).unwrap();
        c.bench_function(&format!("dispatch/{name}"), |b| {
            b.iter(|| black_box(rt.block_on(table.dispatch(&request))))
        });
    }
}

criterion_group!(
    benches,
    bench_cache_lookup,
    bench_conditional,
    bench_etag,
    bench_dispatch
);
criterion_main!(benches);
