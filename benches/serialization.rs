use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use json_twine::{from_str, json, to_string, FromJson, Result, ToJson, Twine, Value};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone)]
struct Product {
    sku: String,
    name: String,
    price: f64,
    quantity: u32,
}

#[derive(Clone)]
struct Point {
    x: f64,
    y: f64,
}

impl ToJson for Point {
    fn to_json(&self) -> Value {
        json!({"x": self.x, "y": self.y})
    }
}

impl FromJson for Point {
    fn from_json(value: &Value) -> Result<Self> {
        Ok(Point {
            x: value.get_as("x")?,
            y: value.get_as("y")?,
        })
    }
}

fn products(size: u32) -> Vec<Product> {
    (0..size)
        .map(|i| Product {
            sku: format!("SKU{}", i),
            name: format!("Product {}", i),
            price: 9.99 + f64::from(i),
            quantity: i,
        })
        .collect()
}

fn benchmark_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");

    for size in [10, 100, 1000].iter() {
        let text = to_string(&products(*size)).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(size), &text, |b, text| {
            b.iter(|| black_box(text).parse::<Value>())
        });
    }
    group.finish();
}

fn benchmark_dump(c: &mut Criterion) {
    let mut group = c.benchmark_group("dump");

    let text = to_string(&products(500)).unwrap();
    let tree: Value = text.parse().unwrap();

    group.bench_function("compact", |b| b.iter(|| black_box(&tree).dump(0)));
    group.bench_function("indent_4", |b| b.iter(|| black_box(&tree).dump(4)));
    group.finish();
}

fn benchmark_serde_bridge(c: &mut Criterion) {
    let mut group = c.benchmark_group("serde_bridge");

    let items = products(100);
    let text = to_string(&items).unwrap();

    group.bench_function("to_string", |b| b.iter(|| to_string(black_box(&items))));
    group.bench_function("from_str", |b| {
        b.iter(|| from_str::<Vec<Product>>(black_box(&text)))
    });
    group.finish();
}

fn benchmark_typed_conversion(c: &mut Criterion) {
    let mut group = c.benchmark_group("typed_conversion");

    let points: Vec<Point> = (0..500)
        .map(|i| Point {
            x: f64::from(i),
            y: f64::from(i) * 1.5,
        })
        .collect();
    let tree = points.to_json();

    group.bench_function("encode_points", |b| b.iter(|| black_box(&points).to_json()));
    group.bench_function("decode_points", |b| {
        b.iter(|| Vec::<Point>::from_json(black_box(&tree)))
    });
    group.finish();
}

fn benchmark_twine(c: &mut Criterion) {
    let mut group = c.benchmark_group("concat");

    let dir = "/var/lib/service/data";
    let stem = "snapshot";
    let ext = ".json";

    group.bench_function("twine", |b| {
        b.iter(|| {
            let twine = Twine::from(black_box(dir)) + '/' + black_box(stem) + '-'
                + black_box(42u32)
                + black_box(ext);
            twine.str()
        })
    });

    group.bench_function("eager", |b| {
        b.iter(|| {
            let mut s = String::from(black_box(dir)) + "/" + black_box(stem) + "-";
            s += &black_box(42u32).to_string();
            s += black_box(ext);
            s
        })
    });

    group.bench_function("twine_to_str_ref", |b| {
        let mut buf = String::with_capacity(64);
        b.iter(|| {
            let twine = Twine::from(black_box(dir)) + '/' + black_box(stem) + black_box(ext);
            twine.to_str_ref(&mut buf).len()
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_parse,
    benchmark_dump,
    benchmark_serde_bridge,
    benchmark_typed_conversion,
    benchmark_twine
);
criterion_main!(benches);
