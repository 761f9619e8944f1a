//! Benchmarks for the PHP unmarshal consumers.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use php_unmarshal_core::{consume_next, consume_object, impl_record, Discard, FieldKind, Schema};

#[derive(Default)]
struct Field {
    kind: String,
    label: String,
    required: bool,
}

impl_record!(Field {
    "Type" => kind,
    "Label" => label,
    "Required" => required,
});

#[derive(Default)]
struct Form {
    title: String,
    version: u32,
    weight: f64,
    name: Field,
    email: Field,
}

impl_record!(Form {
    "Title" => title,
    "Version" => version,
    "Weight" => weight,
    "Name" => name,
    "Email" => email,
});

fn scalars(c: &mut Criterion) {
    let mut group = c.benchmark_group("scalars");

    let cases: [(&str, &[u8]); 4] = [
        ("null", b"N;"),
        ("bool", b"b:1;"),
        ("int", b"i:1234567890;"),
        ("float", b"d:3.141592653589793;"),
    ];
    for (name, data) in cases {
        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_function(name, |b| b.iter(|| consume_next(black_box(data), 0)));
    }

    group.finish();
}

fn strings(c: &mut Criterion) {
    let mut group = c.benchmark_group("strings");

    for (name, len) in [("short_5b", 5), ("medium_100b", 100), ("large_10kb", 10_000)] {
        let data = format!("s:{}:\"{}\";", len, "x".repeat(len));
        let data = data.as_bytes();
        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_function(name, |b| b.iter(|| consume_next(black_box(data), 0)));
    }

    // "한글" repeated: 6 bytes per unit
    let korean = format!("s:{}:\"{}\";", 6 * 100, "한글".repeat(100));
    let korean = korean.as_bytes();
    group.throughput(Throughput::Bytes(korean.len() as u64));
    group.bench_function("utf8_600b", |b| b.iter(|| consume_next(black_box(korean), 0)));

    group.finish();
}

fn objects(c: &mut Criterion) {
    let mut group = c.benchmark_group("objects");

    let form = br#"O:4:"Form":6:{s:5:"title";s:7:"Contact";s:7:"version";i:3;s:6:"weight";d:0.75;s:4:"name";O:5:"Field":3:{s:4:"type";s:4:"text";s:5:"label";s:4:"Name";s:8:"required";b:1;}s:5:"email";O:5:"Field":3:{s:4:"type";s:5:"email";s:5:"label";s:5:"Email";s:8:"required";b:0;}s:5:"extra";s:6:"ignore";}"#;
    group.throughput(Throughput::Bytes(form.len() as u64));
    group.bench_function("typed_form", |b| {
        b.iter(|| {
            let mut out = Form::default();
            consume_object(black_box(form), 0, &mut out).unwrap();
            out
        })
    });

    group.bench_function("discard_form", |b| {
        b.iter(|| consume_object(black_box(form), 0, &mut Discard))
    });

    let schema = Schema::new()
        .field("Title", FieldKind::Text)
        .field("Version", FieldKind::Uint)
        .field("Weight", FieldKind::Float);
    group.bench_function("dynamic_form", |b| {
        b.iter(|| {
            let mut record = schema.instantiate();
            consume_object(black_box(form), 0, &mut record).unwrap();
            record
        })
    });

    let wide: String = {
        let items: String = (0..100)
            .map(|i| {
                let key = format!("key_{}", i);
                format!("s:{}:\"{}\";i:{};", key.len(), key, i)
            })
            .collect();
        format!("O:4:\"Wide\":100:{{{}}}", items)
    };
    let wide = wide.as_bytes();
    group.throughput(Throughput::Bytes(wide.len() as u64));
    group.bench_function("wide_100", |b| {
        b.iter(|| consume_object(black_box(wide), 0, &mut Discard))
    });

    let nested: String = {
        let mut s = String::from("O:4:\"Leaf\":0:{}");
        for i in 0..50 {
            let key = format!("k{}", i % 10);
            s = format!("O:4:\"Node\":1:{{s:{}:\"{}\";{}}}", key.len(), key, s);
        }
        s
    };
    let nested = nested.as_bytes();
    group.throughput(Throughput::Bytes(nested.len() as u64));
    group.bench_function("depth_50", |b| {
        b.iter(|| consume_object(black_box(nested), 0, &mut Discard))
    });

    group.finish();
}

criterion_group!(benches, scalars, strings, objects);
criterion_main!(benches);
