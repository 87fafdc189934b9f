use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use valuepack::{
    from_msgpack, from_wire, json, to_msgpack, to_wire, Container, ContainerBuilder, Value,
};

fn sample_container(values: usize) -> Container {
    let mut builder = ContainerBuilder::new()
        .source("bench_source", "s1")
        .target("bench_target", "t1")
        .message_type("benchmark");
    for i in 0..values {
        builder = match i % 5 {
            0 => builder.value(Value::int(format!("int_{}", i), i as i32)),
            1 => builder.value(Value::double(format!("dbl_{}", i), i as f64 / 3.0)),
            2 => builder.value(Value::string(format!("str_{}", i), format!("payload {}", i))),
            3 => builder.value(Value::bytes(format!("bin_{}", i), vec![0xAB; 16])),
            _ => builder.value(Value::container(
                format!("grp_{}", i),
                vec![
                    Value::boolean("flag", true),
                    Value::llong("stamp", 1_724_580_000_000 + i as i64),
                ],
            )),
        };
    }
    builder.build()
}

fn benchmark_wire_encode(c: &mut Criterion) {
    let container = sample_container(20);

    c.bench_function("wire_encode", |b| {
        b.iter(|| to_wire(black_box(&container)))
    });
}

fn benchmark_wire_decode(c: &mut Criterion) {
    let wire = to_wire(&sample_container(20));

    c.bench_function("wire_decode", |b| {
        b.iter(|| from_wire(black_box(&wire)))
    });
}

fn benchmark_wire_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("wire_scaling");

    for size in [10, 50, 100, 500].iter() {
        let container = sample_container(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| to_wire(black_box(&container)))
        });
    }
    group.finish();
}

fn benchmark_format_comparison(c: &mut Criterion) {
    let container = sample_container(20);
    let mut group = c.benchmark_group("format_comparison");

    group.bench_function("wire_encode", |b| {
        b.iter(|| to_wire(black_box(&container)))
    });
    group.bench_function("v2_json_encode", |b| {
        b.iter(|| json::to_v2(black_box(&container)))
    });
    group.bench_function("flat_json_encode", |b| {
        b.iter(|| json::to_flat(black_box(&container)))
    });
    group.bench_function("msgpack_encode", |b| {
        b.iter(|| to_msgpack(black_box(&container)))
    });

    let wire = to_wire(&container);
    let v2 = json::to_v2(&container);
    let flat = json::to_flat(&container);
    let packed = to_msgpack(&container).unwrap();

    group.bench_function("wire_decode", |b| {
        b.iter(|| from_wire(black_box(&wire)))
    });
    group.bench_function("v2_json_decode", |b| {
        b.iter(|| json::from_v2(black_box(&v2)))
    });
    group.bench_function("flat_json_decode", |b| {
        b.iter(|| json::from_flat(black_box(&flat)))
    });
    group.bench_function("msgpack_decode", |b| {
        b.iter(|| from_msgpack(black_box(&packed)))
    });

    group.finish();
}

fn benchmark_dialect_conversion(c: &mut Criterion) {
    let flat = json::to_flat(&sample_container(20));

    c.bench_function("convert_flat_to_v2", |b| {
        b.iter(|| json::convert_format(black_box(&flat), json::Dialect::V2))
    });
}

fn benchmark_deep_nesting(c: &mut Criterion) {
    let mut value = Value::int("leaf", 1);
    for i in 0..32 {
        value = Value::container(format!("level_{}", i), vec![value]);
    }
    let mut container = Container::with_message_type("deep");
    container.add(value);
    let wire = to_wire(&container);

    c.bench_function("wire_decode_deep", |b| {
        b.iter(|| from_wire(black_box(&wire)))
    });
}

fn benchmark_roundtrip(c: &mut Criterion) {
    let container = sample_container(20);

    c.bench_function("roundtrip_wire", |b| {
        b.iter(|| {
            let encoded = to_wire(black_box(&container));
            let _decoded = from_wire(black_box(&encoded)).unwrap();
        })
    });
}

criterion_group!(
    benches,
    benchmark_wire_encode,
    benchmark_wire_decode,
    benchmark_wire_scaling,
    benchmark_format_comparison,
    benchmark_dialect_conversion,
    benchmark_deep_nesting,
    benchmark_roundtrip
);
criterion_main!(benches);
