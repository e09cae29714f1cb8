//! Performance benchmarks for reading and writing maps.
//!
//! Run with: `cargo bench --bench codec`
//!
//! | Operation | Notes |
//! |-----------|-------|
//! | Key encode/decode | Base-52, fixed width |
//! | Legend split | Nested overrides and quoted commas |
//! | Read | Legend resolution plus grid decode |
//! | Write | Interning plus grid encode |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use dmm_codec::{
    split_atoms, Alphabet, AtomType, DmmReader, DmmWriter, InMemoryAtomRegistry, MapDocument, Value,
};

fn registry() -> InMemoryAtomRegistry {
    InMemoryAtomRegistry::new()
        .with(AtomType::new("/area/station"))
        .with(AtomType::new("/turf/space"))
        .with(AtomType::new("/turf/floor").with_property("dir", Value::int(2)))
        .with(AtomType::new("/obj/sign").with_property("name", Value::string("sign")))
}

/// A `size` x `size` map with `legend` distinct tiles.
fn make_map(size: usize, legend: usize) -> String {
    let alphabet = Alphabet::default();
    let width = alphabet.encoded_len(legend as u64 - 1);
    let mut out = String::new();

    for i in 0..legend {
        let key = alphabet.encode(i as u64, width);
        match i % 3 {
            0 => out.push_str(&format!("\"{}\" = (/turf/space,/area/station)\n", key)),
            1 => out.push_str(&format!(
                "\"{}\" = (/turf/floor{{dir = {}}},/area/station)\n",
                key,
                i % 8 + 1
            )),
            _ => out.push_str(&format!(
                "\"{}\" = (/obj/sign{{name = \"sign, {}\"}},/turf/floor,/area/station)\n",
                key, i
            )),
        }
    }

    out.push_str("\n(1,1,1) = {\"\n");
    for y in 0..size {
        for x in 0..size {
            out.push_str(&alphabet.encode(((x * 7 + y * 13) % legend) as u64, width));
        }
        out.push('\n');
    }
    out.push_str("\"}\n");
    out
}

fn bench_keys(c: &mut Criterion) {
    let alphabet = Alphabet::default();

    c.bench_function("key_encode", |b| {
        b.iter(|| alphabet.encode(black_box(140_607), 3))
    });
    c.bench_function("key_decode", |b| {
        b.iter(|| alphabet.decode(black_box("ZZZ")).unwrap())
    });
}

fn bench_split(c: &mut Criterion) {
    let line = r#"/obj/sign{name = "exit, left"; desc = list(1, 2, 3)},/obj/item{dir = 4},/turf/floor,/area/station"#;
    c.bench_function("split_atoms", |b| b.iter(|| split_atoms(black_box(line)).unwrap()));
}

fn bench_read(c: &mut Criterion) {
    let reg = registry();
    let mut group = c.benchmark_group("read");

    for size in [32, 128, 255] {
        let text = make_map(size, 600);
        group.throughput(Throughput::Bytes(text.len() as u64));
        group.bench_with_input(BenchmarkId::new("size", size), &text, |b, text| {
            let reader = DmmReader::with_defaults(&reg);
            let mut doc = MapDocument::new();
            b.iter(|| reader.read_str(black_box(text), &mut doc).unwrap())
        });
    }

    group.finish();
}

fn bench_write(c: &mut Criterion) {
    let reg = registry();
    let mut group = c.benchmark_group("write");

    for size in [32, 128, 255] {
        let mut doc = MapDocument::new();
        DmmReader::with_defaults(&reg)
            .read_str(&make_map(size, 600), &mut doc)
            .unwrap();

        group.throughput(Throughput::Elements((size * size) as u64));
        group.bench_function(BenchmarkId::new("size", size), |b| {
            let writer = DmmWriter::default();
            b.iter(|| writer.write_string(black_box(&mut doc)).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_keys, bench_split, bench_read, bench_write);
criterion_main!(benches);
