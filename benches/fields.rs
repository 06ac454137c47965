use std::fmt::Write;
use std::time::Duration;

use criterion::measurement::WallTime;
use criterion::{
    black_box, criterion_group, criterion_main, BenchmarkGroup, BenchmarkId, Criterion,
};
use foamfile::{Document, EncodeOptions, Format, KeyPath, NumericList, Precision, Value};

const HEADER: &str = "FoamFile\n{\n    version 2.0;\n    format ascii;\n    class volVectorField;\n    object U;\n}\n";

fn make_vector_field(cells: usize) -> String {
    let mut text = String::with_capacity(cells * 40);
    text.push_str(HEADER);
    text.push_str("dimensions [0 1 -1 0 0 0 0];\n");
    let _ = write!(text, "internalField nonuniform List<vector>\n{cells}\n(\n");
    for i in 0..cells {
        let x = i as f64 * 0.001;
        let _ = writeln!(text, "({x} {:.6} -{:.3e})", x * 0.5, x + 1.0);
    }
    text.push_str(")\n;\n");
    text.push_str("boundaryField\n{\n    inlet { type fixedValue; value uniform (1 0 0); }\n    outlet { type zeroGradient; }\n}\n");
    text
}

fn make_faces(count: usize) -> String {
    let mut text = String::with_capacity(count * 24);
    let _ = write!(text, "{count}\n(\n");
    for i in 0..count {
        let _ = writeln!(text, "4({} {} {} {})", i, i + 1, i + 2, i + 3);
    }
    text.push_str(")\n");
    text
}

fn make_dictionary(entries: usize) -> String {
    let mut text = String::from(HEADER);
    for i in 0..entries {
        let _ = writeln!(
            text,
            "solver{i}\n{{\n    solver GAMG; // smoother follows\n    tolerance 1e-06;\n    relTol 0.{};\n    smoother GaussSeidel;\n}}",
            i % 10
        );
    }
    text
}

fn to_binary(doc: &Document, precision: Precision) -> Vec<u8> {
    let options = EncodeOptions::new()
        .with_format(Format::Binary)
        .with_precision(precision);
    foamfile::to_vec_with_options(doc, &options).unwrap()
}

fn bench_parse(group: &mut BenchmarkGroup<'_, WallTime>, name: &str, input: &[u8]) {
    group.throughput(criterion::Throughput::Bytes(input.len() as u64));
    group.bench_function(BenchmarkId::new("parse", name), |b| {
        b.iter(|| {
            let doc = foamfile::parse(black_box(input)).unwrap();
            black_box(doc);
        });
    });
}

fn bench_render(group: &mut BenchmarkGroup<'_, WallTime>, name: &str, doc: &Document, format: Format) {
    let options = EncodeOptions::new().with_format(format);
    group.bench_function(BenchmarkId::new("render", name), |b| {
        b.iter(|| {
            let bytes = foamfile::to_vec_with_options(black_box(doc), &options).unwrap();
            black_box(bytes);
        });
    });
}

fn quick_run(inputs: &[&[u8]]) {
    for input in inputs {
        let doc = foamfile::parse(black_box(input)).unwrap();
        black_box(foamfile::to_vec(&doc).unwrap());
    }
}

fn criterion_config() -> Criterion {
    if std::env::var("FOAM_BENCH_MINIMAL").is_ok() {
        Criterion::default()
            .warm_up_time(Duration::from_secs(0))
            .measurement_time(Duration::from_millis(10))
            .sample_size(1)
            .nresamples(1)
    } else {
        Criterion::default()
    }
}

fn criterion_benchmark(c: &mut Criterion) {
    let field = make_vector_field(200_000);
    let field_doc = foamfile::parse(field.as_bytes()).unwrap();
    let binary_double = to_binary(&field_doc, Precision::Double);
    let binary_single = to_binary(&field_doc, Precision::Single);
    let faces = make_faces(200_000);
    let dictionary = make_dictionary(2_000);

    if std::env::var("FOAM_BENCH_QUICK").is_ok() {
        quick_run(&[
            field.as_bytes(),
            &binary_double,
            &binary_single,
            faces.as_bytes(),
            dictionary.as_bytes(),
        ]);
        return;
    }

    let mut parse = c.benchmark_group("parse");
    bench_parse(&mut parse, "ascii_vector_field", field.as_bytes());
    bench_parse(&mut parse, "binary_vector_field_f64", &binary_double);
    bench_parse(&mut parse, "binary_vector_field_f32", &binary_single);
    bench_parse(&mut parse, "ascii_faces", faces.as_bytes());
    bench_parse(&mut parse, "dictionary", dictionary.as_bytes());
    parse.finish();

    let mut render = c.benchmark_group("render");
    bench_render(&mut render, "ascii_vector_field", &field_doc, Format::Ascii);
    bench_render(&mut render, "binary_vector_field", &field_doc, Format::Binary);
    render.finish();

    let mut edit = c.benchmark_group("edit");
    let dict_doc = foamfile::parse(dictionary.as_bytes()).unwrap();
    let path = KeyPath::parse("solver1000/tolerance").unwrap();
    edit.bench_function("set_nested_scalar", |b| {
        b.iter(|| {
            let mut doc = dict_doc.clone();
            doc.set(&path, black_box(1e-8)).unwrap();
            black_box(doc);
        });
    });
    let replacement = Value::Nonuniform(NumericList::vectors(&[[0.0, 0.0, 0.0]; 1000]));
    let field_path = KeyPath::parse("internalField").unwrap();
    edit.bench_function("replace_field", |b| {
        b.iter(|| {
            let mut doc = field_doc.clone();
            doc.set(&field_path, black_box(replacement.clone())).unwrap();
            black_box(doc);
        });
    });
    edit.finish();
}

criterion_group! {
    name = benches;
    config = criterion_config();
    targets = criterion_benchmark
}
criterion_main!(benches);
