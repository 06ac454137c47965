use std::fs;

use foamfile::parallel::open_many;
use foamfile::{
    Compression, EncodeOptions, ErrorKind, FoamFile, Format, KeyPath, ParseOptions, Shape, Value,
};
use rstest::rstest;
use tempfile::tempdir;

const TRANSPORT: &str = "\
FoamFile
{
    version 2.0;
    format ascii;
    class dictionary;
    object transportProperties;
}
transportModel Newtonian; // single phase
nu [0 2 -1 0 0 0 0] 1e-05;
";

fn path(text: &str) -> KeyPath {
    KeyPath::parse(text).unwrap()
}

#[rstest]
fn plain_and_gzip_paths_round_trip() {
    let dir = tempdir().unwrap();
    let doc = foamfile::parse(TRANSPORT.as_bytes()).unwrap();

    let plain = dir.path().join("transportProperties");
    let packed = dir.path().join("transportProperties.gz");
    foamfile::to_path(&plain, &doc).unwrap();
    foamfile::to_path(&packed, &doc).unwrap();

    assert_eq!(fs::read_to_string(&plain).unwrap(), TRANSPORT);
    assert!(foamfile::io::is_gzip(&fs::read(&packed).unwrap()));
    for file in [&plain, &packed] {
        let reread = foamfile::from_path(file).unwrap();
        assert_eq!(reread.as_bytes(), TRANSPORT.as_bytes());
    }
}

#[rstest]
fn gzip_is_detected_from_content() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("U");
    fs::write(&file, foamfile::io::compress(TRANSPORT.as_bytes()).unwrap()).unwrap();

    let mut opened = FoamFile::open(&file).unwrap();
    assert_eq!(opened.compression(), Compression::Gzip);
    opened
        .set(&path("transportModel"), Value::word("CrossPowerLaw"))
        .unwrap();
    opened.save().unwrap();

    let raw = fs::read(&file).unwrap();
    assert!(foamfile::io::is_gzip(&raw));
    let text = foamfile::io::decompress(&raw).unwrap();
    assert_eq!(
        String::from_utf8(text).unwrap(),
        TRANSPORT.replace("Newtonian", "CrossPowerLaw")
    );
}

#[rstest]
fn corrupt_gzip_is_decode_error() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("broken.gz");
    let mut raw = foamfile::io::compress(TRANSPORT.as_bytes()).unwrap();
    raw.truncate(raw.len() / 2);
    fs::write(&file, raw).unwrap();
    let err = FoamFile::open(&file).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Decode);
}

#[rstest]
fn created_file_is_written_on_save() {
    let dir = tempdir().unwrap();
    let target = dir.path().join("controlDict.gz");
    let doc = foamfile::parse(b"endTime 5;\n").unwrap();
    let mut file = FoamFile::create(&target, doc);
    assert!(!target.exists());
    assert_eq!(file.compression(), Compression::Gzip);

    file.set_compression(Compression::None);
    file.save().unwrap();
    assert_eq!(fs::read(&target).unwrap(), b"endTime 5;\n");
    assert_eq!(file.path(), target.as_path());
}

#[rstest]
fn save_as_converts_to_binary() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("p");
    fs::write(
        &source,
        "FoamFile { format ascii; class volScalarField; object p; }\n\
         internalField nonuniform List<scalar> 3(0.5 1.5 2.5);\n",
    )
    .unwrap();
    let target = dir.path().join("p.binary");

    let file = FoamFile::open(&source).unwrap();
    let options = EncodeOptions::new()
        .with_format(Format::Binary)
        .with_compression(Compression::Gzip);
    file.save_as(&target, &options).unwrap();

    let converted = FoamFile::open(&target).unwrap();
    assert_eq!(converted.compression(), Compression::Gzip);
    assert_eq!(converted.document().format(), Format::Binary);
    assert_eq!(
        converted
            .get(&path("internalField"))
            .and_then(Value::as_numeric)
            .and_then(|field| field.as_floats()),
        Some(&[0.5, 1.5, 2.5][..])
    );
}

#[rstest]
fn open_with_hints() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("probes");
    fs::write(&file, "probeLocations (0 0 0 1 1 1);\n").unwrap();

    let options = ParseOptions::new().with_hint("probeLocations", Shape::Vector);
    let opened = FoamFile::open_with_options(&file, &options).unwrap();
    let probes = opened
        .get(&path("probeLocations"))
        .and_then(Value::as_numeric)
        .unwrap();
    assert_eq!(probes.shape, Shape::Vector);
    assert_eq!(probes.len(), 2);
}

#[rstest]
fn many_files_at_once() {
    let dir = tempdir().unwrap();
    let mut paths = Vec::new();
    for time in 0..8 {
        let file = dir.path().join(format!("{time}.dict"));
        fs::write(&file, format!("time {time};\n")).unwrap();
        paths.push(file);
    }
    paths.push(dir.path().join("missing"));

    let opened = open_many(&paths, &ParseOptions::default());
    assert_eq!(opened.len(), 9);
    for (time, file) in opened.iter().take(8).enumerate() {
        let file = file.as_ref().unwrap();
        assert_eq!(file.get(&path("time")), Some(&Value::Integer(time as i64)));
    }
    let err = opened[8].as_ref().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
}

#[rstest]
fn many_buffers_at_once() {
    let inputs: [&[u8]; 3] = [TRANSPORT.as_bytes(), b"broken (", b"x 1;"];
    let results = foamfile::parse_many(&inputs, &ParseOptions::default());
    assert!(results[0].as_ref().unwrap().header().is_some());
    assert!(results[1].is_err());
    assert_eq!(
        results[2].as_ref().unwrap().get(&path("x")),
        Some(&Value::Integer(1))
    );
}

#[rstest]
fn json_view_of_a_file() {
    let doc = foamfile::parse(TRANSPORT.as_bytes()).unwrap();
    let json = foamfile::json::to_json_value(&doc).unwrap();
    assert_eq!(json["FoamFile"]["object"], "transportProperties");
    assert_eq!(json["transportModel"], "Newtonian");
    let pretty = foamfile::json::to_json_string(&doc, true).unwrap();
    assert!(pretty.starts_with("{\n"));
}
