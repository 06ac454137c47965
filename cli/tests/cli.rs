use std::fs;
use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;
use tempfile::TempDir;

const CONTROL_DICT: &str = "\
FoamFile
{
    version 2.0;
    format ascii;
    class dictionary;
    object controlDict;
}
// run control
application simpleFoam;
endTime 100;
writeInterval 10;
";

fn write_file(path: &Path, contents: &str) {
    fs::write(path, contents).expect("write test file");
}

#[test]
fn show_prints_file_unchanged() {
    let dir = TempDir::new().expect("tempdir");
    let input = dir.path().join("controlDict");
    write_file(&input, CONTROL_DICT);

    cargo_bin_cmd!("foamfile")
        .arg("show")
        .arg(&input)
        .assert()
        .success()
        .stdout(CONTROL_DICT);
}

#[test]
fn show_json() {
    let dir = TempDir::new().expect("tempdir");
    let input = dir.path().join("controlDict");
    write_file(&input, CONTROL_DICT);

    cargo_bin_cmd!("foamfile")
        .args(["show", "--json"])
        .arg(&input)
        .assert()
        .success()
        .stdout(contains("\"application\": \"simpleFoam\"").and(contains("\"endTime\": 100")));
}

#[test]
fn get_prints_value_and_dictionaries() {
    let dir = TempDir::new().expect("tempdir");
    let input = dir.path().join("controlDict");
    write_file(&input, CONTROL_DICT);

    cargo_bin_cmd!("foamfile")
        .arg("get")
        .arg(&input)
        .arg("endTime")
        .assert()
        .success()
        .stdout("100\n");

    cargo_bin_cmd!("foamfile")
        .arg("get")
        .arg(&input)
        .arg("FoamFile/object")
        .assert()
        .success()
        .stdout("controlDict\n");
}

#[test]
fn verbose_logs_to_stderr() {
    let dir = TempDir::new().expect("tempdir");
    let input = dir.path().join("controlDict");
    write_file(&input, CONTROL_DICT);

    cargo_bin_cmd!("foamfile")
        .args(["-v", "get"])
        .arg(&input)
        .arg("endTime")
        .assert()
        .success()
        .stdout("100\n")
        .stderr(contains("running command").and(contains("read foam file")));
}

#[test]
fn get_missing_key_fails() {
    let dir = TempDir::new().expect("tempdir");
    let input = dir.path().join("controlDict");
    write_file(&input, CONTROL_DICT);

    cargo_bin_cmd!("foamfile")
        .arg("get")
        .arg(&input)
        .arg("startTime")
        .assert()
        .failure()
        .stderr(contains("no entry at startTime"));
}

#[test]
fn set_edits_in_place_and_keeps_comments() {
    let dir = TempDir::new().expect("tempdir");
    let input = dir.path().join("controlDict");
    write_file(&input, CONTROL_DICT);

    cargo_bin_cmd!("foamfile")
        .arg("set")
        .arg(&input)
        .args(["endTime", "200"])
        .assert()
        .success();

    let expected = CONTROL_DICT.replace("endTime 100;", "endTime 200;");
    assert_eq!(fs::read_to_string(&input).unwrap(), expected);
}

#[test]
fn remove_drops_the_line() {
    let dir = TempDir::new().expect("tempdir");
    let input = dir.path().join("controlDict");
    write_file(&input, CONTROL_DICT);

    cargo_bin_cmd!("foamfile")
        .arg("remove")
        .arg(&input)
        .arg("writeInterval")
        .assert()
        .success();

    let expected = CONTROL_DICT.replace("writeInterval 10;\n", "");
    assert_eq!(fs::read_to_string(&input).unwrap(), expected);
}

#[test]
fn convert_to_gzip_and_back() {
    let dir = TempDir::new().expect("tempdir");
    let input = dir.path().join("controlDict");
    let packed = dir.path().join("controlDict.gz");
    write_file(&input, CONTROL_DICT);

    cargo_bin_cmd!("foamfile")
        .arg("convert")
        .arg(&input)
        .arg("-o")
        .arg(&packed)
        .arg("--gzip")
        .assert()
        .success()
        .stdout(contains("Converted"));

    let raw = fs::read(&packed).unwrap();
    assert_eq!(&raw[..2], &[0x1f, 0x8b]);

    cargo_bin_cmd!("foamfile")
        .arg("show")
        .arg(&packed)
        .assert()
        .success()
        .stdout(CONTROL_DICT);
}

#[test]
fn convert_field_to_binary() {
    let dir = TempDir::new().expect("tempdir");
    let input = dir.path().join("p");
    let output = dir.path().join("p.bin");
    write_file(
        &input,
        "FoamFile { format ascii; class volScalarField; }\n\
         internalField nonuniform List<scalar> 3(1 2 3);\n",
    );

    cargo_bin_cmd!("foamfile")
        .arg("convert")
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .args(["--format", "binary"])
        .assert()
        .success();

    cargo_bin_cmd!("foamfile")
        .arg("get")
        .arg(&output)
        .arg("FoamFile/format")
        .assert()
        .success()
        .stdout("binary\n");
}

#[test]
fn check_reports_location() {
    let dir = TempDir::new().expect("tempdir");
    let good = dir.path().join("good");
    let bad = dir.path().join("bad");
    write_file(&good, "a 1;\nb 2;\n");
    write_file(&bad, "a 1;\nb (1 2;\n");

    cargo_bin_cmd!("foamfile")
        .arg("check")
        .arg(&good)
        .assert()
        .success()
        .stdout(contains("2 entries"));

    cargo_bin_cmd!("foamfile")
        .arg("check")
        .arg(&bad)
        .assert()
        .failure()
        .stderr(contains("line 2").and(contains("^")));
}

#[test]
fn missing_file_fails() {
    let dir = TempDir::new().expect("tempdir");

    cargo_bin_cmd!("foamfile")
        .arg("show")
        .arg(dir.path().join("nope"))
        .assert()
        .failure()
        .stderr(contains("ERROR"));
}
