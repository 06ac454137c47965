use foamfile::{ErrorKind, KeyPath, NumericList, ParseOptions, Shape, Value};
use rstest::rstest;

fn numeric(doc: &foamfile::Document, key: &str) -> NumericList {
    match doc.get(&KeyPath::parse(key).unwrap()) {
        Some(Value::Numeric(list)) | Some(Value::Nonuniform(list)) => list.clone(),
        other => panic!("expected numeric list at {key}, got {other:?}"),
    }
}

#[rstest]
fn hint_reads_flat_list_as_vectors() {
    let options = ParseOptions::new().with_hint("bar", Shape::Vector);
    let doc = foamfile::parse_with_options(b"bar (1 2 3);", &options).unwrap();
    let bar = numeric(&doc, "bar");
    assert_eq!(bar.shape, Shape::Vector);
    assert_eq!(bar.len(), 1);
    assert_eq!(bar.element(0).unwrap().as_slice(), &[1.0, 2.0, 3.0]);

    let plain = foamfile::parse(b"bar (1 2 3);").unwrap();
    let bar = numeric(&plain, "bar");
    assert_eq!(bar.shape, Shape::Scalar);
    assert_eq!(bar.len(), 3);
}

#[rstest]
fn hinted_list_with_wrong_arity_is_shape_error() {
    let options = ParseOptions::new().with_hint("bar", Shape::Vector);
    let err = foamfile::parse_with_options(b"bar (1 2 3 4);", &options).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Shape);
    assert!(err.is_decode());
}

#[rstest]
#[case("nonuniform List<vector> 2((0 0 0) (1 1 1))", Shape::Vector, 2)]
#[case("nonuniform List<symmTensor> 1((1 0 0 1 0 1))", Shape::SymmTensor, 1)]
#[case("nonuniform List<tensor> 1((1 0 0 0 1 0 0 0 1))", Shape::Tensor, 1)]
#[case("nonuniform List<scalar> 4(0 0.5 1 1.5)", Shape::Scalar, 4)]
#[case("((0 0 0) (1 0 0) (0 1 0) (1 1 0))", Shape::Vector, 4)]
fn element_counts_follow_arity(#[case] text: &str, #[case] shape: Shape, #[case] len: usize) {
    let doc = foamfile::parse(format!("x {text};").as_bytes()).unwrap();
    let list = numeric(&doc, "x");
    assert_eq!(list.shape, shape);
    assert_eq!(list.len(), len);
    assert_eq!(list.data.len(), len * shape.arity());
}

#[rstest]
#[case("x nonuniform List<vector> 2((0 0 0) (1 1));")]
#[case("x nonuniform List<vector> 1((0 0 0 0));")]
#[case("x nonuniform List<scalar> 2((0 0 0) (1 1 1));")]
fn field_arity_mismatch_is_shape_error(#[case] input: &str) {
    let err = foamfile::parse(input.as_bytes()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Shape, "{err}");
}

#[rstest]
fn irregular_groups_fall_back_to_general_list() {
    let doc = foamfile::parse(b"x ((0 0 0) (1 1));").unwrap();
    let Some(Value::List(items)) = doc.get(&KeyPath::parse("x").unwrap()) else {
        panic!("expected general list");
    };
    assert_eq!(items.len(), 2);
}

#[rstest]
fn mixed_lists_keep_every_item() {
    let doc = foamfile::parse(b"x (1 two (3 4) \"five\");").unwrap();
    let Some(Value::List(items)) = doc.get(&KeyPath::parse("x").unwrap()) else {
        panic!("expected general list");
    };
    assert_eq!(items[0], Value::Integer(1));
    assert_eq!(items[1], Value::word("two"));
    assert!(matches!(&items[2], Value::Numeric(list) if list.len() == 2));
    assert_eq!(items[3], Value::string("five"));
}

#[rstest]
fn repeated_value_shorthand() {
    let doc = foamfile::parse(
        b"a nonuniform List<vector> 3{(1 0 0)};\nb 4{0};\nc nonuniform List<label> 2{7};\n",
    )
    .unwrap();
    let a = numeric(&doc, "a");
    assert_eq!((a.shape, a.len()), (Shape::Vector, 3));
    assert_eq!(a.element(2).unwrap().as_slice(), &[1.0, 0.0, 0.0]);
    assert_eq!(numeric(&doc, "b").as_ints(), Some(&[0, 0, 0, 0][..]));
    assert_eq!(numeric(&doc, "c").as_ints(), Some(&[7, 7][..]));
}

#[rstest]
fn count_must_match_elements() {
    let err = foamfile::parse(b"x nonuniform List<scalar> 3(1 2);").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Shape);
}

#[rstest]
fn oversized_counts_are_errors() {
    let err = foamfile::parse(b"a 2305843009213693952{1};").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Shape);
    let err = foamfile::parse(b"a 2305843009213693952{word};").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Shape);

    // Not a counted list, so it must not come back as one.
    if let Ok(doc) = foamfile::parse(b"a 2305843009213693952(1);") {
        let value = doc.get(&KeyPath::parse("a").unwrap());
        assert!(value.and_then(Value::as_numeric).is_none());
    }
}

#[rstest]
fn faces_in_mesh_files() {
    let input = b"FoamFile { format ascii; class faceList; object faces; }\n\
        3\n(\n4(0 1 2 3)\n3(4 5 6)\n5(0 2 4 6 8)\n)\n";
    let doc = foamfile::parse(input).unwrap();
    let Some(Value::Faces(faces)) = doc.standalone() else {
        panic!("expected faces");
    };
    assert_eq!(faces.len(), 3);
    let collected: Vec<&[i64]> = faces.iter().collect();
    assert_eq!(collected[0], &[0, 1, 2, 3]);
    assert_eq!(collected[1], &[4, 5, 6]);
    assert_eq!(collected[2], &[0, 2, 4, 6, 8]);
    assert_eq!(foamfile::to_vec(&doc).unwrap(), input);
}

#[rstest]
fn labels_in_mesh_files() {
    let doc = foamfile::parse(b"FoamFile { format ascii; class labelList; }\n4\n(\n0\n0\n1\n2\n)\n")
        .unwrap();
    let Some(Value::Numeric(owner)) = doc.standalone() else {
        panic!("expected labels");
    };
    assert_eq!(owner.as_ints(), Some(&[0, 0, 1, 2][..]));
}

#[rstest]
fn large_field_parses_linearly() {
    let mut text = String::from("internalField nonuniform List<scalar> 100000(");
    for i in 0..100_000 {
        text.push_str(&format!("{} ", i as f64 * 0.5));
    }
    text.push_str(");\n");
    let doc = foamfile::parse(text.as_bytes()).unwrap();
    let field = numeric(&doc, "internalField");
    assert_eq!(field.len(), 100_000);
    assert_eq!(field.as_floats().map(|values| values[99_999]), Some(49_999.5));
}
