use std::net::Ipv4Addr;

use serde_json::{json, Value};
use tempfile::tempdir;

use tabout::codec::{FlagDefinition, Guid};
use tabout::config::TextEncoding;
use tabout::{json as json_out, Container, DocValue, OutputError, OutputOptions};

#[test]
fn test_document_is_well_formed() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("doc.json");
    let options = OutputOptions {
        pretty_print: true,
        ..Default::default()
    };

    let mut doc = json_out::open(std::fs::File::create(&path).unwrap(), &options).unwrap();
    doc.write_named("host", DocValue::Ipv4(Ipv4Addr::new(192, 168, 0, 1))).unwrap();
    doc.write_named("id", Guid::new(0x12345678, 0x9abc, 0xdef0, [1, 2, 3, 4, 5, 6, 7, 8]).into())
        .unwrap();
    doc.begin_collection(Some("flags")).unwrap();
    let definitions = [FlagDefinition::new(0x1, "A"), FlagDefinition::new(0x4, "C")];
    doc.write(DocValue::Flags { value: 0x5, definitions: &definitions, separator: Some(',') })
        .unwrap();
    doc.write(DocValue::U32 { value: 0xff, hex: true }).unwrap();
    doc.end_collection().unwrap();
    doc.write_comment("not emitted").unwrap();
    doc.close().unwrap();
    drop(doc);

    let value: Value = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
    assert_eq!(
        value,
        json!({
            "host": "192.168.0.1",
            "id": "{12345678-9ABC-DEF0-0102-030405060708}",
            "flags": ["A,C", "0x000000FF"]
        })
    );
}

#[test]
fn test_unbalanced_end_is_rejected() {
    let dir = tempdir().unwrap();
    let mut doc = json_out::open(
        std::fs::File::create(dir.path().join("x.json")).unwrap(),
        &OutputOptions {
            encoding: TextEncoding::Utf16,
            ..Default::default()
        },
    )
    .unwrap();
    doc.begin_element(Some("outer")).unwrap();
    assert!(matches!(
        doc.end_collection(),
        Err(OutputError::Nesting { expected: Container::Array, found: Some(Container::Object) })
    ));
    doc.end_element().unwrap();
    doc.close().unwrap();
}
