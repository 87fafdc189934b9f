use valuepack::json::{self, convert_format, detect_format, Detection, Dialect};
use valuepack::{from_msgpack, from_wire, to_msgpack, ValueKind};

#[test]
fn test_nested_document_from_cpp_producer() {
    // The legacy C++ shape: numeric type codes, every scalar as text, and
    // composite children keyed by name.
    let doc = r#"{
        "header": {
            "target_id": "python_app",
            "target_sub_id": "",
            "source_id": "cpp_server",
            "source_sub_id": "db",
            "message_type": "query_result",
            "version": "1.0.0.0"
        },
        "values": {
            "row_count": {"type": 4, "data": "150"},
            "elapsed": {"type": 11, "data": "0.125"},
            "row": {
                "type": 14,
                "data": {
                    "id": {"type": 8, "data": "9000000001"},
                    "label": {"type": 13, "data": "first"}
                }
            }
        }
    }"#;

    assert_eq!(detect_format(doc), Detection::Nested);
    let container = json::from_nested(doc).unwrap();
    println!("decoded nested: {}", container);

    assert_eq!(container.message_type(), "query_result");
    assert_eq!(container.source_sub_id(), "db");
    assert_eq!(container.get("row_count").unwrap().to_int().unwrap(), 150);
    assert_eq!(container.get("elapsed").unwrap().to_double().unwrap(), 0.125);

    let row = container.get("row").unwrap();
    assert_eq!(row.kind(), ValueKind::Container);
    assert_eq!(row.child_at(0).unwrap().to_llong().unwrap(), 9_000_000_001);
    assert_eq!(row.child_at(1).unwrap().as_str(), Some("first"));
}

#[test]
fn test_flat_document_from_python_producer() {
    // The legacy Python shape: header at the top level, decimal-string
    // types, children as arrays of entries.
    let doc = r#"{
        "source_id": "python_app",
        "source_sub_id": "",
        "target_id": "cpp_server",
        "target_sub_id": "db",
        "message_type": "query",
        "version": "1.0.0.0",
        "values": [
            {"name": "sql", "type": "13", "data": "select 1"},
            {"name": "timeout_ms", "type": "5", "data": "2500"},
            {"name": "params", "type": "15", "data": [
                {"name": "", "type": "4", "data": "1"},
                {"name": "", "type": "4", "data": "2"}
            ]}
        ]
    }"#;

    assert_eq!(detect_format(doc), Detection::Flat);
    let container = json::from_flat(doc).unwrap();

    assert_eq!(container.target_sub_id(), "db");
    assert_eq!(container.get("sql").unwrap().as_str(), Some("select 1"));
    assert_eq!(container.get("timeout_ms").unwrap().to_ullong().unwrap(), 2500);

    let params = container.get("params").unwrap();
    assert_eq!(params.kind(), ValueKind::Array);
    assert_eq!(params.child_count(), 2);
}

#[test]
fn test_v2_document_with_native_scalars() {
    let doc = r#"{
        "container": {
            "version": "2.0",
            "metadata": {
                "message_type": "snapshot",
                "protocol_version": "1.2.0.0",
                "source": {"id": "gateway", "sub_id": "rack-4"},
                "target": {"id": "collector", "sub_id": ""}
            },
            "values": [
                {"name": "online", "type": 1, "type_name": "bool", "data": true},
                {"name": "count", "type": 5, "type_name": "uint", "data": 4294967295},
                {"name": "blob", "type": 12, "type_name": "bytes",
                 "data": "SGVsbG8=", "encoding": "base64"},
                {"name": "note", "type_name": "string", "data": "no numeric type here"}
            ]
        }
    }"#;

    assert_eq!(detect_format(doc), Detection::V2);
    let container = json::from_v2(doc).unwrap();

    assert_eq!(container.version(), "1.2.0.0");
    assert_eq!(container.source_sub_id(), "rack-4");
    assert!(container.get("online").unwrap().to_bool().unwrap());
    assert_eq!(container.get("count").unwrap().to_ullong().unwrap(), 4_294_967_295);
    assert_eq!(container.get("blob").unwrap().as_bytes(), Some(&b"Hello"[..]));
    // type_name alone is enough when the numeric type is absent
    assert_eq!(
        container.get("note").unwrap().as_str(),
        Some("no numeric type here")
    );
}

#[test]
fn test_wire_packet_with_decimal_type_codes() {
    // Older producers write decimal codes instead of tags, pad the gap
    // between sections, and order header keys their own way.
    let packet = "@header={{[version,1.0.0.0];[message_type,legacy];\
                  [build,unreleased];[source_id,old_node];}} \n \
                  @data={{[n,4,7];[w,6,2147483647];[s,13,plain text, with commas];}};";

    let container = from_wire(packet).unwrap();
    println!("decoded wire: {}", container);

    assert_eq!(container.message_type(), "legacy");
    assert_eq!(container.source_id(), "old_node");
    // unknown header keys are skipped, defaults fill the rest
    assert_eq!(container.target_id(), "");

    assert_eq!(container.get("n").unwrap().kind(), ValueKind::Int);
    assert_eq!(container.get("w").unwrap().kind(), ValueKind::Long);
    assert_eq!(container.get("w").unwrap().to_int().unwrap(), 2_147_483_647);
    assert_eq!(
        container.get("s").unwrap().as_str(),
        Some("plain text, with commas")
    );
}

#[test]
fn test_indented_documents_parse_identically() {
    let compact = r#"{"message_type":"m","values":[{"name":"n","type":"4","data":"7"}]}"#;
    let indented = "{\n  \"message_type\": \"m\",\n  \"values\": [\n    {\n      \
                    \"name\": \"n\",\n      \"type\": \"4\",\n      \"data\": \"7\"\n    }\n  ]\n}";

    assert_eq!(detect_format(indented), Detection::Flat);
    assert_eq!(
        json::from_flat(compact).unwrap(),
        json::from_flat(indented).unwrap()
    );
}

#[test]
fn test_dialect_migration_pipeline() {
    // nested -> flat -> v2, value for value
    let nested = r#"{
        "header": {"message_type": "migrate", "version": "1.0.0.0"},
        "values": {
            "n": {"type": 4, "data": "7"},
            "s": {"type": 13, "data": "keep me"}
        }
    }"#;

    let flat = convert_format(nested, Dialect::Flat).unwrap();
    assert_eq!(detect_format(&flat), Detection::Flat);

    let v2 = convert_format(&flat, Dialect::V2).unwrap();
    assert_eq!(detect_format(&v2), Detection::V2);

    let end = json::from_v2(&v2).unwrap();
    let start = json::from_nested(nested).unwrap();
    assert_eq!(end, start);
    assert_eq!(end.get("s").unwrap().as_str(), Some("keep me"));
}

// test-local mirror of the format's fixstr rule
fn fixstr(out: &mut Vec<u8>, text: &str) {
    out.push(0xA0 | text.len() as u8);
    out.extend_from_slice(text.as_bytes());
}

#[test]
fn test_msgpack_from_foreign_encoder() {
    // A partial header and a non-minimal int16 payload for a value that
    // fits in a fixint; both are fine on input.
    let mut bytes = vec![0x82];
    fixstr(&mut bytes, "header");
    bytes.push(0x82);
    fixstr(&mut bytes, "message_type");
    fixstr(&mut bytes, "mp_fixture");
    fixstr(&mut bytes, "version");
    fixstr(&mut bytes, "9.9");
    fixstr(&mut bytes, "values");
    bytes.push(0x92);
    bytes.push(0x83);
    fixstr(&mut bytes, "name");
    fixstr(&mut bytes, "n");
    fixstr(&mut bytes, "type");
    fixstr(&mut bytes, "4");
    fixstr(&mut bytes, "data");
    bytes.push(0xD1); // int 16
    bytes.extend_from_slice(&42i16.to_be_bytes());
    bytes.push(0x83);
    fixstr(&mut bytes, "name");
    fixstr(&mut bytes, "s");
    fixstr(&mut bytes, "type");
    fixstr(&mut bytes, "13");
    fixstr(&mut bytes, "data");
    fixstr(&mut bytes, "ok");

    let container = from_msgpack(&bytes).unwrap();
    assert_eq!(container.message_type(), "mp_fixture");
    assert_eq!(container.version(), "9.9");
    assert_eq!(container.source_id(), "");
    assert_eq!(container.get("n").unwrap().to_int().unwrap(), 42);
    assert_eq!(container.get("s").unwrap().as_str(), Some("ok"));

    // our encoder canonicalizes: full header, minimal integer widths
    let canonical = to_msgpack(&container).unwrap();
    assert_ne!(canonical, bytes);
    assert_eq!(from_msgpack(&canonical).unwrap(), container);
}

#[test]
fn test_detection_answers_for_foreign_documents() {
    let cases = [
        (r#"{"container":{"version":"2.0","values":[]}}"#, Detection::V2),
        (r#"{"header":{},"values":{}}"#, Detection::Nested),
        (r#"{"message_type":"m","values":[]}"#, Detection::Flat),
        (r#"{"container":{"version":"2.1","values":[]}}"#, Detection::Unknown),
        ("@header={{}}@data={{}};", Detection::Invalid),
    ];
    for (doc, expected) in cases {
        assert_eq!(detect_format(doc), expected, "input: {}", doc);
    }
}

#[test]
fn test_stringly_types_resolve_everywhere() {
    // producers disagree about the type token; all three spellings land on
    // the same kind
    for token in ["\"10\"", "\"FLOAT\"", "\"float\""] {
        let doc = format!(
            r#"{{"message_type":"m","values":[{{"name":"r","type":{},"data":"0.5"}}]}}"#,
            token
        );
        let container = json::from_flat(&doc).unwrap();
        let value = container.get("r").unwrap();
        assert_eq!(value.kind(), ValueKind::Float, "token {}", token);
        assert_eq!(value.to_double().unwrap(), 0.5);
    }
}
