//! Property-based tests - pragmatic approach testing core roundtrip guarantees
//!
//! Generated containers cover every value kind, nest composites several
//! levels deep, and stuff names and header fields with the characters the
//! escaping rules exist for. Each codec must reproduce the tree exactly.

use proptest::prelude::*;
use valuepack::{
    detect_format, from_msgpack, from_wire, json, to_msgpack, to_wire, Container, Dialect, Value,
    ValueData,
};

fn survives<E, D, W>(container: &Container, encode: E, decode: D) -> bool
where
    E: Fn(&Container) -> W,
    D: Fn(&W) -> valuepack::Result<Container>,
    W: std::fmt::Debug,
{
    let encoded = encode(container);
    match decode(&encoded) {
        Ok(decoded) => {
            if decoded == *container {
                true
            } else {
                eprintln!("Decoded container differs from the original");
                eprintln!("Encoded was: {:?}", encoded);
                false
            }
        }
        Err(e) => {
            eprintln!("Decode failed: {}", e);
            eprintln!("Encoded was: {:?}", encoded);
            false
        }
    }
}

/// Value names: plain identifiers most of the time, plus the characters the
/// wire format has to escape. Commas are reserved as the field separator.
fn name_text() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => "[a-z][a-z0-9_]{0,7}",
        1 => Just(String::new()),
        1 => Just("odd];name".to_string()),
        1 => Just("back\\slash".to_string()),
    ]
}

/// Free text for string payloads and header fields.
fn payload_text() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => "[ -~]{0,16}",
        1 => Just("héllo → wörld".to_string()),
        1 => Just("];".to_string()),
        1 => Just("\\];\\\\".to_string()),
    ]
}

fn signed_scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        (name_text(), any::<i16>()).prop_map(|(n, v)| Value::short(n, v)),
        (name_text(), any::<i32>()).prop_map(|(n, v)| Value::int(n, v)),
        (name_text(), any::<i32>()).prop_map(|(n, v)| Value::new(n, ValueData::Long(v))),
        (name_text(), any::<i64>()).prop_map(|(n, v)| Value::llong(n, v)),
    ]
}

fn unsigned_scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        (name_text(), any::<u16>()).prop_map(|(n, v)| Value::ushort(n, v)),
        (name_text(), any::<u32>()).prop_map(|(n, v)| Value::uint(n, v)),
        (name_text(), any::<u32>()).prop_map(|(n, v)| Value::new(n, ValueData::ULong(v))),
        (name_text(), any::<u64>()).prop_map(|(n, v)| Value::ullong(n, v)),
    ]
}

fn other_scalar() -> impl Strategy<Value = Value> {
    let not_nan_f32 = any::<f32>().prop_filter("NaN never compares equal", |f| !f.is_nan());
    let not_nan_f64 = any::<f64>().prop_filter("NaN never compares equal", |f| !f.is_nan());
    prop_oneof![
        name_text().prop_map(Value::null),
        (name_text(), any::<bool>()).prop_map(|(n, v)| Value::boolean(n, v)),
        (name_text(), not_nan_f32).prop_map(|(n, v)| Value::float(n, v)),
        (name_text(), not_nan_f64).prop_map(|(n, v)| Value::double(n, v)),
        (name_text(), prop::collection::vec(any::<u8>(), 0..24))
            .prop_map(|(n, v)| Value::bytes(n, v)),
        (name_text(), payload_text()).prop_map(|(n, v)| Value::string(n, v)),
    ]
}

fn value_tree() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![signed_scalar(), unsigned_scalar(), other_scalar()];
    leaf.prop_recursive(4, 24, 5, |inner| {
        prop_oneof![
            (name_text(), prop::collection::vec(inner.clone(), 0..5))
                .prop_map(|(n, children)| Value::container(n, children)),
            (name_text(), prop::collection::vec(inner, 0..5))
                .prop_map(|(n, children)| Value::array(n, children)),
        ]
    })
}

fn container_tree() -> impl Strategy<Value = Container> {
    (
        payload_text(),
        payload_text(),
        payload_text(),
        payload_text(),
        payload_text(),
        payload_text(),
        prop::collection::vec(value_tree(), 0..5),
    )
        .prop_map(|(si, ss, ti, ts, mt, ver, values)| {
            let mut container = Container::new();
            container.set_source(si, ss);
            container.set_target(ti, ts);
            container.set_message_type(mt);
            container.set_version(ver);
            for value in values {
                container.add(value);
            }
            container
        })
}

/// The nested dialect keys values by name, so give every node a unique one.
fn assign_unique_names(values: &mut [Value], counter: &mut u32) {
    for value in values {
        value.set_name(format!("v{}", counter));
        *counter += 1;
        if let Some(children) = value.children_mut() {
            assign_unique_names(children, counter);
        }
    }
}

proptest! {
    #[test]
    fn prop_wire_roundtrip(c in container_tree()) {
        prop_assert!(survives(&c, |c| to_wire(c), |t: &String| from_wire(t)));
    }

    #[test]
    fn prop_wire_encode_is_deterministic(c in container_tree()) {
        prop_assert_eq!(to_wire(&c), to_wire(&c));
    }

    #[test]
    fn prop_v2_roundtrip(c in container_tree()) {
        prop_assert!(survives(&c, |c| json::to_v2(c), |t: &String| json::from_v2(t)));
    }

    #[test]
    fn prop_flat_roundtrip(c in container_tree()) {
        prop_assert!(survives(&c, |c| json::to_flat(c), |t: &String| json::from_flat(t)));
    }

    #[test]
    fn prop_nested_roundtrip(mut c in container_tree()) {
        let mut counter = 0;
        assign_unique_names(c.values_mut(), &mut counter);
        prop_assert!(survives(&c, |c| json::to_nested(c), |t: &String| json::from_nested(t)));
    }

    #[test]
    fn prop_msgpack_roundtrip(c in container_tree()) {
        prop_assert!(survives(
            &c,
            |c| to_msgpack(c).unwrap(),
            |b: &Vec<u8>| from_msgpack(b),
        ));
    }

    #[test]
    fn prop_detection_is_total(text in "\\PC{0,64}") {
        // any input lands on one of the five outcomes without panicking
        let _ = detect_format(&text);
    }

    #[test]
    fn prop_conversion_preserves_values(c in container_tree()) {
        let flat = json::to_flat(&c);
        let v2 = json::convert_format(&flat, Dialect::V2);
        prop_assert!(v2.is_ok());
        prop_assert_eq!(json::from_v2(&v2.unwrap()).unwrap(), c);
    }
}
