//! MessagePack encoding and a size comparison across the codecs.
//!
//! Run with: cargo run --example binary

use std::error::Error;
use valuepack::{from_msgpack, json, to_msgpack, to_wire, ContainerBuilder, Value};

fn main() -> Result<(), Box<dyn Error>> {
    let mut builder = ContainerBuilder::new()
        .source("gateway", "rack-4")
        .target("collector", "")
        .message_type("sensor_batch");
    for i in 0..10 {
        builder = builder.value(Value::container(
            format!("reading_{}", i),
            vec![
                Value::llong("stamp", 1_724_580_000_000 + i),
                Value::double("celsius", 20.0 + i as f64 / 8.0),
                Value::bytes("frame", vec![0xAB; 24]),
            ],
        ));
    }
    let container = builder.build();

    let packed = to_msgpack(&container)?;
    let wire = to_wire(&container);
    let v2 = json::to_v2(&container);

    println!("MessagePack: {:>5} bytes", packed.len());
    println!("Wire format: {:>5} bytes", wire.len());
    println!("v2.0 JSON:   {:>5} bytes", v2.len());

    let decoded = from_msgpack(&packed)?;
    assert_eq!(decoded, container);
    println!("\n✓ {} values decoded intact", decoded.len());

    // Equal containers always produce identical bytes
    assert_eq!(packed, to_msgpack(&decoded)?);
    println!("✓ Encoding is deterministic");

    Ok(())
}
