//! One container, three JSON shapes.
//!
//! Run with: cargo run --example dialects

use std::error::Error;
use valuepack::json::{convert_format, detect_format, to_flat, to_nested, to_v2_pretty, Dialect};
use valuepack::{values, ContainerBuilder};

fn main() -> Result<(), Box<dyn Error>> {
    let container = ContainerBuilder::new()
        .source("gateway", "rack-4")
        .target("collector", "")
        .message_type("telemetry")
        .values(values! {
            "sensor" => "thermo-7",
            "celsius" => 21.375,
            "frame" => vec![0xFFu8, 0xD8, 0xFF, 0xE0],
        })
        .build();

    println!("v2.0 envelope:\n{}\n", to_v2_pretty(&container));
    println!("nested (legacy C++):\n{}\n", to_nested(&container));
    println!("flat (legacy Python):\n{}\n", to_flat(&container));

    // A document of unknown provenance: detect, then normalize to v2.0
    let foreign = r#"{"message_type":"telemetry","values":[{"name":"celsius","type":"11","data":"21.375"}]}"#;
    println!("Detected dialect: {}", detect_format(foreign));

    let normalized = convert_format(foreign, Dialect::V2)?;
    println!("Normalized: {}", normalized);
    println!("✓ All three dialects describe the same container");

    Ok(())
}
