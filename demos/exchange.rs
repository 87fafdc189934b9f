//! A request/reply exchange over the wire format.
//!
//! Run with: cargo run --example exchange

use std::error::Error;
use valuepack::{from_wire, to_wire, values, ContainerBuilder, Value};

fn main() -> Result<(), Box<dyn Error>> {
    // The client side builds a query packet
    let request = ContainerBuilder::new()
        .source("python_app", "ui")
        .target("cpp_server", "db")
        .message_type("db_query")
        .values(values! {
            "sql" => "select id, label from readings",
            "timeout_ms" => 2500u32,
        })
        .build();

    let packet = to_wire(&request);
    println!("Request on the wire:\n{}\n", packet);

    // The server side parses it, runs the query, and answers
    let received = from_wire(&packet)?;
    println!(
        "Server received {:?} from {}/{}",
        received.message_type(),
        received.source_id(),
        received.source_sub_id()
    );

    let mut reply = received.copy_header();
    reply.swap_header();
    reply.set_message_type("db_result");
    reply.add(Value::int("row_count", 2));
    reply.add(Value::container(
        "rows",
        vec![
            Value::string("", "thermo-7"),
            Value::string("", "thermo-9"),
        ],
    ));

    let reply_packet = to_wire(&reply);
    println!("\nReply on the wire:\n{}\n", reply_packet);

    // Back on the client
    let result = from_wire(&reply_packet)?;
    println!("Rows returned: {}", result.get("row_count").unwrap().to_int()?);
    assert_eq!(result.target_id(), "python_app");
    println!("✓ Round-trip successful");

    Ok(())
}
