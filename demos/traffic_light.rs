//! Traffic light: a cyclic machine with a reducer on one transition.
//!
//! Run with: cargo run --example traffic_light

use serde_json::json;
use stratum::{Event, Machine, MachineConfig, Registry};

fn main() {
    let config: MachineConfig = serde_json::from_value(json!({
        "initialContext": { "cycleCount": 0 },
        "initial": "green",
        "states": {
            "green": { "on": { "TIMER": { "target": "yellow", "assign": "countCycle" } } },
            "yellow": { "on": { "TIMER": "red" } },
            "red": { "on": { "TIMER": "green" } }
        }
    }))
    .expect("valid configuration");

    let registry = Registry::new().reducer("countCycle", |ctx, _event, _state| {
        json!({ "cycleCount": ctx["cycleCount"].as_i64().unwrap_or(0) + 1 })
    });

    let mut machine = Machine::new(config, registry).expect("compiles");
    machine.start().expect("starts");

    println!("=== Traffic Light ===\n");
    println!("initial: {:?}", machine.state_value());

    for tick in 1..=6 {
        machine.send(Event::new("TIMER")).expect("send");
        println!(
            "tick {tick}: {:?} (cycles: {})",
            machine.state_value(),
            machine.context()["cycleCount"]
        );
    }

    println!("\nThe countCycle reducer fires once per full loop.");
}
