//! Form workflow: guarded always-transitions settle a submission in a
//! single send, and time travel rewinds the failed attempt.
//!
//! Run with: cargo run --example form_workflow

use serde_json::json;
use stratum::{Event, Machine, MachineConfig, Registry};

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let config: MachineConfig = serde_json::from_value(json!({
        "initialContext": {
            "formData": { "valid": false },
            "submitAttempts": 0
        },
        "initial": "editing",
        "debug": true,
        "timeTravel": true,
        "states": {
            "editing": {
                "on": {
                    "CHANGE": { "assign": "applyChange" },
                    "SUBMIT": "submitting"
                }
            },
            "submitting": {
                "onEntry": "markAttempt",
                "initial": "validating",
                "states": {
                    "validating": {
                        "always": [
                            { "target": "sending", "guard": "isValid" },
                            "failed"
                        ]
                    },
                    "sending": { "always": "done" },
                    "failed": { "on": { "EDIT": "editing" } },
                    "done": {}
                }
            }
        }
    }))
    .expect("valid configuration");

    let registry = Registry::new()
        .guard("isValid", |ctx, _event, _state| {
            ctx["formData"]["valid"] == json!(true)
        })
        .reducer("applyChange", |_ctx, event, _state| {
            let valid = event.payload.get("valid") == Some(&json!(true));
            json!({ "formData": { "valid": valid } })
        })
        .reducer("markAttempt", |ctx, _event, _state| {
            json!({ "submitAttempts": ctx["submitAttempts"].as_i64().unwrap_or(0) + 1 })
        });

    let mut machine = Machine::new(config, registry).expect("compiles");
    machine.start().expect("starts");

    println!("=== Form Workflow ===\n");

    machine.send(Event::new("SUBMIT")).expect("send");
    println!(
        "invalid submit lands in {:?} (attempts: {})",
        machine.state_value(),
        machine.context()["submitAttempts"]
    );

    machine.send(Event::new("EDIT")).expect("send");
    machine
        .send(Event::new("CHANGE").with("valid", true))
        .expect("send");
    machine.send(Event::new("SUBMIT")).expect("send");
    println!(
        "valid submit lands in {:?} (attempts: {})",
        machine.state_value(),
        machine.context()["submitAttempts"]
    );

    let timeline = machine.timeline().expect("time travel enabled");
    println!("\nhistory length: {}", timeline.len());

    machine.rewind(2).expect("rewind");
    println!("after rewind(2): {:?}", machine.state_value());
}
