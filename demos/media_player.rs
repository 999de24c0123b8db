//! Media player: parallel regions evolving independently, plus activity
//! instances an external effect manager could start and stop.
//!
//! Run with: cargo run --example media_player

use serde_json::json;
use stratum::{Event, Machine, MachineConfig, Registry};

fn main() {
    let config: MachineConfig = serde_json::from_value(json!({
        "initial": "player",
        "states": {
            "player": {
                "type": "parallel",
                "on": { "POWER_OFF": "off" },
                "states": {
                    "playback": {
                        "initial": "paused",
                        "states": {
                            "paused": { "on": { "PLAY": "playing" } },
                            "playing": {
                                "activities": "renderAudio",
                                "on": { "PAUSE": "paused" }
                            }
                        }
                    },
                    "volume": {
                        "initial": "normal",
                        "states": {
                            "normal": { "on": { "MUTE": "muted" } },
                            "muted": { "on": { "MUTE": "normal" } }
                        }
                    }
                }
            },
            "off": { "type": "final" }
        }
    }))
    .expect("valid configuration");

    let mut machine = Machine::new(config, Registry::new()).expect("compiles");
    machine.start().expect("starts");

    println!("=== Media Player ===\n");
    println!("initial: {:?}", machine.state_value());

    machine.send(Event::new("PLAY")).expect("send");
    machine.send(Event::new("MUTE")).expect("send");
    println!("after PLAY, MUTE: {:?}", machine.state_value());

    let activities = machine.active_activities().expect("started");
    for instance in &activities {
        println!(
            "activity '{}' on '{}' (instance {})",
            instance.activity, instance.state_id, instance.instance_id
        );
    }

    machine.send(Event::new("PAUSE")).expect("send");
    let stale = &activities[0];
    println!(
        "after PAUSE, instance {} relevant: {}",
        stale.instance_id,
        machine.is_activity_relevant(stale)
    );

    machine.send(Event::new("POWER_OFF")).expect("send");
    println!("after POWER_OFF: halted = {}", machine.is_halted());
}
