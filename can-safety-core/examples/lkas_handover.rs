//! Walks the steering-control handover sequence with logging enabled
//!
//! Usage:
//!   RUST_LOG=info cargo run --example lkas_handover

use can_safety_core::{
    Gatekeeper, Message, SafetyConfig, SimulatedBoard, HOLDOFF_REFILL, PRIMARY_BUS,
    SECONDARY_BUS, STEERING_CONTROL_ADDR,
};

fn print_state(label: &str, gatekeeper: &Gatekeeper<SimulatedBoard>) {
    let forwarding = &gatekeeper.context().forwarding;
    println!(
        "{:<32} forwarding={:<5} holdoff={}",
        label,
        forwarding.secondary_bus_forward_enabled(),
        forwarding.primary_bus_holdoff_count()
    );
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut gatekeeper = Gatekeeper::new(SimulatedBoard::new(false), SafetyConfig::new());
    let lkas = |bus| Message::new(bus, STEERING_CONTROL_ADDR, vec![0; 8]);

    print_state("fresh", &gatekeeper);

    gatekeeper.route(&lkas(PRIMARY_BUS));
    print_state("LKAS on bus 0", &gatekeeper);

    for i in 1..=HOLDOFF_REFILL + 1 {
        let (_, destination) = gatekeeper.route(&lkas(SECONDARY_BUS));
        print_state(
            &format!("LKAS on bus 2 #{} -> {:?}", i, destination),
            &gatekeeper,
        );
    }

    println!("\n=== STATS ===");
    println!("{:#?}", gatekeeper.stats());
}
