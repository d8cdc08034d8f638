//! Hand-raise call simulator.
//!
//! Runs several presence drivers in one in-memory room, toggles hands at
//! random and logs what every participant ends up displaying.
//!
//! # Usage
//!
//! ```bash
//! # Four peers, ten toggles, FIFO delivery
//! handraise-sim --peers 4 --toggles 10
//!
//! # Reordered delivery, reproducible from the seed
//! handraise-sim --peers 4 --toggles 10 --shuffle --seed 42
//! ```

use clap::Parser;
use handraise_harness::{HubConfig, SimConfig, SimWorld, SlotId};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Hand-raise presence simulator
#[derive(Parser, Debug)]
#[command(name = "handraise-sim")]
#[command(about = "Simulate hand-raise presence across peers in one room")]
#[command(version)]
struct Args {
    /// Number of peers joining the room
    #[arg(short, long, default_value = "3")]
    peers: SlotId,

    /// Room to create or join
    #[arg(short, long)]
    room: Option<String>,

    /// Number of random hand toggles
    #[arg(short, long, default_value = "5")]
    toggles: usize,

    /// Seed for toggle choice and delivery order
    #[arg(short, long, default_value = "0")]
    seed: u64,

    /// Reorder deliveries (app messages may overtake lifecycle events)
    #[arg(long)]
    shuffle: bool,

    /// Echo broadcasts back to their sender
    #[arg(long)]
    echo: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    tracing::info!(
        peers = args.peers,
        toggles = args.toggles,
        seed = args.seed,
        "simulation starting"
    );

    let config = SimConfig {
        room: args.room,
        hub: HubConfig { echo_to_sender: args.echo },
        shuffle_seed: args.shuffle.then_some(args.seed),
        ..SimConfig::default()
    };
    let mut world = SimWorld::new(usize::from(args.peers), config);
    let mut rng = ChaCha8Rng::seed_from_u64(args.seed);

    for slot in 0..args.peers {
        world.join(slot, &format!("Peer {slot}"))?;
    }

    if args.peers > 0 {
        for _ in 0..args.toggles {
            let slot = rng.gen_range(0..args.peers);
            world.toggle(slot)?;
            world.deliver(rng.gen_range(0..4));
        }
    }

    let delivered = world.flush();
    tracing::info!(delivered, messages = world.hub().borrow().messages_sent(), "delivery drained");

    for slot in world.active_slots() {
        if let Some(driver) = world.driver(slot) {
            for line in driver.view().lines() {
                tracing::info!(peer = slot, "{line}");
            }
        }
    }

    let state = world.observable_state();
    let mut views = state.views.iter().flatten();
    if let Some(first) = views.next() {
        let converged = views.all(|v| {
            v.iter().map(|(_, raised)| raised).eq(first.iter().map(|(_, raised)| raised))
        });
        if !converged {
            return Err("peers disagree on hand state".into());
        }
    }
    tracing::info!("all peers agree");

    world.end_all();
    Ok(())
}
