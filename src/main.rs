//! Headless dotlink runner (default binary).
//!
//! Owns the simulation session and drives it from the TCP adapter on a
//! fixed tick. Rendering and pointer input live in the connected client.

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use log::info;

use dotlink::adapter::{Adapter, OutboundMessage};
use dotlink::core::{Config, Session};

const TICK_MS: u64 = 16;

fn main() -> Result<()> {
    dotlink::logging::init_from_env()?;

    let config = Config::from_env();
    config.validate().context("invalid DOTLINK_* configuration")?;

    let seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u32)
        .unwrap_or(1);
    let mut session = Session::new(config, seed)?;

    let Some(mut adapter) = Adapter::start_from_env()? else {
        info!("nothing to drive the session; exiting");
        return Ok(());
    };

    run(&mut session, &mut adapter);
    Ok(())
}

fn run(session: &mut Session, adapter: &mut Adapter) {
    let tick = Duration::from_millis(TICK_MS);

    loop {
        let started = Instant::now();

        while let Some(inbound) = adapter.try_recv() {
            adapter.dispatch(session, inbound);
        }

        // One deferred column refill per tick.
        if session.step_refill(adapter.events()) && session.pending_refills() == 0 {
            let seq = adapter.events().next_seq();
            adapter.send(OutboundMessage::BroadcastObservation {
                obs: dotlink::adapter::create_observation(seq, session),
            });
        }

        if let Some(rest) = tick.checked_sub(started.elapsed()) {
            std::thread::sleep(rest);
        }
    }
}
