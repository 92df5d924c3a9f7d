//! Foreground engine loop: overnight check plus the reconciler
//! interval, printing every notification as it happens.

use std::sync::mpsc::RecvTimeoutError;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{Local, Utc};

use quietude_core::{EnergyEngine, ReconcilerRunner};

pub fn run(interval: Option<u64>) -> Result<(), Box<dyn std::error::Error>> {
    let mut engine = EnergyEngine::open()?;
    let interval = interval.unwrap_or(engine.config().reconciler.interval_secs);
    let rx = engine.subscribe();

    // Lifecycle trigger: evaluate the overnight recharge once per day.
    engine.on_resume(Utc::now())?;

    println!("Battery at {} ({})", engine.level(), engine.status().message());
    match engine.next_due() {
        Some(due) => println!(
            "Next event due {}; checking every {interval}s. Ctrl-C to stop.",
            due.with_timezone(&Local).format("%Y-%m-%d %H:%M")
        ),
        None => println!("No pending events; checking every {interval}s. Ctrl-C to stop."),
    }

    let engine = Arc::new(Mutex::new(engine));
    let runtime = tokio::runtime::Runtime::new()?;
    let _guard = runtime.enter();
    // Dropping the runner on exit releases the interval timer.
    let _runner = ReconcilerRunner::spawn(engine.clone(), Duration::from_secs(interval));

    loop {
        match rx.recv_timeout(Duration::from_millis(500)) {
            Ok(event) => {
                println!("{}", event.summary());
                println!("  {}", event.detail());
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    Ok(())
}
