use crate::cli::context::{AppContext, resolve_user};
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::{JsonLinesSource, PositionTracker, PresenceStateMachine};
use crate::db::log::ttlog_quiet;
use crate::db::queries::{insert_presence_event, last_presence_states, max_presence_event_id};
use crate::errors::{AppError, AppResult};
use crate::ui::messages::{info, presence_event, success, warning};
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Track {
        file,
        user,
        pace_ms,
    } = cmd
    {
        if !Path::new(file).is_file() {
            return Err(AppError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("position file not found: {file}"),
            )));
        }

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;
        runtime.block_on(replay(cfg, file, &resolve_user(user, cfg), *pace_ms))?;
    }
    Ok(())
}

/// Replay `file` through a tracker, then persist and print the transitions.
async fn replay(cfg: &Config, file: &str, user_id: &str, pace_ms: u64) -> AppResult<()> {
    let ctx = AppContext::open(cfg)?;

    let mut machine = PresenceStateMachine::new();
    machine.resume_after(max_presence_event_id(&ctx.pool.conn)?);
    for (zone_id, state) in last_presence_states(&ctx.pool.conn, user_id)? {
        if ctx.registry.get(zone_id).is_some() {
            machine.restore(user_id, zone_id, state);
        }
    }
    let presence = Arc::new(Mutex::new(machine));

    let source = JsonLinesSource::new(file).with_pace(Duration::from_millis(pace_ms));
    let mut tracker = PositionTracker::new(user_id, source, ctx.registry.clone(), presence.clone());

    info(format!("Tracking '{user_id}' from {file}…"));
    tracker.start();
    tracker.drain().await;

    let status = tracker.status();
    let events = presence
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .events_for(user_id);

    for ev in &events {
        insert_presence_event(&ctx.pool.conn, ev)?;
        let name = ctx
            .registry
            .get(ev.zone_id)
            .map(|z| z.name)
            .unwrap_or_default();
        presence_event(ev, &name);
    }

    ttlog_quiet(
        &ctx.pool.conn,
        "track",
        user_id,
        &format!(
            "{} samples, {} presence events from {file}",
            status.samples_processed,
            events.len()
        ),
    );

    if let Err(e) = tracker.check() {
        warning(e);
    }
    if status.duplicates_dropped > 0 {
        info(format!("{} duplicate sample(s) dropped.", status.duplicates_dropped));
    }
    if let Some(pos) = status.current_position {
        info(format!(
            "Last position {} (±{:.0} m) at {}",
            pos.coordinate,
            pos.accuracy,
            pos.captured_at.format("%Y-%m-%d %H:%M:%S")
        ));
    }
    success(format!(
        "Processed {} sample(s), {} presence event(s).",
        status.samples_processed,
        events.len()
    ));
    Ok(())
}
