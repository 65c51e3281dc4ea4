//! Terminal messages for the CLI. Diagnostics go through `tracing` instead.

use crate::models::presence::{PresenceEvent, PresenceEventType};
use std::fmt;

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Success,
    Warning,
    Error,
}

impl Level {
    fn color(self) -> &'static str {
        match self {
            Level::Info => "\x1b[34m",
            Level::Success => "\x1b[32m",
            Level::Warning => "\x1b[33m",
            Level::Error => "\x1b[31m",
        }
    }

    fn icon(self) -> &'static str {
        match self {
            Level::Info => "ℹ️",
            Level::Success => "✅",
            Level::Warning => "⚠️",
            Level::Error => "❌",
        }
    }
}

/// Format a message line; errors go to stderr in [`emit`].
pub fn render<T: fmt::Display>(level: Level, msg: T) -> String {
    format!("{}{}{} {}{}", level.color(), BOLD, level.icon(), RESET, msg)
}

pub fn emit<T: fmt::Display>(level: Level, msg: T) {
    let line = render(level, msg);
    if level == Level::Error {
        eprintln!("{line}");
    } else {
        println!("{line}");
    }
}

pub fn info<T: fmt::Display>(msg: T) {
    emit(Level::Info, msg);
}

pub fn success<T: fmt::Display>(msg: T) {
    emit(Level::Success, msg);
}

pub fn warning<T: fmt::Display>(msg: T) {
    emit(Level::Warning, msg);
}

pub fn error<T: fmt::Display>(msg: T) {
    emit(Level::Error, msg);
}

pub fn header<T: fmt::Display>(msg: T) {
    println!("{}{}=== {} ==={}", Level::Info.color(), BOLD, msg, RESET);
}

/// One line per presence transition, e.g. `→ ENTER zone #1 (HQ) at ...`.
pub fn presence_event(ev: &PresenceEvent, zone_name: &str) {
    let (arrow, level) = match ev.event_type {
        PresenceEventType::Enter => ("→", Level::Success),
        PresenceEventType::Exit => ("←", Level::Warning),
    };
    println!(
        "{}{} {}{} zone #{} ({}) at {} [{}]",
        level.color(),
        arrow,
        ev.event_type.to_db_str().to_uppercase(),
        RESET,
        ev.zone_id,
        zone_name,
        ev.occurred_at.format("%Y-%m-%d %H:%M:%S"),
        ev.coordinate,
    );
}
