use crate::cli::parser::Commands;
use crate::config::Config;
use crate::db::log::load_log;
use crate::db::pool::DbPool;
use crate::errors::AppResult;
use crate::ui::messages::{header, info};
use ansi_term::Colour;

const TARGET_WIDTH: usize = 40;

fn color_for_operation(op: &str) -> Colour {
    match op {
        "record_added" | "zone_added" => Colour::Green,
        "record_deleted" | "zone_deleted" => Colour::Red,
        "record_reviewed" | "zone_updated" => Colour::Yellow,
        "presence" | "track" => Colour::Cyan,
        "migration_applied" => Colour::Purple,
        "init" => Colour::RGB(255, 153, 51),
        _ => Colour::White,
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(3)).collect();
    out.push_str("...");
    out
}

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if !matches!(cmd, Commands::Log { print: true }) {
        info("Use `log --print` to show the internal log.");
        return Ok(());
    }

    let pool = DbPool::open_initialized(&cfg.database)?;
    let entries = load_log(&pool.conn)?;
    if entries.is_empty() {
        info("The internal log is empty.");
        return Ok(());
    }

    let id_w = entries.iter().map(|e| e.id.to_string().len()).max().unwrap_or(1);

    header("Internal log");
    for e in &entries {
        let date = chrono::DateTime::parse_from_rfc3339(&e.date)
            .map(|dt| dt.format("%F %T").to_string())
            .unwrap_or_else(|_| e.date.clone());

        let op_target = if e.target.is_empty() {
            e.operation.clone()
        } else {
            format!("{} ({})", e.operation, truncate(&e.target, TARGET_WIDTH))
        };
        // pad on the visible text, then colour only the operation name
        let padded = format!("{op_target:<w$}", w = TARGET_WIDTH + 20);
        let coloured = padded.replacen(
            &e.operation,
            &color_for_operation(&e.operation).paint(e.operation.as_str()).to_string(),
            1,
        );

        println!("{:>id_w$}: {date} | {coloured} => {}", e.id, e.message);
    }
    Ok(())
}
