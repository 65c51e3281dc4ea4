use crate::cli::context::AppContext;
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::db::queries::{load_presence_events, load_records};
use crate::errors::{AppError, AppResult};
use crate::models::presence::PresenceEventType;
use crate::models::record::ReviewStatus;
use crate::models::record_type::RecordType;
use crate::ui::messages::info;
use crate::utils::colors::{
    GREEN, RESET, YELLOW, colorize_optional, colorize_record_type, colorize_status,
};
use crate::utils::date::parse_period;
use crate::utils::table::Table;
use chrono::NaiveDateTime;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::List {
        period,
        user,
        status,
        record_type,
        presence,
    } = cmd
    {
        let ctx = AppContext::open(cfg)?;

        let bounds = match period.as_deref() {
            None => None,
            Some(p) if p.eq_ignore_ascii_case("all") => None,
            Some(p) => Some(parse_period(p)?),
        };
        let in_range =
            |at: NaiveDateTime| bounds.is_none_or(|(start, end)| at >= start && at < end);

        if *presence {
            let events: Vec<_> = load_presence_events(&ctx.pool.conn, user.as_deref())?
                .into_iter()
                .filter(|e| in_range(e.occurred_at))
                .collect();
            if events.is_empty() {
                info("No presence events found.");
                return Ok(());
            }

            let mut table = Table::new(["ID", "USER", "ZONE", "EVENT", "AT", "POSITION"]);
            for e in &events {
                let color = match e.event_type {
                    PresenceEventType::Enter => GREEN,
                    PresenceEventType::Exit => YELLOW,
                };
                table.add_row(vec![
                    e.id.to_string(),
                    e.user_id.clone(),
                    zone_label(&ctx, e.zone_id),
                    format!("{color}{}{RESET}", e.event_type),
                    e.occurred_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                    e.coordinate.to_string(),
                ]);
            }
            print!("{}", table.render());
            return Ok(());
        }

        let status = status
            .as_deref()
            .map(|s| {
                ReviewStatus::from_code(s)
                    .ok_or_else(|| AppError::InvalidReviewStatus(s.to_string()))
            })
            .transpose()?;
        let rt = record_type
            .as_deref()
            .map(|s| {
                RecordType::from_code(s).ok_or_else(|| AppError::InvalidRecordType(s.to_string()))
            })
            .transpose()?;

        let records: Vec<_> = load_records(&ctx.pool.conn)?
            .into_iter()
            .filter(|r| user.as_deref().is_none_or(|u| r.user_id == u))
            .filter(|r| status.is_none_or(|s| r.review_status == s))
            .filter(|r| rt.is_none_or(|t| r.record_type == t))
            .filter(|r| in_range(r.occurred_at))
            .collect();

        if records.is_empty() {
            info("No attendance records found.");
            return Ok(());
        }

        let mut table = Table::new([
            "ID", "USER", "TYPE", "AT", "ZONE", "ACC", "STATUS", "NOTES",
        ]);
        for r in &records {
            table.add_row(vec![
                r.id.to_string(),
                r.user_id.clone(),
                colorize_record_type(r.record_type),
                r.occurred_at.format("%Y-%m-%d %H:%M").to_string(),
                zone_label(&ctx, r.zone_id),
                format!("{:.0} m", r.accuracy),
                colorize_status(r.review_status),
                colorize_optional(r.notes.as_deref().unwrap_or("-")),
            ]);
        }
        print!("{}", table.render());
        info(format!("{} record(s)", records.len()));
    }
    Ok(())
}

fn zone_label(ctx: &AppContext, zone_id: i64) -> String {
    match ctx.registry.get(zone_id) {
        Some(z) => format!("#{} {}", z.id, z.name),
        None => format!("#{zone_id} (deleted)"),
    }
}
