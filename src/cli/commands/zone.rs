use crate::cli::context::{AppContext, parse_coordinate};
use crate::cli::parser::{Commands, ZoneCommand};
use crate::config::Config;
use crate::db::log::ttlog_quiet;
use crate::db::queries::{delete_zone, save_zone};
use crate::errors::{AppError, AppResult};
use crate::models::record_type::RecordType;
use crate::models::zone::{WorkingHours, Zone, ZoneDraft, ZonePatch};
use crate::ui::messages::{info, success, warning};
use crate::utils::colors::{GREEN, GREY, RESET};
use crate::utils::table::Table;
use crate::utils::time::parse_window;
use std::collections::BTreeSet;

fn parse_types(s: &str) -> AppResult<BTreeSet<RecordType>> {
    RecordType::parse_list(s).map_err(AppError::InvalidRecordType)
}

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    let Commands::Zone { action } = cmd else {
        return Ok(());
    };
    let ctx = AppContext::open(cfg)?;

    match action {
        ZoneCommand::Add {
            name,
            center,
            radius,
            hours,
            days,
            types,
            inactive,
        } => {
            let (start, end) = parse_window(hours)?;
            let draft = ZoneDraft {
                name: name.trim().to_string(),
                center: parse_coordinate(center)?,
                radius_meters: *radius,
                is_active: !inactive,
                permitted_record_types: parse_types(types)?,
                working_hours: WorkingHours::new(start, end, WorkingHours::parse_days(days)?),
            };

            let id = ctx.registry.create(draft)?;
            let zone = ctx.registry.get(id).ok_or(AppError::ZoneNotFound(id))?;
            save_zone(&ctx.pool.conn, &zone)?;
            ttlog_quiet(&ctx.pool.conn, "zone_added", &id.to_string(), &zone.name);
            success(format!("Zone #{id} '{}' created.", zone.name));
        }

        ZoneCommand::Edit {
            id,
            name,
            center,
            radius,
            hours,
            days,
            types,
            activate,
            deactivate,
        } => {
            let current = ctx.registry.get(*id).ok_or(AppError::ZoneNotFound(*id))?;

            let working_hours = if hours.is_some() || days.is_some() {
                let (start, end) = match hours {
                    Some(h) => parse_window(h)?,
                    None => (current.working_hours.start, current.working_hours.end),
                };
                let days = match days {
                    Some(d) => WorkingHours::parse_days(d)?,
                    None => current.working_hours.days.clone(),
                };
                Some(WorkingHours::new(start, end, days))
            } else {
                None
            };

            let patch = ZonePatch {
                name: name.as_ref().map(|n| n.trim().to_string()),
                center: center.as_deref().map(parse_coordinate).transpose()?,
                radius_meters: *radius,
                is_active: match (activate, deactivate) {
                    (true, _) => Some(true),
                    (_, true) => Some(false),
                    _ => None,
                },
                permitted_record_types: types.as_deref().map(parse_types).transpose()?,
                working_hours,
            };

            if patch.is_empty() {
                warning("Nothing to change.");
                return Ok(());
            }

            let zone = ctx.registry.update(*id, patch)?;
            save_zone(&ctx.pool.conn, &zone)?;
            ttlog_quiet(&ctx.pool.conn, "zone_updated", &id.to_string(), &zone.name);
            success(format!("Zone #{id} updated."));
            print_zone(&zone);
        }

        ZoneCommand::Del { id } => {
            let zone = ctx.registry.delete(*id)?;
            delete_zone(&ctx.pool.conn, *id)?;
            ttlog_quiet(&ctx.pool.conn, "zone_deleted", &id.to_string(), &zone.name);
            success(format!("Zone #{id} '{}' deleted.", zone.name));
        }

        ZoneCommand::List { active } => {
            let zones = if *active {
                ctx.registry.list_active()
            } else {
                ctx.registry.list()
            };
            if zones.is_empty() {
                info("No zones defined.");
                return Ok(());
            }
            print_table(&zones);
        }

        ZoneCommand::Show { id } => {
            let zone = ctx.registry.get(*id).ok_or(AppError::ZoneNotFound(*id))?;
            print_zone(&zone);
        }

        ZoneCommand::Locate { at } => {
            let point = parse_coordinate(at)?;
            let containing = ctx.registry.find_containing(point);
            if containing.is_empty() {
                warning(format!("{point} is outside every active zone."));
                return Ok(());
            }
            for z in &containing {
                println!(
                    "#{:<4} {:<20} {:>8.1} m (radius {:.0} m)",
                    z.id,
                    z.name,
                    z.distance_to(point),
                    z.radius_meters
                );
            }
            if let Some((nearest, d)) = ctx.registry.find_nearest(point) {
                success(format!("Nearest: #{} '{}' at {d:.1} m", nearest.id, nearest.name));
            }
        }
    }

    Ok(())
}

fn active_label(zone: &Zone) -> String {
    if zone.is_active {
        format!("{GREEN}active{RESET}")
    } else {
        format!("{GREY}inactive{RESET}")
    }
}

fn print_table(zones: &[Zone]) {
    let mut table = Table::new(["ID", "NAME", "CENTER", "RADIUS", "STATUS", "HOURS", "TYPES"]);
    for z in zones {
        table.add_row(vec![
            z.id.to_string(),
            z.name.clone(),
            z.center.to_string(),
            format!("{:.0} m", z.radius_meters),
            active_label(z),
            z.working_hours.describe(),
            RecordType::join_db(&z.permitted_record_types),
        ]);
    }
    print!("{}", table.render());
}

fn print_zone(zone: &Zone) {
    println!("Zone #{} {}", zone.id, zone.name);
    println!("  center : {}", zone.center);
    println!("  radius : {:.1} m", zone.radius_meters);
    println!("  status : {}", active_label(zone));
    println!("  hours  : {}", zone.working_hours.describe());
    println!("  types  : {}", RecordType::join_db(&zone.permitted_record_types));
}
