use crate::cli::context::{AppContext, now};
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::stats::{AttendanceStats, recompute};
use crate::errors::AppResult;
use crate::ui::messages::header;
use crate::utils::colors::{RED, RESET, YELLOW, colorize_optional};
use crate::utils::time::parse_optional_datetime;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Stats { user, as_of } = cmd {
        let as_of = parse_optional_datetime(as_of.as_ref())?.unwrap_or_else(now);
        let recorder = AppContext::open(cfg)?.into_recorder(cfg, as_of)?;

        let stats = match user {
            Some(u) => recompute(&recorder.records_for(u), as_of, recorder.policy()),
            None => recorder.stats(),
        };

        let scope = user.as_deref().unwrap_or("all users");
        header(format!(
            "Attendance statistics ({scope}, as of {})",
            as_of.format("%Y-%m-%d %H:%M")
        ));
        print_stats(&stats, cfg);
    }
    Ok(())
}

fn print_stats(s: &AttendanceStats, cfg: &Config) {
    println!("Total records       : {}", s.total);
    println!("Today               : {}", s.today);
    println!("This week           : {}", s.this_week);
    println!("This month          : {}", s.this_month);
    println!("Pending review      : {YELLOW}{}{RESET}", s.pending_review);
    println!("Average check-in    : {}", colorize_optional(&s.average_check_in));
    println!("Average check-out   : {}", colorize_optional(&s.average_check_out));
    println!(
        "Late check-ins      : {RED}{}{RESET} (after {})",
        s.late_check_ins, cfg.late_after
    );
    println!(
        "Early check-outs    : {RED}{}{RESET} (before {})",
        s.early_check_outs, cfg.early_before
    );

    if !s.by_type.is_empty() {
        println!("By type:");
        for (rt, n) in &s.by_type {
            println!("  {:<18}: {n}", rt.to_db_str());
        }
    }
}
