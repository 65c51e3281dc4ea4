use crate::cli::context::{AppContext, now};
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::ui::messages::{info, success, warning};
use std::io::{self, Write};

/// Ask a yes/no confirmation from the user
fn ask_confirmation(prompt: &str) -> bool {
    warning(prompt);
    print!("Confirm [y/N]: ");
    let _ = io::stdout().flush();

    let mut s = String::new();
    if io::stdin().read_line(&mut s).is_ok() {
        matches!(s.trim().to_lowercase().as_str(), "y" | "yes")
    } else {
        false
    }
}

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Del { id, yes } = cmd {
        let recorder = AppContext::open(cfg)?.into_recorder(cfg, now())?;
        let rec = recorder.get(*id).ok_or(AppError::RecordNotFound(*id))?;

        let prompt = format!(
            "Delete record #{} ({} of '{}' at {})? This action is irreversible.",
            rec.id,
            rec.record_type,
            rec.user_id,
            rec.occurred_at.format("%Y-%m-%d %H:%M")
        );
        if !yes && !ask_confirmation(&prompt) {
            info("Operation cancelled.");
            return Ok(());
        }

        recorder.delete(*id)?;
        success(format!("Record #{id} has been deleted."));
    }
    Ok(())
}
