use crate::cli::context::{AppContext, now};
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::models::record::ReviewStatus;
use crate::ui::messages::success;
use crate::utils::colors::colorize_status;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Review { id, status, note } = cmd {
        let target = ReviewStatus::from_code(status)
            .ok_or_else(|| AppError::InvalidReviewStatus(status.clone()))?;

        let recorder = AppContext::open(cfg)?.into_recorder(cfg, now())?;
        let rec = recorder.set_review_status(*id, target, note.clone())?;

        success(format!("Record #{} is now {}.", rec.id, colorize_status(rec.review_status)));
    }
    Ok(())
}
