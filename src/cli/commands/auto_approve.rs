use crate::cli::context::{AppContext, now};
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::ui::messages::{info, success};

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::AutoApprove { max_accuracy } = cmd {
        let max = max_accuracy.or(cfg.auto_approve_max_accuracy).ok_or_else(|| {
            AppError::Config(
                "no accuracy bound: pass --max-accuracy or set auto_approve_max_accuracy".into(),
            )
        })?;

        let recorder = AppContext::open(cfg)?.into_recorder(cfg, now())?;
        let ids = recorder.auto_approve(max)?;

        if ids.is_empty() {
            info(format!("No pending records within {max} m."));
        } else {
            let list = ids.iter().map(|i| format!("#{i}")).collect::<Vec<_>>().join(", ");
            success(format!("Auto-approved {} record(s): {list}", ids.len()));
        }
    }
    Ok(())
}
