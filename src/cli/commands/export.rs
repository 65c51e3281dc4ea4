use crate::cli::parser::Commands;
use crate::config::Config;
use crate::db::pool::DbPool;
use crate::errors::AppResult;
use crate::export::ExportLogic;
use crate::export::logic::ExportRequest;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Export {
        format,
        file,
        range,
        user,
        presence,
        force,
    } = cmd
    {
        let pool = DbPool::open_initialized(&cfg.database)?;
        let req = ExportRequest {
            period: range.clone(),
            user: user.clone(),
            presence: *presence,
        };
        ExportLogic::export(&pool, *format, file, &req, *force)?;
    }
    Ok(())
}
