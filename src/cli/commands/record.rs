use crate::cli::context::{AppContext, now, parse_coordinate, resolve_user};
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::models::record::RecordRequest;
use crate::models::record_type::RecordType;
use crate::ui::messages::{info, success};
use crate::utils::time::parse_optional_datetime;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Record {
        record_type,
        at,
        accuracy,
        user,
        zone,
        time,
        photo,
        notes,
    } = cmd
    {
        let rt = RecordType::from_code(record_type)
            .ok_or_else(|| AppError::InvalidRecordType(record_type.clone()))?;
        let coordinate = parse_coordinate(at)?;
        if !accuracy.is_finite() || *accuracy < 0.0 {
            return Err(AppError::InvalidSample(format!("accuracy {accuracy}")));
        }
        let when = parse_optional_datetime(time.as_ref())?.unwrap_or_else(now);

        let mut request = RecordRequest::new(resolve_user(user, cfg), rt, coordinate, *accuracy);
        if let Some(z) = zone {
            request = request.with_zone(*z);
        }
        if let Some(p) = photo {
            request = request.with_photo(p.clone());
        }
        if let Some(n) = notes {
            request = request.with_notes(n.clone());
        }

        let recorder = AppContext::open(cfg)?.into_recorder(cfg, when)?;
        let rec = recorder.request_record(request, when)?;

        success(format!(
            "Record #{} {} for '{}' in zone #{} at {} ({}).",
            rec.id,
            rec.record_type,
            rec.user_id,
            rec.zone_id,
            rec.occurred_at.format("%Y-%m-%d %H:%M"),
            rec.review_status
        ));

        if let Some(max) = cfg.auto_approve_max_accuracy {
            if recorder.auto_approve_record(rec.id, max)?.is_some() {
                info(format!("Record #{} auto-approved (accuracy within {max} m).", rec.id));
            }
        }
    }
    Ok(())
}
