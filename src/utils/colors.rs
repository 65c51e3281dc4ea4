//! ANSI colour helpers for list output.

use crate::models::record::ReviewStatus;
use crate::models::record_type::RecordType;

pub const RESET: &str = "\x1b[0m";
pub const GREY: &str = "\x1b[90m";
pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";
pub const CYAN: &str = "\x1b[36m";

pub fn color_for_status(status: ReviewStatus) -> &'static str {
    match status {
        ReviewStatus::Pending => YELLOW,
        ReviewStatus::Approved | ReviewStatus::AutoApproved => GREEN,
        ReviewStatus::Rejected => RED,
    }
}

pub fn colorize_status(status: ReviewStatus) -> String {
    format!("{}{}{}", color_for_status(status), status, RESET)
}

/// Check-ins green, check-outs red, everything else cyan.
pub fn colorize_record_type(rt: RecordType) -> String {
    let color = if rt.is_check_in() {
        GREEN
    } else if rt.is_check_out() {
        RED
    } else {
        CYAN
    };
    format!("{color}{rt}{RESET}")
}

/// Grey out empty values and the `--:--` placeholder.
pub fn colorize_optional(value: &str) -> String {
    if value.trim().is_empty() || value.trim() == "--:--" || value.trim() == "-" {
        format!("{GREY}{value}{RESET}")
    } else {
        value.to_string()
    }
}
