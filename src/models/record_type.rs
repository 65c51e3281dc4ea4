use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordType {
    CheckIn,
    CheckOut,
    BreakStart,
    BreakEnd,
    OvertimeStart,
    OvertimeEnd,
}

impl RecordType {
    pub const ALL: [RecordType; 6] = [
        RecordType::CheckIn,
        RecordType::CheckOut,
        RecordType::BreakStart,
        RecordType::BreakEnd,
        RecordType::OvertimeStart,
        RecordType::OvertimeEnd,
    ];

    /// Convert enum → DB string
    pub fn to_db_str(&self) -> &'static str {
        match self {
            RecordType::CheckIn => "check_in",
            RecordType::CheckOut => "check_out",
            RecordType::BreakStart => "break_start",
            RecordType::BreakEnd => "break_end",
            RecordType::OvertimeStart => "overtime_start",
            RecordType::OvertimeEnd => "overtime_end",
        }
    }

    /// Convert DB string → enum
    pub fn from_db_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.to_db_str() == s)
    }

    /// Lenient parser for CLI input: `check-in`, `CheckIn`, `in`, `check_in`...
    pub fn from_code(code: &str) -> Option<Self> {
        let norm: String = code
            .trim()
            .chars()
            .filter(|c| *c != '-' && *c != '_' && *c != ' ')
            .collect::<String>()
            .to_lowercase();

        match norm.as_str() {
            "checkin" | "in" => Some(RecordType::CheckIn),
            "checkout" | "out" => Some(RecordType::CheckOut),
            "breakstart" => Some(RecordType::BreakStart),
            "breakend" => Some(RecordType::BreakEnd),
            "overtimestart" => Some(RecordType::OvertimeStart),
            "overtimeend" => Some(RecordType::OvertimeEnd),
            _ => None,
        }
    }

    /// Parse a comma-separated list (`"check_in,check_out"`). `all` selects every type.
    /// Returns the first unrecognised token on failure.
    pub fn parse_list(s: &str) -> Result<BTreeSet<Self>, String> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(Self::ALL.into_iter().collect());
        }

        s.split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(|t| Self::from_code(t).ok_or_else(|| t.to_string()))
            .collect()
    }

    pub fn join_db(types: &BTreeSet<Self>) -> String {
        types
            .iter()
            .map(|t| t.to_db_str())
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn is_check_in(&self) -> bool {
        matches!(self, RecordType::CheckIn)
    }

    pub fn is_check_out(&self) -> bool {
        matches!(self, RecordType::CheckOut)
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_str())
    }
}
