use crate::export::ExportFormat;
use clap::{Parser, Subcommand};

/// Command-line interface definition for rGeoAttend
#[derive(Parser)]
#[command(
    name = "rgeoattend",
    version = env!("CARGO_PKG_VERSION"),
    about = "Geofence presence detection and attendance recording backed by SQLite",
    long_about = None
)]
pub struct Cli {
    /// Override database path (useful for tests or custom DB)
    #[arg(global = true, long = "db")]
    pub db: Option<String>,

    /// Run in test mode (no config file update)
    #[arg(global = true, long = "test", hide = true)]
    pub test: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database and configuration
    Init,

    /// Manage the configuration file (view or edit)
    Config {
        #[arg(long = "print", help = "Print the current configuration file")]
        print_config: bool,

        #[arg(
            long = "edit",
            help = "Edit the configuration file (default editor: $EDITOR, or nano/notepad)"
        )]
        edit_config: bool,

        #[arg(
            long = "editor",
            help = "Specify the editor to use (vim, nano, or custom path)"
        )]
        editor: Option<String>,
    },

    /// Manage geofence zones
    Zone {
        #[command(subcommand)]
        action: ZoneCommand,
    },

    /// Request an attendance record at a position
    Record {
        /// Record type: check_in, check_out, break_start, break_end,
        /// overtime_start, overtime_end (or in/out)
        record_type: String,

        /// Position as "lat,lon"
        #[arg(long, allow_hyphen_values = true)]
        at: String,

        /// Reported accuracy in meters
        #[arg(long, default_value_t = 0.0)]
        accuracy: f64,

        /// User id (defaults to `default_user` from the configuration)
        #[arg(long)]
        user: Option<String>,

        /// Record against this zone instead of the nearest containing one
        #[arg(long)]
        zone: Option<i64>,

        /// Timestamp "YYYY-MM-DD HH:MM" (default: now)
        #[arg(long)]
        time: Option<String>,

        /// Reference to a photo taken with the record
        #[arg(long)]
        photo: Option<String>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Approve or reject a pending record
    Review {
        /// Record id
        id: i64,

        /// approve | reject
        status: String,

        /// Reviewer note stored with the decision
        #[arg(long)]
        note: Option<String>,
    },

    /// Auto-approve pending records whose accuracy is within a bound
    AutoApprove {
        /// Maximum accuracy in meters (default: `auto_approve_max_accuracy` from the configuration)
        #[arg(long)]
        max_accuracy: Option<f64>,
    },

    /// Delete an attendance record
    Del {
        /// Record id
        id: i64,

        /// Do not ask for confirmation
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// List attendance records
    List {
        /// Filter by year/month/day or a custom range (YYYY, YYYY-MM, YYYY-MM-DD, or FROM:TO)
        #[arg(long, short)]
        period: Option<String>,

        #[arg(long)]
        user: Option<String>,

        /// Filter by review status (pending, approved, rejected, auto_approved)
        #[arg(long)]
        status: Option<String>,

        /// Filter by record type
        #[arg(long = "type")]
        record_type: Option<String>,

        /// List presence events instead of attendance records
        #[arg(long)]
        presence: bool,
    },

    /// Show attendance statistics
    Stats {
        /// Restrict to one user
        #[arg(long)]
        user: Option<String>,

        /// Reference time for today/week/month, "YYYY-MM-DD HH:MM" (default: now)
        #[arg(long = "as-of")]
        as_of: Option<String>,
    },

    /// Replay a JSON-lines position log through the presence tracker
    Track {
        /// File with one position sample per line
        #[arg(long)]
        file: String,

        #[arg(long)]
        user: Option<String>,

        /// Delay between samples in milliseconds
        #[arg(long = "pace-ms", default_value_t = 0)]
        pace_ms: u64,
    },

    /// Print or manage the internal log table
    Log {
        #[arg(long = "print", help = "Print rows from the internal log table")]
        print: bool,
    },

    /// Export attendance records or presence events
    Export {
        #[arg(long, value_enum, default_value_t = ExportFormat::Csv)]
        format: ExportFormat,

        /// Output file path (absolute path required)
        #[arg(long, value_name = "FILE")]
        file: String,

        /// Filter by year/month/day or a custom range; "all" exports everything
        #[arg(long, value_name = "RANGE")]
        range: Option<String>,

        #[arg(long)]
        user: Option<String>,

        /// Export presence events instead of attendance records
        #[arg(long)]
        presence: bool,

        /// Overwrite output file without confirmation
        #[arg(long, short = 'f')]
        force: bool,
    },
}

#[derive(Subcommand)]
pub enum ZoneCommand {
    /// Create a zone
    Add {
        name: String,

        /// Center as "lat,lon"
        #[arg(long, allow_hyphen_values = true)]
        center: String,

        /// Radius in meters
        #[arg(long)]
        radius: f64,

        /// Working window "HH:MM-HH:MM"
        #[arg(long, default_value = "08:00-18:00")]
        hours: String,

        /// Working days, e.g. "mon-fri", "mon,wed,fri", "1-5", "all"
        #[arg(long, default_value = "mon-fri")]
        days: String,

        /// Permitted record types, comma separated, or "all"
        #[arg(long, default_value = "all")]
        types: String,

        /// Create the zone deactivated
        #[arg(long)]
        inactive: bool,
    },

    /// Change fields of an existing zone
    Edit {
        id: i64,

        #[arg(long)]
        name: Option<String>,

        #[arg(long, allow_hyphen_values = true)]
        center: Option<String>,

        #[arg(long)]
        radius: Option<f64>,

        #[arg(long)]
        hours: Option<String>,

        #[arg(long)]
        days: Option<String>,

        #[arg(long)]
        types: Option<String>,

        #[arg(long, conflicts_with = "deactivate")]
        activate: bool,

        #[arg(long)]
        deactivate: bool,
    },

    /// Delete a zone
    Del { id: i64 },

    /// List zones
    List {
        /// Only active zones
        #[arg(long)]
        active: bool,
    },

    /// Show one zone
    Show { id: i64 },

    /// Show which active zones contain a position
    Locate {
        #[arg(long, allow_hyphen_values = true)]
        at: String,
    },
}
