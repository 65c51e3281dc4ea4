pub mod auto_approve;
pub mod config;
pub mod del;
pub mod export;
pub mod init;
pub mod list;
pub mod log;
pub mod record;
pub mod review;
pub mod stats;
pub mod track;
pub mod zone;
