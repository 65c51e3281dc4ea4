pub mod coordinate;
pub mod position;
pub mod presence;
pub mod record;
pub mod record_type;
pub mod zone;
