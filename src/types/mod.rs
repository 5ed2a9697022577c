pub mod epa_record;
pub mod location;
pub mod measurement;
pub mod parameter;
pub mod station;
pub mod window;
