pub mod config;
pub mod prefs;
pub mod quality;
pub mod state;
pub mod station;
pub mod telemetry;
