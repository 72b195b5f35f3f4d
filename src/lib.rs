//! Attendance check-in for a martial arts club
//!
//! Members check in to classes at most once per day, coaches can correct or add records, and the
//! monthly attended-session count is derived from the stored records. Storage, member profiles
//! and the clock are ports, so the logic in [`commands`] runs against any backend.

pub mod adapters;
pub mod commands;
pub mod config;
pub mod domain;
pub mod ports;
pub mod telemetry;
