//! Grouped usage summaries over the bike sharing daily and hourly tables.
//!
//! Data flows one way: [`loader`] parses the CSV files, [`filter`] narrows
//! them by season, year and weather, [`aggregate`], [`classify`] and
//! [`metrics`] derive the summaries, and [`insights`] composes all of it
//! into a plain-data [`insights::DashboardView`] for any renderer.

pub mod aggregate;
pub mod assess;
pub mod cache;
pub mod classify;
pub mod error;
pub mod filter;
pub mod insights;
pub mod loader;
pub mod metrics;
pub mod models;
pub mod report;
