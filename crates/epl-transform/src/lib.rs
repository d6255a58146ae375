//! Table cleaning for the EPL pipeline.
//!
//! - **pipeline**: [`CleaningPipeline`], the chainable transformation vocabulary
//! - **datetime**: lenient date/time parsing used by the date conversions
//! - **numeric**: integer token extraction
//! - **recipes**: the team and player cleaning chains

pub mod datetime;
pub mod error;
pub mod numeric;
pub mod pipeline;
pub mod recipes;

pub use error::{Result, TransformError};
pub use pipeline::CleaningPipeline;
pub use recipes::{clean_players, clean_teams};
