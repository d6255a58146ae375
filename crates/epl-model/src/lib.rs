//! Shared types for the EPL ETL pipeline.
//!
//! - **scalar**: the scalar type vocabulary used by casts and type checks
//! - **fill**: the default value used when filling missing cells
//! - **table_ref**: validated `schema.table` destinations for bulk loads
//! - **keys**: archive storage keys, load destinations and output schemas
//! - **values**: text views of polars cells

pub mod error;
pub mod fill;
pub mod keys;
pub mod scalar;
pub mod table_ref;
pub mod values;

pub use error::{ModelError, Result};
pub use fill::FillValue;
pub use keys::{
    DEFAULT_SCHEMA, PLAYER_COLUMNS, PLAYERS_DESTINATION, PLAYERS_TABLE, TEAM_ID_COLUMN,
    TEAMS_DESTINATION, TEAMS_ENDPOINT, TEAMS_TABLE, player_archive_key, team_archive_key,
};
pub use scalar::{ScalarType, TypeCastSpec};
pub use table_ref::TableRef;
pub use values::{cell_text, format_numeric};
