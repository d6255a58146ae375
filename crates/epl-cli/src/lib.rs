//! Library side of the `epl-etl` runner: logging setup and run orchestration.

pub mod logging;
pub mod pipeline;
pub mod types;
