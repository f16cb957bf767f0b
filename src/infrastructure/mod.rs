//! Infrastructure layer module
//!
//! Process-wide concerns that are not part of the risk domain.

pub mod monitoring;
