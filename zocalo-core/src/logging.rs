// Logging re-exports so framework modules share one set of macros

pub use zocalo_log::*;
