pub mod common;
pub mod extract;
pub mod fetch;
pub mod identifiers;
pub mod logging;
pub mod ranking;
pub mod source;
