pub mod config;
pub mod history;
pub mod pattern;
pub mod remind;
pub mod session;
