/*
[INPUT]:  zero2hero-rewards client core
[OUTPUT]: Configuration, service wiring and the terminal presentation layer
[POS]:    Library root for the zero2hero binary
[UPDATE]: When adding a top-level module
*/

pub mod config;
pub mod services;
pub mod tui;

pub use config::AppConfig;
pub use services::ClientServices;
