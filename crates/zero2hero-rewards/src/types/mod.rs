/*
[INPUT]:  Data layer schema and identity provider payloads
[OUTPUT]: Typed Rust structs/enums with serialization support
[POS]:    Domain types shared by the gateway, poller and data layer
[UPDATE]: When schema.sql or provider payloads change
*/

pub mod enums;
pub mod models;

pub use enums::*;
pub use models::*;
