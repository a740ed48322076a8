// ABOUTME: PostgreSQL access layer: connection lifecycle and catalog introspection
// ABOUTME: Everything that talks to the server lives under this module

pub mod connection;
pub mod schema;

pub use connection::connect;
