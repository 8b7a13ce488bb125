//! Database client for users, refresh sessions, and the token blacklist.

mod client;

pub use client::DbClient;
