// Interface adapters: client-side network plumbing.

pub mod client;

pub use client::{Connection, NetError, connect_and_join};
