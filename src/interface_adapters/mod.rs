// Interface adapters: wire protocol and network handling.

pub mod clients;
pub mod net;
pub mod presentation;
pub mod protocol;
