// Use cases layer: the client-side reconciliation core.

pub mod ability;
pub mod damage;
pub mod director;
pub mod phase;
pub mod session;
pub mod snapshot;
pub mod types;

pub use types::{
    ClientCommand, EntityState, MatchMode, PhaseEvent, ServerEvent, WorldSnapshot,
};
