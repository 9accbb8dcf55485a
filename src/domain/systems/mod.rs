// Pure simulation systems over domain state.

pub mod combat;
pub mod enemies;
pub mod movement;
pub mod projectiles;
