use crate::domain::state::SimEnemy;
use crate::domain::systems::combat;
use crate::domain::systems::movement::ArenaBounds;
use crate::domain::tuning::enemy::CONTACT_INTERVAL;

/// Moves each living enemy toward the player at its own speed.
pub fn tick_enemies(enemies: &mut [SimEnemy], player_x: f32, player_y: f32, dt: f32, bounds: ArenaBounds) {
    for e in enemies.iter_mut() {
        let dx = player_x - e.x;
        let dy = player_y - e.y;
        let dist = (dx * dx + dy * dy).sqrt();
        if dist > f32::EPSILON {
            e.vx = dx / dist * e.speed;
            e.vy = dy / dist * e.speed;
        } else {
            e.vx = 0.0;
            e.vy = 0.0;
        }

        let (x, y) = bounds.clamp(e.x + e.vx * dt, e.y + e.vy * dt);
        e.x = x;
        e.y = y;

        e.contact_cooldown = (e.contact_cooldown - dt).max(0.0);
    }
}

/// Applies contact damage windows for enemies overlapping the player.
/// Returns the total damage dealt this frame.
pub fn contact_damage(enemies: &mut [SimEnemy], player_x: f32, player_y: f32, player_radius: f32) -> i32 {
    let mut total = 0;
    for e in enemies.iter_mut() {
        if e.contact_cooldown > 0.0 {
            continue;
        }
        if combat::circles_overlap(e.x, e.y, e.radius, player_x, player_y, player_radius) {
            total += e.contact_damage;
            e.contact_cooldown = CONTACT_INTERVAL;
        }
    }
    total
}
