use crate::domain::state::{SimProjectile, TargetPoint, TargetRef};
use crate::domain::systems::combat;
use crate::domain::systems::movement::ArenaBounds;
use crate::domain::tuning::projectile::ProjectileTuning;

/// Spawns a primary-fire projectile from the player toward the aim direction.
/// The direction is assumed normalized; spawn sits at the caster's edge.
pub fn spawn(
    projectiles: &mut Vec<SimProjectile>,
    next_id: &mut u64,
    x: f32,
    y: f32,
    dir_x: f32,
    dir_y: f32,
    caster_radius: f32,
    tuning: ProjectileTuning,
) {
    projectiles.push(SimProjectile {
        id: *next_id,
        x: x + dir_x * caster_radius,
        y: y + dir_y * caster_radius,
        vx: dir_x * tuning.speed,
        vy: dir_y * tuning.speed,
        ttl: tuning.life_time,
    });
    *next_id = next_id.wrapping_add(1);
}

/// Integrates projectile movement and expires them on TTL or out of bounds.
pub fn integrate(projectiles: &mut Vec<SimProjectile>, dt: f32, bounds: ArenaBounds) {
    for p in projectiles.iter_mut() {
        p.x += p.vx * dt;
        p.y += p.vy * dt;
        p.ttl -= dt;
        if !bounds.contains(p.x, p.y) {
            p.ttl = 0.0;
        }
    }
    projectiles.retain(|p| p.ttl > 0.0);
}

/// Projectile vs target collision (naive O(P*T)). Each projectile is consumed
/// by its first hit; the struck targets are returned for damage routing.
pub fn collide(
    projectiles: &mut Vec<SimProjectile>,
    targets: &[TargetPoint],
    projectile_radius: f32,
) -> Vec<TargetRef> {
    let mut hits = Vec::new();
    for p in projectiles.iter_mut() {
        if p.ttl <= 0.0 {
            continue;
        }
        for t in targets {
            if combat::circles_overlap(p.x, p.y, projectile_radius, t.x, t.y, t.radius) {
                hits.push(t.target);
                p.ttl = 0.0;
                break;
            }
        }
    }
    projectiles.retain(|p| p.ttl > 0.0);
    hits
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn when_ttl_expires_then_projectile_despawns() {
        let mut projectiles = Vec::new();
        let mut next_id = 1;
        spawn(
            &mut projectiles,
            &mut next_id,
            0.0,
            0.0,
            1.0,
            0.0,
            14.0,
            ProjectileTuning::default(),
        );
        assert_eq!(projectiles.len(), 1);
        integrate(&mut projectiles, 5.0, ArenaBounds::default());
        assert!(projectiles.is_empty());
    }

    #[test]
    fn when_projectile_overlaps_a_target_then_it_hits_once_and_despawns() {
        let mut projectiles = vec![SimProjectile {
            id: 1,
            x: 10.0,
            y: 0.0,
            vx: 0.0,
            vy: 0.0,
            ttl: 1.0,
        }];
        let targets = [
            TargetPoint {
                target: TargetRef::LocalEnemy(7),
                x: 12.0,
                y: 0.0,
                radius: 10.0,
            },
            TargetPoint {
                target: TargetRef::LocalEnemy(8),
                x: 14.0,
                y: 0.0,
                radius: 10.0,
            },
        ];
        let hits = collide(&mut projectiles, &targets, 5.0);
        assert_eq!(hits, vec![TargetRef::LocalEnemy(7)]);
        assert!(projectiles.is_empty());
    }
}
