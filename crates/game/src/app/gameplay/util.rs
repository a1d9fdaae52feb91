fn step_toward(
    current: Vec2,
    target: Vec2,
    speed: f32,
    fixed_dt_seconds: f32,
    arrival_threshold: f32,
) -> (Vec2, bool) {
    let dx = target.x - current.x;
    let dy = target.y - current.y;
    let distance_sq = dx * dx + dy * dy;
    let threshold_sq = arrival_threshold * arrival_threshold;
    if distance_sq <= threshold_sq {
        return (target, true);
    }

    let distance = distance_sq.sqrt();
    let max_step = speed * fixed_dt_seconds;
    if max_step >= distance {
        return (target, true);
    }

    let inv_distance = distance.recip();
    (
        Vec2 {
            x: current.x + dx * inv_distance * max_step,
            y: current.y + dy * inv_distance * max_step,
        },
        false,
    )
}

fn wait_for_point(wait_overrides: &[f32], default_wait: f32, index: usize) -> f32 {
    wait_overrides
        .get(index)
        .copied()
        .filter(|wait| *wait > 0.0)
        .unwrap_or(default_wait)
}

/// Mirrors the sprite horizontally to face the direction of travel. Tiny
/// moves keep the current facing.
fn face_travel_direction(transform: &mut Transform, dx: f32) {
    if dx.abs() <= FLIP_EPSILON {
        return;
    }
    let magnitude = transform.scale.x.abs();
    transform.scale.x = if dx < 0.0 { -magnitude } else { magnitude };
}
