#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PathMode {
    PingPong,
    Loop,
}

impl PathMode {
    fn from_level(mode: LevelPathMode) -> Self {
        match mode {
            LevelPathMode::PingPong => Self::PingPong,
            LevelPathMode::Loop => Self::Loop,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PathDirection {
    Forward,
    Reverse,
}

impl PathDirection {
    fn reversed(self) -> Self {
        match self {
            Self::Forward => Self::Reverse,
            Self::Reverse => Self::Forward,
        }
    }

    fn offset(self) -> isize {
        match self {
            Self::Forward => 1,
            Self::Reverse => -1,
        }
    }
}

/// Waypoint cursor shared by hazards, patrolling enemies and platforms.
///
/// The walker owns only the index, travel direction and dwell timer; the
/// points themselves stay with the owner so the same walker can be reset
/// without touching the path.
#[derive(Debug, Clone, Copy, PartialEq)]
struct PathWalker {
    point_count: usize,
    start_index: usize,
    mode: PathMode,
    index: usize,
    direction: PathDirection,
    wait_timer: f32,
}

impl PathWalker {
    fn new(point_count: usize, start_index: usize, mode: PathMode) -> Self {
        let start_index = clamp_start_index(start_index, point_count);
        Self {
            point_count,
            start_index,
            mode,
            index: start_index,
            direction: PathDirection::Forward,
            wait_timer: 0.0,
        }
    }

    #[cfg(test)]
    fn index(&self) -> usize {
        self.index
    }

    #[cfg(test)]
    fn start_index(&self) -> usize {
        self.start_index
    }

    #[cfg(test)]
    fn direction(&self) -> PathDirection {
        self.direction
    }

    #[cfg(test)]
    fn wait_timer(&self) -> f32 {
        self.wait_timer
    }

    fn has_points(&self) -> bool {
        self.point_count > 0
    }

    fn reset(&mut self) {
        self.index = self.start_index;
        self.direction = PathDirection::Forward;
        self.wait_timer = 0.0;
    }

    fn current_point(&self, points: &[Vec2]) -> Option<Vec2> {
        points.get(self.index).copied()
    }

    fn advance(&mut self) {
        if self.point_count <= 1 {
            return;
        }
        match self.mode {
            PathMode::PingPong => {
                let next = self.index as isize + self.direction.offset();
                if next < 0 || next >= self.point_count as isize {
                    self.direction = self.direction.reversed();
                }
                let next = self.index as isize + self.direction.offset();
                self.index = next.clamp(0, self.point_count as isize - 1) as usize;
            }
            PathMode::Loop => {
                self.index = (self.index + 1) % self.point_count;
            }
        }
    }

    /// Moves `position` toward the current point, dwelling on arrival for
    /// `wait_for(arrived_index)` seconds before heading to the next one.
    fn tick(
        &mut self,
        position: Vec2,
        points: &[Vec2],
        speed: f32,
        fixed_dt_seconds: f32,
        wait_for: impl Fn(usize) -> f32,
    ) -> Vec2 {
        let Some(target) = self.current_point(points) else {
            return position;
        };
        if self.wait_timer > 0.0 {
            self.wait_timer -= fixed_dt_seconds;
            return position;
        }

        let (next, arrived) = step_toward(
            position,
            target,
            speed,
            fixed_dt_seconds,
            PATH_ARRIVAL_THRESHOLD,
        );
        if arrived {
            self.wait_timer = wait_for(self.index).max(0.0);
            self.advance();
        }
        next
    }
}

fn clamp_start_index(start_index: usize, point_count: usize) -> usize {
    if point_count == 0 {
        0
    } else {
        start_index.min(point_count - 1)
    }
}
