/// Simulation clock advanced once per frame by the game host.
#[derive(Clone, Copy, Debug)]
pub struct WorldTime {
    pub elapsed: f32,
    pub delta: f32,
    pub time_scale: f32,
    pub frame: u64,
}

impl Default for WorldTime {
    fn default() -> Self {
        WorldTime {
            elapsed: 0.0,
            delta: 0.0,
            time_scale: 1.0,
            frame: 0,
        }
    }
}

impl WorldTime {
    /// Record one frame of `dt` real seconds and return the scaled delta.
    pub fn advance(&mut self, dt: f32) -> f32 {
        self.delta = dt * self.time_scale;
        self.elapsed += self.delta;
        self.frame += 1;
        self.delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_applies_time_scale() {
        let mut time = WorldTime {
            time_scale: 0.5,
            ..WorldTime::default()
        };
        assert_eq!(time.advance(1.0), 0.5);
        assert_eq!(time.advance(1.0), 0.5);
        assert_eq!(time.elapsed, 1.0);
        assert_eq!(time.frame, 2);
    }
}
