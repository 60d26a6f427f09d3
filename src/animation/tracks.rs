use crate::animation::values::Interpolatable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterpolationMode {
    Linear,
    Step,
    CubicSpline,
}

/// How far a cursor scans linearly before falling back to binary search.
const MAX_SCAN_OFFSET: usize = 3;

/// Remembers the last keyframe interval a track was sampled in, so steady
/// playback finds the next interval in O(1).
#[derive(Debug, Clone, Default)]
pub struct KeyframeCursor {
    pub last_index: usize,
}

#[derive(Debug, Clone)]
pub struct KeyframeTrack<T: Interpolatable> {
    pub times: Vec<f32>,
    /// For `CubicSpline` this holds `[in_tangent, value, out_tangent]` per key.
    pub values: Vec<T>,
    pub interpolation: InterpolationMode,
}

impl<T: Interpolatable> KeyframeTrack<T> {
    #[must_use]
    pub fn new(times: Vec<f32>, values: Vec<T>, interpolation: InterpolationMode) -> Self {
        Self {
            times,
            values,
            interpolation,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Values expected per keyframe: three for cubic splines, one otherwise.
    #[must_use]
    pub fn values_per_key(&self) -> usize {
        match self.interpolation {
            InterpolationMode::CubicSpline => 3,
            _ => 1,
        }
    }

    /// Whether times and values line up: at least one key, one value slot
    /// per key, and times that never decrease.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        !self.times.is_empty()
            && self.values.len() == self.times.len() * self.values_per_key()
            && self.times.windows(2).all(|w| w[0] <= w[1])
    }

    /// Time of the final keyframe, or zero for an empty track.
    #[must_use]
    pub fn end_time(&self) -> f32 {
        self.times.last().copied().unwrap_or(0.0)
    }

    /// Stateless sampling. Empty tracks yield `T::default()`.
    #[must_use]
    pub fn sample(&self, time: f32) -> T {
        if self.times.is_empty() {
            return T::default();
        }
        let next = self.times.partition_point(|&t| t <= time);
        self.sample_at_frame(next.saturating_sub(1), time)
    }

    /// Cursor-accelerated sampling used by the mixer every frame.
    pub fn sample_with_cursor(&self, time: f32, cursor: &mut KeyframeCursor) -> T {
        let len = self.times.len();
        match len {
            0 => return T::default(),
            1 => return self.value_at(0),
            _ => {}
        }

        let i = cursor.last_index.min(len - 1);
        let local = if time >= self.times[i] {
            // Forward: normal playback.
            (0..=MAX_SCAN_OFFSET).map(|o| i + o).find_map(|idx| {
                if idx >= len - 1 {
                    Some(len - 1)
                } else if time < self.times[idx + 1] {
                    Some(idx)
                } else {
                    None
                }
            })
        } else {
            // Backward: reverse playback or a wrapped loop.
            (0..=MAX_SCAN_OFFSET)
                .take_while(|&o| o <= i)
                .map(|o| i - o)
                .find(|&idx| time >= self.times[idx])
        };

        let index = local.unwrap_or_else(|| {
            self.times
                .partition_point(|&t| t <= time)
                .saturating_sub(1)
        });
        cursor.last_index = index;
        self.sample_at_frame(index, time)
    }

    /// Value at slot `i`; missing slots of a malformed track read as default.
    fn slot(&self, i: usize) -> T {
        self.values.get(i).copied().unwrap_or_default()
    }

    fn value_at(&self, index: usize) -> T {
        match self.interpolation {
            InterpolationMode::CubicSpline => self.slot(index * 3 + 1),
            _ => self.slot(index),
        }
    }

    fn sample_at_frame(&self, index: usize, time: f32) -> T {
        let len = self.times.len();
        if index >= len - 1 {
            return self.value_at(len - 1);
        }

        let next = index + 1;
        let t0 = self.times[index];
        let dt = self.times[next] - t0;
        let t = if dt > 1e-6 { ((time - t0) / dt).clamp(0.0, 1.0) } else { 0.0 };

        match self.interpolation {
            InterpolationMode::Step => self.value_at(index),
            InterpolationMode::Linear => T::interpolate_linear(self.value_at(index), self.value_at(next), t),
            InterpolationMode::CubicSpline => {
                let a = index * 3;
                let b = next * 3;
                T::interpolate_cubic(self.slot(a + 1), self.slot(a + 2), self.slot(b), self.slot(b + 1), t, dt)
            }
        }
    }
}
