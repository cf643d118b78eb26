use super::AngleFilter;
use crate::geometry::EulerAngles;

/// Median of a slice; even lengths average the two middle values.
///
/// The slice is reordered in place.
#[must_use]
pub fn median_in_place(values: &mut [f64]) -> f64 {
    values.sort_by(f64::total_cmp);

    let len = values.len();
    if len == 0 {
        0.0
    } else if len % 2 == 0 {
        (values[len / 2 - 1] + values[len / 2]) / 2.0
    } else {
        values[len / 2]
    }
}

/// Per-axis circular buffers of recent angles.
///
/// All three axes are written together, so one cursor and one wrap flag
/// serve the whole history.
#[derive(Debug, Clone)]
pub struct AngleHistory {
    capacity: usize,
    buffers: [Vec<f64>; 3],
    cursor: usize,
    wrapped: bool,
}

impl AngleHistory {
    /// Create an empty history
    ///
    /// # Panics
    ///
    /// Panics if capacity is zero
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "Window size must be greater than 0");
        Self {
            capacity,
            buffers: [
                Vec::with_capacity(capacity),
                Vec::with_capacity(capacity),
                Vec::with_capacity(capacity),
            ],
            cursor: 0,
            wrapped: false,
        }
    }

    /// Write one sample per axis, overwriting the oldest once full
    pub fn push(&mut self, angles: EulerAngles) {
        for (buffer, value) in self.buffers.iter_mut().zip(angles.as_array()) {
            if self.wrapped {
                buffer[self.cursor] = value;
            } else {
                buffer.push(value);
            }
        }
        self.cursor = (self.cursor + 1) % self.capacity;
        if self.cursor == 0 {
            self.wrapped = true;
        }
    }

    /// Median of the valid samples on each axis
    #[must_use]
    pub fn median(&self) -> EulerAngles {
        let mut scratch = Vec::with_capacity(self.capacity);
        let mut medians = [0.0; 3];
        for (median, buffer) in medians.iter_mut().zip(&self.buffers) {
            scratch.clear();
            scratch.extend_from_slice(&buffer[..self.len()]);
            *median = median_in_place(&mut scratch);
        }
        EulerAngles::from_array(medians)
    }

    /// Number of valid samples, `min(pushed, capacity)`
    #[must_use]
    pub fn len(&self) -> usize {
        if self.wrapped {
            self.capacity
        } else {
            self.cursor
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn has_wrapped(&self) -> bool {
        self.wrapped
    }

    pub fn clear(&mut self) {
        for buffer in &mut self.buffers {
            buffer.clear();
        }
        self.cursor = 0;
        self.wrapped = false;
    }
}

impl AngleFilter for AngleHistory {
    fn apply(&mut self, angles: EulerAngles) -> EulerAngles {
        self.push(angles);
        self.median()
    }

    fn reset(&mut self) {
        self.clear();
    }

    fn name(&self) -> &str {
        "MedianFilter"
    }
}
