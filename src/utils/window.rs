use alloc::boxed::Box;

/// A fixed-size circular buffer holding the most recent `period` samples of a series.
///
/// Once the window has been filled, every new sample evicts the oldest one,
/// which is handed back to the caller so running aggregates can be adjusted.
#[derive(Debug, Clone)]
pub struct Window<T> {
    /// Backing storage
    buf: Box<[T]>,
    /// Slot the next sample is written to
    pos: usize,
    /// Number of samples currently held
    len: usize,
}

impl<T: Default + Copy> Window<T> {
    /// Creates a new window with the specified period
    ///
    /// # Panics
    ///
    /// If `period` is zero. Callers validate window sizes before building one.
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "period can not be zero");

        Self {
            buf: vec![T::default(); period].into_boxed_slice(),
            pos: 0,
            len: 0,
        }
    }

    /// Returns the capacity of the window
    #[inline]
    pub fn period(&self) -> usize {
        self.buf.len()
    }

    /// Returns `true` once the window holds `period` samples
    #[inline]
    pub fn is_full(&self) -> bool {
        self.len == self.period()
    }

    /// Pushes a sample into the window
    ///
    /// # Arguments
    ///
    /// * `value` - The sample to push
    ///
    /// # Returns
    ///
    /// * `Option<T>` - The evicted sample, `None` while the window is filling up
    pub fn next(&mut self, value: T) -> Option<T> {
        let full = self.is_full();
        let prev = core::mem::replace(&mut self.buf[self.pos], value);
        self.pos = (self.pos + 1) % self.period();

        if full {
            Some(prev)
        } else {
            self.len += 1;
            None
        }
    }
}
