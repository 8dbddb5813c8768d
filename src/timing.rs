use embedded_hal::delay::DelayNs;

/// Delays plus a scoped timing-critical section.
pub trait TimingSource {
    fn delay_us(&mut self, us: u32);

    fn delay_ms(&mut self, ms: u32);

    /// Runs `f` with preemption suppressed, restoring it when `f` returns.
    ///
    /// Everything inside must be bounded to tens of microseconds.
    fn critical_section<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R;
}

/// [`TimingSource`] over an embedded-hal delay, masking preemption through
/// the `critical-section` implementation the platform provides.
pub struct Timing<D> {
    delay: D,
}

impl<D: DelayNs> Timing<D> {
    pub fn new(delay: D) -> Self {
        Timing { delay }
    }

    pub fn into_inner(self) -> D {
        self.delay
    }
}

impl<D: DelayNs> TimingSource for Timing<D> {
    #[inline(always)]
    fn delay_us(&mut self, us: u32) {
        self.delay.delay_us(us);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delay.delay_ms(ms);
    }

    fn critical_section<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        critical_section::with(|_| f(self))
    }
}
