//! Timing and profiling utilities.

use std::fmt;
use std::time::{Duration, Instant};

/// Smoothing factor of the exponential moving average (higher reacts faster).
const EMA_ALPHA: f32 = 0.3;

/// Measures the time taken by some operation, smoothed over repeated invocations.
pub struct Timer {
    name: &'static str,
    avg_ms: Option<f32>,
}

impl Timer {
    pub fn new(name: &'static str) -> Self {
        Self { name, avg_ms: None }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Invokes a closure, measuring the time it takes.
    pub fn time<T>(&mut self, f: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let result = f();
        self.record(start.elapsed());
        result
    }

    /// Starts a measurement that stops when the returned guard is dropped.
    pub fn start(&mut self) -> TimerGuard<'_> {
        TimerGuard {
            start: Instant::now(),
            timer: self,
        }
    }

    fn record(&mut self, duration: Duration) {
        let ms = duration.as_secs_f32() * 1000.0;
        self.avg_ms = Some(match self.avg_ms {
            None => ms,
            Some(avg) => avg + EMA_ALPHA * (ms - avg),
        });
    }
}

impl fmt::Display for Timer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.avg_ms {
            Some(ms) => write!(f, "{}: {:.01}ms", self.name, ms),
            None => write!(f, "{}: -", self.name),
        }
    }
}

impl fmt::Debug for Timer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Guard returned by [`Timer::start`]. Records the elapsed time when dropped.
pub struct TimerGuard<'a> {
    start: Instant,
    timer: &'a mut Timer,
}

impl Drop for TimerGuard<'_> {
    fn drop(&mut self) {
        self.timer.record(self.start.elapsed());
    }
}

/// Counts frames per second and periodically logs the rate along with a set of [`Timer`]s.
pub struct FpsCounter {
    name: String,
    frames: u32,
    start: Instant,
}

impl FpsCounter {
    pub fn new<N: Into<String>>(name: N) -> Self {
        Self {
            name: name.into(),
            frames: 0,
            start: Instant::now(),
        }
    }

    /// Advances the frame counter.
    pub fn tick(&mut self) {
        self.tick_with(std::iter::empty::<&Timer>());
    }

    /// Advances the frame counter and logs `timers` along with the frame rate once per second.
    pub fn tick_with<'a, T: IntoIterator<Item = &'a Timer>>(&mut self, timers: T) {
        self.frames += 1;

        let elapsed = self.start.elapsed();
        if elapsed >= Duration::from_secs(1) {
            let fps = self.frames as f32 / elapsed.as_secs_f32();
            let timings = timers
                .into_iter()
                .map(|t| t.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            if timings.is_empty() {
                log::debug!("{}: {:.01} FPS", self.name, fps);
            } else {
                log::debug!("{}: {:.01} FPS ({})", self.name, fps, timings);
            }

            self.frames = 0;
            self.start = Instant::now();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timer_records_average() {
        let mut timer = Timer::new("test");
        assert_eq!(timer.to_string(), "test: -");
        timer.record(Duration::from_millis(10));
        assert_eq!(timer.to_string(), "test: 10.0ms");
        // EMA moves towards new samples without jumping.
        timer.record(Duration::from_millis(20));
        let avg = timer.avg_ms.unwrap();
        assert!(avg > 10.0 && avg < 20.0);
    }
}
