//! The capture/annotate/display loop.
//!
//! The loop is written against small traits instead of the concrete webcam and GUI types so that
//! its termination and skip behavior can be tested without hardware.

use crate::{image::Image, timer::FpsCounter};

/// Produces the frames the loop processes.
pub trait FrameSource {
    /// Reads the next frame, blocking until one is available.
    ///
    /// `Ok(None)` signals a transient failure (e.g. a corrupt webcam frame); the loop logs and
    /// skips the iteration. `Err` is irrecoverable and ends the loop.
    fn read_frame(&mut self) -> anyhow::Result<Option<Image>>;
}

/// Processes a frame before it is displayed.
pub trait Annotator {
    fn annotate(&mut self, frame: &mut Image);
}

/// Displays annotated frames and reports quit requests.
pub trait FrameSink {
    fn show(&mut self, frame: &Image);

    /// Whether the user asked to quit. Polled once at the top of every loop iteration.
    fn quit_requested(&self) -> bool;
}

/// Runs the frame loop until the sink requests termination or the source fails.
///
/// Each iteration checks for a quit request first, then reads, annotates, and shows one frame, so
/// a quit request raised after N frames stops the loop with exactly N frames shown. All resources
/// stay owned by the caller, to be released exactly once when they go out of scope.
pub fn run<S, A, K>(source: &mut S, annotator: &mut A, sink: &mut K) -> anyhow::Result<()>
where
    S: FrameSource,
    A: Annotator,
    K: FrameSink,
{
    let mut fps = FpsCounter::new("viewer");
    loop {
        if sink.quit_requested() {
            log::info!("quit requested, leaving frame loop");
            return Ok(());
        }

        let mut frame = match source.read_frame()? {
            Some(frame) => frame,
            None => {
                log::warn!("failed to read frame, skipping");
                continue;
            }
        };

        annotator.annotate(&mut frame);
        sink.show(&frame);
        fps.tick();
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, rc::Rc};

    use crate::image::Resolution;

    use super::*;

    struct TestSource {
        /// `false` entries simulate a failed read.
        reads: Vec<bool>,
        pos: usize,
        drops: Rc<Cell<u32>>,
    }

    impl TestSource {
        fn ok(drops: &Rc<Cell<u32>>) -> Self {
            Self {
                reads: Vec::new(),
                pos: 0,
                drops: drops.clone(),
            }
        }

        fn frame() -> Image {
            let data = (0..4 * 4 * 4).map(|i| i as u8).collect::<Vec<_>>();
            Image::from_rgba8(Resolution::new(4, 4), &data)
        }
    }

    impl FrameSource for TestSource {
        fn read_frame(&mut self) -> anyhow::Result<Option<Image>> {
            let ok = self.reads.get(self.pos).copied().unwrap_or(true);
            self.pos += 1;
            Ok(ok.then(Self::frame))
        }
    }

    impl Drop for TestSource {
        fn drop(&mut self) {
            self.drops.set(self.drops.get() + 1);
        }
    }

    struct NoopAnnotator;

    impl Annotator for NoopAnnotator {
        fn annotate(&mut self, _frame: &mut Image) {}
    }

    struct TestSink {
        shown: u32,
        quit_after: u32,
        last_frame: Option<Image>,
        drops: Rc<Cell<u32>>,
    }

    impl TestSink {
        fn new(quit_after: u32, drops: &Rc<Cell<u32>>) -> Self {
            Self {
                shown: 0,
                quit_after,
                last_frame: None,
                drops: drops.clone(),
            }
        }
    }

    impl FrameSink for TestSink {
        fn show(&mut self, frame: &Image) {
            self.shown += 1;
            self.last_frame = Some(frame.clone());
        }

        fn quit_requested(&self) -> bool {
            self.shown >= self.quit_after
        }
    }

    impl Drop for TestSink {
        fn drop(&mut self) {
            self.drops.set(self.drops.get() + 1);
        }
    }

    #[test]
    fn shows_exactly_n_frames_before_quit() {
        let source_drops = Rc::new(Cell::new(0));
        let sink_drops = Rc::new(Cell::new(0));
        {
            let mut source = TestSource::ok(&source_drops);
            let mut sink = TestSink::new(5, &sink_drops);
            run(&mut source, &mut NoopAnnotator, &mut sink).unwrap();
            assert_eq!(sink.shown, 5);
        }
        assert_eq!(source_drops.get(), 1);
        assert_eq!(sink_drops.get(), 1);
    }

    #[test]
    fn failed_reads_are_skipped_without_display() {
        let drops = Rc::new(Cell::new(0));
        let mut source = TestSource::ok(&drops);
        source.reads = vec![true, false, false, true, true];
        let mut sink = TestSink::new(3, &drops);

        run(&mut source, &mut NoopAnnotator, &mut sink).unwrap();

        assert_eq!(sink.shown, 3);
        // 3 successful reads plus the 2 failed ones.
        assert_eq!(source.pos, 5);
    }

    #[test]
    fn frames_reach_the_sink_unmodified() {
        let drops = Rc::new(Cell::new(0));
        let mut source = TestSource::ok(&drops);
        let mut sink = TestSink::new(1, &drops);

        run(&mut source, &mut NoopAnnotator, &mut sink).unwrap();

        let shown = sink.last_frame.take().unwrap();
        assert_eq!(shown.data(), TestSource::frame().data());
    }

    #[test]
    fn source_errors_are_fatal() {
        struct FailingSource;
        impl FrameSource for FailingSource {
            fn read_frame(&mut self) -> anyhow::Result<Option<Image>> {
                anyhow::bail!("camera unplugged")
            }
        }

        let drops = Rc::new(Cell::new(0));
        let mut sink = TestSink::new(100, &drops);
        let err = run(&mut FailingSource, &mut NoopAnnotator, &mut sink).unwrap_err();
        assert!(err.to_string().contains("camera unplugged"));
        assert_eq!(sink.shown, 0);
    }
}
