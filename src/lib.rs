//! Webcam hand tracking with an overlay viewer.
//!
//! Frames are captured from a V4L2 [`webcam`], run through the [`hand`] tracking pipeline
//! (MediaPipe palm detection and hand landmark networks, executed on the CPU by tract), and
//! displayed in a [`gui`] window with bounding box, skeleton, and handedness overlays burned in
//! by the [`annotator`].

pub mod annotator;
pub mod detection;
pub mod gui;
pub mod hand;
pub mod image;
pub mod iter;
pub mod landmark;
pub mod nn;
pub mod num;
pub mod rect;
pub mod termination;
pub mod timer;
pub mod viewer;
pub mod webcam;

/// Initializes logging to stderr.
///
/// By default, the calling crate logs at debug level and wgpu is restricted to warnings; the
/// `RUST_LOG` environment variable can override both.
#[macro_export]
macro_rules! init_logger {
    () => {
        $crate::init_logger(env!("CARGO_CRATE_NAME"))
    };
}

#[doc(hidden)]
pub fn init_logger(crate_name: &str) {
    let res = env_logger::Builder::new()
        .filter(Some(crate_name), log::LevelFilter::Debug)
        .filter(Some("wgpu"), log::LevelFilter::Warn)
        .filter(None, log::LevelFilter::Info)
        .parse_default_env()
        .try_init();
    if let Err(e) = res {
        eprintln!("couldn't initialize logger: {e}");
    }
}
