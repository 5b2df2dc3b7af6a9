//! V4L2 webcam access.
//!
//! Only `VIDEO_CAPTURE` devices yielding JFIF JPEG or Motion JPEG frames are supported.

use std::env;

use anyhow::bail;
use linuxvideo::{
    format::{PixFormat, Pixelformat},
    stream::ReadStream,
    BufType, CapabilityFlags, Device,
};

use crate::{
    image::Image,
    timer::Timer,
    viewer::FrameSource,
};

/// Environment variable selecting the webcam device by name.
const ENV_WEBCAM_NAME: &str = "HANDCAM_WEBCAM_NAME";

/// The capture resolution requested from the driver (which may adjust it).
const REQUESTED_WIDTH: u32 = 640;
const REQUESTED_HEIGHT: u32 = 480;

/// Webcam open options.
#[derive(Default)]
pub struct WebcamOptions {
    name: Option<String>,
}

impl WebcamOptions {
    /// Sets the name of the webcam device to open.
    ///
    /// If no webcam with the given name can be found, opening the webcam will result in an error.
    pub fn name(self, name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
        }
    }
}

/// A webcam producing a stream of [`Image`]s.
pub struct Webcam {
    stream: ReadStream,
    t_dequeue: Timer,
    t_decode: Timer,
}

impl Webcam {
    /// Opens the first supported webcam found.
    ///
    /// This can block for a significant amount of time while the webcam initializes (on the
    /// order of hundreds of milliseconds).
    pub fn open(options: WebcamOptions) -> anyhow::Result<Self> {
        let name_filter = options
            .name
            .or_else(|| match env::var(ENV_WEBCAM_NAME) {
                Ok(name) => {
                    log::debug!("webcam override: `{ENV_WEBCAM_NAME}` is set to '{name}'");
                    Some(name)
                }
                Err(_) => None,
            });

        for res in linuxvideo::list()? {
            match res {
                Ok(dev) => match Self::open_device(dev, name_filter.as_deref()) {
                    Ok(Some(webcam)) => return Ok(webcam),
                    Ok(None) => {}
                    Err(e) => log::debug!("{e}"),
                },
                Err(e) => log::warn!("{e}"),
            }
        }

        bail!("no supported webcam device found")
    }

    fn open_device(dev: Device, name_filter: Option<&str>) -> anyhow::Result<Option<Self>> {
        let caps = dev.capabilities()?;
        if let Some(name) = name_filter {
            if caps.card() != name {
                return Ok(None);
            }
        }

        let cap_flags = caps.device_capabilities();
        let path = dev.path()?;
        log::debug!(
            "device {} ({}) capabilities: {:?}",
            caps.card(),
            path.display(),
            cap_flags,
        );

        if !cap_flags.contains(CapabilityFlags::VIDEO_CAPTURE) {
            return Ok(None);
        }

        let mut pixel_format = None;
        for format in dev.formats(BufType::VIDEO_CAPTURE) {
            let format = format?;
            if format.pixelformat() == Pixelformat::JPEG
                || format.pixelformat() == Pixelformat::MJPG
            {
                pixel_format = Some(format.pixelformat());
                break;
            }
        }
        let Some(pixel_format) = pixel_format else {
            bail!("device {} has no supported pixel format", caps.card());
        };

        let capture = dev.video_capture(PixFormat::new(
            REQUESTED_WIDTH,
            REQUESTED_HEIGHT,
            pixel_format,
        ))?;

        // The driver may pick a different resolution than the requested one.
        let format = capture.format();
        log::info!(
            "opened {} ({}), {}x{} {:?}",
            caps.card(),
            path.display(),
            format.width(),
            format.height(),
            format.pixelformat(),
        );

        let stream = capture.into_stream(2)?;

        Ok(Some(Self {
            stream,
            t_dequeue: Timer::new("dequeue"),
            t_decode: Timer::new("decode"),
        }))
    }

    /// Reads the next frame from the camera, blocking until one is available.
    ///
    /// Returns `Ok(None)` when the frame could not be decoded. Even high-quality webcams produce
    /// occasional corrupted MJPG frames (presumably from USB data corruption), so a failed frame
    /// is not treated as a device error.
    pub fn read(&mut self) -> anyhow::Result<Option<Image>> {
        let dequeue_guard = self.t_dequeue.start();
        self.stream
            .dequeue(|buf| {
                drop(dequeue_guard);
                match self.t_decode.time(|| Image::decode_jpeg(&buf)) {
                    Ok(image) => Ok(Some(image)),
                    Err(e) => {
                        log::warn!("webcam frame decode error: {e}");
                        Ok(None)
                    }
                }
            })
            .map_err(Into::into)
    }

    /// Returns profiling timers for frame dequeueing and decoding.
    pub fn timers(&self) -> impl Iterator<Item = &Timer> + '_ {
        [&self.t_dequeue, &self.t_decode].into_iter()
    }
}

impl FrameSource for Webcam {
    fn read_frame(&mut self) -> anyhow::Result<Option<Image>> {
        self.read()
    }
}
