use handcam::{
    annotator::HandAnnotator,
    gui::{self, WindowSink},
    hand::{detection::PalmNetwork, landmark::LandmarkNetwork},
    viewer,
    webcam::{Webcam, WebcamOptions},
};

const WINDOW_TITLE: &str = "Hand Reading";

fn main() -> ! {
    handcam::init_logger!();

    gui::run(|| -> anyhow::Result<()> {
        let mut webcam = Webcam::open(WebcamOptions::default())?;
        let mut annotator = HandAnnotator::new(PalmNetwork::Lite, LandmarkNetwork::Full)?;
        let mut sink = WindowSink::new(WINDOW_TITLE);

        viewer::run(&mut webcam, &mut annotator, &mut sink)?;

        log::info!("exiting");
        Ok(())
    });
}
