//! Simple GUI for displaying image streams.
//!
//! winit requires the event loop to run on the main thread, so [`run`] takes over the calling
//! thread and moves the application into a worker thread. Images sent with [`show_image`] are
//! displayed in a window per title; pressing `q` in any window (or closing one) raises a
//! process-wide quit flag that the application polls via [`quit_requested`].

mod renderer;

use std::{
    collections::HashMap,
    panic::{catch_unwind, AssertUnwindSafe},
    process,
    rc::Rc,
    sync::{
        atomic::{AtomicBool, Ordering},
        Mutex,
    },
    thread,
};

use once_cell::sync::OnceCell;
use winit::{
    dpi::PhysicalSize,
    event::{ElementState, Event, KeyboardInput, VirtualKeyCode, WindowEvent},
    event_loop::{ControlFlow, EventLoopBuilder, EventLoopProxy, EventLoopWindowTarget},
    window::{WindowBuilder, WindowId},
};

use crate::{
    image::Image,
    termination::Termination,
    viewer::FrameSink,
};

use renderer::{Gpu, Renderer};

enum Msg {
    Image { title: String, image: Image },
}

static PROXY: OnceCell<Mutex<EventLoopProxy<Msg>>> = OnceCell::new();
static QUIT: AtomicBool = AtomicBool::new(false);

/// Returns whether the user has asked the application to quit.
///
/// Set when `q` is pressed in any GUI window, or when a window is closed.
pub fn quit_requested() -> bool {
    QUIT.load(Ordering::Relaxed)
}

/// Displays an image in the window with the given title.
///
/// A window is created when `title` is first used. May only be called from inside the
/// application closure passed to [`run`].
pub fn show_image(title: &str, image: &Image) {
    let proxy = PROXY
        .get()
        .expect("`gui::show_image` called outside of `gui::run`");
    let msg = Msg::Image {
        title: title.to_string(),
        image: image.clone(),
    };
    // Send fails only when the event loop is shutting down; frames can be dropped then.
    let _ = proxy.lock().unwrap().send_event(msg);
}

/// Runs the GUI event loop on the calling thread and `app` on a worker thread.
///
/// Must be called from the main thread. Never returns: when `app` finishes (or panics), the
/// process exits with the code its [`Termination`] value reports.
pub fn run<F, R>(app: F) -> !
where
    F: FnOnce() -> R + Send + 'static,
    R: Termination,
{
    let event_loop = EventLoopBuilder::<Msg>::with_user_event().build();
    PROXY
        .set(Mutex::new(event_loop.create_proxy()))
        .unwrap_or_else(|_| panic!("`gui::run` called twice"));

    thread::Builder::new()
        .name("app".into())
        .spawn(move || {
            let code = match catch_unwind(AssertUnwindSafe(app)) {
                Ok(result) => result.report(),
                Err(_) => 101,
            };
            process::exit(code);
        })
        .expect("failed to spawn application thread");

    let mut gui = Gui::default();
    event_loop.run(move |event, target, control_flow| {
        *control_flow = ControlFlow::Wait;
        match event {
            Event::UserEvent(Msg::Image { title, image }) => gui.show(target, title, &image),
            Event::WindowEvent { window_id, event } => match event {
                WindowEvent::CloseRequested => {
                    log::debug!("window closed, requesting quit");
                    QUIT.store(true, Ordering::Relaxed);
                }
                WindowEvent::KeyboardInput {
                    input:
                        KeyboardInput {
                            state: ElementState::Pressed,
                            virtual_keycode: Some(VirtualKeyCode::Q),
                            ..
                        },
                    ..
                } => {
                    log::debug!("`q` pressed, requesting quit");
                    QUIT.store(true, Ordering::Relaxed);
                }
                WindowEvent::Resized(size) => gui.resized(window_id, size),
                _ => {}
            },
            Event::RedrawRequested(window_id) => gui.redraw(window_id),
            _ => {}
        }
    });
}

#[derive(Default)]
struct Gui {
    gpu: Option<Rc<Gpu>>,
    windows: HashMap<String, GuiWindow>,
}

struct GuiWindow {
    window: winit::window::Window,
    renderer: Renderer,
}

impl Gui {
    fn show(&mut self, target: &EventLoopWindowTarget<Msg>, title: String, image: &Image) {
        if let Some(win) = self.windows.get_mut(&title) {
            win.renderer.update_texture(image);
            win.window.request_redraw();
            return;
        }

        let window = WindowBuilder::new()
            .with_title(&title)
            .with_inner_size(PhysicalSize::new(image.width(), image.height()))
            .build(target)
            .expect("failed to create window");

        let (gpu, surface) = match &self.gpu {
            Some(gpu) => {
                let surface = gpu.create_surface(&window);
                (gpu.clone(), surface)
            }
            None => {
                let (gpu, surface) = Gpu::open(&window).expect("failed to initialize GPU");
                let gpu = Rc::new(gpu);
                self.gpu = Some(gpu.clone());
                (gpu, surface)
            }
        };

        let mut renderer = Renderer::new(gpu, surface, window.inner_size());
        renderer.update_texture(image);
        window.request_redraw();
        self.windows.insert(title, GuiWindow { window, renderer });
    }

    fn resized(&mut self, window_id: WindowId, size: PhysicalSize<u32>) {
        if let Some(win) = self
            .windows
            .values_mut()
            .find(|win| win.window.id() == window_id)
        {
            win.renderer.resize(size);
            win.window.request_redraw();
        }
    }

    fn redraw(&mut self, window_id: WindowId) {
        if let Some(win) = self
            .windows
            .values_mut()
            .find(|win| win.window.id() == window_id)
        {
            win.renderer.redraw();
        }
    }
}

/// A [`FrameSink`] that displays frames in a GUI window.
pub struct WindowSink {
    title: String,
}

impl WindowSink {
    pub fn new<T: Into<String>>(title: T) -> Self {
        Self {
            title: title.into(),
        }
    }
}

impl FrameSink for WindowSink {
    fn show(&mut self, frame: &Image) {
        show_image(&self.title, frame);
    }

    fn quit_requested(&self) -> bool {
        quit_requested()
    }
}
