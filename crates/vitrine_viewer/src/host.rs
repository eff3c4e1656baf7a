use std::sync::Arc;

use vitrine_core::{FrameScheduler, HostBindings};
use winit::window::Window;

/// Frame scheduling and listener bookkeeping on top of a winit window.
///
/// winit delivers every event to the application handler, so "attaching" a
/// listener means the handler starts routing that event kind to the
/// lifecycle, and "detaching" means it stops.
pub struct WinitHost {
    window: Arc<Window>,
    frame_loop_registered: bool,
    interaction_listeners: bool,
    resize_listener: bool,
}

impl WinitHost {
    pub fn new(window: Arc<Window>) -> Self {
        Self {
            window,
            frame_loop_registered: false,
            interaction_listeners: false,
            resize_listener: false,
        }
    }

    pub fn frame_loop_registered(&self) -> bool {
        self.frame_loop_registered
    }

    pub fn listens_for_interaction(&self) -> bool {
        self.interaction_listeners
    }

    pub fn listens_for_resize(&self) -> bool {
        self.resize_listener
    }
}

impl FrameScheduler for WinitHost {
    fn register_frame_loop(&mut self) {
        self.frame_loop_registered = true;
        self.window.request_redraw();
    }

    fn cancel_frame_loop(&mut self) {
        self.frame_loop_registered = false;
    }

    fn request_frame(&mut self) {
        self.window.request_redraw();
    }
}

impl HostBindings for WinitHost {
    fn attach_interaction_listeners(&mut self) {
        self.interaction_listeners = true;
    }

    fn attach_resize_listener(&mut self) {
        self.resize_listener = true;
    }

    fn detach_resize_listener(&mut self) {
        self.resize_listener = false;
    }
}
