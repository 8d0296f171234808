//! Browser implementation of the controller's environment seam.
//!
//! Frame scheduling maps onto `requestAnimationFrame`, listeners onto DOM
//! `addEventListener`. Every closure handed to the browser stays owned here
//! so removal genuinely detaches and frees it; nothing is `forget`-leaked.

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use simlab::controller::{EnvAdapter, FrameHandle, ListenerHandle, ListenerKind};

use super::HostSlot;

/// Shared slot for the one animation-frame closure, created at mount.
pub(super) type RafClosure = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

struct InstalledListener {
    id: u64,
    event: &'static str,
    target: web_sys::EventTarget,
    closure: Closure<dyn FnMut(web_sys::Event)>,
}

pub(super) struct BrowserEnv {
    window: web_sys::Window,
    stage: web_sys::HtmlElement,
    host: HostSlot,
    raf: RafClosure,
    next: u64,
    // At most one frame request is outstanding at a time.
    pending_frame: Option<(u64, i32)>,
    listeners: Vec<InstalledListener>,
}

impl BrowserEnv {
    pub(super) fn new(
        window: web_sys::Window,
        stage: web_sys::HtmlElement,
        host: HostSlot,
        raf: RafClosure,
    ) -> Self {
        Self {
            window,
            stage,
            host,
            raf,
            next: 0,
            pending_frame: None,
            listeners: Vec::new(),
        }
    }

    fn listener_closure(&self, kind: ListenerKind) -> Closure<dyn FnMut(web_sys::Event)> {
        let host = Rc::clone(&self.host);
        Closure::wrap(Box::new(move |event: web_sys::Event| {
            let mut slot = host.borrow_mut();
            let Some(lab) = slot.as_mut() else { return };
            match kind {
                ListenerKind::PointerMove => {
                    if let Some(mouse) = event.dyn_ref::<web_sys::MouseEvent>() {
                        lab.pointer_moved(mouse.offset_x() as f32, mouse.offset_y() as f32);
                    }
                }
                ListenerKind::PointerLeave => lab.pointer_left(),
                ListenerKind::Resize => lab.sync_surface_size(),
            }
        }) as Box<dyn FnMut(web_sys::Event)>)
    }

    fn listener_binding(&self, kind: ListenerKind) -> (&'static str, web_sys::EventTarget) {
        match kind {
            ListenerKind::PointerMove => ("pointermove", self.stage.clone().into()),
            ListenerKind::PointerLeave => ("pointerleave", self.stage.clone().into()),
            ListenerKind::Resize => ("resize", self.window.clone().into()),
        }
    }
}

impl EnvAdapter for BrowserEnv {
    fn request_frame(&mut self) -> FrameHandle {
        self.next += 1;
        let handle = self.next;

        let raf = self.raf.borrow();
        if let Some(closure) = raf.as_ref() {
            if let Ok(id) = self
                .window
                .request_animation_frame(closure.as_ref().unchecked_ref())
            {
                self.pending_frame = Some((handle, id));
            }
        }
        FrameHandle(handle)
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if let Some((id, raf_id)) = self.pending_frame {
            if id == handle.0 {
                self.pending_frame = None;
                let _ = self.window.cancel_animation_frame(raf_id);
            }
        }
    }

    fn add_listener(&mut self, kind: ListenerKind) -> ListenerHandle {
        self.next += 1;
        let id = self.next;
        let closure = self.listener_closure(kind);
        let (event, target) = self.listener_binding(kind);

        if target
            .add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())
            .is_ok()
        {
            self.listeners.push(InstalledListener {
                id,
                event,
                target,
                closure,
            });
        }
        ListenerHandle(id)
    }

    fn remove_listener(&mut self, handle: ListenerHandle) {
        if let Some(pos) = self.listeners.iter().position(|l| l.id == handle.0) {
            let installed = self.listeners.remove(pos);
            let _ = installed.target.remove_event_listener_with_callback(
                installed.event,
                installed.closure.as_ref().unchecked_ref(),
            );
            // Dropping `installed` frees the closure now that it is detached.
        }
    }
}
