// Author: Dustin Pilgrim
// License: MIT
//
// zwlr_virtual_pointer_v1 backend. The handle lives on its own event queue so
// roundtrips only need this object, not the whole session state.

use std::time::Instant;

use caravan_core::{PointerBackend, PointerError};
use eventline::debug;

use wayland_client::protocol::{wl_output, wl_pointer, wl_seat};
use wayland_client::{Connection, Dispatch, EventQueue, Proxy, QueueHandle};

use wayland_protocols_wlr::virtual_pointer::v1::client::{
    zwlr_virtual_pointer_manager_v1::ZwlrVirtualPointerManagerV1,
    zwlr_virtual_pointer_v1::{self, ZwlrVirtualPointerV1},
};

pub struct PointerQueue;

impl Dispatch<ZwlrVirtualPointerV1, ()> for PointerQueue {
    fn event(_: &mut Self, _: &ZwlrVirtualPointerV1, _: zwlr_virtual_pointer_v1::Event, _: &(), _: &Connection, _: &QueueHandle<Self>) {}
}

pub struct WaylandPointer {
    handle: ZwlrVirtualPointerV1,
    queue: EventQueue<PointerQueue>,
    state: PointerQueue,
    epoch: Instant,
}

impl WaylandPointer {
    /// Create the virtual pointer. With a v2 manager it is mapped onto
    /// `output`, so absolute motion is relative to that output.
    pub fn new(
        conn: &Connection,
        manager: &ZwlrVirtualPointerManagerV1,
        seat: &wl_seat::WlSeat,
        output: &wl_output::WlOutput,
    ) -> Self {
        let queue = conn.new_event_queue::<PointerQueue>();
        let qh = queue.handle();

        let handle = if manager.version() >= 2 {
            manager.create_virtual_pointer_with_output(Some(seat), Some(output), &qh, ())
        } else {
            manager.create_virtual_pointer(Some(seat), &qh, ())
        };
        debug!(
            "virtual pointer created (manager v{}, bound to output: {})",
            manager.version(),
            manager.version() >= 2
        );

        Self {
            handle,
            queue,
            state: PointerQueue,
            epoch: Instant::now(),
        }
    }

    fn time(&self) -> u32 {
        self.epoch.elapsed().as_millis() as u32
    }
}

impl PointerBackend for WaylandPointer {
    fn motion_absolute(&mut self, x: u32, y: u32, x_extent: u32, y_extent: u32) {
        debug!("motion_absolute {x},{y} of {x_extent}x{y_extent}");
        self.handle.motion_absolute(self.time(), x, y, x_extent, y_extent);
    }

    fn button(&mut self, code: u32, pressed: bool) {
        let state = if pressed {
            wl_pointer::ButtonState::Pressed
        } else {
            wl_pointer::ButtonState::Released
        };
        debug!("button {code:#x} {state:?}");
        self.handle.button(self.time(), code, state);
    }

    fn wheel(&mut self, value: f64) {
        debug!("wheel {value}");
        self.handle.axis_source(wl_pointer::AxisSource::Wheel);
        self.handle
            .axis(self.time(), wl_pointer::Axis::VerticalScroll, value);
    }

    fn frame(&mut self) {
        self.handle.frame();
    }

    fn roundtrip(&mut self) -> Result<(), PointerError> {
        self.queue
            .roundtrip(&mut self.state)
            .map(|_| ())
            .map_err(|e| PointerError::Roundtrip(e.to_string()))
    }
}

impl Drop for WaylandPointer {
    fn drop(&mut self) {
        self.handle.destroy();
        let _ = self.queue.flush();
    }
}
