// Author: Dustin Pilgrim
// License: MIT
//
// Protocol session: binds the globals we need, folds output geometry into an
// OutputRegistry over two roundtrips and hands out the virtual pointer.
//
// Phase 1 (connect): wl_output events (mode, scale, name).
// Phase 2 (resolve_outputs): SCTK asks for a zxdg_output_v1 per output as soon
// as it binds it; the logical position/size arrive on the second roundtrip.

use caravan_core::output::{MODE_CURRENT, MODE_PREFERRED};
use caravan_core::{CanvasTransform, GeometryError, OutputRegistry, VirtualPointerDriver};
use eventline::{debug, info, warn};
use smithay_client_toolkit::{
    output::{OutputHandler, OutputState},
    registry::{ProvidesRegistryState, RegistryState},
    registry_handlers,
};
use thiserror::Error;
use wayland_client::{
    globals::{registry_queue_init, BindError, GlobalError, GlobalList},
    protocol::{wl_output, wl_seat},
    ConnectError, Connection, Dispatch, DispatchError, EventQueue, QueueHandle,
};
use wayland_protocols_wlr::virtual_pointer::v1::client::zwlr_virtual_pointer_manager_v1::{
    self, ZwlrVirtualPointerManagerV1,
};

use super::pointer::WaylandPointer;

pub const VIRTUAL_POINTER_MANAGER: &str = "zwlr_virtual_pointer_manager_v1";
pub const XDG_OUTPUT_MANAGER: &str = "zxdg_output_manager_v1";
pub const SEAT: &str = "wl_seat";

/// Globals the session cannot work without, in the order they are reported.
pub const REQUIRED_GLOBALS: [&str; 3] = [VIRTUAL_POINTER_MANAGER, XDG_OUTPUT_MANAGER, SEAT];

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("wayland connect: {0}")]
    Connect(#[from] ConnectError),

    #[error("registry init: {0}")]
    Registry(#[from] GlobalError),

    #[error("{0} not supported by compositor")]
    MissingGlobal(&'static str),

    #[error("bind {interface}: {source}")]
    Bind {
        interface: &'static str,
        source: BindError,
    },

    #[error("wayland roundtrip: {0}")]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

/// How to pick the output the automation drives.
#[derive(Debug, Clone, Copy)]
pub enum OutputChoice<'a> {
    /// Whichever output last reported a current mode.
    Compositor,
    /// Must exist.
    Named(&'a str),
    /// Used when it exists, ignored otherwise (e.g. sway's focused output).
    Hint(&'a str),
}

pub struct SessionState {
    registry_state: RegistryState,
    output_state: OutputState,
    registry: OutputRegistry,
}

impl SessionState {
    /// Fold everything SCTK knows about `output` into the registry.
    fn absorb(&mut self, output: &wl_output::WlOutput) {
        let Some(info) = self.output_state.info(output) else {
            return;
        };
        let id = info.id;

        self.registry.insert(id);
        if let Some(name) = &info.name {
            self.registry.on_name(id, name.clone());
        }
        self.registry.on_scale(id, f64::from(info.scale_factor));
        if let Some((x, y)) = info.logical_position {
            self.registry.on_logical_position(id, x, y);
        }
        if let Some((w, h)) = info.logical_size {
            self.registry.on_logical_size(id, w, h);
        }

        for mode in &info.modes {
            let mut flags = 0;
            if mode.current {
                flags |= MODE_CURRENT;
            }
            if mode.preferred {
                flags |= MODE_PREFERRED;
            }
            let (w, h) = mode.dimensions;
            self.registry.on_mode(id, flags, w, h);
        }
    }
}

struct Ready {
    transform: CanvasTransform,
    output: wl_output::WlOutput,
}

pub struct Session {
    // Field order is drop order: the pointer goes before the connection.
    pointer: Option<VirtualPointerDriver<WaylandPointer>>,
    ready: Option<Ready>,
    pointer_manager: ZwlrVirtualPointerManagerV1,
    seat: wl_seat::WlSeat,
    state: SessionState,
    queue: EventQueue<SessionState>,
    conn: Connection,
}

impl Session {
    /// Connect, bind globals and run the first roundtrip.
    pub fn connect() -> Result<Self, SessionError> {
        let conn = Connection::connect_to_env()?;
        let (globals, mut queue) = registry_queue_init::<SessionState>(&conn)?;
        let qh = queue.handle();

        globals
            .contents()
            .with_list(|list| require_globals(list.iter().map(|g| g.interface.as_str())))?;

        let pointer_manager = bind_required::<ZwlrVirtualPointerManagerV1>(
            &globals,
            &qh,
            1..=2,
            VIRTUAL_POINTER_MANAGER,
        )?;
        let seat = bind_required::<wl_seat::WlSeat>(&globals, &qh, 1..=7, SEAT)?;

        // OutputState binds every wl_output and requests their xdg outputs.
        let mut state = SessionState {
            registry_state: RegistryState::new(&globals),
            output_state: OutputState::new(&globals, &qh),
            registry: OutputRegistry::new(),
        };

        queue.roundtrip(&mut state)?;
        debug!("initial roundtrip done, {} outputs advertised", state.output_state.outputs().count());

        Ok(Self {
            pointer: None,
            ready: None,
            pointer_manager,
            seat,
            state,
            queue,
            conn,
        })
    }

    /// Second roundtrip: wait for xdg_output geometry and apply it.
    pub fn resolve_outputs(&mut self) -> Result<(), SessionError> {
        self.queue.roundtrip(&mut self.state)?;

        let outputs: Vec<wl_output::WlOutput> = self.state.output_state.outputs().collect();
        for output in &outputs {
            self.state.absorb(output);
        }

        for o in self.state.registry.outputs() {
            debug!(
                "output {} name={:?} pos={:?} size={}x{} scale={} current={}",
                o.id, o.name, o.position, o.width, o.height, o.scale, o.current
            );
        }

        Ok(())
    }

    /// Resolve outputs, settle on the current one and make the session usable.
    pub fn finish_initialization(&mut self, choice: OutputChoice<'_>) -> Result<(), SessionError> {
        self.resolve_outputs()?;

        match choice {
            OutputChoice::Compositor => {}
            OutputChoice::Named(name) => self.state.registry.set_current_by_name(name)?,
            OutputChoice::Hint(name) => {
                if let Err(e) = self.state.registry.set_current_by_name(name) {
                    warn!("ignoring output hint: {e}");
                }
            }
        }

        let current = self.state.registry.current()?;
        let transform = CanvasTransform::for_output(current)?;
        let id = current.id;

        let output = self
            .state
            .output_state
            .outputs()
            .find(|o| self.state.output_state.info(o).map(|i| i.id) == Some(id))
            .ok_or(GeometryError::NoCurrentOutput)?;

        info!(
            "driving output {} ({:?}): ratio={:?} scale={} origin={:?}",
            id, current.name, transform.ratio, transform.scale, transform.origin
        );

        self.ready = Some(Ready { transform, output });
        Ok(())
    }

    pub fn outputs(&self) -> &OutputRegistry {
        &self.state.registry
    }

    /// The virtual pointer, created on first use.
    ///
    /// Panics if called before `finish_initialization` succeeded.
    pub fn pointer(&mut self) -> &mut VirtualPointerDriver<WaylandPointer> {
        let ready = assert_ready(self.ready.as_ref());

        let (conn, manager, seat) = (&self.conn, &self.pointer_manager, &self.seat);
        self.pointer.get_or_insert_with(|| {
            VirtualPointerDriver::new(
                WaylandPointer::new(conn, manager, seat, &ready.output),
                ready.transform,
            )
        })
    }
}

/// First required global the compositor does not advertise.
fn require_globals<'a>(advertised: impl IntoIterator<Item = &'a str>) -> Result<(), SessionError> {
    let advertised: Vec<&str> = advertised.into_iter().collect();

    match REQUIRED_GLOBALS.into_iter().find(|name| !advertised.contains(name)) {
        Some(name) => Err(SessionError::MissingGlobal(name)),
        None => Ok(()),
    }
}

fn assert_ready<T>(ready: Option<&T>) -> &T {
    match ready {
        Some(r) => r,
        None => panic!("virtual pointer used before the session finished initialization"),
    }
}

fn bind_required<I>(
    globals: &GlobalList,
    qh: &QueueHandle<SessionState>,
    version: std::ops::RangeInclusive<u32>,
    interface: &'static str,
) -> Result<I, SessionError>
where
    I: wayland_client::Proxy + 'static,
    SessionState: Dispatch<I, ()>,
{
    globals
        .bind::<I, SessionState, ()>(qh, version, ())
        .map_err(|e| match e {
            BindError::NotPresent => SessionError::MissingGlobal(interface),
            source => SessionError::Bind { interface, source },
        })
}

impl ProvidesRegistryState for SessionState {
    fn registry(&mut self) -> &mut RegistryState {
        &mut self.registry_state
    }

    registry_handlers![OutputState];
}

impl OutputHandler for SessionState {
    fn output_state(&mut self) -> &mut OutputState {
        &mut self.output_state
    }

    fn new_output(&mut self, _conn: &Connection, _qh: &QueueHandle<Self>, output: wl_output::WlOutput) {
        self.absorb(&output);
    }

    fn update_output(&mut self, _conn: &Connection, _qh: &QueueHandle<Self>, output: wl_output::WlOutput) {
        self.absorb(&output);
    }

    // Outputs are never removed from the registry during a session.
    fn output_destroyed(&mut self, _conn: &Connection, _qh: &QueueHandle<Self>, _output: wl_output::WlOutput) {}
}

impl Dispatch<wl_seat::WlSeat, ()> for SessionState {
    fn event(_: &mut Self, _: &wl_seat::WlSeat, _: wl_seat::Event, _: &(), _: &Connection, _: &QueueHandle<Self>) {}
}

impl Dispatch<ZwlrVirtualPointerManagerV1, ()> for SessionState {
    fn event(_: &mut Self, _: &ZwlrVirtualPointerManagerV1, _: zwlr_virtual_pointer_manager_v1::Event, _: &(), _: &Connection, _: &QueueHandle<Self>) {}
}

smithay_client_toolkit::delegate_output!(SessionState);
smithay_client_toolkit::delegate_registry!(SessionState);
