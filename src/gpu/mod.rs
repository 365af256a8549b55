//=========================================================================
// GPU Resources
//=========================================================================
//
// Idempotent bind/unbind wrappers around native graphics handles.
//
// Architecture:
// ```text
//   Window ──owns──► Gfx ──Rc──► Shared { clock, session }
//                     │                      │
//                     │ cloned into scenes   └─ Session { device,
//                     │                                  program slot,
//                     ▼                                  texture slot }
//   Shader ─┐                                    ▲
//   Texture ├─ hold a DeviceLink (Weak<Session>) ┘
//   Camera ─┤
//   Mesh   ─┘
// ```
//
// Bind protocol:
// - begin(): no-op if handle == 0 or the resource already occupies its
//   slot; otherwise one device bind call and the slot takes the handle
// - end():   unbind call (handle 0) and the slot is cleared; a zero-handle
//   resource never contacts the device
// - is_bound(): the slot currently holds this resource's handle
//
// A session lives from `attach` to `detach`. Once the window detaches it,
// every link created under it goes dead and the resource never contacts a
// device again, not even on drop.
//
//=========================================================================

//=== Module Declarations =================================================

mod camera;
pub mod device;
mod headless;
mod mesh;
mod shader;
mod shader_source;
mod texture;

//=== Public API ==========================================================

pub use camera::Camera;
pub use device::{
    GraphicsDevice, Handle, PixelFormat, ShaderStage, TextureDesc, UniformLocation, UniformValue,
    VertexArrayDesc, NULL_HANDLE,
};
pub use headless::{DeviceCall, HeadlessDevice};
pub use mesh::Mesh;
pub use shader::Shader;
pub use shader_source::ShaderSource;
pub use texture::{DecodedImage, Texture};

//=== External Dependencies ===============================================

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use log::debug;

//=== Internal Dependencies ===============================================

use crate::core::Clock;

//=== GpuResource =========================================================

/// Capability shared by every bindable GPU resource.
pub trait GpuResource {
    /// Native handle, [`NULL_HANDLE`] if the resource was never allocated.
    fn handle(&self) -> Handle;

    /// Makes this resource the active target. Idempotent.
    fn begin(&mut self);

    /// Unbinds the resource's slot.
    fn end(&mut self);

    /// `true` while this resource holds its bind slot: the most recent
    /// bind on the slot was this resource's, and no `end` followed it.
    fn is_bound(&self) -> bool;

    /// Whether the resource owns a live device handle.
    fn is_valid(&self) -> bool {
        self.handle() != NULL_HANDLE
    }
}

//=== Session =============================================================

/// One attachment of a device, with the bind slots tracked on it.
pub(crate) struct Session {
    device: Rc<dyn GraphicsDevice>,
    program: Cell<Handle>,
    texture: Cell<Handle>,
}

impl Session {
    fn new(device: Rc<dyn GraphicsDevice>) -> Self {
        Self {
            device,
            program: Cell::new(NULL_HANDLE),
            texture: Cell::new(NULL_HANDLE),
        }
    }

    pub(crate) fn device(&self) -> &dyn GraphicsDevice {
        self.device.as_ref()
    }

    //--- Program Slot -----------------------------------------------------

    pub(crate) fn current_program(&self) -> Handle {
        self.program.get()
    }

    pub(crate) fn use_program(&self, program: Handle) {
        self.device.use_program(program);
        self.program.set(program);
    }

    //--- Texture Slot -----------------------------------------------------

    pub(crate) fn current_texture(&self) -> Handle {
        self.texture.get()
    }

    pub(crate) fn bind_texture(&self, texture: Handle) {
        self.device.bind_texture(texture);
        self.texture.set(texture);
    }
}

//=== DeviceLink ==========================================================

/// A resource's tie to the session it was created in.
#[derive(Clone, Default)]
pub(crate) struct DeviceLink(Weak<Session>);

impl DeviceLink {
    /// The session, while it is still attached.
    pub(crate) fn session(&self) -> Option<Rc<Session>> {
        self.0.upgrade()
    }
}

//=== Gfx =================================================================

struct Shared {
    clock: Clock,
    session: RefCell<Option<Rc<Session>>>,
}

/// Shared access to the graphics device, if one is attached.
///
/// Cheap to clone. Every clone sees the same attachment: when the window
/// detaches its device, resources created through any clone stop talking
/// to it.
#[derive(Clone)]
pub struct Gfx {
    shared: Rc<Shared>,
}

impl Gfx {
    /// A handle with no device behind it.
    pub fn detached(clock: Clock) -> Self {
        Self {
            shared: Rc::new(Shared {
                clock,
                session: RefCell::new(None),
            }),
        }
    }

    /// A handle backed by `device`.
    pub fn attached(device: Rc<dyn GraphicsDevice>, clock: Clock) -> Self {
        let gfx = Self::detached(clock);
        gfx.attach(device);
        gfx
    }

    //--- Attachment -------------------------------------------------------

    /// Starts a new session on `device`, replacing any current one.
    pub(crate) fn attach(&self, device: Rc<dyn GraphicsDevice>) {
        if self.shared.session.replace(Some(Rc::new(Session::new(device)))).is_some() {
            debug!(target: "gpu", "Replaced attached device; earlier resources are now inert");
        }
    }

    /// Ends the current session. Returns `false` if none was attached.
    pub(crate) fn detach(&self) -> bool {
        self.shared.session.borrow_mut().take().is_some()
    }

    //--- Access -----------------------------------------------------------

    /// Whether a device context exists.
    pub fn is_ready(&self) -> bool {
        self.shared.session.borrow().is_some()
    }

    pub fn device(&self) -> Option<Rc<dyn GraphicsDevice>> {
        self.session().map(|session| session.device.clone())
    }

    pub(crate) fn session(&self) -> Option<Rc<Session>> {
        self.shared.session.borrow().clone()
    }

    pub(crate) fn link(&self) -> DeviceLink {
        self.shared
            .session
            .borrow()
            .as_ref()
            .map(|session| DeviceLink(Rc::downgrade(session)))
            .unwrap_or_default()
    }

    /// Engine time in seconds, as uploaded to `uTime`.
    pub fn seconds(&self) -> f32 {
        self.shared.clock.seconds()
    }

    pub fn clock(&self) -> Clock {
        self.shared.clock
    }
}

impl fmt::Debug for Gfx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gfx")
            .field("ready", &self.is_ready())
            .finish()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detached_is_not_ready() {
        let gfx = Gfx::detached(Clock::start());
        assert!(!gfx.is_ready());
        assert!(gfx.device().is_none());
        assert!(gfx.link().session().is_none());
    }

    #[test]
    fn attached_shares_device() {
        let device = Rc::new(HeadlessDevice::new());
        let gfx = Gfx::attached(device.clone(), Clock::start());
        let copy = gfx.clone();

        copy.device().unwrap().clear([0.0; 4]);
        assert!(gfx.is_ready());
        assert_eq!(device.calls().len(), 1);
    }

    #[test]
    fn detach_reaches_every_clone() {
        let device = Rc::new(HeadlessDevice::new());
        let gfx = Gfx::attached(device, Clock::start());
        let copy = gfx.clone();
        let link = copy.link();
        assert!(link.session().is_some());

        assert!(gfx.detach());
        assert!(!copy.is_ready());
        assert!(link.session().is_none());
        assert!(!gfx.detach());
    }

    #[test]
    fn reattach_does_not_revive_old_links() {
        let gfx = Gfx::attached(Rc::new(HeadlessDevice::new()), Clock::start());
        let old = gfx.link();

        gfx.detach();
        gfx.attach(Rc::new(HeadlessDevice::new()));

        assert!(old.session().is_none());
        assert!(gfx.link().session().is_some());
    }

    #[test]
    fn slots_track_last_bind() {
        let device = Rc::new(HeadlessDevice::new());
        let gfx = Gfx::attached(device.clone(), Clock::start());
        let session = gfx.session().unwrap();

        session.use_program(4);
        session.bind_texture(9);
        assert_eq!(session.current_program(), 4);
        assert_eq!(session.current_texture(), 9);
        assert_eq!(device.current_program(), 4);

        session.use_program(NULL_HANDLE);
        assert_eq!(session.current_program(), NULL_HANDLE);
    }
}
