//=========================================================================
// Test Support
//=========================================================================
//
// Headless stand-ins for the native windowing layer.
//
// - `ScriptedBackend` / `ScriptedSurface`: replay one batch of platform
//   events per poll, then flag the surface for closing
// - `RecordingScene`: logs every lifecycle hook into a shared `EventLog`
//
//=========================================================================

//=== External Dependencies ===============================================

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crossbeam_channel::Sender;

//=== Internal Dependencies ===============================================

use crate::config::WindowConfig;
use crate::core::platform_bridge::{PlatformError, PlatformEvent, Surface, SurfaceBackend};
use crate::core::scene::{Scene, SceneContext};
use crate::gpu::{GraphicsDevice, HeadlessDevice};

//=== EventLog ============================================================

#[derive(Default)]
struct LogInner {
    entries: Vec<String>,
    deltas: Vec<f32>,
}

/// Shared, ordered record of what happened during a test.
#[derive(Clone, Default)]
pub(crate) struct EventLog(Rc<RefCell<LogInner>>);

impl EventLog {
    pub(crate) fn push(&self, entry: impl Into<String>) {
        self.0.borrow_mut().entries.push(entry.into());
    }

    pub(crate) fn entries(&self) -> Vec<String> {
        self.0.borrow().entries.clone()
    }

    /// `dt` values received by `on_update`, in call order.
    pub(crate) fn deltas(&self) -> Vec<f32> {
        self.0.borrow().deltas.clone()
    }

    pub(crate) fn count(&self, entry: &str) -> usize {
        self.0.borrow().entries.iter().filter(|e| *e == entry).count()
    }

    fn record_delta(&self, dt: f32) {
        self.0.borrow_mut().deltas.push(dt);
    }
}

//=== RecordingScene ======================================================

type Hook = Box<dyn FnMut(&mut SceneContext<'_>)>;
type UpdateHook = Box<dyn FnMut(&mut SceneContext<'_>, f32)>;

/// Scene that logs `<name>:start`, `<name>:update` and `<name>:end`.
pub(crate) struct RecordingScene {
    name: &'static str,
    log: EventLog,
    on_start: Option<Hook>,
    on_update: Option<UpdateHook>,
    on_end: Option<Hook>,
}

impl RecordingScene {
    pub(crate) fn new(name: &'static str, log: &EventLog) -> Self {
        Self {
            name,
            log: log.clone(),
            on_start: None,
            on_update: None,
            on_end: None,
        }
    }

    pub(crate) fn on_start_do(mut self, hook: impl FnMut(&mut SceneContext<'_>) + 'static) -> Self {
        self.on_start = Some(Box::new(hook));
        self
    }

    pub(crate) fn on_update_do(
        mut self,
        hook: impl FnMut(&mut SceneContext<'_>, f32) + 'static,
    ) -> Self {
        self.on_update = Some(Box::new(hook));
        self
    }

    pub(crate) fn on_end_do(mut self, hook: impl FnMut(&mut SceneContext<'_>) + 'static) -> Self {
        self.on_end = Some(Box::new(hook));
        self
    }
}

impl Scene for RecordingScene {
    fn on_start(&mut self, ctx: &mut SceneContext<'_>) {
        self.log.push(format!("{}:start", self.name));
        if let Some(hook) = self.on_start.as_mut() {
            hook(ctx);
        }
    }

    fn on_update(&mut self, ctx: &mut SceneContext<'_>, dt: f32) {
        self.log.push(format!("{}:update", self.name));
        self.log.record_delta(dt);
        if let Some(hook) = self.on_update.as_mut() {
            hook(ctx, dt);
        }
    }

    fn on_end(&mut self, ctx: &mut SceneContext<'_>) {
        self.log.push(format!("{}:end", self.name));
        if let Some(hook) = self.on_end.as_mut() {
            hook(ctx);
        }
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

//=== SurfaceStats ========================================================

/// Observations made by a scripted surface, readable after it is dropped.
#[derive(Debug, Clone, Default)]
pub(crate) struct SurfaceStats {
    pub(crate) created: usize,
    pub(crate) polls: usize,
    pub(crate) presents: usize,
    pub(crate) registered: usize,
    pub(crate) unregistered: usize,
    pub(crate) dropped: bool,
    pub(crate) config: Option<WindowConfig>,
}

//=== ScriptedBackend =====================================================

/// Backend producing a `ScriptedSurface` that replays `frames`.
pub(crate) struct ScriptedBackend {
    frames: VecDeque<Vec<PlatformEvent>>,
    device: Rc<HeadlessDevice>,
    log: EventLog,
    stats: Rc<RefCell<SurfaceStats>>,
    fail: bool,
}

impl ScriptedBackend {
    pub(crate) fn new(log: &EventLog) -> Self {
        Self {
            frames: VecDeque::new(),
            device: Rc::new(HeadlessDevice::new()),
            log: log.clone(),
            stats: Rc::default(),
            fail: false,
        }
    }

    /// Backend whose surface creation always fails.
    pub(crate) fn failing(log: &EventLog) -> Self {
        Self {
            fail: true,
            ..Self::new(log)
        }
    }

    /// Appends one poll's worth of events.
    pub(crate) fn frame<E: Into<PlatformEvent>>(mut self, events: impl IntoIterator<Item = E>) -> Self {
        self.frames.push_back(events.into_iter().map(Into::into).collect());
        self
    }

    /// Appends `count` polls without events.
    pub(crate) fn idle_frames(mut self, count: usize) -> Self {
        for _ in 0..count {
            self.frames.push_back(Vec::new());
        }
        self
    }

    pub(crate) fn device(&self) -> Rc<HeadlessDevice> {
        self.device.clone()
    }

    pub(crate) fn stats(&self) -> SurfaceStats {
        self.stats.borrow().clone()
    }
}

impl SurfaceBackend for ScriptedBackend {
    fn create_surface(&mut self, config: &WindowConfig) -> Result<Box<dyn Surface>, PlatformError> {
        if self.fail {
            return Err(PlatformError::WindowCreation("scripted failure".into()));
        }

        {
            let mut stats = self.stats.borrow_mut();
            stats.created += 1;
            stats.config = Some(config.clone());
        }

        Ok(Box::new(ScriptedSurface {
            frames: std::mem::take(&mut self.frames),
            sender: None,
            closing: false,
            size: (config.width, config.height),
            device: self.device.clone(),
            log: self.log.clone(),
            stats: self.stats.clone(),
        }))
    }
}

//=== ScriptedSurface =====================================================

pub(crate) struct ScriptedSurface {
    frames: VecDeque<Vec<PlatformEvent>>,
    sender: Option<Sender<PlatformEvent>>,
    closing: bool,
    size: (u32, u32),
    device: Rc<HeadlessDevice>,
    log: EventLog,
    stats: Rc<RefCell<SurfaceStats>>,
}

impl Surface for ScriptedSurface {
    fn register_callbacks(&mut self, sender: Sender<PlatformEvent>) {
        self.stats.borrow_mut().registered += 1;
        self.sender = Some(sender);
    }

    fn unregister_callbacks(&mut self) {
        self.stats.borrow_mut().unregistered += 1;
        self.sender = None;
    }

    fn poll_events(&mut self) {
        self.stats.borrow_mut().polls += 1;
        self.log.push("poll");

        let Some(events) = self.frames.pop_front() else {
            self.closing = true;
            return;
        };

        for event in events {
            if let PlatformEvent::Resized { width, height } = event {
                self.size = (width, height);
            }
            if let Some(sender) = &self.sender {
                let _ = sender.send(event);
            }
        }
    }

    fn present(&mut self) {
        self.stats.borrow_mut().presents += 1;
        self.log.push("present");
    }

    fn should_close(&self) -> bool {
        self.closing
    }

    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn device(&self) -> Option<Rc<dyn GraphicsDevice>> {
        let device: Rc<dyn GraphicsDevice> = self.device.clone();
        Some(device)
    }
}

impl Drop for ScriptedSurface {
    fn drop(&mut self) {
        self.stats.borrow_mut().dropped = true;
    }
}
