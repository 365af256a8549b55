//=========================================================================
// Camera
//=========================================================================
//
// 2D orthographic camera bound through its own shader program.
//
// begin() binds the shader and uploads `uProjection` and `uView`. The
// camera counts as bound exactly while its shader holds the program slot.
//
// Depth maps to [0, 1], the range the wgpu device clips against.
//
//=========================================================================

//=== External Dependencies ===============================================

use glam::{Mat4, Vec2, Vec3};

//=== Internal Dependencies ===============================================

use super::device::Handle;
use super::shader::Shader;
use super::{Gfx, GpuResource};

//--- Projection Extents --------------------------------------------------

const TILE_SIZE: f32 = 32.0;
const TILES_WIDE: f32 = 40.0;
const TILES_HIGH: f32 = 21.0;
const NEAR: f32 = 0.0;
const FAR: f32 = 100.0;

/// Height the eye sits above the z = 0 plane.
const EYE_DISTANCE: f32 = 20.0;

//=== Camera ==============================================================

/// Orthographic 2D camera.
#[derive(Debug)]
pub struct Camera {
    shader: Shader,
    projection: Mat4,
    position: Vec2,
}

impl Camera {
    /// Camera at the origin using the built-in shader program.
    pub fn new(gfx: &Gfx) -> Self {
        Self::at(gfx, 0.0, 0.0)
    }

    /// Camera at `(x, y)` using the built-in shader program.
    pub fn at(gfx: &Gfx, x: f32, y: f32) -> Self {
        Self::with_shader(Shader::default_program(gfx), x, y)
    }

    /// Camera at `(x, y)` rendering through `shader`.
    pub fn with_shader(shader: Shader, x: f32, y: f32) -> Self {
        let mut camera = Self {
            shader,
            projection: Mat4::IDENTITY,
            position: Vec2::new(x, y),
        };
        camera.adjust_projection();
        camera
    }

    //--- Transform --------------------------------------------------------

    /// Resets the projection to the default tile-based extents.
    pub fn adjust_projection(&mut self) {
        self.projection = Mat4::orthographic_rh(
            0.0,
            TILE_SIZE * TILES_WIDE,
            0.0,
            TILE_SIZE * TILES_HIGH,
            NEAR,
            FAR,
        );
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    /// Looks down -Z from above the camera position.
    pub fn view(&self) -> Mat4 {
        let eye = self.position.extend(EYE_DISTANCE);
        let target = self.position.extend(0.0) + Vec3::NEG_Z;
        Mat4::look_at_rh(eye, target, Vec3::Y)
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn translate(&mut self, dx: f32, dy: f32) {
        self.position += Vec2::new(dx, dy);
    }

    /// Shader the camera binds.
    pub fn shader_mut(&mut self) -> &mut Shader {
        &mut self.shader
    }
}

//=== GpuResource Implementation ==========================================

impl GpuResource for Camera {
    fn handle(&self) -> Handle {
        self.shader.handle()
    }

    fn begin(&mut self) {
        if self.shader.is_bound() || !self.shader.is_valid() {
            return;
        }
        let (projection, view) = (self.projection, self.view());
        self.shader.begin_with_matrices(projection, view);
    }

    fn end(&mut self) {
        self.shader.end();
    }

    fn is_bound(&self) -> bool {
        self.shader.is_bound()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Clock;
    use crate::gpu::device::UniformValue;
    use crate::gpu::shader::{PROJECTION_UNIFORM, VIEW_UNIFORM};
    use crate::gpu::{DeviceCall, HeadlessDevice};
    use std::rc::Rc;

    fn attached() -> (Rc<HeadlessDevice>, Gfx) {
        let device = Rc::new(HeadlessDevice::new());
        let gfx = Gfx::attached(device.clone(), Clock::start());
        (device, gfx)
    }

    fn located(device: &HeadlessDevice, name: &str) -> bool {
        device
            .calls()
            .iter()
            .any(|c| matches!(c, DeviceCall::UniformLocation { name: n, .. } if n == name))
    }

    #[test]
    fn projection_maps_extents_to_clip_space() {
        let gfx = Gfx::detached(Clock::start());
        let camera = Camera::new(&gfx);

        let corner = camera.projection().project_point3(Vec3::new(1280.0, 672.0, 0.0));
        assert!((corner.x - 1.0).abs() < 1e-5);
        assert!((corner.y - 1.0).abs() < 1e-5);

        let origin = camera.projection().project_point3(Vec3::ZERO);
        assert!((origin.x + 1.0).abs() < 1e-5);
        assert!((origin.y + 1.0).abs() < 1e-5);
    }

    #[test]
    fn view_follows_translation() {
        let gfx = Gfx::detached(Clock::start());
        let mut camera = Camera::at(&gfx, 10.0, 5.0);
        camera.translate(2.0, -1.0);
        assert_eq!(camera.position(), Vec2::new(12.0, 4.0));

        // The camera position maps to the view-space origin (minus the eye distance)
        let p = camera.view().transform_point3(Vec3::new(12.0, 4.0, 0.0));
        assert!(p.x.abs() < 1e-5 && p.y.abs() < 1e-5);
        assert!((p.z + EYE_DISTANCE).abs() < 1e-5);
    }

    #[test]
    fn begin_uploads_matrices_once() {
        let (device, gfx) = attached();
        let mut camera = Camera::new(&gfx);
        device.clear_calls();

        camera.begin();
        camera.begin();

        assert!(camera.is_bound());
        assert_eq!(device.count(|c| *c == DeviceCall::UseProgram(camera.handle())), 1);
        assert!(located(&device, PROJECTION_UNIFORM));
        assert!(located(&device, VIEW_UNIFORM));
        assert!(device.calls().iter().any(|c| matches!(
            c,
            DeviceCall::Uniform { value: UniformValue::Mat4(m), .. } if *m == camera.projection()
        )));
    }

    #[test]
    fn end_then_begin_rebinds() {
        let (device, gfx) = attached();
        let mut camera = Camera::new(&gfx);
        device.clear_calls();

        camera.begin();
        camera.end();
        assert!(!camera.is_bound());
        camera.begin();

        assert_eq!(device.count(|c| *c == DeviceCall::UseProgram(camera.handle())), 2);
    }

    #[test]
    fn unbinding_the_shader_unbinds_the_camera() {
        let (device, gfx) = attached();
        let mut camera = Camera::new(&gfx);
        camera.begin();

        camera.shader_mut().end();
        assert!(!camera.is_bound());

        device.clear_calls();
        camera.begin();
        assert!(camera.is_bound());
        assert_eq!(device.count(|c| *c == DeviceCall::UseProgram(camera.handle())), 1);
        assert!(located(&device, PROJECTION_UNIFORM));
    }

    #[test]
    fn another_program_takes_the_camera_slot() {
        let (_device, gfx) = attached();
        let mut camera = Camera::new(&gfx);
        let mut other = Shader::default_program(&gfx);

        camera.begin();
        other.begin();
        assert!(!camera.is_bound());

        camera.begin();
        assert!(camera.is_bound() && !other.is_bound());
    }

    #[test]
    fn detached_camera_is_inert() {
        let gfx = Gfx::detached(Clock::start());
        let mut camera = Camera::new(&gfx);
        camera.begin();
        assert!(!camera.is_bound());
        assert!(!camera.is_valid());
        camera.end();
    }
}
