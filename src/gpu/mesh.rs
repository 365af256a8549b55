//=========================================================================
// Mesh
//=========================================================================
//
// Interleaved float vertices plus a u32 index list, uploaded once.
//
// Layout: `attributes` lists the float count of each attribute in
// location order, e.g. [3, 4, 2] for position, color and uv.
//
// draw() issues one indexed draw with whatever program and texture
// currently hold the device slots.
//
//=========================================================================

//=== External Dependencies ===============================================

use log::{debug, trace};

//=== Internal Dependencies ===============================================

use crate::error::ResourceError;
use super::device::{Handle, VertexArrayDesc, NULL_HANDLE};
use super::{DeviceLink, Gfx};

/// Float components a single attribute may carry.
const MAX_COMPONENTS: u32 = 4;

//=== Mesh ================================================================

/// Vertex and index buffers on the device.
pub struct Mesh {
    link: DeviceLink,
    handle: Handle,
    vertex_count: usize,
    index_count: usize,
}

impl Mesh {
    /// Validates and uploads a mesh.
    ///
    /// Validation runs even without a device. Empty index lists and
    /// detached devices yield a zero-handle mesh that never draws.
    pub fn new(
        gfx: &Gfx,
        vertices: &[f32],
        indices: &[u32],
        attributes: &[u32],
    ) -> Result<Self, ResourceError> {
        let desc = VertexArrayDesc {
            vertices,
            indices,
            attributes,
        };
        validate(&desc)?;

        let handle = match gfx.session() {
            Some(_) if indices.is_empty() => NULL_HANDLE,
            Some(session) => {
                let handle = session.device().create_vertex_array(&desc);
                debug!(
                    target: "gpu",
                    "Uploaded mesh {} ({} vertices, {} indices)",
                    handle,
                    desc.vertex_count(),
                    indices.len()
                );
                handle
            }
            None => NULL_HANDLE,
        };

        Ok(Self {
            link: gfx.link(),
            handle,
            vertex_count: desc.vertex_count(),
            index_count: indices.len(),
        })
    }

    /// Draws every index with the currently bound program and texture.
    pub fn draw(&self) {
        if self.handle == NULL_HANDLE {
            return;
        }
        match self.link.session() {
            Some(session) => session.device().draw_indexed(self.handle),
            None => trace!(target: "gpu", "Mesh {} drawn after detach", self.handle),
        }
    }

    //--- Accessors --------------------------------------------------------

    pub fn handle(&self) -> Handle {
        self.handle
    }

    pub fn is_valid(&self) -> bool {
        self.handle != NULL_HANDLE
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    pub fn index_count(&self) -> usize {
        self.index_count
    }
}

fn validate(desc: &VertexArrayDesc<'_>) -> Result<(), ResourceError> {
    if desc.attributes.is_empty()
        || desc
            .attributes
            .iter()
            .any(|&count| count == 0 || count > MAX_COMPONENTS)
    {
        return Err(ResourceError::VertexLayout(desc.attributes.to_vec()));
    }

    let stride = desc.stride();
    if desc.vertices.len() % stride != 0 {
        return Err(ResourceError::VertexData {
            len: desc.vertices.len(),
            stride,
        });
    }

    let vertices = desc.vertex_count();
    match desc.indices.iter().find(|&&index| index as usize >= vertices) {
        Some(&index) => Err(ResourceError::IndexOutOfRange { index, vertices }),
        None => Ok(()),
    }
}

impl Drop for Mesh {
    fn drop(&mut self) {
        if self.handle == NULL_HANDLE {
            return;
        }
        if let Some(session) = self.link.session() {
            session.device().delete_vertex_array(self.handle);
        }
    }
}

impl std::fmt::Debug for Mesh {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mesh")
            .field("handle", &self.handle)
            .field("vertices", &self.vertex_count)
            .field("indices", &self.index_count)
            .finish()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Clock;
    use crate::gpu::{DeviceCall, GpuResource, HeadlessDevice, Shader, Texture};
    use crate::gpu::DecodedImage;
    use std::rc::Rc;

    //--- Test Helpers -----------------------------------------------------

    // Two triangles, position (3) + uv (2) per vertex.
    const QUAD: [f32; 20] = [
        0.0, 0.0, 0.0, 0.0, 0.0, //
        1.0, 0.0, 0.0, 1.0, 0.0, //
        1.0, 1.0, 0.0, 1.0, 1.0, //
        0.0, 1.0, 0.0, 0.0, 1.0, //
    ];
    const INDICES: [u32; 6] = [0, 1, 2, 2, 3, 0];

    fn attached() -> (Rc<HeadlessDevice>, Gfx) {
        let device = Rc::new(HeadlessDevice::new());
        let gfx = Gfx::attached(device.clone(), Clock::start());
        (device, gfx)
    }

    //=====================================================================
    // Validation
    //=====================================================================

    #[test]
    fn quad_uploads() {
        let (device, gfx) = attached();
        let mesh = Mesh::new(&gfx, &QUAD, &INDICES, &[3, 2]).unwrap();

        assert!(mesh.is_valid());
        assert_eq!((mesh.vertex_count(), mesh.index_count()), (4, 6));
        assert_eq!(device.live_vertex_arrays(), 1);
        assert!(device.calls().contains(&DeviceCall::CreateVertexArray {
            vertex_array: mesh.handle(),
            vertices: 4,
            indices: 6,
        }));
    }

    #[test]
    fn bad_layouts_are_rejected() {
        let (device, gfx) = attached();
        for layout in [&[][..], &[0, 3][..], &[5][..]] {
            let err = Mesh::new(&gfx, &QUAD, &INDICES, layout).unwrap_err();
            assert!(matches!(err, ResourceError::VertexLayout(_)), "{layout:?}");
        }
        assert_eq!(device.live_vertex_arrays(), 0);
    }

    #[test]
    fn ragged_vertex_data_is_rejected() {
        let (_device, gfx) = attached();
        let err = Mesh::new(&gfx, &QUAD[..19], &INDICES, &[3, 2]).unwrap_err();
        assert!(matches!(err, ResourceError::VertexData { len: 19, stride: 5 }));
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let (_device, gfx) = attached();
        let err = Mesh::new(&gfx, &QUAD, &[0, 1, 4], &[3, 2]).unwrap_err();
        assert!(matches!(err, ResourceError::IndexOutOfRange { index: 4, vertices: 4 }));
    }

    #[test]
    fn validated_without_device() {
        let gfx = Gfx::detached(Clock::start());
        assert!(Mesh::new(&gfx, &QUAD, &[9], &[3, 2]).is_err());

        let mesh = Mesh::new(&gfx, &QUAD, &INDICES, &[3, 2]).unwrap();
        assert!(!mesh.is_valid());
        mesh.draw();
    }

    #[test]
    fn empty_indices_stay_unallocated() {
        let (device, gfx) = attached();
        let mesh = Mesh::new(&gfx, &QUAD, &[], &[3, 2]).unwrap();
        mesh.draw();
        assert!(!mesh.is_valid());
        assert!(device.calls().is_empty());
    }

    //=====================================================================
    // Drawing
    //=====================================================================

    #[test]
    fn draw_uses_current_bindings() {
        let (device, gfx) = attached();
        let mesh = Mesh::new(&gfx, &QUAD, &INDICES, &[3, 2]).unwrap();
        let mut shader = Shader::default_program(&gfx);
        let mut texture = Texture::from_image(
            &gfx,
            DecodedImage { pixels: vec![255; 4], width: 1, height: 1, channels: 4 },
        )
        .unwrap();

        shader.begin();
        texture.begin();
        mesh.draw();

        assert_eq!(
            device.draws(),
            vec![DeviceCall::DrawIndexed {
                vertex_array: mesh.handle(),
                program: shader.handle(),
                texture: texture.handle(),
            }]
        );
    }

    #[test]
    fn detach_silences_draw_and_drop() {
        let (device, gfx) = attached();
        let mesh = Mesh::new(&gfx, &QUAD, &INDICES, &[3, 2]).unwrap();
        gfx.detach();
        device.clear_calls();

        mesh.draw();
        drop(mesh);
        assert!(device.calls().is_empty());
        assert_eq!(device.live_vertex_arrays(), 1);
    }

    #[test]
    fn drop_deletes_vertex_array() {
        let (device, gfx) = attached();
        let mesh = Mesh::new(&gfx, &QUAD, &INDICES, &[3, 2]).unwrap();
        let handle = mesh.handle();
        drop(mesh);
        assert!(device.calls().contains(&DeviceCall::DeleteVertexArray(handle)));
        assert_eq!(device.live_vertex_arrays(), 0);
    }
}
