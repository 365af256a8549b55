//=========================================================================
// Wgpu Device
//=========================================================================
//
// `GraphicsDevice` backed by wgpu, drawing into a winit window.
//
// Architecture:
// ```text
//   compile_shader: GLSL ─naga glsl-in─► Module ─validate─► ShaderModule
//                                          └─ reflect group 0 block offsets
//   link_program:   vertex + fragment modules, merged uniform offsets
//   upload_uniform: writes into the current program's CPU block (std140)
//   draw_indexed:   records (program, texture, vertex array, block copy)
//   present_frame:  acquire → one uniform buffer for every draw → pass
//                   cleared to the frame's color → submit → present
// ```
//
// Shader interface:
// - set 0, binding 0: uniform block, bound with a per-draw dynamic offset
// - set 1, binding 0/1: `texture2D` and `sampler` of the bound texture
//   (a 1x1 white texture when none is bound)
// - vertex attribute `i` is read from shader location `i`
//
// Pipelines are created lazily per (program, attribute layout) and cached.
// Validation failures of shaders and pipelines are caught in error scopes
// and logged instead of aborting.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::borrow::Cow;
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, error, info, trace, warn};
use wgpu::naga;
use wgpu::util::DeviceExt;
use winit::window::Window;

//=== Internal Dependencies ===============================================

use crate::gpu::{
    GraphicsDevice, Handle, PixelFormat, ShaderStage, TextureDesc, UniformLocation, UniformValue,
    VertexArrayDesc, NULL_HANDLE,
};

//--- Limits --------------------------------------------------------------

/// Largest uniform block a program may declare.
const UNIFORM_BLOCK_BYTES: u64 = 512;

const UNIFORM_GROUP: u32 = 0;
const UNIFORM_BINDING: u32 = 0;

//=== Stage Compilation ===================================================

/// A validated stage plus the member offsets of its uniform block.
#[derive(Debug)]
struct StageInterface {
    module: naga::Module,
    uniforms: HashMap<String, u32>,
    block_size: u32,
}

/// Parses and validates one GLSL stage. `Err` carries a readable log.
fn parse_stage(stage: ShaderStage, source: &str) -> Result<StageInterface, String> {
    let source = source.trim_start();
    let naga_stage = match stage {
        ShaderStage::Vertex => naga::ShaderStage::Vertex,
        ShaderStage::Fragment => naga::ShaderStage::Fragment,
    };

    let mut frontend = naga::front::glsl::Frontend::default();
    let module = frontend
        .parse(&naga::front::glsl::Options::from(naga_stage), source)
        .map_err(|errors| errors.emit_to_string(source))?;

    naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::default(),
    )
    .validate(&module)
    .map_err(|err| err.emit_to_string(source))?;

    let (uniforms, block_size) = uniform_block(&module);
    Ok(StageInterface {
        module,
        uniforms,
        block_size,
    })
}

/// Member offsets and byte size of the block at set 0, binding 0.
fn uniform_block(module: &naga::Module) -> (HashMap<String, u32>, u32) {
    let block = module.global_variables.iter().find(|(_, var)| {
        var.space == naga::AddressSpace::Uniform
            && var.binding.as_ref().is_some_and(|binding| {
                binding.group == UNIFORM_GROUP && binding.binding == UNIFORM_BINDING
            })
    });

    let Some((_, var)) = block else {
        return (HashMap::new(), 0);
    };

    match &module.types[var.ty].inner {
        naga::TypeInner::Struct { members, span } => {
            let offsets = members
                .iter()
                .filter_map(|member| Some((member.name.clone()?, member.offset)))
                .collect();
            (offsets, *span)
        }
        _ => (HashMap::new(), 0),
    }
}

//=== Uniform Packing =====================================================

/// Bytes of `value` as laid out in a std140 block.
///
/// Matrix columns are padded to 16 bytes.
fn std140_bytes(value: UniformValue) -> Vec<u8> {
    fn bytes<T: bytemuck::Pod>(values: &[T]) -> Vec<u8> {
        bytemuck::cast_slice(values).to_vec()
    }
    fn padded_columns<const N: usize>(columns: &[[f32; N]]) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(columns.len() * 16);
        for column in columns {
            let mut padded = [0.0f32; 4];
            padded[..N].copy_from_slice(column);
            bytes.extend_from_slice(bytemuck::cast_slice(&padded));
        }
        bytes
    }

    match value {
        UniformValue::Int(v) => bytes(&[v]),
        UniformValue::IVec2(v) => bytes(&v.to_array()),
        UniformValue::IVec3(v) => bytes(&v.to_array()),
        UniformValue::IVec4(v) => bytes(&v.to_array()),
        UniformValue::UInt(v) => bytes(&[v]),
        UniformValue::UVec2(v) => bytes(&v.to_array()),
        UniformValue::UVec3(v) => bytes(&v.to_array()),
        UniformValue::UVec4(v) => bytes(&v.to_array()),
        UniformValue::Float(v) => bytes(&[v]),
        UniformValue::Vec2(v) => bytes(&v.to_array()),
        UniformValue::Vec3(v) => bytes(&v.to_array()),
        UniformValue::Vec4(v) => bytes(&v.to_array()),
        UniformValue::Mat2(m) => padded_columns(&m.to_cols_array_2d()),
        UniformValue::Mat3(m) => padded_columns(&m.to_cols_array_2d()),
        UniformValue::Mat4(m) => bytes(&m.to_cols_array()),
    }
}

//=== Device Objects ======================================================

struct ShaderObject {
    stage: ShaderStage,
    compiled: Option<CompiledShader>,
}

#[derive(Clone)]
struct CompiledShader {
    module: wgpu::ShaderModule,
    uniforms: HashMap<String, u32>,
    block_size: u32,
}

struct LinkedProgram {
    vertex: wgpu::ShaderModule,
    fragment: wgpu::ShaderModule,
    uniforms: HashMap<String, u32>,
}

struct ProgramObject {
    attached: Vec<Handle>,
    linked: Option<LinkedProgram>,
    /// CPU copy of the uniform block, snapshotted into every draw.
    block: Vec<u8>,
}

struct TextureObject {
    bind_group: wgpu::BindGroup,
}

struct VertexArrayObject {
    attributes: Vec<u32>,
    buffers: Option<(wgpu::Buffer, wgpu::Buffer)>,
    index_count: u32,
}

struct Draw {
    program: Handle,
    texture: Handle,
    vertex_array: Handle,
    block: Vec<u8>,
}

type PipelineKey = (Handle, Vec<u32>);

#[derive(Default)]
struct DeviceState {
    next_handle: Handle,
    shaders: HashMap<Handle, ShaderObject>,
    programs: HashMap<Handle, ProgramObject>,
    textures: HashMap<Handle, TextureObject>,
    vertex_arrays: HashMap<Handle, VertexArrayObject>,
    pipelines: HashMap<PipelineKey, Option<wgpu::RenderPipeline>>,
    current_program: Handle,
    current_texture: Handle,
    clear_color: [f32; 4],
    draws: Vec<Draw>,
}

impl DeviceState {
    fn allocate(&mut self) -> Handle {
        self.next_handle += 1;
        self.next_handle
    }
}

//=== WgpuDevice ==========================================================

/// Graphics device rendering into one window.
pub(crate) struct WgpuDevice {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: RefCell<wgpu::SurfaceConfiguration>,
    globals_layout: wgpu::BindGroupLayout,
    texture_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    sampler: wgpu::Sampler,
    white: wgpu::BindGroup,
    uniform_stride: u64,
    state: RefCell<DeviceState>,
}

impl WgpuDevice {
    //--- Construction -----------------------------------------------------

    /// Creates a device and configures `window`'s surface.
    ///
    /// Blocks until the adapter and device are ready.
    pub(crate) fn new(window: Arc<Window>, vsync: bool) -> Result<Self, String> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window).map_err(|e| e.to_string())?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            force_fallback_adapter: false,
            compatible_surface: Some(&surface),
        }))
        .map_err(|e| e.to_string())?;

        let info = adapter.get_info();
        info!(target: "gpu", "Using adapter {} ({:?})", info.name, info.backend);

        let limits = wgpu::Limits::downlevel_defaults().using_resolution(adapter.limits());
        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("ember_device"),
            required_features: wgpu::Features::empty(),
            required_limits: limits,
            memory_hints: wgpu::MemoryHints::default(),
            experimental_features: wgpu::ExperimentalFeatures::default(),
            trace: wgpu::Trace::default(),
        }))
        .map_err(|e| e.to_string())?;

        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first().copied())
            .ok_or("surface supports no texture format")?;
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .ok_or("surface supports no alpha mode")?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: if vsync {
                wgpu::PresentMode::AutoVsync
            } else {
                wgpu::PresentMode::AutoNoVsync
            },
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let globals_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("globals_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: UNIFORM_BINDING,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("texture_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("pipeline_layout"),
            bind_group_layouts: &[&globals_layout, &texture_layout],
            push_constant_ranges: &[],
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("nearest_repeat"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let alignment = u64::from(device.limits().min_uniform_buffer_offset_alignment).max(1);
        let uniform_stride = UNIFORM_BLOCK_BYTES.div_ceil(alignment) * alignment;

        let white = texture_bind_group(
            &device,
            &queue,
            &texture_layout,
            &sampler,
            (1, 1),
            &[255, 255, 255, 255],
        );

        debug!(
            target: "gpu",
            "Surface configured: {}x{} {:?} {:?}",
            config.width, config.height, config.format, config.present_mode
        );

        Ok(Self {
            surface,
            device,
            queue,
            config: RefCell::new(config),
            globals_layout,
            texture_layout,
            pipeline_layout,
            sampler,
            white,
            uniform_stride,
            state: RefCell::new(DeviceState::default()),
        })
    }

    //--- Surface ----------------------------------------------------------

    /// Reconfigures the surface if the drawable size changed.
    pub(crate) fn resize(&self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        let mut config = self.config.borrow_mut();
        if (config.width, config.height) == (width, height) {
            return;
        }
        config.width = width;
        config.height = height;
        self.surface.configure(&self.device, &config);
        debug!(target: "gpu", "Surface resized to {}x{}", width, height);
    }

    /// Renders every draw recorded since the last clear and presents.
    pub(crate) fn present_frame(&self) {
        let (clear_color, draws) = {
            let mut state = self.state.borrow_mut();
            (state.clear_color, std::mem::take(&mut state.draws))
        };

        let frame = match self.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                warn!(target: "gpu", "Surface lost, reconfiguring and skipping frame");
                self.surface.configure(&self.device, &self.config.borrow());
                return;
            }
            Err(err) => {
                error!(target: "gpu", "Failed to acquire frame: {}", err);
                return;
            }
        };
        let view = frame.texture.create_view(&wgpu::TextureViewDescriptor::default());

        let prepared = self.prepare(&draws);
        let globals = self.globals(&draws);

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("frame_encoder"),
        });

        {
            let [r, g, b, a] = clear_color.map(f64::from);
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("frame_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            if let Some(globals) = &globals {
                for draw in &prepared {
                    pass.set_pipeline(&draw.pipeline);
                    pass.set_bind_group(0, globals, &[draw.uniform_offset]);
                    pass.set_bind_group(1, &draw.texture, &[]);
                    pass.set_vertex_buffer(0, draw.vertices.slice(..));
                    pass.set_index_buffer(draw.indices.slice(..), wgpu::IndexFormat::Uint32);
                    pass.draw_indexed(0..draw.index_count, 0, 0..1);
                }
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
    }

    //--- Frame Assembly ---------------------------------------------------

    /// Resolves pipelines, buffers and texture groups for each draw.
    fn prepare(&self, draws: &[Draw]) -> Vec<PreparedDraw> {
        let mut state = self.state.borrow_mut();
        let mut prepared = Vec::with_capacity(draws.len());

        for (slot, draw) in draws.iter().enumerate() {
            let Some(vertex_array) = state.vertex_arrays.get(&draw.vertex_array) else {
                trace!(target: "gpu", "Vertex array {} deleted before present", draw.vertex_array);
                continue;
            };
            let Some((vertices, indices)) = vertex_array.buffers.clone() else {
                continue;
            };
            let (attributes, index_count) = (vertex_array.attributes.clone(), vertex_array.index_count);

            let Some(pipeline) = self.pipeline(&mut state, draw.program, attributes) else {
                continue;
            };
            let texture = match draw.texture {
                NULL_HANDLE => self.white.clone(),
                handle => match state.textures.get(&handle) {
                    Some(texture) => texture.bind_group.clone(),
                    None => self.white.clone(),
                },
            };

            prepared.push(PreparedDraw {
                pipeline,
                texture,
                vertices,
                indices,
                index_count,
                uniform_offset: (slot as u64 * self.uniform_stride) as u32,
            });
        }
        prepared
    }

    /// One buffer holding every draw's uniform block at its stride slot.
    fn globals(&self, draws: &[Draw]) -> Option<wgpu::BindGroup> {
        if draws.is_empty() {
            return None;
        }

        let stride = self.uniform_stride as usize;
        let mut contents = vec![0u8; stride * draws.len()];
        for (slot, draw) in draws.iter().enumerate() {
            let len = draw.block.len().min(stride);
            contents[slot * stride..slot * stride + len].copy_from_slice(&draw.block[..len]);
        }

        let buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("frame_uniforms"),
            contents: &contents,
            usage: wgpu::BufferUsages::UNIFORM,
        });

        Some(self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("frame_globals"),
            layout: &self.globals_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: UNIFORM_BINDING,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(UNIFORM_BLOCK_BYTES),
                }),
            }],
        }))
    }

    /// Cached pipeline for a program and vertex layout.
    fn pipeline(
        &self,
        state: &mut DeviceState,
        program: Handle,
        attributes: Vec<u32>,
    ) -> Option<wgpu::RenderPipeline> {
        let key = (program, attributes);
        if let Some(cached) = state.pipelines.get(&key) {
            return cached.clone();
        }

        let linked = state.programs.get(&program)?.linked.as_ref()?;
        let created = self.create_pipeline(program, linked, &key.1);
        state.pipelines.insert(key, created.clone());
        created
    }

    fn create_pipeline(
        &self,
        program: Handle,
        linked: &LinkedProgram,
        attributes: &[u32],
    ) -> Option<wgpu::RenderPipeline> {
        let mut offset = 0;
        let vertex_attributes: Vec<wgpu::VertexAttribute> = attributes
            .iter()
            .enumerate()
            .map(|(location, &count)| {
                let attribute = wgpu::VertexAttribute {
                    format: float_format(count),
                    offset,
                    shader_location: location as u32,
                };
                offset += u64::from(count) * 4;
                attribute
            })
            .collect();

        let format = self.config.borrow().format;

        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let pipeline = self.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("program_pipeline"),
            layout: Some(&self.pipeline_layout),
            vertex: wgpu::VertexState {
                module: &linked.vertex,
                entry_point: Some("main"),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: offset,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &vertex_attributes,
                }],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &linked.fragment,
                entry_point: Some("main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        match pollster::block_on(self.device.pop_error_scope()) {
            None => {
                debug!(target: "gpu", "Created pipeline for program {} {:?}", program, attributes);
                Some(pipeline)
            }
            Some(err) => {
                error!(target: "gpu", "Pipeline for program {} rejected:\n{}", program, err);
                None
            }
        }
    }
}

struct PreparedDraw {
    pipeline: wgpu::RenderPipeline,
    texture: wgpu::BindGroup,
    vertices: wgpu::Buffer,
    indices: wgpu::Buffer,
    index_count: u32,
    uniform_offset: u32,
}

fn float_format(count: u32) -> wgpu::VertexFormat {
    match count {
        1 => wgpu::VertexFormat::Float32,
        2 => wgpu::VertexFormat::Float32x2,
        3 => wgpu::VertexFormat::Float32x3,
        _ => wgpu::VertexFormat::Float32x4,
    }
}

/// Expands tightly packed RGB rows to RGBA.
fn rgba_pixels(format: PixelFormat, pixels: &[u8]) -> Cow<'_, [u8]> {
    match format {
        PixelFormat::Rgba8 => Cow::Borrowed(pixels),
        PixelFormat::Rgb8 => Cow::Owned(
            pixels
                .chunks_exact(3)
                .flat_map(|rgb| [rgb[0], rgb[1], rgb[2], 255])
                .collect(),
        ),
    }
}

fn texture_bind_group(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    layout: &wgpu::BindGroupLayout,
    sampler: &wgpu::Sampler,
    (width, height): (u32, u32),
    rgba: &[u8],
) -> wgpu::BindGroup {
    let size = wgpu::Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("texture"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        rgba,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * width),
            rows_per_image: Some(height),
        },
        size,
    );

    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("texture_group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    })
}

//=== GraphicsDevice Implementation =======================================

impl GraphicsDevice for WgpuDevice {
    //--- Shader Objects ---------------------------------------------------

    fn create_shader(&self, stage: ShaderStage) -> Handle {
        let mut state = self.state.borrow_mut();
        let handle = state.allocate();
        state.shaders.insert(
            handle,
            ShaderObject {
                stage,
                compiled: None,
            },
        );
        handle
    }

    fn compile_shader(&self, shader: Handle, source: &str) -> Result<(), String> {
        let stage = match self.state.borrow().shaders.get(&shader) {
            Some(object) => object.stage,
            None => return Err(format!("unknown shader object {shader}")),
        };

        let interface = parse_stage(stage, source)?;
        if u64::from(interface.block_size) > UNIFORM_BLOCK_BYTES {
            return Err(format!(
                "uniform block of {} bytes exceeds the {} byte limit",
                interface.block_size, UNIFORM_BLOCK_BYTES
            ));
        }

        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let module = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("glsl_stage"),
            source: wgpu::ShaderSource::Naga(Cow::Owned(interface.module)),
        });
        if let Some(err) = pollster::block_on(self.device.pop_error_scope()) {
            return Err(err.to_string());
        }

        if let Some(object) = self.state.borrow_mut().shaders.get_mut(&shader) {
            object.compiled = Some(CompiledShader {
                module,
                uniforms: interface.uniforms,
                block_size: interface.block_size,
            });
        }
        Ok(())
    }

    fn delete_shader(&self, shader: Handle) {
        self.state.borrow_mut().shaders.remove(&shader);
    }

    //--- Program Objects --------------------------------------------------

    fn create_program(&self) -> Handle {
        let mut state = self.state.borrow_mut();
        let handle = state.allocate();
        state.programs.insert(
            handle,
            ProgramObject {
                attached: Vec::new(),
                linked: None,
                block: Vec::new(),
            },
        );
        handle
    }

    fn attach_shader(&self, program: Handle, shader: Handle) {
        if let Some(object) = self.state.borrow_mut().programs.get_mut(&program) {
            object.attached.push(shader);
        }
    }

    fn detach_shader(&self, program: Handle, shader: Handle) {
        if let Some(object) = self.state.borrow_mut().programs.get_mut(&program) {
            object.attached.retain(|attached| *attached != shader);
        }
    }

    fn link_program(&self, program: Handle) -> Result<(), String> {
        let mut state = self.state.borrow_mut();
        let attached = match state.programs.get(&program) {
            Some(object) => object.attached.clone(),
            None => return Err(format!("unknown program object {program}")),
        };

        let stage = |wanted: ShaderStage| -> Result<CompiledShader, String> {
            attached
                .iter()
                .filter_map(|handle| state.shaders.get(handle))
                .find(|object| object.stage == wanted)
                .and_then(|object| object.compiled.clone())
                .ok_or_else(|| format!("no compiled {wanted} shader attached"))
        };
        let vertex = stage(ShaderStage::Vertex)?;
        let fragment = stage(ShaderStage::Fragment)?;

        let mut uniforms = fragment.uniforms;
        uniforms.extend(vertex.uniforms);
        let block_size = vertex.block_size.max(fragment.block_size) as usize;

        if let Some(object) = state.programs.get_mut(&program) {
            object.block = vec![0; block_size];
            object.linked = Some(LinkedProgram {
                vertex: vertex.module,
                fragment: fragment.module,
                uniforms,
            });
        }
        Ok(())
    }

    fn use_program(&self, program: Handle) {
        self.state.borrow_mut().current_program = program;
    }

    fn delete_program(&self, program: Handle) {
        let mut state = self.state.borrow_mut();
        state.programs.remove(&program);
        state.pipelines.retain(|(owner, _), _| *owner != program);
        if state.current_program == program {
            state.current_program = NULL_HANDLE;
        }
    }

    //--- Uniforms ---------------------------------------------------------

    fn uniform_location(&self, program: Handle, name: &str) -> Option<UniformLocation> {
        let state = self.state.borrow();
        let offset = *state.programs.get(&program)?.linked.as_ref()?.uniforms.get(name)?;
        Some(UniformLocation(offset as i32))
    }

    fn upload_uniform(&self, location: UniformLocation, value: UniformValue) {
        let mut state = self.state.borrow_mut();
        let current = state.current_program;
        let Some(program) = state.programs.get_mut(&current) else {
            trace!(target: "gpu", "Uniform upload with no program in use");
            return;
        };

        let bytes = std140_bytes(value);
        let Ok(start) = usize::try_from(location.0) else {
            return;
        };
        match program.block.get_mut(start..start + bytes.len()) {
            Some(target) => target.copy_from_slice(&bytes),
            None => warn!(
                target: "gpu",
                "Uniform at offset {} overruns the {} byte block of program {}",
                start,
                program.block.len(),
                current
            ),
        }
    }

    //--- Textures ---------------------------------------------------------

    fn create_texture(&self, desc: &TextureDesc<'_>) -> Handle {
        let rgba = rgba_pixels(desc.format, desc.pixels);
        let bind_group = texture_bind_group(
            &self.device,
            &self.queue,
            &self.texture_layout,
            &self.sampler,
            (desc.width, desc.height),
            &rgba,
        );

        let mut state = self.state.borrow_mut();
        let handle = state.allocate();
        state.textures.insert(handle, TextureObject { bind_group });
        handle
    }

    fn bind_texture(&self, texture: Handle) {
        self.state.borrow_mut().current_texture = texture;
    }

    fn delete_texture(&self, texture: Handle) {
        let mut state = self.state.borrow_mut();
        state.textures.remove(&texture);
        if state.current_texture == texture {
            state.current_texture = NULL_HANDLE;
        }
    }

    //--- Vertex Arrays ----------------------------------------------------

    fn create_vertex_array(&self, desc: &VertexArrayDesc<'_>) -> Handle {
        let buffers = (!desc.vertices.is_empty() && !desc.indices.is_empty()).then(|| {
            let vertices = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("vertices"),
                contents: bytemuck::cast_slice(desc.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
            let indices = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("indices"),
                contents: bytemuck::cast_slice(desc.indices),
                usage: wgpu::BufferUsages::INDEX,
            });
            (vertices, indices)
        });

        let mut state = self.state.borrow_mut();
        let handle = state.allocate();
        state.vertex_arrays.insert(
            handle,
            VertexArrayObject {
                attributes: desc.attributes.to_vec(),
                buffers,
                index_count: desc.indices.len() as u32,
            },
        );
        handle
    }

    fn delete_vertex_array(&self, vertex_array: Handle) {
        self.state.borrow_mut().vertex_arrays.remove(&vertex_array);
    }

    fn draw_indexed(&self, vertex_array: Handle) {
        let mut state = self.state.borrow_mut();
        let (program, texture) = (state.current_program, state.current_texture);

        let Some(block) = state
            .programs
            .get(&program)
            .filter(|object| object.linked.is_some())
            .map(|object| object.block.clone())
        else {
            trace!(target: "gpu", "Draw of vertex array {} with no linked program", vertex_array);
            return;
        };

        state.draws.push(Draw {
            program,
            texture,
            vertex_array,
            block,
        });
    }

    //--- Frame Buffer -----------------------------------------------------

    fn clear(&self, rgba: [f32; 4]) {
        let mut state = self.state.borrow_mut();
        state.clear_color = rgba;
        state.draws.clear();
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
