//=========================================================================
// Ember Demo
//
// Two scenes driven by the native Winit backend:
// - EditorScene: fades the clear color to black after Space, then hands
//   over to EngineScene
// - EngineScene: scrolls the scene camera over a tinted backdrop and a
//   quad sampling a generated checker texture
//
// Escape quits from either scene. Set RUST_LOG to change verbosity.
//
//=========================================================================

use ember_engine::gpu::DecodedImage;
use ember_engine::prelude::*;
use log::{error, info, warn};

//=== EditorScene =========================================================

/// Seconds the fade takes before switching scenes.
const FADE_DURATION: f32 = 2.0;

/// Clear color channels drop by this much per second while fading.
const FADE_RATE: f32 = 5.0;

struct EditorScene {
    fading: bool,
    remaining: f32,
}

impl EditorScene {
    fn new() -> Self {
        Self {
            fading: false,
            remaining: FADE_DURATION,
        }
    }
}

impl Scene for EditorScene {
    fn on_start(&mut self, _ctx: &mut SceneContext<'_>) {
        info!("Editor");
    }

    fn on_update(&mut self, ctx: &mut SceneContext<'_>, dt: f32) {
        if ctx.keyboard().was_pressed(KeyCode::Escape) {
            ctx.quit();
            return;
        }

        if !self.fading && ctx.keyboard().is_pressed(KeyCode::Space) {
            self.fading = true;
        }

        if self.fading && self.remaining > 0.0 {
            self.remaining -= dt;
            let c = ctx.clear_color();
            let step = dt * FADE_RATE;
            ctx.set_clear_color(ClearColor::rgba(c.r - step, c.g - step, c.b - step, c.a));
        } else if self.fading && !ctx.has_pending_transition() {
            ctx.go_to(EngineScene::default());
        }
    }
}

//=== EngineScene =========================================================

const CHECKER_SIZE: u32 = 8;
const SCROLL_SPEED: f32 = 50.0;

const TEXTURED: &str = r#"
#type vertex
#version 450

layout(location = 0) in vec3 aPos;
layout(location = 1) in vec2 aUv;

layout(set = 0, binding = 0) uniform Globals {
    mat4  uProjection;
    mat4  uView;
    float uTime;
};

layout(location = 0) out vec2 fUv;

void main()
{
    fUv = aUv;
    gl_Position = uProjection * uView * vec4(aPos, 1.0);
}

#type fragment
#version 450

layout(location = 0) in vec2 fUv;

layout(set = 1, binding = 0) uniform texture2D uTexture;
layout(set = 1, binding = 1) uniform sampler uSampler;

layout(location = 0) out vec4 color;

void main()
{
    color = texture(sampler2D(uTexture, uSampler), fUv);
}
"#;

const QUAD_INDICES: [u32; 6] = [0, 1, 2, 2, 3, 0];

#[derive(Default)]
struct EngineScene {
    shader: Option<Shader>,
    texture: Option<Texture>,
    quad: Option<Mesh>,
    backdrop: Option<Mesh>,
}

impl EngineScene {
    fn checker() -> DecodedImage {
        let mut pixels = Vec::with_capacity((CHECKER_SIZE * CHECKER_SIZE * 4) as usize);
        for y in 0..CHECKER_SIZE {
            for x in 0..CHECKER_SIZE {
                let v = if (x + y) % 2 == 0 { 0xff } else { 0x20 };
                pixels.extend_from_slice(&[v, v, v, 0xff]);
            }
        }
        DecodedImage {
            pixels,
            width: CHECKER_SIZE,
            height: CHECKER_SIZE,
            channels: 4,
        }
    }

    /// Position + uv, repeating the texture four times per side.
    fn quad(gfx: &Gfx) -> Result<Mesh, ResourceError> {
        #[rustfmt::skip]
        let vertices = [
            100.0, 100.0, 0.0,   0.0, 0.0,
            612.0, 100.0, 0.0,   4.0, 0.0,
            612.0, 612.0, 0.0,   4.0, 4.0,
            100.0, 612.0, 0.0,   0.0, 4.0,
        ];
        Mesh::new(gfx, &vertices, &QUAD_INDICES, &[3, 2])
    }

    /// Position + color, laid out for the built-in camera program.
    fn backdrop(gfx: &Gfx) -> Result<Mesh, ResourceError> {
        #[rustfmt::skip]
        let vertices = [
            0.0,    0.0,   0.0,   0.2, 0.3, 0.8, 1.0,
            1280.0, 0.0,   0.0,   0.8, 0.2, 0.3, 1.0,
            1280.0, 672.0, 0.0,   0.3, 0.8, 0.2, 1.0,
            0.0,    672.0, 0.0,   0.8, 0.8, 0.2, 1.0,
        ];
        Mesh::new(gfx, &vertices, &QUAD_INDICES, &[3, 4])
    }
}

impl Scene for EngineScene {
    fn on_start(&mut self, ctx: &mut SceneContext<'_>) {
        info!("Engine");
        ctx.set_clear_color(ClearColor::rgb(0.1, 0.1, 0.15));

        let gfx = ctx.gfx();
        match Shader::new(gfx, TEXTURED) {
            Ok(shader) => self.shader = Some(shader),
            Err(e) => warn!("Textured shader unavailable: {}", e),
        }
        match Texture::from_image(gfx, Self::checker()) {
            Ok(texture) => self.texture = Some(texture),
            Err(e) => warn!("Checker texture unavailable: {}", e),
        }
        match (Self::quad(gfx), Self::backdrop(gfx)) {
            (Ok(quad), Ok(backdrop)) => {
                self.quad = Some(quad);
                self.backdrop = Some(backdrop);
            }
            (Err(e), _) | (_, Err(e)) => warn!("Scene geometry unavailable: {}", e),
        }
    }

    fn on_update(&mut self, ctx: &mut SceneContext<'_>, dt: f32) {
        if ctx.keyboard().was_pressed(KeyCode::Escape) {
            ctx.quit();
            return;
        }

        let camera = ctx.camera();
        camera.translate(-dt * SCROLL_SPEED, 0.0);

        if let Some(backdrop) = &self.backdrop {
            camera.begin();
            backdrop.draw();
            camera.end();
        }

        if let (Some(shader), Some(texture), Some(quad)) =
            (self.shader.as_mut(), self.texture.as_mut(), self.quad.as_ref())
        {
            shader.begin_with_camera(camera);
            texture.begin();
            quad.draw();
            texture.end();
            shader.end();
        }
    }

    fn on_end(&mut self, _ctx: &mut SceneContext<'_>) {
        self.quad = None;
        self.backdrop = None;
        self.texture = None;
        self.shader = None;
    }
}

//=== Entry Point =========================================================

fn main() {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info")).init();

    let mut window = WindowBuilder::new().with_title("Ember").build();
    if let Err(e) = window.run(&mut WinitBackend::new(), EditorScene::new()) {
        error!("Ember exited with an error: {}", e);
        std::process::exit(1);
    }
}
