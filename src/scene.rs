use cgmath::Rad;

use crate::ad_texture::{TexturePool, TEXTURE_COUNT, TEXTURE_SIZE};
use crate::color::{srgb_to_linear, to_linear};
use crate::hud::{build_hud, UiGeometry};
use crate::input::ToggleState;
use crate::lighting::SceneLighting;
use crate::profiler::{self, FrameCtx};
use crate::tiles::{TileLayout, TubeShape};
use crate::tube::{TubeMesh, TubeRenderer};

pub const GRID_EXTENT: f32 = 900.0;
pub const GRID_STEP: f32 = 40.0;
const GRID_COLOR: [u8; 4] = [255, 255, 255, 32];
const BACKGROUND_GREY: f32 = 12.0 / 255.0;
const SPIN_PER_FRAME: f32 = 0.01;

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LineVertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
}

/// Square floor grid centred on the origin in the y = 0 plane, as a line
/// list. Lines run every `step` from `-extent/2` to `extent/2` inclusive.
pub fn grid_lines(extent: f32, step: f32) -> Vec<LineVertex> {
    let mut vertices = Vec::new();
    if extent <= 0.0 || step <= 0.0 {
        return vertices;
    }
    let color = to_linear(GRID_COLOR);
    let half = extent / 2.0;
    let count = (extent / step).floor() as usize;
    for i in 0..=count {
        let offset = -half + i as f32 * step;
        vertices.push(LineVertex {
            position: [offset, 0.0, -half],
            color,
        });
        vertices.push(LineVertex {
            position: [offset, 0.0, half],
            color,
        });
        vertices.push(LineVertex {
            position: [-half, 0.0, offset],
            color,
        });
        vertices.push(LineVertex {
            position: [half, 0.0, offset],
            color,
        });
    }
    vertices
}

/// Everything the renderer needs for one frame.
pub struct FrameScene {
    pub clear_color: wgpu::Color,
    pub show_grid: bool,
    pub lighting: SceneLighting,
    pub tube: TubeMesh,
    pub hud: UiGeometry,
}

/// Owns the static tile layout and the texture pool and turns a clock
/// reading plus a toggle snapshot into a [`FrameScene`].
pub struct SceneComposer {
    layout: TileLayout,
    pool: TexturePool,
    tube: TubeRenderer,
    lighting: SceneLighting,
    viewport: (f32, f32),
    frame_count: u64,
}

impl SceneComposer {
    pub fn new(shape: TubeShape, viewport: (f32, f32)) -> Self {
        Self::with_pool(shape, TexturePool::new(TEXTURE_COUNT, TEXTURE_SIZE), viewport)
    }

    pub fn with_pool(shape: TubeShape, pool: TexturePool, viewport: (f32, f32)) -> Self {
        Self {
            layout: TileLayout::new(&shape, pool.len()),
            pool,
            tube: TubeRenderer::new(shape),
            lighting: SceneLighting::default(),
            viewport,
            frame_count: 0,
        }
    }

    pub fn layout(&self) -> &TileLayout {
        &self.layout
    }

    pub fn textures(&self) -> &TexturePool {
        &self.pool
    }

    pub fn set_viewport(&mut self, viewport: (f32, f32)) {
        self.viewport = viewport;
    }

    /// Auto-rotation angle for the current frame.
    pub fn spin(&self, toggles: &ToggleState) -> Rad<f32> {
        if toggles.auto_rotate {
            Rad(self.frame_count as f32 * SPIN_PER_FRAME)
        } else {
            Rad(0.0)
        }
    }

    pub fn compose(
        &mut self,
        time: f32,
        toggles: ToggleState,
        frame: &Option<FrameCtx>,
    ) -> FrameScene {
        self.frame_count += 1;

        profiler::scope(frame, "textures", || self.pool.regenerate(time));

        let spin = self.spin(&toggles);
        let tube = profiler::scope(frame, "tube", || {
            let transform = self.tube.tube_transform(spin);
            self.tube
                .build_mesh(&self.layout, time, toggles, transform, self.pool.len())
        });

        let grey = srgb_to_linear(BACKGROUND_GREY) as f64;
        FrameScene {
            clear_color: wgpu::Color {
                r: grey,
                g: grey,
                b: grey,
                a: 1.0,
            },
            show_grid: toggles.show_grid,
            lighting: self.lighting,
            tube,
            hud: build_hud(&toggles, self.viewport),
        }
    }
}
