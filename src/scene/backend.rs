//! Render backends.
//!
//! The scene host hands a fully resolved [`Frame`] to a [`RenderBackend`]
//! once per tick. [`HeadlessBackend`] is a CPU rasterizer that splats
//! projected vertices with Lambert shading; it keeps a readable framebuffer
//! so frames can be captured without a GPU.

use glam::{Mat4, Vec3, Vec4, Vec4Swizzles};

use crate::errors::{Result, ViewerError};
use crate::resources::GpuResources;
use crate::scene::light::{Light, LightKind};
use crate::scene::model::DrawItem;

/// Everything a backend needs to draw one frame.
pub struct Frame<'a> {
    pub view_projection: Mat4,
    pub clear_color: Vec4,
    pub lights: &'a [Light],
    pub environment_intensity: f32,
    pub draws: &'a [DrawItem],
}

/// RGBA8 pixels of the last rendered frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

pub trait RenderBackend {
    /// Resizes the surface. The next `render` call draws at the new size.
    fn resize(&mut self, width: u32, height: u32);

    fn size(&self) -> (u32, u32);

    fn render(&mut self, frame: &Frame<'_>, resources: &GpuResources) -> Result<()>;

    /// The last completed frame, or `None` if nothing was rendered yet.
    fn read_pixels(&self) -> Option<FrameBuffer>;
}

#[derive(Debug)]
pub struct HeadlessBackend {
    width: u32,
    height: u32,
    color: Vec<[u8; 4]>,
    depth: Vec<f32>,
    rendered: bool,
}

impl HeadlessBackend {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        let mut backend = Self {
            width: 0,
            height: 0,
            color: Vec::new(),
            depth: Vec::new(),
            rendered: false,
        };
        backend.resize(width, height);
        backend
    }

    fn clear(&mut self, color: Vec4) {
        self.color.fill(to_rgba8(color));
        self.depth.fill(f32::INFINITY);
    }

    fn shade(frame: &Frame<'_>, normal: Vec3, albedo: Vec4) -> Vec4 {
        let mut light = Vec3::ZERO;
        for l in frame.lights {
            match l.kind {
                LightKind::Ambient => light += l.color * l.intensity,
                LightKind::Directional { .. } => {
                    if let Some(dir) = l.direction_to_light() {
                        light += l.color * l.intensity * normal.dot(dir).max(0.0);
                    }
                }
            }
        }
        // Environment contributes a flat fill on top of the analytic lights.
        light += Vec3::splat(0.1 * frame.environment_intensity);
        (albedo.xyz() * light).min(Vec3::ONE).extend(albedo.w)
    }
}

impl RenderBackend for HeadlessBackend {
    fn resize(&mut self, width: u32, height: u32) {
        self.width = width.max(1);
        self.height = height.max(1);
        let n = (self.width * self.height) as usize;
        self.color = vec![[0; 4]; n];
        self.depth = vec![f32::INFINITY; n];
        self.rendered = false;
    }

    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn render(&mut self, frame: &Frame<'_>, resources: &GpuResources) -> Result<()> {
        self.clear(frame.clear_color);

        let (w, h) = (self.width as f32, self.height as f32);
        for item in frame.draws {
            let Some(geometry) = resources.geometry(item.part.geometry) else {
                return Err(ViewerError::Render(format!(
                    "draw references released geometry {:?}",
                    item.part.geometry
                )));
            };
            let Some(material) = resources.material(item.part.material) else {
                return Err(ViewerError::Render(format!(
                    "draw references released material {:?}",
                    item.part.material
                )));
            };
            let texture = material.base_color_texture.and_then(|t| resources.texture(t));

            let mvp = frame.view_projection * Mat4::from(item.world);
            for (i, &p) in geometry.positions.iter().enumerate() {
                let clip = mvp * p.extend(1.0);
                if clip.w <= 0.0 {
                    continue;
                }
                let ndc = clip.xyz() / clip.w;
                if !(-1.0..=1.0).contains(&ndc.x) || !(-1.0..=1.0).contains(&ndc.y) || !(0.0..=1.0).contains(&ndc.z) {
                    continue;
                }
                let x = (((ndc.x + 1.0) * 0.5 * w) as u32).min(self.width - 1);
                let y = (((1.0 - ndc.y) * 0.5 * h) as u32).min(self.height - 1);
                let idx = (y * self.width + x) as usize;
                if ndc.z >= self.depth[idx] {
                    continue;
                }
                self.depth[idx] = ndc.z;

                let mut albedo = material.base_color;
                if let (Some(tex), Some(uv)) = (&texture, geometry.uvs.get(i)) {
                    albedo *= Vec4::from_array(tex.sample(uv.x, uv.y));
                }
                let normal = item.world.transform_vector3(geometry.normal(i)).normalize_or_zero();
                self.color[idx] = to_rgba8(Self::shade(frame, normal, albedo));
            }
        }

        self.rendered = true;
        Ok(())
    }

    fn read_pixels(&self) -> Option<FrameBuffer> {
        self.rendered.then(|| FrameBuffer {
            width: self.width,
            height: self.height,
            pixels: bytemuck::cast_slice(&self.color).to_vec(),
        })
    }
}

fn to_rgba8(color: Vec4) -> [u8; 4] {
    let c = (color.clamp(Vec4::ZERO, Vec4::ONE) * 255.0).round();
    [c.x as u8, c.y as u8, c.z as u8, c.w as u8]
}
