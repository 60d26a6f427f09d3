/// Decoded RGBA8 texture.
#[derive(Debug, Clone)]
pub struct Texture {
    pub label: String,
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl Texture {
    /// Wraps RGBA8 pixels; `None` if `data` does not hold `width * height` texels.
    #[must_use]
    pub fn from_rgba8(label: impl Into<String>, width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        (data.len() == width as usize * height as usize * 4).then(|| Self {
            label: label.into(),
            width,
            height,
            data,
        })
    }

    /// Expands tightly packed RGB8 pixels to RGBA8 with opaque alpha.
    #[must_use]
    pub fn from_rgb8(label: impl Into<String>, width: u32, height: u32, data: &[u8]) -> Option<Self> {
        let rgba = data
            .chunks_exact(3)
            .flat_map(|p| [p[0], p[1], p[2], 255])
            .collect();
        Self::from_rgba8(label, width, height, rgba)
    }

    /// Nearest-neighbour lookup with repeat wrapping. Returns linear `[0, 1]` RGBA.
    #[must_use]
    pub fn sample(&self, u: f32, v: f32) -> [f32; 4] {
        if self.width == 0 || self.height == 0 {
            return [1.0; 4];
        }
        let x = (u.rem_euclid(1.0) * self.width as f32) as u32 % self.width;
        let y = (v.rem_euclid(1.0) * self.height as f32) as u32 % self.height;
        let i = ((y * self.width + x) * 4) as usize;
        let px = &self.data[i..i + 4];
        [px[0], px[1], px[2], px[3]].map(|b| f32::from(b) / 255.0)
    }
}
