// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;

use crate::errors::BackendResult;
use crate::model::AssetRef;
use crate::traits::{ImageGenerator, ImageRequest};

pub const DEFAULT_IMAGE_WIDTH: u32 = 270;
pub const DEFAULT_IMAGE_HEIGHT: u32 = 480;

/// Writes a vertical two-colour gradient as a binary PPM, with colours
/// derived from the scene text so each scene looks different.
#[derive(Debug, Clone)]
pub struct GradientImageGenerator {
    name: String,
    width: u32,
    height: u32,
}

impl GradientImageGenerator {
    pub fn new(name: String, width: u32, height: u32) -> Self {
        Self {
            name,
            width: width.max(1),
            height: height.max(1),
        }
    }

    fn render(&self, seed: u64) -> Vec<u8> {
        let top = palette(seed);
        let bottom = palette(seed.rotate_left(17));
        let header = format!("P6\n{} {}\n255\n", self.width, self.height);

        let mut pixels = Vec::with_capacity(header.len() + (self.width * self.height * 3) as usize);
        pixels.extend_from_slice(header.as_bytes());
        for y in 0..self.height {
            let t = y as f64 / self.height.max(2).saturating_sub(1) as f64;
            let row: Vec<u8> = (0..3)
                .map(|c| (top[c] as f64 + (bottom[c] as f64 - top[c] as f64) * t).round() as u8)
                .collect();
            for _ in 0..self.width {
                pixels.extend_from_slice(&row);
            }
        }
        pixels
    }
}

/// FNV-1a, stable across runs and platforms.
fn seed_for(text: &str) -> u64 {
    text.bytes().fold(0xcbf29ce484222325u64, |hash, byte| {
        (hash ^ byte as u64).wrapping_mul(0x100000001b3)
    })
}

fn palette(seed: u64) -> [u8; 3] {
    [
        64 + (seed & 0x7f) as u8,
        64 + ((seed >> 8) & 0x7f) as u8,
        64 + ((seed >> 16) & 0x7f) as u8,
    ]
}

#[async_trait]
impl ImageGenerator for GradientImageGenerator {
    async fn generate_image(&self, request: &ImageRequest) -> BackendResult<AssetRef> {
        let path = request.ctx.output_path("image", "ppm");
        let seed = seed_for(&format!("{}|{}", request.style, request.scene_text));
        tokio::fs::write(&path, self.render(seed)).await?;
        Ok(AssetRef::file(path))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::JobId;
    use crate::traits::SceneContext;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_writes_ppm_into_work_dir() {
        let dir = TempDir::new().unwrap();
        let generator = GradientImageGenerator::new("image".into(), 4, 3);
        let request = ImageRequest {
            ctx: SceneContext {
                job_id: JobId::new(),
                scene_index: 1,
                work_dir: dir.path().to_path_buf(),
            },
            scene_text: "a harbour at dawn".into(),
            style: "cinematic".into(),
            reference_images: vec![],
        };

        let asset = generator.generate_image(&request).await.unwrap();
        let path = asset.as_path().unwrap().to_path_buf();
        assert_eq!(path, dir.path().join("scene-01-image.ppm"));

        let bytes = std::fs::read(path).unwrap();
        assert!(bytes.starts_with(b"P6\n4 3\n255\n"));
        assert_eq!(bytes.len(), "P6\n4 3\n255\n".len() + 4 * 3 * 3);
    }

    #[test]
    fn test_colours_depend_on_text() {
        assert_eq!(seed_for("same"), seed_for("same"));
        assert_ne!(palette(seed_for("harbour")), palette(seed_for("desert")));
    }
}
