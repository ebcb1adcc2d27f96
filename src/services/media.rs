//! 上传图片的规范化与落盘
//!
//! 所有图片统一居中裁剪到配置的宽高比，宽度超出上限时等比缩小，
//! 以 JPEG 写入 `media.root` 下的分类目录。

use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageFormat, imageops::FilterType};
use tracing::{debug, warn};

use crate::config::MediaConfig;
use crate::errors::{PortalError, Result};

/// 图片用途，对应存储子目录
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Article,
    AuthorPhoto,
    Feedback,
}

impl MediaKind {
    pub fn dir(&self) -> &'static str {
        match self {
            MediaKind::Article => "noticias",
            MediaKind::AuthorPhoto => "autores",
            MediaKind::Feedback => "feedbacks",
        }
    }
}

/// 居中裁剪区域 (x, y, width, height)
pub fn center_crop_box(width: u32, height: u32, aspect_w: u32, aspect_h: u32) -> (u32, u32, u32, u32) {
    if aspect_w == 0 || aspect_h == 0 || width == 0 || height == 0 {
        return (0, 0, width, height);
    }

    let (w, h, aw, ah) = (
        u64::from(width),
        u64::from(height),
        u64::from(aspect_w),
        u64::from(aspect_h),
    );

    if w * ah > h * aw {
        // 过宽：裁左右
        let new_w = (h * aw / ah).max(1);
        let x = (w - new_w) / 2;
        (x as u32, 0, new_w as u32, height)
    } else {
        // 过高：裁上下
        let new_h = (w * ah / aw).max(1);
        let y = (h - new_h) / 2;
        (0, y as u32, width, new_h as u32)
    }
}

/// 裁剪 + 缩放 + 转 JPEG
pub fn normalize_image(
    bytes: &[u8],
    aspect_w: u32,
    aspect_h: u32,
    max_width: u32,
) -> Result<Vec<u8>> {
    let img = image::load_from_memory(bytes)?;
    let (x, y, w, h) = center_crop_box(img.width(), img.height(), aspect_w, aspect_h);
    let mut cropped = img.crop_imm(x, y, w, h);

    if max_width > 0 && cropped.width() > max_width {
        let new_h = (u64::from(cropped.height()) * u64::from(max_width)
            / u64::from(cropped.width()))
        .max(1) as u32;
        cropped = cropped.resize_exact(max_width, new_h, FilterType::Lanczos3);
    }

    // JPEG 不支持透明通道
    let rgb = DynamicImage::ImageRgb8(cropped.to_rgb8());
    let mut out = Cursor::new(Vec::new());
    rgb.write_to(&mut out, ImageFormat::Jpeg)?;
    Ok(out.into_inner())
}

/// 媒体文件存储
#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
    aspect_width: u32,
    aspect_height: u32,
    max_width: u32,
    max_upload_bytes: usize,
}

impl MediaStore {
    pub fn new(config: &MediaConfig) -> Self {
        Self {
            root: PathBuf::from(&config.root),
            aspect_width: config.aspect_width,
            aspect_height: config.aspect_height,
            max_width: config.max_width,
            max_upload_bytes: config.max_upload_bytes,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
    }

    /// 规范化并写入图片，返回相对于 media root 的路径
    pub async fn save(&self, kind: MediaKind, bytes: Vec<u8>) -> Result<String> {
        if bytes.is_empty() {
            return Err(PortalError::invalid_image("Arquivo de imagem vazio."));
        }
        if bytes.len() > self.max_upload_bytes {
            return Err(PortalError::invalid_image(format!(
                "Imagem maior que o limite de {} bytes.",
                self.max_upload_bytes
            )));
        }

        let (aw, ah, max_w) = (self.aspect_width, self.aspect_height, self.max_width);
        let jpeg = tokio::task::spawn_blocking(move || normalize_image(&bytes, aw, ah, max_w))
            .await
            .map_err(|e| PortalError::file_operation(format!("Image worker failed: {}", e)))??;

        let relative = format!("{}/{}.jpg", kind.dir(), uuid::Uuid::new_v4().simple());
        let full = self.root.join(&relative);
        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&full, &jpeg).await?;

        debug!("Stored image {} ({} bytes)", relative, jpeg.len());
        Ok(relative)
    }

    /// 删除图片；文件不存在时忽略
    pub async fn remove(&self, relative: &str) {
        let full = self.root.join(relative);
        if let Err(e) = tokio::fs::remove_file(&full).await
            && e.kind() != std::io::ErrorKind::NotFound
        {
            warn!("Failed to remove image {}: {}", full.display(), e);
        }
    }

    pub async fn exists(&self, relative: &str) -> bool {
        tokio::fs::try_exists(self.root.join(relative))
            .await
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, RgbImage};

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::new(width, height));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_crop_box_too_wide() {
        assert_eq!(center_crop_box(400, 100, 16, 9), (111, 0, 177, 100));
    }

    #[test]
    fn test_crop_box_too_tall() {
        assert_eq!(center_crop_box(160, 400, 16, 9), (0, 155, 160, 90));
    }

    #[test]
    fn test_crop_box_exact_ratio() {
        assert_eq!(center_crop_box(1600, 900, 16, 9), (0, 0, 1600, 900));
    }

    #[test]
    fn test_normalize_crops_and_downscales() {
        let jpeg = normalize_image(&png(3200, 2400), 16, 9, 1200).unwrap();
        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert_eq!(decoded.dimensions(), (1200, 675));
    }

    #[test]
    fn test_normalize_rejects_garbage() {
        let err = normalize_image(b"not an image", 16, 9, 1200).unwrap_err();
        assert_eq!(err.code(), "E016");
    }

    #[tokio::test]
    async fn test_save_and_remove() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = MediaStore::new(&MediaConfig {
            root: dir.path().display().to_string(),
            ..Default::default()
        });

        let path = store.save(MediaKind::Feedback, png(64, 64)).await.unwrap();
        assert!(path.starts_with("feedbacks/"));
        assert!(path.ends_with(".jpg"));
        assert!(store.exists(&path).await);

        store.remove(&path).await;
        assert!(!store.exists(&path).await);
    }
}
