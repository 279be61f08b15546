//! フラグメント画像（サムネイル）
//!
//! 描画器の出力PNGを表示サイズに縮小する。描画できないフラグメントは
//! プレースホルダ画像に置き換え、数値行の表示は止めない。

use crate::error::{FragmentError, Result};
use fragment_analysis_common::{FragmentKey, FragmentRenderer};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;
use tracing::{debug, warn};

const PLACEHOLDER_FILL: Rgba<u8> = Rgba([245, 245, 245, 255]);
const PLACEHOLDER_LINE: Rgba<u8> = Rgba([200, 200, 200, 255]);

/// 1フラグメント分のサムネイル
#[derive(Debug, Clone)]
pub struct Thumbnail {
    pub fragment: FragmentKey,
    pub image: RgbaImage,
    /// false ならプレースホルダ
    pub rendered: bool,
}

impl Thumbnail {
    pub fn placeholder(fragment: FragmentKey, size: u32) -> Self {
        Self {
            fragment,
            image: placeholder_image(size),
            rendered: false,
        }
    }

    pub fn size(&self) -> [usize; 2] {
        [self.image.width() as usize, self.image.height() as usize]
    }

    pub fn pixels(&self) -> &[u8] {
        self.image.as_raw()
    }

    /// PNGにエンコード（Excel埋め込み用）
    pub fn to_png(&self) -> Result<Vec<u8>> {
        encode_png(&self.image)
    }
}

/// 枠と対角線だけの灰色画像
pub fn placeholder_image(size: u32) -> RgbaImage {
    let size = size.max(1);
    let mut image = RgbaImage::from_pixel(size, size, PLACEHOLDER_FILL);
    let last = size - 1;

    for i in 0..size {
        image.put_pixel(i, 0, PLACEHOLDER_LINE);
        image.put_pixel(i, last, PLACEHOLDER_LINE);
        image.put_pixel(0, i, PLACEHOLDER_LINE);
        image.put_pixel(last, i, PLACEHOLDER_LINE);
        image.put_pixel(i, i, PLACEHOLDER_LINE);
        image.put_pixel(last - i, i, PLACEHOLDER_LINE);
    }

    image
}

/// PNGを読み込み、size×size に収まるよう縮小
pub fn decode_thumbnail(png: &[u8], size: u32) -> Option<RgbaImage> {
    let image = image::load_from_memory(png).ok()?;
    let size = size.max(1);
    let image = if image.width() > size || image.height() > size {
        image.thumbnail(size, size)
    } else {
        image
    };
    Some(image.to_rgba8())
}

pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(image.clone())
        .write_to(&mut buffer, ImageFormat::Png)
        .map_err(|e| FragmentError::ImageRender(e.to_string()))?;
    Ok(buffer.into_inner())
}

/// フラグメント一覧のサムネイルを生成（失敗しない）
///
/// 描画器そのものが失敗した場合も全件プレースホルダで返す。
pub fn depict_fragments<R>(renderer: &R, fragments: &[FragmentKey], size: u32) -> Vec<Thumbnail>
where
    R: FragmentRenderer + ?Sized,
{
    let rendered = match renderer.render_all(fragments, size, size) {
        Ok(images) if images.len() == fragments.len() => images,
        Ok(images) => {
            warn!(
                expected = fragments.len(),
                actual = images.len(),
                "renderer returned wrong number of images"
            );
            vec![None; fragments.len()]
        }
        Err(e) => {
            warn!("fragment rendering failed: {}", e);
            vec![None; fragments.len()]
        }
    };

    let thumbnails: Vec<Thumbnail> = fragments
        .iter()
        .zip(rendered)
        .map(|(fragment, png)| match png.and_then(|bytes| decode_thumbnail(&bytes, size)) {
            Some(image) => Thumbnail {
                fragment: fragment.clone(),
                image,
                rendered: true,
            },
            None => Thumbnail::placeholder(fragment.clone(), size),
        })
        .collect();

    debug!(
        total = thumbnails.len(),
        placeholders = thumbnails.iter().filter(|t| !t.rendered).count(),
        "thumbnails ready"
    );

    thumbnails
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeRenderer {
        fail: bool,
    }

    impl FragmentRenderer for FakeRenderer {
        fn render_all(
            &self,
            fragments: &[FragmentKey],
            width: u32,
            height: u32,
        ) -> fragment_analysis_common::Result<Vec<Option<Vec<u8>>>> {
            if self.fail {
                return Err(fragment_analysis_common::Error::Decomposer("no python".into()));
            }
            Ok(fragments
                .iter()
                .map(|f| {
                    if f.as_str().contains("bad") {
                        None
                    } else {
                        let image = RgbaImage::from_pixel(width * 2, height * 2, Rgba([0, 0, 0, 255]));
                        encode_png(&image).ok()
                    }
                })
                .collect())
        }
    }

    #[test]
    fn test_placeholder_image() {
        let image = placeholder_image(10);
        assert_eq!(image.dimensions(), (10, 10));
        assert_eq!(*image.get_pixel(0, 0), PLACEHOLDER_LINE);
        assert_eq!(*image.get_pixel(3, 5), PLACEHOLDER_FILL);
        assert_eq!(placeholder_image(0).dimensions(), (1, 1));
    }

    #[test]
    fn test_decode_thumbnail_shrinks() {
        let png = encode_png(&RgbaImage::new(300, 150)).unwrap();
        let thumb = decode_thumbnail(&png, 100).unwrap();
        assert_eq!(thumb.dimensions(), (100, 50));
    }

    #[test]
    fn test_decode_thumbnail_invalid() {
        assert!(decode_thumbnail(b"not a png", 100).is_none());
    }

    #[test]
    fn test_depict_fragments_mixed() {
        let fragments = vec![FragmentKey::new("[1*]C"), FragmentKey::new("bad")];
        let thumbs = depict_fragments(&FakeRenderer { fail: false }, &fragments, 40);
        assert_eq!(thumbs.len(), 2);
        assert!(thumbs[0].rendered);
        assert_eq!(thumbs[0].size(), [40, 40]);
        assert!(!thumbs[1].rendered);
        assert_eq!(thumbs[1].fragment.as_str(), "bad");
    }

    #[test]
    fn test_depict_fragments_renderer_failure() {
        let fragments = vec![FragmentKey::new("[1*]C")];
        let thumbs = depict_fragments(&FakeRenderer { fail: true }, &fragments, 40);
        assert_eq!(thumbs.len(), 1);
        assert!(!thumbs[0].rendered);
        assert_eq!(thumbs[0].pixels().len(), 40 * 40 * 4);
    }

    #[test]
    fn test_thumbnail_to_png() {
        let thumb = Thumbnail::placeholder(FragmentKey::new("x"), 16);
        let png = thumb.to_png().unwrap();
        assert!(png.starts_with(&[0x89, b'P', b'N', b'G']));
    }
}
