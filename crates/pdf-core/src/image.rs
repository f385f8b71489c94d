//! Page images for rasterized flattening

use crate::{PdfError, Result};
use image::{ColorType, DynamicImage, ImageDecoder, ImageReader};
use lopdf::{dictionary, Stream};
use std::io::{Cursor, Write};

impl From<image::ImageError> for PdfError {
    fn from(err: image::ImageError) -> Self {
        PdfError::ImageError(err.to_string())
    }
}

/// Encoded image formats accepted as page images
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
}

/// Detect image format from magic bytes
pub fn detect_format(data: &[u8]) -> Result<ImageFormat> {
    if data.len() < 8 {
        return Err(PdfError::ImageError("Image data too short".to_string()));
    }
    if data[..3] == [0xFF, 0xD8, 0xFF] {
        return Ok(ImageFormat::Jpeg);
    }
    if data[..8] == [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A] {
        return Ok(ImageFormat::Png);
    }
    Err(PdfError::ImageError("Unknown image format".to_string()))
}

/// A rendered page ready to be embedded as an image XObject
#[derive(Debug, Clone)]
pub struct PageImage {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// "DeviceRGB" or "DeviceGray"
    pub color_space: &'static str,
    /// "DCTDecode" (JPEG passthrough) or "FlateDecode"
    pub filter: &'static str,
    /// Stream data, already encoded for `filter`
    pub data: Vec<u8>,
}

impl PageImage {
    /// Build from encoded JPEG or PNG bytes
    ///
    /// JPEG data is embedded as-is. PNG data is decoded, composited onto
    /// white when it carries alpha, and zlib-compressed.
    pub fn from_encoded(data: &[u8]) -> Result<Self> {
        match detect_format(data)? {
            ImageFormat::Jpeg => Self::from_jpeg(data),
            ImageFormat::Png => Self::from_png(data),
        }
    }

    fn from_jpeg(data: &[u8]) -> Result<Self> {
        let decoder = ImageReader::with_format(Cursor::new(data), image::ImageFormat::Jpeg)
            .into_decoder()?;
        let (width, height) = decoder.dimensions();
        let color_space = match decoder.color_type() {
            ColorType::L8 | ColorType::L16 => "DeviceGray",
            _ => "DeviceRGB",
        };

        Ok(Self {
            width,
            height,
            color_space,
            filter: "DCTDecode",
            data: data.to_vec(),
        })
    }

    fn from_png(data: &[u8]) -> Result<Self> {
        let decoder =
            ImageReader::with_format(Cursor::new(data), image::ImageFormat::Png).into_decoder()?;
        let color_type = decoder.color_type();
        let image = DynamicImage::from_decoder(decoder)?;
        let (width, height) = (image.width(), image.height());

        let (raw, color_space) = match color_type {
            ColorType::L8 | ColorType::L16 => (image.to_luma8().into_raw(), "DeviceGray"),
            ColorType::La8 | ColorType::La16 => {
                let raw = image
                    .to_luma_alpha8()
                    .pixels()
                    .map(|p| over_white(p[0], p[1]))
                    .collect();
                (raw, "DeviceGray")
            }
            ColorType::Rgba8 | ColorType::Rgba16 | ColorType::Rgba32F => {
                let raw = image
                    .to_rgba8()
                    .pixels()
                    .flat_map(|p| [over_white(p[0], p[3]), over_white(p[1], p[3]), over_white(p[2], p[3])])
                    .collect();
                (raw, "DeviceRGB")
            }
            _ => (image.to_rgb8().into_raw(), "DeviceRGB"),
        };

        let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(&raw)?;

        Ok(Self {
            width,
            height,
            color_space,
            filter: "FlateDecode",
            data: encoder.finish()?,
        })
    }

    /// Page size in points when rendered at `dpi`
    pub fn page_size(&self, dpi: u32) -> (f64, f64) {
        let scale = 72.0 / dpi.max(1) as f64;
        (self.width as f64 * scale, self.height as f64 * scale)
    }

    /// Convert to an image XObject stream
    pub fn to_xobject(&self) -> Stream {
        let dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => self.width as i64,
            "Height" => self.height as i64,
            "ColorSpace" => self.color_space,
            "BitsPerComponent" => 8,
            "Filter" => self.filter,
        };
        // DCT and Flate data is already encoded; keep lopdf from compressing again
        Stream::new(dict, self.data.clone()).with_compression(false)
    }
}

/// Composite one channel with alpha onto a white background
fn over_white(value: u8, alpha: u8) -> u8 {
    let alpha = alpha as f32 / 255.0;
    (value as f32 * alpha + 255.0 * (1.0 - alpha)).round() as u8
}

/// Content stream drawing `name` over a whole `width` x `height` page
pub(crate) fn full_page_operators(name: &str, width: f64, height: f64) -> Vec<u8> {
    format!("q\n{width} 0 0 {height} 0 0 cm\n/{name} Do\nQ\n").into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, RgbImage, RgbaImage};

    fn encode(image: DynamicImage, format: image::ImageFormat) -> Vec<u8> {
        let mut buffer = Cursor::new(Vec::new());
        image.write_to(&mut buffer, format).unwrap();
        buffer.into_inner()
    }

    #[test]
    fn test_detect_jpeg() {
        let jpeg_header = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46];
        assert_eq!(detect_format(&jpeg_header).unwrap(), ImageFormat::Jpeg);
    }

    #[test]
    fn test_detect_png() {
        let png_header = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        assert_eq!(detect_format(&png_header).unwrap(), ImageFormat::Png);
    }

    #[test]
    fn test_detect_unknown_and_short() {
        assert!(detect_format(&[0u8; 8]).is_err());
        assert!(detect_format(&[0xFF, 0xD8]).is_err());
    }

    #[test]
    fn test_png_rgb_page() {
        let png = encode(
            DynamicImage::ImageRgb8(RgbImage::from_pixel(30, 20, Rgb([10, 20, 30]))),
            image::ImageFormat::Png,
        );
        let page = PageImage::from_encoded(&png).unwrap();
        assert_eq!((page.width, page.height), (30, 20));
        assert_eq!(page.color_space, "DeviceRGB");
        assert_eq!(page.filter, "FlateDecode");
    }

    #[test]
    fn test_png_gray_page() {
        let png = encode(
            DynamicImage::ImageLuma8(GrayImage::from_pixel(4, 4, Luma([128]))),
            image::ImageFormat::Png,
        );
        let page = PageImage::from_encoded(&png).unwrap();
        assert_eq!(page.color_space, "DeviceGray");
    }

    #[test]
    fn test_png_alpha_is_composited() {
        let png = encode(
            DynamicImage::ImageRgba8(RgbaImage::from_pixel(2, 2, image::Rgba([0, 0, 0, 0]))),
            image::ImageFormat::Png,
        );
        let page = PageImage::from_encoded(&png).unwrap();
        assert_eq!(page.color_space, "DeviceRGB");

        let stream = Stream::new(
            dictionary! { "Filter" => "FlateDecode" },
            page.data.clone(),
        );
        let raw = stream.decompressed_content().unwrap();
        assert_eq!(raw, vec![255; 12]);
    }

    #[test]
    fn test_jpeg_passthrough() {
        let jpeg = encode(
            DynamicImage::ImageRgb8(RgbImage::from_pixel(16, 8, Rgb([200, 10, 10]))),
            image::ImageFormat::Jpeg,
        );
        let page = PageImage::from_encoded(&jpeg).unwrap();
        assert_eq!((page.width, page.height), (16, 8));
        assert_eq!(page.filter, "DCTDecode");
        assert_eq!(page.data, jpeg);
    }

    #[test]
    fn test_page_size_at_300_dpi() {
        let page = PageImage {
            width: 2550,
            height: 3300,
            color_space: "DeviceRGB",
            filter: "DCTDecode",
            data: Vec::new(),
        };
        assert_eq!(page.page_size(300), (612.0, 792.0));
    }

    #[test]
    fn test_xobject_dictionary() {
        let page = PageImage {
            width: 100,
            height: 50,
            color_space: "DeviceGray",
            filter: "FlateDecode",
            data: vec![1, 2, 3],
        };
        let stream = page.to_xobject();
        assert_eq!(stream.dict.get(b"Subtype").unwrap().as_name().unwrap(), b"Image");
        assert_eq!(stream.dict.get(b"Width").unwrap().as_i64().unwrap(), 100);
        assert_eq!(
            stream.dict.get(b"ColorSpace").unwrap().as_name().unwrap(),
            b"DeviceGray"
        );
        assert_eq!(stream.content, vec![1, 2, 3]);
    }

    #[test]
    fn test_full_page_operators() {
        let ops = String::from_utf8(full_page_operators("Im1", 612.0, 792.0)).unwrap();
        assert!(ops.contains("612 0 0 792 0 0 cm"));
        assert!(ops.contains("/Im1 Do"));
    }
}
