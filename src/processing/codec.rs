//! Image Codec: any supported raster encoding in, baseline JPEG out.
//!
//! Decoding sniffs the format from the bytes (JPEG, PNG, GIF, WebP, BMP,
//! TIFF, ...) and always yields 8-bit RGBA. Encoding produces a single wire
//! format, lossy JPEG, at the configured quality.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::error::{LimitError, LimitErrorKind};
use image::{ImageError, ImageReader, Limits, Rgb, RgbImage, RgbaImage};

use crate::error::{GuessError, GuessResult};

/// Decode uploaded bytes.
pub fn decode(bytes: &[u8]) -> GuessResult<RgbaImage> {
    decode_from("upload", bytes)
}

/// Longest side a JPEG can carry, and so the longest side we accept.
pub const MAX_SIDE: u32 = 65_535;

/// Decode bytes, naming where they came from in the error.
///
/// Anything this returns can be encoded again by [`encode_jpeg`].
///
/// # Errors
/// [`GuessError::Decode`] when the bytes are not a recognised, complete
/// image, or when either side exceeds [`MAX_SIDE`].
pub fn decode_from(origin: &str, bytes: &[u8]) -> GuessResult<RgbaImage> {
    let mut limits = Limits::default();
    limits.max_image_width = Some(MAX_SIDE);
    limits.max_image_height = Some(MAX_SIDE);

    let mut reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| GuessError::decode(origin, ImageError::IoError(e)))?;
    reader.limits(limits);
    let img = reader
        .decode()
        .map_err(|e| GuessError::decode(origin, e))?
        .into_rgba8();

    if img.width() > MAX_SIDE || img.height() > MAX_SIDE {
        let too_big = LimitError::from_kind(LimitErrorKind::DimensionError);
        return Err(GuessError::decode(origin, ImageError::Limits(too_big)));
    }
    Ok(img)
}

/// Encode as JPEG.
///
/// JPEG has no alpha channel, so translucent pixels are composited over
/// black first.
///
/// # Errors
/// [`GuessError::Encode`] (fatal severity) if the encoder rejects the image,
/// e.g. a side longer than 65535px.
pub fn encode_jpeg(img: &RgbaImage, quality: u8) -> GuessResult<Vec<u8>> {
    let rgb = flatten_over_black(img);
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, quality)
        .encode_image(&rgb)
        .map_err(|e| GuessError::encode(img.width(), img.height(), e))?;
    Ok(out)
}

fn flatten_over_black(img: &RgbaImage) -> RgbImage {
    RgbImage::from_fn(img.width(), img.height(), |x, y| {
        let [r, g, b, a] = img.get_pixel(x, y).0;
        let a = a as u16;
        let mul = |c: u8| ((c as u16 * a + 127) / 255) as u8;
        Rgb([mul(r), mul(g), mul(b)])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba};

    fn png_bytes(img: &RgbaImage) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn decode_then_encode_keeps_dimensions() {
        let src = RgbaImage::from_pixel(100, 50, Rgba([10, 200, 30, 255]));
        let decoded = decode(&png_bytes(&src)).unwrap();
        assert_eq!(decoded.dimensions(), (100, 50));

        let jpeg = encode_jpeg(&decoded, 75).unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
        let again = decode(&jpeg).unwrap();
        assert_eq!(again.dimensions(), (100, 50));
    }

    #[test]
    fn garbage_is_a_decode_error() {
        let err = decode(b"definitely not an image").unwrap_err();
        assert_eq!(err.category(), "decode");
        assert!(err.is_client_error());
    }

    #[test]
    fn truncated_image_is_a_decode_error() {
        let src = RgbaImage::from_pixel(64, 64, Rgba([1, 2, 3, 255]));
        let bytes = png_bytes(&src);
        let err = decode_from("samples/cut.png", &bytes[..bytes.len() / 2]).unwrap_err();
        assert!(err.to_string().contains("samples/cut.png"));
    }

    #[test]
    fn sides_beyond_jpeg_range_are_a_decode_error() {
        let wide = RgbaImage::from_pixel(70_000, 1, Rgba([9, 9, 9, 255]));
        let err = decode(&png_bytes(&wide)).unwrap_err();
        assert_eq!(err.category(), "decode");
        assert!(err.is_client_error());

        let tall = RgbaImage::from_pixel(1, 70_000, Rgba([9, 9, 9, 255]));
        assert!(decode(&png_bytes(&tall)).is_err());
    }

    #[test]
    fn longest_accepted_side_still_encodes() {
        let edge = RgbaImage::from_pixel(MAX_SIDE, 1, Rgba([9, 9, 9, 255]));
        let decoded = decode(&png_bytes(&edge)).unwrap();
        assert_eq!(decoded.dimensions(), (MAX_SIDE, 1));
        assert!(encode_jpeg(&decoded, 75).is_ok());
    }

    #[test]
    fn transparent_pixels_flatten_to_black() {
        let img = RgbaImage::from_fn(2, 1, |x, _| {
            if x == 0 {
                Rgba([255, 255, 255, 0])
            } else {
                Rgba([255, 255, 255, 255])
            }
        });
        let rgb = flatten_over_black(&img);
        assert_eq!(rgb.get_pixel(0, 0).0, [0, 0, 0]);
        assert_eq!(rgb.get_pixel(1, 0).0, [255, 255, 255]);
    }
}
