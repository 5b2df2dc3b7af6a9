use anyhow::bail;
use image::RgbaImage;
use jpeg_decoder::PixelFormat;

use super::Image;

/// Decodes a (possibly motion-)JPEG frame into an RGBA [`Image`].
pub(super) fn decode_jpeg(data: &[u8]) -> anyhow::Result<Image> {
    let mut decoder = jpeg_decoder::Decoder::new(data);
    let pixels = decoder.decode()?;
    let info = decoder
        .info()
        .expect("decoder has no image info after successful decode");
    let (width, height) = (u32::from(info.width), u32::from(info.height));

    let rgba = match info.pixel_format {
        PixelFormat::RGB24 => {
            let mut buf = Vec::with_capacity(pixels.len() / 3 * 4);
            for rgb in pixels.chunks_exact(3) {
                buf.extend_from_slice(rgb);
                buf.push(0xff);
            }
            buf
        }
        PixelFormat::L8 => {
            let mut buf = Vec::with_capacity(pixels.len() * 4);
            for &lum in &pixels {
                buf.extend_from_slice(&[lum, lum, lum, 0xff]);
            }
            buf
        }
        fmt @ (PixelFormat::L16 | PixelFormat::CMYK32) => {
            bail!("unsupported JPEG pixel format {fmt:?}")
        }
    };

    let buf = RgbaImage::from_raw(width, height, rgba).expect("failed to create image buffer");
    Ok(Image { buf })
}
