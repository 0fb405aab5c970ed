// Copyright 2025 the Seurat Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! PNG import and export.
//!
//! PNG stores RGBA; the surface stores BGRA. Both directions reorder
//! channels pixel by pixel.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::color::Color;
use crate::error::Error;
use crate::pixmap::Pixmap;

/// Decode a PNG file into a new pixmap.
///
/// 8-bit RGBA, RGB, grayscale, and grayscale-alpha images are accepted;
/// other formats return [`Error::UnsupportedPixelFormat`].
pub fn import_png(path: &Path) -> Result<Pixmap, Error> {
    let decoder = png::Decoder::new(File::open(path)?);
    let mut reader = decoder.read_info().map_err(box_err)?;
    let mut buf = vec![0; reader.output_buffer_size()];
    let info = reader.next_frame(&mut buf).map_err(box_err)?;
    if info.bit_depth != png::BitDepth::Eight {
        return Err(Error::UnsupportedPixelFormat);
    }

    let width = info.width as i32;
    let height = info.height as i32;
    let npix = (width as usize) * (height as usize);
    let mut data = Vec::with_capacity(npix);

    match info.color_type {
        png::ColorType::Rgba => {
            for px in buf[..npix * 4].chunks_exact(4) {
                data.push(Color::rgba8(px[0], px[1], px[2], px[3]));
            }
        }
        png::ColorType::Rgb => {
            for px in buf[..npix * 3].chunks_exact(3) {
                data.push(Color::rgb8(px[0], px[1], px[2]));
            }
        }
        png::ColorType::Grayscale => {
            for px in &buf[..npix] {
                data.push(Color::rgb8(*px, *px, *px));
            }
        }
        png::ColorType::GrayscaleAlpha => {
            for px in buf[..npix * 2].chunks_exact(2) {
                data.push(Color::rgba8(px[0], px[0], px[0], px[1]));
            }
        }
        _ => return Err(Error::UnsupportedPixelFormat),
    }

    Pixmap::from_data(width, height, data)
}

/// Encode a pixmap to an RGBA PNG file.
pub fn export_png(pixmap: &Pixmap, path: &Path) -> Result<(), Error> {
    let file = File::create(path)?;
    let w = BufWriter::new(file);
    let mut encoder = png::Encoder::new(w, pixmap.width() as u32, pixmap.height() as u32);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header().map_err(box_err)?;

    let mut rgba = Vec::with_capacity(pixmap.data().len() * 4);
    for c in pixmap.data() {
        rgba.extend_from_slice(&[c.r, c.g, c.b, c.a]);
    }
    writer.write_image_data(&rgba).map_err(box_err)?;
    Ok(())
}

fn box_err(e: impl std::error::Error + 'static) -> Error {
    Error::CodecError(Box::new(e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn png_round_trip() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("seurat-io-test-{}.png", std::process::id()));

        let data = vec![
            Color::rgba8(255, 0, 0, 255),
            Color::rgba8(0, 255, 0, 128),
            Color::rgba8(0, 0, 255, 255),
            Color::rgba8(1, 2, 3, 4),
        ];
        let pm = Pixmap::from_data(2, 2, data.clone()).unwrap();
        export_png(&pm, &path).unwrap();

        let back = import_png(&path).unwrap();
        assert_eq!(back.width(), 2);
        assert_eq!(back.height(), 2);
        assert_eq!(back.data(), &data[..]);

        let _ = std::fs::remove_file(&path);
    }
}
