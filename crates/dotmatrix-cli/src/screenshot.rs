use std::{fs::File, io, io::BufWriter, path::Path};

use dotmatrix_core::ppu::{SCREEN_HEIGHT, SCREEN_WIDTH};

fn frame_to_rgb(frame: &[u32]) -> Vec<u8> {
    let mut out = vec![0u8; frame.len() * 3];
    for (i, &px) in frame.iter().enumerate() {
        out[i * 3] = ((px >> 16) & 0xFF) as u8;
        out[i * 3 + 1] = ((px >> 8) & 0xFF) as u8;
        out[i * 3 + 2] = (px & 0xFF) as u8;
    }
    out
}

/// Write a 0x00RRGGBB framebuffer as an 8-bit RGB PNG.
pub fn write_png(path: &Path, frame: &[u32]) -> io::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    let w = BufWriter::new(File::create(path)?);
    let mut encoder = png::Encoder::new(w, SCREEN_WIDTH as u32, SCREEN_HEIGHT as u32);
    encoder.set_color(png::ColorType::Rgb);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header().map_err(io::Error::other)?;
    writer
        .write_image_data(&frame_to_rgb(frame))
        .map_err(io::Error::other)?;
    writer.finish().map_err(io::Error::other)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgb_channels_unpack_in_order() {
        assert_eq!(
            frame_to_rgb(&[0x00123456, 0x00FFFFFF]),
            vec![0x12, 0x34, 0x56, 0xFF, 0xFF, 0xFF]
        );
    }
}
