//! PNG export of mask rasters.

use crate::error::AppResult;
use layercraft_core::MaskRaster;
use std::path::Path;

/// Encode a mask as an RGBA PNG.
pub fn encode_png(raster: &MaskRaster) -> AppResult<Vec<u8>> {
    let mut png_data = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut png_data, raster.width(), raster.height());
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);

        let mut writer = encoder.write_header()?;
        writer.write_image_data(raster.pixels())?;
    }
    Ok(png_data)
}

/// Encode a mask and write it to `path`.
pub fn write_png(raster: &MaskRaster, path: &Path) -> AppResult<()> {
    let png_data = encode_png(raster)?;
    std::fs::write(path, &png_data)?;
    log::info!("Mask exported to {}: {} bytes", path.display(), png_data.len());
    Ok(())
}
