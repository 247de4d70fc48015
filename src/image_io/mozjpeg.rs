//! Huffman-optimized JPEG encoding through libjpeg (mozjpeg).
//!
//! Only compiled with the `mozjpeg` feature, which builds the C library.

use crate::error::{Result, WatermarkError};
use mozjpeg_sys::*;
use std::os::raw::{c_int, c_ulong};
use std::{mem, ptr};

/// Largest width or height libjpeg accepts.
const MAX_DIMENSION: u32 = 65_500;

/// Encode packed RGB bytes with optimized Huffman tables.
pub(super) fn encode_rgb(rgb: &[u8], width: u32, height: u32, quality: u8) -> Result<Vec<u8>> {
    // libjpeg reports bad parameters through error_exit, which terminates the
    // process; reject them before the encoder sees them
    if width == 0 || height == 0 || width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(WatermarkError::encode(
            "jpeg",
            format!("{}x{} is outside the JPEG size limits", width, height),
        ));
    }
    let row_stride = width as usize * 3;
    if rgb.len() != row_stride * height as usize {
        return Err(WatermarkError::encode("jpeg", "RGB buffer does not match dimensions"));
    }

    unsafe {
        let mut err: jpeg_error_mgr = mem::zeroed();
        let mut cinfo: jpeg_compress_struct = mem::zeroed();
        cinfo.common.err = jpeg_std_error(&mut err);
        jpeg_create_compress(&mut cinfo);

        let mut out_buffer: *mut u8 = ptr::null_mut();
        let mut out_size: c_ulong = 0;
        jpeg_mem_dest(&mut cinfo, &mut out_buffer, &mut out_size);

        cinfo.image_width = width;
        cinfo.image_height = height;
        cinfo.input_components = 3;
        cinfo.in_color_space = J_COLOR_SPACE::JCS_RGB;
        jpeg_set_defaults(&mut cinfo);
        jpeg_set_quality(&mut cinfo, quality as c_int, true as boolean);
        cinfo.optimize_coding = true as boolean;

        jpeg_start_compress(&mut cinfo, true as boolean);
        for row in rgb.chunks_exact(row_stride) {
            let rows = [row.as_ptr()];
            jpeg_write_scanlines(&mut cinfo, rows.as_ptr(), 1);
        }
        jpeg_finish_compress(&mut cinfo);
        jpeg_destroy_compress(&mut cinfo);

        if out_buffer.is_null() {
            return Err(WatermarkError::encode("jpeg", "encoder produced no output"));
        }
        let bytes = std::slice::from_raw_parts(out_buffer, out_size as usize).to_vec();
        libc::free(out_buffer.cast());
        Ok(bytes)
    }
}
