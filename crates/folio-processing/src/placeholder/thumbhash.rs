//! ThumbHash codec
//!
//! A compact perceptual encoding of an image's dominant colors and luminance
//! structure, reversible into an approximate low-res preview. Not a
//! cryptographic hash: it is designed for visual approximation, not
//! uniqueness. The bit layout matches the reference JavaScript
//! implementation, which the rendering layer uses to expand the stored token
//! back into a data URL, so both sides agree on the encoding bit for bit.
//!
//! Layout: a 3-byte header (luminance DC, P/Q chroma DC, luminance scale,
//! alpha flag), a 2-byte header (luminance grid size, chroma scales,
//! landscape flag), an optional alpha DC/scale byte, then nibble-packed AC
//! coefficients per channel. Output never exceeds 25 bytes.

use anyhow::{bail, Result};
use std::f64::consts::PI;

/// Encode an RGBA pixel buffer into a ThumbHash.
///
/// `w` and `h` are the actual dimensions of the buffer and must be at most
/// 100; `rgba` holds 4 bytes per pixel in row-major order.
pub fn rgba_to_thumb_hash(w: usize, h: usize, rgba: &[u8]) -> Result<Vec<u8>> {
    if w > 100 || h > 100 {
        bail!("{}x{} exceeds the maximum encodable size of 100x100", w, h);
    }
    if rgba.len() != w * h * 4 {
        bail!(
            "pixel buffer length {} does not match {}x{} RGBA",
            rgba.len(),
            w,
            h
        );
    }

    // Determine the average color, weighted by alpha
    let mut avg_r = 0.0;
    let mut avg_g = 0.0;
    let mut avg_b = 0.0;
    let mut avg_a = 0.0;
    for px in rgba.chunks_exact(4) {
        let alpha = px[3] as f64 / 255.0;
        avg_r += alpha / 255.0 * px[0] as f64;
        avg_g += alpha / 255.0 * px[1] as f64;
        avg_b += alpha / 255.0 * px[2] as f64;
        avg_a += alpha;
    }
    if avg_a > 0.0 {
        avg_r /= avg_a;
        avg_g /= avg_a;
        avg_b /= avg_a;
    }

    let has_alpha = avg_a < (w * h) as f64;
    let l_limit = if has_alpha { 5 } else { 7 }; // fewer luminance bits if there's alpha
    let wf = w as f64;
    let hf = h as f64;
    let lx = usize::max(1, (l_limit as f64 * wf / wf.max(hf)).round() as usize);
    let ly = usize::max(1, (l_limit as f64 * hf / wf.max(hf)).round() as usize);

    // Convert the image from RGBA to LPQA, compositing atop the average color
    let mut l = Vec::with_capacity(w * h);
    let mut p = Vec::with_capacity(w * h);
    let mut q = Vec::with_capacity(w * h);
    let mut a = Vec::with_capacity(w * h);
    for px in rgba.chunks_exact(4) {
        let alpha = px[3] as f64 / 255.0;
        let r = avg_r * (1.0 - alpha) + alpha / 255.0 * px[0] as f64;
        let g = avg_g * (1.0 - alpha) + alpha / 255.0 * px[1] as f64;
        let b = avg_b * (1.0 - alpha) + alpha / 255.0 * px[2] as f64;
        l.push((r + g + b) / 3.0);
        p.push((r + b) / 2.0 - g);
        q.push(r - b);
        a.push(alpha);
    }

    // Encode each channel with a DCT into a DC term and normalized AC terms
    let encode_channel = |channel: &[f64], nx: usize, ny: usize| -> (f64, Vec<f64>, f64) {
        let mut dc = 0.0;
        let mut ac = Vec::new();
        let mut scale = 0.0f64;
        let mut fx = vec![0.0; w];
        for cy in 0..ny {
            let mut cx = 0;
            while cx * ny < nx * (ny - cy) {
                let mut f = 0.0;
                for (x, fx_x) in fx.iter_mut().enumerate() {
                    *fx_x = (PI / wf * cx as f64 * (x as f64 + 0.5)).cos();
                }
                for y in 0..h {
                    let fy = (PI / hf * cy as f64 * (y as f64 + 0.5)).cos();
                    for x in 0..w {
                        f += channel[x + y * w] * fx[x] * fy;
                    }
                }
                f /= (w * h) as f64;
                if cx != 0 || cy != 0 {
                    scale = scale.max(f.abs());
                    ac.push(f);
                } else {
                    dc = f;
                }
                cx += 1;
            }
        }
        if scale > 0.0 {
            for v in &mut ac {
                *v = 0.5 + 0.5 / scale * *v;
            }
        }
        (dc, ac, scale)
    };

    let (l_dc, l_ac, l_scale) = encode_channel(&l, usize::max(3, lx), usize::max(3, ly));
    let (p_dc, p_ac, p_scale) = encode_channel(&p, 3, 3);
    let (q_dc, q_ac, q_scale) = encode_channel(&q, 3, 3);
    let (a_dc, a_ac, a_scale) = if has_alpha {
        encode_channel(&a, 5, 5)
    } else {
        (1.0, Vec::new(), 1.0)
    };

    // Write the constants
    let is_landscape = w > h;
    let header24: u32 = ((63.0 * l_dc).round() as u32)
        | (((31.5 + 31.5 * p_dc).round() as u32) << 6)
        | (((31.5 + 31.5 * q_dc).round() as u32) << 12)
        | (((31.0 * l_scale).round() as u32) << 18)
        | ((has_alpha as u32) << 23);
    let header16: u16 = (if is_landscape { ly } else { lx }) as u16
        | (((63.0 * p_scale).round() as u16) << 3)
        | (((63.0 * q_scale).round() as u16) << 9)
        | ((is_landscape as u16) << 15);

    let mut hash = vec![
        (header24 & 255) as u8,
        ((header24 >> 8) & 255) as u8,
        (header24 >> 16) as u8,
        (header16 & 255) as u8,
        (header16 >> 8) as u8,
    ];
    let ac_start = if has_alpha { 6 } else { 5 };
    if has_alpha {
        hash.push(((15.0 * a_dc).round() as u8) | (((15.0 * a_scale).round() as u8) << 4));
    }

    // Pack the AC coefficients, two per byte
    let mut ac_index = 0usize;
    let channels: &[&[f64]] = if has_alpha {
        &[&l_ac, &p_ac, &q_ac, &a_ac]
    } else {
        &[&l_ac, &p_ac, &q_ac]
    };
    for ac in channels {
        for &f in ac.iter() {
            let idx = ac_start + (ac_index >> 1);
            if idx >= hash.len() {
                hash.push(0);
            }
            hash[idx] |= ((15.0 * f).round() as u8) << ((ac_index & 1) * 4);
            ac_index += 1;
        }
    }

    Ok(hash)
}

/// Decode a ThumbHash into an approximate RGBA preview.
///
/// Returns `(width, height, rgba)`; the longer output side is 32 pixels.
/// This is the rendering-side inverse of [`rgba_to_thumb_hash`].
pub fn thumb_hash_to_rgba(hash: &[u8]) -> Result<(usize, usize, Vec<u8>)> {
    if hash.len() < 5 {
        bail!("hash of {} bytes is too short", hash.len());
    }

    // Read the constants
    let header24 = hash[0] as u32 | (hash[1] as u32) << 8 | (hash[2] as u32) << 16;
    let header16 = hash[3] as u16 | (hash[4] as u16) << 8;
    let l_dc = (header24 & 63) as f64 / 63.0;
    let p_dc = ((header24 >> 6) & 63) as f64 / 31.5 - 1.0;
    let q_dc = ((header24 >> 12) & 63) as f64 / 31.5 - 1.0;
    let l_scale = ((header24 >> 18) & 31) as f64 / 31.0;
    let has_alpha = (header24 >> 23) != 0;
    let p_scale = ((header16 >> 3) & 63) as f64 / 63.0;
    let q_scale = ((header16 >> 9) & 63) as f64 / 63.0;
    let is_landscape = (header16 >> 15) != 0;
    let l_max = if has_alpha { 5 } else { 7 };
    let short_side = (header16 & 7) as usize;
    let lx = usize::max(3, if is_landscape { l_max } else { short_side });
    let ly = usize::max(3, if is_landscape { short_side } else { l_max });
    if has_alpha && hash.len() < 6 {
        bail!("hash with alpha requires at least 6 bytes");
    }
    let (a_dc, a_scale) = if has_alpha {
        ((hash[5] & 15) as f64 / 15.0, (hash[5] >> 4) as f64 / 15.0)
    } else {
        (1.0, 1.0)
    };

    // Read the varying factors; chroma gets a 1.25x saturation boost to
    // compensate for quantization
    let ac_start = if has_alpha { 6 } else { 5 };
    let mut ac_index = 0usize;
    let mut decode_channel = |nx: usize, ny: usize, scale: f64| -> Result<Vec<f64>> {
        let mut ac = Vec::new();
        for cy in 0..ny {
            let mut cx = if cy > 0 { 0 } else { 1 };
            while cx * ny < nx * (ny - cy) {
                let idx = ac_start + (ac_index >> 1);
                let byte = match hash.get(idx) {
                    Some(b) => *b,
                    None => bail!("hash is truncated at byte {}", idx),
                };
                let nibble = (byte >> ((ac_index & 1) * 4)) & 15;
                ac.push((nibble as f64 / 7.5 - 1.0) * scale);
                ac_index += 1;
                cx += 1;
            }
        }
        Ok(ac)
    };
    let l_ac = decode_channel(lx, ly, l_scale)?;
    let p_ac = decode_channel(3, 3, p_scale * 1.25)?;
    let q_ac = decode_channel(3, 3, q_scale * 1.25)?;
    let a_ac = if has_alpha {
        decode_channel(5, 5, a_scale)?
    } else {
        Vec::new()
    };

    // Output dimensions from the encoded aspect ratio (unclamped grid sizes)
    let ratio_lx = if is_landscape { l_max } else { short_side };
    let ratio_ly = if is_landscape { short_side } else { l_max };
    if ratio_ly == 0 {
        bail!("invalid luminance grid size");
    }
    let ratio = ratio_lx as f64 / ratio_ly as f64;
    let w = if ratio > 1.0 {
        32
    } else {
        (32.0 * ratio).round() as usize
    };
    let h = if ratio > 1.0 {
        (32.0 / ratio).round() as usize
    } else {
        32
    };

    // Decode using the inverse DCT into RGBA
    let mut rgba = vec![0u8; w * h * 4];
    let n_fx = usize::max(lx, if has_alpha { 5 } else { 3 });
    let n_fy = usize::max(ly, if has_alpha { 5 } else { 3 });
    let mut fx = vec![0.0; n_fx];
    let mut fy = vec![0.0; n_fy];
    let mut i = 0;
    for y in 0..h {
        for x in 0..w {
            let mut l = l_dc;
            let mut p = p_dc;
            let mut q = q_dc;
            let mut a = a_dc;

            // Precompute the coefficients
            for (cx, fx_cx) in fx.iter_mut().enumerate() {
                *fx_cx = (PI / w as f64 * (x as f64 + 0.5) * cx as f64).cos();
            }
            for (cy, fy_cy) in fy.iter_mut().enumerate() {
                *fy_cy = (PI / h as f64 * (y as f64 + 0.5) * cy as f64).cos();
            }

            // Decode L
            let mut j = 0;
            for cy in 0..ly {
                let mut cx = if cy > 0 { 0 } else { 1 };
                let fy2 = fy[cy] * 2.0;
                while cx * ly < lx * (ly - cy) {
                    l += l_ac[j] * fx[cx] * fy2;
                    j += 1;
                    cx += 1;
                }
            }

            // Decode P and Q
            let mut j = 0;
            for cy in 0..3 {
                let mut cx = if cy > 0 { 0 } else { 1 };
                let fy2 = fy[cy] * 2.0;
                while cx < 3 - cy {
                    let f = fx[cx] * fy2;
                    p += p_ac[j] * f;
                    q += q_ac[j] * f;
                    j += 1;
                    cx += 1;
                }
            }

            // Decode A
            if has_alpha {
                let mut j = 0;
                for cy in 0..5 {
                    let mut cx = if cy > 0 { 0 } else { 1 };
                    let fy2 = fy[cy] * 2.0;
                    while cx < 5 - cy {
                        a += a_ac[j] * fx[cx] * fy2;
                        j += 1;
                        cx += 1;
                    }
                }
            }

            // Convert LPQ back to RGB
            let b = l - 2.0 / 3.0 * p;
            let r = (3.0 * l - b + q) / 2.0;
            let g = r - q;
            rgba[i] = (255.0 * r.clamp(0.0, 1.0)) as u8;
            rgba[i + 1] = (255.0 * g.clamp(0.0, 1.0)) as u8;
            rgba[i + 2] = (255.0 * b.clamp(0.0, 1.0)) as u8;
            rgba[i + 3] = (255.0 * a.clamp(0.0, 1.0)) as u8;
            i += 4;
        }
    }

    Ok((w, h, rgba))
}
