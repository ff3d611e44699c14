//! 8-bit plane filters shared by the post-processing stages.

use ndarray::{s, Array2, ArrayView2};

/// Map a possibly out-of-range index into `0..len` with BORDER_REFLECT_101
/// (`gfedcb|abcdefgh|gfedcba`).
#[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
pub(crate) fn reflect101(index: isize, len: usize) -> usize {
    if len <= 1 {
        return 0;
    }
    let len = len as isize;
    let period = 2 * len - 2;
    let mut i = index.rem_euclid(period);
    if i >= len {
        i = period - i;
    }
    i as usize
}

/// Round and saturate to an 8-bit level.
#[inline]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn saturate_u8(value: f64) -> u8 {
    // Safe: clamped to [0, 255] before casting
    value.round().clamp(0.0, 255.0) as u8
}

/// Edge-preserving smoothing of an 8-bit plane.
///
/// Each output pixel is the average of the pixels within a disc of diameter
/// `diameter`, weighted by `exp(-d^2 / 2 sigma_space^2)` for spatial distance
/// and `exp(-dv^2 / 2 sigma_color^2)` for intensity difference. Pixels outside
/// the plane are read with reflect-101 borders.
#[allow(clippy::cast_possible_wrap, clippy::cast_precision_loss)]
pub(crate) fn bilateral_filter(
    src: &Array2<u8>,
    diameter: usize,
    sigma_color: f64,
    sigma_space: f64,
) -> Array2<u8> {
    let (height, width) = src.dim();
    let radius = (diameter / 2) as isize;
    let space_coeff = -0.5 / (sigma_space * sigma_space);
    let color_coeff = -0.5 / (sigma_color * sigma_color);

    let mut offsets = Vec::new();
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            let dist_sq = (dy * dy + dx * dx) as f64;
            if dist_sq.sqrt() <= radius as f64 {
                offsets.push((dy, dx, (dist_sq * space_coeff).exp()));
            }
        }
    }
    let color_weight: [f64; 256] = std::array::from_fn(|d| ((d * d) as f64 * color_coeff).exp());

    Array2::from_shape_fn((height, width), |(y, x)| {
        let center = src[[y, x]];
        let (mut sum, mut weight_sum) = (0.0, 0.0);
        for &(dy, dx, space_weight) in &offsets {
            let value = src[[
                reflect101(y as isize + dy, height),
                reflect101(x as isize + dx, width),
            ]];
            let weight = space_weight * color_weight[usize::from(center.abs_diff(value))];
            sum += weight * f64::from(value);
            weight_sum += weight;
        }
        saturate_u8(sum / weight_sum)
    })
}

/// Contrast-limited adaptive histogram equalization of an 8-bit plane.
///
/// The plane is split into `grid = (rows, cols)` tiles (extended with
/// reflect-101 when not evenly divisible). Each tile's histogram is clipped at
/// `clip_limit * tile_area / 256` counts, the excess redistributed over all
/// bins, and its CDF used as a lookup table. Output pixels bilinearly
/// interpolate the tables of the four nearest tile centers.
#[allow(
    clippy::cast_possible_wrap,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]
pub(crate) fn clahe(src: &Array2<u8>, grid: (usize, usize), clip_limit: f32) -> Array2<u8> {
    let (height, width) = src.dim();
    let (grid_y, grid_x) = grid;

    let extended = Array2::from_shape_fn(
        (height.next_multiple_of(grid_y), width.next_multiple_of(grid_x)),
        |(y, x)| src[[reflect101(y as isize, height), reflect101(x as isize, width)]],
    );
    let tile_height = extended.nrows() / grid_y;
    let tile_width = extended.ncols() / grid_x;

    let luts: Vec<[u8; 256]> = (0..grid_y * grid_x)
        .map(|t| {
            let (ty, tx) = (t / grid_x, t % grid_x);
            let tile = extended.slice(s![
                ty * tile_height..(ty + 1) * tile_height,
                tx * tile_width..(tx + 1) * tile_width
            ]);
            tile_lut(tile, clip_limit)
        })
        .collect();

    // Tile coordinate of a pixel: the two neighbouring tile indices and the
    // weight of the second one.
    let neighbours = |pos: usize, tile: usize, count: usize| -> (usize, usize, f32) {
        let t = pos as f32 / tile as f32 - 0.5;
        let first = t.floor() as isize;
        let weight = t - first as f32;
        let lo = first.max(0) as usize;
        let hi = if first + 1 < count as isize {
            (first + 1) as usize
        } else {
            lo
        };
        (lo, hi, weight)
    };

    Array2::from_shape_fn((height, width), |(y, x)| {
        let (ty1, ty2, ya) = neighbours(y, tile_height, grid_y);
        let (tx1, tx2, xa) = neighbours(x, tile_width, grid_x);
        let level = usize::from(src[[y, x]]);
        let lut = |ty: usize, tx: usize| f32::from(luts[ty * grid_x + tx][level]);

        let top = (1.0 - xa) * lut(ty1, tx1) + xa * lut(ty1, tx2);
        let bottom = (1.0 - xa) * lut(ty2, tx1) + xa * lut(ty2, tx2);
        saturate_u8(f64::from((1.0 - ya) * top + ya * bottom))
    })
}

/// Clipped-histogram CDF of one tile.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]
fn tile_lut(tile: ArrayView2<'_, u8>, clip_limit: f32) -> [u8; 256] {
    const BINS: usize = 256;
    let area = tile.len();

    let mut hist = [0usize; BINS];
    for &v in tile {
        hist[usize::from(v)] += 1;
    }

    let limit = ((clip_limit * area as f32) / BINS as f32).max(1.0).floor() as usize;
    let mut clipped = 0;
    for bin in &mut hist {
        if *bin > limit {
            clipped += *bin - limit;
            *bin = limit;
        }
    }

    let batch = clipped / BINS;
    let mut residual = clipped % BINS;
    for bin in &mut hist {
        *bin += batch;
    }
    if residual > 0 {
        let step = (BINS / residual).max(1);
        let mut i = 0;
        while i < BINS && residual > 0 {
            hist[i] += 1;
            residual -= 1;
            i += step;
        }
    }

    let scale = 255.0 / area as f64;
    let mut lut = [0u8; BINS];
    let mut cdf = 0usize;
    for (entry, &count) in lut.iter_mut().zip(&hist) {
        cdf += count;
        *entry = saturate_u8(cdf as f64 * scale);
    }
    lut
}
