// FAST-9 corner detection with Harris ranking
use image::GrayImage;

/// Bresenham circle of radius 3 around the candidate pixel
const CIRCLE: [(i32, i32); 16] = [
    (0, -3), (1, -3), (2, -2), (3, -1),
    (3, 0), (3, 1), (2, 2), (1, 3),
    (0, 3), (-1, 3), (-2, 2), (-3, 1),
    (-3, 0), (-3, -1), (-2, -2), (-1, -3),
];

/// Contiguous arc length required for a corner
const ARC_LENGTH: usize = 9;

/// Harris window half-size (7x7 block)
const HARRIS_RADIUS: i32 = 3;
const HARRIS_K: f64 = 0.04;

/// Minimum border that keeps every FAST and Harris access in bounds
pub const MIN_FAST_BORDER: u32 = (HARRIS_RADIUS + 1) as u32;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Corner {
    pub x: u32,
    pub y: u32,
    pub score: f32,
}

#[inline(always)]
fn pixel(image: &GrayImage, x: i32, y: i32) -> i16 {
    image.get_pixel(x as u32, y as u32)[0] as i16
}

/// FAST corner score: total contrast of circle pixels beyond the threshold,
/// or `None` when no 9-pixel arc is uniformly brighter or darker.
fn corner_score(image: &GrayImage, x: i32, y: i32, threshold: i16) -> Option<f32> {
    let center = pixel(image, x, y);
    let high = center + threshold;
    let low = center - threshold;

    // At least two of the four compass points must agree for any 9-arc
    let compass = [0usize, 4, 8, 12].map(|k| {
        let (dx, dy) = CIRCLE[k];
        pixel(image, x + dx, y + dy)
    });
    let bright = compass.iter().filter(|&&p| p > high).count();
    let dark = compass.iter().filter(|&&p| p < low).count();
    if bright < 2 && dark < 2 {
        return None;
    }

    let mut states = [0i8; 16];
    let mut contrast = 0i32;
    for (state, (dx, dy)) in states.iter_mut().zip(CIRCLE.iter()) {
        let p = pixel(image, x + dx, y + dy);
        if p > high {
            *state = 1;
            contrast += (p - high) as i32;
        } else if p < low {
            *state = -1;
            contrast += (low - p) as i32;
        }
    }

    let mut run = 0usize;
    let mut previous = 0i8;
    for k in 0..(16 + ARC_LENGTH) {
        let state = states[k % 16];
        run = if state != 0 && state == previous { run + 1 } else if state != 0 { 1 } else { 0 };
        previous = state;
        if run >= ARC_LENGTH {
            return Some(contrast.max(1) as f32);
        }
    }
    None
}

/// Detect FAST-9 corners with 3x3 non-maximum suppression
///
/// Only pixels at least `border` away from every edge are considered.
/// Output is in row-major scan order.
pub fn detect_fast9(image: &GrayImage, threshold: u8, border: u32) -> Vec<Corner> {
    let border = border.max(MIN_FAST_BORDER);
    let (width, height) = image.dimensions();
    if width <= 2 * border || height <= 2 * border {
        return Vec::new();
    }

    let w = width as usize;
    let mut scores = vec![0f32; w * height as usize];
    let threshold = threshold as i16;

    for y in border..height - border {
        for x in border..width - border {
            if let Some(score) = corner_score(image, x as i32, y as i32, threshold) {
                scores[y as usize * w + x as usize] = score;
            }
        }
    }

    let mut corners = Vec::new();
    for y in border..height - border {
        for x in border..width - border {
            let idx = y as usize * w + x as usize;
            let score = scores[idx];
            if score <= 0.0 {
                continue;
            }
            let mut is_max = true;
            'neighbors: for dy in -1i32..=1 {
                for dx in -1i32..=1 {
                    if dx == 0 && dy == 0 {
                        continue;
                    }
                    let n_idx = (y as i32 + dy) as usize * w + (x as i32 + dx) as usize;
                    let neighbor = scores[n_idx];
                    // Plateaus keep the first pixel in scan order
                    let earlier = dy < 0 || (dy == 0 && dx < 0);
                    if neighbor > score || (neighbor == score && earlier) {
                        is_max = false;
                        break 'neighbors;
                    }
                }
            }
            if is_max {
                corners.push(Corner { x, y, score });
            }
        }
    }

    corners
}

/// Harris corner response over a 7x7 window centered on (x, y)
///
/// Caller guarantees the window plus one pixel of gradient support is in bounds.
pub fn harris_response(image: &GrayImage, x: u32, y: u32) -> f32 {
    let (cx, cy) = (x as i32, y as i32);
    let (mut a, mut b, mut c) = (0f64, 0f64, 0f64);

    for dy in -HARRIS_RADIUS..=HARRIS_RADIUS {
        for dx in -HARRIS_RADIUS..=HARRIS_RADIUS {
            let px = cx + dx;
            let py = cy + dy;
            let ix = (pixel(image, px + 1, py) - pixel(image, px - 1, py)) as f64;
            let iy = (pixel(image, px, py + 1) - pixel(image, px, py - 1)) as f64;
            a += ix * ix;
            b += iy * iy;
            c += ix * iy;
        }
    }

    (a * b - c * c - HARRIS_K * (a + b) * (a + b)) as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn square_image() -> GrayImage {
        let mut img = GrayImage::from_pixel(64, 64, Luma([0]));
        for y in 20..44 {
            for x in 20..44 {
                img.put_pixel(x, y, Luma([255]));
            }
        }
        img
    }

    #[test]
    fn test_flat_image_has_no_corners() {
        let img = GrayImage::from_pixel(64, 64, Luma([128]));
        assert!(detect_fast9(&img, 20, 4).is_empty());
    }

    #[test]
    fn test_square_corners_detected() {
        let corners = detect_fast9(&square_image(), 20, 4);
        assert!(!corners.is_empty());
        // Every detection sits near one of the four square corners
        for corner in &corners {
            let near_x = (corner.x as i32 - 20).abs() <= 3 || (corner.x as i32 - 43).abs() <= 3;
            let near_y = (corner.y as i32 - 20).abs() <= 3 || (corner.y as i32 - 43).abs() <= 3;
            assert!(near_x && near_y, "unexpected corner at {:?}", corner);
        }
    }

    #[test]
    fn test_image_smaller_than_border() {
        let img = GrayImage::from_pixel(8, 8, Luma([0]));
        assert!(detect_fast9(&img, 20, 4).is_empty());
    }

    #[test]
    fn test_harris_prefers_corners_over_edges() {
        let img = square_image();
        let corner = harris_response(&img, 20, 20);
        let edge = harris_response(&img, 32, 20);
        let flat = harris_response(&img, 32, 32);
        assert!(corner > edge);
        assert!(corner > flat);
    }
}
