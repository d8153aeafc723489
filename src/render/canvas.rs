/// Straight (non-premultiplied) RGBA color.
pub type Rgba = [u8; 4];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

impl CanvasSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> (f32, f32) {
        (self.width as f32 * 0.5, self.height as f32 * 0.5)
    }

    pub fn shorter_side(&self) -> f32 {
        self.width.min(self.height) as f32
    }
}

/// One output frame: row-major, `channels` bytes per pixel (3 = RGB, 4 = RGBA).
#[derive(Clone, Debug, PartialEq)]
pub struct PixelBuffer {
    pub width: u32,
    pub height: u32,
    pub channels: u8,
    pub data: Vec<u8>,
}

impl PixelBuffer {
    pub fn new(size: CanvasSize, channels: u8) -> Self {
        let channels = channels.clamp(3, 4);
        Self {
            width: size.width,
            height: size.height,
            channels,
            data: vec![0; size.width as usize * size.height as usize * channels as usize],
        }
    }

    /// RGBA canvas cleared to `color`.
    pub fn filled(size: CanvasSize, color: Rgba) -> Self {
        let mut buf = Self::new(size, 4);
        buf.fill(color);
        buf
    }

    /// Expected byte length for the declared dimensions.
    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * self.channels as usize
    }

    pub fn fill(&mut self, color: Rgba) {
        let ch = self.channels as usize;
        for px in self.data.chunks_exact_mut(ch) {
            px.copy_from_slice(&color[..ch]);
        }
    }

    #[cfg(test)]
    pub fn pixel(&self, x: u32, y: u32) -> Option<&[u8]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let ch = self.channels as usize;
        let idx = (y as usize * self.width as usize + x as usize) * ch;
        self.data.get(idx..idx + ch)
    }

    /// Alpha-blend `color` over the pixel at (x, y). Out-of-bounds is a no-op.
    pub fn blend_pixel(&mut self, x: i32, y: i32, color: Rgba) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        let ch = self.channels as usize;
        let idx = (y as usize * self.width as usize + x as usize) * ch;

        let a = color[3] as f32 / 255.0;
        let inv_a = 1.0 - a;
        for c in 0..3 {
            let dst = self.data[idx + c] as f32;
            self.data[idx + c] = (color[c] as f32 * a + dst * inv_a).round() as u8;
        }
        if ch == 4 {
            self.data[idx + 3] = 255;
        }
    }

    pub fn fill_rect(&mut self, x0: f32, y0: f32, x1: f32, y1: f32, color: Rgba) {
        let (xa, xb) = ordered(x0, x1);
        let (ya, yb) = ordered(y0, y1);
        let (px0, px1) = self.clip_x(xa, xb);
        let (py0, py1) = self.clip_y(ya, yb);
        for y in py0..py1 {
            for x in px0..px1 {
                self.blend_pixel(x, y, color);
            }
        }
    }

    pub fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32, color: Rgba) {
        if radius <= 0.0 {
            return;
        }
        let r2 = radius * radius;
        self.for_each_in_box(
            cx - radius,
            cy - radius,
            cx + radius,
            cy + radius,
            |x, y| {
                let dx = x as f32 + 0.5 - cx;
                let dy = y as f32 + 0.5 - cy;
                dx * dx + dy * dy <= r2
            },
            color,
        );
    }

    pub fn stroke_circle(&mut self, cx: f32, cy: f32, radius: f32, thickness: f32, color: Rgba) {
        let half = (thickness * 0.5).max(0.5);
        let outer = radius + half;
        let inner = (radius - half).max(0.0);
        let (o2, i2) = (outer * outer, inner * inner);
        self.for_each_in_box(
            cx - outer,
            cy - outer,
            cx + outer,
            cy + outer,
            |x, y| {
                let dx = x as f32 + 0.5 - cx;
                let dy = y as f32 + 0.5 - cy;
                let d2 = dx * dx + dy * dy;
                d2 <= o2 && d2 >= i2
            },
            color,
        );
    }

    /// Thick segment; each covered pixel is blended exactly once.
    pub fn draw_line(&mut self, x0: f32, y0: f32, x1: f32, y1: f32, thickness: f32, color: Rgba) {
        let half = (thickness * 0.5).max(0.5);
        let (dx, dy) = (x1 - x0, y1 - y0);
        let len2 = dx * dx + dy * dy;

        self.for_each_in_box(
            x0.min(x1) - half,
            y0.min(y1) - half,
            x0.max(x1) + half,
            y0.max(y1) + half,
            |x, y| {
                let px = x as f32 + 0.5;
                let py = y as f32 + 0.5;
                let t = if len2 > 0.0 {
                    (((px - x0) * dx + (py - y0) * dy) / len2).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                let (qx, qy) = (x0 + t * dx - px, y0 + t * dy - py);
                qx * qx + qy * qy <= half * half
            },
            color,
        );
    }

    fn for_each_in_box(
        &mut self,
        x0: f32,
        y0: f32,
        x1: f32,
        y1: f32,
        covered: impl Fn(i32, i32) -> bool,
        color: Rgba,
    ) {
        let (px0, px1) = self.clip_x(x0, x1 + 1.0);
        let (py0, py1) = self.clip_y(y0, y1 + 1.0);
        for y in py0..py1 {
            for x in px0..px1 {
                if covered(x, y) {
                    self.blend_pixel(x, y, color);
                }
            }
        }
    }

    fn clip_x(&self, a: f32, b: f32) -> (i32, i32) {
        let max = self.width as f32;
        (a.floor().clamp(0.0, max) as i32, b.ceil().clamp(0.0, max) as i32)
    }

    fn clip_y(&self, a: f32, b: f32) -> (i32, i32) {
        let max = self.height as f32;
        (a.floor().clamp(0.0, max) as i32, b.ceil().clamp(0.0, max) as i32)
    }
}

fn ordered(a: f32, b: f32) -> (f32, f32) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgba = [255, 0, 0, 255];

    #[test]
    fn new_buffer_has_expected_len() {
        let buf = PixelBuffer::new(CanvasSize::new(4, 3), 4);
        assert_eq!(buf.data.len(), 48);
        assert_eq!(buf.expected_len(), 48);
        let rgb = PixelBuffer::new(CanvasSize::new(4, 3), 3);
        assert_eq!(rgb.data.len(), 36);
    }

    #[test]
    fn blend_half_alpha_over_black() {
        let mut buf = PixelBuffer::filled(CanvasSize::new(1, 1), [0, 0, 0, 255]);
        buf.blend_pixel(0, 0, [255, 0, 0, 128]);
        assert_eq!(buf.pixel(0, 0), Some(&[128u8, 0, 0, 255][..]));
    }

    #[test]
    fn drawing_outside_is_clipped() {
        let mut buf = PixelBuffer::filled(CanvasSize::new(8, 8), [0, 0, 0, 255]);
        buf.fill_rect(-10.0, -10.0, -1.0, -1.0, RED);
        buf.fill_circle(100.0, 100.0, 5.0, RED);
        buf.draw_line(-20.0, 50.0, 50.0, 50.0, 3.0, RED);
        assert!(buf.data.chunks_exact(4).all(|px| px == [0, 0, 0, 255]));
    }

    #[test]
    fn fill_rect_covers_area() {
        let mut buf = PixelBuffer::filled(CanvasSize::new(10, 10), [0, 0, 0, 255]);
        buf.fill_rect(2.0, 2.0, 5.0, 4.0, RED);
        let lit = buf.data.chunks_exact(4).filter(|px| px[0] == 255).count();
        assert_eq!(lit, 3 * 2);
        assert_eq!(buf.pixel(2, 2), Some(&RED[..]));
        assert_eq!(buf.pixel(5, 4), Some(&[0u8, 0, 0, 255][..]));
    }

    #[test]
    fn line_touches_both_endpoints() {
        let mut buf = PixelBuffer::filled(CanvasSize::new(20, 20), [0, 0, 0, 255]);
        buf.draw_line(2.5, 2.5, 17.5, 17.5, 1.0, RED);
        assert_eq!(buf.pixel(2, 2), Some(&RED[..]));
        assert_eq!(buf.pixel(17, 17), Some(&RED[..]));
        assert_eq!(buf.pixel(17, 2), Some(&[0u8, 0, 0, 255][..]));
    }

    #[test]
    fn ring_leaves_center_empty() {
        let mut buf = PixelBuffer::filled(CanvasSize::new(40, 40), [0, 0, 0, 255]);
        buf.stroke_circle(20.0, 20.0, 12.0, 2.0, RED);
        assert_eq!(buf.pixel(20, 20), Some(&[0u8, 0, 0, 255][..]));
        assert_eq!(buf.pixel(31, 20), Some(&RED[..]));
    }
}
