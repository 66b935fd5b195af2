use serde::{Deserialize, Serialize};

/// Linear RGB in `[0, 1]`.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0);
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Parses `#rrggbb`, `rrggbb` or `#rgb`.
    pub fn from_hex(s: &str) -> Option<Self> {
        let hex = s.trim().trim_start_matches('#');
        let expanded: String = match hex.len() {
            3 => hex.chars().flat_map(|c| [c, c]).collect(),
            6 => hex.to_string(),
            _ => return None,
        };
        let v = u32::from_str_radix(&expanded, 16).ok()?;
        Some(Self::from_u32(v))
    }

    /// Like [`Rgb::from_hex`] but never fails.
    pub fn from_hex_or(s: &str, fallback: Self) -> Self {
        Self::from_hex(s).unwrap_or(fallback)
    }

    pub fn from_u32(v: u32) -> Self {
        let r = ((v >> 16) & 0xff) as f32 / 255.0;
        let g = ((v >> 8) & 0xff) as f32 / 255.0;
        let b = (v & 0xff) as f32 / 255.0;
        Self::new(r, g, b)
    }

    /// HSL to RGB; all components in `[0, 1]` (hue wraps).
    pub fn from_hsl(h: f32, s: f32, l: f32) -> Self {
        let h = h.rem_euclid(1.0);
        let s = s.clamp(0.0, 1.0);
        let l = l.clamp(0.0, 1.0);
        if s <= 0.0 {
            return Self::new(l, l, l);
        }
        let q = if l <= 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let p = 2.0 * l - q;
        Self::new(
            hue_to_channel(p, q, h + 1.0 / 3.0),
            hue_to_channel(p, q, h),
            hue_to_channel(p, q, h - 1.0 / 3.0),
        )
    }

    /// Replaces non-finite channels with the fallback's and clamps to `[0, 1]`.
    pub fn sanitized(self, fallback: Self) -> Self {
        let fix = |v: f32, f: f32| if v.is_finite() { v.clamp(0.0, 1.0) } else { f };
        Self::new(
            fix(self.r, fallback.r),
            fix(self.g, fallback.g),
            fix(self.b, fallback.b),
        )
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }
}

fn hue_to_channel(p: f32, q: f32, t: f32) -> f32 {
    let t = t.rem_euclid(1.0);
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * 6.0 * (2.0 / 3.0 - t)
    } else {
        p
    }
}
