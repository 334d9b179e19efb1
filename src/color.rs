use anyhow::{anyhow, Result};
use eframe::egui::Color32;

pub fn parse_color(value: &str) -> Result<Color32> {
    let v = value.trim();
    if v.eq_ignore_ascii_case("transparent") {
        return Ok(Color32::TRANSPARENT);
    }
    if let Some(hex) = v.strip_prefix('#') {
        return parse_hex_color(hex);
    }
    if let Some(rest) = v.strip_prefix("rgba(") {
        let (r, g, b, a) = parse_rgba_components(rest.trim_end_matches(')'))?;
        return Ok(Color32::from_rgba_unmultiplied(r, g, b, a));
    }
    if let Some(rest) = v.strip_prefix("rgb(") {
        let (r, g, b) = parse_rgb_components(rest.trim_end_matches(')'))?;
        return Ok(Color32::from_rgb(r, g, b));
    }
    Err(anyhow!("Unsupported color format: {v}"))
}

fn parse_hex_color(hex: &str) -> Result<Color32> {
    let value = hex.trim();
    if !matches!(value.len(), 6 | 8) {
        return Err(anyhow!("Invalid hex color: #{value}"));
    }
    let bits =
        u32::from_str_radix(value, 16).map_err(|_| anyhow!("Invalid hex color: #{value}"))?;

    Ok(if value.len() == 6 {
        let r = ((bits >> 16) & 0xFF) as u8;
        let g = ((bits >> 8) & 0xFF) as u8;
        let b = (bits & 0xFF) as u8;
        Color32::from_rgb(r, g, b)
    } else {
        let r = ((bits >> 24) & 0xFF) as u8;
        let g = ((bits >> 16) & 0xFF) as u8;
        let b = ((bits >> 8) & 0xFF) as u8;
        let a = (bits & 0xFF) as u8;
        Color32::from_rgba_unmultiplied(r, g, b, a)
    })
}

fn parse_rgba_components(input: &str) -> Result<(u8, u8, u8, u8)> {
    let parts: Vec<_> = input.split(',').map(|p| p.trim()).collect();
    if parts.len() != 4 {
        return Err(anyhow!("rgba expects 4 components"));
    }
    let (r, g, b) = parse_rgb_components(&parts[0..3].join(","))?;
    let a = parse_alpha(parts[3])?;
    Ok((r, g, b, a))
}

fn parse_rgb_components(input: &str) -> Result<(u8, u8, u8)> {
    let parts: Vec<_> = input.split(',').map(|p| p.trim()).collect();
    if parts.len() != 3 {
        return Err(anyhow!("rgb expects 3 components"));
    }
    Ok((
        parse_component(parts[0])?,
        parse_component(parts[1])?,
        parse_component(parts[2])?,
    ))
}

fn parse_component(src: &str) -> Result<u8> {
    let value: f32 = src
        .parse()
        .map_err(|_| anyhow!("Invalid color channel: {src}"))?;
    if !(0.0..=255.0).contains(&value) {
        return Err(anyhow!("Color channel out of range: {src}"));
    }
    Ok(value.round() as u8)
}

fn parse_alpha(src: &str) -> Result<u8> {
    if src.contains('.') {
        let value: f32 = src.parse().map_err(|_| anyhow!("Invalid alpha: {src}"))?;
        if !(0.0..=1.0).contains(&value) {
            return Err(anyhow!("Alpha out of range: {src}"));
        }
        Ok((value * 255.0).round() as u8)
    } else {
        parse_component(src)
    }
}

/// Replaces the alpha channel, keeping the unmultiplied color.
pub fn with_alpha(color: Color32, alpha: u8) -> Color32 {
    let [r, g, b, _] = color.to_srgba_unmultiplied();
    Color32::from_rgba_unmultiplied(r, g, b, alpha)
}

/// Hue in degrees `[0, 360)`, saturation and value in `[0, 1]`, alpha untouched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsv {
    pub h: f32,
    pub s: f32,
    pub v: f32,
    pub a: u8,
}

impl Hsv {
    pub fn from_color(color: Color32) -> Self {
        let [r, g, b, a] = color.to_srgba_unmultiplied();
        let r = r as f32 / 255.0;
        let g = g as f32 / 255.0;
        let b = b as f32 / 255.0;

        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let delta = max - min;

        let h = if delta <= f32::EPSILON {
            0.0
        } else if max == r {
            60.0 * ((g - b) / delta).rem_euclid(6.0)
        } else if max == g {
            60.0 * ((b - r) / delta + 2.0)
        } else {
            60.0 * ((r - g) / delta + 4.0)
        };
        let s = if max <= f32::EPSILON { 0.0 } else { delta / max };

        Self { h, s, v: max, a }
    }

    pub fn to_color(self) -> Color32 {
        let h = self.h.rem_euclid(360.0);
        let s = self.s.clamp(0.0, 1.0);
        let v = self.v.clamp(0.0, 1.0);

        let c = v * s;
        let x = c * (1.0 - ((h / 60.0).rem_euclid(2.0) - 1.0).abs());
        let m = v - c;
        let (r, g, b) = match (h / 60.0) as u32 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };
        let channel = |value: f32| ((value + m) * 255.0).round().clamp(0.0, 255.0) as u8;
        Color32::from_rgba_unmultiplied(channel(r), channel(g), channel(b), self.a)
    }
}

/// Linear interpolation between two colors in HSV space.
///
/// Alpha is interpolated alongside the HSV channels so translucent endpoints
/// blend as well.
#[derive(Debug, Clone, Copy)]
pub struct ColorChanger {
    from: Hsv,
    to: Hsv,
}

impl Default for ColorChanger {
    fn default() -> Self {
        Self::new(Color32::BLACK, Color32::BLACK)
    }
}

impl ColorChanger {
    pub fn new(from: Color32, to: Color32) -> Self {
        Self {
            from: Hsv::from_color(from),
            to: Hsv::from_color(to),
        }
    }

    pub fn from_color(&mut self, color: Color32) -> &mut Self {
        self.from = Hsv::from_color(color);
        self
    }

    pub fn to_color(&mut self, color: Color32) -> &mut Self {
        self.to = Hsv::from_color(color);
        self
    }

    pub fn next_color(&self, t: f32) -> Color32 {
        let lerp = |a: f32, b: f32| a + (b - a) * t;
        Hsv {
            h: lerp(self.from.h, self.to.h),
            s: lerp(self.from.s, self.to.s),
            v: lerp(self.from.v, self.to.v),
            a: lerp(self.from.a as f32, self.to.a as f32).round().clamp(0.0, 255.0) as u8,
        }
        .to_color()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Color32, b: Color32) -> bool {
        let a = a.to_srgba_unmultiplied();
        let b = b.to_srgba_unmultiplied();
        a.iter()
            .zip(b.iter())
            .all(|(x, y)| (*x as i16 - *y as i16).abs() <= 1)
    }

    #[test]
    fn parses_supported_formats() {
        assert_eq!(parse_color("#ff0000").unwrap(), Color32::from_rgb(255, 0, 0));
        assert_eq!(
            parse_color("rgb(0, 128, 255)").unwrap(),
            Color32::from_rgb(0, 128, 255)
        );
        assert_eq!(
            parse_color("#00ff00ff").unwrap(),
            Color32::from_rgb(0, 255, 0)
        );
        assert_eq!(
            parse_color("rgba(10, 20, 30, 1.0)").unwrap(),
            Color32::from_rgb(10, 20, 30)
        );
        assert!(parse_color("#12").is_err());
        assert!(parse_color("hsl(1, 2, 3)").is_err());
        assert!(parse_color("rgb(300, 0, 0)").is_err());
    }

    #[test]
    fn changer_hits_both_endpoints() {
        let pairs = [
            (Color32::from_rgb(0x6a, 0x15, 0x5f), Color32::from_rgb(0xff, 0xc1, 0x07)),
            (Color32::from_rgb(12, 200, 90), Color32::from_rgb(250, 250, 250)),
            (Color32::BLACK, Color32::WHITE),
            (Color32::from_rgb(255, 0, 0), Color32::from_rgb(0, 0, 255)),
        ];
        for (from, to) in pairs {
            let changer = ColorChanger::new(from, to);
            assert!(close(changer.next_color(0.0), from), "{from:?}");
            assert!(close(changer.next_color(1.0), to), "{to:?}");
        }
    }

    #[test]
    fn changer_interpolates_hue_linearly() {
        let changer = ColorChanger::new(Color32::from_rgb(255, 0, 0), Color32::from_rgb(0, 255, 0));
        let mid = Hsv::from_color(changer.next_color(0.5));
        assert!((mid.h - 60.0).abs() < 1.0);
        assert!((mid.s - 1.0).abs() < 0.01);
    }

    #[test]
    fn hsv_round_trips_grey() {
        let grey = Color32::from_rgb(128, 128, 128);
        let hsv = Hsv::from_color(grey);
        assert_eq!(hsv.s, 0.0);
        assert_eq!(hsv.to_color(), grey);
    }
}
