pub type Rgba = [u8; 4];

/// Converts hue (degrees), saturation and lightness (percent) into an 8-bit
/// colour. Alpha is passed through untouched.
pub fn hsl_to_rgba(hue: f32, saturation: f32, lightness: f32, alpha: u8) -> Rgba {
    let h = hue.rem_euclid(360.0);
    let s = (saturation / 100.0).clamp(0.0, 1.0);
    let l = (lightness / 100.0).clamp(0.0, 1.0);
    let a = s * l.min(1.0 - l);

    let channel = |n: f32| {
        let k = (n + h / 30.0).rem_euclid(12.0);
        let v = l - a * (k - 3.0).min(9.0 - k).min(1.0).max(-1.0);
        (v * 255.0).round().clamp(0.0, 255.0) as u8
    };

    [channel(0.0), channel(8.0), channel(4.0), alpha]
}

pub fn hsl(hue: f32, saturation: f32, lightness: f32) -> Rgba {
    hsl_to_rgba(hue, saturation, lightness, 255)
}

pub fn srgb_to_linear(value: f32) -> f32 {
    if value <= 0.04045 {
        value / 12.92
    } else {
        ((value + 0.055) / 1.055).powf(2.4)
    }
}

/// Colour as shader-ready floats: rgb linearised, alpha left linear.
pub fn to_linear(color: Rgba) -> [f32; 4] {
    [
        srgb_to_linear(color[0] as f32 / 255.0),
        srgb_to_linear(color[1] as f32 / 255.0),
        srgb_to_linear(color[2] as f32 / 255.0),
        color[3] as f32 / 255.0,
    ]
}
