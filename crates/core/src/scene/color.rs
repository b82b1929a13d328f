/// RGB to 8-bit HSV using the OpenCV convention: hue is halved into
/// `0..=180`, saturation and value span `0..=255`.
pub fn rgb_to_hsv8(r: u8, g: u8, b: u8) -> [u8; 3] {
    let (r, g, b) = (r as f32, g as f32, b as f32);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let v = max;
    let s = if max > 0.0 { 255.0 * delta / max } else { 0.0 };

    let h = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * (g - b) / delta
    } else if max == g {
        120.0 + 60.0 * (b - r) / delta
    } else {
        240.0 + 60.0 * (r - g) / delta
    };
    let h = if h < 0.0 { h + 360.0 } else { h };

    [
        (h / 2.0).round().min(180.0) as u8,
        s.round().min(255.0) as u8,
        v as u8,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::red(255, 0, 0, [0, 255, 255])]
    #[case::green(0, 255, 0, [60, 255, 255])]
    #[case::blue(0, 0, 255, [120, 255, 255])]
    #[case::yellow(255, 255, 0, [30, 255, 255])]
    #[case::magenta(255, 0, 255, [150, 255, 255])]
    #[case::black(0, 0, 0, [0, 0, 0])]
    #[case::gray(128, 128, 128, [0, 0, 128])]
    #[case::forest(34, 139, 34, [60, 193, 139])]
    #[case::sky(135, 206, 235, [99, 109, 235])]
    fn test_known_colors(#[case] r: u8, #[case] g: u8, #[case] b: u8, #[case] expected: [u8; 3]) {
        assert_eq!(rgb_to_hsv8(r, g, b), expected);
    }

    #[test]
    fn test_hue_never_exceeds_180() {
        for r in (0..=255).step_by(15) {
            for b in (0..=255).step_by(15) {
                let [h, _, _] = rgb_to_hsv8(r as u8, 0, b as u8);
                assert!(h <= 180);
            }
        }
    }
}
