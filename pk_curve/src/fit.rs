//! Shrink-only scaling of an image to a container width.

/// Scales natural image dimensions so the larger one fits `container_w`,
/// preserving aspect ratio. Images are only ever shrunk: each displayed
/// dimension is clamped to its natural value, so a small image keeps its
/// native size. Returns `(width, height)` in whole pixels.
pub fn fit_to_width(natural_w: u32, natural_h: u32, container_w: u32) -> (u32, u32) {
    let largest = natural_w.max(natural_h);
    if largest == 0 {
        return (natural_w, natural_h);
    }
    let scale = f64::from(container_w) / f64::from(largest);
    let width = ((f64::from(natural_w) * scale).round() as u32).min(natural_w);
    let height = ((f64::from(natural_h) * scale).round() as u32).min(natural_h);
    (width, height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wide_image_shrinks_to_container() {
        assert_eq!(fit_to_width(800, 400, 400), (400, 200));
    }

    #[test]
    fn tall_image_scales_by_its_height() {
        assert_eq!(fit_to_width(300, 600, 300), (150, 300));
    }

    #[test]
    fn small_image_is_never_enlarged() {
        assert_eq!(fit_to_width(100, 50, 400), (100, 50));
        assert_eq!(fit_to_width(400, 400, 400), (400, 400));
    }

    #[test]
    fn degenerate_dimensions_pass_through() {
        assert_eq!(fit_to_width(0, 0, 400), (0, 0));
    }
}
