use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Trace colours
// ---------------------------------------------------------------------------

const GOLDEN_ANGLE: f32 = 137.507_77;

/// Colour of the `index`-th spectrum trace.
///
/// Hues advance by the golden angle so each new trace stays distinct from the
/// ones already on the plot, however many are added.
pub fn trace_color(index: usize) -> Color32 {
    let hue = (index as f32 * GOLDEN_ANGLE) % 360.0;
    let hsl = Hsl::new(hue, 0.75, 0.55);
    let rgb: Srgb = hsl.into_color();
    Color32::from_rgb(
        (rgb.red * 255.0) as u8,
        (rgb.green * 255.0) as u8,
        (rgb.blue * 255.0) as u8,
    )
}

/// Colour of a trace name in the side panel; dimmed when hidden.
pub fn label_color(color: Color32, visible: bool) -> Color32 {
    if visible {
        color
    } else {
        color.gamma_multiply(0.35)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consecutive_traces_differ() {
        let colors: Vec<Color32> = (0..8).map(trace_color).collect();
        for (i, a) in colors.iter().enumerate() {
            for b in &colors[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn first_trace_is_red_hue() {
        let c = trace_color(0);
        assert!(c.r() > c.g() && c.r() > c.b());
    }
}
