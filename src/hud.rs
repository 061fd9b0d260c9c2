use crate::color::to_linear;
use crate::font::{layout_text, text_width};
use crate::input::{on_off, ToggleState};

pub const HUD_HEIGHT: f32 = 64.0;
const HUD_BACKGROUND: [u8; 4] = [0, 0, 0, 80];
const HUD_TEXT: [u8; 4] = [255, 255, 255, 255];
const TEXT_HEIGHT: f32 = 7.0;
const TEXT_LEFT: f32 = 12.0;
const LINE_CENTRES: [f32; 2] = [20.0, 42.0];

pub const MOUSE_HELP: &str = "DRAG: ORBIT | WHEEL: ZOOM | RIGHT-DRAG/CTRL-DRAG: PAN";

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct UiVertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

pub fn toggle_help(toggles: &ToggleState) -> String {
    format!(
        "[R] AUTO-ROTATE {}  [G] GRID {}  [F] FLICKER {}  [B] GLOW {}  [0] RESET",
        on_off(toggles.auto_rotate),
        on_off(toggles.show_grid),
        on_off(toggles.enable_flicker),
        on_off(toggles.enable_glow),
    )
}

/// Screen-space quads laid out in pixels (origin top-left) and stored in
/// normalised device coordinates for the current viewport.
pub struct UiGeometry {
    viewport: (f32, f32),
    pub vertices: Vec<UiVertex>,
    pub indices: Vec<u16>,
}

impl UiGeometry {
    pub fn new(viewport: (f32, f32)) -> Self {
        Self {
            viewport,
            vertices: Vec::new(),
            indices: Vec::new(),
        }
    }

    fn to_ndc(&self, x: f32, y: f32) -> [f32; 2] {
        [x / self.viewport.0 * 2.0 - 1.0, 1.0 - y / self.viewport.1 * 2.0]
    }

    pub fn add_rect(&mut self, min: (f32, f32), max: (f32, f32), color: [f32; 4]) {
        if max.0 <= min.0 || max.1 <= min.1 {
            return;
        }
        let base = self.vertices.len();
        if base > (u16::MAX as usize) - 4 {
            return;
        }
        let base_index = base as u16;

        for (x, y) in [(min.0, min.1), (max.0, min.1), (max.0, max.1), (min.0, max.1)] {
            let position = self.to_ndc(x, y);
            self.vertices.push(UiVertex { position, color });
        }

        self.indices.extend_from_slice(&[
            base_index,
            base_index + 1,
            base_index + 2,
            base_index,
            base_index + 2,
            base_index + 3,
        ]);
    }

    pub fn add_text(&mut self, origin: (f32, f32), height: f32, color: [f32; 4], text: &str) {
        layout_text(text, origin, height, |x, y, cell| {
            self.add_rect((x, y), (x + cell, y + cell), color);
        });
    }
}

/// Shrinks the glyphs when a line would run past the right edge.
fn fitted_height(line: &str, viewport_width: f32) -> f32 {
    let available = viewport_width - 2.0 * TEXT_LEFT;
    let natural = text_width(line, TEXT_HEIGHT);
    if natural <= available || natural <= 0.0 {
        TEXT_HEIGHT
    } else {
        (TEXT_HEIGHT * available / natural).max(0.0)
    }
}

/// Bottom help strip: translucent band with the mouse controls and the
/// current state of every toggle.
pub fn build_hud(toggles: &ToggleState, viewport: (f32, f32)) -> UiGeometry {
    let mut ui = UiGeometry::new(viewport);
    if viewport.0 <= 0.0 || viewport.1 <= 0.0 {
        return ui;
    }

    let top = viewport.1 - HUD_HEIGHT;
    ui.add_rect((0.0, top), (viewport.0, viewport.1), to_linear(HUD_BACKGROUND));

    let text_color = to_linear(HUD_TEXT);
    let lines = [MOUSE_HELP.to_string(), toggle_help(toggles)];
    for (line, centre) in lines.iter().zip(LINE_CENTRES) {
        let height = fitted_height(line, viewport.0);
        let origin = (TEXT_LEFT, top + centre - height / 2.0);
        ui.add_text(origin, height, text_color, line);
    }
    ui
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn help_line_reports_every_toggle() {
        let text = toggle_help(&ToggleState::default());
        assert_eq!(
            text,
            "[R] AUTO-ROTATE OFF  [G] GRID ON  [F] FLICKER ON  [B] GLOW ON  [0] RESET"
        );
        let flipped = toggle_help(&ToggleState {
            enable_glow: false,
            auto_rotate: true,
            ..ToggleState::default()
        });
        assert!(flipped.contains("[B] GLOW OFF"));
        assert!(flipped.contains("[R] AUTO-ROTATE ON"));
    }

    #[test]
    fn background_strip_spans_the_bottom() {
        let hud = build_hud(&ToggleState::default(), (600.0, 600.0));
        let strip = &hud.vertices[..4];
        let top_ndc = 1.0 - (600.0 - HUD_HEIGHT) / 600.0 * 2.0;
        assert_eq!(strip[0].position, [-1.0, top_ndc]);
        assert_eq!(strip[2].position, [1.0, -1.0]);
        assert!((strip[0].color[3] - 80.0 / 255.0).abs() < 1e-6);
        assert_eq!(strip[0].color[..3], [0.0, 0.0, 0.0]);
    }

    #[test]
    fn text_stays_inside_the_strip() {
        let hud = build_hud(&ToggleState::default(), (600.0, 600.0));
        assert!(hud.vertices.len() > 4);
        assert_eq!(hud.indices.len() / 6, hud.vertices.len() / 4);
        let top_ndc = 1.0 - (600.0 - HUD_HEIGHT) / 600.0 * 2.0;
        for v in &hud.vertices[4..] {
            assert!(v.position[1] <= top_ndc && v.position[1] >= -1.0);
            assert!(v.position[0] >= -1.0 && v.position[0] <= 1.0);
        }
    }

    #[test]
    fn toggling_changes_the_text_geometry() {
        let on = build_hud(&ToggleState::default(), (600.0, 600.0));
        let off = build_hud(
            &ToggleState {
                show_grid: false,
                ..ToggleState::default()
            },
            (600.0, 600.0),
        );
        assert_ne!(on.vertices, off.vertices);
    }

    #[test]
    fn narrow_viewports_shrink_the_text() {
        let line = toggle_help(&ToggleState::default());
        assert_eq!(fitted_height(&line, 600.0), TEXT_HEIGHT);
        let narrow = fitted_height(&line, 200.0);
        assert!(narrow < TEXT_HEIGHT);
        assert!(text_width(&line, narrow) <= 200.0 - 2.0 * TEXT_LEFT + 1e-3);

        let hud = build_hud(&ToggleState::default(), (200.0, 600.0));
        assert!(hud.vertices.iter().all(|v| v.position[0] <= 1.0));
    }

    #[test]
    fn empty_viewport_builds_nothing() {
        let hud = build_hud(&ToggleState::default(), (0.0, 0.0));
        assert!(hud.vertices.is_empty() && hud.indices.is_empty());
    }
}
