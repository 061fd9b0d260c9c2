use winit::keyboard::KeyCode;

/// Display switches flipped from the keyboard. Copied into each frame so the
/// renderer sees one consistent snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ToggleState {
    pub auto_rotate: bool,
    pub show_grid: bool,
    pub enable_flicker: bool,
    pub enable_glow: bool,
}

impl Default for ToggleState {
    fn default() -> Self {
        Self {
            auto_rotate: false,
            show_grid: true,
            enable_flicker: true,
            enable_glow: true,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputAction {
    ToggleAutoRotate,
    ToggleGrid,
    ToggleFlicker,
    ToggleGlow,
    ResetView,
}

impl InputAction {
    pub fn from_key(key: KeyCode) -> Option<Self> {
        match key {
            KeyCode::KeyR => Some(Self::ToggleAutoRotate),
            KeyCode::KeyG => Some(Self::ToggleGrid),
            KeyCode::KeyF => Some(Self::ToggleFlicker),
            KeyCode::KeyB => Some(Self::ToggleGlow),
            KeyCode::Digit0 | KeyCode::Numpad0 => Some(Self::ResetView),
            _ => None,
        }
    }
}

/// Sole writer of [`ToggleState`].
#[derive(Default)]
pub struct InputController {
    toggles: ToggleState,
}

impl InputController {
    pub fn new(toggles: ToggleState) -> Self {
        Self { toggles }
    }

    pub fn toggles(&self) -> ToggleState {
        self.toggles
    }

    /// Handles one key press. Returns the action taken so the caller can do
    /// its share of the work (the camera reset lives with the host).
    pub fn process_key(&mut self, key: KeyCode, repeat: bool) -> Option<InputAction> {
        if repeat {
            return None;
        }
        let action = InputAction::from_key(key)?;
        self.apply(action);
        Some(action)
    }

    pub fn apply(&mut self, action: InputAction) {
        let toggles = &mut self.toggles;
        match action {
            InputAction::ToggleAutoRotate => toggles.auto_rotate = !toggles.auto_rotate,
            InputAction::ToggleGrid => toggles.show_grid = !toggles.show_grid,
            InputAction::ToggleFlicker => toggles.enable_flicker = !toggles.enable_flicker,
            InputAction::ToggleGlow => toggles.enable_glow = !toggles.enable_glow,
            InputAction::ResetView => toggles.auto_rotate = false,
        }
    }
}

pub fn on_off(value: bool) -> &'static str {
    if value {
        "ON"
    } else {
        "OFF"
    }
}
