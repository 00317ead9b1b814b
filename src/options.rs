//! Tunable camera and control parameters with TOML support.
//!
//! Every section uses `#[serde(default)]`, so a file that only overrides
//! `[controls]` keeps the stock camera.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::OptionsError;

/// Top-level options container.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub(crate) struct SketchOptions {
    pub(crate) camera: CameraOptions,
    pub(crate) controls: ControlOptions,
    pub(crate) viewport: ViewportOptions,
}

impl SketchOptions {
    /// Load options from a TOML file. Missing fields use defaults.
    pub(crate) fn load(path: &Path) -> Result<Self, OptionsError> {
        let content = std::fs::read_to_string(path).map_err(|source| OptionsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let options: Self = toml::from_str(&content).map_err(|source| OptionsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        options.validate()?;
        Ok(options)
    }

    /// Rejects values that would turn camera math into NaN or Infinity.
    pub(crate) fn validate(&self) -> Result<(), OptionsError> {
        let camera = &self.camera;
        let controls = &self.controls;

        positive("camera.fov_degrees", camera.fov_degrees)?;
        positive("camera.min_fov_degrees", camera.min_fov_degrees)?;
        positive("camera.max_fov_degrees", camera.max_fov_degrees)?;
        for (field, values) in [
            ("camera.translation", camera.translation),
            ("camera.rotation_degrees", camera.rotation_degrees),
            ("camera.eye", camera.eye),
            ("camera.target", camera.target),
            ("camera.up", camera.up),
        ] {
            for value in values {
                finite(field, value)?;
            }
        }

        positive("controls.drag_normalization", controls.drag_normalization)?;
        positive("controls.rotate_speed", controls.rotate_speed)?;
        positive("controls.pan_speed", controls.pan_speed)?;
        positive("controls.zoom_speed", controls.zoom_speed)?;
        positive("controls.wheel_line_pixels", controls.wheel_line_pixels)?;
        positive("viewport.device_pixel_ratio", self.viewport.device_pixel_ratio)
    }

    /// Save options to a TOML file (pretty-printed).
    pub(crate) fn save(&self, path: &Path) -> Result<(), OptionsError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|source| OptionsError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), OptionsError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(OptionsError::NotPositive { field, value })
    }
}

fn finite(field: &'static str, value: f32) -> Result<(), OptionsError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(OptionsError::NotFinite { field, value })
    }
}

/// Initial camera state and the fixed look-at/projection setup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub(crate) struct CameraOptions {
    /// Starting vertical field of view in degrees.
    pub(crate) fov_degrees: f32,
    pub(crate) min_fov_degrees: f32,
    pub(crate) max_fov_degrees: f32,
    /// Starting world-space offset of the geometry.
    pub(crate) translation: [f32; 3],
    /// Starting rotation around local X, Y, Z in degrees.
    pub(crate) rotation_degrees: [f32; 3],
    pub(crate) near: f32,
    pub(crate) far: f32,
    pub(crate) eye: [f32; 3],
    pub(crate) target: [f32; 3],
    pub(crate) up: [f32; 3],
}

impl Default for CameraOptions {
    fn default() -> Self {
        Self {
            fov_degrees: 60.0,
            min_fov_degrees: 30.0,
            max_fov_degrees: 120.0,
            translation: [0.0, 0.0, -1000.0],
            rotation_degrees: [30.0, -20.0, 0.0],
            near: 1.0,
            far: 2000.0,
            eye: [0.0, 0.0, 100.0],
            target: [0.0, 0.0, 0.0],
            up: [0.0, 1.0, 0.0],
        }
    }
}

/// Modifier keys that can be bound to pan mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum ModifierKey {
    Alt,
    Shift,
    Control,
}

impl ModifierKey {
    pub(crate) const ALL: [ModifierKey; 3] =
        [ModifierKey::Alt, ModifierKey::Shift, ModifierKey::Control];
}

impl std::fmt::Display for ModifierKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModifierKey::Alt => write!(f, "Alt"),
            ModifierKey::Shift => write!(f, "Shift"),
            ModifierKey::Control => write!(f, "Control"),
        }
    }
}

/// Input sensitivities.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub(crate) struct ControlOptions {
    /// Key that switches drags into pan mode while held.
    pub(crate) pan_key: ModifierKey,
    /// Pointer deltas are scaled by `drag_normalization / canvas_pixels`.
    pub(crate) drag_normalization: f32,
    /// Radians per normalized unit of drag.
    pub(crate) rotate_speed: f32,
    /// World units per normalized unit of drag.
    pub(crate) pan_speed: f32,
    /// Degrees of field of view per wheel pixel.
    pub(crate) zoom_speed: f32,
    /// Pixels reported for one line of wheel scrolling.
    pub(crate) wheel_line_pixels: f32,
}

impl Default for ControlOptions {
    fn default() -> Self {
        Self {
            pan_key: ModifierKey::Alt,
            drag_normalization: 4.0,
            rotate_speed: 5.0,
            pan_speed: 500.0,
            zoom_speed: 0.1,
            wheel_line_pixels: 100.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub(crate) struct ViewportOptions {
    /// Ratio of canvas pixels to logical pixels.
    pub(crate) device_pixel_ratio: f32,
}

impl Default for ViewportOptions {
    fn default() -> Self {
        Self {
            device_pixel_ratio: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_round_trips_through_toml() {
        let opts = SketchOptions::default();
        let toml_str = toml::to_string_pretty(&opts).unwrap();
        let parsed: SketchOptions = toml::from_str(&toml_str).unwrap();
        assert_eq!(opts, parsed);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let toml_str = r#"
[controls]
pan_key = "shift"
rotate_speed = 2.5
"#;
        let opts: SketchOptions = toml::from_str(toml_str).unwrap();
        assert_eq!(opts.controls.pan_key, ModifierKey::Shift);
        assert_eq!(opts.controls.rotate_speed, 2.5);
        // Everything else should be default
        assert_eq!(opts.controls.pan_speed, 500.0);
        assert_eq!(opts.camera, CameraOptions::default());
        assert_eq!(opts.viewport.device_pixel_ratio, 1.0);
    }

    #[test]
    fn load_reports_missing_file() {
        let path = std::env::temp_dir().join("line-sketch-options-that-does-not-exist.toml");
        match SketchOptions::load(&path) {
            Err(OptionsError::Read { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("expected read error, got {:?}", other),
        }
    }

    #[test]
    fn save_then_load() {
        let path =
            std::env::temp_dir().join(format!("line-sketch-options-{}.toml", std::process::id()));
        let mut opts = SketchOptions::default();
        opts.camera.fov_degrees = 45.0;
        opts.controls.pan_key = ModifierKey::Control;

        opts.save(&path).unwrap();
        let loaded = SketchOptions::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(loaded, opts);
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let path =
            std::env::temp_dir().join(format!("line-sketch-bad-{}.toml", std::process::id()));
        std::fs::write(&path, "[camera]\nfov_degrees = \"wide\"\n").unwrap();
        let result = SketchOptions::load(&path);
        std::fs::remove_file(&path).unwrap();

        assert!(matches!(result, Err(OptionsError::Parse { .. })));
    }

    #[test]
    fn defaults_are_valid() {
        assert!(SketchOptions::default().validate().is_ok());
    }

    #[test]
    fn rejects_zero_or_non_finite_sensitivities() {
        let mut opts = SketchOptions::default();
        opts.viewport.device_pixel_ratio = 0.0;
        match opts.validate() {
            Err(OptionsError::NotPositive { field, value }) => {
                assert_eq!(field, "viewport.device_pixel_ratio");
                assert_eq!(value, 0.0);
            }
            other => panic!("expected device pixel ratio error, got {:?}", other),
        }

        let mut opts = SketchOptions::default();
        opts.controls.drag_normalization = f32::INFINITY;
        assert!(matches!(
            opts.validate(),
            Err(OptionsError::NotPositive { field: "controls.drag_normalization", .. })
        ));

        let mut opts = SketchOptions::default();
        opts.controls.zoom_speed = -0.1;
        assert!(opts.validate().is_err());

        let mut opts = SketchOptions::default();
        opts.camera.rotation_degrees[1] = f32::NAN;
        assert!(matches!(
            opts.validate(),
            Err(OptionsError::NotFinite { field: "camera.rotation_degrees", .. })
        ));

        // Negative offsets are fine.
        let mut opts = SketchOptions::default();
        opts.camera.translation = [-5.0, 3.0, -200.0];
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn load_rejects_zero_device_pixel_ratio() {
        let path =
            std::env::temp_dir().join(format!("line-sketch-dpr-{}.toml", std::process::id()));
        std::fs::write(&path, "[viewport]\ndevice_pixel_ratio = 0.0\n").unwrap();
        let result = SketchOptions::load(&path);
        std::fs::remove_file(&path).unwrap();

        assert!(matches!(result, Err(OptionsError::NotPositive { .. })));
    }
}
