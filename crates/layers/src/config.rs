use std::fs;
use std::path::{Path, PathBuf};

use foundation::color::Rgb;
use gpu::atlas::AtlasLayout;
use gpu::eval::TiltMode;
use gpu::panes::PaneAnimatorConfig;
use gpu::path_batch::{DashPattern, PathBatchConfig};
use paths::ParabolicParams;
use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

impl ConfigError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TiltSetting {
    #[default]
    TravelDirection,
    SurfaceNormal,
}

impl From<TiltSetting> for TiltMode {
    fn from(t: TiltSetting) -> Self {
        match t {
            TiltSetting::TravelDirection => TiltMode::TravelDirection,
            TiltSetting::SurfaceNormal => TiltMode::SurfaceNormal,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AtlasConfig {
    pub columns: u32,
    pub rows: u32,
    pub slot_count: u32,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            columns: 1,
            rows: 1,
            slot_count: 1,
        }
    }
}

impl AtlasConfig {
    pub fn layout(&self) -> AtlasLayout {
        AtlasLayout::new(self.columns, self.rows, self.slot_count)
    }
}

/// Wandering curves used by `spawn_random_curve`.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomCurveConfig {
    /// Radius of the sphere the endpoints are drawn from, around the globe center.
    pub radius: f64,
    /// Per-axis jitter of the interior points.
    pub spread: f64,
    pub interior_points: usize,
}

impl Default for RandomCurveConfig {
    fn default() -> Self {
        Self {
            radius: 3400.0,
            spread: 400.0,
            interior_points: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlightsConfig {
    pub profile: ParabolicParams,
    /// Capacity of both the path batch and the pane instances.
    pub max_flights: usize,
    pub segments_per_curve: usize,
    /// Hex color or `"gradient"`.
    pub path_color: String,
    pub path_opacity: f32,
    pub dash_size: f32,
    pub gap_size: f32,
    pub pane_color: String,
    pub pane_size: f32,
    pub pane_elevation: f32,
    pub tilt: TiltSetting,
    pub atlas: AtlasConfig,
    pub min_speed: f64,
    pub max_speed: f64,
    pub return_mode: bool,
    pub max_frame_dt: f64,
    pub random_curve: RandomCurveConfig,
}

impl Default for FlightsConfig {
    fn default() -> Self {
        Self {
            profile: ParabolicParams::default(),
            max_flights: 512,
            segments_per_curve: 48,
            path_color: "gradient".to_string(),
            path_opacity: 0.8,
            dash_size: 0.0,
            gap_size: 0.0,
            pane_color: "#ffffff".to_string(),
            pane_size: 24.0,
            pane_elevation: 4.0,
            tilt: TiltSetting::TravelDirection,
            atlas: AtlasConfig::default(),
            min_speed: 0.05,
            max_speed: 0.15,
            return_mode: false,
            max_frame_dt: 0.25,
            random_curve: RandomCurveConfig::default(),
        }
    }
}

impl FlightsConfig {
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: FlightsConfig = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_flights == 0 {
            return Err(ConfigError::invalid("max_flights must be positive"));
        }
        if self.segments_per_curve == 0 {
            return Err(ConfigError::invalid("segments_per_curve must be positive"));
        }
        let p = &self.profile;
        if !(p.radius.is_finite() && p.radius > 0.0) {
            return Err(ConfigError::invalid(format!(
                "profile.radius must be positive, got {}",
                p.radius
            )));
        }
        for (name, v) in [
            ("takeoff_offset", p.takeoff_offset),
            ("min_curve_altitude", p.min_curve_altitude),
            ("min_cruise_altitude", p.min_cruise_altitude),
            ("max_cruise_altitude", p.max_cruise_altitude),
        ] {
            if !v.is_finite() || v < 0.0 {
                return Err(ConfigError::invalid(format!(
                    "profile.{name} must be a non-negative number, got {v}"
                )));
            }
        }
        if p.min_cruise_altitude > p.max_cruise_altitude {
            return Err(ConfigError::invalid(format!(
                "min_cruise_altitude {} exceeds max_cruise_altitude {}",
                p.min_cruise_altitude, p.max_cruise_altitude
            )));
        }
        if !(self.min_speed.is_finite() && self.min_speed > 0.0) {
            return Err(ConfigError::invalid(format!(
                "min_speed must be positive, got {}",
                self.min_speed
            )));
        }
        if !self.max_speed.is_finite() || self.min_speed > self.max_speed {
            return Err(ConfigError::invalid(format!(
                "speed range [{}, {}] is empty",
                self.min_speed, self.max_speed
            )));
        }
        if !self.atlas.layout().is_valid() {
            return Err(ConfigError::invalid("atlas needs columns, rows and slots"));
        }
        Ok(())
    }

    pub fn dash(&self) -> DashPattern {
        DashPattern::new(self.dash_size, self.gap_size)
    }

    /// Floor applied when normalizing control points.
    pub fn min_altitude(&self) -> f64 {
        self.profile.min_curve_altitude
    }

    pub fn path_batch(&self) -> PathBatchConfig {
        PathBatchConfig {
            max_curves: self.max_flights,
            segments_per_curve: self.segments_per_curve,
            dash: self.dash(),
            opacity: self.path_opacity,
        }
    }

    pub fn pane_animator(&self) -> PaneAnimatorConfig {
        PaneAnimatorConfig {
            max_panes: self.max_flights,
            atlas: self.atlas.layout(),
            default_color: self.default_pane_color(),
            default_scale: self.pane_size,
            default_elevation: self.pane_elevation,
            return_mode: self.return_mode,
        }
    }

    pub fn default_pane_color(&self) -> Rgb {
        Rgb::from_hex_or(&self.pane_color, Rgb::WHITE)
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, FlightsConfig, TiltSetting};
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_object_is_the_default() {
        let c = FlightsConfig::from_json_str("{}").unwrap();
        assert_eq!(c, FlightsConfig::default());
    }

    #[test]
    fn partial_documents_fill_in_defaults() {
        let c = FlightsConfig::from_json_str(
            r#"{
                "max_flights": 8,
                "profile": { "radius": 100.0 },
                "tilt": "surface_normal",
                "atlas": { "columns": 4, "rows": 2, "slot_count": 7 }
            }"#,
        )
        .unwrap();
        assert_eq!(c.max_flights, 8);
        assert_eq!(c.profile.radius, 100.0);
        assert_eq!(c.profile.max_cruise_altitude, 220.0);
        assert_eq!(c.tilt, TiltSetting::SurfaceNormal);
        assert_eq!(c.atlas.slot_count, 7);
    }

    #[test]
    fn invalid_values_are_rejected() {
        for doc in [
            r#"{ "max_flights": 0 }"#,
            r#"{ "segments_per_curve": 0 }"#,
            r#"{ "profile": { "radius": -1.0 } }"#,
            r#"{ "profile": { "min_cruise_altitude": 300.0 } }"#,
            r#"{ "min_speed": 2.0, "max_speed": 1.0 }"#,
            r#"{ "min_speed": 0.0 }"#,
            r#"{ "min_speed": -0.1, "max_speed": 0.1 }"#,
            r#"{ "atlas": { "columns": 0 } }"#,
        ] {
            let err = FlightsConfig::from_json_str(doc).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(_)), "{doc}: {err}");
        }
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = FlightsConfig::from_json_str("{ nope").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().starts_with("parse config:"));
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = FlightsConfig::from_path(std::path::Path::new("/no/such/flights.json"))
            .unwrap_err();
        assert!(err.to_string().contains("/no/such/flights.json"));
    }

    #[test]
    fn bad_pane_color_falls_back_to_white() {
        let c = FlightsConfig {
            pane_color: "not a color".into(),
            ..FlightsConfig::default()
        };
        assert_eq!(c.default_pane_color(), foundation::color::Rgb::WHITE);
    }
}
