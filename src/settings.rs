//! Table, rule and rack configuration
//!
//! Stored as JSON. Everything is validated before a scene is built from it.

use std::path::Path;

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, SimError};
use crate::sim::{Ball, Coefficients, Scene, Table};

/// Cloth speed presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ClothPreset {
    Slow,
    #[default]
    Standard,
    Fast,
}

impl ClothPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClothPreset::Slow => "Slow",
            ClothPreset::Standard => "Standard",
            ClothPreset::Fast => "Fast",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "slow" => Some(ClothPreset::Slow),
            "standard" | "std" => Some(ClothPreset::Standard),
            "fast" => Some(ClothPreset::Fast),
            _ => None,
        }
    }

    /// Sliding friction coefficient for this cloth
    pub fn mu_slide(&self) -> f64 {
        match self {
            ClothPreset::Slow => 18.6,
            ClothPreset::Standard => 15.5,
            ClothPreset::Fast => 12.4,
        }
    }

    /// Rolling resistance for this cloth
    pub fn mu_roll(&self) -> f64 {
        match self {
            ClothPreset::Slow => 3.2,
            ClothPreset::Standard => 2.6,
            ClothPreset::Fast => 2.0,
        }
    }
}

/// Rectangular table with corner pockets
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TableSettings {
    pub width: f64,
    pub length: f64,
    pub pocket_radius: f64,
}

impl Default for TableSettings {
    fn default() -> Self {
        Self {
            width: 2.0,
            length: 4.0,
            pocket_radius: 0.15,
        }
    }
}

/// Rotation rules limits
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RuleSettings {
    /// Shots in one frame before the shooter's opponent is awarded it
    pub max_shots: usize,
    /// Consecutive fouls that forfeit the frame
    pub foul_limit: u32,
    /// Ball that wins the frame when potted; defaults to the last of the target order
    pub final_ball: Option<u32>,
}

impl Default for RuleSettings {
    fn default() -> Self {
        Self {
            max_shots: 200,
            foul_limit: 3,
            final_ball: None,
        }
    }
}

/// Ball set and re-rack layout
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RackSettings {
    /// Including the cue ball
    pub ball_count: usize,
    pub radius: f64,
    pub mass: f64,
    /// Re-racked balls get `x ~ U(x_min, x_max)`
    pub x_min: f64,
    pub x_max: f64,
    /// ... and `y = y_start + spacing * id`
    pub y_start: f64,
    pub spacing: f64,
    /// Where a pocketed cue ball comes back into play
    pub cue_spot: DVec3,
}

impl Default for RackSettings {
    fn default() -> Self {
        Self {
            ball_count: 10,
            radius: 0.05,
            mass: 0.16,
            x_min: 0.3,
            x_max: 1.7,
            y_start: 0.3,
            spacing: 0.2,
            cue_spot: DVec3::new(0.3, 0.3, 0.0),
        }
    }
}

impl RackSettings {
    /// The fixed opening layout: object balls in a column at `x = 1`, cue ball beside them
    pub fn opening_balls(&self) -> Vec<Ball> {
        (0..self.ball_count)
            .map(|i| {
                let x = if i == 0 { 0.5 } else { 1.0 };
                let position = DVec3::new(x, 1.0 + 0.2 * i as f64, 0.0);
                Ball::new(i as u32, position, self.radius, self.mass)
            })
            .collect()
    }
}

/// Complete configuration for a table session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Cloth the friction coefficients were last set from
    pub cloth: ClothPreset,
    pub coefficients: Coefficients,
    pub table: TableSettings,
    pub rules: RuleSettings,
    pub rack: RackSettings,
}

impl Settings {
    pub fn from_preset(preset: ClothPreset) -> Self {
        let mut settings = Self::default();
        settings.apply_preset(preset);
        settings
    }

    /// Set the friction coefficients from a cloth preset
    pub fn apply_preset(&mut self, preset: ClothPreset) {
        self.cloth = preset;
        self.coefficients.mu_slide = preset.mu_slide();
        self.coefficients.mu_roll = preset.mu_roll();
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.coefficients.validate()?;
        self.build_table()?;

        if self.rules.max_shots == 0 {
            return Err(ConfigError::RuleLimit { name: "max_shots" });
        }
        if self.rules.foul_limit == 0 {
            return Err(ConfigError::RuleLimit { name: "foul_limit" });
        }
        let needed = match self.rules.final_ball {
            Some(id) => (id as usize + 1).max(2),
            None => 2,
        };
        if self.rack.ball_count < needed {
            return Err(ConfigError::RackSize {
                count: self.rack.ball_count,
                needed,
            });
        }
        if !(self.rack.x_min <= self.rack.x_max) {
            return Err(ConfigError::RackRange {
                min: self.rack.x_min,
                max: self.rack.x_max,
            });
        }
        if !(self.rack.radius > 0.0) {
            return Err(ConfigError::BallRadius {
                id: 0,
                value: self.rack.radius,
            });
        }
        if !(self.rack.mass > 0.0) {
            return Err(ConfigError::BallMass {
                id: 0,
                value: self.rack.mass,
            });
        }
        if !(self.rack.spacing.abs() >= 2.0 * self.rack.radius) {
            return Err(ConfigError::RackSpacing {
                spacing: self.rack.spacing,
                diameter: 2.0 * self.rack.radius,
            });
        }
        self.check_rack_fits(&self.build_table()?)
    }

    /// Every spot a ball can be placed on must leave the whole ball on the table
    fn check_rack_fits(&self, table: &Table) -> Result<(), ConfigError> {
        let rack = &self.rack;
        let fits = |p: DVec3| {
            p.is_finite()
                && table
                    .cushions()
                    .iter()
                    .all(|c| c.signed_distance(p) <= -rack.radius)
        };
        let check = |what: &'static str, p: DVec3| {
            if fits(p) {
                Ok(())
            } else {
                Err(ConfigError::RackOffTable { what, x: p.x, y: p.y })
            }
        };

        for ball in rack.opening_balls() {
            check("opening ball", ball.position)?;
        }
        check("cue spot", rack.cue_spot)?;
        let y_end = rack.y_start + rack.spacing * (rack.ball_count - 1) as f64;
        for y in [rack.y_start, y_end] {
            for x in [rack.x_min, rack.x_max] {
                check("re-rack corner", DVec3::new(x, y, 0.0))?;
            }
        }
        Ok(())
    }

    pub fn build_table(&self) -> Result<Table, ConfigError> {
        Table::rectangle(self.table.width, self.table.length, self.table.pocket_radius)
    }

    /// Validated scene in the opening layout
    pub fn build_scene(&self) -> Result<Scene, ConfigError> {
        self.validate()?;
        Scene::new(self.build_table()?, self.rack.opening_balls(), self.coefficients)
    }

    /// Ids that must be played in order, lowest first
    pub fn target_order(&self) -> Vec<u32> {
        (1..self.rack.ball_count as u32).collect()
    }

    pub fn from_json(json: &str) -> Result<Self, SimError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, SimError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let path = path.as_ref();
        let settings = Self::from_json(&std::fs::read_to_string(path)?)?;
        log::info!("Loaded settings from {} ({} cloth)", path.display(), settings.cloth.as_str());
        Ok(settings)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SimError> {
        let path = path.as_ref();
        std::fs::write(path, self.to_json()?)?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_build_reference_scene() {
        let settings = Settings::default();
        let scene = settings.build_scene().unwrap();
        assert_eq!(scene.balls.len(), 10);
        assert_eq!(scene.table.cushions().len(), 4);
        assert_eq!(scene.table.pockets().len(), 4);
        assert_eq!(scene.coefficients, Coefficients::default());
        assert_eq!(scene.balls[0].position, DVec3::new(0.5, 1.0, 0.0));
        assert!((scene.balls[9].position - DVec3::new(1.0, 2.8, 0.0)).length() < 1e-12);
        assert_eq!(settings.target_order(), (1..10).collect::<Vec<u32>>());
    }

    #[test]
    fn test_preset_round_trip() {
        for preset in [ClothPreset::Slow, ClothPreset::Standard, ClothPreset::Fast] {
            assert_eq!(ClothPreset::from_str(preset.as_str()), Some(preset));
        }
        assert_eq!(ClothPreset::from_str("STD"), Some(ClothPreset::Standard));
        assert_eq!(ClothPreset::from_str("felt"), None);

        let fast = Settings::from_preset(ClothPreset::Fast);
        assert!(fast.coefficients.mu_slide < Settings::default().coefficients.mu_slide);
        assert_eq!(Settings::from_preset(ClothPreset::Standard), Settings::default());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut settings = Settings::default();
        settings.coefficients.g = -9.8;
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::NonPositiveCoefficient { name: "g", .. })
        ));

        let mut settings = Settings::default();
        settings.rules.foul_limit = 0;
        assert_eq!(settings.validate(), Err(ConfigError::RuleLimit { name: "foul_limit" }));

        let mut settings = Settings::default();
        settings.rules.final_ball = Some(12);
        assert_eq!(settings.validate(), Err(ConfigError::RackSize { count: 10, needed: 13 }));

        let mut settings = Settings::default();
        settings.table.pocket_radius = 0.0;
        assert!(matches!(settings.validate(), Err(ConfigError::PocketRadius { .. })));
    }

    #[test]
    fn test_rack_must_fit_the_table() {
        let mut settings = Settings::default();
        settings.table.width = f64::INFINITY;
        assert!(matches!(settings.validate(), Err(ConfigError::TableSize { .. })));

        let mut settings = Settings::default();
        settings.rack.x_max = 2.5;
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::RackOffTable { what: "re-rack corner", .. })
        ));

        let mut settings = Settings::default();
        settings.rack.x_min = f64::NEG_INFINITY;
        assert!(matches!(settings.validate(), Err(ConfigError::RackOffTable { .. })));

        let mut settings = Settings::default();
        settings.rack.ball_count = 20;
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::RackOffTable { what: "opening ball", .. })
        ));

        let mut settings = Settings::default();
        settings.rack.cue_spot = DVec3::new(0.02, 0.3, 0.0);
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::RackOffTable { what: "cue spot", .. })
        ));

        let mut settings = Settings::default();
        settings.rack.spacing = 0.05;
        assert_eq!(
            settings.validate(),
            Err(ConfigError::RackSpacing { spacing: 0.05, diameter: 0.1 })
        );

        let mut settings = Settings::default();
        settings.rack.ball_count = 4;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_json_round_trip_and_file_io() {
        let mut settings = Settings::from_preset(ClothPreset::Slow);
        settings.rules.final_ball = Some(8);

        let json = settings.to_json().unwrap();
        assert_eq!(Settings::from_json(&json).unwrap(), settings);

        let path = std::env::temp_dir().join(format!("cue-sim-settings-{}.json", std::process::id()));
        settings.save(&path).unwrap();
        assert_eq!(Settings::load(&path).unwrap(), settings);
        std::fs::remove_file(&path).unwrap();

        assert!(matches!(Settings::from_json("{"), Err(SimError::Json(_))));
        assert!(matches!(
            Settings::load(std::env::temp_dir().join("cue-sim-missing.json")),
            Err(SimError::Io(_))
        ));
    }
}
