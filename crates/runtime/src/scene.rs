//! # Scene Files
//!
//! A scene is a JSON document with optional settings overrides, bodies and
//! constraints. It is turned into the command sequence that builds the
//! world inside the worker.

use std::path::Path;

use anyhow::{Context, Result};
use physics::{BodyKind, BodySpec, Command, ConstraintSpec, SettingsPatch, Vec3};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scene {
    pub settings: Option<SettingsPatch>,
    pub bodies: Vec<BodySpec>,
    pub constraints: Vec<ConstraintSpec>,
}

impl Scene {
    /// Read and parse a scene file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid scene.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read scene {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("failed to parse scene {}", path.display()))
    }

    /// A 10x1x10 static ground slab with a ball dropped from 5 m.
    #[must_use]
    pub fn ground_and_ball() -> Self {
        Self {
            settings: None,
            bodies: vec![
                BodySpec::cuboid(0, Vec3::new(10.0, 1.0, 10.0)).with_kind(BodyKind::Static),
                BodySpec::sphere(1, 0.5).with_position(Vec3::new(0.0, 5.0, 0.0)),
            ],
            constraints: Vec::new(),
        }
    }

    /// Commands that build this scene, in order: settings, bodies, then
    /// constraints.
    #[must_use]
    pub fn commands(&self) -> Vec<Command> {
        let settings = self
            .settings
            .iter()
            .map(|patch| Command::SetSettings { patch: patch.clone() });
        let bodies = self
            .bodies
            .iter()
            .map(|spec| Command::AddBody { spec: spec.clone() });
        let constraints = self
            .constraints
            .iter()
            .map(|spec| Command::AddConstraint { spec: spec.clone() });
        settings.chain(bodies).chain(constraints).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use physics::BodyId;

    #[test]
    fn default_scene_builds_two_bodies() {
        let commands = Scene::ground_and_ball().commands();
        assert_eq!(commands.len(), 2);
        assert!(matches!(&commands[0], Command::AddBody { spec } if spec.kind == BodyKind::Static));
    }

    #[test]
    fn scene_json_orders_settings_first() {
        let json = r#"{
            "settings": {"gravity": {"x": 0.0, "y": -1.62, "z": 0.0}},
            "bodies": [
                {"id": 1, "shape": "sphere", "size": {"x": 0.5, "y": 0.5, "z": 0.5}},
                {"id": 2, "shape": "sphere", "size": {"x": 0.5, "y": 0.5, "z": 0.5},
                 "position": {"x": 2.0, "y": 0.0, "z": 0.0}}
            ],
            "constraints": [{"id": 1, "bodyA": 1, "bodyB": 2}]
        }"#;
        let scene: Scene = serde_json::from_str(json).unwrap();
        let commands = scene.commands();
        assert_eq!(commands.len(), 4);
        assert!(matches!(commands[0], Command::SetSettings { .. }));
        assert!(
            matches!(&commands[3], Command::AddConstraint { spec } if spec.body_b == BodyId(2))
        );
    }

    #[test]
    fn missing_file_reports_path() {
        let err = Scene::load(Path::new("does/not/exist.json")).unwrap_err();
        assert!(err.to_string().contains("does/not/exist.json"));
    }
}
