use crate::equation::{EquationBlock, EquationSet};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Setups keyed by block id
pub type SetupMap = BTreeMap<String, AnimationSetup>;

/// Default seconds of animation per equation line
pub const SECONDS_PER_LINE: f64 = 1.5;

/// How an equation is brought on screen
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AnimationType {
    #[default]
    Write,
    FadeIn,
    Create,
    /// Accepted but not implemented yet; plays as `Write`
    Transform,
    /// Any other name, kept so it survives a round-trip; plays as `Write`
    Unrecognized(String),
}

impl AnimationType {
    pub fn as_str(&self) -> &str {
        match self {
            AnimationType::Write => "Write",
            AnimationType::FadeIn => "FadeIn",
            AnimationType::Create => "Create",
            AnimationType::Transform => "Transform",
            AnimationType::Unrecognized(name) => name,
        }
    }

    /// The animation actually played. Types without an implementation
    /// degrade to `Write` with a warning.
    pub fn playable(&self) -> AnimationType {
        match self {
            AnimationType::Write | AnimationType::FadeIn | AnimationType::Create => self.clone(),
            AnimationType::Transform => {
                warn!("Animation type 'Transform' is not implemented yet, using Write");
                AnimationType::Write
            }
            AnimationType::Unrecognized(name) => {
                warn!("Unrecognized animation type '{}', using Write", name);
                AnimationType::Write
            }
        }
    }
}

impl From<String> for AnimationType {
    fn from(name: String) -> Self {
        match name.as_str() {
            "Write" => AnimationType::Write,
            "FadeIn" => AnimationType::FadeIn,
            "Create" => AnimationType::Create,
            "Transform" => AnimationType::Transform,
            _ => AnimationType::Unrecognized(name),
        }
    }
}

impl From<&str> for AnimationType {
    fn from(name: &str) -> Self {
        AnimationType::from(name.to_string())
    }
}

impl From<AnimationType> for String {
    fn from(kind: AnimationType) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for AnimationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Presentation parameters for one equation block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationSetup {
    pub lines: Vec<String>,
    #[serde(default)]
    pub animation_type: AnimationType,
    #[serde(default = "default_color")]
    pub color: String,
    /// Scene coordinates; `None` means the origin
    #[serde(default = "default_position")]
    pub position: Option<Vec<f64>>,
    #[serde(default = "default_scale")]
    pub scale: f64,
    pub duration_seconds: f64,
    #[serde(default = "default_delay_before")]
    pub delay_before_seconds: f64,
    #[serde(default = "default_delay_after")]
    pub delay_after_seconds: f64,
    #[serde(default = "default_keep_visible")]
    pub keep_visible_after: bool,
}

fn default_color() -> String {
    "#FFFFFF".to_string()
}

fn default_position() -> Option<Vec<f64>> {
    Some(vec![0.0, 0.0, 0.0])
}

fn default_scale() -> f64 {
    1.0
}

fn default_delay_before() -> f64 {
    0.5
}

fn default_delay_after() -> f64 {
    1.0
}

fn default_keep_visible() -> bool {
    true
}

impl AnimationSetup {
    /// Defaults for a block: white, centred, 1.5s per line
    pub fn for_block(block: &EquationBlock) -> Self {
        Self {
            lines: block.lines.clone(),
            animation_type: AnimationType::default(),
            color: default_color(),
            position: default_position(),
            scale: default_scale(),
            duration_seconds: SECONDS_PER_LINE * block.lines.len() as f64,
            delay_before_seconds: default_delay_before(),
            delay_after_seconds: default_delay_after(),
            keep_visible_after: default_keep_visible(),
        }
    }

    /// Position as a point. Anything other than three finite numbers falls
    /// back to the origin with a warning.
    pub fn resolved_position(&self) -> [f64; 3] {
        match self.position.as_deref() {
            None => [0.0; 3],
            Some([x, y, z]) if [x, y, z].iter().all(|v| v.is_finite()) => [*x, *y, *z],
            Some(other) => {
                warn!("Invalid position {:?}, using origin", other);
                [0.0; 3]
            }
        }
    }

    /// Names of the fields the scene will replace with a default, each
    /// reported with a warning. Non-finite numbers serialize as `null`, so
    /// they are caught here as well as in the generated scene.
    pub fn fallbacks(&self) -> Vec<&'static str> {
        let mut replaced = Vec::new();
        if self.animation_type.playable() != self.animation_type {
            replaced.push("animation_type");
        }
        if let Some(position) = &self.position {
            if position.len() != 3 || !position.iter().all(|v| v.is_finite()) {
                warn!("Invalid position {:?}, scene will use the origin", position);
                replaced.push("position");
            }
        }
        let numbers = [
            ("scale", self.scale, true),
            ("duration_seconds", self.duration_seconds, true),
            ("delay_before_seconds", self.delay_before_seconds, false),
            ("delay_after_seconds", self.delay_after_seconds, false),
        ];
        for (name, value, positive) in numbers {
            let valid = value.is_finite() && if positive { value > 0.0 } else { value >= 0.0 };
            if !valid {
                warn!("Invalid {} {}, scene will use its default", name, value);
                replaced.push(name);
            }
        }
        replaced
    }
}

/// One default setup per block. No block is filtered out.
pub fn assign_defaults(blocks: &EquationSet) -> SetupMap {
    if blocks.is_empty() {
        warn!("No equation blocks given, no setups created");
        return SetupMap::new();
    }

    let setups: SetupMap = blocks
        .iter()
        .map(|block| (block.id.clone(), AnimationSetup::for_block(block)))
        .collect();
    info!("Created {} default setups", setups.len());
    setups
}
