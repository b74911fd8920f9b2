//! # Environment
//!
//! The inherited, keyed configuration bag propagated down the DAG during
//! building. Copy-on-write: `setting` clones the (small) table and shares
//! the result, so environments are cheap to fork and safe to hold across
//! tasks.
//!
//! Keys form a closed enum; values are a closed sum of encodable types,
//! which keeps environments fingerprintable without reflection.

use crate::elements::Material;
use crate::fingerprint::{Fingerprint, FingerprintHasher};
use crate::options::ModelOptions;
use cadova_math::{Angle, Direction3, Segmentation, Transform3};
use config::constants::DEFAULT_TOLERANCE;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Whether the surrounding operation adds or removes material.
///
/// Subtrahends of a difference build under [`Operation::Subtraction`];
/// user code reads this to flip overhang-compensation direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    /// Geometry is added to the model.
    Addition,
    /// Geometry is removed from the model.
    Subtraction,
}

/// Fill rule for self-overlapping 2D outlines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FillRule {
    /// Even-odd crossings.
    EvenOdd,
    /// Non-zero winding.
    NonZero,
}

/// Corner treatment for generated roundings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CornerRoundingStyle {
    /// Circular corner arcs.
    Circular,
    /// Squircular (superellipse) corner arcs.
    Squircular,
}

/// Text shaping attributes carried for text-producing shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextAttributes {
    /// Font family name.
    pub font_family: Option<String>,
    /// Font size in model units.
    pub font_size: Option<f64>,
}

/// The environment keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EnvironmentKey {
    /// Curve discretization policy.
    Segmentation,
    /// Geometric tolerance.
    Tolerance,
    /// Accumulated model transform.
    Transform,
    /// Current material.
    Material,
    /// Addition or subtraction context.
    Operation,
    /// 2D fill rule.
    FillRule,
    /// Maximum unsupported overhang angle.
    OverhangAngle,
    /// The model's natural up direction.
    NaturalUpDirection,
    /// Maximum roll rate for sweeps, radians per unit length.
    MaxTwistRate,
    /// Twist angle above which extrusions subdivide.
    TwistSubdivisionThreshold,
    /// Epsilon for automatic simplification.
    SimplificationThreshold,
    /// Corner rounding style.
    CornerRoundingStyle,
    /// Text shaping attributes.
    TextAttributes,
    /// Output options.
    ModelOptions,
    /// A user-defined key.
    Custom(String),
}

/// The closed sum of environment values.
#[derive(Debug, Clone, PartialEq)]
pub enum EnvironmentValue {
    /// A segmentation policy.
    Segmentation(Segmentation),
    /// A plain number.
    Double(f64),
    /// An angle.
    Angle(Angle),
    /// A transform.
    Transform(Transform3),
    /// A material.
    Material(Material),
    /// An operation marker.
    Operation(Operation),
    /// A fill rule.
    FillRule(FillRule),
    /// A direction.
    Direction(Direction3),
    /// A corner rounding style.
    CornerRounding(CornerRoundingStyle),
    /// Text attributes.
    Text(TextAttributes),
    /// Model options.
    ModelOptions(Arc<ModelOptions>),
    /// A user string.
    String(String),
    /// A user flag.
    Flag(bool),
}

impl EnvironmentValue {
    fn feed(&self, hasher: &mut FingerprintHasher) {
        match self {
            Self::Segmentation(value) => {
                hasher.write_tag("seg");
                hasher.write_segmentation(value);
            }
            Self::Double(value) => {
                hasher.write_tag("f64");
                hasher.write_f64(*value);
            }
            Self::Angle(value) => {
                hasher.write_tag("ang");
                hasher.write_angle(*value);
            }
            Self::Transform(value) => {
                hasher.write_tag("xf");
                hasher.write_transform3(value);
            }
            Self::Material(value) => {
                hasher.write_tag("mat");
                value.feed(hasher);
            }
            Self::Operation(value) => {
                hasher.write_tag(match value {
                    Operation::Addition => "op+",
                    Operation::Subtraction => "op-",
                });
            }
            Self::FillRule(value) => {
                hasher.write_tag(match value {
                    FillRule::EvenOdd => "evenodd",
                    FillRule::NonZero => "nonzero",
                });
            }
            Self::Direction(value) => {
                hasher.write_tag("dir");
                hasher.write_vec3(value.vector());
            }
            Self::CornerRounding(value) => {
                hasher.write_tag(match value {
                    CornerRoundingStyle::Circular => "circ",
                    CornerRoundingStyle::Squircular => "squirc",
                });
            }
            Self::Text(value) => {
                hasher.write_tag("text");
                hasher.write_str(value.font_family.as_deref().unwrap_or(""));
                hasher.write_f64(value.font_size.unwrap_or(0.0));
            }
            Self::ModelOptions(value) => {
                hasher.write_tag("opts");
                hasher.write_str(value.model_name.as_deref().unwrap_or(""));
                hasher.write_str(value.metadata.title.as_deref().unwrap_or(""));
            }
            Self::String(value) => {
                hasher.write_tag("str");
                hasher.write_str(value);
            }
            Self::Flag(value) => {
                hasher.write_tag("flag");
                hasher.write_bool(*value);
            }
        }
    }
}

/// The inherited configuration bag.
///
/// # Example
///
/// ```rust
/// use cadova_core::environment::Environment;
/// use cadova_math::Segmentation;
///
/// let env = Environment::new();
/// let finer = env.with_segmentation(Segmentation::fixed(64));
/// assert_eq!(finer.segmentation().segment_count(10.0), 64);
/// // The original is untouched.
/// assert_ne!(env.segmentation(), finer.segmentation());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Environment {
    values: Arc<BTreeMap<EnvironmentKey, EnvironmentValue>>,
}

impl Environment {
    /// An empty environment; getters fall back to defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a raw value.
    pub fn get(&self, key: &EnvironmentKey) -> Option<&EnvironmentValue> {
        self.values.get(key)
    }

    /// A copy with `key` set to `value`. Setting the same key twice keeps
    /// the later value.
    pub fn setting(&self, key: EnvironmentKey, value: EnvironmentValue) -> Self {
        let mut values = (*self.values).clone();
        values.insert(key, value);
        Self {
            values: Arc::new(values),
        }
    }

    /// A copy without `key`.
    pub fn removing(&self, key: &EnvironmentKey) -> Self {
        let mut values = (*self.values).clone();
        values.remove(key);
        Self {
            values: Arc::new(values),
        }
    }

    // =========================================================================
    // TYPED ACCESSORS
    // =========================================================================

    /// The segmentation policy, adaptive by default.
    pub fn segmentation(&self) -> Segmentation {
        match self.get(&EnvironmentKey::Segmentation) {
            Some(EnvironmentValue::Segmentation(value)) => *value,
            _ => Segmentation::default(),
        }
    }

    /// A copy with the segmentation policy set.
    pub fn with_segmentation(&self, segmentation: Segmentation) -> Self {
        self.setting(
            EnvironmentKey::Segmentation,
            EnvironmentValue::Segmentation(segmentation),
        )
    }

    /// The model tolerance.
    pub fn tolerance(&self) -> f64 {
        match self.get(&EnvironmentKey::Tolerance) {
            Some(EnvironmentValue::Double(value)) => *value,
            _ => DEFAULT_TOLERANCE,
        }
    }

    /// A copy with the tolerance set.
    pub fn with_tolerance(&self, tolerance: f64) -> Self {
        self.setting(EnvironmentKey::Tolerance, EnvironmentValue::Double(tolerance))
    }

    /// The accumulated transform, identity by default.
    pub fn transform(&self) -> Transform3 {
        match self.get(&EnvironmentKey::Transform) {
            Some(EnvironmentValue::Transform(value)) => *value,
            _ => Transform3::IDENTITY,
        }
    }

    /// A copy with `transform` concatenated onto the accumulated
    /// transform.
    pub fn applying_transform(&self, transform: &Transform3) -> Self {
        let combined = self.transform().concatenated(transform);
        self.setting(
            EnvironmentKey::Transform,
            EnvironmentValue::Transform(combined),
        )
    }

    /// The current material, when set.
    pub fn material(&self) -> Option<&Material> {
        match self.get(&EnvironmentKey::Material) {
            Some(EnvironmentValue::Material(value)) => Some(value),
            _ => None,
        }
    }

    /// A copy with the material set.
    pub fn with_material(&self, material: Material) -> Self {
        self.setting(EnvironmentKey::Material, EnvironmentValue::Material(material))
    }

    /// The operation context, addition by default.
    pub fn operation(&self) -> Operation {
        match self.get(&EnvironmentKey::Operation) {
            Some(EnvironmentValue::Operation(value)) => *value,
            _ => Operation::Addition,
        }
    }

    /// A copy marked as building a subtrahend.
    pub fn subtracting(&self) -> Self {
        self.setting(
            EnvironmentKey::Operation,
            EnvironmentValue::Operation(Operation::Subtraction),
        )
    }

    /// The maximum sweep roll rate, radians per unit length.
    pub fn max_twist_rate(&self) -> Option<f64> {
        match self.get(&EnvironmentKey::MaxTwistRate) {
            Some(EnvironmentValue::Double(value)) => Some(*value),
            _ => None,
        }
    }

    /// The maximum unsupported overhang angle, when set.
    pub fn overhang_angle(&self) -> Option<Angle> {
        match self.get(&EnvironmentKey::OverhangAngle) {
            Some(EnvironmentValue::Angle(value)) => Some(*value),
            _ => None,
        }
    }

    /// The model's natural up direction, +Z by default.
    pub fn natural_up_direction(&self) -> Direction3 {
        match self.get(&EnvironmentKey::NaturalUpDirection) {
            Some(EnvironmentValue::Direction(value)) => *value,
            _ => Direction3::UP,
        }
    }

    /// The fill rule for self-overlapping outlines, even-odd by default.
    pub fn fill_rule(&self) -> FillRule {
        match self.get(&EnvironmentKey::FillRule) {
            Some(EnvironmentValue::FillRule(value)) => *value,
            _ => FillRule::EvenOdd,
        }
    }

    /// The epsilon used for automatic simplification, when set.
    pub fn simplification_threshold(&self) -> Option<f64> {
        match self.get(&EnvironmentKey::SimplificationThreshold) {
            Some(EnvironmentValue::Double(value)) => Some(*value),
            _ => None,
        }
    }

    /// The twist angle above which extrusions subdivide, when set.
    pub fn twist_subdivision_threshold(&self) -> Option<Angle> {
        match self.get(&EnvironmentKey::TwistSubdivisionThreshold) {
            Some(EnvironmentValue::Angle(value)) => Some(*value),
            _ => None,
        }
    }

    /// The model options, when set.
    pub fn model_options(&self) -> Option<Arc<ModelOptions>> {
        match self.get(&EnvironmentKey::ModelOptions) {
            Some(EnvironmentValue::ModelOptions(value)) => Some(value.clone()),
            _ => None,
        }
    }

    /// A copy with model options attached.
    pub fn with_model_options(&self, options: ModelOptions) -> Self {
        self.setting(
            EnvironmentKey::ModelOptions,
            EnvironmentValue::ModelOptions(Arc::new(options)),
        )
    }

    // =========================================================================
    // DERIVED VALUES
    // =========================================================================

    /// The scalar scale of the accumulated transform.
    pub fn scale(&self) -> f64 {
        self.transform().scale()
    }

    /// The segmentation policy compensated for the accumulated scale.
    pub fn scaled_segmentation(&self) -> Segmentation {
        self.segmentation().scaled(self.scale())
    }

    /// The tolerance compensated for the accumulated scale.
    pub fn scaled_tolerance(&self) -> f64 {
        let scale = self.scale();
        if scale.abs() > f64::EPSILON {
            self.tolerance() / scale
        } else {
            self.tolerance()
        }
    }

    /// A content fingerprint over the whole table, used to key cached
    /// builds by environment.
    pub fn fingerprint(&self) -> Fingerprint {
        let mut hasher = FingerprintHasher::new();
        hasher.write_tag("environment");
        hasher.write_u64(self.values.len() as u64);
        for (key, value) in self.values.iter() {
            match key {
                EnvironmentKey::Custom(name) => {
                    hasher.write_tag("custom");
                    hasher.write_str(name);
                }
                other => hasher.write_str(&format!("{other:?}")),
            }
            value.feed(&mut hasher);
        }
        hasher.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec3;

    #[test]
    fn test_setting_is_copy_on_write() {
        let base = Environment::new();
        let derived = base.with_tolerance(0.5);
        assert_eq!(base.tolerance(), DEFAULT_TOLERANCE);
        assert_eq!(derived.tolerance(), 0.5);
    }

    #[test]
    fn test_later_value_wins() {
        let env = Environment::new().with_tolerance(0.5).with_tolerance(0.25);
        assert_eq!(env.tolerance(), 0.25);
    }

    #[test]
    fn test_scaled_derivations() {
        let env = Environment::new()
            .with_tolerance(0.1)
            .applying_transform(&Transform3::scaling(DVec3::splat(2.0)));
        assert!((env.scale() - 2.0).abs() < 1e-9);
        assert!((env.scaled_tolerance() - 0.05).abs() < 1e-9);
        match env.scaled_segmentation() {
            Segmentation::Adaptive { min_size, .. } => {
                let base = match Segmentation::default() {
                    Segmentation::Adaptive { min_size, .. } => min_size,
                    _ => unreachable!(),
                };
                assert!((min_size - base / 2.0).abs() < 1e-9);
            }
            _ => panic!("expected adaptive"),
        }
    }

    #[test]
    fn test_fingerprint_tracks_content() {
        let a = Environment::new().with_tolerance(0.5);
        let b = Environment::new().with_tolerance(0.5);
        let c = Environment::new().with_tolerance(0.6);
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
    }

    #[test]
    fn test_custom_keys() {
        let env = Environment::new().setting(
            EnvironmentKey::Custom("wall-thickness".into()),
            EnvironmentValue::Double(1.2),
        );
        match env.get(&EnvironmentKey::Custom("wall-thickness".into())) {
            Some(EnvironmentValue::Double(value)) => assert_eq!(*value, 1.2),
            _ => panic!("expected custom value"),
        }
    }
}
