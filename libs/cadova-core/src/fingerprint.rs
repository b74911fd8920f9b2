//! # Fingerprints
//!
//! Deterministic, collision-resistant content hashes for scene nodes and
//! cache keys. Blake3 over an explicit canonical codec: every contributing
//! type feeds its value through [`FingerprintHasher`] by hand, so hashes
//! never depend on runtime reflection and stay stable across platforms
//! and invocations.

use cadova_math::{Angle, Segmentation, Transform2, Transform3};
use glam::{DVec2, DVec3};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A 256-bit content fingerprint.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// The raw digest bytes.
    pub fn bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Hex form, used in logs and as stable file-level identifiers.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Incremental canonical hasher.
///
/// Each write is prefixed with nothing and relies on fixed-width
/// encodings; variable-length data (strings, lists) write their length
/// first so adjacent fields cannot alias.
pub struct FingerprintHasher {
    inner: blake3::Hasher,
}

impl FingerprintHasher {
    /// A fresh hasher.
    pub fn new() -> Self {
        Self {
            inner: blake3::Hasher::new(),
        }
    }

    /// Writes a variant or field tag.
    pub fn write_tag(&mut self, tag: &str) {
        self.write_str(tag);
    }

    /// Writes a string with its length.
    pub fn write_str(&mut self, value: &str) {
        self.write_u64(value.len() as u64);
        self.inner.update(value.as_bytes());
    }

    /// Writes raw bytes with their length.
    pub fn write_bytes(&mut self, value: &[u8]) {
        self.write_u64(value.len() as u64);
        self.inner.update(value);
    }

    /// Writes a bool as one byte.
    pub fn write_bool(&mut self, value: bool) {
        self.inner.update(&[value as u8]);
    }

    /// Writes a u32 little-endian.
    pub fn write_u32(&mut self, value: u32) {
        self.inner.update(&value.to_le_bytes());
    }

    /// Writes a u64 little-endian.
    pub fn write_u64(&mut self, value: u64) {
        self.inner.update(&value.to_le_bytes());
    }

    /// Writes an i64 little-endian.
    pub fn write_i64(&mut self, value: i64) {
        self.inner.update(&value.to_le_bytes());
    }

    /// Writes an f64 by its IEEE-754 bit pattern, canonicalizing the two
    /// zero encodings.
    pub fn write_f64(&mut self, value: f64) {
        let canonical = if value == 0.0 { 0.0 } else { value };
        self.inner.update(&canonical.to_bits().to_le_bytes());
    }

    /// Writes a 2D vector.
    pub fn write_vec2(&mut self, value: DVec2) {
        self.write_f64(value.x);
        self.write_f64(value.y);
    }

    /// Writes a 3D vector.
    pub fn write_vec3(&mut self, value: DVec3) {
        self.write_f64(value.x);
        self.write_f64(value.y);
        self.write_f64(value.z);
    }

    /// Writes an angle by its radian value.
    pub fn write_angle(&mut self, value: Angle) {
        self.write_f64(value.radians());
    }

    /// Writes a 3D transform by its matrix columns.
    pub fn write_transform3(&mut self, value: &Transform3) {
        for component in value.matrix().to_cols_array() {
            self.write_f64(component);
        }
    }

    /// Writes a 2D transform by its matrix columns.
    pub fn write_transform2(&mut self, value: &Transform2) {
        for component in value.matrix().to_cols_array() {
            self.write_f64(component);
        }
    }

    /// Writes a segmentation policy.
    pub fn write_segmentation(&mut self, value: &Segmentation) {
        match value {
            Segmentation::Fixed { count } => {
                self.write_tag("fixed");
                self.write_u32(*count);
            }
            Segmentation::Adaptive {
                min_angle,
                min_size,
            } => {
                self.write_tag("adaptive");
                self.write_angle(*min_angle);
                self.write_f64(*min_size);
            }
        }
    }

    /// Writes a child fingerprint.
    pub fn write_fingerprint(&mut self, value: Fingerprint) {
        self.inner.update(value.bytes());
    }

    /// Finishes the digest.
    pub fn finish(self) -> Fingerprint {
        Fingerprint(*self.inner.finalize().as_bytes())
    }
}

impl Default for FingerprintHasher {
    fn default() -> Self {
        Self::new()
    }
}

/// A value contributing to cached-operation fingerprints.
///
/// The closed set of encodable parameter types replaces the source
/// convention of reflecting over arbitrary values: anything else is a
/// compile error at the call site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CacheParameter {
    /// An integer parameter.
    Int(i64),
    /// A floating-point parameter.
    Double(f64),
    /// A text parameter.
    Text(String),
    /// A boolean parameter.
    Flag(bool),
    /// A 2D point or vector.
    Vector2(DVec2),
    /// A 3D point or vector.
    Vector3(DVec3),
    /// An angle.
    Angle(Angle),
    /// A nested list.
    List(Vec<CacheParameter>),
}

impl CacheParameter {
    /// Feeds the parameter into a hasher.
    pub fn feed(&self, hasher: &mut FingerprintHasher) {
        match self {
            Self::Int(value) => {
                hasher.write_tag("i");
                hasher.write_i64(*value);
            }
            Self::Double(value) => {
                hasher.write_tag("d");
                hasher.write_f64(*value);
            }
            Self::Text(value) => {
                hasher.write_tag("t");
                hasher.write_str(value);
            }
            Self::Flag(value) => {
                hasher.write_tag("b");
                hasher.write_bool(*value);
            }
            Self::Vector2(value) => {
                hasher.write_tag("v2");
                hasher.write_vec2(*value);
            }
            Self::Vector3(value) => {
                hasher.write_tag("v3");
                hasher.write_vec3(*value);
            }
            Self::Angle(value) => {
                hasher.write_tag("a");
                hasher.write_angle(*value);
            }
            Self::List(values) => {
                hasher.write_tag("l");
                hasher.write_u64(values.len() as u64);
                for value in values {
                    value.feed(hasher);
                }
            }
        }
    }
}

/// Hashes a name and parameter list into a standalone fingerprint.
pub fn fingerprint_of_key(name: &str, parameters: &[CacheParameter]) -> Fingerprint {
    let mut hasher = FingerprintHasher::new();
    hasher.write_tag("cache-key");
    hasher.write_str(name);
    hasher.write_u64(parameters.len() as u64);
    for parameter in parameters {
        parameter.feed(&mut hasher);
    }
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic() {
        let a = fingerprint_of_key("op", &[CacheParameter::Double(1.5)]);
        let b = fingerprint_of_key("op", &[CacheParameter::Double(1.5)]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_name_and_parameters_distinguish() {
        let a = fingerprint_of_key("op", &[CacheParameter::Double(1.5)]);
        let b = fingerprint_of_key("op", &[CacheParameter::Double(2.5)]);
        let c = fingerprint_of_key("other", &[CacheParameter::Double(1.5)]);
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_zero_encodings_canonicalized() {
        let a = fingerprint_of_key("op", &[CacheParameter::Double(0.0)]);
        let b = fingerprint_of_key("op", &[CacheParameter::Double(-0.0)]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_adjacent_strings_do_not_alias() {
        let a = fingerprint_of_key("ab", &[CacheParameter::Text("c".into())]);
        let b = fingerprint_of_key("a", &[CacheParameter::Text("bc".into())]);
        assert_ne!(a, b);
    }
}
