use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Band – one photometric filter
// ---------------------------------------------------------------------------

/// A photometric band, in increasing wavelength order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Band {
    U,
    G,
    R,
    I,
    Z,
}

impl Band {
    /// All bands in wavelength order. Adjacent pairs define the colour indices.
    pub const ALL: [Band; 5] = [Band::U, Band::G, Band::R, Band::I, Band::Z];

    /// Column name used by the training set and the artifact schema.
    pub fn name(self) -> &'static str {
        match self {
            Band::U => "u",
            Band::G => "g",
            Band::R => "r",
            Band::I => "i",
            Band::Z => "z",
        }
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// MagnitudeObservation – raw caller input
// ---------------------------------------------------------------------------

/// Five raw magnitudes for a single object, as supplied by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MagnitudeObservation {
    pub u: f64,
    pub g: f64,
    pub r: f64,
    pub i: f64,
    pub z: f64,
}

impl MagnitudeObservation {
    pub fn new(u: f64, g: f64, r: f64, i: f64, z: f64) -> Self {
        Self { u, g, r, i, z }
    }

    /// Magnitude for one band.
    pub fn get(&self, band: Band) -> f64 {
        match band {
            Band::U => self.u,
            Band::G => self.g,
            Band::R => self.r,
            Band::I => self.i,
            Band::Z => self.z,
        }
    }
}

/// An observation that has passed the validation gate.
///
/// Only [`MagnitudeBounds::validate`](super::validate::MagnitudeBounds::validate)
/// can build one, so holding a value is proof that every band was in range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidatedObservation(pub(super) MagnitudeObservation);

impl ValidatedObservation {
    pub fn observation(&self) -> &MagnitudeObservation {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// FeatureVector – exactly what the trained model consumes
// ---------------------------------------------------------------------------

/// Column order of the trained model. Changing this breaks every artifact.
pub const FEATURE_NAMES: [&str; 9] = ["u", "g", "r", "i", "z", "u_g", "g_r", "r_i", "i_z"];

/// Number of model inputs.
pub const FEATURE_COUNT: usize = FEATURE_NAMES.len();

/// Raw magnitudes plus the four adjacent-band colour indices.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureVector {
    pub u: f64,
    pub g: f64,
    pub r: f64,
    pub i: f64,
    pub z: f64,
    pub u_g: f64,
    pub g_r: f64,
    pub r_i: f64,
    pub i_z: f64,
}

impl FeatureVector {
    /// Values in [`FEATURE_NAMES`] order.
    pub fn as_array(&self) -> [f64; FEATURE_COUNT] {
        [
            self.u, self.g, self.r, self.i, self.z, self.u_g, self.g_r, self.r_i, self.i_z,
        ]
    }

    /// Look up a feature by its column name.
    pub fn get(&self, name: &str) -> Option<f64> {
        FEATURE_NAMES
            .iter()
            .position(|n| *n == name)
            .map(|idx| self.as_array()[idx])
    }
}

// ---------------------------------------------------------------------------
// ObjectClass – decoded classifier output
// ---------------------------------------------------------------------------

/// Object category. `Unknown` carries any class code outside the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectClass {
    Galaxy,
    Qso,
    Star,
    Unknown(i64),
}

impl ObjectClass {
    /// The known classes with their training-time encoding.
    pub const ENCODING: [(ObjectClass, i64); 3] = [
        (ObjectClass::Galaxy, 0),
        (ObjectClass::Qso, 1),
        (ObjectClass::Star, 2),
    ];

    /// Decode a classifier class code. Total over all integers.
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => ObjectClass::Galaxy,
            1 => ObjectClass::Qso,
            2 => ObjectClass::Star,
            other => ObjectClass::Unknown(other),
        }
    }

    /// Training-time encoding; the inverse of [`ObjectClass::from_code`].
    pub fn code(self) -> i64 {
        match self {
            ObjectClass::Galaxy => 0,
            ObjectClass::Qso => 1,
            ObjectClass::Star => 2,
            ObjectClass::Unknown(code) => code,
        }
    }

    /// Parse the label used in raw survey data (`GALAXY`, `QSO`, `STAR`).
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "GALAXY" => Some(ObjectClass::Galaxy),
            "QSO" => Some(ObjectClass::Qso),
            "STAR" => Some(ObjectClass::Star),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ObjectClass::Galaxy => "GALAXY",
            ObjectClass::Qso => "QSO",
            ObjectClass::Star => "STAR",
            ObjectClass::Unknown(_) => "Unknown",
        }
    }

    pub fn is_known(self) -> bool {
        !matches!(self, ObjectClass::Unknown(_))
    }
}

impl fmt::Display for ObjectClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectClass::Qso => write!(f, "QSO (QUASAR)"),
            ObjectClass::Unknown(code) => write!(f, "Unknown (class code {code})"),
            other => f.write_str(other.label()),
        }
    }
}

impl Serialize for ObjectClass {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// ClassificationResult – one complete answer
// ---------------------------------------------------------------------------

/// Label plus, for probabilistic artifacts, the winning class probability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClassificationResult {
    pub class: ObjectClass,
    /// Present only when the artifact reports class probabilities.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(skip)]
    pub class_code: i64,
}

impl ClassificationResult {
    pub fn from_code(class_code: i64, confidence: Option<f64>) -> Self {
        Self {
            class: ObjectClass::from_code(class_code),
            confidence,
            class_code,
        }
    }
}

impl fmt::Display for ClassificationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Result: {}", self.class)?;
        if let Some(p) = self.confidence {
            write!(f, "\nConfidence: {:.1}%", p * 100.0)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_codes_decode_through_fixed_table() {
        assert_eq!(ObjectClass::from_code(0), ObjectClass::Galaxy);
        assert_eq!(ObjectClass::from_code(1), ObjectClass::Qso);
        assert_eq!(ObjectClass::from_code(2), ObjectClass::Star);
    }

    #[test]
    fn out_of_table_code_is_unknown() {
        let class = ObjectClass::from_code(99);
        assert_eq!(class, ObjectClass::Unknown(99));
        assert_eq!(class.label(), "Unknown");
        assert!(!class.is_known());
        assert_eq!(ObjectClass::from_code(-1), ObjectClass::Unknown(-1));
    }

    #[test]
    fn encoding_is_inverse_of_decoding() {
        for (class, code) in ObjectClass::ENCODING {
            assert_eq!(class.code(), code);
            assert_eq!(ObjectClass::from_code(code), class);
            assert_eq!(ObjectClass::from_label(class.label()), Some(class));
        }
        assert_eq!(ObjectClass::from_label("PLANET"), None);
    }

    #[test]
    fn feature_lookup_by_name_follows_column_order() {
        let fv = FeatureVector {
            u: 1.0,
            g: 2.0,
            r: 3.0,
            i: 4.0,
            z: 5.0,
            u_g: 6.0,
            g_r: 7.0,
            r_i: 8.0,
            i_z: 9.0,
        };
        for (idx, name) in FEATURE_NAMES.iter().enumerate() {
            assert_eq!(fv.get(name), Some((idx + 1) as f64));
        }
        assert_eq!(fv.get("redshift"), None);
    }

    #[test]
    fn result_display_formats_confidence_to_one_decimal() {
        let with = ClassificationResult::from_code(2, Some(0.9734));
        assert_eq!(with.to_string(), "Result: STAR\nConfidence: 97.3%");
        let without = ClassificationResult::from_code(0, None);
        assert_eq!(without.to_string(), "Result: GALAXY");
    }

    #[test]
    fn result_json_omits_missing_confidence() {
        let json = serde_json::to_string(&ClassificationResult::from_code(1, None)).unwrap();
        assert_eq!(json, r#"{"class":"QSO"}"#);
    }
}
