use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use anyhow::{Context, Result, bail};
use log::{debug, warn};

use super::features::build_features;
use super::model::{FEATURE_COUNT, FEATURE_NAMES, MagnitudeObservation, ObjectClass};

/// Largest difference tolerated between a stored colour index and a recomputed one.
/// CSV round-trips decimal text, so exact equality is too strict.
pub const DERIVED_TOLERANCE: f64 = 1e-9;

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// First place where a training row disagrees with the feature builder.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedMismatch {
    /// Zero-based data row (header excluded).
    pub row: usize,
    pub column: &'static str,
    pub stored: f64,
    pub expected: f64,
}

/// Summary of a prepared training set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingReport {
    pub rows: usize,
    pub class_counts: BTreeMap<&'static str, usize>,
    pub mismatch: Option<DerivedMismatch>,
}

impl TrainingReport {
    /// True when every row reproduced its colour indices.
    pub fn is_consistent(&self) -> bool {
        self.mismatch.is_none()
    }
}

impl fmt::Display for TrainingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "rows: {}", self.rows)?;
        for (label, count) in &self.class_counts {
            writeln!(f, "  {label}: {count}")?;
        }
        match &self.mismatch {
            None => write!(f, "colour indices match the feature builder"),
            Some(m) => write!(
                f,
                "row {}: column {} holds {} but the feature builder gives {}",
                m.row, m.column, m.stored, m.expected
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Verification
// ---------------------------------------------------------------------------

/// Check a prepared training CSV against the inference-time feature layout.
///
/// The header must start with the model columns in order and carry a `class`
/// column holding the integer encoding. Every row's colour indices are
/// recomputed from its raw magnitudes; the first disagreement is reported
/// rather than treated as an error so the whole file still gets counted.
pub fn verify_training_csv(path: &Path) -> Result<TrainingReport> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("opening training CSV {}", path.display()))?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    check_header_order(&headers)?;
    let class_idx = headers
        .iter()
        .position(|h| h == "class")
        .context("CSV missing 'class' column")?;

    let mut report = TrainingReport::default();

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;

        let mut values = [0.0_f64; FEATURE_COUNT];
        for (col_idx, slot) in values.iter_mut().enumerate() {
            let raw = record.get(col_idx).unwrap_or("");
            *slot = raw.trim().parse::<f64>().with_context(|| {
                format!("Row {row_no}, {}: '{raw}' is not a number", FEATURE_NAMES[col_idx])
            })?;
            // `parse` accepts NaN and inf; those rows cannot be checked.
            if !slot.is_finite() {
                bail!("Row {row_no}, {}: '{raw}' is not finite", FEATURE_NAMES[col_idx]);
            }
        }

        let raw_class = record.get(class_idx).unwrap_or("");
        let code = raw_class
            .trim()
            .parse::<i64>()
            .with_context(|| format!("Row {row_no}, class: '{raw_class}' is not an integer code"))?;
        let class = ObjectClass::from_code(code);
        if !class.is_known() {
            bail!("Row {row_no}: class code {code} is outside the GALAXY/QSO/STAR encoding");
        }
        *report.class_counts.entry(class.label()).or_default() += 1;

        if report.mismatch.is_none() {
            report.mismatch = first_derived_mismatch(row_no, &values);
            if let Some(m) = &report.mismatch {
                warn!("training row {} disagrees on {}", m.row, m.column);
            }
        }
        report.rows += 1;
    }

    debug!("verified {} training rows from {}", report.rows, path.display());
    Ok(report)
}

fn check_header_order(headers: &[String]) -> Result<()> {
    if headers.len() < FEATURE_COUNT {
        bail!(
            "CSV has {} columns, expected at least {} feature columns plus 'class'",
            headers.len(),
            FEATURE_COUNT
        );
    }
    for (idx, expected) in FEATURE_NAMES.iter().enumerate() {
        if headers[idx] != *expected {
            bail!(
                "CSV column {idx} is '{}' but the model expects '{expected}' (order: {})",
                headers[idx],
                FEATURE_NAMES.join(",")
            );
        }
    }
    Ok(())
}

fn first_derived_mismatch(row: usize, values: &[f64; FEATURE_COUNT]) -> Option<DerivedMismatch> {
    let obs = MagnitudeObservation::new(values[0], values[1], values[2], values[3], values[4]);
    let rebuilt = build_features(&obs).as_array();

    (5..FEATURE_COUNT).find_map(|idx| {
        let stored = values[idx];
        let expected = rebuilt[idx];
        ((stored - expected).abs() > DERIVED_TOLERANCE).then_some(
            DerivedMismatch {
                row,
                column: FEATURE_NAMES[idx],
                stored,
                expected,
            },
        )
    })
}
