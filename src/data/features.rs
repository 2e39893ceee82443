use super::model::{FeatureVector, MagnitudeObservation};

// ---------------------------------------------------------------------------
// Feature builder
// ---------------------------------------------------------------------------

/// Derive the model input from five magnitudes.
///
/// Colour indices are adjacent-band differences in wavelength order with the
/// bluer band as minuend (`u - g`, `g - r`, `r - i`, `i - z`). The trained
/// model was fitted on exactly this sign convention and column order; a
/// flipped operand produces a well-formed but wrong vector that no classifier
/// will reject.
pub fn build_features(obs: &MagnitudeObservation) -> FeatureVector {
    FeatureVector {
        u: obs.u,
        g: obs.g,
        r: obs.r,
        i: obs.i,
        z: obs.z,
        u_g: obs.u - obs.g,
        g_r: obs.g - obs.r,
        r_i: obs.r - obs.i,
        i_z: obs.i - obs.z,
    }
}
