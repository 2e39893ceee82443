//! Data layer: observation types, the validation gate, and feature derivation.
//!
//! Architecture:
//! ```text
//!   u, g, r, i, z
//!        │
//!        ▼
//!   ┌──────────┐
//!   │ validate  │  range gate → ValidatedObservation | ValidationFailure
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │ features  │  five magnitudes + four colour indices → FeatureVector
//!   └──────────┘
//!        │
//!        ▼
//!     classifier
//! ```
//!
//! `training` checks a prepared training CSV against the same feature builder.

pub mod features;
pub mod model;
pub mod training;
pub mod validate;
