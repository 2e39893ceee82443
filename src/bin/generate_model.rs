//! Write a small demo artifact so the classifier can be exercised without an
//! external training pipeline. The parameters are hand-set colour cuts, not a
//! fitted model.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use rusty_starclass::build_features;
use rusty_starclass::classifier::artifact::DEFAULT_MODEL_PATH;
use rusty_starclass::classifier::centroid::NearestCentroid;
use rusty_starclass::classifier::forest::{DecisionForest, DecisionTree, TreeNode};
use rusty_starclass::classifier::logistic::LogisticRegression;
use rusty_starclass::{ArtifactFile, MagnitudeObservation, ModelSpec};

// Column indices in the feature vector.
const U: usize = 0;
const U_G: usize = 5;
const G_R: usize = 6;
const R_I: usize = 7;
const I_Z: usize = 8;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Kind {
    Forest,
    Logistic,
    Centroid,
}

#[derive(Debug, Parser)]
#[command(name = "generate_model", about = "Write a demo classifier artifact")]
struct Args {
    /// Output path.
    #[arg(default_value = DEFAULT_MODEL_PATH)]
    out: PathBuf,

    #[arg(long, value_enum, default_value_t = Kind::Forest)]
    kind: Kind,
}

fn leaf(distribution: [f64; 3]) -> TreeNode {
    TreeNode::Leaf {
        distribution: distribution.to_vec(),
    }
}

fn split(feature: usize, threshold: f64, left: usize, right: usize) -> TreeNode {
    TreeNode::Split {
        feature,
        threshold,
        left,
        right,
    }
}

/// Three shallow trees over the colour indices. Leaf weights are GALAXY, QSO, STAR.
fn demo_forest() -> DecisionForest {
    DecisionForest {
        class_codes: vec![0, 1, 2],
        trees: vec![
            DecisionTree {
                nodes: vec![
                    split(U_G, 0.6, 1, 2),
                    leaf([1.0, 8.0, 1.0]),
                    split(G_R, 0.5, 3, 4),
                    leaf([2.0, 1.0, 7.0]),
                    leaf([8.0, 0.5, 1.5]),
                ],
            },
            DecisionTree {
                nodes: vec![
                    split(R_I, 0.2, 1, 4),
                    split(U_G, 0.8, 2, 3),
                    leaf([1.0, 7.0, 2.0]),
                    leaf([3.0, 1.0, 6.0]),
                    leaf([7.0, 1.0, 2.0]),
                ],
            },
            DecisionTree {
                nodes: vec![
                    split(I_Z, 0.1, 1, 2),
                    leaf([2.0, 3.0, 5.0]),
                    split(U, 22.0, 3, 4),
                    leaf([6.0, 1.0, 3.0]),
                    leaf([5.0, 4.0, 1.0]),
                ],
            },
        ],
    }
}

/// Linear scores on u-g and g-r only.
fn demo_logistic() -> LogisticRegression {
    let mut galaxy = [0.0; 9];
    galaxy[U_G] = 1.5;
    galaxy[G_R] = 3.0;
    let mut qso = [0.0; 9];
    qso[U_G] = -4.0;
    let mut star = [0.0; 9];
    star[G_R] = -1.0;
    LogisticRegression {
        class_codes: vec![0, 1, 2],
        weights: vec![galaxy, qso, star],
        intercepts: vec![-3.0, 2.5, 1.0],
        scaler: None,
    }
}

/// Centroids at typical magnitudes for each class.
fn demo_centroid() -> NearestCentroid {
    let centroid = |u, g, r, i, z| build_features(&MagnitudeObservation::new(u, g, r, i, z)).as_array();
    NearestCentroid {
        class_codes: vec![0, 1, 2],
        centroids: vec![
            centroid(22.6, 20.9, 19.6, 19.0, 18.6),
            centroid(21.1, 20.8, 20.6, 20.4, 20.3),
            centroid(20.9, 19.5, 18.9, 18.7, 18.6),
        ],
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let model = match args.kind {
        Kind::Forest => ModelSpec::DecisionForest(demo_forest()),
        Kind::Logistic => ModelSpec::Logistic(demo_logistic()),
        Kind::Centroid => ModelSpec::NearestCentroid(demo_centroid()),
    };
    let mut file = ArtifactFile::new(model);
    file.description = "demo artifact with hand-set colour cuts".to_string();

    // Refuse to write something the service would reject.
    file.clone()
        .into_artifact()
        .context("demo artifact failed its own checks")?;

    if let Some(parent) = args.out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    std::fs::write(&args.out, file.to_json()?)
        .with_context(|| format!("writing {}", args.out.display()))?;

    println!("Wrote {:?} artifact to {}", args.kind, args.out.display());
    Ok(())
}
