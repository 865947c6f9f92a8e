//! Shared type definitions for the uploader pipeline

use serde::{Deserialize, Serialize};

/// Training step counter carried per data point
pub type Step = i64;

/// Fractional seconds since the Unix epoch
pub type WallTime = f64;

/// Display name of a run directory relative to the logdir root
pub type RunName = String;

/// Display name of a time series within a run (e.g. `loss`)
pub type Tag = String;

/// Run name used for event files that live directly in the logdir root
pub const ROOT_RUN_NAME: &str = "default";

/// Payload shape of a time series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataClass {
    /// Single float per point
    Scalar,

    /// Arbitrary tensor bytes per point
    Tensor,

    /// Points reference blobs stored in object storage
    BlobSequence,
}

/// Closed set of supported summary plugins
///
/// Records tagged with any other plugin are discarded at the dispatch
/// boundary; plugin strings never travel past the parse boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Plugin {
    Scalars,
    Histograms,
    Distributions,
    Text,
    Hparams,
    Images,
    Graphs,
    Profile,
}

impl Plugin {
    /// All plugins uploaded by default
    pub const ALL: [Plugin; 8] = [
        Plugin::Scalars,
        Plugin::Histograms,
        Plugin::Distributions,
        Plugin::Text,
        Plugin::Hparams,
        Plugin::Images,
        Plugin::Graphs,
        Plugin::Profile,
    ];

    /// The plugin name as it appears in summary metadata
    pub fn as_str(&self) -> &'static str {
        match self {
            Plugin::Scalars => "scalars",
            Plugin::Histograms => "histograms",
            Plugin::Distributions => "distributions",
            Plugin::Text => "text",
            Plugin::Hparams => "hparams",
            Plugin::Images => "images",
            Plugin::Graphs => "graphs",
            Plugin::Profile => "profile",
        }
    }

    /// Parse a plugin name; unknown names map to `None` and are discarded
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "scalars" => Some(Plugin::Scalars),
            "histograms" => Some(Plugin::Histograms),
            "distributions" => Some(Plugin::Distributions),
            "text" => Some(Plugin::Text),
            "hparams" => Some(Plugin::Hparams),
            "images" => Some(Plugin::Images),
            "graphs" => Some(Plugin::Graphs),
            "profile" => Some(Plugin::Profile),
            _ => None,
        }
    }

    /// The value type a plugin's time series carries
    pub fn data_class(&self) -> DataClass {
        match self {
            Plugin::Scalars => DataClass::Scalar,
            Plugin::Histograms | Plugin::Distributions | Plugin::Text | Plugin::Hparams => {
                DataClass::Tensor
            }
            Plugin::Images | Plugin::Graphs | Plugin::Profile => DataClass::BlobSequence,
        }
    }
}

impl std::fmt::Display for Plugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Plugin {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Plugin::from_name(s).ok_or_else(|| format!("unknown plugin: {s}"))
    }
}

/// Final path segment of a fully-qualified resource name
///
/// `projects/p/locations/l/tensorboards/t/experiments/e` yields `e`.
pub fn resource_id(resource_name: &str) -> &str {
    resource_name
        .rsplit('/')
        .next()
        .unwrap_or(resource_name)
}
