mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from smilescan for tests
pub use smilescan::{
    BoundingBox, Confidence, LipBoxSource, Metrics, MouthLandmarks, Point, ScanConfig, ScanError,
    SmileAnalysis, SmileScanner,
};
