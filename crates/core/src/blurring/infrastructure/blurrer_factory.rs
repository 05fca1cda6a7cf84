use std::fmt;
use std::str::FromStr;

use crate::blurring::domain::region_blurrer::RegionBlurrer;

use super::edge_aware_region_blurrer::EdgeAwareRegionBlurrer;
use super::standard_region_blurrer::StandardRegionBlurrer;

/// Which region transform a run uses. Chosen once by the caller; the
/// pipeline itself has a single implementation for both.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum BlurMode {
    #[default]
    Standard,
    EdgeAware,
}

impl fmt::Display for BlurMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlurMode::Standard => write!(f, "Standard"),
            BlurMode::EdgeAware => write!(f, "Advanced (Edge-aware)"),
        }
    }
}

impl FromStr for BlurMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "standard" => Ok(BlurMode::Standard),
            "edge-aware" => Ok(BlurMode::EdgeAware),
            other => Err(format!(
                "Blur mode must be 'standard' or 'edge-aware', got '{other}'"
            )),
        }
    }
}

/// Creates the region blurrer for `mode`.
pub fn create_blurrer(mode: BlurMode, kernel_size: usize) -> Box<dyn RegionBlurrer> {
    log::info!("Using {mode} region blur (kernel_size={kernel_size})");
    match mode {
        BlurMode::Standard => Box::new(StandardRegionBlurrer::new(kernel_size)),
        BlurMode::EdgeAware => Box::new(EdgeAwareRegionBlurrer::new(kernel_size)),
    }
}
