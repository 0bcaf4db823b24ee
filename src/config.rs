// Copyright 2021 Johannes Köster.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::convert::TryFrom;

use anyhow::Result;
use derive_builder::Builder;

use crate::constants;
use crate::errors::Error;

/// Settings of a chain finding run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder, CopyGetters)]
#[getset(get_copy = "pub")]
#[serde(default)]
#[builder(default)]
pub struct ChainingConfig {
    /// Clusters with more SV instances (replicates included) are skipped.
    max_cluster_svs: usize,
    /// Base minimum length of a templated insertion.
    min_ti_length: u64,
    /// Stop extending candidate links across segments with too low allele ploidy.
    use_allele_ploidies: bool,
    min_allele_ploidy: f64,
    allele_ploidy_tolerance: f64,
    max_no_progress_iterations: usize,
}

impl Default for ChainingConfig {
    fn default() -> Self {
        ChainingConfig {
            max_cluster_svs: constants::DEFAULT_MAX_CLUSTER_SVS,
            min_ti_length: constants::MIN_TEMPLATED_INSERTION_LENGTH,
            use_allele_ploidies: false,
            min_allele_ploidy: constants::MIN_ALLELE_PLOIDY,
            allele_ploidy_tolerance: constants::ALLELE_PLOIDY_TOLERANCE,
            max_no_progress_iterations: constants::MAX_NO_PROGRESS_ITERATIONS,
        }
    }
}

impl ChainingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_no_progress_iterations == 0 {
            return Err(Error::InvalidConfig {
                msg: "max_no_progress_iterations must be at least 1".to_owned(),
            }
            .into());
        }
        if self.min_allele_ploidy < 0.0 || self.allele_ploidy_tolerance < 0.0 {
            return Err(Error::InvalidConfig {
                msg: "allele ploidy thresholds must not be negative".to_owned(),
            }
            .into());
        }
        Ok(())
    }
}

impl<'a> TryFrom<&'a str> for ChainingConfig {
    type Error = serde_yaml::Error;

    fn try_from(yaml: &str) -> Result<Self, Self::Error> {
        serde_yaml::from_str(yaml)
    }
}
