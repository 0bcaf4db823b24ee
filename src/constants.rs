// Copyright 2021 Johannes Köster.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

// Clusters with more SV instances than this are not chained at all.
pub const DEFAULT_MAX_CLUSTER_SVS: usize = 2000;

// Shortest templated insertion that is considered a real segment rather than a
// breakend artefact.
pub const MIN_TEMPLATED_INSERTION_LENGTH: u64 = 30;

// Segments whose allele ploidy falls below this cannot be part of a templated insertion.
pub const MIN_ALLELE_PLOIDY: f64 = 0.5;

// Allowed slack when judging allele ploidy and cluster ploidy consistency.
pub const ALLELE_PLOIDY_TOLERANCE: f64 = 0.5;

pub const MAX_NO_PROGRESS_ITERATIONS: usize = 5;
