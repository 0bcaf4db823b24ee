// Copyright 2021 Johannes Köster.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Chain finding: reconstruction of derivative chromosome fragments by linking the
//! breakends of a cluster via templated insertions.

use anyhow::Result;
use rayon::prelude::*;

use crate::cluster::Cluster;
use crate::config::ChainingConfig;

pub mod assembler;
pub mod breakend_index;
pub mod chain;
pub mod diagnostics;
pub mod finder;
pub mod linked_pair;
pub mod ploidy_limits;
pub mod possible_links;
pub mod priority;
pub mod replication;

pub use assembler::ChainAssembler;
pub use breakend_index::BreakendIndex;
pub use chain::Chain;
pub use diagnostics::ChainDiagnostics;
pub use finder::{ChainFinder, ChainingOutcome};
pub use linked_pair::{HomologyTiLength, LinkReason, LinkedPair, MinTiLength};
pub use ploidy_limits::{PloidyLimits, SegmentLimits};
pub use possible_links::PossibleLinkIndex;
pub use replication::{ReplicationLedger, UnlinkedBreakends};

/// Find the chains of a cluster and add them to it.
///
/// The returned counts refer to the chains the cluster adopted, duplicates excluded.
pub fn chain_cluster(cluster: &mut Cluster, config: &ChainingConfig) -> Result<ChainDiagnostics> {
    config.validate()?;
    let mut finder = ChainFinder::new(config.clone());
    let (chains, mut diagnostics) = finder.form_chains(cluster, false).into_parts();
    let existing = cluster.chains().len();
    let discarded = cluster.add_chains(chains);
    if discarded > 0 {
        debug!(
            "cluster({}) discarded {} duplicate chains",
            cluster.id(),
            discarded
        );
        diagnostics.set_discarded_chain_count(discarded);
        diagnostics.record_chains(cluster, &cluster.chains()[existing..]);
    }
    Ok(diagnostics)
}

/// Chain independent clusters in parallel, one finder per cluster.
pub fn chain_clusters(
    clusters: &mut [Cluster],
    config: &ChainingConfig,
) -> Result<Vec<ChainDiagnostics>> {
    config.validate()?;
    info!(
        "Chaining {} clusters using {} threads",
        clusters.len(),
        rayon::current_num_threads()
    );
    clusters
        .par_iter_mut()
        .map(|cluster| chain_cluster(cluster, config))
        .collect()
}
