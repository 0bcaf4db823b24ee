// Copyright 2021 Johannes Köster.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::collections::{BTreeMap, BTreeSet};

use anyhow::Result;
use itertools::Itertools;
use strum::IntoEnumIterator;

use crate::chaining::{Chain, LinkReason};
use crate::cluster::Cluster;
use crate::errors::Error;
use crate::variants::{BreakendId, SvId};

/// Summary of a chain finding run on one cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Default, Getters, CopyGetters)]
pub struct ChainDiagnostics {
    #[getset(get_copy = "pub")]
    cluster_id: usize,
    #[getset(get_copy = "pub")]
    sv_count: usize,
    #[getset(get_copy = "pub")]
    unique_sv_count: usize,
    #[getset(get_copy = "pub")]
    chain_count: usize,
    #[getset(get_copy = "pub")]
    link_count: usize,
    /// SV instances not part of any chain.
    #[getset(get_copy = "pub")]
    unlinked_sv_count: usize,
    /// Breakend instances left unlinked.
    #[getset(get_copy = "pub")]
    unlinked_breakend_count: usize,
    /// Percentage of cluster segments with valid allele ploidy data.
    #[getset(get_copy = "pub")]
    valid_allele_ploidy_perc: f64,
    /// Highest ploidy the cluster's SVs add to any segment of their arms.
    #[getset(get_copy = "pub")]
    max_cluster_ploidy: f64,
    #[getset(get = "pub")]
    reason_counts: BTreeMap<LinkReason, usize>,
    /// Chains dropped as duplicates when added to the cluster.
    #[getset(get_copy = "pub")]
    discarded_chain_count: usize,
    #[getset(get_copy = "pub")]
    iterations: usize,
    #[getset(get_copy = "pub")]
    is_skipped: bool,
    #[getset(get_copy = "pub")]
    is_valid: bool,
    #[getset(get = "pub")]
    invalid_reason: Option<String>,
}

impl ChainDiagnostics {
    pub(crate) fn new(cluster: &Cluster) -> Self {
        ChainDiagnostics {
            cluster_id: cluster.id(),
            sv_count: cluster.sv_count(),
            unique_sv_count: cluster.unique_sv_count(),
            is_valid: true,
            ..Default::default()
        }
    }

    /// Diagnostics of a cluster that was too large to be chained.
    pub(crate) fn skipped(cluster: &Cluster) -> Self {
        ChainDiagnostics {
            is_skipped: true,
            unlinked_sv_count: cluster.sv_count(),
            ..ChainDiagnostics::new(cluster)
        }
    }

    pub(crate) fn set_iterations(&mut self, iterations: usize) {
        self.iterations = iterations;
    }

    pub(crate) fn set_valid_allele_ploidy_perc(&mut self, perc: f64) {
        self.valid_allele_ploidy_perc = perc;
    }

    pub(crate) fn set_max_cluster_ploidy(&mut self, ploidy: f64) {
        self.max_cluster_ploidy = ploidy;
    }

    pub(crate) fn set_discarded_chain_count(&mut self, count: usize) {
        self.discarded_chain_count = count;
    }

    pub(crate) fn set_unlinked_breakend_count(&mut self, count: usize) {
        self.unlinked_breakend_count = count;
    }

    pub(crate) fn invalidate(&mut self, reason: &anyhow::Error) {
        self.is_valid = false;
        self.invalid_reason = Some(reason.to_string());
    }

    /// Record the chain and link counts of the final chains.
    pub(crate) fn record_chains(&mut self, cluster: &Cluster, chains: &[Chain]) {
        self.chain_count = chains.len();
        self.link_count = chains.iter().map(|chain| chain.link_count()).sum();
        self.reason_counts = chains
            .iter()
            .flat_map(|chain| chain.links().iter())
            .filter_map(|link| link.link_reason())
            .fold(BTreeMap::new(), |mut counts, reason| {
                *counts.entry(reason).or_insert(0) += 1;
                counts
            });
        let chained: BTreeSet<SvId> = chains
            .iter()
            .flat_map(|chain| chain.sv_instances())
            .collect();
        self.unlinked_sv_count = cluster
            .svs()
            .filter(|sv| !chained.contains(&sv.id()))
            .count();
    }

    pub fn reason_count(&self, reason: LinkReason) -> usize {
        self.reason_counts.get(&reason).copied().unwrap_or(0)
    }

    /// Verify chain structure and ploidy conservation of the given chains.
    ///
    /// Consecutive links must pass through the same SV instance, no breakend instance
    /// may be linked twice and no original breakend may be linked more often than it
    /// has instances.
    pub fn check_consistency(cluster: &Cluster, chains: &[Chain]) -> Result<()> {
        let mut used = BTreeSet::new();
        let mut usage: BTreeMap<BreakendId, usize> = BTreeMap::new();

        for chain in chains {
            let inconsistent = |msg: String| -> anyhow::Error {
                Error::InconsistentChain {
                    chain: chain.id(),
                    msg,
                }
                .into()
            };

            for (left, right) in chain.links().iter().tuple_windows() {
                if left.second().other() != right.first() {
                    return Err(inconsistent(format!(
                        "link {} is not continued by link {}",
                        left, right
                    )));
                }
            }
            if chain.is_closed() {
                let first = &chain.links()[0];
                let last = &chain.links()[chain.link_count() - 1];
                if last.second().other() != first.first() {
                    return Err(inconsistent("closed chain does not form a loop".to_owned()));
                }
            }

            for link in chain.links() {
                for instance in link.breakends().iter() {
                    if cluster.breakend(*instance).is_none() {
                        return Err(inconsistent(format!("unknown breakend {}", instance)));
                    }
                    if !used.insert(*instance) {
                        return Err(inconsistent(format!(
                            "breakend {} is linked more than once",
                            instance
                        )));
                    }
                    *usage
                        .entry(cluster.original_breakend(*instance))
                        .or_insert(0) += 1;
                }
            }
        }

        for (original, used) in usage {
            let available = cluster.instances(original.sv).len();
            if used > available {
                return Err(Error::PloidyConservationViolated {
                    breakend: original,
                    used,
                    available,
                }
                .into());
            }
        }
        Ok(())
    }

    /// Link counts of all reasons, e.g. `ASMB=2 ONLY=1 FOLDBACK=0 ...`.
    pub fn reason_summary(&self) -> String {
        LinkReason::iter()
            .map(|reason| {
                let name: &'static str = reason.into();
                format!("{}={}", name, self.reason_count(reason))
            })
            .join(" ")
    }

    pub fn log_summary(&self) {
        if self.is_skipped {
            info!(
                "cluster({}) with {} SVs skipped",
                self.cluster_id, self.sv_count
            );
            return;
        }
        info!(
            "cluster({}) chaining {}: {} chains with {} links from {} SVs ({} unique), \
             {} SVs and {} breakends unlinked, {} iterations",
            self.cluster_id,
            if self.is_valid { "complete" } else { "invalid" },
            self.chain_count,
            self.link_count,
            self.sv_count,
            self.unique_sv_count,
            self.unlinked_sv_count,
            self.unlinked_breakend_count,
            self.iterations
        );
        debug!(
            "cluster({}) link reasons: {}, valid allele ploidy {:.1}%, max cluster ploidy {:.1}",
            self.cluster_id,
            self.reason_summary(),
            self.valid_allele_ploidy_perc,
            self.max_cluster_ploidy
        );
        if let Some(reason) = &self.invalid_reason {
            warn!("cluster({}) chaining invalid: {}", self.cluster_id, reason);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chaining::LinkedPair;
    use crate::variants::{Breakend, Ends, Orientation, StructuralVariant, SvType};

    fn bnd(sv: usize, end: Ends) -> BreakendId {
        BreakendId::new(SvId(sv), end)
    }

    fn cluster() -> Cluster {
        let sv = |name: &str, start: u64, ploidy: f64| {
            StructuralVariant::new(
                name,
                SvType::DUP,
                Breakend::new("1", start, Orientation::Reverse),
                Some(Breakend::new("1", start + 5000, Orientation::Forward)),
                ploidy,
            )
        };
        Cluster::new(0, vec![sv("a", 100, 1.0), sv("b", 200, 1.0)], &[]).unwrap()
    }

    #[test]
    fn test_consistent_chain() {
        let cluster = cluster();
        let chain = Chain::new(
            0,
            LinkedPair::candidate(bnd(0, Ends::Start), bnd(1, Ends::End), 5100)
                .with_reason(LinkReason::Shortest),
        );
        let chains = vec![chain];
        assert!(ChainDiagnostics::check_consistency(&cluster, &chains).is_ok());

        let mut diagnostics = ChainDiagnostics::new(&cluster);
        diagnostics.record_chains(&cluster, &chains);
        assert_eq!(diagnostics.link_count(), 1);
        assert_eq!(diagnostics.reason_count(LinkReason::Shortest), 1);
        assert_eq!(diagnostics.reason_count(LinkReason::SingleOption), 0);
        assert_eq!(diagnostics.unlinked_sv_count(), 0);
        assert_eq!(
            diagnostics.reason_summary(),
            "ASMB=0 ONLY=0 FOLDBACK=0 COMP_DUP=0 ADJAC=0 PL_MATCH=0 PL_MAX=0 SHORTEST=1"
        );
    }

    #[test]
    fn test_breakend_linked_twice() {
        let cluster = cluster();
        let chains = vec![
            Chain::new(
                0,
                LinkedPair::candidate(bnd(0, Ends::Start), bnd(1, Ends::End), 5100),
            ),
            Chain::new(
                1,
                LinkedPair::candidate(bnd(0, Ends::Start), bnd(1, Ends::End), 5100),
            ),
        ];
        let err = ChainDiagnostics::check_consistency(&cluster, &chains).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::InconsistentChain { chain: 1, .. })
        ));
    }
}
