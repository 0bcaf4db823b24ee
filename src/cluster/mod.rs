// Copyright 2021 Johannes Köster.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Clusters of SVs as handed over by the clustering stage.
//!
//! A cluster owns the arena of its SVs. Originals come first, followed by the
//! ploidy replicates created on construction. All cross references (assembled
//! links, chains) are expressed as [`SvId`]/[`BreakendId`] into this arena.

use std::collections::BTreeSet;

use anyhow::Result;
use itertools::Itertools;
use vec_map::VecMap;

use crate::chaining::{Chain, LinkedPair};
use crate::errors::Error;
use crate::variants::{Breakend, BreakendId, Ends, StructuralVariant, SvId};

pub mod description;

pub use description::ClusterDescription;

#[derive(Debug, Clone, Getters, CopyGetters)]
pub struct Cluster {
    #[getset(get_copy = "pub")]
    id: usize,
    svs: Vec<StructuralVariant>,
    // original SV id -> all its instances, original first
    instances: VecMap<Vec<SvId>>,
    #[getset(get = "pub")]
    assembled_links: Vec<LinkedPair>,
    #[getset(get = "pub")]
    chains: Vec<Chain>,
    retired: BTreeSet<SvId>,
}

impl Cluster {
    /// Build a cluster from its original SVs and assembled links between their breakends.
    ///
    /// SVs are numbered in the given order. Each SV with a replication count above one
    /// is replicated into the arena.
    pub fn new(
        id: usize,
        svs: Vec<StructuralVariant>,
        assembled_links: &[(BreakendId, BreakendId)],
    ) -> Result<Self> {
        let mut svs = svs;
        for (i, sv) in svs.iter_mut().enumerate() {
            sv.set_id(SvId(i));
            if sv.sv_type().is_single_ended() && !sv.is_null_breakend(Ends::End) {
                return Err(Error::UnexpectedBreakend {
                    name: sv.name().to_owned(),
                    sv_type: sv.sv_type().to_string(),
                }
                .into());
            }
            if !sv.sv_type().is_single_ended() && sv.is_null_breakend(Ends::End) {
                return Err(Error::MissingBreakend {
                    name: sv.name().to_owned(),
                    end: "end".to_owned(),
                }
                .into());
            }
        }

        let mut cluster = Cluster {
            id,
            svs,
            instances: VecMap::new(),
            assembled_links: Vec::new(),
            chains: Vec::new(),
            retired: BTreeSet::new(),
        };

        for &(first, second) in assembled_links {
            let link = cluster.assembled_link(first, second)?;
            for breakend in link.breakends().iter() {
                if let Some(breakend) = cluster.svs[breakend.sv.0].breakend_mut(breakend.end) {
                    breakend.set_assembled_link();
                }
            }
            cluster.assembled_links.push(link);
        }

        cluster.replicate_svs();

        Ok(cluster)
    }

    fn assembled_link(&self, first: BreakendId, second: BreakendId) -> Result<LinkedPair> {
        let invalid = || Error::InvalidAssembledLink {
            first: self.breakend_name(first),
            second: self.breakend_name(second),
        };
        if first.sv.0 >= self.svs.len() || second.sv.0 >= self.svs.len() || first.sv == second.sv
        {
            return Err(invalid().into());
        }
        match (self.breakend(first), self.breakend(second)) {
            (Some(a), Some(b)) if a.faces(b) => {
                Ok(LinkedPair::assembled(first, second, a.distance(b)))
            }
            (Some(a), Some(b)) if b.faces(a) => {
                Ok(LinkedPair::assembled(second, first, a.distance(b)))
            }
            _ => Err(invalid().into()),
        }
    }

    /// Add ploidy replicates of all SVs with a replication count above one.
    fn replicate_svs(&mut self) {
        let original_count = self.svs.len();
        for i in 0..original_count {
            let mut ids = vec![SvId(i)];
            for _ in 1..self.svs[i].replication_count() {
                let id = SvId(self.svs.len());
                let replicate = self.svs[i].replicate(id);
                self.svs.push(replicate);
                ids.push(id);
            }
            self.instances.insert(i, ids);
        }
    }

    /// All SVs that are part of the cluster, replicates included.
    pub fn svs(&self) -> impl Iterator<Item = &StructuralVariant> {
        let retired = &self.retired;
        self.svs.iter().filter(move |sv| !retired.contains(&sv.id()))
    }

    /// The original (non-replicated) SVs.
    pub fn originals(&self) -> impl Iterator<Item = &StructuralVariant> {
        self.svs.iter().filter(|sv| !sv.is_replicated())
    }

    pub fn sv(&self, id: SvId) -> &StructuralVariant {
        &self.svs[id.0]
    }

    pub fn sv_count(&self) -> usize {
        self.svs.len() - self.retired.len()
    }

    pub fn unique_sv_count(&self) -> usize {
        self.instances.len()
    }

    pub fn has_replicated_svs(&self) -> bool {
        self.svs.iter().any(|sv| sv.is_replicated())
    }

    /// Instances of the given original SV, in replication order.
    pub fn instances(&self, original: SvId) -> &[SvId] {
        self.instances
            .get(original.0)
            .map_or(&[], |instances| instances.as_slice())
    }

    pub fn breakend(&self, id: BreakendId) -> Option<&Breakend> {
        self.svs.get(id.sv.0).and_then(|sv| sv.breakend(id.end))
    }

    /// The breakend of the original SV that the given instance breakend replicates.
    pub fn original_breakend(&self, id: BreakendId) -> BreakendId {
        BreakendId::new(self.sv(id.sv).original(), id.end)
    }

    /// Original SVs flagged as foldbacks.
    pub fn foldbacks(&self) -> Vec<SvId> {
        self.originals()
            .filter(|sv| sv.is_foldback())
            .map(|sv| sv.id())
            .collect()
    }

    pub fn breakend_name(&self, id: BreakendId) -> String {
        let end = match id.end {
            Ends::Start => "start",
            Ends::End => "end",
        };
        match self.svs.get(id.sv.0) {
            Some(sv) => format!("{}:{}", sv.name(), end),
            None => format!("{}:{}", id.sv, end),
        }
    }

    pub fn is_retired(&self, id: SvId) -> bool {
        self.retired.contains(&id)
    }

    /// Adopt the chains of a chain finding run.
    ///
    /// A chain that repeats an already added chain on the level of original breakends is
    /// discarded, and the replicated SVs it consists of are removed from the cluster.
    /// Returns the number of discarded chains.
    pub fn add_chains(&mut self, chains: Vec<Chain>) -> usize {
        let mut discarded = 0;
        for chain in chains {
            if self
                .chains
                .iter()
                .any(|existing| existing.identical_chain(&chain, self))
            {
                debug!(
                    "cluster({}) discarding duplicate chain({}) with {} links",
                    self.id,
                    chain.id(),
                    chain.link_count()
                );
                let replicates = chain
                    .sv_instances()
                    .into_iter()
                    .filter(|sv| self.sv(*sv).is_replicated())
                    .collect_vec();
                self.retired.extend(replicates);
                discarded += 1;
            } else {
                self.chains.push(chain);
            }
        }
        discarded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variants::{Orientation, SvType};

    fn dup(name: &str, start: u64, end: u64, ploidy: f64) -> StructuralVariant {
        StructuralVariant::new(
            name,
            SvType::DUP,
            Breakend::new("1", start, Orientation::Reverse),
            Some(Breakend::new("1", end, Orientation::Forward)),
            ploidy,
        )
    }

    #[test]
    fn test_replication() {
        let cluster = Cluster::new(
            1,
            vec![dup("a", 100, 1000, 1.0), dup("b", 2000, 3000, 3.0)],
            &[],
        )
        .unwrap();

        assert_eq!(cluster.unique_sv_count(), 2);
        assert_eq!(cluster.sv_count(), 4);
        assert!(cluster.has_replicated_svs());
        assert_eq!(cluster.instances(SvId(1)), &[SvId(1), SvId(2), SvId(3)]);
        assert_eq!(
            cluster.original_breakend(BreakendId::new(SvId(3), Ends::End)),
            BreakendId::new(SvId(1), Ends::End)
        );
    }

    #[test]
    fn test_assembled_link_orientation() {
        let cluster = Cluster::new(
            1,
            vec![dup("a", 100, 1000, 1.0), dup("b", 2000, 3000, 1.0)],
            &[(
                BreakendId::new(SvId(1), Ends::End),
                BreakendId::new(SvId(0), Ends::Start),
            )],
        )
        .unwrap();

        let link = &cluster.assembled_links()[0];
        assert_eq!(link.first(), BreakendId::new(SvId(0), Ends::Start));
        assert_eq!(link.second(), BreakendId::new(SvId(1), Ends::End));
        assert_eq!(link.length(), 2900);
        assert!(cluster.sv(SvId(0)).breakend(Ends::Start).unwrap().is_assembled_link());
    }

    #[test]
    fn test_invalid_assembled_link() {
        let result = Cluster::new(
            1,
            vec![dup("a", 100, 1000, 1.0), dup("b", 2000, 3000, 1.0)],
            &[(
                BreakendId::new(SvId(0), Ends::End),
                BreakendId::new(SvId(1), Ends::End),
            )],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_add_duplicate_chain() {
        let mut cluster = Cluster::new(
            1,
            vec![dup("a", 100, 1000, 2.0), dup("b", 2000, 3000, 2.0)],
            &[],
        )
        .unwrap();
        let link = |first: usize, second: usize| {
            LinkedPair::candidate(
                BreakendId::new(SvId(first), Ends::Start),
                BreakendId::new(SvId(second), Ends::End),
                2900,
            )
        };

        let discarded =
            cluster.add_chains(vec![Chain::new(0, link(0, 1)), Chain::new(1, link(2, 3))]);
        assert_eq!(discarded, 1);
        assert_eq!(cluster.chains().len(), 1);
        assert_eq!(cluster.sv_count(), 2);
        assert!(cluster.is_retired(SvId(2)));
        assert!(!cluster.is_retired(SvId(0)));
    }
}
