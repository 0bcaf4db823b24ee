// Copyright 2021 Johannes Köster.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::fmt;

use itertools::Itertools;

use crate::chaining::LinkedPair;
use crate::cluster::Cluster;
use crate::variants::{BreakendId, Ends, SvId};

/// A reconstructed stretch of derivative chromosome.
///
/// Consecutive links share an SV instance: a link's second breakend and the next
/// link's first breakend are the two ends of the same SV. The open breakends of a
/// chain are the unlinked ends of its first and last SV.
#[derive(Debug, Clone, PartialEq, Getters, CopyGetters)]
pub struct Chain {
    #[getset(get_copy = "pub")]
    id: usize,
    #[getset(get = "pub")]
    links: Vec<LinkedPair>,
    #[getset(get_copy = "pub")]
    is_closed: bool,
}

impl Chain {
    pub(crate) fn new(id: usize, link: LinkedPair) -> Self {
        Chain {
            id,
            links: vec![link],
            is_closed: false,
        }
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    fn first_link(&self) -> &LinkedPair {
        &self.links[0]
    }

    fn last_link(&self) -> &LinkedPair {
        &self.links[self.links.len() - 1]
    }

    /// The SV instance at the given end of the chain.
    pub fn sv_at(&self, end: Ends) -> SvId {
        match end {
            Ends::Start => self.first_link().first().sv,
            Ends::End => self.last_link().second().sv,
        }
    }

    /// The unlinked breakend at the given end, `None` once the chain is closed.
    ///
    /// For single-ended SVs the returned breakend does not exist in the cluster.
    pub fn open_breakend(&self, end: Ends) -> Option<BreakendId> {
        if self.is_closed {
            return None;
        }
        match end {
            Ends::Start => Some(self.first_link().first().other()),
            Ends::End => Some(self.last_link().second().other()),
        }
    }

    /// Extend the chain at the given end. The link's first breakend must be the chain's
    /// open breakend there.
    pub(crate) fn add_link(&mut self, link: LinkedPair, end: Ends) {
        match end {
            Ends::End => self.links.push(link),
            Ends::Start => self.links.insert(0, link.reversed()),
        }
        self.check_closed();
    }

    /// Join the two open breakends, turning the chain into a loop.
    pub(crate) fn close(&mut self, link: LinkedPair) {
        self.links.push(link);
        self.is_closed = true;
    }

    pub(crate) fn reverse(&mut self) {
        self.links.reverse();
        for link in self.links.iter_mut() {
            *link = link.reversed();
        }
    }

    /// Append a chain whose start continues this chain's end.
    pub(crate) fn append(&mut self, other: Chain) {
        self.links.extend(other.links);
        self.check_closed();
    }

    fn check_closed(&mut self) {
        if self.links.len() > 1
            && self.last_link().second().other() == self.first_link().first()
        {
            self.is_closed = true;
        }
    }

    /// Whether the end of this chain continues into the start of `other`.
    pub(crate) fn continues_into(&self, other: &Chain) -> bool {
        !self.is_closed
            && !other.is_closed
            && self.last_link().second().other() == other.first_link().first()
    }

    /// Join two chains sharing an end SV instance, reversing either as needed.
    ///
    /// The merged chain keeps the id of `self`.
    pub(crate) fn merge(&self, other: &Chain) -> Option<Chain> {
        if self.is_closed || other.is_closed {
            return None;
        }
        let orientations = [(false, false), (false, true), (true, false), (true, true)];
        for &(reverse_self, reverse_other) in orientations.iter() {
            let mut head = self.clone();
            let mut tail = other.clone();
            if reverse_self {
                head.reverse();
            }
            if reverse_other {
                tail.reverse();
            }
            if head.continues_into(&tail) {
                head.append(tail);
                return Some(head);
            }
        }
        None
    }

    /// SV instances in chain order.
    pub fn sv_instances(&self) -> Vec<SvId> {
        let mut svs = vec![self.first_link().first().sv];
        svs.extend(self.links.iter().map(|link| link.second().sv));
        if self.is_closed {
            svs.pop();
        }
        svs
    }

    pub fn has_breakend(&self, instance: BreakendId) -> bool {
        self.links.iter().any(|link| link.has_breakend(instance))
    }

    /// Linked breakends mapped to their originals, in chain order.
    pub fn original_breakends(&self, cluster: &Cluster) -> Vec<BreakendId> {
        self.links
            .iter()
            .flat_map(|link| link.breakends().to_vec())
            .map(|breakend| cluster.original_breakend(breakend))
            .collect()
    }

    /// Whether both chains join the same original breakends, in either direction.
    pub fn identical_chain(&self, other: &Chain, cluster: &Cluster) -> bool {
        if self.links.len() != other.links.len() || self.is_closed != other.is_closed {
            return false;
        }
        let breakends = self.original_breakends(cluster);
        let other_breakends = other.original_breakends(cluster);
        breakends == other_breakends || breakends.iter().eq(other_breakends.iter().rev())
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "chain({}){}: {}",
            self.id,
            if self.is_closed { " closed" } else { "" },
            self.links.iter().join(" ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bnd(sv: usize, end: Ends) -> BreakendId {
        BreakendId::new(SvId(sv), end)
    }

    fn link(first: BreakendId, second: BreakendId) -> LinkedPair {
        LinkedPair::candidate(first, second, 100)
    }

    #[test]
    fn test_extend_both_ends() {
        let mut chain = Chain::new(0, link(bnd(0, Ends::End), bnd(1, Ends::Start)));
        assert_eq!(chain.open_breakend(Ends::Start), Some(bnd(0, Ends::Start)));
        assert_eq!(chain.open_breakend(Ends::End), Some(bnd(1, Ends::End)));

        chain.add_link(link(bnd(1, Ends::End), bnd(2, Ends::Start)), Ends::End);
        chain.add_link(link(bnd(0, Ends::Start), bnd(3, Ends::End)), Ends::Start);

        assert_eq!(chain.open_breakend(Ends::Start), Some(bnd(3, Ends::Start)));
        assert_eq!(chain.open_breakend(Ends::End), Some(bnd(2, Ends::End)));
        assert_eq!(
            chain.sv_instances(),
            vec![SvId(3), SvId(0), SvId(1), SvId(2)]
        );
        assert_eq!(chain.sv_at(Ends::Start), SvId(3));
        assert!(!chain.is_closed());
    }

    #[test]
    fn test_reverse_and_append() {
        let mut first = Chain::new(0, link(bnd(0, Ends::End), bnd(1, Ends::Start)));
        let mut second = Chain::new(1, link(bnd(2, Ends::End), bnd(1, Ends::End)));
        assert!(!first.continues_into(&second));

        second.reverse();
        assert!(first.continues_into(&second));
        first.append(second);
        assert_eq!(first.link_count(), 2);
        assert_eq!(first.open_breakend(Ends::End), Some(bnd(2, Ends::Start)));
    }

    #[test]
    fn test_merge() {
        // both chains end with SV 1, entered through different breakends
        let first = Chain::new(0, link(bnd(0, Ends::End), bnd(1, Ends::Start)));
        let second = Chain::new(3, link(bnd(2, Ends::Start), bnd(1, Ends::End)));

        let merged = first.merge(&second).unwrap();
        assert_eq!(merged.id(), 0);
        assert_eq!(merged.sv_instances(), vec![SvId(0), SvId(1), SvId(2)]);
        assert_eq!(merged.open_breakend(Ends::Start), Some(bnd(0, Ends::Start)));
        assert_eq!(merged.open_breakend(Ends::End), Some(bnd(2, Ends::End)));

        let unrelated = Chain::new(4, link(bnd(5, Ends::End), bnd(6, Ends::Start)));
        assert!(first.merge(&unrelated).is_none());
    }

    #[test]
    fn test_close() {
        let mut chain = Chain::new(0, link(bnd(0, Ends::End), bnd(1, Ends::Start)));
        chain.close(link(bnd(1, Ends::End), bnd(0, Ends::Start)));
        assert!(chain.is_closed());
        assert_eq!(chain.open_breakend(Ends::End), None);
        assert_eq!(chain.sv_instances(), vec![SvId(0), SvId(1)]);
    }
}
