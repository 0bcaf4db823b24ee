// Copyright 2021 Johannes Köster.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Chain finding for clusters of structural variants.
//!
//! Breakends of the SVs in a cluster, replicated according to their ploidy, are
//! linked via templated insertions into linear or closed chains that describe
//! derivative chromosome fragments. Links are chosen by a deterministic cascade of
//! priority rules, see [`chaining::priority`].

#[macro_use]
extern crate log;
#[macro_use]
extern crate serde_derive;
#[macro_use]
extern crate derive_new;
#[macro_use]
extern crate getset;

pub mod chaining;
pub mod cluster;
pub mod config;
pub mod constants;
pub mod errors;
pub mod variants;

pub use chaining::{chain_cluster, chain_clusters, ChainFinder, ChainingOutcome};
pub use cluster::{Cluster, ClusterDescription};
pub use config::ChainingConfig;
