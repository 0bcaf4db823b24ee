// Copyright 2021 Johannes Köster.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use thiserror::Error;

use crate::variants::BreakendId;

#[derive(Error, Debug, PartialEq, Clone)]
pub enum Error {
    #[error("invalid breakend orientation {value}, must be 1 or -1")]
    InvalidOrientation { value: i8 },
    #[error("cluster refers to unknown SV {name}")]
    UnknownSv { name: String },
    #[error("SV name {name} occurs more than once in the cluster")]
    DuplicateSvName { name: String },
    #[error("invalid breakend reference '{reference}', use NAME:start or NAME:end")]
    InvalidBreakendRef { reference: String },
    #[error("SV {name} has no {end} breakend")]
    MissingBreakend { name: String, end: String },
    #[error("SV {name} of type {sv_type} must not have an end breakend")]
    UnexpectedBreakend { name: String, sv_type: String },
    #[error("assembled link {first} - {second} does not join facing breakends of two SVs")]
    InvalidAssembledLink { first: String, second: String },
    #[error("invalid chaining configuration: {msg}")]
    InvalidConfig { msg: String },
    #[error("linked pair {lower} - {upper} cannot be resolved to unlinked breakend instances")]
    UnresolvableLinkedPair {
        lower: BreakendId,
        upper: BreakendId,
    },
    #[error("chain finding made no progress in {iterations} consecutive iterations")]
    ChainingStalled { iterations: usize },
    #[error("chain {chain} is inconsistent: {msg}")]
    InconsistentChain { chain: usize, msg: String },
    #[error("breakend {breakend} is linked {used} times but has only {available} instances")]
    PloidyConservationViolated {
        breakend: BreakendId,
        used: usize,
        available: usize,
    },
}
