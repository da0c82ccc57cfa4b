//! Host port allocation
//!
//! Each exposed service keeps its preferred host port unless another project
//! (or an earlier service of the same project) holds it. Otherwise the first
//! free port of the range at or above the preferred one is used, wrapping to
//! the start of the range.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::RangeInclusive;

use super::compose_builder::GenerationError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortRequest {
    pub service_id: String,
    /// Variable that carries the chosen port
    pub variable: String,
    pub preferred: u16,
}

/// Allocate one port per request, returning `variable -> port`.
pub fn allocate(
    requests: &[PortRequest],
    in_use: &BTreeSet<u16>,
    range: RangeInclusive<u16>,
) -> Result<BTreeMap<String, u16>, GenerationError> {
    let mut taken = in_use.clone();
    let mut allocated = BTreeMap::new();

    for request in requests {
        let port = if taken.contains(&request.preferred) {
            range
                .clone()
                .filter(|p| *p >= request.preferred)
                .chain(range.clone())
                .find(|p| !taken.contains(p))
                .ok_or_else(|| GenerationError::NoFreePort {
                    service: request.service_id.clone(),
                    preferred: request.preferred,
                })?
        } else {
            request.preferred
        };
        taken.insert(port);
        allocated.insert(request.variable.clone(), port);
    }

    Ok(allocated)
}
