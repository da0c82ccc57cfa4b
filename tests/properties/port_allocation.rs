use std::collections::BTreeSet;

use devstack::domain::services::port_allocator::allocate;
use devstack::domain::services::PortRequest;
use proptest::prelude::*;

proptest! {
    #[test]
    fn allocated_ports_are_unique_and_free(
        preferred in proptest::collection::vec(20000u16..20040, 1..8),
        in_use in proptest::collection::btree_set(20000u16..20040, 0..20),
    ) {
        let requests: Vec<PortRequest> = preferred
            .iter()
            .enumerate()
            .map(|(i, port)| PortRequest {
                service_id: format!("svc.s{i}"),
                variable: format!("S{i}_PORT"),
                preferred: *port,
            })
            .collect();

        let ports = allocate(&requests, &in_use, 20000..=20039).unwrap();

        let chosen: BTreeSet<u16> = ports.values().copied().collect();
        prop_assert_eq!(chosen.len(), requests.len());
        prop_assert!(chosen.is_disjoint(&in_use));
        for request in &requests {
            if !in_use.contains(&request.preferred) && ports[&request.variable] != request.preferred {
                // only an earlier request of the same project may have taken it
                prop_assert!(requests
                    .iter()
                    .take_while(|r| r.variable != request.variable)
                    .any(|r| ports[&r.variable] == request.preferred));
            }
        }
    }

    #[test]
    fn exhausted_range_is_an_error(extra in 1usize..4) {
        let in_use: BTreeSet<u16> = (30000u16..=30003).collect();
        let requests: Vec<PortRequest> = (0..extra)
            .map(|i| PortRequest {
                service_id: format!("svc.s{i}"),
                variable: format!("S{i}_PORT"),
                preferred: 30000,
            })
            .collect();
        prop_assert!(allocate(&requests, &in_use, 30000..=30003).is_err());
    }
}
