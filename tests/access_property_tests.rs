//! Property-based tests for the access-control lifecycle
//!
//! Random sequences of grant, revoke and transfer calls are run against a live
//! registry and against a small in-memory model of the same rules. After every
//! step the outcome kind and the effective view permission of every principal
//! must agree with the model.
//!
//! What these tests DON'T cover (deliberately):
//!
//! - Tag capacity (covered by `tag_capacity_property_tests.rs`) and removal (scenario tests)
//! - Field validation on registration (covered by unit tests)

use manuscript_registry::{
    ChainHeight, ManuscriptDraft, ManuscriptId, Principal, RegistryConfig, RegistryError,
    RegistryService,
};
use proptest::prelude::*;
use std::collections::BTreeSet;
use std::sync::Arc;

const CAST: [&str; 5] = ["admin", "alice", "bob", "carol", "dave"];

#[derive(Debug, Clone)]
enum Op {
    Grant { caller: usize, recipient: usize },
    Revoke { caller: usize, target: usize },
    Transfer { caller: usize, to: usize },
}

#[derive(Debug, PartialEq, Eq)]
enum Outcome {
    Ok,
    NotOwner,
    SelfGrantRejected,
    GovernanceRestriction,
    NoOpTransferRejected,
}

/// Reference model of custodian plus explicit grants
struct Model {
    custodian: usize,
    grants: BTreeSet<usize>,
}

impl Model {
    fn apply(&mut self, op: &Op) -> Outcome {
        match *op {
            Op::Grant { caller, recipient } => {
                if caller != self.custodian {
                    return Outcome::NotOwner;
                }
                if recipient == caller {
                    return Outcome::SelfGrantRejected;
                }
                self.grants.insert(recipient);
            }
            Op::Revoke { caller, target } => {
                if caller != self.custodian {
                    return Outcome::NotOwner;
                }
                if target == caller || target == 0 {
                    return Outcome::GovernanceRestriction;
                }
                self.grants.remove(&target);
            }
            Op::Transfer { caller, to } => {
                if caller != self.custodian {
                    return Outcome::NotOwner;
                }
                if to == self.custodian {
                    return Outcome::NoOpTransferRejected;
                }
                self.grants.insert(to);
                self.grants.remove(&self.custodian);
                self.custodian = to;
            }
        }
        Outcome::Ok
    }

    fn can_view(&self, who: usize) -> bool {
        who == 0 || who == self.custodian || self.grants.contains(&who)
    }
}

fn outcome(result: Result<(), RegistryError>) -> Outcome {
    match result {
        Ok(()) => Outcome::Ok,
        Err(RegistryError::NotOwner) => Outcome::NotOwner,
        Err(RegistryError::SelfGrantRejected) => Outcome::SelfGrantRejected,
        Err(RegistryError::GovernanceRestriction) => Outcome::GovernanceRestriction,
        Err(RegistryError::NoOpTransferRejected) => Outcome::NoOpTransferRejected,
        Err(other) => panic!("unexpected registry error: {other}"),
    }
}

/// Strategy to generate a single lifecycle call by any member of the cast
fn op_strategy() -> impl Strategy<Value = Op> {
    let who = 0..CAST.len();
    prop_oneof![
        (who.clone(), who.clone()).prop_map(|(caller, recipient)| Op::Grant { caller, recipient }),
        (who.clone(), who.clone()).prop_map(|(caller, target)| Op::Revoke { caller, target }),
        (who.clone(), who).prop_map(|(caller, to)| Op::Transfer { caller, to }),
    ]
}

fn registry() -> (RegistryService, Vec<Principal>, ManuscriptId) {
    let cast: Vec<Principal> = CAST.iter().map(|name| Principal::new(*name)).collect();
    let db = sled::Config::new().temporary(true).open().unwrap();
    let service = RegistryService::open(
        Arc::new(db),
        &RegistryConfig::new(cast[0].clone()),
        Arc::new(ChainHeight::new(1)),
    )
    .unwrap();

    let id = service
        .register_manuscript(&cast[1], ManuscriptDraft::new().set_title("Codex Sinaiticus"))
        .unwrap()
        .id;

    (service, cast, id)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// Property: the registry and the model agree on every outcome and every view permission
    #[test]
    fn prop_lifecycle_matches_model(ops in prop::collection::vec(op_strategy(), 1..=24)) {
        let (service, cast, id) = registry();
        let mut model = Model { custodian: 1, grants: BTreeSet::new() };

        for op in &ops {
            let expected = model.apply(op);
            let actual = outcome(match *op {
                Op::Grant { caller, recipient } => service.grant_view(&cast[caller], id, &cast[recipient]),
                Op::Revoke { caller, target } => service.revoke_view(&cast[caller], id, &cast[target]),
                Op::Transfer { caller, to } => service
                    .transfer_custodianship(&cast[caller], id, &cast[to])
                    .map(|_| ()),
            });
            prop_assert_eq!(actual, expected, "outcome diverged on {:?}", op);

            for (who, principal) in cast.iter().enumerate() {
                prop_assert_eq!(service.can_view(id, principal).unwrap(), model.can_view(who));
            }
        }
    }

    /// Property: custodian and administrator can always view, whatever happened before
    #[test]
    fn prop_implicit_access_always_holds(ops in prop::collection::vec(op_strategy(), 0..=16)) {
        let (service, cast, id) = registry();

        for op in &ops {
            let _ = match *op {
                Op::Grant { caller, recipient } => service.grant_view(&cast[caller], id, &cast[recipient]),
                Op::Revoke { caller, target } => service.revoke_view(&cast[caller], id, &cast[target]),
                Op::Transfer { caller, to } => service
                    .transfer_custodianship(&cast[caller], id, &cast[to])
                    .map(|_| ()),
            };
        }

        let custodian = service.get_manuscript(&cast[0], id).unwrap().custodian;
        prop_assert!(service.can_view(id, &custodian).unwrap());
        prop_assert!(service.can_view(id, &cast[0]).unwrap());
        prop_assert!(service.get_analytics(&custodian, id).is_ok());
    }

    /// Property: revoking the administrator is always a governance restriction
    #[test]
    fn prop_admin_revocation_always_rejected(grant_first in any::<bool>()) {
        let (service, cast, id) = registry();
        if grant_first {
            service.grant_view(&cast[1], id, &cast[0]).unwrap();
        }

        prop_assert!(matches!(
            service.revoke_view(&cast[1], id, &cast[0]),
            Err(RegistryError::GovernanceRestriction)
        ));
        prop_assert!(service.can_view(id, &cast[0]).unwrap());
    }
}
