//! Authorization policy for read-sensitive queries
//!
//! Every query that exposes manuscript data must go through [`can_view`]. Mutations
//! do not use it; they check custodianship or administrator identity directly.
use super::identity::Principal;
use super::manuscript::Manuscript;

/// Effective view permission for `requester`.
///
/// Access is granted to the custodian, to the administrator (whose access cannot be
/// revoked) and to anyone holding an explicit grant. A missing record is never viewable.
pub fn can_view(
    record: Option<&Manuscript>,
    explicit_grant: bool,
    requester: &Principal,
    administrator: &Principal,
) -> bool {
    let Some(record) = record else {
        return false;
    };

    record.custodian == *requester || requester == administrator || explicit_grant
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manuscript::{ManuscriptDraft, ManuscriptId};
    use proptest::prelude::*;

    fn record(custodian: &str) -> Manuscript {
        ManuscriptDraft::new()
            .set_title("Voynich")
            .validate_and_finalise(ManuscriptId(7), Principal::new(custodian), 1, 100)
            .unwrap()
    }

    #[test]
    fn missing_record_is_never_viewable() {
        let admin = Principal::new("admin");
        assert!(!can_view(None, true, &admin, &admin));
    }

    #[test]
    fn stranger_without_grant_is_denied() {
        let rec = record("alice");
        assert!(!can_view(
            Some(&rec),
            false,
            &Principal::new("mallory"),
            &Principal::new("admin")
        ));
    }

    proptest! {
        #[test]
        fn custodian_and_admin_always_view(grant in any::<bool>(), who in "[a-z]{1,8}") {
            let rec = record(&who);
            let admin = Principal::new("admin");

            prop_assert!(can_view(Some(&rec), grant, &Principal::new(who), &admin));
            prop_assert!(can_view(Some(&rec), grant, &admin, &admin));
        }

        #[test]
        fn others_view_only_with_grant(grant in any::<bool>(), who in "[a-z]{1,8}") {
            prop_assume!(who != "alice" && who != "admin");
            let rec = record("alice");

            prop_assert_eq!(
                can_view(Some(&rec), grant, &Principal::new(who), &Principal::new("admin")),
                grant
            );
        }
    }
}
