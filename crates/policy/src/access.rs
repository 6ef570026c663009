//! Rank-gated access decisions.

use crate::{Rank, rank};

/// Result of an access check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny { required: Rank, held: Rank },
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    pub fn is_locked(&self) -> bool {
        !self.is_allowed()
    }
}

/// Check whether a member holding `held` may open content requiring `required`.
///
/// A member without a rank is treated as holding the lowest one. Meeting the
/// requirement exactly is enough.
pub fn check(required: Rank, held: Option<Rank>) -> Decision {
    let held = held.unwrap_or(Rank::LOWEST);
    if held.satisfies(required) {
        Decision::Allow
    } else {
        Decision::Deny { required, held }
    }
}

/// Raw-name form of [`check`].
///
/// Content is locked when the required rank sits strictly above the member's
/// rank in the ordering table. Unknown names on either side resolve to the
/// lowest rank.
pub fn is_locked(required: Option<&str>, member: Option<&str>) -> bool {
    rank::resolve(required) > rank::resolve(member)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn any_rank() -> impl Strategy<Value = Rank> {
        (0..Rank::COUNT).prop_map(|i| Rank::ALL[i])
    }

    #[test]
    fn deficiency_locks() {
        assert!(is_locked(Some("Sabuk Hitam Wiraga 1"), Some("Sabuk Putih")));
    }

    #[test]
    fn sufficiency_unlocks() {
        assert!(!is_locked(Some("Sabuk Putih"), Some("Sabuk Hitam Wiraga 1")));
    }

    #[test]
    fn unranked_member_sees_only_lowest() {
        assert!(!is_locked(Some("Belum punya"), None));
        assert!(is_locked(Some("Sabuk Putih"), None));
        assert!(is_locked(Some("LULUS Binfistal"), Some("garbage")));
    }

    #[test]
    fn padded_member_rank_does_not_unlock() {
        assert!(is_locked(Some("Sabuk Hitam Wiraga 1"), Some(" Sabuk Hitam Wiraga 3 ")));
        assert!(is_locked(Some("Sabuk Putih"), Some("Sabuk Hitam Wiraga 3\n")));
    }

    #[test]
    fn deny_reports_both_ranks() {
        let decision = check(Rank::Red, Some(Rank::Yellow));
        assert_eq!(
            decision,
            Decision::Deny {
                required: Rank::Red,
                held: Rank::Yellow
            }
        );
        assert!(decision.is_locked());

        let decision = check(Rank::White, None);
        assert_eq!(
            decision,
            Decision::Deny {
                required: Rank::White,
                held: Rank::Unranked
            }
        );
    }

    proptest! {
        #[test]
        fn ordering_is_monotonic(a in 0..Rank::COUNT, b in 0..Rank::COUNT) {
            prop_assume!(a < b);
            let (ra, rb) = (Rank::ALL[a], Rank::ALL[b]);
            prop_assert!(rank::resolve(Some(ra.name())) < rank::resolve(Some(rb.name())));
            prop_assert!(ra < rb);
        }

        #[test]
        fn equal_rank_is_granted(r in any_rank()) {
            prop_assert!(!is_locked(Some(r.name()), Some(r.name())));
            prop_assert!(check(r, Some(r)).is_allowed());
        }

        #[test]
        fn typed_and_raw_forms_agree(required in any_rank(), held in any_rank()) {
            prop_assert_eq!(
                check(required, Some(held)).is_locked(),
                is_locked(Some(required.name()), Some(held.name()))
            );
        }

        #[test]
        fn unknown_names_never_raise_privilege(junk in "[a-z ]{0,24}", required in any_rank()) {
            prop_assert_eq!(is_locked(Some(required.name()), Some(junk.as_str())), required != Rank::LOWEST);
        }
    }
}
