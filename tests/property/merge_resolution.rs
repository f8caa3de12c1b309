//! Property-based tests for the per-value three-way rule

use proptest::prelude::*;
use uprtcl::merge::three_way::{resolve, Resolution};

proptest! {
    /// A side that left the base value untouched never causes a conflict
    #[test]
    fn one_sided_change_takes_that_side(base in any::<u8>(), changed in any::<u8>()) {
        prop_assert_eq!(
            resolve(Some(&base), Some(&changed), Some(&base)),
            Resolution::Resolved(Some(changed))
        );
        prop_assert_eq!(
            resolve(Some(&changed), Some(&base), Some(&base)),
            Resolution::Resolved(Some(changed))
        );
    }

    /// Both sides changing to different values is the only conflict
    #[test]
    fn conflict_only_when_both_sides_diverge(
        from in any::<u8>(),
        to in any::<u8>(),
        base in any::<u8>(),
    ) {
        let conflicted = resolve(Some(&from), Some(&to), Some(&base)) == Resolution::Conflict;
        prop_assert_eq!(conflicted, from != to && from != base && to != base);
    }

    /// Deletion on one side against an untouched other side deletes
    #[test]
    fn deletion_against_untouched_side(base in any::<u8>()) {
        prop_assert_eq!(resolve(None, Some(&base), Some(&base)), Resolution::Resolved(None));
    }
}
