// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Write detection for planned statements

use crate::host::{PlanInfo, RangeEntryKind};

/// True when the plan needs more than read access on any real relation.
///
/// Subqueries, joins, functions, value lists and CTEs are not inspected;
/// the relations they read appear in the range table on their own.
pub fn is_write<P: PlanInfo + ?Sized>(plan: &P) -> bool {
    plan.range_table().iter().any(|entry| {
        entry.kind == RangeEntryKind::Relation && entry.required_permissions.beyond_select()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{AclMode, CommandType, RangeTableEntry};

    struct Plan(Vec<RangeTableEntry>);

    impl PlanInfo for Plan {
        fn command(&self) -> CommandType {
            CommandType::Select
        }

        fn range_table(&self) -> &[RangeTableEntry] {
            &self.0
        }
    }

    #[test]
    fn test_select_is_not_a_write() {
        let plan = Plan(vec![
            RangeTableEntry::relation("t1", AclMode::SELECT),
            RangeTableEntry::other(RangeEntryKind::Join),
            RangeTableEntry::relation("t2", AclMode::SELECT),
        ]);
        assert!(!is_write(&plan));
    }

    #[test]
    fn test_insert_is_a_write() {
        let plan = Plan(vec![
            RangeTableEntry::relation("t1", AclMode::INSERT),
            RangeTableEntry::relation("t2", AclMode::SELECT),
        ]);
        assert!(is_write(&plan));
    }

    #[test]
    fn test_locking_select_is_a_write() {
        // SELECT ... FOR UPDATE asks for UPDATE permission
        let plan = Plan(vec![RangeTableEntry::relation(
            "t1",
            AclMode::SELECT | AclMode::UPDATE,
        )]);
        assert!(is_write(&plan));
    }

    #[test]
    fn test_non_relation_entries_are_ignored() {
        let mut cte = RangeTableEntry::other(RangeEntryKind::Cte);
        cte.required_permissions = AclMode::INSERT;
        let plan = Plan(vec![cte, RangeTableEntry::other(RangeEntryKind::Values)]);
        assert!(!is_write(&plan));
        assert!(!is_write(&Plan(Vec::new())));
    }
}
