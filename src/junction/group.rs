/// Donor/acceptor adjacency grouping
use super::system::JunctionSystem;
use log::{info, warn};

/// Outcome of a grouping pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroupSummary {
    pub groups: usize,
    /// Junctions alone in their group
    pub unique: usize,
}

impl JunctionSystem {
    /// Group neighbouring junctions that share a donor or acceptor and flag
    /// the best supported member of each group as primary.
    ///
    /// Groups chain only through consecutive junctions of the sequence, so
    /// the sequence must already be sorted by reference and start (see
    /// [`JunctionSystem::sort`]). Ties on support go to the earliest member.
    pub fn calc_junction_stats(&mut self) -> GroupSummary {
        if !self.is_sorted() {
            warn!("Grouping junctions that are not sorted by position; groups may be split");
        }

        let (order, arena) = self.split_mut();
        let mut summary = GroupSummary::default();

        let mut first = 0;
        while first < order.len() {
            let mut last = first;
            while last + 1 < order.len()
                && arena[order[last].index()]
                    .key()
                    .shares_donor_or_acceptor(arena[order[last + 1].index()].key())
            {
                last += 1;
            }

            let group = &order[first..=last];
            let unique = group.len() == 1;
            let mut best = group[0];
            let mut max_support = 0;
            for &id in group {
                let junction = &mut arena[id.index()];
                junction.unique = unique;
                junction.primary = false;
                if junction.support() > max_support {
                    max_support = junction.support();
                    best = id;
                }
            }
            arena[best.index()].primary = true;

            summary.groups += 1;
            if unique {
                summary.unique += 1;
            }
            first = last + 1;
        }

        info!(
            "Grouped {} junctions into {} groups ({} unique)",
            order.len(),
            summary.groups,
            summary.unique
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use crate::junction::{IntronKey, JunctionSystem, Strand};

    fn add(system: &mut JunctionSystem, start: i64, end: i64, support: u32) {
        let key = IntronKey::new(0, start, end, Strand::Unknown);
        for _ in 0..support {
            system.insert_or_merge(key, start - 10, end + 10);
        }
    }

    fn flags(system: &JunctionSystem) -> Vec<(i64, bool, bool)> {
        system
            .junctions()
            .map(|j| (j.intron_start(), j.primary, j.unique))
            .collect()
    }

    #[test]
    fn test_chain_through_neighbours() {
        let mut system = JunctionSystem::new();
        add(&mut system, 100, 200, 1); // A
        add(&mut system, 100, 250, 3); // B shares start with A
        add(&mut system, 120, 250, 2); // C shares end with B, nothing with A
        add(&mut system, 400, 500, 1); // D alone
        system.sort();

        let summary = system.calc_junction_stats();
        assert_eq!(summary.groups, 2);
        assert_eq!(summary.unique, 1);

        assert_eq!(
            flags(&system),
            vec![
                (100, false, false),
                (100, true, false),
                (120, false, false),
                (400, true, true),
            ]
        );
    }

    #[test]
    fn test_one_primary_per_group_ties_to_first() {
        let mut system = JunctionSystem::new();
        add(&mut system, 100, 200, 2);
        add(&mut system, 100, 300, 2);
        system.sort();
        system.calc_junction_stats();

        let primaries: Vec<_> = system
            .junctions()
            .filter(|j| j.primary)
            .map(|j| j.intron_end())
            .collect();
        assert_eq!(primaries, vec![200]);
    }

    #[test]
    fn test_unlinked_neighbour_starts_new_group() {
        let mut system = JunctionSystem::new();
        add(&mut system, 100, 200, 1);
        add(&mut system, 150, 300, 1);
        add(&mut system, 160, 200, 1); // shares end with the first, not with its neighbour
        system.sort();

        let summary = system.calc_junction_stats();
        assert_eq!(summary.groups, 3);
        assert!(system.junctions().all(|j| j.primary && j.unique));
    }

    #[test]
    fn test_strand_ignored_when_linking() {
        let mut system = JunctionSystem::new();
        system.insert_or_merge(IntronKey::new(0, 100, 200, Strand::Positive), 90, 210);
        system.insert_or_merge(IntronKey::new(0, 100, 200, Strand::Negative), 90, 210);
        system.sort();

        let summary = system.calc_junction_stats();
        assert_eq!(summary.groups, 1);
        assert!(system.junctions().all(|j| !j.unique));
    }

    #[test]
    fn test_regrouping_resets_flags() {
        let mut system = JunctionSystem::new();
        add(&mut system, 100, 200, 1);
        add(&mut system, 100, 300, 1);
        system.sort();
        system.calc_junction_stats();

        add(&mut system, 100, 300, 5);
        system.calc_junction_stats();
        let primaries: Vec<_> = system
            .junctions()
            .filter(|j| j.primary)
            .map(|j| j.intron_end())
            .collect();
        assert_eq!(primaries, vec![300]);
    }

    #[test]
    fn test_empty_system() {
        let mut system = JunctionSystem::new();
        assert_eq!(system.calc_junction_stats().groups, 0);
    }
}
