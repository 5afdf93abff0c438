use crate::entry::RemoteEntry;

/// Direction of [`order_by_level`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    /// Shallowest level first
    Ascending,
    /// Deepest level first, the order directories must be removed in
    Descending,
}

/// Groups entries by depth, keeping discovery order inside each level.
///
/// Only levels `1..=max` are emitted. Level 0 entries are dropped and left
/// for the caller to handle explicitly. Each level is gathered with its own
/// pass over the input, so the result depends on nothing but the paths and
/// the input order.
#[must_use]
pub fn order_by_level(entries: &[RemoteEntry], order: Order) -> Vec<RemoteEntry> {
    let Some(max_level) = entries.iter().map(RemoteEntry::level).max() else {
        return Vec::new();
    };

    let levels: Box<dyn Iterator<Item = usize>> = match order {
        Order::Ascending => Box::new(1..=max_level),
        Order::Descending => Box::new((1..=max_level).rev()),
    };

    let mut result = Vec::with_capacity(entries.len());
    for level in levels {
        result.extend(
            entries
                .iter()
                .filter(|entry| entry.level() == level)
                .cloned(),
        );
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::tests::{dir, file};

    fn mixed() -> Vec<RemoteEntry> {
        vec![
            dir("/root"),
            dir("/root/a"),
            dir("/root/a/x"),
            file("/root/a/x/deep"),
            file("/root/b"),
            dir("/root/c"),
            file("/root/a/f1"),
        ]
    }

    fn paths(entries: &[RemoteEntry]) -> Vec<&str> {
        entries.iter().map(RemoteEntry::full_path).collect()
    }

    #[test]
    fn empty_input() {
        assert!(order_by_level(&[], Order::Descending).is_empty());
        assert!(order_by_level(&[], Order::Ascending).is_empty());
    }

    #[test]
    fn descending_is_deepest_first_and_stable() {
        let ordered = order_by_level(&mixed(), Order::Descending);
        assert_eq!(
            paths(&ordered),
            [
                "/root/a/x/deep",
                "/root/a/x",
                "/root/a/f1",
                "/root/a",
                "/root/b",
                "/root/c",
            ]
        );
    }

    #[test]
    fn ascending_is_shallowest_first() {
        let ordered = order_by_level(&mixed(), Order::Ascending);
        assert_eq!(
            paths(&ordered),
            [
                "/root/a",
                "/root/b",
                "/root/c",
                "/root/a/x",
                "/root/a/f1",
                "/root/a/x/deep",
            ]
        );
    }

    #[test]
    fn level_zero_is_dropped() {
        let ordered = order_by_level(&[dir("/root")], Order::Ascending);
        assert!(ordered.is_empty());
    }

    #[test]
    fn reordering_is_idempotent() {
        for order in [Order::Ascending, Order::Descending] {
            let once = order_by_level(&mixed(), order);
            assert_eq!(order_by_level(&once, order), once);
        }
    }

    #[test]
    fn tiers_mirror_each_other() {
        let levels = |entries: Vec<RemoteEntry>| -> Vec<usize> {
            entries.iter().map(RemoteEntry::level).collect()
        };

        let mut descending = levels(order_by_level(&mixed(), Order::Descending));
        descending.reverse();
        assert_eq!(descending, levels(order_by_level(&mixed(), Order::Ascending)));
    }
}
