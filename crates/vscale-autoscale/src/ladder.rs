//! Allowed sizes ordered by price.

use std::collections::HashSet;

use vscale_core::{SizeInfo, SizeName};

/// Result of moving along the ladder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    To { index: usize, size: SizeName },
    /// The clamp left the index unchanged: no size in that direction.
    CannotScale,
}

/// Allowed sizes, cheapest first. Built fresh for every decision.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SizeLadder {
    sizes: Vec<SizeName>,
}

impl SizeLadder {
    /// Keep the sizes in `allowed` and sort them by hourly cost.
    ///
    /// Equal costs are ordered by name. A size listed twice keeps its first
    /// entry.
    pub fn build(available: &[SizeInfo], allowed: &[SizeName]) -> Self {
        let mut seen = HashSet::new();
        let mut eligible: Vec<&SizeInfo> = available
            .iter()
            .filter(|s| allowed.contains(&s.name))
            .filter(|s| seen.insert(&s.name))
            .collect();
        eligible.sort_by(|a, b| {
            a.hourly_cost
                .total_cmp(&b.hourly_cost)
                .then_with(|| a.name.cmp(&b.name))
        });

        Self {
            sizes: eligible.into_iter().map(|s| s.name.clone()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&SizeName> {
        self.sizes.get(index)
    }

    pub fn sizes(&self) -> &[SizeName] {
        &self.sizes
    }

    pub fn index_of(&self, size: &SizeName) -> Option<usize> {
        self.sizes.iter().position(|s| s == size)
    }

    /// `from + direction`, clamped to the ladder bounds.
    pub fn clamp_index(&self, from: usize, direction: i32) -> usize {
        let Some(top) = self.sizes.len().checked_sub(1) else {
            return from;
        };
        let moved = from as i64 + i64::from(direction);
        moved.clamp(0, top as i64) as usize
    }

    pub fn step(&self, from: usize, direction: i32) -> Step {
        let index = self.clamp_index(from, direction);
        if index == from {
            return Step::CannotScale;
        }
        match self.sizes.get(index) {
            Some(size) => Step::To {
                index,
                size: size.clone(),
            },
            None => Step::CannotScale,
        }
    }
}

impl std::fmt::Display for SizeLadder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.sizes.iter().map(SizeName::as_str).collect();
        write!(f, "[{}]", names.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(name: &str, cost: f64) -> SizeInfo {
        SizeInfo {
            name: SizeName::from(name),
            hourly_cost: cost,
            architecture: "x86".into(),
            location: "fsn1".into(),
        }
    }

    fn names(list: &[&str]) -> Vec<SizeName> {
        list.iter().map(|n| SizeName::from(*n)).collect()
    }

    fn ladder() -> SizeLadder {
        SizeLadder::build(
            &[info("large", 0.04), info("small", 0.01), info("medium", 0.02)],
            &names(&["small", "medium", "large"]),
        )
    }

    #[test]
    fn sorted_by_cost() {
        assert_eq!(ladder().sizes(), names(&["small", "medium", "large"]).as_slice());
    }

    #[test]
    fn filters_to_allow_list() {
        let ladder = SizeLadder::build(
            &[info("small", 0.01), info("huge", 1.0), info("medium", 0.02)],
            &names(&["medium", "small", "not-offered"]),
        );
        assert_eq!(ladder.sizes(), names(&["small", "medium"]).as_slice());
        assert_eq!(ladder.index_of(&SizeName::from("huge")), None);
    }

    #[test]
    fn ties_broken_by_name_and_duplicates_collapse() {
        let ladder = SizeLadder::build(
            &[info("b", 0.02), info("a", 0.02), info("b", 0.001), info("c", 0.01)],
            &names(&["a", "b", "c"]),
        );
        assert_eq!(ladder.sizes(), names(&["c", "a", "b"]).as_slice());
    }

    #[test]
    fn step_within_bounds() {
        let ladder = ladder();
        assert_eq!(
            ladder.step(1, -1),
            Step::To {
                index: 0,
                size: SizeName::from("small")
            }
        );
        assert_eq!(
            ladder.step(1, 1),
            Step::To {
                index: 2,
                size: SizeName::from("large")
            }
        );
    }

    #[test]
    fn step_clamps_without_wraparound() {
        let ladder = ladder();
        assert_eq!(ladder.step(0, -1), Step::CannotScale);
        assert_eq!(ladder.step(2, 1), Step::CannotScale);
        assert_eq!(ladder.clamp_index(0, -5), 0);
        assert_eq!(ladder.clamp_index(0, 5), 2);
        assert_eq!(ladder.step(0, 0), Step::CannotScale);
    }

    #[test]
    fn up_then_down_returns_except_at_bounds() {
        let ladder = ladder();
        for i in 0..ladder.len() {
            let up = ladder.clamp_index(i, 1);
            let back = ladder.clamp_index(up, -1);
            if i == ladder.len() - 1 {
                assert_eq!(up, i);
            } else {
                assert_eq!(back, i);
            }
        }
    }

    #[test]
    fn empty_ladder_cannot_scale() {
        let ladder = SizeLadder::build(&[], &names(&["small"]));
        assert!(ladder.is_empty());
        assert_eq!(ladder.step(0, 1), Step::CannotScale);
    }
}
