// Bounded atom counters with all-or-nothing additions and deductions.
use std::fmt;

use crate::core::catalog::{AtomKind, Recipe};
use crate::core::error::{Error, ErrorKind};

/// Hard upper bound for any single counter unless overridden at startup.
pub const DEFAULT_CEILING: u64 = 1_000_000_000_000_000_000;

/// A (carbon, hydrogen, oxygen) triple: a stock snapshot or a requirement.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Levels {
    pub carbon: u64,
    pub hydrogen: u64,
    pub oxygen: u64,
}

impl Levels {
    pub fn amount(&self, kind: AtomKind) -> u64 {
        match kind {
            AtomKind::Carbon => self.carbon,
            AtomKind::Hydrogen => self.hydrogen,
            AtomKind::Oxygen => self.oxygen,
        }
    }
}

impl fmt::Display for Levels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "carbon={} hydrogen={} oxygen={}",
            self.carbon, self.hydrogen, self.oxygen
        )
    }
}

/// The shared stock. Methods are plain state transitions over `&mut self`;
/// callers serialize access (one mutual-exclusion domain in `bank`).
#[derive(Debug)]
pub struct Inventory {
    levels: Levels,
    ceiling: u64,
}

impl Inventory {
    pub fn new(ceiling: u64) -> Self {
        Self {
            levels: Levels::default(),
            ceiling,
        }
    }

    pub fn levels(&self) -> Levels {
        self.levels
    }

    pub fn ceiling(&self) -> u64 {
        self.ceiling
    }

    fn counter_mut(&mut self, kind: AtomKind) -> &mut u64 {
        match kind {
            AtomKind::Carbon => &mut self.levels.carbon,
            AtomKind::Hydrogen => &mut self.levels.hydrogen,
            AtomKind::Oxygen => &mut self.levels.oxygen,
        }
    }

    /// Adds `amount` units of `kind`, returning the new total. The counter is
    /// left untouched when the result would pass the ceiling (or overflow).
    pub fn add(&mut self, kind: AtomKind, amount: u64) -> Result<u64, Error> {
        let ceiling = self.ceiling;
        let counter = self.counter_mut(kind);
        let headroom = ceiling - *counter;
        match counter.checked_add(amount) {
            Some(total) if total <= ceiling => {
                *counter = total;
                Ok(total)
            }
            _ => Err(Error::new(ErrorKind::Limit)
                .with_message(format!("{} atoms limit exceeded", kind.label()))
                .with_atom(kind)
                .with_requested(amount)
                .with_available(headroom)),
        }
    }

    /// Deducts all three requirements, or none of them.
    pub fn try_deduct(&mut self, required: Levels) -> Result<(), Error> {
        for kind in AtomKind::ALL {
            let stock = self.levels.amount(kind);
            let need = required.amount(kind);
            if stock < need {
                return Err(Error::new(ErrorKind::Stock)
                    .with_message(format!("not enough {} atoms", kind.label()))
                    .with_atom(kind)
                    .with_requested(need)
                    .with_available(stock));
            }
        }
        self.levels.carbon -= required.carbon;
        self.levels.hydrogen -= required.hydrogen;
        self.levels.oxygen -= required.oxygen;
        Ok(())
    }

    /// Whole units of `recipe` the current stock supports: the minimum over
    /// required atoms of `stock / requirement`. Atoms the recipe does not use
    /// impose no constraint; an all-zero recipe reports `u64::MAX` (the
    /// catalog refuses to load one).
    pub fn producible(&self, recipe: &Recipe) -> u64 {
        let mut units = u64::MAX;
        for kind in AtomKind::ALL {
            let need = recipe.amount(kind);
            if need > 0 {
                units = units.min(self.levels.amount(kind) / need);
            }
        }
        units
    }
}

#[cfg(test)]
mod tests {
    use super::{DEFAULT_CEILING, Inventory, Levels};
    use crate::core::catalog::{AtomKind, Recipe};
    use crate::core::error::ErrorKind;

    #[test]
    fn add_accumulates_accepted_amounts() {
        let mut inventory = Inventory::new(DEFAULT_CEILING);
        assert_eq!(inventory.add(AtomKind::Carbon, 10).expect("add"), 10);
        assert_eq!(inventory.add(AtomKind::Carbon, 7).expect("add"), 17);
        assert_eq!(inventory.add(AtomKind::Oxygen, 3).expect("add"), 3);
        assert_eq!(
            inventory.levels(),
            Levels {
                carbon: 17,
                hydrogen: 0,
                oxygen: 3,
            }
        );
    }

    #[test]
    fn add_past_ceiling_is_rejected_without_partial_credit() {
        let mut inventory = Inventory::new(DEFAULT_CEILING);
        inventory
            .add(AtomKind::Carbon, 999_999_999_999_999_999)
            .expect("below ceiling");

        let err = inventory
            .add(AtomKind::Carbon, 5)
            .expect_err("over ceiling");
        assert_eq!(err.kind(), ErrorKind::Limit);
        assert_eq!(err.atom(), Some(AtomKind::Carbon));
        assert_eq!(inventory.levels().carbon, 999_999_999_999_999_999);
    }

    #[test]
    fn add_is_safe_against_u64_overflow() {
        let mut inventory = Inventory::new(u64::MAX);
        inventory.add(AtomKind::Hydrogen, u64::MAX).expect("fill");
        let err = inventory
            .add(AtomKind::Hydrogen, 1)
            .expect_err("sum overflows");
        assert_eq!(err.kind(), ErrorKind::Limit);
        assert_eq!(inventory.levels().hydrogen, u64::MAX);
    }

    #[test]
    fn deduct_is_all_or_nothing() {
        let mut inventory = Inventory::new(DEFAULT_CEILING);
        inventory.add(AtomKind::Carbon, 10).expect("add");
        inventory.add(AtomKind::Hydrogen, 20).expect("add");
        inventory.add(AtomKind::Oxygen, 10).expect("add");

        // WATER x5: needs H=10, O=5.
        let water = Recipe::new(0, 2, 1);
        let required = water.requirement(5).expect("requirement");
        inventory.try_deduct(required).expect("feasible");
        assert_eq!(
            inventory.levels(),
            Levels {
                carbon: 10,
                hydrogen: 10,
                oxygen: 5,
            }
        );

        // WATER x10 needs H=20; only 10 left. Nothing moves.
        let required = water.requirement(10).expect("requirement");
        let err = inventory.try_deduct(required).expect_err("infeasible");
        assert_eq!(err.kind(), ErrorKind::Stock);
        assert_eq!(err.atom(), Some(AtomKind::Hydrogen));
        assert_eq!(
            inventory.levels(),
            Levels {
                carbon: 10,
                hydrogen: 10,
                oxygen: 5,
            }
        );
    }

    #[test]
    fn producible_ignores_unused_atoms() {
        let mut inventory = Inventory::new(DEFAULT_CEILING);
        inventory.add(AtomKind::Hydrogen, 9).expect("add");
        inventory.add(AtomKind::Oxygen, 7).expect("add");

        // WATER needs no carbon, so zero carbon stock is no constraint.
        assert_eq!(inventory.producible(&Recipe::new(0, 2, 1)), 4);
        // A carbon-bearing recipe is gated by the empty carbon counter.
        assert_eq!(inventory.producible(&Recipe::new(1, 0, 2)), 0);
    }
}
