//! Mana: colors, costs, and pools.
//!
//! Costs are structural (generic + colored pips + optional X), parsed
//! upstream from the `{2}{G}{G}` notation. Pools track floating mana per
//! color plus colorless; they empty at every step boundary.

use serde::{Deserialize, Serialize};

/// The five mana colors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    White,
    Blue,
    Black,
    Red,
    Green,
}

impl Color {
    /// All colors in WUBRG order.
    pub const ALL: [Color; 5] = [
        Color::White,
        Color::Blue,
        Color::Black,
        Color::Red,
        Color::Green,
    ];

    const fn slot(self) -> usize {
        match self {
            Color::White => 0,
            Color::Blue => 1,
            Color::Black => 2,
            Color::Red => 3,
            Color::Green => 4,
        }
    }

    /// One-letter symbol (`W`, `U`, `B`, `R`, `G`).
    #[must_use]
    pub fn symbol(self) -> char {
        match self {
            Color::White => 'W',
            Color::Blue => 'U',
            Color::Black => 'B',
            Color::Red => 'R',
            Color::Green => 'G',
        }
    }
}

/// A structural mana cost: generic amount, colored pips, optional X.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManaCost {
    /// Generic component (the `{2}` in `{2}{G}{G}`).
    pub generic: u32,
    /// Colored pips, count per color.
    pips: [u32; 5],
    /// Whether the cost contains `{X}`.
    pub has_x: bool,
}

impl ManaCost {
    /// A free cost (`{0}`).
    #[must_use]
    pub fn free() -> Self {
        Self::default()
    }

    /// A purely generic cost.
    #[must_use]
    pub fn generic(amount: u32) -> Self {
        Self { generic: amount, ..Self::default() }
    }

    /// Add colored pips (builder).
    #[must_use]
    pub fn with_pips(mut self, color: Color, count: u32) -> Self {
        self.pips[color.slot()] += count;
        self
    }

    /// Add a generic component (builder).
    #[must_use]
    pub fn with_generic(mut self, amount: u32) -> Self {
        self.generic += amount;
        self
    }

    /// Mark the cost as containing `{X}` (builder).
    #[must_use]
    pub fn with_x(mut self) -> Self {
        self.has_x = true;
        self
    }

    /// Number of pips of one color.
    #[must_use]
    pub fn pips(&self, color: Color) -> u32 {
        self.pips[color.slot()]
    }

    /// Converted cost for a given X binding (X contributes X generic).
    #[must_use]
    pub fn converted(&self, x: i64) -> i64 {
        let pips: u32 = self.pips.iter().sum();
        i64::from(self.generic + pips) + if self.has_x { x.max(0) } else { 0 }
    }

    /// Parse the `{2}{G}{G}` notation. Unknown symbols are treated as one
    /// generic mana; hybrid and phyrexian symbols are out of scope upstream.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut cost = Self::default();
        for symbol in text.split(['{', '}']).filter(|s| !s.is_empty()) {
            match symbol {
                "W" => cost.pips[Color::White.slot()] += 1,
                "U" => cost.pips[Color::Blue.slot()] += 1,
                "B" => cost.pips[Color::Black.slot()] += 1,
                "R" => cost.pips[Color::Red.slot()] += 1,
                "G" => cost.pips[Color::Green.slot()] += 1,
                "X" => cost.has_x = true,
                "C" => cost.generic += 1,
                n => cost.generic += n.parse::<u32>().unwrap_or(1),
            }
        }
        cost
    }
}

impl std::fmt::Display for ManaCost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.has_x {
            write!(f, "{{X}}")?;
        }
        if self.generic > 0 {
            write!(f, "{{{}}}", self.generic)?;
        }
        for color in Color::ALL {
            for _ in 0..self.pips(color) {
                write!(f, "{{{}}}", color.symbol())?;
            }
        }
        if self.generic == 0 && !self.has_x && self.pips.iter().all(|&p| p == 0) {
            write!(f, "{{0}}")?;
        }
        Ok(())
    }
}

/// Floating mana available to one player.
///
/// Slots 0-4 are WUBRG, slot 5 is colorless.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManaPool {
    slots: [u32; 6],
}

impl ManaPool {
    /// Create an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add colored mana.
    pub fn add(&mut self, color: Color, count: u32) {
        self.slots[color.slot()] += count;
    }

    /// Add colorless mana.
    pub fn add_colorless(&mut self, count: u32) {
        self.slots[5] += count;
    }

    /// Amount of one color currently floating.
    #[must_use]
    pub fn colored(&self, color: Color) -> u32 {
        self.slots[color.slot()]
    }

    /// Total mana currently floating.
    #[must_use]
    pub fn total(&self) -> u32 {
        self.slots.iter().sum()
    }

    /// Empty the pool (step boundaries).
    pub fn empty(&mut self) {
        self.slots = [0; 6];
    }

    /// Check whether `cost` (plus `extra_generic`, e.g. commander tax) can
    /// be paid with `x` bound. Colored pips require matching colors;
    /// generic and X are payable from anything.
    #[must_use]
    pub fn can_pay(&self, cost: &ManaCost, x: i64, extra_generic: u32) -> bool {
        let mut remaining = self.slots;
        for color in Color::ALL {
            let need = cost.pips(color);
            if remaining[color.slot()] < need {
                return false;
            }
            remaining[color.slot()] -= need;
        }
        let generic_due = u64::from(cost.generic)
            + u64::from(extra_generic)
            + if cost.has_x { x.max(0) as u64 } else { 0 };
        remaining.iter().map(|&n| u64::from(n)).sum::<u64>() >= generic_due
    }

    /// Pay `cost` from the pool. Colorless is spent on generic first, then
    /// colored mana in WUBRG order. The caller must have checked `can_pay`;
    /// returns `false` (pool unchanged) if payment is impossible.
    pub fn pay(&mut self, cost: &ManaCost, x: i64, extra_generic: u32) -> bool {
        if !self.can_pay(cost, x, extra_generic) {
            return false;
        }

        for color in Color::ALL {
            self.slots[color.slot()] -= cost.pips(color);
        }

        let mut generic_due = cost.generic
            + extra_generic
            + if cost.has_x { x.max(0) as u32 } else { 0 };
        for slot in (0..6).rev() {
            let spend = self.slots[slot].min(generic_due);
            self.slots[slot] -= spend;
            generic_due -= spend;
            if generic_due == 0 {
                break;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cost() {
        let cost = ManaCost::parse("{2}{G}{G}");
        assert_eq!(cost.generic, 2);
        assert_eq!(cost.pips(Color::Green), 2);
        assert!(!cost.has_x);
        assert_eq!(cost.converted(0), 4);
    }

    #[test]
    fn test_parse_x_cost() {
        let cost = ManaCost::parse("{X}{R}");
        assert!(cost.has_x);
        assert_eq!(cost.converted(5), 6);
    }

    #[test]
    fn test_pool_pays_colored_first() {
        let mut pool = ManaPool::new();
        pool.add(Color::Green, 2);
        pool.add(Color::Red, 2);
        pool.add_colorless(1);

        let cost = ManaCost::parse("{2}{G}{G}");
        assert!(pool.can_pay(&cost, 0, 0));
        assert!(pool.pay(&cost, 0, 0));
        // Colorless plus one red paid the generic part.
        assert_eq!(pool.total(), 1);
        assert_eq!(pool.colored(Color::Green), 0);
    }

    #[test]
    fn test_pool_rejects_wrong_colors() {
        let mut pool = ManaPool::new();
        pool.add(Color::Red, 4);

        let cost = ManaCost::parse("{G}");
        assert!(!pool.can_pay(&cost, 0, 0));
        assert!(!pool.pay(&cost, 0, 0));
        assert_eq!(pool.total(), 4);
    }

    #[test]
    fn test_commander_tax_is_extra_generic() {
        let mut pool = ManaPool::new();
        pool.add(Color::Green, 3);

        let cost = ManaCost::parse("{G}");
        assert!(pool.can_pay(&cost, 0, 2));
        assert!(!pool.can_pay(&cost, 0, 3));
    }

    #[test]
    fn test_x_payment() {
        let mut pool = ManaPool::new();
        pool.add(Color::Red, 1);
        pool.add_colorless(3);

        let cost = ManaCost::parse("{X}{R}");
        assert!(pool.can_pay(&cost, 3, 0));
        assert!(!pool.can_pay(&cost, 4, 0));
    }

    #[test]
    fn test_display() {
        assert_eq!(ManaCost::parse("{2}{G}{G}").to_string(), "{2}{G}{G}");
        assert_eq!(ManaCost::free().to_string(), "{0}");
    }
}
