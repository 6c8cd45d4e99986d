use std::collections::BTreeMap;
use std::fmt;

use crate::FunctionalGroup;

pub type AtomId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AtomKind {
    Carbon,
    Oxygen,
    Nitrogen,
    Sulfur,
}

impl AtomKind {
    /// Number of bond slots an atom of this kind carries.
    pub const fn valence(self) -> usize {
        match self {
            AtomKind::Carbon => 4,
            AtomKind::Oxygen => 2,
            AtomKind::Nitrogen => 3,
            // enough for R-S(O)(O)(O)
            AtomKind::Sulfur => 6,
        }
    }

    pub const fn symbol(self) -> char {
        match self {
            AtomKind::Carbon => 'C',
            AtomKind::Oxygen => 'O',
            AtomKind::Nitrogen => 'N',
            AtomKind::Sulfur => 'S',
        }
    }

    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            'C' => Some(AtomKind::Carbon),
            'O' => Some(AtomKind::Oxygen),
            'N' => Some(AtomKind::Nitrogen),
            'S' => Some(AtomKind::Sulfur),
            _ => None,
        }
    }
}

impl fmt::Display for AtomKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bond {
    Single,
    Double,
    Triple,
}

impl Bond {
    pub const fn multiplicity(self) -> usize {
        match self {
            Bond::Single => 1,
            Bond::Double => 2,
            Bond::Triple => 3,
        }
    }

    pub fn from_multiplicity(n: usize) -> Option<Self> {
        match n {
            1 => Some(Bond::Single),
            2 => Some(Bond::Double),
            3 => Some(Bond::Triple),
            _ => None,
        }
    }

    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            '-' => Some(Bond::Single),
            '=' => Some(Bond::Double),
            '#' => Some(Bond::Triple),
            _ => None,
        }
    }
}

/// One bond slot of an atom. An empty slot holds an implicit hydrogen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Empty,
    Bound(AtomId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Atom {
    pub(crate) id: AtomId,
    pub(crate) kind: AtomKind,
    pub(crate) slots: Vec<Slot>,
    pub(crate) groups: BTreeMap<FunctionalGroup, usize>,
    pub(crate) in_cycle: bool,
    pub(crate) double_bonds: usize,
    pub(crate) triple_bonds: usize,
}

impl Atom {
    pub fn new(id: AtomId, kind: AtomKind) -> Self {
        Self {
            id,
            kind,
            slots: vec![Slot::Empty; kind.valence()],
            groups: BTreeMap::new(),
            in_cycle: false,
            double_bonds: 0,
            triple_bonds: 0,
        }
    }

    pub fn id(&self) -> AtomId {
        self.id
    }

    pub fn kind(&self) -> AtomKind {
        self.kind
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn is_carbon(&self) -> bool {
        self.kind == AtomKind::Carbon
    }

    pub fn hydrogens(&self) -> usize {
        self.slots.iter().filter(|slot| **slot == Slot::Empty).count()
    }

    pub(crate) fn free_slots(&self) -> usize {
        self.hydrogens()
    }

    /// Bound atoms in slot order, repeated once per bond unit.
    pub fn bound(&self) -> impl Iterator<Item = AtomId> + '_ {
        self.slots.iter().filter_map(|slot| match slot {
            Slot::Bound(id) => Some(*id),
            Slot::Empty => None,
        })
    }

    /// Distinct bound atoms in first-slot order.
    pub fn neighbors(&self) -> Vec<AtomId> {
        let mut neighbors = Vec::with_capacity(self.slots.len());
        for id in self.bound() {
            if !neighbors.contains(&id) {
                neighbors.push(id);
            }
        }
        neighbors
    }

    /// Number of slots pointing at `other`.
    pub fn bond_order_to(&self, other: AtomId) -> usize {
        self.bound().filter(|id| *id == other).count()
    }

    pub fn is_bound_to(&self, other: AtomId) -> bool {
        self.bound().any(|id| id == other)
    }

    pub fn has_multiple_bond(&self) -> bool {
        self.double_bonds + self.triple_bonds > 0
    }

    pub fn double_bonds(&self) -> usize {
        self.double_bonds
    }

    pub fn triple_bonds(&self) -> usize {
        self.triple_bonds
    }

    pub fn is_in_cycle(&self) -> bool {
        self.in_cycle
    }

    pub fn group_count(&self, group: FunctionalGroup) -> usize {
        self.groups.get(&group).copied().unwrap_or(0)
    }

    pub fn functional_groups(&self) -> &BTreeMap<FunctionalGroup, usize> {
        &self.groups
    }

    pub fn total_groups(&self) -> usize {
        self.groups.values().sum()
    }

    /// Fill `count` empty slots with `other`, in slot order.
    pub(crate) fn occupy(&mut self, other: AtomId, count: usize) {
        let mut remaining = count;
        for slot in self.slots.iter_mut() {
            if remaining == 0 {
                break;
            }
            if *slot == Slot::Empty {
                *slot = Slot::Bound(other);
                remaining -= 1;
            }
        }
    }

    /// Empty every slot pointing at `other`, returning how many there were.
    pub(crate) fn release(&mut self, other: AtomId) -> usize {
        let mut released = 0;
        for slot in self.slots.iter_mut() {
            if *slot == Slot::Bound(other) {
                *slot = Slot::Empty;
                released += 1;
            }
        }
        released
    }

    pub(crate) fn count_bond(&mut self, bond: Bond) {
        match bond {
            Bond::Single => {}
            Bond::Double => self.double_bonds += 1,
            Bond::Triple => self.triple_bonds += 1,
        }
    }

    pub(crate) fn uncount_bond(&mut self, bond: Bond) {
        match bond {
            Bond::Single => {}
            Bond::Double => self.double_bonds = self.double_bonds.saturating_sub(1),
            Bond::Triple => self.triple_bonds = self.triple_bonds.saturating_sub(1),
        }
    }

    pub(crate) fn clear_annotations(&mut self) {
        self.groups.clear();
        self.in_cycle = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valence_by_kind() {
        assert_eq!(Atom::new(0, AtomKind::Carbon).hydrogens(), 4);
        assert_eq!(Atom::new(0, AtomKind::Oxygen).hydrogens(), 2);
        assert_eq!(Atom::new(0, AtomKind::Nitrogen).hydrogens(), 3);
        assert_eq!(Atom::new(0, AtomKind::Sulfur).hydrogens(), 6);
    }

    #[test]
    fn test_occupy_and_release() {
        let mut atom = Atom::new(0, AtomKind::Carbon);
        atom.occupy(1, 2);
        atom.occupy(2, 1);
        assert_eq!(atom.slots(), &[Slot::Bound(1), Slot::Bound(1), Slot::Bound(2), Slot::Empty]);
        assert_eq!(atom.neighbors(), vec![1, 2]);
        assert_eq!(atom.bond_order_to(1), 2);

        assert_eq!(atom.release(1), 2);
        assert_eq!(atom.hydrogens(), 3);
        // the next bond reuses the first hole
        atom.occupy(3, 1);
        assert_eq!(atom.slots()[0], Slot::Bound(3));
    }

    #[test]
    fn test_symbols() {
        for kind in [AtomKind::Carbon, AtomKind::Oxygen, AtomKind::Nitrogen, AtomKind::Sulfur] {
            assert_eq!(AtomKind::from_symbol(kind.symbol()), Some(kind));
        }
        assert_eq!(AtomKind::from_symbol('X'), None);
        assert_eq!(Bond::from_symbol('#'), Some(Bond::Triple));
        assert_eq!(Bond::from_multiplicity(4), None);
    }
}
