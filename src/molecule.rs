use std::collections::BTreeMap;
use std::fmt;

use petgraph::graph::NodeIndex;
use petgraph::visit::Dfs;

use crate::*;

pub type MoleculeGraph = petgraph::graph::UnGraph<AtomKind, Bond>;

/// A connected molecule: an arena of atoms addressed by id.
///
/// Besides the atoms themselves, a molecule carries the cycle boundary pairs
/// found while it was built, and the indices filled in by
/// [`Molecule::identify_structures`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Molecule {
    pub(crate) atoms: Vec<Atom>,
    pub(crate) root: AtomId,
    pub(crate) cycle_boundaries: Vec<(AtomId, AtomId)>,

    pub(crate) groups: BTreeMap<FunctionalGroup, Vec<AtomId>>,
    pub(crate) senior_group: Option<FunctionalGroup>,
    pub(crate) multiple_bond_atoms: Vec<AtomId>,
    pub(crate) cycles: Vec<Vec<AtomId>>,
    pub(crate) longest_cycle: usize,
    pub(crate) longest_cycle_starts: Vec<AtomId>,
}

impl Molecule {
    pub fn add_atom(&mut self, kind: AtomKind) -> AtomId {
        let id = self.atoms.len();
        self.atoms.push(Atom::new(id, kind));
        id
    }

    /// Bond `a` and `b`, filling one slot on each side per bond unit.
    ///
    /// Binding atoms that are already bonded raises the bond order. Nothing is
    /// mutated when either side lacks free slots.
    pub fn bind(&mut self, a: AtomId, b: AtomId, bond: Bond) -> Result<()> {
        if a == b {
            return Err(NamingError::SelfBond(a));
        }
        let first = self.atom(a).ok_or(NamingError::UnknownAtom(a))?;
        let second = self.atom(b).ok_or(NamingError::UnknownAtom(b))?;

        let units = bond.multiplicity();
        let existing = first.bond_order_to(b);
        let previous = Bond::from_multiplicity(existing);
        let combined = Bond::from_multiplicity(existing + units).ok_or(NamingError::LigancyExceeded {
            atom: a,
            kind: first.kind(),
        })?;
        for atom in [first, second] {
            if atom.free_slots() < units {
                return Err(NamingError::LigancyExceeded {
                    atom: atom.id(),
                    kind: atom.kind(),
                });
            }
        }

        for (this, other) in [(a, b), (b, a)] {
            let atom = &mut self.atoms[this];
            atom.occupy(other, units);
            if let Some(previous) = previous {
                atom.uncount_bond(previous);
            }
            atom.count_bond(combined);
        }
        Ok(())
    }

    /// Remove every bond unit between `a` and `b`, returning the bond that was there.
    pub fn unbind(&mut self, a: AtomId, b: AtomId) -> Result<Option<Bond>> {
        for id in [a, b] {
            if self.atom(id).is_none() {
                return Err(NamingError::UnknownAtom(id));
            }
        }
        let released = self.atoms[a].release(b);
        self.atoms[b].release(a);

        let bond = Bond::from_multiplicity(released);
        if let Some(bond) = bond {
            self.atoms[a].uncount_bond(bond);
            self.atoms[b].uncount_bond(bond);
        }
        Ok(bond)
    }

    pub fn atom(&self, id: AtomId) -> Option<&Atom> {
        self.atoms.get(id)
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    pub fn root(&self) -> AtomId {
        self.root
    }

    pub fn count_hydrogens(&self, id: AtomId) -> usize {
        self.atom(id).map_or(0, Atom::hydrogens)
    }

    /// Distinct neighbors of `id` with the given kind.
    pub fn count_neighbors_of_kind(&self, id: AtomId, kind: AtomKind) -> usize {
        self.atom(id).map_or(0, |atom| {
            atom.neighbors()
                .into_iter()
                .filter(|n| self.atoms[*n].kind == kind)
                .count()
        })
    }

    pub fn bond_order(&self, a: AtomId, b: AtomId) -> usize {
        self.atom(a).map_or(0, |atom| atom.bond_order_to(b))
    }

    pub fn cycle_boundaries(&self) -> &[(AtomId, AtomId)] {
        &self.cycle_boundaries
    }

    pub fn senior_group(&self) -> Option<FunctionalGroup> {
        self.senior_group
    }

    pub fn atoms_with_group(&self, group: FunctionalGroup) -> &[AtomId] {
        self.groups.get(&group).map_or(&[], Vec::as_slice)
    }

    pub fn multiple_bond_atoms(&self) -> &[AtomId] {
        &self.multiple_bond_atoms
    }

    pub fn cycles(&self) -> &[Vec<AtomId>] {
        &self.cycles
    }

    pub fn longest_cycle_len(&self) -> usize {
        self.longest_cycle
    }

    pub fn longest_cycle_starts(&self) -> &[AtomId] {
        &self.longest_cycle_starts
    }

    /// Reject graphs that cannot be named: no carbon root, or atoms the root
    /// cannot reach.
    pub fn check_connectivity(&self) -> Result<()> {
        self.check_reachable_from(self.root)
    }

    pub(crate) fn check_reachable_from(&self, root: AtomId) -> Result<()> {
        match self.atom(root) {
            Some(root) if root.is_carbon() => {}
            _ => return Err(NamingError::EmptyMolecule),
        }

        let graph = self.to_graph();
        let mut reached = vec![false; self.atoms.len()];
        let mut dfs = Dfs::new(&graph, NodeIndex::new(root));
        while let Some(node) = dfs.next(&graph) {
            reached[node.index()] = true;
        }

        let missing: Vec<AtomId> = (0..self.atoms.len()).filter(|id| !reached[*id]).collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(NamingError::DisconnectedAtoms(missing))
        }
    }

    /// One node per atom (node index == atom id), one edge per bonded pair.
    pub fn to_graph(&self) -> MoleculeGraph {
        let mut graph = MoleculeGraph::with_capacity(self.atoms.len(), self.atoms.len());
        for atom in &self.atoms {
            graph.add_node(atom.kind);
        }
        for atom in &self.atoms {
            for neighbor in atom.neighbors() {
                if atom.id >= neighbor {
                    continue;
                }
                if let Some(bond) = Bond::from_multiplicity(atom.bond_order_to(neighbor)) {
                    graph.add_edge(NodeIndex::new(atom.id), NodeIndex::new(neighbor), bond);
                }
            }
        }
        graph
    }

    /// Give every atom a new id; `ids[old] == new`.
    pub(crate) fn renumber(&mut self, ids: &[AtomId]) {
        let mut atoms = std::mem::take(&mut self.atoms);
        for atom in atoms.iter_mut() {
            atom.id = ids[atom.id];
            for slot in atom.slots.iter_mut() {
                if let Slot::Bound(other) = slot {
                    *other = ids[*other];
                }
            }
        }
        atoms.sort_by_key(|atom| atom.id);
        self.atoms = atoms;
        self.root = ids[self.root];
        for (start, end) in self.cycle_boundaries.iter_mut() {
            *start = ids[*start];
            *end = ids[*end];
        }
    }

    /// Copy the part of the molecule reachable from `root` without passing
    /// through `anchor`. Every slot bound to `anchor` becomes a hydrogen,
    /// whatever the order of that bond, so a double bond to the anchor
    /// leaves two extra hydrogens behind.
    pub fn detach(&self, root: AtomId, anchor: AtomId) -> Molecule {
        let (ids, order) = self.collect_branch(root, anchor);

        let mut branch = Molecule::default();
        for old in &order {
            let source = &self.atoms[*old];
            let id = branch.add_atom(source.kind);
            let atom = &mut branch.atoms[id];
            for (slot, source_slot) in atom.slots.iter_mut().zip(&source.slots) {
                *slot = match source_slot {
                    Slot::Bound(other) => ids[*other].map_or(Slot::Empty, Slot::Bound),
                    Slot::Empty => Slot::Empty,
                };
            }
            for neighbor in atom.neighbors() {
                if let Some(bond) = Bond::from_multiplicity(atom.bond_order_to(neighbor)) {
                    atom.count_bond(bond);
                }
            }
        }
        branch.cycle_boundaries = self
            .cycle_boundaries
            .iter()
            .filter_map(|(start, end)| Some((ids[*start]?, ids[*end]?)))
            .collect();
        branch
    }

    /// Number the atoms reachable from `root` in depth-first preorder,
    /// never stepping onto `anchor`.
    fn collect_branch(&self, root: AtomId, anchor: AtomId) -> (Vec<Option<AtomId>>, Vec<AtomId>) {
        let mut ids = vec![None; self.atoms.len()];
        let mut order = vec![root];
        ids[root] = Some(0);
        let mut stack = vec![(self.atoms[root].neighbors(), 0)];
        while let Some((neighbors, next)) = stack.last_mut() {
            let neighbor = neighbors.get(*next).copied();
            *next += 1;
            match neighbor {
                None => {
                    stack.pop();
                }
                Some(neighbor) if neighbor != anchor && ids[neighbor].is_none() => {
                    ids[neighbor] = Some(order.len());
                    order.push(neighbor);
                    stack.push((self.atoms[neighbor].neighbors(), 0));
                }
                Some(_) => {}
            }
        }
        (ids, order)
    }

    fn write_atom(&self, f: &mut fmt::Formatter<'_>, id: AtomId) -> fmt::Result {
        let atom = &self.atoms[id];
        write!(f, "{}", atom.kind)?;
        let hydrogens = atom.hydrogens();
        if hydrogens > 0 {
            write!(f, "H{}", hydrogens)?;
        }
        Ok(())
    }
}

/// Condensed formula walked depth-first from the root, e.g. `CH2(CH3)(CH3)`.
impl fmt::Display for Molecule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.atoms.is_empty() {
            return Ok(());
        }
        let mut visited = vec![false; self.atoms.len()];
        visited[self.root] = true;
        self.write_atom(f, self.root)?;
        let mut stack = vec![(self.atoms[self.root].bound().collect::<Vec<_>>(), 0)];
        while let Some((bound, next)) = stack.last_mut() {
            let neighbor = bound.get(*next).copied();
            *next += 1;
            match neighbor {
                None => {
                    stack.pop();
                    if !stack.is_empty() {
                        write!(f, ")")?;
                    }
                }
                Some(neighbor) if !visited[neighbor] => {
                    visited[neighbor] = true;
                    write!(f, "(")?;
                    self.write_atom(f, neighbor)?;
                    stack.push((self.atoms[neighbor].bound().collect(), 0));
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn kind() -> impl Strategy<Value = AtomKind> {
        prop_oneof![
            Just(AtomKind::Carbon),
            Just(AtomKind::Oxygen),
            Just(AtomKind::Nitrogen),
            Just(AtomKind::Sulfur),
        ]
    }

    fn bond() -> impl Strategy<Value = Bond> {
        prop_oneof![Just(Bond::Single), Just(Bond::Double), Just(Bond::Triple)]
    }

    proptest! {
        #[test]
        fn slots_account_for_valence(
            kinds in proptest::collection::vec(kind(), 2..8),
            ops in proptest::collection::vec((0usize..8, 0usize..8, bond(), any::<bool>()), 0..40),
        ) {
            let mut molecule = Molecule::default();
            for kind in &kinds {
                molecule.add_atom(*kind);
            }
            for (a, b, bond, unbind) in ops {
                let before = molecule.clone();
                if unbind {
                    let _ = molecule.unbind(a, b);
                } else if molecule.bind(a, b, bond).is_err() {
                    prop_assert_eq!(&molecule, &before);
                }
                for atom in molecule.atoms() {
                    prop_assert_eq!(atom.hydrogens() + atom.bound().count(), atom.kind().valence());
                    for neighbor in atom.neighbors() {
                        prop_assert_eq!(atom.bond_order_to(neighbor), molecule.bond_order(neighbor, atom.id()));
                    }
                }
            }
        }
    }
}
