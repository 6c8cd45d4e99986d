use tracing::*;

use crate::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    New,
    Open,
    Done,
}

/// Assembles a molecule atom by atom, for front ends that edit a graph
/// directly instead of writing the linear notation.
#[derive(Debug, Clone, Default)]
pub struct MoleculeBuilder {
    molecule: Molecule,
}

impl MoleculeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_atom(&mut self, kind: AtomKind) -> AtomId {
        self.molecule.add_atom(kind)
    }

    pub fn bind(&mut self, a: AtomId, b: AtomId, bond: Bond) -> Result<()> {
        self.molecule.bind(a, b, bond)
    }

    pub fn unbind(&mut self, a: AtomId, b: AtomId) -> Result<Option<Bond>> {
        self.molecule.unbind(a, b)
    }

    /// The graph built so far. Its root and ring data are not set yet.
    pub fn atoms(&self) -> &[Atom] {
        self.molecule.atoms()
    }

    /// The first carbon, which becomes the root of the built molecule.
    pub fn root(&self) -> Option<AtomId> {
        self.molecule.atoms().iter().find(|atom| atom.is_carbon()).map(Atom::id)
    }

    /// Check that the graph can be named: it has a carbon and every atom is
    /// reachable from the first one. Returns that root.
    pub fn check(&self) -> Result<AtomId> {
        let root = self.root().ok_or(NamingError::EmptyMolecule)?;
        self.molecule.check_reachable_from(root)?;
        Ok(root)
    }

    pub fn build(self) -> Result<Molecule> {
        let root = self.check()?;
        let mut molecule = self.molecule;
        molecule.root = root;

        molecule.cycle_boundaries = molecule.find_back_edges(root);
        debug!(
            "Built molecule of {} atoms rooted at {} with ring bonds {:?}",
            molecule.atom_count(),
            root,
            molecule.cycle_boundaries
        );
        Ok(molecule)
    }
}

impl Molecule {
    /// Depth-first search over carbons recording every bond that reaches
    /// back to an open ancestor, as (ancestor, descendant).
    fn find_back_edges(&self, root: AtomId) -> Vec<(AtomId, AtomId)> {
        let mut state = vec![Visit::New; self.atoms.len()];
        let mut boundaries = Vec::new();
        state[root] = Visit::Open;
        let mut stack = vec![(root, None, self.atoms[root].neighbors(), 0)];
        while let Some((id, parent, neighbors, next)) = stack.last_mut() {
            let neighbor = neighbors.get(*next).copied();
            *next += 1;
            let Some(neighbor) = neighbor else {
                state[*id] = Visit::Done;
                stack.pop();
                continue;
            };
            if Some(neighbor) == *parent || !self.atoms[neighbor].is_carbon() {
                continue;
            }
            let id = *id;
            match state[neighbor] {
                Visit::New => {
                    state[neighbor] = Visit::Open;
                    stack.push((neighbor, Some(id), self.atoms[neighbor].neighbors(), 0));
                }
                Visit::Open => boundaries.push((neighbor, id)),
                Visit::Done => {}
            }
        }
        boundaries
    }
}
