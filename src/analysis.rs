use tracing::*;

use crate::*;

/// Functional groups, declared from most to least senior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FunctionalGroup {
    CarboxylicAcid,
    SulfonicAcid,
    Aldehyde,
    Ketone,
    Hydroxyl,
    Thiol,
    Amine,
    Nitro,
}

impl FunctionalGroup {
    pub const ALL: [FunctionalGroup; 8] = [
        FunctionalGroup::CarboxylicAcid,
        FunctionalGroup::SulfonicAcid,
        FunctionalGroup::Aldehyde,
        FunctionalGroup::Ketone,
        FunctionalGroup::Hydroxyl,
        FunctionalGroup::Thiol,
        FunctionalGroup::Amine,
        FunctionalGroup::Nitro,
    ];

    /// Ending used when the group is the senior one of the parent chain.
    pub fn suffix(self) -> &'static str {
        match self {
            FunctionalGroup::CarboxylicAcid => "ova kyselina",
            FunctionalGroup::SulfonicAcid => "sulfonova kyselina",
            FunctionalGroup::Aldehyde => "al",
            FunctionalGroup::Ketone => "on",
            FunctionalGroup::Hydroxyl => "ol",
            FunctionalGroup::Thiol => "thiol",
            FunctionalGroup::Amine => "amin",
            FunctionalGroup::Nitro => "",
        }
    }

    pub fn prefix(self) -> &'static str {
        match self {
            FunctionalGroup::CarboxylicAcid => "karboxy",
            FunctionalGroup::SulfonicAcid => "sulfo",
            FunctionalGroup::Aldehyde | FunctionalGroup::Ketone => "oxo",
            FunctionalGroup::Hydroxyl => "hydroxy",
            FunctionalGroup::Thiol => "sulfanyl",
            FunctionalGroup::Amine => "amino",
            FunctionalGroup::Nitro => "nitro",
        }
    }

    /// Nitro groups are only ever written as a prefix.
    pub fn has_suffix(self) -> bool {
        self != FunctionalGroup::Nitro
    }
}

impl Molecule {
    /// Annotate the molecule with functional groups, multiple bonds and rings.
    ///
    /// Every index is rebuilt from scratch. On error the indices are left
    /// in an unspecified state.
    pub fn identify_structures(&mut self) -> Result<()> {
        self.clear_structures();
        if self.atoms.is_empty() {
            return Ok(());
        }

        self.classify()?;

        self.senior_group = FunctionalGroup::ALL
            .into_iter()
            .find(|group| !self.atoms_with_group(*group).is_empty());

        for (start, end) in self.cycle_boundaries.clone() {
            self.mark_cycle(start, end);
        }

        debug!(
            "Identified structures: senior group {:?}, groups {:?}, multiple bonds {:?}, rings {:?}",
            self.senior_group, self.groups, self.multiple_bond_atoms, self.cycles
        );
        Ok(())
    }

    fn clear_structures(&mut self) {
        for atom in self.atoms.iter_mut() {
            atom.clear_annotations();
        }
        self.groups.clear();
        self.senior_group = None;
        self.multiple_bond_atoms.clear();
        self.cycles.clear();
        self.longest_cycle = 0;
        self.longest_cycle_starts.clear();
    }

    /// Depth-first walk over the carbon skeleton from the root. An atom's
    /// carbon ligands are walked before its later ligands are classified,
    /// and its oxo ligands are resolved once all of them are done.
    fn classify(&mut self) -> Result<()> {
        let mut visited = vec![false; self.atoms.len()];
        visited[self.root] = true;
        let mut stack = vec![Scan::new(&self.atoms[self.root])];

        while let Some(scan) = stack.last_mut() {
            let ligand = scan.bound.get(scan.next).copied();
            scan.next += 1;
            let id = scan.id;
            let Some(ligand) = ligand else {
                let (hydrogens, has_oxo) = (scan.hydrogens, scan.has_oxo);
                stack.pop();
                if has_oxo {
                    self.resolve_oxo(id, hydrogens);
                }
                continue;
            };

            let kind = self.atoms[ligand].kind;
            if kind == AtomKind::Carbon {
                if scan.carbons.contains(&ligand) {
                    if !self.multiple_bond_atoms.contains(&id) {
                        self.multiple_bond_atoms.push(id);
                    }
                } else {
                    scan.carbons.push(ligand);
                }
                if !visited[ligand] {
                    visited[ligand] = true;
                    stack.push(Scan::new(&self.atoms[ligand]));
                }
                continue;
            }

            if scan.heteroatoms.contains(&ligand) {
                continue;
            }
            scan.heteroatoms.push(ligand);

            // ethers, thioethers and the like bridge two carbons
            if self.count_neighbors_of_kind(ligand, AtomKind::Carbon) > 1 {
                return Err(NamingError::InvalidLigandConfiguration { atom: id, element: kind });
            }
            let ligand_hydrogens = self.atoms[ligand].hydrogens();
            let terminal = self.atoms[ligand].neighbors().len() == 1;
            let oxygens = self.count_neighbors_of_kind(ligand, AtomKind::Oxygen);
            let group = match kind {
                AtomKind::Oxygen if ligand_hydrogens == 1 => Some(FunctionalGroup::Hydroxyl),
                AtomKind::Oxygen if ligand_hydrogens == 0 && terminal => {
                    scan.has_oxo = true;
                    None
                }
                AtomKind::Sulfur if ligand_hydrogens > 0 && oxygens == 0 => Some(FunctionalGroup::Thiol),
                AtomKind::Sulfur if oxygens == 3 => Some(FunctionalGroup::SulfonicAcid),
                AtomKind::Nitrogen if ligand_hydrogens == 2 => Some(FunctionalGroup::Amine),
                AtomKind::Nitrogen if oxygens == 2 => Some(FunctionalGroup::Nitro),
                _ => {
                    return Err(NamingError::InvalidLigandConfiguration { atom: id, element: kind });
                }
            };
            if let Some(group) = group {
                self.add_group(id, group);
            }
        }
        Ok(())
    }

    fn resolve_oxo(&mut self, id: AtomId, hydrogens: usize) {
        if self.atoms[id].group_count(FunctionalGroup::Hydroxyl) > 0 {
            self.remove_group(id, FunctionalGroup::Hydroxyl);
            self.add_group(id, FunctionalGroup::CarboxylicAcid);
        } else if hydrogens > 0 {
            self.add_group(id, FunctionalGroup::Aldehyde);
        } else {
            self.add_group(id, FunctionalGroup::Ketone);
        }
    }

    fn add_group(&mut self, id: AtomId, group: FunctionalGroup) {
        *self.atoms[id].groups.entry(group).or_insert(0) += 1;
        let atoms = self.groups.entry(group).or_default();
        if !atoms.contains(&id) {
            atoms.push(id);
        }
    }

    fn remove_group(&mut self, id: AtomId, group: FunctionalGroup) {
        let atom = &mut self.atoms[id];
        let Some(count) = atom.groups.get_mut(&group) else {
            return;
        };
        *count -= 1;
        if *count > 0 {
            return;
        }
        atom.groups.remove(&group);
        if let Some(atoms) = self.groups.get_mut(&group) {
            atoms.retain(|other| *other != id);
            if atoms.is_empty() {
                self.groups.remove(&group);
            }
        }
    }

    /// Mark the ring closed by the bond `start`-`end`.
    fn mark_cycle(&mut self, start: AtomId, end: AtomId) {
        let mut visited = vec![false; self.atoms.len()];
        visited[end] = true;
        let mut ring = vec![start];
        self.find_ring_path(start, end, &mut visited, &mut ring);
        ring.push(end);

        for id in &ring {
            self.atoms[*id].in_cycle = true;
        }
        trace!("Ring closed by {}-{}: {:?}", start, end, ring);

        if ring.len() > self.longest_cycle {
            self.longest_cycle = ring.len();
            self.longest_cycle_starts = vec![start];
        } else if ring.len() == self.longest_cycle && !self.longest_cycle_starts.contains(&start) {
            self.longest_cycle_starts.push(start);
        }
        self.cycles.push(ring);
    }

    /// Extend `path` from its first atom `start` along unvisited carbons
    /// until it reaches a neighbor of `end`.
    fn find_ring_path(&self, start: AtomId, end: AtomId, visited: &mut [bool], path: &mut Vec<AtomId>) -> bool {
        visited[start] = true;
        let mut stack = vec![(self.atoms[start].neighbors(), 0)];
        while let Some((ligands, next)) = stack.last_mut() {
            let ligand = ligands.get(*next).copied();
            *next += 1;
            let Some(ligand) = ligand else {
                stack.pop();
                if !stack.is_empty() {
                    path.pop();
                }
                continue;
            };
            if visited[ligand] || !self.atoms[ligand].is_carbon() {
                continue;
            }
            path.push(ligand);
            if self.atoms[ligand].is_bound_to(end) {
                return true;
            }
            visited[ligand] = true;
            stack.push((self.atoms[ligand].neighbors(), 0));
        }
        false
    }
}

/// Progress of the classification walk through one atom's ligands.
struct Scan {
    id: AtomId,
    hydrogens: usize,
    bound: Vec<AtomId>,
    next: usize,
    carbons: Vec<AtomId>,
    heteroatoms: Vec<AtomId>,
    has_oxo: bool,
}

impl Scan {
    fn new(atom: &Atom) -> Self {
        Self {
            id: atom.id,
            hydrogens: atom.hydrogens(),
            bound: atom.bound().collect(),
            next: 0,
            carbons: Vec::new(),
            heteroatoms: Vec::new(),
            has_oxo: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyzed(smiles: &str) -> Molecule {
        let mut molecule = parse_smiles(smiles).unwrap();
        molecule.identify_structures().unwrap();
        molecule
    }

    #[test]
    fn test_hydroxyl_and_carboxyl() {
        let molecule = analyzed("CO");
        assert_eq!(molecule.atoms_with_group(FunctionalGroup::Hydroxyl), &[0]);
        assert_eq!(molecule.senior_group(), Some(FunctionalGroup::Hydroxyl));

        let molecule = analyzed("C(=O)(O)");
        assert_eq!(molecule.atoms_with_group(FunctionalGroup::CarboxylicAcid), &[0]);
        assert!(molecule.atoms_with_group(FunctionalGroup::Hydroxyl).is_empty());
        assert_eq!(molecule.atom(0).unwrap().group_count(FunctionalGroup::Hydroxyl), 0);

        // oxo groups are resolved once the walk leaves the atom
        let molecule = analyzed("C(=O)(O)CC(=O)(O)");
        assert_eq!(molecule.atoms_with_group(FunctionalGroup::CarboxylicAcid), &[4, 0]);
    }

    #[test]
    fn test_oxo_resolution() {
        assert_eq!(analyzed("C=O").senior_group(), Some(FunctionalGroup::Aldehyde));
        assert_eq!(analyzed("CC(=O)C").atoms_with_group(FunctionalGroup::Ketone), &[1]);
    }

    #[test]
    fn test_heteroatom_groups() {
        assert_eq!(analyzed("CS").senior_group(), Some(FunctionalGroup::Thiol));
        assert_eq!(analyzed("CS(O)(O)(O)").senior_group(), Some(FunctionalGroup::SulfonicAcid));
        assert_eq!(analyzed("CS(=O)(=O)O").senior_group(), Some(FunctionalGroup::SulfonicAcid));
        assert_eq!(analyzed("CN").senior_group(), Some(FunctionalGroup::Amine));
        assert_eq!(analyzed("CN(O)(O)").senior_group(), Some(FunctionalGroup::Nitro));

        let molecule = analyzed("C(N)N(O)(O)");
        assert_eq!(molecule.senior_group(), Some(FunctionalGroup::Amine));
        assert_eq!(molecule.atom(0).unwrap().total_groups(), 2);
    }

    #[test]
    fn test_invalid_ligands() {
        let cases = vec![
            ("CNC", 0, AtomKind::Nitrogen),
            ("CS(O)C", 0, AtomKind::Sulfur),
            ("CN(O)", 0, AtomKind::Nitrogen),
            ("COC", 0, AtomKind::Oxygen),
            ("CCSC", 1, AtomKind::Sulfur),
            ("C(=O)OC", 0, AtomKind::Oxygen),
            ("CON", 0, AtomKind::Oxygen),
        ];
        for (smiles, atom, element) in cases {
            let mut molecule = parse_smiles(smiles).unwrap();
            assert_eq!(
                molecule.identify_structures(),
                Err(NamingError::InvalidLigandConfiguration { atom, element }),
                "{}",
                smiles
            );
        }
    }

    #[test]
    fn test_multiple_bond_atoms() {
        assert_eq!(analyzed("C=CC=CC=C").multiple_bond_atoms(), &[1, 3, 5, 4, 2, 0]);
        assert_eq!(analyzed("C#C").multiple_bond_atoms(), &[1, 0]);
        assert_eq!(analyzed("C=C(C(C)C)C=C").multiple_bond_atoms(), &[1, 6, 5, 0]);
        assert!(analyzed("CCC").multiple_bond_atoms().is_empty());
    }

    #[test]
    fn test_cycles() {
        let molecule = analyzed("C1CC1");
        assert_eq!(molecule.cycles(), &[vec![0, 1, 2]]);
        assert_eq!(molecule.longest_cycle_len(), 3);
        assert_eq!(molecule.longest_cycle_starts(), &[0]);
        assert!(molecule.atoms().iter().all(Atom::is_in_cycle));

        let molecule = analyzed("CC1C(O)CCCC1C");
        assert_eq!(molecule.longest_cycle_len(), 6);
        assert!(!molecule.atom(0).unwrap().is_in_cycle());
        assert!(!molecule.atom(8).unwrap().is_in_cycle());

        let molecule = analyzed("C1CC1CC1CCC1");
        assert_eq!(molecule.cycles().len(), 2);
        assert_eq!(molecule.longest_cycle_len(), 4);
        assert_eq!(molecule.longest_cycle_starts(), &[4]);
    }

    #[test]
    fn test_long_chain_and_ring() {
        let molecule = analyzed(&format!("C{}O", "C".repeat(20_000)));
        assert_eq!(molecule.atoms_with_group(FunctionalGroup::Hydroxyl), &[20_000]);

        let molecule = analyzed(&format!("C1{}C1", "C".repeat(20_000)));
        assert_eq!(molecule.longest_cycle_len(), 20_002);
        assert!(molecule.atoms().iter().all(Atom::is_in_cycle));
    }

    #[test]
    fn test_reanalysis_is_idempotent() {
        let mut molecule = analyzed("C(O)C(=O)(O)");
        let first = molecule.clone();
        molecule.identify_structures().unwrap();
        assert_eq!(molecule, first);
    }
}
