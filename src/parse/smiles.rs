use std::collections::BTreeMap;

use tracing::*;

use crate::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Frame {
    /// An open `(`; holds the bond written right after it.
    Branch(Option<Bond>),
    Atom(AtomId),
}

/// Decode a linear notation over `C O N S - = # ( )` and ring digits.
///
/// Atom ids are dense. An atom gets its id when it is bound to the atom
/// before it; the first atom of a branch is only bound, and numbered, once
/// its branch closes.
pub fn parse_smiles(smiles: &str) -> Result<Molecule> {
    let mut chars = smiles.chars().enumerate();
    let mut molecule = Molecule::default();
    match chars.next() {
        Some((_, 'C')) => {
            molecule.add_atom(AtomKind::Carbon);
        }
        Some((i, c)) if is_notation_symbol(c) => {
            return Err(format_error(i, "notation must start with a carbon atom"));
        }
        Some((i, c)) => {
            return Err(NamingError::InvalidCharacter { character: c, position: i });
        }
        None => return Err(format_error(0, "notation is empty")),
    }

    let mut ids: Vec<Option<AtomId>> = vec![Some(0)];
    let mut next_id = 1;
    let mut branch_stack = vec![Frame::Atom(0)];
    let mut bond_type: Option<Bond> = None;
    let mut ring_map: BTreeMap<u32, AtomId> = BTreeMap::new();
    let mut length = 1;

    for (i, c) in chars {
        length = i + 1;
        match c {
            '(' => branch_stack.push(Frame::Branch(None)),
            ')' => {
                if bond_type.is_some() {
                    return Err(format_error(i, "bond symbol before ')'"));
                }
                let mut branch = None;
                let bond = loop {
                    match branch_stack.pop() {
                        Some(Frame::Atom(atom)) => branch = Some(atom),
                        Some(Frame::Branch(bond)) => break bond,
                        None => return Err(format_error(i, "')' without a matching '('")),
                    }
                };
                let branch = branch.ok_or_else(|| format_error(i, "empty branch"))?;
                let Some(&Frame::Atom(parent)) = branch_stack.last() else {
                    return Err(format_error(i, "branch does not follow an atom"));
                };
                molecule.bind(parent, branch, bond.unwrap_or(Bond::Single))?;
                ids[branch] = Some(next_id);
                next_id += 1;
            }
            '-' | '=' | '#' => bond_type = Bond::from_symbol(c),
            '0'..='9' => {
                let ring_number = c.to_digit(10).unwrap_or_default();
                let Some(&Frame::Atom(current)) = branch_stack.last() else {
                    return Err(format_error(i, "ring closure without an atom"));
                };
                if let Some(start) = ring_map.remove(&ring_number) {
                    if start == current {
                        return Err(format_error(i, "ring closes on the atom that opened it"));
                    }
                    molecule.bind(start, current, bond_type.take().unwrap_or(Bond::Single))?;
                    molecule.cycle_boundaries.push((start, current));
                } else {
                    ring_map.insert(ring_number, current);
                }
            }
            _ => {
                let kind = AtomKind::from_symbol(c)
                    .ok_or(NamingError::InvalidCharacter { character: c, position: i })?;
                let atom = molecule.add_atom(kind);
                ids.push(None);
                match branch_stack.last_mut() {
                    Some(Frame::Atom(parent)) => {
                        let parent = *parent;
                        molecule.bind(parent, atom, bond_type.take().unwrap_or(Bond::Single))?;
                        ids[atom] = Some(next_id);
                        next_id += 1;
                    }
                    Some(Frame::Branch(bond)) => *bond = bond_type.take(),
                    None => return Err(format_error(i, "atom outside the molecule")),
                }
                branch_stack.push(Frame::Atom(atom));
            }
        }
    }

    if branch_stack.iter().any(|frame| matches!(frame, Frame::Branch(_))) {
        return Err(format_error(length, "unclosed '('"));
    }
    if !ring_map.is_empty() {
        return Err(format_error(length, "unclosed ring"));
    }
    if bond_type.is_some() {
        return Err(format_error(length, "dangling bond symbol"));
    }

    let ids: Vec<AtomId> = ids
        .into_iter()
        .collect::<Option<_>>()
        .ok_or_else(|| format_error(length, "atom left unbound"))?;
    molecule.renumber(&ids);
    debug!(
        "Decoded {} into {} atoms with ring bonds {:?}",
        smiles,
        molecule.atom_count(),
        molecule.cycle_boundaries()
    );
    Ok(molecule)
}

fn is_notation_symbol(c: char) -> bool {
    AtomKind::from_symbol(c).is_some() || Bond::from_symbol(c).is_some() || c.is_ascii_digit() || c == '(' || c == ')'
}

fn format_error(position: usize, reason: &'static str) -> NamingError {
    NamingError::InvalidFormat { position, reason }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_condensed_forms() {
        let cases = vec![
            ("C", "CH4"),
            ("C(C)C", "CH2(CH3)(CH3)"),
            ("C=C", "CH2(CH2)"),
            ("C#C", "CH1(CH1)"),
            ("CC#CC=C", "CH3(C(C(CH1(CH2))))"),
            ("C=O", "CH2(O)"),
            ("CO", "CH3(OH1)"),
            ("CN", "CH3(NH2)"),
            ("C(=O)(O)", "CH1(O)(OH1)"),
            ("CC(=O)(O)", "CH3(C(O)(OH1))"),
            ("C(=O)(O)CC(=O)(O)", "C(O)(OH1)(CH2(C(O)(OH1)))"),
        ];
        for (smiles, expected) in cases {
            let molecule = parse_smiles(smiles).unwrap();
            assert_eq!(molecule.to_string(), expected, "{}", smiles);
        }
    }

    #[test]
    fn test_branch_head_is_numbered_when_branch_closes() {
        let molecule = parse_smiles("CC(C(C)CC)CCCCCC").unwrap();
        assert_eq!(molecule.atom_count(), 12);
        // the branch head C(...) is bound to atom 1 only at ')'
        assert!(molecule.atom(5).unwrap().is_bound_to(1));
        assert!(molecule.atom(5).unwrap().is_bound_to(2));
        assert!(molecule.atom(5).unwrap().is_bound_to(3));
        assert!(molecule.atom(4).unwrap().is_bound_to(3));
        assert!(molecule.atom(6).unwrap().is_bound_to(1));
    }

    #[test]
    fn test_ring_closure() {
        let molecule = parse_smiles("C1CC1").unwrap();
        assert_eq!(molecule.cycle_boundaries(), &[(0, 2)]);
        assert!(molecule.atom(0).unwrap().is_bound_to(2));

        let molecule = parse_smiles("C1(O)C=CC(O)C1").unwrap();
        assert_eq!(molecule.cycle_boundaries(), &[(0, 6)]);

        let molecule = parse_smiles("C1CC=1").unwrap();
        assert_eq!(molecule.bond_order(0, 2), 2);
        assert_eq!(molecule.bond_order(0, 1), 1);
    }

    #[test]
    fn test_branch_bond_applies_to_the_branch() {
        let molecule = parse_smiles("C(=CC)C").unwrap();
        // C0=C2, C2-C1
        assert_eq!(molecule.bond_order(0, 2), 2);
        assert_eq!(molecule.bond_order(2, 1), 1);
    }

    #[test]
    fn test_invalid_characters() {
        assert_eq!(
            parse_smiles("X"),
            Err(NamingError::InvalidCharacter { character: 'X', position: 0 })
        );
        assert_eq!(
            parse_smiles("CCx"),
            Err(NamingError::InvalidCharacter { character: 'x', position: 2 })
        );
    }

    #[test]
    fn test_invalid_formats() {
        let cases = vec!["", "O", "(C)", "C)", "C()", "C((C))", "C(C", "C1CC", "CC=", "C(C=)", "C11"];
        for smiles in cases {
            assert!(
                matches!(parse_smiles(smiles), Err(NamingError::InvalidFormat { .. })),
                "{:?}",
                smiles
            );
        }
    }

    #[test]
    fn test_ligancy_exceeded() {
        assert_eq!(
            parse_smiles("C(C)(C)(C)(C)C"),
            Err(NamingError::LigancyExceeded { atom: 0, kind: AtomKind::Carbon })
        );
        assert!(matches!(
            parse_smiles("CO(C)C"),
            Err(NamingError::LigancyExceeded { kind: AtomKind::Oxygen, .. })
        ));
    }
}
