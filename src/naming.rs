use std::cmp::Reverse;
use std::collections::BTreeMap;

use tracing::*;

use crate::*;

const STEMS: [&str; 100] = [
    "meth", "eth", "prop", "but", "pent", "hex", "hept", "okt", "non", "dek",
    "undek", "dodek", "tridek", "tetradek", "pentadek", "hexadek", "heptadek",
    "oktadek", "nonadek", "eikos", "heneikos", "dokos", "trikos", "tetrakos",
    "pentakos", "hexakos", "heptakos", "oktakos", "nonakos", "triakonta",
    "hentriakonta", "dotriakonta", "tritriakonta", "tetratriakonta", "pentatriakonta",
    "hexatriakonta", "heptatriakonta", "oktatriakonta", "nonatriakonta", "tetraconta",
    "hentetraconta", "dotetraconta", "tritetraconta", "tetratetraconta", "pentatetraconta",
    "hexatetraconta", "heptatetraconta", "oktatetraconta", "nonatetraconta", "pentaconta",
    "henpentaconta", "dopentaconta", "tripentaconta", "tetrapentaconta", "pentapentaconta",
    "hexapentaconta", "heptapentaconta", "oktapentaconta", "nonapentaconta", "hexaconta",
    "henhexaconta", "dohexaconta", "trihexaconta", "tetrahexaconta", "pentahexaconta",
    "hexahexaconta", "heptahexaconta", "oktahexaconta", "nonahexaconta", "heptaconta",
    "henheptaconta", "doheptaconta", "triheptaconta", "tetraheptaconta", "pentaheptaconta",
    "hexaheptaconta", "heptaheptaconta", "oktaheptaconta", "nonaheptaconta", "oktaconta",
    "henoctaconta", "dooctaconta", "trioctaconta", "tetraoctaconta", "pentaoctaconta",
    "hexaoctaconta", "heptaoctaconta", "oktaoctaconta", "nonaoctaconta", "enneaconta",
    "henenneaconta", "donenneaconta", "trienneaconta", "tetraenneaconta", "pentaenneaconta",
    "hexaenneaconta", "heptaenneaconta", "oktaenneaconta", "nonaenneaconta", "hekt",
];

fn multiplier(count: usize) -> &'static str {
    match count {
        2 => "di",
        3 => "tri",
        4 => "tetra",
        5 => "penta",
        6 => "hexa",
        7 => "hepta",
        8 => "okta",
        9 => "nona",
        10 => "deka",
        _ => "",
    }
}

fn stem(len: usize) -> Result<&'static str> {
    len.checked_sub(1)
        .and_then(|index| STEMS.get(index))
        .copied()
        .ok_or(NamingError::ChainTooLong(len))
}

/// `[3, 3]` becomes `3,3-di`.
fn locant_list(locants: &[usize]) -> String {
    let joined = locants.iter().map(|l| l.to_string()).collect::<Vec<_>>().join(",");
    format!("{}-{}", joined, multiplier(locants.len()))
}

/// Name a molecule given in the linear notation.
pub fn iupac_name(smiles: &str) -> Result<String> {
    parse_smiles(smiles)?.to_iupac()
}

impl Molecule {
    /// Systematic name of the molecule.
    pub fn to_iupac(&self) -> Result<String> {
        self.check_connectivity()?;
        let mut molecule = self.clone();
        molecule.identify_structures()?;
        let name = name_chain(&molecule, true)?;
        info!("Named {} as {}", self, name);
        Ok(name)
    }
}

/// A name together with what ranks it against the names of other chains
/// and numberings that the selection rules leave tied. Fields compare in
/// order: more side chains, lower locants, then the name itself.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
struct Ranked {
    side_chains: Reverse<usize>,
    senior: Vec<usize>,
    bonds: Vec<usize>,
    prefixes: Vec<usize>,
    name: String,
}

fn name_chain(molecule: &Molecule, is_main: bool) -> Result<String> {
    let mut best: Option<Ranked> = None;
    let mut failure = None;
    for mut chain in Chain::candidates(molecule) {
        chain.is_main = is_main;
        let mut numberings = Vec::with_capacity(2);
        if is_main && !chain.choose_direction(molecule) {
            numberings.push(chain.reversed());
        }
        numberings.push(chain);

        for chain in &numberings {
            match name_numbering(molecule, chain) {
                Ok(ranked) => {
                    if best.as_ref().map_or(true, |best| ranked < *best) {
                        best = Some(ranked);
                    }
                }
                Err(err) => {
                    failure.get_or_insert(err);
                }
            }
        }
    }
    match (best, failure) {
        (Some(best), _) => Ok(best.name),
        (None, Some(err)) => Err(err),
        (None, None) => Err(NamingError::EmptyMolecule),
    }
}

fn name_numbering(molecule: &Molecule, chain: &Chain) -> Result<Ranked> {
    let stem = stem(chain.len())?;
    let locants = Locants::scan(molecule, chain);
    let side_chains = name_side_chains(molecule, chain, &locants.side_chain_roots)?;
    let name = locants.assemble(molecule, chain, stem, &side_chains);

    let mut bonds = [locants.double_bonds.as_slice(), locants.triple_bonds.as_slice()].concat();
    bonds.sort_unstable();
    let mut prefixes: Vec<usize> = locants
        .prefixes
        .values()
        .flatten()
        .copied()
        .chain(locants.side_chain_roots.iter().map(|(locant, _)| *locant))
        .collect();
    prefixes.sort_unstable();
    Ok(Ranked {
        side_chains: Reverse(locants.side_chain_roots.len()),
        senior: locants.senior,
        bonds,
        prefixes,
        name,
    })
}

/// Positions of everything that ends up in the name, numbered from 1.
#[derive(Debug, Default)]
struct Locants {
    senior: Vec<usize>,
    prefixes: BTreeMap<&'static str, Vec<usize>>,
    double_bonds: Vec<usize>,
    triple_bonds: Vec<usize>,
    side_chain_roots: Vec<(usize, AtomId)>,
}

impl Locants {
    fn scan(molecule: &Molecule, chain: &Chain) -> Self {
        let mut locants = Locants::default();
        let mut in_chain = vec![false; molecule.atom_count()];
        for id in &chain.atoms {
            in_chain[*id] = true;
        }
        let senior = molecule.senior_group.filter(|group| group.has_suffix());
        let len = chain.len();

        for (i, id) in chain.atoms.iter().enumerate() {
            let atom = &molecule.atoms[*id];
            for (group, count) in atom.functional_groups() {
                let target = if Some(*group) == senior {
                    &mut locants.senior
                } else {
                    locants.prefixes.entry(group.prefix()).or_default()
                };
                target.extend(std::iter::repeat(i + 1).take(*count));
            }

            // the bond closing a ring runs between locants 1 and len
            let bond = if i + 1 < len {
                Some((i + 1, chain.atoms[i + 1]))
            } else if chain.is_cycle && len > 2 {
                Some((1, chain.atoms[0]))
            } else {
                None
            };
            if let Some((locant, next)) = bond {
                match molecule.bond_order(*id, next) {
                    2 => locants.double_bonds.push(locant),
                    3 => locants.triple_bonds.push(locant),
                    _ => {}
                }
            }

            for neighbor in atom.neighbors() {
                if molecule.atoms[neighbor].is_carbon() && !in_chain[neighbor] {
                    locants.side_chain_roots.push((i + 1, neighbor));
                }
            }
        }

        locants.senior.sort_unstable();
        locants.double_bonds.sort_unstable();
        locants.triple_bonds.sort_unstable();
        for positions in locants.prefixes.values_mut() {
            positions.sort_unstable();
        }
        locants
    }

    fn assemble(&self, molecule: &Molecule, chain: &Chain, stem: &str, side_chains: &BTreeMap<String, Vec<usize>>) -> String {
        let mut name = String::from(stem);
        if chain.is_main && self.double_bonds.is_empty() && self.triple_bonds.is_empty() {
            name.push_str("an");
        }
        if !self.double_bonds.is_empty() {
            name.push_str(&format!("-{}en", locant_list(&self.double_bonds)));
        }
        if !self.triple_bonds.is_empty() {
            name.push_str(&format!("-{}yn", locant_list(&self.triple_bonds)));
        }
        if !chain.is_main {
            name.push_str("yl");
        }
        if chain.is_cycle {
            name.insert_str(0, "cyklo");
        }

        let mut prefixes = String::new();
        for (prefix, positions) in &self.prefixes {
            prefixes.push_str(&format!("{}{}-", locant_list(positions), prefix));
        }
        for (side_chain, positions) in side_chains {
            prefixes.push_str(&format!("{}{}-", locant_list(positions), side_chain));
        }
        name.insert_str(0, &prefixes);

        if let Some(group) = molecule.senior_group {
            if !self.senior.is_empty() {
                name.push_str(&format!("-{}{}", locant_list(&self.senior), group.suffix()));
            }
        }

        if !chain.is_main {
            name = format!("({})", name);
        }
        trace!("Assembled {}", name);
        name
    }
}

/// Name every side chain on its own detached copy and merge identical names.
fn name_side_chains(molecule: &Molecule, chain: &Chain, roots: &[(usize, AtomId)]) -> Result<BTreeMap<String, Vec<usize>>> {
    let name_one = |&(locant, root): &(usize, AtomId)| -> Result<(usize, String)> {
        let anchor = chain.atoms[locant - 1];
        if molecule.bond_order(root, anchor) > 1 {
            return Err(NamingError::MultipleBondToSideChain { atom: root, anchor });
        }
        let mut branch = molecule.detach(root, anchor);
        branch.identify_structures()?;
        Ok((locant, name_chain(&branch, false)?))
    };

    #[cfg(feature = "parallel")]
    let named: Vec<(usize, String)> = {
        use rayon::prelude::*;
        roots.par_iter().map(name_one).collect::<Result<_>>()?
    };
    #[cfg(not(feature = "parallel"))]
    let named: Vec<(usize, String)> = roots.iter().map(name_one).collect::<Result<_>>()?;

    let mut merged: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (locant, name) in named {
        merged.entry(name).or_default().push(locant);
    }
    for positions in merged.values_mut() {
        positions.sort_unstable();
    }
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Test 1: Methane – a single carbon atom.
    #[test]
    fn test_methane() {
        assert_eq!(iupac_name("C").unwrap(), "methan");
    }

    // Test 2: Hexane – an unbranched six-carbon chain.
    #[test]
    fn test_hexane() {
        assert_eq!(iupac_name("CCCCCC").unwrap(), "hexan");
    }

    // Test 3: 3-Ethylhexane – the side chain sits on the third carbon.
    #[test]
    fn test_3_ethyl_hexane() {
        assert_eq!(iupac_name("CCC(CC)CCC").unwrap(), "3-(ethyl)-hexan");
    }

    #[test]
    fn test_locant_list() {
        assert_eq!(locant_list(&[1]), "1-");
        assert_eq!(locant_list(&[1, 2, 8]), "1,2,8-tri");
        assert_eq!(locant_list(&[1; 11]), "1,1,1,1,1,1,1,1,1,1,1-");
    }

    #[test]
    fn test_smiles_to_name() {
        // A list of tuples: (SMILES string, expected name)
        let smiles_and_correct_names = vec![
            ("C", "methan"),
            ("CCCCCC", "hexan"),
            ("CCC(CC)CCC", "3-(ethyl)-hexan"),
            ("CCC(CC)(CC)CCC", "3,3-di(ethyl)-hexan"),
            ("CCC(CC)(C)CCC", "3-(ethyl)-3-(methyl)-hexan"),
            // Unsaturated chains:
            ("C=C", "eth-1-en"),
            ("C#C", "eth-1-yn"),
            ("C=C=C", "prop-1,2-dien"),
            ("C=CC=C", "but-1,3-dien"),
            ("C=CC#C", "but-1-en-3-yn"),
            ("C=C=CC#CC#CC=C", "non-1,2,8-trien-4,6-diyn"),
            ("CCC(CC=C)C", "4-(methyl)-hex-1-en"),
            ("CCC(CC=C)CCC", "4-(ethyl)-hept-1-en"),
            ("CCC(CC=C)(CC=C)CCC", "4-(ethyl)-4-(propyl)-hept-1,6-dien"),
            // Heteroatom groups:
            ("CS", "methan-1-thiol"),
            ("CS(O)(O)(O)", "methan-1-sulfonova kyselina"),
            ("CN(O)(O)", "1-nitro-methan"),
            ("CN", "methan-1-amin"),
            ("C(N)N(O)(O)", "1-nitro-methan-1-amin"),
            // Oxygen groups:
            ("C=O", "methan-1-al"),
            ("CC(=O)C", "propan-2-on"),
            ("C(=O)(O)", "methan-1-ova kyselina"),
            ("C(O)C(=O)", "2-hydroxy-ethan-1-al"),
            ("C(O)C(O)", "ethan-1,2-diol"),
            ("C(O)C(=O)(O)", "2-hydroxy-ethan-1-ova kyselina"),
            ("CCC(CC(O)(=O))(CC)CCC", "3,3-di(ethyl)-hexan-1-ova kyselina"),
            // Rings:
            ("C1CC1", "cyklopropan"),
            ("C1C(O)C(O)C1", "cyklobutan-1,4-diol"),
            ("C1(O)C=CC(O)C1", "cyklopent-3-en-2,5-diol"),
            ("C1(O)C=CC(CCCO)CC(O)C1", "4-(propyl-3-ol)-cyklohept-5-en-2,7-diol"),
        ];
        for (smiles, expected) in smiles_and_correct_names {
            let name = iupac_name(smiles).unwrap();
            assert_eq!(name, expected, "{}", smiles);
        }
    }

    #[test]
    fn test_ring_side_chain() {
        assert_eq!(iupac_name("C(O)C1CC1").unwrap(), "1-(cyklopropyl)-methan-1-ol");
    }

    #[test]
    fn test_geminal_groups_repeat_locant() {
        assert_eq!(iupac_name("CC(O)(O)").unwrap(), "ethan-1,1-diol");
    }

    #[test]
    fn test_branch_order_does_not_matter() {
        let cases = vec![
            ("CCC(CC)(C)CCC", "CCC(C)(CC)CCC", "3-(ethyl)-3-(methyl)-hexan"),
            ("CC(C)C(C)CC", "CCC(C)C(C)C", "2,3-di(methyl)-pentan"),
            ("C(CC)(C)C(C)C", "C(C)(C(C)C)CC", "2,3-di(methyl)-pentan"),
            ("C(C(C(C)C)CC)C(C)(C)C", "CC(C)(C)CC(CC)C(C)C", "4-(ethyl)-2,2,5-tri(methyl)-hexan"),
        ];
        for (first, second, expected) in cases {
            assert_eq!(iupac_name(first).unwrap(), expected, "{}", first);
            assert_eq!(iupac_name(second).unwrap(), expected, "{}", second);
        }
    }

    #[test]
    fn test_most_substituted_chain_wins() {
        // every longest chain of 2,2,4-trimethylpentane carries three methyls
        assert_eq!(iupac_name("CC(C)(C)CC(C)C").unwrap(), "2,2,4-tri(methyl)-pentan");
        assert_eq!(iupac_name("C(C)(C)CC(C)(C)C").unwrap(), "2,2,4-tri(methyl)-pentan");
    }

    #[test]
    fn test_errors_propagate() {
        assert_eq!(
            iupac_name("X"),
            Err(NamingError::InvalidCharacter { character: 'X', position: 0 })
        );
        assert_eq!(
            iupac_name("CNC"),
            Err(NamingError::InvalidLigandConfiguration { atom: 0, element: AtomKind::Nitrogen })
        );
        assert_eq!(
            iupac_name("COC"),
            Err(NamingError::InvalidLigandConfiguration { atom: 0, element: AtomKind::Oxygen })
        );
    }

    #[test]
    fn test_multiple_bond_to_side_chain() {
        assert_eq!(
            iupac_name("C=C1CC1"),
            Err(NamingError::MultipleBondToSideChain { atom: 0, anchor: 1 })
        );
    }

    #[test]
    fn test_chain_too_long() {
        let smiles = "C".repeat(101);
        assert_eq!(iupac_name(&smiles), Err(NamingError::ChainTooLong(101)));
        assert!(iupac_name(&"C".repeat(100)).unwrap().starts_with("hekt"));

        let smiles = "C".repeat(10_000);
        assert_eq!(iupac_name(&smiles), Err(NamingError::ChainTooLong(10_000)));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    /// Random carbon skeletons as adjacency lists, no atom with more than
    /// four neighbors.
    fn alkane_tree() -> impl Strategy<Value = Vec<Vec<usize>>> {
        proptest::collection::vec(any::<usize>(), 0..12).prop_map(|choices| {
            let mut adjacency: Vec<Vec<usize>> = vec![Vec::new()];
            for choice in choices {
                let open: Vec<usize> = (0..adjacency.len()).filter(|id| adjacency[*id].len() < 4).collect();
                let parent = open[choice % open.len()];
                let child = adjacency.len();
                adjacency.push(vec![parent]);
                adjacency[parent].push(child);
            }
            adjacency
        })
    }

    /// Write the tree rooted at `atom`, branches in adjacency order or reversed.
    fn write_tree(adjacency: &[Vec<usize>], atom: usize, parent: Option<usize>, flip: bool, out: &mut String) {
        out.push('C');
        let mut children: Vec<usize> = adjacency[atom].iter().copied().filter(|n| Some(*n) != parent).collect();
        if flip {
            children.reverse();
        }
        if let Some((last, rest)) = children.split_last() {
            for child in rest {
                out.push('(');
                write_tree(adjacency, *child, Some(atom), flip, out);
                out.push(')');
            }
            write_tree(adjacency, *last, Some(atom), flip, out);
        }
    }

    proptest! {
        #[test]
        fn straight_chains_use_the_stem_table(n in 1usize..=100) {
            let name = iupac_name(&"C".repeat(n)).unwrap();
            prop_assert_eq!(name, format!("{}an", STEMS[n - 1]));
        }

        #[test]
        fn branched_alkanes_are_named(branches in proptest::collection::vec(1usize..4, 0..4)) {
            let mut smiles = String::from("CCCCCC");
            for length in &branches {
                smiles.push('(');
                smiles.push_str(&"C".repeat(*length));
                smiles.push(')');
                smiles.push('C');
            }
            let name = iupac_name(&smiles);
            prop_assert!(name.is_ok(), "{}: {:?}", smiles, name);
        }

        #[test]
        fn alkane_names_ignore_atom_order(adjacency in alkane_tree(), flip_first in any::<bool>()) {
            let mut first = String::new();
            write_tree(&adjacency, 0, None, flip_first, &mut first);
            let mut second = String::new();
            write_tree(&adjacency, adjacency.len() - 1, None, !flip_first, &mut second);

            let name = iupac_name(&first);
            prop_assert!(name.is_ok(), "{}: {:?}", first, name);
            prop_assert_eq!(name, iupac_name(&second), "{} vs {}", first, second);
        }
    }
}
