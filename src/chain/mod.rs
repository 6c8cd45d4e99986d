use std::collections::VecDeque;

use tracing::*;

use crate::*;

mod filter;
use filter::Filter;

pub type Path = Vec<AtomId>;

/// An ordered run of carbon atoms: a candidate or the chosen parent chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chain {
    pub atoms: Vec<AtomId>,
    pub is_main: bool,
    pub is_cycle: bool,
}

impl Chain {
    /// Pick the parent chain of a molecule that has been through
    /// [`Molecule::identify_structures`]: the first of [`Chain::candidates`].
    pub fn select(molecule: &Molecule) -> Chain {
        let mut chains = Self::candidates(molecule);
        chains.swap_remove(0)
    }

    /// Every chain that survives the selection criteria, in discovery order.
    /// Never empty.
    pub fn candidates(molecule: &Molecule) -> Vec<Chain> {
        let candidates = find_candidates(molecule);
        debug!(
            "Candidates: cyclic {:?}, linear {:?}, partial {:?}",
            candidates.cyclic, candidates.linear, candidates.partial
        );
        let (paths, is_cycle) = Filter::new(molecule, candidates).reduce();
        debug!("Selected {} chains {:?}", if is_cycle { "cyclic" } else { "linear" }, paths);
        paths
            .into_iter()
            .map(|atoms| Chain {
                atoms,
                is_main: false,
                is_cycle,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    /// Keep or flip the numbering direction by comparing locant weights.
    ///
    /// Forward weight counts two per functional group plus the position of
    /// every multiple bond to the next atom; reversed weight counts the
    /// mirrored position of every interior multiple bond to the previous atom.
    /// Returns false when the weights tie and the direction is left as is.
    pub fn choose_direction(&mut self, molecule: &Molecule) -> bool {
        let len = self.atoms.len();
        let mut forward = 0;
        let mut reversed = 0;
        for (i, id) in self.atoms.iter().enumerate() {
            forward += 2 * molecule.atoms[*id].total_groups();
            if i + 1 < len && molecule.bond_order(*id, self.atoms[i + 1]) > 1 {
                forward += i + 1;
            }
            if i > 0 && i + 1 < len && molecule.bond_order(*id, self.atoms[i - 1]) > 1 {
                reversed += len - (i + 1);
            }
        }
        trace!("Direction weights: forward {}, reversed {}", forward, reversed);
        if reversed < forward {
            self.atoms.reverse();
        }
        reversed != forward
    }

    /// The same chain numbered from the other end.
    pub fn reversed(&self) -> Chain {
        let mut chain = self.clone();
        chain.atoms.reverse();
        chain
    }
}

/// Candidate paths, pooled by shape. Partial paths all end at the branch
/// node they are keyed by.
#[derive(Debug, Clone, Default)]
pub(crate) struct Candidates {
    pub cyclic: Vec<Path>,
    pub linear: Vec<Path>,
    pub partial: Vec<(AtomId, Vec<Path>)>,
}

fn find_candidates(molecule: &Molecule) -> Candidates {
    let mut candidates = Candidates::default();
    let (mut seeds, consume) = seeds(molecule);
    trace!("Chain seeds {:?}", seeds);

    while let Some(&start) = seeds.first() {
        let consumed: Vec<Path> = if molecule.atoms[start].in_cycle {
            let ring = ring_path(molecule, start);
            candidates.cyclic.push(ring.clone());
            vec![ring]
        } else if is_leaf(molecule, start) {
            let paths = leaf_paths(molecule, start);
            candidates.linear.extend(paths.iter().cloned());
            paths
        } else {
            let paths = branch_paths(molecule, start);
            candidates.partial.push((start, paths.clone()));
            paths
        };
        seeds.retain(|seed| *seed != start && !(consume && consumed.iter().any(|path| path.contains(seed))));
    }
    candidates
}

/// Atoms the chain search starts from, by the first rule that yields any,
/// and whether atoms on a found path stop being seeds.
///
/// A plain hydrocarbon tree seeds from every end of a longest path, so
/// each of those paths is found whatever atom the molecule is rooted at.
fn seeds(molecule: &Molecule) -> (Vec<AtomId>, bool) {
    if let Some(group) = molecule.senior_group {
        let atoms = molecule.atoms_with_group(group);
        if !atoms.is_empty() {
            return (atoms.to_vec(), true);
        }
    }
    if !molecule.longest_cycle_starts.is_empty() {
        return (molecule.longest_cycle_starts.clone(), true);
    }
    if !molecule.multiple_bond_atoms.is_empty() {
        return (molecule.multiple_bond_atoms.clone(), true);
    }

    let n = molecule.atom_count();
    let from_root = breadth_first(molecule, molecule.root, &mut vec![false; n]);
    let Some(&first) = from_root.farthest.first() else {
        return (vec![molecule.root], true);
    };
    let from_first = breadth_first(molecule, first, &mut vec![false; n]);
    let Some(&second) = from_first.farthest.first() else {
        return (from_root.farthest, true);
    };
    let from_second = breadth_first(molecule, second, &mut vec![false; n]);

    // in a tree the atom farthest from any other is an end of every longest path
    let diameter = from_first.distance[second];
    let mut ends = from_root.farthest;
    for id in 0..n {
        if from_first.distance[id].max(from_second.distance[id]) == diameter && !ends.contains(&id) {
            ends.push(id);
        }
    }
    (ends, false)
}

fn is_open_carbon(molecule: &Molecule, id: AtomId) -> bool {
    let atom = &molecule.atoms[id];
    atom.is_carbon() && !atom.in_cycle
}

fn is_leaf(molecule: &Molecule, id: AtomId) -> bool {
    molecule.atoms[id]
        .neighbors()
        .into_iter()
        .filter(|n| is_open_carbon(molecule, *n))
        .count()
        <= 1
}

struct Reach {
    distance: Vec<Option<usize>>,
    farthest: Vec<AtomId>,
}

/// Breadth-first search over non-ring carbons, skipping atoms already in `visited`.
fn breadth_first(molecule: &Molecule, start: AtomId, visited: &mut [bool]) -> Reach {
    let mut distance = vec![None; molecule.atom_count()];
    let mut farthest = Vec::new();
    let mut max = 0;

    distance[start] = Some(0);
    visited[start] = true;
    let mut queue = VecDeque::from([(start, 0)]);
    while let Some((current, d)) = queue.pop_front() {
        for neighbor in molecule.atoms[current].neighbors() {
            if visited[neighbor] || !is_open_carbon(molecule, neighbor) {
                continue;
            }
            visited[neighbor] = true;
            distance[neighbor] = Some(d + 1);
            queue.push_back((neighbor, d + 1));
            if d + 1 > max {
                max = d + 1;
                farthest.clear();
            }
            if d + 1 == max {
                farthest.push(neighbor);
            }
        }
    }
    Reach { distance, farthest }
}

/// Walk from `end` back to `start` along strictly decreasing distances,
/// never stepping on a claimed atom. The result runs `end ..= start`.
fn trace_back(molecule: &Molecule, end: AtomId, start: AtomId, distance: &[Option<usize>], claimed: &mut [bool]) -> Option<Path> {
    let mut path = vec![end];
    let mut current = end;
    while current != start {
        let d = distance[current]?.checked_sub(1)?;
        let next = molecule.atoms[current]
            .neighbors()
            .into_iter()
            .find(|n| !claimed[*n] && distance[*n] == Some(d))?;
        claimed[next] = true;
        path.push(next);
        current = next;
    }
    Some(path)
}

fn leaf_paths(molecule: &Molecule, start: AtomId) -> Vec<Path> {
    let n = molecule.atom_count();
    let reach = breadth_first(molecule, start, &mut vec![false; n]);
    if reach.farthest.is_empty() {
        return vec![vec![start]];
    }
    reach
        .farthest
        .iter()
        .filter_map(|end| {
            let mut claimed = vec![false; n];
            claimed[*end] = true;
            trace_back(molecule, *end, start, &reach.distance, &mut claimed)
        })
        .collect()
}

/// Partial paths from a branch node, pairwise disjoint except for the node.
fn branch_paths(molecule: &Molecule, start: AtomId) -> Vec<Path> {
    let n = molecule.atom_count();
    let mut claimed = vec![false; n];
    let mut paths = directions(molecule, start, vec![false; n], &mut claimed);

    if paths.len() == 1 {
        let mut visited = vec![false; n];
        for atom in &paths[0] {
            visited[*atom] = true;
        }
        visited[start] = false;
        let mut claimed = visited.clone();
        paths.extend(directions(molecule, start, visited, &mut claimed));
    }
    paths
}

fn directions(molecule: &Molecule, start: AtomId, mut visited: Vec<bool>, claimed: &mut [bool]) -> Vec<Path> {
    let reach = breadth_first(molecule, start, &mut visited);
    if reach.farthest.is_empty() {
        return vec![vec![start]];
    }
    let mut paths = Vec::new();
    for end in &reach.farthest {
        claimed[start] = false;
        claimed[*end] = true;
        if let Some(path) = trace_back(molecule, *end, start, &reach.distance, claimed) {
            paths.push(path);
        }
    }
    paths
}

/// The ring through `start`, walked neighbor by neighbor from it.
fn ring_path(molecule: &Molecule, start: AtomId) -> Path {
    let mut member = vec![false; molecule.atom_count()];
    let mut best: Option<&Vec<AtomId>> = None;
    for ring in molecule.cycles.iter().filter(|ring| ring.contains(&start)) {
        if best.map_or(true, |best| ring.len() > best.len()) {
            best = Some(ring);
        }
    }
    match best {
        Some(ring) => ring.iter().for_each(|id| member[*id] = true),
        None => molecule.atoms.iter().for_each(|atom| member[atom.id] = atom.in_cycle),
    }

    let mut path = vec![start];
    member[start] = false;
    let mut current = start;
    while let Some(next) = molecule.atoms[current].neighbors().into_iter().find(|n| member[*n]) {
        member[next] = false;
        path.push(next);
        current = next;
    }
    path
}
