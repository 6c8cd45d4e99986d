use tracing::*;

use super::{Candidates, Path};
use crate::*;

/// The rules that rank candidate chains, in the order they are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Criterion {
    SeniorGroups,
    RingBranches,
    Length,
    MultipleBonds,
}

impl Criterion {
    fn atom_score(self, molecule: &Molecule, id: AtomId) -> usize {
        let atom = &molecule.atoms[id];
        match self {
            Criterion::SeniorGroups => molecule.senior_group.map_or(0, |group| atom.group_count(group)),
            Criterion::RingBranches => atom
                .neighbors()
                .into_iter()
                .filter(|n| {
                    let neighbor = &molecule.atoms[*n];
                    neighbor.is_carbon() && neighbor.in_cycle
                })
                .count(),
            Criterion::Length => 1,
            Criterion::MultipleBonds => usize::from(atom.has_multiple_bond()),
        }
    }

    fn score(self, molecule: &Molecule, path: &[AtomId]) -> usize {
        path.iter().map(|id| self.atom_score(molecule, *id)).sum()
    }
}

/// Narrows the candidate pools down to one parent chain.
pub(crate) struct Filter<'m> {
    molecule: &'m Molecule,
    cyclic: Vec<Path>,
    linear: Vec<Path>,
    partial: Vec<(AtomId, Vec<Path>)>,
    is_cycle: bool,
}

impl<'m> Filter<'m> {
    pub(crate) fn new(molecule: &'m Molecule, candidates: Candidates) -> Self {
        Self {
            molecule,
            cyclic: candidates.cyclic,
            linear: candidates.linear,
            partial: candidates.partial,
            is_cycle: false,
        }
    }

    /// Returns the paths left equally ranked and whether they are rings.
    pub(crate) fn reduce(mut self) -> (Vec<Path>, bool) {
        self.by_senior_groups();
        if !self.is_cycle {
            self.narrow(Criterion::RingBranches);
        }
        self.narrow(Criterion::Length);
        self.narrow(Criterion::MultipleBonds);
        self.finish()
    }

    fn best(&self, paths: &[Path], criterion: Criterion) -> usize {
        paths
            .iter()
            .map(|path| criterion.score(self.molecule, path))
            .max()
            .unwrap_or(0)
    }

    /// Score of the best chain that can be made by joining two partial
    /// paths through `node`.
    fn joined(&self, node: AtomId, paths: &[Path], criterion: Criterion) -> usize {
        let mut scores: Vec<usize> = paths.iter().map(|path| criterion.score(self.molecule, path)).collect();
        scores.sort_unstable_by(|a, b| b.cmp(a));
        match scores.as_slice() {
            [] => 0,
            [only] => *only,
            [first, second, ..] => (first + second).saturating_sub(criterion.atom_score(self.molecule, node)),
        }
    }

    fn best_joined(&self, criterion: Criterion) -> usize {
        self.partial
            .iter()
            .map(|(node, paths)| self.joined(*node, paths, criterion))
            .max()
            .unwrap_or(0)
    }

    fn retain_best(&mut self, cyclic: bool, criterion: Criterion, best: usize) {
        let molecule = self.molecule;
        let pool = if cyclic { &mut self.cyclic } else { &mut self.linear };
        pool.retain(|path| criterion.score(molecule, path) == best);
    }

    /// The cyclic pool wins on senior groups unless an open chain has strictly more.
    fn by_senior_groups(&mut self) {
        let criterion = Criterion::SeniorGroups;
        let cyclic = self.best(&self.cyclic, criterion);
        let linear = self.best(&self.linear, criterion);
        let partial = self.best_joined(criterion);

        if cyclic == 0 && linear == 0 && partial == 0 {
            if !self.cyclic.is_empty() {
                self.is_cycle = true;
                self.linear.clear();
                self.partial.clear();
            }
            return;
        }

        if cyclic >= linear.max(partial) {
            self.is_cycle = true;
            self.retain_best(true, criterion, cyclic);
            self.linear.clear();
            self.partial.clear();
            return;
        }

        self.cyclic.clear();
        if linear > partial {
            self.partial.clear();
        } else if partial > linear {
            self.linear.clear();
        }
        self.retain_best(false, criterion, linear);
        self.narrow_partial(criterion, partial);
    }

    fn narrow(&mut self, criterion: Criterion) {
        let complete = if self.is_cycle {
            self.best(&self.cyclic, criterion)
        } else {
            self.best(&self.linear, criterion)
        };
        let partial = self.best_joined(criterion);

        if complete > partial {
            self.partial.clear();
        } else if partial > complete {
            if self.is_cycle {
                self.cyclic.clear();
            } else {
                self.linear.clear();
            }
        }
        self.retain_best(self.is_cycle, criterion, complete);
        self.narrow_partial(criterion, partial);
        trace!(
            "After {:?}: cyclic {:?}, linear {:?}, partial {:?}",
            criterion,
            self.cyclic,
            self.linear,
            self.partial
        );
    }

    /// Drop nodes that cannot reach `best`, keep each node's top two
    /// directions, and join nodes left with exactly two.
    fn narrow_partial(&mut self, criterion: Criterion, best: usize) {
        let partial = std::mem::take(&mut self.partial);
        for (node, paths) in partial {
            if self.joined(node, &paths, criterion) != best {
                continue;
            }
            let scores: Vec<usize> = paths.iter().map(|path| criterion.score(self.molecule, path)).collect();
            let top = scores.iter().copied().max().unwrap_or(0);
            let mut kept: Vec<Path> = paths
                .iter()
                .zip(&scores)
                .filter(|(_, score)| **score == top)
                .map(|(path, _)| path.clone())
                .collect();
            if kept.len() == 1 {
                if let Some(second) = scores.iter().copied().filter(|score| *score < top).max() {
                    kept.extend(
                        paths
                            .iter()
                            .zip(&scores)
                            .filter(|(_, score)| **score == second)
                            .map(|(path, _)| path.clone()),
                    );
                }
            }

            if kept.len() == 2 {
                self.linear.push(join(&kept[0], &kept[1]));
            } else {
                self.partial.push((node, kept));
            }
        }
    }

    /// The surviving complete paths, or else every chain that can be joined
    /// from the undecided partial paths, longest and richest in multiple
    /// bonds first.
    fn finish(self) -> (Vec<Path>, bool) {
        let complete = if self.is_cycle { self.cyclic } else { self.linear };
        if !complete.is_empty() {
            return (complete, self.is_cycle);
        }

        let molecule = self.molecule;
        let mut joined = Vec::new();
        for (_, paths) in &self.partial {
            match paths.as_slice() {
                [] => {}
                [only] => joined.push(only.clone()),
                [first, .., last] => {
                    joined.push(join(first, last));
                    let last = paths.len() - 1;
                    for i in 0..last {
                        for j in i + 1..=last {
                            if (i, j) != (0, last) {
                                joined.push(join(&paths[i], &paths[j]));
                            }
                        }
                    }
                }
            }
        }
        let rank = |path: &Path| (path.len(), Criterion::MultipleBonds.score(molecule, path));
        let best = joined.iter().map(rank).max();
        joined.retain(|path| Some(rank(path)) == best);
        if joined.is_empty() {
            joined.push(vec![molecule.root]);
        }
        (joined, false)
    }
}

/// `first` followed by `second` reversed, sharing their common last atom.
fn join(first: &[AtomId], second: &[AtomId]) -> Path {
    let mut path = first.to_vec();
    path.extend(second.iter().rev().skip(1));
    path
}
