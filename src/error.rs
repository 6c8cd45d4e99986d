use thiserror::Error;

use crate::{AtomId, AtomKind};

/// Errors raised while building, decoding, analyzing or naming a molecule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NamingError {
    /// A bond would use more slots than the atom has free.
    #[error("ligancy of {kind} atom {atom} exceeded")]
    LigancyExceeded { atom: AtomId, kind: AtomKind },

    /// A symbol outside the notation alphabet.
    #[error("invalid character '{character}' at position {position}")]
    InvalidCharacter { character: char, position: usize },

    /// Structurally malformed notation.
    #[error("invalid notation at position {position}: {reason}")]
    InvalidFormat { position: usize, reason: &'static str },

    /// A heteroatom bound to `atom` matches no functional group rule.
    #[error("invalid functional group on atom {atom}: unrecognized {element} ligand")]
    InvalidLigandConfiguration { atom: AtomId, element: AtomKind },

    #[error("molecule contains no carbon atom")]
    EmptyMolecule,

    #[error("atoms {0:?} are not connected to the root carbon")]
    DisconnectedAtoms(Vec<AtomId>),

    #[error("no atom with id {0}")]
    UnknownAtom(AtomId),

    #[error("atom {0} cannot bond to itself")]
    SelfBond(AtomId),

    #[error("chains of {0} carbon atoms have no stem name")]
    ChainTooLong(usize),

    /// A side chain hangs off the parent chain by a double or triple bond.
    #[error("side chain atom {atom} is multiply bonded to chain atom {anchor}")]
    MultipleBondToSideChain { atom: AtomId, anchor: AtomId },
}

pub type Result<T> = std::result::Result<T, NamingError>;
