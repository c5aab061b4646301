use std::fmt::{self, Display};

use ahash::AHashMap;

use pedigree::PedigreeView;

use crate::error::SearchError;

/// How the second individual relates to the first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationshipKind {
    Same,
    Parent,
    Child,
    Spouse,
    Sibling,
    Ancestor,
    Descendant,
    Cousin,
    CommonAncestor,
    None,
}

impl Display for RelationshipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", match self {
            Self::Same => "self",
            Self::Parent => "parent",
            Self::Child => "child",
            Self::Spouse => "spouse",
            Self::Sibling => "sibling",
            Self::Ancestor => "ancestor",
            Self::Descendant => "descendant",
            Self::Cousin => "cousin",
            Self::CommonAncestor => "common_ancestor",
            Self::None => "none",
        })
    }
}

/// Orientation of one step on a kinship path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EdgeKind {
    Up,
    Down,
    Spouse,
}

impl EdgeKind {
    fn inverted(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Spouse => Self::Spouse,
        }
    }
}

/// Shortest kinship path between two individuals, classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub kind: RelationshipKind,
    pub distance: usize,
    /// Person indices along the path, endpoints included. Empty when no
    /// path exists.
    pub path: Vec<usize>,
    /// Cousin degree (first cousins = 1).
    pub degree: Option<u32>,
    /// Cousin removal (generation offset between the endpoints).
    pub removal: Option<u32>,
}

impl Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.kind, self.degree, self.removal) {
            (RelationshipKind::Cousin, Some(degree), Some(removal)) => {
                write!(f, "cousin (degree {degree}, removal {removal}), distance {}", self.distance)
            }
            (RelationshipKind::None, _, _) => write!(f, "none"),
            (kind, _, _) => write!(f, "{kind}, distance {}", self.distance),
        }
    }
}

/// Shortest-path kinship search over the undirected union of the
/// parent/child and spouse edges. Edges are enumerated straight off the
/// graph stores; no adjacency matrix is materialized.
pub struct RelationshipSearchEngine<'a, V: PedigreeView> {
    view: &'a V,
}

impl<'a, V: PedigreeView> RelationshipSearchEngine<'a, V> {
    pub fn new(view: &'a V) -> Self {
        Self { view }
    }

    /// Find and classify the shortest kinship path from `a` to `b`.
    ///
    /// The search is a bidirectional BFS, frontiers expanding in strict
    /// alternation starting from `a`. Neighbors are visited in a fixed
    /// order (origin-family parents, then union-family co-spouses, then
    /// children; each group ascending by index), so the first path found
    /// is deterministic.
    ///
    /// # Errors
    /// [`SearchError::UnknownPerson`] when either endpoint is missing.
    pub fn find_relationship(&self, a: usize, b: usize) -> Result<Relationship, SearchError> {
        for endpoint in [a, b] {
            if self.view.person(endpoint).is_none() {
                return Err(SearchError::UnknownPerson(endpoint));
            }
        }

        if a == b {
            return Ok(Relationship {
                kind: RelationshipKind::Same,
                distance: 0,
                path: vec![a],
                degree: None,
                removal: None,
            });
        }

        // ---- (predecessor, edge from predecessor) per discovered node.
        let mut seen_a: AHashMap<usize, Option<(usize, EdgeKind)>> = AHashMap::new();
        let mut seen_b: AHashMap<usize, Option<(usize, EdgeKind)>> = AHashMap::new();
        seen_a.insert(a, None);
        seen_b.insert(b, None);
        let mut frontier_a = vec![a];
        let mut frontier_b = vec![b];

        let meeting = loop {
            if frontier_a.is_empty() && frontier_b.is_empty() {
                break None;
            }
            if let Some(meeting) = self.expand(&mut frontier_a, &mut seen_a, &seen_b) {
                break Some(meeting);
            }
            if let Some(meeting) = self.expand(&mut frontier_b, &mut seen_b, &seen_a) {
                break Some(meeting);
            }
        };

        let Some(meeting) = meeting else {
            return Ok(Relationship {
                kind: RelationshipKind::None,
                distance: 0,
                path: Vec::new(),
                degree: None,
                removal: None,
            });
        };

        Ok(classify(assemble_path(meeting, &seen_a, &seen_b)))
    }

    /// Expand one full BFS level. Returns the first node also visited by
    /// the opposite search, if any.
    fn expand(
        &self,
        frontier: &mut Vec<usize>,
        seen: &mut AHashMap<usize, Option<(usize, EdgeKind)>>,
        other_seen: &AHashMap<usize, Option<(usize, EdgeKind)>>,
    ) -> Option<usize> {
        let mut next = Vec::new();
        for &node in frontier.iter() {
            for (neighbor, edge) in self.neighbors(node) {
                if seen.contains_key(&neighbor) {
                    continue;
                }
                seen.insert(neighbor, Some((node, edge)));
                if other_seen.contains_key(&neighbor) {
                    return Some(neighbor);
                }
                next.push(neighbor);
            }
        }
        *frontier = next;
        None
    }

    /// Fixed-order neighbor enumeration: parents, co-spouses, children;
    /// each group by ascending person index.
    fn neighbors(&self, id: usize) -> Vec<(usize, EdgeKind)> {
        let Some(person) = self.view.person(id) else { return Vec::new() };
        let mut neighbors = Vec::new();

        let mut parents: Vec<usize> = person
            .origin_family
            .and_then(|family_id| self.view.family(family_id))
            .map_or_else(Vec::new, |family| {
                family.parent_slots().into_iter().flatten().collect()
            });
        parents.sort_unstable();
        neighbors.extend(parents.into_iter().map(|parent| (parent, EdgeKind::Up)));

        let mut unions = person.union_families.clone();
        unions.sort_unstable();

        let mut spouses = Vec::new();
        let mut children = Vec::new();
        for family_id in unions {
            let Some(family) = self.view.family(family_id) else { continue };
            spouses.extend(
                family
                    .parent_slots()
                    .into_iter()
                    .flatten()
                    .filter(|&spouse| spouse != id),
            );
            children.extend(family.children.iter().copied());
        }
        spouses.sort_unstable();
        spouses.dedup();
        children.sort_unstable();
        children.dedup();

        neighbors.extend(spouses.into_iter().map(|spouse| (spouse, EdgeKind::Spouse)));
        neighbors.extend(children.into_iter().map(|child| (child, EdgeKind::Down)));
        neighbors
    }
}

/// Stitch both predecessor chains into one `a -> b` node/edge sequence.
fn assemble_path(
    meeting: usize,
    seen_a: &AHashMap<usize, Option<(usize, EdgeKind)>>,
    seen_b: &AHashMap<usize, Option<(usize, EdgeKind)>>,
) -> (Vec<usize>, Vec<EdgeKind>) {
    // meeting -> a, following a-side predecessors.
    let mut nodes = vec![meeting];
    let mut edges = Vec::new();
    let mut cursor = meeting;
    while let Some(&Some((previous, edge))) = seen_a.get(&cursor) {
        nodes.push(previous);
        edges.push(edge);
        cursor = previous;
    }
    nodes.reverse();
    edges.reverse();

    // meeting -> b, inverting the b-side edge orientations.
    let mut cursor = meeting;
    while let Some(&Some((previous, edge))) = seen_b.get(&cursor) {
        nodes.push(previous);
        edges.push(edge.inverted());
        cursor = previous;
    }
    (nodes, edges)
}

/// Derive the relationship kind from the `a -> b` edge sequence.
fn classify((nodes, edges): (Vec<usize>, Vec<EdgeKind>)) -> Relationship {
    use EdgeKind::{Down, Spouse, Up};
    use RelationshipKind as Kind;

    let ups = edges.iter().take_while(|&&edge| edge == Up).count();
    let downs = edges.len() - ups;
    let pure_cone = edges[ups..].iter().all(|&edge| edge == Down);

    let (kind, degree, removal) = match edges.as_slice() {
        [Up] => (Kind::Parent, None, None),
        [Down] => (Kind::Child, None, None),
        [Spouse] => (Kind::Spouse, None, None),
        [Up, Down] => (Kind::Sibling, None, None),
        _ if pure_cone && downs == 0 => (Kind::Ancestor, None, None),
        _ if pure_cone && ups == 0 => (Kind::Descendant, None, None),
        _ if pure_cone => {
            let degree = ups.min(downs) as u32 - 1;
            let removal = ups.abs_diff(downs) as u32;
            (Kind::Cousin, Some(degree), Some(removal))
        }
        _ => (Kind::CommonAncestor, None, None),
    };

    Relationship { kind, distance: edges.len(), path: nodes, degree, removal }
}
