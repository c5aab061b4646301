use ahash::AHashMap;

use crate::topology::Topology;

/// Memoized kinship coefficient solver.
///
/// `K(a, b)` is the probability that a random allele drawn from `a` and a
/// random allele drawn from `b` are identical by descent:
/// - `K(a, a) = 0.5 * (1 + F(a))`
/// - `K(a, b) = 0.5 * (K(p1, b) + K(p2, b))`, recursing on the individual
///   with the greater topological depth (greater index on ties), an absent
///   parent contributing `0.0`
/// - two distinct founders have `K = 0`.
///
/// The memo is keyed by the unordered pair and lives for one top-level
/// kernel request. Consanguinity coefficients consulted by the `K(a, a)`
/// case are recorded through [`KinshipSolver::record`] as the bottom-up
/// pass progresses.
pub(crate) struct KinshipSolver<'a> {
    topology: &'a Topology,
    coefficients: AHashMap<usize, f64>,
    memo: AHashMap<(usize, usize), f64>,
}

impl<'a> KinshipSolver<'a> {
    pub fn new(topology: &'a Topology, coefficients: AHashMap<usize, f64>) -> Self {
        Self { topology, coefficients, memo: AHashMap::new() }
    }

    /// Consanguinity of `id`, as recorded so far. Ancestors are always
    /// recorded before their descendants are requested.
    pub fn coefficient(&self, id: usize) -> f64 {
        self.coefficients.get(&id).copied().unwrap_or(0.0)
    }

    pub fn record(&mut self, id: usize, coefficient: f64) {
        self.coefficients.insert(id, coefficient);
    }

    pub fn kinship(&mut self, a: usize, b: usize) -> f64 {
        if a == b {
            return 0.5 * (1.0 + self.coefficient(a));
        }
        let key = (a.min(b), a.max(b));
        if let Some(&cached) = self.memo.get(&key) {
            return cached;
        }

        let (deeper, other) = if self.rank(a) > self.rank(b) { (a, b) } else { (b, a) };
        let kinship = match self.parents_of(deeper) {
            [None, None] => 0.0,
            slots => {
                0.5 * slots
                    .into_iter()
                    .flatten()
                    .map(|parent| self.kinship(parent, other))
                    .sum::<f64>()
            }
        };

        self.memo.insert(key, kinship);
        kinship
    }

    /// Recursion order: greater depth first, greater index on equal depth.
    fn rank(&self, id: usize) -> (u32, usize) {
        (self.topology.depth(id), id)
    }

    /// Parent slots with loop members cut to founders, keeping the
    /// recursion measure strictly decreasing on malformed input.
    fn parents_of(&self, id: usize) -> [Option<usize>; 2] {
        if self.topology.loops.contains(&id) {
            return [None, None];
        }
        self.topology.parents.get(&id).copied().unwrap_or([None, None])
    }
}
