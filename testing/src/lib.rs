use rand::{
    distributions::Uniform,
    prelude::*
};
use rand_distr::Normal;
use rand_xoshiro::Xoshiro256Plus;

/// A periodic net as a plain edge list with zero-based node indices.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NetSpec {
    pub dim: usize,
    pub nodes: usize,
    pub edges: Vec<(usize, usize, Vec<i64>)>,
}

impl NetSpec {
    pub fn new(dim: usize, nodes: usize) -> Self {
        Self { dim, nodes, edges: Vec::new() }
    }

    pub fn edge(mut self, source: usize, target: usize, shift: &[i64]) -> Self {
        assert_eq!(shift.len(), self.dim);
        self.edges.push((source, target, shift.to_vec()));
        self
    }

    /// Parses a space-separated key with one-based node numbers.
    pub fn from_key(key: &str) -> Self {
        let nums = Vec::from_iter(
            key.split_whitespace().map(|s| s.parse::<i64>().unwrap())
        );
        let dim = nums[0] as usize;
        let mut net = Self::new(dim, 0);
        for chunk in nums[1..].chunks(dim + 2) {
            let s = chunk[0] as usize - 1;
            let t = chunk[1] as usize - 1;
            net.nodes = net.nodes.max(s + 1).max(t + 1);
            net.edges.push((s, t, chunk[2..].to_vec()));
        }
        net
    }
}

/// The line with a single node.
pub fn line() -> NetSpec {
    NetSpec::new(1, 1).edge(0, 0, &[1])
}

pub fn sql() -> NetSpec {
    NetSpec::new(2, 1).edge(0, 0, &[1, 0]).edge(0, 0, &[0, 1])
}

pub fn hcb() -> NetSpec {
    NetSpec::new(2, 2)
        .edge(0, 1, &[0, 0])
        .edge(0, 1, &[1, 0])
        .edge(0, 1, &[0, 1])
}

/// Two honeycomb layers joined by a single edge per cell.
pub fn double_hcb() -> NetSpec {
    NetSpec::new(2, 4)
        .edge(0, 1, &[0, 0])
        .edge(0, 1, &[1, 0])
        .edge(0, 1, &[0, 1])
        .edge(2, 3, &[0, 0])
        .edge(2, 3, &[1, 0])
        .edge(2, 3, &[0, 1])
        .edge(0, 2, &[-1, -1])
}

pub fn pcu() -> NetSpec {
    NetSpec::new(3, 1)
        .edge(0, 0, &[1, 0, 0])
        .edge(0, 0, &[0, 1, 0])
        .edge(0, 0, &[0, 0, 1])
}

pub fn dia() -> NetSpec {
    NetSpec::new(3, 2)
        .edge(0, 1, &[0, 0, 0])
        .edge(0, 1, &[-1, 0, 0])
        .edge(0, 1, &[0, -1, 0])
        .edge(0, 1, &[0, 0, -1])
}

pub fn srs() -> NetSpec {
    NetSpec::from_key(
        "3 1 2 0 0 0 1 3 0 0 0 1 4 0 0 0 2 3 0 1 0 2 4 1 0 0 3 4 0 0 1"
    )
}

/// The cds net in a doubled cell.
pub fn cds() -> NetSpec {
    NetSpec::new(3, 4)
        .edge(0, 2, &[-1, 0, 0])
        .edge(0, 2, &[0, 0, 0])
        .edge(0, 3, &[0, 0, 0])
        .edge(0, 3, &[0, 1, 1])
        .edge(1, 2, &[0, -1, 0])
        .edge(1, 2, &[0, 0, -1])
        .edge(1, 3, &[0, 0, 0])
        .edge(1, 3, &[1, 0, 0])
}

/// The cds net in its primitive cell.
pub fn cds_primitive() -> NetSpec {
    NetSpec::new(3, 2)
        .edge(0, 1, &[0, 0, 0])
        .edge(1, 1, &[1, 0, 0])
        .edge(1, 0, &[0, -1, 0])
        .edge(0, 0, &[0, 0, 1])
}

pub struct NetIter {
    rng: Xoshiro256Plus,
    dim_distr: Uniform<usize>,
    node_distr: Uniform<usize>,
    shift_distr: Uniform<i64>,
    edge_distr: Normal<f64>,
}

impl Default for NetIter {
    fn default() -> Self {
        Self {
            rng: Xoshiro256Plus::seed_from_u64(0),
            dim_distr: Uniform::from(1..4),
            node_distr: Uniform::from(1..4),
            shift_distr: Uniform::from(-1..2),
            edge_distr: Normal::new(1.0, 1.0).unwrap(),
        }
    }
}

impl Iterator for NetIter {
    type Item = NetSpec;

    fn next(&mut self) -> Option<Self::Item> {
        let mut rng = &mut self.rng;
        let dim = self.dim_distr.sample(&mut rng);
        let nnodes = self.node_distr.sample(&mut rng);
        let mut net = NetSpec::new(dim, nnodes);
        for i in 0..nnodes {
            for j in i..nnodes {
                let nedges = self.edge_distr.sample(&mut rng)
                    .clamp(0.0, 3.0)
                    .round() as u64;
                for _ in 0..nedges {
                    let shift = Vec::from_iter(
                        (0..dim).map(|_| self.shift_distr.sample(&mut rng))
                    );
                    let neg = Vec::from_iter(shift.iter().map(|x| -x));
                    let trivial = i == j && shift.iter().all(|&x| x == 0);
                    let dup = net.edges.iter().any(|(s, t, x)| {
                        (*s, *t, x) == (i, j, &shift)
                            || (i == j && (*s, *t, x) == (i, j, &neg))
                    });
                    if !trivial && !dup {
                        net.edges.push((i, j, shift));
                    }
                }
            }
        }
        Some(net)
    }
}

/// Returns an isomorphic copy of `net` with permuted nodes, flipped
/// and reordered edges, moved node representatives and a random
/// unimodular change of lattice basis.
pub fn randomize_labels<R: Rng>(net: NetSpec, rng: &mut R) -> NetSpec {
    let dim = net.dim;
    let mut perm = Vec::from_iter(0..net.nodes);
    perm.shuffle(rng);
    let offsets = Vec::from_iter((0..net.nodes).map(|_| {
        Vec::from_iter((0..dim).map(|_| rng.gen_range(-1..=1)))
    }));
    let basis = random_unimodular(dim, rng);

    let mut edges = Vec::from_iter(net.edges.into_iter().map(|(s, t, x)| {
        let moved = Vec::from_iter(
            (0..dim).map(|i| x[i] + offsets[s][i] - offsets[t][i])
        );
        let shift = Vec::from_iter((0..dim).map(|j| {
            (0..dim).map(|i| moved[i] * basis[i][j]).sum::<i64>()
        }));
        if rng.gen() {
            (perm[s], perm[t], shift)
        } else {
            let neg = Vec::from_iter(shift.iter().map(|x| -x));
            (perm[t], perm[s], neg)
        }
    }));
    edges.shuffle(rng);
    NetSpec { dim, nodes: net.nodes, edges }
}

/// A product of a few elementary integer row operations.
pub fn random_unimodular<R: Rng>(dim: usize, rng: &mut R) -> Vec<Vec<i64>> {
    let mut m = Vec::from_iter((0..dim).map(|i| {
        Vec::from_iter((0..dim).map(|j| i64::from(i == j)))
    }));
    if dim < 2 {
        if dim == 1 && rng.gen() {
            m[0][0] = -1;
        }
        return m;
    }
    for _ in 0..3 {
        let i = rng.gen_range(0..dim);
        let j = (i + rng.gen_range(1..dim)) % dim;
        let f = if rng.gen() { 1 } else { -1 };
        for k in 0..dim {
            m[j][k] += f * m[i][k];
        }
    }
    if rng.gen() {
        m.swap(0, 1);
    }
    m
}
