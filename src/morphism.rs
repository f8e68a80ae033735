use std::collections::{BTreeMap, VecDeque};
use std::hash::{Hash, Hasher};

use log::trace;
use petgraph::graph::NodeIndex;

use crate::error::{PeriodicGraphError, Result};
use crate::geometry::{Operator, Vector};
use crate::matrix::Matrix;
use crate::multigraph::OrientedEdge;
use crate::periodic::PeriodicGraph;
use crate::placement::{difference, Placement};

type HashMap<K, V> = ahash::AHashMap<K, V>;

/// A node or an oriented edge
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Element {
    Node(NodeIndex),
    Edge(OrientedEdge),
}

/// A structure map between two periodic graphs
///
/// Maps nodes to nodes and oriented edges to oriented edges such
/// that difference vectors in the barycentric placements transform
/// by the linear `operator`. Morphisms are always surjective, but
/// need not be injective.
///
/// Morphisms only store element indices. Operations that need
/// positions take the graphs as arguments.
///
/// Two morphisms compare equal if their forward maps agree.
#[derive(Clone, Debug)]
pub struct Morphism {
    src2img: BTreeMap<Element, Element>,
    img2src: BTreeMap<Element, Element>,
    operator: Matrix,
    injective: bool,
}

fn no_morphism(reason: &'static str) -> PeriodicGraphError {
    PeriodicGraphError::NoSuchMorphism { reason }
}

/// Oriented edges at `v` keyed by their difference vectors
fn neighbour_vectors(
    g: &PeriodicGraph,
    placement: &Placement,
    v: NodeIndex,
) -> Result<Vec<(Vector, OrientedEdge)>> {
    g.all_incidences(v)
        .into_iter()
        .map(|e| {
            difference(g, placement, e)
                .map(|d| (d, e))
                .ok_or(PeriodicGraphError::NoSuchEdge)
        })
        .collect()
}

impl Morphism {
    /// Extends `v -> w` to a morphism from `source` onto `image`
    /// whose linear part is `operator`
    ///
    /// Both graphs must be connected and locally stable. Fails with
    /// [PeriodicGraphError::NoSuchMorphism] if no such morphism
    /// exists.
    pub fn new(
        source: &PeriodicGraph,
        v: NodeIndex,
        image: &PeriodicGraph,
        w: NodeIndex,
        operator: &Matrix,
    ) -> Result<Self> {
        let d = source.dimension();
        if image.dimension() != d {
            return Err(PeriodicGraphError::DimensionMismatch {
                expected: d,
                got: image.dimension(),
            });
        }
        if operator.nrows() != d || operator.ncols() != d {
            return Err(PeriodicGraphError::DimensionMismatch {
                expected: d,
                got: operator.nrows(),
            });
        }
        if !source.contains_node(v) || !image.contains_node(w) {
            return Err(PeriodicGraphError::NoSuchNode);
        }
        source.require_locally_stable()?;
        image.require_locally_stable()?;
        let pos1 = source.barycentric_placement()?;
        let pos2 = image.barycentric_placement()?;

        let mut src2img = BTreeMap::new();
        let mut img2src = BTreeMap::new();
        let mut injective = true;
        src2img.insert(Element::Node(v), Element::Node(w));
        img2src.insert(Element::Node(w), Element::Node(v));

        let mut queue = VecDeque::from([(v, w)]);
        while let Some((w1, w2)) = queue.pop_front() {
            let n1 = neighbour_vectors(source, &pos1, w1)?;
            let n2: HashMap<_, _> = neighbour_vectors(image, &pos2, w2)?.into_iter().collect();
            for (dist, e1) in n1 {
                let Some(&e2) = n2.get(&dist.times(operator)) else {
                    return Err(no_morphism("no edge with matching difference vector"));
                };
                match src2img.get(&Element::Edge(e1)) {
                    Some(&x) if x == Element::Edge(e2) => continue,
                    Some(_) => return Err(no_morphism("edge has two images")),
                    None => {}
                }
                src2img.insert(Element::Edge(e1), Element::Edge(e2));
                if img2src.contains_key(&Element::Edge(e2)) {
                    injective = false;
                } else {
                    img2src.insert(Element::Edge(e2), Element::Edge(e1));
                }

                let u1 = source.target(e1);
                let u2 = image.target(e2);
                match img2src.get(&Element::Node(u2)) {
                    Some(&x) if x != Element::Node(u1) => injective = false,
                    Some(_) => {}
                    None => {
                        img2src.insert(Element::Node(u2), Element::Node(u1));
                    }
                }
                match src2img.get(&Element::Node(u1)) {
                    Some(&x) if x != Element::Node(u2) => {
                        return Err(no_morphism("node has two images"))
                    }
                    Some(_) => {}
                    None => {
                        src2img.insert(Element::Node(u1), Element::Node(u2));
                        queue.push_back((u1, u2));
                    }
                }
            }
        }

        let surjective = image.nodes().all(|v| img2src.contains_key(&Element::Node(v)))
            && image
                .directed_edges()
                .into_iter()
                .all(|e| img2src.contains_key(&Element::Edge(e)));
        if !surjective {
            return Err(no_morphism("not surjective"));
        }
        trace!("Morphism of size {}, injective: {injective}", src2img.len());
        Ok(Self {
            src2img,
            img2src,
            operator: operator.clone(),
            injective,
        })
    }

    /// The identity on `g`
    pub fn identity(g: &PeriodicGraph) -> Result<Self> {
        let operator = Matrix::identity(g.dimension());
        match g.first_node() {
            Some(v) => Self::new(g, v, g, v, &operator),
            None => Ok(Self {
                src2img: BTreeMap::new(),
                img2src: BTreeMap::new(),
                operator,
                injective: true,
            }),
        }
    }

    pub fn operator(&self) -> &Matrix {
        &self.operator
    }

    pub fn is_injective(&self) -> bool {
        self.injective
    }

    pub fn is_isomorphism(&self) -> bool {
        self.injective
    }

    pub fn image(&self, x: Element) -> Option<Element> {
        self.src2img.get(&x).copied()
    }

    /// Some element mapped onto `x`
    pub fn preimage(&self, x: Element) -> Option<Element> {
        self.img2src.get(&x).copied()
    }

    pub fn node_image(&self, v: NodeIndex) -> Option<NodeIndex> {
        match self.image(Element::Node(v))? {
            Element::Node(w) => Some(w),
            Element::Edge(_) => None,
        }
    }

    pub fn edge_image(&self, e: OrientedEdge) -> Option<OrientedEdge> {
        match self.image(Element::Edge(e))? {
            Element::Edge(f) => Some(f),
            Element::Node(_) => None,
        }
    }

    /// The forward map on nodes
    pub fn node_map(&self) -> impl Iterator<Item = (NodeIndex, NodeIndex)> + '_ {
        self.src2img.iter().filter_map(|(x, y)| match (x, y) {
            (Element::Node(v), Element::Node(w)) => Some((*v, *w)),
            _ => None,
        })
    }

    /// Number of mapped nodes and oriented edges
    pub fn size(&self) -> usize {
        self.src2img.len()
    }

    pub fn inverse(&self) -> Result<Morphism> {
        if !self.injective {
            return Err(PeriodicGraphError::NotInvertible);
        }
        let operator = self
            .operator
            .inverse()
            .ok_or(PeriodicGraphError::NotInvertible)?;
        Ok(Morphism {
            src2img: self.img2src.clone(),
            img2src: self.src2img.clone(),
            operator,
            injective: true,
        })
    }

    /// The morphism applying first `self`, then `other`
    pub fn compose(&self, other: &Morphism) -> Result<Morphism> {
        let compose = |first: &BTreeMap<Element, Element>, second: &BTreeMap<Element, Element>| {
            first
                .iter()
                .map(|(a, b)| {
                    second
                        .get(b)
                        .map(|c| (*a, *c))
                        .ok_or(PeriodicGraphError::IncompatibleMorphisms)
                })
                .collect::<Result<BTreeMap<_, _>>>()
        };
        Ok(Morphism {
            src2img: compose(&self.src2img, &other.src2img)?,
            img2src: compose(&other.img2src, &self.img2src)?,
            operator: &self.operator * &other.operator,
            injective: self.injective && other.injective,
        })
    }

    /// The translation part modulo the lattice
    pub fn translation(&self, source: &PeriodicGraph, image: &PeriodicGraph) -> Result<Vector> {
        let Some((v, w)) = self.node_map().next() else {
            return Ok(Vector::zero(self.operator.nrows()));
        };
        let p = source.position(v)?;
        let q = image.position(w)?;
        Ok((&q - &p.times(&self.operator)).mod_z())
    }

    /// The affine map of positions induced by this morphism
    pub fn affine_operator(
        &self,
        source: &PeriodicGraph,
        image: &PeriodicGraph,
    ) -> Result<Operator> {
        Ok(Operator::new(
            self.operator.clone(),
            self.translation(source, image)?,
        ))
    }
}

impl PartialEq for Morphism {
    fn eq(&self, other: &Self) -> bool {
        self.src2img == other.src2img
    }
}

impl Eq for Morphism {}

impl Hash for Morphism {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.src2img.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::Rational;
    use testing::NetSpec;

    fn log_init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn build(net: &NetSpec) -> PeriodicGraph {
        PeriodicGraph::from_edges(net.dim, net.nodes, net.edges.iter().cloned()).unwrap()
    }

    fn op(rows: &[&[i64]]) -> Matrix {
        Matrix::from_int_rows(rows.len(), rows.iter())
    }

    fn q(n: i64, d: i64) -> Rational {
        Rational::new(n.into(), d.into())
    }

    #[test]
    fn inversion() {
        log_init();
        let dia = build(&testing::dia());
        let nodes = Vec::from_iter(dia.nodes());
        let minus = op(&[&[-1, 0, 0], &[0, -1, 0], &[0, 0, -1]]);
        let phi = Morphism::new(&dia, nodes[0], &dia, nodes[1], &minus).unwrap();
        assert!(phi.is_isomorphism());
        assert_eq!(
            phi.translation(&dia, &dia).unwrap(),
            Vector::new(vec![q(1, 4), q(1, 4), q(1, 4)])
        );
        assert_eq!(phi.node_image(nodes[1]), Some(nodes[0]));
        for e in dia.incidences(nodes[0]) {
            assert_eq!(phi.edge_image(e), Some(e.reverse()));
        }
        let id = Morphism::identity(&dia).unwrap();
        assert_eq!(phi.compose(&phi).unwrap(), id);
        assert_eq!(phi.inverse().unwrap(), phi);
        assert_eq!(phi.size(), 2 + 2 * 4);
    }

    #[test]
    fn rotation() {
        log_init();
        let dia = build(&testing::dia());
        let v = dia.nodes().next().unwrap();
        let rot = op(&[&[0, 1, 0], &[0, 0, 1], &[1, 0, 0]]);
        let phi = Morphism::new(&dia, v, &dia, v, &rot).unwrap();
        assert!(phi.translation(&dia, &dia).unwrap().is_zero());
        assert_eq!(phi.affine_operator(&dia, &dia).unwrap().to_string(), "z,x,y");
        let third = phi.compose(&phi).unwrap().compose(&phi).unwrap();
        assert_eq!(third, Morphism::identity(&dia).unwrap());
        assert_eq!(third.operator(), &Matrix::identity(3));
    }

    #[test]
    fn screw() {
        log_init();
        let g = build(&testing::cds_primitive());
        let nodes = Vec::from_iter(g.nodes());
        let rot = op(&[&[0, 0, 1], &[0, 1, 0], &[-1, 0, 0]]);
        let phi = Morphism::new(&g, nodes[0], &g, nodes[1], &rot).unwrap();
        assert_eq!(
            phi.translation(&g, &g).unwrap(),
            Vector::new(vec![q(0, 1), q(1, 2), q(0, 1)])
        );
        assert_eq!(phi.affine_operator(&g, &g).unwrap().to_string(), "-z,y+1/2,x");
    }

    #[test]
    fn not_injective() {
        log_init();
        let x = build(
            &NetSpec::new(2, 2)
                .edge(0, 1, &[0, 0])
                .edge(1, 0, &[1, 0])
                .edge(0, 0, &[0, 1])
                .edge(1, 1, &[0, 1]),
        );
        let y = build(&testing::sql());
        let double = op(&[&[2, 0], &[0, 1]]);
        let phi = Morphism::new(
            &x,
            x.nodes().next().unwrap(),
            &y,
            y.nodes().next().unwrap(),
            &double,
        )
        .unwrap();
        assert!(!phi.is_injective());
        assert_eq!(phi.size(), 10);
        assert_eq!(phi.inverse(), Err(PeriodicGraphError::NotInvertible));
        assert_eq!(phi.affine_operator(&x, &y).unwrap().to_string(), "2x,y");
    }

    #[test]
    fn failures() {
        log_init();
        let dia = build(&testing::dia());
        let v = dia.nodes().next().unwrap();
        let shear = op(&[&[1, 1, 0], &[0, 1, 0], &[0, 0, 1]]);
        assert!(matches!(
            Morphism::new(&dia, v, &dia, v, &shear),
            Err(PeriodicGraphError::NoSuchMorphism { .. })
        ));
        let pcu = build(&testing::pcu());
        let w = pcu.nodes().next().unwrap();
        assert!(matches!(
            Morphism::new(&pcu, w, &dia, v, &Matrix::identity(3)),
            Err(PeriodicGraphError::NoSuchMorphism { .. })
        ));
        let hcb = build(&testing::hcb());
        assert!(matches!(
            Morphism::new(&hcb, hcb.nodes().next().unwrap(), &dia, v, &Matrix::identity(3)),
            Err(PeriodicGraphError::DimensionMismatch { .. })
        ));

        let mut unstable = PeriodicGraph::new(1);
        let u = unstable.add_node();
        unstable.add_edge(u, u, &[1]).unwrap();
        unstable.add_edge_unchecked(u, u, &[1]).unwrap();
        assert_eq!(
            Morphism::identity(&unstable),
            Err(PeriodicGraphError::NotLocallyStable)
        );
    }

    #[test]
    fn soundness() {
        log_init();
        let g = build(&testing::srs());
        let syms = g.symmetries().unwrap();
        let pos = g.barycentric_placement().unwrap();
        for phi in syms.iter() {
            for e in g.directed_edges() {
                let f = phi.edge_image(e).unwrap();
                assert_eq!(
                    difference(&g, &pos, e).unwrap().times(phi.operator()),
                    difference(&g, &pos, f).unwrap()
                );
                assert_eq!(phi.node_image(g.source(e)), Some(g.source(f)));
            }
        }
    }
}
