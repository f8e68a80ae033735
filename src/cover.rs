use std::collections::VecDeque;
use std::rc::Rc;

use indexmap::{IndexMap, IndexSet};
use log::debug;
use petgraph::graph::{EdgeIndex, NodeIndex};
use petgraph::unionfind::UnionFind;

use crate::error::{PeriodicGraphError, Result};
use crate::geometry::{Operator, Point, Vector};
use crate::matrix::Matrix;
use crate::morphism::Morphism;
use crate::multigraph::OrientedEdge;
use crate::periodic::PeriodicGraph;
use crate::placement::Placement;

type HashMap<K, V> = ahash::AHashMap<K, V>;

/// The quotient of a periodic graph by all its topological translations
#[derive(Clone, Debug)]
pub struct MinimalImage {
    graph: PeriodicGraph,
    map: Morphism,
}

impl MinimalImage {
    pub fn graph(&self) -> &PeriodicGraph {
        &self.graph
    }

    /// The morphism from the original graph onto [Self::graph]
    pub fn map(&self) -> &Morphism {
        &self.map
    }
}

/// Finds a conventional unit cell for a symmetry group
pub trait CellFinder {
    /// The vectors spanning the conventional cell, as the rows of a
    /// matrix in the coordinates of the current cell
    ///
    /// `operators` are the affine symmetry operators of the graph in
    /// its barycentric placement.
    fn conventional_cell(&self, operators: &[Operator]) -> Result<Matrix>;
}

impl PeriodicGraph {
    /// Checks for a symmetry that maps some node to a different node at
    /// the same position modulo the lattice
    pub fn is_ladder(&self) -> Result<bool> {
        if !self.is_connected()? {
            return Err(PeriodicGraphError::Disconnected);
        }
        self.cache
            .ladder
            .get_or_try_init(self.version(), || {
                if self.is_stable()? || !self.is_locally_stable()? {
                    return Ok(false);
                }
                let placement = self.barycentric_placement()?;
                let identity = Matrix::identity(self.dimension());
                let mut nodes = self.nodes();
                let Some(start) = nodes.next() else {
                    return Ok(false);
                };
                let p0 = &placement[&start];
                for v in nodes {
                    if !(&placement[&v] - p0).mod_z().is_zero() {
                        continue;
                    }
                    match Morphism::new(self, start, self, v, &identity) {
                        Ok(_) => return Ok(true),
                        Err(PeriodicGraphError::NoSuchMorphism { .. }) => {}
                        Err(err) => return Err(err),
                    }
                }
                Ok(false)
            })
            .map(|l| *l)
    }

    /// Classes of nodes related by topological translations
    ///
    /// These are symmetries with trivial linear part that fix no node.
    /// If there are none the result is empty rather than a list of
    /// singletons.
    pub fn translational_equivalences(&self) -> Result<Rc<Vec<Vec<NodeIndex>>>> {
        self.require_locally_stable()?;
        self.cache
            .translational
            .get_or_try_init(self.version(), || self.compute_translational_equivalences())
    }

    fn compute_translational_equivalences(&self) -> Result<Vec<Vec<NodeIndex>>> {
        let nodes = Vec::from_iter(self.nodes());
        let index: HashMap<_, _> = nodes.iter().enumerate().map(|(i, &v)| (v, i)).collect();
        let identity = Matrix::identity(self.dimension());
        let mut partition = UnionFind::new(nodes.len());
        let mut found = false;
        for (i, &v) in nodes.iter().enumerate().skip(1) {
            if partition.equiv(0, i) {
                continue;
            }
            let translation = match Morphism::new(self, nodes[0], self, v, &identity) {
                Ok(phi) => phi,
                Err(PeriodicGraphError::NoSuchMorphism { .. }) => continue,
                Err(err) => return Err(err),
            };
            found = true;
            for (j, &w) in nodes.iter().enumerate() {
                let image = translation
                    .node_image(w)
                    .ok_or(PeriodicGraphError::Internal("translation is not total"))?;
                partition.union(j, index[&image]);
            }
        }
        if !found {
            return Ok(Vec::new());
        }
        let mut classes: IndexMap<usize, Vec<NodeIndex>> = IndexMap::new();
        for (i, &v) in nodes.iter().enumerate() {
            classes.entry(partition.find(i)).or_default().push(v);
        }
        debug!("Found {} translational equivalence classes", classes.len());
        Ok(classes.into_values().collect())
    }

    /// Checks whether the translation group can not be extended
    pub fn is_minimal(&self) -> Result<bool> {
        Ok(self.translational_equivalences()?.is_empty())
    }

    /// The minimal image and the morphism onto it
    ///
    /// Fails with [PeriodicGraphError::FiniteOrderTranslation] if some
    /// topological translation has finite order.
    pub fn minimal_image(&self) -> Result<Rc<MinimalImage>> {
        self.require_locally_stable()?;
        self.cache
            .minimal_image
            .get_or_try_init(self.version(), || self.compute_minimal_image())
    }

    fn compute_minimal_image(&self) -> Result<MinimalImage> {
        let internal = PeriodicGraphError::Internal;
        let d = self.dimension();
        let classes = self.translational_equivalences()?;
        if classes.is_empty() {
            // the clone keeps all node and edge indices
            let map = Morphism::identity(self)?;
            return Ok(MinimalImage { graph: self.clone(), map });
        }
        let v0 = self.first_node().ok_or(internal("translations without nodes"))?;
        let placement = self.barycentric_placement()?;

        let (rep, others) = classes[0]
            .split_first()
            .ok_or(internal("empty translational class"))?;
        let mut vectors = Vec::with_capacity(others.len() + d);
        for w in others {
            let t = (&placement[w] - &placement[rep]).mod_z();
            if t.is_zero() {
                return Err(PeriodicGraphError::FiniteOrderTranslation);
            }
            vectors.push(t.coords().to_vec());
        }
        vectors.extend(Matrix::identity(d).rows().map(|r| r.to_vec()));
        let mut lattice = Matrix::from_rows(d, vectors);
        lattice.triangulate(None, true, false);
        if lattice.rank() != d {
            return Err(internal("extended translations do not span"));
        }
        let to_new = lattice
            .sub_matrix(0, 0, d, d)
            .inverse()
            .ok_or(internal("singular extended lattice"))?;

        let mut graph = PeriodicGraph::new(d);
        let mut old2new = HashMap::default();
        let mut new2old = HashMap::default();
        for class in classes.iter() {
            let v = graph.add_node();
            for &w in class {
                old2new.insert(w, v);
            }
            new2old.insert(v, class[0]);
        }

        for e in self.edges() {
            let (v, w) = (self.source(e), self.target(e));
            let (v_new, w_new) = (old2new[&v], old2new[&w]);
            let v_shift = &placement[&v] - &placement[&new2old[&v_new]];
            let w_shift = &placement[&w] - &placement[&new2old[&w_new]];
            let shift = (&(&w_shift - &v_shift) + &self.shift_vector(e))
                .times(&to_new)
                .to_ints()
                .ok_or(internal("non-integral shift in minimal image"))?;
            if graph.edge_between(v_new, w_new, &shift).is_none() {
                graph.add_edge(v_new, w_new, &shift)?;
            }
        }
        debug!(
            "Minimal image has {} nodes and {} edges",
            graph.node_count(),
            graph.edge_count()
        );

        let map = Morphism::new(self, v0, &graph, old2new[&v0], &to_new)?;
        Ok(MinimalImage { graph, map })
    }

    /// The cover of this graph in a conventional cell
    ///
    /// The graph must be minimal.
    pub fn conventional_cell_cover(&self, finder: &impl CellFinder) -> Result<Cover> {
        if !self.is_minimal()? {
            return Err(PeriodicGraphError::NotMinimal);
        }
        let cell = finder.conventional_cell(&self.symmetry_operators()?)?;
        let cell = cell.to_i64_rows().ok_or(PeriodicGraphError::InvalidCell)?;
        Cover::new(self, &cell)
    }
}

/// A periodic graph unfolded into a larger unit cell
#[derive(Clone, Debug)]
pub struct Cover {
    graph: PeriodicGraph,
    image: PeriodicGraph,
    morphism: Morphism,
}

impl Cover {
    /// Unfolds `image` into the cell spanned by the integral rows of
    /// `cell`
    pub fn new(image: &PeriodicGraph, cell: &[Vec<i64>]) -> Result<Self> {
        let d = image.dimension();
        if cell.len() != d || cell.iter().any(|row| row.len() != d) {
            return Err(PeriodicGraphError::InvalidCell);
        }
        let basis = Matrix::from_int_rows(d, cell);
        let to_new = basis.inverse().ok_or(PeriodicGraphError::InvalidCell)?;
        image.require_locally_stable()?;
        let placement = image.barycentric_placement()?;

        // old lattice vectors modulo the new one
        let mut translations = IndexSet::from([Vector::zero(d)]);
        let generators =
            IndexSet::<Vector>::from_iter((0..d).map(|i| Vector::unit(d, i).times(&to_new).mod_z()));
        let mut queue = VecDeque::from([Vector::zero(d)]);
        while let Some(s) = queue.pop_front() {
            for t in &generators {
                let sum = (&s + t).mod_z();
                if translations.insert(sum.clone()) {
                    queue.push_back(sum);
                }
            }
        }

        let mut graph = PeriodicGraph::new(d);
        let mut nodes = HashMap::default();
        let mut cover_placement = Placement::default();
        for v in image.nodes() {
            let p = placement[&v].times(&to_new);
            for t in &translations {
                let q = (&p + t).mod_z();
                let w = graph.add_node();
                nodes.insert((v, q.clone()), w);
                cover_placement.insert(w, q);
            }
        }

        let node = |v: NodeIndex, p: Point| {
            nodes
                .get(&(v, p))
                .copied()
                .ok_or(PeriodicGraphError::Internal("missing cover node"))
        };
        for e in image.edges() {
            let (v, w) = (image.source(e), image.target(e));
            let p = placement[&v].times(&to_new);
            let q = (&placement[&w] + &image.shift_vector(e)).times(&to_new);
            let diff = &q - &p;
            for t in &translations {
                let start = (&p + t).mod_z();
                let end = &start + &diff;
                let end_rep = end.mod_z();
                let shift = (&end - &end_rep)
                    .to_ints()
                    .ok_or(PeriodicGraphError::Internal("non-integral cover shift"))?;
                let (a, b) = (node(v, start)?, node(w, end_rep)?);
                if graph.edge_between(a, b, &shift).is_none() {
                    graph.add_edge(a, b, &shift)?;
                }
            }
        }
        graph.cache.placement.put(graph.version(), cover_placement);
        debug!(
            "Cover with {} nodes and {} edges",
            graph.node_count(),
            graph.edge_count()
        );

        let (Some(v), Some(w)) = (graph.first_node(), image.first_node()) else {
            return Err(PeriodicGraphError::NoSuchNode);
        };
        let morphism = Morphism::new(&graph, v, image, w, &basis)?;
        Ok(Self {
            graph,
            image: image.clone(),
            morphism,
        })
    }

    /// The covering graph
    pub fn graph(&self) -> &PeriodicGraph {
        &self.graph
    }

    /// The graph being covered
    pub fn image(&self) -> &PeriodicGraph {
        &self.image
    }

    /// The morphism from [Self::graph] onto [Self::image]
    pub fn cover_morphism(&self) -> &Morphism {
        &self.morphism
    }

    pub fn image_of_node(&self, v: NodeIndex) -> Option<NodeIndex> {
        self.morphism.node_image(v)
    }

    pub fn image_of_edge(&self, e: OrientedEdge) -> Option<OrientedEdge> {
        self.morphism.edge_image(e)
    }

    /// Lifts a position `p` of the image of `v` into the coordinates of
    /// the cover
    pub fn lifted_position(&self, v: NodeIndex, p: &Point) -> Result<Point> {
        let a = self.morphism.operator();
        let w = self.image_of_node(v).ok_or(PeriodicGraphError::NoSuchNode)?;
        let b = self.graph.position(v)?.times(a);
        let offset = &b - &self.image.position(w)?;
        let inverse = a.inverse().ok_or(PeriodicGraphError::NotInvertible)?;
        Ok((p + &offset).times(&inverse))
    }

    /// Nodes of the cover grouped by the symmetry orbits of their
    /// images
    pub fn node_orbits(&self) -> Result<Vec<Vec<NodeIndex>>> {
        let orbits = self.image.node_orbits()?;
        let orbit_of: HashMap<_, _> = orbits
            .iter()
            .enumerate()
            .flat_map(|(i, orbit)| orbit.iter().map(move |&v| (v, i)))
            .collect();
        let mut res = vec![Vec::new(); orbits.len()];
        for v in self.graph.nodes() {
            let w = self.image_of_node(v).ok_or(PeriodicGraphError::NoSuchNode)?;
            res[orbit_of[&w]].push(v);
        }
        Ok(res)
    }

    /// Edges of the cover grouped by the symmetry orbits of their
    /// images
    pub fn edge_orbits(&self) -> Result<Vec<Vec<EdgeIndex>>> {
        let orbits = self.image.edge_orbits()?;
        let orbit_of: HashMap<_, _> = orbits
            .iter()
            .enumerate()
            .flat_map(|(i, orbit)| orbit.iter().map(move |&e| (e, i)))
            .collect();
        let mut res = vec![Vec::new(); orbits.len()];
        for e in self.graph.edges() {
            let f = self.image_of_edge(e).ok_or(PeriodicGraphError::NoSuchEdge)?;
            res[orbit_of[&f.id]].push(e.id);
        }
        Ok(res)
    }
}
