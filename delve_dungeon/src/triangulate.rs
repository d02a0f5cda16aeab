// Incremental Delaunay triangulation (Bowyer–Watson) over room centers.
//
// Used by the `Triangulation` adjacency strategy to propose which rooms
// should be considered neighbors. Sites are inserted one at a time in input
// order into a mesh seeded with a super triangle that strictly contains every
// site. Each insertion removes the "bad" triangles whose circumcircle contains
// the new site, collects their edges, cancels edges that appear twice (shared
// by two bad triangles, compared with a relative-tolerance test on endpoint
// coordinates), and fans the remaining boundary polygon to the new site.
// Triangles still touching a super vertex are dropped at the end.
//
// The in-circle test is `<=`: a site exactly on a circumcircle counts as
// inside. For cocircular inputs this picks one of the valid triangulations
// instead of leaving a sliver, which is all the adjacency proposal needs.
// Collinear triples have no finite circumcircle and are never "bad".
//
// See also: `doors.rs` which turns triangulation edges into doors, and
// `types.rs` for `Vec2`.
//
// **Critical constraint: determinism.** The output depends only on the site
// order and coordinates. Triangles are kept in a `Vec` in creation order.

use crate::types::Vec2;
use tracing::trace;

/// Triangles and unique undirected edges over the input site indices.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Triangulation {
    pub triangles: Vec<[usize; 3]>,
    /// Sorted, deduplicated, each pair stored as `(low, high)`.
    pub edges: Vec<(usize, usize)>,
}

#[derive(Clone, Copy, Debug)]
struct Circle {
    center: Vec2,
    radius_squared: f64,
}

#[derive(Clone, Copy, Debug)]
struct Triangle {
    vertices: [usize; 3],
    circle: Option<Circle>,
}

impl Triangle {
    fn new(vertices: [usize; 3], points: &[Vec2]) -> Self {
        let [a, b, c] = vertices.map(|i| points[i]);
        Self {
            vertices,
            circle: circumcircle(a, b, c),
        }
    }

    fn circle_contains(&self, p: Vec2) -> bool {
        match self.circle {
            Some(circle) => p.distance_squared(circle.center) <= circle.radius_squared,
            None => false,
        }
    }

    fn edges(&self) -> [(usize, usize); 3] {
        let [a, b, c] = self.vertices;
        [(a, b), (b, c), (c, a)]
    }
}

fn circumcircle(a: Vec2, b: Vec2, c: Vec2) -> Option<Circle> {
    let (oa, ob, oc) = (a.length_squared(), b.length_squared(), c.length_squared());
    let x = (oa * (c.y - b.y) + ob * (a.y - c.y) + oc * (b.y - a.y))
        / (a.x * (c.y - b.y) + b.x * (a.y - c.y) + c.x * (b.y - a.y));
    let y = (oa * (c.x - b.x) + ob * (a.x - c.x) + oc * (b.x - a.x))
        / (a.y * (c.x - b.x) + b.y * (a.x - c.x) + c.y * (b.x - a.x));
    let center = Vec2::new(x / 2.0, y / 2.0);
    let radius_squared = a.distance_squared(center);
    radius_squared
        .is_finite()
        .then_some(Circle {
            center,
            radius_squared,
        })
}

/// Relative-tolerance float comparison.
fn almost_equal(a: f64, b: f64) -> bool {
    let diff = (a - b).abs();
    diff <= f64::EPSILON * (a + b).abs() * 2.0 || diff < f64::MIN_POSITIVE
}

fn almost_equal_points(a: Vec2, b: Vec2) -> bool {
    almost_equal(a.x, b.x) && almost_equal(a.y, b.y)
}

fn almost_equal_edges(points: &[Vec2], e: (usize, usize), f: (usize, usize)) -> bool {
    let (e0, e1, f0, f1) = (points[e.0], points[e.1], points[f.0], points[f.1]);
    (almost_equal_points(e0, f0) && almost_equal_points(e1, f1))
        || (almost_equal_points(e0, f1) && almost_equal_points(e1, f0))
}

/// Super triangle vertices around the bounding box of `sites`, expanded by
/// twice the larger box dimension (at least 1), with legs three times the
/// expanded box so every site is strictly inside.
fn super_triangle(sites: &[Vec2]) -> [Vec2; 3] {
    let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
    let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for p in sites {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    let (dx, dy) = (max_x - min_x, max_y - min_y);
    let margin = 2.0 * dx.max(dy).max(1.0);
    let width = dx + 2.0 * margin;
    let height = dy + 2.0 * margin;
    let origin = Vec2::new(min_x - margin, min_y - margin);
    [
        origin,
        Vec2::new(origin.x, origin.y + 3.0 * height),
        Vec2::new(origin.x + 3.0 * width, origin.y),
    ]
}

/// Delaunay-triangulate `sites`. Sites that almost equal an earlier site are
/// skipped. Two distinct sites yield the single edge between them; fewer
/// yield an empty result.
pub fn triangulate(sites: &[Vec2]) -> Triangulation {
    let n = sites.len();
    if n < 2 {
        return Triangulation::default();
    }

    let mut points = sites.to_vec();
    points.extend(super_triangle(sites));
    let mut triangles = vec![Triangle::new([n, n + 1, n + 2], &points)];
    let mut inserted: Vec<usize> = Vec::with_capacity(n);

    for (site, &p) in sites.iter().enumerate() {
        if inserted
            .iter()
            .any(|&prev| almost_equal_points(sites[prev], p))
        {
            trace!(site, "skipping duplicate triangulation site");
            continue;
        }
        inserted.push(site);

        let (bad, good): (Vec<Triangle>, Vec<Triangle>) =
            triangles.into_iter().partition(|t| t.circle_contains(p));
        triangles = good;

        let polygon: Vec<(usize, usize)> = bad.iter().flat_map(Triangle::edges).collect();
        for (i, &edge) in polygon.iter().enumerate() {
            let shared = polygon
                .iter()
                .enumerate()
                .any(|(j, &other)| i != j && almost_equal_edges(&points, edge, other));
            if !shared {
                triangles.push(Triangle::new([edge.0, edge.1, site], &points));
            }
        }
    }

    let triangles: Vec<[usize; 3]> = triangles
        .into_iter()
        .map(|t| t.vertices)
        .filter(|v| v.iter().all(|&i| i < n))
        .collect();

    let mut edges: Vec<(usize, usize)> = if inserted.len() == 2 {
        vec![(inserted[0], inserted[1])]
    } else {
        triangles
            .iter()
            .flat_map(|&[a, b, c]| [(a, b), (b, c), (c, a)])
            .map(|(a, b)| (a.min(b), a.max(b)))
            .collect()
    };
    edges.sort_unstable();
    edges.dedup();

    Triangulation { triangles, edges }
}
