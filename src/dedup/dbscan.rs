// Deterministic DBSCAN over keyword embeddings.
//
// Small, fixed-parameter variant used only for near-duplicate suppression:
// candidate sets are capped (≤70 points), so the O(n²) neighborhood scan is
// fine. Points are visited in index order and cluster labels are assigned in
// discovery order, which makes the labeling reproducible for a given input
// ordering — the dedup policies rely on that.

/// Label for points with no sufficiently dense neighborhood.
pub const NOISE: isize = -1;

/// Run DBSCAN with Euclidean distance.
///
/// `min_samples` counts the point itself, matching the usual convention:
/// a point is a core point when at least `min_samples` points (including
/// itself) lie within `eps`. Returns one label per point; `NOISE` marks
/// unclustered points, cluster ids start at 0.
pub fn dbscan(points: &[Vec<f64>], eps: f64, min_samples: usize) -> Vec<isize> {
    let n = points.len();
    let mut labels = vec![NOISE; n];
    let mut visited = vec![false; n];
    let mut next_cluster: isize = 0;

    for i in 0..n {
        if visited[i] {
            continue;
        }
        visited[i] = true;

        let neighbors = region_query(points, i, eps);
        if neighbors.len() < min_samples {
            continue; // stays noise unless later absorbed as a border point
        }

        let cluster = next_cluster;
        next_cluster += 1;
        labels[i] = cluster;

        // Expand the cluster breadth-first in index order.
        let mut queue = neighbors;
        let mut qi = 0;
        while qi < queue.len() {
            let j = queue[qi];
            qi += 1;

            if !visited[j] {
                visited[j] = true;
                let j_neighbors = region_query(points, j, eps);
                if j_neighbors.len() >= min_samples {
                    queue.extend(j_neighbors);
                }
            }
            if labels[j] == NOISE {
                labels[j] = cluster;
            }
        }
    }

    labels
}

/// Indices of all points within `eps` of point `i` (including `i` itself).
fn region_query(points: &[Vec<f64>], i: usize, eps: f64) -> Vec<usize> {
    let eps_sq = eps * eps;
    (0..points.len())
        .filter(|&j| dist_sq(&points[i], &points[j]) <= eps_sq)
        .collect()
}

fn dist_sq(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}
