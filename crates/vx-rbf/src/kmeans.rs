//! Center discovery by iterative centroid relocation (Lloyd's k-means).

use rand::Rng;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;

use crate::error::RbfError;

/// Result of a k-means run.
#[derive(Clone, Debug, PartialEq)]
pub struct Clustering {
    /// Cluster centers, one vector per cluster.
    pub centers: Vec<Vec<f32>>,
    /// Cluster index of every input point.
    pub assignments: Vec<usize>,
    /// Relocation passes performed.
    pub iterations: usize,
    /// `false` if the iteration cap was hit before assignments stabilized.
    pub converged: bool,
}

/// K-means clustering with a bounded number of relocation passes.
///
/// # Example
/// ```
/// use rand::SeedableRng;
/// use vx_rbf::kmeans::KMeans;
///
/// let points: Vec<Vec<f32>> = vec![vec![0.0], vec![0.1], vec![5.0], vec![5.1]];
/// let refs: Vec<&[f32]> = points.iter().map(Vec::as_slice).collect();
/// let mut rng = rand::rngs::StdRng::seed_from_u64(1);
/// let c = KMeans::new(2, 100).fit(&refs, &mut rng).unwrap();
/// assert!(c.converged);
/// assert_ne!(c.assignments[0], c.assignments[2]);
/// ```
#[derive(Clone, Copy, Debug)]
pub struct KMeans {
    k: usize,
    max_iterations: usize,
}

impl KMeans {
    /// `k` clusters, at most `max_iterations` relocation passes.
    #[must_use]
    pub fn new(k: usize, max_iterations: usize) -> Self {
        Self { k, max_iterations }
    }

    /// Seed the centers with `k` distinct samples drawn by k-means++ weighting,
    /// then relocate.
    ///
    /// # Errors
    /// `NotEnoughSamples` if there are fewer points than clusters, `InvalidParameter`
    /// for `k == 0` or ragged input.
    pub fn fit<R: Rng + ?Sized>(
        &self,
        points: &[&[f32]],
        rng: &mut R,
    ) -> Result<Clustering, RbfError> {
        if self.k == 0 {
            return Err(RbfError::InvalidParameter("k doit être > 0".into()));
        }
        if points.len() < self.k {
            return Err(RbfError::NotEnoughSamples {
                samples: points.len(),
                clusters: self.k,
            });
        }
        let centers = seed_indices(points, self.k, rng)
            .into_iter()
            .map(|i| points[i].to_vec())
            .collect();
        self.fit_from(points, centers)
    }

    /// Relocate from the given initial centers until assignments stabilize.
    ///
    /// Already converged centers are a fixed point: they come back unchanged.
    ///
    /// # Errors
    /// `InvalidParameter` if the centers do not match `k`, `DimensionMismatch` if
    /// a point or center has another width.
    pub fn fit_from(
        &self,
        points: &[&[f32]],
        mut centers: Vec<Vec<f32>>,
    ) -> Result<Clustering, RbfError> {
        let dims = points.first().map_or(0, |p| p.len());
        if centers.len() != self.k {
            return Err(RbfError::InvalidParameter(format!(
                "{} centres fournis pour k = {}",
                centers.len(),
                self.k
            )));
        }
        if let Some(bad) = points
            .iter()
            .map(|p| p.len())
            .chain(centers.iter().map(Vec::len))
            .find(|&len| len != dims)
        {
            return Err(RbfError::DimensionMismatch {
                expected: dims,
                found: bad,
            });
        }

        let mut assignments = assign(points, &centers);
        let mut iterations = 0;
        let mut converged = false;

        while iterations < self.max_iterations {
            iterations += 1;
            relocate(points, &mut centers, &mut assignments);
            let next = assign(points, &centers);
            let moved = next.iter().zip(&assignments).filter(|(a, b)| a != b).count();
            log::debug!("k-means passe {iterations} : {moved} points réassignés");
            if moved == 0 {
                converged = true;
                break;
            }
            assignments = next;
        }

        if !converged {
            log::warn!(
                "k-means non convergé après {} passes (k = {})",
                self.max_iterations,
                self.k
            );
        }

        Ok(Clustering {
            centers,
            assignments,
            iterations,
            converged,
        })
    }
}

/// Squared Euclidean distance.
#[inline]
#[must_use]
pub fn squared_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// k-means++ seeding: each new center is drawn with probability proportional to
/// its squared distance from the centers already chosen. Once every remaining
/// point coincides with a center, unchosen rows are taken in order.
fn seed_indices<R: Rng + ?Sized>(points: &[&[f32]], k: usize, rng: &mut R) -> Vec<usize> {
    let first = rng.random_range(0..points.len());
    let mut chosen = vec![first];
    let mut d2: Vec<f32> = points
        .iter()
        .map(|p| squared_distance(p, points[first]))
        .collect();

    while chosen.len() < k {
        let next = match WeightedIndex::new(d2.iter().copied()) {
            Ok(dist) => dist.sample(rng),
            // all weights zero: only duplicates of chosen centers remain
            Err(_) => (0..points.len())
                .find(|i| !chosen.contains(i))
                .unwrap_or(first),
        };
        chosen.push(next);
        for (d, p) in d2.iter_mut().zip(points) {
            *d = d.min(squared_distance(p, points[next]));
        }
    }
    chosen
}

/// Index of the nearest center for every point; ties go to the lowest index.
fn assign(points: &[&[f32]], centers: &[Vec<f32>]) -> Vec<usize> {
    points
        .iter()
        .map(|p| {
            let mut best = 0;
            let mut best_d = f32::INFINITY;
            for (j, c) in centers.iter().enumerate() {
                let d = squared_distance(p, c);
                if d < best_d {
                    best_d = d;
                    best = j;
                }
            }
            best
        })
        .collect()
}

/// Move every center to the mean of its members. Empty clusters are reseeded
/// with the point farthest from its own center; that point is reassigned.
/// Without such a point (only duplicates left) the empty cluster keeps its
/// center and its spread is derived later.
fn relocate(points: &[&[f32]], centers: &mut [Vec<f32>], assignments: &mut [usize]) {
    let dims = centers.first().map_or(0, Vec::len);
    let mut sums = vec![vec![0.0f64; dims]; centers.len()];
    let mut counts = vec![0usize; centers.len()];

    for (p, &a) in points.iter().zip(assignments.iter()) {
        counts[a] += 1;
        for (s, &v) in sums[a].iter_mut().zip(p.iter()) {
            *s += f64::from(v);
        }
    }

    for ((center, sum), &count) in centers.iter_mut().zip(&sums).zip(&counts) {
        if count > 0 {
            for (c, &s) in center.iter_mut().zip(sum) {
                *c = (s / count as f64) as f32;
            }
        }
    }

    for cluster in 0..centers.len() {
        if counts[cluster] > 0 {
            continue;
        }
        let donor = points
            .iter()
            .enumerate()
            .filter(|&(i, _)| counts[assignments[i]] > 1)
            .map(|(i, p)| (i, squared_distance(p, &centers[assignments[i]])))
            .filter(|&(_, d)| d > 0.0)
            .fold(None, |best: Option<(usize, f32)>, (i, d)| match best {
                Some((_, bd)) if bd >= d => best,
                _ => Some((i, d)),
            });

        let Some((i, _)) = donor else {
            log::debug!("Cluster {cluster} vide sans point distinct : centre conservé");
            continue;
        };
        log::warn!("Cluster {cluster} vide : réinitialisé sur le point {i}");
        counts[assignments[i]] -= 1;
        assignments[i] = cluster;
        counts[cluster] = 1;
        centers[cluster] = points[i].to_vec();
    }
}

/// Spread of every cluster: mean member-to-center distance.
///
/// Clusters with zero spread (singletons, duplicates) fall back to the global
/// heuristic `d_max / sqrt(2K)` over inter-center distances, and every spread
/// is floored at `min_spread`.
#[must_use]
pub fn cluster_spreads(points: &[&[f32]], clustering: &Clustering, min_spread: f32) -> Vec<f32> {
    let k = clustering.centers.len();
    let mut sums = vec![0.0f64; k];
    let mut counts = vec![0usize; k];
    for (p, &a) in points.iter().zip(&clustering.assignments) {
        sums[a] += f64::from(squared_distance(p, &clustering.centers[a]).sqrt());
        counts[a] += 1;
    }

    let mut d_max = 0.0f32;
    for (i, a) in clustering.centers.iter().enumerate() {
        for b in &clustering.centers[i + 1..] {
            d_max = d_max.max(squared_distance(a, b).sqrt());
        }
    }
    let global = d_max / (2.0 * k as f32).sqrt();

    sums.iter()
        .zip(&counts)
        .map(|(&s, &n)| {
            let own = if n > 0 { (s / n as f64) as f32 } else { 0.0 };
            let spread = if own > 0.0 { own } else { global };
            spread.max(min_spread)
        })
        .collect()
}
