//! Natural Breaks Clustering
//! Optimal 1-D k-means (ckmeans): splits sorted values into contiguous groups
//! with the smallest total within-group sum of squared deviations.

/// Partition `values` into at most `k` contiguous groups of the sorted data.
///
/// Returns fewer than `k` groups only when there are fewer than `k` values.
/// Groups are ascending and never empty. Non-finite values must be filtered
/// out by the caller.
pub fn ckmeans(values: &[f64], k: usize) -> Vec<Vec<f64>> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let n = sorted.len();
    let k = k.min(n);
    if k == 0 {
        return Vec::new();
    }

    // Prefix sums over values shifted by the median to keep the
    // sum-of-squares difference well conditioned.
    let shift = sorted[n / 2];
    let mut sum = vec![0.0; n + 1];
    let mut sum_sq = vec![0.0; n + 1];
    for (i, v) in sorted.iter().enumerate() {
        let x = v - shift;
        sum[i + 1] = sum[i] + x;
        sum_sq[i + 1] = sum_sq[i] + x * x;
    }
    let ssd = |start: usize, end: usize| -> f64 {
        let count = (end - start + 1) as f64;
        let s = sum[end + 1] - sum[start];
        let sq = sum_sq[end + 1] - sum_sq[start];
        (sq - s * s / count).max(0.0)
    };

    // cost[c][j]: best cost of sorted[0..=j] split into c + 1 groups.
    // split[c][j]: start index of the last group in that split.
    let mut cost = vec![vec![f64::INFINITY; n]; k];
    let mut split = vec![vec![0usize; n]; k];
    for j in 0..n {
        cost[0][j] = ssd(0, j);
    }
    for c in 1..k {
        for j in c..n {
            for start in c..=j {
                let candidate = cost[c - 1][start - 1] + ssd(start, j);
                if candidate < cost[c][j] {
                    cost[c][j] = candidate;
                    split[c][j] = start;
                }
            }
        }
    }

    let mut groups = Vec::with_capacity(k);
    let mut end = n - 1;
    for c in (0..k).rev() {
        let start = if c == 0 { 0 } else { split[c][end] };
        groups.push(sorted[start..=end].to_vec());
        if c > 0 {
            end = start - 1;
        }
    }
    groups.reverse();
    groups
}

/// Total within-group sum of squared deviations of a partition.
pub fn within_group_ssd(groups: &[Vec<f64>]) -> f64 {
    groups.iter().map(|g| sum_squared_deviation(g)).sum()
}

pub fn sum_squared_deviation(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    values.iter().map(|v| (v - mean).powi(2)).sum()
}
