/// Cosine similarity; zero when either vector has no magnitude.
///
/// Callers guarantee equal lengths and finite components. Sums are taken in
/// f64 so large components cannot overflow to a NaN score.
pub fn cosine_similarity(query: &[f32], candidate: &[f32]) -> f32 {
    debug_assert_eq!(query.len(), candidate.len());

    let mut dot = 0.0f64;
    let mut query_norm = 0.0f64;
    let mut candidate_norm = 0.0f64;
    for (&q, &c) in query.iter().zip(candidate) {
        let (q, c) = (f64::from(q), f64::from(c));
        dot += q * c;
        query_norm += q * q;
        candidate_norm += c * c;
    }

    let denom = query_norm.sqrt() * candidate_norm.sqrt();
    if denom <= f64::from(f32::EPSILON) {
        return 0.0;
    }
    (dot / denom) as f32
}

/// Whether every component is a finite number
pub fn is_finite_vector(vector: &[f32]) -> bool {
    vector.iter().all(|x| x.is_finite())
}

/// Indices and scores of the `k` best candidates, highest score first.
///
/// The sort is stable, so equal scores keep candidate order.
pub fn top_k_by_cosine(query: &[f32], candidates: &[Vec<f32>], k: usize) -> Vec<(usize, f32)> {
    let mut scores: Vec<(usize, f32)> = candidates
        .iter()
        .enumerate()
        .map(|(idx, candidate)| (idx, cosine_similarity(query, candidate)))
        .collect();

    scores.sort_by(|left, right| right.1.total_cmp(&left.1));
    scores.truncate(k);
    scores
}
