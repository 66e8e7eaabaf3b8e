/// Returns `part / total`, or 0.0 when there is nothing to divide by.
pub fn rate(part: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    part as f64 / total as f64
}
