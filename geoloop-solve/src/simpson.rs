/// End points weigh 1, odd interior points 4, and even interior points 2.
fn simpson_weight(index: usize, count: usize) -> f64 {
    if index == 0 || index + 1 == count {
        1.0
    } else if index % 2 == 1 {
        4.0
    } else {
        2.0
    }
}

/// Integrates equally spaced samples with the composite Simpson's 1/3 rule.
///
/// `step` is the spacing between samples. The caller is responsible for
/// supplying an odd number of samples.
pub fn simpson_samples<I>(step: f64, samples: I) -> f64
where
    I: IntoIterator<Item = f64>,
    I::IntoIter: ExactSizeIterator,
{
    let samples = samples.into_iter();
    let count = samples.len();
    let sum: f64 = samples
        .enumerate()
        .map(|(i, f)| simpson_weight(i, count) * f)
        .sum();

    step / 3.0 * sum
}
