use rand::seq::SliceRandom;
use rand::Rng;

/// Shuffle `0..n` and cut it into train and test index sets. The test set
/// receives `ceil(n * test_fraction)` indices.
pub fn train_test_split<R: Rng + ?Sized>(n: usize, test_fraction: f64, rng: &mut R) -> (Vec<usize>, Vec<usize>) {
    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(rng);

    let fraction = test_fraction.clamp(0.0, 1.0);
    let n_test = ((n as f64) * fraction - 1e-9).ceil().max(0.0) as usize;
    let train = indices.split_off(n_test.min(n));
    (train, indices)
}
