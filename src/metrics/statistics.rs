/// Summary statistics of a series. `std` is the population standard deviation.
#[derive(Debug, Clone, PartialEq)]
pub struct Statistics {
    pub mean: f32,
    pub median: f32,
    pub std: f32,
    pub min: f32,
    /// Position of the first occurrence of `min`
    pub argmin: usize,
    pub max: f32,
    /// Position of the first occurrence of `max`
    pub argmax: usize,
    pub count: usize,
}

impl Statistics {
    /// Compute statistics from a slice of values. Returns `None` for an empty slice.
    pub fn from_slice(values: &[f32]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let count = values.len();
        let sum: f32 = values.iter().sum();
        let mean = sum / count as f32;

        let variance = values.iter()
            .map(|&x| (x - mean).powi(2))
            .sum::<f32>() / count as f32;
        let std = variance.sqrt();

        let (mut argmin, mut argmax) = (0, 0);
        for (i, &v) in values.iter().enumerate() {
            if v < values[argmin] {
                argmin = i;
            }
            if v > values[argmax] {
                argmax = i;
            }
        }

        Some(Statistics {
            mean,
            median: median(values),
            std,
            min: values[argmin],
            argmin,
            max: values[argmax],
            argmax,
            count,
        })
    }
}

/// Middle value of the sorted series, or the mean of the two middle values.
pub fn median(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}
