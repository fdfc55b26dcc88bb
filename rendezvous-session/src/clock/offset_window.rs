/// Fixed-capacity ring of the most recent clock samples (milliseconds).
///
/// Once full, each insertion overwrites the oldest slot. The mean is
/// recomputed on every insertion so readers never see a stale average.
#[derive(Debug, Clone)]
pub struct OffsetWindow {
    samples: Vec<f64>,
    capacity: usize,
    next: usize,
    recorded: u64,
    average: f64,
}

impl OffsetWindow {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: Vec::with_capacity(capacity),
            capacity,
            next: 0,
            recorded: 0,
            average: 0.0,
        }
    }

    pub fn push(&mut self, sample: f64) {
        if self.samples.len() < self.capacity {
            self.samples.push(sample);
        } else {
            self.samples[self.next] = sample;
        }
        self.next = (self.next + 1) % self.capacity;
        self.recorded += 1;
        self.average = self.samples.iter().sum::<f64>() / self.samples.len() as f64;
    }

    /// Mean of the retained samples, 0 while empty.
    pub fn average(&self) -> f64 {
        self.average
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total samples ever pushed, including overwritten ones.
    pub fn recorded(&self) -> u64 {
        self.recorded
    }

    /// Retained samples, oldest first.
    pub fn samples(&self) -> Vec<f64> {
        if self.samples.len() < self.capacity {
            return self.samples.clone();
        }
        let (newer, older) = self.samples.split_at(self.next);
        older.iter().chain(newer).copied().collect()
    }
}

impl Default for OffsetWindow {
    fn default() -> Self {
        Self::new(10)
    }
}
