//! Pipeline configuration.

use relgen_core::{Schema, Settings};

/// Configuration for one pipeline run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineConfig {
    /// Queue and buffer sizing.
    pub settings: Settings,
    /// Base seed for reproducible generation; OS entropy when absent.
    pub seed: Option<u64>,
}

impl PipelineConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Take settings and seed from a schema.
    pub fn from_schema(schema: &Schema) -> Self {
        Self {
            settings: schema.settings.clone(),
            seed: schema.seed,
        }
    }

    /// Set the base seed.
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Set the bound of every topic queue.
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.settings.queue_capacity = capacity;
        self
    }

    /// Set the capacity of exact FIFO buffers.
    pub fn with_exact_buffer_capacity(mut self, capacity: usize) -> Self {
        self.settings.exact_buffer_capacity = capacity;
        self
    }

    /// Set the ring size of sample buffers.
    pub fn with_sample_buffer_capacity(mut self, capacity: usize) -> Self {
        self.settings.sample_buffer_capacity = capacity;
        self
    }

    /// Set whether the host should exit when the run finishes.
    pub fn with_exit_on_completion(mut self, exit: bool) -> Self {
        self.settings.exit_on_completion = exit;
        self
    }
}
