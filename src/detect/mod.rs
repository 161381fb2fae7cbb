//! Dead-code detection over the call graph.

mod dead_code;

pub use dead_code::{
    detect_dead_code, is_test_file, Confidence, DeadCodeEntry, DeadCodeOptions,
    DEFAULT_ENTRY_POINTS,
};
