//! Test suite for the episode driver.
//!
//! # Test Organization
//!
//! - `config_tests`: Configuration builders, validation and update-count scaling
//! - `training_loop_tests`: Episode structure, learning start, evaluation and resume
//!
//! # Critical Invariants Tested
//!
//! 1. **Terminal vs Truncated Distinction**
//!    - Terminal: stored with done = 1, no bootstrap
//!    - Truncated: ends the episode but is stored with done = 0
//!
//! 2. **Random Start**
//!    - Counted in the episode return, never stored
//!
//! 3. **Learning Start**
//!    - No updates before `explore_time` transitions
//!    - Warmup updates exactly once
