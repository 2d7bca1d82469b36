//! Test module organization.
//!
//! This module organizes all integration tests for the OS concepts simulator.

/// Variable-partition allocator tests.
mod allocator_tests;

/// Configuration parsing and simulation context tests.
mod config_tests;


/// Threaded live runner tests.
mod live_tests;

/// Page replacement algorithm tests.
mod paging_tests;

/// Process, thread and process table tests.
mod process_tests;
