//! Test utilities for arena-based testing.
//!
//! Every compilation owns a fresh arena; these helpers give unit tests the
//! same shape without repeating the setup.
