//! Sync controller tests driven through the public API.

mod controller;
