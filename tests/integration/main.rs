//! Integration tests for the harvester
//!
//! These tests use wiremock to stand in for the channel preview service and
//! run full harvests end-to-end.

mod harvest_tests;
