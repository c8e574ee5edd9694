//! Cross-module tests for the execution engine
//!
//! Unit tests live next to the code they cover; the modules here exercise
//! whole request flows through the orchestrator, including the wiremock-backed
//! HTTP executor scenarios.
