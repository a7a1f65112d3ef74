//! Fact Find - transcript extraction reconciliation
//!
//! This crate merges AI-extracted, confidence-scored facts from client
//! meeting transcripts into versioned financial-advisory client records,
//! either field by field under adviser review or in unattended batches
//! that pause when a client may already exist.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
