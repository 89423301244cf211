//! TIN-X library main entry point.
//!
//! TIN-X (Target Importance and Novelty eXplorer) scores proteins and diseases by their
//! co-mentions in PubMed abstracts, based on the JensenLab text-mining mentions files.

pub mod common;
pub mod error;
pub mod load;
pub mod mentions;
pub mod obo;
pub mod proteins;
pub mod score;
