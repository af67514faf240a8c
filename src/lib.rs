//! Core library for the sheet-merge command line application.
//!
//! The library aligns structurally inconsistent spreadsheets to a template's
//! column order and concatenates them into one table. Header comparison lives
//! in [`normalize`], the optional mapping table in [`alias`], header
//! resolution in [`matcher`], the acceptance threshold in [`gate`], row
//! projection and accumulation in [`merge`], file adapters under [`io`], and
//! the run orchestration in [`pipeline`].

pub mod alias;
pub mod config;
pub mod error;
pub mod gate;
pub mod io;
pub mod matcher;
pub mod merge;
pub mod model;
pub mod normalize;
pub mod pipeline;

pub use config::MergeConfig;
pub use error::{MergeError, Result};
