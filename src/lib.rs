// OEWG ternary: voting-bloc analytics over the OEWG transcript corpus.
//
// This is the library root. The ternary math lives in `ternary`, the two
// plots are assembled in `pipeline`, and the CLI/web surfaces sit on top.

pub mod config;
pub mod context;
pub mod db;
pub mod output;
pub mod pipeline;
pub mod presentation;
pub mod status;
pub mod ternary;

#[cfg(feature = "web")]
pub mod web;
