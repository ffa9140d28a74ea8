// Library root: re-exports all modules so integration tests and the binary
// can reach the loading, run and report layers around the engine.

pub mod config;
pub mod ingest;
pub mod report;
pub mod run;
pub mod source;
