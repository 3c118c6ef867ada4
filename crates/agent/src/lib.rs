//! `trainsync-agent` library crate.
//!
//! Status reporting used by the daemon. The binary entrypoint lives in
//! `main.rs`.

pub mod status;
