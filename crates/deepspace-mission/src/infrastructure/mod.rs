//! Infrastructure layer for the mission runner.
//!
//! Contains the OS-facing pieces: explorer threads, the mission runner that
//! drives headquarters threads, and configuration file storage.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `deepspace_core`, but MUST NOT be imported by the `application` layer.

pub mod crew;
pub mod mission;
pub mod storage;
