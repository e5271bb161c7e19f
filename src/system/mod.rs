//! # System Interaction Layer
//!
//! The boundary between the bootstrapper and the machine it runs on.
//!
//! - **`filesystem`**: the `Filesystem` collaborator the loaders read user files through,
//!   with a disk-backed and an in-memory implementation.
//! - **`executor`**: spawns local processes, and `LocalRunner`, which runs release
//!   commands through them.

pub mod executor;
pub mod filesystem;
