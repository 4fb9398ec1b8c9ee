//! Centralized protobuf message definitions.
//!
//! All wire messages used by the serialization framework live in this
//! crate. The schema is documented in `proto/tribuo/core.proto`; the
//! structs here are maintained by hand against it so the build does
//! not depend on `protoc`. There should be a minimal amount of logic
//! in this crate.

pub mod core;
