//! Versioned protobuf serialization for object graphs.
//!
//! Every participating type serializes into a 3-field envelope
//! (version, class name, opaque payload) and registers a versioned
//! factory for the reverse direction. The [`protos`] module holds the
//! framework: the [`protos::ProtoSerializable`] contract, the
//! class-name registry with redirect support, the field-descriptor
//! engine used by types without bespoke payload messages, and the
//! per-call [`protos::cache::DeserializationCache`] that restores
//! sharing of structurally equal domains.
//!
//! The [`domain`] module holds the shared immutable domain types
//! (feature and output domains) and the model types built on them.

pub mod domain;
pub mod errors;
pub mod protos;
