//! Build-time compiler for Sijill containers.
//!
//! Run it from a build script or a small generator binary and write the
//! result next to your sources; the emitted module depends only on the
//! `sijill` facade.

pub mod compiler;

pub use compiler::Compiler;
