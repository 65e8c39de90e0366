//! Code generation phase tests.
//!
//! - `execution` - Runs generated methods in the test interpreter
//! - `class_format` - Structure of the emitted class file

mod class_format;
mod execution;
