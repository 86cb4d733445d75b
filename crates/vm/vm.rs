//! Bytecode-facing pieces of the EVM: a cursor over contract code that
//! classifies positions as opcodes or push-data, and the per-contract read
//! coverage it records along the way.

pub mod code_stream;
pub mod coverage;
pub mod opcodes;

pub use code_stream::{CodeStream, OpcodeIter, SeekGuard};
pub use coverage::{CodeReads, CodeReadsMap};
