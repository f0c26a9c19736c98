//! A compiler from XDR and ONC RPC interface descriptions (RFC 4506 and
//! RFC 5531) to Rust.
//!
//! Each type declared in a `.x` file becomes a Rust type implementing
//! `xdrgen_runtime::Xdr`, and each program version becomes a handler trait
//! and a table of procedure registrations for an RPC server to dispatch on.

#![warn(rust_2018_idioms)]

pub mod ast;
pub mod codegen;
mod driver;
pub mod files;
pub mod lower;
pub mod names;
pub mod parse;
pub mod source;
pub mod symbols;

// Public exports
pub use driver::{Driver, Status};
