//! Resume rendering: portfolio records → LaTeX markup → PDF.
//!
//! `formatter` turns records into `Section`s, `assembler` composes them with
//! the title block into a full document, `compiler` drives the external
//! toolchain.

pub mod assembler;
pub mod compiler;
pub mod contact;
pub mod dates;
pub mod escape;
pub mod formatter;
pub mod fragment;
pub mod handlers;
pub mod layout;
