//! Utility types and functions for vcube.
//!
//! This module contains fundamental types used throughout the library:
//! - [`ElementType`] / [`ByteOrder`] - dtype and machine-format resolution
//! - [`Shape`] - 1-3 dimensional dataset shapes
//! - [`Volume`] - typed n-dimensional arrays
//! - [`Error`] / [`Result`] - error handling

mod element;
mod error;
mod shape;
mod volume;

pub use element::*;
pub use error::*;
pub use shape::*;
pub use volume::*;
