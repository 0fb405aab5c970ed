// Copyright 2025 the Seurat Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The common error type for seurat operations.

use std::fmt;

/// An error that can occur while rendering 2D graphics.
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// A function was passed an invalid input.
    InvalidInput,
    /// An image had a pixel format the engine cannot represent.
    UnsupportedPixelFormat,
    /// A codec or I/O layer failed unexpectedly.
    CodecError(Box<dyn std::error::Error>),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::InvalidInput => write!(f, "Invalid input"),
            Error::UnsupportedPixelFormat => write!(f, "Unsupported pixel format"),
            Error::CodecError(e) => {
                write!(f, "Codec error: ")?;
                e.fmt(f)
            }
        }
    }
}

impl std::error::Error for Error {}

impl From<Box<dyn std::error::Error>> for Error {
    fn from(e: Box<dyn std::error::Error>) -> Error {
        Error::CodecError(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Error {
        Error::CodecError(e.into())
    }
}
