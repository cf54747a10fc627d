// Copyright (c) The mstest-run Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use quick_xml::events::attributes::AttrError;
use thiserror::Error;

/// An error that occurs while reading a [`TestRun`](crate::TestRun).
///
/// Returned by [`TestRun::from_str`](crate::TestRun::from_str) and
/// [`TestRun::from_reader`](crate::TestRun::from_reader). Reading is
/// all-or-nothing: no results are produced if any error occurs.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReadError {
    /// The document is not well-formed XML.
    #[error("error reading TRX document")]
    Xml(#[from] quick_xml::Error),

    /// An attribute could not be parsed.
    #[error("invalid attribute in TRX document")]
    Attr(#[from] AttrError),

    /// The root element is not `TestRun`.
    #[error("expected root element `TestRun`, found `{found}`")]
    UnexpectedRoot {
        /// The name of the root element that was found.
        found: String,
    },

    /// A required element is absent.
    #[error("TRX document is missing the `{path}` element")]
    MissingElement {
        /// The path to the missing element.
        path: &'static str,
    },

    /// A `UnitTestResult` element lacks a required attribute.
    #[error("UnitTestResult #{index} is missing the required `{attribute}` attribute")]
    MissingAttribute {
        /// The zero-based index of the result element in document order.
        index: usize,

        /// The name of the missing attribute.
        attribute: &'static str,
    },

    /// A timestamp attribute could not be parsed.
    #[error("UnitTestResult `{test_name}` has an invalid `{attribute}` value `{value}`")]
    InvalidTimestamp {
        /// The test the attribute belongs to.
        test_name: String,

        /// The attribute name.
        attribute: &'static str,

        /// The raw attribute value.
        value: String,

        /// The underlying parse error.
        #[source]
        error: chrono::ParseError,
    },

    /// A `duration` attribute is not of the form `[d.]hh:mm:ss[.fffffff]`.
    #[error("UnitTestResult `{test_name}` has an invalid `duration` value `{value}`")]
    InvalidDuration {
        /// The test the attribute belongs to.
        test_name: String,

        /// The raw attribute value.
        value: String,
    },

    /// The document ended while elements were still open.
    #[error("unexpected end of TRX document")]
    UnexpectedEof,
}
