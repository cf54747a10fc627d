// Copyright (c) The mstest-run Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read a `TestRun`.

use crate::{ErrorInfo, Output, ReadError, TestRun, UnitTestResult};
use chrono::{DateTime, FixedOffset, NaiveDateTime};
use quick_xml::{
    Reader,
    events::{BytesStart, Event},
};
use std::{io::BufRead, time::Duration};

static TEST_RUN_TAG: &[u8] = b"TestRun";
static RESULTS_TAG: &[u8] = b"Results";
static UNIT_TEST_RESULT_TAG: &[u8] = b"UnitTestResult";
static OUTPUT_TAG: &[u8] = b"Output";
static STD_OUT_TAG: &[u8] = b"StdOut";
static STD_ERR_TAG: &[u8] = b"StdErr";
static ERROR_INFO_TAG: &[u8] = b"ErrorInfo";
static MESSAGE_TAG: &[u8] = b"Message";
static STACK_TRACE_TAG: &[u8] = b"StackTrace";

/// Which `UnitTestResult` elements are collected from a document.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum ResultsScope {
    /// Only direct children of `TestRun/Results`.
    ///
    /// This is the shape written by `vstest.console.exe`.
    #[default]
    Children,

    /// Every `UnitTestResult` below `TestRun/Results`, at any depth.
    ///
    /// Older `mstest.exe` versions nest results for data-driven and ordered
    /// tests under their parent result. Results are returned in the order
    /// their start tags appear.
    Descendants,
}

/// A leaf element under `UnitTestResult` whose text is captured.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum TextField {
    StdOut,
    StdErr,
    Message,
    StackTrace,
}

impl TextField {
    fn for_path(path: &[Vec<u8>]) -> Option<Self> {
        match path {
            [output, leaf] if output == OUTPUT_TAG => {
                if leaf == STD_OUT_TAG {
                    Some(TextField::StdOut)
                } else if leaf == STD_ERR_TAG {
                    Some(TextField::StdErr)
                } else {
                    None
                }
            }
            [output, error_info, leaf] if output == OUTPUT_TAG && error_info == ERROR_INFO_TAG => {
                if leaf == MESSAGE_TAG {
                    Some(TextField::Message)
                } else if leaf == STACK_TRACE_TAG {
                    Some(TextField::StackTrace)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    fn slot(self, result: &mut UnitTestResult) -> &mut Option<String> {
        let output = result.output.get_or_insert_with(Output::default);
        match self {
            TextField::StdOut => &mut output.std_out,
            TextField::StdErr => &mut output.std_err,
            TextField::Message => {
                &mut output
                    .error_info
                    .get_or_insert_with(ErrorInfo::default)
                    .message
            }
            TextField::StackTrace => {
                &mut output
                    .error_info
                    .get_or_insert_with(ErrorInfo::default)
                    .stack_trace
            }
        }
    }
}

/// A result whose end tag has not been seen yet.
struct PendingResult {
    /// Index into the output slots, which preserves start-tag order.
    slot: usize,

    /// The element stack depth including the `UnitTestResult` element itself.
    depth: usize,

    result: UnitTestResult,
}

struct ReadState {
    scope: ResultsScope,
    stack: Vec<Vec<u8>>,
    test_run: Option<TestRun>,
    results_seen: bool,
    slots: Vec<Option<UnitTestResult>>,
    pending: Vec<PendingResult>,
}

impl ReadState {
    fn new(scope: ResultsScope) -> Self {
        Self {
            scope,
            stack: Vec::new(),
            test_run: None,
            results_seen: false,
            slots: Vec::new(),
            pending: Vec::new(),
        }
    }

    fn start_element(&mut self, element: &BytesStart<'_>) -> Result<(), ReadError> {
        let name = element.name();
        let name = name.as_ref();

        if self.stack.is_empty() {
            // Only the first root element is inspected.
            if self.test_run.is_none() {
                if name != TEST_RUN_TAG {
                    return Err(ReadError::UnexpectedRoot {
                        found: String::from_utf8_lossy(name).into_owned(),
                    });
                }
                self.test_run = Some(read_test_run_attributes(element)?);
            }
        } else if self.stack.len() == 1 && name == RESULTS_TAG {
            self.results_seen = true;
        } else if name == UNIT_TEST_RESULT_TAG && self.collects_result_here() {
            let slot = self.slots.len();
            let result = read_unit_test_result(element, slot)?;
            self.slots.push(None);
            self.pending.push(PendingResult {
                slot,
                depth: self.stack.len() + 1,
                result,
            });
        } else if let Some(pending) = self.pending.last_mut() {
            // Mark leaf elements as present even if they turn out to be empty.
            let mut path = self.stack[pending.depth..].to_vec();
            path.push(name.to_vec());
            if let Some(field) = TextField::for_path(&path) {
                field.slot(&mut pending.result).get_or_insert_with(String::new);
            } else if path.as_slice() == [OUTPUT_TAG] {
                pending.result.output.get_or_insert_with(Output::default);
            } else if path.as_slice() == [OUTPUT_TAG, ERROR_INFO_TAG] {
                pending
                    .result
                    .output
                    .get_or_insert_with(Output::default)
                    .error_info
                    .get_or_insert_with(ErrorInfo::default);
            }
        }

        self.stack.push(name.to_vec());
        Ok(())
    }

    fn end_element(&mut self) {
        if let Some(pending) = self.pending.last() {
            if pending.depth == self.stack.len() {
                if let Some(pending) = self.pending.pop() {
                    self.slots[pending.slot] = Some(pending.result);
                }
            }
        }
        self.stack.pop();
    }

    fn text(&mut self, text: &str) {
        let Some(pending) = self.pending.last_mut() else {
            return;
        };
        if let Some(field) = TextField::for_path(&self.stack[pending.depth..]) {
            field
                .slot(&mut pending.result)
                .get_or_insert_with(String::new)
                .push_str(text);
        }
    }

    fn collects_result_here(&self) -> bool {
        let under_results = self.stack.len() >= 2
            && self.stack[0] == TEST_RUN_TAG
            && self.stack[1] == RESULTS_TAG;
        match self.scope {
            ResultsScope::Children => under_results && self.stack.len() == 2,
            ResultsScope::Descendants => under_results,
        }
    }

    fn finish(self) -> Result<TestRun, ReadError> {
        let Some(mut test_run) = self.test_run else {
            return Err(ReadError::MissingElement { path: "TestRun" });
        };
        if !self.stack.is_empty() {
            return Err(ReadError::UnexpectedEof);
        }
        if !self.results_seen {
            return Err(ReadError::MissingElement {
                path: "TestRun/Results",
            });
        }
        test_run.results = self.slots.into_iter().flatten().collect();
        Ok(test_run)
    }
}

pub(crate) fn read_test_run<R: BufRead>(
    mut reader: Reader<R>,
    scope: ResultsScope,
) -> Result<TestRun, ReadError> {
    let mut state = ReadState::new(scope);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(element) => state.start_element(&element)?,
            Event::Empty(element) => {
                state.start_element(&element)?;
                state.end_element();
            }
            Event::End(_) => state.end_element(),
            Event::Text(text) => state.text(&text.unescape()?),
            Event::CData(cdata) => state.text(&String::from_utf8_lossy(&cdata)),
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    state.finish()
}

fn read_test_run_attributes(element: &BytesStart<'_>) -> Result<TestRun, ReadError> {
    let mut test_run = TestRun::new();
    for attr in element.attributes() {
        let attr = attr?;
        match attr.key.as_ref() {
            b"id" => test_run.id = Some(attr.unescape_value()?.into_owned()),
            b"name" => test_run.name = Some(attr.unescape_value()?.into_owned()),
            _ => {}
        }
    }
    Ok(test_run)
}

fn read_unit_test_result(
    element: &BytesStart<'_>,
    index: usize,
) -> Result<UnitTestResult, ReadError> {
    let mut test_name = None;
    let mut outcome = None;
    let mut test_id = None;
    let mut execution_id = None;
    let mut computer_name = None;
    let mut start_time = None;
    let mut end_time = None;
    let mut duration = None;

    for attr in element.attributes() {
        let attr = attr?;
        let value = attr.unescape_value()?.into_owned();
        match attr.key.as_ref() {
            b"testName" => test_name = Some(value),
            b"outcome" => outcome = Some(value),
            b"testId" => test_id = Some(value),
            b"executionId" => execution_id = Some(value),
            b"computerName" => computer_name = Some(value),
            b"startTime" => start_time = Some(value),
            b"endTime" => end_time = Some(value),
            b"duration" => duration = Some(value),
            _ => {}
        }
    }

    let test_name = test_name.ok_or(ReadError::MissingAttribute {
        index,
        attribute: "testName",
    })?;
    let outcome = outcome.ok_or(ReadError::MissingAttribute {
        index,
        attribute: "outcome",
    })?;

    let mut result = UnitTestResult::new(test_name, outcome);
    result.test_id = test_id;
    result.execution_id = execution_id;
    result.computer_name = computer_name;
    result.start_time = read_timestamp(&result.test_name, "startTime", start_time)?;
    result.end_time = read_timestamp(&result.test_name, "endTime", end_time)?;
    result.duration = match duration {
        Some(value) if !value.is_empty() => Some(parse_duration(&value).ok_or_else(|| {
            ReadError::InvalidDuration {
                test_name: result.test_name.clone(),
                value,
            }
        })?),
        _ => None,
    };

    Ok(result)
}

fn read_timestamp(
    test_name: &str,
    attribute: &'static str,
    value: Option<String>,
) -> Result<Option<DateTime<FixedOffset>>, ReadError> {
    match value {
        Some(value) if !value.is_empty() => parse_timestamp(&value)
            .map(Some)
            .map_err(|error| ReadError::InvalidTimestamp {
                test_name: test_name.to_owned(),
                attribute,
                value,
                error,
            }),
        _ => Ok(None),
    }
}

/// Parses an RFC 3339 timestamp. Timestamps without an offset are read as UTC.
fn parse_timestamp(value: &str) -> Result<DateTime<FixedOffset>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(value).or_else(|error| {
        NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
            .map(|naive| naive.and_utc().fixed_offset())
            .map_err(|_| error)
    })
}

/// Parses a .NET `TimeSpan` in the `[d.]hh:mm:ss[.fffffff]` format.
fn parse_duration(value: &str) -> Option<Duration> {
    let mut parts = value.split(':');
    let (hours_part, minutes, seconds_part) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }

    let (days, hours) = match hours_part.split_once('.') {
        Some((days, hours)) => (parse_digits(days)?, parse_digits(hours)?),
        None => (0, parse_digits(hours_part)?),
    };
    let minutes = parse_digits(minutes)?;
    let (seconds, nanos) = match seconds_part.split_once('.') {
        Some((seconds, fraction)) => (parse_digits(seconds)?, parse_fraction(fraction)?),
        None => (parse_digits(seconds_part)?, 0),
    };
    if hours >= 24 || minutes >= 60 || seconds >= 60 {
        return None;
    }

    let total_secs = days
        .checked_mul(24)?
        .checked_add(hours)?
        .checked_mul(60)?
        .checked_add(minutes)?
        .checked_mul(60)?
        .checked_add(seconds)?;
    Some(Duration::new(total_secs, nanos))
}

fn parse_digits(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Parses fractional seconds into nanoseconds, ignoring digits past the ninth.
fn parse_fraction(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let digits = &s[..s.len().min(9)];
    let scale = 10u32.pow(9 - digits.len() as u32);
    digits.parse::<u32>().ok().map(|n| n * scale)
}
