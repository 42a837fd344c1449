//! Go-style duration strings: `300ms`, `5m`, `1h30m`, `1.5s`.
//!
//! Used by configuration values and by `<wait...>` boot-command tokens.

use std::fmt::Write as _;
use std::time::Duration;

use thiserror::Error;
use tracing::warn;

/// A duration string that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid duration {input:?}: {reason}")]
pub struct DurationError {
	pub input: String,
	pub reason: &'static str,
}

const UNITS: &[(&str, u128)] = &[
	("ns", 1),
	("us", 1_000),
	("µs", 1_000),
	("μs", 1_000),
	("ms", 1_000_000),
	("s", 1_000_000_000),
	("m", 60 * 1_000_000_000),
	("h", 3_600 * 1_000_000_000),
];

/// Parses a sequence of `<number><unit>` pairs; a bare `0` is also accepted.
/// Negative durations are rejected.
pub fn parse(input: &str) -> Result<Duration, DurationError> {
	let fail = |reason| DurationError {
		input: input.to_string(),
		reason,
	};

	let rest = input.strip_prefix('+').unwrap_or(input);
	if rest.starts_with('-') {
		return Err(fail("negative durations are not allowed"));
	}
	if rest == "0" {
		return Ok(Duration::ZERO);
	}
	if rest.is_empty() {
		return Err(fail("empty"));
	}

	let mut total: u128 = 0;
	let mut rest = rest;
	while !rest.is_empty() {
		let int_len = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
		let (int_part, after_int) = rest.split_at(int_len);

		let (frac_part, after_number) = match after_int.strip_prefix('.') {
			Some(after_dot) => {
				let frac_len = after_dot.find(|c: char| !c.is_ascii_digit()).unwrap_or(after_dot.len());
				after_dot.split_at(frac_len)
			}
			None => ("", after_int),
		};
		if int_part.is_empty() && frac_part.is_empty() {
			return Err(fail("expected a number"));
		}

		let unit_len = after_number.find(|c: char| c.is_ascii_digit() || c == '.').unwrap_or(after_number.len());
		let (unit, after_unit) = after_number.split_at(unit_len);
		if unit.is_empty() {
			return Err(fail("missing unit"));
		}
		let scale = UNITS
			.iter()
			.find(|(name, _)| *name == unit)
			.map(|(_, scale)| *scale)
			.ok_or_else(|| fail("unknown unit"))?;

		let whole: u128 = if int_part.is_empty() {
			0
		} else {
			int_part.parse().map_err(|_| fail("number too large"))?
		};
		let mut nanos = whole.checked_mul(scale).ok_or_else(|| fail("overflow"))?;

		// Digits past nanosecond precision cannot contribute.
		let frac_part = &frac_part[..frac_part.len().min(18)];
		if !frac_part.is_empty() {
			let numerator: u128 = frac_part.parse().map_err(|_| fail("number too large"))?;
			let denominator = 10u128.pow(frac_part.len() as u32);
			nanos += numerator * scale / denominator;
		}

		total = total.checked_add(nanos).ok_or_else(|| fail("overflow"))?;
		rest = after_unit;
	}

	let secs = u64::try_from(total / 1_000_000_000).map_err(|_| fail("overflow"))?;
	Ok(Duration::new(secs, (total % 1_000_000_000) as u32))
}

/// Parses `value`, falling back to `default` when it is absent or invalid.
///
/// An invalid value is logged as a warning and never aborts the run.
pub fn parse_or(field: &str, value: Option<&str>, default: Duration) -> Duration {
	match value {
		None | Some("") => default,
		Some(raw) => parse(raw).unwrap_or_else(|err| {
			warn!(target = "vncboot", field, value = raw, default = %format(default), error = %err, "invalid duration, using default");
			default
		}),
	}
}

/// Formats a duration compactly for user-facing messages (`1m30s`, `250ms`).
pub fn format(duration: Duration) -> String {
	if duration.is_zero() {
		return "0s".to_string();
	}
	if duration < Duration::from_secs(1) {
		return format!("{}ms", duration.as_millis());
	}

	let total = duration.as_secs();
	let (hours, minutes, seconds) = (total / 3600, total / 60 % 60, total % 60);
	let millis = duration.subsec_millis();

	let mut out = String::new();
	if hours > 0 {
		let _ = write!(out, "{hours}h");
	}
	if minutes > 0 {
		let _ = write!(out, "{minutes}m");
	}
	if millis > 0 {
		let frac = format!("{millis:03}");
		let _ = write!(out, "{seconds}.{}s", frac.trim_end_matches('0'));
	} else if seconds > 0 {
		let _ = write!(out, "{seconds}s");
	}
	out
}
