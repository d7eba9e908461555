//! Template compiler
//!
//! Compiles the `%`-code format mini-language into a reusable render plan.
//! Compilation happens once per configured format string; rendering walks
//! the precompiled plan and is safe to run concurrently from many
//! producers on a shared [`Template`].
//!
//! Recognized codes (an optional signed decimal width prefix pads the
//! field, `-` left-aligning):
//!
//! - `%T` time `HH:MM:SS.mmm`, `%t` time `HH:MM:SS`
//! - `%D` date `year-month-day`, `%d` date `year/month/day`
//! - `%L` level name
//! - `%S` full `file:line`, `%s` `basename:line`, `%x` basename without
//!   its extension
//! - `%M` message, `%P` caller function path, `%p` caller package path
//! - `%%` literal percent
//!
//! Unknown codes pass through as literal text (dropping any width
//! prefix).

use crate::record::Record;
use std::borrow::Cow;
use std::fmt::Write as _;

use chrono::{Datelike, Timelike};

/// Render template used when none is configured.
pub const DEFAULT_TEMPLATE: &str = "[%T %s] [%L] %M";

/// String-valued slots a width prefix can apply to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StrSlot {
    /// Zero-width placeholder consuming the width spec of a multi-field
    /// code; always renders the empty string.
    Empty,
    Level,
    SourceLong,
    SourceShort,
    SourceStem,
    Message,
    FuncPath,
    PackagePath,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Width {
    Left(usize),
    Right(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Op {
    Literal(String),
    Str { slot: StrSlot, width: Option<Width> },
    Clock { millis: bool },
    Calendar { slash: bool },
}

/// A compiled render plan.
///
/// Immutable after [`Template::compile`]; shared and reused across all
/// renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    ops: Vec<Op>,
}

impl Template {
    /// Compile a format string. Never fails: malformed or unknown codes
    /// degrade to literal text.
    #[must_use]
    pub fn compile(format: &str) -> Self {
        let mut ops = Vec::new();
        let mut literal = String::new();
        let mut chars = format.chars().peekable();

        while let Some(ch) = chars.next() {
            if ch != '%' {
                literal.push(ch);
                continue;
            }

            // Optional signed decimal width prefix.
            let mut sign = None;
            if matches!(chars.peek(), Some('-' | '+')) {
                sign = chars.next();
            }
            let mut digits = String::new();
            while matches!(chars.peek(), Some(c) if c.is_ascii_digit()) {
                digits.push(chars.next().expect("peeked digit"));
            }

            let Some(code) = chars.next() else {
                // Dangling percent at end of input; keep it as typed.
                literal.push('%');
                if let Some(sign) = sign {
                    literal.push(sign);
                }
                literal.push_str(&digits);
                break;
            };

            // A sign without digits is not a width prefix.
            if sign.is_some() && digits.is_empty() {
                literal.push(sign.expect("sign is present"));
                literal.push(code);
                continue;
            }

            let width = match digits.parse::<usize>() {
                Ok(w) if !digits.is_empty() => Some(match sign {
                    Some('-') => Width::Left(w),
                    _ => Width::Right(w),
                }),
                _ => None,
            };

            match code {
                // Multi-field codes expand into several numeric fields, so
                // a width prefix cannot pad the composite output. An extra
                // empty slot consumes the width spec ahead of the real
                // expansion.
                'T' | 't' | 'D' | 'd' => {
                    if width.is_some() {
                        flush_literal(&mut ops, &mut literal);
                        ops.push(Op::Str {
                            slot: StrSlot::Empty,
                            width,
                        });
                    }
                    flush_literal(&mut ops, &mut literal);
                    ops.push(match code {
                        'T' => Op::Clock { millis: true },
                        't' => Op::Clock { millis: false },
                        'D' => Op::Calendar { slash: false },
                        _ => Op::Calendar { slash: true },
                    });
                }
                'L' | 'S' | 's' | 'x' | 'M' | 'P' | 'p' => {
                    flush_literal(&mut ops, &mut literal);
                    let slot = match code {
                        'L' => StrSlot::Level,
                        'S' => StrSlot::SourceLong,
                        's' => StrSlot::SourceShort,
                        'x' => StrSlot::SourceStem,
                        'M' => StrSlot::Message,
                        'P' => StrSlot::FuncPath,
                        _ => StrSlot::PackagePath,
                    };
                    ops.push(Op::Str { slot, width });
                }
                '%' => literal.push('%'),
                // Unknown code: literal passthrough, width prefix dropped.
                other => literal.push(other),
            }
        }

        flush_literal(&mut ops, &mut literal);
        Self {
            source: format.to_string(),
            ops,
        }
    }

    /// The format string this template was compiled from.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Render a record through the plan. Always ends in exactly one line
    /// terminator.
    #[must_use]
    pub fn render(&self, record: &Record) -> String {
        let mut out = String::with_capacity(64 + record.message.len());
        for op in &self.ops {
            match op {
                Op::Literal(text) => out.push_str(text),
                Op::Str { slot, width } => {
                    let value = slot.extract(record);
                    match width {
                        None => out.push_str(&value),
                        Some(Width::Right(w)) => {
                            let w = *w;
                            let _ = write!(out, "{value:>w$}");
                        }
                        Some(Width::Left(w)) => {
                            let w = *w;
                            let _ = write!(out, "{value:<w$}");
                        }
                    }
                }
                Op::Clock { millis } => {
                    let t = &record.timestamp;
                    let _ = write!(out, "{:02}:{:02}:{:02}", t.hour(), t.minute(), t.second());
                    if *millis {
                        let _ = write!(out, ".{:03}", t.timestamp_subsec_millis());
                    }
                }
                Op::Calendar { slash } => {
                    let t = &record.timestamp;
                    let sep = if *slash { '/' } else { '-' };
                    let _ = write!(
                        out,
                        "{}{}{:02}{}{:02}",
                        t.year(),
                        sep,
                        t.month(),
                        sep,
                        t.day()
                    );
                }
            }
        }
        out.push('\n');
        out
    }
}

impl Default for Template {
    fn default() -> Self {
        Self::compile(DEFAULT_TEMPLATE)
    }
}

fn flush_literal(ops: &mut Vec<Op>, literal: &mut String) {
    if !literal.is_empty() {
        ops.push(Op::Literal(std::mem::take(literal)));
    }
}

impl StrSlot {
    fn extract<'r>(self, record: &'r Record) -> Cow<'r, str> {
        match self {
            Self::Empty => Cow::Borrowed(""),
            Self::Level => Cow::Borrowed(record.level.as_str()),
            Self::SourceLong => {
                Cow::Owned(format!("{}:{}", record.source_file, record.source_line))
            }
            Self::SourceShort => Cow::Owned(format!(
                "{}:{}",
                basename(&record.source_file),
                record.source_line
            )),
            Self::SourceStem => {
                let base = basename(&record.source_file);
                // The trailing 3 characters are taken to be the source
                // extension.
                Cow::Borrowed(base.get(..base.len().saturating_sub(3)).unwrap_or(base))
            }
            Self::Message => Cow::Borrowed(&record.message),
            Self::FuncPath => Cow::Borrowed(&record.func_path),
            Self::PackagePath => Cow::Borrowed(&record.package_path),
        }
    }
}

fn basename(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::Level;
    use chrono::{Local, NaiveDate};

    fn record() -> Record {
        let timestamp = NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_milli_opt(14, 5, 9, 123)
            .unwrap()
            .and_local_timezone(Local)
            .unwrap();
        Record {
            level: Level::Warn,
            timestamp,
            source_file: "pkg/app.go".to_string(),
            source_line: 42,
            message: "boom".to_string(),
            func_path: "pkg::app::run".to_string(),
            package_path: "pkg::app".to_string(),
        }
    }

    #[test]
    fn round_trip_formatting() {
        let template = Template::compile("[%T %s] [%L] %M");
        let out = template.render(&record());
        assert_eq!(out, "[14:05:09.123 app.go:42] [WARN] boom\n");
        assert!(out.ends_with('\n') && !out.ends_with("\n\n"));
    }

    #[test]
    fn width_prefixed_multi_field_code() {
        // The width spec is consumed by an empty slot; the time fields
        // themselves render unpadded.
        let template = Template::compile("%5T %M");
        assert_eq!(template.render(&record()), "     14:05:09.123 boom\n");
    }

    #[test]
    fn width_prefixed_date() {
        let template = Template::compile("%3D|");
        assert_eq!(template.render(&record()), "   2024-06-01|\n");
    }

    #[test]
    fn time_without_millis_and_dates() {
        let template = Template::compile("%t %D %d");
        assert_eq!(template.render(&record()), "14:05:09 2024-06-01 2024/06/01\n");
    }

    #[test]
    fn source_variants() {
        let template = Template::compile("%S %s %x");
        assert_eq!(template.render(&record()), "pkg/app.go:42 app.go:42 app\n");
    }

    #[test]
    fn caller_paths() {
        let template = Template::compile("%P %p");
        assert_eq!(template.render(&record()), "pkg::app::run pkg::app\n");
    }

    #[test]
    fn string_widths_align() {
        assert_eq!(Template::compile("%7L|").render(&record()), "   WARN|\n");
        assert_eq!(Template::compile("%-7L|").render(&record()), "WARN   |\n");
        assert_eq!(Template::compile("%+7L|").render(&record()), "   WARN|\n");
    }

    #[test]
    fn literal_percent() {
        let template = Template::compile("100%% %M");
        assert_eq!(template.render(&record()), "100% boom\n");
    }

    #[test]
    fn unknown_code_passes_through_and_drops_width() {
        assert_eq!(Template::compile("%q %M").render(&record()), "q boom\n");
        assert_eq!(Template::compile("%9q").render(&record()), "q\n");
    }

    #[test]
    fn dangling_percent_kept() {
        assert_eq!(Template::compile("abc%").render(&record()), "abc%\n");
        assert_eq!(Template::compile("abc%5").render(&record()), "abc%5\n");
    }

    #[test]
    fn sign_without_digits_is_literal() {
        assert_eq!(Template::compile("%-M").render(&record()), "-M\n");
    }

    #[test]
    fn stem_shorter_than_extension() {
        let mut rec = record();
        rec.source_file = "go".to_string();
        assert_eq!(Template::compile("%x").render(&rec), "\n");
    }

    #[test]
    fn render_is_reusable() {
        let template = Template::compile("%L %M");
        let first = template.render(&record());
        let second = template.render(&record());
        assert_eq!(first, second);
        assert_eq!(template.source(), "%L %M");
    }
}
