//! Named value transforms applied after `|` in a binding.
//!
//! A transform spec is `name` or `name:param`; only the first colon splits,
//! so `date:HH:mm` carries the parameter `HH:mm`. Transforms never fail:
//! input they cannot handle is returned unchanged, and unknown names are
//! the identity.

use time::format_description::well_known::Rfc3339;
use time::{OffsetDateTime, UtcOffset};

use crate::value::TaggedValue;

const DEFAULT_DATE_FORMAT: &str = "MMM d, yyyy";
const DEFAULT_DURATION_FORMAT: &str = "mm:ss";
const DEFAULT_JOIN_SEPARATOR: &str = ",";
const ELLIPSIS: char = '\u{2026}';

/// Apply a single transform spec to a (possibly absent) value.
pub fn apply_transform(spec: &str, value: Option<TaggedValue>) -> Option<TaggedValue> {
    let mut parts = spec.splitn(2, ':').filter(|p| !p.is_empty());
    let Some(name) = parts.next() else {
        return value;
    };
    let param = parts.next();

    match name.trim() {
        "date" => apply_date(value, param.unwrap_or(DEFAULT_DATE_FORMAT)),
        "duration" => apply_duration(value, param.unwrap_or(DEFAULT_DURATION_FORMAT)),
        "uppercase" => match value {
            Some(TaggedValue::String(s)) => Some(TaggedValue::String(s.to_uppercase())),
            other => other,
        },
        "lowercase" => match value {
            Some(TaggedValue::String(s)) => Some(TaggedValue::String(s.to_lowercase())),
            other => other,
        },
        "join" => apply_join(value, param.unwrap_or(DEFAULT_JOIN_SEPARATOR)),
        "default" => match value {
            None | Some(TaggedValue::Null) => {
                Some(TaggedValue::String(param.unwrap_or("").to_string()))
            }
            other => other,
        },
        "truncate" => apply_truncate(value, param),
        "count" => {
            let len = value
                .as_ref()
                .and_then(TaggedValue::as_array)
                .map_or(0, |items| items.len());
            Some(TaggedValue::Int(len as i64))
        }
        // Reserved for condition pipes; inert inside a value pipeline.
        "exists" | "empty" | "!empty" => value,
        _ => value,
    }
}

fn apply_truncate(value: Option<TaggedValue>, param: Option<&str>) -> Option<TaggedValue> {
    let (Some(s), Some(len)) = (
        value.as_ref().and_then(TaggedValue::as_string),
        param.and_then(|p| p.parse::<usize>().ok()),
    ) else {
        return value;
    };
    if s.chars().count() > len {
        let mut truncated: String = s.chars().take(len).collect();
        truncated.push(ELLIPSIS);
        return Some(TaggedValue::String(truncated));
    }
    value
}

fn apply_join(value: Option<TaggedValue>, separator: &str) -> Option<TaggedValue> {
    let Some(items) = value.as_ref().and_then(TaggedValue::as_array) else {
        return value;
    };
    let strings: Vec<&str> = items.iter().filter_map(TaggedValue::as_str).collect();
    Some(TaggedValue::String(strings.join(separator)))
}

fn apply_duration(value: Option<TaggedValue>, format: &str) -> Option<TaggedValue> {
    let Some(ms) = value.as_ref().and_then(TaggedValue::as_int) else {
        return value;
    };
    let total_seconds = ms / 1000;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    let text = if format.contains("HH") || hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    };
    Some(TaggedValue::String(text))
}

fn apply_date(value: Option<TaggedValue>, pattern: &str) -> Option<TaggedValue> {
    let Some(input) = value.as_ref().and_then(TaggedValue::as_string) else {
        return value;
    };
    // RFC 3339 covers internet date-times with and without fractional seconds.
    let Ok(parsed) = OffsetDateTime::parse(&input, &Rfc3339) else {
        return value;
    };
    Some(TaggedValue::String(format_date(
        parsed.to_offset(UtcOffset::UTC),
        pattern,
    )))
}

// ──────────────────────────────────────────────
// Date patterns
// ──────────────────────────────────────────────

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Render `dt` with a Unicode date pattern (`yyyy-MM-dd`, `MMM d, yyyy`,
/// `EEEE h:mm a`, ...).
///
/// Letters form fields by run length; text inside single quotes is
/// literal and `''` is an escaped quote. Unsupported letters are copied.
pub fn format_date(dt: OffsetDateTime, pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == '\'' {
            if chars.get(i + 1) == Some(&'\'') {
                out.push('\'');
                i += 2;
                continue;
            }
            i += 1;
            while i < chars.len() {
                if chars[i] == '\'' {
                    if chars.get(i + 1) == Some(&'\'') {
                        out.push('\'');
                        i += 2;
                        continue;
                    }
                    break;
                }
                out.push(chars[i]);
                i += 1;
            }
            i += 1;
            continue;
        }

        if !c.is_ascii_alphabetic() {
            out.push(c);
            i += 1;
            continue;
        }

        let mut run = 1;
        while i + run < chars.len() && chars[i + run] == c {
            run += 1;
        }
        write_field(&mut out, dt, c, run);
        i += run;
    }

    out
}

fn write_field(out: &mut String, dt: OffsetDateTime, symbol: char, run: usize) {
    let month_index = u8::from(dt.month()) as usize - 1;
    let weekday_index = dt.weekday().number_days_from_monday() as usize;

    match symbol {
        'y' => {
            if run == 2 {
                out.push_str(&format!("{:02}", dt.year().rem_euclid(100)));
            } else {
                out.push_str(&format!("{:0width$}", dt.year(), width = run));
            }
        }
        'M' | 'L' => match run {
            1 | 2 => out.push_str(&pad(u8::from(dt.month()) as i64, run)),
            3 => out.push_str(&MONTHS[month_index][..3]),
            4 => out.push_str(MONTHS[month_index]),
            _ => out.push_str(&MONTHS[month_index][..1]),
        },
        'd' => out.push_str(&pad(dt.day() as i64, run)),
        'D' => out.push_str(&pad(dt.ordinal() as i64, run)),
        'E' => match run {
            1..=3 => out.push_str(&WEEKDAYS[weekday_index][..3]),
            4 => out.push_str(WEEKDAYS[weekday_index]),
            _ => out.push_str(&WEEKDAYS[weekday_index][..1]),
        },
        'H' => out.push_str(&pad(dt.hour() as i64, run)),
        'h' => {
            let h12 = match dt.hour() % 12 {
                0 => 12,
                h => h,
            };
            out.push_str(&pad(h12 as i64, run));
        }
        'm' => out.push_str(&pad(dt.minute() as i64, run)),
        's' => out.push_str(&pad(dt.second() as i64, run)),
        'S' => {
            let nanos = format!("{:09}", dt.nanosecond());
            let digits = run.min(9);
            out.push_str(&nanos[..digits]);
            for _ in digits..run {
                out.push('0');
            }
        }
        'a' => out.push_str(if dt.hour() < 12 { "AM" } else { "PM" }),
        // Output is always UTC.
        'Z' if run < 5 => out.push_str("+0000"),
        'Z' | 'X' | 'x' => out.push('Z'),
        other => {
            for _ in 0..run {
                out.push(other);
            }
        }
    }
}

fn pad(n: i64, width: usize) -> String {
    format!("{:0width$}", n, width = width)
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
