//! Message segmentation.
//!
//! Splits a message into carrier-sized segments the same way the platform
//! splitter does: text that only uses the GSM 7-bit alphabet gets 160
//! septets per single message (153 per part once a concatenation header is
//! needed); anything else is sent as UCS-2 with 70 code units (67 per part).
//! Segments never reorder or drop text, and a multi-unit character is never
//! cut in half.

use serde::Serialize;

/// Single-message limit for GSM 7-bit text, in septets.
pub const GSM7_SINGLE_LIMIT: usize = 160;
/// Per-part limit for concatenated GSM 7-bit text.
pub const GSM7_PART_LIMIT: usize = 153;
/// Single-message limit for UCS-2 text, in UTF-16 code units.
pub const UCS2_SINGLE_LIMIT: usize = 70;
/// Per-part limit for concatenated UCS-2 text.
pub const UCS2_PART_LIMIT: usize = 67;

const GSM7_BASIC: &str = "@£$¥èéùìòÇ\nØø\rÅåΔ_ΦΓΛΩΠΨΣΘΞÆæßÉ !\"#¤%&'()*+,-./0123456789:;<=>?\
¡ABCDEFGHIJKLMNOPQRSTUVWXYZÄÖÑÜ§¿abcdefghijklmnopqrstuvwxyzäöñüà";

// Extension table characters cost an escape septet plus their own.
const GSM7_EXTENDED: &str = "\u{0C}^{}\\[~]|€";

/// Alphabet the message will be sent in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    Gsm7,
    Ucs2,
}

impl Encoding {
    /// Pick the alphabet for `text`.
    pub fn detect(text: &str) -> Self {
        if text.chars().all(|c| GSM7_BASIC.contains(c) || GSM7_EXTENDED.contains(c)) {
            Encoding::Gsm7
        } else {
            Encoding::Ucs2
        }
    }

    pub fn single_limit(&self) -> usize {
        match self {
            Encoding::Gsm7 => GSM7_SINGLE_LIMIT,
            Encoding::Ucs2 => UCS2_SINGLE_LIMIT,
        }
    }

    pub fn part_limit(&self) -> usize {
        match self {
            Encoding::Gsm7 => GSM7_PART_LIMIT,
            Encoding::Ucs2 => UCS2_PART_LIMIT,
        }
    }

    /// Units `c` occupies in this alphabet.
    fn cost(&self, c: char) -> usize {
        match self {
            Encoding::Gsm7 if GSM7_EXTENDED.contains(c) => 2,
            Encoding::Gsm7 => 1,
            Encoding::Ucs2 => c.len_utf16(),
        }
    }

    /// Total units `text` occupies in this alphabet.
    pub fn units(&self, text: &str) -> usize {
        text.chars().map(|c| self.cost(c)).sum()
    }
}

/// Result of splitting one message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segmentation {
    pub encoding: Encoding,
    pub segments: Vec<String>,
}

impl Segmentation {
    pub fn len(&self) -> usize {
        self.segments.len()
    }
}

/// Split `text` into ordered, non-empty-list segments.
///
/// Always returns at least one segment; empty text gives one empty segment.
pub fn segment(text: &str) -> Segmentation {
    let encoding = Encoding::detect(text);

    if encoding.units(text) <= encoding.single_limit() {
        return Segmentation {
            encoding,
            segments: vec![text.to_string()],
        };
    }

    let limit = encoding.part_limit();
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut used = 0;

    for c in text.chars() {
        let cost = encoding.cost(c);
        if used + cost > limit {
            segments.push(std::mem::take(&mut current));
            used = 0;
        }
        current.push(c);
        used += cost;
    }
    if !current.is_empty() {
        segments.push(current);
    }

    Segmentation { encoding, segments }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_message_single_segment() {
        let seg = segment("Help! I need assistance.");
        assert_eq!(seg.encoding, Encoding::Gsm7);
        assert_eq!(seg.segments, vec!["Help! I need assistance.".to_string()]);
        assert_eq!(seg.len(), 1);
    }

    #[test]
    fn test_empty_message_single_empty_segment() {
        let seg = segment("");
        assert_eq!(seg.segments, vec![String::new()]);
    }

    #[test]
    fn test_exactly_160_fits() {
        let text = "a".repeat(160);
        assert_eq!(segment(&text).len(), 1);
    }

    #[test]
    fn test_170_chars_two_segments() {
        let text = "x".repeat(170);
        let seg = segment(&text);
        assert_eq!(seg.len(), 2);
        assert_eq!(seg.segments[0].len(), 153);
        assert_eq!(seg.segments[1].len(), 17);
        assert_eq!(seg.segments.concat(), text);
    }

    #[test]
    fn test_extended_chars_cost_two_septets() {
        // 80 braces = 160 septets, still fits
        let text = "{".repeat(80);
        assert_eq!(Encoding::Gsm7.units(&text), 160);
        assert_eq!(segment(&text).len(), 1);

        // one more septet pushes it over
        let text = format!("{}a", "{".repeat(80));
        let seg = segment(&text);
        assert_eq!(seg.len(), 2);
        assert!(seg.segments.iter().all(|s| Encoding::Gsm7.units(s) <= GSM7_PART_LIMIT));
        assert_eq!(seg.segments.concat(), text);
    }

    #[test]
    fn test_non_gsm_text_uses_ucs2() {
        let seg = segment("Помогите");
        assert_eq!(seg.encoding, Encoding::Ucs2);
        assert_eq!(seg.len(), 1);
    }

    #[test]
    fn test_ucs2_split_at_67() {
        let text = "ж".repeat(71);
        let seg = segment(&text);
        assert_eq!(seg.encoding, Encoding::Ucs2);
        assert_eq!(seg.len(), 2);
        assert_eq!(seg.segments[0].chars().count(), 67);
        assert_eq!(seg.segments.concat(), text);
    }

    #[test]
    fn test_surrogate_pairs_never_split() {
        // each emoji is two UTF-16 units; 40 of them = 80 units
        let text = "🚨".repeat(40);
        let seg = segment(&text);
        assert_eq!(seg.len(), 2);
        assert!(seg.segments.iter().all(|s| Encoding::Ucs2.units(s) <= UCS2_PART_LIMIT));
        assert_eq!(seg.segments.concat(), text);
    }

    #[test]
    fn test_location_link_message() {
        let text = "EMERGENCY! I need help. My location: https://maps.google.com/?q=44.9778,-93.2650 Sent via SafeWalk at 22:15. Please call me or contact emergency services immediately.";
        let seg = segment(text);
        assert_eq!(seg.encoding, Encoding::Gsm7);
        assert_eq!(seg.len(), 2);
        assert_eq!(seg.segments.concat(), text);
    }
}
