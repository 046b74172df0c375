// ABOUTME: Long-message segmentation into concatenated SMS parts with User Data Headers
// ABOUTME: Counts capacity per data_coding and never splits a UCS-2 character across parts

//! Splitting of application messages into concatenated short messages.
//!
//! Capacity per part is a pure function of the data coding:
//!
//! | data_coding        | capacity        |
//! |--------------------|-----------------|
//! | 0 / unset          | 153 octets      |
//! | 3, 5, 6, 7         | 134 octets      |
//! | 8 (UCS-2)          | 67 characters   |
//! | anything else      | 153 octets      |
//!
//! A message that fits in one part is sent as-is, without a UDH. Otherwise every part is
//! prefixed with a concatenation header (3GPP TS 23.040 9.2.3.24.1 / 9.2.3.24.8). The table
//! assumes the 6-octet header; with the 7-octet 16-bit reference header each part carries one
//! character less.

use crate::datatypes::{DataCoding, NumericPlanIndicator, TypeOfNumber};
use crate::error::{SmppError, SmppResult};
use bytes::{BufMut, Bytes, BytesMut};

pub const DEFAULT_PART_SIZE: usize = 153;
pub const EIGHT_BIT_PART_SIZE: usize = 134;
pub const UCS2_PART_SIZE: usize = 67;

/// UDH part counters are single octets.
pub const MAX_PARTS: usize = 255;

/// Concatenation information element used in each part's UDH.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UdhLayout {
    /// `05 00 03 ref total index`, 8-bit reference
    #[default]
    Concat8,
    /// `06 08 04 ref_hi ref_lo total index`, 16-bit reference
    Concat16,
}

impl UdhLayout {
    pub fn len(&self) -> usize {
        match self {
            UdhLayout::Concat8 => 6,
            UdhLayout::Concat16 => 7,
        }
    }

    /// Reference number derived from the logical message id.
    pub fn reference(&self, message_id: u64) -> u16 {
        match self {
            UdhLayout::Concat8 => (message_id % 256) as u16,
            UdhLayout::Concat16 => (message_id % 65_536) as u16,
        }
    }

    fn write(&self, buf: &mut BytesMut, message_id: u64, total: u8, index: u8) {
        let reference = self.reference(message_id);
        match self {
            UdhLayout::Concat8 => {
                buf.put_slice(&[0x05, 0x00, 0x03, reference as u8, total, index]);
            }
            UdhLayout::Concat16 => {
                buf.put_slice(&[0x06, 0x08, 0x04]);
                buf.put_u16(reference);
                buf.put_slice(&[total, index]);
            }
        }
    }
}

/// Per-message options for a send.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MessageOptions {
    pub data_coding: DataCoding,
    /// Count emoji in the Basic Multilingual Plane as two characters (UCS-2 only)
    pub emoji_aware: bool,
    /// Overrides the session's UDH layout
    pub udh_layout: Option<UdhLayout>,
    pub registered_delivery: u8,
    pub dest_addr_ton: TypeOfNumber,
    pub dest_addr_npi: NumericPlanIndicator,
}

impl MessageOptions {
    pub fn ucs2() -> Self {
        Self {
            data_coding: DataCoding::Ucs2,
            ..Default::default()
        }
    }

    pub fn with_data_coding(mut self, data_coding: DataCoding) -> Self {
        self.data_coding = data_coding;
        self
    }

    pub fn with_emoji_aware(mut self, emoji_aware: bool) -> Self {
        self.emoji_aware = emoji_aware;
        self
    }

    pub fn with_udh_layout(mut self, layout: UdhLayout) -> Self {
        self.udh_layout = Some(layout);
        self
    }

    pub fn with_registered_delivery(mut self, registered_delivery: u8) -> Self {
        self.registered_delivery = registered_delivery;
        self
    }

    pub fn with_destination_numbering(mut self, ton: TypeOfNumber, npi: NumericPlanIndicator) -> Self {
        self.dest_addr_ton = ton;
        self.dest_addr_npi = npi;
        self
    }
}

/// One outbound part of a logical message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// 1-based
    pub index: u8,
    pub total: u8,
    /// short_message contents, UDH included when `has_udh`
    pub payload: Bytes,
    pub has_udh: bool,
}

/// Characters (UCS-2) or octets (everything else) per part.
pub fn get_message_part_size(options: &MessageOptions) -> usize {
    match options.data_coding.to_byte() {
        0x03 | 0x05 | 0x06 | 0x07 => EIGHT_BIT_PART_SIZE,
        0x08 => UCS2_PART_SIZE,
        _ => DEFAULT_PART_SIZE,
    }
}

/// Wire form of `text` for the chosen coding: UTF-16BE for UCS-2, otherwise the text's octets.
pub fn encode_text(text: &str, options: &MessageOptions) -> Bytes {
    if options.data_coding.is_ucs2() {
        let mut buf = BytesMut::with_capacity(text.len() * 2);
        for unit in text.encode_utf16() {
            buf.put_u16(unit);
        }
        buf.freeze()
    } else {
        Bytes::copy_from_slice(text.as_bytes())
    }
}

/// Split an already encoded message body into parts.
///
/// `layout` is used unless the options override it. UCS-2 bodies must be whole UTF-16BE units.
pub fn segment(
    message_id: u64,
    body: &[u8],
    options: &MessageOptions,
    layout: UdhLayout,
) -> SmppResult<Vec<Segment>> {
    let capacity = get_message_part_size(options);
    let layout = options.udh_layout.unwrap_or(layout);

    if options.data_coding.is_ucs2() && body.len() % 2 != 0 {
        return Err(SmppError::InvalidData(format!(
            "UCS-2 body of {} octets is not a whole number of code units",
            body.len()
        )));
    }

    if split(body, options, capacity).len() == 1 {
        return Ok(vec![Segment {
            index: 1,
            total: 1,
            payload: Bytes::copy_from_slice(body),
            has_udh: false,
        }]);
    }

    // The capacity table assumes the 6-octet header; a longer one costs a character per part.
    let chunks = split(body, options, capacity - (layout.len() - UdhLayout::Concat8.len()));

    if chunks.len() > MAX_PARTS {
        return Err(SmppError::InvalidData(format!(
            "message needs {} parts, maximum is {}",
            chunks.len(),
            MAX_PARTS
        )));
    }

    let total = chunks.len() as u8;
    let segments = chunks
        .into_iter()
        .enumerate()
        .map(|(i, chunk)| {
            let index = (i + 1) as u8;
            let mut payload = BytesMut::with_capacity(layout.len() + chunk.len());
            layout.write(&mut payload, message_id, total, index);
            payload.put_slice(chunk);
            Segment {
                index,
                total,
                payload: payload.freeze(),
                has_udh: true,
            }
        })
        .collect();

    Ok(segments)
}

/// Convenience over [`encode_text`] + [`segment`].
pub fn segment_text(
    message_id: u64,
    text: &str,
    options: &MessageOptions,
    layout: UdhLayout,
) -> SmppResult<Vec<Segment>> {
    segment(message_id, &encode_text(text, options), options, layout)
}

fn split<'a>(body: &'a [u8], options: &MessageOptions, capacity: usize) -> Vec<&'a [u8]> {
    if options.data_coding.is_ucs2() {
        split_ucs2(body, capacity, options.emoji_aware)
    } else if body.is_empty() {
        vec![body]
    } else {
        body.chunks(capacity).collect()
    }
}

/// Split UTF-16BE `body` into byte ranges, each carrying at most `capacity` weight.
fn split_ucs2(body: &[u8], capacity: usize, emoji_aware: bool) -> Vec<&[u8]> {
    let units: Vec<u16> = body
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect();

    let mut parts = Vec::new();
    let mut start = 0;
    let mut weight = 0;
    let mut i = 0;

    while i < units.len() {
        let (len, width) = character_at(&units, i, emoji_aware);

        if weight + width > capacity && i > start {
            parts.push(&body[start * 2..i * 2]);
            start = i;
            weight = 0;
        }

        weight += width;
        i += len;
    }

    if start < units.len() || parts.is_empty() {
        parts.push(&body[start * 2..]);
    }
    parts
}

/// Code-unit length and weight of the character starting at `units[i]`.
fn character_at(units: &[u16], i: usize, emoji_aware: bool) -> (usize, usize) {
    let unit = units[i];
    let is_high = (0xD800..=0xDBFF).contains(&unit);
    let next_is_low = units
        .get(i + 1)
        .is_some_and(|next| (0xDC00..=0xDFFF).contains(next));

    if is_high && next_is_low {
        (2, 2)
    } else if emoji_aware && is_emoji(unit as u32) {
        (1, 2)
    } else {
        (1, 1)
    }
}

/// Emoji presentation ranges of the Basic Multilingual Plane. Astral emoji are surrogate pairs
/// and always weigh two.
const EMOJI_RANGES: &[(u32, u32)] = &[
    (0x00A9, 0x00A9),
    (0x00AE, 0x00AE),
    (0x203C, 0x203C),
    (0x2049, 0x2049),
    (0x2122, 0x2122),
    (0x2139, 0x2139),
    (0x2194, 0x2199),
    (0x21A9, 0x21AA),
    (0x231A, 0x231B),
    (0x2328, 0x2328),
    (0x23CF, 0x23CF),
    (0x23E9, 0x23F3),
    (0x23F8, 0x23FA),
    (0x24C2, 0x24C2),
    (0x25AA, 0x25AB),
    (0x25B6, 0x25B6),
    (0x25C0, 0x25C0),
    (0x25FB, 0x25FE),
    (0x2600, 0x27BF),
    (0x2934, 0x2935),
    (0x2B05, 0x2B07),
    (0x2B1B, 0x2B1C),
    (0x2B50, 0x2B50),
    (0x2B55, 0x2B55),
    (0x3030, 0x3030),
    (0x303D, 0x303D),
    (0x3297, 0x3297),
    (0x3299, 0x3299),
];

pub fn is_emoji(code_point: u32) -> bool {
    EMOJI_RANGES
        .iter()
        .any(|&(low, high)| (low..=high).contains(&code_point))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_ucs2(payload: &[u8]) -> Vec<u16> {
        payload
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect()
    }

    fn strip_udh(segment: &Segment) -> &[u8] {
        if segment.has_udh {
            let udh_len = segment.payload[0] as usize + 1;
            &segment.payload[udh_len..]
        } else {
            &segment.payload
        }
    }

    #[test]
    fn part_size_is_a_function_of_data_coding() {
        let size = |byte: u8| {
            get_message_part_size(
                &MessageOptions::default().with_data_coding(DataCoding::from_byte(byte)),
            )
        };
        assert_eq!(size(0), 153);
        for byte in [3, 5, 6, 7] {
            assert_eq!(size(byte), 134);
        }
        assert_eq!(size(8), 67);
        assert_eq!(
            get_message_part_size(&MessageOptions::ucs2().with_emoji_aware(true)),
            67
        );
        for byte in [1, 2, 4, 9, 0xF0] {
            assert_eq!(size(byte), 153);
        }
    }

    #[test]
    fn short_message_is_a_single_part_without_udh() {
        let segments =
            segment_text(7, "hello", &MessageOptions::default(), UdhLayout::Concat8).unwrap();
        assert_eq!(
            segments,
            vec![Segment {
                index: 1,
                total: 1,
                payload: Bytes::from_static(b"hello"),
                has_udh: false,
            }]
        );
    }

    #[test]
    fn exactly_capacity_fits_one_part() {
        let text = "a".repeat(153);
        let segments =
            segment_text(1, &text, &MessageOptions::default(), UdhLayout::Concat8).unwrap();
        assert_eq!(segments.len(), 1);
        assert!(!segments[0].has_udh);
    }

    #[test]
    fn three_hundred_characters_make_two_parts() {
        let text = "x".repeat(300);
        let segments =
            segment_text(300, &text, &MessageOptions::default(), UdhLayout::Concat8).unwrap();

        assert_eq!(segments.len(), 2);
        for (i, segment) in segments.iter().enumerate() {
            assert!(segment.has_udh);
            assert_eq!(
                &segment.payload[..6],
                &[0x05, 0x00, 0x03, (300 % 256) as u8, 2, (i + 1) as u8]
            );
        }
        assert_eq!(strip_udh(&segments[0]).len(), 153);
        assert_eq!(strip_udh(&segments[1]).len(), 147);
    }

    #[test]
    fn sixteen_bit_reference_layout() {
        let text = "y".repeat(200);
        let options = MessageOptions::default().with_udh_layout(UdhLayout::Concat16);
        let segments = segment_text(0x1_2345, &text, &options, UdhLayout::Concat8).unwrap();

        assert_eq!(segments.len(), 2);
        assert_eq!(
            &segments[1].payload[..7],
            &[0x06, 0x08, 0x04, 0x23, 0x45, 2, 2]
        );
    }

    #[test]
    fn sixteen_bit_reference_parts_fit_in_140_octets() {
        let layouts = [
            MessageOptions::ucs2(),
            MessageOptions::default().with_data_coding(DataCoding::Latin1),
        ];
        for options in layouts {
            let options = options.with_udh_layout(UdhLayout::Concat16);
            let segments = segment_text(1, &"a".repeat(140), &options, UdhLayout::Concat8).unwrap();
            assert!(segments.len() > 1);
            for segment in &segments {
                assert!(segment.payload.len() <= 140, "{} octets", segment.payload.len());
            }
        }

        let ucs2 = MessageOptions::ucs2().with_udh_layout(UdhLayout::Concat16);
        let segments = segment_text(1, &"a".repeat(140), &ucs2, UdhLayout::Concat8).unwrap();
        assert_eq!(
            segments.iter().map(|s| strip_udh(s).len() / 2).collect::<Vec<_>>(),
            vec![66, 66, 8]
        );
    }

    #[test]
    fn sixteen_bit_reference_keeps_single_part_capacity() {
        let options = MessageOptions::ucs2().with_udh_layout(UdhLayout::Concat16);
        let segments = segment_text(1, &"a".repeat(67), &options, UdhLayout::Concat8).unwrap();
        assert_eq!(segments.len(), 1);
        assert!(!segments[0].has_udh);
    }

    #[test]
    fn eight_bit_codings_use_smaller_parts() {
        let options = MessageOptions::default().with_data_coding(DataCoding::Latin1);
        let body = vec![0xE9; 135];
        let segments = segment(1, &body, &options, UdhLayout::Concat8).unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(strip_udh(&segments[0]).len(), 134);
        assert_eq!(strip_udh(&segments[1]).len(), 1);
    }

    #[test]
    fn indices_cover_one_to_total_exactly_once() {
        let text = "z".repeat(153 * 4 + 1);
        let segments =
            segment_text(9, &text, &MessageOptions::default(), UdhLayout::Concat8).unwrap();

        assert_eq!(segments.len(), 5);
        let indices: Vec<u8> = segments.iter().map(|s| s.payload[5]).collect();
        assert_eq!(indices, vec![1, 2, 3, 4, 5]);
        assert!(segments.iter().all(|s| s.payload[4] == 5 && s.total == 5));
    }

    #[test]
    fn ucs2_roundtrip_without_wide_characters() {
        let text: String = "Привет, мир! ".repeat(12);
        let options = MessageOptions::ucs2();
        let segments = segment_text(42, &text, &options, UdhLayout::Concat8).unwrap();

        assert!(segments.len() > 1);
        let units: Vec<u16> = segments
            .iter()
            .flat_map(|s| decode_ucs2(strip_udh(s)))
            .collect();
        assert_eq!(String::from_utf16(&units).unwrap(), text);
        assert!(segments.iter().all(|s| decode_ucs2(strip_udh(s)).len() <= 67));
    }

    #[test]
    fn surrogate_pair_at_boundary_moves_to_next_part() {
        // 66 single units then an astral emoji: weight 66 + 2 would overflow 67
        let text = format!("{}{}", "a".repeat(66), "\u{1F600}");
        let segments = segment_text(1, &text, &MessageOptions::ucs2(), UdhLayout::Concat8).unwrap();

        assert_eq!(segments.len(), 2);
        assert_eq!(decode_ucs2(strip_udh(&segments[0])).len(), 66);
        assert_eq!(
            decode_ucs2(strip_udh(&segments[1])),
            "\u{1F600}".encode_utf16().collect::<Vec<_>>()
        );
    }

    #[test]
    fn no_part_starts_with_a_low_surrogate() {
        let text = "b\u{1F680}".repeat(40);
        let segments = segment_text(3, &text, &MessageOptions::ucs2(), UdhLayout::Concat8).unwrap();

        for segment in &segments {
            let units = decode_ucs2(strip_udh(segment));
            assert!(!(0xDC00..=0xDFFF).contains(&units[0]));
            assert!(!(0xD800..=0xDBFF).contains(units.last().unwrap()));
        }
        let units: Vec<u16> = segments
            .iter()
            .flat_map(|s| decode_ucs2(strip_udh(s)))
            .collect();
        assert_eq!(String::from_utf16(&units).unwrap(), text);
    }

    #[test]
    fn emoji_aware_counts_bmp_emoji_as_two() {
        // 34 suns weigh 68 in emoji-aware mode
        let text = "\u{2600}".repeat(34);

        let plain = segment_text(1, &text, &MessageOptions::ucs2(), UdhLayout::Concat8).unwrap();
        assert_eq!(plain.len(), 1);

        let aware = segment_text(
            1,
            &text,
            &MessageOptions::ucs2().with_emoji_aware(true),
            UdhLayout::Concat8,
        )
        .unwrap();
        assert_eq!(aware.len(), 2);
        assert_eq!(decode_ucs2(strip_udh(&aware[0])).len(), 33);
    }

    #[test]
    fn odd_ucs2_body_is_rejected() {
        let result = segment(1, &[0x00, 0x41, 0x00], &MessageOptions::ucs2(), UdhLayout::Concat8);
        assert!(matches!(result, Err(SmppError::InvalidData(_))));
    }

    #[test]
    fn more_than_255_parts_is_rejected() {
        let body = vec![b'a'; 153 * 255 + 1];
        let result = segment(1, &body, &MessageOptions::default(), UdhLayout::Concat8);
        assert!(matches!(result, Err(SmppError::InvalidData(_))));
    }

    #[test]
    fn empty_message_is_one_empty_part() {
        let segments = segment_text(1, "", &MessageOptions::ucs2(), UdhLayout::Concat8).unwrap();
        assert_eq!(segments.len(), 1);
        assert!(segments[0].payload.is_empty());
    }
}
