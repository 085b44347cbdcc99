//! ICNS container codec.
//!
//! An ICNS file is a fixed `icns` magic and total length followed by
//! tag/length/data elements. This module maps that framing onto an
//! [`IconContainer`] keyed by [`VariantTag`], leaving pixel data untouched.

use std::collections::BTreeMap;
use std::fmt;
use std::io::Cursor;
use std::str::FromStr;

use bytes::Bytes;
use icns::{Encoding, IconElement, IconFamily, IconType, OSType};

use super::error::IconError;

/// Size of the `icns` magic plus the big-endian total length.
const HEADER_LENGTH: usize = 8;

/// Four-character ICNS element type, e.g. `ic10` or `TOC `.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VariantTag([u8; 4]);

impl VariantTag {
    /// 512x512@2x (1024 px) PNG/JPEG 2000, the largest variant ICNS defines.
    pub const MAXIMUM: VariantTag = VariantTag(*b"ic10");

    /// Build a tag from its raw bytes.
    pub const fn new(code: [u8; 4]) -> Self {
        VariantTag(code)
    }

    /// Raw four-byte code.
    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }

    fn icon_type(&self) -> Option<IconType> {
        IconType::from_ostype(OSType(self.0))
    }
}

impl From<OSType> for VariantTag {
    fn from(ostype: OSType) -> Self {
        VariantTag(ostype.0)
    }
}

impl From<VariantTag> for OSType {
    fn from(tag: VariantTag) -> Self {
        OSType(tag.0)
    }
}

impl fmt::Display for VariantTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

impl FromStr for VariantTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code: [u8; 4] = s
            .as_bytes()
            .try_into()
            .map_err(|_| format!("variant tag must be exactly 4 bytes, got {s:?}"))?;
        Ok(VariantTag(code))
    }
}

/// Whether `tag` carries a standalone PNG/JPEG 2000 image.
///
/// Masks, RLE bitmaps that depend on a separate mask, and metadata chunks
/// such as `TOC ` or `icnV` are auxiliary and return `false`.
pub fn is_image_variant(tag: VariantTag) -> bool {
    tag.icon_type()
        .is_some_and(|icon_type| icon_type.encoding() == Encoding::JP2PNG)
}

/// Decoded ICNS file: one raw payload per variant tag.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IconContainer {
    variants: BTreeMap<VariantTag, Bytes>,
}

impl IconContainer {
    /// Create an empty container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse ICNS bytes. Every element is kept, image-bearing or not.
    pub fn decode(bytes: &[u8]) -> Result<Self, IconError> {
        if bytes.len() < HEADER_LENGTH {
            return Err(malformed(format!(
                "{} bytes is shorter than the {HEADER_LENGTH}-byte header",
                bytes.len()
            )));
        }
        if &bytes[..4] != b"icns" {
            return Err(malformed(format!(
                "expected magic \"icns\", found {:?}",
                String::from_utf8_lossy(&bytes[..4])
            )));
        }
        let declared = u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]) as usize;
        if declared < HEADER_LENGTH {
            return Err(malformed(format!(
                "header declares {declared} bytes, below the {HEADER_LENGTH}-byte minimum"
            )));
        }
        if declared > bytes.len() {
            return Err(malformed(format!(
                "header declares {declared} bytes but only {} are present",
                bytes.len()
            )));
        }

        validate_elements(&bytes[HEADER_LENGTH..declared])?;

        let family = IconFamily::read(Cursor::new(&bytes[..declared]))
            .map_err(|e| malformed(e.to_string()))?;

        let mut variants = BTreeMap::new();
        for element in family.elements {
            let tag = VariantTag::from(element.ostype);
            if variants.insert(tag, Bytes::from(element.data)).is_some() {
                return Err(malformed(format!("duplicate element {tag}")));
            }
        }
        Ok(IconContainer { variants })
    }

    /// Serialize back into ICNS framing, elements in ascending tag order.
    pub fn encode(&self) -> Result<Vec<u8>, IconError> {
        let mut family = IconFamily::new();
        family.elements = self
            .variants
            .iter()
            .map(|(tag, data)| IconElement::new(OSType::from(*tag), data.to_vec()))
            .collect();

        let mut out = Vec::with_capacity(self.encoded_len());
        family
            .write(&mut out)
            .map_err(|e| malformed(format!("encoding failed: {e}")))?;
        Ok(out)
    }

    /// Only the image-bearing variants. Filtering twice is a no-op.
    pub fn images(&self) -> IconContainer {
        IconContainer {
            variants: self
                .variants
                .iter()
                .filter(|(tag, _)| is_image_variant(**tag))
                .map(|(tag, data)| (*tag, data.clone()))
                .collect(),
        }
    }

    /// Payload for `tag`, if present.
    pub fn get(&self, tag: VariantTag) -> Option<&Bytes> {
        self.variants.get(&tag)
    }

    /// Whether `tag` is present.
    pub fn contains(&self, tag: VariantTag) -> bool {
        self.variants.contains_key(&tag)
    }

    /// Insert or replace a variant, returning the previous payload.
    pub fn insert(&mut self, tag: VariantTag, data: impl Into<Bytes>) -> Option<Bytes> {
        self.variants.insert(tag, data.into())
    }

    /// Tags in ascending order.
    pub fn tags(&self) -> impl Iterator<Item = VariantTag> + '_ {
        self.variants.keys().copied()
    }

    /// `(tag, payload)` pairs in ascending tag order.
    pub fn iter(&self) -> impl Iterator<Item = (VariantTag, &Bytes)> + '_ {
        self.variants.iter().map(|(tag, data)| (*tag, data))
    }

    /// Number of variants.
    pub fn len(&self) -> usize {
        self.variants.len()
    }

    /// Whether the container holds no variants.
    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    /// Variant with the largest payload.
    ///
    /// Byte length stands in for resolution. Ties go to the lowest tag.
    pub fn largest(&self) -> Option<(VariantTag, &Bytes)> {
        self.iter().fold(None, |best, (tag, data)| match best {
            Some((_, best_data)) if best_data.len() >= data.len() => best,
            _ => Some((tag, data)),
        })
    }

    fn encoded_len(&self) -> usize {
        HEADER_LENGTH
            + self
                .variants
                .values()
                .map(|data| HEADER_LENGTH + data.len())
                .sum::<usize>()
    }
}

impl FromIterator<(VariantTag, Bytes)> for IconContainer {
    fn from_iter<I: IntoIterator<Item = (VariantTag, Bytes)>>(iter: I) -> Self {
        IconContainer {
            variants: iter.into_iter().collect(),
        }
    }
}

/// Walk the element headers so corrupt lengths are reported before any
/// payload is allocated.
fn validate_elements(mut body: &[u8]) -> Result<(), IconError> {
    while !body.is_empty() {
        if body.len() < HEADER_LENGTH {
            return Err(malformed(format!(
                "{} trailing bytes cannot hold an element header",
                body.len()
            )));
        }
        let tag = VariantTag::new([body[0], body[1], body[2], body[3]]);
        let length = u32::from_be_bytes([body[4], body[5], body[6], body[7]]) as usize;
        if length < HEADER_LENGTH {
            return Err(malformed(format!(
                "element {tag} declares length {length}, below the {HEADER_LENGTH}-byte minimum"
            )));
        }
        if length > body.len() {
            return Err(malformed(format!(
                "element {tag} declares {length} bytes but only {} remain",
                body.len()
            )));
        }
        body = &body[length..];
    }
    Ok(())
}

fn malformed(reason: impl Into<String>) -> IconError {
    IconError::MalformedContainer {
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(s: &str) -> VariantTag {
        s.parse().unwrap()
    }

    #[test]
    fn classifies_png_variants_as_images() {
        for code in [
            "icp4", "icp5", "icp6", "ic07", "ic08", "ic09", "ic10", "ic11", "ic12", "ic13", "ic14",
        ] {
            assert!(is_image_variant(tag(code)), "{code} should be an image");
        }
        for code in ["s8mk", "l8mk", "h8mk", "t8mk", "is32", "it32", "TOC ", "icnV", "name"] {
            assert!(!is_image_variant(tag(code)), "{code} should not be an image");
        }
    }

    #[test]
    fn rejects_wrong_magic() {
        let err = IconContainer::decode(b"icnx\0\0\0\x08").unwrap_err();
        assert!(matches!(err, IconError::MalformedContainer { .. }));
    }

    #[test]
    fn rejects_truncated_header() {
        let err = IconContainer::decode(b"icns").unwrap_err();
        assert!(matches!(err, IconError::MalformedContainer { .. }));
    }

    #[test]
    fn largest_prefers_lowest_tag_on_tie() {
        let container: IconContainer = [
            (tag("ic09"), Bytes::from_static(b"abcd")),
            (tag("ic08"), Bytes::from_static(b"wxyz")),
            (tag("icp4"), Bytes::from_static(b"ab")),
        ]
        .into_iter()
        .collect();
        let (largest, _) = container.largest().unwrap();
        assert_eq!(largest, tag("ic08"));
    }

    #[test]
    fn tag_parsing_requires_four_bytes() {
        assert!("ic1".parse::<VariantTag>().is_err());
        assert_eq!("TOC ".parse::<VariantTag>().unwrap().to_string(), "TOC ");
    }
}
