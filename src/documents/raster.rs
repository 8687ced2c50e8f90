//! Embedded PDF images to OCR-ready bytes.
//!
//! Scanners store pages in many shapes: JPEG, bilevel masks, palette images,
//! CMYK. Everything that is not a plain JPEG is unpacked to 8-bit gray or RGB
//! and re-encoded as PNG. Fax and JBIG2 streams need codecs this crate does
//! not carry and are reported as unsupported.

use image::{DynamicImage, GrayImage, RgbImage};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::io::Cursor;

use crate::error::{DocCheckError, Result};

/// Filters whose output lopdf cannot produce.
const UNSUPPORTED_FILTERS: [&str; 3] = ["CCITTFaxDecode", "JBIG2Decode", "JPXDecode"];

pub const NO_IMAGE_MESSAGE: &str = "페이지에서 이미지를 찾을 수 없습니다";

/// How the samples of an image map to color.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColorModel {
    Gray,
    Rgb,
    Cmyk,
    /// Palette lookup; `palette` holds `hival + 1` entries in `base` space.
    Indexed {
        base: Box<ColorModel>,
        palette: Vec<u8>,
    },
}

impl ColorModel {
    /// Samples per pixel in the stream.
    pub fn components(&self) -> usize {
        match self {
            ColorModel::Gray | ColorModel::Indexed { .. } => 1,
            ColorModel::Rgb => 3,
            ColorModel::Cmyk => 4,
        }
    }

    fn is_gray(&self) -> bool {
        match self {
            ColorModel::Gray => true,
            ColorModel::Indexed { base, .. } => base.is_gray(),
            ColorModel::Rgb | ColorModel::Cmyk => false,
        }
    }

    /// Read a `/ColorSpace` value. Returns the model and whether samples are
    /// ink coverage (dark when high) rather than light.
    pub fn from_object(doc: &Document, object: &Object) -> Result<(Self, bool)> {
        let (_, object) = doc.dereference(object)?;
        match object {
            Object::Name(name) => Self::from_family(name).map(|m| (m, false)),
            Object::Array(items) => {
                let family = items
                    .first()
                    .and_then(|f| f.as_name().ok())
                    .ok_or_else(|| unsupported("ColorSpace"))?;
                match family {
                    b"ICCBased" => {
                        let profile = items.get(1).ok_or_else(|| unsupported("ICCBased"))?;
                        let (_, profile) = doc.dereference(profile)?;
                        let n = profile.as_stream()?.dict.get(b"N")?.as_i64()?;
                        match n {
                            1 => Ok((ColorModel::Gray, false)),
                            3 => Ok((ColorModel::Rgb, false)),
                            4 => Ok((ColorModel::Cmyk, false)),
                            _ => Err(unsupported("ICCBased")),
                        }
                    }
                    b"Indexed" | b"I" => Ok((Self::indexed(doc, items)?, false)),
                    // Single colorant: the tint is approximated as gray ink.
                    b"Separation" => Ok((ColorModel::Gray, true)),
                    b"CalGray" | b"CalRGB" => Self::from_family(family).map(|m| (m, false)),
                    _ => Err(unsupported(&String::from_utf8_lossy(family))),
                }
            }
            _ => Err(unsupported("ColorSpace")),
        }
    }

    fn from_family(name: &[u8]) -> Result<Self> {
        match name {
            b"DeviceGray" | b"CalGray" | b"G" => Ok(ColorModel::Gray),
            b"DeviceRGB" | b"CalRGB" | b"RGB" => Ok(ColorModel::Rgb),
            b"DeviceCMYK" | b"CMYK" => Ok(ColorModel::Cmyk),
            other => Err(unsupported(&String::from_utf8_lossy(other))),
        }
    }

    /// `[/Indexed base hival lookup]`
    fn indexed(doc: &Document, items: &[Object]) -> Result<Self> {
        let base = items.get(1).ok_or_else(|| unsupported("Indexed"))?;
        let (base, _) = Self::from_object(doc, base)?;
        if matches!(base, ColorModel::Indexed { .. }) {
            return Err(unsupported("Indexed"));
        }
        let lookup = items.get(3).ok_or_else(|| unsupported("Indexed"))?;
        let (_, lookup) = doc.dereference(lookup)?;
        let palette = match lookup {
            Object::String(bytes, _) => bytes.clone(),
            Object::Stream(stream) => stream_bytes(stream)?,
            _ => return Err(unsupported("Indexed")),
        };
        Ok(ColorModel::Indexed {
            base: Box::new(base),
            palette,
        })
    }
}

/// Raw image samples, rows padded to whole bytes.
#[derive(Debug, Clone)]
pub struct Samples<'a> {
    pub width: u32,
    pub height: u32,
    /// Bits per component: 1, 2, 4, 8 or 16.
    pub bits: u8,
    pub model: &'a ColorModel,
    /// Flip light and dark, from `/Decode [1 0]` or an ink-coverage space.
    pub inverted: bool,
    pub data: &'a [u8],
}

impl Samples<'_> {
    /// Expand to an 8-bit gray or RGB image.
    pub fn to_image(&self) -> Result<DynamicImage> {
        if !matches!(self.bits, 1 | 2 | 4 | 8 | 16) {
            return Err(DocCheckError::Other(format!(
                "지원하지 않는 비트 깊이: {}",
                self.bits
            )));
        }
        let width = self.width as usize;
        let height = self.height as usize;
        let per_row = width * self.model.components();
        let row_bytes = (per_row * usize::from(self.bits)).div_ceil(8);
        if self.data.len() < row_bytes * height {
            return Err(DocCheckError::Other(format!(
                "이미지 데이터가 부족합니다 ({}/{} 바이트)",
                self.data.len(),
                row_bytes * height
            )));
        }

        let gray = self.model.is_gray();
        let mut out = Vec::with_capacity(width * height * if gray { 1 } else { 3 });
        let mut pixel = Vec::with_capacity(4);
        for row in self.data.chunks(row_bytes).take(height) {
            for x in 0..width {
                pixel.clear();
                for c in 0..self.model.components() {
                    pixel.push(self.sample(row, x * self.model.components() + c));
                }
                self.push_pixel(&pixel, &mut out);
            }
        }

        let image = if gray {
            GrayImage::from_raw(self.width, self.height, out).map(DynamicImage::ImageLuma8)
        } else {
            RgbImage::from_raw(self.width, self.height, out).map(DynamicImage::ImageRgb8)
        };
        image.ok_or_else(|| DocCheckError::Other("이미지 버퍼 크기 불일치".to_string()))
    }

    /// Raw value of sample `index` in `row`. 16-bit samples keep the high byte.
    fn sample(&self, row: &[u8], index: usize) -> u8 {
        match self.bits {
            8 => row.get(index).copied().unwrap_or(0),
            16 => row.get(index * 2).copied().unwrap_or(0),
            bits => {
                let bit = index * usize::from(bits);
                let byte = row.get(bit / 8).copied().unwrap_or(0);
                let shift = 8 - usize::from(bits) - bit % 8;
                let mask = (1u8 << bits) - 1;
                (byte >> shift) & mask
            }
        }
    }

    /// Scale a raw sample to 0..=255, applying inversion.
    fn level(&self, raw: u8) -> u8 {
        let scaled = match self.bits {
            8 | 16 => raw,
            bits => {
                let max = (1u32 << bits) - 1;
                u8::try_from(u32::from(raw) * 255 / max).unwrap_or(u8::MAX)
            }
        };
        if self.inverted {
            255 - scaled
        } else {
            scaled
        }
    }

    fn push_pixel(&self, raw: &[u8], out: &mut Vec<u8>) {
        match self.model {
            ColorModel::Indexed { base, palette } => {
                let n = base.components();
                let start = usize::from(raw.first().copied().unwrap_or(0)) * n;
                let entry: Vec<u8> = (start..start + n)
                    .map(|i| palette.get(i).copied().unwrap_or(0))
                    .collect();
                push_color(base, &entry, out);
            }
            model => {
                let levels: Vec<u8> = raw.iter().map(|&v| self.level(v)).collect();
                push_color(model, &levels, out);
            }
        }
    }
}

/// Append one 8-bit color in `model` space as gray or RGB.
fn push_color(model: &ColorModel, levels: &[u8], out: &mut Vec<u8>) {
    let at = |i: usize| levels.get(i).copied().unwrap_or(0);
    match model {
        ColorModel::Gray => out.push(at(0)),
        ColorModel::Rgb => out.extend_from_slice(&[at(0), at(1), at(2)]),
        ColorModel::Cmyk => {
            let k = u32::from(255 - at(3));
            for c in [at(0), at(1), at(2)] {
                let v = u32::from(255 - c) * k / 255;
                out.push(u8::try_from(v).unwrap_or(u8::MAX));
            }
        }
        ColorModel::Indexed { .. } => out.push(at(0)),
    }
}

/// The largest image on a page, as bytes the OCR delegate accepts.
///
/// A JPEG in a gray or RGB space is passed through as stored. Anything else
/// is decoded and re-encoded as PNG.
pub fn page_scan_image(doc: &Document, page_id: ObjectId) -> Result<Vec<u8>> {
    let images = doc.get_page_images(page_id)?;
    let largest = images
        .iter()
        .max_by_key(|img| img.width.saturating_mul(img.height))
        .ok_or_else(|| DocCheckError::Other(NO_IMAGE_MESSAGE.to_string()))?;
    let stream = doc.get_object(largest.id)?.as_stream()?;
    image_bytes(doc, stream)
}

/// Decode one image XObject stream.
pub fn image_bytes(doc: &Document, stream: &Stream) -> Result<Vec<u8>> {
    let dict = &stream.dict;
    let filters = filter_names(dict);
    if let Some(filter) = filters
        .iter()
        .find(|f| UNSUPPORTED_FILTERS.contains(&f.as_str()))
    {
        return Err(unsupported(filter));
    }

    let width = dimension(dict, b"Width")?;
    let height = dimension(dict, b"Height")?;
    let image_mask = dict
        .get(b"ImageMask")
        .and_then(Object::as_bool)
        .unwrap_or(false);
    let (model, ink) = if image_mask {
        (ColorModel::Gray, false)
    } else {
        match dict.get(b"ColorSpace") {
            Ok(space) => ColorModel::from_object(doc, space)?,
            Err(_) => (ColorModel::Gray, false),
        }
    };

    if filters.iter().any(|f| f == "DCTDecode") {
        if filters.len() != 1 {
            return Err(unsupported(&filters.join("+")));
        }
        if model != ColorModel::Cmyk {
            return Ok(stream.content.clone());
        }
        return encode_png(&image::load_from_memory(&stream.content)?);
    }

    let bits = if image_mask {
        1
    } else {
        dict.get(b"BitsPerComponent")
            .and_then(Object::as_i64)
            .ok()
            .and_then(|b| u8::try_from(b).ok())
            .unwrap_or(8)
    };
    let data = stream_bytes(stream)?;
    let samples = Samples {
        width,
        height,
        bits,
        model: &model,
        inverted: ink != decode_inverted(dict),
        data: &data,
    };
    tracing::debug!(width, height, bits, model = ?model, "expanding embedded image");
    encode_png(&samples.to_image()?)
}

pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>> {
    let mut png = Vec::new();
    image.write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)?;
    Ok(png)
}

/// Stream content with its filters removed.
fn stream_bytes(stream: &Stream) -> Result<Vec<u8>> {
    if filter_names(&stream.dict).is_empty() {
        Ok(stream.content.clone())
    } else {
        Ok(stream.decompressed_content()?)
    }
}

fn filter_names(dict: &Dictionary) -> Vec<String> {
    let name = |o: &Object| o.as_name().ok().map(|n| String::from_utf8_lossy(n).into_owned());
    match dict.get(b"Filter") {
        Ok(Object::Array(items)) => items.iter().filter_map(name).collect(),
        Ok(other) => name(other).into_iter().collect(),
        Err(_) => Vec::new(),
    }
}

fn dimension(dict: &Dictionary, key: &[u8]) -> Result<u32> {
    let value = dict.get(key)?.as_i64()?;
    u32::try_from(value)
        .ok()
        .filter(|&v| v > 0)
        .ok_or_else(|| DocCheckError::Other(format!("잘못된 이미지 크기: {value}")))
}

/// `/Decode [1 0]` (or a first range that runs high to low).
fn decode_inverted(dict: &Dictionary) -> bool {
    let high = |o: &Object| match o {
        Object::Integer(i) => *i >= 1,
        Object::Real(r) => *r >= 0.5,
        _ => false,
    };
    match dict.get(b"Decode").and_then(Object::as_array) {
        Ok(range) => match (range.first(), range.get(1)) {
            (Some(lo), Some(hi)) => high(lo) && !high(hi),
            _ => false,
        },
        Err(_) => false,
    }
}

fn unsupported(what: &str) -> DocCheckError {
    DocCheckError::Other(format!("지원하지 않는 이미지 형식: {what}"))
}
