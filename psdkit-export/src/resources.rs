//! Image resources section.
//!
//! A length-prefixed sequence of `8BIM` blocks, each carrying a resource
//! id, an (empty) pascal name, its own length prefix, and even padding.
//! Blocks are assembled in memory first; only metadata lives here, never
//! pixel planes.

use std::io::Write;

use byteorder::{BigEndian, WriteBytesExt};

use psdkit_core::{Error, Result};
use psdkit_io::Storage;

use crate::document::Document;
use crate::writer::StorageWriter;

const RESOURCE_SIGNATURE: &[u8; 4] = b"8BIM";

const ID_ALPHA_NAMES: u16 = 1006;
const ID_DISPLAY_INFO: u16 = 1007;
const ID_RESOLUTION_INFO: u16 = 1005;
const ID_JPEG_THUMBNAIL: u16 = 1036;
const ID_ICC_PROFILE: u16 = 1039;
const ID_EXIF_DATA: u16 = 1058;
const ID_XMP_METADATA: u16 = 1060;

pub(crate) fn write_image_resources<S: Storage>(
    writer: &mut StorageWriter<S>,
    document: &Document,
) -> Result<()> {
    let mut body = Vec::new();

    if let Some(info) = &document.resolution {
        let mut data = Vec::with_capacity(16);
        data.write_u32::<BigEndian>(fixed_16_16(info.horizontal_res))?;
        data.write_u16::<BigEndian>(info.horizontal_unit)?;
        data.write_u16::<BigEndian>(info.width_unit)?;
        data.write_u32::<BigEndian>(fixed_16_16(info.vertical_res))?;
        data.write_u16::<BigEndian>(info.vertical_unit)?;
        data.write_u16::<BigEndian>(info.height_unit)?;
        write_block(&mut body, ID_RESOLUTION_INFO, &data)?;
    }

    if !document.alpha_channels.is_empty() {
        write_block(&mut body, ID_ALPHA_NAMES, &alpha_names(document))?;
        write_block(&mut body, ID_DISPLAY_INFO, &display_info(document)?)?;
    }

    if !document.attributes.is_empty() {
        write_block(&mut body, ID_XMP_METADATA, xmp_packet(document).as_bytes())?;
    }

    if let Some(profile) = &document.icc_profile {
        write_block(&mut body, ID_ICC_PROFILE, profile)?;
    }

    if let Some(exif) = &document.exif_data {
        write_block(&mut body, ID_EXIF_DATA, exif)?;
    }

    if let Some(thumbnail) = &document.thumbnail {
        let mut data = Vec::with_capacity(28 + thumbnail.jpeg.len());
        // 24-bit interleaved RGB raster described by the header, stored as JPEG.
        let width_bytes = (thumbnail.width * 24).div_ceil(32) * 4;
        data.write_u32::<BigEndian>(1)?; // format: JPEG
        data.write_u32::<BigEndian>(thumbnail.width)?;
        data.write_u32::<BigEndian>(thumbnail.height)?;
        data.write_u32::<BigEndian>(width_bytes)?;
        data.write_u32::<BigEndian>(width_bytes * thumbnail.height)?;
        data.write_u32::<BigEndian>(section_u32(thumbnail.jpeg.len(), "thumbnail size")?)?;
        data.write_u16::<BigEndian>(24)?;
        data.write_u16::<BigEndian>(1)?; // planes
        data.extend_from_slice(&thumbnail.jpeg);
        write_block(&mut body, ID_JPEG_THUMBNAIL, &data)?;
    }

    writer.write_u32::<BigEndian>(section_u32(body.len(), "image resources length")?)?;
    writer.write_all(&body)?;
    tracing::debug!(bytes = body.len(), "image resources written");
    Ok(())
}

/// Append one resource block: signature, id, empty name, length, data,
/// padded to an even byte boundary.
fn write_block(out: &mut Vec<u8>, id: u16, data: &[u8]) -> Result<()> {
    out.extend_from_slice(RESOURCE_SIGNATURE);
    out.write_u16::<BigEndian>(id)?;
    out.write_u16::<BigEndian>(0)?; // empty pascal name, padded
    out.write_u32::<BigEndian>(section_u32(data.len(), "resource block length")?)?;
    out.extend_from_slice(data);
    if data.len() % 2 != 0 {
        out.push(0);
    }
    Ok(())
}

/// Alpha channel names as a run of pascal strings.
fn alpha_names(document: &Document) -> Vec<u8> {
    let mut data = Vec::new();
    for channel in &document.alpha_channels {
        let name: Vec<u8> = channel
            .name
            .bytes()
            .filter(|b| b.is_ascii())
            .take(255)
            .collect();
        data.push(name.len() as u8);
        data.extend_from_slice(&name);
    }
    data
}

/// Display info: color, opacity, and mode per alpha channel.
fn display_info(document: &Document) -> Result<Vec<u8>> {
    let mut data = Vec::with_capacity(document.alpha_channels.len() * 14);
    for channel in &document.alpha_channels {
        data.write_u16::<BigEndian>(0)?; // RGB color space
        for component in channel.color {
            data.write_u16::<BigEndian>(component)?;
        }
        data.write_u16::<BigEndian>(channel.opacity)?;
        data.push(channel.mode.to_u8());
        data.push(0); // padding
    }
    Ok(data)
}

/// Minimal XMP packet carrying the document attributes.
fn xmp_packet(document: &Document) -> String {
    let mut xml = String::new();
    xml.push_str("<?xpacket begin=\"\u{FEFF}\" id=\"W5M0MpCehiHzreSzNTczkc9d\"?>\n");
    xml.push_str("<x:xmpmeta xmlns:x=\"adobe:ns:meta/\">\n");
    xml.push_str(" <rdf:RDF xmlns:rdf=\"http://www.w3.org/1999/02/22-rdf-syntax-ns#\">\n");
    xml.push_str(
        "  <rdf:Description rdf:about=\"\" xmlns:psdkit=\"http://ns.psdkit.dev/1.0/\">\n",
    );
    for attribute in &document.attributes {
        let name = sanitize_xml_name(&attribute.name);
        xml.push_str("   <psdkit:");
        xml.push_str(&name);
        xml.push('>');
        xml.push_str(&escape_xml(&attribute.value));
        xml.push_str("</psdkit:");
        xml.push_str(&name);
        xml.push_str(">\n");
    }
    xml.push_str("  </rdf:Description>\n </rdf:RDF>\n</x:xmpmeta>\n");
    xml.push_str("<?xpacket end=\"w\"?>");
    xml
}

fn sanitize_xml_name(name: &str) -> String {
    let mut sanitized: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if sanitized.is_empty() || sanitized.starts_with(|c: char| c.is_ascii_digit()) {
        sanitized.insert(0, '_');
    }
    sanitized
}

fn escape_xml(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// 16.16 fixed-point encoding used by the resolution info resource.
fn fixed_16_16(value: f32) -> u32 {
    (value as f64 * 65536.0).round() as u32
}

pub(crate) fn section_u32(len: usize, field: &'static str) -> Result<u32> {
    u32::try_from(len).map_err(|_| Error::ValueTooLarge {
        field,
        value: len as u64,
        max: u32::MAX as u64,
    })
}
