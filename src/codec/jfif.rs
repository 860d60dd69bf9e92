//! JFIF APP0 density reader.
//!
//! The `image` JPEG decoder does not expose the JFIF density fields, so they
//! are read straight from the marker segments ahead of the first scan.

use super::{Density, DensityUnit};

const SOI: u8 = 0xD8;
const APP0: u8 = 0xE0;
const SOS: u8 = 0xDA;
const EOI: u8 = 0xD9;
const JFIF_ID: &[u8; 5] = b"JFIF\0";

/// Read the density from the JFIF header, if the stream has one.
///
/// Returns `None` when the data is not a JPEG stream or carries no JFIF
/// APP0 segment before the first scan.
pub fn read_density(data: &[u8]) -> Option<Density> {
    if data.len() < 2 || data[0] != 0xFF || data[1] != SOI {
        return None;
    }

    let mut pos = 2;
    while pos + 1 < data.len() {
        if data[pos] != 0xFF {
            return None;
        }
        let marker = data[pos + 1];
        pos += 2;
        match marker {
            // fill byte
            0xFF => {
                pos -= 1;
                continue;
            }
            // standalone markers carry no length
            0x01 | 0xD0..=0xD7 => continue,
            SOS | EOI => return None,
            _ => {}
        }

        let len = u16::from_be_bytes([*data.get(pos)?, *data.get(pos + 1)?]) as usize;
        if len < 2 {
            return None;
        }
        let segment = data.get(pos + 2..pos + len)?;
        if marker == APP0 && segment.len() >= 12 && segment.starts_with(JFIF_ID) {
            // segment: "JFIF\0", version (2), units (1), x (2), y (2)
            return Some(Density {
                unit: DensityUnit::from_code(segment[7]),
                x: u16::from_be_bytes([segment[8], segment[9]]),
                y: u16::from_be_bytes([segment[10], segment[11]]),
            });
        }
        pos += len;
    }
    None
}
