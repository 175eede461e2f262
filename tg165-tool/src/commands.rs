// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Command implementations for extraction and upgrade-file handling.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};

use tg165_common::hex::{HexRecord, RecordType, RECORD_DATA_LEN};
use tg165_common::layout::{ALT_FW_ADDR, DUMP_END, DUMP_START, SELECTOR_ADDR, VENDOR_FW_ADDR};

use crate::transport::Transport;
use crate::upgrade_file::{chunk_count, FirmwareImage};

/// Rebuilds a flat binary from Intel-HEX records. Gaps read as erased flash.
#[derive(Default)]
pub struct HexAssembler {
    image: Vec<u8>,
    records: usize,
    finished: bool,
}

impl HexAssembler {
    /// Feed one line. Returns true once the EOF record has been seen.
    pub fn push(&mut self, line: &str) -> Result<bool> {
        if self.finished {
            bail!("record after end-of-file");
        }

        let record = HexRecord::parse(line)
            .with_context(|| format!("record {}: {:?}", self.records + 1, line.trim_end()))?;
        self.records += 1;

        match record.kind {
            RecordType::EndOfFile => self.finished = true,
            RecordType::Data => {
                let start = record.address as usize;
                let end = start + record.data.len();
                if self.image.len() < end {
                    self.image.resize(end, 0xFF);
                }
                self.image[start..end].copy_from_slice(&record.data);
            }
        }
        Ok(self.finished)
    }

    pub fn finish(self) -> Result<Vec<u8>> {
        if !self.finished {
            bail!("stream ended without an end-of-file record");
        }
        Ok(self.image)
    }
}

fn progress_bar(len: u64) -> Result<ProgressBar> {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} records ({eta})",
            )?
            .progress_chars("#>-"),
    );
    Ok(pb)
}

/// Dump the vendor bootloader through the extractor console.
pub fn extract(transport: &mut Transport, out: &Path, keep_hex: bool) -> Result<()> {
    let expected = ((DUMP_END - DUMP_START) as usize / RECORD_DATA_LEN) as u64;
    println!(
        "Dumping 0x{:08x}..0x{:08x} ({} records)",
        DUMP_START, DUMP_END, expected
    );

    transport.drain_rx();
    transport.send_command(b'd')?;

    let pb = progress_bar(expected)?;
    let mut assembler = HexAssembler::default();
    let mut text = String::new();

    loop {
        let line = match transport.read_line() {
            Ok(line) => line,
            Err(e) => {
                pb.abandon();
                return Err(e);
            }
        };
        text.push_str(&line);
        if assembler.push(&line)? {
            break;
        }
        pb.inc(1);
    }
    pb.finish_with_message("Dump complete");

    if keep_hex {
        fs::write(out, &text).with_context(|| format!("Failed to write {}", out.display()))?;
        println!("Wrote {} ({} bytes of HEX)", out.display(), text.len());
    } else {
        let image = assembler.finish()?;
        fs::write(out, &image).with_context(|| format!("Failed to write {}", out.display()))?;
        println!("Wrote {} ({} bytes)", out.display(), image.len());
    }

    Ok(())
}

/// Print the extractor's GPIO snapshot.
pub fn gpio(transport: &mut Transport) -> Result<()> {
    transport.drain_rx();
    transport.send_command(b'g')?;
    print!("{}", transport.read_line()?);
    Ok(())
}

fn read(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn write(path: &Path, data: &[u8]) -> Result<()> {
    fs::write(path, data).with_context(|| format!("Failed to write {}", path.display()))
}

pub fn pack(input: &Path, output: &Path) -> Result<()> {
    let image = FirmwareImage::new(read(input)?, VENDOR_FW_ADDR);
    let packed = image.to_upgrade();
    write(output, &packed)?;
    println!(
        "Packed {} bytes into {} chunks ({})",
        image.len(),
        chunk_count(image.len()),
        output.display()
    );
    Ok(())
}

pub fn unpack(input: &Path, output: &Path) -> Result<()> {
    let image = FirmwareImage::from_upgrade(&read(input)?, VENDOR_FW_ADDR)
        .with_context(|| format!("{} is not a valid upgrade file", input.display()))?;
    write(output, image.bytes())?;
    println!("Unpacked {} bytes ({})", image.len(), output.display());
    Ok(())
}

/// Vendor image with the boot selector and alternate firmware merged in.
pub fn stitch_images(upgrade: &[u8], selector: Vec<u8>, alt: Vec<u8>) -> Result<FirmwareImage> {
    let mut image = FirmwareImage::from_upgrade(upgrade, VENDOR_FW_ADDR)?;
    image.merge(&FirmwareImage::new(selector, SELECTOR_ADDR))?;
    image.merge(&FirmwareImage::new(alt, ALT_FW_ADDR))?;
    image.set_entry_point(SELECTOR_ADDR)?;
    Ok(image)
}

pub fn stitch(upgrade: &Path, selector: &Path, alt: &Path, output: &Path) -> Result<()> {
    let image = stitch_images(&read(upgrade)?, read(selector)?, read(alt)?)?;
    write(output, &image.to_upgrade())?;
    println!(
        "Stitched image: {} bytes, entry point 0x{:08x} ({})",
        image.len(),
        SELECTOR_ADDR,
        output.display()
    );
    Ok(())
}

pub fn info(input: &Path) -> Result<()> {
    let raw = read(input)?;
    let image = FirmwareImage::from_upgrade(&raw, VENDOR_FW_ADDR)
        .with_context(|| format!("{} is not a valid upgrade file", input.display()))?;

    println!("Upgrade file: {}", input.display());
    println!("  File size:   {} bytes", raw.len());
    println!("  Chunks:      {}", chunk_count(image.len()));
    println!("  Image size:  {} bytes", image.len());
    println!("  Load addr:   0x{:08x}", image.load_address());
    match image.entry_point() {
        Some(entry) => println!("  Entry point: 0x{:08x}", entry),
        None => println!("  Entry point: (image too short)"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tg165_common::hex::EOF_LINE;

    fn line(address: u16, data: [u8; 16]) -> String {
        String::from_utf8(HexRecord::encode_data(address, &data).to_vec()).unwrap()
    }

    #[test]
    fn test_assembler_rebuilds_image() {
        let mut asm = HexAssembler::default();
        assert!(!asm.push(&line(0x0000, [0x11; 16])).unwrap());
        assert!(!asm.push(&line(0x0010, [0x22; 16])).unwrap());
        assert!(asm.push(std::str::from_utf8(EOF_LINE).unwrap()).unwrap());

        let image = asm.finish().unwrap();
        assert_eq!(image.len(), 32);
        assert_eq!(&image[..16], &[0x11; 16]);
        assert_eq!(&image[16..], &[0x22; 16]);
    }

    #[test]
    fn test_assembler_fills_gaps_with_erased_bytes() {
        let mut asm = HexAssembler::default();
        asm.push(&line(0x0020, [0x33; 16])).unwrap();
        asm.push(":00000001FF\r\n").unwrap();
        let image = asm.finish().unwrap();
        assert_eq!(&image[..32], &[0xFF; 32]);
        assert_eq!(&image[32..], &[0x33; 16]);
    }

    #[test]
    fn test_assembler_requires_eof() {
        let mut asm = HexAssembler::default();
        asm.push(&line(0, [0; 16])).unwrap();
        assert!(asm.finish().is_err());
    }

    #[test]
    fn test_assembler_rejects_corrupt_record() {
        let mut asm = HexAssembler::default();
        let mut bad = line(0, [0x44; 16]);
        bad.replace_range(9..10, "5");
        let err = asm.push(&bad).unwrap_err();
        assert!(format!("{err:#}").contains("checksum mismatch"), "{err:#}");
    }

    #[test]
    fn test_assembler_rejects_data_after_eof() {
        let mut asm = HexAssembler::default();
        asm.push(":00000001FF").unwrap();
        assert!(asm.push(&line(0, [0; 16])).is_err());
    }

    #[test]
    fn test_stitch_places_payloads_and_patches_entry() {
        let mut vendor = vec![0u8; 2048];
        vendor[4..8].copy_from_slice(&0x0801_0101u32.to_le_bytes());
        let upgrade = FirmwareImage::new(vendor, VENDOR_FW_ADDR).to_upgrade();

        let image = stitch_images(&upgrade, vec![0x5E; 64], vec![0xA1; 32]).unwrap();

        let sel = (SELECTOR_ADDR - VENDOR_FW_ADDR) as usize;
        let alt = (ALT_FW_ADDR - VENDOR_FW_ADDR) as usize;
        assert_eq!(image.len(), alt + 32);
        assert_eq!(&image.bytes()[2048..sel], vec![0u8; sel - 2048].as_slice());
        assert_eq!(&image.bytes()[sel..sel + 64], &[0x5E; 64]);
        assert_eq!(&image.bytes()[alt..], &[0xA1; 32]);
        assert_eq!(&image.bytes()[4..8], &(SELECTOR_ADDR | 1).to_le_bytes());
        assert_eq!(image.entry_point(), Some(SELECTOR_ADDR));
    }
}
