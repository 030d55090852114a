//! GIF-flavoured LZW compression
//!
//! The dictionary is a byte [`Trie`]: walking down from a root while the
//! next pixel has a child finds the longest known string in one pass.
//! When all 4096 codes are taken the encoder emits a clear code and starts
//! over, like every common GIF writer does.

use crate::core::error::{GfmError, GfmResult};
use crate::gif::bitwriter::{BitWriter, MAX_CODE_BITS};
use crate::util::{Trie, TrieRef};

const MAX_CODES: u16 = 1 << MAX_CODE_BITS;

/// Reusable LZW encoder; the trie keeps its memory between frames
#[derive(Debug, Default)]
pub struct LzwEncoder {
    trie: Trie,
}

impl LzwEncoder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Compress `pixels` (palette indices) into `out`.
    ///
    /// `min_code_size` must be in `2..=8` and every index must be below
    /// `1 << min_code_size`.
    pub fn encode(
        &mut self,
        pixels: &[u8],
        min_code_size: u8,
        out: &mut BitWriter,
    ) -> GfmResult<()> {
        if !(2..=8).contains(&min_code_size) {
            return Err(GfmError::InvalidArgument(format!(
                "LZW minimum code size {min_code_size}"
            )));
        }
        let clear = 1u16 << min_code_size;
        let end = clear + 1;
        let mut size = min_code_size + 1;
        let mut next = clear + 2;

        self.trie.reset(usize::from(clear));
        out.write(clear, size)?;

        let Some((&first, rest)) = pixels.split_first() else {
            return out.write(end, size);
        };
        let mut cur = self.root(first)?;

        for &pixel in rest {
            if let Some(child) = self.trie.child(cur, pixel) {
                cur = child;
                continue;
            }

            out.write(self.trie.value(cur), size)?;
            if next > (1 << size) - 1 && size < MAX_CODE_BITS {
                size += 1;
            }

            if next < MAX_CODES {
                self.trie.insert_child(cur, pixel, next);
                next += 1;
            } else {
                out.write(clear, size)?;
                self.trie.reset(usize::from(clear));
                size = min_code_size + 1;
                next = clear + 2;
            }
            cur = self.root(pixel)?;
        }

        out.write(self.trie.value(cur), size)?;
        if next > (1 << size) - 1 && size < MAX_CODE_BITS {
            size += 1;
        }
        out.write(end, size)
    }

    fn root(&self, pixel: u8) -> GfmResult<TrieRef> {
        self.trie.root(pixel).ok_or_else(|| {
            GfmError::InvalidArgument(format!("palette index {pixel} outside the code space"))
        })
    }
}

/// Plain table-based decoder used to check the encoder's output
#[cfg(test)]
pub(crate) fn decode(data: &[u8], min_code_size: u8) -> Vec<u8> {
    // Strip sub-block framing
    let mut bytes = Vec::new();
    let mut pos = 0;
    while pos < data.len() {
        let len = usize::from(data[pos]);
        if len == 0 {
            break;
        }
        bytes.extend_from_slice(&data[pos + 1..pos + 1 + len]);
        pos += 1 + len;
    }

    let clear = 1usize << min_code_size;
    let end = clear + 1;
    let reset_table = || -> Vec<Vec<u8>> {
        let mut table: Vec<Vec<u8>> = (0..clear).map(|i| vec![i as u8]).collect();
        table.push(Vec::new());
        table.push(Vec::new());
        table
    };

    let mut table = reset_table();
    let mut size = usize::from(min_code_size) + 1;
    let mut prev: Option<usize> = None;
    let mut out = Vec::new();
    let mut bit = 0usize;

    loop {
        if bit + size > bytes.len() * 8 {
            break;
        }
        let mut code = 0usize;
        for i in 0..size {
            let b = bit + i;
            if bytes[b / 8] & (1 << (b % 8)) != 0 {
                code |= 1 << i;
            }
        }
        bit += size;

        if code == clear {
            table = reset_table();
            size = usize::from(min_code_size) + 1;
            prev = None;
            continue;
        }
        if code == end {
            break;
        }

        let entry = match prev {
            None => table[code].clone(),
            Some(p) => {
                let entry = if code < table.len() {
                    table[code].clone()
                } else {
                    let mut e = table[p].clone();
                    e.push(table[p][0]);
                    e
                };
                if table.len() < 4096 {
                    let mut added = table[p].clone();
                    added.push(entry[0]);
                    table.push(added);
                }
                entry
            }
        };
        out.extend_from_slice(&entry);
        prev = Some(code);

        if table.len() == 1 << size && size < 12 {
            size += 1;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compress(pixels: &[u8], min: u8) -> Vec<u8> {
        let mut encoder = LzwEncoder::new();
        let mut writer = BitWriter::new();
        encoder.encode(pixels, min, &mut writer).unwrap();
        writer.finish()
    }

    #[test]
    fn test_two_color_image() {
        let pixels = [0, 1, 1, 0, 1, 0, 0, 1, 1, 1, 0, 0, 0, 0, 1, 1];
        let data = compress(&pixels, 2);
        assert_eq!(decode(&data, 2), pixels);
    }

    #[test]
    fn test_repetitive_input_compresses() {
        let pixels = vec![3u8; 2000];
        let data = compress(&pixels, 2);
        assert!(data.len() < 200);
        assert_eq!(decode(&data, 2), pixels);
    }

    #[test]
    fn test_dictionary_full_emits_clear() {
        // Pseudo-random bytes exhaust 4096 codes several times over
        let mut state = 0x1234_5678u32;
        let pixels: Vec<u8> = (0..60_000)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                (state >> 24) as u8
            })
            .collect();
        let data = compress(&pixels, 8);
        assert_eq!(decode(&data, 8), pixels);
    }

    #[test]
    fn test_empty_and_single_pixel() {
        assert!(decode(&compress(&[], 2), 2).is_empty());
        assert_eq!(decode(&compress(&[2], 2), 2), vec![2]);
    }

    #[test]
    fn test_rejects_bad_input() {
        let mut encoder = LzwEncoder::new();
        let mut writer = BitWriter::new();
        assert!(encoder.encode(&[0], 1, &mut writer).is_err());
        assert!(encoder.encode(&[0, 9], 2, &mut BitWriter::new()).is_err());
    }
}
