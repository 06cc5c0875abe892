//! Numpy unicode string arrays (`<U{n}` dtype) for class names.
//!
//! `ndarray-npy` only handles numeric element types, so the class array is
//! written with this minimal codec. Only 1-D, C-ordered, little-endian arrays
//! are supported, which is all `np.save(name, classes)` ever produces here.
//!
//! Layout: magic string, version, header length, a python dict literal such
//! as `{'descr': '<U5', 'fortran_order': False, 'shape': (2,), }` padded
//! with spaces to a 64-byte boundary, then `n` UTF-32LE code points per item
//! padded with NULs.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::utils::error::{DatasetError, Result, ResultExt};

const NPY_MAGIC_STRING: &[u8] = b"\x93NUMPY";
const HEADER_ALIGNMENT: usize = 64;

#[derive(Debug, PartialEq)]
struct Header {
    item_chars: usize,
    len: usize,
}

impl Header {
    fn render(&self) -> String {
        format!(
            "{{'descr': '<U{}', 'fortran_order': False, 'shape': ({},), }}",
            self.item_chars, self.len
        )
    }

    // Hacky parser for the header dict, a typical example would be:
    // {'descr': '<U4', 'fortran_order': False, 'shape': (3,), }
    fn parse(header: &str) -> std::result::Result<Header, String> {
        let field = |key: &str| -> std::result::Result<&str, String> {
            let start = header
                .find(&format!("'{}':", key))
                .ok_or_else(|| format!("missing '{}' in header {}", key, header))?;
            Ok(header[start + key.len() + 3..].trim_start())
        };

        let descr = field("descr")?;
        let descr = descr
            .trim_start_matches(['\'', '"'])
            .split(['\'', '"'])
            .next()
            .unwrap_or_default();
        let item_chars = match descr.strip_prefix("<U").or_else(|| descr.strip_prefix("|U")) {
            Some(n) => n
                .parse::<usize>()
                .map_err(|_| format!("bad descr {}", descr))?,
            None => return Err(format!("unsupported descr {}, expected <U", descr)),
        };

        if field("fortran_order")?.starts_with("True") {
            return Err("fortran order is not supported".to_string());
        }

        let shape = field("shape")?;
        let shape = shape
            .trim_start_matches('(')
            .split(')')
            .next()
            .unwrap_or_default();
        let dims: Vec<usize> = shape
            .split(',')
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(|d| d.parse::<usize>().map_err(|_| format!("bad shape ({})", shape)))
            .collect::<std::result::Result<_, _>>()?;
        let len = match dims.as_slice() {
            [len] => *len,
            _ => return Err(format!("expected a 1-D array, got shape ({})", shape)),
        };

        Ok(Header { item_chars, len })
    }
}

/// Write names as a 1-D numpy unicode array
pub fn write_string_npy<S: AsRef<str>>(path: &Path, items: &[S]) -> Result<()> {
    let item_chars = items
        .iter()
        .map(|s| s.as_ref().chars().count())
        .max()
        .unwrap_or(0)
        .max(1);
    let mut header = Header {
        item_chars,
        len: items.len(),
    }
    .render();

    // magic + version + u16 length + header + '\n' must be 64-byte aligned
    let preamble = NPY_MAGIC_STRING.len() + 2 + 2;
    let unpadded = preamble + header.len() + 1;
    let padding = (HEADER_ALIGNMENT - unpadded % HEADER_ALIGNMENT) % HEADER_ALIGNMENT;
    header.push_str(&" ".repeat(padding));
    header.push('\n');
    let header_len = u16::try_from(header.len())
        .map_err(|_| DatasetError::npy(path, "header too long for npy version 1.0"))?;

    let mut writer = BufWriter::new(File::create(path).at_path(path)?);
    writer.write_all(NPY_MAGIC_STRING).at_path(path)?;
    writer.write_all(&[1u8, 0u8]).at_path(path)?;
    writer.write_all(&header_len.to_le_bytes()).at_path(path)?;
    writer.write_all(header.as_bytes()).at_path(path)?;

    for item in items {
        let mut written = 0;
        for c in item.as_ref().chars() {
            writer.write_all(&(c as u32).to_le_bytes()).at_path(path)?;
            written += 1;
        }
        for _ in written..item_chars {
            writer.write_all(&0u32.to_le_bytes()).at_path(path)?;
        }
    }
    writer.flush().at_path(path)
}

/// Read a 1-D numpy unicode array, trailing NULs of each item removed
pub fn read_string_npy(path: &Path) -> Result<Vec<String>> {
    let mut reader = BufReader::new(File::open(path).at_path(path)?);

    let mut magic = vec![0u8; NPY_MAGIC_STRING.len()];
    reader.read_exact(&mut magic).at_path(path)?;
    if magic != NPY_MAGIC_STRING {
        return Err(DatasetError::npy(path, "magic string mismatch"));
    }
    let mut version = [0u8; 2];
    reader.read_exact(&mut version).at_path(path)?;
    let header_len = match version[0] {
        1 => {
            let mut len = [0u8; 2];
            reader.read_exact(&mut len).at_path(path)?;
            u16::from_le_bytes(len) as usize
        }
        2 | 3 => {
            let mut len = [0u8; 4];
            reader.read_exact(&mut len).at_path(path)?;
            u32::from_le_bytes(len) as usize
        }
        other => return Err(DatasetError::npy(path, format!("unsupported version {}", other))),
    };
    let mut header = vec![0u8; header_len];
    reader.read_exact(&mut header).at_path(path)?;
    let header = Header::parse(&String::from_utf8_lossy(&header))
        .map_err(|e| DatasetError::npy(path, e))?;

    let mut data = Vec::new();
    reader.read_to_end(&mut data).at_path(path)?;
    let item_bytes = header.item_chars * 4;
    if data.len() != item_bytes * header.len {
        return Err(DatasetError::npy(
            path,
            format!(
                "expected {} bytes of data, found {}",
                item_bytes * header.len,
                data.len()
            ),
        ));
    }

    data.chunks(item_bytes.max(1))
        .take(header.len)
        .map(|item| {
            item.chunks_exact(4)
                .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
                .take_while(|&cp| cp != 0)
                .map(|cp| {
                    char::from_u32(cp).ok_or_else(|| {
                        DatasetError::npy(path, format!("invalid code point {:#x}", cp))
                    })
                })
                .collect::<Result<String>>()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_header_parse() {
        let header = Header::parse("{'descr': '<U5', 'fortran_order': False, 'shape': (2,), }").unwrap();
        assert_eq!(header, Header { item_chars: 5, len: 2 });

        assert!(Header::parse("{'descr': '<f8', 'fortran_order': False, 'shape': (2,), }").is_err());
        assert!(Header::parse("{'descr': '<U5', 'fortran_order': False, 'shape': (2, 3), }").is_err());
    }

    #[test]
    fn test_header_is_aligned() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("classes.npy");
        write_string_npy(&path, &["cats", "dogs"]).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        let header_len = u16::from_le_bytes([bytes[8], bytes[9]]) as usize;
        assert_eq!((10 + header_len) % 64, 0);
        assert_eq!(bytes[10 + header_len - 1], b'\n');
        assert_eq!(bytes.len(), 10 + header_len + 2 * 4 * 4);
    }

    #[test]
    fn test_unicode_names() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("classes.npy");
        let names = vec!["chat".to_string(), "chien_été".to_string(), "鳥".to_string()];

        write_string_npy(&path, &names).unwrap();
        assert_eq!(read_string_npy(&path).unwrap(), names);
    }

    #[test]
    fn test_empty_list() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("none.npy");
        write_string_npy::<String>(&path, &[]).unwrap();
        assert!(read_string_npy(&path).unwrap().is_empty());
    }

    #[test]
    fn test_rejects_numeric_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("numbers.npy");
        crate::storage::write_array(&path, &ndarray::array![1.0, 2.0]).unwrap();

        assert!(matches!(read_string_npy(&path), Err(DatasetError::Npy { .. })));
    }
}
