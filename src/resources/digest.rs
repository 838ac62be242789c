//! SHA-256 helpers.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

use ring::digest::{Context, SHA256};

/// Copy `reader` into `writer`, returning the hex SHA-256 of the bytes copied.
pub fn copy_hashing<R: Read, W: Write>(reader: &mut R, writer: &mut W) -> io::Result<String> {
    let mut context = Context::new(&SHA256);
    let mut buffer = [0u8; 64 * 1024];
    loop {
        let read = reader.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        context.update(&buffer[..read]);
        writer.write_all(&buffer[..read])?;
    }
    Ok(hex::encode(context.finish().as_ref()))
}

/// Hex SHA-256 of a file's content.
pub fn sha256_file(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    copy_hashing(&mut file, &mut io::sink())
}
