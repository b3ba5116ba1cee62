//! Content checksums
//!
//! Streams the remaining bytes of a reader through the configured digest and
//! renders it as lowercase hex. Callers sharing the stream with the metadata
//! reader rewind it themselves.

use crate::config::HashAlgorithm;
use md5::Md5;
use sha1::Sha1;
use sha2::digest::Output;
use sha2::{Digest, Sha256, Sha384, Sha512};
use std::fmt::LowerHex;
use std::io::{self, Read};
use xxhash_rust::xxh3::Xxh3;

const BUFFER_SIZE: usize = 64 * 1024;

/// Checksum engine for one algorithm
#[derive(Debug, Clone, Copy)]
pub struct Checksum {
    algorithm: HashAlgorithm,
}

impl Checksum {
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self { algorithm }
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Digest everything left in `reader`.
    ///
    /// Returns `None` without reading when the algorithm is `None`.
    pub fn compute<R: Read + ?Sized>(&self, reader: &mut R) -> io::Result<Option<String>> {
        let hex = match self.algorithm {
            HashAlgorithm::None => return Ok(None),
            HashAlgorithm::Md5 => digest_hex::<Md5, R>(reader)?,
            HashAlgorithm::Sha1 => digest_hex::<Sha1, R>(reader)?,
            HashAlgorithm::Sha256 => digest_hex::<Sha256, R>(reader)?,
            HashAlgorithm::Sha384 => digest_hex::<Sha384, R>(reader)?,
            HashAlgorithm::Sha512 => digest_hex::<Sha512, R>(reader)?,
            HashAlgorithm::Xxh3 => {
                let mut hasher = Xxh3::new();
                stream(reader, |chunk| hasher.update(chunk))?;
                format!("{:016x}", hasher.digest())
            }
        };
        Ok(Some(hex))
    }
}

fn digest_hex<D, R>(reader: &mut R) -> io::Result<String>
where
    D: Digest,
    Output<D>: LowerHex,
    R: Read + ?Sized,
{
    let mut hasher = D::new();
    stream(reader, |chunk| hasher.update(chunk))?;
    Ok(format!("{:x}", hasher.finalize()))
}

fn stream<R: Read + ?Sized>(reader: &mut R, mut sink: impl FnMut(&[u8])) -> io::Result<()> {
    let mut buffer = vec![0u8; BUFFER_SIZE];
    loop {
        match reader.read(&mut buffer) {
            Ok(0) => return Ok(()),
            Ok(n) => sink(&buffer[..n]),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}
