use crate::models::Algorithm;
use sha2::Digest;
use std::io::{self, Read};

/// Render digest bytes as uppercase hex with no separators.
pub fn format_digest(bytes: &[u8]) -> String {
    hex::encode_upper(bytes)
}

pub fn compute_hash_for_bytes(algorithm: Algorithm, data: &[u8]) -> String {
    match algorithm {
        Algorithm::Md5 => format_digest(&md5::compute(data).0),
        Algorithm::Sha1 => format_digest(&sha1::Sha1::digest(data)),
        Algorithm::Sha256 => format_digest(&sha2::Sha256::digest(data)),
        Algorithm::Sha512 => format_digest(&sha2::Sha512::digest(data)),
    }
}

/// Text is hashed as its UTF-8 bytes.
pub fn compute_text_hash(algorithm: Algorithm, text: &str) -> String {
    compute_hash_for_bytes(algorithm, text.as_bytes())
}

/// Stream `reader` to exhaustion through `algorithm`, `buffer_size` bytes at a time.
pub fn compute_hash_for_reader<R: Read>(
    mut reader: R,
    algorithm: Algorithm,
    buffer_size: usize,
) -> io::Result<String> {
    let mut buf = vec![0u8; buffer_size.max(1)];
    match algorithm {
        Algorithm::Md5 => {
            let mut ctx = md5::Context::new();
            read_chunks(&mut reader, &mut buf, |chunk| ctx.consume(chunk))?;
            Ok(format_digest(&ctx.finalize().0))
        }
        Algorithm::Sha1 => digest_reader::<sha1::Sha1, _>(&mut reader, &mut buf),
        Algorithm::Sha256 => digest_reader::<sha2::Sha256, _>(&mut reader, &mut buf),
        Algorithm::Sha512 => digest_reader::<sha2::Sha512, _>(&mut reader, &mut buf),
    }
}

fn digest_reader<D: Digest, R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<String> {
    let mut hasher = D::new();
    read_chunks(reader, buf, |chunk| hasher.update(chunk))?;
    Ok(format_digest(&hasher.finalize()))
}

fn read_chunks<R: Read>(
    reader: &mut R,
    buf: &mut [u8],
    mut consume: impl FnMut(&[u8]),
) -> io::Result<()> {
    loop {
        let n = match reader.read(buf) {
            Ok(0) => return Ok(()),
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        consume(&buf[..n]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const MD5_123456: &str = "E10ADC3949BA59ABBE56E057F20F883E";
    const SHA1_123456: &str = "7C4A8D09CA3762AF61E59520943DC26494F8941B";
    const SHA256_123456: &str = "8D969EEF6ECAD3C29A3A629280E686CF0C3F5D5A86AFF3CA12020C923ADC6C92";
    const SHA512_123456: &str = "BA3253876AED6BC22D4A6FF53D8406C6AD864195ED144AB5C87621B6C233B548BAEAE6956DF346EC8C17F5EA10F35EE3CBC514797ED7DDD3145464E2A0BAB413";

    #[test]
    fn hashing_string() {
        assert_eq!(compute_text_hash(Algorithm::Md5, "123456"), MD5_123456);
        assert_eq!(compute_text_hash(Algorithm::Sha1, "123456"), SHA1_123456);
        assert_eq!(compute_text_hash(Algorithm::Sha256, "123456"), SHA256_123456);
        assert_eq!(compute_text_hash(Algorithm::Sha512, "123456"), SHA512_123456);
    }

    #[test]
    fn formats_without_separators() {
        assert_eq!(format_digest(&[0xE1, 0x0A]), "E10A");
        assert_eq!(format_digest(&[]), "");
    }

    #[test]
    fn digest_shape_matches_algorithm() {
        for algo in Algorithm::all() {
            let hex = compute_text_hash(algo, "some text");
            assert_eq!(hex.len(), algo.hex_len(), "{algo}");
            assert!(hex.chars().all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c)));
        }
    }

    #[test]
    fn reader_agrees_with_bytes() {
        let data: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
        for algo in Algorithm::all() {
            // odd buffer size so chunk boundaries fall mid-block
            let streamed = compute_hash_for_reader(Cursor::new(&data), algo, 7).unwrap();
            assert_eq!(streamed, compute_hash_for_bytes(algo, &data), "{algo}");
        }
    }

    #[test]
    fn repeated_hashing_is_stable() {
        for algo in Algorithm::all() {
            assert_eq!(compute_text_hash(algo, "abc"), compute_text_hash(algo, "abc"));
        }
    }

    struct Flaky {
        interrupted: bool,
    }

    impl Read for Flaky {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(io::Error::from(io::ErrorKind::Interrupted));
            }
            Err(io::Error::other("device gone"))
        }
    }

    #[test]
    fn retries_interrupted_then_surfaces_error() {
        let err = compute_hash_for_reader(Flaky { interrupted: false }, Algorithm::Sha256, 16)
            .unwrap_err();
        assert_eq!(err.to_string(), "device gone");
    }
}
