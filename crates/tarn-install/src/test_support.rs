//! Helpers shared by unit tests here and in dependent crates (enable the
//! `test-support` feature).

use flate2::write::GzEncoder;
use flate2::Compression;

/// Build a gzip-compressed tarball holding `files` as `(path, contents)`.
pub fn tarball(files: &[(&str, &str)]) -> Vec<u8> {
    let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
    for (path, contents) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(contents.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, path, contents.as_bytes())
            .unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap()
}
