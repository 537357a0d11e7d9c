// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Binary pixmap (PPM, `P6`) output.  The file is a three line ASCII
//! header, magic number, `width height`, and the maximum channel
//! value, followed by the pixels as raw RGB triplets, top row first,
//! each row left to right, with nothing after.

use errors::RenderError;
use palette::MAX_CHANNEL;
use render::PixelBuffer;
use std::fs::{self, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// The magic number of a binary RGB pixmap.
pub const MAGIC: &str = "P6";

/// The header for an image of the given size.
pub fn header(width: usize, height: usize) -> String {
    format!("{}\n{} {}\n{}\n", MAGIC, width, height, MAX_CHANNEL)
}

/// The exact size of the encoded file.
pub fn encoded_len(image: &PixelBuffer) -> usize {
    header(image.width(), image.height()).len() + image.pixels().len() * 3
}

/// Writes the header and pixels to any sink, returning how many bytes
/// went out.  A sink that stops accepting bytes is an error.
pub fn encode<W: Write>(writer: &mut W, image: &PixelBuffer) -> io::Result<usize> {
    let head = header(image.width(), image.height());
    writer.write_all(head.as_bytes())?;
    let mut written = head.len();

    let mut row_bytes = Vec::with_capacity(image.width() * 3);
    for row in image.rows() {
        row_bytes.clear();
        for pixel in row {
            row_bytes.extend_from_slice(&pixel.channels());
        }
        writer.write_all(&row_bytes)?;
        written += row_bytes.len();
    }
    Ok(written)
}

type Sink<'a> = BufWriter<&'a mut NamedTempFile>;

// Writes into a fresh file beside `path` and renames it over `path`
// only once everything is on disk.  On failure only the temporary
// file goes away; whatever was at `path` is untouched.
fn replace_file<F>(path: &Path, fill: F) -> io::Result<usize>
where
    F: FnOnce(&mut Sink) -> io::Result<usize>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp = NamedTempFile::new_in(dir)?;
    let written = {
        let mut output = BufWriter::new(&mut temp);
        let written = fill(&mut output)?;
        output.flush()?;
        written
    };
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(io::Error::from)?;
    Ok(written)
}

// Devices and pipes can't be replaced or synced; write straight into
// them and leave them be.
fn write_into(path: &Path, image: &PixelBuffer) -> io::Result<usize> {
    let file = OpenOptions::new().write(true).open(path)?;
    let mut output = BufWriter::new(file);
    let written = encode(&mut output, image)?;
    output.flush()?;
    Ok(written)
}

/// Writes the image to `path`.  A regular file (or a new one) is only
/// replaced once every byte is on disk, so a failed write leaves no
/// partial image and the previous contents intact.  Existing devices
/// and pipes, `/dev/null` or `/dev/stdout` for instance, are written
/// to directly.
pub fn write_pixmap<P: AsRef<Path>>(path: P, image: &PixelBuffer) -> Result<usize, RenderError> {
    let path = path.as_ref();
    let expected = encoded_len(image);
    let written = match fs::metadata(path) {
        Ok(ref meta) if !meta.is_file() && !meta.is_dir() => write_into(path, image),
        Ok(ref meta) if meta.is_file() => {
            // Follow symlinks so the link itself survives the rename.
            let target = fs::canonicalize(path).map_err(|e| RenderError::io(path, e))?;
            replace_file(&target, |output| encode(output, image))
        }
        _ => replace_file(path, |output| encode(output, image)),
    }
    .map_err(|e| RenderError::io(path, e))?;

    if written != expected {
        return Err(RenderError::io(
            path,
            io::Error::new(
                io::ErrorKind::WriteZero,
                format!("wrote {} of {} bytes", written, expected),
            ),
        ));
    }
    debug!("wrote {} bytes to {}", written, path.display());
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image;
    use palette::Rgb;
    use tempfile;

    fn gradient(width: usize, height: usize) -> PixelBuffer {
        let mut buffer = PixelBuffer::new(width, height).unwrap();
        for (i, pixel) in buffer.pixels_mut().iter_mut().enumerate() {
            *pixel = Rgb::new(i as u8, (i * 2) as u8, 255 - i as u8);
        }
        buffer
    }

    /// A sink that takes `room` bytes and then refuses more.
    struct Cramped {
        room: usize,
    }

    impl Write for Cramped {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            let n = ::std::cmp::min(self.room, buf.len());
            self.room -= n;
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn header_is_three_lines() {
        assert_eq!(header(100, 50), "P6\n100 50\n255\n");
    }

    #[test]
    fn pixels_are_row_major_rgb() {
        let image = gradient(2, 2);
        let mut out = Vec::new();
        let written = encode(&mut out, &image).unwrap();
        assert_eq!(written, out.len());
        assert_eq!(written, encoded_len(&image));
        let head = b"P6\n2 2\n255\n";
        assert_eq!(&out[..head.len()], &head[..]);
        assert_eq!(
            &out[head.len()..],
            &[0, 0, 255, 1, 2, 254, 2, 4, 253, 3, 6, 252][..]
        );
    }

    #[test]
    fn non_square_images_write_width_by_height() {
        let image = gradient(5, 3);
        let mut out = Vec::new();
        encode(&mut out, &image).unwrap();
        assert_eq!(out.len(), "P6\n5 3\n255\n".len() + 5 * 3 * 3);
    }

    #[test]
    fn short_write_is_an_error() {
        let image = gradient(4, 4);
        let mut sink = Cramped { room: 20 };
        let err = encode(&mut sink, &image).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::WriteZero);
    }

    #[test]
    fn file_decodes_as_a_standard_pixmap() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gradient.ppm");
        let picture = gradient(6, 4);
        let written = write_pixmap(&path, &picture).unwrap();

        let bytes = fs::read(&path).unwrap();
        assert_eq!(bytes.len(), written);
        assert_eq!(bytes.len(), header(6, 4).len() + 6 * 4 * 3);
        assert!(bytes.starts_with(b"P6\n6 4\n255\n"));

        let decoded = image::load_from_memory_with_format(&bytes, image::ImageFormat::PNM)
            .unwrap()
            .to_rgb();
        assert_eq!(decoded.dimensions(), (6, 4));
        for (x, y, pixel) in decoded.enumerate_pixels() {
            let expected = picture.get(x as usize, y as usize).unwrap();
            assert_eq!(pixel.0, expected.channels());
        }
    }

    #[test]
    fn unopenable_destination_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.ppm");
        match write_pixmap(&path, &gradient(2, 2)) {
            Err(RenderError::Io { .. }) => {}
            other => panic!("unexpected {:?}", other),
        }
        assert!(!path.exists());
    }

    #[test]
    fn directory_destination_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(write_pixmap(dir.path(), &gradient(2, 2)).is_err());
    }

    #[test]
    fn existing_file_is_replaced_whole() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("set.ppm");
        fs::write(&path, b"previous render").unwrap();
        write_pixmap(&path, &gradient(3, 3)).unwrap();
        assert_eq!(fs::read(&path).unwrap().len(), header(3, 3).len() + 27);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn failed_write_keeps_previous_file_and_leaves_no_partial() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("set.ppm");
        fs::write(&path, b"previous render").unwrap();

        let err = replace_file(&path, |output| {
            output.write_all(b"P6\n3 3\n255\n")?;
            let mut sink = Cramped { room: 4 };
            encode(&mut sink, &gradient(3, 3))
        })
        .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::WriteZero);

        assert_eq!(fs::read(&path).unwrap(), b"previous render");
        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![::std::ffi::OsString::from("set.ppm")]);
    }

    #[test]
    fn failed_write_to_new_path_leaves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("set.ppm");
        assert!(replace_file(&path, |_| Err(io::Error::new(io::ErrorKind::Other, "boom"))).is_err());
        assert!(!path.exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn character_device_is_written_in_place() {
        let path = Path::new("/dev/null");
        let picture = gradient(8, 8);
        assert_eq!(write_pixmap(path, &picture).unwrap(), encoded_len(&picture));
        assert!(path.exists());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn full_device_is_an_error_and_survives() {
        let path = Path::new("/dev/full");
        match write_pixmap(path, &gradient(64, 64)) {
            Err(RenderError::Io { .. }) => {}
            other => panic!("unexpected {:?}", other),
        }
        assert!(path.exists());
    }

    #[cfg(unix)]
    #[test]
    fn symlink_to_file_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("target.ppm");
        let link = dir.path().join("link.ppm");
        fs::write(&target, b"old").unwrap();
        ::std::os::unix::fs::symlink(&target, &link).unwrap();
        write_pixmap(&link, &gradient(2, 2)).unwrap();
        assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        assert_eq!(fs::read(&target).unwrap().len(), header(2, 2).len() + 12);
    }
}
