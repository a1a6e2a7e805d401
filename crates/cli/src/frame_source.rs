use std::fs;
use std::path::{Path, PathBuf};
use std::thread;

use crossbeam_channel::Receiver;

use face_insight_core::shared::constants::IMAGE_EXTENSIONS;
use face_insight_core::shared::frame::Frame;

pub type SendError = Box<dyn std::error::Error + Send + Sync>;

/// Resolves `input` to the ordered list of image files used as frames.
///
/// A directory yields its images sorted by file name; a file must itself be
/// an image.
pub fn collect_image_paths(input: &Path) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    if input.is_dir() {
        let mut paths: Vec<PathBuf> = fs::read_dir(input)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && is_image(path))
            .collect();
        paths.sort();
        if paths.is_empty() {
            return Err(format!("No images found in {}", input.display()).into());
        }
        Ok(paths)
    } else if is_image(input) {
        Ok(vec![input.to_path_buf()])
    } else {
        Err(format!("Not an image file or directory: {}", input.display()).into())
    }
}

/// Decodes frames on a dedicated thread, replaying the sequence `loops` times.
///
/// Frames arrive in order with consecutive indices. The channel is bounded so
/// decoding never runs far ahead of the consumer.
pub fn spawn_reader(
    paths: Vec<PathBuf>,
    loops: usize,
    capacity: usize,
) -> (Receiver<Result<Frame, SendError>>, thread::JoinHandle<()>) {
    let (frame_tx, frame_rx) = crossbeam_channel::bounded::<Result<Frame, SendError>>(capacity);

    let handle = thread::spawn(move || {
        let mut index = 0;
        for _ in 0..loops {
            for path in &paths {
                let frame = decode_frame(path, index);
                index += 1;
                if frame_tx.send(frame).is_err() {
                    return;
                }
            }
        }
    });

    (frame_rx, handle)
}

fn decode_frame(path: &Path, index: usize) -> Result<Frame, SendError> {
    let img = image::open(path)
        .map_err(|e| -> SendError { format!("{}: {e}", path.display()).into() })?
        .to_rgb8();
    let (width, height) = img.dimensions();
    Ok(Frame::new(img.into_raw(), width, height, 3, index))
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
        let path = dir.join(name);
        image::RgbImage::new(width, height).save(&path).unwrap();
        path
    }

    #[rstest]
    #[case("frame.png", true)]
    #[case("frame.JPG", true)]
    #[case("frame.webp", true)]
    #[case("notes.txt", false)]
    #[case("no_extension", false)]
    fn test_is_image(#[case] name: &str, #[case] expected: bool) {
        assert_eq!(is_image(Path::new(name)), expected);
    }

    #[test]
    fn test_collects_sorted_images_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        write_png(dir.path(), "b.png", 2, 2);
        write_png(dir.path(), "a.png", 2, 2);
        fs::write(dir.path().join("readme.txt"), "not a frame").unwrap();

        let paths = collect_image_paths(dir.path()).unwrap();

        let names: Vec<_> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a.png", "b.png"]);
    }

    #[test]
    fn test_empty_directory_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(collect_image_paths(dir.path()).is_err());
    }

    #[test]
    fn test_single_image_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "only.png", 3, 2);

        assert_eq!(collect_image_paths(&path).unwrap(), vec![path]);
    }

    #[test]
    fn test_reader_loops_with_consecutive_indices() {
        let dir = tempfile::tempdir().unwrap();
        let paths = vec![
            write_png(dir.path(), "a.png", 3, 2),
            write_png(dir.path(), "b.png", 3, 2),
        ];

        let (rx, handle) = spawn_reader(paths, 2, 1);
        let frames: Vec<Frame> = rx.iter().map(|f| f.unwrap()).collect();
        handle.join().unwrap();

        let indices: Vec<usize> = frames.iter().map(Frame::index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
        assert_eq!(frames[0].width(), 3);
        assert_eq!(frames[0].height(), 2);
        assert_eq!(frames[0].data().len(), 3 * 2 * 3);
    }

    #[test]
    fn test_undecodable_file_yields_error() {
        let dir = tempfile::tempdir().unwrap();
        let bogus = dir.path().join("broken.png");
        fs::write(&bogus, b"not a png").unwrap();

        let (rx, handle) = spawn_reader(vec![bogus], 1, 1);
        let first = rx.recv().unwrap();
        handle.join().unwrap();

        assert!(first.unwrap_err().to_string().contains("broken.png"));
    }
}
