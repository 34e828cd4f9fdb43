use std::collections::HashSet;
use std::io::Write;

use image::{DynamicImage, RgbImage};
use pretty_assertions::assert_eq;

use colorwish::generator::{
    read_prompt_entries, BatchRunner, GenError, GenerationRequest, ImageBackend, MissingSeparator,
};

/// Stub backend that records every request and fails on demand, so one suite
/// exercises the runner for all backend variants.
struct FakeBackend {
    requests: Vec<GenerationRequest>,
    fail_on_call: HashSet<usize>,
    calls: usize,
}

impl FakeBackend {
    fn new() -> Self {
        Self {
            requests: Vec::new(),
            fail_on_call: HashSet::new(),
            calls: 0,
        }
    }

    fn failing_on(mut self, call_index: usize) -> Self {
        self.fail_on_call.insert(call_index);
        self
    }
}

impl ImageBackend for FakeBackend {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn generate(&mut self, request: &GenerationRequest) -> Result<DynamicImage, GenError> {
        let call = self.calls;
        self.calls += 1;
        self.requests.push(request.clone());

        if self.fail_on_call.contains(&call) {
            return Err(GenError::Backend("simulated inference failure".into()));
        }

        // Solid image of the requested size; the pixel value encodes the
        // call index so overwrites are observable.
        let shade = 10 + call as u8;
        let buffer = RgbImage::from_pixel(request.width, request.height, image::Rgb([shade; 3]));
        Ok(DynamicImage::ImageRgb8(buffer))
    }
}

fn write_prompt_file(dir: &tempfile::TempDir, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join("img_desc.txt");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    path
}

#[test]
fn full_run_writes_every_image_with_selected_dimensions() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_prompt_file(
        &dir,
        "# pages\n\
         fox.png|a red fox\n\
         category_banner.png|woodland animals\n\
         app_icon.png|a smiling sun\n",
    );
    let output_dir = dir.path().join("out");

    let entries = read_prompt_entries(&input, MissingSeparator::Skip).unwrap();
    let mut backend = FakeBackend::new();
    let runner = BatchRunner::new(output_dir.clone(), 800, 1000);
    let summary = runner.run(&mut backend, &entries);

    assert_eq!(summary.attempted, 3);
    assert_eq!(summary.succeeded, 3);
    assert_eq!(summary.output_dir, output_dir);

    // Requests carry the style suffix and honor the filename heuristic.
    let requests = &backend.requests;
    assert!(requests[0].prompt.starts_with("a red fox. Coloring book style"));
    assert_eq!((requests[0].width, requests[0].height), (800, 1000));
    assert_eq!((requests[1].width, requests[1].height), (1200, 600));
    assert_eq!((requests[2].width, requests[2].height), (512, 512));

    let banner = image::open(output_dir.join("category_banner.png")).unwrap();
    assert_eq!((banner.width(), banner.height()), (1200, 600));
    assert!(output_dir.join("fox.png").exists());
    assert!(output_dir.join("app_icon.png").exists());
}

#[test]
fn failed_entry_does_not_stop_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_prompt_file(&dir, "a.png|first\nb.png|second\nc.png|third\n");
    let output_dir = dir.path().join("out");

    let entries = read_prompt_entries(&input, MissingSeparator::Skip).unwrap();
    let mut backend = FakeBackend::new().failing_on(1);
    let runner = BatchRunner::new(output_dir.clone(), 800, 1000);
    let summary = runner.run(&mut backend, &entries);

    assert_eq!(summary.attempted, 3);
    assert_eq!(summary.succeeded, 2);
    assert_eq!(backend.requests.len(), 3);
    assert!(output_dir.join("a.png").exists());
    assert!(!output_dir.join("b.png").exists());
    assert!(output_dir.join("c.png").exists());
}

#[test]
fn skip_existing_counts_as_success_without_invoking_backend() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_prompt_file(&dir, "done.png|already made\nnew.png|still needed\n");
    let output_dir = dir.path().join("out");
    std::fs::create_dir_all(&output_dir).unwrap();
    std::fs::write(output_dir.join("done.png"), b"pre-existing").unwrap();

    let entries = read_prompt_entries(&input, MissingSeparator::Skip).unwrap();
    let mut backend = FakeBackend::new();
    let runner = BatchRunner::new(output_dir.clone(), 800, 1000).skip_existing(true);
    let summary = runner.run(&mut backend, &entries);

    assert_eq!(summary.attempted, 2);
    assert_eq!(summary.succeeded, 2);
    // Only the missing file reached the backend.
    assert_eq!(backend.requests.len(), 1);
    assert_eq!(
        backend.requests[0].prompt,
        GenerationRequest::new("still needed", 800, 1000).prompt
    );
    // The pre-existing file was left untouched.
    assert_eq!(std::fs::read(output_dir.join("done.png")).unwrap(), b"pre-existing");
}

#[test]
fn duplicate_filenames_are_both_attempted_and_later_wins() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_prompt_file(&dir, "dup.png|first version\ndup.png|second version\n");
    let output_dir = dir.path().join("out");

    let entries = read_prompt_entries(&input, MissingSeparator::Skip).unwrap();
    let mut backend = FakeBackend::new();
    let runner = BatchRunner::new(output_dir.clone(), 64, 64);
    let summary = runner.run(&mut backend, &entries);

    assert_eq!(summary.attempted, 2);
    assert_eq!(summary.succeeded, 2);

    // The second call's shade (11) survives on disk.
    let written = image::open(output_dir.join("dup.png")).unwrap().to_rgb8();
    assert_eq!(written.get_pixel(0, 0).0, [11, 11, 11]);
}

#[test]
fn missing_input_file_means_nothing_to_do() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("no_such_file.txt");

    match read_prompt_entries(&missing, MissingSeparator::Skip) {
        Err(GenError::Input(_)) => {}
        other => panic!("Expected input error, got {:?}", other),
    }
}

#[test]
fn synthesized_entries_flow_through_the_runner() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_prompt_file(&dir, "a dragon breathing fire\nnamed.png|a knight\n");
    let output_dir = dir.path().join("out");

    let entries = read_prompt_entries(&input, MissingSeparator::Synthesize).unwrap();
    let mut backend = FakeBackend::new();
    let runner = BatchRunner::new(output_dir.clone(), 64, 64);
    let summary = runner.run(&mut backend, &entries);

    assert_eq!(summary.attempted, 2);
    assert_eq!(summary.succeeded, 2);
    assert!(output_dir.join("image_001.jpg").exists());
    assert!(output_dir.join("named.png").exists());
}
