use std::io::Write;
use std::path::Path;

use line_ocr::core::{ErrorCategory, InferenceEngine, OcrResult};
use line_ocr::domain::{DatasetVariant, LineSource, Vocabulary};
use line_ocr::predictor::{LinePredictor, LinePredictorBuilder};
use line_ocr::utils::{array_to_gray, normalized_edit_distance};
use ndarray::{Array2, ArrayD, Ix3, IxDyn, s};

/// Columns per output timestep.
const STRIDE: usize = 14;
const CELL: usize = 28;

/// Pixel value that encodes a class in the synthetic lines.
fn class_intensity(class: usize) -> u8 {
    (10 + 3 * class) as u8
}

/// A model stand-in that reads the class code back from each window's mean intensity.
///
/// Background windows predict blank; every prediction puts 0.9 on the chosen class.
#[derive(Debug)]
struct IntensityCodeEngine {
    classes: usize,
    blank: usize,
}

impl IntensityCodeEngine {
    fn new(vocab: &Vocabulary) -> Self {
        Self {
            classes: vocab.len(),
            blank: vocab.blank_index(),
        }
    }
}

impl InferenceEngine for IntensityCodeEngine {
    fn run(&self, input: &ArrayD<f32>) -> OcrResult<ArrayD<f32>> {
        let input = input.view().into_dimensionality::<Ix3>()?;
        let (height, width) = (input.shape()[1], input.shape()[2]);
        let timesteps = width / STRIDE;
        let rest = 0.1 / (self.classes - 1) as f32;
        let mut out = ArrayD::from_elem(IxDyn(&[1, timesteps, self.classes]), rest);

        for t in 0..timesteps {
            let window = input.slice(s![0, 0..height, t * STRIDE..(t + 1) * STRIDE]);
            let level = window.mean().unwrap_or(0.0) * 255.0;
            let class = if level < 5.0 {
                self.blank
            } else {
                let code = ((level - 10.0) / 3.0).round().max(0.0) as usize;
                code.min(self.classes - 2)
            };
            out[[0, t, class]] = 0.9;
        }
        Ok(out)
    }

    fn engine_info(&self) -> String {
        "intensity-code".to_string()
    }

    fn declared_input_shape(&self) -> Option<Vec<i64>> {
        Some(vec![-1, 28, 952])
    }

    fn declared_output_shape(&self) -> Option<Vec<i64>> {
        Some(vec![-1, -1, self.classes as i64])
    }
}

/// Draws `text` with one 28x28 cell per character: a coded glyph in the left half and
/// background in the right half.
fn synthetic_line(text: &str, vocab: &Vocabulary) -> Array2<u8> {
    let mut pixels = Array2::zeros((CELL, CELL * text.chars().count()));
    for (i, c) in text.chars().enumerate() {
        let class = vocab.class_of(c).expect("character in vocabulary");
        pixels
            .slice_mut(s![.., i * CELL..i * CELL + CELL / 2])
            .fill(class_intensity(class));
    }
    pixels
}

fn emnist_predictor() -> (LinePredictor<IntensityCodeEngine>, Vocabulary) {
    let vocab = DatasetVariant::EmnistLines.spec().unwrap().vocabulary;
    let predictor = LinePredictorBuilder::new()
        .dataset(DatasetVariant::EmnistLines)
        .build_with_engine(IntensityCodeEngine::new(&vocab))
        .unwrap();
    (predictor, vocab)
}

#[test]
fn predicts_synthetic_hello_line() {
    let (predictor, vocab) = emnist_predictor();
    let prediction = predictor
        .predict(synthetic_line("HELLO", &vocab))
        .unwrap();

    let distance = normalized_edit_distance(&prediction.text, "HELLO");
    assert!(distance < 0.2, "predicted {:?}", prediction.text);
    assert!(prediction.confidence > 0.5);
    assert_eq!(prediction.text, "HELLO");
    assert_eq!(prediction.char_timesteps, vec![0, 2, 4, 6, 8]);
}

#[test]
fn cropped_lines_never_fail() {
    let (predictor, vocab) = emnist_predictor();
    let line = synthetic_line("Hello world", &vocab);

    for width in 1..=line.ncols() {
        let crop = line.slice(s![.., ..width]).to_owned();
        let prediction = predictor
            .predict(crop)
            .unwrap_or_else(|e| panic!("width {width} failed: {e}"));
        assert!(prediction.confidence.is_finite());
        assert!((0.0..=1.0).contains(&prediction.confidence));
    }
}

#[test]
fn narrow_and_tall_inputs_are_resized() {
    let (predictor, _) = emnist_predictor();
    for (height, width) in [(1, 1), (3, 1), (56, 13), (280, 4000)] {
        let prediction = predictor
            .predict(Array2::<u8>::from_elem((height, width), 200))
            .unwrap();
        assert!((0.0..=1.0).contains(&prediction.confidence));
    }
}

#[test]
fn blank_line_predicts_empty_text() {
    let (predictor, _) = emnist_predictor();
    let prediction = predictor.predict(Array2::<u8>::zeros((28, 300))).unwrap();
    assert_eq!(prediction.text, "");
    assert_eq!(prediction.confidence, 0.0);
}

#[test]
fn float_and_path_sources_agree() {
    let (predictor, vocab) = emnist_predictor();
    let line = synthetic_line("CTC 42", &vocab);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("line.png");
    array_to_gray(&line).unwrap().save(&path).unwrap();

    let from_path = predictor.predict_path(&path).unwrap();
    let from_floats = predictor.predict(line.mapv(f32::from)).unwrap();
    let from_bytes = predictor.predict_pixels(line).unwrap();

    assert_eq!(from_path.text, "CTC 42");
    assert_eq!(from_path, from_bytes);
    assert_eq!(from_floats.text, from_bytes.text);
}

#[test]
fn unreadable_images_are_input_errors() {
    let (predictor, _) = emnist_predictor();

    let err = predictor
        .predict_path(Path::new("/nonexistent/line.png"))
        .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Input);

    let mut corrupt = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
    corrupt.write_all(b"\x89PNG but not really").unwrap();
    let err = predictor.predict_path(corrupt.path()).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Input);

    let err = predictor.predict(Array2::<u8>::zeros((0, 5))).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Input);
}

#[test]
fn vocabulary_model_mismatch_is_rejected_at_load() {
    let mut dict = tempfile::NamedTempFile::new().unwrap();
    writeln!(dict, "a").unwrap();

    let emnist = DatasetVariant::EmnistLines.spec().unwrap().vocabulary;
    let err = LinePredictorBuilder::new()
        .character_dict_path(dict.path())
        .build_with_engine(IntensityCodeEngine::new(&emnist))
        .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Model);
}

#[test]
fn concurrent_predictions_match_sequential() {
    let (predictor, vocab) = emnist_predictor();
    let texts = ["HELLO", "world", "a+b=c?", "12:30", "Rust", "line ocr"];
    let texts: Vec<&str> = texts
        .iter()
        .copied()
        .filter(|t| t.chars().all(|c| vocab.class_of(c).is_some()))
        .collect();
    let sources: Vec<LineSource> = texts
        .iter()
        .map(|t| LineSource::Gray8(synthetic_line(t, &vocab)))
        .collect();

    let batch = predictor.predict_batch(&sources);
    let shared = &predictor;
    let threaded: Vec<String> = std::thread::scope(|scope| {
        let handles: Vec<_> = sources
            .iter()
            .map(|source| scope.spawn(move || shared.predict_source(source).unwrap().text))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for ((text, batched), threaded) in texts.iter().zip(batch).zip(threaded) {
        assert_eq!(&batched.unwrap().text, text);
        assert_eq!(&threaded, text);
    }
}

/// Runs the trained EMNIST-lines model on the labeled fixtures.
///
/// Needs `models/emnist_lines_ctc.onnx` and PNGs under `tests/support/emnist_lines`
/// named after their text.
#[test]
#[ignore = "requires trained model weights"]
fn emnist_fixture_regression() {
    let root = Path::new(env!("CARGO_MANIFEST_DIR"));
    let predictor = LinePredictorBuilder::new()
        .model_dir(root.join("models"))
        .build()
        .unwrap();

    let fixtures = root.join("tests/support/emnist_lines");
    for entry in std::fs::read_dir(fixtures).unwrap() {
        let path = entry.unwrap().path();
        if path.extension().and_then(|e| e.to_str()) != Some("png") {
            continue;
        }
        let truth = path.file_stem().unwrap().to_string_lossy().into_owned();
        let prediction = predictor.predict_path(&path).unwrap();
        let distance = normalized_edit_distance(&prediction.text, &truth);
        assert!(
            distance < 0.2,
            "{}: predicted {:?} ({:.3})",
            truth,
            prediction.text,
            prediction.confidence
        );
    }
}
