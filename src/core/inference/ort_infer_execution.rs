use super::*;
use crate::core::errors::SimpleError;
use crate::core::traits::InferenceEngine;
use ndarray::{ArrayD, IxDyn};
use ort::value::TensorRef;

impl OrtInfer {
    /// Runs a forward pass and returns the output tensor with its declared shape.
    pub fn infer_dyn(&self, x: &ArrayD<f32>) -> Result<ArrayD<f32>, OCRError> {
        self.ensure_loaded()?;
        let input_shape = x.shape().to_vec();
        let output_name = self.output_name.as_str();

        let input_tensor = TensorRef::from_array_view(x.view()).map_err(|e| {
            OCRError::model_inference_error(
                &self.model_name,
                "tensor_conversion",
                &input_shape,
                &format!("failed to convert input tensor with shape {input_shape:?}"),
                e,
            )
        })?;

        let inputs = ort::inputs![self.input_name.as_str() => input_tensor];

        let idx = self
            .next_idx
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed)
            % self.sessions.len();
        let mut session_guard = self.sessions[idx].lock().map_err(|_| {
            OCRError::model_inference_error(
                &self.model_name,
                "session_lock",
                &input_shape,
                &format!(
                    "failed to acquire session lock for session {}/{}",
                    idx,
                    self.sessions.len()
                ),
                SimpleError::new("session lock poisoned"),
            )
        })?;

        let outputs = session_guard.run(inputs).map_err(|e| {
            OCRError::model_inference_error(
                &self.model_name,
                "forward_pass",
                &input_shape,
                &format!(
                    "ONNX Runtime inference failed with input '{}' -> output '{}'",
                    self.input_name, output_name
                ),
                e,
            )
        })?;

        let output = outputs.get(output_name).ok_or_else(|| {
            OCRError::model_unavailable(
                &self.model_name,
                &format!("inference produced no output named '{output_name}'"),
            )
        })?;
        let (output_shape, output_data) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| {
                OCRError::model_inference_error(
                    &self.model_name,
                    "output_extraction",
                    &input_shape,
                    &format!("failed to extract output tensor '{output_name}' as f32"),
                    e,
                )
            })?;

        let dims: Vec<usize> = output_shape.iter().map(|&d| d.max(0) as usize).collect();
        let expected_len: usize = dims.iter().product();
        if output_data.len() != expected_len {
            return Err(OCRError::shape_mismatch(
                &self.model_name,
                "output data length",
                format!("{expected_len} values for shape {dims:?}"),
                output_data.len(),
            ));
        }

        ArrayD::from_shape_vec(IxDyn(&dims), output_data.to_vec()).map_err(OCRError::Tensor)
    }
}

impl InferenceEngine for OrtInfer {
    fn run(&self, input: &ArrayD<f32>) -> Result<ArrayD<f32>, OCRError> {
        self.infer_dyn(input)
    }

    fn engine_info(&self) -> String {
        format!(
            "onnxruntime model '{}' ({} session(s)) from {}",
            self.model_name,
            self.sessions.len(),
            self.model_path.display()
        )
    }

    fn declared_input_shape(&self) -> Option<Vec<i64>> {
        self.primary_input_shape()
    }

    fn declared_output_shape(&self) -> Option<Vec<i64>> {
        self.primary_output_shape()
    }
}
