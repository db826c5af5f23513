use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use image::DynamicImage;
use image::imageops::FilterType;
use serde::Deserialize;
use tch::{CModule, Device, Kind, Tensor, nn::ModuleT};

use crate::config::CLASSIFIER_INPUT_SIZE;
use shared::LabelScore;

// ViT export convention for the supported checkpoints.
const NORM_MEAN: f32 = 0.5;
const NORM_STD: f32 = 0.5;

#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error("Failed to read model directory: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed model config: {0}")]
    Config(#[from] serde_json::Error),
    #[error("Model config has no id2label table")]
    MissingLabels,
    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("Model error: {0}")]
    Model(#[from] tch::TchError),
    #[error("Model produced {got} scores for {expected} labels")]
    LabelMismatch { got: usize, expected: usize },
}

/// Subset of the Hugging Face `config.json` a TorchScript export ships with.
#[derive(Deserialize)]
struct ModelConfig {
    #[serde(default)]
    id2label: HashMap<String, String>,
}

/// An image classifier backed by a TorchScript checkpoint.
///
/// A model directory holds `model.pt` and `config.json`; the `id2label`
/// table from the config names the output classes. Different checkpoints
/// can be dropped in without code changes.
#[derive(Clone)]
pub struct ClassifierModel {
    module: Arc<Mutex<CModule>>,
    labels: Vec<String>,
    device: Device,
}

impl ClassifierModel {
    pub fn load(model_dir: &Path) -> Result<Self, InferenceError> {
        let config_str = fs::read_to_string(model_dir.join("config.json"))?;
        let config: ModelConfig = serde_json::from_str(&config_str)?;
        let labels = index_ordered_labels(config.id2label)?;

        let device = Device::cuda_if_available();
        let module = CModule::load_on_device(model_dir.join("model.pt"), device)?;

        Ok(Self {
            module: Arc::new(Mutex::new(module)),
            labels,
            device,
        })
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn predict_path(&self, path: &Path) -> Result<Vec<LabelScore>, InferenceError> {
        let image = image::open(path)?;
        self.predict(&image)
    }

    pub fn predict_bytes(&self, bytes: &[u8]) -> Result<Vec<LabelScore>, InferenceError> {
        let image = image::load_from_memory(bytes)?;
        self.predict(&image)
    }

    /// Runs one forward pass and pairs each softmax probability with its
    /// `id2label` entry, best score first.
    pub fn predict(&self, image: &DynamicImage) -> Result<Vec<LabelScore>, InferenceError> {
        let tensor = preprocess(image).to_device(self.device);
        let output = self.module.lock().unwrap().forward_t(&tensor, false);
        let output = output.softmax(-1, Kind::Float);
        let output_flat = output.to_kind(Kind::Float).view([-1]);
        let num_elements = output_flat.size()[0] as usize;
        let mut scores = vec![0.0f32; num_elements];
        output_flat.copy_data(&mut scores, num_elements);

        if num_elements != self.labels.len() {
            return Err(InferenceError::LabelMismatch {
                got: num_elements,
                expected: self.labels.len(),
            });
        }

        let distribution = self
            .labels
            .iter()
            .zip(scores)
            .map(|(label, score)| LabelScore {
                label: label.clone(),
                score,
            })
            .collect();
        Ok(sort_descending(distribution))
    }
}

fn index_ordered_labels(id2label: HashMap<String, String>) -> Result<Vec<String>, InferenceError> {
    let mut indexed: Vec<(usize, String)> = id2label
        .into_iter()
        .filter_map(|(index, label)| index.parse::<usize>().ok().map(|i| (i, label)))
        .collect();
    if indexed.is_empty() {
        return Err(InferenceError::MissingLabels);
    }
    indexed.sort_by_key(|(index, _)| *index);
    Ok(indexed.into_iter().map(|(_, label)| label).collect())
}

/// Resize to the classifier input resolution and normalize to a CHW tensor.
fn preprocess(image: &DynamicImage) -> Tensor {
    let size = CLASSIFIER_INPUT_SIZE;
    let rgb = image
        .resize_exact(size, size, FilterType::Triangle)
        .to_rgb8();

    let plane = (size * size) as usize;
    let mut data = vec![0f32; 3 * plane];
    for (i, pixel) in rgb.pixels().enumerate() {
        let r = pixel[0] as f32 / 255.0;
        let g = pixel[1] as f32 / 255.0;
        let b = pixel[2] as f32 / 255.0;
        data[i] = (r - NORM_MEAN) / NORM_STD;
        data[plane + i] = (g - NORM_MEAN) / NORM_STD;
        data[2 * plane + i] = (b - NORM_MEAN) / NORM_STD;
    }

    Tensor::from_slice(&data).view([1, 3, size as i64, size as i64])
}

pub(crate) fn sort_descending(mut distribution: Vec<LabelScore>) -> Vec<LabelScore> {
    distribution.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    distribution
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_index_ordered() {
        let id2label = HashMap::from([
            ("1".to_string(), "Realism".to_string()),
            ("0".to_string(), "Deepfake".to_string()),
        ]);
        let labels = index_ordered_labels(id2label).unwrap();
        assert_eq!(labels, vec!["Deepfake".to_string(), "Realism".to_string()]);
    }

    #[test]
    fn empty_id2label_is_rejected() {
        let err = index_ordered_labels(HashMap::new()).unwrap_err();
        assert!(matches!(err, InferenceError::MissingLabels));
    }

    #[test]
    fn distribution_is_sorted_best_first() {
        let sorted = sort_descending(vec![
            LabelScore {
                label: "neutral".into(),
                score: 0.2,
            },
            LabelScore {
                label: "happy".into(),
                score: 0.7,
            },
            LabelScore {
                label: "sad".into(),
                score: 0.1,
            },
        ]);
        assert_eq!(sorted[0].label, "happy");
        assert_eq!(sorted[2].label, "sad");
    }
}
