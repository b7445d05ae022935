use std::path::Path;

use tensorflow::{Graph, ImportGraphDefOptions, Session, SessionOptions, SessionRunArgs, Tensor};

use super::{check_input_shape, shape_string, Classifier, ModelError, ModelInfo, EMOTION_CLASSES};
use crate::config::ModelConfig;
use crate::preprocess::{ImageInput, INPUT_SHAPE};

/// A frozen TensorFlow graph served through a single session.
pub struct GraphModel {
    session: Session,
    graph: Graph,
    model_path: String,
    input_op: String,
    output_op: String,
}

impl GraphModel {
    pub fn load(cfg: &ModelConfig) -> Result<Self, ModelError> {
        let model_bytes = std::fs::read(&cfg.path)
            .map_err(|e| ModelError::Load(format!("{}: {e}", cfg.path.display())))?;

        let mut graph = Graph::new();
        graph
            .import_graph_def(&model_bytes, &ImportGraphDefOptions::new())
            .map_err(|e| ModelError::Load(e.to_string()))?;

        let session = Session::new(&SessionOptions::new(), &graph)
            .map_err(|e| ModelError::Load(e.to_string()))?;

        let model = GraphModel {
            session,
            graph,
            model_path: display_path(&cfg.path),
            input_op: cfg.input_op.clone(),
            output_op: cfg.output_op.clone(),
        };

        // Fail at startup rather than on the first request.
        model.operation(&model.input_op)?;
        model.operation(&model.output_op)?;

        tracing::info!(
            path = %model.model_path,
            input = %model.input_op,
            output = %model.output_op,
            "model graph loaded"
        );
        Ok(model)
    }

    fn operation(&self, name: &str) -> Result<tensorflow::Operation, ModelError> {
        self.graph
            .operation_by_name(name)
            .map_err(|e| ModelError::Load(format!("failed to look up operation '{name}': {e}")))?
            .ok_or_else(|| ModelError::Load(format!("operation '{name}' not found in graph")))
    }
}

impl Classifier for GraphModel {
    fn predict(&self, input: &ImageInput) -> Result<Vec<f32>, ModelError> {
        check_input_shape(input)?;

        let mut input_tensor = Tensor::<f32>::new(&INPUT_SHAPE);
        input_tensor.copy_from_slice(input.data());

        let input_operation = self.operation(&self.input_op)?;
        let output_operation = self.operation(&self.output_op)?;

        let mut args = SessionRunArgs::new();
        args.add_feed(&input_operation, 0, &input_tensor);
        let output_token = args.request_fetch(&output_operation, 0);

        self.session
            .run(&mut args)
            .map_err(|e| ModelError::Inference(e.to_string()))?;

        let output_tensor: Tensor<f32> = args
            .fetch(output_token)
            .map_err(|e| ModelError::Inference(e.to_string()))?;

        Ok(output_tensor.to_vec())
    }

    fn info(&self) -> ModelInfo {
        ModelInfo {
            status: "loaded",
            model_path: self.model_path.clone(),
            input_shape: shape_string(&INPUT_SHAPE),
            output_shape: shape_string(&[1, EMOTION_CLASSES.len() as u64]),
            num_operations: self.graph.operation_iter().count(),
            emotion_classes: EMOTION_CLASSES.to_vec(),
        }
    }
}

fn display_path(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
