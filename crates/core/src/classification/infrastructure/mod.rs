pub mod linear_svm;
pub mod model_artifact;
pub mod standard_scaler;
