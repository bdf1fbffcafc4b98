pub mod digest;
pub mod evaluator;
pub mod rules;
pub mod window;
