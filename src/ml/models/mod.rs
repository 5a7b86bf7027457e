pub mod bagged;
pub mod classifier;
pub mod meta_model;
pub mod tree;

pub use bagged::{BaggedTrees, BaggedTreesFactory};
pub use classifier::{ClassifierFactory, MetaClassifier};
pub use meta_model::{MetaModel, MetaModelState, MetaPrediction, Reliability};
pub use tree::{DecisionTree, TreeParams};
