pub mod builder;
pub mod pairs;
pub mod paths;

pub use builder::PoolGraph;
pub use pairs::{AssetGraphBuilder, AssetPair};
pub use paths::{BoundedPathFinder, Hop};
