//! Brand perception maps.
//!
//! A table of numeric brand ratings is optionally filtered by segment,
//! region and time, embedded in 2D with metric MDS, grouped with K-means,
//! and groups with fewer than three brands are reported as repositioning
//! candidates.
//!
//! ```
//! use perceptomap::{run, DataSet, PipelineConfig};
//!
//! let csv = "brand,style,comfort\nA,1,1\nB,1.1,0.9\nC,8,8\nD,8.2,7.9\nE,7.9,8.1\n";
//! let data = DataSet::from_reader(csv.as_bytes(), b',').unwrap();
//! let map = run(&data, &PipelineConfig { k: 2, ..Default::default() }).unwrap();
//! assert_eq!(map.coords().shape(), &[5, 2]);
//! assert_eq!(map.suggestions.len(), 1);
//! ```

pub mod dataset;
pub mod error;
pub mod features;
pub mod filter;
pub mod identity;
pub mod kmeans;
pub mod mds;
pub mod pipeline;
pub mod suggest;

pub use dataset::{Column, ColumnKind, DataSet, Observation, Value};
pub use error::{Error, Result};
pub use features::FeatureMatrix;
pub use filter::{FilterStage, Filters, Selection};
pub use identity::IdentityResolver;
pub use kmeans::{KmeansFit, KmeansParams};
pub use mds::{Embedding, MdsParams};
pub use pipeline::{run, PerceptualMap, PipelineConfig};
pub use suggest::{suggest, Suggestion, BALANCED_MESSAGE, MIN_GROUP_SIZE};
