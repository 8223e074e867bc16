//! The forward pipeline: filter, label, extract, embed, cluster, suggest.

use log::info;
use ndarray::Array2;

use crate::dataset::DataSet;
use crate::error::Result;
use crate::features::FeatureMatrix;
use crate::filter::{FilterStage, Filters};
use crate::identity::IdentityResolver;
use crate::kmeans::{self, KmeansFit, KmeansParams};
use crate::mds::{self, Embedding, MdsParams};
use crate::suggest::{suggest, Suggestion, MIN_GROUP_SIZE};

/// Rows shown in the data preview.
pub const PREVIEW_ROWS: usize = 5;

/// Everything one pipeline run needs besides the data.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub filters: Filters,
    /// Number of groups, in `2..=10`.
    pub k: usize,
    /// Seed for both the embedding and the clustering. Overrides the `seed`
    /// fields of `mds` and `kmeans`.
    pub seed: u64,
    pub mds: MdsParams,
    pub kmeans: KmeansParams,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            filters: Filters::default(),
            k: 3,
            seed: 42,
            mds: MdsParams::default(),
            kmeans: KmeansParams::default(),
        }
    }
}

impl PipelineConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Embedding parameters carrying the pipeline seed.
    pub fn mds_params(&self) -> MdsParams {
        self.mds.with_seed(self.seed)
    }

    /// Clustering parameters carrying the pipeline seed.
    pub fn kmeans_params(&self) -> KmeansParams {
        self.kmeans.with_seed(self.seed)
    }
}

/// Output of one run. Labels, feature rows, coordinates and assignments are
/// all indexed by the same position.
#[derive(Debug, Clone, PartialEq)]
pub struct PerceptualMap {
    /// The rows left after filtering.
    pub data: DataSet,
    pub labels: Vec<String>,
    pub features: FeatureMatrix,
    pub embedding: Embedding,
    pub clustering: KmeansFit,
    pub suggestions: Vec<Suggestion>,
}

impl PerceptualMap {
    pub fn coords(&self) -> &Array2<f64> {
        &self.embedding.coords
    }

    pub fn assignments(&self) -> &[usize] {
        &self.clustering.assignments
    }

    /// First rows of the filtered data.
    pub fn preview(&self) -> DataSet {
        self.data.head(PREVIEW_ROWS)
    }

    /// Suggestions rendered as text.
    pub fn suggestion_lines(&self) -> Vec<String> {
        self.suggestions.iter().map(|s| s.to_string()).collect()
    }
}

/// Run every stage on `data`. Any error stops the run; no partial output.
pub fn run(data: &DataSet, config: &PipelineConfig) -> Result<PerceptualMap> {
    let filtered = FilterStage::new(data, &config.filters).apply(data)?;
    info!(
        "{} of {} rows match filters [{}]",
        filtered.nrows(),
        data.nrows(),
        config.filters
    );

    let labels = IdentityResolver::new(&filtered).labels(&filtered);
    let features = FeatureMatrix::extract(&filtered)?;
    let embedding = mds::fit(&features.data, &config.mds_params())?;
    let clustering = kmeans::fit(&embedding.coords, config.k, &config.kmeans_params())?;
    let suggestions = suggest(&clustering.assignments, &labels, MIN_GROUP_SIZE);
    info!("{} repositioning suggestions", suggestions.len());

    Ok(PerceptualMap {
        data: filtered,
        labels,
        features,
        embedding,
        clustering,
        suggestions,
    })
}
