//! Flat inner-product vector index over entity descriptions.
//!
//! Vectors and identifiers live side by side: row `i` of the vector
//! matrix belongs to identifier `i`. Both are persisted and loaded
//! together, and every load validates that they still line up.

use std::collections::HashMap;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::store::EntityId;
use crate::{Error, Result};

/// One search hit.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub id: EntityId,
    pub score: f32,
}

/// On-disk vector file.
#[derive(Debug, Serialize, Deserialize)]
struct IndexFile {
    dimension: usize,
    vectors: Vec<Vec<f32>>,
}

/// Exact (brute-force) inner-product index.
#[derive(Debug, Clone, Default)]
pub struct VectorIndex {
    dimension: usize,
    ids: Vec<EntityId>,
    positions: HashMap<EntityId, usize>,
    // row-major, ids.len() * dimension
    data: Vec<f32>,
}

impl VectorIndex {
    /// Empty index accepting vectors of `dimension` entries.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            ids: Vec::new(),
            positions: HashMap::new(),
            data: Vec::new(),
        }
    }

    /// Build from parallel identifier and vector lists.
    pub fn from_parts(
        dimension: usize,
        ids: Vec<EntityId>,
        vectors: Vec<Vec<f32>>,
    ) -> Result<Self> {
        if ids.len() != vectors.len() {
            return Err(Error::IndexMismatch(format!(
                "{} vectors but {} identifiers",
                vectors.len(),
                ids.len()
            )));
        }

        let mut index = Self::new(dimension);
        index.ids.reserve(ids.len());
        index.data.reserve(ids.len() * dimension);
        for (id, vector) in ids.into_iter().zip(vectors) {
            index.add(id, &vector)?;
        }
        Ok(index)
    }

    /// Append one entity. Identifiers must be unique.
    pub fn add(&mut self, id: EntityId, vector: &[f32]) -> Result<()> {
        if self.dimension == 0 {
            return Err(Error::IndexMismatch(
                "index dimension must be positive".to_string(),
            ));
        }
        if vector.len() != self.dimension {
            return Err(Error::IndexMismatch(format!(
                "vector for '{}' has {} dimensions, index expects {}",
                id,
                vector.len(),
                self.dimension
            )));
        }
        if self.positions.contains_key(&id) {
            return Err(Error::IndexMismatch(format!("duplicate identifier '{}'", id)));
        }

        self.positions.insert(id.clone(), self.ids.len());
        self.ids.push(id);
        self.data.extend_from_slice(vector);
        Ok(())
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Identifiers in index position order.
    pub fn ids(&self) -> &[EntityId] {
        &self.ids
    }

    /// Index position of an identifier.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.positions.get(id).copied()
    }

    /// Check that an embedder producing `dimension`-sized vectors (when
    /// known) can query this index.
    pub fn ensure_compatible(&self, dimension: Option<usize>) -> Result<()> {
        match dimension {
            Some(dim) if !self.is_empty() && dim != self.dimension => {
                Err(Error::IndexMismatch(format!(
                    "index dimension is {}, embedder produces {}",
                    self.dimension, dim
                )))
            }
            _ => Ok(()),
        }
    }

    pub fn vector(&self, position: usize) -> Option<&[f32]> {
        if position >= self.ids.len() {
            return None;
        }
        let start = position * self.dimension;
        Some(&self.data[start..start + self.dimension])
    }

    /// Top-`k` entities by inner product, best first.
    ///
    /// Returns `min(k, len)` hits. Equal scores keep insertion order.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        if self.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        if query.len() != self.dimension {
            return Err(Error::IndexMismatch(format!(
                "query has {} dimensions, index expects {}",
                query.len(),
                self.dimension
            )));
        }

        let mut scored: Vec<(usize, f32)> = self
            .data
            .chunks_exact(self.dimension)
            .map(|row| inner_product(row, query))
            .enumerate()
            .collect();

        // stable sort: ties stay in insertion order
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);

        debug!("Vector search returned {} of {} entities", scored.len(), self.len());

        Ok(scored
            .into_iter()
            .map(|(pos, score)| SearchHit {
                id: self.ids[pos].clone(),
                score,
            })
            .collect())
    }

    /// Write the vector file and the identifier file together.
    pub fn save<P: AsRef<Path>, Q: AsRef<Path>>(&self, index_path: P, ids_path: Q) -> Result<()> {
        let index_path = index_path.as_ref();
        let ids_path = ids_path.as_ref();

        let file = IndexFile {
            dimension: self.dimension,
            vectors: self
                .data
                .chunks_exact(self.dimension.max(1))
                .map(<[f32]>::to_vec)
                .collect(),
        };

        let mut writer = BufWriter::new(fs::File::create(index_path)?);
        serde_json::to_writer(&mut writer, &file)?;
        writer.flush()?;

        let mut writer = BufWriter::new(fs::File::create(ids_path)?);
        for id in &self.ids {
            writeln!(writer, "{}", id)?;
        }
        writer.flush()?;

        info!(
            "Saved index with {} entities (dim {}) to {} and {}",
            self.len(),
            self.dimension,
            index_path.display(),
            ids_path.display()
        );
        Ok(())
    }

    /// Load and cross-validate the vector file and the identifier file.
    pub fn load<P: AsRef<Path>, Q: AsRef<Path>>(index_path: P, ids_path: Q) -> Result<Self> {
        let index_path = index_path.as_ref();
        let ids_path = ids_path.as_ref();

        let raw = fs::read_to_string(index_path)
            .map_err(|e| Error::Load(format!("cannot read {}: {}", index_path.display(), e)))?;
        let file: IndexFile = serde_json::from_str(&raw)
            .map_err(|e| Error::Load(format!("invalid index file {}: {}", index_path.display(), e)))?;

        let ids_raw = fs::read_to_string(ids_path)
            .map_err(|e| Error::Load(format!("cannot read {}: {}", ids_path.display(), e)))?;
        let ids: Vec<EntityId> = ids_raw.lines().map(|line| line.trim().to_string()).collect();

        let index = if ids.is_empty() && file.vectors.is_empty() {
            Self::new(file.dimension)
        } else {
            Self::from_parts(file.dimension, ids, file.vectors)?
        };

        info!(
            "Loaded index with {} entities (dim {})",
            index.len(),
            index.dimension
        );
        Ok(index)
    }
}

pub fn inner_product(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
