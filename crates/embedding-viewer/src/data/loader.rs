// src/data/loader.rs
//! Dataset naming and background loading.
//!
//! File IO and JSON decoding run on a worker thread. Every request carries a
//! monotonically increasing id and only the response to the latest request
//! is handed back; anything older is dropped.

use super::records::{parse_dataset, PointRecord};
use anyhow::{Context, Result};
use crossbeam_channel::{Receiver, Sender};
use std::path::{Path, PathBuf};
use std::thread;
use walkdir::WalkDir;

pub const TECHNIQUES: [&str; 2] = ["pca", "tsne"];
pub const EMBEDDINGS: [&str; 5] = ["word2vec", "glove", "fasttext", "bert", "elmo"];
pub const CLUSTERINGS: [&str; 4] = ["kmeans", "dbscan", "hierarchical", "gmm"];

/// The three choices that name a dataset file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatasetParams {
    pub technique: Option<&'static str>,
    pub embedding: Option<&'static str>,
    pub clustering: Option<&'static str>,
}

impl DatasetParams {
    pub fn is_complete(&self) -> bool {
        self.technique.is_some() && self.embedding.is_some() && self.clustering.is_some()
    }

    /// `<technique>_<embedding>_<clustering>.json`, once all three are chosen.
    pub fn file_name(&self) -> Option<String> {
        Some(format!(
            "{}_{}_{}.json",
            self.technique?, self.embedding?, self.clustering?
        ))
    }

    pub fn path_in(&self, data_dir: &Path) -> Option<PathBuf> {
        self.file_name().map(|name| data_dir.join(name))
    }

    /// True when every choice made in `partial` agrees with `self`.
    pub fn matches(&self, partial: &DatasetParams) -> bool {
        fn agree(have: Option<&str>, want: Option<&str>) -> bool {
            want.map_or(true, |w| have == Some(w))
        }
        agree(self.technique, partial.technique)
            && agree(self.embedding, partial.embedding)
            && agree(self.clustering, partial.clustering)
    }

    /// Recovers the parameters from a file name produced by [`Self::file_name`].
    pub fn from_file_name(name: &str) -> Option<Self> {
        let stem = name.strip_suffix(".json")?;
        let mut parts = stem.splitn(3, '_');
        let pick = |options: &[&'static str], part: Option<&str>| {
            part.and_then(|p| options.iter().copied().find(|o| *o == p))
        };
        let technique = pick(&TECHNIQUES, parts.next())?;
        let embedding = pick(&EMBEDDINGS, parts.next())?;
        let clustering = pick(&CLUSTERINGS, parts.next())?;
        Some(Self {
            technique: Some(technique),
            embedding: Some(embedding),
            clustering: Some(clustering),
        })
    }
}

/// Reads and decodes one dataset file.
pub fn read_dataset(path: &Path) -> Result<Vec<PointRecord>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading dataset {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&text)
        .with_context(|| format!("decoding JSON in {}", path.display()))?;
    let records = parse_dataset(&value).with_context(|| format!("parsing {}", path.display()))?;
    log::info!("Read {} records from {}", records.len(), path.display());
    Ok(records)
}

/// Dataset files directly inside `data_dir`, sorted by name.
pub fn available_datasets(data_dir: &Path) -> Vec<PathBuf> {
    let mut found: Vec<PathBuf> = WalkDir::new(data_dir)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().and_then(|s| s.to_str()) == Some("json"))
        .collect();
    found.sort();
    found
}

/// Parameter triples that have a dataset file in `data_dir`.
pub fn available_params(data_dir: &Path) -> Vec<DatasetParams> {
    available_datasets(data_dir)
        .iter()
        .filter_map(|p| p.file_name()?.to_str().and_then(DatasetParams::from_file_name))
        .collect()
}

struct LoadRequest {
    id: u64,
    path: PathBuf,
}

pub struct LoadResponse {
    pub id: u64,
    pub path: PathBuf,
    pub result: Result<Vec<PointRecord>>,
}

/// Handle to the loader thread.
pub struct DatasetLoader {
    tx: Option<Sender<LoadRequest>>,
    rx: Receiver<LoadResponse>,
    worker: Option<thread::JoinHandle<()>>,
    latest: u64,
    in_flight: bool,
}

impl DatasetLoader {
    pub fn spawn() -> Result<Self> {
        let (req_tx, req_rx) = crossbeam_channel::unbounded::<LoadRequest>();
        let (resp_tx, resp_rx) = crossbeam_channel::unbounded();

        let worker = thread::Builder::new()
            .name("dataset-loader".into())
            .spawn(move || {
                for req in req_rx.iter() {
                    let result = read_dataset(&req.path);
                    let resp = LoadResponse {
                        id: req.id,
                        path: req.path,
                        result,
                    };
                    if resp_tx.send(resp).is_err() {
                        break;
                    }
                }
                log::debug!("Dataset loader thread exiting");
            })
            .context("spawning dataset loader thread")?;

        Ok(Self {
            tx: Some(req_tx),
            rx: resp_rx,
            worker: Some(worker),
            latest: 0,
            in_flight: false,
        })
    }

    /// Queues a load and returns its request id. Supersedes earlier requests.
    pub fn request(&mut self, path: PathBuf) -> u64 {
        self.latest += 1;
        let id = self.latest;
        log::info!("Loading dataset {} (request {id})", path.display());
        match self.tx.as_ref().map(|tx| tx.send(LoadRequest { id, path })) {
            Some(Ok(())) => self.in_flight = true,
            _ => log::error!("Dataset loader thread is gone; request {id} dropped"),
        }
        id
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight
    }

    /// Non-blocking: the response to the latest request, if it has arrived.
    pub fn poll(&mut self) -> Option<LoadResponse> {
        let mut current = None;
        while let Ok(resp) = self.rx.try_recv() {
            current = self.accept(resp).or(current);
        }
        current
    }

    fn accept(&mut self, resp: LoadResponse) -> Option<LoadResponse> {
        if resp.id != self.latest {
            log::warn!(
                "Dropping stale dataset response {} for {} (latest is {})",
                resp.id,
                resp.path.display(),
                self.latest
            );
            return None;
        }
        self.in_flight = false;
        Some(resp)
    }
}

impl Drop for DatasetLoader {
    fn drop(&mut self) {
        self.tx.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("Dataset loader thread panicked");
            }
        }
    }
}
