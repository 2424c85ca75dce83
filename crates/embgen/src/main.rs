//! `embgen` writes synthetic clustered 3D embedding datasets, one JSON file
//! per (technique, embedding, clustering) combination the viewer offers.

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::{info, warn};
use rand::{rngs::StdRng, seq::index, Rng, SeedableRng};
use rayon::prelude::*;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// Combinations shipped with the viewer, as (technique, embedding, clustering).
const COMBINATIONS: [(&str, &str, &str); 8] = [
    ("pca", "word2vec", "kmeans"),
    ("pca", "word2vec", "dbscan"),
    ("pca", "glove", "kmeans"),
    ("pca", "glove", "hierarchical"),
    ("pca", "bert", "gmm"),
    ("tsne", "word2vec", "kmeans"),
    ("tsne", "fasttext", "dbscan"),
    ("tsne", "elmo", "hierarchical"),
];

/// Clusterers that label outliers as noise (`-1`).
const DENSITY_BASED: [&str; 1] = ["dbscan"];

#[derive(Parser, Debug, Clone)]
#[command(name = "embgen", version)]
struct Args {
    #[arg(long, default_value = "public/data")]
    output_dir: PathBuf,

    /// Points per dataset.
    #[arg(long, default_value_t = 1500)]
    points: usize,

    #[arg(long, default_value_t = 4, value_parser = clap::value_parser!(u32).range(1..))]
    clusters: u32,

    /// Seed for reproducible output; each combination derives its own stream.
    #[arg(long)]
    seed: Option<u64>,

    /// Share of points relabelled as noise for density-based clusterers.
    #[arg(long, default_value_t = 0.0)]
    noise: f64,

    #[arg(long, default_value_t = false)]
    overwrite: bool,
}

#[derive(Debug, Serialize, PartialEq)]
struct Entry {
    point: [f64; 3],
    cluster: i32,
}

fn file_name((technique, embedding, clustering): (&str, &str, &str)) -> String {
    format!("{technique}_{embedding}_{clustering}.json")
}

/// Even split; the remainder goes to cluster 0.
fn cluster_sizes(points: usize, clusters: usize) -> Vec<usize> {
    let mut sizes = vec![points / clusters; clusters];
    sizes[0] += points % clusters;
    sizes
}

fn cluster_base(c: usize) -> [f64; 3] {
    [
        (c % 2) as f64 * 3.0 - 1.5,
        (c / 2) as f64 * 3.0 - 1.5,
        (c % 3) as f64 * 2.0 - 1.0,
    ]
}

fn generate<R: Rng>(rng: &mut R, points: usize, clusters: usize, noise: f64) -> Vec<Entry> {
    let mut entries = Vec::with_capacity(points);
    for (c, size) in cluster_sizes(points, clusters).into_iter().enumerate() {
        let base = cluster_base(c);
        for _ in 0..size {
            entries.push(Entry {
                point: base.map(|b| b + rng.gen_range(-1.0..1.0)),
                cluster: c as i32,
            });
        }
    }

    let relabel = ((points as f64) * noise).round() as usize;
    if relabel > 0 {
        for i in index::sample(rng, points, relabel.min(points)) {
            entries[i].cluster = -1;
        }
    }
    entries
}

/// `{ "id0": { "point": [...], "cluster": c }, ... }` in generation order.
fn to_json(entries: Vec<Entry>) -> Result<Value> {
    let mut map = Map::with_capacity(entries.len());
    for (i, entry) in entries.into_iter().enumerate() {
        map.insert(format!("id{i}"), serde_json::to_value(entry)?);
    }
    Ok(Value::Object(map))
}

/// Returns false when the file exists and overwriting is off.
fn write_dataset(path: &Path, value: &Value, overwrite: bool) -> Result<bool> {
    if path.exists() && !overwrite {
        return Ok(false);
    }
    let text = serde_json::to_string(value)?;
    fs::write(path, text).with_context(|| format!("writing {}", path.display()))?;
    Ok(true)
}

fn run_one(args: &Args, slot: usize, combo: (&str, &str, &str)) -> Result<()> {
    let path = args.output_dir.join(file_name(combo));
    let noise = if DENSITY_BASED.contains(&combo.2) { args.noise } else { 0.0 };

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(slot as u64)),
        None => StdRng::from_entropy(),
    };
    let entries = generate(&mut rng, args.points, args.clusters as usize, noise);
    let value = to_json(entries)?;

    if write_dataset(&path, &value, args.overwrite)? {
        info!("Wrote {} ({} points)", path.display(), args.points);
    } else {
        info!("Skipping {} (exists, pass --overwrite)", path.display());
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if !(0.0..=1.0).contains(&args.noise) {
        bail!("--noise must be within [0, 1], got {}", args.noise);
    }
    if args.points == 0 {
        bail!("--points must be positive");
    }
    fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("creating {}", args.output_dir.display()))?;

    info!(
        "Generating {} datasets into {}...",
        COMBINATIONS.len(),
        args.output_dir.display()
    );

    let failures = COMBINATIONS
        .par_iter()
        .enumerate()
        .filter(|(slot, combo)| match run_one(&args, *slot, **combo) {
            Ok(()) => false,
            Err(err) => {
                warn!("Error generating {}: {:#}", file_name(**combo), err);
                true
            }
        })
        .count();

    if failures > 0 {
        bail!("{failures} dataset(s) failed");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn names_match_viewer_convention() {
        assert_eq!(file_name(COMBINATIONS[3]), "pca_glove_hierarchical.json");
        assert_eq!(file_name(COMBINATIONS[6]), "tsne_fasttext_dbscan.json");
    }

    #[test]
    fn remainder_goes_to_first_cluster() {
        assert_eq!(cluster_sizes(1500, 4), vec![375; 4]);
        assert_eq!(cluster_sizes(10, 3), vec![4, 3, 3]);
        assert_eq!(cluster_sizes(2, 4), vec![2, 0, 0, 0]);
    }

    #[test]
    fn cluster_bases() {
        assert_eq!(cluster_base(0), [-1.5, -1.5, -1.0]);
        assert_eq!(cluster_base(1), [1.5, -1.5, 1.0]);
        assert_eq!(cluster_base(2), [-1.5, 1.5, 3.0]);
        assert_eq!(cluster_base(3), [1.5, 1.5, -1.0]);
    }

    #[test]
    fn points_stay_near_their_base() {
        let entries = generate(&mut rng(), 200, 4, 0.0);
        assert_eq!(entries.len(), 200);
        for e in &entries {
            let base = cluster_base(e.cluster as usize);
            for axis in 0..3 {
                let d = e.point[axis] - base[axis];
                assert!((-1.0..1.0).contains(&d), "{d}");
            }
        }
        assert_eq!(entries.iter().filter(|e| e.cluster == 3).count(), 50);
    }

    #[test]
    fn noise_relabels_requested_share() {
        let entries = generate(&mut rng(), 1000, 4, 0.1);
        assert_eq!(entries.iter().filter(|e| e.cluster == -1).count(), 100);
    }

    #[test]
    fn seeded_output_is_reproducible() {
        let a = generate(&mut rng(), 50, 2, 0.2);
        let b = generate(&mut rng(), 50, 2, 0.2);
        assert_eq!(a, b);
    }

    #[test]
    fn json_shape() {
        let value = to_json(generate(&mut rng(), 3, 2, 0.0)).unwrap();
        let obj = value.as_object().unwrap();
        let keys: Vec<_> = obj.keys().cloned().collect();
        assert_eq!(keys, ["id0", "id1", "id2"]);
        assert_eq!(obj["id2"]["cluster"], 1);
        assert_eq!(obj["id0"]["point"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn existing_file_is_kept_without_overwrite() {
        let dir = std::env::temp_dir().join(format!("embgen-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("pca_bert_gmm.json");
        fs::write(&path, "keep").unwrap();

        let value = to_json(generate(&mut rng(), 4, 1, 0.0)).unwrap();
        assert!(!write_dataset(&path, &value, false).unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), "keep");
        assert!(write_dataset(&path, &value, true).unwrap());
        assert!(fs::read_to_string(&path).unwrap().starts_with("{\"id0\""));
    }
}
