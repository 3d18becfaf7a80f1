//! Re-chunks per-post metadata JSON into batched JSONL archives.
use crate::error::Result;
use log::{error, info, warn};
use serde_json::Value;
use std::{
    collections::BTreeMap,
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

/// Walks the `post_{id}` folders under `root_dir` and regroups each one's
/// metadata JSON into `batch_{id / batch_size}.jsonl` files under
/// `output_dir` (the root directory itself when not given). Each output
/// line is a single `{filename: content}` object.
///
/// The whole corpus is accumulated in memory before anything is written;
/// folders with unparsable names, no JSON file, or corrupt JSON are logged
/// and skipped.
pub fn enumerate_jsons(root_dir: &Path, batch_size: u64, output_dir: Option<&Path>) -> Result<()> {
    assert!(batch_size > 0, "batch size must be nonzero");

    let output_dir = output_dir.unwrap_or(root_dir);
    fs::create_dir_all(output_dir)?;

    let mut batches: BTreeMap<u64, Vec<(String, Value)>> = BTreeMap::new();
    let mut processed = 0usize;

    for entry in fs::read_dir(root_dir)? {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable directory entry: {}", e);
                continue;
            }
        };
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }

        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        let Some(raw_id) = name.strip_prefix("post_") else {
            continue;
        };

        let post_id: u64 = match raw_id.parse() {
            Ok(id) => id,
            Err(e) => {
                warn!("Skipping {}: bad post directory name: {}", path.display(), e);
                continue;
            }
        };

        let json_path = match first_json_file(&path) {
            Ok(Some(json_path)) => json_path,
            Ok(None) => continue,
            Err(e) => {
                error!("Error processing {}: {}", path.display(), e);
                continue;
            }
        };

        let content = match read_json(&json_path) {
            Ok(value) => value,
            Err(e) => {
                error!("Error processing {}: {}", json_path.display(), e);
                continue;
            }
        };

        let file_name = json_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        batches
            .entry(post_id / batch_size)
            .or_default()
            .push((file_name, content));

        processed += 1;
        if processed % 1000 == 0 {
            info!("Processed {} post folders", processed);
        }
    }

    info!("Saving {} batch files", batches.len());
    for (batch_num, entries) in batches {
        let out_path = output_dir.join(format!("batch_{batch_num}.jsonl"));
        let entry_count = entries.len();
        let mut writer = BufWriter::new(File::create(&out_path)?);

        for (file_name, content) in entries {
            let mut line = serde_json::Map::new();
            line.insert(file_name, content);
            serde_json::to_writer(&mut writer, &Value::Object(line))?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;

        info!(
            "Saved batch {} with {} entries to {}",
            batch_num,
            entry_count,
            out_path.display()
        );
    }

    Ok(())
}

/// First `*.json` file inside `dir`, if any.
fn first_json_file(dir: &Path) -> Result<Option<PathBuf>> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|e| e == "json") {
            return Ok(Some(path));
        }
    }

    Ok(None)
}

fn read_json(path: &Path) -> Result<Value> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn write_post(root: &Path, post_id: u64, content: &Value) {
        let dir = root.join(format!("post_{post_id}"));
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join(format!("sankaku_{post_id}.json")),
            serde_json::to_string_pretty(content).unwrap(),
        )
        .unwrap();
    }

    fn read_lines(path: &Path) -> Vec<Value> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn posts_split_into_ranged_batches_and_round_trip() {
        let root = tempdir().unwrap();
        let out = tempdir().unwrap();

        for post_id in 0..20 {
            let content = json!({
                "post_id": post_id,
                "post_url": format!("https://www.sakugabooru.com/post/show/{post_id}"),
                "tags": { "tag-type-general": ["animated"] },
            });
            write_post(root.path(), post_id, &content);
        }

        enumerate_jsons(root.path(), 10, Some(out.path())).unwrap();

        let batch_0 = read_lines(&out.path().join("batch_0.jsonl"));
        let batch_1 = read_lines(&out.path().join("batch_1.jsonl"));
        assert_eq!(batch_0.len(), 10);
        assert_eq!(batch_1.len(), 10);
        assert!(!out.path().join("batch_2.jsonl").exists());

        let line = batch_1
            .iter()
            .find(|line| line.as_object().unwrap().contains_key("sankaku_15.json"))
            .unwrap();
        assert_eq!(line["sankaku_15.json"]["post_id"], 15);
        assert_eq!(
            line["sankaku_15.json"]["tags"]["tag-type-general"][0],
            "animated"
        );
    }

    #[test]
    fn bad_folders_are_skipped_not_fatal() {
        let root = tempdir().unwrap();
        let out = tempdir().unwrap();

        write_post(root.path(), 1, &json!({"post_id": 1}));

        // unparsable id
        fs::create_dir_all(root.path().join("post_abc")).unwrap();
        // unrelated folder
        fs::create_dir_all(root.path().join("cache")).unwrap();
        // no json inside
        fs::create_dir_all(root.path().join("post_2")).unwrap();
        // corrupt json
        let corrupt = root.path().join("post_3");
        fs::create_dir_all(&corrupt).unwrap();
        fs::write(corrupt.join("sankaku_3.json"), "{not json").unwrap();

        enumerate_jsons(root.path(), 10, Some(out.path())).unwrap();

        let lines = read_lines(&out.path().join("batch_0.jsonl"));
        assert_eq!(lines.len(), 1);
        assert!(lines[0].as_object().unwrap().contains_key("sankaku_1.json"));
    }

    #[test]
    fn output_defaults_to_the_root_directory() {
        let root = tempdir().unwrap();
        write_post(root.path(), 4, &json!({"post_id": 4}));

        enumerate_jsons(root.path(), 10_000, None).unwrap();

        assert!(root.path().join("batch_0.jsonl").exists());
    }
}
