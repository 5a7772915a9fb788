//! Graph documents on disk: `<graph_dir>/<name>_graph.json`.

use std::fs;
use std::path::{Path, PathBuf};

use navgraph_model::{DocumentError, Graph, document};
use thiserror::Error;
use tracing::info;

const SUFFIX: &str = "_graph.json";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("graph name {0:?} must be non-empty and contain no path separators")]
    InvalidName(String),

    #[error("no stored graph at {}", path.display())]
    NotFound { path: PathBuf },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Document(#[from] DocumentError),
}

fn check_name(name: &str) -> Result<(), StoreError> {
    if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
        return Err(StoreError::InvalidName(name.to_string()));
    }
    Ok(())
}

pub fn graph_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{name}{SUFFIX}"))
}

/// Encode `graph` and write it under `name`, creating `dir` if needed.
pub fn save(dir: &Path, name: &str, graph: &mut Graph) -> Result<PathBuf, StoreError> {
    check_name(name)?;
    let json = document::encode(graph)?;
    fs::create_dir_all(dir).map_err(|source| StoreError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let path = graph_path(dir, name);
    fs::write(&path, json).map_err(|source| StoreError::Io {
        path: path.clone(),
        source,
    })?;
    info!(path = %path.display(), hallways = graph.len(), "graph saved");
    Ok(path)
}

/// Read and decode the graph stored under `name`. The caller's live graph is
/// only replaced once this returns `Ok`.
pub fn load(dir: &Path, name: &str) -> Result<Graph, StoreError> {
    check_name(name)?;
    let path = graph_path(dir, name);
    if !path.exists() {
        return Err(StoreError::NotFound { path });
    }
    let json = fs::read_to_string(&path).map_err(|source| StoreError::Io {
        path: path.clone(),
        source,
    })?;
    let graph = document::decode(&json)?;
    info!(path = %path.display(), hallways = graph.len(), next_id = graph.next_id(), "graph loaded");
    Ok(graph)
}

/// Names of the graphs stored in `dir`, sorted. A missing directory is empty.
pub fn list(dir: &Path) -> Result<Vec<String>, StoreError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(StoreError::Io {
                path: dir.to_path_buf(),
                source,
            });
        }
    };
    let mut names: Vec<String> = entries
        .filter_map(Result::ok)
        .filter_map(|e| {
            e.file_name()
                .to_str()
                .and_then(|f| f.strip_suffix(SUFFIX))
                .map(str::to_string)
        })
        .filter(|n| !n.is_empty())
        .collect();
    names.sort();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use navgraph_geometry::Polygon;
    use navgraph_model::Hallway;
    use navgraph_types::{HallwayId, Point3};

    fn sample() -> Graph {
        let mut graph = Graph::new();
        let id = graph.allocate_id().unwrap();
        let corners = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(4.0, 0.0, 0.0),
            Point3::new(4.0, 0.0, 2.0),
        ];
        graph
            .register(Hallway::new(id, "Lobby", 0, Polygon::new(corners)).unwrap())
            .unwrap();
        graph
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let graphs = dir.path().join("graphs");
        let mut graph = sample();

        let path = save(&graphs, "campus", &mut graph).expect("save");
        assert!(path.ends_with("campus_graph.json"));

        let mut loaded = load(&graphs, "campus").expect("load");
        assert_eq!(loaded.find(HallwayId(0)).map(|h| h.name.as_str()), Some("Lobby"));
        assert_eq!(loaded.allocate_id(), Ok(HallwayId(1)));
    }

    #[test]
    fn list_finds_saved_graphs() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let mut graph = sample();
        save(dir.path(), "west", &mut graph).unwrap();
        save(dir.path(), "east", &mut graph).unwrap();
        fs::write(dir.path().join("notes.txt"), "x").unwrap();

        assert_eq!(list(dir.path()).unwrap(), vec!["east", "west"]);
        assert!(list(&dir.path().join("absent")).unwrap().is_empty());
    }

    #[test]
    fn missing_and_corrupt_files_are_errors() {
        let dir = tempfile::tempdir().expect("tmp dir");
        assert!(matches!(load(dir.path(), "nope"), Err(StoreError::NotFound { .. })));

        fs::write(graph_path(dir.path(), "broken"), "{ not json").unwrap();
        assert!(matches!(
            load(dir.path(), "broken"),
            Err(StoreError::Document(DocumentError::Json(_)))
        ));
    }

    #[test]
    fn names_cannot_escape_the_directory() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let mut graph = sample();
        for bad in ["", "..", "a/b", "a\\b"] {
            assert!(matches!(
                save(dir.path(), bad, &mut graph),
                Err(StoreError::InvalidName(_))
            ));
        }
    }
}
