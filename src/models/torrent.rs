use camino::{Utf8Component, Utf8Path, Utf8PathBuf};

/// Daemon state that qualifies a torrent for removal regardless of ratio
pub const FINISHED_STATE: &str = "Finished";

/// One torrent's status, parsed from a daemon info block
///
/// Rebuilt every poll cycle and never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct TorrentRecord {
    pub name: String,
    pub ratio: f64,
    /// Completion as reported by the daemon, e.g. "100%"
    pub progress: String,
    pub state: String,
    /// Storage directory, relative to the configured download root
    pub stop_location: String,
}

impl TorrentRecord {
    pub fn is_finished(&self) -> bool {
        self.state == FINISHED_STATE
    }

    /// Where the torrent's content lives on disk: `root/stop_location/name`.
    ///
    /// Both segments are appended below `root` even when `stop_location` starts
    /// with a separator. Returns `None` if either segment contains `..` or would
    /// otherwise leave `root`.
    pub fn resolved_path(&self, root: &Utf8Path) -> Option<Utf8PathBuf> {
        let mut path = root.to_path_buf();
        for segment in [self.stop_location.as_str(), self.name.as_str()] {
            for component in Utf8Path::new(segment).components() {
                match component {
                    Utf8Component::Normal(part) => path.push(part),
                    Utf8Component::CurDir | Utf8Component::RootDir => {}
                    Utf8Component::ParentDir | Utf8Component::Prefix(_) => return None,
                }
            }
        }

        if path == root {
            return None;
        }

        Some(path)
    }
}
