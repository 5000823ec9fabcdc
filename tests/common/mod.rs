#![allow(dead_code)]

pub mod assets {
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    /// Temporary assets directory, removed on drop.
    pub struct AssetDir {
        dir: TempDir,
    }

    impl AssetDir {
        pub fn new() -> Self {
            Self {
                dir: tempfile::tempdir().unwrap(),
            }
        }

        /// Build a tree from `(relative path, contents)` pairs.
        pub fn with_files(files: &[(&str, &str)]) -> Self {
            let assets = Self::new();
            for (rel, contents) in files {
                assets.write(rel, contents);
            }
            assets
        }

        pub fn path(&self) -> &Path {
            self.dir.path()
        }

        /// Write a file, creating parent directories.
        pub fn write(&self, rel: &str, contents: &str) -> PathBuf {
            let file = self.dir.path().join(rel);
            if let Some(parent) = file.parent() {
                std::fs::create_dir_all(parent).unwrap();
            }
            std::fs::write(&file, contents).unwrap();
            file
        }

        pub fn mkdir(&self, rel: &str) -> PathBuf {
            let dir = self.dir.path().join(rel);
            std::fs::create_dir_all(&dir).unwrap();
            dir
        }

        pub fn remove(&self, rel: &str) {
            std::fs::remove_file(self.dir.path().join(rel)).unwrap();
        }
    }
}

pub mod requests {
    use http::header::{IF_MODIFIED_SINCE, IF_NONE_MATCH};
    use http::Request;
    use static_routes::{build_routes, Outcome, RouteTable, StaticConfig};
    use std::time::SystemTime;

    pub async fn table(config: &StaticConfig) -> RouteTable {
        let mut table = RouteTable::new();
        table.extend(build_routes(config).await.unwrap()).unwrap();
        table
    }

    pub async fn get(table: &RouteTable, path: &str) -> Outcome {
        let req = Request::get(path).body(()).unwrap();
        table.dispatch(&req).await
    }

    pub async fn get_if_none_match(table: &RouteTable, path: &str, etag: &str) -> Outcome {
        let req = Request::get(path)
            .header(IF_NONE_MATCH, etag)
            .body(())
            .unwrap();
        table.dispatch(&req).await
    }

    pub async fn get_if_modified_since(table: &RouteTable, path: &str, since: SystemTime) -> Outcome {
        let req = Request::get(path)
            .header(IF_MODIFIED_SINCE, httpdate::fmt_http_date(since))
            .body(())
            .unwrap();
        table.dispatch(&req).await
    }
}
