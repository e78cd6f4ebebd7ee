use std::{
    collections::{BTreeMap, HashMap},
    fs,
    io,
    path::{Path, PathBuf},
};

use parking_lot::{Mutex, RwLock};

use crate::{core::point::PricePoint, prelude::*};

/// Selected hours per device, mirrored into a JSON file on every change.
///
/// The in-memory map is the source of truth for the running process,
/// the file is there to survive restarts.
pub struct ScheduleStore {
    path: PathBuf,
    schedules: RwLock<HashMap<String, Vec<PricePoint>>>,

    /// Serializes the file writes, so that an older snapshot never overwrites a newer one.
    file_lock: Mutex<()>,
}

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("failed to serialize the schedules")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write `{}`", .path.display())]
    Write {
        path: PathBuf,

        #[source]
        source: io::Error,
    },
}

impl ScheduleStore {
    /// Load the schedules from the file.
    ///
    /// A missing file means there is nothing scheduled yet. Anything else that cannot be read
    /// or parsed, a directory included, is an error.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let schedules = match fs::read(&path) {
            Ok(contents) => serde_json::from_slice::<HashMap<String, Vec<PricePoint>>>(&contents)
                .with_context(|| format!("`{}` is corrupt", path.display()))?,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                info!("no saved schedules found");
                HashMap::new()
            }
            Err(error) => {
                return Err(error).with_context(|| format!("failed to read `{}`", path.display()));
            }
        };
        info!(n_devices = schedules.len(), "loaded");
        Ok(Self { path, schedules: RwLock::new(schedules), file_lock: Mutex::new(()) })
    }

    #[must_use]
    pub fn get(&self, device_id: &str) -> Option<Vec<PricePoint>> {
        self.schedules.read().get(device_id).cloned()
    }

    #[must_use]
    pub fn device_ids(&self) -> Vec<String> {
        let mut device_ids = self.schedules.read().keys().cloned().collect::<Vec<_>>();
        device_ids.sort_unstable();
        device_ids
    }

    /// Replace the device's schedule and write the file.
    ///
    /// The new schedule stays in effect even when the file could not be written.
    #[instrument(skip_all, fields(device_id = device_id))]
    pub fn put(&self, device_id: &str, points: Vec<PricePoint>) -> Result<(), PersistError> {
        let n_points = points.len();
        self.schedules.write().insert(device_id.to_owned(), points);
        debug!(n_points, "updated");
        self.persist()
    }

    /// Forget the device, if it is known at all, and write the file.
    #[instrument(skip_all, fields(device_id = device_id))]
    pub fn remove(&self, device_id: &str) -> Result<(), PersistError> {
        if self.schedules.write().remove(device_id).is_none() {
            debug!("unknown device");
        }
        self.persist()
    }

    /// Write the entire map into a temporary file, and then move it over the real one.
    fn persist(&self) -> Result<(), PersistError> {
        let _file_guard = self.file_lock.lock();

        // The snapshot is taken under the file lock, hence the latest write is always the newest state.
        let contents = {
            let schedules = self.schedules.read();
            serde_json::to_vec_pretty(&schedules.iter().collect::<BTreeMap<_, _>>())?
        };

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .map_err(|source| PersistError::Write { path: parent.to_path_buf(), source })?;
        }
        let temporary_path = {
            let mut path = self.path.clone().into_os_string();
            path.push(".tmp");
            PathBuf::from(path)
        };
        fs::write(&temporary_path, contents)
            .map_err(|source| PersistError::Write { path: temporary_path.clone(), source })?;
        fs::rename(&temporary_path, &self.path)
            .map_err(|source| PersistError::Write { path: self.path.clone(), source })?;

        debug!(path = %self.path.display(), "saved");
        Ok(())
    }
}
