use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use chrono::{DateTime, Utc};
use log::info;
use passkit_webservice::{HandlerResult, ListFilters, SerialNumbers};
use tokio::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Registration {
    device_id: String,
    pass_type_id: String,
    serial_number: String,
}

/// In memory registrations plus a directory of prebuilt pass archives.
#[derive(Debug)]
pub struct DemoStore {
    pass_directory: PathBuf,
    registrations: Mutex<HashSet<Registration>>,
}

impl DemoStore {
    pub fn new(pass_directory: impl Into<PathBuf>) -> Arc<Self> {
        Arc::new(Self {
            pass_directory: pass_directory.into(),
            registrations: Mutex::new(HashSet::new()),
        })
    }

    fn pass_path(&self, serial_number: &str) -> HandlerResult<PathBuf> {
        if serial_number.is_empty()
            || serial_number.starts_with('.')
            || serial_number.contains(['/', '\\'])
        {
            bail!("invalid serial number {serial_number:?}");
        }

        Ok(self.pass_directory.join(format!("{serial_number}.pkpass")))
    }

    pub async fn register(
        &self,
        device_id: String,
        pass_type_id: String,
        serial_number: String,
    ) -> HandlerResult<()> {
        info!("Register {device_id} for {pass_type_id}/{serial_number}");

        self.registrations.lock().await.insert(Registration {
            device_id,
            pass_type_id,
            serial_number,
        });
        Ok(())
    }

    pub async fn unregister(
        &self,
        device_id: String,
        pass_type_id: String,
        serial_number: String,
    ) -> HandlerResult<()> {
        info!("Unregister {device_id} from {pass_type_id}/{serial_number}");

        self.registrations.lock().await.remove(&Registration {
            device_id,
            pass_type_id,
            serial_number,
        });
        Ok(())
    }

    pub async fn pass(&self, pass_type_id: String, serial_number: String) -> HandlerResult<Vec<u8>> {
        let path = self.pass_path(&serial_number)?;

        tokio::fs::read(&path)
            .await
            .with_context(|| format!("reading pass {pass_type_id}/{serial_number} from {path:?}"))
    }

    async fn modified_at(&self, serial_number: &str) -> Option<i64> {
        let path = self.pass_path(serial_number).ok()?;
        let modified = tokio::fs::metadata(path).await.ok()?.modified().ok()?;

        Some(DateTime::<Utc>::from(modified).timestamp())
    }

    /// Serial numbers registered for the device whose archive changed after
    /// `previousLastUpdated`, a unix timestamp in seconds.
    pub async fn updatable(
        &self,
        device_id: String,
        pass_type_id: String,
        filters: ListFilters,
    ) -> HandlerResult<Option<SerialNumbers>> {
        let since = filters
            .previous_last_updated
            .and_then(|tag| tag.parse::<i64>().ok());

        let registered = self
            .registrations
            .lock()
            .await
            .iter()
            .filter(|r| r.device_id == device_id && r.pass_type_id == pass_type_id)
            .map(|r| r.serial_number.clone())
            .collect::<Vec<_>>();

        let mut serial_numbers = Vec::new();
        for serial_number in registered {
            let modified = match self.modified_at(&serial_number).await {
                Some(modified) => modified,
                None => continue,
            };

            if since.map_or(true, |since| modified > since) {
                serial_numbers.push(serial_number);
            }
        }

        if serial_numbers.is_empty() {
            return Ok(None);
        }

        serial_numbers.sort();
        Ok(Some(SerialNumbers {
            serial_numbers,
            last_updated: Utc::now().timestamp().to_string(),
        }))
    }
}
