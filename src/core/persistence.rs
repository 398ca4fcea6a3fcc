/// Save-store seam. Implementations decide where save records live; the
/// player only talks to this trait.

use rustc_hash::FxHashMap;

use crate::error::SaveError;
use crate::schema::save::SaveData;

pub const SAVE_KEY_PREFIX: &str = "narrative-web-games-save:";

/// Storage key for a story's save slot. One slot per sheet, so several
/// stories can share one store without colliding.
pub fn save_key(sheet_id: &str) -> String {
    format!("{SAVE_KEY_PREFIX}{sheet_id}")
}

pub trait SaveStore {
    /// Write the record, replacing any earlier save for the same sheet.
    fn save(&mut self, data: &SaveData) -> Result<(), SaveError>;

    /// Read the save for `sheet_id`. `Ok(None)` when there is none.
    fn load(&self, sheet_id: &str) -> Result<Option<SaveData>, SaveError>;

    fn has_save(&self, sheet_id: &str) -> bool;

    fn delete(&mut self, sheet_id: &str) -> Result<(), SaveError>;
}

/// In-process store holding records as JSON text, the way a browser's
/// key-value storage would.
#[derive(Debug, Clone, Default)]
pub struct MemorySaveStore {
    entries: FxHashMap<String, String>,
}

impl MemorySaveStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw stored text for a key, for inspection and export.
    pub fn raw(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Put raw text under a key without validation.
    pub fn insert_raw(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }
}

impl SaveStore for MemorySaveStore {
    fn save(&mut self, data: &SaveData) -> Result<(), SaveError> {
        let json = data.to_json()?;
        self.entries.insert(save_key(&data.sheet_id), json);
        Ok(())
    }

    fn load(&self, sheet_id: &str) -> Result<Option<SaveData>, SaveError> {
        self.entries
            .get(&save_key(sheet_id))
            .map(|raw| SaveData::from_json(raw))
            .transpose()
    }

    fn has_save(&self, sheet_id: &str) -> bool {
        self.entries.contains_key(&save_key(sheet_id))
    }

    fn delete(&mut self, sheet_id: &str) -> Result<(), SaveError> {
        self.entries.remove(&save_key(sheet_id));
        Ok(())
    }
}
