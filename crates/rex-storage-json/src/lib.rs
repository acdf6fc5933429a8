//! rex-storage-json
//!
//! File-backed [`RecurringExpenseStore`]. Records are held in memory and the
//! whole file is rewritten through a temporary file after every commit, so a
//! crash leaves either the previous or the next snapshot on disk.

use std::{
    collections::BTreeMap,
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard},
};

use rex_core::{
    storage::{apply_to_map, select, stage_batch},
    ExpenseQuery, Mutation, MutationOutcome, RecurringExpenseStore, StoreError,
};
use rex_domain::{RecurringExpense, RecurringExpensePatch};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const SCHEMA_VERSION: u32 = 1;
const TMP_SUFFIX: &str = "tmp";

#[derive(Debug, Serialize, Deserialize)]
struct StoreFile {
    schema_version: u32,
    records: Vec<RecurringExpense>,
}

/// JSON snapshot store for recurring expenses.
#[derive(Debug)]
pub struct JsonExpenseStore {
    path: PathBuf,
    records: Mutex<BTreeMap<Uuid, RecurringExpense>>,
}

impl JsonExpenseStore {
    /// Opens the store at `path`, starting empty when the file does not exist.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let records = if path.exists() {
            load_records(&path)?
        } else {
            BTreeMap::new()
        };
        tracing::debug!(path = %path.display(), count = records.len(), "opened json expense store");
        Ok(Self {
            path,
            records: Mutex::new(records),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<Uuid, RecurringExpense>>, StoreError> {
        self.records
            .lock()
            .map_err(|_| StoreError::Backend("json store lock poisoned".into()))
    }

    /// Stages `mutations`, persists the result, and only then swaps it in.
    fn commit(&self, mutations: Vec<Mutation>) -> Result<Vec<MutationOutcome>, StoreError> {
        let mut records = self.lock()?;
        let (staged, outcomes) = stage_batch(&records, mutations)?;
        save_records(&self.path, &staged)?;
        *records = staged;
        Ok(outcomes)
    }

    fn commit_one(&self, mutation: Mutation) -> Result<RecurringExpense, StoreError> {
        let mut records = self.lock()?;
        let mut staged = records.clone();
        let outcome = apply_to_map(&mut staged, mutation)?;
        save_records(&self.path, &staged)?;
        *records = staged;
        Ok(outcome.into_record())
    }
}

impl RecurringExpenseStore for JsonExpenseStore {
    fn find_one(&self, id: Uuid) -> Result<Option<RecurringExpense>, StoreError> {
        Ok(self.lock()?.get(&id).cloned())
    }

    fn find_many(&self, query: &ExpenseQuery) -> Result<Vec<RecurringExpense>, StoreError> {
        Ok(select(self.lock()?.values(), query))
    }

    fn create(&self, record: RecurringExpense) -> Result<RecurringExpense, StoreError> {
        self.commit_one(Mutation::Create(record))
    }

    fn update(
        &self,
        id: Uuid,
        patch: &RecurringExpensePatch,
    ) -> Result<RecurringExpense, StoreError> {
        self.commit_one(Mutation::Update {
            id,
            patch: patch.clone(),
        })
    }

    fn delete(&self, id: Uuid) -> Result<RecurringExpense, StoreError> {
        self.commit_one(Mutation::Delete(id))
    }

    fn apply_batch(&self, mutations: Vec<Mutation>) -> Result<Vec<MutationOutcome>, StoreError> {
        self.commit(mutations)
    }
}

fn load_records(path: &Path) -> Result<BTreeMap<Uuid, RecurringExpense>, StoreError> {
    let data = fs::read_to_string(path)?;
    let file: StoreFile =
        serde_json::from_str(&data).map_err(|err| StoreError::Serde(err.to_string()))?;
    if file.schema_version > SCHEMA_VERSION {
        return Err(StoreError::Backend(format!(
            "store schema version {} is newer than supported version {}",
            file.schema_version, SCHEMA_VERSION
        )));
    }
    Ok(file
        .records
        .into_iter()
        .map(|record| (record.id, record))
        .collect())
}

fn save_records(
    path: &Path,
    records: &BTreeMap<Uuid, RecurringExpense>,
) -> Result<(), StoreError> {
    let file = StoreFile {
        schema_version: SCHEMA_VERSION,
        records: records.values().cloned().collect(),
    };
    let json =
        serde_json::to_string_pretty(&file).map_err(|err| StoreError::Serde(err.to_string()))?;
    let tmp = tmp_path(path);
    write_atomic(&tmp, &json)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

fn write_atomic(path: &Path, data: &str) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.flush()?;
    Ok(())
}
