//! `RecordMap`: the record arena and its id index for one session.

use std::collections::HashMap;
use std::rc::Rc;

use crate::error::DecodeError;
use crate::options::DecodeOptions;
use crate::record::{ClassMetadata, Id, Record, RecordIndex};

/// Arena of every record read or built in one pass, indexed by position and
/// by id.
///
/// A referenceable record reserves its slot as soon as its id is known, so
/// members parsed afterwards may refer back to it (self-cycles). The slot is
/// filled once the record is complete.
#[derive(Debug, Default)]
pub struct RecordMap {
    records: Vec<Option<Record>>,
    ids: HashMap<Id, RecordIndex>,
    classes: HashMap<Id, Rc<ClassMetadata>>,
    options: DecodeOptions,
    null_slots: usize,
}

impl RecordMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: DecodeOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn options(&self) -> &DecodeOptions {
        &self.options
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Allocates an empty slot, registering `id` for it when given.
    pub fn reserve(&mut self, id: Option<Id>) -> Result<RecordIndex, DecodeError> {
        let index = RecordIndex(self.records.len());
        if let Some(id) = id {
            self.register(id, index)?;
        }
        self.records.push(None);
        Ok(index)
    }

    /// Completes a slot obtained from [`RecordMap::reserve`].
    pub fn fill(&mut self, index: RecordIndex, record: Record) {
        if let Some(slot) = self.records.get_mut(index.0) {
            *slot = Some(record);
        }
    }

    /// Appends a complete record, registering its id if it has one.
    pub fn push(&mut self, record: Record) -> Result<RecordIndex, DecodeError> {
        let index = self.reserve(record.id())?;
        self.fill(index, record);
        Ok(index)
    }

    /// Registers `record` under `id`.
    pub fn set(&mut self, id: Id, record: Record) -> Result<RecordIndex, DecodeError> {
        let index = self.reserve(Some(id))?;
        self.fill(index, record);
        Ok(index)
    }

    /// The record registered under `id`.
    pub fn get(&self, id: Id) -> Result<&Record, DecodeError> {
        let index = self.index_of(id)?;
        self.record(index)
            .ok_or(DecodeError::UnresolvedReference(id))
    }

    pub fn index_of(&self, id: Id) -> Result<RecordIndex, DecodeError> {
        self.ids
            .get(&id)
            .copied()
            .ok_or(DecodeError::UnresolvedReference(id))
    }

    pub fn contains(&self, id: Id) -> bool {
        self.ids.contains_key(&id)
    }

    /// The record at `index`; `None` while its slot is still reserved.
    pub fn record(&self, index: RecordIndex) -> Option<&Record> {
        self.records.get(index.0)?.as_ref()
    }

    /// Iterates over complete records in arena order.
    pub fn iter(&self) -> impl Iterator<Item = (RecordIndex, &Record)> + '_ {
        self.records
            .iter()
            .enumerate()
            .filter_map(|(i, r)| r.as_ref().map(|r| (RecordIndex(i), r)))
    }

    pub fn register_class(&mut self, id: Id, metadata: Rc<ClassMetadata>) {
        self.classes.insert(id, metadata);
    }

    /// Accounts for `count` nulls about to be expanded from a null run.
    pub fn take_null_slots(&mut self, count: usize) -> Result<(), DecodeError> {
        let limit = self.options.max_null_slots;
        match self.null_slots.checked_add(count) {
            Some(total) if total <= limit => {
                self.null_slots = total;
                Ok(())
            }
            _ => {
                log::debug!("[binfmt] null run of {count} exceeds the {limit} slot limit");
                Err(DecodeError::NullLimitExceeded(limit))
            }
        }
    }

    /// Layout of the class record with `id`, for `ClassWithId` records.
    pub fn class_metadata(&self, id: Id) -> Result<Rc<ClassMetadata>, DecodeError> {
        self.classes
            .get(&id)
            .cloned()
            .ok_or(DecodeError::UnresolvedReference(id))
    }

    fn register(&mut self, id: Id, index: RecordIndex) -> Result<(), DecodeError> {
        if id == 0 {
            return Err(DecodeError::ZeroId);
        }
        if self.ids.contains_key(&id) && !self.options.allow_duplicate_ids {
            log::debug!("[binfmt] duplicate id {id}");
            return Err(DecodeError::DuplicateId(id));
        }
        self.ids.insert(id, index);
        Ok(())
    }
}
