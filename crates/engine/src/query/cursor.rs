//! Result cursors
//!
//! A [`ResultCursor`] pulls documents from one or more storage finds, merged
//! in sort order, and turns them into datastore results.
//!
//! ## Offset
//!
//! The offset is not handed to the storage engine. The cursor discards the
//! first `offset` results itself on first use and reports how many it
//! discarded, capped at the configured maximum, exactly once. Discarding
//! continues past the cap; the cap only bounds the reported count.
//!
//! ## Projection splitting
//!
//! When a projected property holds a list, the document is exploded into one
//! partial entity per element, each carrying that property as a one-element
//! list. Repeated elements yield one partial entity. Filters declared on that
//! property narrow which elements are emitted. Only one list-valued projected property can be split; with more,
//! the document is returned whole and the cursor is marked degraded.
//!
//! Offset and limit count emitted results, after splitting.

use std::collections::VecDeque;

use tracing::{debug, warn};

use dsbridge_core::{Entity, Limits, Result, Value};
use dsbridge_storage::{compare_documents, Document, DocumentCursor, Filter, SortSpec};

use crate::codec::from_document;
use crate::codec::value::encode as encode_value;
use crate::query::translate::TranslatedQuery;

/// A resumable sequence of query results
pub trait EntityCursor: Send {
    /// Next result, or `None` when exhausted
    fn next_item(&mut self) -> Result<Option<Entity>>;

    /// Results skipped for the query offset
    ///
    /// Performs the skip on first call.
    fn skipped_results(&mut self) -> Result<usize>;

    /// Whether the cursor fell back to unsplit results
    fn is_degraded(&self) -> bool {
        false
    }

    /// Up to `count` results; fewer only when the cursor is exhausted
    fn fetch(&mut self, count: usize) -> Result<Vec<Entity>> {
        let mut batch = Vec::with_capacity(count.min(64));
        while batch.len() < count {
            match self.next_item()? {
                Some(entity) => batch.push(entity),
                None => break,
            }
        }
        Ok(batch)
    }
}

/// K-way merge of sorted document streams
///
/// Ties go to the earlier stream.
pub struct MergedDocuments {
    sources: Vec<DocumentCursor>,
    heads: Vec<Option<Document>>,
    stale: Vec<usize>,
    sort: SortSpec,
}

impl MergedDocuments {
    /// Merge `sources`, each already sorted by `sort`
    pub fn new(sources: Vec<DocumentCursor>, sort: SortSpec) -> Self {
        let stale = (0..sources.len()).collect();
        let heads = sources.iter().map(|_| None).collect();
        MergedDocuments {
            sources,
            heads,
            stale,
            sort,
        }
    }
}

impl Iterator for MergedDocuments {
    type Item = Result<Document>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(index) = self.stale.pop() {
            match self.sources[index].next() {
                Some(Ok(doc)) => self.heads[index] = Some(doc),
                Some(Err(e)) => {
                    self.stale.push(index);
                    return Some(Err(e));
                }
                None => self.heads[index] = None,
            }
        }

        let mut best: Option<usize> = None;
        for (index, head) in self.heads.iter().enumerate() {
            let Some(doc) = head else { continue };
            let better = match best.and_then(|b| self.heads[b].as_ref()) {
                Some(current) => compare_documents(doc, current, &self.sort).is_lt(),
                None => true,
            };
            if better {
                best = Some(index);
            }
        }

        let index = best?;
        self.stale.push(index);
        self.heads[index].take().map(Ok)
    }
}

/// Cursor over a translated storage query
pub struct ResultCursor {
    documents: MergedDocuments,
    query: TranslatedQuery,
    limits: Limits,
    skipped: Option<usize>,
    emitted: usize,
    split_buffer: VecDeque<Entity>,
    degraded: bool,
    exhausted: bool,
}

impl ResultCursor {
    /// Wrap merged documents for a translated query
    pub fn new(documents: MergedDocuments, query: TranslatedQuery, limits: Limits) -> Self {
        ResultCursor {
            documents,
            query,
            limits,
            skipped: None,
            emitted: 0,
            split_buffer: VecDeque::new(),
            degraded: false,
            exhausted: false,
        }
    }

    fn skip_offset(&mut self) -> Result<usize> {
        if let Some(skipped) = self.skipped {
            return Ok(skipped);
        }
        let mut discarded = 0;
        while discarded < self.query.offset {
            if self.pull()?.is_none() {
                break;
            }
            discarded += 1;
        }
        let reported = self.limits.reported_skip(discarded);
        debug!(
            target: "dsbridge::cursor",
            offset = self.query.offset,
            discarded,
            reported,
            "Applied offset"
        );
        self.skipped = Some(reported);
        Ok(reported)
    }

    /// Next result before offset and limit accounting
    fn pull(&mut self) -> Result<Option<Entity>> {
        loop {
            if let Some(partial) = self.split_buffer.pop_front() {
                return Ok(Some(partial));
            }
            if self.exhausted {
                return Ok(None);
            }
            let Some(doc) = self.documents.next() else {
                self.exhausted = true;
                return Ok(None);
            };
            let entity = from_document(&doc?)?;
            if self.query.keys_only {
                return Ok(Some(Entity::new(entity.key().clone())));
            }
            if self.query.projection.is_empty() {
                return Ok(Some(entity));
            }
            match self.split(entity)? {
                Some(whole) => return Ok(Some(whole)),
                None => continue,
            }
        }
    }

    /// Split a projected entity into the buffer
    ///
    /// Returns the entity itself when there is nothing to split.
    fn split(&mut self, entity: Entity) -> Result<Option<Entity>> {
        let repeated: Vec<String> = self
            .query
            .projection
            .iter()
            .filter(|p| entity.get(p).map(Value::is_list).unwrap_or(false))
            .cloned()
            .collect();

        if repeated.is_empty() {
            return Ok(Some(entity));
        }
        if repeated.len() > 1 {
            if !self.degraded {
                warn!(
                    target: "dsbridge::cursor",
                    properties = ?repeated,
                    "Projection on more than one repeated property; returning unsplit results"
                );
            }
            self.degraded = true;
            return Ok(Some(entity));
        }

        let property = &repeated[0];
        let elements = match entity.get(property) {
            Some(Value::List(items)) => items.clone(),
            _ => return Ok(Some(entity)),
        };
        let narrowing = self
            .query
            .conditions_on(property)
            .map(|(field, conditions)| {
                let parts = conditions
                    .iter()
                    .map(|c| Filter::field(field, c.clone()))
                    .collect();
                (field.to_string(), Filter::And(parts))
            });

        let mut seen: Vec<Value> = Vec::with_capacity(elements.len());
        for element in elements {
            if seen.contains(&element) {
                continue;
            }
            seen.push(element.clone());
            if let Some((field, filter)) = &narrowing {
                let mut candidate = Document::new();
                candidate.insert(field.clone(), encode_value(&element)?);
                if !filter.matches(&candidate) {
                    continue;
                }
            }
            let mut partial = entity.clone();
            partial.set(property.clone(), Value::List(vec![element]));
            self.split_buffer.push_back(partial);
        }
        Ok(None)
    }
}

impl EntityCursor for ResultCursor {
    fn next_item(&mut self) -> Result<Option<Entity>> {
        self.skip_offset()?;
        if let Some(limit) = self.query.limit {
            if self.emitted >= limit {
                return Ok(None);
            }
        }
        let next = self.pull()?;
        if next.is_some() {
            self.emitted += 1;
        }
        Ok(next)
    }

    fn skipped_results(&mut self) -> Result<usize> {
        self.skip_offset()
    }

    fn is_degraded(&self) -> bool {
        self.degraded
    }
}
