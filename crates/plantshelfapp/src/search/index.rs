//! Inverted tag index.

use crate::model::PlantId;
use crate::store::entities::EntityStore;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// A tag with the number of plants carrying it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagCount {
    pub tag: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default)]
pub struct TagIndex {
    by_tag: BTreeMap<String, BTreeSet<PlantId>>,
}

impl TagIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rebuild(entities: &EntityStore) -> Self {
        let mut index = Self::new();
        for plant in entities.plants() {
            index.insert(plant.id, &plant.tags);
        }
        index
    }

    pub fn insert(&mut self, id: PlantId, tags: &BTreeSet<String>) {
        for tag in tags {
            self.by_tag.entry(tag.clone()).or_default().insert(id);
        }
    }

    pub fn remove(&mut self, id: PlantId, tags: &BTreeSet<String>) {
        for tag in tags {
            if let Some(ids) = self.by_tag.get_mut(tag) {
                ids.remove(&id);
                if ids.is_empty() {
                    self.by_tag.remove(tag);
                }
            }
        }
    }

    /// Applies the difference between a plant's old and new tag sets.
    pub fn replace(&mut self, id: PlantId, old: &BTreeSet<String>, new: &BTreeSet<String>) {
        let removed: BTreeSet<String> = old.difference(new).cloned().collect();
        let added: BTreeSet<String> = new.difference(old).cloned().collect();
        self.remove(id, &removed);
        self.insert(id, &added);
    }

    pub fn plants_with(&self, tag: &str) -> Option<&BTreeSet<PlantId>> {
        self.by_tag.get(tag)
    }

    /// Plants carrying every tag in `tags`. `None` means "no tag constraint".
    pub fn matching_all(&self, tags: &BTreeSet<String>) -> Option<BTreeSet<PlantId>> {
        if tags.is_empty() {
            return None;
        }

        let mut sets = Vec::with_capacity(tags.len());
        for tag in tags {
            match self.by_tag.get(tag) {
                Some(ids) => sets.push(ids),
                None => return Some(BTreeSet::new()),
            }
        }
        sets.sort_by_key(|ids| ids.len());

        let (smallest, rest) = sets.split_first()?;
        Some(
            smallest
                .iter()
                .filter(|id| rest.iter().all(|ids| ids.contains(*id)))
                .copied()
                .collect(),
        )
    }

    /// Every indexed tag, most used first, ties broken alphabetically.
    pub fn tag_counts(&self) -> Vec<TagCount> {
        let mut counts: Vec<TagCount> = self
            .by_tag
            .iter()
            .map(|(tag, ids)| TagCount {
                tag: tag.clone(),
                count: ids.len(),
            })
            .collect();
        counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.tag.cmp(&b.tag)));
        counts
    }

    pub fn tag_len(&self) -> usize {
        self.by_tag.len()
    }

    /// Lists every disagreement between the index and the live tag sets.
    pub fn integrity_issues(&self, entities: &EntityStore) -> Vec<String> {
        let mut issues = Vec::new();
        for (tag, ids) in &self.by_tag {
            for id in ids {
                match entities.plant(id) {
                    Err(_) => issues.push(format!("tag '{}' indexes missing plant {}", tag, id)),
                    Ok(plant) if !plant.has_tag(tag) => {
                        issues.push(format!("tag '{}' indexes plant {} which lacks it", tag, id))
                    }
                    Ok(_) => {}
                }
            }
        }
        for plant in entities.plants() {
            for tag in &plant.tags {
                let indexed = self.by_tag.get(tag).is_some_and(|ids| ids.contains(&plant.id));
                if !indexed {
                    issues.push(format!("plant {} tag '{}' is not indexed", plant.id, tag));
                }
            }
        }
        issues
    }
}
