//! # Lineage Graph
//!
//! Parent → child propagation relationships (offsets, pups, cuttings).
//!
//! ## Source of Truth
//!
//! `Plant::parent_id` is the only authoritative state. The graph keeps a reverse
//! index `parent → {children}` that is updated in the same step as every parent
//! pointer change and can always be rebuilt from the records ([`LineageGraph::rebuild`]).
//!
//! ## Forest Invariant
//!
//! Each plant has at most one parent and no plant is its own ancestor. Before
//! attaching `child` under `parent`, [`LineageGraph::set_parent`] walks the
//! ancestor chain of `parent`; if `child` shows up the change is rejected with
//! `CycleDetected`. The walk is bounded by the depth of the tree.
//!
//! ## Deletion
//!
//! Removing a plant never cascades. [`LineageGraph::detach_children`] turns every
//! direct child into a root before the record goes away.

use crate::error::{InventoryError, Result};
use crate::model::PlantId;
use crate::store::entities::EntityStore;
use std::collections::{BTreeSet, HashMap, VecDeque};

/// What `set_parent` actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentChange {
    Unchanged,
    Changed {
        old: Option<PlantId>,
        new: Option<PlantId>,
    },
}

/// Lazy walk from a plant's parent up to its root. Never yields the start plant.
pub struct Ancestors<'a> {
    entities: &'a EntityStore,
    next: Option<PlantId>,
    // Upper bound on steps; only reachable if the records were corrupted.
    remaining: usize,
}

impl Iterator for Ancestors<'_> {
    type Item = PlantId;

    fn next(&mut self) -> Option<PlantId> {
        let id = self.next?;
        if self.remaining == 0 {
            self.next = None;
            return None;
        }
        self.remaining -= 1;
        self.next = self
            .entities
            .plant(&id)
            .ok()
            .and_then(|plant| plant.parent_id);
        Some(id)
    }
}

/// Ancestors of `id`, nearest first.
pub fn ancestors(entities: &EntityStore, id: PlantId) -> Result<Ancestors<'_>> {
    let plant = entities.plant(&id)?;
    Ok(Ancestors {
        entities,
        next: plant.parent_id,
        remaining: entities.plant_count(),
    })
}

#[derive(Debug, Clone, Default)]
pub struct LineageGraph {
    children: HashMap<PlantId, BTreeSet<PlantId>>,
}

impl LineageGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds the children index from parent pointers, rejecting dangling
    /// parents, self-parents and cycles.
    pub fn rebuild(entities: &EntityStore) -> Result<Self> {
        let mut graph = Self::new();
        for plant in entities.plants() {
            let Some(parent) = plant.parent_id else {
                continue;
            };
            if parent == plant.id {
                return Err(InventoryError::Integrity(format!(
                    "plant {} is its own parent",
                    plant.id
                )));
            }
            if !entities.contains_plant(&parent) {
                return Err(InventoryError::Integrity(format!(
                    "plant {} references missing parent {}",
                    plant.id, parent
                )));
            }
            graph.children.entry(parent).or_default().insert(plant.id);
        }

        if let Some(id) = first_cycle_member(entities) {
            return Err(InventoryError::Integrity(format!(
                "plant {} is part of a lineage cycle",
                id
            )));
        }
        Ok(graph)
    }

    /// Sets or clears the parent of `child`.
    pub fn set_parent(
        &mut self,
        entities: &mut EntityStore,
        child: PlantId,
        parent: Option<PlantId>,
    ) -> Result<ParentChange> {
        let old = entities.plant(&child)?.parent_id;

        if let Some(parent) = parent {
            if parent == child {
                return Err(InventoryError::SelfParent(child));
            }
            if ancestors(entities, parent)?.any(|id| id == child) {
                return Err(InventoryError::CycleDetected { child, parent });
            }
        }
        if old == parent {
            return Ok(ParentChange::Unchanged);
        }

        entities.plant_mut(&child)?.parent_id = parent;
        entities.touch_plant(&child)?;
        if let Some(old) = old {
            self.unlink(old, child);
        }
        if let Some(parent) = parent {
            self.children.entry(parent).or_default().insert(child);
        }
        Ok(ParentChange::Changed { old, new: parent })
    }

    fn unlink(&mut self, parent: PlantId, child: PlantId) {
        if let Some(set) = self.children.get_mut(&parent) {
            set.remove(&child);
            if set.is_empty() {
                self.children.remove(&parent);
            }
        }
    }

    /// Direct children of a plant, in id order.
    pub fn children(&self, entities: &EntityStore, id: PlantId) -> Result<Vec<PlantId>> {
        entities.plant(&id)?;
        Ok(self
            .children
            .get(&id)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default())
    }

    /// The whole subtree below a plant, breadth-first. Excludes the plant itself.
    pub fn descendants(&self, entities: &EntityStore, id: PlantId) -> Result<Vec<PlantId>> {
        entities.plant(&id)?;
        let mut found = Vec::new();
        let mut queue = VecDeque::from([id]);
        while let Some(current) = queue.pop_front() {
            if let Some(kids) = self.children.get(&current) {
                for kid in kids {
                    found.push(*kid);
                    queue.push_back(*kid);
                }
            }
        }
        Ok(found)
    }

    pub fn root_of(&self, entities: &EntityStore, id: PlantId) -> Result<PlantId> {
        Ok(ancestors(entities, id)?.last().unwrap_or(id))
    }

    /// Clears the parent pointer of every direct child of `id`. Returns the
    /// plants that became roots.
    pub fn detach_children(&mut self, entities: &mut EntityStore, id: PlantId) -> Result<Vec<PlantId>> {
        entities.plant(&id)?;
        let kids: Vec<PlantId> = self
            .children
            .remove(&id)
            .map(|set| set.into_iter().collect())
            .unwrap_or_default();
        for kid in &kids {
            entities.plant_mut(kid)?.parent_id = None;
            entities.touch_plant(kid)?;
        }
        Ok(kids)
    }

    /// Lists every disagreement between the children index and the parent pointers.
    pub fn integrity_issues(&self, entities: &EntityStore) -> Vec<String> {
        let mut issues = Vec::new();

        for (parent, kids) in &self.children {
            if !entities.contains_plant(parent) {
                issues.push(format!("children index references missing parent {}", parent));
            }
            for kid in kids {
                match entities.plant(kid) {
                    Err(_) => issues.push(format!("children index references missing plant {}", kid)),
                    Ok(plant) if plant.parent_id != Some(*parent) => issues.push(format!(
                        "children index lists {} under {} but its parent is {:?}",
                        kid, parent, plant.parent_id
                    )),
                    Ok(_) => {}
                }
            }
        }

        for plant in entities.plants() {
            let Some(parent) = plant.parent_id else {
                continue;
            };
            if parent == plant.id {
                issues.push(format!("plant {} is its own parent", plant.id));
            }
            if !entities.contains_plant(&parent) {
                issues.push(format!("plant {} references missing parent {}", plant.id, parent));
            }
            let indexed = self
                .children
                .get(&parent)
                .is_some_and(|kids| kids.contains(&plant.id));
            if !indexed {
                issues.push(format!(
                    "plant {} has parent {} but is missing from the children index",
                    plant.id, parent
                ));
            }
        }

        if let Some(id) = first_cycle_member(entities) {
            issues.push(format!("plant {} is part of a lineage cycle", id));
        }

        issues
    }
}

/// Finds a plant that reaches itself by following parent pointers.
fn first_cycle_member(entities: &EntityStore) -> Option<PlantId> {
    let limit = entities.plant_count();
    entities.plants().map(|p| p.id).find(|start| {
        let mut current = *start;
        for _ in 0..limit {
            match entities.plant(&current).ok().and_then(|p| p.parent_id) {
                Some(parent) if parent == *start => return true,
                Some(parent) => current = parent,
                None => return false,
            }
        }
        false
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::test_utils::plant_record;

    fn store_with(n: usize) -> (EntityStore, Vec<PlantId>) {
        let mut entities = EntityStore::new();
        let ids = (0..n)
            .map(|i| {
                let plant = plant_record(&format!("Plant {}", i + 1));
                let id = plant.id;
                entities.insert_plant(plant);
                id
            })
            .collect();
        (entities, ids)
    }

    #[test]
    fn test_set_parent_links_both_directions() {
        let (mut entities, ids) = store_with(2);
        let mut graph = LineageGraph::new();

        let change = graph.set_parent(&mut entities, ids[1], Some(ids[0])).unwrap();
        assert_eq!(
            change,
            ParentChange::Changed {
                old: None,
                new: Some(ids[0])
            }
        );
        assert_eq!(entities.plant(&ids[1]).unwrap().parent_id, Some(ids[0]));
        assert_eq!(graph.children(&entities, ids[0]).unwrap(), vec![ids[1]]);
        assert!(graph.integrity_issues(&entities).is_empty());
    }

    #[test]
    fn test_reverse_link_is_a_cycle() {
        let (mut entities, ids) = store_with(2);
        let (child_a, parent_x) = (ids[0], ids[1]);
        let mut graph = LineageGraph::new();
        graph.set_parent(&mut entities, child_a, Some(parent_x)).unwrap();

        let err = graph
            .set_parent(&mut entities, parent_x, Some(child_a))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CycleDetected);
        assert_eq!(graph.children(&entities, parent_x).unwrap(), vec![child_a]);
        assert!(entities.plant(&parent_x).unwrap().parent_id.is_none());
        assert!(graph.integrity_issues(&entities).is_empty());
    }

    #[test]
    fn test_deep_cycle_is_rejected() {
        let (mut entities, ids) = store_with(4);
        let mut graph = LineageGraph::new();
        // 0 <- 1 <- 2 <- 3
        for pair in ids.windows(2) {
            graph.set_parent(&mut entities, pair[1], Some(pair[0])).unwrap();
        }
        let err = graph.set_parent(&mut entities, ids[0], Some(ids[3])).unwrap_err();
        assert!(matches!(
            err,
            InventoryError::CycleDetected { child, parent } if child == ids[0] && parent == ids[3]
        ));
    }

    #[test]
    fn test_self_parent_is_rejected() {
        let (mut entities, ids) = store_with(1);
        let mut graph = LineageGraph::new();
        let err = graph.set_parent(&mut entities, ids[0], Some(ids[0])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SelfParent);
    }

    #[test]
    fn test_unknown_ids_are_not_found() {
        let (mut entities, ids) = store_with(1);
        let mut graph = LineageGraph::new();
        let ghost = PlantId::generate();
        assert_eq!(
            graph.set_parent(&mut entities, ids[0], Some(ghost)).unwrap_err().kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            graph.set_parent(&mut entities, ghost, Some(ids[0])).unwrap_err().kind(),
            ErrorKind::NotFound
        );
        assert_eq!(graph.children(&entities, ghost).unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_reparent_moves_child_between_sets() {
        let (mut entities, ids) = store_with(3);
        let mut graph = LineageGraph::new();
        graph.set_parent(&mut entities, ids[2], Some(ids[0])).unwrap();
        let change = graph.set_parent(&mut entities, ids[2], Some(ids[1])).unwrap();

        assert_eq!(
            change,
            ParentChange::Changed {
                old: Some(ids[0]),
                new: Some(ids[1])
            }
        );
        assert!(graph.children(&entities, ids[0]).unwrap().is_empty());
        assert_eq!(graph.children(&entities, ids[1]).unwrap(), vec![ids[2]]);
        assert!(graph.integrity_issues(&entities).is_empty());
    }

    #[test]
    fn test_clearing_parent_and_noop() {
        let (mut entities, ids) = store_with(2);
        let mut graph = LineageGraph::new();
        graph.set_parent(&mut entities, ids[1], Some(ids[0])).unwrap();
        assert_eq!(
            graph.set_parent(&mut entities, ids[1], Some(ids[0])).unwrap(),
            ParentChange::Unchanged
        );
        graph.set_parent(&mut entities, ids[1], None).unwrap();
        assert!(entities.plant(&ids[1]).unwrap().is_root());
        assert!(graph.children(&entities, ids[0]).unwrap().is_empty());
        assert_eq!(
            graph.set_parent(&mut entities, ids[1], None).unwrap(),
            ParentChange::Unchanged
        );
    }

    #[test]
    fn test_ancestors_walk_to_root_without_self() {
        let (mut entities, ids) = store_with(4);
        let mut graph = LineageGraph::new();
        for pair in ids.windows(2) {
            graph.set_parent(&mut entities, pair[1], Some(pair[0])).unwrap();
        }

        let chain: Vec<PlantId> = ancestors(&entities, ids[3]).unwrap().collect();
        assert_eq!(chain, vec![ids[2], ids[1], ids[0]]);
        assert!(!chain.contains(&ids[3]));
        assert_eq!(ancestors(&entities, ids[0]).unwrap().count(), 0);
        assert_eq!(graph.root_of(&entities, ids[3]).unwrap(), ids[0]);
        assert_eq!(graph.root_of(&entities, ids[0]).unwrap(), ids[0]);
    }

    #[test]
    fn test_descendants_cover_whole_subtree() {
        let (mut entities, ids) = store_with(5);
        let mut graph = LineageGraph::new();
        // 0 -> {1, 2}, 1 -> {3}, 3 -> {4}
        graph.set_parent(&mut entities, ids[1], Some(ids[0])).unwrap();
        graph.set_parent(&mut entities, ids[2], Some(ids[0])).unwrap();
        graph.set_parent(&mut entities, ids[3], Some(ids[1])).unwrap();
        graph.set_parent(&mut entities, ids[4], Some(ids[3])).unwrap();

        let mut below: Vec<PlantId> = graph.descendants(&entities, ids[0]).unwrap();
        below.sort();
        let mut expected = ids[1..].to_vec();
        expected.sort();
        assert_eq!(below, expected);
        assert_eq!(graph.descendants(&entities, ids[3]).unwrap(), vec![ids[4]]);
        assert!(graph.descendants(&entities, ids[4]).unwrap().is_empty());
    }

    #[test]
    fn test_detach_children_makes_roots() {
        let (mut entities, ids) = store_with(3);
        let mut graph = LineageGraph::new();
        graph.set_parent(&mut entities, ids[1], Some(ids[0])).unwrap();
        graph.set_parent(&mut entities, ids[2], Some(ids[0])).unwrap();

        let mut detached = graph.detach_children(&mut entities, ids[0]).unwrap();
        detached.sort();
        let mut expected = vec![ids[1], ids[2]];
        expected.sort();
        assert_eq!(detached, expected);
        assert!(entities.plant(&ids[1]).unwrap().is_root());
        assert!(entities.plant(&ids[2]).unwrap().is_root());
        assert!(graph.integrity_issues(&entities).is_empty());
    }

    #[test]
    fn test_rebuild_matches_incremental_index() {
        let (mut entities, ids) = store_with(3);
        let mut graph = LineageGraph::new();
        graph.set_parent(&mut entities, ids[1], Some(ids[0])).unwrap();
        graph.set_parent(&mut entities, ids[2], Some(ids[1])).unwrap();

        let rebuilt = LineageGraph::rebuild(&entities).unwrap();
        assert_eq!(rebuilt.children(&entities, ids[0]).unwrap(), vec![ids[1]]);
        assert_eq!(rebuilt.children(&entities, ids[1]).unwrap(), vec![ids[2]]);
    }

    #[test]
    fn test_rebuild_rejects_corrupt_records() {
        let (mut entities, ids) = store_with(2);
        entities.plant_mut(&ids[0]).unwrap().parent_id = Some(ids[1]);
        entities.plant_mut(&ids[1]).unwrap().parent_id = Some(ids[0]);
        let err = LineageGraph::rebuild(&entities).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Storage);

        let (mut entities, ids) = store_with(1);
        entities.plant_mut(&ids[0]).unwrap().parent_id = Some(PlantId::generate());
        assert!(LineageGraph::rebuild(&entities).is_err());
    }

    #[test]
    fn test_ancestors_terminate_on_corrupt_cycle() {
        let (mut entities, ids) = store_with(2);
        entities.plant_mut(&ids[0]).unwrap().parent_id = Some(ids[1]);
        entities.plant_mut(&ids[1]).unwrap().parent_id = Some(ids[0]);
        assert!(ancestors(&entities, ids[0]).unwrap().count() <= 2);
    }
}
