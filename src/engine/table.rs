//! Region-partitioned table storage
//!
//! Rows are clustered by primary key. The secondary index maps `k` to the
//! keys holding it. Region boundaries are start keys: region `i` holds the
//! keys in `[boundary[i-1], boundary[i])`, region 0 everything below the
//! first boundary. Splits only ever add boundaries.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;

use serde::{Deserialize, Serialize};

use super::dialect::Select;
use crate::cases::{Predicate, SortOrder};
use crate::dataset::{CompositeKey, Row};
use crate::sql::statements::PrimaryKey;

/// Deliberate pushdown defects the engine can exhibit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultMode {
    /// Correct behavior
    #[default]
    None,
    /// The first match of every region after the first is emitted twice
    DuplicateRegionBoundary,
    /// Matches in the lowest matching region are lost when more than one
    /// region matches
    DropFirstRegion,
    /// LIMIT is applied inside each region and never again after the merge
    LimitPerRegion,
    /// ORDER BY is applied inside each region; regions are concatenated
    UnmergedSort,
}

impl FaultMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FaultMode::None => "none",
            FaultMode::DuplicateRegionBoundary => "duplicate_region_boundary",
            FaultMode::DropFirstRegion => "drop_first_region",
            FaultMode::LimitPerRegion => "limit_per_region",
            FaultMode::UnmergedSort => "unmerged_sort",
        }
    }

    /// Parses the snake_case name used in configs and on the command line
    pub fn parse(name: &str) -> Option<Self> {
        [
            FaultMode::None,
            FaultMode::DuplicateRegionBoundary,
            FaultMode::DropFirstRegion,
            FaultMode::LimitPerRegion,
            FaultMode::UnmergedSort,
        ]
        .into_iter()
        .find(|mode| mode.as_str() == name)
    }
}

#[derive(Debug, Clone)]
struct StoredRow {
    k: i64,
    uk: i64,
    v1: i64,
    v2: String,
}

/// One table of the reference engine
#[derive(Debug, Default)]
pub struct Table {
    primary_key: PrimaryKey,
    rows: BTreeMap<CompositeKey, StoredRow>,
    k_index: BTreeMap<i64, BTreeSet<CompositeKey>>,
    boundaries: BTreeSet<CompositeKey>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_primary_key(primary_key: PrimaryKey) -> Self {
        Self {
            primary_key,
            ..Self::default()
        }
    }

    pub fn primary_key(&self) -> PrimaryKey {
        self.primary_key
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn region_count(&self) -> usize {
        self.boundaries.len() + 1
    }

    /// Inserts a batch atomically: either every row lands or none does.
    pub fn insert_all(&mut self, rows: Vec<Row>) -> Result<u64, String> {
        let mut incoming = BTreeSet::new();
        let mut incoming_ids = BTreeSet::new();
        for row in &rows {
            let key = row.key();
            if self.rows.contains_key(&key) || !incoming.insert(key.clone()) {
                return Err(format!("Duplicate entry '{}' for key 'PRIMARY'", key));
            }
            if self.primary_key == PrimaryKey::Single
                && (self.holds_id(row.id) || !incoming_ids.insert(row.id))
            {
                return Err(format!("Duplicate entry '{}' for key 'PRIMARY'", row.id));
            }
        }

        let count = rows.len() as u64;
        for row in rows {
            let key = row.key();
            self.k_index.entry(row.k).or_default().insert(key.clone());
            self.rows.insert(
                key,
                StoredRow {
                    k: row.k,
                    uk: row.uk,
                    v1: row.v1,
                    v2: row.v2,
                },
            );
        }
        Ok(count)
    }

    /// Adds `regions` evenly spaced boundaries on `id` between the bounds.
    pub fn split(
        &mut self,
        lower: &CompositeKey,
        upper: &CompositeKey,
        regions: u32,
    ) -> Result<u64, String> {
        if regions == 0 {
            return Err("Split region number must be greater than 0".to_string());
        }
        if upper <= lower {
            return Err("Split table `upper` value must be greater than `lower` value".to_string());
        }

        let span = i128::from(upper.id) - i128::from(lower.id);
        let before = self.boundaries.len();
        self.boundaries.insert(lower.clone());
        for i in 1..i128::from(regions) {
            let id = i128::from(lower.id) + span * i / i128::from(regions);
            // span fits in i128 and id lies between two i64 values
            let id = i64::try_from(id).map_err(|_| "split key out of range".to_string())?;
            self.boundaries.insert(CompositeKey::new(id, ""));
        }
        Ok((self.boundaries.len() - before) as u64)
    }

    fn holds_id(&self, id: i64) -> bool {
        self.rows
            .range(CompositeKey::new(id, "")..)
            .next()
            .is_some_and(|(key, _)| key.id == id)
    }

    fn region_of(&self, key: &CompositeKey) -> usize {
        self.boundaries
            .range((Bound::Unbounded, Bound::Included(key)))
            .count()
    }

    /// Index keys matching the filter, in `(k, key)` order
    fn index_matches(&self, filter: Option<&Predicate>) -> Vec<(i64, &CompositeKey)> {
        let mut out = Vec::new();
        match filter {
            None => {
                for (k, keys) in &self.k_index {
                    push_bucket(*k, keys, &mut out);
                }
            }
            Some(Predicate::Equality(k)) => {
                if let Some(keys) = self.k_index.get(k) {
                    push_bucket(*k, keys, &mut out);
                }
            }
            Some(Predicate::Range { low, high }) => {
                if low < high {
                    for (k, keys) in self.k_index.range(*low..*high) {
                        push_bucket(*k, keys, &mut out);
                    }
                }
            }
            Some(Predicate::Membership(list)) => {
                for k in list {
                    if let Some(keys) = self.k_index.get(k) {
                        push_bucket(*k, keys, &mut out);
                    }
                }
            }
        }
        out
    }

    /// Evaluates a SELECT as an index lookup fanned out over regions.
    ///
    /// Returns full rows `(key, k, uk, v1, v2)` in output order.
    pub fn select(
        &self,
        select: &Select,
        fault: FaultMode,
    ) -> Vec<(CompositeKey, i64, i64, i64, String)> {
        // Group index matches by the region that owns each key
        let mut regions: BTreeMap<usize, Vec<(i64, &CompositeKey)>> = BTreeMap::new();
        for (k, key) in self.index_matches(select.filter.as_ref()) {
            regions.entry(self.region_of(key)).or_default().push((k, key));
        }
        let mut per_region: Vec<Vec<(i64, &CompositeKey)>> = regions.into_values().collect();

        if fault == FaultMode::DropFirstRegion && per_region.len() > 1 {
            per_region.remove(0);
        }
        if fault == FaultMode::LimitPerRegion {
            if let Some(limit) = select.limit {
                for region in &mut per_region {
                    region.truncate(select.skip.saturating_add(limit) as usize);
                }
            }
        }
        if let (FaultMode::UnmergedSort, Some(order)) = (fault, select.order) {
            for region in &mut per_region {
                sort_by_k(region, order);
            }
        }

        let mut merged: Vec<(i64, &CompositeKey)> = Vec::new();
        for (pos, region) in per_region.iter().enumerate() {
            if fault == FaultMode::DuplicateRegionBoundary && pos > 0 {
                if let Some(first) = region.first() {
                    merged.push(*first);
                }
            }
            merged.extend(region.iter().copied());
        }

        if fault != FaultMode::UnmergedSort {
            if let Some(order) = select.order {
                sort_by_k(&mut merged, order);
            }
        }

        let window = merged.into_iter().skip(select.skip as usize);
        let window: Vec<_> = match select.limit {
            Some(limit) if fault != FaultMode::LimitPerRegion => {
                window.take(limit as usize).collect()
            }
            _ => window.collect(),
        };

        window
            .into_iter()
            .filter_map(|(_, key)| {
                self.rows
                    .get(key)
                    .map(|row| (key.clone(), row.k, row.uk, row.v1, row.v2.clone()))
            })
            .collect()
    }
}

fn push_bucket<'a>(
    k: i64,
    keys: &'a BTreeSet<CompositeKey>,
    out: &mut Vec<(i64, &'a CompositeKey)>,
) {
    out.extend(keys.iter().map(|key| (k, key)));
}

// Stable: rows with equal k keep their region/index order.
fn sort_by_k(rows: &mut [(i64, &CompositeKey)], order: SortOrder) {
    match order {
        SortOrder::Ascending => rows.sort_by(|a, b| a.0.cmp(&b.0)),
        SortOrder::Descending => rows.sort_by(|a, b| b.0.cmp(&a.0)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: i64, k: i64) -> Row {
        Row {
            id,
            id2: "AB".into(),
            k,
            uk: id * 10,
            v1: id,
            v2: format!("v{}", id),
        }
    }

    fn table() -> Table {
        let mut t = Table::new();
        // ids 1..=40, k cycles 1..=4
        t.insert_all((1..=40).map(|id| row(id, (id - 1) % 4 + 1)).collect())
            .unwrap();
        t
    }

    fn select(
        filter: Predicate,
        order: Option<SortOrder>,
        skip: u64,
        limit: Option<u64>,
    ) -> Select {
        Select {
            table: "t".into(),
            hint: None,
            projection: vec![0],
            filter: Some(filter),
            order,
            skip,
            limit,
        }
    }

    fn ks(rows: &[(CompositeKey, i64, i64, i64, String)]) -> Vec<i64> {
        rows.iter().map(|r| r.1).collect()
    }

    #[test]
    fn test_insert_rejects_duplicates_atomically() {
        let mut t = table();
        let err = t.insert_all(vec![row(100, 1), row(5, 1)]).unwrap_err();
        assert!(err.contains("Duplicate entry"));
        assert_eq!(t.len(), 40);
        assert!(t.insert_all(vec![row(101, 1), row(101, 2)]).is_err());
    }

    #[test]
    fn test_single_column_key_rejects_repeated_id() {
        let mut t = Table::with_primary_key(PrimaryKey::Single);
        t.insert_all(vec![row(1, 1), row(2, 1)]).unwrap();

        let mut other_id2 = row(2, 3);
        other_id2.id2 = "ZZ".into();
        let err = t.insert_all(vec![row(3, 1), other_id2]).unwrap_err();
        assert!(err.contains("Duplicate entry '2'"));
        assert_eq!(t.len(), 2);

        let mut twin = row(4, 1);
        twin.id2 = "CD".into();
        assert!(t.insert_all(vec![row(4, 1), twin]).is_err());

        // The composite key allows the same id under another id2
        let mut composite = table();
        let mut same_id = row(2, 3);
        same_id.id2 = "ZZ".into();
        assert!(composite.insert_all(vec![same_id]).is_ok());
    }

    #[test]
    fn test_split_accumulates_regions() {
        let mut t = table();
        assert_eq!(t.region_count(), 1);
        t.split(&CompositeKey::new(0, "a"), &CompositeKey::new(40, "Z"), 4).unwrap();
        assert_eq!(t.region_count(), 5);
        t.split(&CompositeKey::new(0, "A"), &CompositeKey::new(40, "z"), 8).unwrap();
        // (0,'A') is new, ids 10/20/30 already exist
        assert_eq!(t.region_count(), 10);
        assert!(t.split(&CompositeKey::new(5, "a"), &CompositeKey::new(1, "a"), 2).is_err());
    }

    #[test]
    fn test_select_correct_under_any_layout() {
        let mut t = table();
        let members = Predicate::Membership(vec![1, 3]);
        let query = select(members, Some(SortOrder::Descending), 3, Some(5));
        let before = t.select(&query, FaultMode::None);
        t.split(&CompositeKey::new(0, "a"), &CompositeKey::new(40, "Z"), 8).unwrap();
        let after = t.select(&query, FaultMode::None);
        assert_eq!(before, after);
        assert_eq!(ks(&after), vec![3, 3, 3, 3, 3]);
    }

    #[test]
    fn test_select_range_and_limit() {
        let t = table();
        let range = Predicate::Range { low: 2, high: 4 };
        let rows = t.select(&select(range.clone(), None, 0, None), FaultMode::None);
        assert_eq!(rows.len(), 20);
        let rows = t.select(&select(range, None, 18, Some(5)), FaultMode::None);
        assert_eq!(rows.len(), 2);
        let empty = Predicate::Range { low: 4, high: 2 };
        let rows = t.select(&select(empty, None, 0, None), FaultMode::None);
        assert!(rows.is_empty());
    }

    fn split_table() -> Table {
        let mut t = table();
        t.split(&CompositeKey::new(0, "a"), &CompositeKey::new(40, "Z"), 4).unwrap();
        t
    }

    #[test]
    fn test_fault_duplicate_region_boundary() {
        let t = split_table();
        let rows = t.select(
            &select(Predicate::Equality(1), None, 0, None),
            FaultMode::DuplicateRegionBoundary,
        );
        assert_eq!(rows.len(), 10 + 3);
    }

    #[test]
    fn test_fault_drop_first_region() {
        let t = split_table();
        // Region 0 (below (0,'a')) is empty; ids 1, 5 and 9 live in the lowest matching region
        let rows = t.select(
            &select(Predicate::Equality(1), None, 0, None),
            FaultMode::DropFirstRegion,
        );
        assert_eq!(rows.len(), 7);
        assert!(rows.iter().all(|r| r.0.id >= 10));
    }

    #[test]
    fn test_fault_limit_per_region() {
        let t = split_table();
        let rows = t.select(
            &select(Predicate::Equality(1), None, 0, Some(2)),
            FaultMode::LimitPerRegion,
        );
        assert!(rows.len() > 2);
    }

    #[test]
    fn test_huge_window_does_not_overflow() {
        let t = split_table();
        for fault in [FaultMode::None, FaultMode::LimitPerRegion] {
            let rows = t.select(
                &select(Predicate::Equality(1), None, u64::MAX, Some(u64::MAX)),
                fault,
            );
            assert!(rows.is_empty());
        }
    }

    #[test]
    fn test_fault_unmerged_sort() {
        let t = split_table();
        let rows = t.select(
            &select(Predicate::Range { low: 1, high: 5 }, Some(SortOrder::Ascending), 0, None),
            FaultMode::UnmergedSort,
        );
        let k = ks(&rows);
        assert!(k.windows(2).any(|w| w[0] > w[1]));
    }

    #[test]
    fn test_fault_mode_names() {
        assert_eq!(FaultMode::parse("limit_per_region"), Some(FaultMode::LimitPerRegion));
        assert_eq!(FaultMode::parse("bogus"), None);
    }
}
