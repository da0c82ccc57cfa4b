//! Order- and duplicate-preserving JSON objects
//!
//! `serde_json::Value` keeps only the last of two equal keys. Catalogs need
//! to see both so the duplicate can be reported.

use std::fmt;
use std::marker::PhantomData;

use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};

use crate::domain::entities::SkippedEntry;

/// The members of a JSON object in file order, duplicates included.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct OrderedEntries<T>(pub Vec<(String, T)>);

impl<'de, T: Deserialize<'de>> Deserialize<'de> for OrderedEntries<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct EntriesVisitor<T>(PhantomData<T>);

        impl<'de, T: Deserialize<'de>> Visitor<'de> for EntriesVisitor<T> {
            type Value = OrderedEntries<T>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a JSON object")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((key, value)) = map.next_entry::<String, T>()? {
                    entries.push((key, value));
                }
                Ok(OrderedEntries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor(PhantomData))
    }
}

impl<T> OrderedEntries<T> {
    /// Drop every repeat of an earlier key, recording it as skipped.
    /// `id_of` turns a key into the id reported for it.
    pub fn dedup(
        self,
        skipped: &mut Vec<SkippedEntry>,
        id_of: impl Fn(&str) -> String,
    ) -> Vec<(String, T)> {
        let mut kept: Vec<(String, T)> = Vec::with_capacity(self.0.len());
        for (key, value) in self.0 {
            if kept.iter().any(|(k, _)| *k == key) {
                skipped.push(SkippedEntry {
                    id: id_of(&key),
                    reason: "duplicate id; the first definition is used".to_string(),
                });
            } else {
                kept.push((key, value));
            }
        }
        kept
    }
}
