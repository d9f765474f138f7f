//! Sample to observation index with per-sample metadata.
//!
//! Observation ids are interned once so that each sample only holds a list of
//! small integers. Grouping queries return borrowed `&str` views into the index.
//!
//! Samples lacking a metadata category are grouped under `None`. This is the
//! single sentinel for "missing value"; no string coercion is involved.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use log::{debug, warn};

use crate::error::{PhyloError, Result};

/// Category name to category value, for one sample.
pub type SampleMetadata = HashMap<String, String>;

/// Observations and metadata for a set of samples.
#[derive(Debug, Clone, Default)]
pub struct SampleObservationIndex {
    /// sample ids in insertion order
    samples: Vec<String>,
    sample_index: HashMap<String, usize>,
    /// interned observation ids
    observation_ids: Vec<String>,
    observation_index: HashMap<String, u32>,
    /// observations[s] holds interned ids of sample s, duplicates kept
    observations: Vec<Vec<u32>>,
    metadata: Vec<SampleMetadata>,
}

impl SampleObservationIndex {
    /// Build the index.
    ///
    /// `observations` lists each sample with the observation ids recorded in it.
    /// A sample listed twice has its observations appended. Every sample must
    /// have an entry in `metadata`; metadata rows for samples without
    /// observations are ignored.
    pub fn new(
        observations: Vec<(String, Vec<String>)>,
        mut metadata: HashMap<String, SampleMetadata>,
    ) -> Result<Self> {
        let mut index = SampleObservationIndex::default();
        for (sample, obs) in observations {
            let existing = index.sample_index.get(&sample).copied();
            let s = match existing {
                Some(s) => s,
                None => {
                    let row = metadata
                        .remove(&sample)
                        .ok_or_else(|| PhyloError::MissingMetadata(sample.clone()))?;
                    let s = index.samples.len();
                    index.sample_index.insert(sample.clone(), s);
                    index.samples.push(sample);
                    index.observations.push(Vec::with_capacity(obs.len()));
                    index.metadata.push(row);
                    s
                }
            };
            for o in obs {
                let id = index.intern(o);
                index.observations[s].push(id);
            }
        }
        if !metadata.is_empty() {
            debug!(
                "SampleObservationIndex: {} metadata rows without observations ignored",
                metadata.len()
            );
        }
        debug!(
            "SampleObservationIndex: {} samples, {} unique observations",
            index.samples.len(),
            index.observation_ids.len()
        );
        Ok(index)
    }

    fn intern(&mut self, obs: String) -> u32 {
        if let Some(&id) = self.observation_index.get(&obs) {
            return id;
        }
        let id = self.observation_ids.len() as u32;
        self.observation_index.insert(obs.clone(), id);
        self.observation_ids.push(obs);
        id
    }

    fn sample_pos(&self, sample: &str) -> Result<usize> {
        self.sample_index
            .get(sample)
            .copied()
            .ok_or_else(|| PhyloError::UnknownSample(sample.to_string()))
    }

    fn category_value(&self, s: usize, category: &str) -> Option<&str> {
        self.metadata[s].get(category).map(String::as_str)
    }

    /// Sample ids in insertion order.
    pub fn samples(&self) -> impl Iterator<Item = &str> {
        self.samples.iter().map(String::as_str)
    }

    pub fn num_samples(&self) -> usize {
        self.samples.len()
    }

    pub fn contains_sample(&self, sample: &str) -> bool {
        self.sample_index.contains_key(sample)
    }

    /// Observation ids recorded for `sample`, duplicates included.
    pub fn observations_of(&self, sample: &str) -> Result<Vec<&str>> {
        let s = self.sample_pos(sample)?;
        Ok(self.observations[s]
            .iter()
            .map(|&o| self.observation_ids[o as usize].as_str())
            .collect())
    }

    /// Union of observation ids for each value of `category`.
    ///
    /// Samples without the category are collected under `None`.
    pub fn get_obs_by(&self, category: &str) -> BTreeMap<Option<&str>, BTreeSet<&str>> {
        let mut groups: BTreeMap<Option<&str>, BTreeSet<&str>> = BTreeMap::new();
        for s in 0..self.samples.len() {
            let set = groups.entry(self.category_value(s, category)).or_default();
            set.extend(
                self.observations[s]
                    .iter()
                    .map(|&o| self.observation_ids[o as usize].as_str()),
            );
        }
        groups
    }

    /// Union of observation ids over exactly the given samples.
    pub fn union_for_samples<S: AsRef<str>>(&self, samples: &[S]) -> Result<HashSet<&str>> {
        let mut union = HashSet::new();
        for sample in samples {
            let s = self.sample_pos(sample.as_ref())?;
            union.extend(
                self.observations[s]
                    .iter()
                    .map(|&o| self.observation_ids[o as usize].as_str()),
            );
        }
        if union.is_empty() && !samples.is_empty() {
            warn!("union_for_samples: {} samples with no observations", samples.len());
        }
        Ok(union)
    }

    /// Number of distinct observation ids over all samples.
    pub fn get_unique_obs(&self) -> usize {
        // interning already deduplicated them
        self.observation_ids.len()
    }

    /// Sorted category names of the first sample.
    ///
    /// Samples are assumed to share one schema. If they do not, only the first
    /// sample's categories are reported.
    pub fn get_sample_cats(&self) -> Vec<&str> {
        let mut cats: Vec<&str> = self
            .metadata
            .first()
            .map(|row| row.keys().map(String::as_str).collect())
            .unwrap_or_default();
        cats.sort_unstable();
        cats
    }

    /// For each value of `category`, how many of its samples contain `observation`.
    ///
    /// Every value present in the metadata appears in the result, with 0 when
    /// none of its samples contain the observation.
    pub fn get_obs_counts_by(
        &self,
        category: &str,
        observation: &str,
    ) -> BTreeMap<Option<&str>, usize> {
        let target = self.observation_index.get(observation).copied();
        let mut counts: BTreeMap<Option<&str>, usize> = BTreeMap::new();
        for s in 0..self.samples.len() {
            let count = counts.entry(self.category_value(s, category)).or_insert(0);
            if let Some(id) = target {
                if self.observations[s].contains(&id) {
                    *count += 1;
                }
            }
        }
        counts
    }

    /// Number of samples for each value of `category`.
    pub fn get_sample_values_count(&self, category: &str) -> BTreeMap<Option<&str>, usize> {
        let mut counts: BTreeMap<Option<&str>, usize> = BTreeMap::new();
        for s in 0..self.samples.len() {
            *counts.entry(self.category_value(s, category)).or_insert(0) += 1;
        }
        counts
    }
}

//=======================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use env_logger::Env;

    fn init_log() {
        let _ = env_logger::Builder::from_env(Env::default().default_filter_or("debug"))
            .is_test(true)
            .try_init();
    }

    fn meta(pairs: &[(&str, &str)]) -> SampleMetadata {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn obs(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn fixture() -> SampleObservationIndex {
        let observations = vec![
            ("s1".to_string(), obs(&["o1", "o2", "o2"])),
            ("s2".to_string(), obs(&["o2", "o3"])),
            ("s3".to_string(), obs(&["o4"])),
            ("s4".to_string(), obs(&["o1"])),
        ];
        let mut metadata = HashMap::new();
        metadata.insert("s1".to_string(), meta(&[("body", "gut"), ("age", "1")]));
        metadata.insert("s2".to_string(), meta(&[("body", "gut"), ("age", "2")]));
        metadata.insert("s3".to_string(), meta(&[("body", "skin"), ("age", "3")]));
        metadata.insert("s4".to_string(), meta(&[("age", "4")]));
        SampleObservationIndex::new(observations, metadata).unwrap()
    }

    #[test]
    fn test_get_obs_by_with_missing_category() {
        init_log();
        let index = fixture();
        let groups = index.get_obs_by("body");
        assert_eq!(groups.len(), 3);
        assert_eq!(
            groups[&Some("gut")],
            ["o1", "o2", "o3"].into_iter().collect::<BTreeSet<_>>()
        );
        assert_eq!(groups[&Some("skin")], ["o4"].into_iter().collect::<BTreeSet<_>>());
        // s4 has no "body" entry
        assert_eq!(groups[&None], ["o1"].into_iter().collect::<BTreeSet<_>>());
    }

    #[test]
    fn test_get_obs_by_unknown_category_groups_everything_under_none() {
        let index = fixture();
        let groups = index.get_obs_by("nope");
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[&None].len(), 4);
    }

    #[test]
    fn test_union_for_samples() {
        let index = fixture();
        let u = index.union_for_samples(&["s1", "s3"]).unwrap();
        assert_eq!(u, ["o1", "o2", "o4"].into_iter().collect::<HashSet<_>>());
        assert!(index.union_for_samples::<&str>(&[]).unwrap().is_empty());
        assert_eq!(
            index.union_for_samples(&["s1", "s9"]),
            Err(PhyloError::UnknownSample("s9".to_string()))
        );
    }

    #[test]
    fn test_unique_obs_ignores_duplicates() {
        let index = fixture();
        assert_eq!(index.get_unique_obs(), 4);
        assert_eq!(index.observations_of("s1").unwrap(), vec!["o1", "o2", "o2"]);
    }

    #[test]
    fn test_sample_cats_from_first_sample() {
        let index = fixture();
        assert_eq!(index.get_sample_cats(), vec!["age", "body"]);
        let empty = SampleObservationIndex::new(vec![], HashMap::new()).unwrap();
        assert!(empty.get_sample_cats().is_empty());
        assert_eq!(empty.get_unique_obs(), 0);
    }

    #[test]
    fn test_counts_by_category() {
        let index = fixture();
        let counts = index.get_obs_counts_by("body", "o1");
        assert_eq!(counts[&Some("gut")], 1);
        assert_eq!(counts[&Some("skin")], 0);
        assert_eq!(counts[&None], 1);
        let absent = index.get_obs_counts_by("body", "o99");
        assert!(absent.values().all(|&c| c == 0));

        let sizes = index.get_sample_values_count("body");
        assert_eq!(sizes[&Some("gut")], 2);
        assert_eq!(sizes[&Some("skin")], 1);
        assert_eq!(sizes[&None], 1);
    }

    #[test]
    fn test_missing_metadata_rejected() {
        let observations = vec![("s1".to_string(), obs(&["o1"]))];
        assert_eq!(
            SampleObservationIndex::new(observations, HashMap::new()).unwrap_err(),
            PhyloError::MissingMetadata("s1".to_string())
        );
    }

    #[test]
    fn test_repeated_sample_is_merged() {
        let observations = vec![
            ("s1".to_string(), obs(&["o1"])),
            ("s1".to_string(), obs(&["o2"])),
        ];
        let mut metadata = HashMap::new();
        metadata.insert("s1".to_string(), meta(&[("body", "gut")]));
        let index = SampleObservationIndex::new(observations, metadata).unwrap();
        assert_eq!(index.num_samples(), 1);
        assert!(index.contains_sample("s1"));
        assert_eq!(index.samples().collect::<Vec<_>>(), vec!["s1"]);
        assert_eq!(index.observations_of("s1").unwrap(), vec!["o1", "o2"]);
    }
}
