//! Curated fallback suggestions
//!
//! Serves three activities from a static, pre-authored pool when generation
//! is unavailable. The pool is embedded at compile time and validated once at
//! load so selection can always fill a response.

use std::collections::HashMap;

use log::debug;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::Deserialize;

use crate::error::FallbackError;
use crate::models::{
    ActivityDuration, Category, RequestParameters, SUGGESTION_COUNT, Situation, Suggestion,
};

const EMBEDDED_TABLE: &str = include_str!("suggestions.yaml");

/// A pre-authored activity as stored in the table
#[derive(Debug, Clone, Deserialize)]
pub struct CuratedSuggestion {
    pub title: String,
    pub description: String,
    pub category: Category,
    #[serde(default)]
    pub steps: Vec<String>,
}

impl CuratedSuggestion {
    fn emit(&self, duration: ActivityDuration) -> Suggestion {
        Suggestion {
            id: Suggestion::fresh_id("fallback"),
            title: self.title.clone(),
            description: self.description.clone(),
            duration,
            category: self.category,
            steps: self.steps.clone(),
        }
    }
}

type Bucket = Vec<CuratedSuggestion>;

/// On-disk shape of the table
#[derive(Debug, Deserialize)]
struct RawTable {
    situations: HashMap<String, HashMap<u32, Bucket>>,
    job_hunting: HashMap<u32, Bucket>,
}

fn parse_duration(minutes: u32, context: &str) -> Result<ActivityDuration, FallbackError> {
    ActivityDuration::from_minutes(minutes).ok_or_else(|| {
        FallbackError::Corrupt(format!("unsupported duration {minutes} in {context}"))
    })
}

fn check_bucket(bucket: &Bucket, context: &str) -> Result<(), FallbackError> {
    if bucket.len() < SUGGESTION_COUNT {
        return Err(FallbackError::Corrupt(format!(
            "bucket {context} holds {} suggestions, need at least {SUGGESTION_COUNT}",
            bucket.len()
        )));
    }
    Ok(())
}

/// Static suggestion pool with randomized selection
#[derive(Debug)]
pub struct FallbackProvider {
    situations: HashMap<(Situation, ActivityDuration), Bucket>,
    job_hunting: HashMap<ActivityDuration, Bucket>,
}

impl FallbackProvider {
    /// Load the table compiled into the binary.
    pub fn embedded() -> Result<Self, FallbackError> {
        Self::from_yaml(EMBEDDED_TABLE)
    }

    /// Parse and validate a table. Every bucket needs at least three entries
    /// and the workplace and job-hunting 5-minute buckets must exist, since
    /// every lookup can degrade to them.
    pub fn from_yaml(source: &str) -> Result<Self, FallbackError> {
        let raw: RawTable = serde_yaml::from_str(source)?;

        let mut situations = HashMap::new();
        for (name, buckets) in raw.situations {
            let situation = Situation::parse(&name)
                .ok_or_else(|| FallbackError::Corrupt(format!("unknown situation {name}")))?;
            for (minutes, bucket) in buckets {
                let context = format!("{name}/{minutes}");
                let duration = parse_duration(minutes, &context)?;
                check_bucket(&bucket, &context)?;
                situations.insert((situation, duration), bucket);
            }
        }

        let mut job_hunting = HashMap::new();
        for (minutes, bucket) in raw.job_hunting {
            let context = format!("job_hunting/{minutes}");
            let duration = parse_duration(minutes, &context)?;
            check_bucket(&bucket, &context)?;
            job_hunting.insert(duration, bucket);
        }

        if !situations.contains_key(&(Situation::Workplace, ActivityDuration::Five)) {
            return Err(FallbackError::Corrupt(
                "missing baseline bucket workplace/5".to_string(),
            ));
        }
        if !job_hunting.contains_key(&ActivityDuration::Five) {
            return Err(FallbackError::Corrupt(
                "missing baseline bucket job_hunting/5".to_string(),
            ));
        }

        Ok(Self {
            situations,
            job_hunting,
        })
    }

    /// The bucket a request draws from.
    ///
    /// The job-hunting persona (by situation or age group) always uses the
    /// dedicated table keyed by duration only. Everything else is looked up
    /// by situation, then duration, degrading to the 5-minute bucket of the
    /// situation and finally to workplace.
    pub fn bucket(
        &self,
        params: &RequestParameters,
    ) -> Result<&[CuratedSuggestion], FallbackError> {
        if params.is_job_hunting() {
            return self
                .job_hunting
                .get(&params.duration)
                .or_else(|| self.job_hunting.get(&ActivityDuration::Five))
                .map(Vec::as_slice)
                .ok_or_else(|| {
                    FallbackError::MissingBucket(format!("job_hunting/{}", params.duration))
                });
        }

        let situation = if self
            .situations
            .keys()
            .any(|(s, _)| *s == params.situation)
        {
            params.situation
        } else {
            Situation::Workplace
        };

        self.situations
            .get(&(situation, params.duration))
            .or_else(|| self.situations.get(&(situation, ActivityDuration::Five)))
            .map(Vec::as_slice)
            .ok_or_else(|| {
                FallbackError::MissingBucket(format!("{}/{}", params.situation, params.duration))
            })
    }

    /// Pick three suggestions for a request using the thread-local RNG.
    pub fn select(&self, params: &RequestParameters) -> Result<Vec<Suggestion>, FallbackError> {
        self.select_with(params, &mut rand::rng())
    }

    /// Pick three suggestions with a caller-supplied RNG: one Fisher-Yates
    /// shuffle of the bucket, then the first three entries with fresh ids.
    pub fn select_with<R: Rng + ?Sized>(
        &self,
        params: &RequestParameters,
        rng: &mut R,
    ) -> Result<Vec<Suggestion>, FallbackError> {
        let bucket = self.bucket(params)?;

        let mut picks: Vec<&CuratedSuggestion> = bucket.iter().collect();
        picks.shuffle(rng);

        let suggestions: Vec<Suggestion> = picks
            .into_iter()
            .take(SUGGESTION_COUNT)
            .map(|curated| curated.emit(params.duration))
            .collect();

        debug!(
            "Fallback selected {} of {} suggestions for {}/{}/{}",
            suggestions.len(),
            bucket.len(),
            params.situation,
            params.duration,
            params.age_group
        );
        Ok(suggestions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn provider() -> FallbackProvider {
        FallbackProvider::embedded().unwrap()
    }

    fn titles(bucket: &[CuratedSuggestion]) -> Vec<String> {
        bucket.iter().map(|s| s.title.clone()).collect()
    }

    #[test]
    fn test_embedded_table_loads_with_full_coverage() {
        let provider = provider();
        for situation in [Situation::Workplace, Situation::Home, Situation::Outside] {
            for duration in ActivityDuration::ALL {
                let bucket = &provider.situations[&(situation, duration)];
                assert!(bucket.len() >= 4, "{situation}/{duration} too small");
            }
        }
        for duration in ActivityDuration::ALL {
            assert!(provider.job_hunting[&duration].len() >= 4);
        }
    }

    #[test]
    fn test_every_request_yields_three() {
        let provider = provider();
        for situation in Situation::ALL {
            for duration in ActivityDuration::ALL {
                for age_group in ["office_worker", "student", "job_hunting", "unknown"] {
                    let params = RequestParameters::new(situation, duration, age_group);
                    let picks = provider.select(&params).unwrap();
                    assert_eq!(picks.len(), SUGGESTION_COUNT);
                    assert!(picks.iter().all(|s| s.duration == duration));
                }
            }
        }
    }

    #[test]
    fn test_picks_come_from_requested_bucket_without_duplicates() {
        let provider = provider();
        let params = RequestParameters::new(Situation::Home, ActivityDuration::Thirty, "student");
        let allowed = titles(provider.bucket(&params).unwrap());

        let picks = provider.select(&params).unwrap();
        let mut picked: Vec<_> = picks.iter().map(|s| s.title.clone()).collect();
        assert!(picked.iter().all(|t| allowed.contains(t)));

        picked.sort();
        picked.dedup();
        assert_eq!(picked.len(), SUGGESTION_COUNT);
    }

    #[test]
    fn test_job_hunting_age_group_overrides_situation() {
        let provider = provider();
        let params =
            RequestParameters::new(Situation::Workplace, ActivityDuration::Five, "job_hunting");

        let bucket = titles(provider.bucket(&params).unwrap());
        let job_bucket = titles(&provider.job_hunting[&ActivityDuration::Five]);
        let workplace_bucket =
            titles(&provider.situations[&(Situation::Workplace, ActivityDuration::Five)]);

        assert_eq!(bucket, job_bucket);
        assert_ne!(bucket, workplace_bucket);
    }

    #[test]
    fn test_job_hunting_situation_uses_duration_bucket() {
        let provider = provider();
        let params =
            RequestParameters::new(Situation::JobHunting, ActivityDuration::Fifteen, "job_hunting");
        let allowed = titles(&provider.job_hunting[&ActivityDuration::Fifteen]);

        for _ in 0..10 {
            let picks = provider.select(&params).unwrap();
            assert!(picks.iter().all(|s| allowed.contains(&s.title)));
        }
    }

    #[test]
    fn test_missing_combination_degrades_to_baseline() {
        let table = r#"
situations:
  workplace:
    5:
      - { title: A, description: a, category: cognitive }
      - { title: B, description: b, category: behavioral }
      - { title: C, description: c, category: cognitive }
job_hunting:
  5:
    - { title: J1, description: j, category: cognitive }
    - { title: J2, description: j, category: cognitive }
    - { title: J3, description: j, category: cognitive }
"#;
        let provider = FallbackProvider::from_yaml(table).unwrap();

        let params =
            RequestParameters::new(Situation::Outside, ActivityDuration::Thirty, "student");
        let picks = provider.select(&params).unwrap();

        assert_eq!(picks.len(), 3);
        assert!(picks.iter().all(|s| ["A", "B", "C"].contains(&s.title.as_str())));
        // Duration is still the requested one
        assert!(picks.iter().all(|s| s.duration == ActivityDuration::Thirty));
        assert!(picks.iter().all(|s| s.steps.is_empty()));
    }

    #[test]
    fn test_seeded_selection_is_deterministic() {
        let provider = provider();
        let params = RequestParameters::baseline();

        let first = provider
            .select_with(&params, &mut StdRng::seed_from_u64(7))
            .unwrap();
        let second = provider
            .select_with(&params, &mut StdRng::seed_from_u64(7))
            .unwrap();

        let titles_a: Vec<_> = first.iter().map(|s| &s.title).collect();
        let titles_b: Vec<_> = second.iter().map(|s| &s.title).collect();
        assert_eq!(titles_a, titles_b);
        // Ids are fresh per emission even for the same picks
        assert_ne!(first[0].id, second[0].id);
    }

    #[test]
    fn test_small_bucket_is_rejected() {
        let table = r#"
situations:
  workplace:
    5:
      - { title: A, description: a, category: cognitive }
job_hunting:
  5: []
"#;
        let err = FallbackProvider::from_yaml(table).unwrap_err();
        assert!(matches!(err, FallbackError::Corrupt(_)));
    }

    #[test]
    fn test_missing_baseline_is_rejected() {
        let table = r#"
situations:
  home:
    5:
      - { title: A, description: a, category: cognitive }
      - { title: B, description: b, category: cognitive }
      - { title: C, description: c, category: cognitive }
job_hunting:
  5:
    - { title: J1, description: j, category: cognitive }
    - { title: J2, description: j, category: cognitive }
    - { title: J3, description: j, category: cognitive }
"#;
        let err = FallbackProvider::from_yaml(table).unwrap_err();
        assert!(err.to_string().contains("workplace/5"));
    }

    #[test]
    fn test_garbage_table_is_corrupt() {
        let err = FallbackProvider::from_yaml("not: [valid").unwrap_err();
        assert!(matches!(err, FallbackError::Corrupt(_)));
    }
}
