use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::{
    error::AppResult,
    models::{genre, CandidateItem, FavoritePick},
    services::{picks::PickStore, providers::ContentProvider},
};

/// Maximum number of personalised recommendations returned
pub const MAX_RECOMMENDATIONS: usize = 40;

const SIMILAR_WEIGHT: f64 = 2.0;
const RECOMMENDED_WEIGHT: f64 = 1.5;
const FREQUENCY_POINTS: f64 = 10.0;
const GENRE_MATCH_POINTS: f64 = 5.0;
const QUALITY_FACTOR: f64 = 0.5;
const POPULARITY_DIVISOR: f64 = 1000.0;
const MAX_POPULARITY_BONUS: f64 = 2.0;

/// Genre name -> number of picks tagged with it
pub type GenreWeights = HashMap<String, u32>;

/// Outcome of a personalised recommendation run
#[derive(Debug, Clone, PartialEq)]
pub enum Recommendations {
    /// Ranked candidates, best first
    Personalized(Vec<CandidateItem>),
    /// The user has no picks to seed from; callers should fall back to a
    /// non-personalised list
    NoPicks,
}

/// A candidate together with the summed weight of every lookup that returned it
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationCandidate {
    /// First observation of the title; later duplicates only add weight
    pub item: CandidateItem,
    pub frequency: f64,
}

/// Candidates of one run keyed by TMDB id, kept in first-seen order
#[derive(Debug, Default)]
struct CandidatePool {
    index: HashMap<u64, usize>,
    candidates: Vec<RecommendationCandidate>,
}

impl CandidatePool {
    fn add(&mut self, item: CandidateItem, weight: f64) {
        match self.index.get(&item.id) {
            Some(&position) => self.candidates[position].frequency += weight,
            None => {
                self.index.insert(item.id, self.candidates.len());
                self.candidates.push(RecommendationCandidate {
                    item,
                    frequency: weight,
                });
            }
        }
    }

    fn merge(&mut self, items: Vec<CandidateItem>, weight: f64, excluded: &HashSet<u64>) {
        for item in items {
            if !excluded.contains(&item.id) {
                self.add(item, weight);
            }
        }
    }

    fn len(&self) -> usize {
        self.candidates.len()
    }

    #[cfg(test)]
    fn get(&self, id: u64) -> Option<&RecommendationCandidate> {
        self.index.get(&id).map(|&position| &self.candidates[position])
    }

    /// Scores every candidate and returns the top `limit`, best first
    fn rank(self, weights: &GenreWeights, limit: usize) -> Vec<CandidateItem> {
        let mut scored: Vec<(f64, CandidateItem)> = self
            .candidates
            .into_iter()
            .map(|candidate| (score_candidate(&candidate, weights), candidate.item))
            .collect();

        // Stable: equal scores keep first-seen order
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));

        scored
            .into_iter()
            .take(limit)
            .map(|(_, item)| item)
            .collect()
    }
}

/// Results of the two lookups made for one pick
#[derive(Debug, Default)]
struct PickLookups {
    similar: Vec<CandidateItem>,
    recommended: Vec<CandidateItem>,
}

/// Counts, per genre name, how many picks carry it
pub fn genre_weights(picks: &[FavoritePick]) -> GenreWeights {
    let mut weights = GenreWeights::new();

    for pick in picks {
        let tags: HashSet<&str> = pick
            .genres
            .iter()
            .map(|tag| tag.trim())
            .filter(|tag| !tag.is_empty())
            .collect();

        for tag in tags {
            *weights.entry(tag.to_string()).or_insert(0) += 1;
        }
    }

    weights
}

/// Bonus for genres shared with the user's picks. Unknown genre codes add nothing.
pub fn genre_overlap_bonus(genre_ids: &[u32], weights: &GenreWeights) -> f64 {
    genre::resolve_genre_names(genre_ids)
        .into_iter()
        .filter_map(|name| weights.get(name))
        .map(|weight| f64::from(*weight) * GENRE_MATCH_POINTS)
        .sum()
}

/// Final ranking score of a candidate
///
/// `frequency × 10 + genre overlap × 5 + vote_average × 0.5 + min(vote_count / 1000, 2)`
pub fn score_candidate(candidate: &RecommendationCandidate, weights: &GenreWeights) -> f64 {
    let item = &candidate.item;

    let frequency_score = candidate.frequency * FREQUENCY_POINTS;
    let genre_score = genre_overlap_bonus(&item.genre_ids, weights);
    let quality_bonus = item.vote_average * QUALITY_FACTOR;
    let popularity_bonus = (item.vote_count as f64 / POPULARITY_DIVISOR).min(MAX_POPULARITY_BONUS);

    frequency_score + genre_score + quality_bonus + popularity_bonus
}

/// Builds personalised feeds from a user's favorite picks
///
/// Every pick is looked up twice upstream ("similar" and "recommended").
/// Titles returned by several lookups accumulate weight, so content related
/// to many picks rises to the top.
#[derive(Clone)]
pub struct RecommendationService {
    provider: Arc<dyn ContentProvider>,
    store: Arc<dyn PickStore>,
}

impl RecommendationService {
    pub fn new(provider: Arc<dyn ContentProvider>, store: Arc<dyn PickStore>) -> Self {
        Self { provider, store }
    }

    /// Recommendations for a stored user, falling back to today's trending
    /// titles when the user has no picks
    pub async fn recommendations_for_user(&self, username: &str) -> AppResult<Vec<CandidateItem>> {
        let picks = self.store.get_picks(username).await?;

        match self.recommend(&picks).await {
            Recommendations::Personalized(items) => {
                tracing::info!(
                    user = %username,
                    picks = picks.len(),
                    results = items.len(),
                    "Personalized recommendations generated"
                );
                Ok(items)
            }
            Recommendations::NoPicks => {
                tracing::warn!(user = %username, "User has no favorite picks, returning trending content");
                self.provider.trending(1).await
            }
        }
    }

    /// Ranks upstream candidates for the given picks
    ///
    /// Lookup failures are logged and treated as empty results; this never fails.
    pub async fn recommend(&self, picks: &[FavoritePick]) -> Recommendations {
        if picks.is_empty() {
            return Recommendations::NoPicks;
        }

        let picked_ids: HashSet<u64> = picks.iter().map(|pick| pick.tmdb_id).collect();
        let weights = genre_weights(picks);

        tracing::debug!(?weights, provider = self.provider.name(), "Genre weights computed");

        let pool = self.aggregate(picks, &picked_ids).await;

        tracing::debug!(candidates = pool.len(), "Recommendation candidates aggregated");

        Recommendations::Personalized(pool.rank(&weights, MAX_RECOMMENDATIONS))
    }

    /// Looks up every pick concurrently and merges the results into one pool
    async fn aggregate(&self, picks: &[FavoritePick], picked_ids: &HashSet<u64>) -> CandidatePool {
        let tasks: Vec<_> = picks
            .iter()
            .cloned()
            .map(|pick| tokio::spawn(Self::lookup_pick(Arc::clone(&self.provider), pick)))
            .collect();

        // Merge in pick order so the ranking does not depend on task timing
        let mut pool = CandidatePool::default();
        for (pick, task) in picks.iter().zip(tasks) {
            let lookups = match task.await {
                Ok(lookups) => lookups,
                Err(e) => {
                    tracing::error!(error = %e, pick = %pick.title, "Lookup task failed");
                    continue;
                }
            };

            pool.merge(lookups.similar, SIMILAR_WEIGHT, picked_ids);
            pool.merge(lookups.recommended, RECOMMENDED_WEIGHT, picked_ids);
        }

        pool
    }

    async fn lookup_pick(provider: Arc<dyn ContentProvider>, pick: FavoritePick) -> PickLookups {
        tracing::debug!(
            pick = %pick.title,
            tmdb_id = pick.tmdb_id,
            media_type = %pick.media_type,
            "Fetching recommendations for pick"
        );

        let (similar, recommended) = tokio::join!(
            provider.similar(pick.tmdb_id, pick.media_type),
            provider.recommended(pick.tmdb_id, pick.media_type),
        );

        let similar = similar.unwrap_or_else(|e| {
            tracing::warn!(error = %e, pick = %pick.title, "Failed to fetch similar content");
            Vec::new()
        });
        let recommended = recommended.unwrap_or_else(|e| {
            tracing::warn!(error = %e, pick = %pick.title, "Failed to fetch recommendations");
            Vec::new()
        });

        PickLookups {
            similar,
            recommended,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::models::MediaType;
    use crate::services::picks::{InMemoryPickStore, MockPickStore};
    use crate::services::providers::MockContentProvider;

    fn item(id: u64, genre_ids: Vec<u32>, vote_average: f64, vote_count: u64) -> CandidateItem {
        CandidateItem {
            id,
            media_type: MediaType::Movie,
            title: format!("Title {}", id),
            genre_ids,
            vote_average,
            vote_count,
            overview: None,
            poster_path: None,
        }
    }

    fn plain(id: u64) -> CandidateItem {
        item(id, vec![], 0.0, 0)
    }

    fn pick(id: u64, genres: &[&str]) -> FavoritePick {
        FavoritePick::new(
            id,
            MediaType::Movie,
            format!("Pick {}", id),
            genres.iter().map(|g| g.to_string()).collect(),
        )
    }

    type Lookups = HashMap<u64, Vec<CandidateItem>>;

    /// Provider answering from fixed tables; ids listed in `failing` error on "similar"
    fn mock_provider(similar: Lookups, recommended: Lookups, failing: Vec<u64>) -> MockContentProvider {
        let mut provider = MockContentProvider::new();
        provider.expect_similar().returning(move |id, _| {
            if failing.contains(&id) {
                Err(AppError::ExternalApi("upstream unavailable".to_string()))
            } else {
                Ok(similar.get(&id).cloned().unwrap_or_default())
            }
        });
        provider
            .expect_recommended()
            .returning(move |id, _| Ok(recommended.get(&id).cloned().unwrap_or_default()));
        provider.expect_name().return_const("mock");
        provider
    }

    fn service(provider: MockContentProvider) -> RecommendationService {
        RecommendationService::new(Arc::new(provider), Arc::new(InMemoryPickStore::new()))
    }

    fn personalized(result: Recommendations) -> Vec<CandidateItem> {
        match result {
            Recommendations::Personalized(items) => items,
            Recommendations::NoPicks => panic!("Expected personalized recommendations"),
        }
    }

    fn ids(items: &[CandidateItem]) -> Vec<u64> {
        items.iter().map(|item| item.id).collect()
    }

    #[test]
    fn test_score_without_genre_overlap() {
        let candidate = RecommendationCandidate {
            item: item(1, vec![], 8.0, 500),
            frequency: 2.0,
        };

        let score = score_candidate(&candidate, &GenreWeights::new());
        assert!((score - 24.5).abs() < 1e-9);
    }

    #[test]
    fn test_genre_bonus() {
        let weights = GenreWeights::from([("Drama".to_string(), 2), ("Comedy".to_string(), 1)]);

        assert_eq!(genre_overlap_bonus(&[18], &weights), 10.0);
        assert_eq!(genre_overlap_bonus(&[18, 35], &weights), 15.0);
        assert_eq!(genre_overlap_bonus(&[28], &weights), 0.0);
    }

    #[test]
    fn test_unknown_genre_codes_add_nothing() {
        let weights = GenreWeights::from([("Drama".to_string(), 1)]);
        assert_eq!(genre_overlap_bonus(&[18, 777_777], &weights), 5.0);
    }

    #[test]
    fn test_popularity_bonus_is_capped() {
        let candidate = RecommendationCandidate {
            item: item(1, vec![], 0.0, 50_000),
            frequency: 0.0,
        };
        assert_eq!(score_candidate(&candidate, &GenreWeights::new()), 2.0);
    }

    #[test]
    fn test_genre_weights_count_picks() {
        let picks = vec![
            pick(1, &["Drama", "Crime"]),
            pick(2, &["Drama"]),
            pick(3, &[]),
            pick(4, &["Comedy", "Comedy", " "]),
        ];

        let weights = genre_weights(&picks);
        assert_eq!(weights.get("Drama"), Some(&2));
        assert_eq!(weights.get("Crime"), Some(&1));
        assert_eq!(weights.get("Comedy"), Some(&1));
        assert_eq!(weights.len(), 3);
    }

    #[test]
    fn test_pool_keeps_first_seen_item() {
        let mut pool = CandidatePool::default();
        let mut first = plain(7);
        first.title = "First".to_string();
        let mut second = plain(7);
        second.title = "Second".to_string();

        pool.add(first, 2.0);
        pool.add(second, 1.5);

        assert_eq!(pool.len(), 1);
        assert_eq!(pool.candidates[0].item.title, "First");
        assert_eq!(pool.candidates[0].frequency, 3.5);
    }

    #[tokio::test]
    async fn test_similar_from_two_picks_sums_frequency() {
        let provider = mock_provider(
            HashMap::from([(1, vec![plain(30)]), (2, vec![plain(30), plain(31)])]),
            HashMap::new(),
            vec![],
        );
        let picks = [pick(1, &[]), pick(2, &[])];
        let picked_ids: HashSet<u64> = HashSet::from([1, 2]);

        let pool = service(provider).aggregate(&picks, &picked_ids).await;

        assert_eq!(pool.len(), 2);
        assert_eq!(pool.get(30).map(|c| c.frequency), Some(4.0));
        assert_eq!(pool.get(31).map(|c| c.frequency), Some(2.0));
    }

    #[tokio::test]
    async fn test_similar_and_recommended_sum_frequency() {
        let provider = mock_provider(
            HashMap::from([(1, vec![plain(10)])]),
            HashMap::from([(1, vec![plain(10), plain(11)])]),
            vec![],
        );
        let picks = [pick(1, &[])];
        let picked_ids: HashSet<u64> = HashSet::from([1]);

        let pool = service(provider).aggregate(&picks, &picked_ids).await;

        assert_eq!(pool.get(10).map(|c| c.frequency), Some(3.5));
        assert_eq!(pool.get(11).map(|c| c.frequency), Some(1.5));
    }

    #[tokio::test]
    async fn test_shared_drama_title_scores_from_aggregated_frequency() {
        // Both Drama picks list 999 as similar: 4.0 × 10 + 2 × 5 + 3.5 + 2.0
        let provider = mock_provider(
            HashMap::from([
                (101, vec![item(999, vec![18], 7.0, 2000)]),
                (102, vec![item(999, vec![18], 7.0, 2000)]),
            ]),
            HashMap::new(),
            vec![],
        );
        let picks = [pick(101, &["Drama"]), pick(102, &["Drama"])];
        let picked_ids: HashSet<u64> = HashSet::from([101, 102]);

        let pool = service(provider).aggregate(&picks, &picked_ids).await;
        let candidate = pool.get(999).expect("candidate 999 aggregated");

        assert_eq!(candidate.frequency, 4.0);
        let score = score_candidate(candidate, &genre_weights(&picks));
        assert!((score - 55.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_aggregate_skips_picked_titles() {
        let provider = mock_provider(
            HashMap::from([(1, vec![plain(2), plain(50)])]),
            HashMap::from([(2, vec![plain(1)])]),
            vec![],
        );
        let picks = [pick(1, &[]), pick(2, &[])];
        let picked_ids: HashSet<u64> = HashSet::from([1, 2]);

        let pool = service(provider).aggregate(&picks, &picked_ids).await;

        assert!(pool.get(1).is_none());
        assert!(pool.get(2).is_none());
        assert_eq!(pool.get(50).map(|c| c.frequency), Some(2.0));
    }

    #[tokio::test]
    async fn test_empty_picks_skip_lookups() {
        let mut provider = MockContentProvider::new();
        provider.expect_similar().never();
        provider.expect_recommended().never();

        let result = service(provider).recommend(&[]).await;
        assert_eq!(result, Recommendations::NoPicks);
    }

    #[tokio::test]
    async fn test_similar_and_recommended_for_same_pick_accumulate() {
        // 10 is seen by both lookups of pick 1 (3.5), 20 only by "similar" (2.0)
        let provider = mock_provider(
            HashMap::from([(1, vec![plain(20), plain(10)])]),
            HashMap::from([(1, vec![plain(10)])]),
            vec![],
        );

        let items = personalized(service(provider).recommend(&[pick(1, &[])]).await);
        assert_eq!(ids(&items), vec![10, 20]);
    }

    #[tokio::test]
    async fn test_similar_from_two_picks_outranks_single_hits() {
        // 30 comes from two "similar" lookups (4.0) and beats a stronger single hit
        let provider = mock_provider(
            HashMap::from([
                (1, vec![item(40, vec![], 10.0, 100_000), plain(30)]),
                (2, vec![plain(30)]),
            ]),
            HashMap::new(),
            vec![],
        );

        let items = personalized(service(provider).recommend(&[pick(1, &[]), pick(2, &[])]).await);
        assert_eq!(ids(&items), vec![30, 40]);
    }

    #[tokio::test]
    async fn test_picked_titles_are_excluded() {
        let provider = mock_provider(
            HashMap::from([(1, vec![plain(2), plain(50)]), (2, vec![plain(1), plain(51)])]),
            HashMap::from([(1, vec![plain(1)])]),
            vec![],
        );

        let items = personalized(service(provider).recommend(&[pick(1, &[]), pick(2, &[])]).await);
        let result_ids = ids(&items);
        assert!(!result_ids.contains(&1));
        assert!(!result_ids.contains(&2));
        assert_eq!(result_ids.len(), 2);
    }

    #[tokio::test]
    async fn test_results_are_capped() {
        let many: Vec<CandidateItem> = (100..200).map(plain).collect();
        let provider = mock_provider(HashMap::from([(1, many)]), HashMap::new(), vec![]);

        let items = personalized(service(provider).recommend(&[pick(1, &[])]).await);
        assert_eq!(items.len(), MAX_RECOMMENDATIONS);
    }

    #[tokio::test]
    async fn test_ties_keep_first_seen_order() {
        let provider = mock_provider(
            HashMap::from([(1, vec![plain(5), plain(3), plain(9)])]),
            HashMap::new(),
            vec![],
        );
        let service = service(provider);
        let picks = [pick(1, &[])];

        let first = personalized(service.recommend(&picks).await);
        let second = personalized(service.recommend(&picks).await);

        assert_eq!(ids(&first), vec![5, 3, 9]);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_failed_lookup_is_tolerated() {
        let provider = mock_provider(
            HashMap::from([(2, vec![plain(60)])]),
            HashMap::from([(1, vec![plain(61)])]),
            vec![1],
        );

        let items = personalized(service(provider).recommend(&[pick(1, &[]), pick(2, &[])]).await);
        assert_eq!(ids(&items), vec![60, 61]);
    }

    #[tokio::test]
    async fn test_all_lookups_failing_yields_empty_list() {
        let mut provider = MockContentProvider::new();
        provider
            .expect_similar()
            .returning(|_, _| Err(AppError::ExternalApi("down".to_string())));
        provider
            .expect_recommended()
            .returning(|_, _| Err(AppError::ExternalApi("down".to_string())));
        provider.expect_name().return_const("mock");

        let items = personalized(service(provider).recommend(&[pick(1, &[])]).await);
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_movie_and_show_sharing_an_id_merge() {
        let mut show = plain(77);
        show.media_type = MediaType::Tv;
        let provider = mock_provider(
            HashMap::from([(1, vec![plain(77)])]),
            HashMap::from([(1, vec![show])]),
            vec![],
        );

        let items = personalized(service(provider).recommend(&[pick(1, &[])]).await);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].media_type, MediaType::Movie);
    }

    #[tokio::test]
    async fn test_genre_overlap_breaks_frequency_tie() {
        // Same frequency; the Drama title matches both picks' genres
        let provider = mock_provider(
            HashMap::from([(1, vec![item(80, vec![35], 0.0, 0), item(81, vec![18], 0.0, 0)])]),
            HashMap::new(),
            vec![],
        );

        let picks = [pick(1, &["Drama"]), pick(2, &["Drama"])];
        let items = personalized(service(provider).recommend(&picks).await);
        assert_eq!(ids(&items), vec![81, 80]);
    }

    #[tokio::test]
    async fn test_user_without_picks_gets_trending() {
        let mut provider = MockContentProvider::new();
        provider.expect_similar().never();
        provider
            .expect_trending()
            .withf(|page| *page == 1)
            .times(1)
            .returning(|_| Ok(vec![plain(900), plain(901)]));

        let items = service(provider)
            .recommendations_for_user("newcomer")
            .await
            .unwrap();
        assert_eq!(ids(&items), vec![900, 901]);
    }

    #[tokio::test]
    async fn test_user_with_picks_gets_personalized_feed() {
        let provider = mock_provider(HashMap::from([(1, vec![plain(500)])]), HashMap::new(), vec![]);
        let store = InMemoryPickStore::new();
        store.save_picks("alice", vec![pick(1, &[])]).await.unwrap();

        let service = RecommendationService::new(Arc::new(provider), Arc::new(store));
        let items = service.recommendations_for_user("alice").await.unwrap();
        assert_eq!(ids(&items), vec![500]);
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let mut store = MockPickStore::new();
        store
            .expect_get_picks()
            .returning(|_| Err(AppError::Internal("store offline".to_string())));

        let service = RecommendationService::new(Arc::new(MockContentProvider::new()), Arc::new(store));
        let result = service.recommendations_for_user("alice").await;
        assert!(matches!(result, Err(AppError::Internal(_))));
    }
}
